// src/exec/decode.rs

//! Text decoding for the merged output stream.
//!
//! - [`resolve_encoding`] turns a descriptor's encoding label into an
//!   [`OutputEncoding`], falling back to the *worker's* platform default.
//! - [`LineDecoder`] decodes bytes incrementally and splits the text into
//!   lines. `\n`, `\r` and `\r\n` all terminate a line; a trailing
//!   unterminated segment becomes the last line.

use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};

use crate::task::{CapturedFailure, FailureKind};

/// Labels decoded as strict ISO-8859-1 (every byte is the code point of the
/// same value). The WHATWG table behind `encoding_rs` maps these to
/// windows-1252, which differs in 0x80..=0x9F.
const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso_8859_1",
    "iso8859_1",
    "latin1",
    "l1",
    "cp819",
    "ibm819",
    "iso-ir-100",
    "csisolatin1",
];

/// Encoding used to turn process output into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEncoding {
    /// An encoding from the WHATWG Encoding Standard.
    Whatwg(&'static Encoding),
    /// Strict ISO-8859-1.
    Latin1,
}

impl OutputEncoding {
    /// Look up a label, case-insensitively and ignoring surrounding
    /// whitespace.
    ///
    /// Apart from the ISO-8859-1 family, labels follow the WHATWG aliasing:
    /// `"ascii"` and `"us-ascii"` also resolve to windows-1252, and
    /// `"utf-16"` to UTF-16LE (a byte order mark in the output still wins).
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if LATIN1_LABELS.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            return Some(OutputEncoding::Latin1);
        }
        Encoding::for_label(label.as_bytes()).map(OutputEncoding::Whatwg)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputEncoding::Whatwg(encoding) => encoding.name(),
            OutputEncoding::Latin1 => "ISO-8859-1",
        }
    }
}

impl From<&'static Encoding> for OutputEncoding {
    fn from(encoding: &'static Encoding) -> Self {
        OutputEncoding::Whatwg(encoding)
    }
}

/// Resolve the encoding used to decode process output.
///
/// `None` means "platform default of this machine", looked up at call time so
/// that a worker uses its own locale rather than the coordinator's.
pub fn resolve_encoding(label: Option<&str>) -> Result<OutputEncoding, CapturedFailure> {
    match label {
        Some(label) => OutputEncoding::for_label(label).ok_or_else(|| {
            CapturedFailure::new(
                FailureKind::Encoding,
                format!("unsupported encoding '{label}'"),
            )
        }),
        None => Ok(platform_default_encoding()),
    }
}

/// Default text encoding of this machine.
///
/// On Unix this is the codeset of the first non-empty of `LC_ALL`,
/// `LC_CTYPE`, `LANG` (e.g. `de_DE.ISO-8859-15@euro`). Anything unset or
/// unrecognized falls back to UTF-8.
pub fn platform_default_encoding() -> OutputEncoding {
    let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty());

    locale
        .as_deref()
        .and_then(codeset_of_locale)
        .and_then(OutputEncoding::for_label)
        .unwrap_or(OutputEncoding::Whatwg(UTF_8))
}

fn codeset_of_locale(locale: &str) -> Option<&str> {
    let (_, rest) = locale.split_once('.')?;
    let codeset = rest.split('@').next().unwrap_or(rest);
    if codeset.is_empty() { None } else { Some(codeset) }
}

/// Incremental decoder that yields complete lines.
pub struct LineDecoder {
    // `None` decodes strict ISO-8859-1.
    decoder: Option<Decoder>,
    pending: String,
    // Set after a '\r' terminator so that a directly following '\n' (possibly
    // in the next chunk) is swallowed.
    skip_lf: bool,
}

impl LineDecoder {
    /// A leading byte order mark is stripped and, for the UTF-16 family,
    /// decides the byte order.
    pub fn new(encoding: impl Into<OutputEncoding>) -> Self {
        let decoder = match encoding.into() {
            OutputEncoding::Whatwg(encoding) => Some(encoding.new_decoder()),
            OutputEncoding::Latin1 => None,
        };
        Self {
            decoder,
            pending: String::new(),
            skip_lf: false,
        }
    }

    /// Decode another chunk, emitting every line completed by it.
    pub fn feed(&mut self, bytes: &[u8], emit: &mut dyn FnMut(String)) {
        self.decode(bytes, false);
        self.drain_lines(emit);
    }

    /// Flush the decoder at end of stream and emit the final line, if any.
    pub fn finish(mut self, emit: &mut dyn FnMut(String)) {
        self.decode(&[], true);
        self.drain_lines(emit);
        if !self.pending.is_empty() {
            emit(std::mem::take(&mut self.pending));
        }
    }

    fn decode(&mut self, mut input: &[u8], last: bool) {
        let Some(decoder) = self.decoder.as_mut() else {
            self.pending.extend(input.iter().map(|&b| char::from(b)));
            return;
        };

        loop {
            let needed = decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len().saturating_mul(3).saturating_add(16));
            self.pending.reserve(needed);

            let (result, read, _had_replacements) =
                decoder.decode_to_string(input, &mut self.pending, last);
            input = &input[read..];

            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn drain_lines(&mut self, emit: &mut dyn FnMut(String)) {
        let mut consumed = 0;
        let mut lines = Vec::new();

        for (idx, ch) in self.pending.char_indices() {
            if self.skip_lf {
                self.skip_lf = false;
                if ch == '\n' {
                    consumed = idx + 1;
                    continue;
                }
            }
            match ch {
                '\n' => {
                    lines.push(self.pending[consumed..idx].to_string());
                    consumed = idx + 1;
                }
                '\r' => {
                    lines.push(self.pending[consumed..idx].to_string());
                    consumed = idx + 1;
                    self.skip_lf = true;
                }
                _ => {}
            }
        }

        self.pending.drain(..consumed);
        for line in lines {
            emit(line);
        }
    }
}
