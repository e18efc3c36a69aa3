// src/exec/mod.rs

//! Process execution layer (the worker side).
//!
//! - [`worker`] spawns the command with stderr merged into stdout, collects
//!   decoded lines and the exit code into a `ResultEnvelope`.
//! - [`decode`] resolves the text encoding and splits bytes into lines.
//!
//! The routine is shared by the direct route of the coordinator and by the
//! agent serving remote requests; only the way the envelope travels differs.

pub mod decode;
pub mod worker;

pub use decode::{LineDecoder, OutputEncoding, platform_default_encoding, resolve_encoding};
pub use worker::{execute, execute_blocking};
