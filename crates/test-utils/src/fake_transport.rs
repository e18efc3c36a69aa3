use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use remote_task::task::{ResultEnvelope, TaskDescriptor};
use remote_task::transport::{CallFuture, Transport, TransportError};

/// What the fake worker answers with for one call.
pub enum FakeReply {
    Envelope(ResultEnvelope),
    Fault(TransportError),
}

/// A fake transport that:
/// - records every descriptor it was asked to deliver
/// - answers with scripted replies, in order; once they run out it fails
///   with `TransportError::Closed`.
#[derive(Clone)]
pub struct FakeTransport {
    replies: Arc<Mutex<VecDeque<FakeReply>>>,
    sent: Arc<Mutex<Vec<TaskDescriptor>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn reply_with(self, envelope: ResultEnvelope) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(FakeReply::Envelope(envelope));
        self
    }

    pub fn fail_with(self, fault: TransportError) -> Self {
        self.replies.lock().unwrap().push_back(FakeReply::Fault(fault));
        self
    }

    /// Descriptors delivered so far.
    pub fn sent(&self) -> Vec<TaskDescriptor> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for FakeTransport {
    fn endpoint(&self) -> String {
        "fake".to_string()
    }

    fn call(&self, task: TaskDescriptor) -> CallFuture<'_> {
        let replies = Arc::clone(&self.replies);
        let sent = Arc::clone(&self.sent);

        Box::pin(async move {
            sent.lock().unwrap().push(task);
            let reply = replies.lock().unwrap().pop_front();
            match reply {
                Some(FakeReply::Envelope(envelope)) => Ok(envelope),
                Some(FakeReply::Fault(fault)) => Err(fault),
                None => Err(TransportError::Closed),
            }
        })
    }
}
