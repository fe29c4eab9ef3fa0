//! Job status stream
//!
//! Every job of a scheduling run writes into one unbounded channel. Sends
//! never block, so a job can report status before the relay has polled once.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use uuid::Uuid;

/// One status line emitted by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub job_id: Uuid,
    pub label: String,
    pub message: String,
}

/// Per-job handle onto the shared status stream
#[derive(Debug, Clone)]
pub struct StatusSender {
    job_id: Uuid,
    label: String,
    tx: UnboundedSender<StatusEvent>,
}

impl StatusSender {
    pub fn new(job_id: Uuid, label: impl Into<String>, tx: UnboundedSender<StatusEvent>) -> Self {
        Self {
            job_id,
            label: label.into(),
            tx,
        }
    }

    pub fn send(&self, message: impl Into<String>) {
        // The relay only goes away after every sender is dropped
        let _ = self.tx.send(StatusEvent {
            job_id: self.job_id,
            label: self.label.clone(),
            message: message.into(),
        });
    }
}

/// Create the shared stream for one scheduling run
pub fn status_channel() -> (UnboundedSender<StatusEvent>, UnboundedReceiver<StatusEvent>) {
    unbounded_channel()
}
