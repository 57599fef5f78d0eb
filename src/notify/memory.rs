// ABOUTME: Notification sink that keeps published messages in memory.
// ABOUTME: Used for dry runs and for asserting on notifications in tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::gateway::{NotificationSink, NotifyError};

/// A published message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Whether any message body contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.sent.lock().iter().any(|n| n.message.contains(needle))
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(Notification {
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
