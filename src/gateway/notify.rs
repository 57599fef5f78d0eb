// ABOUTME: Notification sink trait for fire-and-forget operator messages.
// ABOUTME: Delivery failures are logged, never allowed to abort the caller.

use async_trait::async_trait;

/// Errors a sink may report when delivery fails.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Publishes human-readable messages to operators.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}

/// Publish and swallow delivery failures with a warning.
///
/// Notifications are side channels; losing one must not turn a successful
/// switch or scaling action into a failure.
pub async fn publish_or_warn<N: NotificationSink + ?Sized>(sink: &N, subject: &str, message: &str) {
    if let Err(e) = sink.publish(subject, message).await {
        tracing::warn!(subject, error = %e, "failed to publish notification");
    }
}
