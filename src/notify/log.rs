// ABOUTME: Notification sink that writes messages to the tracing log.
// ABOUTME: Always succeeds; the fallback when no delivery hook is installed.

use async_trait::async_trait;

use crate::gateway::{NotificationSink, NotifyError};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(target: "fleetkeeper::notify", subject, "{}", message.trim());
        Ok(())
    }
}
