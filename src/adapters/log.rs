//! Log-based notifier
//!
//! Publishes notification events as structured log records. Used by the CLI
//! when no external notification channel is configured, so every cycle
//! outcome still lands somewhere an operator can see it.

use crate::adapters::traits::{NotificationEvent, NotificationStatus, Notifier};
use async_trait::async_trait;

/// Notifier that emits events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a log notifier
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), String> {
        let payload = serde_json::to_string(event)
            .map_err(|e| format!("Failed to encode notification: {}", e))?;
        match event.status {
            NotificationStatus::Success => {
                tracing::info!(
                    table_id = %event.table_id,
                    status = "SUCCESS",
                    payload = %payload,
                    "{}",
                    event.message
                );
            }
            NotificationStatus::Failed => {
                tracing::error!(
                    table_id = %event.table_id,
                    status = "FAILED",
                    payload = %payload,
                    "{}",
                    event.message
                );
            }
        }
        Ok(())
    }
}
