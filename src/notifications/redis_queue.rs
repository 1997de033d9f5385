use super::{Notifier, ReminderEvent};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;

pub const NOTIFICATION_QUEUE: &str = "reminder_notifications";

/// Pushes events onto a redis list consumed by the worker.
#[derive(Clone)]
pub struct RedisNotifier {
    client: redis::Client,
    queue: String,
}

impl RedisNotifier {
    pub fn new(client: redis::Client) -> Self {
        Self {
            client,
            queue: NOTIFICATION_QUEUE.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn notify(&self, event: ReminderEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)
            .map_err(|e| AppError::upstream(format!("failed to serialize event: {}", e)))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::upstream(format!("redis connection failed: {}", e)))?;

        let _: () = conn
            .rpush(&self.queue, payload)
            .await
            .map_err(|e| AppError::upstream(format!("failed to enqueue notification: {}", e)))?;

        tracing::debug!("Queued {} event for reminder {}", event.kind.as_str(), event.reminder_id);
        Ok(())
    }
}
