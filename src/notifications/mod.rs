//! Fire-and-forget reminder notifications.
//!
//! The API enqueues [`ReminderEvent`]s; delivery happens elsewhere. A failed
//! send is logged and counted but never fails the request that caused it.

pub mod redis_queue;

pub use redis_queue::{RedisNotifier, NOTIFICATION_QUEUE};

use crate::entities::{reminder, CareType};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderEventKind {
    Created,
    Completed,
    Snoozed,
    Due,
}

impl ReminderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderEventKind::Created => "created",
            ReminderEventKind::Completed => "completed",
            ReminderEventKind::Snoozed => "snoozed",
            ReminderEventKind::Due => "due",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderEvent {
    pub kind: ReminderEventKind,
    pub reminder_id: Uuid,
    pub user_id: i32,
    pub plant_id: Option<i32>,
    pub care_type: CareType,
    pub title: String,
    pub due_date: DateTime<Utc>,
}

impl ReminderEvent {
    pub fn new(kind: ReminderEventKind, reminder: &reminder::Model) -> Self {
        Self {
            kind,
            reminder_id: reminder.id,
            user_id: reminder.user_id,
            plant_id: reminder.plant_id,
            care_type: reminder.care_type,
            title: reminder.title.clone(),
            due_date: reminder.due_date,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: ReminderEvent) -> Result<()>;
}

/// Used when no queue is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: ReminderEvent) -> Result<()> {
        tracing::info!(
            "Reminder {} {} for user {} (due {})",
            event.reminder_id,
            event.kind.as_str(),
            event.user_id,
            event.due_date
        );
        Ok(())
    }
}

/// Sends on a background task; never blocks or fails the caller.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: ReminderEvent) {
    tokio::spawn(async move {
        let kind = event.kind.as_str();
        let reminder_id = event.reminder_id;
        match notifier.notify(event).await {
            Ok(()) => crate::metrics::increment_notifications_sent(kind),
            Err(e) => {
                tracing::error!(
                    "Failed to send {} notification for reminder {}: {}",
                    kind,
                    reminder_id,
                    e
                );
                crate::metrics::increment_notifications_failed(kind);
            }
        }
    });
}
