//! Background jobs run by the `worker` binary: the status sweep that moves
//! reminders between pending, overdue and snoozed without a request touching
//! them, and the consumer draining the notification queue.

use crate::entities::ReminderStatus;
use crate::error::Result;
use crate::notifications::{self, Notifier, ReminderEvent, ReminderEventKind, NOTIFICATION_QUEUE};
use crate::repository::reminders;
use crate::scheduler::ReminderScheduler;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub examined: u64,
    pub marked_overdue: u64,
    pub woken: u64,
}

/// Applies automatic transitions to every active reminder that is due or whose
/// snooze has ended. Reminders that newly become overdue raise a `due` event.
pub async fn sweep_once(
    db: &DatabaseConnection,
    scheduler: &ReminderScheduler,
    notifier: &Arc<dyn Notifier>,
    now: DateTime<Utc>,
) -> Result<SweepOutcome> {
    let mut outcome = SweepOutcome::default();

    for mut model in reminders::find_needing_refresh(db, now).await? {
        outcome.examined += 1;
        let before = model.status;
        if !scheduler.refresh(&mut model, now) {
            continue;
        }
        let saved = reminders::save_state(db, &model).await?;

        if before == ReminderStatus::Snoozed && saved.status != ReminderStatus::Snoozed {
            outcome.woken += 1;
        }
        if before != ReminderStatus::Overdue && saved.status == ReminderStatus::Overdue {
            outcome.marked_overdue += 1;
            notifications::dispatch(
                notifier.clone(),
                ReminderEvent::new(ReminderEventKind::Due, &saved),
            );
        }
    }

    crate::metrics::record_sweep(outcome.marked_overdue, outcome.woken);
    Ok(outcome)
}

pub async fn start_sweeper(
    db: DatabaseConnection,
    scheduler: ReminderScheduler,
    notifier: Arc<dyn Notifier>,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        tracing::info!("Reminder sweeper started (every {}s)", interval_secs);
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let span = tracing::info_span!("reminder_sweep", "otel.name" = "reminder_sweep");
            async {
                match sweep_once(&db, &scheduler, &notifier, Utc::now()).await {
                    Ok(outcome) if outcome.examined > 0 => tracing::info!(
                        "Sweep examined {} reminders: {} now overdue, {} woken from snooze",
                        outcome.examined,
                        outcome.marked_overdue,
                        outcome.woken
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::error!("Reminder sweep failed: {}", e),
                }
            }
            .instrument(span)
            .await;
        }
    });
}

pub async fn start_queue_monitor(redis_client: redis::Client) {
    tokio::spawn(async move {
        tracing::info!("Queue Monitor started");
        loop {
            let mut conn = match redis_client.get_multiplexed_async_connection().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Queue Monitor: Failed to get redis conn: {}", e);
                    tokio::time::sleep(Duration::from_secs(15)).await;
                    continue;
                }
            };

            let depth: redis::RedisResult<u64> = conn.llen(NOTIFICATION_QUEUE).await;
            match depth {
                Ok(len) => crate::metrics::set_queue_depth(NOTIFICATION_QUEUE, len),
                Err(e) => tracing::error!("Failed to get {} len: {}", NOTIFICATION_QUEUE, e),
            }

            tokio::time::sleep(Duration::from_secs(15)).await;
        }
    });
}

/// Drains the notification queue. Delivery to devices is handled downstream;
/// here each event is decoded, logged and counted.
pub async fn start_notification_consumers(redis_client: redis::Client, concurrency: usize) {
    start_queue_monitor(redis_client.clone()).await;

    let redis_client = Arc::new(redis_client);
    for i in 0..concurrency {
        let redis_client = redis_client.clone();

        tokio::spawn(async move {
            tracing::info!("Notification worker {} started", i);
            loop {
                let mut conn = match redis_client.get_multiplexed_async_connection().await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!("Worker {}: Failed to get redis conn: {}", i, e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let result: redis::RedisResult<(String, String)> =
                    conn.blpop(NOTIFICATION_QUEUE, 0.0).await;

                match result {
                    Ok((_key, payload)) => match serde_json::from_str::<ReminderEvent>(&payload) {
                        Ok(event) => handle_event(i, &event),
                        Err(e) => tracing::error!("Worker {}: Bad payload: {}", i, e),
                    },
                    Err(e) => {
                        tracing::error!("Worker {}: Redis error: {}", i, e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }
}

fn handle_event(worker: usize, event: &ReminderEvent) {
    let span = tracing::info_span!(
        "reminder_notification",
        "otel.name" = "reminder_notification",
        reminder_id = %event.reminder_id,
        user_id = event.user_id,
        kind = event.kind.as_str(),
    );
    let _enter = span.enter();

    match event.kind {
        ReminderEventKind::Due => tracing::warn!(
            "Worker {}: '{}' is overdue (was due {})",
            worker,
            event.title,
            event.due_date
        ),
        _ => tracing::info!(
            "Worker {}: '{}' {} (due {})",
            worker,
            event.title,
            event.kind.as_str(),
            event.due_date
        ),
    }
    crate::metrics::increment_notifications_delivered(event.kind.as_str());
}
