use crate::entities::{plant, reminder, ReminderStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

pub async fn init_metrics(db: &DatabaseConnection) {
    let plant_count = plant::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("plantcare_plants_total").set(plant_count as f64);

    let reminder_count = reminder::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("plantcare_reminders_total").set(reminder_count as f64);

    let overdue_count = reminder::Entity::find()
        .filter(reminder::Column::Status.eq(ReminderStatus::Overdue))
        .count(db)
        .await
        .unwrap_or(0);
    metrics::gauge!("plantcare_reminders_overdue").set(overdue_count as f64);

    tracing::info!(
        "Initialized metrics: Plants={}, Reminders={}, Overdue={}",
        plant_count,
        reminder_count,
        overdue_count
    );
}

pub fn increment_plants() {
    metrics::gauge!("plantcare_plants_total").increment(1.0);
}

pub fn decrement_plants() {
    metrics::gauge!("plantcare_plants_total").decrement(1.0);
}

pub fn increment_reminders_created(care_type: &str) {
    metrics::counter!("plantcare_reminders_created_total", "care_type" => care_type.to_string())
        .increment(1);
    metrics::gauge!("plantcare_reminders_total").increment(1.0);
}

pub fn increment_reminders_completed(on_time: bool) {
    let outcome = if on_time { "on_time" } else { "late" };
    metrics::counter!("plantcare_reminders_completed_total", "outcome" => outcome).increment(1);
}

pub fn increment_reminders_snoozed() {
    metrics::counter!("plantcare_reminders_snoozed_total").increment(1);
}

pub fn increment_snooze_limit_hits() {
    metrics::counter!("plantcare_snooze_limit_exceeded_total").increment(1);
}

pub fn increment_reminders_dismissed() {
    metrics::counter!("plantcare_reminders_dismissed_total").increment(1);
}

pub fn record_days_overdue(days: i64) {
    metrics::histogram!("plantcare_completion_days_overdue").record(days as f64);
}

pub fn record_sweep(marked_overdue: u64, woken: u64) {
    metrics::counter!("plantcare_sweep_transitions_total", "transition" => "overdue")
        .increment(marked_overdue);
    metrics::counter!("plantcare_sweep_transitions_total", "transition" => "unsnoozed")
        .increment(woken);
}

pub fn increment_weather_failures() {
    metrics::counter!("plantcare_weather_failures_total").increment(1);
}

pub fn increment_notifications_sent(kind: &str) {
    metrics::counter!("plantcare_notifications_sent_total", "kind" => kind.to_string()).increment(1);
}

pub fn increment_notifications_failed(kind: &str) {
    metrics::counter!("plantcare_notifications_failed_total", "kind" => kind.to_string()).increment(1);
}

pub fn increment_notifications_delivered(kind: &str) {
    metrics::counter!("plantcare_notifications_delivered_total", "kind" => kind.to_string())
        .increment(1);
}

pub fn set_queue_depth(queue: &str, depth: u64) {
    metrics::gauge!("plantcare_queue_depth", "queue" => queue.to_string()).set(depth as f64);
}
