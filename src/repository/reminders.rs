use crate::entities::{reminder, CareType, Reminder, ReminderStatus};
use crate::error::{AppError, Result};
use crate::scheduler::DEFAULT_COMPLIANCE_RATE;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

const ACTIVE_STATUSES: [ReminderStatus; 3] = [
    ReminderStatus::Pending,
    ReminderStatus::Overdue,
    ReminderStatus::Snoozed,
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderFilter {
    pub status: Option<ReminderStatus>,
    pub plant_id: Option<i32>,
    pub care_type: Option<CareType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderStats {
    pub total: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    pub completions: usize,
    pub on_time_completions: usize,
    pub compliance_rate: f64,
}

pub async fn insert<C: ConnectionTrait>(db: &C, model: reminder::Model) -> Result<reminder::Model> {
    let active = reminder::ActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        plant_id: Set(model.plant_id),
        parent_id: Set(model.parent_id),
        care_type: Set(model.care_type),
        title: Set(model.title),
        notes: Set(model.notes),
        due_date: Set(model.due_date),
        original_due_date: Set(model.original_due_date),
        frequency_days: Set(model.frequency_days),
        flexibility_days: Set(model.flexibility_days),
        is_recurring: Set(model.is_recurring),
        status: Set(model.status),
        priority: Set(model.priority),
        snooze_count: Set(model.snooze_count),
        max_snoozes: Set(model.max_snoozes),
        snoozed_until: Set(model.snoozed_until),
        seasonal_adjustments: Set(model.seasonal_adjustments),
        snooze_history: Set(model.snooze_history),
        completion_history: Set(model.completion_history),
        compliance_rate: Set(model.compliance_rate),
        completed_at: Set(model.completed_at),
        created_at: Set(model.created_at),
        updated_at: Set(model.updated_at),
    };
    Ok(active.insert(db).await?)
}

/// Writes back every field the scheduler or an edit may have changed.
pub async fn save_state<C: ConnectionTrait>(
    db: &C,
    model: &reminder::Model,
) -> Result<reminder::Model> {
    let active = reminder::ActiveModel {
        id: Unchanged(model.id),
        title: Set(model.title.clone()),
        notes: Set(model.notes.clone()),
        due_date: Set(model.due_date),
        frequency_days: Set(model.frequency_days),
        flexibility_days: Set(model.flexibility_days),
        is_recurring: Set(model.is_recurring),
        status: Set(model.status),
        priority: Set(model.priority),
        snooze_count: Set(model.snooze_count),
        max_snoozes: Set(model.max_snoozes),
        snoozed_until: Set(model.snoozed_until),
        snooze_history: Set(model.snooze_history.clone()),
        completion_history: Set(model.completion_history.clone()),
        compliance_rate: Set(model.compliance_rate),
        completed_at: Set(model.completed_at),
        updated_at: Set(model.updated_at),
        ..Default::default()
    };
    Ok(active.update(db).await?)
}

pub async fn find_owned(db: &DatabaseConnection, user_id: i32, id: Uuid) -> Result<reminder::Model> {
    match Reminder::find_by_id(id).one(db).await? {
        Some(r) if r.user_id == user_id => Ok(r),
        _ => Err(AppError::not_found("reminder", id)),
    }
}

/// Soonest due first.
pub async fn list_for_user(
    db: &DatabaseConnection,
    user_id: i32,
    filter: &ReminderFilter,
) -> Result<Vec<reminder::Model>> {
    let mut query = Reminder::find().filter(reminder::Column::UserId.eq(user_id));
    if let Some(status) = filter.status {
        query = query.filter(reminder::Column::Status.eq(status));
    }
    if let Some(plant_id) = filter.plant_id {
        query = query.filter(reminder::Column::PlantId.eq(plant_id));
    }
    if let Some(care_type) = filter.care_type {
        query = query.filter(reminder::Column::CareType.eq(care_type));
    }
    Ok(query
        .order_by_asc(reminder::Column::DueDate)
        .all(db)
        .await?)
}

/// Later occurrences are removed with their root through the parent foreign key.
pub async fn delete_owned(db: &DatabaseConnection, user_id: i32, id: Uuid) -> Result<()> {
    let existing = find_owned(db, user_id, id).await?;
    Reminder::delete_by_id(existing.id).exec(db).await?;
    Ok(())
}

pub async fn has_active_for(
    db: &DatabaseConnection,
    plant_id: i32,
    care_type: CareType,
) -> Result<bool> {
    let found = Reminder::find()
        .filter(reminder::Column::PlantId.eq(plant_id))
        .filter(reminder::Column::CareType.eq(care_type))
        .filter(reminder::Column::Status.is_in(ACTIVE_STATUSES))
        .one(db)
        .await?;
    Ok(found.is_some())
}

/// Active reminders whose status may need an automatic transition at `now`.
pub async fn find_needing_refresh(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<reminder::Model>> {
    Ok(Reminder::find()
        .filter(reminder::Column::Status.is_in(ACTIVE_STATUSES))
        .filter(
            Condition::any()
                .add(reminder::Column::DueDate.lte(now))
                .add(reminder::Column::SnoozedUntil.lte(now)),
        )
        .all(db)
        .await?)
}

pub async fn all_for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<reminder::Model>> {
    list_for_user(db, user_id, &ReminderFilter::default()).await
}

pub fn summarize(reminders: &[reminder::Model]) -> ReminderStats {
    let mut by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut completions = 0;
    let mut on_time_completions = 0;

    for r in reminders {
        *by_status.entry(r.status.as_str()).or_insert(0) += 1;
        if r.status == ReminderStatus::Completed {
            // Histories are carried between occurrences; only the entry for this one counts.
            if let Some(last) = r.completion_history.0.last() {
                completions += 1;
                if last.was_on_time {
                    on_time_completions += 1;
                }
            }
        }
    }

    let compliance_rate = if completions == 0 {
        DEFAULT_COMPLIANCE_RATE
    } else {
        on_time_completions as f64 / completions as f64
    };

    ReminderStats {
        total: reminders.len(),
        by_status,
        completions,
        on_time_completions,
        compliance_rate,
    }
}
