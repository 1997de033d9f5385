//! Status transitions for a single reminder.
//!
//! ```text
//! pending ──(now > due)──▶ overdue
//! pending/overdue/snoozed ──snooze──▶ snoozed ──(snoozed_until passes)──▶ pending
//! pending/overdue/snoozed ──complete──▶ completed   (terminal)
//! pending/overdue/snoozed ──dismiss───▶ dismissed   (terminal)
//! ```
//!
//! Callers serialize concurrent mutations of the same record; nothing here
//! compares-and-swaps.

use super::{DueDateInput, NewReminder, ReminderScheduler, Season, WeatherImpact, DEFAULT_COMPLIANCE_RATE};
use crate::entities::reminder::{CompletionHistory, CompletionRecord, SnoozeRecord};
use crate::entities::{reminder, Priority, ReminderStatus};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Full days elapsed since `due_date`, zero when not yet due.
pub fn whole_days_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    if now <= due_date {
        return 0;
    }
    (now - due_date).num_days()
}

/// Started days since `due_date`: anything late counts as at least one day.
pub fn days_overdue_ceil(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let late_ms = (now - due_date).num_milliseconds();
    if late_ms <= 0 {
        return 0;
    }
    (late_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

pub fn priority_for(due_date: DateTime<Utc>, now: DateTime<Utc>) -> Priority {
    if now <= due_date {
        return Priority::Medium;
    }
    match whole_days_overdue(due_date, now) {
        d if d >= 7 => Priority::Urgent,
        d if d >= 3 => Priority::High,
        _ => Priority::Medium,
    }
}

pub fn compliance_rate(history: &CompletionHistory) -> f64 {
    if history.is_empty() {
        return DEFAULT_COMPLIANCE_RATE;
    }
    history.on_time_count() as f64 / history.len() as f64
}

impl ReminderScheduler {
    /// Priority is derived from lateness; any caller-set escalation is overridden.
    pub fn update_priority(&self, reminder: &reminder::Model, now: DateTime<Utc>) -> Priority {
        priority_for(reminder.due_date, now)
    }

    /// Applies the automatic transitions. Returns `true` when the record changed.
    pub fn refresh(&self, reminder: &mut reminder::Model, now: DateTime<Utc>) -> bool {
        if reminder.status.is_terminal() {
            return false;
        }
        let before = (reminder.status, reminder.priority, reminder.snoozed_until);

        if reminder.status == ReminderStatus::Snoozed {
            let until = reminder.snoozed_until.unwrap_or(reminder.due_date);
            if until <= now {
                reminder.status = ReminderStatus::Pending;
                reminder.snoozed_until = None;
            }
        }

        match reminder.status {
            ReminderStatus::Pending if now > reminder.due_date => {
                reminder.status = ReminderStatus::Overdue;
            }
            ReminderStatus::Overdue if now <= reminder.due_date => {
                reminder.status = ReminderStatus::Pending;
            }
            _ => {}
        }

        reminder.priority = self.update_priority(reminder, now);

        let changed = before != (reminder.status, reminder.priority, reminder.snoozed_until);
        if changed {
            reminder.updated_at = now;
        }
        changed
    }

    pub fn snooze(
        &self,
        reminder: &mut reminder::Model,
        hours: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        ensure_active(reminder, "snooze")?;
        if reminder.snooze_count >= reminder.max_snoozes {
            return Err(AppError::LimitExceeded {
                max: reminder.max_snoozes,
            });
        }
        if hours < 1 || hours > self.config.max_snooze_hours {
            return Err(AppError::validation(format!(
                "snooze hours must be between 1 and {}",
                self.config.max_snooze_hours
            )));
        }

        let original_date = reminder.due_date;
        let new_date = original_date
            .checked_add_signed(Duration::hours(hours))
            .ok_or_else(|| AppError::validation("snoozed due date is out of range"))?;

        reminder.due_date = new_date;
        reminder.snoozed_until = Some(new_date);
        reminder.status = ReminderStatus::Snoozed;
        reminder.snooze_count += 1;
        reminder.snooze_history.0.push(SnoozeRecord {
            snoozed_at: now,
            original_date,
            new_date,
            hours,
            reason: reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "snoozed by user".to_string()),
        });
        reminder.priority = self.update_priority(reminder, now);
        reminder.updated_at = now;
        Ok(())
    }

    pub fn complete(
        &self,
        reminder: &mut reminder::Model,
        completed_by: i32,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<CompletionRecord> {
        ensure_active(reminder, "complete")?;

        let record = CompletionRecord {
            completed_at: now,
            completed_by,
            was_on_time: now <= reminder.due_date,
            days_overdue: days_overdue_ceil(reminder.due_date, now),
            notes,
        };

        reminder.completion_history.0.push(record.clone());
        reminder.compliance_rate = compliance_rate(&reminder.completion_history);
        reminder.status = ReminderStatus::Completed;
        reminder.snoozed_until = None;
        reminder.completed_at = Some(now);
        reminder.updated_at = now;
        Ok(record)
    }

    pub fn dismiss(&self, reminder: &mut reminder::Model, now: DateTime<Utc>) -> Result<()> {
        ensure_active(reminder, "dismiss")?;
        reminder.status = ReminderStatus::Dismissed;
        reminder.snoozed_until = None;
        reminder.updated_at = now;
        Ok(())
    }

    /// Next sibling of a completed recurring reminder; `None` for one-off reminders.
    pub fn next_occurrence(
        &self,
        completed: &reminder::Model,
        weather_impact: WeatherImpact,
        now: DateTime<Utc>,
    ) -> Result<Option<reminder::Model>> {
        if !completed.is_recurring {
            return Ok(None);
        }

        let due_date = self.compute_next_due_date(
            &DueDateInput {
                base_frequency_days: completed.frequency_days,
                last_care_date: Some(completed.completed_at.unwrap_or(now)),
                season: Season::of(now),
                care_type: completed.care_type,
                weather_impact,
                multipliers: completed.seasonal_adjustments,
            },
            now,
        )?;

        let next = self.new_reminder(
            NewReminder {
                user_id: completed.user_id,
                plant_id: completed.plant_id,
                parent_id: Some(completed.parent_id.unwrap_or(completed.id)),
                care_type: completed.care_type,
                title: completed.title.clone(),
                notes: completed.notes.clone(),
                due_date,
                frequency_days: completed.frequency_days,
                flexibility_days: completed.flexibility_days,
                is_recurring: true,
                max_snoozes: completed.max_snoozes,
                seasonal_adjustments: completed.seasonal_adjustments,
                completion_history: completed.completion_history.clone(),
            },
            now,
        )?;
        Ok(Some(next))
    }
}

fn ensure_active(reminder: &reminder::Model, action: &'static str) -> Result<()> {
    if reminder.status.is_terminal() {
        return Err(AppError::InvalidState {
            action,
            status: reminder.status.as_str().to_string(),
        });
    }
    Ok(())
}
