//! Reminder scheduling: due-date computation with seasonal and weather
//! adjustments, plus the reminder lifecycle (see [`lifecycle`]).
//!
//! Everything here is pure computation over values handed in by the caller.
//! `now` is always an argument so results are reproducible; persistence and
//! collaborator I/O live in `repository`, `weather` and `notifications`.

pub mod impact;
pub mod lifecycle;
pub mod season;

pub use impact::{ForecastDay, WeatherConditions, WeatherImpact};
pub use season::{Season, SeasonalMultipliers};

use crate::entities::reminder::{CompletionHistory, SnoozeHistory};
use crate::entities::{reminder, CareType, Priority, ReminderStatus};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

pub const MAX_FREQUENCY_DAYS: i32 = 365;
pub const DEFAULT_COMPLIANCE_RATE: f64 = 0.8;
/// Upper bound for a reminder's `max_snoozes`.
pub const MAX_SNOOZES_CAP: i32 = 10;

/// Tunables for the scheduler. One table, shared by every call site.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub multipliers: SeasonalMultipliers,
    pub rain_threshold_mm: f64,
    pub rain_window_days: u32,
    pub rain_delay_days: i64,
    pub heat_threshold_c: f64,
    pub dry_humidity_pct: f64,
    pub heat_advance_hours: i64,
    pub default_max_snoozes: i32,
    pub default_snooze_hours: i64,
    pub max_snooze_hours: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            multipliers: SeasonalMultipliers::default(),
            rain_threshold_mm: 10.0,
            rain_window_days: 3,
            rain_delay_days: 2,
            heat_threshold_c: 30.0,
            dry_humidity_pct: 40.0,
            heat_advance_hours: 12,
            default_max_snoozes: 3,
            default_snooze_hours: 24,
            max_snooze_hours: 24 * 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DueDateInput {
    pub base_frequency_days: i32,
    pub last_care_date: Option<DateTime<Utc>>,
    pub season: Season,
    pub care_type: CareType,
    pub weather_impact: WeatherImpact,
    pub multipliers: SeasonalMultipliers,
}

/// Everything needed to create a fresh reminder record.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub user_id: i32,
    pub plant_id: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub care_type: CareType,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub frequency_days: i32,
    pub flexibility_days: i32,
    pub is_recurring: bool,
    pub max_snoozes: i32,
    pub seasonal_adjustments: SeasonalMultipliers,
    pub completion_history: CompletionHistory,
}

/// Care frequencies configured on a plant.
#[derive(Debug, Clone, Copy, Default)]
pub struct CareProfile {
    pub watering_every_days: Option<i32>,
    pub fertilizer_every_weeks: Option<i32>,
}

impl CareProfile {
    pub fn frequency_for(&self, care_type: CareType) -> Option<i32> {
        let days = match care_type {
            CareType::Watering => self.watering_every_days,
            CareType::Fertilizing => self.fertilizer_every_weeks.map(|weeks| weeks * 7),
            _ => None,
        };
        days.filter(|days| *days >= 1)
    }

    pub fn configured(&self) -> Vec<(CareType, i32)> {
        [CareType::Watering, CareType::Fertilizing]
            .into_iter()
            .filter_map(|care_type| self.frequency_for(care_type).map(|days| (care_type, days)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub care_type: CareType,
    pub season: Season,
    pub base_frequency_days: i32,
    pub adjusted_frequency_days: i64,
    pub last_care_date: Option<DateTime<Utc>>,
    pub due_date: DateTime<Utc>,
    pub overdue: bool,
    pub days_overdue: i64,
    pub priority: Priority,
    pub confidence: f64,
    pub weather_impact: WeatherImpact,
}

#[derive(Debug, Clone, Default)]
pub struct ReminderScheduler {
    config: SchedulerConfig,
}

impl ReminderScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn assess_weather(&self, conditions: Option<&WeatherConditions>) -> WeatherImpact {
        conditions
            .map(|c| WeatherImpact::assess(c, &self.config))
            .unwrap_or_default()
    }

    /// `round(base * multiplier)`, never shorter than a day.
    pub fn adjusted_frequency_days(
        base_frequency_days: i32,
        season: Season,
        multipliers: &SeasonalMultipliers,
    ) -> i64 {
        let adjusted = (base_frequency_days as f64 * multipliers.for_season(season)).round() as i64;
        adjusted.max(1)
    }

    pub fn compute_next_due_date(
        &self,
        input: &DueDateInput,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        validate_frequency(input.base_frequency_days)?;
        input.multipliers.validate().map_err(AppError::validation)?;

        let adjusted =
            Self::adjusted_frequency_days(input.base_frequency_days, input.season, &input.multipliers);

        // Without history only half the interval is trusted.
        let (start, interval_days) = match input.last_care_date {
            Some(last) => (last, adjusted),
            None => (now, ((adjusted as f64) / 2.0).round().max(1.0) as i64),
        };

        let shift = match (input.care_type, input.weather_impact) {
            (CareType::Watering, WeatherImpact::Decrease) => {
                Duration::try_days(self.config.rain_delay_days)
            }
            (CareType::Watering, WeatherImpact::Increase) => {
                Duration::try_hours(self.config.heat_advance_hours).map(|h| -h)
            }
            _ => Some(Duration::zero()),
        };

        Duration::try_days(interval_days)
            .and_then(|interval| start.checked_add_signed(interval))
            .zip(shift)
            .and_then(|(due, shift)| due.checked_add_signed(shift))
            .ok_or_else(|| AppError::validation("next due date is out of range"))
    }

    pub fn confidence(compliance_rate: f64, has_history: bool, weather_known: bool) -> f64 {
        let mut score = if has_history {
            0.6 + 0.4 * compliance_rate.clamp(0.0, 1.0)
        } else {
            0.5
        };
        if !weather_known {
            score -= 0.1;
        }
        (score.clamp(0.0, 1.0) * 1000.0).round() / 1000.0
    }

    /// Builds a new pending reminder, with automatic status rules already applied.
    pub fn new_reminder(&self, draft: NewReminder, now: DateTime<Utc>) -> Result<reminder::Model> {
        validate_frequency(draft.frequency_days)?;
        if draft.title.trim().is_empty() {
            return Err(AppError::validation("title cannot be empty"));
        }
        if !(0..=MAX_SNOOZES_CAP).contains(&draft.max_snoozes) {
            return Err(AppError::validation(format!(
                "max_snoozes must be between 0 and {}",
                MAX_SNOOZES_CAP
            )));
        }
        draft
            .seasonal_adjustments
            .validate()
            .map_err(AppError::validation)?;
        if draft.flexibility_days < 0 {
            return Err(AppError::validation("flexibility_days cannot be negative"));
        }

        let compliance_rate = lifecycle::compliance_rate(&draft.completion_history);
        let mut model = reminder::Model {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            plant_id: draft.plant_id,
            parent_id: draft.parent_id,
            care_type: draft.care_type,
            title: draft.title.trim().to_string(),
            notes: draft.notes,
            due_date: draft.due_date,
            original_due_date: draft.due_date,
            frequency_days: draft.frequency_days,
            flexibility_days: draft.flexibility_days,
            is_recurring: draft.is_recurring,
            status: ReminderStatus::Pending,
            priority: Priority::Medium,
            snooze_count: 0,
            max_snoozes: draft.max_snoozes,
            snoozed_until: None,
            seasonal_adjustments: draft.seasonal_adjustments,
            snooze_history: SnoozeHistory::default(),
            completion_history: draft.completion_history,
            compliance_rate,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.refresh(&mut model, now);
        Ok(model)
    }

    /// One recommendation per care type the plant has a frequency for.
    pub fn recommend(
        &self,
        profile: &CareProfile,
        last_care: &HashMap<CareType, DateTime<Utc>>,
        weather: Option<&WeatherConditions>,
        compliance_rate: f64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>> {
        let season = Season::of(now);
        let weather_impact = self.assess_weather(weather);

        profile
            .configured()
            .into_iter()
            .map(|(care_type, base)| {
                let last_care_date = last_care.get(&care_type).copied();
                let input = DueDateInput {
                    base_frequency_days: base,
                    last_care_date,
                    season,
                    care_type,
                    weather_impact,
                    multipliers: self.config.multipliers,
                };
                let due_date = self.compute_next_due_date(&input, now)?;
                let days_overdue = lifecycle::whole_days_overdue(due_date, now);
                Ok(Recommendation {
                    care_type,
                    season,
                    base_frequency_days: base,
                    adjusted_frequency_days: Self::adjusted_frequency_days(
                        base,
                        season,
                        &self.config.multipliers,
                    ),
                    last_care_date,
                    due_date,
                    overdue: now > due_date,
                    days_overdue,
                    priority: lifecycle::priority_for(due_date, now),
                    confidence: Self::confidence(
                        compliance_rate,
                        last_care_date.is_some(),
                        weather.is_some(),
                    ),
                    weather_impact: if care_type == CareType::Watering {
                        weather_impact
                    } else {
                        WeatherImpact::None
                    },
                })
            })
            .collect()
    }
}

pub fn validate_frequency(days: i32) -> Result<()> {
    if !(1..=MAX_FREQUENCY_DAYS).contains(&days) {
        return Err(AppError::validation(format!(
            "frequency must be between 1 and {} days",
            MAX_FREQUENCY_DAYS
        )));
    }
    Ok(())
}
