use super::response::{message, success};
use super::Services;
use crate::entities::reminder::{CompletionRecord, SnoozeRecord};
use crate::entities::{plant, reminder, CareType, Priority, ReminderStatus};
use crate::error::{AppError, Result};
use crate::notifications::{self, ReminderEvent, ReminderEventKind};
use crate::repository::care_logs::{self, NewCareLog};
use crate::repository::{plants, reminders};
use crate::repository::reminders::ReminderFilter;
use crate::scheduler::{
    validate_frequency, CareProfile, DueDateInput, NewReminder, Recommendation, Season,
    SeasonalMultipliers, WeatherConditions, MAX_SNOOZES_CAP,
};
use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
pub struct ReminderResponse {
    pub id: Uuid,
    pub plant_id: Option<i32>,
    pub parent_id: Option<Uuid>,
    pub care_type: CareType,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub original_due_date: DateTime<Utc>,
    pub frequency_days: i32,
    pub flexibility_days: i32,
    pub is_recurring: bool,
    pub status: ReminderStatus,
    pub priority: Priority,
    pub snooze_count: i32,
    pub max_snoozes: i32,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub seasonal_adjustments: SeasonalMultipliers,
    pub compliance_rate: f64,
    pub snooze_history: Vec<SnoozeRecord>,
    pub completion_history: Vec<CompletionRecord>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<reminder::Model> for ReminderResponse {
    fn from(model: reminder::Model) -> Self {
        Self {
            id: model.id,
            plant_id: model.plant_id,
            parent_id: model.parent_id,
            care_type: model.care_type,
            title: model.title,
            notes: model.notes,
            due_date: model.due_date,
            original_due_date: model.original_due_date,
            frequency_days: model.frequency_days,
            flexibility_days: model.flexibility_days,
            is_recurring: model.is_recurring,
            status: model.status,
            priority: model.priority,
            snooze_count: model.snooze_count,
            max_snoozes: model.max_snoozes,
            snoozed_until: model.snoozed_until,
            seasonal_adjustments: model.seasonal_adjustments,
            compliance_rate: model.compliance_rate,
            snooze_history: model.snooze_history.0,
            completion_history: model.completion_history.0,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateReminderRequest {
    pub plant_id: Option<i32>,
    pub care_type: CareType,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub frequency_days: Option<i32>,
    pub flexibility_days: Option<i32>,
    pub is_recurring: Option<bool>,
    pub max_snoozes: Option<i32>,
    pub seasonal_adjustments: Option<SeasonalMultipliers>,
}

#[derive(Deserialize)]
pub struct UpdateReminderRequest {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub frequency_days: Option<i32>,
    pub flexibility_days: Option<i32>,
    pub is_recurring: Option<bool>,
    pub max_snoozes: Option<i32>,
}

#[derive(Deserialize, Default)]
pub struct CompleteRequest {
    pub notes: Option<String>,
    pub log_care: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct SnoozeRequest {
    pub hours: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct SmartScheduleRequest {
    pub plant_id: Option<i32>,
    #[serde(default)]
    pub create: bool,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub reminder: ReminderResponse,
    pub completion: CompletionRecord,
    pub next_reminder: Option<ReminderResponse>,
}

#[derive(Serialize)]
pub struct SmartScheduleResponse {
    pub plant_id: i32,
    pub season: Season,
    pub weather: Option<WeatherConditions>,
    pub recommendations: Vec<Recommendation>,
    pub created: Vec<ReminderResponse>,
}

fn default_title(care_type: CareType, plant: Option<&plant::Model>) -> String {
    match plant {
        Some(p) => format!("{} {}", care_type.label(), p.name),
        None => care_type.label().to_string(),
    }
}

/// Loads an owned reminder with automatic transitions applied and persisted.
async fn load_refreshed(
    db: &DatabaseConnection,
    services: &Services,
    user_id: i32,
    id: Uuid,
) -> Result<reminder::Model> {
    let mut model = reminders::find_owned(db, user_id, id).await?;
    if services.scheduler.refresh(&mut model, Utc::now()) {
        model = reminders::save_state(db, &model).await?;
    }
    Ok(model)
}

fn record_reminder_span(action: &str, model: &reminder::Model) {
    let span = tracing::Span::current();
    span.record("table", "reminders")
        .record("action", action)
        .record("reminder_id", tracing::field::display(model.id));
    if let Some(plant_id) = model.plant_id {
        span.record("plant_id", plant_id);
    }
}

async fn persist_new(
    db: &DatabaseConnection,
    services: &Services,
    model: reminder::Model,
) -> Result<reminder::Model> {
    let created = reminders::insert(db, model).await?;
    announce_created(services, &created);
    Ok(created)
}

fn announce_created(services: &Services, created: &reminder::Model) {
    crate::metrics::increment_reminders_created(created.care_type.label());
    notifications::dispatch(
        services.notifier.clone(),
        ReminderEvent::new(ReminderEventKind::Created, created),
    );
}

/// Creates the first reminder for a care type once it has been logged, when the
/// plant has a frequency for it and nothing is already scheduled.
pub(crate) async fn schedule_initial_reminder(
    db: &DatabaseConnection,
    services: &Services,
    plant: &plant::Model,
    care_type: CareType,
    performed_at: DateTime<Utc>,
) -> Result<Option<reminder::Model>> {
    let profile = CareProfile {
        watering_every_days: plant.watering_every_days,
        fertilizer_every_weeks: plant.fertilizer_every_weeks,
    };
    let Some(frequency_days) = profile.frequency_for(care_type) else {
        return Ok(None);
    };
    if reminders::has_active_for(db, plant.id, care_type).await? {
        return Ok(None);
    }

    let now = Utc::now();
    let scheduler = &services.scheduler;
    let weather = if care_type == CareType::Watering {
        services.weather_for(Some(plant)).await
    } else {
        None
    };
    let due_date = scheduler.compute_next_due_date(
        &DueDateInput {
            base_frequency_days: frequency_days,
            last_care_date: Some(performed_at),
            season: Season::of(now),
            care_type,
            weather_impact: scheduler.assess_weather(weather.as_ref()),
            multipliers: scheduler.config().multipliers,
        },
        now,
    )?;

    let model = scheduler.new_reminder(
        NewReminder {
            user_id: plant.user_id,
            plant_id: Some(plant.id),
            parent_id: None,
            care_type,
            title: default_title(care_type, Some(plant)),
            notes: None,
            due_date,
            frequency_days,
            flexibility_days: 0,
            is_recurring: true,
            max_snoozes: scheduler.config().default_max_snoozes,
            seasonal_adjustments: scheduler.config().multipliers,
            completion_history: Default::default(),
        },
        now,
    )?;

    let created = persist_new(db, services, model).await?;
    tracing::info!(
        "Scheduled initial {:?} reminder {} for plant {}",
        care_type,
        created.id,
        plant.id
    );
    Ok(Some(created))
}

// POST /reminders
pub async fn create_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Json(payload): Json<CreateReminderRequest>,
) -> Result<Response> {
    let plant = match payload.plant_id {
        Some(id) => Some(plants::find_owned(&db, user_id, id).await?),
        None => None,
    };
    let profile = plant
        .as_ref()
        .map(|p| CareProfile {
            watering_every_days: p.watering_every_days,
            fertilizer_every_weeks: p.fertilizer_every_weeks,
        })
        .unwrap_or_default();

    let frequency_days = payload
        .frequency_days
        .or_else(|| profile.frequency_for(payload.care_type))
        .ok_or_else(|| AppError::validation("frequency_days is required"))?;
    validate_frequency(frequency_days)?;

    let scheduler = &services.scheduler;
    let multipliers = payload
        .seasonal_adjustments
        .unwrap_or(scheduler.config().multipliers);
    multipliers.validate().map_err(AppError::validation)?;
    let now = Utc::now();

    let due_date = match payload.due_date {
        Some(due) => due,
        None => {
            let last_care_date = match &plant {
                Some(p) => care_logs::last_care_for(&db, p.id, payload.care_type).await?,
                None => None,
            };
            let weather = if payload.care_type == CareType::Watering {
                services.weather_for(plant.as_ref()).await
            } else {
                None
            };
            scheduler.compute_next_due_date(
                &DueDateInput {
                    base_frequency_days: frequency_days,
                    last_care_date,
                    season: Season::of(now),
                    care_type: payload.care_type,
                    weather_impact: scheduler.assess_weather(weather.as_ref()),
                    multipliers,
                },
                now,
            )?
        }
    };

    let model = scheduler.new_reminder(
        NewReminder {
            user_id,
            plant_id: plant.as_ref().map(|p| p.id),
            parent_id: None,
            care_type: payload.care_type,
            title: payload
                .title
                .unwrap_or_else(|| default_title(payload.care_type, plant.as_ref())),
            notes: payload.notes,
            due_date,
            frequency_days,
            flexibility_days: payload.flexibility_days.unwrap_or(0),
            is_recurring: payload.is_recurring.unwrap_or(true),
            max_snoozes: payload
                .max_snoozes
                .unwrap_or(scheduler.config().default_max_snoozes),
            seasonal_adjustments: multipliers,
            completion_history: Default::default(),
        },
        now,
    )?;

    let created = persist_new(&db, &services, model).await?;
    record_reminder_span("create_reminder", &created);
    tracing::Span::current().record("business_event", "Reminder created");

    Ok(success(StatusCode::CREATED, ReminderResponse::from(created)))
}

// GET /reminders
pub async fn list_reminders(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Query(filter): Query<ReminderFilter>,
) -> Result<Response> {
    let now = Utc::now();
    // Stored statuses may be stale until refreshed, so status is filtered afterwards.
    let query = ReminderFilter {
        status: None,
        ..filter.clone()
    };
    let mut out = Vec::new();
    for mut model in reminders::list_for_user(&db, user_id, &query).await? {
        if services.scheduler.refresh(&mut model, now) {
            model = reminders::save_state(&db, &model).await?;
        }
        if filter.status.map_or(true, |s| s == model.status) {
            out.push(ReminderResponse::from(model));
        }
    }
    Ok(success(StatusCode::OK, out))
}

// GET /reminders/stats
pub async fn reminder_stats(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
) -> Result<Response> {
    let now = Utc::now();
    let mut all = reminders::all_for_user(&db, user_id).await?;
    for model in all.iter_mut() {
        if services.scheduler.refresh(model, now) {
            *model = reminders::save_state(&db, model).await?;
        }
    }
    Ok(success(StatusCode::OK, reminders::summarize(&all)))
}

// GET /reminders/:id
pub async fn get_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let model = load_refreshed(&db, &services, user_id, id).await?;
    Ok(success(StatusCode::OK, ReminderResponse::from(model)))
}

// PATCH /reminders/:id
pub async fn update_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReminderRequest>,
) -> Result<Response> {
    let mut model = load_refreshed(&db, &services, user_id, id).await?;
    if model.status.is_terminal() {
        return Err(AppError::InvalidState {
            action: "update",
            status: model.status.as_str().to_string(),
        });
    }

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::validation("title cannot be empty"));
        }
        model.title = title.trim().to_string();
    }
    if let Some(notes) = payload.notes { model.notes = Some(notes); }
    if let Some(days) = payload.frequency_days {
        validate_frequency(days)?;
        model.frequency_days = days;
    }
    if let Some(days) = payload.flexibility_days {
        if days < 0 {
            return Err(AppError::validation("flexibility_days cannot be negative"));
        }
        model.flexibility_days = days;
    }
    if let Some(recurring) = payload.is_recurring { model.is_recurring = recurring; }
    if let Some(max) = payload.max_snoozes {
        if !(0..=MAX_SNOOZES_CAP).contains(&max) || max < model.snooze_count {
            return Err(AppError::validation(format!(
                "max_snoozes must be between the current snooze count and {}",
                MAX_SNOOZES_CAP
            )));
        }
        model.max_snoozes = max;
    }
    if let Some(due) = payload.due_date {
        model.due_date = due;
        if model.status == ReminderStatus::Snoozed {
            model.snoozed_until = Some(due);
        }
    }

    let now = Utc::now();
    services.scheduler.refresh(&mut model, now);
    model.updated_at = now;
    let saved = reminders::save_state(&db, &model).await?;
    record_reminder_span("update_reminder", &saved);

    Ok(success(StatusCode::OK, ReminderResponse::from(saved)))
}

// DELETE /reminders/:id
pub async fn delete_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    reminders::delete_owned(&db, user_id, id).await?;
    tracing::Span::current()
        .record("table", "reminders")
        .record("action", "delete_reminder")
        .record("reminder_id", tracing::field::display(id));
    Ok(message(StatusCode::OK, "Reminder deleted"))
}

// POST /reminders/:id/complete
pub async fn complete_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
    payload: Option<Json<CompleteRequest>>,
) -> Result<Response> {
    let Json(payload) = payload.unwrap_or_default();
    let mut model = load_refreshed(&db, &services, user_id, id).await?;

    let now = Utc::now();
    let completion = services
        .scheduler
        .complete(&mut model, user_id, payload.notes.clone(), now)?;

    let plant = match model.plant_id {
        Some(plant_id) => plants::find_owned(&db, user_id, plant_id).await.ok(),
        None => None,
    };
    let weather = if model.care_type == CareType::Watering {
        services.weather_for(plant.as_ref()).await
    } else {
        None
    };
    let impact = services.scheduler.assess_weather(weather.as_ref());
    let next = services.scheduler.next_occurrence(&model, impact, now)?;

    // The completion and its successor are written together or not at all.
    let txn = db.begin().await?;
    let completed = reminders::save_state(&txn, &model).await?;
    let next_reminder = match next {
        Some(next) => Some(reminders::insert(&txn, next).await?),
        None => None,
    };
    txn.commit().await?;

    crate::metrics::increment_reminders_completed(completion.was_on_time);
    crate::metrics::record_days_overdue(completion.days_overdue);
    notifications::dispatch(
        services.notifier.clone(),
        ReminderEvent::new(ReminderEventKind::Completed, &completed),
    );
    if let Some(created) = &next_reminder {
        announce_created(&services, created);
    }

    if payload.log_care.unwrap_or(true) {
        if let Some(p) = &plant {
            let logged = care_logs::create(
                &db,
                NewCareLog {
                    plant_id: p.id,
                    user_id,
                    care_type: completed.care_type,
                    notes: payload.notes,
                    reminder_id: Some(completed.id),
                    performed_at: now,
                },
            )
            .await;
            if let Err(e) = logged {
                tracing::error!("Failed to log care for reminder {}: {}", completed.id, e);
            }
        }
    }

    record_reminder_span("complete_reminder", &completed);
    tracing::Span::current().record(
        "business_event",
        if completion.was_on_time { "Reminder completed on time" } else { "Reminder completed late" },
    );

    Ok(success(
        StatusCode::OK,
        CompleteResponse {
            reminder: completed.into(),
            completion,
            next_reminder: next_reminder.map(ReminderResponse::from),
        },
    ))
}

// POST /reminders/:id/snooze
pub async fn snooze_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
    payload: Option<Json<SnoozeRequest>>,
) -> Result<Response> {
    let Json(payload) = payload.unwrap_or_default();
    let mut model = load_refreshed(&db, &services, user_id, id).await?;

    let hours = payload
        .hours
        .unwrap_or(services.scheduler.config().default_snooze_hours);
    if let Err(e) = services
        .scheduler
        .snooze(&mut model, hours, payload.reason, Utc::now())
    {
        if matches!(e, AppError::LimitExceeded { .. }) {
            crate::metrics::increment_snooze_limit_hits();
        }
        record_reminder_span("snooze_reminder_failed", &model);
        return Err(e);
    }

    let saved = reminders::save_state(&db, &model).await?;
    crate::metrics::increment_reminders_snoozed();
    notifications::dispatch(
        services.notifier.clone(),
        ReminderEvent::new(ReminderEventKind::Snoozed, &saved),
    );
    record_reminder_span("snooze_reminder", &saved);

    Ok(success(StatusCode::OK, ReminderResponse::from(saved)))
}

// POST /reminders/:id/dismiss
pub async fn dismiss_reminder(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(id): Path<Uuid>,
) -> Result<Response> {
    let mut model = load_refreshed(&db, &services, user_id, id).await?;
    services.scheduler.dismiss(&mut model, Utc::now())?;
    let saved = reminders::save_state(&db, &model).await?;

    crate::metrics::increment_reminders_dismissed();
    record_reminder_span("dismiss_reminder", &saved);

    Ok(success(StatusCode::OK, ReminderResponse::from(saved)))
}

// POST /reminders/smart-schedule
pub async fn smart_schedule(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Json(payload): Json<SmartScheduleRequest>,
) -> Result<Response> {
    let plant_id = payload
        .plant_id
        .ok_or_else(|| AppError::validation("plant_id is required"))?;
    let plant = plants::find_owned(&db, user_id, plant_id).await?;

    let profile = CareProfile {
        watering_every_days: plant.watering_every_days,
        fertilizer_every_weeks: plant.fertilizer_every_weeks,
    };
    if profile.configured().is_empty() {
        return Err(AppError::validation(
            "plant has no watering or fertilizing frequency configured",
        ));
    }

    let now = Utc::now();
    let last_care = care_logs::last_care_by_type(&db, plant.id).await?;
    let weather = services.weather_for(Some(&plant)).await;
    let history = reminders::list_for_user(
        &db,
        user_id,
        &ReminderFilter {
            plant_id: Some(plant.id),
            ..Default::default()
        },
    )
    .await?;
    let compliance = reminders::summarize(&history).compliance_rate;

    let scheduler = &services.scheduler;
    let recommendations =
        scheduler.recommend(&profile, &last_care, weather.as_ref(), compliance, now)?;

    let mut created = Vec::new();
    if payload.create {
        for rec in &recommendations {
            if reminders::has_active_for(&db, plant.id, rec.care_type).await? {
                continue;
            }
            let model = scheduler.new_reminder(
                NewReminder {
                    user_id,
                    plant_id: Some(plant.id),
                    parent_id: None,
                    care_type: rec.care_type,
                    title: default_title(rec.care_type, Some(&plant)),
                    notes: None,
                    due_date: rec.due_date,
                    frequency_days: rec.base_frequency_days,
                    flexibility_days: 0,
                    is_recurring: true,
                    max_snoozes: scheduler.config().default_max_snoozes,
                    seasonal_adjustments: scheduler.config().multipliers,
                    completion_history: Default::default(),
                },
                now,
            )?;
            created.push(ReminderResponse::from(persist_new(&db, &services, model).await?));
        }
    }

    tracing::Span::current()
        .record("table", "reminders")
        .record("action", "smart_schedule")
        .record("plant_id", plant.id);

    Ok(success(
        StatusCode::OK,
        SmartScheduleResponse {
            plant_id: plant.id,
            season: Season::of(now),
            weather,
            recommendations,
            created,
        },
    ))
}
