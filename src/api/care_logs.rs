use super::reminders::{schedule_initial_reminder, ReminderResponse};
use super::response::success;
use super::Services;
use crate::entities::{care_log, CareType};
use crate::error::{AppError, Result};
use crate::repository::care_logs::{self, NewCareLog};
use crate::repository::plants;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct CreateCareLogRequest {
    pub care_type: CareType,
    pub notes: Option<String>,
    pub performed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CareLogCreated {
    pub care_log: care_log::Model,
    pub reminder: Option<ReminderResponse>,
}

pub async fn list_care_logs(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Path(plant_id): Path<i32>,
) -> Result<Response> {
    let plant = plants::find_owned(&db, user_id, plant_id).await?;
    let logs = care_logs::list_for_plant(&db, plant.id).await?;
    Ok(success(StatusCode::OK, logs))
}

pub async fn create_care_log(
    Extension(db): Extension<DatabaseConnection>,
    Extension(services): Extension<Services>,
    Extension(user_id): Extension<i32>,
    Path(plant_id): Path<i32>,
    Json(payload): Json<CreateCareLogRequest>,
) -> Result<Response> {
    let plant = plants::find_owned(&db, user_id, plant_id).await?;

    let now = Utc::now();
    let performed_at = payload.performed_at.unwrap_or(now);
    // Small allowance for client clock drift.
    if performed_at > now + Duration::minutes(5) {
        return Err(AppError::validation("performed_at cannot be in the future"));
    }

    let log = care_logs::create(
        &db,
        NewCareLog {
            plant_id: plant.id,
            user_id,
            care_type: payload.care_type,
            notes: payload.notes,
            reminder_id: None,
            performed_at,
        },
    )
    .await?;

    let reminder =
        schedule_initial_reminder(&db, &services, &plant, payload.care_type, performed_at).await?;

    tracing::Span::current()
        .record("table", "care_logs")
        .record("action", "create_care_log")
        .record("plant_id", plant.id)
        .record("business_event", "Care logged");

    Ok(success(
        StatusCode::CREATED,
        CareLogCreated {
            care_log: log,
            reminder: reminder.map(ReminderResponse::from),
        },
    ))
}
