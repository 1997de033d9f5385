use super::response::{message, success};
use crate::error::Result;
use crate::repository::plants::{self, PlantFields};
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::Response,
};
use sea_orm::DatabaseConnection;

#[derive(serde::Deserialize)]
pub struct PlantRequest {
    name: Option<String>,
    species: Option<String>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    watering_every_days: Option<i32>,
    fertilizer_every_weeks: Option<i32>,
    notes: Option<String>,
}

impl From<PlantRequest> for PlantFields {
    fn from(req: PlantRequest) -> Self {
        Self {
            name: req.name,
            species: req.species,
            location: req.location,
            latitude: req.latitude,
            longitude: req.longitude,
            watering_every_days: req.watering_every_days,
            fertilizer_every_weeks: req.fertilizer_every_weeks,
            notes: req.notes,
        }
    }
}

pub async fn create_plant(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Json(payload): Json<PlantRequest>,
) -> Result<Response> {
    let plant = plants::create(&db, user_id, payload.into()).await?;

    tracing::Span::current()
        .record("table", "plants")
        .record("action", "create_plant")
        .record("plant_id", plant.id)
        .record("business_event", "Plant registered");
    crate::metrics::increment_plants();

    Ok(success(StatusCode::CREATED, plant))
}

pub async fn list_plants(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
) -> Result<Response> {
    let plants = plants::list_for_user(&db, user_id).await?;
    Ok(success(StatusCode::OK, plants))
}

pub async fn get_plant(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Path(plant_id): Path<i32>,
) -> Result<Response> {
    let plant = plants::find_owned(&db, user_id, plant_id).await?;
    Ok(success(StatusCode::OK, plant))
}

pub async fn update_plant(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Path(plant_id): Path<i32>,
    Json(payload): Json<PlantRequest>,
) -> Result<Response> {
    let existing = plants::find_owned(&db, user_id, plant_id).await?;
    let plant = plants::update(&db, existing, payload.into()).await?;

    tracing::Span::current()
        .record("table", "plants")
        .record("action", "update_plant")
        .record("plant_id", plant.id);

    Ok(success(StatusCode::OK, plant))
}

pub async fn delete_plant(
    Extension(db): Extension<DatabaseConnection>,
    Extension(user_id): Extension<i32>,
    Path(plant_id): Path<i32>,
) -> Result<Response> {
    plants::delete_owned(&db, user_id, plant_id).await?;

    tracing::Span::current()
        .record("table", "plants")
        .record("action", "delete_plant")
        .record("plant_id", plant_id);
    crate::metrics::decrement_plants();

    Ok(message(StatusCode::OK, "Plant deleted"))
}
