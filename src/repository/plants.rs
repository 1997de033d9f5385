use crate::entities::{plant, Plant};
use crate::error::{AppError, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

#[derive(Debug, Clone, Default)]
pub struct PlantFields {
    pub name: Option<String>,
    pub species: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub watering_every_days: Option<i32>,
    pub fertilizer_every_weeks: Option<i32>,
    pub notes: Option<String>,
}

impl PlantFields {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name cannot be empty"));
            }
        }
        if let Some(days) = self.watering_every_days {
            crate::scheduler::validate_frequency(days)?;
        }
        if let Some(weeks) = self.fertilizer_every_weeks {
            if !(1..=52).contains(&weeks) {
                return Err(AppError::validation(
                    "fertilizer_every_weeks must be between 1 and 52",
                ));
            }
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::validation("latitude must be between -90 and 90"));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::validation("longitude must be between -180 and 180"));
            }
        }
        Ok(())
    }
}

pub async fn create(db: &DatabaseConnection, user_id: i32, fields: PlantFields) -> Result<plant::Model> {
    fields.validate()?;
    let name = fields
        .name
        .ok_or_else(|| AppError::validation("name is required"))?;

    let now = Utc::now();
    let new_plant = plant::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        species: Set(fields.species.unwrap_or_default()),
        location: Set(fields.location),
        latitude: Set(fields.latitude),
        longitude: Set(fields.longitude),
        watering_every_days: Set(fields.watering_every_days),
        fertilizer_every_weeks: Set(fields.fertilizer_every_weeks),
        notes: Set(fields.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(new_plant.insert(db).await?)
}

pub async fn find_owned(db: &DatabaseConnection, user_id: i32, plant_id: i32) -> Result<plant::Model> {
    match Plant::find_by_id(plant_id).one(db).await? {
        Some(p) if p.user_id == user_id => Ok(p),
        _ => Err(AppError::not_found("plant", plant_id)),
    }
}

pub async fn list_for_user(db: &DatabaseConnection, user_id: i32) -> Result<Vec<plant::Model>> {
    Ok(Plant::find()
        .filter(plant::Column::UserId.eq(user_id))
        .order_by_asc(plant::Column::Name)
        .all(db)
        .await?)
}

pub async fn update(
    db: &DatabaseConnection,
    existing: plant::Model,
    fields: PlantFields,
) -> Result<plant::Model> {
    fields.validate()?;

    let mut active = existing.into_active_model();
    if let Some(name) = fields.name { active.name = Set(name.trim().to_string()); }
    if let Some(species) = fields.species { active.species = Set(species); }
    if let Some(location) = fields.location { active.location = Set(Some(location)); }
    if let Some(lat) = fields.latitude { active.latitude = Set(Some(lat)); }
    if let Some(lon) = fields.longitude { active.longitude = Set(Some(lon)); }
    if let Some(days) = fields.watering_every_days { active.watering_every_days = Set(Some(days)); }
    if let Some(weeks) = fields.fertilizer_every_weeks { active.fertilizer_every_weeks = Set(Some(weeks)); }
    if let Some(notes) = fields.notes { active.notes = Set(Some(notes)); }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Care logs and reminders go with the plant.
pub async fn delete_owned(db: &DatabaseConnection, user_id: i32, plant_id: i32) -> Result<()> {
    let plant = find_owned(db, user_id, plant_id).await?;
    Plant::delete_by_id(plant.id).exec(db).await?;
    Ok(())
}
