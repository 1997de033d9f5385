use crate::entities::{care_log, CareLog, CareType};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewCareLog {
    pub plant_id: i32,
    pub user_id: i32,
    pub care_type: CareType,
    pub notes: Option<String>,
    pub reminder_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
}

pub async fn create(db: &DatabaseConnection, log: NewCareLog) -> Result<care_log::Model> {
    let active = care_log::ActiveModel {
        id: Set(Uuid::new_v4()),
        plant_id: Set(log.plant_id),
        user_id: Set(log.user_id),
        care_type: Set(log.care_type),
        notes: Set(log.notes),
        reminder_id: Set(log.reminder_id),
        performed_at: Set(log.performed_at),
        created_at: Set(Utc::now()),
    };
    Ok(active.insert(db).await?)
}

/// Newest first.
pub async fn list_for_plant(db: &DatabaseConnection, plant_id: i32) -> Result<Vec<care_log::Model>> {
    Ok(CareLog::find()
        .filter(care_log::Column::PlantId.eq(plant_id))
        .order_by_desc(care_log::Column::PerformedAt)
        .all(db)
        .await?)
}

pub async fn last_care_by_type(
    db: &DatabaseConnection,
    plant_id: i32,
) -> Result<HashMap<CareType, DateTime<Utc>>> {
    Ok(latest_per_type(&list_for_plant(db, plant_id).await?))
}

pub async fn last_care_for(
    db: &DatabaseConnection,
    plant_id: i32,
    care_type: CareType,
) -> Result<Option<DateTime<Utc>>> {
    let latest = CareLog::find()
        .filter(care_log::Column::PlantId.eq(plant_id))
        .filter(care_log::Column::CareType.eq(care_type))
        .order_by_desc(care_log::Column::PerformedAt)
        .one(db)
        .await?;
    Ok(latest.map(|log| log.performed_at))
}

pub fn latest_per_type(logs: &[care_log::Model]) -> HashMap<CareType, DateTime<Utc>> {
    let mut latest: HashMap<CareType, DateTime<Utc>> = HashMap::new();
    for log in logs {
        latest
            .entry(log.care_type)
            .and_modify(|at| {
                if log.performed_at > *at {
                    *at = log.performed_at;
                }
            })
            .or_insert(log.performed_at);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn log(care_type: CareType, performed_at: DateTime<Utc>) -> care_log::Model {
        care_log::Model {
            id: Uuid::new_v4(),
            plant_id: 1,
            user_id: 1,
            care_type,
            notes: None,
            reminder_id: None,
            performed_at,
            created_at: performed_at,
        }
    }

    #[test]
    fn test_latest_per_type() {
        let base = Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).unwrap();
        let logs = vec![
            log(CareType::Watering, base),
            log(CareType::Watering, base + Duration::days(3)),
            log(CareType::Fertilizing, base + Duration::days(1)),
            log(CareType::Watering, base + Duration::days(2)),
        ];
        let latest = latest_per_type(&logs);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[&CareType::Watering], base + Duration::days(3));
        assert_eq!(latest[&CareType::Fertilizing], base + Duration::days(1));
    }
}
