use super::sea_orm_active_enums::{CareType, Priority, ReminderStatus};
use crate::scheduler::SeasonalMultipliers;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "reminders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: i32,
    pub plant_id: Option<i32>,
    /// Root of a recurrence chain; every later occurrence points at it.
    pub parent_id: Option<Uuid>,
    pub care_type: CareType,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub due_date: DateTimeUtc,
    pub original_due_date: DateTimeUtc,
    pub frequency_days: i32,
    pub flexibility_days: i32,
    pub is_recurring: bool,
    pub status: ReminderStatus,
    pub priority: Priority,
    pub snooze_count: i32,
    pub max_snoozes: i32,
    pub snoozed_until: Option<DateTimeUtc>,
    #[sea_orm(column_type = "JsonBinary")]
    pub seasonal_adjustments: SeasonalMultipliers,
    #[sea_orm(column_type = "JsonBinary")]
    pub snooze_history: SnoozeHistory,
    #[sea_orm(column_type = "JsonBinary")]
    pub completion_history: CompletionHistory,
    pub compliance_rate: f64,
    pub completed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub completed_at: DateTime<Utc>,
    pub completed_by: i32,
    pub was_on_time: bool,
    pub days_overdue: i64,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CompletionHistory(pub Vec<CompletionRecord>);

impl CompletionHistory {
    pub fn on_time_count(&self) -> usize {
        self.0.iter().filter(|c| c.was_on_time).count()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnoozeRecord {
    pub snoozed_at: DateTime<Utc>,
    pub original_date: DateTime<Utc>,
    pub new_date: DateTime<Utc>,
    pub hours: i64,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct SnoozeHistory(pub Vec<SnoozeRecord>);

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plant::Entity",
        from = "Column::PlantId",
        to = "super::plant::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Plant,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
