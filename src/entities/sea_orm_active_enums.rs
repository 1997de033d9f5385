use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "kebab-case")]
pub enum CareType {
    #[sea_orm(string_value = "watering")]
    Watering,
    #[sea_orm(string_value = "fertilizing")]
    Fertilizing,
    #[sea_orm(string_value = "pruning")]
    Pruning,
    #[sea_orm(string_value = "repotting")]
    Repotting,
    #[sea_orm(string_value = "health-check")]
    HealthCheck,
    #[sea_orm(string_value = "pest-treatment")]
    PestTreatment,
    #[sea_orm(string_value = "soil-change")]
    SoilChange,
    #[sea_orm(string_value = "location-change")]
    LocationChange,
}

impl CareType {
    pub fn label(&self) -> &'static str {
        match self {
            CareType::Watering => "Water",
            CareType::Fertilizing => "Fertilize",
            CareType::Pruning => "Prune",
            CareType::Repotting => "Repot",
            CareType::HealthCheck => "Health check for",
            CareType::PestTreatment => "Treat pests on",
            CareType::SoilChange => "Change soil of",
            CareType::LocationChange => "Move",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "snoozed")]
    Snoozed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "dismissed")]
    Dismissed,
}

impl ReminderStatus {
    /// No transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReminderStatus::Completed | ReminderStatus::Dismissed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Overdue => "overdue",
            ReminderStatus::Snoozed => "snoozed",
            ReminderStatus::Completed => "completed",
            ReminderStatus::Dismissed => "dismissed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumIter, DeriveActiveEnum, Deserialize, Serialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}
