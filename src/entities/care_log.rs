use super::sea_orm_active_enums::CareType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "care_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plant_id: i32,
    pub user_id: i32,
    pub care_type: CareType,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub reminder_id: Option<Uuid>,
    pub performed_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

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
}

impl Related<super::plant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
