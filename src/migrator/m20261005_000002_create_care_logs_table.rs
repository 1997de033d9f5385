use sea_orm_migration::prelude::*;

use super::m20261005_000001_create_plants_table::Plants;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CareLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CareLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CareLogs::PlantId).integer().not_null())
                    .col(ColumnDef::new(CareLogs::UserId).integer().not_null())
                    .col(ColumnDef::new(CareLogs::CareType).string_len(32).not_null())
                    .col(ColumnDef::new(CareLogs::Notes).text())
                    .col(ColumnDef::new(CareLogs::ReminderId).uuid())
                    .col(
                        ColumnDef::new(CareLogs::PerformedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CareLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_care_logs_plant")
                            .from(CareLogs::Table, CareLogs::PlantId)
                            .to(Plants::Table, Plants::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_care_logs_plant_type")
                    .table(CareLogs::Table)
                    .col(CareLogs::PlantId)
                    .col(CareLogs::CareType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CareLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CareLogs {
    Table,
    Id,
    PlantId,
    UserId,
    CareType,
    Notes,
    ReminderId,
    PerformedAt,
    CreatedAt,
}
