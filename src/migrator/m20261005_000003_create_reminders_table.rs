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
                    .table(Reminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reminders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reminders::UserId).integer().not_null())
                    .col(ColumnDef::new(Reminders::PlantId).integer())
                    .col(ColumnDef::new(Reminders::ParentId).uuid())
                    .col(ColumnDef::new(Reminders::CareType).string_len(32).not_null())
                    .col(ColumnDef::new(Reminders::Title).string().not_null())
                    .col(ColumnDef::new(Reminders::Notes).text())
                    .col(
                        ColumnDef::new(Reminders::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::OriginalDueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reminders::FrequencyDays).integer().not_null())
                    .col(
                        ColumnDef::new(Reminders::FlexibilityDays)
                            .integer()
                            .default(0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::IsRecurring)
                            .boolean()
                            .default(true)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::Status)
                            .string_len(16)
                            .default("pending")
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::Priority)
                            .string_len(16)
                            .default("medium")
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::SnoozeCount)
                            .integer()
                            .default(0)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::MaxSnoozes)
                            .integer()
                            .default(3)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reminders::SnoozedUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reminders::SeasonalAdjustments)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::SnoozeHistory)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::CompletionHistory)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::ComplianceRate)
                            .double()
                            .default(0.8)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reminders::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Reminders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reminders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminders_plant")
                            .from(Reminders::Table, Reminders::PlantId)
                            .to(Plants::Table, Plants::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reminders_parent")
                            .from(Reminders::Table, Reminders::ParentId)
                            .to(Reminders::Table, Reminders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reminders_user_status")
                    .table(Reminders::Table)
                    .col(Reminders::UserId)
                    .col(Reminders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reminders_due_date")
                    .table(Reminders::Table)
                    .col(Reminders::DueDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reminders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Reminders {
    Table,
    Id,
    UserId,
    PlantId,
    ParentId,
    CareType,
    Title,
    Notes,
    DueDate,
    OriginalDueDate,
    FrequencyDays,
    FlexibilityDays,
    IsRecurring,
    Status,
    Priority,
    SnoozeCount,
    MaxSnoozes,
    SnoozedUntil,
    SeasonalAdjustments,
    SnoozeHistory,
    CompletionHistory,
    ComplianceRate,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}
