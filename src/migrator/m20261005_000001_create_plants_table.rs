use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plants::UserId).integer().not_null())
                    .col(ColumnDef::new(Plants::Name).string().not_null())
                    .col(ColumnDef::new(Plants::Species).string().not_null())
                    .col(ColumnDef::new(Plants::Location).string())
                    .col(ColumnDef::new(Plants::Latitude).double())
                    .col(ColumnDef::new(Plants::Longitude).double())
                    .col(ColumnDef::new(Plants::WateringEveryDays).integer())
                    .col(ColumnDef::new(Plants::FertilizerEveryWeeks).integer())
                    .col(ColumnDef::new(Plants::Notes).text())
                    .col(
                        ColumnDef::new(Plants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Plants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plants_user_id")
                    .table(Plants::Table)
                    .col(Plants::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Plants::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Plants {
    Table,
    Id,
    UserId,
    Name,
    Species,
    Location,
    Latitude,
    Longitude,
    WateringEveryDays,
    FertilizerEveryWeeks,
    Notes,
    CreatedAt,
    UpdatedAt,
}
