use sea_orm_migration::prelude::*;

mod m20261005_000001_create_plants_table;
mod m20261005_000002_create_care_logs_table;
mod m20261005_000003_create_reminders_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261005_000001_create_plants_table::Migration),
            Box::new(m20261005_000002_create_care_logs_table::Migration),
            Box::new(m20261005_000003_create_reminders_table::Migration),
        ]
    }
}
