pub mod care_log;
pub mod plant;
pub mod reminder;
pub mod sea_orm_active_enums;

pub use care_log::Entity as CareLog;
pub use plant::Entity as Plant;
pub use reminder::Entity as Reminder;
pub use sea_orm_active_enums::{CareType, Priority, ReminderStatus};

pub mod prelude;
