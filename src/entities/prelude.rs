pub use super::care_log::Entity as CareLog;
pub use super::plant::Entity as Plant;
pub use super::reminder::Entity as Reminder;
