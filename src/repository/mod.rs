//! Persistence operations, one module per table.
//!
//! Every lookup is owner-scoped: a record that exists but belongs to another
//! user is reported as not found.

pub mod care_logs;
pub mod plants;
pub mod reminders;
