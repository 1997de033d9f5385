pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod repository;
pub mod scheduler;
pub mod telemetry;
pub mod weather;
pub mod worker;

pub use sea_orm;
pub use redis;
