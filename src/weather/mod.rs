pub mod openweather;

pub use openweather::OpenWeatherClient;

use crate::error::Result;
use crate::scheduler::WeatherConditions;
use async_trait::async_trait;

/// Source of current conditions and a short rain forecast for a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherConditions>;
}
