use serde::{Deserialize, Serialize};

use super::SchedulerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub rainfall_mm: f64,
    pub days_ahead: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub forecast: Vec<ForecastDay>,
}

/// How the weather shifts the need for watering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherImpact {
    /// Hot and dry: water sooner.
    Increase,
    /// Rain expected: water later.
    Decrease,
    #[default]
    None,
}

impl WeatherImpact {
    /// Rain takes precedence over heat.
    pub fn assess(conditions: &WeatherConditions, config: &SchedulerConfig) -> Self {
        let rain_expected = conditions.forecast.iter().any(|day| {
            day.days_ahead <= config.rain_window_days && day.rainfall_mm > config.rain_threshold_mm
        });
        if rain_expected {
            return WeatherImpact::Decrease;
        }

        if conditions.temperature_c > config.heat_threshold_c
            && conditions.humidity_pct < config.dry_humidity_pct
        {
            return WeatherImpact::Increase;
        }

        WeatherImpact::None
    }
}
