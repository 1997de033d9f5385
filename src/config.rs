use crate::scheduler::{SchedulerConfig, SeasonalMultipliers, MAX_SNOOZES_CAP};
use crate::telemetry::TelemetryConfig;
use std::env;

/// Process configuration, read from the environment (after `dotenvy`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub port: u16,
    pub cors_origin: String,
    pub weather_api_key: Option<String>,
    pub weather_api_url: Option<String>,
    pub sweep_interval_secs: u64,
    pub scheduler: SchedulerConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or("DATABASE_URL must be set")?;

        let port = match get("PORT") {
            Some(p) => p.parse().map_err(|_| format!("invalid PORT '{}'", p))?,
            None => 8000,
        };

        let sweep_interval_secs = match get("SWEEP_INTERVAL_SECS") {
            Some(s) => s
                .parse()
                .map_err(|_| format!("invalid SWEEP_INTERVAL_SECS '{}'", s))?,
            None => 60,
        };

        let mut scheduler = SchedulerConfig::default();
        if let Some(raw) = get("SEASONAL_MULTIPLIERS") {
            scheduler.multipliers = SeasonalMultipliers::parse(&raw)?;
        }
        if let Some(max) = get("MAX_SNOOZES") {
            let parsed: i32 = max
                .parse()
                .map_err(|_| format!("invalid MAX_SNOOZES '{}'", max))?;
            if !(0..=MAX_SNOOZES_CAP).contains(&parsed) {
                return Err(format!(
                    "MAX_SNOOZES must be between 0 and {}, got {}",
                    MAX_SNOOZES_CAP, parsed
                ));
            }
            scheduler.default_max_snoozes = parsed;
        }

        let mut telemetry = TelemetryConfig {
            service_name: get("OTEL_SERVICE_NAME"),
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
            ..TelemetryConfig::default()
        };
        if let Some(format) = get("RUST_LOG_FORMAT") {
            telemetry.log_format = format.parse()?;
        }
        if let Some(filter) = get("RUST_LOG") {
            TelemetryConfig::validate_filter(&filter)?;
            telemetry.filter = filter;
        }

        Ok(Self {
            database_url,
            redis_url: get("REDIS_URL"),
            port,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            weather_api_key: get("WEATHER_API_KEY"),
            weather_api_url: get("WEATHER_API_URL"),
            sweep_interval_secs,
            scheduler,
            telemetry,
        })
    }
}
