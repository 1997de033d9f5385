use super::WeatherProvider;
use crate::error::{AppError, Result};
use crate::scheduler::{ForecastDay, WeatherConditions};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const SECONDS_PER_DAY: i64 = 86_400;

/// OpenWeatherMap 5 day / 3 hour forecast client.
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    dt: i64,
    main: SlotMain,
    #[serde(default)]
    rain: Option<SlotRain>,
}

#[derive(Debug, Deserialize)]
struct SlotMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct SlotRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::upstream(format!("failed to build weather client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn conditions(&self, latitude: f64, longitude: f64) -> Result<WeatherConditions> {
        let url = format!("{}/forecast", self.base_url);

        let res = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("weather request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::upstream(format!(
                "weather provider returned {}: {}",
                status, text
            )));
        }

        let body: ForecastResponse = res
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("invalid weather response: {}", e)))?;

        summarize(body, chrono::Utc::now().timestamp())
    }
}

/// Current reading from the first slot, rainfall summed per day ahead (1 = next 24h).
fn summarize(body: ForecastResponse, now_ts: i64) -> Result<WeatherConditions> {
    let first = body
        .list
        .first()
        .ok_or_else(|| AppError::upstream("weather response contained no forecast"))?;

    let mut rain_by_day: BTreeMap<u32, f64> = BTreeMap::new();
    for slot in &body.list {
        let days_ahead = ((slot.dt - now_ts).max(0) / SECONDS_PER_DAY) as u32 + 1;
        let rainfall = slot.rain.as_ref().map(|r| r.three_hours).unwrap_or(0.0);
        *rain_by_day.entry(days_ahead).or_insert(0.0) += rainfall;
    }

    Ok(WeatherConditions {
        temperature_c: first.main.temp,
        humidity_pct: first.main.humidity,
        forecast: rain_by_day
            .into_iter()
            .map(|(days_ahead, rainfall_mm)| ForecastDay {
                rainfall_mm,
                days_ahead,
            })
            .collect(),
    })
}
