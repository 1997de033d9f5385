pub mod care_logs;
pub mod middleware;
pub mod plants;
pub mod reminders;
pub mod response;

use crate::entities::plant;
use crate::notifications::Notifier;
use crate::scheduler::{ReminderScheduler, WeatherConditions};
use crate::weather::WeatherProvider;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Collaborators shared by every handler.
#[derive(Clone)]
pub struct Services {
    pub scheduler: ReminderScheduler,
    pub weather: Option<Arc<dyn WeatherProvider>>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    /// Weather for the plant's location. Provider failures are logged and treated as unknown weather.
    pub async fn weather_for(&self, plant: Option<&plant::Model>) -> Option<WeatherConditions> {
        let provider = self.weather.as_ref()?;
        let (lat, lon) = plant?.coordinates()?;
        match provider.conditions(lat, lon).await {
            Ok(conditions) => Some(conditions),
            Err(e) => {
                tracing::warn!("Weather lookup failed for ({}, {}): {}", lat, lon, e);
                crate::metrics::increment_weather_failures();
                None
            }
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}

pub fn router(db: DatabaseConnection, services: Services, cors_origin: &str) -> Router {
    let protected_routes = Router::new()
        .route("/plants", get(plants::list_plants).post(plants::create_plant))
        .route(
            "/plants/:id",
            get(plants::get_plant)
                .patch(plants::update_plant)
                .delete(plants::delete_plant),
        )
        .route(
            "/plants/:id/care-logs",
            get(care_logs::list_care_logs).post(care_logs::create_care_log),
        )
        .route(
            "/reminders",
            get(reminders::list_reminders).post(reminders::create_reminder),
        )
        .route("/reminders/smart-schedule", post(reminders::smart_schedule))
        .route("/reminders/stats", get(reminders::reminder_stats))
        .route(
            "/reminders/:id",
            get(reminders::get_reminder)
                .patch(reminders::update_reminder)
                .delete(reminders::delete_reminder),
        )
        .route("/reminders/:id/complete", post(reminders::complete_reminder))
        .route("/reminders/:id/snooze", post(reminders::snooze_reminder))
        .route("/reminders/:id/dismiss", post(reminders::dismiss_reminder))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    let mut cors = tower_http::cors::CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin '{}'", cors_origin),
    }

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(Extension(db))
        .layer(Extension(services))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    let span_name = match matched_path {
                        Some(path) => format!("{} {}", request.method(), path),
                        None => format!("{} {}", request.method(), request.uri().path()),
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        // Filled in by handlers.
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        plant_id = tracing::field::Empty,
                        reminder_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(cors)
}
