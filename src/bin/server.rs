use axum::routing::get;
use plantcare_server::api::{self, Services};
use plantcare_server::config::Config;
use plantcare_server::migrator;
use plantcare_server::notifications::{LogNotifier, Notifier, RedisNotifier};
use plantcare_server::scheduler::ReminderScheduler;
use plantcare_server::weather::{OpenWeatherClient, WeatherProvider};
use sea_orm::Database;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    // No subscriber exists yet, so config errors go straight to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("plantcare-server: invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    plantcare_server::telemetry::init_telemetry(&config.telemetry, "plantcare-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    plantcare_server::metrics::init_metrics(&db).await;

    let notifier: Arc<dyn Notifier> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Invalid Redis URL");
            Arc::new(RedisNotifier::new(client))
        }
        None => {
            tracing::warn!("REDIS_URL not set; reminder notifications are only logged");
            Arc::new(LogNotifier)
        }
    };

    let weather: Option<Arc<dyn WeatherProvider>> = match &config.weather_api_key {
        Some(key) => match OpenWeatherClient::new(key.clone(), config.weather_api_url.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::error!("Weather client disabled: {}", e);
                None
            }
        },
        None => {
            tracing::info!("WEATHER_API_KEY not set; scheduling without weather");
            None
        }
    };

    let services = Services {
        scheduler: ReminderScheduler::new(config.scheduler.clone()),
        weather,
        notifier,
    };

    let app = api::router(db, services, &config.cors_origin)
        .layer(prometheus_layer)
        .route("/metrics", get(|| async move { metric_handle.render() }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
