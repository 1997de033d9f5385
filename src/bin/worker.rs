use plantcare_server::config::Config;
use plantcare_server::notifications::{LogNotifier, Notifier, RedisNotifier};
use plantcare_server::scheduler::ReminderScheduler;
use plantcare_server::worker;
use sea_orm::Database;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    // No subscriber exists yet, so config errors go straight to stderr.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("plantcare-worker: invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    plantcare_server::telemetry::init_telemetry(&config.telemetry, "plantcare-worker");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Spawn metrics server
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 9091));
        tracing::info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Starting background worker...");

    let notifier: Arc<dyn Notifier> = match &config.redis_url {
        Some(url) => {
            let redis_client = redis::Client::open(url.as_str()).expect("Invalid Redis URL");
            // Drain the queue with 2 concurrent consumers.
            worker::start_notification_consumers(redis_client.clone(), 2).await;
            Arc::new(RedisNotifier::new(redis_client))
        }
        None => {
            tracing::warn!("REDIS_URL not set; notification consumers disabled");
            Arc::new(LogNotifier)
        }
    };

    worker::start_sweeper(
        db,
        ReminderScheduler::new(config.scheduler.clone()),
        notifier,
        config.sweep_interval_secs,
    )
    .await;

    // Keep the main process alive
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down worker process"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}
