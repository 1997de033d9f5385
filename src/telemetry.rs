//! Tracing setup shared by the server and worker binaries.
//!
//! Settings come from [`crate::config::Config`]; nothing here reads the
//! environment directly.

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// DB driver noise stays at warn unless `RUST_LOG` says otherwise.
pub const DEFAULT_FILTER: &str = "info,plantcare_server=info,sqlx=warn,sea_orm=warn";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid RUST_LOG_FORMAT '{}' (expected text or json)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// `OTEL_SERVICE_NAME`; each binary falls back to its own name.
    pub service_name: Option<String>,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            log_format: LogFormat::default(),
            otlp_endpoint: None,
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn service_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.service_name.as_deref().unwrap_or(fallback)
    }

    /// Rejects filter directives up front instead of silently dropping them.
    pub fn validate_filter(raw: &str) -> Result<(), String> {
        EnvFilter::try_new(raw)
            .map(|_| ())
            .map_err(|e| format!("invalid RUST_LOG '{}': {}", raw, e))
    }
}

fn service_resource(service_name: &str) -> Resource {
    Resource::new(vec![
        KeyValue::new(resource::SERVICE_NAME, service_name.to_string()),
        KeyValue::new(resource::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ])
}

pub fn init_telemetry(config: &TelemetryConfig, default_service: &str) {
    let service_name = config.service_name(default_service).to_string();
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);

    let otel_layer = config.otlp_endpoint.clone().and_then(|endpoint| {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_trace_config(
                sdktrace::config()
                    .with_resource(service_resource(&service_name))
                    .with_sampler(sdktrace::Sampler::AlwaysOn),
            )
            .install_batch(opentelemetry_sdk::runtime::Tokio);

        match tracer {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!("{}: failed to install OpenTelemetry tracer: {}", service_name, e);
                None
            }
        }
    });

    match config.log_format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .without_time();
            registry.with(otel_layer).with(fmt_layer).init();
        }
        LogFormat::Text => {
            registry
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    tracing::info!(
        service = %service_name,
        format = ?config.log_format,
        otlp = config.otlp_endpoint.is_some(),
        "telemetry initialised"
    );
}
