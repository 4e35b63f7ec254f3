//! Logging and tracing setup.
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (`RUST_LOG`,
//! falling back to `info`), a human or JSON formatter on stderr, and an
//! OpenTelemetry layer when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use std::env;
use std::sync::OnceLock;

use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::args::LogFormat;

const DEFAULT_SERVICE_NAME: &str = "hyres";

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Filter directives; empty means `default_level`.
    pub log_filter: String,
    pub default_level: String,
    pub log_format: LogFormat,
    pub otel_service_name: String,
    /// OTLP gRPC endpoint; OTEL export is enabled only when set.
    pub otel_endpoint: Option<String>,
}

impl TelemetryConfig {
    pub fn from_env(log_format: LogFormat) -> Self {
        Self {
            log_filter: env::var("RUST_LOG").unwrap_or_default(),
            default_level: "info".to_string(),
            log_format,
            otel_service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
            otel_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.is_empty()),
        }
    }

    pub fn is_otel_enabled(&self) -> bool {
        self.otel_endpoint.is_some()
    }

    fn filter(&self) -> EnvFilter {
        if self.log_filter.is_empty() {
            EnvFilter::new(&self.default_level)
        } else {
            EnvFilter::new(&self.log_filter)
        }
    }
}

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Installs the global subscriber. A second call is a no-op.
///
/// Returns an error only if the OTLP exporter cannot be built; logging to
/// stderr is installed regardless.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Human => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (otel_layer, otel_error) = match &config.otel_endpoint {
        Some(endpoint) => match otel_layer(endpoint, &config.otel_service_name) {
            Ok(layer) => (Some(layer), None),
            Err(e) => (None, Some(e)),
        },
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();

    match otel_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn otel_layer<S>(endpoint: &str, service_name: &str) -> anyhow::Result<impl Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attributes([KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    let _ = TRACER_PROVIDER.set(provider.clone());

    Ok(tracing_opentelemetry::layer().with_tracer(provider.tracer("hyres")))
}

/// Flushes pending spans. No-op when OTEL export is disabled.
pub fn shutdown() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            tracing::warn!("OTEL tracer provider shutdown error: {e}");
        }
    }
}
