//! Logging, trace export, and per-request database query counting.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{span::Id, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::Context, registry::LookupSpan, EnvFilter, Layer};

const DEFAULT_SERVICE_NAME: &str = "foodgram-server";

/// Keeps the OpenTelemetry providers alive and flushes them on drop.
pub struct TelemetryGuard {
    providers: Option<(SdkTracerProvider, SdkLoggerProvider)>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some((traces, logs)) = self.providers.take() {
            if let Err(e) = traces.shutdown() {
                eprintln!("Failed to shut down trace provider: {e}");
            }
            if let Err(e) = logs.shutdown() {
                eprintln!("Failed to shut down log provider: {e}");
            }
        }
    }
}

/// Install the global subscriber.
///
/// Console output is always on. When OTEL_EXPORTER_OTLP_ENDPOINT is set and
/// the collector answers, traces and logs are also exported over OTLP.
pub fn init_telemetry() -> anyhow::Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .ok()
        .filter(|endpoint| collector_reachable(endpoint));

    let Some(endpoint) = endpoint else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(DbQueryCountingLayer)
            .init();
        tracing::debug!("OTLP export disabled, using console logging only");
        return Ok(TelemetryGuard { providers: None });
    };

    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
    let resource = opentelemetry_sdk::Resource::builder()
        .with_service_name(service_name.clone())
        .build();

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()?;
    let trace_provider = SdkTracerProvider::builder()
        .with_batch_exporter(trace_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(DEFAULT_SERVICE_NAME);
    opentelemetry::global::set_tracer_provider(trace_provider.clone());

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()?;
    let log_provider = SdkLoggerProvider::builder()
        .with_batch_exporter(log_exporter)
        .with_resource(resource)
        .build();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(DbQueryCountingLayer)
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(OpenTelemetryTracingBridge::new(&log_provider))
        .init();

    tracing::info!(%endpoint, %service_name, "OpenTelemetry export enabled");

    Ok(TelemetryGuard {
        providers: Some((trace_provider, log_provider)),
    })
}

/// `host:port` of an endpoint URL, without scheme or path.
fn collector_host_port(endpoint: &str) -> &str {
    let without_scheme = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://");

    without_scheme
        .split_once('/')
        .map_or(without_scheme, |(host_port, _path)| host_port)
}

/// Quick TCP probe so a missing collector doesn't stall startup.
fn collector_reachable(endpoint: &str) -> bool {
    collector_host_port(endpoint)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

tokio::task_local! {
    /// Database queries issued by the current request.
    static DB_QUERY_COUNTER: Arc<AtomicU32>;
}

pub fn get_query_count() -> Option<u32> {
    DB_QUERY_COUNTER
        .try_with(|counter| counter.load(Ordering::Relaxed))
        .ok()
}

/// Counts `db.query` spans (opened by the pool's connection instrumentation)
/// against the task-local counter of the request that issued them.
pub struct DbQueryCountingLayer;

impl<S> Layer<S> for DbQueryCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        if span.name() == "db.query" {
            let _ = DB_QUERY_COUNTER.try_with(|counter| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
    }
}

/// Scopes a fresh query counter around the rest of the request.
pub async fn query_counting_middleware(request: Request<Body>, next: Next) -> Response {
    let counter = Arc::new(AtomicU32::new(0));
    DB_QUERY_COUNTER.scope(counter, next.run(request)).await
}

fn query_count_header_enabled(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup("TRACK_DB_QUERY_COUNT").is_some_and(|value| value == "1")
}

/// Adds `X-DB-Query-Count` when TRACK_DB_QUERY_COUNT=1.
pub async fn db_query_count_header_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    if query_count_header_enabled(|key| env::var(key).ok()) {
        if let Some(count) = get_query_count() {
            response.headers_mut().insert("X-DB-Query-Count", count.into());
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn counting_subscriber() -> impl Subscriber + Send + Sync {
        tracing_subscriber::registry().with(DbQueryCountingLayer)
    }

    #[test]
    fn test_layer_counts_only_db_query_spans() {
        assert_eq!(get_query_count(), None);

        let counter = Arc::new(AtomicU32::new(0));
        let seen = DB_QUERY_COUNTER.sync_scope(counter, || {
            tracing::subscriber::with_default(counting_subscriber(), || {
                let _first = tracing::info_span!("db.query", sql = "SELECT 1");
                let _second = tracing::info_span!("db.query", sql = "SELECT 2");
                let _other = tracing::info_span!("http_request");
                get_query_count()
            })
        });
        assert_eq!(seen, Some(2));
    }

    #[test]
    fn test_spans_outside_a_request_are_ignored() {
        tracing::subscriber::with_default(counting_subscriber(), || {
            let _span = tracing::info_span!("db.query");
        });
        assert_eq!(get_query_count(), None);
    }

    #[test]
    fn test_query_count_header_enabled() {
        assert!(query_count_header_enabled(|_| Some("1".to_string())));
        assert!(!query_count_header_enabled(|_| Some("0".to_string())));
        assert!(!query_count_header_enabled(|_| None));
    }

    async fn two_queries() -> &'static str {
        let _first = tracing::info_span!("db.query");
        let _second = tracing::info_span!("db.query");
        "ok"
    }

    #[tokio::test]
    async fn test_request_reports_its_query_count() {
        // Only this test sets the variable; no test asserts its absence
        std::env::set_var("TRACK_DB_QUERY_COUNT", "1");
        let _guard = tracing::subscriber::set_default(counting_subscriber());

        let app = Router::new()
            .route("/", get(two_queries))
            .layer(middleware::from_fn(db_query_count_header_middleware))
            .layer(middleware::from_fn(query_counting_middleware));

        for _ in 0..2 {
            let request = Request::builder().uri("/").body(Body::empty()).unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.headers().get("X-DB-Query-Count").unwrap(), "2");
        }
    }

    #[test]
    fn test_collector_host_port() {
        assert_eq!(collector_host_port("http://collector:4317"), "collector:4317");
        assert_eq!(collector_host_port("https://collector:4318/v1/traces"), "collector:4318");
        assert_eq!(collector_host_port("collector:4317/"), "collector:4317");
    }

    #[test]
    fn test_unreachable_collector() {
        assert!(!collector_reachable("http://127.0.0.1:1"));
        assert!(!collector_reachable("http://127.0.0.1:1/v1/traces"));
        assert!(!collector_reachable("not a host"));
    }
}
