use std::time::Duration;

use once_cell::sync::OnceCell;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{Span, field};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cluster::ObjectKey;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global `tracing` subscriber. Later calls are no-ops.
pub fn init_tracing(json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let base = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            // Includes timing when the span closes
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(base.json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(base.pretty())
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("tracing subscriber already installed: {e}");
        }
    });
}

/// Tracer provider for the spans stitched across reconciles.
///
/// No exporter is attached; spans are created, parented and closed only.
pub fn init_tracer_provider(service_name: &str) -> SdkTracerProvider {
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    SdkTracerProvider::builder().with_resource(resource).build()
}

/// Span wrapping one reconcile pass. `trace_id` is filled in once the
/// resource's trace context is known.
pub fn reconcile_span(controller: &'static str, key: &ObjectKey) -> Span {
    tracing::info_span!(
        "reconcile",
        controller = controller,
        namespace = %key.namespace,
        name = %key.name,
        trace_id = field::Empty
    )
}

pub fn annotate_trace_id(trace_id: &str) {
    Span::current().record("trace_id", field::display(trace_id));
}

pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    let start = std::time::Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
