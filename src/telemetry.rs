//! Telemetry initialization.
//!
//! Diagnostics for the user go to stderr as `fatal: ...` lines; this module
//! only wires up `tracing`. Selection, from the environment:
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` unset, `RUST_LOG` unset → no subscriber
//! - `OTEL_EXPORTER_OTLP_ENDPOINT=stderr` → JSON events to stderr
//! - `RUST_LOG` set, no endpoint → compact human-readable events to stderr
//! - `OTEL_EXPORTER_OTLP_ENDPOINT=http://...` → OTLP HTTP export
//!
//! Nothing is ever written to stdout: the merge program shares the terminal.
//!
//! If `TRACEPARENT` is set (W3C Trace Context), spans become children of the
//! remote parent, and [`current_traceparent`] hands the context on to each
//! merge program invocation.

use tracing_subscriber::EnvFilter;

/// Opaque guard. Dropping it flushes and shuts down the OTLP pipeline.
/// Hold this in `main()` until exit.
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    trace_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
    #[cfg(feature = "otel")]
    log_provider: Option<opentelemetry_sdk::logs::SdkLoggerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otel")]
        {
            if let Some(provider) = self.trace_provider.take()
                && let Err(e) = provider.shutdown()
            {
                eprintln!("otel trace shutdown error: {e}");
            }
            if let Some(provider) = self.log_provider.take()
                && let Err(e) = provider.shutdown()
            {
                eprintln!("otel log shutdown error: {e}");
            }
        }
    }
}

/// Where tracing output goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sink {
    /// No subscriber installed.
    Off,
    /// Human-readable events on stderr.
    Compact,
    /// JSON events on stderr.
    Json,
    /// OTLP HTTP export.
    Otlp,
}

/// Pick a sink from the values of `OTEL_EXPORTER_OTLP_ENDPOINT` and
/// `RUST_LOG`.
#[must_use]
pub fn select_sink(endpoint: Option<&str>, rust_log: Option<&str>) -> Sink {
    match endpoint {
        None | Some("") => match rust_log {
            None | Some("") => Sink::Off,
            Some(_) => Sink::Compact,
        },
        Some("stderr") => Sink::Json,
        Some(_) => Sink::Otlp,
    }
}

/// Initialize telemetry from the environment.
///
/// Returns a guard that must be held until the program exits.
/// Dropping the guard flushes any pending spans and logs.
#[must_use]
pub fn init() -> TelemetryGuard {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let rust_log = std::env::var("RUST_LOG").ok();

    match select_sink(endpoint.as_deref(), rust_log.as_deref()) {
        Sink::Off => init_noop(),
        Sink::Compact => init_stderr(false),
        Sink::Json => init_stderr(true),
        #[cfg(feature = "otel")]
        Sink::Otlp => init_otlp(),
        #[cfg(not(feature = "otel"))]
        Sink::Otlp => {
            eprintln!(
                "warning: OTEL_EXPORTER_OTLP_ENDPOINT set but merge-index built without 'otel' feature"
            );
            init_noop()
        }
    }
}

const fn init_noop() -> TelemetryGuard {
    TelemetryGuard {
        #[cfg(feature = "otel")]
        trace_provider: None,
        #[cfg(feature = "otel")]
        log_provider: None,
    }
}

/// Events to stderr, JSON or compact text.
fn init_stderr(json: bool) -> TelemetryGuard {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    init_noop()
}

/// OTLP HTTP export of spans and log events.
///
/// Endpoint paths (`/v1/traces`, `/v1/logs`) are derived by the SDK from
/// `OTEL_EXPORTER_OTLP_ENDPOINT`. Exports are synchronous: a run is short and
/// must not lose its final spans when the process exits with a failure
/// status.
#[cfg(feature = "otel")]
fn init_otlp() -> TelemetryGuard {
    use opentelemetry::trace::TracerProvider as _;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let span_exporter = match opentelemetry_otlp::SpanExporter::builder().with_http().build() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("warning: OTLP export disabled, span exporter: {e}");
            return init_noop();
        }
    };
    let log_exporter = match opentelemetry_otlp::LogExporter::builder().with_http().build() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("warning: OTLP export disabled, log exporter: {e}");
            return init_noop();
        }
    };

    let resource = otel_resource();
    let trace_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_simple_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    let log_provider = opentelemetry_sdk::logs::SdkLoggerProvider::builder()
        .with_simple_exporter(log_exporter)
        .with_resource(resource)
        .build();

    attach_remote_parent();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_opentelemetry::layer()
                .with_tracer(trace_provider.tracer(env!("CARGO_PKG_NAME"))),
        )
        .with(opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(
            &log_provider,
        ))
        .init();

    TelemetryGuard {
        trace_provider: Some(trace_provider),
        log_provider: Some(log_provider),
    }
}

/// W3C `TRACEPARENT` value for the current tracing span.
///
/// `None` without the `otel` feature, or when no span is being exported.
/// The merge program receives it so its own spans join this run's trace.
#[cfg(feature = "otel")]
pub fn current_traceparent() -> Option<String> {
    use opentelemetry::propagation::TextMapPropagator as _;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use std::collections::HashMap;
    use tracing_opentelemetry::OpenTelemetrySpanExt as _;

    let cx = tracing::Span::current().context();
    let mut carrier: HashMap<String, String> = HashMap::new();
    TraceContextPropagator::new().inject_context(&cx, &mut carrier);
    carrier.remove("traceparent")
}

/// Stub when otel feature is disabled.
#[cfg(not(feature = "otel"))]
pub const fn current_traceparent() -> Option<String> {
    None
}

/// Make a `TRACEPARENT` from our own caller the parent of every root span.
#[cfg(feature = "otel")]
fn attach_remote_parent() {
    use opentelemetry::propagation::TextMapPropagator as _;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use std::collections::HashMap;

    let Ok(traceparent) = std::env::var("TRACEPARENT") else {
        return;
    };
    let carrier = HashMap::from([("traceparent".to_owned(), traceparent)]);
    let cx = TraceContextPropagator::new().extract(&carrier);
    // Leaked so the context stays current until exit.
    std::mem::forget(cx.attach());
}

#[cfg(feature = "otel")]
fn otel_resource() -> opentelemetry_sdk::Resource {
    use opentelemetry::KeyValue;
    opentelemetry_sdk::Resource::builder()
        .with_attribute(KeyValue::new("service.name", env!("CARGO_PKG_NAME")))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build()
}
