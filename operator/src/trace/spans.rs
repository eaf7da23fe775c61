use std::borrow::Cow;
use std::fmt::Display;

use kube::ResourceExt;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{Status, TraceContextExt, Tracer};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracer;
use tracing::warn;

use super::{TraceCarrier, TraceError};

/// Starts spans and moves their context in and out of trace carriers.
pub struct SpanFactory {
    tracer: SdkTracer,
    propagator: TraceContextPropagator,
}

impl SpanFactory {
    pub fn new(tracer: SdkTracer) -> Self {
        Self {
            tracer,
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Serializes the span held by `cx`.
    pub fn inject(&self, cx: &Context) -> Result<TraceCarrier, TraceError> {
        let mut carrier = TraceCarrier::default();
        self.propagator.inject_context(cx, &mut carrier);
        if carrier.is_empty() {
            return Err(TraceError::Inject);
        }
        Ok(carrier)
    }

    /// Rebuilds a parent context from a stored carrier.
    pub fn extract(&self, carrier: &TraceCarrier) -> Result<Context, TraceError> {
        let Some(value) = carrier.value().filter(|v| !v.is_empty()) else {
            return Err(TraceError::Missing);
        };

        let cx = self.propagator.extract(carrier);
        if !cx.span().span_context().is_valid() {
            return Err(TraceError::Malformed(value.to_string()));
        }
        Ok(cx)
    }

    pub fn start_root_span(&self, name: impl Into<Cow<'static, str>>) -> ScopedSpan {
        self.start_child_span(name, None)
    }

    /// Starts `name` under `parent`, or as a new root without one.
    pub fn start_child_span(
        &self,
        name: impl Into<Cow<'static, str>>,
        parent: Option<&Context>,
    ) -> ScopedSpan {
        let root = Context::new();
        let parent_cx = parent.unwrap_or(&root);
        let span = self.tracer.start_with_context(name, parent_cx);

        ScopedSpan {
            cx: Context::new().with_span(span),
            parented: parent.is_some(),
        }
    }

    /// Starts `name` parented from the trace annotation stored on `obj`.
    ///
    /// An unusable annotation is logged and the span becomes a new root.
    pub fn start_for_resource<K: ResourceExt>(
        &self,
        name: impl Into<Cow<'static, str>>,
        obj: &K,
    ) -> ScopedSpan {
        let parent = match self.extract(&TraceCarrier::from_resource(obj)) {
            Ok(cx) => Some(cx),
            Err(err) => {
                warn!(
                    error = %err,
                    resource = %obj.name_any(),
                    "no usable trace parent; starting a new root span"
                );
                None
            }
        };
        self.start_child_span(name, parent.as_ref())
    }
}

/// An open span, closed when finished or dropped.
pub struct ScopedSpan {
    cx: Context,
    parented: bool,
}

impl ScopedSpan {
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn trace_id(&self) -> String {
        self.cx.span().span_context().trace_id().to_string()
    }

    /// False when the span had to start a new trace.
    pub fn is_parented(&self) -> bool {
        self.parented
    }

    /// Closes the span, marking it failed when `result` is an error.
    pub fn finish<T, E: Display>(self, result: &Result<T, E>) {
        if let Err(err) = result {
            self.cx.span().set_status(Status::error(err.to_string()));
        }
        // Drop ends the span.
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.cx.span().end();
    }
}
