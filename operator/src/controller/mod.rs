//! The two control loops of the hierarchy.
//!
//! Each loop compares one parent with its owned child and either creates the
//! child or copies the child's readiness into the parent's status. The loops
//! share no memory; a readiness change climbs one level per reconcile pass.

pub mod childa;
pub mod desired;
pub mod head;
pub mod runner;
pub mod state;

use std::borrow::Cow;

use kube::ResourceExt;

use crate::error::Error;
use crate::logger::annotate_trace_id;
use crate::metrics::ReconcileCounters;
use crate::trace::{ScopedSpan, SpanFactory};

pub use childa::ChildAReconciler;
pub use head::HeadReconciler;
pub use state::{Outcome, ReconcileState};

/// Opens the span guarding one mutation of `obj`'s hierarchy.
fn open_span<K: ResourceExt>(
    spans: &SpanFactory,
    counters: &ReconcileCounters,
    name: impl Into<Cow<'static, str>>,
    obj: &K,
) -> ScopedSpan {
    let span = spans.start_for_resource(name, obj);
    if !span.is_parented() {
        ReconcileCounters::incr(&counters.trace_fallbacks);
    }
    annotate_trace_id(&span.trace_id());
    span
}

fn record_outcome(counters: &ReconcileCounters, result: &Result<Outcome, Error>) {
    let counter = match result {
        Ok(Outcome::NotFound) => &counters.not_found,
        Ok(Outcome::Deleting) => &counters.deleting,
        Ok(Outcome::Created) => &counters.creates,
        Ok(Outcome::StatusUpdated { .. }) => &counters.status_updates,
        Ok(Outcome::Converged) => &counters.converged,
        Err(_) => &counters.failures,
    };
    ReconcileCounters::incr(counter);
}
