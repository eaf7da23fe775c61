//! Trace context propagation across reconciles.
//!
//! The two control loops never call each other, so the trace context of a
//! hierarchy travels on the resources as an annotation. The defaulting hook
//! writes it once on the Head, the Head loop copies it onto the ChildA, and
//! every status transition opens a span parented from it.

pub mod carrier;
pub mod spans;

use thiserror::Error;

pub use carrier::TraceCarrier;
pub use spans::{ScopedSpan, SpanFactory};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("span context is not valid and cannot be serialized")]
    Inject,

    #[error("no trace context stored")]
    Missing,

    #[error("stored trace context is malformed: {0:?}")]
    Malformed(String),
}
