//! Custom resources of the `dummy.example.com` API group.
//!
//! A `Head` owns one `ChildA` of the same name, which in turn owns one
//! `apps/v1` Deployment of the same name. Both custom resources carry the
//! trace context annotation that links reconciles of the hierarchy into a
//! single trace.

mod childa;
mod head;

use kube::{Resource, ResourceExt};

pub use childa::{ChildA, ChildASpec, ChildAStatus};
pub use head::{Head, HeadSpec, HeadStatus};

pub const GROUP: &str = "dummy.example.com";
pub const VERSION: &str = "v1alpha1";

/// Annotation holding the serialized trace context of a resource.
///
/// The value is opaque: only the trace carrier reads or writes it.
pub const TRACE_ANNOTATION: &str = "dummy.example.com/trace-context";

/// Stored trace context value, if any.
pub fn trace_annotation<K: ResourceExt>(obj: &K) -> Option<&str> {
    obj.annotations().get(TRACE_ANNOTATION).map(String::as_str)
}

/// True once deletion of the object has been requested.
pub fn is_deleting<K: Resource>(obj: &K) -> bool {
    obj.meta().deletion_timestamp.is_some()
}
