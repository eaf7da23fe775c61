use crds::TRACE_ANNOTATION;
use kube::ResourceExt;
use opentelemetry::propagation::{Extractor, Injector};

/// Propagator key carried in the annotation.
pub const TRACEPARENT: &str = "traceparent";

/// Serialized trace context as stored on a resource.
///
/// Holds the single key the W3C propagator needs to rebuild a parent
/// context. Keys other than `traceparent` offered during injection are
/// dropped, so a carrier always maps to exactly one annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceCarrier {
    traceparent: Option<String>,
}

impl TraceCarrier {
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            traceparent: Some(value.into()),
        }
    }

    /// Reads the carrier from the resource's trace annotation.
    pub fn from_resource<K: ResourceExt>(obj: &K) -> Self {
        Self {
            traceparent: crds::trace_annotation(obj).map(str::to_string),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.traceparent.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.traceparent.as_deref().is_none_or(str::is_empty)
    }

    /// Writes the carrier onto `obj` unless it already carries a trace
    /// annotation. Returns whether the annotation was written.
    pub fn stamp<K: ResourceExt>(&self, obj: &mut K) -> bool {
        let Some(value) = self.value() else {
            return false;
        };
        if crds::trace_annotation(obj).is_some() {
            return false;
        }
        obj.annotations_mut()
            .insert(TRACE_ANNOTATION.to_string(), value.to_string());
        true
    }
}

impl Injector for TraceCarrier {
    fn set(&mut self, key: &str, value: String) {
        if key == TRACEPARENT {
            self.traceparent = Some(value);
        }
    }
}

impl Extractor for TraceCarrier {
    fn get(&self, key: &str) -> Option<&str> {
        if key == TRACEPARENT { self.value() } else { None }
    }

    fn keys(&self) -> Vec<&str> {
        match self.traceparent {
            Some(_) => vec![TRACEPARENT],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{ChildA, ChildASpec};

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn only_traceparent_is_kept() {
        let mut carrier = TraceCarrier::default();
        carrier.set("tracestate", "vendor=1".to_string());
        assert!(carrier.is_empty());

        carrier.set(TRACEPARENT, SAMPLE.to_string());
        assert_eq!(carrier.get(TRACEPARENT), Some(SAMPLE));
        assert_eq!(carrier.get("tracestate"), None);
        assert_eq!(carrier.keys(), vec![TRACEPARENT]);
    }

    #[test]
    fn stamp_never_overwrites() {
        let mut child = ChildA::new("c1", ChildASpec::default());

        assert!(TraceCarrier::from_value(SAMPLE).stamp(&mut child));
        assert_eq!(crds::trace_annotation(&child), Some(SAMPLE));

        assert!(!TraceCarrier::from_value("other").stamp(&mut child));
        assert_eq!(crds::trace_annotation(&child), Some(SAMPLE));
    }

    #[test]
    fn stamp_keeps_unrelated_annotations() {
        let mut child = ChildA::new("c1", ChildASpec::default());
        child
            .annotations_mut()
            .insert("team".to_string(), "infra".to_string());

        TraceCarrier::from_value(SAMPLE).stamp(&mut child);

        assert_eq!(child.annotations().len(), 2);
        assert_eq!(child.annotations()["team"], "infra");
    }

    #[test]
    fn empty_carrier_stamps_nothing() {
        let mut child = ChildA::new("c1", ChildASpec::default());
        assert!(!TraceCarrier::default().stamp(&mut child));
        assert!(child.annotations().is_empty());
    }

    #[test]
    fn reads_from_resource() {
        let mut child = ChildA::new("c1", ChildASpec::default());
        assert!(TraceCarrier::from_resource(&child).is_empty());

        child
            .annotations_mut()
            .insert(TRACE_ANNOTATION.to_string(), SAMPLE.to_string());
        assert_eq!(TraceCarrier::from_resource(&child).value(), Some(SAMPLE));
    }
}
