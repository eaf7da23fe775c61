use std::sync::Arc;

use crds::Head;
use kube::ResourceExt;
use tracing::{info, instrument, warn};

use crate::cluster::{ClusterClient, ObjectKey};
use crate::trace::{SpanFactory, TraceCarrier};

/// What the defaulter did to the admitted Head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defaulted {
    /// A stored copy exists; the trace context was left as is.
    Kept,
    /// A stored copy exists and the incoming object dropped or changed the
    /// trace annotation; the stored value was put back.
    Restored,
    /// First observation; a fresh trace context was stamped.
    Injected,
    /// Nothing could be decided; the object was admitted unmodified.
    Skipped,
}

/// Stamps a trace context onto a Head the first time it is admitted.
pub struct HeadDefaulter {
    cluster: Arc<dyn ClusterClient>,
    spans: Arc<SpanFactory>,
}

impl HeadDefaulter {
    pub fn new(cluster: Arc<dyn ClusterClient>, spans: Arc<SpanFactory>) -> Self {
        Self { cluster, spans }
    }

    /// Defaults `head` before it is persisted. Never blocks admission.
    #[instrument(skip_all, target = "webhook", fields(name = %head.name_any()))]
    pub async fn default_head(&self, head: &mut Head) -> Defaulted {
        // No identity yet (e.g. generateName): nothing can be stored under it.
        let Some(key) = ObjectKey::for_object(&*head) else {
            return self.inject(head);
        };

        match self.cluster.get_head(&key).await {
            Ok(Some(current)) => Self::preserve(head, &current),
            Ok(None) => {
                info!(key = %key, "Head not found; injecting trace context");
                self.inject(head)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "failed to fetch current Head; admitting unmodified");
                Defaulted::Skipped
            }
        }
    }

    fn preserve(head: &mut Head, current: &Head) -> Defaulted {
        let stored = TraceCarrier::from_resource(current);
        let Some(value) = stored.value() else {
            info!("Head exists without trace context; leaving it untouched");
            return Defaulted::Kept;
        };

        if crds::trace_annotation(&*head) == Some(value) {
            info!("Head exists; trace context kept");
            return Defaulted::Kept;
        }

        // The stored value wins over a dropped or rewritten one.
        head.annotations_mut()
            .insert(crds::TRACE_ANNOTATION.to_string(), value.to_string());
        info!("Head exists; trace context restored from stored copy");
        Defaulted::Restored
    }

    fn inject(&self, head: &mut Head) -> Defaulted {
        let span = self.spans.start_root_span("get-head");
        let carrier = match self.spans.inject(span.context()) {
            Ok(carrier) => carrier,
            Err(err) => {
                warn!(error = %err, "failed to serialize trace context");
                return Defaulted::Skipped;
            }
        };

        // Whatever the incoming object carries belongs to no stored Head.
        head.annotations_mut().remove(crds::TRACE_ANNOTATION);
        carrier.stamp(head);
        info!(trace_id = %span.trace_id(), "trace context injected");
        Defaulted::Injected
    }
}
