mod fixtures;

use crds::Head;
use fixtures::{Harness, head, key};
use kube::ResourceExt;
use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry_sdk::trace::SpanData;
use operator::webhook::Defaulted;

fn traceparent_ids(obj: &Head) -> (TraceId, SpanId) {
    let value = crds::trace_annotation(obj).expect("trace annotation");
    let parts: Vec<&str> = value.split('-').collect();
    (
        TraceId::from_hex(parts[1]).unwrap(),
        SpanId::from_hex(parts[2]).unwrap(),
    )
}

fn span<'a>(spans: &'a [SpanData], name: &str) -> &'a SpanData {
    spans
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no span named {name}"))
}

/// Admits a new Head through the defaulter and persists it.
async fn admit(h: &Harness) -> Head {
    let mut incoming = head("nginx");
    assert_eq!(h.defaulter.default_head(&mut incoming).await, Defaulted::Injected);
    h.cluster.insert_head(incoming)
}

#[tokio::test]
async fn repeated_defaulting_keeps_the_first_value() {
    let h = Harness::new();
    let stored = admit(&h).await;
    let first = crds::trace_annotation(&stored).unwrap().to_owned();

    for _ in 0..3 {
        let mut update = stored.clone();
        update.spec.child_image = "nginx:next".into();
        assert_eq!(h.defaulter.default_head(&mut update).await, Defaulted::Kept);
        assert_eq!(crds::trace_annotation(&update), Some(first.as_str()));
    }
}

#[tokio::test]
async fn update_that_drops_the_annotation_gets_it_back() {
    let h = Harness::new();
    let stored = admit(&h).await;

    let mut update = stored.clone();
    update.annotations_mut().clear();

    assert_eq!(h.defaulter.default_head(&mut update).await, Defaulted::Restored);
    assert_eq!(
        crds::trace_annotation(&update),
        crds::trace_annotation(&stored)
    );
}

#[tokio::test]
async fn update_that_rewrites_the_annotation_gets_the_stored_value_back() {
    let h = Harness::new();
    let stored = admit(&h).await;
    let (trace_id, _) = traceparent_ids(&stored);

    let mut update = stored.clone();
    update.annotations_mut().insert(
        crds::TRACE_ANNOTATION.into(),
        "00-aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa-bbbbbbbbbbbbbbbb-01".into(),
    );

    assert_eq!(h.defaulter.default_head(&mut update).await, Defaulted::Restored);
    assert_eq!(
        crds::trace_annotation(&update),
        crds::trace_annotation(&stored)
    );

    // Spans of the next transition still join the first trace.
    let persisted = h.cluster.insert_head(update);
    assert_eq!(traceparent_ids(&persisted).0, trace_id);
    h.head.reconcile(&key()).await.unwrap();
    let spans = h.finished_spans();
    assert_eq!(span(&spans, "create-child").span_context.trace_id(), trace_id);
}

#[tokio::test]
async fn every_transition_joins_the_head_trace() {
    let h = Harness::new();
    let stored = admit(&h).await;
    let (trace_id, root_span) = traceparent_ids(&stored);

    h.head.reconcile(&key()).await.unwrap();
    h.childa.reconcile(&key()).await.unwrap();
    h.cluster.set_deployment_replicas(&key(), 2, 2);
    h.childa.reconcile(&key()).await.unwrap();
    h.head.reconcile(&key()).await.unwrap();

    let spans = h.finished_spans();
    assert_eq!(span(&spans, "get-head").span_context.span_id(), root_span);
    for name in ["create-child", "create-deploy", "child-ready-true", "head-ready-true"] {
        let s = span(&spans, name);
        assert_eq!(s.span_context.trace_id(), trace_id, "{name} left the trace");
        assert_eq!(s.parent_span_id, root_span, "{name} has the wrong parent");
    }

    assert_eq!(h.head.counters().snapshot().trace_fallbacks, 0);
    assert_eq!(h.childa.counters().snapshot().trace_fallbacks, 0);
}

#[tokio::test]
async fn hierarchies_get_distinct_traces() {
    let h = Harness::new();
    let first = admit(&h).await;

    let mut other = head("nginx");
    other.metadata.name = Some("other".into());
    assert_eq!(h.defaulter.default_head(&mut other).await, Defaulted::Injected);

    assert_ne!(traceparent_ids(&first).0, traceparent_ids(&other).0);
}

#[tokio::test]
async fn head_without_annotation_falls_back_to_root_span() {
    let h = Harness::new();
    h.cluster.insert_head(head("nginx"));

    h.head.reconcile(&key()).await.unwrap();

    let spans = h.finished_spans();
    let created = span(&spans, "create-child");
    assert_eq!(created.parent_span_id, SpanId::INVALID);
    assert_eq!(h.head.counters().snapshot().trace_fallbacks, 1);
}
