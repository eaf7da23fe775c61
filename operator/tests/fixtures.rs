#![allow(dead_code)]

use std::sync::Arc;

use crds::{ChildA, ChildASpec, Head, HeadSpec};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider, SpanData};

use operator::cluster::{InMemoryCluster, ObjectKey};
use operator::controller::{ChildAReconciler, HeadReconciler};
use operator::trace::SpanFactory;
use operator::webhook::HeadDefaulter;

pub const NS: &str = "default";
pub const NAME: &str = "demo";

pub fn key() -> ObjectKey {
    ObjectKey::new(NS, NAME)
}

/// One in-memory cluster shared by both loops and the hook.
pub struct Harness {
    pub cluster: InMemoryCluster,
    pub head: HeadReconciler,
    pub childa: ChildAReconciler,
    pub defaulter: HeadDefaulter,
    pub exporter: InMemorySpanExporter,
    _provider: SdkTracerProvider,
}

impl Harness {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let spans = Arc::new(SpanFactory::new(provider.tracer("operator-tests")));
        let cluster = InMemoryCluster::new();
        let shared = Arc::new(cluster.clone());

        Self {
            head: HeadReconciler::new(shared.clone(), spans.clone()),
            childa: ChildAReconciler::new(shared.clone(), spans.clone()),
            defaulter: HeadDefaulter::new(shared, spans),
            cluster,
            exporter,
            _provider: provider,
        }
    }

    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().expect("read finished spans")
    }

    pub fn span_names(&self) -> Vec<String> {
        self.finished_spans()
            .into_iter()
            .map(|s| s.name.to_string())
            .collect()
    }
}

pub fn head(image: &str) -> Head {
    let mut head = Head::new(NAME, HeadSpec { child_image: image.into() });
    head.metadata.namespace = Some(NS.into());
    head
}

pub fn childa(image: &str) -> ChildA {
    let mut child = ChildA::new(NAME, ChildASpec { image: image.into() });
    child.metadata.namespace = Some(NS.into());
    child
}

pub fn deployment() -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(NAME.into()),
            namespace: Some(NS.into()),
            ..Default::default()
        },
        ..Default::default()
    }
}
