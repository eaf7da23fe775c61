use std::sync::Arc;

use opentelemetry::trace::TracerProvider as _;
use operator::{
    cluster::{ClusterClient, KubeCluster},
    config::OperatorConfig,
    controller::{
        ChildAReconciler, HeadReconciler,
        runner::{self, Context},
    },
    logger::{init_tracer_provider, init_tracing},
    trace::SpanFactory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = OperatorConfig::from_env();
    init_tracing(cfg.json_logs);

    tracing::info!(service = %cfg.service_name, "Starting hierarchy operator...");

    let provider = init_tracer_provider(&cfg.service_name);
    let spans = Arc::new(SpanFactory::new(provider.tracer(cfg.service_name.clone())));

    let client = kube::Client::try_default().await?;
    let cluster: Arc<dyn ClusterClient> =
        Arc::new(KubeCluster::new(client.clone(), cfg.slow_call_threshold));

    let ctx = Arc::new(Context {
        head: HeadReconciler::new(cluster.clone(), spans.clone()),
        childa: ChildAReconciler::new(cluster, spans),
        config: cfg,
    });

    runner::run(client, ctx).await;

    tracing::info!("Shutdown signal received");
    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = ?e, "tracer provider shutdown failed");
    }

    Ok(())
}
