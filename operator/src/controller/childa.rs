//! Mid-level loop: ChildA → Deployment.

use std::sync::Arc;

use crds::{ChildA, ChildAStatus};
use k8s_openapi::api::apps::v1::Deployment;
use tracing::{Instrument, debug, error, info};

use super::desired::{deployment_ready, desired_deployment};
use super::{Outcome, ReconcileState, open_span, record_outcome};
use crate::cluster::{ClusterClient, Kind, ObjectKey};
use crate::error::Error;
use crate::logger::reconcile_span;
use crate::metrics::ReconcileCounters;
use crate::trace::SpanFactory;

/// Keeps a ChildA's Deployment in place and mirrors the Deployment's
/// readiness into `ChildA.status.ready`.
pub struct ChildAReconciler {
    cluster: Arc<dyn ClusterClient>,
    spans: Arc<SpanFactory>,
    counters: ReconcileCounters,
}

impl ChildAReconciler {
    pub fn new(cluster: Arc<dyn ClusterClient>, spans: Arc<SpanFactory>) -> Self {
        Self {
            cluster,
            spans,
            counters: ReconcileCounters::default(),
        }
    }

    pub fn counters(&self) -> &ReconcileCounters {
        &self.counters
    }

    /// Runs one pass for the ChildA at `key`.
    ///
    /// Errors are meant for the controller's retry policy; a missing or
    /// deleting ChildA is a successful no-op.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome, Error> {
        ReconcileCounters::incr(&self.counters.reconciles);

        let result = self
            .reconcile_inner(key)
            .instrument(reconcile_span("childa", key))
            .await;

        record_outcome(&self.counters, &result);
        result
    }

    async fn reconcile_inner(&self, key: &ObjectKey) -> Result<Outcome, Error> {
        let child = match self.cluster.get_childa(key).await {
            Ok(Some(child)) => child,
            Ok(None) => {
                info!("ChildA not found; nothing to reconcile");
                return Ok(Outcome::NotFound);
            }
            Err(source) => {
                error!(error = %source, "failed to fetch ChildA");
                return Err(Error::Fetch {
                    kind: Kind::ChildA,
                    key: key.clone(),
                    source,
                });
            }
        };

        if crds::is_deleting(&child) {
            info!(state = %ReconcileState::Deleting, "ChildA is being deleted; skipping");
            return Ok(Outcome::Deleting);
        }

        let desired = desired_deployment(&child, key)?;

        let existing = self.cluster.get_deployment(key).await.map_err(|source| {
            error!(error = %source, "failed to fetch Deployment");
            Error::Fetch {
                kind: Kind::Deployment,
                key: key.clone(),
                source,
            }
        })?;

        if let Some(status) = existing.as_ref().and_then(|d| d.status.as_ref()) {
            debug!(
                replicas = status.replicas.unwrap_or(0),
                ready_replicas = status.ready_replicas.unwrap_or(0),
                "Deployment found"
            );
        }

        let observed = existing.as_ref().map(deployment_ready);
        match ReconcileState::observe(observed, child.is_ready()) {
            state @ ReconcileState::Absent => {
                self.create_deployment(&child, &desired, key, state).await
            }
            state @ ReconcileState::StatusDrift { observed } => {
                self.record_readiness(child, observed, key, state).await
            }
            state => {
                debug!(%state, "ChildA converged");
                Ok(Outcome::Converged)
            }
        }
    }

    async fn create_deployment(
        &self,
        child: &ChildA,
        desired: &Deployment,
        key: &ObjectKey,
        state: ReconcileState,
    ) -> Result<Outcome, Error> {
        let state = state.begin_create();
        info!(%state, image = %child.spec.image, "Deployment missing; creating");

        let span = open_span(&self.spans, &self.counters, "create-deploy", child);
        let result = self.cluster.create_deployment(desired).await;
        span.finish(&result);

        match result {
            Ok(_) => {
                info!(state = %state.complete(), "Deployment created");
                Ok(Outcome::Created)
            }
            Err(source) => {
                error!(error = %source, "failed to create Deployment");
                Err(Error::Create {
                    kind: Kind::Deployment,
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    async fn record_readiness(
        &self,
        mut child: ChildA,
        ready: bool,
        key: &ObjectKey,
        state: ReconcileState,
    ) -> Result<Outcome, Error> {
        info!(%state, ready, "ChildA readiness changed; updating status");

        let span = open_span(
            &self.spans,
            &self.counters,
            format!("child-ready-{ready}"),
            &child,
        );
        child.status = Some(ChildAStatus { ready });
        let result = self.cluster.update_childa_status(&child).await;
        span.finish(&result);

        match result {
            Ok(_) => {
                info!(state = %state.complete(), "ChildA status updated");
                Ok(Outcome::StatusUpdated { ready })
            }
            Err(source) => {
                error!(error = %source, "failed to update ChildA status");
                Err(Error::UpdateStatus {
                    kind: Kind::ChildA,
                    key: key.clone(),
                    source,
                })
            }
        }
    }
}
