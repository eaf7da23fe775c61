//! Top-level loop: Head → ChildA.

use std::sync::Arc;

use crds::{ChildA, Head, HeadStatus};
use tracing::{Instrument, debug, error, info};

use super::desired::desired_childa;
use super::{Outcome, ReconcileState, open_span, record_outcome};
use crate::cluster::{ClusterClient, Kind, ObjectKey};
use crate::error::Error;
use crate::logger::reconcile_span;
use crate::metrics::ReconcileCounters;
use crate::trace::SpanFactory;

/// Keeps a Head's ChildA in place and mirrors `ChildA.status.ready` into
/// `Head.status.ready`.
pub struct HeadReconciler {
    cluster: Arc<dyn ClusterClient>,
    spans: Arc<SpanFactory>,
    counters: ReconcileCounters,
}

impl HeadReconciler {
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

    /// Runs one pass for the Head at `key`.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Outcome, Error> {
        ReconcileCounters::incr(&self.counters.reconciles);

        let result = self
            .reconcile_inner(key)
            .instrument(reconcile_span("head", key))
            .await;

        record_outcome(&self.counters, &result);
        result
    }

    async fn reconcile_inner(&self, key: &ObjectKey) -> Result<Outcome, Error> {
        let head = match self.cluster.get_head(key).await {
            Ok(Some(head)) => head,
            Ok(None) => {
                info!("Head not found; nothing to reconcile");
                return Ok(Outcome::NotFound);
            }
            Err(source) => {
                error!(error = %source, "failed to fetch Head");
                return Err(Error::Fetch {
                    kind: Kind::Head,
                    key: key.clone(),
                    source,
                });
            }
        };

        if crds::is_deleting(&head) {
            info!(state = %ReconcileState::Deleting, "Head is being deleted; skipping");
            return Ok(Outcome::Deleting);
        }

        let desired = desired_childa(&head, key)?;

        let existing = self.cluster.get_childa(key).await.map_err(|source| {
            error!(error = %source, "failed to fetch ChildA");
            Error::Fetch {
                kind: Kind::ChildA,
                key: key.clone(),
                source,
            }
        })?;

        let observed = existing.as_ref().map(ChildA::is_ready);
        debug!(child_ready = ?observed, head_ready = head.is_ready(), "compared readiness");

        match ReconcileState::observe(observed, head.is_ready()) {
            state @ ReconcileState::Absent => self.create_child(&head, &desired, key, state).await,
            state @ ReconcileState::StatusDrift { observed } => {
                self.record_readiness(head, observed, key, state).await
            }
            state => {
                debug!(%state, "Head converged");
                Ok(Outcome::Converged)
            }
        }
    }

    async fn create_child(
        &self,
        head: &Head,
        desired: &ChildA,
        key: &ObjectKey,
        state: ReconcileState,
    ) -> Result<Outcome, Error> {
        let state = state.begin_create();
        info!(%state, image = %head.spec.child_image, "ChildA missing; creating");

        let span = open_span(&self.spans, &self.counters, "create-child", head);
        let result = self.cluster.create_childa(desired).await;
        span.finish(&result);

        match result {
            Ok(_) => {
                info!(state = %state.complete(), "ChildA created");
                Ok(Outcome::Created)
            }
            Err(source) => {
                error!(error = %source, "failed to create ChildA");
                Err(Error::Create {
                    kind: Kind::ChildA,
                    key: key.clone(),
                    source,
                })
            }
        }
    }

    async fn record_readiness(
        &self,
        mut head: Head,
        ready: bool,
        key: &ObjectKey,
        state: ReconcileState,
    ) -> Result<Outcome, Error> {
        info!(%state, ready, "Head readiness changed; updating status");

        let span = open_span(
            &self.spans,
            &self.counters,
            format!("head-ready-{ready}"),
            &head,
        );
        head.status = Some(HeadStatus { ready });
        let result = self.cluster.update_head_status(&head).await;
        span.finish(&result);

        match result {
            Ok(_) => {
                info!(state = %state.complete(), "Head status updated");
                Ok(Outcome::StatusUpdated { ready })
            }
            Err(source) => {
                error!(error = %source, "failed to update Head status");
                Err(Error::UpdateStatus {
                    kind: Kind::Head,
                    key: key.clone(),
                    source,
                })
            }
        }
    }
}
