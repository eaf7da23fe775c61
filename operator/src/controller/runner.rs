//! Wires both reconcilers into `kube-runtime` controllers.
//!
//! The controller owns event delivery, per-object serialization and retry
//! backoff; the reconcilers only run single passes.

use std::sync::Arc;

use crds::{ChildA, Head};
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, Resource};
use tracing::{debug, info, warn};

use super::{ChildAReconciler, HeadReconciler};
use crate::cluster::ObjectKey;
use crate::config::OperatorConfig;
use crate::error::Error;

/// Shared state handed to every reconcile invocation.
pub struct Context {
    pub head: HeadReconciler,
    pub childa: ChildAReconciler,
    pub config: OperatorConfig,
}

fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

async fn reconcile_head(head: Arc<Head>, ctx: Arc<Context>) -> Result<Action, Error> {
    let Some(key) = ObjectKey::for_object(head.as_ref()) else {
        return Ok(Action::await_change());
    };
    let outcome = ctx.head.reconcile(&key).await?;
    if outcome.is_mutation() {
        debug!(%key, ?outcome, "Head hierarchy written");
    }
    Ok(Action::await_change())
}

async fn reconcile_childa(child: Arc<ChildA>, ctx: Arc<Context>) -> Result<Action, Error> {
    let Some(key) = ObjectKey::for_object(child.as_ref()) else {
        return Ok(Action::await_change());
    };
    let outcome = ctx.childa.reconcile(&key).await?;
    if outcome.is_mutation() {
        debug!(%key, ?outcome, "ChildA hierarchy written");
    }
    Ok(Action::await_change())
}

fn error_policy<K>(_obj: Arc<K>, err: &Error, ctx: Arc<Context>) -> Action {
    warn!(
        kind = %err.kind(),
        error = %err,
        retry_in_ms = ctx.config.error_backoff.as_millis() as u64,
        "reconcile failed; requeueing"
    );
    Action::requeue(ctx.config.error_backoff)
}

/// Runs the Head and ChildA controllers until a shutdown signal arrives.
pub async fn run(client: Client, ctx: Arc<Context>) {
    let namespace = ctx.config.watch_namespace.clone();
    let ns = namespace.as_deref();

    info!(namespace = ns.unwrap_or("<all>"), "starting controllers");

    let heads = Controller::new(scoped_api::<Head>(&client, ns), watcher::Config::default())
        .owns(scoped_api::<ChildA>(&client, ns), watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile_head, error_policy, ctx.clone())
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(object = %obj, "head reconciled"),
                Err(e) => warn!(error = %e, "head controller error"),
            }
        });

    let childas = Controller::new(scoped_api::<ChildA>(&client, ns), watcher::Config::default())
        .owns(
            scoped_api::<Deployment>(&client, ns),
            watcher::Config::default(),
        )
        .shutdown_on_signal()
        .run(reconcile_childa, error_policy, ctx.clone())
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(object = %obj, "childa reconciled"),
                Err(e) => warn!(error = %e, "childa controller error"),
            }
        });

    tokio::join!(heads, childas);

    let head = ctx.head.counters().snapshot();
    let childa = ctx.childa.counters().snapshot();
    info!(
        head_writes = head.mutations(),
        childa_writes = childa.mutations(),
        ?head,
        ?childa,
        "controllers stopped"
    );
}
