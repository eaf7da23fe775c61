//! In-process cluster used by tests and local runs.
//!
//! Behaves like the API server for the calls the operator makes: creates
//! assign a uid and reject duplicates, status writes replace only the status
//! and are checked against `resourceVersion`. Every successful write is
//! recorded in a journal so callers can assert on the exact mutations made.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crds::{ChildA, Head};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::Resource;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{ClusterClient, Kind, ObjectKey};
use crate::error::ClusterError;

/// Call kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    Create,
    UpdateStatus,
}

/// A successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created(Kind, ObjectKey),
    StatusUpdated(Kind, ObjectKey),
}

#[derive(Default)]
struct State {
    heads: BTreeMap<ObjectKey, Head>,
    childas: BTreeMap<ObjectKey, ChildA>,
    deployments: BTreeMap<ObjectKey, Deployment>,
    journal: Vec<Mutation>,
    faults: HashSet<(Op, Kind)>,
    resource_version: u64,
}

impl State {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn check_fault(&self, op: Op, kind: Kind) -> Result<(), ClusterError> {
        if self.faults.contains(&(op, kind)) {
            return Err(ClusterError::Unavailable(format!(
                "injected {op:?} failure for {kind}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCluster {
    state: Arc<Mutex<State>>,
}

fn key_of<K: Resource>(obj: &K) -> Result<ObjectKey, ClusterError> {
    let meta = obj.meta();
    let namespace = meta
        .namespace
        .clone()
        .ok_or(ClusterError::MissingField("namespace"))?;
    let name = meta.name.clone().ok_or(ClusterError::MissingField("name"))?;
    Ok(ObjectKey { namespace, name })
}

/// Stores `obj` as a new object, assigning uid and resourceVersion.
fn admit<K: Resource + Clone>(
    map: &mut BTreeMap<ObjectKey, K>,
    obj: &K,
    kind: Kind,
    version: String,
) -> Result<(ObjectKey, K), ClusterError> {
    let key = key_of(obj)?;
    if map.contains_key(&key) {
        return Err(ClusterError::AlreadyExists { kind, key });
    }

    let mut stored = obj.clone();
    let meta = stored.meta_mut();
    meta.uid = Some(Uuid::new_v4().to_string());
    meta.resource_version = Some(version);
    meta.creation_timestamp = Some(Time(Utc::now()));

    map.insert(key.clone(), stored.clone());
    Ok((key, stored))
}

/// Replaces the status of the stored copy of `obj` via `copy_status`.
fn write_status<K: Resource + Clone>(
    map: &mut BTreeMap<ObjectKey, K>,
    obj: &K,
    kind: Kind,
    version: String,
    copy_status: impl FnOnce(&K, &mut K),
) -> Result<(ObjectKey, K), ClusterError> {
    let key = key_of(obj)?;
    let Some(stored) = map.get_mut(&key) else {
        return Err(ClusterError::NotFound { kind, key });
    };

    if obj.meta().resource_version.is_some()
        && obj.meta().resource_version != stored.meta().resource_version
    {
        return Err(ClusterError::Conflict { kind, key });
    }

    copy_status(obj, stored);
    stored.meta_mut().resource_version = Some(version);
    Ok((key, stored.clone()))
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------
    // Seeding and inspection
    // -----------------------

    /// Stores a Head as if an external actor created it. Not journaled.
    pub fn insert_head(&self, head: Head) -> Head {
        self.seed(head, |s| &mut s.heads)
    }

    pub fn insert_childa(&self, child: ChildA) -> ChildA {
        self.seed(child, |s| &mut s.childas)
    }

    pub fn insert_deployment(&self, deployment: Deployment) -> Deployment {
        self.seed(deployment, |s| &mut s.deployments)
    }

    fn seed<K: Resource + Clone>(
        &self,
        obj: K,
        map: impl FnOnce(&mut State) -> &mut BTreeMap<ObjectKey, K>,
    ) -> K {
        let mut state = self.state.lock();
        let version = state.next_version();

        let mut obj = obj;
        let meta = obj.meta_mut();
        meta.uid.get_or_insert_with(|| Uuid::new_v4().to_string());
        meta.resource_version = Some(version);

        let key = key_of(&obj).unwrap_or_else(|_| ObjectKey::new("", ""));
        map(&mut *state).insert(key, obj.clone());
        obj
    }

    pub fn head(&self, key: &ObjectKey) -> Option<Head> {
        self.state.lock().heads.get(key).cloned()
    }

    pub fn childa(&self, key: &ObjectKey) -> Option<ChildA> {
        self.state.lock().childas.get(key).cloned()
    }

    pub fn deployment(&self, key: &ObjectKey) -> Option<Deployment> {
        self.state.lock().deployments.get(key).cloned()
    }

    /// Simulates the workload controller reporting replica counts.
    pub fn set_deployment_replicas(&self, key: &ObjectKey, replicas: i32, ready: i32) {
        let mut state = self.state.lock();
        let version = state.next_version();
        if let Some(d) = state.deployments.get_mut(key) {
            d.status = Some(DeploymentStatus {
                replicas: Some(replicas),
                ready_replicas: Some(ready),
                ..Default::default()
            });
            d.metadata.resource_version = Some(version);
        }
    }

    /// Sets the deletion marker, as the API server does when an object with
    /// finalizers is deleted.
    pub fn mark_deleting(&self, kind: Kind, key: &ObjectKey) {
        let mut state = self.state.lock();
        let now = Some(Time(Utc::now()));
        match kind {
            Kind::Head => {
                if let Some(o) = state.heads.get_mut(key) {
                    o.metadata.deletion_timestamp = now;
                }
            }
            Kind::ChildA => {
                if let Some(o) = state.childas.get_mut(key) {
                    o.metadata.deletion_timestamp = now;
                }
            }
            Kind::Deployment => {
                if let Some(o) = state.deployments.get_mut(key) {
                    o.metadata.deletion_timestamp = now;
                }
            }
        }
    }

    /// Drops an object outright, as after garbage collection.
    pub fn remove(&self, kind: Kind, key: &ObjectKey) {
        let mut state = self.state.lock();
        match kind {
            Kind::Head => {
                state.heads.remove(key);
            }
            Kind::ChildA => {
                state.childas.remove(key);
            }
            Kind::Deployment => {
                state.deployments.remove(key);
            }
        }
    }

    /// Makes every `op` against `kind` fail until cleared.
    pub fn fail_on(&self, op: Op, kind: Kind) {
        self.state.lock().faults.insert((op, kind));
    }

    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().journal.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().journal.len()
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn get_head(&self, key: &ObjectKey) -> Result<Option<Head>, ClusterError> {
        let state = self.state.lock();
        state.check_fault(Op::Get, Kind::Head)?;
        Ok(state.heads.get(key).cloned())
    }

    async fn get_childa(&self, key: &ObjectKey) -> Result<Option<ChildA>, ClusterError> {
        let state = self.state.lock();
        state.check_fault(Op::Get, Kind::ChildA)?;
        Ok(state.childas.get(key).cloned())
    }

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Option<Deployment>, ClusterError> {
        let state = self.state.lock();
        state.check_fault(Op::Get, Kind::Deployment)?;
        Ok(state.deployments.get(key).cloned())
    }

    async fn create_childa(&self, child: &ChildA) -> Result<ChildA, ClusterError> {
        let mut state = self.state.lock();
        state.check_fault(Op::Create, Kind::ChildA)?;
        let version = state.next_version();
        let (key, stored) = admit(&mut state.childas, child, Kind::ChildA, version)?;
        state.journal.push(Mutation::Created(Kind::ChildA, key));
        Ok(stored)
    }

    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        let mut state = self.state.lock();
        state.check_fault(Op::Create, Kind::Deployment)?;
        let version = state.next_version();
        let (key, stored) = admit(&mut state.deployments, deployment, Kind::Deployment, version)?;
        state.journal.push(Mutation::Created(Kind::Deployment, key));
        Ok(stored)
    }

    async fn update_head_status(&self, head: &Head) -> Result<Head, ClusterError> {
        let mut state = self.state.lock();
        state.check_fault(Op::UpdateStatus, Kind::Head)?;
        let version = state.next_version();
        let (key, stored) = write_status(&mut state.heads, head, Kind::Head, version, |src, dst| {
            dst.status = src.status.clone();
        })?;
        state.journal.push(Mutation::StatusUpdated(Kind::Head, key));
        Ok(stored)
    }

    async fn update_childa_status(&self, child: &ChildA) -> Result<ChildA, ClusterError> {
        let mut state = self.state.lock();
        state.check_fault(Op::UpdateStatus, Kind::ChildA)?;
        let version = state.next_version();
        let (key, stored) =
            write_status(&mut state.childas, child, Kind::ChildA, version, |src, dst| {
                dst.status = src.status.clone();
            })?;
        state.journal.push(Mutation::StatusUpdated(Kind::ChildA, key));
        Ok(stored)
    }
}
