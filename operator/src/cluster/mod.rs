//! Narrow view of the cluster consumed by the reconcilers and the hook.
//!
//! Reads return `Ok(None)` when the object does not exist; every other
//! failure is a `ClusterError` the caller surfaces for retry.

pub mod kube_client;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use crds::{ChildA, Head};
use k8s_openapi::api::apps::v1::Deployment;
use kube::{Resource, ResourceExt};

use crate::error::ClusterError;

pub use kube_client::KubeCluster;
pub use memory::InMemoryCluster;

/// Identity of a namespaced object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a stored object; `None` when name or namespace is unset.
    pub fn for_object<K: ResourceExt>(obj: &K) -> Option<Self> {
        let namespace = obj.namespace().filter(|ns| !ns.is_empty())?;
        let name = obj.meta().name.clone().filter(|n| !n.is_empty())?;
        Some(Self { namespace, name })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Resource kinds of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Head,
    ChildA,
    Deployment,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Head => "Head",
            Kind::ChildA => "ChildA",
            Kind::Deployment => "Deployment",
        };
        f.write_str(s)
    }
}

#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn get_head(&self, key: &ObjectKey) -> Result<Option<Head>, ClusterError>;

    async fn get_childa(&self, key: &ObjectKey) -> Result<Option<ChildA>, ClusterError>;

    async fn get_deployment(&self, key: &ObjectKey) -> Result<Option<Deployment>, ClusterError>;

    async fn create_childa(&self, child: &ChildA) -> Result<ChildA, ClusterError>;

    async fn create_deployment(&self, deployment: &Deployment)
    -> Result<Deployment, ClusterError>;

    /// Writes only the status subresource of `head`.
    async fn update_head_status(&self, head: &Head) -> Result<Head, ClusterError>;

    /// Writes only the status subresource of `child`.
    async fn update_childa_status(&self, child: &ChildA) -> Result<ChildA, ClusterError>;
}
