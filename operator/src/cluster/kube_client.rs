use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use crds::{ChildA, Head};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::{ClusterClient, ObjectKey};
use crate::error::ClusterError;
use crate::logger::warn_if_slow;

/// `ClusterClient` backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    slow_threshold: Duration,
}

impl KubeCluster {
    pub fn new(client: Client, slow_threshold: Duration) -> Self {
        Self {
            client,
            slow_threshold,
        }
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, label: &'static str, key: &ObjectKey) -> Result<Option<K>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api = self.api::<K>(&key.namespace);
        let obj = warn_if_slow(label, self.slow_threshold, api.get_opt(&key.name)).await?;
        debug!(found = obj.is_some(), "fetched");
        Ok(obj)
    }

    async fn create<K>(&self, label: &'static str, obj: &K) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Serialize + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let namespace = obj
            .namespace()
            .ok_or(ClusterError::MissingField("namespace"))?;
        let api = self.api::<K>(&namespace);
        let created = warn_if_slow(
            label,
            self.slow_threshold,
            api.create(&PostParams::default(), obj),
        )
        .await?;
        Ok(created)
    }

    /// Replaces the status subresource; the stored `resourceVersion` guards
    /// against concurrent writers.
    async fn replace_status<K>(&self, label: &'static str, obj: &K) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + Serialize + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let namespace = obj
            .namespace()
            .ok_or(ClusterError::MissingField("namespace"))?;
        let name = obj.meta().name.clone().ok_or(ClusterError::MissingField("name"))?;
        let data = serde_json::to_vec(obj)?;

        let api = self.api::<K>(&namespace);
        let updated = warn_if_slow(
            label,
            self.slow_threshold,
            api.replace_status(&name, &PostParams::default(), data),
        )
        .await?;
        Ok(updated)
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    #[instrument(skip(self), target = "cluster", fields(key = %key))]
    async fn get_head(&self, key: &ObjectKey) -> Result<Option<Head>, ClusterError> {
        self.get("get_head", key).await
    }

    #[instrument(skip(self), target = "cluster", fields(key = %key))]
    async fn get_childa(&self, key: &ObjectKey) -> Result<Option<ChildA>, ClusterError> {
        self.get("get_childa", key).await
    }

    #[instrument(skip(self), target = "cluster", fields(key = %key))]
    async fn get_deployment(&self, key: &ObjectKey) -> Result<Option<Deployment>, ClusterError> {
        self.get("get_deployment", key).await
    }

    #[instrument(skip_all, target = "cluster", fields(name = %child.name_any()))]
    async fn create_childa(&self, child: &ChildA) -> Result<ChildA, ClusterError> {
        self.create("create_childa", child).await
    }

    #[instrument(skip_all, target = "cluster", fields(name = %deployment.name_any()))]
    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterError> {
        self.create("create_deployment", deployment).await
    }

    #[instrument(skip_all, target = "cluster", fields(name = %head.name_any()))]
    async fn update_head_status(&self, head: &Head) -> Result<Head, ClusterError> {
        self.replace_status("update_head_status", head).await
    }

    #[instrument(skip_all, target = "cluster", fields(name = %child.name_any()))]
    async fn update_childa_status(&self, child: &ChildA) -> Result<ChildA, ClusterError> {
        self.replace_status("update_childa_status", child).await
    }
}
