//! Desired children derived from their parents.

use std::collections::BTreeMap;

use crds::{ChildA, ChildASpec, Head};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::{Resource, ResourceExt};

use crate::cluster::{Kind, ObjectKey};
use crate::error::Error;
use crate::trace::TraceCarrier;

pub const APP_LABEL: &str = "app";
pub const APP_LABEL_VALUE: &str = "demo";
pub const PARENT_LABEL: &str = "parent";
pub const MAIN_CONTAINER: &str = "main";

/// `replicas > 0 && readyReplicas == replicas`; absent counters read as 0.
pub fn deployment_ready(deployment: &Deployment) -> bool {
    let Some(status) = deployment.status.as_ref() else {
        return false;
    };
    let replicas = status.replicas.unwrap_or(0);
    let ready = status.ready_replicas.unwrap_or(0);
    replicas > 0 && ready == replicas
}

/// Deployment owned by `child`: same identity, one `main` container.
pub fn desired_deployment(child: &ChildA, key: &ObjectKey) -> Result<Deployment, Error> {
    let labels = BTreeMap::from([
        (APP_LABEL.to_string(), APP_LABEL_VALUE.to_string()),
        (PARENT_LABEL.to_string(), key.name.clone()),
    ]);

    let mut metadata = ObjectMeta {
        name: Some(key.name.clone()),
        namespace: Some(key.namespace.clone()),
        ..Default::default()
    };
    set_controller_reference(child, &mut metadata, Kind::Deployment, key)?;

    Ok(Deployment {
        metadata,
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: MAIN_CONTAINER.to_string(),
                        image: Some(child.spec.image.clone()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    })
}

/// ChildA owned by `head`: same identity, trace annotation copied verbatim.
pub fn desired_childa(head: &Head, key: &ObjectKey) -> Result<ChildA, Error> {
    let mut child = ChildA::new(
        &key.name,
        ChildASpec {
            image: head.spec.child_image.clone(),
        },
    );
    child.metadata.namespace = Some(key.namespace.clone());
    TraceCarrier::from_resource(head).stamp(&mut child);
    set_controller_reference(head, &mut child.metadata, Kind::ChildA, key)?;
    Ok(child)
}

/// Marks `owner` as the controller of `dependent`, so deleting the owner
/// cascades to the dependent.
///
/// Fails when the owner has no name or uid yet, or when the dependent is
/// already controlled by another object.
pub fn set_controller_reference<O>(
    owner: &O,
    dependent: &mut ObjectMeta,
    kind: Kind,
    key: &ObjectKey,
) -> Result<(), Error>
where
    O: Resource<DynamicType = ()>,
{
    let owner_ref = owner
        .controller_owner_ref(&())
        .ok_or_else(|| Error::OwnerReference {
            kind,
            key: key.clone(),
            reason: format!("owner {} has no name or uid", owner.name_any()),
        })?;

    let refs = dependent.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner_ref.uid)
    {
        return Err(Error::OwnerReference {
            kind,
            key: key.clone(),
            reason: format!("already controlled by {} {}", other.kind, other.name),
        });
    }

    refs.retain(|r| r.uid != owner_ref.uid);
    refs.push(owner_ref);
    Ok(())
}
