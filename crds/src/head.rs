use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a Head.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "dummy.example.com",
    version = "v1alpha1",
    kind = "Head",
    namespaced,
    status = "HeadStatus",
    printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HeadSpec {
    /// Image for the container of the owned ChildA's Deployment.
    #[serde(default)]
    pub child_image: String,
}

/// Observed state of a Head.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct HeadStatus {
    /// Last observed readiness of the owned ChildA.
    #[serde(default)]
    pub ready: bool,
}

impl Head {
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }
}
