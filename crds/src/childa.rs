use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a ChildA.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[kube(
    group = "dummy.example.com",
    version = "v1alpha1",
    kind = "ChildA",
    plural = "childas",
    namespaced,
    status = "ChildAStatus",
    printcolumn = r#"{"name":"Ready","type":"boolean","jsonPath":".status.ready"}"#
)]
pub struct ChildASpec {
    #[serde(default)]
    pub image: String,
}

/// Observed state of a ChildA.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ChildAStatus {
    /// Last observed readiness of the owned Deployment.
    #[serde(default)]
    pub ready: bool,
}

impl ChildA {
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }
}
