use thiserror::Error;

use crate::cluster::{Kind, ObjectKey};

/// Failure of a single call against the cluster.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("kubernetes api request failed: {0}")]
    Api(#[from] kube::Error),

    #[error("failed to encode object: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: Kind, key: ObjectKey },

    #[error("{kind} {key} not found")]
    NotFound { kind: Kind, key: ObjectKey },

    #[error("{kind} {key} was modified concurrently")]
    Conflict { kind: Kind, key: ObjectKey },

    #[error("object has no {0}")]
    MissingField(&'static str),

    #[error("cluster unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a reconcile pass. Returned to the controller, which requeues.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to fetch {kind} {key}: {source}")]
    Fetch {
        kind: Kind,
        key: ObjectKey,
        #[source]
        source: ClusterError,
    },

    #[error("failed to create {kind} {key}: {source}")]
    Create {
        kind: Kind,
        key: ObjectKey,
        #[source]
        source: ClusterError,
    },

    #[error("failed to update status of {kind} {key}: {source}")]
    UpdateStatus {
        kind: Kind,
        key: ObjectKey,
        #[source]
        source: ClusterError,
    },

    #[error("cannot set owner reference on {kind} {key}: {reason}")]
    OwnerReference {
        kind: Kind,
        key: ObjectKey,
        reason: String,
    },
}

impl Error {
    pub fn kind(&self) -> Kind {
        match self {
            Error::Fetch { kind, .. }
            | Error::Create { kind, .. }
            | Error::UpdateStatus { kind, .. }
            | Error::OwnerReference { kind, .. } => *kind,
        }
    }
}
