//! Persistent volume descriptors produced by mappers.
//!
//! Field names serialize in the shape Kubernetes uses for `PersistentVolume`,
//! so the output can be handed to the API server or a node-side mount client
//! without translation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AccessMode, ReclaimPolicy};

/// Name-only pointer to externally managed credential material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl SecretReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }
}

/// Mount descriptor for an RBD image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbdVolumeSource {
    /// Ceph monitors as "host:port", in the order the client should try them
    pub monitors: Vec<String>,
    pub pool: String,
    pub image: String,
    pub user: String,
    pub secret_ref: SecretReference,
}

/// Protocol-specific part of a persistent volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistentVolumeSource {
    Rbd(RbdVolumeSource),
}

impl PersistentVolumeSource {
    /// Protocol name of this source, matching the backend's `driver_volume_type`.
    pub fn volume_type(&self) -> &'static str {
        match self {
            PersistentVolumeSource::Rbd(_) => crate::mapper::rbd::RBD_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeSpec {
    pub persistent_volume_reclaim_policy: ReclaimPolicy,
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    #[serde(default)]
    pub capacity: BTreeMap<String, String>,
    #[serde(flatten)]
    pub source: PersistentVolumeSource,
}

/// A fully assembled persistent volume, ready for the controller to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentVolume {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub spec: PersistentVolumeSpec,
}
