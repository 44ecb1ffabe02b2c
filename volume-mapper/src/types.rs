//! Request-side types consumed by volume mappers.
//!
//! `VolumeConnection` mirrors the payload Cinder returns from
//! `os-initialize_connection`, so the wire names are snake_case. The
//! provisioning request types carry what the controller knows about the
//! claim being fulfilled.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// Connection info
// ============================================================================

/// Backend connection data for a single attached volume.
///
/// Only the fields the block-device mapper needs are mandatory; the rest are
/// carried through so other protocol variants can use them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Storage node addresses, paired with `ports` by position
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Storage node ports, paired with `hosts` by position
    #[serde(default)]
    pub ports: Vec<String>,
    /// Combined "pool/image" identifier
    #[serde(default)]
    pub name: String,
    /// Backend principal presented at mount time
    #[serde(default)]
    pub auth_username: String,
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
}

/// Connection envelope as returned by the backend service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeConnection {
    /// Protocol name used to select a mapper (e.g. "rbd")
    pub driver_volume_type: String,
    pub data: ConnectionInfo,
}

// ============================================================================
// AccessMode
// ============================================================================

/// Volume access mode requested by a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    ReadWriteOnce,
    ReadOnlyMany,
    ReadWriteMany,
    ReadWriteOncePod,
}

impl Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::ReadWriteOnce => write!(f, "ReadWriteOnce"),
            AccessMode::ReadOnlyMany => write!(f, "ReadOnlyMany"),
            AccessMode::ReadWriteMany => write!(f, "ReadWriteMany"),
            AccessMode::ReadWriteOncePod => write!(f, "ReadWriteOncePod"),
        }
    }
}

impl FromStr for AccessMode {
    type Err = AccessModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "readwriteonce" | "rwo" => Ok(AccessMode::ReadWriteOnce),
            "readonlymany" | "rox" => Ok(AccessMode::ReadOnlyMany),
            "readwritemany" | "rwx" => Ok(AccessMode::ReadWriteMany),
            "readwriteoncepod" | "rwop" => Ok(AccessMode::ReadWriteOncePod),
            _ => Err(AccessModeParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid access mode.
#[derive(Debug, Clone)]
pub struct AccessModeParseError(String);

impl Display for AccessModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown access mode '{}': expected 'ReadWriteOnce', 'ReadOnlyMany', 'ReadWriteMany', or 'ReadWriteOncePod'",
            self.0
        )
    }
}

impl std::error::Error for AccessModeParseError {}

// ============================================================================
// ReclaimPolicy
// ============================================================================

/// What happens to the backend volume once its claim is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReclaimPolicy {
    /// Delete the backend volume (default for dynamically provisioned volumes)
    #[default]
    Delete,
    /// Keep the backend volume for manual reclamation
    Retain,
}

impl Display for ReclaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReclaimPolicy::Delete => write!(f, "Delete"),
            ReclaimPolicy::Retain => write!(f, "Retain"),
        }
    }
}

impl FromStr for ReclaimPolicy {
    type Err = ReclaimPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "delete" | "" => Ok(ReclaimPolicy::Delete),
            "retain" => Ok(ReclaimPolicy::Retain),
            _ => Err(ReclaimPolicyParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid reclaim policy.
#[derive(Debug, Clone)]
pub struct ReclaimPolicyParseError(String);

impl Display for ReclaimPolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown reclaim policy '{}': expected 'Delete' or 'Retain'",
            self.0
        )
    }
}

impl std::error::Error for ReclaimPolicyParseError {}

// ============================================================================
// Provisioning request
// ============================================================================

/// The claim a provisioning request is fulfilling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimRef {
    pub namespace: String,
    pub name: String,
    pub access_modes: Vec<AccessMode>,
    /// Requested capacity as a quantity string (e.g. "10Gi")
    pub requested_storage: Option<String>,
}

/// Options supplied by the provisioning controller for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Name to give the resulting persistent volume
    pub pv_name: String,
    pub reclaim_policy: ReclaimPolicy,
    /// Storage class that triggered this request
    pub storage_class_name: Option<String>,
    pub claim: ClaimRef,
}

/// The provisioner instance invoking a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerContext {
    /// Identity recorded on every volume this provisioner creates
    pub identity: String,
}

impl ProvisionerContext {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
        }
    }
}
