//! Cinder Volume Mapper Library
//!
//! Translates Cinder volume connection info into Kubernetes persistent
//! volume descriptors for a provisioning controller.
//!
//! This library provides:
//! - The `VolumeMapper` capability set shared by every backend protocol
//! - The RBD mapper (Ceph monitors, pool/image addressing, cephx secret reference)
//! - A registry dispatching requests to mappers by protocol name

pub mod error;
pub mod mapper;
pub mod metrics;
pub mod types;
pub mod volume;

pub use error::{MapperError, Result};
pub use mapper::{MapperRegistry, RbdMapper, VolumeMapper, build_pv};
pub use types::{
    AccessMode, ClaimRef, ConnectionInfo, ProvisionOptions, ProvisionerContext, ReclaimPolicy,
    VolumeConnection,
};
pub use volume::{
    PersistentVolume, PersistentVolumeSource, PersistentVolumeSpec, RbdVolumeSource,
    SecretReference,
};
