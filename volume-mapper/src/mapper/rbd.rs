//! RBD (Ceph block device) volume mapper.
//!
//! Translates Cinder's rbd connection info into an `RbdVolumeSource`. Cephx
//! credentials are never minted here: the volume only references a secret
//! named after its storage class, so the auth hooks have nothing to do.

use tracing::{debug, error};

use super::VolumeMapper;
use crate::error::{MapperError, Result};
use crate::types::{ConnectionInfo, ProvisionOptions, ProvisionerContext, VolumeConnection};
use crate::volume::{PersistentVolume, PersistentVolumeSource, RbdVolumeSource, SecretReference};

/// Backend protocol name handled by this mapper
pub const RBD_TYPE: &str = "rbd";

/// Suffix appended to the storage class name to form the cephx secret name
const CEPHX_SECRET_SUFFIX: &str = "-cephx-secret";

/// Mapper for volumes exported over RBD.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbdMapper;

impl RbdMapper {
    pub fn new() -> Self {
        Self
    }
}

/// Build the ordered monitor list from paired hosts and ports.
///
/// Order is the client's fallback order and is preserved as given.
pub fn monitors(info: &ConnectionInfo) -> Result<Vec<String>> {
    if info.hosts.len() != info.ports.len() {
        error!(
            hosts = info.hosts.len(),
            ports = info.ports.len(),
            "Error parsing rbd connection info: 'hosts' and 'ports' have different lengths"
        );
        return Err(MapperError::MalformedConnectionInfo(
            "hosts and ports have different lengths".to_string(),
        ));
    }

    Ok(info
        .hosts
        .iter()
        .zip(&info.ports)
        .map(|(host, port)| format!("{}:{}", host, port))
        .collect())
}

/// Split a "pool/image" identifier on its first separator.
///
/// Anything after the first '/' belongs to the image name.
pub fn split_pool_image(name: &str) -> Result<(&str, &str)> {
    match name.split_once('/') {
        Some((pool, image)) if !pool.is_empty() && !image.is_empty() => Ok((pool, image)),
        _ => Err(MapperError::MalformedConnectionInfo(
            "field 'name' cannot be split into pool and image".to_string(),
        )),
    }
}

/// Name of the cephx secret referenced by volumes of a storage class.
pub fn secret_name(options: &ProvisionOptions) -> Result<String> {
    match options.storage_class_name.as_deref() {
        Some(class) if !class.is_empty() => Ok(format!("{}{}", class, CEPHX_SECRET_SUFFIX)),
        _ => Err(MapperError::InvalidRequest(
            "storage class name is required to derive the cephx secret".to_string(),
        )),
    }
}

impl VolumeMapper for RbdMapper {
    fn volume_type(&self) -> &'static str {
        RBD_TYPE
    }

    fn build_pv_source(
        &self,
        conn: &VolumeConnection,
        options: &ProvisionOptions,
    ) -> Result<PersistentVolumeSource> {
        let monitors = monitors(&conn.data)?;
        let (pool, image) = split_pool_image(&conn.data.name)?;
        let secret_ref = SecretReference::new(secret_name(options)?);

        debug!(
            pool = %pool,
            image = %image,
            monitors = monitors.len(),
            secret = %secret_ref.name,
            "Built rbd volume source"
        );

        Ok(PersistentVolumeSource::Rbd(RbdVolumeSource {
            monitors,
            pool: pool.to_string(),
            image: image.to_string(),
            user: conn.data.auth_username.clone(),
            secret_ref,
        }))
    }

    fn auth_setup(
        &self,
        _provisioner: &ProvisionerContext,
        _options: &ProvisionOptions,
        _conn: &VolumeConnection,
    ) -> Result<()> {
        Ok(())
    }

    fn auth_teardown(&self, _provisioner: &ProvisionerContext, _pv: &PersistentVolume) -> Result<()> {
        Ok(())
    }
}
