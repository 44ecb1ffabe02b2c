//! Volume mappers
//!
//! A mapper turns backend connection info for one protocol into the matching
//! persistent volume source, and owns whatever auth material that protocol
//! needs around provisioning. The controller picks a mapper through
//! [`MapperRegistry`] by protocol name and never sees the concrete type.

pub mod rbd;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{MapperError, Result};
use crate::metrics::OperationTimer;
use crate::types::{ProvisionOptions, ProvisionerContext, VolumeConnection};
use crate::volume::{PersistentVolume, PersistentVolumeSource, PersistentVolumeSpec};

pub use rbd::RbdMapper;

/// Annotation recording which provisioner instance created a volume
pub const PROVISIONER_ID_ANNOTATION: &str = "cinderProvisionerIdentity";
/// Annotation recording the backend volume ID
pub const CINDER_VOLUME_ID_ANNOTATION: &str = "cinderVolumeId";

/// Capacity key used in the persistent volume spec
const STORAGE_RESOURCE: &str = "storage";

/// Capability set every backend-protocol adapter implements.
///
/// Implementations hold no per-request state; a single instance serves
/// concurrent requests. By convention the controller calls `auth_setup`
/// before `build_pv_source`, and `auth_teardown` when the volume is deleted.
pub trait VolumeMapper: Send + Sync {
    /// Protocol name, matched against the backend's `driver_volume_type`.
    fn volume_type(&self) -> &'static str;

    /// Build the protocol-specific volume source. Fails without producing a
    /// partial source.
    fn build_pv_source(
        &self,
        conn: &VolumeConnection,
        options: &ProvisionOptions,
    ) -> Result<PersistentVolumeSource>;

    /// Materialize credentials the volume will need before it is built.
    fn auth_setup(
        &self,
        provisioner: &ProvisionerContext,
        options: &ProvisionOptions,
        conn: &VolumeConnection,
    ) -> Result<()>;

    /// Release credentials created by `auth_setup`.
    fn auth_teardown(&self, provisioner: &ProvisionerContext, pv: &PersistentVolume)
    -> Result<()>;
}

/// Wrap a mapper's volume source into a complete persistent volume.
pub fn build_pv(
    mapper: &dyn VolumeMapper,
    provisioner: &ProvisionerContext,
    options: &ProvisionOptions,
    conn: &VolumeConnection,
    volume_id: &str,
) -> Result<PersistentVolume> {
    let source = mapper.build_pv_source(conn, options)?;

    let annotations = BTreeMap::from([
        (
            PROVISIONER_ID_ANNOTATION.to_string(),
            provisioner.identity.clone(),
        ),
        (CINDER_VOLUME_ID_ANNOTATION.to_string(), volume_id.to_string()),
    ]);

    let capacity = options
        .claim
        .requested_storage
        .iter()
        .map(|size| (STORAGE_RESOURCE.to_string(), size.clone()))
        .collect();

    Ok(PersistentVolume {
        name: options.pv_name.clone(),
        annotations,
        spec: PersistentVolumeSpec {
            persistent_volume_reclaim_policy: options.reclaim_policy,
            access_modes: options.claim.access_modes.clone(),
            capacity,
            source,
        },
    })
}

/// Lookup of mappers keyed by protocol name.
#[derive(Clone)]
pub struct MapperRegistry {
    mappers: HashMap<&'static str, Arc<dyn VolumeMapper>>,
}

impl MapperRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    /// Register a mapper under its protocol name, replacing any previous one.
    pub fn register(&mut self, mapper: Arc<dyn VolumeMapper>) {
        let volume_type = mapper.volume_type();
        if self.mappers.insert(volume_type, mapper).is_some() {
            warn!(volume_type = %volume_type, "Replaced existing volume mapper");
        }
    }

    /// Registered protocol names, sorted.
    pub fn volume_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.mappers.keys().copied().collect();
        types.sort_unstable();
        types
    }

    fn get(&self, volume_type: &str) -> Result<Arc<dyn VolumeMapper>> {
        self.mappers
            .get(volume_type)
            .cloned()
            .ok_or_else(|| MapperError::UnsupportedVolumeType(volume_type.to_string()))
    }

    /// Mapper for the protocol a backend connection was made with.
    pub fn for_connection(&self, conn: &VolumeConnection) -> Result<Arc<dyn VolumeMapper>> {
        self.get(&conn.driver_volume_type)
    }

    /// Mapper for the protocol an existing persistent volume uses.
    pub fn for_volume(&self, pv: &PersistentVolume) -> Result<Arc<dyn VolumeMapper>> {
        self.get(pv.spec.source.volume_type())
    }

    /// Run auth setup and build the persistent volume for a new backend volume.
    pub fn provision(
        &self,
        provisioner: &ProvisionerContext,
        options: &ProvisionOptions,
        conn: &VolumeConnection,
        volume_id: &str,
    ) -> Result<PersistentVolume> {
        let timer = OperationTimer::new("provision", conn.driver_volume_type.clone());
        let result = self.for_connection(conn).and_then(|mapper| {
            mapper.auth_setup(provisioner, options, conn)?;
            build_pv(mapper.as_ref(), provisioner, options, conn, volume_id)
        });

        match &result {
            Ok(pv) => {
                info!(
                    pv_name = %pv.name,
                    volume_id = %volume_id,
                    volume_type = %conn.driver_volume_type,
                    "Built persistent volume"
                );
                timer.success();
            }
            Err(e) => {
                debug!(volume_id = %volume_id, error = %e, "Failed to build persistent volume");
                timer.failure(e.kind());
            }
        }
        result
    }

    /// Run auth teardown for a persistent volume being deleted.
    pub fn teardown(&self, provisioner: &ProvisionerContext, pv: &PersistentVolume) -> Result<()> {
        let volume_type = pv.spec.source.volume_type();
        let timer = OperationTimer::new("teardown", volume_type);
        let result = self
            .for_volume(pv)
            .and_then(|mapper| mapper.auth_teardown(provisioner, pv));

        match &result {
            Ok(()) => timer.success(),
            Err(e) => timer.failure(e.kind()),
        }
        result
    }
}

impl Default for MapperRegistry {
    /// Registry with every mapper this crate ships.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RbdMapper::new()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessMode, ClaimRef, ConnectionInfo, ReclaimPolicy};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rbd_connection() -> VolumeConnection {
        VolumeConnection {
            driver_volume_type: "rbd".to_string(),
            data: ConnectionInfo {
                hosts: vec!["10.0.0.1".to_string()],
                ports: vec!["6789".to_string()],
                name: "volumes/volume-1".to_string(),
                auth_username: "cinder".to_string(),
                ..Default::default()
            },
        }
    }

    fn provision_options() -> ProvisionOptions {
        ProvisionOptions {
            pv_name: "pvc-42".to_string(),
            reclaim_policy: ReclaimPolicy::Retain,
            storage_class_name: Some("gold".to_string()),
            claim: ClaimRef {
                namespace: "default".to_string(),
                name: "data".to_string(),
                access_modes: vec![AccessMode::ReadWriteOnce],
                requested_storage: Some("10Gi".to_string()),
            },
        }
    }

    /// Test mapper counting hook invocations
    #[derive(Default)]
    struct CountingMapper {
        setups: AtomicUsize,
        teardowns: AtomicUsize,
        fail_setup: bool,
    }

    impl VolumeMapper for CountingMapper {
        fn volume_type(&self) -> &'static str {
            "rbd"
        }

        fn build_pv_source(
            &self,
            conn: &VolumeConnection,
            options: &ProvisionOptions,
        ) -> Result<PersistentVolumeSource> {
            RbdMapper::new().build_pv_source(conn, options)
        }

        fn auth_setup(
            &self,
            _provisioner: &ProvisionerContext,
            _options: &ProvisionOptions,
            _conn: &VolumeConnection,
        ) -> Result<()> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            if self.fail_setup {
                return Err(MapperError::InvalidRequest("setup refused".to_string()));
            }
            Ok(())
        }

        fn auth_teardown(
            &self,
            _provisioner: &ProvisionerContext,
            _pv: &PersistentVolume,
        ) -> Result<()> {
            self.teardowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_default_registry_has_rbd() {
        let registry = MapperRegistry::default();
        assert_eq!(registry.volume_types(), vec!["rbd"]);
        let mapper = registry.for_connection(&rbd_connection()).unwrap();
        assert_eq!(mapper.volume_type(), "rbd");
    }

    #[test]
    fn test_unsupported_volume_type() {
        let registry = MapperRegistry::default();
        let mut conn = rbd_connection();
        conn.driver_volume_type = "iscsi".to_string();

        let err = registry.for_connection(&conn).err().unwrap();
        assert_eq!(err, MapperError::UnsupportedVolumeType("iscsi".to_string()));
        assert!(registry.provision(
            &ProvisionerContext::new("p"),
            &provision_options(),
            &conn,
            "vol-1"
        )
        .is_err());
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = MapperRegistry::new();
        assert!(registry.volume_types().is_empty());
        assert!(registry.for_connection(&rbd_connection()).is_err());
    }

    #[test]
    fn test_build_pv_fills_metadata() {
        let provisioner = ProvisionerContext::new("cinder-provisioner-1");
        let pv = build_pv(
            &RbdMapper::new(),
            &provisioner,
            &provision_options(),
            &rbd_connection(),
            "vol-1",
        )
        .unwrap();

        assert_eq!(pv.name, "pvc-42");
        assert_eq!(
            pv.annotations.get(PROVISIONER_ID_ANNOTATION).unwrap(),
            "cinder-provisioner-1"
        );
        assert_eq!(pv.annotations.get(CINDER_VOLUME_ID_ANNOTATION).unwrap(), "vol-1");
        assert_eq!(pv.spec.persistent_volume_reclaim_policy, ReclaimPolicy::Retain);
        assert_eq!(pv.spec.access_modes, vec![AccessMode::ReadWriteOnce]);
        assert_eq!(pv.spec.capacity.get("storage").unwrap(), "10Gi");
        assert_eq!(pv.spec.source.volume_type(), "rbd");
    }

    #[test]
    fn test_build_pv_without_requested_storage() {
        let mut options = provision_options();
        options.claim.requested_storage = None;
        let pv = build_pv(
            &RbdMapper::new(),
            &ProvisionerContext::new("p"),
            &options,
            &rbd_connection(),
            "vol-1",
        )
        .unwrap();
        assert!(pv.spec.capacity.is_empty());
    }

    #[test]
    fn test_provision_runs_setup_then_build() {
        let counting = Arc::new(CountingMapper::default());
        let mut registry = MapperRegistry::new();
        registry.register(counting.clone());

        let provisioner = ProvisionerContext::new("p");
        let pv = registry
            .provision(&provisioner, &provision_options(), &rbd_connection(), "vol-1")
            .unwrap();
        assert_eq!(counting.setups.load(Ordering::SeqCst), 1);

        registry.teardown(&provisioner, &pv).unwrap();
        assert_eq!(counting.teardowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_provision_aborts_when_setup_fails() {
        let counting = Arc::new(CountingMapper {
            fail_setup: true,
            ..Default::default()
        });
        let mut registry = MapperRegistry::new();
        registry.register(counting);

        let err = registry
            .provision(
                &ProvisionerContext::new("p"),
                &provision_options(),
                &rbd_connection(),
                "vol-1",
            )
            .unwrap_err();
        assert!(matches!(err, MapperError::InvalidRequest(_)));
    }

    #[test]
    fn test_register_replaces_existing() {
        let counting = Arc::new(CountingMapper::default());
        let mut registry = MapperRegistry::default();
        registry.register(counting.clone());
        assert_eq!(registry.volume_types(), vec!["rbd"]);

        registry
            .provision(
                &ProvisionerContext::new("p"),
                &provision_options(),
                &rbd_connection(),
                "vol-1",
            )
            .unwrap();
        assert_eq!(counting.setups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registry_shared_across_threads() {
        let registry = Arc::new(MapperRegistry::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .provision(
                            &ProvisionerContext::new("p"),
                            &provision_options(),
                            &rbd_connection(),
                            &format!("vol-{}", i),
                        )
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            let pv = handle.join().unwrap();
            assert_eq!(pv.spec.source.volume_type(), "rbd");
        }
    }
}
