//! Cinder Volume Mapper CLI
//!
//! Runs the mapper registry against connection info captured from Cinder and
//! prints the resulting persistent volume as JSON. Useful for checking what a
//! provisioner would create without a running cluster.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use volume_mapper::{
    AccessMode, ClaimRef, MapperRegistry, PersistentVolume, ProvisionOptions, ProvisionerContext,
    ReclaimPolicy, VolumeConnection,
};

/// CLI arguments for the volume mapper
#[derive(Parser, Debug)]
#[command(name = "volume-mapper")]
#[command(about = "Map Cinder volume connections to Kubernetes persistent volumes")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a persistent volume from a Cinder connection info file
    Provision {
        /// JSON file holding the `os-initialize_connection` response
        #[arg(long)]
        connection: PathBuf,

        /// Name of the persistent volume to create
        #[arg(long)]
        pv_name: String,

        /// Storage class the claim requested
        #[arg(long)]
        storage_class: String,

        /// Namespace of the claim being fulfilled
        #[arg(long, default_value = "default")]
        claim_namespace: String,

        /// Name of the claim being fulfilled
        #[arg(long)]
        claim_name: String,

        /// Access mode requested by the claim (repeatable)
        #[arg(long = "access-mode", default_value = "ReadWriteOnce")]
        access_modes: Vec<AccessMode>,

        /// Requested capacity (e.g. 10Gi)
        #[arg(long)]
        storage: Option<String>,

        /// Reclaim policy (Delete or Retain)
        #[arg(long, default_value = "Delete")]
        reclaim_policy: ReclaimPolicy,

        /// Backend volume ID
        #[arg(long)]
        volume_id: String,

        /// Provisioner identity recorded on the volume
        #[arg(long, env = "PROVISIONER_ID", default_value = "cinder-provisioner")]
        provisioner_id: String,
    },

    /// Run auth teardown for a persistent volume file
    Teardown {
        /// JSON file holding the persistent volume
        #[arg(long)]
        volume: PathBuf,

        /// Provisioner identity
        #[arg(long, env = "PROVISIONER_ID", default_value = "cinder-provisioner")]
        provisioner_id: String,
    },
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing on stderr so stdout stays machine readable
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = MapperRegistry::default();

    match args.command {
        Command::Provision {
            connection,
            pv_name,
            storage_class,
            claim_namespace,
            claim_name,
            access_modes,
            storage,
            reclaim_policy,
            volume_id,
            provisioner_id,
        } => {
            let conn: VolumeConnection = read_json(&connection).await?;
            info!(
                path = %connection.display(),
                volume_type = %conn.driver_volume_type,
                "Loaded volume connection"
            );

            let options = ProvisionOptions {
                pv_name,
                reclaim_policy,
                storage_class_name: Some(storage_class),
                claim: ClaimRef {
                    namespace: claim_namespace,
                    name: claim_name,
                    access_modes,
                    requested_storage: storage,
                },
            };
            let provisioner = ProvisionerContext::new(provisioner_id);

            let pv = registry.provision(&provisioner, &options, &conn, &volume_id)?;
            println!("{}", serde_json::to_string_pretty(&pv)?);
        }
        Command::Teardown {
            volume,
            provisioner_id,
        } => {
            let pv: PersistentVolume = read_json(&volume).await?;
            registry.teardown(&ProvisionerContext::new(provisioner_id), &pv)?;
            info!(pv_name = %pv.name, "Auth teardown complete");
        }
    }

    Ok(())
}
