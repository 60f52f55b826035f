//! Mount one version of an OCFL object as a read-only filesystem.
//!
//! Usage:
//!   mount-ocfl [--version vN] [--debug] <storage-root> <object-id> <mountpoint>
//!
//! Example:
//!   mount-ocfl --version v2 s3://my-bucket/ocfl-root ark:123/abc ~/abc
//!   mount-ocfl /data/ocfl-root ark:123/abc /mnt/abc

use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use rusty_ocfl_storage::S3Config;
use rusty_ocfl_vfs::{open_object, spawn_mount, ObjectFs, OcflVfs, VfsOptions};
use tracing_subscriber::EnvFilter;

/// Mount an OCFL object version read-only.
#[derive(Parser, Debug)]
#[command(name = "mount-ocfl")]
struct CliArgs {
    /// Storage root: `s3://bucket[/prefix]` or a local directory.
    storage_root: String,

    /// OCFL object identifier.
    object_id: String,

    /// Directory to mount at (created if missing).
    mountpoint: PathBuf,

    /// Version to mount (e.g., v3); defaults to the head version.
    #[arg(long = "version", default_value = "")]
    version: String,

    /// Log at debug level.
    #[arg(long)]
    debug: bool,

    /// AWS region for S3 storage roots.
    #[arg(long)]
    region: Option<String>,

    /// Custom S3 endpoint URL (e.g., for MinIO).
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Use path-style S3 addressing.
    #[arg(long)]
    path_style: bool,
}

impl CliArgs {
    fn s3_config(&self) -> S3Config {
        let mut config: S3Config = S3Config::default().with_force_path_style(self.path_style);
        if let Some(region) = &self.region {
            config = config.with_region(region.clone());
        }
        if let Some(endpoint) = &self.endpoint_url {
            config = config.with_endpoint_url(endpoint.clone());
        }
        config
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let default_level: &str = if debug { "debug" } else { "info" };
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: CliArgs = CliArgs::parse();
    init_logging(args.debug);

    if !args.mountpoint.exists() {
        std::fs::create_dir_all(&args.mountpoint)?;
    }

    let runtime: tokio::runtime::Runtime = tokio::runtime::Runtime::new()?;
    let object: ObjectFs = runtime.block_on(open_object(
        &args.storage_root,
        &args.object_id,
        &args.version,
        &args.s3_config(),
    ))?;

    tracing::info!(
        storage_root = %args.storage_root,
        root_spec = object.info.root_spec.as_deref().unwrap_or("unknown"),
        layout = object.info.layout.as_deref().unwrap_or("none"),
        "storage root"
    );
    tracing::info!(
        object_id = %object.info.object_id,
        version = %object.info.version,
        files = object.info.file_count,
        object_path = %object.info.object_path,
        "object"
    );

    let fs_name: String = object.info.fs_name();
    let options: VfsOptions = VfsOptions::default().with_fs_name(fs_name.clone());
    let vfs: OcflVfs = OcflVfs::new(object.view, options)?;

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;

    let session = spawn_mount(vfs, &args.mountpoint)?;
    tracing::info!(
        mountpoint = %args.mountpoint.display(),
        fs_name = %fs_name,
        "mounted read-only; Ctrl+C to unmount"
    );

    // Either a signal or a closed channel means stop.
    let _ = stop_rx.recv();
    tracing::info!("unmounting");
    drop(session);
    drop(runtime);

    tracing::info!("unmounted");
    Ok(())
}
