// ==============================================================================
// main.rs - Chat Shredder Entry Point
// ==============================================================================
// Description: Command line front end for securely deleting chat uploads
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_shredder::report::LogBroadcaster;
use chat_shredder::storage_detect::{FixedDetector, StorageTypeDetector, SystemDetector};
use chat_shredder::store::XmlMessageStore;
use chat_shredder::{BatchReport, DeletionResult, DeletionTarget, SecureDeleter, ShredConfig, StorageMedium};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (JSON, settings optionally nested under `secureDelete`)
    #[arg(short, long, env = "SHRED_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Upload storage root (overrides the config file)
    #[arg(short, long, env = "SHRED_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Unlink and verify only, without overwriting
    #[arg(long, env = "SHRED_DISABLED")]
    insecure: bool,

    /// Storage medium (auto probes the volume holding the storage root)
    #[arg(long, value_enum, default_value_t = MediumArg::Auto)]
    medium: MediumArg,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MediumArg {
    Auto,
    Ssd,
    Hdd,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected storage medium
    Detect,

    /// Securely delete a single file inside the storage root
    File {
        path: PathBuf,

        /// Room to warn if deletion fails
        #[arg(long)]
        room: Option<String>,

        #[arg(long)]
        user: Option<String>,
    },

    /// Delete all files belonging to a message
    Message {
        room: String,
        message_id: String,
        username: String,
    },

    /// Delete a room's upload folder
    Room { room: String },

    /// Delete the entire upload storage root
    WipeAll {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chat_shredder=info,audit=info,room_warning=info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();
    init_tracing(args.json);

    info!("Chat Shredder starting...");

    let mut config = ShredConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(root) = args.storage_root {
        config.storage_root = root;
    }
    if args.insecure {
        config.enabled = false;
    }

    let detector: Box<dyn StorageTypeDetector> = match args.medium {
        MediumArg::Auto => Box::new(SystemDetector::new(&config.storage_root)),
        MediumArg::Ssd => Box::new(FixedDetector(StorageMedium::SolidState)),
        MediumArg::Hdd => Box::new(FixedDetector(StorageMedium::Rotating)),
    };
    let store = Arc::new(XmlMessageStore::new(&config.storage_root));
    let deleter = SecureDeleter::new(config, detector.as_ref(), store, Arc::new(LogBroadcaster));

    match args.command {
        Command::Detect => {
            println!("{}", deleter.medium().as_str());
            Ok(())
        }
        Command::File { path, room, user } => {
            let target = DeletionTarget::inspect(&path, room, user)
                .with_context(|| format!("Cannot delete {:?}", path))?;

            match deleter.delete_file_async(target).await {
                DeletionResult::Success => {
                    println!("deleted {}", path.display());
                    Ok(())
                }
                DeletionResult::VerificationFailed { size } => {
                    anyhow::bail!("{:?} still present with {} bytes after unlink", path, size)
                }
                DeletionResult::IoError(reason) => anyhow::bail!("{}", reason),
            }
        }
        Command::Message {
            room,
            message_id,
            username,
        } => {
            let report = deleter
                .delete_message_files_async(room, message_id.clone(), username)
                .await
                .with_context(|| format!("Failed to delete files of message {}", message_id))?;
            if report.primary_removed {
                info!("Message {} metadata removed", message_id);
            }
            finish(&format!("message {}", message_id), &report)
        }
        Command::Room { room } => {
            let report = deleter
                .delete_room_directory_async(room.clone())
                .await
                .with_context(|| format!("Failed to delete room {}", room))?;
            finish(&format!("room {}", room), &report)
        }
        Command::WipeAll { yes } => {
            if !yes {
                anyhow::bail!("Refusing to wipe {:?} without --yes", deleter.storage_root());
            }
            let report = deleter
                .delete_storage_root_async()
                .await
                .context("Failed to wipe upload storage")?;
            finish("storage root", &report)
        }
    }
}

fn finish(what: &str, report: &BatchReport) -> Result<()> {
    println!(
        "{}: {} attempted, {} deleted, {} failed, {} directories removed",
        what,
        report.attempted,
        report.deleted.len(),
        report.failures.len(),
        report.directories_removed
    );

    if report.succeeded() {
        return Ok(());
    }

    for failure in &report.failures {
        warn!("Not deleted: {:?}: {}", failure.path, failure.error);
    }
    anyhow::bail!("{} file(s) in {} could not be securely deleted", report.failures.len(), what)
}
