//! anki-media-sync: Sends the media referenced by Anki notes to Anki, taking
//! the files from an Obsidian vault.
//!
//! Talks to Anki through the AnkiConnect add-on, so Anki must be running.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use anki_connect::{AnkiConnect, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};
use media_sync::{
    EventBus, Reconciler, Settings, SyncEvent, SyncKind, expand_tilde, render_missing_list,
    render_sync_report,
};
use vault_index::NativeVault;

#[derive(Parser, Debug)]
#[command(name = "anki-media-sync")]
#[command(about = "Sync media referenced by Anki notes from an Obsidian vault")]
struct Args {
    /// Path to the Obsidian vault (supports ~ for home directory)
    #[arg(short, long, env = "OBSIDIAN_VAULT_PATH", global = true)]
    vault: Option<String>,

    /// AnkiConnect endpoint
    #[arg(long, env = "ANKI_CONNECT_URL", default_value = DEFAULT_URL, global = true)]
    anki_url: String,

    /// Per-request timeout for AnkiConnect, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Preferred media folder for this run, overriding the saved setting
    #[arg(long, global = true)]
    media_folder: Option<String>,

    /// Notes per request for this run, overriding the saved setting
    #[arg(long, global = true, value_parser = parse_batch_size)]
    batch_size: Option<usize>,

    /// Print results as JSON (full lists, no truncation)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resend every media file referenced in Anki notes
    SyncAll,
    /// Send only media files missing from Anki
    SyncMissing,
    /// Show which referenced media files are missing from Anki
    ListMissing {
        /// Send the listed files afterwards
        #[arg(long)]
        sync: bool,
    },
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Folder where media files are stored; empty to search the whole vault
    SetMediaFolder { folder: String },
    /// Number of notes to request from Anki at once
    SetBatchSize {
        #[arg(value_parser = parse_batch_size)]
        size: usize,
    },
}

fn parse_batch_size(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("batch size must be a positive integer, got '{}'", value)),
    }
}

/// Render progress events as log lines.
fn log_progress(event: SyncEvent) {
    match event {
        SyncEvent::FileSent {
            filename,
            sent,
            total,
        } => info!("Sent {}/{} files ({})", sent, total, filename),
        SyncEvent::FileNotFound { filename } => info!("Not found in vault: {}", filename),
        SyncEvent::UploadFailed { filename } => info!("Upload failed: {}", filename),
        SyncEvent::PhaseChanged { phase } => tracing::debug!("Phase: {:?}", phase),
        _ => {}
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings_path = match &args.config {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;

    if let Command::Config { action } = &args.command {
        return run_config(action, &mut settings, &settings_path, args.json);
    }

    // One-off overrides are not persisted
    if let Some(folder) = &args.media_folder {
        settings.set_media_folder(folder.clone());
    }
    if let Some(size) = args.batch_size {
        settings.set_batch_size(size)?;
    }

    let Some(vault_path) = args.vault.as_deref() else {
        bail!("No vault given: pass --vault or set OBSIDIAN_VAULT_PATH");
    };
    let vault_path = expand_tilde(vault_path);
    info!("Vault path: {}", vault_path.display());
    let vault = NativeVault::open(&vault_path)
        .await
        .with_context(|| format!("Failed to open vault at {}", vault_path.display()))?;

    let anki = AnkiConnect::with_timeout(args.anki_url.clone(), Duration::from_secs(args.timeout))
        .context("Failed to create AnkiConnect client")?;
    info!("AnkiConnect endpoint: {}", anki.url());

    let events = Arc::new(EventBus::new());
    let _progress = events.subscribe(log_progress);
    let reconciler = Reconciler::new(&anki, &vault, &settings).with_events(Arc::clone(&events));

    match &args.command {
        Command::SyncAll => {
            info!("Scanning Anki notes for media...");
            let report = reconciler.force_sync_all().await?;
            if args.json {
                print_json(&report)?;
            } else {
                println!("{}", render_sync_report(&report, SyncKind::All));
            }
        }
        Command::SyncMissing => {
            info!("Scanning Anki for missing media...");
            let report = reconciler.sync_missing_only().await?;
            if args.json {
                print_json(&report)?;
            } else {
                println!("{}", render_sync_report(&report, SyncKind::Missing));
            }
        }
        Command::ListMissing { sync } => {
            info!("Scanning Anki for missing media...");
            let listed = reconciler.list_missing_only().await?;
            if args.json {
                print_json(&listed)?;
            } else {
                println!("{}", render_missing_list(&listed));
            }

            if *sync && !listed.is_empty() {
                let report = reconciler.sync_listed(&listed).await;
                if args.json {
                    print_json(&report)?;
                } else {
                    println!("{}", render_sync_report(&report, SyncKind::Missing));
                }
            }
        }
        Command::Config { .. } => {}
    }

    Ok(())
}

fn run_config(
    action: &ConfigAction,
    settings: &mut Settings,
    path: &std::path::Path,
    json: bool,
) -> Result<()> {
    match action {
        ConfigAction::Show => {}
        ConfigAction::SetMediaFolder { folder } => {
            settings.set_media_folder(folder.clone());
            settings.save(path)?;
            info!("Saved settings to {}", path.display());
        }
        ConfigAction::SetBatchSize { size } => {
            settings.set_batch_size(*size)?;
            settings.save(path)?;
            info!("Saved settings to {}", path.display());
        }
    }

    if json {
        print_json(&*settings)
    } else {
        let folder = settings.preferred_folder().unwrap_or("(whole vault)");
        println!("Settings file: {}", path.display());
        println!("Media folder: {}", folder);
        println!("Batch size: {}", settings.batch_size);
        Ok(())
    }
}
