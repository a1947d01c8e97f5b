use clap::Parser;
use imessage_archive::db::MessageStore;
use imessage_archive::error::{ArchiveError, Result};
use imessage_archive::{discovery, export, progress};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

/// Rebuilds a browsable HTML message archive from an iTunes/Finder iOS
/// backup: one document per conversation, attachments copied alongside.
#[derive(Parser)]
#[command(name = "imessage-archive", version)]
struct Cli {
    /// Where to write the archive. Defaults to an iOS_messages_archive_<date>
    /// directory on the Desktop. Must not already exist.
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Path to the device backup directory. Defaults to the most recently
    /// modified backup under ~/Library/Application Support/MobileSync/Backup.
    #[arg(short, long)]
    backup: Option<PathBuf>,
}

fn main() {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=imessage_archive=debug.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let backup_root = match cli.backup {
        Some(path) => path,
        None => discovery::latest_backup(&discovery::default_backup_dir()?)?,
    };
    let destination = match cli.destination {
        Some(path) => path,
        None => default_destination()?,
    };
    if destination.exists() {
        return Err(ArchiveError::DestinationExists(destination));
    }

    // Open the store before creating anything so a bad backup aborts with no
    // output left behind.
    let store = MessageStore::open(&backup_root)?;
    fs::create_dir_all(&destination)?;

    info!(backup = %backup_root.display(), destination = %destination.display(), "archiving messages");
    eprintln!("Please wait... This may take a while...");

    let mut bar = progress::TerminalProgress::new(50);
    let summary = export::run(&store, &backup_root, &destination, &mut bar)?;

    info!(
        scanned = summary.conversations_scanned,
        written = summary.documents_written,
        "backup complete"
    );
    Ok(())
}

fn default_destination() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or(ArchiveError::HomeNotSet)?;
    let date = chrono::Local::now().format("%Y-%m-%d");
    Ok(PathBuf::from(home)
        .join("Desktop")
        .join(format!("iOS_messages_archive_{date}")))
}
