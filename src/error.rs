use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("message store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("destination already exists, please pick a new location: {0}")]
    DestinationExists(PathBuf),

    #[error("no iOS backup found under {0}")]
    BackupNotFound(PathBuf),

    #[error("no message store in backup at {0} (is this an iTunes/Finder device backup?)")]
    StoreMissing(PathBuf),

    #[error("HOME is not set; pass --backup and --destination explicitly")]
    HomeNotSet,
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
