use crate::error::{ArchiveError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where iTunes/Finder keeps device backups on macOS.
pub fn default_backup_dir() -> Result<PathBuf> {
    let home = std::env::var_os("HOME").ok_or(ArchiveError::HomeNotSet)?;
    Ok(PathBuf::from(home).join("Library/Application Support/MobileSync/Backup"))
}

/// Most recently modified directory under `root`; each device backup is one
/// directory named by the device identifier.
pub fn latest_backup(root: &Path) -> Result<PathBuf> {
    let entries =
        fs::read_dir(root).map_err(|_| ArchiveError::BackupNotFound(root.to_path_buf()))?;

    let mut latest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if latest.as_ref().map_or(true, |(t, _)| modified > *t) {
            latest = Some((modified, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| ArchiveError::BackupNotFound(root.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn picks_most_recently_modified_directory() {
        let root = TempDir::new().unwrap();
        let old = root.path().join("aaaa");
        let new = root.path().join("bbbb");
        fs::create_dir(&old).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        fs::create_dir(&new).unwrap();
        // Plain files are never candidates.
        File::create(root.path().join("Info.plist")).unwrap();

        assert_eq!(latest_backup(root.path()).unwrap(), new);
    }

    #[test]
    fn empty_root_is_not_found() {
        let root = TempDir::new().unwrap();
        assert!(matches!(
            latest_backup(root.path()),
            Err(ArchiveError::BackupNotFound(_))
        ));
    }

    #[test]
    fn missing_root_is_not_found() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        assert!(matches!(
            latest_backup(&missing),
            Err(ArchiveError::BackupNotFound(_))
        ));
    }
}
