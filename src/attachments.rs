use crate::error::Result;
use crate::models::MediaKind;
use sha1::{Digest, Sha1};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Prefix the store records for media paths, and the backup domain prefix it
/// is rewritten to before hashing. The rewrite is a string transform; the
/// digest must match the backup tool's own addressing bit-for-bit.
const HOME_LIBRARY_PREFIX: &str = "~/Library";
const MEDIA_DOMAIN_PREFIX: &str = "MediaDomain-Library";

/// Subdirectory of the output root that receives attachment copies.
pub const ATTACHMENTS_DIR: &str = "attachments";

/// A located attachment, copied into the output tree and ready to be
/// referenced from a document.
#[derive(Debug, Clone)]
pub struct ResolvedAttachment {
    pub kind: MediaKind,
    /// Reference path relative to the output root, usable as an href/src.
    pub relative_path: String,
    pub mime_type: Option<String>,
}

/// Content address of a recorded attachment path: the hex SHA-1 of the
/// domain-qualified path string (not the file contents).
pub fn content_address(recorded_path: &str) -> String {
    let domain_path = match recorded_path.strip_prefix(HOME_LIBRARY_PREFIX) {
        Some(rest) => format!("{MEDIA_DOMAIN_PREFIX}{rest}"),
        None => recorded_path.to_string(),
    };
    hex::encode(Sha1::digest(domain_path.as_bytes()))
}

/// Extension appended so the browser will play the copied file. Images are
/// left extensionless and content-sniffed.
fn extension_for(mime_type: Option<&str>) -> Option<&'static str> {
    match mime_type {
        Some("video/mp4") => Some(".mp4"),
        Some("video/quicktime") => Some(".mov"),
        _ => None,
    }
}

fn kind_for(mime_type: Option<&str>) -> MediaKind {
    match mime_type {
        Some(m) if m.starts_with("image") => MediaKind::Image,
        Some(m) if m.starts_with("video") => MediaKind::Video,
        _ => MediaKind::Link,
    }
}

/// Locate an attachment blob inside the backup, copy it under the output
/// root, and return how the renderer should reference it. A source that is
/// not present in the backup (file never retained, or deleted) resolves to
/// `None` and never fails the run.
pub fn resolve(
    recorded_path: &str,
    mime_type: Option<&str>,
    backup_root: &Path,
    output_root: &Path,
) -> Result<Option<ResolvedAttachment>> {
    let digest = content_address(recorded_path);

    // Same fan-out as the store itself: two-hex shard directory in recent
    // backups, flat layout in old ones.
    let mut source = backup_root.join(&digest[..2]).join(&digest);
    if !source.exists() {
        source = backup_root.join(&digest);
    }
    if !source.exists() {
        debug!(path = recorded_path, digest = digest.as_str(), "attachment not in backup");
        return Ok(None);
    }

    let mut file_name = digest;
    if let Some(ext) = extension_for(mime_type) {
        file_name.push_str(ext);
    }

    let dest_dir = output_root.join(ATTACHMENTS_DIR);
    fs::create_dir_all(&dest_dir)?;
    let dest = dest_dir.join(&file_name);
    // Content-addressed names make repeat copies of the same blob skippable.
    if !dest.exists() {
        fs::copy(&source, &dest)?;
    }

    Ok(Some(ResolvedAttachment {
        kind: kind_for(mime_type),
        relative_path: format!("{ATTACHMENTS_DIR}/{file_name}"),
        mime_type: mime_type.map(str::to_string),
    }))
}
