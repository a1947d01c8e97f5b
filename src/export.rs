use crate::conversation;
use crate::db::MessageStore;
use crate::error::Result;
use crate::models::Conversation;
use crate::progress::ProgressSink;
use crate::render;
use std::fs::{self, File};
use std::io::Write as _;
use std::path::Path;
use tracing::{debug, info};

/// Counts for the finished run.
#[derive(Debug, Clone, Copy)]
pub struct ExportSummary {
    /// Handles plus rooms scanned.
    pub conversations_scanned: usize,
    /// Documents actually kept on disk.
    pub documents_written: usize,
}

/// Walk every handle and room in the store and write one document per
/// non-empty conversation under `output_root`. One-to-one conversations are
/// produced first, then group chats; each document is fully written and
/// closed before the next begins.
pub fn run(
    store: &MessageStore,
    backup_root: &Path,
    output_root: &Path,
    progress: &mut dyn ProgressSink,
) -> Result<ExportSummary> {
    let handles = store.distinct_handles()?;
    let rooms = store.distinct_rooms()?;
    let total = handles.len() + rooms.len();
    info!(handles = handles.len(), rooms = rooms.len(), "scanning message store");

    let mut completed = 0usize;
    let mut written = 0usize;

    for handle in &handles {
        let rows = store.messages_for_handle(handle)?;
        let convo = conversation::aggregate_handle(handle, rows);
        written += usize::from(write_document(&convo, backup_root, output_root)?);
        completed += 1;
        progress.advance(completed, total);
    }

    for room in &rooms {
        let rows = store.messages_for_room(room)?;
        let title = store.room_title(room)?;
        let convo = conversation::aggregate_room(room, title, rows);
        written += usize::from(write_document(&convo, backup_root, output_root)?);
        completed += 1;
        progress.advance(completed, total);
    }

    Ok(ExportSummary {
        conversations_scanned: total,
        documents_written: written,
    })
}

/// Write one conversation document, returning whether it was kept. The file
/// handle is released unconditionally; a conversation that emitted no rows
/// has its now-empty document deleted afterwards.
fn write_document(convo: &Conversation, backup_root: &Path, output_root: &Path) -> Result<bool> {
    let path = output_root.join(convo.key.file_name());
    let html = render::render(convo, backup_root, output_root)?;
    {
        let mut file = File::create(&path)?;
        file.write_all(html.as_bytes())?;
    }
    if convo.line_count() == 0 {
        debug!(file = %path.display(), "pruning empty conversation");
        fs::remove_file(&path)?;
        return Ok(false);
    }
    Ok(true)
}
