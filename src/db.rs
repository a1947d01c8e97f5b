use crate::error::{ArchiveError, Result};
use crate::models::{AttachmentRef, MessageRow, Service};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed name the backup gives the message store: the SHA-1 of
/// "HomeDomain-Library/SMS/sms.db".
const STORE_DIGEST: &str = "3d0d7e5fb2ce288813306e4d4636395e047a3d28";

/// Read-only connection to the message store inside a device backup.
pub struct MessageStore {
    conn: Connection,
}

impl MessageStore {
    /// Locate and open the message store. Backups written by recent iTunes
    /// versions shard files into two-character subdirectories; older ones
    /// keep everything flat. A missing store or a failed open is fatal.
    pub fn open(backup_root: &Path) -> Result<Self> {
        let path = Self::store_path(backup_root)
            .ok_or_else(|| ArchiveError::StoreMissing(backup_root.to_path_buf()))?;
        debug!(store = %path.display(), "opening message store");
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        Ok(MessageStore { conn })
    }

    fn store_path(backup_root: &Path) -> Option<PathBuf> {
        let sharded = backup_root.join(&STORE_DIGEST[..2]).join(STORE_DIGEST);
        if sharded.exists() {
            return Some(sharded);
        }
        let flat = backup_root.join(STORE_DIGEST);
        flat.exists().then_some(flat)
    }

    /// Every handle id that ever sent or received a message.
    pub fn distinct_handles(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT id FROM handle")?;
        let handles = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(handles)
    }

    /// Every distinct group-chat key. Messages outside any room show up as a
    /// NULL key; that entry is dropped here.
    pub fn distinct_rooms(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cache_roomnames FROM message")?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;
        let mut rooms = Vec::new();
        for room in rows {
            if let Some(room) = room? {
                rooms.push(room);
            }
        }
        Ok(rooms)
    }

    /// All messages exchanged with one handle, oldest first. Group traffic is
    /// included (the aggregator filters it out by room key). Each message is
    /// joined to at most one attachment record.
    pub fn messages_for_handle(&self, handle: &str) -> Result<Vec<MessageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.id, m.text, m.service, m.is_from_me, m.date, c.room_name,
                    a.filename, a.mime_type
             FROM message m
             JOIN handle h ON m.handle_id = h.ROWID
             JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
             JOIN chat c ON c.ROWID = cmj.chat_id
             LEFT JOIN (SELECT message_id, MIN(attachment_id) AS attachment_id
                        FROM message_attachment_join
                        GROUP BY message_id) maj ON maj.message_id = m.ROWID
             LEFT JOIN attachment a ON a.ROWID = maj.attachment_id
             WHERE h.id = ?1
             ORDER BY m.date ASC",
        )?;
        let rows = stmt
            .query_map(params![handle], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All messages in one group chat, oldest first. The handle join is LEFT
    /// so a malformed row with no sender degrades to an empty sender id
    /// instead of disappearing.
    pub fn messages_for_room(&self, cache_roomname: &str) -> Result<Vec<MessageRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.id, m.text, m.service, m.is_from_me, m.date, m.cache_roomnames,
                    a.filename, a.mime_type
             FROM message m
             LEFT JOIN handle h ON m.handle_id = h.ROWID
             JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
             JOIN chat c ON c.ROWID = cmj.chat_id
             LEFT JOIN (SELECT message_id, MIN(attachment_id) AS attachment_id
                        FROM message_attachment_join
                        GROUP BY message_id) maj ON maj.message_id = m.ROWID
             LEFT JOIN attachment a ON a.ROWID = maj.attachment_id
             WHERE m.cache_roomnames = ?1
             ORDER BY m.date ASC",
        )?;
        let rows = stmt
            .query_map(params![cache_roomname], row_to_message)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// The most recently set group title for a room, if any title was ever
    /// set. Members can rename a group (or never name it at all); the title
    /// carried by the newest titled message wins.
    pub fn room_title(&self, cache_roomname: &str) -> Result<Option<String>> {
        let title = self.conn.query_row(
            "SELECT group_title, MAX(date) FROM message
             WHERE cache_roomnames = ?1 AND group_title IS NOT NULL",
            params![cache_roomname],
            |row| row.get::<_, Option<String>>(0),
        )?;
        Ok(title)
    }
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    let service: Option<String> = row.get(2)?;
    let attachment = match row.get::<_, Option<String>>(6)? {
        Some(filename) => Some(AttachmentRef {
            filename,
            mime_type: row.get(7)?,
        }),
        None => None,
    };
    Ok(MessageRow {
        sender: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        text: text_lossy(row, 1)?,
        service: Service::from_store(service.as_deref()),
        is_from_me: row.get::<_, i64>(3)? != 0,
        date: row.get(4)?,
        room: row.get(5)?,
        attachment,
    })
}

/// Message text is not reliably valid UTF-8 (and occasionally lands in the
/// column as a blob). Read it byte-wise and substitute replacement
/// characters rather than failing the row.
fn text_lossy(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
    })
}
