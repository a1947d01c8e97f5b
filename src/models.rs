/// Which service carried a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    IMessage,
    Sms,
    Other,
}

impl Service {
    pub fn from_store(raw: Option<&str>) -> Self {
        match raw {
            Some("iMessage") => Service::IMessage,
            Some("SMS") => Service::Sms,
            _ => Service::Other,
        }
    }
}

/// Attachment reference as recorded in the store: a device-relative path plus
/// the declared mime type. Resolution against the backup happens at render
/// time, not here.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub filename: String,
    pub mime_type: Option<String>,
}

/// One joined message row, assembled by name at the query boundary so nothing
/// downstream depends on column order.
#[derive(Debug, Clone)]
pub struct MessageRow {
    /// Handle id of the counterparty. Empty when the store has no handle for
    /// a received group message.
    pub sender: String,
    pub text: Option<String>,
    pub service: Service,
    pub is_from_me: bool,
    /// Device-native timestamp (nanoseconds since the Apple epoch).
    pub date: i64,
    /// Group-chat key, if the message belongs to a room.
    pub room: Option<String>,
    pub attachment: Option<AttachmentRef>,
}

/// Identity of a conversation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationKey {
    /// One-to-one conversation with a single handle.
    Handle(String),
    /// Group chat, keyed by the stable internal room name. The title is the
    /// resolved display title (or the "untitled" sentinel).
    Room { cache_roomname: String, title: String },
}

impl ConversationKey {
    pub fn is_group(&self) -> bool {
        matches!(self, ConversationKey::Room { .. })
    }

    /// Output file name. Group documents concatenate title and room key so
    /// two rooms with the same title never collide.
    pub fn file_name(&self) -> String {
        match self {
            ConversationKey::Handle(id) => format!("{}.html", sanitize_component(id)),
            ConversationKey::Room {
                cache_roomname,
                title,
            } => format!(
                "{}_{}.html",
                sanitize_component(title),
                sanitize_component(cache_roomname)
            ),
        }
    }
}

/// Handle ids and group titles are arbitrary UTF-8; keep them out of the
/// directory structure.
fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

/// An aggregated conversation: ordered messages under one key. Exists only
/// in memory while its document is written.
#[derive(Debug)]
pub struct Conversation {
    pub key: ConversationKey,
    pub messages: Vec<MessageRow>,
}

impl Conversation {
    /// Rows that will actually be emitted into the document. Zero means the
    /// document is pruned.
    pub fn line_count(&self) -> usize {
        self.messages.len()
    }
}

/// Renderer classification of a resolved attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Anything the browser cannot inline; rendered as a descriptive link.
    Link,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_mapping() {
        assert_eq!(Service::from_store(Some("iMessage")), Service::IMessage);
        assert_eq!(Service::from_store(Some("SMS")), Service::Sms);
        assert_eq!(Service::from_store(Some("RCS")), Service::Other);
        assert_eq!(Service::from_store(None), Service::Other);
    }

    #[test]
    fn handle_file_name() {
        let key = ConversationKey::Handle("+15551234567".to_string());
        assert_eq!(key.file_name(), "+15551234567.html");
    }

    #[test]
    fn group_file_name_includes_room_key() {
        let key = ConversationKey::Room {
            cache_roomname: "chat90210".to_string(),
            title: "Trip 2024".to_string(),
        };
        assert_eq!(key.file_name(), "Trip 2024_chat90210.html");
    }

    #[test]
    fn file_name_strips_path_separators() {
        let key = ConversationKey::Handle("a/b\\c".to_string());
        assert_eq!(key.file_name(), "a_b_c.html");
    }
}
