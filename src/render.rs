use crate::attachments::{self, ResolvedAttachment};
use crate::error::Result;
use crate::models::{Conversation, ConversationKey, MediaKind, MessageRow, Service};
use crate::timestamp;
use std::fmt::Write as _;
use std::path::Path;

/// Bubble colors: iMessage blue and SMS green for sent messages, neutral
/// gray for received.
const IMESSAGE_BLUE: &str = "#2184f7";
const SMS_GREEN: &str = "#1eaf32";
const RECEIVED_GRAY: &str = "#b8b8be";

/// Substituted for message text classified as an opaque binary payload.
const OPAQUE_PLACEHOLDER: &str = "<strong>*Attachment*</strong>";

const DOC_STYLE: &str = "table{width:100%;}td,th{border-radius:10px; font-family: \"Verdana\", Sans-serif; max-width:200px; padding: 8px;}img{max-width: 200px}video{max-width:200px}";

/// Render a full conversation document. Attachments referenced by its rows
/// are resolved (and copied under `output_root`) as their cells are emitted.
pub fn render(
    conversation: &Conversation,
    backup_root: &Path,
    output_root: &Path,
) -> Result<String> {
    let in_group = conversation.key.is_group();
    let mut out = String::new();
    let _ = write!(
        out,
        "<html><head><meta charset=\"utf-8\"><style>{DOC_STYLE}</style></head><body>"
    );
    let _ = write!(out, "<h1>{}</h1>", html_escape(&document_title(&conversation.key)));
    out.push_str("<table>");
    for row in &conversation.messages {
        push_row(&mut out, row, in_group, backup_root, output_root)?;
    }
    out.push_str("</table></body></html>");
    Ok(out)
}

fn document_title(key: &ConversationKey) -> String {
    match key {
        ConversationKey::Handle(id) => format!("Conversations with {id}"),
        ConversationKey::Room { title, .. } => format!("{title} Group Chat"),
    }
}

fn push_row(
    out: &mut String,
    row: &MessageRow,
    in_group: bool,
    backup_root: &Path,
    output_root: &Path,
) -> Result<()> {
    out.push_str("<tr>");

    let stamp = timestamp::format_local(timestamp::to_unix_seconds(row.date));
    let _ = write!(out, "<td style=\"text-align: right;\">{stamp}</td>");

    if let Some(text) = &row.text {
        let body = if is_opaque_payload(text) {
            OPAQUE_PLACEHOLDER.to_string()
        } else {
            html_escape(text)
        };
        if row.is_from_me {
            let color = match row.service {
                Service::IMessage => IMESSAGE_BLUE,
                _ => SMS_GREEN,
            };
            let _ = write!(
                out,
                "<td style=\"background-color:{color}; color: white;\">{body}</td>"
            );
        } else if in_group {
            let _ = write!(
                out,
                "<td style=\"background-color: {RECEIVED_GRAY};\"><small><i>(Sent By: {})</i></small>{body}</td>",
                html_escape(&row.sender)
            );
        } else {
            let _ = write!(out, "<td style=\"background-color: {RECEIVED_GRAY};\">{body}</td>");
        }
    }

    match &row.attachment {
        Some(att) => {
            match attachments::resolve(&att.filename, att.mime_type.as_deref(), backup_root, output_root)? {
                Some(resolved) => push_attachment_cell(out, &resolved),
                // Blob not retained in the backup; the cell stays empty.
                None => out.push_str("<td></td>"),
            }
        }
        None => out.push_str("<td></td>"),
    }

    out.push_str("</tr>");
    Ok(())
}

fn push_attachment_cell(out: &mut String, att: &ResolvedAttachment) {
    match att.kind {
        MediaKind::Image => {
            let _ = write!(out, "<td><img src=\"{}\"></td>", att.relative_path);
        }
        MediaKind::Video => {
            let _ = write!(
                out,
                "<td><video controls><source src=\"{}\" type=\"{}\">Your browser does not support the video tag.</video></td>",
                att.relative_path,
                html_escape(att.mime_type.as_deref().unwrap_or(""))
            );
        }
        MediaKind::Link => {
            let label = att.mime_type.as_deref().unwrap_or("No Type Specified");
            let _ = write!(
                out,
                "<td><a href=\"{}\">Mime-Type: {} | Source: {}</a></td>",
                att.relative_path,
                html_escape(label),
                att.relative_path
            );
        }
    }
}

/// The store sometimes records a message's decoded binary payload in the
/// text column. When no character is printable ASCII, or every character is
/// a control character, treat the text as opaque and show a placeholder
/// instead of garbled bytes. Coarse on purpose; it also fires on entirely
/// non-Latin text.
fn is_opaque_payload(text: &str) -> bool {
    text.chars().all(|c| c as u32 > 127) || text.chars().all(|c| (c as u32) < 32)
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentRef;
    use tempfile::TempDir;

    fn message(text: Option<&str>, is_from_me: bool, service: Service) -> MessageRow {
        MessageRow {
            sender: "+15550001111".to_string(),
            text: text.map(str::to_string),
            service,
            is_from_me,
            date: 0,
            room: None,
            attachment: None,
        }
    }

    #[test]
    fn opaque_payload_detection() {
        assert!(is_opaque_payload("\u{fffc}\u{fffd}"));
        assert!(is_opaque_payload("\u{1}\u{2}\u{3}"));
        assert!(!is_opaque_payload("hello"));
        assert!(!is_opaque_payload("héllo")); // mixed ascii and not
        // Known misfire the classifier accepts: entirely non-Latin text.
        assert!(is_opaque_payload("日本語"));
    }

    #[test]
    fn escapes_markup_in_text() {
        assert_eq!(
            html_escape("<script>&'\"</script>"),
            "&lt;script&gt;&amp;&#x27;&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn sent_colors_follow_service() {
        let backup = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let convo = Conversation {
            key: ConversationKey::Handle("+15550001111".to_string()),
            messages: vec![
                message(Some("blue"), true, Service::IMessage),
                message(Some("green"), true, Service::Sms),
                message(Some("gray"), false, Service::IMessage),
            ],
        };
        let html = render(&convo, backup.path(), output.path()).unwrap();
        assert!(html.contains(&format!("background-color:{IMESSAGE_BLUE}")));
        assert!(html.contains(&format!("background-color:{SMS_GREEN}")));
        assert!(html.contains(&format!("background-color: {RECEIVED_GRAY}")));
        assert!(html.contains("<h1>Conversations with +15550001111</h1>"));
    }

    #[test]
    fn group_rows_carry_sender_label() {
        let backup = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let convo = Conversation {
            key: ConversationKey::Room {
                cache_roomname: "chat1".to_string(),
                title: "Trip".to_string(),
            },
            messages: vec![message(Some("who said this"), false, Service::IMessage)],
        };
        let html = render(&convo, backup.path(), output.path()).unwrap();
        assert!(html.contains("(Sent By: +15550001111)"));
        assert!(html.contains("<h1>Trip Group Chat</h1>"));
    }

    #[test]
    fn missing_attachment_renders_empty_cell() {
        let backup = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let mut row = message(None, false, Service::IMessage);
        row.attachment = Some(AttachmentRef {
            filename: "~/Library/SMS/Attachments/gone.jpeg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
        });
        let convo = Conversation {
            key: ConversationKey::Handle("+15550001111".to_string()),
            messages: vec![row],
        };
        let html = render(&convo, backup.path(), output.path()).unwrap();
        assert!(html.contains("<td></td>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn unrecognized_mime_renders_descriptive_link() {
        let backup = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let recorded = "~/Library/SMS/Attachments/voice.amr";
        let digest = attachments::content_address(recorded);
        let shard = backup.path().join(&digest[..2]);
        std::fs::create_dir_all(&shard).unwrap();
        std::fs::write(shard.join(&digest), b"amr").unwrap();

        let mut row = message(None, false, Service::IMessage);
        row.attachment = Some(AttachmentRef {
            filename: recorded.to_string(),
            mime_type: Some("audio/amr".to_string()),
        });
        let convo = Conversation {
            key: ConversationKey::Handle("+15550001111".to_string()),
            messages: vec![row],
        };
        let html = render(&convo, backup.path(), output.path()).unwrap();
        assert!(html.contains(&format!("<a href=\"attachments/{digest}\">Mime-Type: audio/amr")));
    }
}
