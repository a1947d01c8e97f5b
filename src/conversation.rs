use crate::models::{Conversation, ConversationKey, MessageRow};

/// Sentinel title for group chats whose members never set one.
pub const UNTITLED_ROOM: &str = "untitled";

/// Fold one handle's rows into a one-to-one conversation. Rows carrying a
/// room key are skipped here; they belong to that group's document, and
/// counting them twice would duplicate every group message under each
/// participant. Row order is preserved as delivered (the store sorts by
/// timestamp; ties stay in first-seen order).
pub fn aggregate_handle(handle: &str, rows: Vec<MessageRow>) -> Conversation {
    let messages = rows.into_iter().filter(|row| row.room.is_none()).collect();
    Conversation {
        key: ConversationKey::Handle(handle.to_string()),
        messages,
    }
}

/// Fold a room's rows into a group conversation under its resolved display
/// title.
pub fn aggregate_room(
    cache_roomname: &str,
    title: Option<String>,
    rows: Vec<MessageRow>,
) -> Conversation {
    Conversation {
        key: ConversationKey::Room {
            cache_roomname: cache_roomname.to_string(),
            title: title.unwrap_or_else(|| UNTITLED_ROOM.to_string()),
        },
        messages: rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Service;

    fn row(date: i64, room: Option<&str>) -> MessageRow {
        MessageRow {
            sender: "+15550001111".to_string(),
            text: Some("hi".to_string()),
            service: Service::IMessage,
            is_from_me: false,
            date,
            room: room.map(str::to_string),
            attachment: None,
        }
    }

    #[test]
    fn group_rows_are_excluded_from_one_to_one() {
        let rows = vec![row(1, None), row(2, Some("chat1")), row(3, None)];
        let convo = aggregate_handle("+15550001111", rows);
        assert_eq!(convo.line_count(), 2);
        assert!(convo.messages.iter().all(|m| m.room.is_none()));
    }

    #[test]
    fn only_group_rows_leaves_conversation_empty() {
        let rows = vec![row(1, Some("chat1")), row(2, Some("chat2"))];
        let convo = aggregate_handle("+15550001111", rows);
        assert_eq!(convo.line_count(), 0);
    }

    #[test]
    fn row_order_is_preserved() {
        // Equal timestamps keep first-seen order; the aggregator never re-sorts.
        let mut rows = vec![row(5, None), row(5, None), row(5, None)];
        rows[0].text = Some("a".to_string());
        rows[1].text = Some("b".to_string());
        rows[2].text = Some("c".to_string());
        let convo = aggregate_handle("+15550001111", rows);
        let texts: Vec<_> = convo.messages.iter().map(|m| m.text.clone().unwrap()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn untitled_sentinel_when_room_was_never_named() {
        let convo = aggregate_room("chat42", None, vec![row(1, Some("chat42"))]);
        assert_eq!(
            convo.key,
            ConversationKey::Room {
                cache_roomname: "chat42".to_string(),
                title: UNTITLED_ROOM.to_string(),
            }
        );
    }

    #[test]
    fn resolved_title_is_used_verbatim() {
        let convo = aggregate_room("chat42", Some("Trip 2024".to_string()), vec![]);
        assert!(matches!(convo.key, ConversationKey::Room { ref title, .. } if title == "Trip 2024"));
    }
}
