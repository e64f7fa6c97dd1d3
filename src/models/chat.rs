use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    // Histories saved by the web front end call this "ai".
    #[serde(alias = "ai")]
    Assistant,
    System,
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64, // creation time in ms, strictly increasing within a history
    pub text: String,
    pub sender: MessageSender,
}

impl ChatMessage {
    pub fn new(id: i64, sender: MessageSender, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_history_written_by_the_web_front_end() {
        let raw = r#"[
            {"id": 1700000000000, "text": "best drop?", "sender": "user"},
            {"id": 1700000000001, "text": "Pochinki.", "sender": "ai"},
            {"id": 1700000000002, "text": "Knowledge base updated", "sender": "system"}
        ]"#;

        let messages: Vec<ChatMessage> = serde_json::from_str(raw).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, MessageSender::Assistant);
        assert_eq!(messages[2].sender, MessageSender::System);
    }

    #[test]
    fn writes_lowercase_sender() {
        let message = ChatMessage::new(7, MessageSender::Assistant, "Roger.");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["sender"], "assistant");
        assert_eq!(json["id"], 7);
    }
}
