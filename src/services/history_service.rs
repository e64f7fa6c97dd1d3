use chrono::Utc;
use log::warn;

use crate::error::StoreError;
use crate::models::{ChatMessage, MessageSender};
use crate::services::storage::KeyValueStore;

pub const HISTORY_KEY: &str = "chatHistory";

/// The visible conversation, persisted whole after every change.
pub struct ChatHistory<S> {
    store: S,
    key: String,
    messages: Vec<ChatMessage>,
}

impl<S: KeyValueStore> ChatHistory<S> {
    /// Loads the saved history. Anything unreadable is discarded, and the
    /// stored value is removed so the next save starts clean.
    pub fn load(store: S) -> Self {
        let key = HISTORY_KEY.to_string();
        let messages = match store.get(&key) {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
                Ok(messages) => messages,
                Err(e) => {
                    warn!("Failed to load chat history: {}", e);
                    if let Err(e) = store.remove(&key) {
                        warn!("Could not remove corrupted chat history: {}", e);
                    }
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to load chat history: {}", e);
                Vec::new()
            }
        };

        Self {
            store,
            key,
            messages,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Texts the user typed, oldest first. Empty until the conversation holds
    /// at least two user or assistant messages.
    pub fn user_prompts(&self) -> Vec<&str> {
        let exchanged = self
            .messages
            .iter()
            .filter(|m| m.sender != MessageSender::System)
            .count();
        if exchanged <= 1 {
            return Vec::new();
        }

        self.messages
            .iter()
            .filter(|m| m.sender == MessageSender::User)
            .map(|m| m.text.as_str())
            .collect()
    }

    pub fn push(&mut self, sender: MessageSender, text: &str) -> Result<ChatMessage, StoreError> {
        let message = ChatMessage::new(self.next_id(), sender, text);
        self.messages.push(message.clone());
        self.persist()?;
        Ok(message)
    }

    /// Replaces everything with a single system notice.
    pub fn replace_with_system(&mut self, text: &str) -> Result<ChatMessage, StoreError> {
        self.messages.clear();
        self.push(MessageSender::System, text)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.messages.clear();
        self.store.remove(&self.key)
    }

    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        match self.messages.last() {
            Some(last) if now <= last.id => last.id + 1,
            _ => now,
        }
    }

    fn persist(&self) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string(&self.messages).map_err(|e| StoreError::io(&self.key, e))?;
        self.store.set(&self.key, &serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn ids_strictly_increase() {
        let mut history = ChatHistory::load(MemoryStore::new());
        let ids: Vec<i64> = (0..5)
            .map(|i| history.push(MessageSender::User, &format!("m{i}")).unwrap().id)
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn history_reloads_verbatim() {
        let store = Arc::new(MemoryStore::new());
        let mut history = ChatHistory::load(Arc::clone(&store));
        history.push(MessageSender::User, "best sniper?").unwrap();
        history.push(MessageSender::Assistant, "AWM 🔫").unwrap();

        let reloaded = ChatHistory::load(store);
        assert_eq!(reloaded.messages(), history.messages());
        assert_eq!(reloaded.user_prompts(), vec!["best sniper?"]);
    }

    #[test]
    fn user_prompts_wait_for_an_exchange() {
        let mut history = ChatHistory::load(MemoryStore::new());
        history.replace_with_system("Knowledge base updated").unwrap();
        history.push(MessageSender::User, "drop spot?").unwrap();
        assert!(history.user_prompts().is_empty());

        history.push(MessageSender::Assistant, "Pochinki").unwrap();
        history.push(MessageSender::User, "and then?").unwrap();
        assert_eq!(history.user_prompts(), vec!["drop spot?", "and then?"]);
    }

    #[test]
    fn corrupted_history_is_dropped_and_removed() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "[{\"id\": 1, \"text\":").unwrap();

        let history = ChatHistory::load(Arc::clone(&store));
        assert!(history.is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_the_stored_value() {
        let store = Arc::new(MemoryStore::new());
        let mut history = ChatHistory::load(Arc::clone(&store));
        history.push(MessageSender::User, "hi").unwrap();
        history.clear().unwrap();

        assert!(history.is_empty());
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn replace_with_system_leaves_one_banner() {
        let mut history = ChatHistory::load(MemoryStore::new());
        history.push(MessageSender::User, "hi").unwrap();
        history.replace_with_system("Knowledge base updated").unwrap();

        assert_eq!(history.messages().len(), 1);
        assert_eq!(history.messages()[0].sender, MessageSender::System);
    }
}
