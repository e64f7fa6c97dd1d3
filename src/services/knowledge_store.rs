use crate::error::StoreError;
use crate::models::KnowledgeText;
use crate::services::storage::KeyValueStore;
use log::{debug, warn};

pub const KNOWLEDGE_KEY: &str = "pubgKnowledgeBase";

/// Holds the current knowledge base in a key/value store.
pub struct KnowledgeStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KnowledgeStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, KNOWLEDGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Last saved knowledge, or empty. Unreadable or non-JSON data is
    /// treated as absent.
    pub fn load(&self) -> KnowledgeText {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return KnowledgeText::empty(),
            Err(e) => {
                warn!("Could not read stored knowledge base: {}", e);
                return KnowledgeText::empty();
            }
        };

        match KnowledgeText::from_persisted(raw) {
            Ok(knowledge) => knowledge,
            Err(e) => {
                warn!("Ignoring corrupted knowledge base in '{}': {}", self.key, e);
                KnowledgeText::empty()
            }
        }
    }

    pub fn save(&self, knowledge: &KnowledgeText) -> Result<(), StoreError> {
        self.store.set(&self.key, knowledge.as_str())?;
        debug!("Saved knowledge base ({} bytes)", knowledge.as_str().len());
        Ok(())
    }
}
