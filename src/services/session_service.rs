//! The single live conversation and everything that resets it.
//!
//! A [`SessionController`] is created Uninitialized and becomes Active on the
//! first [`SessionController::new_session`] call or the first message. From
//! then on `new_session` only swaps the conversation handle. The handle is
//! replaced after every successful knowledge upload and every explicit new
//! chat, so its system instruction always reflects the last knowledge base
//! that was fully parsed and saved.
//!
//! All operations take `&mut self`; one controller therefore serves one
//! request at a time. Callers sharing a controller across tasks should put it
//! behind a `tokio::sync::Mutex`, which queues them in arrival order.

use log::{error, info};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{KnowledgeError, RemoteCallError};
use crate::models::{KnowledgeText, UploadResult};
use crate::services::ingest::ingest;
use crate::services::knowledge_store::KnowledgeStore;
use crate::services::llm_client::{Conversation, ModelService};
use crate::services::prompt::PromptAssembler;
use crate::services::storage::KeyValueStore;

pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered a critical error. My systems are down. Please try again later.";

pub struct SessionController<S, M> {
    knowledge: KnowledgeStore<S>,
    model: M,
    assembler: PromptAssembler,
    timeout: Option<Duration>,
    current: Option<Box<dyn Conversation>>,
}

impl<S: KeyValueStore, M: ModelService> SessionController<S, M> {
    pub fn new(knowledge: KnowledgeStore<S>, model: M) -> Self {
        Self {
            knowledge,
            model,
            assembler: PromptAssembler::default(),
            timeout: None,
            current: None,
        }
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Upper bound on a single model call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Drops the current conversation and opens a fresh one built from the
    /// knowledge base as stored right now.
    pub fn new_session(&mut self) -> Uuid {
        let conversation = open_conversation(&self.knowledge, &self.model, &self.assembler);
        let id = conversation.id();
        if let Some(previous) = self.current.replace(conversation) {
            info!("Replaced conversation {} with {}", previous.id(), id);
        }
        id
    }

    /// Forwards `text` to the model and returns its reply. Failures are
    /// logged and answered with [`FALLBACK_REPLY`]; nothing is retried.
    pub async fn send_message(&mut self, text: &str) -> String {
        match self.try_send(text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error sending message to AI: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn try_send(&mut self, text: &str) -> Result<String, RemoteCallError> {
        let timeout = self.timeout;
        let Self {
            current,
            knowledge,
            model,
            assembler,
            ..
        } = self;
        let conversation =
            current.get_or_insert_with(|| open_conversation(knowledge, model, assembler));

        match timeout {
            Some(limit) => tokio::time::timeout(limit, conversation.send(text))
                .await
                .unwrap_or(Err(RemoteCallError::Timeout(limit))),
            None => conversation.send(text).await,
        }
    }

    /// Parses `raw`, saves it and restarts the conversation, in that order.
    /// If any step fails the stored knowledge and the live conversation are
    /// left exactly as they were.
    pub fn ingest_knowledge(&mut self, raw: &str) -> Result<KnowledgeText, KnowledgeError> {
        let knowledge = ingest(raw)?;
        self.knowledge.save(&knowledge)?;
        info!("Knowledge base updated ({} bytes)", knowledge.as_str().len());
        self.new_session();
        Ok(knowledge)
    }

    /// [`Self::ingest_knowledge`] reported in the front end's terms.
    pub fn upload(&mut self, raw: &str) -> UploadResult {
        match self.ingest_knowledge(raw) {
            Ok(_) => UploadResult::ok(),
            Err(e) => {
                error!("Failed to update knowledge base: {}", e);
                UploadResult::failed(e.to_string())
            }
        }
    }

    pub fn knowledge(&self) -> KnowledgeText {
        self.knowledge.load()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|c| c.id())
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.system_instruction())
    }
}

fn open_conversation<S: KeyValueStore, M: ModelService>(
    knowledge: &KnowledgeStore<S>,
    model: &M,
    assembler: &PromptAssembler,
) -> Box<dyn Conversation> {
    let knowledge = knowledge.load();
    let instruction = assembler.assemble(&knowledge);
    let conversation = model.create_conversation(&instruction);
    info!(
        "Started conversation {} ({})",
        conversation.id(),
        if knowledge.is_empty() {
            "no knowledge base"
        } else {
            "with knowledge base"
        }
    );
    conversation
}


#[cfg(test)]
mod tests {
    use super::mock::{MockModel, Scripted};
    use super::*;
    use crate::error::{IngestionError, StoreError};
    use crate::services::knowledge_store::KNOWLEDGE_KEY;
    use crate::services::prompt::KNOWLEDGE_DIRECTIVE;
    use crate::services::storage::MemoryStore;
    use std::sync::Arc;

    fn controller(model: &MockModel) -> SessionController<Arc<MemoryStore>, MockModel> {
        let store = Arc::new(MemoryStore::new());
        SessionController::new(KnowledgeStore::new(store), model.clone())
    }

    #[test]
    fn starts_uninitialized() {
        let model = MockModel::new();
        let controller = controller(&model);
        assert!(!controller.is_active());
        assert_eq!(controller.system_instruction(), None);
        assert_eq!(model.opened(), 0);
    }

    #[tokio::test]
    async fn first_message_opens_a_session_lazily() {
        let model = MockModel::new();
        model.reply("Drop Pochinki.");
        let mut controller = controller(&model);

        assert_eq!(controller.send_message("where to drop?").await, "Drop Pochinki.");
        assert!(controller.is_active());
        assert_eq!(model.opened(), 1);
    }

    #[tokio::test]
    async fn later_messages_reuse_the_session() {
        let model = MockModel::new();
        model.reply("one");
        model.reply("two");
        let mut controller = controller(&model);
        controller.new_session();
        let id = controller.session_id();

        controller.send_message("a").await;
        controller.send_message("b").await;
        assert_eq!(controller.session_id(), id);
        assert_eq!(model.opened(), 1);
    }

    #[test]
    fn new_session_replaces_the_handle() {
        let model = MockModel::new();
        let mut controller = controller(&model);
        let first = controller.new_session();
        let second = controller.new_session();
        assert_ne!(first, second);
        assert_eq!(controller.session_id(), Some(second));
    }

    #[test]
    fn successful_ingest_rebuilds_session_with_knowledge() {
        let model = MockModel::new();
        let mut controller = controller(&model);
        controller.new_session();
        let before = controller.session_id();

        controller.ingest_knowledge(r#"["x","y"]"#).unwrap();

        assert_ne!(controller.session_id(), before);
        let instruction = controller.system_instruction().unwrap();
        let directive_at = instruction.find(KNOWLEDGE_DIRECTIVE).unwrap();
        let knowledge_at = instruction.find("[\n  \"x\",\n  \"y\"\n]").unwrap();
        assert!(directive_at < knowledge_at);
    }

    #[test]
    fn failed_ingest_keeps_knowledge_and_session() {
        let model = MockModel::new();
        let mut controller = controller(&model);
        controller.ingest_knowledge(r#"{"zone": "blue"}"#).unwrap();
        let session = controller.session_id();
        let knowledge = controller.knowledge();

        let err = controller.ingest_knowledge(r#"{"zone": }"#).unwrap_err();

        assert!(matches!(
            err,
            KnowledgeError::Ingestion(IngestionError::MalformedDocument { .. })
        ));
        assert_eq!(controller.session_id(), session);
        assert_eq!(controller.knowledge(), knowledge);
        assert_eq!(model.opened(), 1);
    }

    #[test]
    fn failed_save_keeps_session() {
        struct ReadOnlyStore;

        impl KeyValueStore for ReadOnlyStore {
            fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
                Ok(None)
            }
            fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
                Err(StoreError::io(key, "read-only"))
            }
            fn remove(&self, _key: &str) -> Result<(), StoreError> {
                Ok(())
            }
        }

        let model = MockModel::new();
        let mut controller = SessionController::new(KnowledgeStore::new(ReadOnlyStore), model.clone());
        controller.new_session();
        let session = controller.session_id();

        let err = controller.ingest_knowledge("[1]").unwrap_err();
        assert!(matches!(err, KnowledgeError::Store(_)));
        assert_eq!(controller.session_id(), session);
    }

    #[test]
    fn upload_reports_parse_errors() {
        let model = MockModel::new();
        let mut controller = controller(&model);

        assert_eq!(controller.upload("[1, 2,]"), UploadResult::ok());

        let failed = controller.upload("// nothing here\n");
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("File is empty after processing."));
    }

    #[test]
    fn stored_knowledge_is_used_at_startup() {
        let store = Arc::new(MemoryStore::new());
        store.set(KNOWLEDGE_KEY, "{\n  \"meta\": \"M416\"\n}").unwrap();
        let model = MockModel::new();
        let mut controller = SessionController::new(KnowledgeStore::new(store), model.clone())
            .with_assembler(PromptAssembler::new("persona"));

        controller.new_session();
        assert_eq!(
            controller.system_instruction(),
            Some(format!("persona\n\n{}\n{{\n  \"meta\": \"M416\"\n}}", KNOWLEDGE_DIRECTIVE).as_str())
        );
    }

    #[tokio::test]
    async fn remote_failure_returns_fallback() {
        let model = MockModel::new();
        model.push(Scripted::Fail(RemoteCallError::Api {
            status: 429,
            body: "quota".into(),
        }));
        model.reply("back online");
        let mut controller = controller(&model);

        assert_eq!(controller.send_message("hi").await, FALLBACK_REPLY);
        // no automatic retry; the next call gets the next scripted answer
        assert_eq!(controller.send_message("hi again").await, "back online");
        assert_eq!(model.received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn slow_model_times_out_to_fallback() {
        let model = MockModel::new();
        model.push(Scripted::Hang);
        let mut controller = controller(&model).with_timeout(Duration::from_millis(50));

        assert_eq!(controller.send_message("hello?").await, FALLBACK_REPLY);
        assert!(controller.is_active());
    }
}
