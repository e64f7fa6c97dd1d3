use crate::services::config_service::Config;
use crate::services::history_service::ChatHistory;
use crate::services::knowledge_store::KnowledgeStore;
use crate::services::llm_client::ModelService;
use crate::services::prompt::PromptAssembler;
use crate::services::session_service::SessionController;
use crate::services::storage::KeyValueStore;

/// Everything the front end talks to: the live session and the visible
/// history, both backed by the same store.
pub struct AppState<S, M> {
    pub controller: SessionController<S, M>,
    pub history: ChatHistory<S>,
}

impl<S: KeyValueStore + Clone, M: ModelService> AppState<S, M> {
    pub fn new(store: S, model: M) -> Self {
        Self::with_controller(
            store.clone(),
            SessionController::new(KnowledgeStore::new(store), model),
        )
    }

    /// Applies the persona override and request timeout from `config`.
    pub fn from_config(store: S, model: M, config: &Config) -> Self {
        let assembler = config
            .persona
            .as_deref()
            .filter(|persona| !persona.trim().is_empty())
            .map(PromptAssembler::new)
            .unwrap_or_default();

        let controller = SessionController::new(KnowledgeStore::new(store.clone()), model)
            .with_assembler(assembler)
            .with_timeout(config.request_timeout());

        Self::with_controller(store, controller)
    }

    fn with_controller(store: S, mut controller: SessionController<S, M>) -> Self {
        controller.new_session();
        Self {
            controller,
            history: ChatHistory::load(store),
        }
    }
}
