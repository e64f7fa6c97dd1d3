use log::warn;

use crate::models::{MessageSender, UploadResult};
use crate::services::llm_client::ModelService;
use crate::services::storage::KeyValueStore;
use crate::state::AppState;

pub const UPLOAD_SUCCESS_BANNER: &str =
    "Knowledge base updated successfully. I'm ready to assist with the new information.";

/// Replaces the knowledge base with `content`. On success the history is
/// reset to a confirmation banner; on failure an error banner is appended
/// and the previous knowledge stays in effect.
pub fn upload_knowledge<S, M>(state: &mut AppState<S, M>, content: &str) -> UploadResult
where
    S: KeyValueStore,
    M: ModelService,
{
    let result = state.controller.upload(content);

    let banner = if result.success {
        state.history.replace_with_system(UPLOAD_SUCCESS_BANNER)
    } else {
        let message = result
            .message
            .as_deref()
            .unwrap_or("An unknown error occurred.");
        state.history.push(
            MessageSender::System,
            &format!("Error updating knowledge base: {}", message),
        )
    };
    if let Err(e) = banner {
        warn!("Could not record upload outcome in chat history: {}", e);
    }

    result
}

pub fn get_knowledge<S, M>(state: &AppState<S, M>) -> String
where
    S: KeyValueStore,
    M: ModelService,
{
    state.controller.knowledge().into_string()
}
