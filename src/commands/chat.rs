use crate::models::{ChatMessage, MessageSender};
use crate::services::llm_client::ModelService;
use crate::services::storage::KeyValueStore;
use crate::state::AppState;

/// Suggestions offered on an empty conversation, as (title, prompt).
pub const STARTER_PROMPTS: [(&str, &str); 4] = [
    (
        "Weapon Loadouts",
        "Suggest three elite weapon loadouts for Erangel, one for close-range, one for mid-range, and one for long-range.",
    ),
    (
        "Map Strategy",
        "Give me a high-loot, high-risk drop strategy for Sosnovka Military Base.",
    ),
    (
        "Vehicle Tactics",
        "What are the best tactics for using a Dacia in the final circles?",
    ),
    (
        "Gear Priority",
        "What is the priority for looting gear in the first 5 minutes of a match?",
    ),
];

/// Resolves a 1-based choice such as `"2"` to its starter prompt.
pub fn starter_prompt(choice: &str) -> Option<&'static str> {
    let index = choice.trim().parse::<usize>().ok()?.checked_sub(1)?;
    STARTER_PROMPTS.get(index).map(|(_, prompt)| *prompt)
}

/// Records the user's message, asks the model and records the reply.
/// Blank input is ignored and yields `None`.
pub async fn send_chat_message<S, M>(
    state: &mut AppState<S, M>,
    message: &str,
) -> Result<Option<ChatMessage>, String>
where
    S: KeyValueStore,
    M: ModelService,
{
    if message.trim().is_empty() {
        return Ok(None);
    }

    state
        .history
        .push(MessageSender::User, message)
        .map_err(|e| e.to_string())?;

    let reply = state.controller.send_message(message).await;

    state
        .history
        .push(MessageSender::Assistant, &reply)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Starts over: fresh model conversation, empty history.
pub fn new_chat<S, M>(state: &mut AppState<S, M>) -> Result<(), String>
where
    S: KeyValueStore,
    M: ModelService,
{
    state.controller.new_session();
    state.history.clear().map_err(|e| e.to_string())
}

pub fn get_chat_history<S, M>(state: &AppState<S, M>) -> Vec<ChatMessage>
where
    S: KeyValueStore,
    M: ModelService,
{
    state.history.messages().to_vec()
}

/// Sidebar view: the user's prompts, empty before the first exchange.
pub fn get_prompt_history<S, M>(state: &AppState<S, M>) -> Vec<String>
where
    S: KeyValueStore,
    M: ModelService,
{
    state
        .history
        .user_prompts()
        .into_iter()
        .map(str::to_string)
        .collect()
}
