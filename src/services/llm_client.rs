use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::RemoteCallError;
use crate::services::config_service::Config;

// ============================================================================
// MODEL SEAM
// ============================================================================

/// One configured conversation with the remote model.
#[async_trait]
pub trait Conversation: Send {
    fn id(&self) -> Uuid;

    fn system_instruction(&self) -> &str;

    /// Sends a user turn and returns the model's reply text.
    async fn send(&mut self, text: &str) -> Result<String, RemoteCallError>;
}

/// Something that can open conversations with a model.
pub trait ModelService: Send + Sync {
    fn create_conversation(&self, system_instruction: &str) -> Box<dyn Conversation>;
}

// ============================================================================
// OPENAI-COMPATIBLE CLIENT
// ============================================================================

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: CompletionMessage,
}

/// LLM Client for OpenAI-compatible APIs
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteCallError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteCallError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Create a new LLM client from the app's configuration. A missing API
    /// key is only reported when a request is made.
    pub fn from_config(config: &Config) -> Result<Self, RemoteCallError> {
        Self::new(
            &config.effective_base_url(),
            config.api_key.as_deref().unwrap_or_default(),
            &config.effective_model(),
            config.request_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        if self.base_url.contains("/chat/completions") {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
        }
    }

    /// Send a chat completion request
    pub async fn chat_completion(
        &self,
        messages: Vec<CompletionMessage>,
    ) -> Result<String, RemoteCallError> {
        if self.api_key.is_empty() {
            return Err(RemoteCallError::NotConfigured(
                "No API key configured. Run `tactical-terminal config set-api-key <KEY>` or set API_KEY.".to_string(),
            ));
        }

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteCallError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RemoteCallError::MalformedResponse(e.to_string()))?;

        extract_reply(completion)
    }

    /// Helper to create a system message
    pub fn system_message(content: &str) -> CompletionMessage {
        Self::message("system", content)
    }

    /// Helper to create a user message
    pub fn user_message(content: &str) -> CompletionMessage {
        Self::message("user", content)
    }

    /// Helper to create an assistant message
    pub fn assistant_message(content: &str) -> CompletionMessage {
        Self::message("assistant", content)
    }

    fn message(role: &str, content: &str) -> CompletionMessage {
        CompletionMessage {
            role: role.to_string(),
            content: Some(content.to_string()),
        }
    }
}

fn extract_reply(completion: ChatCompletionResponse) -> Result<String, RemoteCallError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(RemoteCallError::EmptyReply)
}

impl ModelService for LlmClient {
    fn create_conversation(&self, system_instruction: &str) -> Box<dyn Conversation> {
        Box::new(LlmConversation {
            id: Uuid::new_v4(),
            client: self.clone(),
            system_instruction: system_instruction.to_string(),
            turns: Vec::new(),
        })
    }
}

/// Chat completions are stateless, so the conversation replays its own
/// history on every request.
pub struct LlmConversation {
    id: Uuid,
    client: LlmClient,
    system_instruction: String,
    turns: Vec<CompletionMessage>,
}

impl LlmConversation {
    fn request_messages(&self, text: &str) -> Vec<CompletionMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() + 2);
        messages.push(LlmClient::system_message(&self.system_instruction));
        messages.extend(self.turns.iter().cloned());
        messages.push(LlmClient::user_message(text));
        messages
    }
}

#[async_trait]
impl Conversation for LlmConversation {
    fn id(&self) -> Uuid {
        self.id
    }

    fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    async fn send(&mut self, text: &str) -> Result<String, RemoteCallError> {
        let messages = self.request_messages(text);
        debug!(
            "Conversation {} sending turn {} to {}",
            self.id,
            self.turns.len() / 2 + 1,
            self.client.model()
        );

        let reply = self.client.chat_completion(messages).await?;

        // Only completed exchanges become history.
        self.turns.push(LlmClient::user_message(text));
        self.turns.push(LlmClient::assistant_message(&reply));
        Ok(reply)
    }
}
