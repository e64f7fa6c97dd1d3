//! Error types for Tactical Terminal.

use std::time::Duration;
use thiserror::Error;

/// Why a knowledge-base upload was rejected.
///
/// The first problem found wins; there is no multi-error reporting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestionError {
    /// The text was not a single valid JSON document and did not look like
    /// several documents either.
    #[error("Invalid JSON: {detail}. Please check your file.")]
    MalformedDocument { detail: String },

    /// Nothing left once comments and blank lines were removed.
    #[error("File is empty after processing.")]
    Empty,

    /// A JSON Lines record failed to parse. `line` is 1-based.
    #[error("Invalid JSON Lines format: Error on line {line}: {detail}. Please check your file.")]
    MalformedLine { line: usize, detail: String },
}

impl IngestionError {
    /// Line number for JSON Lines failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Key/value persistence failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage I/O error for '{key}': {message}")]
    Io { key: String, message: String },

    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
}

impl StoreError {
    pub fn io(key: &str, err: impl std::fmt::Display) -> Self {
        Self::Io {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Failures of the remote model call. These never reach the user verbatim;
/// the session controller turns them into a fallback reply.
#[derive(Error, Debug)]
pub enum RemoteCallError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    MalformedResponse(String),

    #[error("No response content")]
    EmptyReply,

    #[error("Model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Model not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for RemoteCallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Anything that can stop a knowledge upload from taking effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("Failed to save knowledge base: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find data directory")]
    NoDataDir,

    #[error("Failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to write config: {0}")]
    Write(String),
}

/// Top-level error for the command-line front end.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteCallError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Command(String),
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Command(err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
