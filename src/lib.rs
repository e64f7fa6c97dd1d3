pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use clap::Parser;

pub use error::{AppError, IngestionError, KnowledgeError, RemoteCallError, Result, StoreError};
pub use models::{ChatMessage, KnowledgeText, MessageSender, UploadResult};
pub use services::ingest::{ingest, parse};
pub use services::normalizer::normalize;
pub use state::AppState;

pub async fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging();
    cli::execute(cli).await
}
