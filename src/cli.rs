//! Command-line front end.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::commands;
use crate::error::{AppError, Result};
use crate::models::{ChatMessage, MessageSender};
use crate::services::config_service;
use crate::services::file_service::{get_app_data_dir, get_store_dir, FileStore};
use crate::services::llm_client::{LlmClient, ModelService};
use crate::services::storage::{KeyValueStore, MemoryStore};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(
    name = "tactical-terminal",
    version,
    about = "The Conqueror: PUBG Mobile tactics assistant with an uploadable knowledge base"
)]
pub struct Cli {
    /// Directory holding config.json and stored data.
    #[arg(long, global = true, env = "TACTICAL_TERMINAL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep knowledge base and history in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat (default).
    Chat,
    /// Ask a single question and print the answer.
    Ask { prompt: String },
    /// Replace the knowledge base with a JSON or JSON Lines file ("-" reads stdin).
    Upload { file: PathBuf },
    /// Print the current knowledge base.
    Knowledge,
    /// List the prompts sent in the saved conversation.
    History,
    /// Start a new conversation and clear the history.
    NewChat,
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    SetApiKey { key: String },
    SetBaseUrl { url: String },
    SetModel { model: String },
    /// Per-request timeout for model calls.
    SetTimeout { secs: u64 },
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

type CliState = AppState<Arc<dyn KeyValueStore>, LlmClient>;

pub async fn execute(cli: Cli) -> Result<()> {
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_app_data_dir()?,
    };
    let ephemeral = cli.ephemeral;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Config { action } => run_config(&data_dir, action),
        Commands::Chat => {
            let mut state = build_state(&data_dir, ephemeral, true)?;
            run_chat(&mut state).await
        }
        Commands::Ask { prompt } => {
            let mut state = build_state(&data_dir, ephemeral, true)?;
            if let Some(reply) = commands::send_chat_message(&mut state, &prompt).await? {
                println!("{}", reply.text);
            }
            Ok(())
        }
        Commands::Upload { file } => {
            let mut state = build_state(&data_dir, ephemeral, false)?;
            upload(&mut state, &file).await
        }
        Commands::Knowledge => {
            let state = build_state(&data_dir, ephemeral, false)?;
            let knowledge = commands::get_knowledge(&state);
            if knowledge.is_empty() {
                println!("(no knowledge base loaded)");
            } else {
                println!("{}", knowledge);
            }
            Ok(())
        }
        Commands::History => {
            let state = build_state(&data_dir, ephemeral, false)?;
            print_prompt_history(&commands::get_prompt_history(&state));
            Ok(())
        }
        Commands::NewChat => {
            let mut state = build_state(&data_dir, ephemeral, false)?;
            commands::new_chat(&mut state)?;
            println!("Started a new chat.");
            Ok(())
        }
    }
}

fn build_state(data_dir: &Path, ephemeral: bool, talks_to_model: bool) -> Result<CliState> {
    let config = config_service::get_effective_config(data_dir)?;
    if talks_to_model && !config.has_api_key() {
        log::warn!("No API key configured; model calls will fail until one is set");
    }
    let store: Arc<dyn KeyValueStore> = if ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::new(get_store_dir(data_dir)))
    };
    let model = LlmClient::from_config(&config)?;
    Ok(AppState::from_config(store, model, &config))
}

fn run_config(data_dir: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = commands::get_config(data_dir)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&config).map_err(|e| AppError::Command(e.to_string()))?
            );
        }
        ConfigAction::SetApiKey { key } => commands::set_api_key(data_dir, &key)?,
        ConfigAction::SetBaseUrl { url } => commands::set_base_url(data_dir, &url)?,
        ConfigAction::SetModel { model } => commands::set_model(data_dir, &model)?,
        ConfigAction::SetTimeout { secs } => commands::set_request_timeout(data_dir, secs)?,
    }
    Ok(())
}

async fn read_upload(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        return Ok(content);
    }
    Ok(tokio::fs::read_to_string(file).await?)
}

async fn upload<S, M>(state: &mut AppState<S, M>, file: &Path) -> Result<()>
where
    S: KeyValueStore,
    M: ModelService,
{
    let content = read_upload(file).await?;
    let result = commands::upload_knowledge(state, &content);
    if result.success {
        println!("{}", commands::UPLOAD_SUCCESS_BANNER);
        Ok(())
    } else {
        Err(AppError::Command(
            result
                .message
                .unwrap_or_else(|| "Failed to process file.".to_string()),
        ))
    }
}

fn print_prompt_history(prompts: &[String]) {
    if prompts.is_empty() {
        println!("Your conversation will be stored here.");
        return;
    }
    for (index, prompt) in prompts.iter().enumerate() {
        println!("{:>3}. {}", index + 1, prompt);
    }
}

fn print_starter_prompts() {
    for (index, (title, prompt)) in commands::STARTER_PROMPTS.iter().enumerate() {
        println!("  {}. {}: {}", index + 1, title, prompt);
    }
    println!("Type a number to use one, or ask anything.\n");
}

fn print_message(message: &ChatMessage) {
    let label = match message.sender {
        MessageSender::User => "you",
        MessageSender::Assistant => "conqueror",
        MessageSender::System => "system",
    };
    println!("[{}] {}\n", label, message.text);
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

async fn run_chat<S, M>(state: &mut AppState<S, M>) -> Result<()>
where
    S: KeyValueStore,
    M: ModelService,
{
    println!("Welcome, soldier. I am The Conqueror. How can I give you the winning edge?");
    println!("Commands: /new, /history, /upload <file>, /quit\n");
    if state.history.is_empty() {
        print_starter_prompts();
    }
    for message in state.history.messages() {
        print_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "/quit" | "/exit" => break,
            "/new" => {
                commands::new_chat(state)?;
                println!("Started a new chat.\n");
                print_starter_prompts();
            }
            "/history" => print_prompt_history(&commands::get_prompt_history(state)),
            _ if input.starts_with("/upload ") => {
                let path = PathBuf::from(input.trim_start_matches("/upload ").trim());
                match read_upload(&path).await {
                    Ok(content) => {
                        commands::upload_knowledge(state, &content);
                        if let Some(last) = state.history.messages().last() {
                            print_message(last);
                        }
                    }
                    Err(e) => println!("[system] Failed to read the file: {}\n", e),
                }
            }
            _ => {
                let input = match commands::starter_prompt(input) {
                    Some(starter) if state.history.is_empty() => starter,
                    _ => input,
                };
                if let Some(reply) = commands::send_chat_message(state, input).await? {
                    print_message(&reply);
                }
            }
        }
        prompt()?;
    }
    Ok(())
}
