pub mod config_service;
pub mod file_service;
pub mod history_service;
pub mod ingest;
pub mod knowledge_store;
pub mod llm_client;
pub mod normalizer;
pub mod prompt;
pub mod session_service;
pub mod storage;
