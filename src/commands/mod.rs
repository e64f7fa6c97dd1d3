mod chat;
mod config;
mod knowledge;

pub use chat::*;
pub use config::*;
pub use knowledge::*;
