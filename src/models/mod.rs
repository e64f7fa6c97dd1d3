mod chat;
mod knowledge;
mod upload;

pub use chat::*;
pub use knowledge::*;
pub use upload::*;
