mod client;
mod models;

pub use client::{ChatCompletionClient, CompletionBackend};
pub use models::CompletionOptions;
