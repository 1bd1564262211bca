pub mod llm;

pub use llm::{ChatCompletionClient, CompletionBackend, CompletionOptions};
