pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

/// The text-generation service, seen as prompt in, raw text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn query(&self, prompt: &str) -> Result<String>;
}

pub use openai::{ChatCompletionsClient, ServiceConfig};
