pub mod gemini;

use crate::domain::error::Result;
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use async_trait::async_trait;
use gemini::GeminiClient;
use std::sync::Arc;

/// Document handed to the model next to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Base64 payload sent in the request body.
    Inline { mime_type: String, data: String },
    /// Publicly reachable document the model fetches itself.
    Remote { mime_type: String, uri: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub system: String,
    pub user: String,
    pub attachment: Option<Attachment>,
}

#[async_trait]
pub trait LLMClient {
    async fn generate(&self, config: &LLMConfig, request: &GenerateRequest) -> Result<String>;
}

pub fn client_for(config: &LLMConfig) -> Arc<dyn LLMClient + Send + Sync> {
    match config.provider {
        LLMProvider::Google => Arc::new(GeminiClient::new(config.timeout_secs)),
    }
}
