use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, LanguageModel};
use crate::error::ModelError;
use crate::provider::Provider;

const CLAUDE_API_BASE: &str = "https://api.anthropic.com";

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Clone)]
pub struct ClaudeClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(client: Client, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: CLAUDE_API_BASE.to_string(),
            model: model.to_string(),
        }
    }

    /// Point the client at another host serving the same API
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub async fn query(&self, prompt: &str) -> Result<String, ModelError> {
        let request = ClaudeRequest {
            model: &self.model,
            max_tokens: 4096,
            messages: vec![ClaudeMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let response = check_status(Provider::Claude, response).await?;
        let claude_response: ClaudeResponse =
            response.json().await.map_err(ModelError::from_transport)?;
        Ok(claude_response
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "claude-sonnet-4-20250514".to_string(),
            "claude-3-5-sonnet-20241022".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
            "claude-3-opus-20240229".to_string(),
        ]
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    // No JSON switch on this API; the prompt itself asks for an object
    async fn query_json(&self, prompt: &str) -> Result<String, ModelError> {
        self.query(prompt).await
    }

    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
