pub mod claude;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

pub use claude::ClaudeClient;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
pub use openai::OpenAIClient;

use crate::config::Config;
use crate::error::ModelError;
use crate::provider::Provider;

/// A hosted or local model that answers a prompt with JSON text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the raw answer text.
    ///
    /// Providers that support a JSON output mode enable it; the answer is
    /// still decoded and validated by the caller.
    async fn query_json(&self, prompt: &str) -> Result<String, ModelError>;

    fn provider(&self) -> Provider;

    fn model_name(&self) -> &str;
}

/// Turn a non-success HTTP response into a `ModelError::Api`
pub(crate) async fn check_status(
    provider: Provider,
    response: reqwest::Response,
) -> Result<reqwest::Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if provider == Provider::Ollama {
        message.push_str(" (make sure Ollama is running with: ollama serve)");
    }

    Err(ModelError::Api {
        provider: provider.short_name(),
        status: status.as_u16(),
        message,
    })
}

fn http_client(config: &Config) -> Result<Client, ModelError> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| ModelError::internal(format!("failed to build HTTP client: {}", e)))
}

/// Build the client for `provider`, failing if it needs a key that is not set
pub fn build_model(
    config: &Config,
    provider: Provider,
    model: &str,
) -> Result<Arc<dyn LanguageModel>, ModelError> {
    let client = http_client(config)?;

    let not_configured = || ModelError::NotConfigured {
        provider: provider.short_name(),
        hint: format!(
            "set {} or add the key to {}",
            provider.api_key_var().unwrap_or_default(),
            Config::config_dir()
                .map(|d| d.join("config.json").display().to_string())
                .unwrap_or_else(|_| "config.json".to_string())
        ),
    };

    let model: Arc<dyn LanguageModel> = match provider {
        Provider::Ollama => Arc::new(OllamaClient::new(client, config.ollama_url(), model)),
        Provider::Claude => {
            let (key, _) = config.api_key(provider).ok_or_else(not_configured)?;
            Arc::new(ClaudeClient::new(client, &key, model))
        }
        Provider::OpenAI => {
            let (key, _) = config.api_key(provider).ok_or_else(not_configured)?;
            Arc::new(OpenAIClient::new(client, &key, model))
        }
    };

    tracing::debug!(provider = %provider, model = model.model_name(), "model client ready");
    Ok(model)
}

/// Models offered for a provider; Ollama is asked for what it has installed
pub async fn list_models(config: &Config, provider: Provider) -> Result<Vec<String>, ModelError> {
    match provider {
        Provider::Ollama => {
            let client = OllamaClient::new(http_client(config)?, config.ollama_url(), "");
            client.list_models().await
        }
        Provider::Claude => Ok(ClaudeClient::list_models()),
        Provider::OpenAI => Ok(OpenAIClient::list_models()),
    }
}
