use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, LanguageModel};
use crate::error::ModelError;
use crate::provider::Provider;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(client: Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    async fn generate(&self, prompt: &str, format: Option<&str>) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let response = check_status(Provider::Ollama, response).await?;
        let ollama_response: OllamaResponse =
            response.json().await.map_err(ModelError::from_transport)?;
        Ok(ollama_response.response)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ModelError::from_transport)?;
        let response = check_status(Provider::Ollama, response).await?;

        let models_response: OllamaModelsResponse =
            response.json().await.map_err(ModelError::from_transport)?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn query_json(&self, prompt: &str) -> Result<String, ModelError> {
        self.generate(prompt, Some("json")).await
    }

    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let request = OllamaRequest {
            model: "llama3.2:latest",
            prompt: "hi",
            stream: false,
            format: Some("json"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "model": "llama3.2:latest", "prompt": "hi", "stream": false, "format": "json" })
        );

        let plain = OllamaRequest { format: None, ..request };
        assert!(serde_json::to_value(&plain).unwrap().get("format").is_none());
    }

    #[tokio::test]
    async fn test_query_json_uses_json_mode() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/generate")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama3.2:latest",
                "stream": false,
                "format": "json"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response": "{\"testCases\": \"it('adds')\"}", "done": true}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(Client::new(), &format!("{}/", server.url()), "llama3.2:latest");
        let answer = client.query_json("write tests").await.unwrap();

        assert_eq!(answer, r#"{"testCases": "it('adds')"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_models_reads_tags() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"models": [{"name": "llama3.2:latest"}, {"name": "qwen2.5-coder:7b"}]}"#)
            .create_async()
            .await;

        let client = OllamaClient::new(Client::new(), &server.url(), "");
        assert_eq!(
            client.list_models().await.unwrap(),
            vec!["llama3.2:latest".to_string(), "qwen2.5-coder:7b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_error_status_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/generate")
            .with_status(404)
            .with_body("model 'missing' not found")
            .create_async()
            .await;

        let client = OllamaClient::new(Client::new(), &server.url(), "missing");
        match client.query_json("hi").await {
            Err(ModelError::Api { status, message, .. }) => {
                assert_eq!(status, 404);
                assert!(message.contains("not found"));
                assert!(message.contains("ollama serve"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
