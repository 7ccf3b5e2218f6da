use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{check_status, LanguageModel};
use crate::error::ModelError;
use crate::provider::Provider;

const OPENAI_API_BASE: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(client: Client, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            model: model.to_string(),
        }
    }

    /// Point the client at another host serving the same API
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn chat_json(&self, prompt: &str) -> Result<String, ModelError> {
        let request = OpenAIRequest {
            model: &self.model,
            messages: vec![OpenAIMessage {
                role: "user",
                content: prompt,
            }],
            response_format: Some(OpenAIResponseFormat { kind: "json_object" }),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let response = check_status(Provider::OpenAI, response).await?;
        let openai_response: OpenAIResponse =
            response.json().await.map_err(ModelError::from_transport)?;
        Ok(openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "gpt-4o".to_string(),
            "gpt-4o-mini".to_string(),
            "gpt-4-turbo".to_string(),
            "gpt-3.5-turbo".to_string(),
        ]
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    async fn query_json(&self, prompt: &str) -> Result<String, ModelError> {
        self.chat_json(prompt).await
    }

    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::FlowError;
    use crate::flows::{ExplainBugInput, FlowExecutor};
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_request_asks_for_json_object() {
        let request = OpenAIRequest {
            model: "gpt-4o",
            messages: vec![OpenAIMessage {
                role: "user",
                content: "hi",
            }],
            response_format: Some(OpenAIResponseFormat { kind: "json_object" }),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [{ "role": "user", "content": "hi" }],
                "response_format": { "type": "json_object" }
            })
        );
    }

    #[test]
    fn test_response_content_may_be_null() {
        let decoded: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": null } }]
        }))
        .unwrap();
        assert_eq!(decoded.choices.len(), 1);
        assert!(decoded.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_chat_sends_key_and_reads_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "response_format": { "type": "json_object" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"content": "{\"fixedCode\": \"a + b\"}"}}]}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new(Client::new(), "sk-test", "gpt-4o-mini").with_base_url(&server.url());
        assert_eq!(client.query_json("fix it").await.unwrap(), r#"{"fixedCode": "a + b"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_null_content_is_an_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new(Client::new(), "sk-test", "gpt-4o").with_base_url(&server.url());
        assert_eq!(client.query_json("explain").await.unwrap(), "");

        let executor = FlowExecutor::new(Arc::new(client));
        let input = ExplainBugInput {
            code: "function add(a,b){return a-b}".to_string(),
            bug_report: "add(2,3) returns -1 instead of 5".to_string(),
        };
        let err = executor.explain_bug(&input).await.unwrap_err();
        assert!(matches!(err, FlowError::Model(ModelError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_unauthorized_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Incorrect API key provided"}}"#)
            .create_async()
            .await;

        let client = OpenAIClient::new(Client::new(), "sk-bad", "gpt-4o").with_base_url(&server.url());
        match client.query_json("hi").await {
            Err(ModelError::Api { status, message, .. }) => {
                assert_eq!(status, 401);
                assert!(message.contains("Incorrect API key"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }
}
