//! Ollama client speaking the native `/api/chat` protocol.
//!
//! Every completion in the pipeline goes through this client, whether it
//! targets the fast text model or the vision model. Vision is not a separate
//! code path: a request that carries base64 images is serialized with an
//! `images` array on the user message and Ollama dispatches it to the
//! multimodal model named in the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use faithloop_core::{ChatMessage, CompletionClient, CompletionError, CompletionRequest};

/// Seconds before a health check or model listing gives up.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Client for a local (or remote) Ollama server.
pub struct OllamaClient {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for the given base URL, e.g. `http://localhost:11434`.
    pub fn new(base_url: impl Into<String>) -> Self {
        // Completion calls carry no timeout: a local model pulling a cold
        // weights file can legitimately take minutes on first token.
        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "ollama".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Convenience constructor for the default local server.
    pub fn localhost() -> Self {
        Self::new("http://localhost:11434")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[ChatMessage]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                images: if m.images.is_empty() {
                    None
                } else {
                    Some(m.images.clone())
                },
            })
            .collect()
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/api/chat", self.base_url);

        let body = json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": false,
        });

        tracing::debug!(
            client = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(e.to_string())
                } else {
                    CompletionError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 404 {
            // Ollama answers 404 for a model name that is not pulled.
            tracing::warn!(model = %request.model, "Model not found on server");
            return Err(CompletionError::ModelNotFound(request.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status, "Completion request failed");
            return Err(CompletionError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let content = api_response.message.content;
        tracing::debug!(chars = content.len(), "Completion received");

        Ok(content)
    }

    async fn health_check(&self) -> Result<bool, CompletionError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    async fn list_models(&self) -> Result<Vec<String>, CompletionError> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CompletionError::ApiError {
                status_code: response.status().as_u16(),
                message: "failed to list models".to_string(),
            });
        }

        let tags: ApiTagsResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// ===== Wire types =====

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiTagsResponse {
    models: Vec<ApiModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiModelEntry {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use faithloop_core::Role;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("http://localhost:11434");
        assert_eq!(client.name(), "ollama");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_localhost_constructor() {
        let client = OllamaClient::localhost();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_message_conversion_text_only() {
        let messages = vec![ChatMessage::user("hello")];
        let api = OllamaClient::to_api_messages(&messages);

        assert_eq!(api.len(), 1);
        assert_eq!(api[0].role, "user");
        assert_eq!(api[0].content, "hello");
        assert!(api[0].images.is_none());
    }

    #[test]
    fn test_message_conversion_with_image() {
        let messages = vec![ChatMessage::user_with_image("describe", "aGVsbG8=")];
        let api = OllamaClient::to_api_messages(&messages);

        let images = api[0].images.as_ref().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0], "aGVsbG8=");
    }

    #[test]
    fn test_text_message_omits_images_field() {
        let api = OllamaClient::to_api_messages(&[ChatMessage::user("hi")]);
        let serialized = serde_json::to_string(&api[0]).unwrap();

        assert!(!serialized.contains("images"));
    }

    #[test]
    fn test_image_message_serializes_payload() {
        let api = OllamaClient::to_api_messages(&[ChatMessage::user_with_image("q", "Zm9v")]);
        let serialized = serde_json::to_string(&api[0]).unwrap();

        assert!(serialized.contains("\"images\":[\"Zm9v\"]"));
    }

    #[test]
    fn test_request_body_disables_streaming() {
        let request = CompletionRequest::prompt("llama3.2", "hi");
        let body = json!({
            "model": request.model,
            "messages": OllamaClient::to_api_messages(&request.messages),
            "stream": false,
        });

        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["model"], json!("llama3.2"));
    }

    #[test]
    fn test_parse_chat_response() {
        let raw = r#"{
            "model": "llama3.2",
            "created_at": "2025-03-01T12:00:00Z",
            "message": {
                "role": "assistant",
                "content": "NUMERIC"
            },
            "done": true,
            "total_duration": 1234567
        }"#;

        let parsed: ApiChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content, "NUMERIC");
        assert_eq!(parsed.message.role, "assistant");
    }

    #[test]
    fn test_parse_tags_response() {
        let raw = r#"{
            "models": [
                {"name": "llama3.2:latest", "size": 2019393189},
                {"name": "llava-phi3:latest", "size": 2925476789}
            ]
        }"#;

        let parsed: ApiTagsResponse = serde_json::from_str(raw).unwrap();
        let names: Vec<String> = parsed.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3.2:latest", "llava-phi3:latest"]);
    }

    #[test]
    fn test_parse_empty_content() {
        let raw = r#"{"message": {"role": "assistant", "content": ""}}"#;
        let parsed: ApiChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content, "");
    }

    #[test]
    fn test_role_round_trip_through_wire_format() {
        let api = OllamaClient::to_api_messages(&[ChatMessage {
            role: Role::Assistant,
            content: "ok".to_string(),
            images: Vec::new(),
        }]);
        assert_eq!(api[0].role, "assistant");
    }
}
