//! CompletionClient trait — the abstraction over the completion service.
//!
//! One call shape covers every use in the pipeline: classification, code
//! generation, search-query rewriting, critique, revision, and synthesis.
//! A request is (model, messages); a message optionally carries base64
//! image data for vision-capable models. The reply is plain generated text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::turn::Role;

/// One message sent to the completion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who the message is from
    pub role: Role,

    /// The text content
    pub content: String,

    /// Base64-encoded image payloads for vision models
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ChatMessage {
    /// Create a plain user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Create a user message carrying an image.
    pub fn user_with_image(content: impl Into<String>, image_b64: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: vec![image_b64.into()],
        }
    }
}

/// A completion request: which model, and what to send it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }

    /// Single-prompt request, the common case in the pipeline.
    pub fn prompt(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(model, vec![ChatMessage::user(text)])
    }

    /// Single-prompt request with an attached image.
    pub fn prompt_with_image(
        model: impl Into<String>,
        text: impl Into<String>,
        image_b64: impl Into<String>,
    ) -> Self {
        Self::new(model, vec![ChatMessage::user_with_image(text, image_b64)])
    }
}

/// The completion-service seam.
///
/// The pipeline calls `complete()` without knowing which backend is wired in,
/// which is also what makes the pipeline testable with scripted replies.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A human-readable name for this client (e.g., "ollama").
    fn name(&self) -> &str;

    /// Send a request and return the generated text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, CompletionError>;

    /// Health check — can we reach the service?
    async fn health_check(&self) -> std::result::Result<bool, CompletionError> {
        Ok(true)
    }

    /// List the models the service has available.
    async fn list_models(&self) -> std::result::Result<Vec<String>, CompletionError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_builds_single_user_message() {
        let req = CompletionRequest::prompt("llama3.2", "Output 1 word.");
        assert_eq!(req.model, "llama3.2");
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::User);
        assert!(req.messages[0].images.is_empty());
    }

    #[test]
    fn prompt_with_image_attaches_payload() {
        let req = CompletionRequest::prompt_with_image("llava-phi3", "Describe", "aGVsbG8=");
        assert_eq!(req.messages[0].images, vec!["aGVsbG8=".to_string()]);
    }

    #[test]
    fn plain_message_serializes_without_images_field() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("images"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
