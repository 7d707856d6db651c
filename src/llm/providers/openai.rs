// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! OpenAI chat completions provider
//!
//! Conversational path: role-tagged messages, images inline as
//! `image_url` parts, streamed responses passed through as raw bytes.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;

use crate::attachment::strip_data_url_prefix;
use crate::config::settings::OpenAiRuntime;
use crate::error::{ApiError, RelayError, Result};
use crate::llm::message::{ChatMessage, Role, WireAttachment};
use crate::llm::provider::{ByteStream, ConversationalProvider};
use crate::llm::providers::common::error_from_response;
use crate::llm::router::ConversationRequest;

/// Detail hint attached to every image part
const IMAGE_DETAIL: &str = "high";

/// OpenAI provider for the conversational path
pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiProvider {
    /// Create a provider from resolved settings
    pub fn new(config: &OpenAiRuntime) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Override the endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the request body. The most recent user message becomes a
    /// content-parts array only when at least one image is attached.
    fn build_request(&self, request: &ConversationRequest) -> OpenAiRequest {
        let mut messages: Vec<OpenAiMessage> = request
            .messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: OpenAiContent::Text(m.content.clone()),
            })
            .collect();

        if !request.attachments.is_empty() {
            if let Some(last) = request.messages.last().filter(|m| m.role == Role::User) {
                if let Some(slot) = messages.last_mut() {
                    slot.content = Self::convert_user_content(last, &request.attachments);
                }
            }
        }

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }

    fn convert_user_content(message: &ChatMessage, attachments: &[WireAttachment]) -> OpenAiContent {
        let mut text = message.content.clone();
        let mut images = Vec::new();

        for attachment in attachments {
            if attachment.is_image() && !attachment.data.is_empty() {
                images.push(OpenAiPart::ImageUrl {
                    image_url: OpenAiImageUrl {
                        url: Self::image_url(attachment),
                        detail: IMAGE_DETAIL.to_string(),
                    },
                });
            } else if !attachment.is_image() {
                text.push_str(&format!(
                    "\n\nZałączono plik {}: {}. Proszę przeanalizuj jego zawartość jeśli to możliwe.",
                    attachment.mime_type, attachment.name
                ));
            }
        }

        if images.is_empty() {
            return OpenAiContent::Text(text);
        }

        let mut parts = vec![OpenAiPart::Text { text }];
        parts.extend(images);
        OpenAiContent::Parts(parts)
    }

    /// Images are sent as data URLs; a bare base64 payload gets its prefix.
    fn image_url(attachment: &WireAttachment) -> String {
        if attachment.data.starts_with("data:") {
            attachment.data.clone()
        } else {
            format!(
                "data:{};base64,{}",
                attachment.mime_type,
                strip_data_url_prefix(&attachment.data)
            )
        }
    }
}

#[async_trait]
impl ConversationalProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn stream_chat(&self, request: &ConversationRequest) -> Result<ByteStream> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::Config("OpenAI API key is not configured".to_string()))?;

        let body = self.build_request(request);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            images = request.attachments.iter().filter(|a| a.is_image()).count(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Api(ApiError::Network(e.to_string())))?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(provider = "openai", %err, "upstream rejected chat request");
            return Err(err);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::Api(ApiError::StreamError(e.to_string()))));

        Ok(Box::pin(stream))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: OpenAiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAiPart {
    Text { text: String },
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAiImageUrl {
    url: String,
    detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runtime(api_key: Option<&str>) -> OpenAiRuntime {
        OpenAiRuntime {
            api_key: api_key.map(str::to_string),
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    fn image(name: &str) -> WireAttachment {
        WireAttachment {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            size: None,
            data: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        }
    }

    fn conversation(attachments: Vec<WireAttachment>) -> ConversationRequest {
        ConversationRequest {
            messages: vec![
                ChatMessage::user("Cześć"),
                ChatMessage::assistant("Dzień dobry!"),
                ChatMessage::user("Co widzisz?"),
            ],
            attachments,
        }
    }

    #[test]
    fn test_provider_configured() {
        assert!(OpenAiProvider::new(&runtime(Some("sk-test"))).is_configured());
        assert!(!OpenAiProvider::new(&runtime(None)).is_configured());
        assert_eq!(OpenAiProvider::new(&runtime(None)).name(), "openai");
    }

    #[test]
    fn test_build_request_plain_text() {
        let provider = OpenAiProvider::new(&runtime(Some("k")));
        let body = serde_json::to_value(provider.build_request(&conversation(vec![]))).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][2]["content"], "Co widzisz?");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[test]
    fn test_build_request_with_images() {
        let provider = OpenAiProvider::new(&runtime(Some("k")));
        let body = serde_json::to_value(
            provider.build_request(&conversation(vec![image("a.png"), image("b.png")])),
        )
        .unwrap();

        let parts = body["messages"][2]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "Co widzisz?");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["detail"], "high");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
        // Earlier messages stay plain strings
        assert_eq!(body["messages"][0]["content"], "Cześć");
    }

    #[test]
    fn test_build_request_bare_base64_image_gets_prefix() {
        let provider = OpenAiProvider::new(&runtime(Some("k")));
        let mut img = image("a.png");
        img.data = "iVBORw0KGgo=".to_string();
        let body = serde_json::to_value(provider.build_request(&conversation(vec![img]))).unwrap();
        assert_eq!(
            body["messages"][2]["content"][1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
    }

    #[test]
    fn test_build_request_non_image_becomes_note() {
        let provider = OpenAiProvider::new(&runtime(Some("k")));
        let doc = WireAttachment {
            name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size: Some(3),
            data: "AAAA".to_string(),
        };
        let body = serde_json::to_value(provider.build_request(&conversation(vec![doc]))).unwrap();

        let content = body["messages"][2]["content"].as_str().unwrap();
        assert!(content.starts_with("Co widzisz?"));
        assert!(content.contains("notes.pdf"));
    }

    #[test]
    fn test_build_request_last_message_not_user_is_untouched() {
        let provider = OpenAiProvider::new(&runtime(Some("k")));
        let request = ConversationRequest {
            messages: vec![ChatMessage::user("a"), ChatMessage::assistant("b")],
            attachments: vec![image("a.png")],
        };
        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["messages"][1]["content"], "b");
    }

    #[tokio::test]
    async fn test_stream_chat_passes_bytes_through() {
        let mock_server = MockServer::start().await;
        let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Hej\"}}]}\n\ndata: [DONE]\n\n";
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/event-stream")
                    .set_body_string(sse),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(&runtime(Some("sk-test")))
            .with_base_url(format!("{}/v1/chat/completions", mock_server.uri()));
        let mut stream = provider.stream_chat(&conversation(vec![])).await.unwrap();

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(String::from_utf8(collected).unwrap(), sse);
    }

    #[tokio::test]
    async fn test_stream_chat_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let provider = OpenAiProvider::new(&runtime(Some("sk-test")))
            .with_base_url(mock_server.uri());
        let err = provider
            .stream_chat(&conversation(vec![]))
            .await
            .err()
            .unwrap();
        assert_eq!(err.upstream_status(), Some(401));
    }

    #[tokio::test]
    async fn test_stream_chat_without_key() {
        let provider = OpenAiProvider::new(&runtime(None));
        let err = provider
            .stream_chat(&conversation(vec![]))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
