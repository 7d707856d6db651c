// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Google Gemini provider
//!
//! Document path: one text part with the instructions plus the PDF as inline
//! data. No streaming; the provider answers with a single text.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::attachment::strip_data_url_prefix;
use crate::config::settings::GoogleRuntime;
use crate::error::{ApiError, RelayError, Result};
use crate::llm::message::AnalysisType;
use crate::llm::provider::DocumentProvider;
use crate::llm::providers::common::error_from_response;
use crate::llm::router::DocumentRequest;

const QA_SYSTEM_PROMPT: &str = "Jesteś ekspertem w analizie dokumentów PDF. Twoim zadaniem jest odpowiadać na pytania użytkownika na podstawie zawartości załączonego dokumentu PDF. Odpowiadaj precyzyjnie i konkretnie, odwołując się do konkretnych fragmentów dokumentu. Odpowiadaj po polsku.";

const DETAILED_SYSTEM_PROMPT: &str = "Jesteś ekspertem w analizie dokumentów. Twoim zadaniem jest przeanalizować dokument PDF i przedstawić jego zawartość w sposób zrozumiały. Opisz główne tematy, kluczowe informacje, strukturę dokumentu i najważniejsze wnioski. Odpowiadaj po polsku.";

const QA_DEFAULT_PROMPT: &str =
    "Przeanalizuj ten dokument PDF i odpowiedz na pytania użytkownika.";

const DETAILED_USER_PROMPT: &str = "Przeanalizuj ten dokument PDF i opisz jego zawartość.";

/// Returned when the provider answers without any candidate text
pub const EMPTY_RESPONSE_TEXT: &str = "Nie udało się wygenerować odpowiedzi";

/// Gemini provider for the document path
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiProvider {
    /// Create a provider from resolved settings
    pub fn new(config: &GoogleRuntime) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Override the models endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Instruction text for the given mode
    fn prompt(request: &DocumentRequest) -> String {
        let (system, user) = match request.analysis_type {
            AnalysisType::Qa => (
                QA_SYSTEM_PROMPT,
                request
                    .question
                    .as_deref()
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or(QA_DEFAULT_PROMPT),
            ),
            AnalysisType::Detailed => (DETAILED_SYSTEM_PROMPT, DETAILED_USER_PROMPT),
        };
        format!("{}\n\n{}", system, user)
    }

    fn build_request(&self, request: &DocumentRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![
                    GeminiPart::Text {
                        text: Self::prompt(request),
                    },
                    GeminiPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: request.file.mime_type.clone(),
                            data: strip_data_url_prefix(&request.file.data).to_string(),
                        },
                    },
                ],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl DocumentProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn analyze(&self, request: &DocumentRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelayError::Config("Google API key is not configured".to_string()))?;

        let body = self.build_request(request);
        tracing::debug!(
            model = %self.model,
            file = %request.file.name,
            analysis = ?request.analysis_type,
            "sending document analysis request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Api(ApiError::Network(e.to_string())))?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(provider = "gemini", %err, "upstream rejected document request");
            return Err(err);
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Api(ApiError::InvalidResponse(e.to_string())))?;

        Ok(parsed
            .first_text()
            .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string()))
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}
