// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Relay client
//!
//! Drives one submit end to end: session gate, routing, the HTTP call to
//! the relay, normalization into session events, and error reporting as
//! assistant messages.

use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, RelayError, Result};
use crate::llm::message::ChatRequest;
use crate::llm::router::{route, DocumentRequest, Route};
use crate::llm::stream::{normalize_buffered, normalize_stream, ResponseEvent};
use crate::session::ChatSession;

const DOCUMENT_FAILED: &str = "Przepraszam, wystąpił błąd podczas analizy PDF.";

/// How a submit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The assistant message holds the answer
    Answered { message_id: Uuid },
    /// An error message was appended instead
    Failed { message_id: Uuid },
}

impl SubmitOutcome {
    pub fn message_id(&self) -> Uuid {
        match self {
            SubmitOutcome::Answered { message_id } | SubmitOutcome::Failed { message_id } => {
                *message_id
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SubmitOutcome::Failed { .. })
    }
}

/// A failed exchange, with the text shown to the user
#[derive(Debug)]
struct Failure {
    user_message: String,
    source: RelayError,
}

impl Failure {
    fn document(server_message: Option<String>, source: RelayError) -> Self {
        Self {
            user_message: server_message.unwrap_or_else(|| DOCUMENT_FAILED.to_string()),
            source,
        }
    }

    fn chat(detail: impl std::fmt::Display, source: RelayError) -> Self {
        Self {
            user_message: format!(
                "Przepraszam, wystąpił błąd podczas przetwarzania Twojej wiadomości: {}",
                detail
            ),
            source,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for a running relay
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit `text` with the session's pending attachments.
    ///
    /// Only session gating errors are returned. Every other failure ends up
    /// as an assistant message in the session. `on_event` sees each event
    /// as it is applied.
    pub async fn submit<F>(
        &self,
        session: &mut ChatSession,
        text: &str,
        mut on_event: F,
    ) -> Result<SubmitOutcome>
    where
        F: FnMut(&ResponseEvent),
    {
        let pending = session.begin_submit(text)?;
        tracing::debug!(message_id = %pending.message_id, "submitting message");

        let outcome = match self.dispatch(session, pending.request, &mut on_event).await {
            Ok(message_id) => SubmitOutcome::Answered { message_id },
            Err(failure) => {
                tracing::warn!(error = %failure.source, "submit failed");
                SubmitOutcome::Failed {
                    message_id: session.push_error(failure.user_message),
                }
            }
        };

        session.finish_submit();
        Ok(outcome)
    }

    async fn dispatch<F>(
        &self,
        session: &mut ChatSession,
        request: ChatRequest,
        on_event: &mut F,
    ) -> std::result::Result<Uuid, Failure>
    where
        F: FnMut(&ResponseEvent),
    {
        match route(&request) {
            Route::Document(document) => self.analyze(session, &document, on_event).await,
            Route::Conversational(_) => self.chat(session, &request, on_event).await,
        }
    }

    async fn analyze<F>(
        &self,
        session: &mut ChatSession,
        document: &DocumentRequest,
        on_event: &mut F,
    ) -> std::result::Result<Uuid, Failure>
    where
        F: FnMut(&ResponseEvent),
    {
        let response = self
            .http
            .post(format!("{}/api/analyze-pdf", self.base_url))
            .json(&document.to_analyze_request())
            .send()
            .await
            .map_err(|e| Failure::document(None, RelayError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let server_message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            return Err(Failure::document(
                server_message,
                RelayError::Api(ApiError::from_status(status.as_u16(), body)),
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Failure::document(None, RelayError::Http(e)))?;

        let handle = session.begin_assistant();
        for event in normalize_buffered(handle.id(), text) {
            session.apply(&handle, &event);
            on_event(&event);
        }
        Ok(handle.id())
    }

    async fn chat<F>(
        &self,
        session: &mut ChatSession,
        request: &ChatRequest,
        on_event: &mut F,
    ) -> std::result::Result<Uuid, Failure>
    where
        F: FnMut(&ResponseEvent),
    {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let detail = e.to_string();
                Failure::chat(detail, RelayError::Http(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Failure::chat(
                format!("HTTP {}: {}", status.as_u16(), body),
                RelayError::Api(ApiError::from_status(status.as_u16(), body)),
            ));
        }

        let handle = session.begin_assistant();
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RelayError::Api(ApiError::StreamError(e.to_string()))));
        let mut events = Box::pin(normalize_stream(handle.id(), bytes));

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    session.apply(&handle, &event);
                    on_event(&event);
                }
                Err(err) => {
                    // Keep what arrived, frozen, and report the abort. A
                    // blank answer would become an empty turn upstream.
                    if !session.discard_if_empty(&handle) {
                        session.apply(
                            &handle,
                            &ResponseEvent::Complete {
                                message_id: handle.id(),
                            },
                        );
                    }
                    return Err(Failure::chat(err.to_string(), err));
                }
            }
        }

        Ok(handle.id())
    }
}
