// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Relay error responses
//!
//! Every failure leaves the relay as a Polish, user-facing message. The
//! document path also carries the raw upstream error for diagnostics.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::RelayError;

pub const NO_FILES: &str = "Brak plików PDF do analizy";
pub const MISSING_GOOGLE_KEY: &str = "Brak klucza Google AI API. Sprawdź czy masz ustawioną zmienną GOOGLE_GENERATIVE_AI_API_KEY w pliku .env.local";
pub const MISSING_OPENAI_KEY: &str = "Brak klucza OpenAI API. Sprawdź czy masz ustawioną zmienną OPENAI_API_KEY w pliku .env.local";
pub const CHAT_FAILED: &str = "Wystąpił błąd podczas przetwarzania żądania";

#[derive(Error, Debug)]
pub enum ServerError {
    /// Document request without files
    #[error("Brak plików PDF do analizy")]
    NoFiles,

    /// First file failed validation
    #[error("Nieprawidłowy plik PDF: {}", .0.join(", "))]
    InvalidPdf(Vec<&'static str>),

    /// Provider credential was not resolved at start-up
    #[error("{message}")]
    MissingKey {
        message: &'static str,
        status: StatusCode,
    },

    /// Document provider failed after the retry policy gave up
    #[error("{}", translate_upstream_error(.0))]
    Document(RelayError),

    /// Conversational provider failed
    #[error("Wystąpił błąd podczas przetwarzania żądania")]
    Chat(RelayError),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_error: Option<String>,
}

/// Map an upstream failure onto the user-facing message for its status.
pub fn translate_upstream_error(error: &RelayError) -> &'static str {
    match error.upstream_status() {
        Some(503) => "Serwer Google AI jest obecnie przeciążony. Spróbuj ponownie za chwilę.",
        Some(429) => "Przekroczono limit zapytań do Google AI. Spróbuj ponownie za kilka minut.",
        Some(400) => "Nieprawidłowe żądanie do Google AI. Sprawdź czy plik PDF jest poprawny.",
        Some(401) => "Błąd autoryzacji Google AI. Sprawdź klucz API.",
        Some(403) => "Brak uprawnień do Google AI. Sprawdź konfigurację API.",
        _ => "Wystąpił błąd podczas analizy PDF. Spróbuj ponownie.",
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            ServerError::NoFiles | ServerError::InvalidPdf(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: Some(false),
                    error: message,
                    original_error: None,
                },
            ),
            ServerError::MissingKey { status, .. } => (
                status,
                ErrorBody {
                    success: Some(false),
                    error: message,
                    original_error: None,
                },
            ),
            ServerError::Document(source) => {
                tracing::error!(error = %source, "document analysis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        success: Some(false),
                        error: message,
                        original_error: Some(source.to_string()),
                    },
                )
            }
            ServerError::Chat(source) => {
                tracing::error!(error = %source, "chat request failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    message,
                )
                    .into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}
