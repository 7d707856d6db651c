// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Error types for relaychat
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for relaychat operations
#[derive(Error, Debug)]
pub enum RelayError {
    /// Upstream provider errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Request payload failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// An attachment could not be read or encoded
    #[error("Attachment error ({name}): {message}")]
    Attachment { name: String, message: String },

    /// Chat session state errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Upstream provider error taxonomy
#[derive(Error, Debug)]
pub enum ApiError {
    /// Provider is temporarily overloaded (503)
    #[error("Service overloaded (503): {0}")]
    Overloaded(String),

    /// Rate limited by the provider (429)
    #[error("Rate limited (429): {0}")]
    RateLimited(String),

    /// Provider rejected the request body (400)
    #[error("Bad request (400): {0}")]
    BadRequest(String),

    /// Invalid or unauthorized API key (401/403)
    #[error("Authentication failed ({status})")]
    AuthenticationFailed { status: u16 },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamError(String),
}

impl ApiError {
    /// Classify a non-success upstream response by its status code.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            503 => ApiError::Overloaded(body),
            429 => ApiError::RateLimited(body),
            400 => ApiError::BadRequest(body),
            401 | 403 => ApiError::AuthenticationFailed { status },
            _ => ApiError::ServerError {
                status,
                message: body,
            },
        }
    }

    /// The upstream HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Overloaded(_) => Some(503),
            ApiError::RateLimited(_) => Some(429),
            ApiError::BadRequest(_) => Some(400),
            ApiError::AuthenticationFailed { status } => Some(*status),
            ApiError::ServerError { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::InvalidResponse(_) | ApiError::StreamError(_) => {
                None
            }
        }
    }
}

impl RelayError {
    /// The upstream HTTP status behind this error, if it came from a provider.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            RelayError::Api(api) => api.status(),
            RelayError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Chat session state errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A submit is already in flight
    #[error("a message is already being processed")]
    Busy,

    /// Nothing to send
    #[error("message is empty and has no attachments")]
    EmptySubmit,

    /// Attachment index out of range
    #[error("no pending attachment at index {0}")]
    NoSuchAttachment(usize),
}

/// Result type alias for relaychat operations
pub type Result<T> = std::result::Result<T, RelayError>;
