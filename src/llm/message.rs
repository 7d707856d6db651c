// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Message types exchanged between the client and the relay
//!
//! These are the JSON bodies of `POST /api/chat` and `POST /api/analyze-pdf`.

use serde::{Deserialize, Serialize};

/// Media type that always takes the document path
pub const PDF_MIME: &str = "application/pdf";

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// System prompt
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A role-tagged text message in a chat request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// An encoded attachment as transported to the relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireAttachment {
    #[serde(default)]
    pub name: String,
    /// Declared media type
    #[serde(rename = "type", default)]
    pub mime_type: String,
    /// Size of the original file in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Base64 payload, optionally prefixed with `data:<mime>;base64,`
    #[serde(default)]
    pub data: String,
}

impl WireAttachment {
    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub attachments: Vec<WireAttachment>,
}

impl ChatRequest {
    /// Text of the most recent user message, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// How the document provider should treat the document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Describe the whole document
    #[default]
    Detailed,
    /// Answer the user's question about the document
    Qa,
}

impl AnalysisType {
    /// Q&A when the user typed something, detailed description otherwise.
    pub fn for_question(question: Option<&str>) -> Self {
        match question {
            Some(q) if !q.trim().is_empty() => AnalysisType::Qa,
            _ => AnalysisType::Detailed,
        }
    }
}

/// Body of `POST /api/analyze-pdf`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePdfRequest {
    #[serde(default)]
    pub files: Vec<WireAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub analysis_type: AnalysisType,
}
