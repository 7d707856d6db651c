// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Attachment encoding
//!
//! Turns user-selected files into base64 payloads with a declared media type.
//! The category is fixed when the attachment is created; the payload arrives
//! later, once the file has been read.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RelayError, Result};
use crate::llm::message::WireAttachment;

/// Coarse attachment kind, derived from the media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentCategory {
    Image,
    Document,
}

impl AttachmentCategory {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            AttachmentCategory::Image
        } else {
            AttachmentCategory::Document
        }
    }
}

/// Encoding progress of an attachment's payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadState {
    /// Not read yet
    Pending,
    /// `data:<mime>;base64,<payload>`
    Ready(String),
    /// The file could not be read
    Failed(String),
}

/// A user-supplied file attached to an outgoing message
#[derive(Debug, Clone)]
pub struct Attachment {
    source: PathBuf,
    mime_type: String,
    display_name: String,
    size: Option<u64>,
    category: AttachmentCategory,
    payload: PayloadState,
}

impl Attachment {
    /// Create a pending attachment for a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            source: path.to_path_buf(),
            category: AttachmentCategory::from_mime(&mime_type),
            mime_type,
            display_name,
            size: None,
            payload: PayloadState::Pending,
        }
    }

    /// Create an already-encoded attachment from in-memory bytes.
    pub fn from_bytes(
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: &[u8],
    ) -> Self {
        let display_name = display_name.into();
        let mime_type = mime_type.into();
        Self {
            source: PathBuf::from(&display_name),
            category: AttachmentCategory::from_mime(&mime_type),
            payload: PayloadState::Ready(to_data_url(&mime_type, bytes)),
            size: Some(bytes.len() as u64),
            mime_type,
            display_name,
        }
    }

    /// Override the guessed media type. The category is not recomputed.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read the file and populate the payload. A read failure leaves the
    /// attachment in [`PayloadState::Failed`] and is also returned.
    pub async fn encode(&mut self) -> Result<()> {
        match tokio::fs::read(&self.source).await {
            Ok(bytes) => {
                self.size = Some(bytes.len() as u64);
                self.payload = PayloadState::Ready(to_data_url(&self.mime_type, &bytes));
                tracing::debug!(
                    name = %self.display_name,
                    mime = %self.mime_type,
                    bytes = bytes.len(),
                    "encoded attachment"
                );
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(name = %self.display_name, error = %message, "failed to read attachment");
                self.payload = PayloadState::Failed(message.clone());
                Err(RelayError::Attachment {
                    name: self.display_name.clone(),
                    message,
                })
            }
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn category(&self) -> AttachmentCategory {
        self.category
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn payload(&self) -> &PayloadState {
        &self.payload
    }

    /// The encoded payload, absent until encoding completes.
    pub fn encoded_payload(&self) -> Option<&str> {
        match &self.payload {
            PayloadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == crate::llm::message::PDF_MIME
    }

    /// Transport shape. `None` while the payload is pending or failed.
    pub fn to_wire(&self) -> Option<WireAttachment> {
        self.encoded_payload().map(|data| WireAttachment {
            name: self.display_name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            data: data.to_string(),
        })
    }
}

/// Encode several files concurrently. Results keep the selection order
/// regardless of which read finishes first.
pub async fn encode_all<P: AsRef<Path>>(paths: &[P]) -> Vec<Attachment> {
    let tasks = paths.iter().map(|path| async move {
        let mut attachment = Attachment::from_path(path);
        // Failure is recorded in the attachment's payload state.
        let _ = attachment.encode().await;
        attachment
    });
    join_all(tasks).await
}

fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(bytes))
}

/// Drop a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, raw)) => raw,
        None => payload,
    }
}

/// Decode a payload with or without a data URL prefix.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(strip_data_url_prefix(payload).trim())
        .map_err(|e| RelayError::Validation(format!("invalid base64 payload: {}", e)))
}
