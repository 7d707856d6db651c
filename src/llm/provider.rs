// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Provider traits
//!
//! The relay talks to upstream services only through these two traits.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::Result;
use crate::llm::router::{ConversationRequest, DocumentRequest};

/// Raw response bytes from an upstream provider
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Upstream service for chat and image description, answering with a
/// server-sent-event token stream
#[async_trait]
pub trait ConversationalProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Whether a credential was resolved at start-up
    fn is_configured(&self) -> bool;

    /// Send the request with streaming enabled and return the raw event
    /// stream. Fails on any non-success status; never retried.
    async fn stream_chat(&self, request: &ConversationRequest) -> Result<ByteStream>;
}

/// Upstream service for single-document analysis, answering with one text
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Whether a credential was resolved at start-up
    fn is_configured(&self) -> bool;

    /// One analysis attempt. Callers wrap this in the retry policy.
    async fn analyze(&self, request: &DocumentRequest) -> Result<String>;
}
