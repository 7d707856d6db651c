// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Mock providers for testing
//!
//! Scripted implementations of both provider traits that record every
//! request and count calls, so relay behavior can be tested without
//! network access.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ApiError, RelayError, Result};
use crate::llm::provider::{ByteStream, ConversationalProvider, DocumentProvider};
use crate::llm::router::{ConversationRequest, DocumentRequest};

/// One scripted outcome of a provider call
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Succeed with this text (document) or these SSE frames (conversation)
    Text(String),
    /// Fail as if the upstream answered with this status
    Status(u16),
    /// Fail with a transport error
    Network,
}

impl MockOutcome {
    fn into_result(self) -> Result<String> {
        match self {
            MockOutcome::Text(text) => Ok(text),
            MockOutcome::Status(status) => Err(RelayError::Api(ApiError::from_status(
                status,
                format!("mock upstream status {}", status),
            ))),
            MockOutcome::Network => Err(RelayError::Api(ApiError::Network(
                "mock connection refused".to_string(),
            ))),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock provider lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Shared script: outcomes are returned in order, the last one repeats.
#[derive(Clone, Debug)]
struct Script<R> {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    call_count: Arc<AtomicUsize>,
    recorded: Arc<Mutex<Vec<R>>>,
}

impl<R: Clone> Script<R> {
    fn new(outcome: MockOutcome) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(vec![outcome])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set(&self, outcomes: Vec<MockOutcome>) {
        *lock(&self.outcomes) = outcomes;
    }

    fn next(&self, request: &R) -> MockOutcome {
        lock(&self.recorded).push(request.clone());
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let outcomes = lock(&self.outcomes);
        match outcomes.len() {
            0 => MockOutcome::Text(String::new()),
            len => outcomes[count.min(len - 1)].clone(),
        }
    }
}

/// Mock document provider
#[derive(Clone, Debug)]
pub struct MockDocumentProvider {
    script: Script<DocumentRequest>,
    configured: bool,
}

impl Default for MockDocumentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocumentProvider {
    pub fn new() -> Self {
        Self {
            script: Script::new(MockOutcome::Text("Mock analysis".to_string())),
            configured: true,
        }
    }

    /// Always answer with this text
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.script.set(vec![MockOutcome::Text(text.into())]);
        self
    }

    /// Answer with these outcomes in order
    pub fn with_outcomes(self, outcomes: Vec<MockOutcome>) -> Self {
        self.script.set(outcomes);
        self
    }

    /// Behave as if no credential was resolved
    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.script.call_count.load(Ordering::SeqCst)
    }

    pub fn recorded_requests(&self) -> Vec<DocumentRequest> {
        lock(&self.script.recorded).clone()
    }
}

#[async_trait]
impl DocumentProvider for MockDocumentProvider {
    fn name(&self) -> &str {
        "mock-document"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn analyze(&self, request: &DocumentRequest) -> Result<String> {
        self.script.next(request).into_result()
    }
}

/// Mock conversational provider
#[derive(Clone, Debug)]
pub struct MockConversationalProvider {
    script: Script<ConversationRequest>,
    configured: bool,
    chunk_size: usize,
}

impl Default for MockConversationalProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConversationalProvider {
    pub fn new() -> Self {
        Self {
            script: Script::new(MockOutcome::Text(sse_body(&["Mock", " response"]))),
            configured: true,
            chunk_size: 7,
        }
    }

    /// Stream these text deltas as standard delta-chunk frames
    pub fn with_deltas(self, deltas: &[&str]) -> Self {
        self.script.set(vec![MockOutcome::Text(sse_body(deltas))]);
        self
    }

    /// Answer with these outcomes in order
    pub fn with_outcomes(self, outcomes: Vec<MockOutcome>) -> Self {
        self.script.set(outcomes);
        self
    }

    /// Size of the byte chunks the body is split into
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.script.call_count.load(Ordering::SeqCst)
    }

    pub fn recorded_requests(&self) -> Vec<ConversationRequest> {
        lock(&self.script.recorded).clone()
    }
}

#[async_trait]
impl ConversationalProvider for MockConversationalProvider {
    fn name(&self) -> &str {
        "mock-conversation"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn stream_chat(&self, request: &ConversationRequest) -> Result<ByteStream> {
        let body = self.script.next(request).into_result()?;
        let chunks: Vec<Result<Bytes>> = body
            .as_bytes()
            .chunks(self.chunk_size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// Render text deltas as an OpenAI-style event stream ending in `[DONE]`.
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = serde_json::json!({
            "object": "chat.completion.chunk",
            "choices": [{"index": 0, "delta": {"content": delta}}]
        });
        body.push_str(&format!("data: {}\n\n", chunk));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
