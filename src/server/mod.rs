// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! HTTP relay
//!
//! Exposes the conversational and document-analysis endpoints in front of
//! the two upstream providers.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod validation;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::settings::{RuntimeConfig, ServerConfig};
use crate::error::{RelayError, Result};
use crate::llm::provider::{ConversationalProvider, DocumentProvider};
use crate::llm::providers::{GeminiProvider, OpenAiProvider};
use crate::llm::retry::RetryConfig;

pub use error::ServerError;
pub use routes::build_router;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<dyn ConversationalProvider>,
    pub documents: Arc<dyn DocumentProvider>,
    /// Applied around every document provider call
    pub retry: RetryConfig,
}

impl AppState {
    pub fn new(
        conversation: Arc<dyn ConversationalProvider>,
        documents: Arc<dyn DocumentProvider>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            conversation,
            documents,
            retry,
        }
    }

    /// Build the real adapters from resolved configuration.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            Arc::new(OpenAiProvider::new(&config.openai)),
            Arc::new(GeminiProvider::new(&config.google)),
            config.retry.clone(),
        )
    }
}

/// Open the listening socket. `bind` may be a hostname, an IPv4 address or
/// a bare IPv6 address.
pub async fn bind_listener(server: &ServerConfig) -> Result<TcpListener> {
    TcpListener::bind((server.bind.as_str(), server.port))
        .await
        .map_err(|e| {
            RelayError::Config(format!(
                "cannot listen on {} port {}: {}",
                server.bind, server.port, e
            ))
        })
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &RuntimeConfig) -> Result<()> {
    let listener = bind_listener(&config.server).await?;

    let state = AppState::from_config(config);
    tracing::info!(
        conversation = state.conversation.name(),
        conversation_configured = state.conversation.is_configured(),
        documents = state.documents.name(),
        documents_configured = state.documents.is_configured(),
        "providers ready"
    );

    let app = build_router(state, config.server.max_body_mb);

    tracing::info!("relay listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
