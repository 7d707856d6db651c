// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

use crate::error::{RelayError, Result};
use crate::llm::retry::RetryConfig;

use super::{ServerConfig, Settings};

/// Settings with credentials resolved, built once at start-up and shared by
/// the provider adapters.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub server: ServerConfig,
    pub openai: OpenAiRuntime,
    pub google: GoogleRuntime,
    pub retry: RetryConfig,
}

/// Resolved conversational provider settings
#[derive(Debug, Clone)]
pub struct OpenAiRuntime {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Resolved document provider settings
#[derive(Debug, Clone)]
pub struct GoogleRuntime {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Settings {
    /// Reject values that would make the relay unusable.
    pub fn validate(&self) -> Result<()> {
        if self.resilience.max_attempts == 0 {
            return Err(RelayError::Config(
                "resilience.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.server.max_body_mb == 0 {
            return Err(RelayError::Config(
                "server.max_body_mb must be at least 1".to_string(),
            ));
        }
        if self.providers.openai.base_url.trim().is_empty()
            || self.providers.google.base_url.trim().is_empty()
        {
            return Err(RelayError::Config(
                "provider base_url must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve credentials from the process environment.
    pub fn resolve(&self) -> RuntimeConfig {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve credentials using the given variable lookup.
    ///
    /// Priority: env var chain > config file. Empty values count as unset.
    pub fn resolve_with<F>(&self, lookup: F) -> RuntimeConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let openai = &self.providers.openai;
        let openai_key = non_empty(lookup(&openai.api_key_env))
            .or_else(|| non_empty(openai.api_key.clone()));

        let google = &self.providers.google;
        let google_key = google
            .api_key_envs
            .iter()
            .find_map(|name| non_empty(lookup(name)))
            .or_else(|| non_empty(google.api_key.clone()));

        tracing::info!(
            openai_key = openai_key.is_some(),
            google_key = google_key.is_some(),
            "resolved provider credentials"
        );

        RuntimeConfig {
            server: self.server.clone(),
            openai: OpenAiRuntime {
                api_key: openai_key,
                base_url: openai.base_url.clone(),
                model: openai.model.clone(),
                temperature: openai.temperature,
                max_tokens: openai.max_tokens,
            },
            google: GoogleRuntime {
                api_key: google_key,
                base_url: google.base_url.clone(),
                model: google.model.clone(),
                temperature: google.temperature,
                max_output_tokens: google.max_output_tokens,
            },
            retry: RetryConfig::from(&self.resilience),
        }
    }
}
