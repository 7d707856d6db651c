// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Settings management for relaychat
//!
//! Handles loading and saving settings from ~/.relaychat/settings.json.
//! Credentials are resolved once into a [`RuntimeConfig`] at start-up.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod io;
mod validation;

pub use validation::{GoogleRuntime, OpenAiRuntime, RuntimeConfig};

/// Main settings structure, stored in ~/.relaychat/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP relay settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream provider configurations
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Retry settings for the document provider
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Settings for the terminal client
    #[serde(default)]
    pub client: ClientConfig,
}

/// HTTP relay listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum request body size in megabytes
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_body_mb: default_max_body_mb(),
        }
    }
}

/// Configuration for the two upstream providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Conversational provider (chat completions, streamed)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Document provider (PDF analysis, buffered)
    #[serde(default)]
    pub google: GoogleConfig,
}

/// OpenAI-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    /// Chat completions endpoint
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_openai_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            temperature: default_temperature(),
            max_tokens: default_openai_max_tokens(),
        }
    }
}

/// Google Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable names checked in order for the API key
    #[serde(default = "default_google_api_key_envs")]
    pub api_key_envs: Vec<String>,

    /// Models endpoint (the model id and `:generateContent` are appended)
    #[serde(default = "default_google_base_url")]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_google_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output tokens
    #[serde(default = "default_google_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_envs: default_google_api_key_envs(),
            base_url: default_google_base_url(),
            model: default_google_model(),
            temperature: default_temperature(),
            max_output_tokens: default_google_max_output_tokens(),
        }
    }
}

/// Retry configuration for the document provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Total number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds for exponential backoff
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to every delay
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

/// Terminal client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of a running relay
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

// Default value functions
fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_mb() -> usize {
    20
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_google_api_key_envs() -> Vec<String> {
    vec![
        "GOOGLE_GENERATIVE_AI_API_KEY".to_string(),
        "GOOGLE_API_KEY".to_string(),
        "GEMINI_API_KEY".to_string(),
    ]
}

fn default_google_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_google_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_google_max_output_tokens() -> u32 {
    2000
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_jitter_ms() -> u64 {
    1000
}

fn default_server_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn relaychat_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relaychat")
}
