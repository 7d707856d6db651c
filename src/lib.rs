// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! relaychat - chat relay for conversational and document-analysis models.
//!
//! This crate exposes the shared runtime used by:
//! - the HTTP relay (`relaychat serve`)
//! - the terminal client (`relaychat ask`, `relaychat chat`)
//!
//! Architecture highlights:
//! - `llm`: wire types, provider routing, upstream adapters, retry, stream normalization
//! - `server`: axum endpoints in front of the two providers
//! - `session`, `attachment`, `client`: client-side conversation state and submit flow
//! - `config`: layered settings resolved once at start-up

pub mod attachment;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;

pub use error::{RelayError, Result};
