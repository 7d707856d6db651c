// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! LLM module for relaychat
//!
//! Wire types, routing, upstream adapters, retry and response normalization.

pub mod message;
#[cfg(any(test, feature = "test-util"))]
pub mod mock_provider;
pub mod provider;
pub mod providers;
pub mod retry;
pub mod router;
pub mod stream;

pub use message::*;
pub use provider::*;
pub use router::{route, ConversationRequest, DocumentRequest, Route};
pub use stream::{normalize_buffered, normalize_stream, ResponseEvent};
