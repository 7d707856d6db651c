// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Configuration module for relaychat
//!
//! Handles loading, saving, and resolving relay settings.

pub mod settings;

pub use settings::*;
