// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! CLI module for relaychat
//!
//! Handles command-line argument parsing and command dispatch.

pub mod args;
pub mod commands;
pub mod input;

pub use args::*;
