// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Input parsing for the interactive session
//!
//! Pure functions, no side effects.

use std::path::PathBuf;

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Send the text with any pending attachments
    Submit(String),
    /// Queue a file for the next message
    Attach(PathBuf),
    /// Drop a queued file by its 1-based position
    Detach(usize),
    /// List queued files
    Attachments,
    Clear,
    Help,
    Quit,
    /// Slash command that could not be parsed
    Invalid(String),
}

/// Classify one input line.
pub fn parse_input(line: &str) -> InputCommand {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return InputCommand::Submit(trimmed.to_string());
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command.to_lowercase().as_str() {
        "/quit" | "/exit" => InputCommand::Quit,
        "/clear" => InputCommand::Clear,
        "/help" => InputCommand::Help,
        "/files" => InputCommand::Attachments,
        "/attach" if !rest.is_empty() => InputCommand::Attach(PathBuf::from(rest)),
        "/attach" => InputCommand::Invalid("usage: /attach <path>".to_string()),
        "/detach" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => InputCommand::Detach(n),
            _ => InputCommand::Invalid("usage: /detach <n> (1-based)".to_string()),
        },
        other => InputCommand::Invalid(format!("unknown command: {}", other)),
    }
}
