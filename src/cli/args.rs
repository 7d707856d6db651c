// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! CLI argument definitions using Clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// relaychat - chat relay for conversational and document-analysis models
#[derive(Parser, Debug)]
#[command(name = "relaychat")]
#[command(version, about = "Chat relay for conversational and document-analysis models")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP relay
    Serve(ServeArgs),

    /// Send one message through a running relay
    Ask(AskArgs),

    /// Interactive session against a running relay (default)
    Chat(ChatArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides settings)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides settings)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub struct AskArgs {
    /// Files to attach
    #[arg(short = 'a', long = "attach")]
    pub attachments: Vec<PathBuf>,

    /// Relay URL (overrides settings)
    #[arg(long)]
    pub server: Option<String>,

    /// Message text; may be empty when a file is attached
    #[arg(trailing_var_arg = true)]
    pub text: Vec<String>,
}

impl AskArgs {
    pub fn message(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Relay URL (overrides settings)
    #[arg(long)]
    pub server: Option<String>,
}
