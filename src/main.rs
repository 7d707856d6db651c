// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! relaychat - chat relay for conversational and document-analysis models
//!
//! Entry point for the relaychat CLI application.

use clap::Parser;

use relaychat::cli::commands::{run_ask, run_chat, run_serve};
use relaychat::cli::{ChatArgs, Cli, Commands};
use relaychat::config::Settings;
use relaychat::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing. `RUST_LOG` still takes precedence.
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // The relay logs requests by default; the terminal client stays quiet.
    let serving = matches!(cli.command, Some(Commands::Serve(_)));
    let directives: &[&str] = match cli.verbose {
        0 if serving => &["relaychat=info", "tower_http=info"],
        0 => &[],
        1 => &["relaychat=debug", "tower_http=debug"],
        _ => &["relaychat=trace", "tower_http=trace"],
    };
    for directive in directives {
        if let Ok(parsed) = directive.parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Load settings
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Some(Commands::Serve(args)) => run_serve(args, settings).await?,
        Some(Commands::Ask(args)) => run_ask(args, settings).await?,
        Some(Commands::Chat(args)) => run_chat(args, settings).await?,
        None => run_chat(ChatArgs::default(), settings).await?,
    }

    Ok(())
}
