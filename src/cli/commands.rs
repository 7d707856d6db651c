// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Subcommand implementations

use std::io::{self, BufRead, Write};

use crate::attachment::{encode_all, Attachment, PayloadState};
use crate::cli::args::{AskArgs, ChatArgs, ServeArgs};
use crate::cli::input::{parse_input, InputCommand};
use crate::client::RelayClient;
use crate::config::Settings;
use crate::error::Result;
use crate::llm::stream::ResponseEvent;
use crate::server;
use crate::session::ChatSession;

/// `relaychat serve`
pub async fn run_serve(args: ServeArgs, mut settings: Settings) -> Result<()> {
    if let Some(bind) = args.bind {
        settings.server.bind = bind;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    settings.validate()?;

    let config = settings.resolve();
    server::serve(&config).await
}

/// `relaychat ask`
pub async fn run_ask(args: AskArgs, settings: Settings) -> Result<()> {
    let client = RelayClient::new(
        args.server
            .clone()
            .unwrap_or_else(|| settings.client.server_url.clone()),
    );
    let mut session = ChatSession::new();

    for attachment in encode_all(&args.attachments).await {
        report_failed(&attachment);
        session.add_attachment(attachment);
    }

    let outcome = client
        .submit(&mut session, &args.message(), print_event)
        .await?;

    if outcome.is_failed() {
        if let Some(message) = session.messages().last() {
            eprintln!("{}", message.content);
        }
    }
    Ok(())
}

/// `relaychat chat`
pub async fn run_chat(args: ChatArgs, settings: Settings) -> Result<()> {
    let client = RelayClient::new(
        args.server
            .unwrap_or_else(|| settings.client.server_url.clone()),
    );
    let mut session = ChatSession::new();

    println!("relaychat -> {}", client.base_url());
    println!("Type /help for commands.\n");

    let stdin = io::stdin();
    loop {
        print!("you: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            InputCommand::Quit => break,
            InputCommand::Help => print_help(),
            InputCommand::Clear => {
                session.clear_history();
                println!("History cleared.");
            }
            InputCommand::Attach(path) => {
                let mut attachment = Attachment::from_path(&path);
                // Failure stays visible in the attachment list
                let _ = attachment.encode().await;
                report_failed(&attachment);
                session.add_attachment(attachment);
                print_attachments(&session);
            }
            InputCommand::Detach(n) => match session.remove_attachment(n - 1) {
                Ok(removed) => println!("Removed {}", removed.display_name()),
                Err(e) => println!("{}", e),
            },
            InputCommand::Attachments => print_attachments(&session),
            InputCommand::Invalid(message) => println!("{}", message),
            InputCommand::Submit(text) => {
                if text.is_empty() && session.pending_attachments().is_empty() {
                    continue;
                }
                print!("\nassistant: ");
                io::stdout().flush()?;

                match client.submit(&mut session, &text, print_event).await {
                    Ok(outcome) if outcome.is_failed() => {
                        if let Some(message) = session.messages().last() {
                            println!("{}", message.content);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => println!("{}", e),
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_event(event: &ResponseEvent) {
    match event {
        ResponseEvent::AppendText { text, .. } => {
            print!("{}", text);
            let _ = io::stdout().flush();
        }
        ResponseEvent::Complete { .. } => println!(),
    }
}

fn report_failed(attachment: &Attachment) {
    if let PayloadState::Failed(reason) = attachment.payload() {
        eprintln!(
            "warning: could not read {}: {}",
            attachment.display_name(),
            reason
        );
    }
}

fn print_attachments(session: &ChatSession) {
    let pending = session.pending_attachments();
    if pending.is_empty() {
        println!("No attachments.");
        return;
    }
    for (i, attachment) in pending.iter().enumerate() {
        let state = match attachment.payload() {
            PayloadState::Pending => "pending",
            PayloadState::Ready(_) => "ready",
            PayloadState::Failed(_) => "failed",
        };
        println!(
            "  {}. {} ({}, {:?}, {})",
            i + 1,
            attachment.display_name(),
            attachment.mime_type(),
            attachment.category(),
            state
        );
    }
}

fn print_help() {
    println!("Commands:");
    println!("  /attach <path>  attach a file to the next message");
    println!("  /detach <n>     remove attachment n");
    println!("  /files          list attachments");
    println!("  /clear          clear the conversation");
    println!("  /quit           exit");
}
