// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! End-to-end flows: terminal client -> relay -> scripted providers.

use std::sync::Arc;

use relaychat::attachment::Attachment;
use relaychat::client::RelayClient;
use relaychat::llm::message::{ChatMessage, Role};
use relaychat::llm::mock_provider::{MockConversationalProvider, MockDocumentProvider, MockOutcome};
use relaychat::llm::retry::RetryConfig;
use relaychat::llm::stream::ResponseEvent;
use relaychat::server::{build_router, AppState};
use relaychat::session::ChatSession;

async fn spawn_relay(
    conversation: MockConversationalProvider,
    documents: MockDocumentProvider,
) -> RelayClient {
    let state = AppState::new(
        Arc::new(conversation),
        Arc::new(documents),
        RetryConfig {
            max_attempts: 4,
            base_delay_ms: 1,
            max_jitter_ms: 0,
        },
    );
    let app = build_router(state, 20);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    RelayClient::new(format!("http://{}", addr))
}

#[tokio::test]
async fn test_streamed_answer_split_byte_by_byte() {
    let conversation = MockConversationalProvider::new()
        .with_deltas(&["Hel", "lo"])
        .with_chunk_size(1);
    let client = spawn_relay(conversation, MockDocumentProvider::new()).await;

    let mut session = ChatSession::new();
    let mut fragments = Vec::new();
    let outcome = client
        .submit(&mut session, "Przywitaj się", |event| {
            if let ResponseEvent::AppendText { text, .. } = event {
                fragments.push(text.clone());
            }
        })
        .await
        .unwrap();

    assert!(!outcome.is_failed());
    assert_eq!(fragments.concat(), "Hello");
    let answer = session.messages().last().unwrap();
    assert_eq!(answer.role, Role::Assistant);
    assert_eq!(answer.content, "Hello");
    assert!(answer.complete);
}

#[tokio::test]
async fn test_pdf_with_image_goes_to_document_provider() {
    let conversation = MockConversationalProvider::new();
    let documents = MockDocumentProvider::new().with_response("Faktura na 100 zł.");
    let client = spawn_relay(conversation.clone(), documents.clone()).await;

    let mut session = ChatSession::new();
    session.add_attachment(Attachment::from_bytes("skan.png", "image/png", &[0x89, 0x50]));
    session.add_attachment(Attachment::from_bytes("pdfA.pdf", "application/pdf", b"%PDF-A"));
    session.add_attachment(Attachment::from_bytes("pdfB.pdf", "application/pdf", b"%PDF-B"));

    let outcome = client.submit(&mut session, "Ile?", |_| {}).await.unwrap();

    assert!(!outcome.is_failed());
    assert_eq!(session.messages().last().unwrap().content, "Faktura na 100 zł.");
    assert_eq!(conversation.call_count(), 0);

    let recorded = documents.recorded_requests();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].file.name, "pdfA.pdf");
    assert_eq!(recorded[0].question.as_deref(), Some("Ile?"));
}

#[tokio::test]
async fn test_oversized_pdf_never_reaches_provider() {
    let documents = MockDocumentProvider::new();
    let client = spawn_relay(MockConversationalProvider::new(), documents.clone()).await;

    let mut session = ChatSession::new();
    let big = vec![0u8; 6 * 1024 * 1024];
    session.add_attachment(Attachment::from_bytes("duzy.pdf", "application/pdf", &big));

    let outcome = client.submit(&mut session, "", |_| {}).await.unwrap();

    assert!(outcome.is_failed());
    assert_eq!(
        session.messages().last().unwrap().content,
        "Nieprawidłowy plik PDF: Plik PDF nie może być większy niż 5MB"
    );
    assert_eq!(documents.call_count(), 0);
    assert!(session.pending_attachments().is_empty());
}

#[tokio::test]
async fn test_overload_then_success_is_transparent_to_client() {
    let documents = MockDocumentProvider::new().with_outcomes(vec![
        MockOutcome::Status(503),
        MockOutcome::Status(503),
        MockOutcome::Status(503),
        MockOutcome::Text("W końcu!".to_string()),
    ]);
    let client = spawn_relay(MockConversationalProvider::new(), documents.clone()).await;

    let mut session = ChatSession::new();
    session.add_attachment(Attachment::from_bytes("a.pdf", "application/pdf", b"%PDF"));
    let outcome = client.submit(&mut session, "", |_| {}).await.unwrap();

    assert!(!outcome.is_failed());
    assert_eq!(session.messages().last().unwrap().content, "W końcu!");
    assert_eq!(documents.call_count(), 4);
}

#[tokio::test]
async fn test_upstream_chat_failure_becomes_assistant_message() {
    let conversation =
        MockConversationalProvider::new().with_outcomes(vec![MockOutcome::Network]);
    let client = spawn_relay(conversation, MockDocumentProvider::new()).await;

    let mut session = ChatSession::new();
    let outcome = client.submit(&mut session, "Hej", |_| {}).await.unwrap();

    assert!(outcome.is_failed());
    let last = session.messages().last().unwrap();
    assert!(last.content.contains("Wystąpił błąd podczas przetwarzania żądania"));
    assert!(!session.is_busy());
}

#[tokio::test]
async fn test_clear_history_then_submit_matches_fresh_session() {
    let conversation = MockConversationalProvider::new().with_deltas(&["ok"]);
    let client = spawn_relay(conversation.clone(), MockDocumentProvider::new()).await;

    let mut session = ChatSession::new();
    for text in ["jeden", "dwa", "trzy"] {
        client.submit(&mut session, text, |_| {}).await.unwrap();
    }
    assert_eq!(session.len(), 6);

    session.clear_history();
    assert!(session.is_empty());

    client.submit(&mut session, "od nowa", |_| {}).await.unwrap();
    assert_eq!(session.len(), 2);

    let recorded = conversation.recorded_requests();
    assert_eq!(
        recorded.last().unwrap().messages,
        vec![ChatMessage::user("od nowa")]
    );
}
