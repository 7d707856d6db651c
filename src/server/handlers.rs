// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Relay request handlers

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::llm::message::{AnalyzePdfRequest, ChatRequest};
use crate::llm::provider::ByteStream;
use crate::llm::retry::with_retry;
use crate::llm::router::{route, DocumentRequest, Route};
use crate::server::error::{ServerError, MISSING_GOOGLE_KEY, MISSING_OPENAI_KEY};
use crate::server::validation::validate_pdf;
use crate::server::AppState;

/// Health check
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/analyze-pdf`: analyze the first file of the request.
pub async fn analyze_pdf(
    State(state): State<AppState>,
    Json(body): Json<AnalyzePdfRequest>,
) -> Result<Response, ServerError> {
    let file_count = body.files.len();
    let file = body.files.into_iter().next().ok_or(ServerError::NoFiles)?;
    if file_count > 1 {
        tracing::debug!(ignored = file_count - 1, "only the first file is analyzed");
    }

    let request = DocumentRequest {
        file,
        question: body.question,
        analysis_type: body.analysis_type,
    };

    let text = run_document(&state, request, StatusCode::INTERNAL_SERVER_ERROR).await?;
    Ok(plain_text(text))
}

/// `POST /api/chat`: route the request and answer from the chosen provider.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Response, ServerError> {
    tracing::debug!(
        messages = body.messages.len(),
        attachments = body.attachments.len(),
        "chat request received"
    );

    match route(&body) {
        Route::Document(request) => {
            let text = run_document(&state, request, StatusCode::BAD_REQUEST).await?;
            Ok(plain_text(text))
        }
        Route::Conversational(request) => {
            if !state.conversation.is_configured() {
                return Err(ServerError::MissingKey {
                    message: MISSING_OPENAI_KEY,
                    status: StatusCode::BAD_REQUEST,
                });
            }

            let stream = state
                .conversation
                .stream_chat(&request)
                .await
                .map_err(ServerError::Chat)?;
            Ok(event_stream(stream))
        }
    }
}

/// Validate, then call the document provider under the retry policy.
async fn run_document(
    state: &AppState,
    request: DocumentRequest,
    missing_key_status: StatusCode,
) -> Result<String, ServerError> {
    let violations = validate_pdf(&request.file);
    if !violations.is_empty() {
        tracing::warn!(file = %request.file.name, ?violations, "rejected invalid PDF");
        return Err(ServerError::InvalidPdf(violations));
    }

    if !state.documents.is_configured() {
        return Err(ServerError::MissingKey {
            message: MISSING_GOOGLE_KEY,
            status: missing_key_status,
        });
    }

    tracing::info!(
        file = %request.file.name,
        size = ?request.file.size,
        analysis = ?request.analysis_type,
        "analyzing document"
    );

    let documents = Arc::clone(&state.documents);
    with_retry(
        || {
            let documents = Arc::clone(&documents);
            let request = request.clone();
            async move { documents.analyze(&request).await }
        },
        Some(state.retry.clone()),
        "analyze_pdf",
    )
    .await
    .map_err(ServerError::Document)
}

fn plain_text(text: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response()
}

/// Pass the upstream event stream through unmodified.
fn event_stream(stream: ByteStream) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::message::{ChatMessage, WireAttachment, PDF_MIME};
    use crate::llm::mock_provider::{
        sse_body, MockConversationalProvider, MockDocumentProvider, MockOutcome,
    };
    use crate::llm::retry::RetryConfig;
    use crate::server::build_router;
    use axum::http::Request;
    use tower::ServiceExt;

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 4,
            base_delay_ms: 1,
            max_jitter_ms: 0,
        }
    }

    fn app(
        conversation: MockConversationalProvider,
        documents: MockDocumentProvider,
    ) -> axum::Router {
        build_router(
            AppState::new(Arc::new(conversation), Arc::new(documents), fast_retry()),
            20,
        )
    }

    fn pdf(size: u64) -> WireAttachment {
        WireAttachment {
            name: "raport.pdf".to_string(),
            mime_type: PDF_MIME.to_string(),
            size: Some(size),
            data: "data:application/pdf;base64,JVBERi0xLjQ=".to_string(),
        }
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Default::default(), Default::default())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_analyze_pdf_success_is_plain_text() {
        let documents = MockDocumentProvider::new().with_response("Dokument opisuje umowę.");
        let response = app(Default::default(), documents.clone())
            .oneshot(post(
                "/api/analyze-pdf",
                json!({"files": [pdf(1024)], "question": "Kto podpisał?", "analysisType": "qa"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Dokument opisuje umowę.");

        let recorded = documents.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].question.as_deref(), Some("Kto podpisał?"));
    }

    #[tokio::test]
    async fn test_analyze_pdf_no_files() {
        let documents = MockDocumentProvider::new();
        let response = app(Default::default(), documents.clone())
            .oneshot(post("/api/analyze-pdf", json!({"files": []})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Brak plików PDF do analizy");
        assert_eq!(documents.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_pdf_rejected_before_upstream() {
        let documents = MockDocumentProvider::new();
        let response = app(Default::default(), documents.clone())
            .oneshot(post(
                "/api/analyze-pdf",
                json!({"files": [pdf(6 * 1024 * 1024)], "analysisType": "detailed"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Nieprawidłowy plik PDF: Plik PDF nie może być większy niż 5MB"
        );
        assert_eq!(documents.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_pdf_missing_key() {
        let documents = MockDocumentProvider::new().unconfigured();
        let response = app(Default::default(), documents.clone())
            .oneshot(post("/api/analyze-pdf", json!({"files": [pdf(10)]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Brak klucza Google AI API"));
        assert_eq!(documents.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_pdf_retries_overload_then_succeeds() {
        let documents = MockDocumentProvider::new().with_outcomes(vec![
            MockOutcome::Status(503),
            MockOutcome::Status(503),
            MockOutcome::Text("Gotowe".to_string()),
        ]);
        let response = app(Default::default(), documents.clone())
            .oneshot(post("/api/analyze-pdf", json!({"files": [pdf(10)]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Gotowe");
        assert_eq!(documents.call_count(), 3);
    }

    #[tokio::test]
    async fn test_analyze_pdf_auth_failure_single_attempt() {
        let documents = MockDocumentProvider::new().with_outcomes(vec![MockOutcome::Status(401)]);
        let response = app(Default::default(), documents.clone())
            .oneshot(post("/api/analyze-pdf", json!({"files": [pdf(10)]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Błąd autoryzacji Google AI. Sprawdź klucz API.");
        assert!(body["originalError"].as_str().unwrap().contains("401"));
        assert_eq!(documents.call_count(), 1);
    }

    #[tokio::test]
    async fn test_analyze_pdf_overload_exhausted() {
        let documents = MockDocumentProvider::new().with_outcomes(vec![MockOutcome::Status(503)]);
        let response = app(Default::default(), documents.clone())
            .oneshot(post("/api/analyze-pdf", json!({"files": [pdf(10)]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("przeciążony"));
        assert_eq!(documents.call_count(), 4);
    }

    #[tokio::test]
    async fn test_chat_streams_upstream_bytes_unmodified() {
        let conversation = MockConversationalProvider::new()
            .with_deltas(&["Dzień", " dobry"])
            .with_chunk_size(5);
        let response = app(conversation.clone(), Default::default())
            .oneshot(post(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": "Cześć"}], "attachments": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(body_text(response).await, sse_body(&["Dzień", " dobry"]));

        let recorded = conversation.recorded_requests();
        assert_eq!(recorded[0].messages, vec![ChatMessage::user("Cześć")]);
    }

    #[tokio::test]
    async fn test_chat_with_pdf_takes_document_path() {
        let conversation = MockConversationalProvider::new();
        let documents = MockDocumentProvider::new().with_response("Analiza");
        let image = WireAttachment {
            name: "a.png".to_string(),
            mime_type: "image/png".to_string(),
            size: None,
            data: "data:image/png;base64,AAAA".to_string(),
        };
        let mut second = pdf(10);
        second.name = "drugi.pdf".to_string();

        let response = app(conversation.clone(), documents.clone())
            .oneshot(post(
                "/api/chat",
                json!({
                    "messages": [{"role": "user", "content": "Streść"}],
                    "attachments": [image, pdf(10), second]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "Analiza");
        assert_eq!(conversation.call_count(), 0);

        let recorded = documents.recorded_requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].file.name, "raport.pdf");
        assert_eq!(recorded[0].question.as_deref(), Some("Streść"));
    }

    fn chat_with_pdf(file: WireAttachment) -> Request<Body> {
        post(
            "/api/chat",
            json!({
                "messages": [{"role": "user", "content": "Co to za dokument?"}],
                "attachments": [file]
            }),
        )
    }

    #[tokio::test]
    async fn test_chat_oversized_pdf_rejected_before_upstream() {
        let documents = MockDocumentProvider::new().with_response("nie powinno dojść");
        let response = app(Default::default(), documents.clone())
            .oneshot(chat_with_pdf(pdf(6 * 1024 * 1024)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Nieprawidłowy plik PDF: Plik PDF nie może być większy niż 5MB"
        );
        assert_eq!(documents.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_pdf_retries_overload_then_succeeds() {
        let documents = MockDocumentProvider::new().with_outcomes(vec![
            MockOutcome::Status(503),
            MockOutcome::Text("Umowa najmu".to_string()),
        ]);
        let response = app(Default::default(), documents.clone())
            .oneshot(chat_with_pdf(pdf(10)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Umowa najmu");
        assert_eq!(documents.call_count(), 2);
    }

    #[tokio::test]
    async fn test_chat_pdf_auth_failure_is_translated() {
        let documents = MockDocumentProvider::new().with_outcomes(vec![MockOutcome::Status(401)]);
        let response = app(Default::default(), documents.clone())
            .oneshot(chat_with_pdf(pdf(10)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Błąd autoryzacji Google AI. Sprawdź klucz API.");
        assert!(body["originalError"].as_str().unwrap().contains("401"));
        assert_eq!(documents.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_missing_openai_key() {
        let conversation = MockConversationalProvider::new().unconfigured();
        let response = app(conversation.clone(), Default::default())
            .oneshot(post(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": "x"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .starts_with("Brak klucza OpenAI API"));
        assert_eq!(conversation.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_pdf_missing_google_key_is_bad_request() {
        let documents = MockDocumentProvider::new().unconfigured();
        let response = app(Default::default(), documents)
            .oneshot(post(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": ""}], "attachments": [pdf(10)]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_upstream_failure_is_not_retried() {
        let conversation =
            MockConversationalProvider::new().with_outcomes(vec![MockOutcome::Status(503)]);
        let response = app(conversation.clone(), Default::default())
            .oneshot(post(
                "/api/chat",
                json!({"messages": [{"role": "user", "content": "x"}]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "Wystąpił błąd podczas przetwarzania żądania"
        );
        assert_eq!(conversation.call_count(), 1);
    }
}
