// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Provider routing
//!
//! Decides which upstream provider handles a chat request. Any PDF sends the
//! request down the document path with only the first PDF; everything else
//! goes to the conversational provider. Both HTTP endpoints and the client
//! use this one function.

use crate::llm::message::{
    AnalysisType, AnalyzePdfRequest, ChatMessage, ChatRequest, WireAttachment,
};

/// A single-document analysis request
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub file: WireAttachment,
    pub question: Option<String>,
    pub analysis_type: AnalysisType,
}

impl DocumentRequest {
    /// Body for the dedicated document endpoint.
    pub fn to_analyze_request(&self) -> AnalyzePdfRequest {
        AnalyzePdfRequest {
            files: vec![self.file.clone()],
            question: self.question.clone(),
            analysis_type: self.analysis_type,
        }
    }
}

/// A conversational request with inline images
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    pub messages: Vec<ChatMessage>,
    pub attachments: Vec<WireAttachment>,
}

/// The provider path selected for a request
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Document(DocumentRequest),
    Conversational(ConversationRequest),
}

impl Route {
    pub fn is_document(&self) -> bool {
        matches!(self, Route::Document(_))
    }
}

/// Select the provider for a request. Pure and deterministic.
pub fn route(request: &ChatRequest) -> Route {
    if let Some(pdf) = request.attachments.iter().find(|a| a.is_pdf()) {
        let question = request
            .last_user_text()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string);
        let analysis_type = AnalysisType::for_question(question.as_deref());

        return Route::Document(DocumentRequest {
            file: pdf.clone(),
            question,
            analysis_type,
        });
    }

    Route::Conversational(ConversationRequest {
        messages: request.messages.clone(),
        attachments: request.attachments.clone(),
    })
}
