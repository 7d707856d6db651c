// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! PDF upload validation
//!
//! Runs before any upstream call. Every failed rule contributes one message;
//! the caller joins them into a single response.

use crate::attachment::strip_data_url_prefix;
use crate::llm::message::{WireAttachment, PDF_MIME};

/// Largest PDF accepted for analysis
pub const MAX_PDF_BYTES: u64 = 5 * 1024 * 1024;

pub const NAME_REQUIRED: &str = "Nazwa pliku jest wymagana";
pub const MUST_BE_PDF: &str = "Plik musi być w formacie PDF";
pub const TOO_LARGE: &str = "Plik PDF nie może być większy niż 5MB";
pub const DATA_REQUIRED: &str = "Dane pliku są wymagane";

/// Check one file. Returns every violated rule in field order.
pub fn validate_pdf(file: &WireAttachment) -> Vec<&'static str> {
    let mut errors = Vec::new();

    if file.name.is_empty() {
        errors.push(NAME_REQUIRED);
    }
    if file.mime_type != PDF_MIME {
        errors.push(MUST_BE_PDF);
    }
    if effective_size(file) > MAX_PDF_BYTES {
        errors.push(TOO_LARGE);
    }
    if strip_data_url_prefix(&file.data).is_empty() {
        errors.push(DATA_REQUIRED);
    }

    errors
}

/// Declared size, or the decoded length of the payload when none was sent.
fn effective_size(file: &WireAttachment) -> u64 {
    file.size.unwrap_or_else(|| {
        let raw = strip_data_url_prefix(&file.data).trim_end_matches('=');
        (raw.len() as u64) * 3 / 4
    })
}
