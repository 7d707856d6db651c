// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

use reqwest::Response;

use crate::error::{ApiError, RelayError};

/// Construct a classified API error from a non-success upstream response.
pub(crate) async fn error_from_response(response: Response) -> RelayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RelayError::Api(ApiError::from_status(status, body))
}
