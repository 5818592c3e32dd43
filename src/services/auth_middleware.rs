// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Bearer token helpers for Axum.

use crate::models::link::MessageResponse;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

/// Auth error responses.
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    NotConfigured,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid API token"),
            AuthError::NotConfigured => {
                warn!("request to a protected route while no API token is configured");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Authentication is not configured",
                )
            }
        };
        let body = MessageResponse {
            success: false,
            message: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
