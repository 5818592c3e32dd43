// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, bearer token extraction, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::version::VersionResponse;
use crate::routes::{links_router, LinksApiDoc};
use crate::services::auth::AuthConfig;
use crate::services::auth_middleware::{extract_bearer_token, AuthError};
use crate::services::links::LinkRepository;
use crate::services::orchestrator::ProbeOrchestrator;
use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `LINKFOLIO_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("LINKFOLIO_VERSION");

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub links: Arc<dyn LinkRepository>,
    pub orchestrator: Arc<ProbeOrchestrator>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        orchestrator: ProbeOrchestrator,
        auth: AuthConfig,
    ) -> Self {
        Self {
            links,
            orchestrator: Arc::new(orchestrator),
            auth,
        }
    }
}

/// Marker extractor for requests carrying the configured API token.
///
/// Rejects with 503 while no token is configured, so a misconfigured deployment
/// never exposes the management routes.
pub struct Authenticated;

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.auth.is_configured() {
            return Err(AuthError::NotConfigured);
        }
        let token = extract_bearer_token(&parts.headers).ok_or(AuthError::MissingToken)?;
        if state.auth.verify(token) {
            Ok(Authenticated)
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "linkfolio-agent".to_string(),
        version: VERSION.to_string(),
        snapshots_enabled: state.orchestrator.snapshots_enabled(),
        audits_enabled: state.orchestrator.audits_enabled(),
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .nest("/links", links_router())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", LinksApiDoc::openapi()))
}
