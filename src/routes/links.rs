// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Link management route handlers.
//!
//! Creating a link, or changing its URL, starts the probes in the background; the
//! response never waits for them. `validate` is the one route that runs a probe inline.

use crate::app::{AppState, Authenticated};
use crate::error::RepositoryError;
use crate::models::link::{
    CreateLinkRequest, Link, LinkResponse, ListLinksResponse, MessageResponse, TrackClickResponse,
    UpdateLinkRequest, ValidateLinkResponse,
};
use crate::models::probe::{ReachabilityResult, ReachabilityStatus};
use crate::services::guard::is_http_url;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::error;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use uuid::Uuid;

const INVALID_URL_MESSAGE: &str = "Invalid URL format. Must start with http:// or https://";

type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(MessageResponse {
            success: false,
            message: message.into(),
        }),
    )
}

fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Link not found")
}

fn internal(e: RepositoryError) -> ApiError {
    error!(error = %e, "link repository error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Empty input clears an optional field.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_link_handler,
        list_links_handler,
        get_link_handler,
        update_link_handler,
        delete_link_handler,
        validate_link_handler,
        track_click_handler,
    ),
    components(schemas(
        Link,
        CreateLinkRequest,
        UpdateLinkRequest,
        LinkResponse,
        ListLinksResponse,
        MessageResponse,
        ValidateLinkResponse,
        TrackClickResponse,
        ReachabilityResult,
        ReachabilityStatus,
    )),
    modifiers(&SecurityAddon),
    tags((name = "links", description = "Project links and their probe results"))
)]
pub struct LinksApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Create the link router. Mounted under `/links`.
pub fn links_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_link_handler).get(list_links_handler))
        .route(
            "/{id}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/{id}/validate", post(validate_link_handler))
        // Public: visitors of the link page hit this before being redirected
        .route("/{id}/track", get(track_click_handler))
}

#[utoipa::path(
    post,
    path = "/links",
    tag = "links",
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Link created, probes started", body = LinkResponse),
        (status = 400, description = "Missing title/URL or non-http URL", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn create_link_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), ApiError> {
    let title = payload.title.trim();
    let url = payload.url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Title and URL are required",
        ));
    }
    if !is_http_url(url) {
        return Err(api_error(StatusCode::BAD_REQUEST, INVALID_URL_MESSAGE));
    }

    let order = state.links.next_position().await.map_err(internal)?;
    let link = Link::new(
        title.to_string(),
        url.to_string(),
        optional_text(payload.description),
        optional_text(payload.icon),
        order,
    );
    state.links.insert(&link).await.map_err(internal)?;

    state.orchestrator.on_link_created(&link);

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse {
            success: true,
            message: "Link created successfully".to_string(),
            link,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/links",
    tag = "links",
    responses(
        (status = 200, description = "All links in display order", body = ListLinksResponse),
        (status = 401, description = "Missing or invalid token", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn list_links_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
) -> Result<Json<ListLinksResponse>, ApiError> {
    let links = state.links.list().await.map_err(internal)?;
    let count = links.len();
    Ok(Json(ListLinksResponse { links, count }))
}

#[utoipa::path(
    get,
    path = "/links/{id}",
    tag = "links",
    params(("id" = Uuid, Path, description = "Link id")),
    responses(
        (status = 200, description = "The link with its latest probe results", body = Link),
        (status = 404, description = "No such link", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn get_link_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Link>, ApiError> {
    state
        .links
        .get(id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(not_found)
}

#[utoipa::path(
    put,
    path = "/links/{id}",
    tag = "links",
    params(("id" = Uuid, Path, description = "Link id")),
    request_body = UpdateLinkRequest,
    responses(
        (status = 200, description = "Link updated; probes restarted if the URL changed", body = LinkResponse),
        (status = 400, description = "Non-http URL", body = MessageResponse),
        (status = 404, description = "No such link", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn update_link_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, ApiError> {
    let mut link = state
        .links
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;
    let previous_url = link.url.clone();

    if let Some(title) = payload.title {
        link.title = title.trim().to_string();
    }
    if let Some(url) = payload.url {
        if !is_http_url(&url) {
            return Err(api_error(StatusCode::BAD_REQUEST, INVALID_URL_MESSAGE));
        }
        link.url = url.trim().to_string();
    }
    if payload.icon.is_some() {
        link.icon = optional_text(payload.icon);
    }
    if payload.description.is_some() {
        link.description = optional_text(payload.description);
    }

    let saved = state.links.save_details(&link).await.map_err(|e| match e {
        RepositoryError::NotFound(_) => not_found(),
        other => internal(other),
    })?;

    state.orchestrator.on_link_updated(&previous_url, &saved);

    Ok(Json(LinkResponse {
        success: true,
        message: "Link updated successfully".to_string(),
        link: saved,
    }))
}

#[utoipa::path(
    delete,
    path = "/links/{id}",
    tag = "links",
    params(("id" = Uuid, Path, description = "Link id")),
    responses(
        (status = 200, description = "Link deleted", body = MessageResponse),
        (status = 404, description = "No such link", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn delete_link_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state
        .links
        .delete(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    state.orchestrator.on_link_deleted(&removed);

    Ok(Json(MessageResponse {
        success: true,
        message: "Link deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/links/{id}/validate",
    tag = "links",
    params(("id" = Uuid, Path, description = "Link id")),
    responses(
        (status = 200, description = "Classification, including down and unknown", body = ValidateLinkResponse),
        (status = 400, description = "Link has no URL", body = MessageResponse),
        (status = 404, description = "No such link", body = MessageResponse),
        (status = 500, description = "Result could not be saved", body = MessageResponse),
    ),
    security(("api_token" = []))
)]
pub async fn validate_link_handler(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ValidateLinkResponse>, ApiError> {
    let link = state
        .links
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    if link.url.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Link has no URL"));
    }

    let data = state
        .orchestrator
        .validate_now(&link)
        .await
        .map_err(internal)?;

    Ok(Json(ValidateLinkResponse {
        success: true,
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/links/{id}/track",
    tag = "links",
    params(("id" = Uuid, Path, description = "Link id")),
    responses(
        (status = 200, description = "Click counted", body = TrackClickResponse),
        (status = 404, description = "No such link", body = MessageResponse),
    )
)]
pub async fn track_click_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TrackClickResponse>, ApiError> {
    let link = state
        .links
        .record_click(id)
        .await
        .map_err(internal)?
        .ok_or_else(not_found)?;

    Ok(Json(TrackClickResponse {
        success: true,
        url: link.url,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(
            optional_text(Some(" github ".to_string())),
            Some("github".to_string())
        );
    }

    #[test]
    fn test_openapi_lists_link_routes() {
        let doc = LinksApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/links"));
        assert!(doc.paths.paths.contains_key("/links/{id}/validate"));
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("api_token"));
    }
}
