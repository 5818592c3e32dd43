// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::probe::{QualityScore, ReachabilityResult, ReachabilityStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A project link on the user's page, together with the last result of every probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub order: i32,
    pub clicks: i64,
    pub status: Option<ReachabilityStatus>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub response_time_ms: Option<u64>,
    pub screenshot_url: Option<String>,
    pub lighthouse_performance: Option<u8>,
    pub lighthouse_accessibility: Option<u8>,
    pub lighthouse_best_practices: Option<u8>,
    pub lighthouse_seo: Option<u8>,
    pub lighthouse_checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// New link with no probe results yet.
    pub fn new(
        title: String,
        url: String,
        description: Option<String>,
        icon: Option<String>,
        order: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title,
            url,
            description,
            icon,
            order,
            clicks: 0,
            status: None,
            last_checked_at: None,
            response_time_ms: None,
            screenshot_url: None,
            lighthouse_performance: None,
            lighthouse_accessibility: None,
            lighthouse_best_practices: None,
            lighthouse_seo: None,
            lighthouse_checked_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a probe write-back in memory, with the same semantics as the SQL update.
    pub fn apply(&mut self, update: &LinkUpdate) {
        // Status, check time and latency belong to one run and are replaced together
        if let Some(status) = update.status {
            self.status = Some(status);
            self.response_time_ms = update.response_time_ms;
        }
        if let Some(checked_at) = update.last_checked_at {
            self.last_checked_at = Some(checked_at);
        }
        if let Some(url) = &update.screenshot_url {
            self.screenshot_url = Some(url.clone());
        }
        if let Some(score) = &update.quality {
            self.lighthouse_performance = Some(score.performance);
            self.lighthouse_accessibility = Some(score.accessibility);
            self.lighthouse_best_practices = Some(score.best_practices);
            self.lighthouse_seo = Some(score.seo);
            self.lighthouse_checked_at = Some(score.audited_at);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial write of probe results onto a link. Unset fields are left untouched.
///
/// Each probe fills a disjoint group of fields, so concurrent probes for the same link
/// never overwrite each other's results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkUpdate {
    pub status: Option<ReachabilityStatus>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub response_time_ms: Option<u64>,
    pub screenshot_url: Option<String>,
    pub quality: Option<QualityScore>,
}

impl LinkUpdate {
    pub fn reachability(result: &ReachabilityResult, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(result.status),
            last_checked_at: Some(checked_at),
            response_time_ms: result.response_time_ms,
            ..Self::default()
        }
    }

    pub fn screenshot(url: String) -> Self {
        Self {
            screenshot_url: Some(url),
            ..Self::default()
        }
    }

    pub fn quality(score: QualityScore) -> Self {
        Self {
            quality: Some(score),
            ..Self::default()
        }
    }
}

// ============================================================================
// API Request Types
// ============================================================================

/// Request to create a link.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateLinkRequest {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Partial update of a link. Absent fields are left unchanged; an empty
/// `icon`/`description` clears the field.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateLinkRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LinkResponse {
    pub success: bool,
    pub message: String,
    pub link: Link,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListLinksResponse {
    pub links: Vec<Link>,
    pub count: usize,
}

/// Click recorded; the caller redirects to `url`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackClickResponse {
    pub success: bool,
    pub url: String,
}

/// Result of the synchronous validate action. A `down` classification is still a
/// successful determination.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateLinkResponse {
    pub success: bool,
    pub data: ReachabilityResult,
}
