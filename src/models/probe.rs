// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Classification of a reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReachabilityStatus {
    /// 2xx/3xx answered under the slow threshold
    Live,
    /// 4xx/5xx, connection failure, or an early transport timeout
    Down,
    /// 2xx/3xx at or above the slow threshold, or the request budget ran out
    Slow,
    /// Rejected input or an unclassifiable failure
    Unknown,
}

impl ReachabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReachabilityStatus::Live => "live",
            ReachabilityStatus::Down => "down",
            ReachabilityStatus::Slow => "slow",
            ReachabilityStatus::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "live" => Some(ReachabilityStatus::Live),
            "down" => Some(ReachabilityStatus::Down),
            "slow" => Some(ReachabilityStatus::Slow),
            "unknown" => Some(ReachabilityStatus::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReachabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single reachability check.
///
/// `status` is always set. A classified HTTP answer carries `status_code`; failures carry
/// `error`. `response_time_ms` is present whenever a request was actually issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityResult {
    pub status: ReachabilityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReachabilityResult {
    /// Result for input that was refused before any request was issued.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            status: ReachabilityStatus::Unknown,
            response_time_ms: None,
            status_code: None,
            error: Some(error.into()),
        }
    }

    pub fn answered(status: ReachabilityStatus, elapsed: Duration, status_code: u16) -> Self {
        Self {
            status,
            response_time_ms: Some(millis(elapsed)),
            status_code: Some(status_code),
            error: None,
        }
    }

    pub fn failed(status: ReachabilityStatus, elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            status,
            response_time_ms: Some(millis(elapsed)),
            status_code: None,
            error: Some(error.into()),
        }
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Page-quality scores from one audit run, each a 0-100 percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub performance: u8,
    pub accessibility: u8,
    pub best_practices: u8,
    pub seo: u8,
    pub audited_at: DateTime<Utc>,
}
