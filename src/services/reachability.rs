// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::probe::{ReachabilityResult, ReachabilityStatus};
use crate::services::guard::parse_probe_target;
use crate::services::logging::redact_url;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Hard budget for one reachability request, redirects included
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Successful answers at or above this latency are reported as slow
pub const SLOW_THRESHOLD: Duration = Duration::from_millis(3_000);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ProjectPortfolioBot/1.0)";

#[derive(Debug, Clone)]
pub struct ReachabilityConfig {
    pub timeout: Duration,
    pub slow_threshold: Duration,
    pub user_agent: String,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
            slow_threshold: SLOW_THRESHOLD,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Issues a single bounded GET and classifies the outcome. Never fails.
pub struct ReachabilityChecker {
    client: Client,
    config: ReachabilityConfig,
}

impl ReachabilityChecker {
    /// Build the HTTP client; fails only when the TLS backend cannot be initialized.
    pub fn new(config: ReachabilityConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured client (custom resolver, proxy, TLS roots).
    /// The budget in `config` is enforced on top of whatever the client does.
    pub fn with_client(client: Client, config: ReachabilityConfig) -> Self {
        Self { client, config }
    }

    pub async fn check(&self, raw_url: &str) -> ReachabilityResult {
        let target = match parse_probe_target(raw_url) {
            Ok(url) => url,
            Err(e) => {
                debug!(url = %redact_url(raw_url), error = %e, "reachability target rejected");
                return ReachabilityResult::rejected(e.to_string());
            }
        };

        let started = Instant::now();
        let request = self
            .client
            .get(target.clone())
            .header(USER_AGENT, self.config.user_agent.as_str())
            .send();
        let outcome = tokio::time::timeout(self.config.timeout, request).await;
        let elapsed = started.elapsed();

        let result = match outcome {
            Ok(Ok(response)) => classify_response(
                response.status().as_u16(),
                elapsed,
                self.config.slow_threshold,
            ),
            Ok(Err(e)) => classify_transport_error(&e, elapsed, self.config.timeout),
            Err(_) => classify_timeout(elapsed, self.config.timeout),
        };

        debug!(
            url = %redact_url(target.as_str()),
            status = %result.status,
            elapsed_ms = result.response_time_ms,
            "reachability check finished"
        );
        result
    }
}

/// Check `url` with the default budget and user agent.
pub async fn validate_url(url: &str) -> ReachabilityResult {
    match ReachabilityChecker::new(ReachabilityConfig::default()) {
        Ok(checker) => checker.check(url).await,
        Err(e) => ReachabilityResult::failed(
            ReachabilityStatus::Unknown,
            Duration::ZERO,
            format!("HTTP client unavailable: {e}"),
        ),
    }
}

/// Classify an HTTP answer by status code and latency.
pub fn classify_response(
    status_code: u16,
    elapsed: Duration,
    slow_threshold: Duration,
) -> ReachabilityResult {
    let status = match status_code {
        200..=399 if elapsed < slow_threshold => ReachabilityStatus::Live,
        200..=399 => ReachabilityStatus::Slow,
        400..=599 => ReachabilityStatus::Down,
        _ => ReachabilityStatus::Unknown,
    };
    ReachabilityResult::answered(status, elapsed, status_code)
}

/// Classify an aborted request.
///
/// Running out the whole budget means the target is alive but too slow; a timeout
/// reported before the budget is spent (connect or transport level) means it is down.
pub fn classify_timeout(elapsed: Duration, budget: Duration) -> ReachabilityResult {
    if elapsed >= budget {
        ReachabilityResult::failed(
            ReachabilityStatus::Slow,
            elapsed,
            "Slow response (timed out)",
        )
    } else {
        ReachabilityResult::failed(ReachabilityStatus::Down, elapsed, "Request timeout")
    }
}

fn classify_transport_error(
    error: &reqwest::Error,
    elapsed: Duration,
    budget: Duration,
) -> ReachabilityResult {
    if error.is_timeout() {
        return classify_timeout(elapsed, budget);
    }

    let status = if error.is_connect() {
        ReachabilityStatus::Down
    } else {
        ReachabilityStatus::Unknown
    };
    ReachabilityResult::failed(status, elapsed, error_chain(error))
}

/// Render an error with its sources, e.g. "error sending request: dns error: no record".
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fast_success_is_live() {
        let result = classify_response(200, ms(150), SLOW_THRESHOLD);
        assert_eq!(result.status, ReachabilityStatus::Live);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.response_time_ms, Some(150));
    }

    #[test]
    fn test_redirect_range_counts_as_success() {
        assert_eq!(
            classify_response(399, ms(10), SLOW_THRESHOLD).status,
            ReachabilityStatus::Live
        );
    }

    #[test]
    fn test_slow_threshold_boundary() {
        assert_eq!(
            classify_response(200, ms(2_999), SLOW_THRESHOLD).status,
            ReachabilityStatus::Live
        );
        assert_eq!(
            classify_response(200, ms(3_000), SLOW_THRESHOLD).status,
            ReachabilityStatus::Slow
        );
    }

    #[test]
    fn test_error_statuses_are_down_regardless_of_latency() {
        for code in [400, 404, 410, 500, 503, 599] {
            assert_eq!(
                classify_response(code, ms(5), SLOW_THRESHOLD).status,
                ReachabilityStatus::Down
            );
            assert_eq!(
                classify_response(code, ms(9_000), SLOW_THRESHOLD).status,
                ReachabilityStatus::Down
            );
        }
    }

    #[test]
    fn test_out_of_range_status_is_unknown() {
        let result = classify_response(101, ms(5), SLOW_THRESHOLD);
        assert_eq!(result.status, ReachabilityStatus::Unknown);
        assert_eq!(result.status_code, Some(101));
        assert_eq!(
            classify_response(600, ms(5), SLOW_THRESHOLD).status,
            ReachabilityStatus::Unknown
        );
    }

    #[test]
    fn test_timeout_just_under_budget_is_down() {
        let result = classify_timeout(ms(9_999), REQUEST_TIMEOUT);
        assert_eq!(result.status, ReachabilityStatus::Down);
        assert_eq!(result.error.as_deref(), Some("Request timeout"));
    }

    #[test]
    fn test_timeout_at_or_over_budget_is_slow() {
        for elapsed in [10_000, 10_001, 12_500] {
            let result = classify_timeout(ms(elapsed), REQUEST_TIMEOUT);
            assert_eq!(result.status, ReachabilityStatus::Slow);
            assert_eq!(result.error.as_deref(), Some("Slow response (timed out)"));
            assert_eq!(result.response_time_ms, Some(elapsed));
        }
    }

    #[tokio::test]
    async fn test_validate_url_rejects_before_any_request() {
        let empty = validate_url("").await;
        assert_eq!(empty.status, ReachabilityStatus::Unknown);
        assert_eq!(empty.error.as_deref(), Some("URL is required"));

        let bad = validate_url("ftp://example.com").await;
        assert_eq!(bad.error.as_deref(), Some("Invalid URL format"));

        let private = validate_url("http://10.0.0.8/").await;
        assert_eq!(private.status, ReachabilityStatus::Unknown);
        assert_eq!(
            private.error.as_deref(),
            Some("Private IP addresses are not allowed")
        );
        assert!(private.response_time_ms.is_none());
    }

    #[test]
    fn test_error_chain_skips_repeated_text() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(error_chain(&io), "refused");
    }
}
