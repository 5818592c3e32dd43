// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{ProbeError, Result};
use crate::models::probe::QualityScore;
use crate::services::browser::{BrowserLaunchOptions, BrowserSession};
use crate::services::guard::parse_probe_target;
use crate::services::logging::redact_url;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

/// Deadline for one complete audit, browser launch included
pub const AUDIT_TIMEOUT: Duration = Duration::from_millis(90_000);

const CATEGORIES: [&str; 4] = ["performance", "accessibility", "best-practices", "seo"];

#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub lighthouse_bin: PathBuf,
    pub browser: BrowserLaunchOptions,
    pub timeout: Duration,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            lighthouse_bin: PathBuf::from("lighthouse"),
            browser: BrowserLaunchOptions::default(),
            timeout: AUDIT_TIMEOUT,
        }
    }
}

/// Lighthouse run against a dedicated headless browser.
pub struct QualityAuditor {
    options: AuditOptions,
}

impl QualityAuditor {
    pub fn new(options: AuditOptions) -> Self {
        Self { options }
    }

    /// Audit `raw_url` and return the four category scores.
    ///
    /// Every failure, a rejected target or an expired deadline included, yields `None`.
    pub async fn run_lighthouse_audit(&self, raw_url: &str) -> Option<QualityScore> {
        let target = match parse_probe_target(raw_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = %redact_url(raw_url), error = %e, "audit target rejected");
                return None;
            }
        };

        // Dropping the run on timeout drops the session and the child process with it
        match tokio::time::timeout(self.options.timeout, self.audit(&target)).await {
            Ok(Ok(score)) => {
                info!(
                    url = %redact_url(target.as_str()),
                    performance = score.performance,
                    accessibility = score.accessibility,
                    best_practices = score.best_practices,
                    seo = score.seo,
                    "audit finished"
                );
                Some(score)
            }
            Ok(Err(e)) => {
                warn!(url = %redact_url(target.as_str()), error = %e, "audit failed");
                None
            }
            Err(_) => {
                warn!(
                    url = %redact_url(target.as_str()),
                    timeout_ms = self.options.timeout.as_millis() as u64,
                    "audit timed out"
                );
                None
            }
        }
    }

    async fn audit(&self, target: &Url) -> Result<QualityScore> {
        let session = BrowserSession::launch(&self.options.browser).await?;
        let report = self.run_cli(&session, target).await;
        session.close().await;
        parse_report(&report?)
    }

    async fn run_cli(&self, session: &BrowserSession, target: &Url) -> Result<Vec<u8>> {
        let port = session
            .debugging_port()
            .ok_or_else(|| ProbeError::Audit("browser exposes no debugging port".to_string()))?;

        let child = Command::new(&self.options.lighthouse_bin)
            .arg(target.as_str())
            .arg(format!("--port={port}"))
            .arg("--output=json")
            .arg("--output-path=stdout")
            .arg(format!("--only-categories={}", CATEGORIES.join(",")))
            .arg("--disable-storage-reset")
            .arg("--quiet")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Audit(format!(
                "lighthouse exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct LighthouseReport {
    #[serde(default)]
    categories: HashMap<String, LighthouseCategory>,
}

#[derive(Debug, Deserialize)]
struct LighthouseCategory {
    score: Option<f64>,
}

fn parse_report(bytes: &[u8]) -> Result<QualityScore> {
    let report: LighthouseReport = serde_json::from_slice(bytes)
        .map_err(|e| ProbeError::Audit(format!("unreadable report: {e}")))?;

    let score = |category: &str| {
        let fraction = report
            .categories
            .get(category)
            .and_then(|c| c.score)
            .unwrap_or(0.0);
        to_percentage(fraction)
    };

    Ok(QualityScore {
        performance: score("performance"),
        accessibility: score("accessibility"),
        best_practices: score("best-practices"),
        seo: score("seo"),
        audited_at: Utc::now(),
    })
}

fn to_percentage(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::browser::live_sessions;

    #[test]
    fn test_parse_report_rounds_scores() {
        let report = br#"{
            "lighthouseVersion": "12.0.0",
            "categories": {
                "performance": {"id": "performance", "score": 0.874},
                "accessibility": {"id": "accessibility", "score": 0.915},
                "best-practices": {"id": "best-practices", "score": 1.0},
                "seo": {"id": "seo", "score": 0.005}
            }
        }"#;

        let score = parse_report(report).unwrap();
        assert_eq!(score.performance, 87);
        assert_eq!(score.accessibility, 92);
        assert_eq!(score.best_practices, 100);
        assert_eq!(score.seo, 1);
    }

    #[test]
    fn test_missing_or_null_category_is_zero() {
        let report = br#"{"categories": {"performance": {"score": null}, "seo": {"score": 0.5}}}"#;

        let score = parse_report(report).unwrap();
        assert_eq!(score.performance, 0);
        assert_eq!(score.accessibility, 0);
        assert_eq!(score.best_practices, 0);
        assert_eq!(score.seo, 50);
    }

    #[test]
    fn test_report_without_categories() {
        let score = parse_report(b"{}").unwrap();
        assert_eq!(score.performance, 0);
    }

    #[test]
    fn test_unreadable_report_is_an_error() {
        assert!(matches!(
            parse_report(b"Runtime error encountered"),
            Err(ProbeError::Audit(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_targets_yield_none() {
        let auditor = QualityAuditor::new(AuditOptions::default());
        let baseline = live_sessions();

        for raw in ["", "not a url", "ftp://example.com", "http://127.0.0.1/", "http://localhost/"] {
            assert!(auditor.run_lighthouse_audit(raw).await.is_none(), "{raw}");
        }
        assert_eq!(live_sessions(), baseline);
    }

    #[tokio::test]
    #[ignore] // Requires Chrome, the lighthouse CLI and network access
    async fn test_audit_public_page() {
        let auditor = QualityAuditor::new(AuditOptions::default());
        let baseline = live_sessions();

        let score = auditor.run_lighthouse_audit("https://example.com").await.unwrap();
        assert!(score.seo > 0);
        assert_eq!(live_sessions(), baseline);
    }
}
