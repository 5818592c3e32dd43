// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Runs probes for links as detached tasks and writes their results back.
//!
//! Each probe task ends in a `ProbeOutcome` that is logged and returned through its
//! `JoinHandle`. Request handlers drop the handles; failures never reach the caller and
//! never roll back the mutation that triggered them.

use crate::error::RepositoryError;
use crate::models::link::{Link, LinkUpdate};
use crate::models::probe::ReachabilityResult;
use crate::services::audit::QualityAuditor;
use crate::services::links::LinkRepository;
use crate::services::logging::redact_url;
use crate::services::reachability::ReachabilityChecker;
use crate::services::snapshot::SnapshotCapturer;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Reachability,
    Snapshot,
    Audit,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProbeKind::Reachability => "reachability",
            ProbeKind::Snapshot => "snapshot",
            ProbeKind::Audit => "audit",
        })
    }
}

/// Terminal state of one detached probe task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Result written onto the link
    Persisted,
    /// Probe produced nothing to write
    Skipped,
    /// Probe or write-back failed; logged and dropped
    Failed(String),
}

/// Handles of the probe tasks started for one link.
pub struct ProbeHandles {
    tasks: Vec<(ProbeKind, JoinHandle<ProbeOutcome>)>,
}

impl ProbeHandles {
    pub fn kinds(&self) -> Vec<ProbeKind> {
        self.tasks.iter().map(|(kind, _)| *kind).collect()
    }

    /// Wait for every task. A panicked task is reported as `Failed`.
    pub async fn join(self) -> Vec<(ProbeKind, ProbeOutcome)> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (kind, handle) in self.tasks {
            let outcome = handle
                .await
                .unwrap_or_else(|e| ProbeOutcome::Failed(format!("probe task aborted: {e}")));
            outcomes.push((kind, outcome));
        }
        outcomes
    }
}

pub struct ProbeOrchestrator {
    links: Arc<dyn LinkRepository>,
    checker: Arc<ReachabilityChecker>,
    capturer: Option<Arc<SnapshotCapturer>>,
    auditor: Option<Arc<QualityAuditor>>,
}

impl ProbeOrchestrator {
    /// Orchestrator running only the reachability probe
    pub fn new(links: Arc<dyn LinkRepository>, checker: Arc<ReachabilityChecker>) -> Self {
        Self {
            links,
            checker,
            capturer: None,
            auditor: None,
        }
    }

    pub fn with_capturer(mut self, capturer: Arc<SnapshotCapturer>) -> Self {
        self.capturer = Some(capturer);
        self
    }

    pub fn with_auditor(mut self, auditor: Arc<QualityAuditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    pub fn snapshots_enabled(&self) -> bool {
        self.capturer.is_some()
    }

    pub fn audits_enabled(&self) -> bool {
        self.auditor.is_some()
    }

    /// Start probes for a freshly created link. Nothing runs when it has no URL.
    pub fn on_link_created(&self, link: &Link) -> Option<ProbeHandles> {
        if link.url.trim().is_empty() {
            return None;
        }
        Some(self.start_probes(link.id, &link.url))
    }

    /// Start probes after an update, only when the URL value changed.
    pub fn on_link_updated(&self, previous_url: &str, link: &Link) -> Option<ProbeHandles> {
        if link.url == previous_url || link.url.trim().is_empty() {
            return None;
        }
        Some(self.start_probes(link.id, &link.url))
    }

    /// Remove the stored screenshot of a deleted link in the background.
    pub fn on_link_deleted(&self, link: &Link) -> Option<JoinHandle<()>> {
        let capturer = self.capturer.clone()?;
        let screenshot_url = link.screenshot_url.clone()?;
        let link_id = link.id;

        Some(tokio::spawn(async move {
            discard_screenshot(&capturer, link_id, &screenshot_url).await;
        }))
    }

    /// Spawn every configured probe for `url`; results are written to link `link_id`.
    pub fn start_probes(&self, link_id: Uuid, url: &str) -> ProbeHandles {
        let mut tasks = Vec::with_capacity(3);

        let checker = self.checker.clone();
        let links = self.links.clone();
        let target = url.to_string();
        tasks.push((
            ProbeKind::Reachability,
            spawn_probe(ProbeKind::Reachability, link_id, async move {
                let result = checker.check(&target).await;
                persist(links.as_ref(), link_id, LinkUpdate::reachability(&result, Utc::now()))
                    .await
            }),
        ));

        if let Some(capturer) = self.capturer.clone() {
            let links = self.links.clone();
            let target = url.to_string();
            tasks.push((
                ProbeKind::Snapshot,
                spawn_probe(ProbeKind::Snapshot, link_id, async move {
                    match capturer.capture_screenshot(&target).await {
                        Ok(screenshot_url) => {
                            store_screenshot(links.as_ref(), &capturer, link_id, screenshot_url)
                                .await
                        }
                        Err(e) => ProbeOutcome::Failed(e.to_string()),
                    }
                }),
            ));
        }

        if let Some(auditor) = self.auditor.clone() {
            let links = self.links.clone();
            let target = url.to_string();
            tasks.push((
                ProbeKind::Audit,
                spawn_probe(ProbeKind::Audit, link_id, async move {
                    match auditor.run_lighthouse_audit(&target).await {
                        Some(score) => {
                            persist(links.as_ref(), link_id, LinkUpdate::quality(score)).await
                        }
                        None => ProbeOutcome::Skipped,
                    }
                }),
            ));
        }

        info!(
            link_id = %link_id,
            url = %redact_url(url),
            probes = tasks.len(),
            "probes started"
        );
        ProbeHandles { tasks }
    }

    /// Run the reachability probe inline and persist its result.
    ///
    /// The classification itself never fails; only the write-back can.
    pub async fn validate_now(&self, link: &Link) -> Result<ReachabilityResult, RepositoryError> {
        let result = self.checker.check(&link.url).await;
        self.links
            .update_by_id(link.id, &LinkUpdate::reachability(&result, Utc::now()))
            .await?;
        info!(
            link_id = %link.id,
            url = %redact_url(&link.url),
            status = %result.status,
            "link validated"
        );
        Ok(result)
    }
}

fn spawn_probe<F>(kind: ProbeKind, link_id: Uuid, probe: F) -> JoinHandle<ProbeOutcome>
where
    F: Future<Output = ProbeOutcome> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = probe.await;
        match &outcome {
            ProbeOutcome::Persisted => info!(link_id = %link_id, probe = %kind, "probe result saved"),
            ProbeOutcome::Skipped => debug!(link_id = %link_id, probe = %kind, "probe produced no result"),
            ProbeOutcome::Failed(error) => {
                warn!(link_id = %link_id, probe = %kind, error = %error, "probe failed")
            }
        }
        outcome
    })
}

async fn persist(links: &dyn LinkRepository, link_id: Uuid, update: LinkUpdate) -> ProbeOutcome {
    match links.update_by_id(link_id, &update).await {
        Ok(()) => ProbeOutcome::Persisted,
        Err(e) => ProbeOutcome::Failed(e.to_string()),
    }
}

/// Record a fresh screenshot and discard the one it supersedes.
///
/// If the link is gone or cannot be read, the fresh object is discarded instead so that
/// nothing in storage is left without a row pointing at it.
async fn store_screenshot(
    links: &dyn LinkRepository,
    capturer: &SnapshotCapturer,
    link_id: Uuid,
    screenshot_url: String,
) -> ProbeOutcome {
    let previous = match links.get(link_id).await {
        Ok(Some(link)) => link.screenshot_url,
        Ok(None) => {
            discard_screenshot(capturer, link_id, &screenshot_url).await;
            return ProbeOutcome::Failed(RepositoryError::NotFound(link_id).to_string());
        }
        Err(e) => {
            discard_screenshot(capturer, link_id, &screenshot_url).await;
            return ProbeOutcome::Failed(e.to_string());
        }
    };

    match links
        .update_by_id(link_id, &LinkUpdate::screenshot(screenshot_url.clone()))
        .await
    {
        Ok(()) => {
            if let Some(previous) = previous.filter(|url| *url != screenshot_url) {
                discard_screenshot(capturer, link_id, &previous).await;
            }
            ProbeOutcome::Persisted
        }
        Err(e) => {
            if matches!(e, RepositoryError::NotFound(_)) {
                discard_screenshot(capturer, link_id, &screenshot_url).await;
            }
            ProbeOutcome::Failed(e.to_string())
        }
    }
}

async fn discard_screenshot(capturer: &SnapshotCapturer, link_id: Uuid, screenshot_url: &str) {
    match capturer.discard(screenshot_url).await {
        Ok(()) => debug!(link_id = %link_id, screenshot = %screenshot_url, "screenshot discarded"),
        Err(e) => warn!(
            link_id = %link_id,
            screenshot = %screenshot_url,
            error = %e,
            "failed to discard screenshot"
        ),
    }
}
