// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{ProbeError, Result};
use crate::models::storage::StorageFolder;
use crate::services::browser::{navigate_until_network_idle, BrowserLaunchOptions, BrowserSession};
use crate::services::guard::parse_probe_target;
use crate::services::logging::redact_url;
use crate::services::storage::ObjectStorage;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};
use url::Url;

pub const VIEWPORT_WIDTH: i64 = 1280;
pub const VIEWPORT_HEIGHT: i64 = 720;
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Fixed wait after navigation settles so animations and lazy content finish rendering
pub const SETTLE_DELAY: Duration = Duration::from_millis(10_000);

pub const JPEG_QUALITY: i64 = 85;

const SCREENSHOT_FILENAME: &str = "screenshot.jpg";
const SCREENSHOT_CONTENT_TYPE: &str = "image/jpeg";

/// Renders a target in a fresh headless browser and stores a viewport JPEG.
pub struct SnapshotCapturer {
    storage: Arc<dyn ObjectStorage>,
    launch: BrowserLaunchOptions,
}

impl SnapshotCapturer {
    pub fn new(storage: Arc<dyn ObjectStorage>, launch: BrowserLaunchOptions) -> Self {
        Self { storage, launch }
    }

    /// Capture `raw_url` and return the public URL of the stored image.
    ///
    /// Unlike the other probes this one reports every failure, including a rejected target,
    /// as an error.
    pub async fn capture_screenshot(&self, raw_url: &str) -> Result<String> {
        let target = parse_probe_target(raw_url)?;

        let session = BrowserSession::launch(&self.launch).await?;
        let rendered = render_viewport(&session, &target).await;
        session.close().await;

        let bytes = rendered.inspect_err(|e| {
            warn!(url = %redact_url(target.as_str()), error = %e, "screenshot capture failed");
        })?;

        let public_url = self
            .storage
            .upload(
                bytes,
                SCREENSHOT_FILENAME,
                SCREENSHOT_CONTENT_TYPE,
                StorageFolder::Screenshots,
            )
            .await?;

        info!(url = %redact_url(target.as_str()), screenshot = %public_url, "screenshot captured");
        Ok(public_url)
    }

    /// Delete a screenshot produced by an earlier capture.
    pub async fn discard(&self, screenshot_url: &str) -> Result<()> {
        self.storage.delete(screenshot_url).await?;
        Ok(())
    }
}

async fn render_viewport(session: &BrowserSession, target: &Url) -> Result<Vec<u8>> {
    let page = session.new_page().await?;
    page.execute(SetDeviceMetricsOverrideParams::new(
        VIEWPORT_WIDTH,
        VIEWPORT_HEIGHT,
        1.0,
        false,
    ))
    .await?;

    timeout(
        NAVIGATION_TIMEOUT,
        navigate_until_network_idle(&page, target.as_str()),
    )
    .await
    .map_err(|_| ProbeError::NavigationTimeout(NAVIGATION_TIMEOUT))??;

    sleep(SETTLE_DELAY).await;

    let bytes = page
        .screenshot(
            ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Jpeg)
                .quality(JPEG_QUALITY)
                .full_page(false)
                .build(),
        )
        .await?;
    Ok(bytes)
}
