// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! One headless Chrome process per probe invocation.
//!
//! `BrowserSession` owns the process and its CDP handler task. Callers release it with
//! `close().await`; if the session is dropped instead (early return, panic, or a
//! cancelled future after a deadline) the process is killed from a background task
//! on the runtime captured at launch.

use crate::error::{ProbeError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Chrome's lifecycle event for "no more than 2 requests in flight for 500ms"
const NETWORK_ALMOST_IDLE: &str = "networkAlmostIdle";

const LAUNCH_ARGS: [&str; 4] = [
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
];

static LIVE_SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Number of browser processes launched by this process and not yet reaped.
pub fn live_sessions() -> usize {
    LIVE_SESSIONS.load(Ordering::SeqCst)
}

#[derive(Debug, Clone)]
pub struct BrowserLaunchOptions {
    /// Chrome/Chromium binary; autodetected when unset
    pub executable: Option<PathBuf>,
    pub launch_timeout: Duration,
}

impl Default for BrowserLaunchOptions {
    fn default() -> Self {
        Self {
            executable: None,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

pub struct BrowserSession {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    profile_dir: PathBuf,
    runtime_handle: tokio::runtime::Handle,
}

impl BrowserSession {
    /// Launch an isolated headless browser with a throwaway profile directory.
    ///
    /// The Chrome sandbox is disabled so the probe can run inside unprivileged containers.
    pub async fn launch(options: &BrowserLaunchOptions) -> Result<Self> {
        let profile_dir = std::env::temp_dir().join(format!("linkfolio-chrome-{}", Uuid::now_v7()));

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .args(LAUNCH_ARGS)
            .user_data_dir(&profile_dir)
            .launch_timeout(options.launch_timeout);
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ProbeError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ProbeError::BrowserLaunch(e.to_string()))?;
        LIVE_SESSIONS.fetch_add(1, Ordering::SeqCst);

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "browser handler event error");
                }
            }
        });

        debug!(profile = %profile_dir.display(), "browser launched");

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
            profile_dir,
            runtime_handle: tokio::runtime::Handle::current(),
        })
    }

    fn browser(&self) -> Result<&Browser> {
        self.browser
            .as_ref()
            .ok_or_else(|| ProbeError::BrowserLaunch("browser session already closed".to_string()))
    }

    pub async fn new_page(&self) -> Result<Page> {
        Ok(self.browser()?.new_page("about:blank").await?)
    }

    /// Port of the DevTools endpoint, for tools that attach to this browser.
    pub fn debugging_port(&self) -> Option<u16> {
        let browser = self.browser.as_ref()?;
        port_from_websocket(browser.websocket_address())
    }

    /// Close the browser and wait for the process to exit.
    pub async fn close(mut self) {
        let Some(browser) = self.browser.take() else {
            return;
        };
        shutdown(browser, self.handler.take(), self.profile_dir.clone()).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(browser) = self.browser.take() {
            warn!("browser session dropped without close, killing in background");
            let handler = self.handler.take();
            let profile_dir = std::mem::take(&mut self.profile_dir);
            self.runtime_handle
                .spawn(async move { shutdown(browser, handler, profile_dir).await });
        }
    }
}

async fn shutdown(mut browser: Browser, handler: Option<JoinHandle<()>>, profile_dir: PathBuf) {
    if let Err(e) = browser.close().await {
        debug!(error = %e, "graceful browser close failed, killing");
        if let Some(Err(e)) = browser.kill().await {
            warn!(error = %e, "failed to kill browser process");
        }
    }
    if let Err(e) = browser.wait().await {
        warn!(error = %e, "failed to reap browser process");
    }
    drop(browser);

    if let Some(handler) = handler {
        handler.abort();
    }
    LIVE_SESSIONS.fetch_sub(1, Ordering::SeqCst);

    if !profile_dir.as_os_str().is_empty() {
        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            debug!(error = %e, profile = %profile_dir.display(), "profile cleanup skipped");
        }
    }
}

/// Navigate and resolve once the page's network is substantially idle.
pub async fn navigate_until_network_idle(page: &Page, url: &str) -> Result<()> {
    page.execute(SetLifecycleEventsEnabledParams::new(true))
        .await?;
    let mut lifecycle = page.event_listener::<EventLifecycleEvent>().await?;

    let navigation = page.execute(NavigateParams::new(url)).await?.result;
    if let Some(error) = navigation.error_text {
        return Err(ProbeError::Navigation(error));
    }
    let document = NavigatedDocument {
        frame_id: navigation.frame_id.inner().clone(),
        loader_id: navigation.loader_id.map(|id| id.inner().clone()),
    };

    while let Some(event) = lifecycle.next().await {
        if document.went_idle(event.frame_id.inner(), event.loader_id.inner(), &event.name) {
            return Ok(());
        }
    }
    Ok(())
}

/// Top-level document produced by one navigation.
struct NavigatedDocument {
    frame_id: String,
    /// Absent for same-document navigations
    loader_id: Option<String>,
}

impl NavigatedDocument {
    /// Idle signals from subframes and from the document being replaced do not count.
    fn went_idle(&self, frame_id: &str, loader_id: &str, name: &str) -> bool {
        name == NETWORK_ALMOST_IDLE
            && frame_id == self.frame_id
            && self.loader_id.as_deref().map_or(true, |id| id == loader_id)
    }
}

fn port_from_websocket(address: &str) -> Option<u16> {
    Url::parse(address).ok()?.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_from_websocket() {
        assert_eq!(
            port_from_websocket("ws://127.0.0.1:38211/devtools/browser/4f1c"),
            Some(38211)
        );
        assert_eq!(port_from_websocket("ws://127.0.0.1/devtools/browser/4f1c"), None);
        assert_eq!(port_from_websocket("not a url"), None);
    }

    #[test]
    fn test_only_main_document_idle_ends_navigation() {
        let document = NavigatedDocument {
            frame_id: "MAIN".to_string(),
            loader_id: Some("L2".to_string()),
        };

        assert!(!document.went_idle("IFRAME", "L9", NETWORK_ALMOST_IDLE));
        assert!(!document.went_idle("MAIN", "L1", NETWORK_ALMOST_IDLE));
        assert!(!document.went_idle("MAIN", "L2", "load"));
        assert!(document.went_idle("MAIN", "L2", NETWORK_ALMOST_IDLE));
    }

    #[test]
    fn test_same_document_navigation_accepts_current_loader() {
        let document = NavigatedDocument {
            frame_id: "MAIN".to_string(),
            loader_id: None,
        };

        assert!(document.went_idle("MAIN", "L1", NETWORK_ALMOST_IDLE));
        assert!(!document.went_idle("IFRAME", "L1", NETWORK_ALMOST_IDLE));
    }

    #[tokio::test]
    #[ignore] // Requires Chrome
    async fn test_close_reaps_process() {
        let baseline = live_sessions();
        let session = BrowserSession::launch(&BrowserLaunchOptions::default())
            .await
            .unwrap();
        assert_eq!(live_sessions(), baseline + 1);
        assert!(session.debugging_port().is_some());

        session.close().await;
        assert_eq!(live_sessions(), baseline);
    }

    #[tokio::test]
    #[ignore] // Requires Chrome
    async fn test_drop_reaps_process() {
        let baseline = live_sessions();
        let session = BrowserSession::launch(&BrowserLaunchOptions::default())
            .await
            .unwrap();
        drop(session);

        for _ in 0..50 {
            if live_sessions() == baseline {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("browser process was not reaped after drop");
    }
}
