// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use linkfolio_agent::app::{create_router, AppState, VERSION};
use linkfolio_agent::services::audit::{AuditOptions, QualityAuditor};
use linkfolio_agent::services::auth::AuthConfig;
use linkfolio_agent::services::browser::BrowserLaunchOptions;
use linkfolio_agent::services::db::PgLinkRepository;
use linkfolio_agent::services::links::{LinkRepository, MemoryLinkRepository};
use linkfolio_agent::services::logging::init_tracing;
use linkfolio_agent::services::orchestrator::ProbeOrchestrator;
use linkfolio_agent::services::reachability::{validate_url, ReachabilityChecker, ReachabilityConfig};
use linkfolio_agent::services::snapshot::SnapshotCapturer;
use linkfolio_agent::services::storage::{StorageClient, StorageConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "linkfolio-agent",
    version = VERSION,
    about = "Link page backend that checks project URLs for reachability, screenshots and page quality"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address the HTTP API listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000", global = true)]
    listen_addr: SocketAddr,

    /// Postgres connection string; links are kept in memory when unset
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Bearer token required by the link management routes
    #[arg(long, env = "API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Chrome/Chromium binary used by the screenshot and audit probes
    #[arg(long, env = "CHROME_EXECUTABLE", global = true)]
    chrome_executable: Option<PathBuf>,

    #[arg(long, env = "LIGHTHOUSE_BIN", default_value = "lighthouse", global = true)]
    lighthouse_bin: PathBuf,

    /// Capture screenshots of new and changed links (needs object storage)
    #[arg(long, env = "SNAPSHOTS_ENABLED", default_value_t = true, action = ArgAction::Set, global = true)]
    snapshots_enabled: bool,

    /// Run Lighthouse audits on new and changed links
    #[arg(long, env = "AUDITS_ENABLED", default_value_t = false, action = ArgAction::Set, global = true)]
    audits_enabled: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Classify the reachability of one URL and print the result as JSON
    Check { url: String },
    /// Capture and upload a screenshot of one URL and print its public URL
    Snapshot { url: String },
    /// Run a Lighthouse audit of one URL and print the scores as JSON
    Audit { url: String },
}

impl Cli {
    fn browser_options(&self) -> BrowserLaunchOptions {
        BrowserLaunchOptions {
            executable: self.chrome_executable.clone(),
            ..BrowserLaunchOptions::default()
        }
    }

    fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            lighthouse_bin: self.lighthouse_bin.clone(),
            browser: self.browser_options(),
            ..AuditOptions::default()
        }
    }

    fn snapshot_capturer(&self) -> Result<SnapshotCapturer> {
        let config = StorageConfig::from_env().context("object storage is not configured")?;
        let storage = StorageClient::new(config).context("failed to create storage client")?;
        Ok(SnapshotCapturer::new(
            Arc::new(storage),
            self.browser_options(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match &cli.command {
        None | Some(Command::Serve) => serve(&cli).await,
        Some(Command::Check { url }) => {
            let result = validate_url(url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(Command::Snapshot { url }) => {
            let capturer = cli.snapshot_capturer()?;
            let public_url = capturer.capture_screenshot(url).await?;
            println!("{public_url}");
            Ok(())
        }
        Some(Command::Audit { url }) => {
            let auditor = QualityAuditor::new(cli.audit_options());
            let score = auditor.run_lighthouse_audit(url).await;
            println!("{}", serde_json::to_string_pretty(&score)?);
            Ok(())
        }
    }
}

async fn serve(cli: &Cli) -> Result<()> {
    let links: Arc<dyn LinkRepository> = match &cli.database_url {
        Some(database_url) => Arc::new(
            PgLinkRepository::connect(database_url)
                .await
                .context("failed to connect to Postgres")?,
        ),
        None => {
            warn!("DATABASE_URL not set, links are kept in memory");
            Arc::new(MemoryLinkRepository::new())
        }
    };

    let checker = ReachabilityChecker::new(ReachabilityConfig::default())
        .context("failed to build the HTTP client")?;
    let mut orchestrator = ProbeOrchestrator::new(links.clone(), Arc::new(checker));

    if cli.snapshots_enabled {
        match cli.snapshot_capturer() {
            Ok(capturer) => orchestrator = orchestrator.with_capturer(Arc::new(capturer)),
            Err(e) => warn!(error = %format!("{e:#}"), "continuing without screenshots"),
        }
    }
    if cli.audits_enabled {
        orchestrator = orchestrator.with_auditor(Arc::new(QualityAuditor::new(cli.audit_options())));
    }

    let auth = AuthConfig::new(cli.api_token.as_deref());
    if !auth.is_configured() {
        warn!("API_TOKEN not set, link management routes will answer 503");
    }

    let app = create_router(AppState::new(links, orchestrator, auth));

    let listener = tokio::net::TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;

    info!(
        version = VERSION,
        addr = %cli.listen_addr,
        snapshots = cli.snapshots_enabled,
        audits = cli.audits_enabled,
        "linkfolio-agent listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
