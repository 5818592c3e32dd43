// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a probe that surfaces errors to its caller.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("URL is required")]
    UrlRequired,

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Private IP addresses are not allowed")]
    ForbiddenHost(String),

    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Navigation timed out after {}ms", .0.as_millis())]
    NavigationTimeout(Duration),

    #[error("Audit failed: {0}")]
    Audit(String),

    #[error("Failed to store screenshot: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// True for the input-validation failures raised before any I/O happens.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            ProbeError::UrlRequired | ProbeError::InvalidUrl | ProbeError::ForbiddenHost(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage is not configured: {0} is not set")]
    NotConfigured(&'static str),

    #[error("Failed to create storage client: {0}")]
    Client(String),

    #[error("Failed to upload object: {0}")]
    Upload(String),

    #[error("Failed to delete object: {0}")]
    Delete(String),

    #[error("URL does not belong to this storage: {0}")]
    ForeignUrl(String),
}

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Link {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_rejection_message() {
        let err = ProbeError::ForbiddenHost("10.0.0.1".to_string());
        assert_eq!(err.to_string(), "Private IP addresses are not allowed");
        assert!(err.is_rejected_input());
    }

    #[test]
    fn test_navigation_timeout_message() {
        let err = ProbeError::NavigationTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Navigation timed out after 30000ms");
        assert!(!err.is_rejected_input());
    }
}
