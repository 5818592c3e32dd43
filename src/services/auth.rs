// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use sha2::{Digest, Sha256};

/// API token check for the link management routes.
///
/// Only the SHA-256 digest of the configured token is kept in memory.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    token_hash: Option<String>,
}

impl AuthConfig {
    /// Accept bearer tokens equal to `token`. An empty or absent token disables the
    /// protected routes entirely.
    pub fn new(token: Option<&str>) -> Self {
        let token_hash = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Self::hash_token);
        Self { token_hash }
    }

    pub fn is_configured(&self) -> bool {
        self.token_hash.is_some()
    }

    /// Hash a token with SHA-256 and hex-encode it.
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when `presented` matches the configured token.
    pub fn verify(&self, presented: &str) -> bool {
        match &self.token_hash {
            Some(expected) => *expected == Self::hash_token(presented),
            None => false,
        }
    }
}
