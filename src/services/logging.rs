// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Logging setup and redaction of user-supplied URLs.

use tracing_subscriber::EnvFilter;
use url::Url;

/// Install the global `fmt` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// URL safe to write to logs: credentials and query string are masked.
/// "https://user:pw@example.com/a?token=x" -> "https://***@example.com/a?***"
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw.trim()) else {
        return raw.chars().take(200).collect();
    };

    let had_credentials = !url.username().is_empty() || url.password().is_some();
    if had_credentials {
        // Only fails for cannot-be-a-base URLs, which carry no credentials
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    if url.query().is_some() {
        url.set_query(Some("***"));
    }
    url.set_fragment(None);

    let rendered = url.to_string();
    if had_credentials {
        if let Some((scheme, rest)) = rendered.split_once("://") {
            return format!("{scheme}://***@{rest}");
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_plain_url_is_unchanged() {
        assert_eq!(redact_url("https://example.com/projects"), "https://example.com/projects");
    }

    #[test]
    fn test_redact_credentials_and_query() {
        assert_eq!(
            redact_url("https://user:pw@example.com/a?token=x#top"),
            "https://***@example.com/a?***"
        );
    }

    #[test]
    fn test_redact_unparseable_input_is_truncated() {
        let long = "x".repeat(500);
        assert_eq!(redact_url(&long).len(), 200);
        assert_eq!(redact_url("not a url"), "not a url");
    }
}
