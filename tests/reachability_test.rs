// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Reachability classification against local mock endpoints.
//!
//! The mock server listens on loopback, which the outbound guard refuses. Requests go
//! to the public-looking host `probe.test` instead, pinned to the mock's address with a
//! resolver override, so the guard stays active in every test.

use linkfolio_agent::models::probe::ReachabilityStatus;
use linkfolio_agent::services::reachability::{
    ReachabilityChecker, ReachabilityConfig, DEFAULT_USER_AGENT,
};
use std::net::SocketAddr;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST: &str = "probe.test";

fn client_for(addr: SocketAddr) -> reqwest::ClientBuilder {
    reqwest::Client::builder().no_proxy().resolve(HOST, addr)
}

fn checker(addr: SocketAddr, config: ReachabilityConfig) -> ReachabilityChecker {
    let client = client_for(addr).build().unwrap();
    ReachabilityChecker::with_client(client, config)
}

fn target(addr: SocketAddr, route: &str) -> String {
    format!("http://{HOST}:{}{route}", addr.port())
}

async fn mock(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fast_ok_is_live() {
    let server = MockServer::start().await;
    mock(&server, "/ok", ResponseTemplate::new(200)).await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/ok"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Live);
    assert_eq!(result.status_code, Some(200));
    assert!(result.response_time_ms.unwrap() < 1_000);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_ok_after_four_seconds_is_slow() {
    let server = MockServer::start().await;
    mock(
        &server,
        "/sluggish",
        ResponseTemplate::new(200).set_delay(Duration::from_secs(4)),
    )
    .await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/sluggish"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Slow);
    assert_eq!(result.status_code, Some(200));
    assert!(result.response_time_ms.unwrap() >= 4_000);
}

#[tokio::test]
async fn test_not_found_is_down() {
    let server = MockServer::start().await;
    mock(&server, "/gone", ResponseTemplate::new(404)).await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/gone"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Down);
    assert_eq!(result.status_code, Some(404));
}

#[tokio::test]
async fn test_server_error_is_down() {
    let server = MockServer::start().await;
    mock(&server, "/broken", ResponseTemplate::new(503)).await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/broken"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Down);
    assert_eq!(result.status_code, Some(503));
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let server = MockServer::start().await;
    mock(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/new"),
    )
    .await;
    mock(&server, "/new", ResponseTemplate::new(200)).await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/old"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Live);
    assert_eq!(result.status_code, Some(200));
}

#[tokio::test]
async fn test_connection_refused_is_down() {
    // Reserve a port, then free it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Down);
    assert!(result.status_code.is_none());
    assert!(result.error.is_some());
    assert!(result.response_time_ms.is_some());
}

#[tokio::test]
async fn test_budget_exhausted_is_slow() {
    let server = MockServer::start().await;
    mock(
        &server,
        "/hang",
        ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
    )
    .await;
    let addr = *server.address();

    let budget = Duration::from_millis(500);
    let config = ReachabilityConfig {
        timeout: budget,
        ..ReachabilityConfig::default()
    };
    let result = checker(addr, config).check(&target(addr, "/hang")).await;

    assert_eq!(result.status, ReachabilityStatus::Slow);
    assert_eq!(result.error.as_deref(), Some("Slow response (timed out)"));
    assert!(result.response_time_ms.unwrap() >= 500);
    assert!(result.status_code.is_none());
}

#[tokio::test]
async fn test_timeout_before_budget_is_down() {
    let server = MockServer::start().await;
    mock(
        &server,
        "/hang",
        ResponseTemplate::new(200).set_delay(Duration::from_secs(5)),
    )
    .await;
    let addr = *server.address();

    // Transport gives up well before the probe's own budget runs out
    let client = client_for(addr)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let config = ReachabilityConfig {
        timeout: Duration::from_secs(3),
        ..ReachabilityConfig::default()
    };
    let result = ReachabilityChecker::with_client(client, config)
        .check(&target(addr, "/hang"))
        .await;

    assert_eq!(result.status, ReachabilityStatus::Down);
    assert_eq!(result.error.as_deref(), Some("Request timeout"));
    assert!(result.response_time_ms.unwrap() < 3_000);
}

#[tokio::test]
async fn test_sends_probe_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let addr = *server.address();

    let result = checker(addr, ReachabilityConfig::default())
        .check(&target(addr, "/ua"))
        .await;

    assert_eq!(result.status_code, Some(204));
    assert_eq!(result.status, ReachabilityStatus::Live);
}

#[tokio::test]
async fn test_repeated_checks_agree() {
    let server = MockServer::start().await;
    mock(&server, "/stable", ResponseTemplate::new(200)).await;
    let addr = *server.address();
    let checker = checker(addr, ReachabilityConfig::default());

    let first = checker.check(&target(addr, "/stable")).await;
    let second = checker.check(&target(addr, "/stable")).await;

    assert_eq!(first.status, second.status);
    assert_eq!(first.status_code, second.status_code);
}

#[tokio::test]
async fn test_host_just_outside_private_range_is_attempted() {
    let client = reqwest::Client::builder()
        .no_proxy()
        .connect_timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let config = ReachabilityConfig {
        timeout: Duration::from_secs(2),
        ..ReachabilityConfig::default()
    };

    let result = ReachabilityChecker::with_client(client, config)
        .check("http://172.32.0.1/")
        .await;

    // Whatever the network does, a request was issued rather than refused up front
    assert!(result.response_time_ms.is_some());
    assert_ne!(
        result.error.as_deref(),
        Some("Private IP addresses are not allowed")
    );
}
