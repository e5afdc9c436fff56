#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use skyglass_api::{ApiClient, CachePolicy, Error, ServerDescriptor};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let api_base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), api_base);
    (server, client)
}

const CACHE_FIRST: CachePolicy = CachePolicy::CacheFirst {
    ttl: Duration::from_secs(60),
};

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_servers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "name": "Alpha" }, { "name": "Bravo" }])),
        )
        .mount(&server)
        .await;

    let servers = client.list_servers(CACHE_FIRST).await.unwrap();

    assert_eq!(
        servers,
        vec![
            ServerDescriptor { name: "Alpha".into() },
            ServerDescriptor { name: "Bravo".into() },
        ]
    );
}

#[tokio::test]
async fn test_cache_first_reuses_successful_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "Alpha" }])))
        .expect(1)
        .mount(&server)
        .await;

    client.list_servers(CACHE_FIRST).await.unwrap();
    let again = client.list_servers(CACHE_FIRST).await.unwrap();

    assert_eq!(again.len(), 1);
    // `expect(1)` is verified when the server drops.
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "Alpha" }])))
        .mount(&server)
        .await;

    let first = client.list_servers(CACHE_FIRST).await;
    assert!(
        matches!(first, Err(Error::Http { status: 502, .. })),
        "expected HTTP 502, got: {first:?}"
    );

    let second = client.list_servers(CACHE_FIRST).await.unwrap();
    assert_eq!(second[0].name, "Alpha");
}

// ── Session state ───────────────────────────────────────────────────

#[tokio::test]
async fn test_server_state_sends_no_cache_headers() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/Alpha"))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entities": {
                "0": {
                    "id": 0,
                    "properties": { "ReferenceLatitude": 30, "ReferenceLongitude": 31 }
                }
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let state = client.server_state("Alpha", CachePolicy::NoCache).await.unwrap();
    let global = state.entity(0).unwrap();
    assert_eq!(
        global.property("ReferenceLatitude").and_then(|v| v.as_f64()),
        Some(30.0)
    );

    // A second no-cache read must reach the backend again.
    client.server_state("Alpha", CachePolicy::NoCache).await.unwrap();
}

#[tokio::test]
async fn test_server_state_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/Gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client.server_state("Gone", CachePolicy::NoCache).await;
    let err = result.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
}

#[tokio::test]
async fn test_server_state_invalid_json() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/Alpha"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.server_state("Alpha", CachePolicy::NoCache).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let client = ApiClient::with_client(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap(),
        Url::parse("http://127.0.0.1:9/api/").unwrap(),
    );

    let result = client.list_servers(CachePolicy::NoCache).await;
    assert!(
        matches!(result, Err(Error::Transport(_))),
        "expected transport error, got: {result:?}"
    );
}
