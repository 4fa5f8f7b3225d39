//! Integration tests for the stream relay: Range passthrough, cache misses,
//! and bad-gateway handling.

mod common;

use std::time::Duration;

use common::TestHarness;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn uncached_identifier_is_404_without_any_backend_call() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let (_h, addr) = TestHarness::with_server(vec![backend.uri()]).await;

    let resp = reqwest::get(format!("http://{addr}/stream/UNKNOWN.mp4"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn full_fetch_passes_status_headers_and_body_through() {
    let backend = MockServer::start().await;
    let video: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    Mock::given(method("GET"))
        .and(path("/REC1.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/mp4")
                .insert_header("accept-ranges", "bytes")
                .set_body_bytes(video.clone()),
        )
        .mount(&backend)
        .await;

    let (h, addr) = TestHarness::with_server(vec![]).await;
    h.ctx
        .cache
        .put("REC1", format!("{}/REC1.mp4", backend.uri()));

    let resp = reqwest::get(format!("http://{addr}/stream/REC1.mp4"))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("content-type").unwrap(), "video/mp4");
    assert_eq!(resp.headers().get("accept-ranges").unwrap(), "bytes");
    assert_eq!(
        resp.headers().get("content-length").unwrap(),
        &video.len().to_string()
    );

    let body = resp.bytes().await.unwrap();
    assert_eq!(&body[..], &video[..]);
}

#[tokio::test]
async fn range_request_passes_206_and_content_range_through_verbatim() {
    let backend = MockServer::start().await;
    let chunk: Vec<u8> = (0..=255u8).cycle().skip(100).take(100).collect();
    // The backend only answers the exact forwarded Range header; if the
    // relay rewrote or dropped it, the mock would not match.
    Mock::given(method("GET"))
        .and(path("/REC1.mp4"))
        .and(header("range", "bytes=100-199"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 100-199/2048")
                .insert_header("accept-ranges", "bytes")
                .set_body_bytes(chunk.clone()),
        )
        .mount(&backend)
        .await;

    let (h, addr) = TestHarness::with_server(vec![]).await;
    h.ctx
        .cache
        .put("REC1", format!("{}/REC1.mp4", backend.uri()));

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/stream/REC1.mp4"))
        .header("Range", "bytes=100-199")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers().get("content-range").unwrap(),
        "bytes 100-199/2048"
    );
    assert_eq!(resp.headers().get("accept-ranges").unwrap(), "bytes");

    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), 100);
    assert_eq!(&body[..], &chunk[..]);
}

#[tokio::test]
async fn backend_416_passes_through() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/REC1.mp4"))
        .respond_with(
            ResponseTemplate::new(416).insert_header("content-range", "bytes */2048"),
        )
        .mount(&backend)
        .await;

    let (h, addr) = TestHarness::with_server(vec![]).await;
    h.ctx
        .cache
        .put("REC1", format!("{}/REC1.mp4", backend.uri()));

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/stream/REC1.mp4"))
        .header("Range", "bytes=9999-")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 416);
    assert_eq!(
        resp.headers().get("content-range").unwrap(),
        "bytes */2048"
    );
}

#[tokio::test]
async fn unreachable_backend_is_bad_gateway() {
    let (h, addr) = TestHarness::with_server(vec![]).await;
    // Nothing listens on port 1.
    h.ctx.cache.put("DEAD", "http://127.0.0.1:1/DEAD.mp4");

    let resp = reqwest::get(format!("http://{addr}/stream/DEAD.mp4"))
        .await
        .unwrap();

    assert_eq!(resp.status(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "bad_gateway");
    // No backend address leaks into the response.
    assert!(!body["error"].as_str().unwrap().contains("127.0.0.1"));
}

#[tokio::test]
async fn expired_cache_entry_is_404() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&backend)
        .await;

    let mut config = common::test_config(vec![]);
    config.dvr.cache_ttl_secs = 0;
    let (h, addr) = TestHarness::with_server_config(config, None).await;

    h.ctx
        .cache
        .put("REC1", format!("{}/REC1.mp4", backend.uri()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let resp = reqwest::get(format!("http://{addr}/stream/REC1.mp4"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
