// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::{Duration, Instant};
use webcraft::engines::fetch_engine::FetchEngine;
use webcraft::engines::traits::FetchRequest;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(url: String, max_retries: u32) -> FetchRequest {
    let mut request = FetchRequest::get(url);
    request.max_retries = max_retries;
    request.retry_delay = Duration::from_millis(50);
    request.timeout = Duration::from_secs(5);
    request
}

#[tokio::test]
async fn test_fetch_success_returns_decoded_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("hello world")
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let engine = FetchEngine::default();
    let result = engine.fetch(&request(server.uri(), 0)).await;

    assert!(result.success);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.raw_content, "hello world");
    assert_eq!(result.content_length, 11);
    assert_eq!(result.encoding, "utf-8");
    assert!(result.response_time_seconds >= 0.0);
    assert!(result.error_message.is_none());
}

#[tokio::test]
async fn test_http_error_status_is_still_transport_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let engine = FetchEngine::default();
    let result = engine.fetch(&request(server.uri(), 0)).await;

    // HTTP层的失败状态由调用方判断，传输层视为成功
    assert!(result.success);
    assert_eq!(result.status_code, 503);
}

#[tokio::test]
async fn test_transport_failure_returns_status_zero() {
    // 未监听的端口，连接被拒绝
    let engine = FetchEngine::default();
    let result = engine
        .fetch(&request("http://127.0.0.1:1/".to_string(), 0))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 0);
    assert!(result.error_message.is_some());
    assert!(result.raw_content.is_empty());
}

#[tokio::test]
async fn test_retry_exhausts_all_attempts_and_returns_last_result() {
    let server = MockServer::start().await;
    // max_retries=2 → 恰好3次尝试
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let engine = FetchEngine::default();
    let started = Instant::now();
    let result = engine.fetch_with_retry(&request(server.uri(), 2)).await;
    let elapsed = started.elapsed();

    assert!(result.success);
    assert_eq!(result.status_code, 500);
    // 线性退避：累计休眠约 delay*(1+2)
    assert!(
        elapsed >= Duration::from_millis(150),
        "expected at least 150ms of backoff, got {:?}",
        elapsed
    );

    server.verify().await;
}

#[tokio::test]
async fn test_retry_stops_early_on_http_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let engine = FetchEngine::default();
    let result = engine.fetch_with_retry(&request(server.uri(), 3)).await;

    assert_eq!(result.status_code, 200);
    server.verify().await;
}

#[tokio::test]
async fn test_retry_on_transport_failure_returns_last_failure() {
    let engine = FetchEngine::default();
    let started = Instant::now();
    let result = engine
        .fetch_with_retry(&request("http://127.0.0.1:1/".to_string(), 2))
        .await;
    let elapsed = started.elapsed();

    assert!(!result.success);
    assert_eq!(result.status_code, 0);
    assert!(elapsed >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_query_params_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(wiremock::matchers::query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(format!("{}/search", server.uri()), 0);
    req.params.insert("q".to_string(), "rust".to_string());

    let engine = FetchEngine::default();
    let result = engine.fetch(&req).await;

    assert_eq!(result.status_code, 200);
    server.verify().await;
}
