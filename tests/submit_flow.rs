//! End-to-end tests for the submit flow: validate, fetch through the proxy,
//! parse, commit.
//!
//! Each test starts its own mock proxy so request expectations are isolated.

use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rsswatch::app::App;
use rsswatch::error::ErrorKind;
use rsswatch::feed::ProxyClient;
use rsswatch::state::{Changes, Process};

const TEST_RSS: &str = r#"<?xml version="1.0"?>
          <rss><channel>
            <title>Тестовый фид</title>
            <description>Тестовое описание</description>
            <item>
              <title>Тестовый пост</title>
              <link>https://example.com/test</link>
              <description>Тестовое содержание</description>
            </item>
          </channel></rss>"#;

async fn test_app(server: &MockServer) -> App {
    let base = Url::parse(&format!("{}/get", server.uri())).unwrap();
    let client = ProxyClient::new(base, Duration::from_secs(5)).unwrap();
    let (tx, _rx) = mpsc::channel(8);
    App::new(client, tx)
}

fn proxy_answer(contents: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "contents": contents }))
}

// ============================================================================
// Successful submission
// ============================================================================

#[tokio::test]
async fn test_submit_valid_feed_adds_feed_and_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("url", "https://example.com/rss.xml"))
        .and(query_param("disableCache", "true"))
        .respond_with(proxy_answer(TEST_RSS))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    let changes = app.submit_and_wait("https://example.com/rss.xml").await;

    assert_eq!(changes, Changes::FEEDS | Changes::POSTS | Changes::FORM);
    let state = app.state();
    assert_eq!(state.form().process, Process::Success);
    assert_eq!(state.form().error, None);

    assert_eq!(state.feeds().len(), 1);
    assert_eq!(state.feeds()[0].title, "Тестовый фид");
    assert_eq!(state.feeds()[0].description, "Тестовое описание");
    assert_eq!(state.feeds()[0].url, "https://example.com/rss.xml");

    assert_eq!(state.posts().len(), 1);
    assert_eq!(state.posts()[0].title, "Тестовый пост");
    assert_eq!(state.posts()[0].feed_id, state.feeds()[0].id);
}

// ============================================================================
// Rejected submissions
// ============================================================================

#[tokio::test]
async fn test_submit_invalid_url_is_rejected_without_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(proxy_answer(TEST_RSS))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    let changes = app.submit_and_wait("не-ссылка").await;

    assert_eq!(changes, Changes::FORM);
    assert_eq!(app.state().form().process, Process::Error);
    assert_eq!(app.state().form().error, Some(ErrorKind::InvalidUrl));
    assert!(app.state().feeds().is_empty());
    assert!(app.state().posts().is_empty());
}

#[tokio::test]
async fn test_submit_empty_input_is_missing_url() {
    let server = MockServer::start().await;
    let mut app = test_app(&server).await;

    app.submit_and_wait("   ").await;
    assert_eq!(app.state().form().error, Some(ErrorKind::MissingUrl));
}

#[tokio::test]
async fn test_submit_duplicate_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(proxy_answer(TEST_RSS))
        .expect(1) // only the first submission reaches the proxy
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    app.submit_and_wait("https://example.com/rss.xml").await;
    assert_eq!(app.state().feeds().len(), 1);

    let changes = app.submit_and_wait(" https://example.com/rss.xml ").await;
    assert_eq!(changes, Changes::FORM);
    assert_eq!(app.state().form().error, Some(ErrorKind::DuplicateFeed));
    assert_eq!(app.state().feeds().len(), 1);
    assert_eq!(app.state().posts().len(), 1);
}

// ============================================================================
// Fetch and parse failures
// ============================================================================

#[tokio::test]
async fn test_non_feed_document_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(proxy_answer("<html><body>not a feed</body></html>"))
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    app.submit_and_wait("https://example.com/index.html").await;

    assert_eq!(app.state().form().error, Some(ErrorKind::MalformedDocument));
    assert!(app.state().feeds().is_empty());
}

#[tokio::test]
async fn test_proxy_failure_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    app.submit_and_wait("https://example.com/rss.xml").await;

    assert_eq!(app.state().form().error, Some(ErrorKind::NetworkError));
    assert!(app.state().feeds().is_empty());
}

#[tokio::test]
async fn test_error_cleared_by_next_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(proxy_answer(TEST_RSS))
        .mount(&server)
        .await;

    let mut app = test_app(&server).await;
    app.submit_and_wait("не-ссылка").await;
    assert_eq!(app.state().form().process, Process::Error);

    app.submit_and_wait("https://example.com/rss.xml").await;
    assert_eq!(app.state().form().process, Process::Success);
    assert_eq!(app.state().form().error, None);
}
