//! HTTP transport against a mock server.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use formats::default_extensions;
use http_transport::{HttpTransport, HttpTransportConfig};
use hypermedia::http::StatusCode;
use hypermedia::{CanonicalUrl, Client, HyError, Request, Transport, TransportError};

fn transport(config: HttpTransportConfig) -> HttpTransport {
    HttpTransport::new(config).unwrap()
}

fn url(server: &MockServer, p: &str) -> CanonicalUrl {
    CanonicalUrl::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

#[tokio::test]
async fn returns_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/things"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/hal+json")
                .set_body_string(r#"{"ok":true}"#),
        )
        .mount(&server)
        .await;

    let response = transport(HttpTransportConfig::default())
        .request(Request::get(url(&server, "/things")))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get("content-type").unwrap(),
        "application/hal+json"
    );
    assert_eq!(response.body, br#"{"ok":true}"#.to_vec());
}

#[tokio::test]
async fn error_statuses_are_responses_not_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = transport(HttpTransportConfig::default())
        .request(Request::get(url(&server, "/missing")))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sends_request_headers_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("accept", "application/hal+json"))
        .and(header("user-agent", "probe/1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::get(url(&server, "/"))
        .with_header(hypermedia::http::header::ACCEPT, "application/hal+json");
    let response = transport(HttpTransportConfig::default().with_user_agent("probe/1"))
        .request(request)
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = transport(HttpTransportConfig::default().with_timeout(Duration::from_millis(100)))
        .request(Request::get(url(&server, "/")))
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Timeout);
}

#[tokio::test]
async fn refused_connections_are_connection_errors() {
    let request = Request::get(CanonicalUrl::parse("http://127.0.0.1:1/").unwrap());
    let err = transport(HttpTransportConfig::default())
        .request(request)
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Connection { .. }));
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let response = transport(HttpTransportConfig::default())
        .request(Request::get(url(&server, "/old")))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);

    let response = transport(HttpTransportConfig::default().with_max_redirects(0))
        .request(Request::get(url(&server, "/old")))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::MOVED_PERMANENTLY);
}

#[tokio::test]
async fn client_traverses_a_live_hal_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            serde_json::to_vec(&json!({
                "_links": {"self": {"href": "/"}, "next": {"href": "/page/2"}},
                "page": 1
            }))
            .unwrap(),
            "application/hal+json",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/2"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(
        Arc::new(transport(HttpTransportConfig::default())),
        default_extensions(),
    );
    let root = client
        .root(&format!("{}/", server.uri()))
        .unwrap()
        .resolved()
        .await
        .unwrap();
    assert_eq!(root.data("page"), Some(json!(1)));

    let err = root.follow("next", 0).unwrap().resolved().await.unwrap_err();
    assert!(matches!(err, HyError::UnexpectedStatus { status, .. } if status == StatusCode::GONE));
}
