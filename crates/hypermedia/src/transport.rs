//! The transport port.
//!
//! The core never issues HTTP requests itself. It builds a [`Request`] and
//! hands it to a [`Transport`] implementation supplied by an infrastructure
//! crate; redirects, TLS, retries and pooling are that crate's concern.

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, Method, StatusCode};

use crate::errors::TransportError;
use crate::identifiers::CanonicalUrl;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// A request the core wants issued.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute target URL.
    pub url: CanonicalUrl,
    /// Request headers (including `Accept`).
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a `GET` request with no headers.
    pub fn get(url: CanonicalUrl) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Adds a header, ignoring values that are not valid header text.
    pub fn with_header(mut self, name: http::header::HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }
}

/// A completed response as reported by the transport.
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Port trait
// ---------------------------------------------------------------------------

/// Issues requests on behalf of the resolution engine.
///
/// Any response, whatever its status, is `Ok`; only failures to obtain a
/// response at all are [`TransportError`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues `request` and returns the response.
    async fn request(&self, request: Request) -> Result<Response, TransportError>;
}

/// A transport that refuses every request.
///
/// Backs [`crate::Context::offline`], for parsing documents that were fetched
/// by other means.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn request(&self, request: Request) -> Result<Response, TransportError> {
        Err(TransportError::Unavailable {
            message: format!("offline context cannot fetch {}", request.url),
        })
    }
}
