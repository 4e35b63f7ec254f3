//! HTTP transport for the hypermedia client.
//!
//! Implements [`hypermedia::Transport`] over a shared [`reqwest::Client`].
//! Non-success statuses are returned as ordinary responses; whether a status
//! counts as success is the caller's decision. Redirects are followed by
//! reqwest up to [`HttpTransportConfig::max_redirects`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use hypermedia::{Request, Response, Transport, TransportError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default redirect limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default `User-Agent`.
pub const DEFAULT_USER_AGENT: &str = concat!("hyres/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Maximum redirects followed; `0` disables redirects.
    pub max_redirects: usize,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl HttpTransportConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// Failure to construct the underlying HTTP client.
#[derive(Debug, thiserror::Error)]
#[error("Failed to create HTTP client: {0}")]
pub struct BuildError(#[from] reqwest::Error);

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Builds a transport from `config`.
    pub fn new(config: HttpTransportConfig) -> Result<Self, BuildError> {
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(redirect)
            .build()?;
        Ok(Self { client, config })
    }

    /// Wraps an existing client. `config` is informational only.
    pub fn from_client(client: reqwest::Client, config: HttpTransportConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .finish()
    }
}

/// Maps a reqwest failure onto the transport error taxonomy.
fn classify(error: reqwest::Error) -> TransportError {
    let message = error.to_string();
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() || error.is_redirect() {
        TransportError::Connection { message }
    } else if error.is_builder() || error.is_request() {
        TransportError::InvalidRequest { message }
    } else if error.is_body() || error.is_decode() {
        TransportError::Body { message }
    } else {
        TransportError::Connection { message }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: Request) -> Result<Response, TransportError> {
        let method = request.method.clone();
        let url = request.url.as_str().to_string();

        let mut builder = self
            .client
            .request(request.method, request.url.as_url().clone())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(%method, url = %url, error = %e, "HTTP request failed");
            classify(e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            warn!(%method, url = %url, error = %e, "Failed to read response body");
            classify(e)
        })?;

        debug!(%method, url = %url, status = status.as_u16(), bytes = body.len(), "HTTP response");
        Ok(Response::new(status, headers, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_values() {
        let config = HttpTransportConfig::default();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert!(config.user_agent.starts_with("hyres/"));
    }

    #[test]
    fn builders_override_defaults() {
        let config = HttpTransportConfig::default()
            .with_timeout(Duration::from_secs(2))
            .with_user_agent("probe/1")
            .with_max_redirects(0);
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "probe/1");
        assert_eq!(config.max_redirects, 0);
    }

    #[test]
    fn transport_builds_from_default_config() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        assert_eq!(transport.config().max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn transport_is_object_safe() {
        fn _assert(_: &dyn Transport) {}
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        _assert(&transport);
    }
}
