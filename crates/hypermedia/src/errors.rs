//! Error types for the hypermedia client core.
//!
//! [`HyError`] covers every failure a caller can observe from the resource
//! graph: structural lookups that fail synchronously, and resolution failures
//! that surface through the deferred value returned by a follow.
//!
//! [`TransportError`] is the error half of the [`crate::Transport`] port.
//! Infrastructure crates map their client library errors into it; the core
//! never sees those libraries directly.
//!
//! Malformed documents are deliberately *not* represented here. Extension
//! parsers treat absent or mis-shaped structure as empty.

use std::sync::Arc;

use http::StatusCode;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport port errors
// ---------------------------------------------------------------------------

/// Failure reported by a [`crate::Transport`] implementation.
///
/// Receiving any response, whatever its status code, is *not* a transport
/// error; status handling belongs to the resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established or was reset mid-request.
    #[error("connection failed: {message}")]
    Connection {
        /// Description from the underlying client.
        message: String,
    },

    /// The request did not complete within the transport's configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request could not be built (bad header value, unsupported scheme).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {message}")]
    Body {
        /// Description from the underlying client.
        message: String,
    },

    /// The transport refuses to issue requests at all (see [`crate::OfflineTransport`]).
    #[error("transport unavailable: {message}")]
    Unavailable {
        /// Why no request can be issued.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Resource graph errors
// ---------------------------------------------------------------------------

/// Errors observable from [`crate::Resource`] accessors and resolution.
///
/// `Clone` so that a single failed fetch can be handed to every caller
/// attached to it.
#[derive(Debug, Clone, Error)]
pub enum HyError {
    /// The requested relation, or the requested index within it, is absent.
    ///
    /// Produced synchronously by `link`, `embedded` and `follow`; the
    /// transport is never touched.
    #[error("relation '{relation}' not found at index {index}")]
    RelationNotFound {
        /// Relation name as requested by the caller.
        relation: String,
        /// Zero-based position requested within the relation.
        index: usize,
    },

    /// The transport could not complete the request.
    #[error("transport failure fetching {url}: {source}")]
    TransportFailure {
        /// Canonical URL that was being fetched.
        url: String,
        /// Error reported by the transport.
        #[source]
        source: Arc<TransportError>,
    },

    /// The transport completed but the status code is not accepted as success.
    #[error("unexpected status {status} fetching {url}")]
    UnexpectedStatus {
        /// Canonical URL that was fetched.
        url: String,
        /// Status code returned.
        status: StatusCode,
    },

    /// A link target could not be turned into an absolute URL.
    #[error("invalid href '{href}': {reason}")]
    InvalidHref {
        /// The href (after template expansion) that failed to resolve.
        href: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Resolution was requested on a resource that has no href.
    #[error("resource has no href to resolve")]
    MissingHref,

    /// A pending fetch was polled after every handle on its context was dropped.
    #[error("resolution context was dropped before the fetch completed")]
    ContextDropped,
}

impl HyError {
    /// Returns `true` for synchronous structural errors the caller can avoid by
    /// feature-detecting before acting (missing relation, unusable href).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HyError::RelationNotFound { .. } | HyError::InvalidHref { .. } | HyError::MissingHref
        )
    }

    /// Returns the status code for [`HyError::UnexpectedStatus`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HyError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn relation_not_found(relation: &str, index: usize) -> Self {
        HyError::RelationNotFound {
            relation: relation.to_string(),
            index,
        }
    }
}

/// Result alias used throughout the crate.
pub type HyResult<T> = Result<T, HyError>;
