//! Newtype identifiers.
//!
//! [`TraversalId`] correlates every request issued on behalf of one
//! [`crate::Context`]; [`CanonicalUrl`] is the key of the context's resource
//! cache. Keeping them distinct from plain strings prevents keying the cache
//! by an href that has not been resolved and normalised yet.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::errors::{HyError, HyResult};

// ---------------------------------------------------------------------------
// Traversal identity
// ---------------------------------------------------------------------------

/// Identifies a single traversal (one [`crate::Context`]).
///
/// Generated fresh for every context; recorded on fetch spans so all
/// activity from a single traversal can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraversalId(Uuid);

impl TraversalId {
    /// Generates a new random traversal identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`TraversalId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for TraversalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Canonical URLs
// ---------------------------------------------------------------------------

/// An absolute, normalised URL.
///
/// Two hrefs that refer to the same target (`/a/../b` relative to
/// `http://Api.co`, and `http://api.co/b`) produce equal values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Parses an absolute URL.
    pub fn parse(href: &str) -> HyResult<Self> {
        Url::parse(href).map(Self).map_err(|e| HyError::InvalidHref {
            href: href.to_string(),
            reason: e.to_string(),
        })
    }

    /// Resolves `href` against an optional base.
    ///
    /// Absolute hrefs ignore the base. A relative href without a base is an
    /// [`HyError::InvalidHref`].
    pub fn resolve(href: &str, base: Option<&CanonicalUrl>) -> HyResult<Self> {
        match Url::parse(href) {
            Ok(url) => Ok(Self(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => match base {
                Some(base) => base.0.join(href).map(Self).map_err(|e| HyError::InvalidHref {
                    href: href.to_string(),
                    reason: e.to_string(),
                }),
                None => Err(HyError::InvalidHref {
                    href: href.to_string(),
                    reason: "relative href with no base URL".to_string(),
                }),
            },
            Err(e) => Err(HyError::InvalidHref {
                href: href.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying [`Url`].
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl From<Url> for CanonicalUrl {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_href_resolves_against_base() {
        let base = CanonicalUrl::parse("http://api.co/orders/").unwrap();
        let url = CanonicalUrl::resolve("123", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://api.co/orders/123");

        let url = CanonicalUrl::resolve("/posts/1", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "http://api.co/posts/1");
    }

    #[test]
    fn equivalent_hrefs_are_equal() {
        let base = CanonicalUrl::parse("http://API.co/").unwrap();
        let a = CanonicalUrl::resolve("/a/../b", Some(&base)).unwrap();
        let b = CanonicalUrl::parse("http://api.co/b").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn relative_href_without_base_is_invalid() {
        let err = CanonicalUrl::resolve("/orders", None).unwrap_err();
        assert!(matches!(err, HyError::InvalidHref { .. }));
    }

    #[test]
    fn traversal_ids_are_unique() {
        assert_ne!(TraversalId::new_random(), TraversalId::new_random());
    }
}
