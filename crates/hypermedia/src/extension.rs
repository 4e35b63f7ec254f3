//! The extension contract: one pluggable adapter per hypermedia media-type
//! family.
//!
//! An [`Extension`] is constructed once per client configuration and is
//! immutable and stateless afterwards; all per-document state flows through
//! the parser arguments. The [`crate::Context`] keeps extensions in an
//! ordered registry and selects the first whose [`Extension::applies`]
//! returns `true`.
//!
//! ## Leniency
//!
//! Parsers never fail. Hypermedia documents vary in completeness, so a
//! missing or mis-shaped container is treated as empty.

use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;

use crate::context::Context;
use crate::curie::CurieMap;
use crate::link::LinkMap;
use crate::resource::Resource;
use crate::transport::Request;
use crate::types::{content_type_matches, DataEntry, Document};

/// Embedded sub-resources keyed by relation, each relation in document order.
pub type EmbeddedMap = IndexMap<String, Vec<Resource>>;

/// A format adapter.
pub trait Extension: Send + Sync + std::fmt::Debug {
    /// Short name used in logs (e.g. `"hal"`).
    fn name(&self) -> &str;

    /// Media types this adapter recognises: built-ins first, then any
    /// caller-configured extras, duplicates preserved as given.
    fn media_types(&self) -> &[String];

    /// Whether this adapter can parse the given response.
    fn applies(&self, request: &Request, headers: &HeaderMap, status: StatusCode) -> bool;

    /// Extracts the document's links keyed by relation name as written.
    ///
    /// Curie-compact names are kept compact; they are resolved against the
    /// context's bindings when a relation is looked up.
    fn link_parser(
        &self,
        document: &Document,
        headers: &HeaderMap,
        request: &Request,
        context: &Context,
    ) -> LinkMap;

    /// Extracts curie bindings declared by the document.
    fn curie_prefix_parser(
        &self,
        _document: &Document,
        _headers: &HeaderMap,
        _context: &Context,
    ) -> CurieMap {
        CurieMap::new()
    }

    /// Extracts data properties in document order.
    fn data_parser(&self, document: &Document, headers: &HeaderMap) -> Vec<DataEntry>;

    /// Builds embedded sub-resources bound to `context`.
    ///
    /// `request` is the request that produced the enclosing document; embedded
    /// resources resolve their relative hrefs against its URL.
    fn embedded_parser(
        &self,
        _document: &Document,
        _headers: &HeaderMap,
        _request: &Request,
        _context: &Context,
    ) -> EmbeddedMap {
        EmbeddedMap::new()
    }
}

/// Standard applicability test shared by the built-in formats: the status is
/// not `204 No Content` and the content type (parameters ignored) is one of
/// `media_types`.
pub fn applies_to_media_types(
    headers: &HeaderMap,
    status: StatusCode,
    media_types: &[String],
) -> bool {
    status != StatusCode::NO_CONTENT && content_type_matches(headers, media_types)
}

/// Concatenates built-in media types with caller-supplied extras.
pub fn media_types_with(builtin: &[&str], additional: &[String]) -> Vec<String> {
    builtin
        .iter()
        .map(|m| m.to_string())
        .chain(additional.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[test]
    fn extension_is_object_safe() {
        fn _assert_object_safe(_: &dyn Extension) {}
    }

    #[test]
    fn no_content_never_applies() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/hal+json"));
        let types = vec!["application/hal+json".to_string()];
        assert!(applies_to_media_types(&headers, StatusCode::OK, &types));
        assert!(!applies_to_media_types(&headers, StatusCode::NO_CONTENT, &types));
    }

    #[test]
    fn media_types_keep_order_and_duplicates() {
        let extra = vec!["application/x+json".to_string(), "application/a".to_string()];
        assert_eq!(
            media_types_with(&["application/a", "application/b"], &extra),
            vec!["application/a", "application/b", "application/x+json", "application/a"]
        );
    }
}
