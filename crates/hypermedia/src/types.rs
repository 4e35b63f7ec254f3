//! Shared value types: documents, data entries, media types and timestamps.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A hypermedia document: the raw response body plus a lazily parsed JSON view.
///
/// Embedded sub-documents are built straight from their JSON value and carry
/// no raw bytes.
#[derive(Debug)]
pub struct Document {
    raw: Vec<u8>,
    json: OnceLock<Option<Value>>,
}

impl Document {
    /// Wraps a raw response body.
    pub fn from_bytes(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: raw.into(),
            json: OnceLock::new(),
        }
    }

    /// Wraps an already-parsed JSON value (embedded sub-documents).
    pub fn from_json(value: Value) -> Self {
        let json = OnceLock::new();
        let _ = json.set(Some(value));
        Self {
            raw: Vec::new(),
            json,
        }
    }

    /// Returns the document as JSON, or `None` if the body is not valid JSON.
    ///
    /// Parsed at most once.
    pub fn json(&self) -> Option<&Value> {
        self.json
            .get_or_init(|| serde_json::from_slice(&self.raw).ok())
            .as_ref()
    }

    /// Returns the top-level JSON object, if the document is one.
    pub fn object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.json().and_then(Value::as_object)
    }

    /// Returns the raw body as UTF-8 text.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.raw).ok()
    }

    /// Returns the raw body bytes (empty for embedded documents).
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }
}

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// One `{name, value}` pair produced by an extension's data parser.
///
/// Data is an ordered sequence of these; duplicate names are kept as
/// separate entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    /// Property name.
    pub name: String,
    /// Property value.
    pub value: Value,
}

impl DataEntry {
    /// Creates a new entry.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Media types
// ---------------------------------------------------------------------------

/// Returns the essence of the response's content type: lowercased, with
/// parameters such as `charset` stripped.
pub fn content_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Returns `true` if the response's content type equals one of `media_types`
/// (case-insensitive, parameters ignored).
pub fn content_type_matches(headers: &HeaderMap, media_types: &[String]) -> bool {
    match content_type(headers) {
        Some(essence) => media_types.iter().any(|m| m.eq_ignore_ascii_case(&essence)),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn content_type_strips_parameters() {
        let h = headers("Application/HAL+json; charset=utf-8");
        assert_eq!(content_type(&h).as_deref(), Some("application/hal+json"));
    }

    #[test]
    fn content_type_missing_header() {
        assert_eq!(content_type(&HeaderMap::new()), None);
        assert!(!content_type_matches(
            &HeaderMap::new(),
            &["application/json".to_string()]
        ));
    }

    #[test]
    fn document_json_is_lenient() {
        let doc = Document::from_bytes("not json");
        assert!(doc.json().is_none());
        assert_eq!(doc.text(), Some("not json"));

        let doc = Document::from_json(json!({"a": 1}));
        assert_eq!(doc.object().and_then(|o| o.get("a")), Some(&json!(1)));
        assert!(doc.bytes().is_empty());
    }
}
