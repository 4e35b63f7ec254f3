//! Plain text (`text/plain`): the whole body as a single `text` data entry.

use http::{HeaderMap, StatusCode};
use serde_json::Value;

use hypermedia::{
    applies_to_media_types, media_types_with, Context, DataEntry, Document, Extension, LinkMap,
    Request,
};

const MEDIA_TYPES: &[&str] = &["text/plain"];

/// Name of the data entry holding the body.
pub const TEXT_ENTRY: &str = "text";

/// Text format adapter.
#[derive(Debug, Clone)]
pub struct TextExtension {
    media_types: Vec<String>,
}

impl TextExtension {
    pub fn new(additional: Vec<String>) -> Self {
        Self {
            media_types: media_types_with(MEDIA_TYPES, &additional),
        }
    }
}

impl Default for TextExtension {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Extension for TextExtension {
    fn name(&self) -> &str {
        "text"
    }

    fn media_types(&self) -> &[String] {
        &self.media_types
    }

    fn applies(&self, _request: &Request, headers: &HeaderMap, status: StatusCode) -> bool {
        applies_to_media_types(headers, status, &self.media_types)
    }

    fn link_parser(&self, _: &Document, _: &HeaderMap, _: &Request, _: &Context) -> LinkMap {
        LinkMap::new()
    }

    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        let text = document
            .text()
            .map(str::to_string)
            .unwrap_or_else(|| String::from_utf8_lossy(document.bytes()).into_owned());
        vec![DataEntry::new(TEXT_ENTRY, Value::String(text))]
    }
}
