//! Plain JSON (`application/json`): no hypermedia controls, top-level object
//! properties as data.

use http::{HeaderMap, StatusCode};

use hypermedia::{
    applies_to_media_types, media_types_with, Context, DataEntry, Document, Extension, LinkMap,
    Request,
};

const MEDIA_TYPES: &[&str] = &["application/json"];

/// JSON format adapter.
#[derive(Debug, Clone)]
pub struct JsonExtension {
    media_types: Vec<String>,
}

impl JsonExtension {
    pub fn new(additional: Vec<String>) -> Self {
        Self {
            media_types: media_types_with(MEDIA_TYPES, &additional),
        }
    }
}

impl Default for JsonExtension {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Extension for JsonExtension {
    fn name(&self) -> &str {
        "json"
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

    /// Non-object documents (arrays, scalars) yield no data.
    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        document
            .object()
            .map(|obj| {
                obj.iter()
                    .map(|(key, value)| DataEntry::new(key, value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
