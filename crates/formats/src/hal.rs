//! HAL (`application/hal+json`).
//!
//! Links live under `_links`, keyed by relation, each value a single link
//! object or an array of them. `_links.curies` declares curie prefixes.
//! Embedded resources live under `_embedded` with the same single-or-array
//! shape. Every other top-level property is data.

use http::{HeaderMap, StatusCode};
use serde_json::Value;

use hypermedia::{
    applies_to_media_types, media_types_with, push_link, Context, CurieMap, CurieTemplate,
    DataEntry, Document, EmbeddedMap, Extension, LinkMap, Request, Resource,
};

use crate::shape::{link_object, object_field, one_or_many, str_field};

const MEDIA_TYPES: &[&str] = &["application/hal+json", "application/vnd.hal+json"];

const LINKS: &str = "_links";
const EMBEDDED: &str = "_embedded";
const CURIES: &str = "curies";

/// HAL format adapter.
#[derive(Debug, Clone)]
pub struct HalExtension {
    media_types: Vec<String>,
}

impl HalExtension {
    /// Creates the adapter, recognising `additional` media types after the
    /// two standard HAL types.
    pub fn new(additional: Vec<String>) -> Self {
        Self {
            media_types: media_types_with(MEDIA_TYPES, &additional),
        }
    }
}

impl Default for HalExtension {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Extension for HalExtension {
    fn name(&self) -> &str {
        "hal"
    }

    fn media_types(&self) -> &[String] {
        &self.media_types
    }

    fn applies(&self, _request: &Request, headers: &HeaderMap, status: StatusCode) -> bool {
        applies_to_media_types(headers, status, &self.media_types)
    }

    fn link_parser(
        &self,
        document: &Document,
        _headers: &HeaderMap,
        _request: &Request,
        _context: &Context,
    ) -> LinkMap {
        let mut links = LinkMap::new();
        let Some(container) = document.object().and_then(|o| object_field(o, LINKS)) else {
            return links;
        };

        for (relation, value) in container {
            if relation == CURIES {
                continue;
            }
            for link in one_or_many(value)
                .into_iter()
                .filter_map(Value::as_object)
                .filter_map(|obj| link_object(relation, obj))
            {
                push_link(&mut links, link);
            }
        }
        links
    }

    fn curie_prefix_parser(
        &self,
        document: &Document,
        _headers: &HeaderMap,
        _context: &Context,
    ) -> CurieMap {
        let Some(curies) = document
            .object()
            .and_then(|o| object_field(o, LINKS))
            .and_then(|links| links.get(CURIES))
        else {
            return CurieMap::new();
        };

        one_or_many(curies)
            .into_iter()
            .filter_map(Value::as_object)
            .filter(|obj| obj.get("templated").and_then(Value::as_bool) == Some(true))
            .filter_map(|obj| CurieTemplate::new(str_field(obj, "name")?, str_field(obj, "href")?))
            .map(|curie| (curie.name().to_string(), curie))
            .collect()
    }

    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        document
            .object()
            .map(|obj| {
                obj.iter()
                    .filter(|(key, _)| key.as_str() != LINKS && key.as_str() != EMBEDDED)
                    .map(|(key, value)| DataEntry::new(key, value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn embedded_parser(
        &self,
        document: &Document,
        headers: &HeaderMap,
        request: &Request,
        context: &Context,
    ) -> EmbeddedMap {
        let mut embedded = EmbeddedMap::new();
        let Some(container) = document.object().and_then(|o| object_field(o, EMBEDDED)) else {
            return embedded;
        };

        for (relation, value) in container {
            let resources: Vec<Resource> = one_or_many(value)
                .into_iter()
                .filter(|v| v.is_object())
                .map(|v| Resource::embedded_document(v.clone(), headers, request, context))
                .collect();
            embedded.entry(relation.clone()).or_default().extend(resources);
        }
        embedded
    }
}
