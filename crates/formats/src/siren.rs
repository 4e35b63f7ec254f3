//! Siren (`application/vnd.siren+json`).
//!
//! `links[]` carries an array of relations per link. Sub-entities in
//! `entities[]` are either embedded links (an `href` and nothing else of
//! substance) or full embedded representations; the former become links and
//! the latter embedded resources, under every relation they list.
//! `properties` is the data.

use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

use hypermedia::{
    applies_to_media_types, media_types_with, push_link, Context, DataEntry, Document,
    EmbeddedMap, Extension, Link, LinkMap, Request, Resource,
};

use crate::shape::{array_field, object_field, str_field};

const MEDIA_TYPES: &[&str] = &["application/vnd.siren+json"];

/// Siren format adapter.
#[derive(Debug, Clone)]
pub struct SirenExtension {
    media_types: Vec<String>,
}

impl SirenExtension {
    pub fn new(additional: Vec<String>) -> Self {
        Self {
            media_types: media_types_with(MEDIA_TYPES, &additional),
        }
    }
}

impl Default for SirenExtension {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn relations(object: &Map<String, Value>) -> Vec<&str> {
    match object.get("rel") {
        Some(Value::Array(rels)) => rels.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(rel)) => vec![rel.as_str()],
        _ => Vec::new(),
    }
}

fn siren_link(relation: &str, object: &Map<String, Value>) -> Option<Link> {
    let href = str_field(object, "href")?;
    let mut link = Link::new(relation, href);
    link.title = str_field(object, "title");
    link.media_type = str_field(object, "type");
    Some(link)
}

/// An embedded link has an `href` and no representation of its own.
fn is_embedded_link(entity: &Map<String, Value>) -> bool {
    entity.contains_key("href")
        && !["properties", "links", "entities", "actions"]
            .iter()
            .any(|key| entity.contains_key(*key))
}

impl Extension for SirenExtension {
    fn name(&self) -> &str {
        "siren"
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
        let Some(root) = document.object() else {
            return links;
        };

        let declared = array_field(root, "links").iter().filter_map(Value::as_object);
        let entity_links = array_field(root, "entities")
            .iter()
            .filter_map(Value::as_object)
            .filter(|entity| is_embedded_link(entity));

        for object in declared.chain(entity_links) {
            for relation in relations(object) {
                if let Some(link) = siren_link(relation, object) {
                    push_link(&mut links, link);
                }
            }
        }
        links
    }

    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        document
            .object()
            .and_then(|root| object_field(root, "properties"))
            .map(|props| {
                props
                    .iter()
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
        let Some(root) = document.object() else {
            return embedded;
        };

        for entity in array_field(root, "entities")
            .iter()
            .filter_map(Value::as_object)
            .filter(|entity| !is_embedded_link(entity))
        {
            let rels = relations(entity);
            if rels.is_empty() {
                continue;
            }
            let resource = Resource::embedded_document(
                Value::Object(entity.clone()),
                headers,
                request,
                context,
            );
            for relation in rels {
                embedded
                    .entry(relation.to_string())
                    .or_default()
                    .push(resource.clone());
            }
        }
        embedded
    }
}
