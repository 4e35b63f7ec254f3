//! Collection+JSON (`application/vnd.collection+json`).
//!
//! The collection's `href` is its `self` link and `links[]` its other links.
//! Each entry of `queries[]` becomes a templated link whose query string
//! lists the query's data names. Items are embedded under `item`; they have
//! their own shape (`href`, `data[]`, `links[]`) and are parsed by
//! [`CollectionItemExtension`], which never takes part in negotiation.

use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

use hypermedia::{
    applies_to_media_types, media_types_with, push_link, Context, DataEntry, Document,
    EmbeddedMap, Extension, Link, LinkMap, Request, Resource,
};

use crate::shape::{array_field, object_field, str_field};

const MEDIA_TYPES: &[&str] = &["application/vnd.collection+json"];

/// Relation under which collection items are embedded.
pub const ITEM_RELATION: &str = "item";

fn collection_link(object: &Map<String, Value>) -> Option<Link> {
    let relation = str_field(object, "rel")?;
    let href = str_field(object, "href")?;
    let mut link = Link::new(relation, href);
    link.title = str_field(object, "prompt");
    link.name = str_field(object, "name");
    Some(link)
}

fn query_link(object: &Map<String, Value>) -> Option<Link> {
    let relation = str_field(object, "rel")?;
    let href = str_field(object, "href")?;
    let names: Vec<String> = array_field(object, "data")
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|d| str_field(d, "name"))
        .collect();

    let mut link = if names.is_empty() {
        Link::new(relation, href)
    } else {
        Link::templated(relation, format!("{href}{{?{}}}", names.join(",")))
    };
    link.title = str_field(object, "prompt");
    link.name = str_field(object, "name");
    Some(link)
}

/// Links of a collection or an item: `href` as `self`, then `links[]`.
fn self_and_links(object: &Map<String, Value>) -> LinkMap {
    let mut links = LinkMap::new();
    if let Some(href) = str_field(object, "href") {
        push_link(&mut links, Link::new("self", href));
    }
    for link in array_field(object, "links")
        .iter()
        .filter_map(Value::as_object)
        .filter_map(collection_link)
    {
        push_link(&mut links, link);
    }
    links
}

fn collection(document: &Document) -> Option<&Map<String, Value>> {
    document.object().and_then(|o| object_field(o, "collection"))
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Collection+JSON format adapter.
#[derive(Debug, Clone)]
pub struct CollectionJsonExtension {
    media_types: Vec<String>,
    item: Arc<CollectionItemExtension>,
}

impl CollectionJsonExtension {
    pub fn new(additional: Vec<String>) -> Self {
        Self {
            media_types: media_types_with(MEDIA_TYPES, &additional),
            item: Arc::new(CollectionItemExtension),
        }
    }
}

impl Default for CollectionJsonExtension {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Extension for CollectionJsonExtension {
    fn name(&self) -> &str {
        "collection+json"
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
        let Some(collection) = collection(document) else {
            return LinkMap::new();
        };
        let mut links = self_and_links(collection);
        for link in array_field(collection, "queries")
            .iter()
            .filter_map(Value::as_object)
            .filter_map(query_link)
        {
            push_link(&mut links, link);
        }
        links
    }

    /// A collection carries no data of its own beyond an optional `error`
    /// object, whose fields are surfaced as data.
    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        collection(document)
            .and_then(|c| object_field(c, "error"))
            .map(|error| {
                error
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
        let Some(collection) = collection(document) else {
            return embedded;
        };

        let items: Vec<Resource> = array_field(collection, "items")
            .iter()
            .filter(|item| item.is_object())
            .map(|item| {
                Resource::embedded_with(
                    Some(self.item.clone() as Arc<dyn Extension>),
                    item.clone(),
                    headers,
                    request,
                    context,
                )
            })
            .collect();
        if !items.is_empty() {
            embedded.insert(ITEM_RELATION.to_string(), items);
        }
        embedded
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// Parses a single Collection+JSON item. Only reachable through
/// [`CollectionJsonExtension`]'s embedded parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionItemExtension;

impl Extension for CollectionItemExtension {
    fn name(&self) -> &str {
        "collection+json-item"
    }

    fn media_types(&self) -> &[String] {
        &[]
    }

    fn applies(&self, _request: &Request, _headers: &HeaderMap, _status: StatusCode) -> bool {
        false
    }

    fn link_parser(
        &self,
        document: &Document,
        _headers: &HeaderMap,
        _request: &Request,
        _context: &Context,
    ) -> LinkMap {
        document.object().map(self_and_links).unwrap_or_default()
    }

    /// Item data is a `name`/`value` array; repeated names are kept.
    fn data_parser(&self, document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        let Some(item) = document.object() else {
            return Vec::new();
        };
        array_field(item, "data")
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|d| {
                let name = str_field(d, "name")?;
                let value = d.get("value").cloned().unwrap_or(Value::Null);
                Some(DataEntry::new(name, value))
            })
            .collect()
    }
}
