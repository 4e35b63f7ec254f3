//! Lenient accessors over JSON documents.
//!
//! Every helper returns an empty result instead of failing when the shape is
//! not what the format prescribes.

use hypermedia::Link;
use serde_json::{Map, Value};

/// A value that may be a single item or an array of items.
pub(crate) fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// An optional string field.
pub(crate) fn str_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A nested object field.
pub(crate) fn object_field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Map<String, Value>> {
    object.get(key).and_then(Value::as_object)
}

/// An array field, empty when absent or not an array.
pub(crate) fn array_field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Builds a link from a HAL-style link object (`href`, `templated`, `title`,
/// `type`, `name`, `profile`, `hreflang`, `deprecation`). `None` without an
/// `href`.
pub(crate) fn link_object(relation: &str, object: &Map<String, Value>) -> Option<Link> {
    let href = str_field(object, "href")?;
    Some(Link {
        relation: relation.to_string(),
        href,
        templated: object
            .get("templated")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        title: str_field(object, "title"),
        media_type: str_field(object, "type"),
        name: str_field(object, "name"),
        profile: str_field(object, "profile"),
        hreflang: str_field(object, "hreflang"),
        deprecation: str_field(object, "deprecation"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn one_or_many_normalises_shapes() {
        assert_eq!(one_or_many(&json!({"a": 1})).len(), 1);
        assert_eq!(one_or_many(&json!([1, 2])).len(), 2);
        assert!(one_or_many(&Value::Null).is_empty());
    }

    #[test]
    fn link_object_requires_href() {
        let obj = json!({"title": "no href"});
        assert!(link_object("self", obj.as_object().unwrap()).is_none());

        let obj = json!({"href": "/things{/id}", "templated": true, "type": "application/hal+json"});
        let link = link_object("find", obj.as_object().unwrap()).unwrap();
        assert!(link.templated);
        assert_eq!(link.media_type.as_deref(), Some("application/hal+json"));
    }
}
