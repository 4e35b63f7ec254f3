//! Compact URI (curie) templates.
//!
//! A document may declare `prefix -> template` bindings; a relation written
//! as `prefix:local` then names the full relation URI obtained by
//! substituting `local` into the template's `{rel}` placeholder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder substituted by [`CurieTemplate::expand`].
pub const REL_PLACEHOLDER: &str = "{rel}";

/// Curie bindings keyed by prefix, in declaration order.
pub type CurieMap = IndexMap<String, CurieTemplate>;

/// A named curie binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurieTemplate {
    name: String,
    href: String,
}

impl CurieTemplate {
    /// Creates a binding for `name` with an href containing `{rel}`.
    ///
    /// Returns `None` if the name is empty or the href lacks the placeholder.
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let href = href.into();
        if name.is_empty() || !href.contains(REL_PLACEHOLDER) {
            return None;
        }
        Some(Self { name, href })
    }

    /// The prefix this template is bound to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unexpanded template.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Substitutes `local` for the `{rel}` placeholder.
    pub fn expand(&self, local: &str) -> String {
        self.href.replace(REL_PLACEHOLDER, local)
    }
}

/// Splits a relation into `(prefix, local)` if it has curie shape.
///
/// Absolute URIs (`scheme://...`) are not curies even though they contain a
/// colon.
pub fn split_curie(relation: &str) -> Option<(&str, &str)> {
    let (prefix, local) = relation.split_once(':')?;
    if prefix.is_empty() || local.is_empty() || local.starts_with("//") {
        return None;
    }
    Some((prefix, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_local_relation() {
        let curie = CurieTemplate::new("ea", "http://api.co/rel/{rel}").unwrap();
        assert_eq!(curie.expand("find"), "http://api.co/rel/find");
        assert_eq!(curie.name(), "ea");
    }

    #[test]
    fn rejects_template_without_placeholder() {
        assert!(CurieTemplate::new("ea", "http://api.co/rel/").is_none());
        assert!(CurieTemplate::new("", "http://api.co/rel/{rel}").is_none());
    }

    #[test]
    fn splits_only_curie_shaped_relations() {
        assert_eq!(split_curie("ea:find"), Some(("ea", "find")));
        assert_eq!(split_curie("http://api.co/rel/find"), None);
        assert_eq!(split_curie("self"), None);
        assert_eq!(split_curie(":find"), None);
    }
}
