//! Typed links.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template;

/// Links keyed by relation name (as written in the document), each relation
/// holding its links in document order.
pub type LinkMap = IndexMap<String, Vec<Link>>;

/// An immutable link value: relation, target href (possibly a URI template)
/// and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Relation name, possibly curie-compact (`prefix:local`).
    pub relation: String,
    /// Target href, or a URI template when `templated` is set.
    pub href: String,
    /// Whether `href` is a URI template.
    #[serde(default)]
    pub templated: bool,
    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Hint for the media type of the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Secondary key for selecting among links sharing a relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile URI of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Language of the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,
    /// URL describing the link's deprecation, if deprecated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
}

impl Link {
    /// Creates a plain (non-templated) link with no metadata.
    pub fn new(relation: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            href: href.into(),
            templated: false,
            title: None,
            media_type: None,
            name: None,
            profile: None,
            hreflang: None,
            deprecation: None,
        }
    }

    /// Creates a templated link.
    pub fn templated(relation: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            templated: true,
            ..Self::new(relation, href)
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the media type hint.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Expands the href with `params`.
    ///
    /// A non-templated link always returns its href unchanged, whatever the
    /// params.
    pub fn expand(&self, params: &Map<String, Value>) -> String {
        if !self.templated {
            return self.href.clone();
        }
        template::expand(&self.href, params)
    }

    /// Variables the href template expects (empty for plain links).
    pub fn variables(&self) -> Vec<String> {
        if self.templated {
            template::variables(&self.href)
        } else {
            Vec::new()
        }
    }
}

/// Appends `link` under its relation, preserving insertion order.
pub fn push_link(links: &mut LinkMap, link: Link) {
    links.entry(link.relation.clone()).or_default().push(link);
}
