//! Relation-path traversal and the printed summary.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use hypermedia::{Client, DataEntry, HyError, HyResult, Link, Resource};

use crate::args::Step;

/// Fetches `url` and follows `steps` in order.
///
/// A step whose relation is embedded rather than linked takes the embedded
/// resource without a fetch.
pub async fn traverse(
    client: &Client,
    url: &str,
    steps: &[Step],
    params: &Map<String, Value>,
) -> HyResult<Resource> {
    let mut current = client.root(url)?.resolved().await?;
    info!(url = %url, traversal = %current.context().id(), "root resolved");

    for step in steps {
        current = if !current.has_link(&step.relation) && current.has_embedded(&step.relation) {
            current.embedded(&step.relation, step.index)?
        } else {
            current
                .follow_with(&step.relation, step.index, params)?
                .resolved()
                .await?
        };
        info!(
            relation = %step.relation,
            index = step.index,
            href = current.href().map(|h| h.to_string()).unwrap_or_default(),
            "followed"
        );
    }
    Ok(current)
}

/// What the binary prints for the final resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub href: Option<String>,
    pub status: Option<u16>,
    pub links: IndexMap<String, Vec<Link>>,
    pub data: Vec<DataEntry>,
    pub embedded: IndexMap<String, usize>,
}

impl Summary {
    pub fn of(resource: &Resource) -> Self {
        // Keys as written; curie-equivalent relations stay under their own key.
        let links = resource
            .representation()
            .map(|r| r.links(resource.context()).clone())
            .unwrap_or_default();

        let embedded = resource
            .embedded_relations()
            .into_iter()
            .map(|rel| {
                let count = resource.embedded_all(&rel).len();
                (rel, count)
            })
            .collect();

        Self {
            href: resource.href().map(|h| h.to_string()),
            status: resource.status().map(|s| s.as_u16()),
            links,
            data: resource.data_entries(),
            embedded,
        }
    }
}

/// Exit code for a failed traversal.
pub fn exit_code(error: &HyError) -> u8 {
    if error.is_recoverable() {
        2
    } else {
        1
    }
}
