//! The resource graph node and its resolution state machine.
//!
//! ```text
//!  Unresolved ──follow/resolve──▶ Resolving ──▶ Resolved
//!                                     │
//!                                     └───────▶ Failed
//! ```
//!
//! Resources built from a response or from an embedded document start out
//! `Resolved`. Resources reached through a link start `Unresolved` and move
//! to `Resolving` the moment they are registered in the context cache, so
//! any later follow of the same URL attaches to the pending fetch instead of
//! dispatching another.
//!
//! Links, data and embedded resources are parsed on first access and
//! memoised; the extension is never invoked twice for the same document.

use std::sync::{Arc, OnceLock};

use futures::future::{BoxFuture, FutureExt, Shared};
use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn, Instrument};

use crate::context::{Context, WeakContext};
use crate::curie::CurieMap;
use crate::errors::{HyError, HyResult};
use crate::extension::Extension;
use crate::identifiers::CanonicalUrl;
use crate::link::{Link, LinkMap};
use crate::transport::{Request, Response};
use crate::types::{DataEntry, Document, Timestamp};

type FetchOutcome = Result<Arc<Representation>, HyError>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

// ---------------------------------------------------------------------------
// Resolution state
// ---------------------------------------------------------------------------

/// Observable resolution state of a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Known only by href; nothing has been fetched.
    Unresolved,
    /// A fetch has been dispatched and has not completed.
    Resolving,
    /// A document is available.
    Resolved,
    /// The fetch failed; see [`Resource::error`].
    Failed,
}

enum Resolution {
    Unresolved,
    Resolving(SharedFetch),
    Resolved(Arc<Representation>),
    Failed(HyError),
}

/// Context-free resource state. This is what the context cache and parent
/// documents hold; a [`Resource`] pairs it with the context it lives in.
pub(crate) struct ResourceCell {
    href: Option<CanonicalUrl>,
    state: Mutex<Resolution>,
}

impl ResourceCell {
    pub(crate) fn unresolved(href: CanonicalUrl) -> Self {
        Self {
            href: Some(href),
            state: Mutex::new(Resolution::Unresolved),
        }
    }

    pub(crate) fn resolved(
        href: Option<CanonicalUrl>,
        representation: Arc<Representation>,
    ) -> Self {
        Self {
            href,
            state: Mutex::new(Resolution::Resolved(representation)),
        }
    }

    pub(crate) fn is_failed(&self) -> bool {
        matches!(*self.state.lock(), Resolution::Failed(_))
    }

    /// Resolves the cell with `representation`, superseding a pending fetch
    /// or an earlier document. Returns `false` only for a failed cell, which
    /// the caller should replace.
    pub(crate) fn fill(&self, representation: &Arc<Representation>) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, Resolution::Failed(_)) {
            return false;
        }
        *state = Resolution::Resolved(Arc::clone(representation));
        true
    }

    fn settle(&self, outcome: &FetchOutcome) {
        let mut state = self.state.lock();
        if matches!(*state, Resolution::Resolving(_)) {
            *state = match outcome {
                Ok(representation) => Resolution::Resolved(Arc::clone(representation)),
                Err(e) => Resolution::Failed(e.clone()),
            };
        }
    }
}

// ---------------------------------------------------------------------------
// Representation
// ---------------------------------------------------------------------------

/// A resolved document together with the extension that understands it and
/// its memoised parse results.
pub struct Representation {
    request: Request,
    status: StatusCode,
    headers: HeaderMap,
    document: Document,
    extension: Option<Arc<dyn Extension>>,
    fetched_at: Timestamp,
    curies: OnceLock<CurieMap>,
    links: OnceLock<LinkMap>,
    data: OnceLock<Vec<DataEntry>>,
    embedded: OnceLock<IndexMap<String, Vec<Arc<ResourceCell>>>>,
}

impl Representation {
    fn new(
        request: Request,
        status: StatusCode,
        headers: HeaderMap,
        document: Document,
        extension: Option<Arc<dyn Extension>>,
    ) -> Self {
        Self {
            request,
            status,
            headers,
            document,
            extension,
            fetched_at: Timestamp::now(),
            curies: OnceLock::new(),
            links: OnceLock::new(),
            data: OnceLock::new(),
            embedded: OnceLock::new(),
        }
    }

    /// The request that produced this document.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Name of the extension parsing this document, if any applied.
    pub fn extension_name(&self) -> Option<&str> {
        self.extension.as_deref().map(|e| e.name())
    }

    /// When the document was received.
    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// Curie bindings declared by this document; merged into `context` on
    /// first call.
    pub fn curies(&self, context: &Context) -> &CurieMap {
        self.curies.get_or_init(|| {
            let curies = match &self.extension {
                Some(ext) => ext.curie_prefix_parser(&self.document, &self.headers, context),
                None => CurieMap::new(),
            };
            context.bind_curies(&curies);
            curies
        })
    }

    /// Parsed links. Curie bindings are registered before links are parsed.
    pub fn links(&self, context: &Context) -> &LinkMap {
        self.links.get_or_init(|| {
            self.curies(context);
            match &self.extension {
                Some(ext) => ext.link_parser(&self.document, &self.headers, &self.request, context),
                None => LinkMap::new(),
            }
        })
    }

    /// Parsed data entries.
    pub fn data(&self) -> &[DataEntry] {
        self.data.get_or_init(|| match &self.extension {
            Some(ext) => ext.data_parser(&self.document, &self.headers),
            None => Vec::new(),
        })
    }

    fn embedded(&self, context: &Context) -> &IndexMap<String, Vec<Arc<ResourceCell>>> {
        self.embedded.get_or_init(|| {
            self.curies(context);
            let Some(ext) = &self.extension else {
                return IndexMap::new();
            };
            ext.embedded_parser(&self.document, &self.headers, &self.request, context)
                .into_iter()
                .map(|(rel, resources)| (rel, resources.into_iter().map(|r| r.cell).collect()))
                .collect()
        })
    }
}

impl std::fmt::Debug for Representation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Representation")
            .field("url", &self.request.url)
            .field("status", &self.status)
            .field("extension", &self.extension_name())
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// Collects the entries of every relation in `map` that matches `relation`,
/// exact names first, then curie-equivalent ones in document order.
fn matching<'a, T>(
    map: &'a IndexMap<String, Vec<T>>,
    relation: &str,
    context: &Context,
) -> Vec<&'a T> {
    let exact = map.get(relation).into_iter().flatten();
    let equivalent = map
        .iter()
        .filter(|(written, _)| written.as_str() != relation)
        .filter(|(written, _)| context.relation_matches(written, relation))
        .flat_map(|(_, items)| items);
    exact.chain(equivalent).collect()
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A node in the resource graph.
///
/// Cloning is cheap; clones share resolution state. Two resources reached
/// through the same canonical URL in one context are the same node
/// (see [`Resource::ptr_eq`]).
#[derive(Clone)]
pub struct Resource {
    cell: Arc<ResourceCell>,
    context: Context,
}

impl Resource {
    pub(crate) fn attach(cell: Arc<ResourceCell>, context: Context) -> Self {
        Self { cell, context }
    }

    /// Wraps a response fetched for `request`. The resource is `Resolved`
    /// with this response and is registered in the context cache under the
    /// request URL. A cached entry for the URL keeps its identity but takes
    /// the new document; a fetch still in flight for it is superseded.
    pub fn from_response(request: Request, response: Response, context: &Context) -> Self {
        let extension = context.select_extension(&request, &response.headers, response.status);
        let url = request.url.clone();
        let representation = Representation::new(
            request,
            response.status,
            response.headers,
            Document::from_bytes(response.body),
            extension,
        );
        let cell = context.adopt(url, Arc::new(representation));
        Self::attach(cell, context.clone())
    }

    /// Builds an embedded sub-resource, selecting its extension from the
    /// enclosing response's headers.
    pub fn embedded_document(
        document: Value,
        headers: &HeaderMap,
        request: &Request,
        context: &Context,
    ) -> Self {
        let status = StatusCode::OK;
        let extension = context.select_extension(request, headers, status);
        Self::embedded_with(extension, document, headers, request, context)
    }

    /// Builds an embedded sub-resource parsed by a specific extension, for
    /// formats whose embedded items use a different shape than the enclosing
    /// document.
    pub fn embedded_with(
        extension: Option<Arc<dyn Extension>>,
        document: Value,
        headers: &HeaderMap,
        request: &Request,
        context: &Context,
    ) -> Self {
        let representation = Representation::new(
            request.clone(),
            StatusCode::OK,
            headers.clone(),
            Document::from_json(document),
            extension,
        );
        let cell = Arc::new(ResourceCell::resolved(None, Arc::new(representation)));
        Self::attach(cell, context.clone())
    }

    // -----------------------------------------------------------------------
    // Identity and state
    // -----------------------------------------------------------------------

    /// The context this resource belongs to.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns `true` if both handles refer to the same graph node.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Current resolution state.
    pub fn state(&self) -> ResourceState {
        match &*self.cell.state.lock() {
            Resolution::Unresolved => ResourceState::Unresolved,
            Resolution::Resolving(_) => ResourceState::Resolving,
            Resolution::Resolved(_) => ResourceState::Resolved,
            Resolution::Failed(_) => ResourceState::Failed,
        }
    }

    /// The resolved document, if any.
    pub fn representation(&self) -> Option<Arc<Representation>> {
        match &*self.cell.state.lock() {
            Resolution::Resolved(representation) => Some(Arc::clone(representation)),
            _ => None,
        }
    }

    /// The recorded failure of a `Failed` resource.
    pub fn error(&self) -> Option<HyError> {
        match &*self.cell.state.lock() {
            Resolution::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// The originating URL. Embedded resources report their `self` link,
    /// resolved against the enclosing document.
    pub fn href(&self) -> Option<CanonicalUrl> {
        if let Some(href) = &self.cell.href {
            return Some(href.clone());
        }
        let link = self.link("self", 0).ok()?;
        CanonicalUrl::resolve(&link.href, self.base_url().as_ref()).ok()
    }

    /// Status code of the resolved response.
    pub fn status(&self) -> Option<StatusCode> {
        self.representation().map(|r| r.status())
    }

    /// Headers of the resolved response.
    pub fn headers(&self) -> Option<HeaderMap> {
        self.representation().map(|r| r.headers().clone())
    }

    /// When the resolved document was received.
    pub fn fetched_at(&self) -> Option<Timestamp> {
        self.representation().map(|r| r.fetched_at())
    }

    fn base_url(&self) -> Option<CanonicalUrl> {
        self.representation()
            .map(|r| r.request().url.clone())
            .or_else(|| self.cell.href.clone())
            .or_else(|| self.context.options().base_url.clone())
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    /// Relation names present in the document, as written.
    pub fn relations(&self) -> Vec<String> {
        match self.representation() {
            Some(r) => r.links(&self.context).keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// All links for `relation`, which may be written compact or expanded.
    pub fn links(&self, relation: &str) -> Vec<Link> {
        match self.representation() {
            Some(r) => matching(r.links(&self.context), relation, &self.context)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// The link at `index` within `relation`.
    pub fn link(&self, relation: &str, index: usize) -> HyResult<Link> {
        self.links(relation)
            .into_iter()
            .nth(index)
            .ok_or_else(|| HyError::relation_not_found(relation, index))
    }

    /// Whether at least one link exists for `relation`.
    pub fn has_link(&self, relation: &str) -> bool {
        !self.links(relation).is_empty()
    }

    // -----------------------------------------------------------------------
    // Embedded resources
    // -----------------------------------------------------------------------

    /// Relation names with embedded resources, as written.
    pub fn embedded_relations(&self) -> Vec<String> {
        match self.representation() {
            Some(r) => r.embedded(&self.context).keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// All embedded resources for `relation`.
    pub fn embedded_all(&self, relation: &str) -> Vec<Resource> {
        match self.representation() {
            Some(r) => matching(r.embedded(&self.context), relation, &self.context)
                .into_iter()
                .map(|cell| Resource::attach(Arc::clone(cell), self.context.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// The embedded resource at `index` within `relation`.
    pub fn embedded(&self, relation: &str, index: usize) -> HyResult<Resource> {
        self.embedded_all(relation)
            .into_iter()
            .nth(index)
            .ok_or_else(|| HyError::relation_not_found(relation, index))
    }

    /// Whether at least one embedded resource exists for `relation`.
    pub fn has_embedded(&self, relation: &str) -> bool {
        !self.embedded_all(relation).is_empty()
    }

    // -----------------------------------------------------------------------
    // Data
    // -----------------------------------------------------------------------

    /// The value of the first data entry named `name`.
    pub fn data(&self, name: &str) -> Option<Value> {
        let representation = self.representation()?;
        representation
            .data()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.clone())
    }

    /// Every data entry, in document order.
    pub fn data_entries(&self) -> Vec<DataEntry> {
        self.representation()
            .map(|r| r.data().to_vec())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Following
    // -----------------------------------------------------------------------

    /// Follows the link at `index` within `relation`.
    ///
    /// Fails synchronously with [`HyError::RelationNotFound`] (or
    /// [`HyError::InvalidHref`]) without touching the transport. Otherwise the
    /// returned resource is `Resolving` (or already cached); await
    /// [`Resource::resolved`] for the outcome.
    pub fn follow(&self, relation: &str, index: usize) -> HyResult<Resource> {
        self.follow_with(relation, index, &Map::new())
    }

    /// Follows a templated link, expanding it with `params`.
    pub fn follow_with(
        &self,
        relation: &str,
        index: usize,
        params: &Map<String, Value>,
    ) -> HyResult<Resource> {
        let link = self.link(relation, index)?;
        self.follow_link(&link, params)
    }

    /// Follows every link of `relation`, in order.
    pub fn follow_all(&self, relation: &str) -> HyResult<Vec<Resource>> {
        self.links(relation)
            .iter()
            .map(|link| self.follow_link(link, &Map::new()))
            .collect()
    }

    /// Follows an arbitrary link, resolving it relative to this resource.
    pub fn follow_link(&self, link: &Link, params: &Map<String, Value>) -> HyResult<Resource> {
        let href = link.expand(params);
        let url = CanonicalUrl::resolve(&href, self.base_url().as_ref())?;
        debug!(
            traversal = %self.context.id(),
            relation = %link.relation,
            url = %url,
            "following link"
        );
        Ok(self.context.resolve_url(url))
    }

    /// Waits for this resource to resolve.
    ///
    /// Every caller waiting on the same resource shares one fetch and
    /// observes the same outcome. Transport errors and unaccepted status
    /// codes arrive here, never synchronously.
    pub async fn resolved(&self) -> HyResult<Resource> {
        let fetch = {
            let mut state = self.cell.state.lock();
            match &*state {
                Resolution::Resolved(_) => return Ok(self.clone()),
                Resolution::Failed(e) => return Err(e.clone()),
                Resolution::Resolving(fetch) => fetch.clone(),
                Resolution::Unresolved => {
                    let fetch = self.dispatch()?;
                    *state = Resolution::Resolving(fetch.clone());
                    fetch
                }
            }
        };
        let outcome = fetch.await;
        self.cell.settle(&outcome);
        outcome.map(|_| self.clone())
    }

    /// Moves an `Unresolved` resource to `Resolving`. No-op in any other state.
    pub(crate) fn begin(&self) {
        let mut state = self.cell.state.lock();
        if matches!(*state, Resolution::Unresolved) {
            if let Ok(fetch) = self.dispatch() {
                *state = Resolution::Resolving(fetch);
            }
        }
    }

    fn dispatch(&self) -> HyResult<SharedFetch> {
        let url = self.cell.href.clone().ok_or(HyError::MissingHref)?;
        Ok(fetch(self.context.downgrade(), url).boxed().shared())
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("href", &self.cell.href)
            .field("state", &self.state())
            .field("traversal", &self.context.id())
            .finish()
    }
}

/// Issues the request for `url` and parses the response.
///
/// Holds only a weak context across the transport await so a fetch that is
/// never driven to completion does not keep its traversal alive.
async fn fetch(context: WeakContext, url: CanonicalUrl) -> FetchOutcome {
    let (request, transport, traversal) = {
        let context = context.upgrade().ok_or(HyError::ContextDropped)?;
        (context.request_for(url.clone()), context.transport(), context.id())
    };

    let span = tracing::debug_span!("fetch", traversal = %traversal, url = %url);
    let response = transport
        .request(request.clone())
        .instrument(span)
        .await
        .map_err(|e| {
            warn!(traversal = %traversal, url = %url, error = %e, "transport failure");
            HyError::TransportFailure {
                url: url.to_string(),
                source: Arc::new(e),
            }
        })?;

    let context = context.upgrade().ok_or(HyError::ContextDropped)?;
    if !(context.options().success)(response.status) {
        warn!(traversal = %traversal, url = %url, status = %response.status, "unexpected status");
        return Err(HyError::UnexpectedStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    debug!(traversal = %traversal, url = %url, status = %response.status, "resource resolved");
    let extension = context.select_extension(&request, &response.headers, response.status);
    Ok(Arc::new(Representation::new(
        request,
        response.status,
        response.headers,
        Document::from_bytes(response.body),
        extension,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::OfflineTransport;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn request(url: &str) -> Request {
        Request::get(CanonicalUrl::parse(url).unwrap())
    }

    #[test]
    fn unrecognised_response_is_opaque() {
        let ctx = Context::offline(Vec::new());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
        let response = Response::new(StatusCode::OK, headers, vec![0x89, 0x50]);

        let resource = Resource::from_response(request("http://api.co/logo"), response, &ctx);

        assert_eq!(resource.state(), ResourceState::Resolved);
        assert!(resource.relations().is_empty());
        assert!(resource.data_entries().is_empty());
        assert!(resource.embedded_all("item").is_empty());
        assert!(matches!(
            resource.link("self", 0),
            Err(HyError::RelationNotFound { .. })
        ));
        assert_eq!(resource.data("name"), None);
    }

    #[test]
    fn response_is_registered_in_cache() {
        let ctx = Context::offline(Vec::new());
        let response = Response::new(StatusCode::OK, HeaderMap::new(), Vec::new());
        let resource = Resource::from_response(request("http://api.co/"), response, &ctx);

        let cached = ctx
            .cached(&CanonicalUrl::parse("http://api.co/").unwrap())
            .unwrap();
        assert!(cached.ptr_eq(&resource));
    }

    #[tokio::test]
    async fn response_supersedes_pending_fetch() {
        let ctx = Context::offline(Vec::new());
        let pending = ctx.resolve("http://api.co/x").unwrap();
        assert_eq!(pending.state(), ResourceState::Resolving);

        let response = Response::new(StatusCode::OK, HeaderMap::new(), b"hello".to_vec());
        let resource = Resource::from_response(request("http://api.co/x"), response, &ctx);

        assert_eq!(resource.state(), ResourceState::Resolved);
        assert!(resource.ptr_eq(&pending));
        let resolved = pending.resolved().await.unwrap();
        assert_eq!(resolved.state(), ResourceState::Resolved);
        assert_eq!(resolved.representation().unwrap().document().bytes(), b"hello");
    }

    #[test]
    fn newer_response_replaces_cached_document() {
        let ctx = Context::offline(Vec::new());
        let first = Response::new(StatusCode::OK, HeaderMap::new(), b"old".to_vec());
        let original = Resource::from_response(request("http://api.co/x"), first, &ctx);

        let second = Response::new(StatusCode::OK, HeaderMap::new(), b"new".to_vec());
        let resource = Resource::from_response(request("http://api.co/x"), second, &ctx);

        assert!(resource.ptr_eq(&original));
        assert_eq!(original.representation().unwrap().document().bytes(), b"new");
    }

    #[tokio::test]
    async fn offline_resolution_fails_through_deferred() {
        let ctx = Context::new(Vec::new(), Arc::new(OfflineTransport));
        let resource = ctx.resolve("http://api.co/orders").unwrap();
        assert_eq!(resource.state(), ResourceState::Resolving);

        let err = resource.resolved().await.unwrap_err();
        assert!(matches!(err, HyError::TransportFailure { .. }));
        assert_eq!(resource.state(), ResourceState::Failed);
        assert!(resource.error().is_some());
    }

    #[tokio::test]
    async fn failed_url_is_fetched_again_on_next_resolve() {
        let ctx = Context::offline(Vec::new());
        let first = ctx.resolve("http://api.co/orders").unwrap();
        let _ = first.resolved().await;

        let second = ctx.resolve("http://api.co/orders").unwrap();
        assert!(!second.ptr_eq(&first));
        assert_eq!(second.state(), ResourceState::Resolving);
    }

    #[test]
    fn unresolved_resource_has_no_document() {
        let ctx = Context::offline(Vec::new());
        let resource = ctx.resource_for(CanonicalUrl::parse("http://api.co/x").unwrap());
        assert_eq!(resource.state(), ResourceState::Unresolved);
        assert!(resource.representation().is_none());
        assert!(resource.links("self").is_empty());
        assert_eq!(
            resource.href().map(|u| u.to_string()),
            Some("http://api.co/x".to_string())
        );
    }
}
