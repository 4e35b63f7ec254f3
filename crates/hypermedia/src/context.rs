//! The per-traversal resolution scope.
//!
//! A [`Context`] owns three things for one traversal root:
//!
//! - the ordered extension registry (first match wins),
//! - the resource cache keyed by [`CanonicalUrl`], which collapses concurrent
//!   and cyclic follows of the same URL onto one fetch,
//! - the curie bindings accumulated as documents are parsed.
//!
//! Contexts are cheap to clone (all clones share state) and need no explicit
//! teardown. The cache holds resource state, never context handles, so
//! dropping the last [`crate::Resource`] of a traversal frees the whole graph.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use http::header::ACCEPT;
use http::{HeaderMap, StatusCode};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::curie::{split_curie, CurieMap, CurieTemplate};
use crate::errors::HyResult;
use crate::extension::Extension;
use crate::identifiers::{CanonicalUrl, TraversalId};
use crate::resource::{Representation, Resource, ResourceCell};
use crate::transport::{OfflineTransport, Request, Transport};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tunables applied to every request issued within a context.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Base for resolving relative root hrefs.
    pub base_url: Option<CanonicalUrl>,
    /// Headers sent with every request. An `Accept` entry here overrides the
    /// one negotiated from the extension registry.
    pub default_headers: HeaderMap,
    /// Which status codes count as a successful resolution.
    pub success: fn(StatusCode) -> bool,
}

impl ContextOptions {
    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: CanonicalUrl) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the success predicate.
    pub fn with_success(mut self, success: fn(StatusCode) -> bool) -> Self {
        self.success = success;
        self
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            success: |status| status.is_success(),
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

struct ContextInner {
    id: TraversalId,
    extensions: Vec<Arc<dyn Extension>>,
    transport: Arc<dyn Transport>,
    options: ContextOptions,
    cache: Mutex<HashMap<CanonicalUrl, Arc<ResourceCell>>>,
    curies: RwLock<CurieMap>,
}

/// Shared resolution scope for one traversal.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

/// Non-owning handle held by in-flight fetches.
#[derive(Clone)]
pub(crate) struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub(crate) fn upgrade(&self) -> Option<Context> {
        self.0.upgrade().map(|inner| Context { inner })
    }
}

impl Context {
    /// Creates a context with default options.
    pub fn new(extensions: Vec<Arc<dyn Extension>>, transport: Arc<dyn Transport>) -> Self {
        Self::with_options(extensions, transport, ContextOptions::default())
    }

    /// Creates a context with explicit options.
    pub fn with_options(
        extensions: Vec<Arc<dyn Extension>>,
        transport: Arc<dyn Transport>,
        options: ContextOptions,
    ) -> Self {
        let id = TraversalId::new_random();
        debug!(traversal = %id, extensions = extensions.len(), "context created");
        Self {
            inner: Arc::new(ContextInner {
                id,
                extensions,
                transport,
                options,
                cache: Mutex::new(HashMap::new()),
                curies: RwLock::new(CurieMap::new()),
            }),
        }
    }

    /// Creates a context whose transport refuses every request.
    pub fn offline(extensions: Vec<Arc<dyn Extension>>) -> Self {
        Self::new(extensions, Arc::new(OfflineTransport))
    }

    /// The traversal identifier recorded on this context's fetches.
    pub fn id(&self) -> TraversalId {
        self.inner.id
    }

    /// Registered extensions, in selection order.
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.inner.extensions
    }

    /// Options this context was built with.
    pub fn options(&self) -> &ContextOptions {
        &self.inner.options
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.inner.transport)
    }

    pub(crate) fn downgrade(&self) -> WeakContext {
        WeakContext(Arc::downgrade(&self.inner))
    }

    /// Returns `true` if both handles refer to the same context.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Content negotiation
    // -----------------------------------------------------------------------

    /// Returns the first extension whose `applies` predicate matches, or
    /// `None` if the response is in an unrecognised format.
    pub fn select_extension(
        &self,
        request: &Request,
        headers: &HeaderMap,
        status: StatusCode,
    ) -> Option<Arc<dyn Extension>> {
        let selected = self
            .inner
            .extensions
            .iter()
            .find(|ext| ext.applies(request, headers, status))
            .cloned();
        match &selected {
            Some(ext) => debug!(url = %request.url, extension = ext.name(), "extension selected"),
            None => debug!(url = %request.url, %status, "no applicable extension; opaque resource"),
        }
        selected
    }

    /// The `Accept` header value advertising every registered media type,
    /// in registration order without duplicates.
    pub fn accept_header(&self) -> String {
        let mut seen: Vec<&str> = Vec::new();
        for media_type in self.inner.extensions.iter().flat_map(|e| e.media_types()) {
            if !seen.iter().any(|s| s.eq_ignore_ascii_case(media_type)) {
                seen.push(media_type);
            }
        }
        seen.join(", ")
    }

    /// Builds the `GET` request the core issues for `url`.
    pub fn request_for(&self, url: CanonicalUrl) -> Request {
        let mut request = Request::get(url);
        let accept = self.accept_header();
        if !accept.is_empty() {
            request = request.with_header(ACCEPT, &accept);
        }
        for (name, value) in &self.inner.options.default_headers {
            request.headers.insert(name.clone(), value.clone());
        }
        request
    }

    // -----------------------------------------------------------------------
    // Curie bindings
    // -----------------------------------------------------------------------

    /// Returns the binding for `prefix`, if one has been discovered.
    pub fn curie(&self, prefix: &str) -> Option<CurieTemplate> {
        self.inner.curies.read().get(prefix).cloned()
    }

    /// Snapshot of every binding discovered so far.
    pub fn curies(&self) -> CurieMap {
        self.inner.curies.read().clone()
    }

    /// Merges bindings discovered in a document. Later declarations of a
    /// prefix replace earlier ones.
    pub(crate) fn bind_curies(&self, bindings: &CurieMap) {
        if bindings.is_empty() {
            return;
        }
        let mut curies = self.inner.curies.write();
        for (prefix, template) in bindings {
            debug!(traversal = %self.inner.id, prefix = %prefix, "curie bound");
            curies.insert(prefix.clone(), template.clone());
        }
    }

    /// Expands a curie-compact relation against the current bindings.
    ///
    /// Relations without a bound prefix are returned unchanged.
    pub fn expand_relation(&self, relation: &str) -> String {
        if let Some((prefix, local)) = split_curie(relation) {
            if let Some(template) = self.inner.curies.read().get(prefix) {
                return template.expand(local);
            }
        }
        relation.to_string()
    }

    /// Returns `true` if `written` (a relation name as it appears in a
    /// document) denotes the same relation as `wanted`.
    pub fn relation_matches(&self, written: &str, wanted: &str) -> bool {
        written == wanted || self.expand_relation(written) == self.expand_relation(wanted)
    }

    // -----------------------------------------------------------------------
    // Resource cache
    // -----------------------------------------------------------------------

    /// Resolves `href` against the configured base URL and starts (or joins)
    /// its resolution.
    pub fn resolve(&self, href: &str) -> HyResult<Resource> {
        let url = CanonicalUrl::resolve(href, self.inner.options.base_url.as_ref())?;
        Ok(self.resolve_url(url))
    }

    /// Starts resolving `url`, or joins the existing resolution.
    ///
    /// A cached resource that is resolving or resolved is returned as-is; a
    /// cached failure is replaced so the URL is fetched again. The returned
    /// resource is already registered in the cache, so a concurrent or
    /// re-entrant resolve of the same URL collapses onto the same fetch.
    pub fn resolve_url(&self, url: CanonicalUrl) -> Resource {
        let cell = {
            let mut cache = self.inner.cache.lock();
            match cache.get(&url) {
                Some(cell) if !cell.is_failed() => {
                    debug!(traversal = %self.inner.id, url = %url, "resource cache hit");
                    Arc::clone(cell)
                }
                _ => {
                    let cell = Arc::new(ResourceCell::unresolved(url.clone()));
                    cache.insert(url, Arc::clone(&cell));
                    cell
                }
            }
        };
        let resource = Resource::attach(cell, self.clone());
        resource.begin();
        resource
    }

    /// Returns the cached resource for `url` without starting anything.
    pub fn cached(&self, url: &CanonicalUrl) -> Option<Resource> {
        let cell = self.inner.cache.lock().get(url).cloned()?;
        Some(Resource::attach(cell, self.clone()))
    }

    /// Returns the resource for `url`, registering an unresolved one if the
    /// URL has not been seen.
    pub fn resource_for(&self, url: CanonicalUrl) -> Resource {
        let cell = Arc::clone(
            self.inner
                .cache
                .lock()
                .entry(url.clone())
                .or_insert_with(|| Arc::new(ResourceCell::unresolved(url))),
        );
        Resource::attach(cell, self.clone())
    }

    /// Registers a document fetched outside the resolution engine under `url`.
    ///
    /// An existing entry for the URL is resolved with it in place, so the
    /// newest document wins and a pending fetch is discarded when it lands.
    /// A failed entry is replaced by a fresh cell.
    pub(crate) fn adopt(
        &self,
        url: CanonicalUrl,
        representation: Arc<Representation>,
    ) -> Arc<ResourceCell> {
        let mut cache = self.inner.cache.lock();
        if let Some(existing) = cache.get(&url) {
            if existing.fill(&representation) {
                return Arc::clone(existing);
            }
        }
        let cell = Arc::new(ResourceCell::resolved(Some(url.clone()), representation));
        cache.insert(url, Arc::clone(&cell));
        cell
    }

    /// Number of URLs in the cache.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("extensions", &self.inner.extensions)
            .field("options", &self.inner.options)
            .field("cached", &self.cache_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkMap;
    use crate::types::{DataEntry, Document};
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[derive(Debug)]
    struct Fixed {
        name: &'static str,
        media_types: Vec<String>,
    }

    impl Extension for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn media_types(&self) -> &[String] {
            &self.media_types
        }
        fn applies(&self, _: &Request, headers: &HeaderMap, status: StatusCode) -> bool {
            crate::extension::applies_to_media_types(headers, status, &self.media_types)
        }
        fn link_parser(&self, _: &Document, _: &HeaderMap, _: &Request, _: &Context) -> LinkMap {
            LinkMap::new()
        }
        fn data_parser(&self, _: &Document, _: &HeaderMap) -> Vec<DataEntry> {
            Vec::new()
        }
    }

    fn context() -> Context {
        Context::offline(vec![
            Arc::new(Fixed {
                name: "first",
                media_types: vec!["application/a".into(), "application/shared".into()],
            }),
            Arc::new(Fixed {
                name: "second",
                media_types: vec!["application/shared".into(), "application/b".into()],
            }),
        ])
    }

    fn request() -> Request {
        Request::get(CanonicalUrl::parse("http://api.co/").unwrap())
    }

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn first_matching_extension_wins() {
        let ctx = context();
        let ext = ctx
            .select_extension(&request(), &headers("application/shared"), StatusCode::OK)
            .unwrap();
        assert_eq!(ext.name(), "first");

        let ext = ctx
            .select_extension(&request(), &headers("application/b"), StatusCode::OK)
            .unwrap();
        assert_eq!(ext.name(), "second");
    }

    #[test]
    fn unrecognised_format_selects_nothing() {
        let ctx = context();
        assert!(ctx
            .select_extension(&request(), &headers("image/png"), StatusCode::OK)
            .is_none());
    }

    #[test]
    fn accept_header_deduplicates_in_order() {
        assert_eq!(
            context().accept_header(),
            "application/a, application/shared, application/b"
        );
        let request = context().request_for(CanonicalUrl::parse("http://api.co/").unwrap());
        assert_eq!(
            request.headers[ACCEPT],
            "application/a, application/shared, application/b"
        );
    }

    #[test]
    fn relations_expand_against_bindings() {
        let ctx = context();
        assert_eq!(ctx.expand_relation("ea:find"), "ea:find");

        let mut bindings = CurieMap::new();
        bindings.insert(
            "ea".into(),
            CurieTemplate::new("ea", "http://api.co/rel/{rel}").unwrap(),
        );
        ctx.bind_curies(&bindings);

        assert_eq!(ctx.expand_relation("ea:find"), "http://api.co/rel/find");
        assert!(ctx.relation_matches("ea:find", "http://api.co/rel/find"));
        assert!(!ctx.relation_matches("ea:find", "ea:other"));
    }

    #[test]
    fn resource_for_reuses_cached_entry() {
        let ctx = context();
        let url = CanonicalUrl::parse("http://api.co/orders").unwrap();
        let a = ctx.resource_for(url.clone());
        let b = ctx.resource_for(url.clone());
        assert!(a.ptr_eq(&b));
        assert_eq!(ctx.cache_len(), 1);
        assert!(ctx.cached(&url).is_some());
    }
}
