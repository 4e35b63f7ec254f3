//! Entry point for application code.
//!
//! A [`Client`] holds the process-wide, immutable configuration (transport,
//! extension registry, options). Every traversal it starts gets a fresh
//! [`Context`], so caches and curie bindings never leak between independent
//! top-level calls.

use std::sync::Arc;

use crate::context::{Context, ContextOptions};
use crate::errors::HyResult;
use crate::extension::Extension;
use crate::resource::Resource;
use crate::transport::{Request, Response, Transport};

/// Starts traversals.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    extensions: Vec<Arc<dyn Extension>>,
    options: ContextOptions,
}

impl Client {
    /// Creates a client with default options.
    pub fn new(transport: Arc<dyn Transport>, extensions: Vec<Arc<dyn Extension>>) -> Self {
        Self {
            transport,
            extensions,
            options: ContextOptions::default(),
        }
    }

    /// Replaces the options applied to every context this client creates.
    pub fn with_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    /// Registered extensions, in selection order.
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    /// Creates a fresh, empty context.
    pub fn context(&self) -> Context {
        Context::with_options(
            self.extensions.clone(),
            Arc::clone(&self.transport),
            self.options.clone(),
        )
    }

    /// Starts a traversal at `href`.
    ///
    /// Fails synchronously only if `href` cannot be resolved to an absolute
    /// URL; fetch failures surface through [`Resource::resolved`].
    pub fn root(&self, href: &str) -> HyResult<Resource> {
        self.context().resolve(href)
    }

    /// Starts a traversal from a response the caller already holds.
    pub fn parse(&self, request: Request, response: Response) -> Resource {
        let context = self.context();
        Resource::from_response(request, response, &context)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("extensions", &self.extensions)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceState;
    use crate::transport::OfflineTransport;

    #[test]
    fn each_root_gets_its_own_context() {
        let client = Client::new(Arc::new(OfflineTransport), Vec::new());
        let a = client.root("http://api.co/").unwrap();
        let b = client.root("http://api.co/").unwrap();
        assert!(!a.context().ptr_eq(b.context()));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.state(), ResourceState::Resolving);
    }

    #[test]
    fn relative_root_uses_base_url() {
        let options = ContextOptions::default()
            .with_base_url(crate::CanonicalUrl::parse("http://api.co/v1/").unwrap());
        let client = Client::new(Arc::new(OfflineTransport), Vec::new()).with_options(options);
        let root = client.root("orders").unwrap();
        assert_eq!(root.href().unwrap().as_str(), "http://api.co/v1/orders");
    }

    #[test]
    fn relative_root_without_base_fails() {
        let client = Client::new(Arc::new(OfflineTransport), Vec::new());
        assert!(client.root("/orders").is_err());
    }
}
