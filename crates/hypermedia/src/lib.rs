//! Hypermedia client core.
//!
//! Consumes HTTP responses encoded in pluggable hypermedia media types (HAL,
//! Siren, Collection+JSON, ...) and exposes them as a uniform, lazily
//! resolved resource graph with typed links, embedded sub-resources and data
//! properties.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. The
//! [`Transport`] port is implemented by an infrastructure crate; media-type
//! parsers plug in through the [`Extension`] trait.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`curie`] | Compact URI templates and relation splitting |
//! | [`template`] | RFC 6570 URI template expansion |
//! | [`link`] | The [`Link`] value and relation-keyed link maps |
//! | [`extension`] | The [`Extension`] format-adapter contract |
//! | [`context`] | Per-traversal registry, resource cache and curie bindings |
//! | [`resource`] | The [`Resource`] graph node and its resolution state machine |
//! | [`client`] | [`Client`], which starts traversals |
//! | [`transport`] | The [`Transport`] port and request/response values |
//! | [`identifiers`] | [`TraversalId`], [`CanonicalUrl`] |
//! | [`types`] | [`Document`], [`DataEntry`], media-type helpers, [`Timestamp`] |
//! | [`errors`] | [`HyError`], [`TransportError`] |
//!
//! ## Example
//!
//! ```rust,no_run
//! # async fn run(client: hypermedia::Client) -> hypermedia::HyResult<()> {
//! let root = client.root("https://api.example.com/")?.resolved().await?;
//! let orders = root.follow("ea:orders", 0)?.resolved().await?;
//! for order in orders.embedded_all("ea:order") {
//!     println!("{:?}", order.data("total"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod curie;
pub mod errors;
pub mod extension;
pub mod identifiers;
pub mod link;
pub mod resource;
pub mod template;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use client::Client;
pub use context::{Context, ContextOptions};
pub use curie::{split_curie, CurieMap, CurieTemplate};
pub use errors::{HyError, HyResult, TransportError};
pub use extension::{applies_to_media_types, media_types_with, EmbeddedMap, Extension};
pub use identifiers::{CanonicalUrl, TraversalId};
pub use link::{push_link, Link, LinkMap};
pub use resource::{Representation, Resource, ResourceState};
pub use transport::{OfflineTransport, Request, Response, Transport};
pub use types::{content_type, content_type_matches, DataEntry, Document, Timestamp};

// Transport implementations and extensions speak these types.
pub use http;
