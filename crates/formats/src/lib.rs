//! Built-in hypermedia format adapters.
//!
//! Each adapter implements [`hypermedia::Extension`] for one media-type
//! family. [`default_extensions`] returns them in the order the client tries
//! them; [`FormatConfig`] adds caller-specific media types.
//!
//! | Module | Media types |
//! |--------|-------------|
//! | [`hal`] | `application/hal+json`, `application/vnd.hal+json` |
//! | [`siren`] | `application/vnd.siren+json` |
//! | [`collection_json`] | `application/vnd.collection+json` |
//! | [`json`] | `application/json` |
//! | [`text`] | `text/plain` |
//! | [`link_header`] | any response with a `Link` header |

pub mod collection_json;
pub mod config;
pub mod hal;
pub mod json;
pub mod link_header;
pub mod siren;
pub mod text;

mod shape;

pub use collection_json::{CollectionItemExtension, CollectionJsonExtension};
pub use config::{default_extensions, Format, FormatConfig, FormatConfigError};
pub use hal::HalExtension;
pub use json::JsonExtension;
pub use link_header::{parse_link_header, LinkHeaderExtension};
pub use siren::SirenExtension;
pub use text::TextExtension;
