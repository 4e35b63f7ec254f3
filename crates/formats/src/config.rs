//! Registry construction: which formats are installed, in which order, and
//! which extra media types each recognises.

use std::str::FromStr;
use std::sync::Arc;

use hypermedia::Extension;

use crate::collection_json::CollectionJsonExtension;
use crate::hal::HalExtension;
use crate::json::JsonExtension;
use crate::link_header::LinkHeaderExtension;
use crate::siren::SirenExtension;
use crate::text::TextExtension;

/// A body format that accepts extra media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Hal,
    Siren,
    CollectionJson,
    Json,
    Text,
}

impl Format {
    /// Every format, in registry order.
    pub const ALL: [Format; 5] = [
        Format::Hal,
        Format::Siren,
        Format::CollectionJson,
        Format::Json,
        Format::Text,
    ];

    /// Short identifier used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Hal => "hal",
            Format::Siren => "siren",
            Format::CollectionJson => "collection-json",
            Format::Json => "json",
            Format::Text => "text",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from parsing format configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatConfigError {
    #[error("Unknown format '{name}' (expected one of: hal, siren, collection-json, json, text)")]
    UnknownFormat { name: String },

    #[error("Invalid media type mapping '{input}': expected <format>=<type>/<subtype>")]
    InvalidMapping { input: String },
}

impl FromStr for Format {
    type Err = FormatConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hal" => Ok(Format::Hal),
            "siren" => Ok(Format::Siren),
            "collection-json" | "collection+json" | "cj" => Ok(Format::CollectionJson),
            "json" => Ok(Format::Json),
            "text" => Ok(Format::Text),
            _ => Err(FormatConfigError::UnknownFormat {
                name: s.to_string(),
            }),
        }
    }
}

/// Extra media types per format.
///
/// Built-in media types are always recognised; these are appended after
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatConfig {
    pub hal: Vec<String>,
    pub siren: Vec<String>,
    pub collection_json: Vec<String>,
    pub json: Vec<String>,
    pub text: Vec<String>,
}

impl FormatConfig {
    /// Adds an extra media type for `format`.
    pub fn with_media_type(mut self, format: Format, media_type: impl Into<String>) -> Self {
        self.additional_mut(format).push(media_type.into());
        self
    }

    /// Parses a `<format>=<media type>` mapping and adds it.
    pub fn add_mapping(&mut self, mapping: &str) -> Result<(), FormatConfigError> {
        let invalid = || FormatConfigError::InvalidMapping {
            input: mapping.to_string(),
        };
        let (format, media_type) = mapping.split_once('=').ok_or_else(invalid)?;
        let media_type = media_type.trim();
        if !media_type.contains('/') {
            return Err(invalid());
        }
        let format: Format = format.parse()?;
        self.additional_mut(format)
            .push(media_type.to_ascii_lowercase());
        Ok(())
    }

    pub fn additional(&self, format: Format) -> &[String] {
        match format {
            Format::Hal => &self.hal,
            Format::Siren => &self.siren,
            Format::CollectionJson => &self.collection_json,
            Format::Json => &self.json,
            Format::Text => &self.text,
        }
    }

    fn additional_mut(&mut self, format: Format) -> &mut Vec<String> {
        match format {
            Format::Hal => &mut self.hal,
            Format::Siren => &mut self.siren,
            Format::CollectionJson => &mut self.collection_json,
            Format::Json => &mut self.json,
            Format::Text => &mut self.text,
        }
    }

    /// Builds the extension registry: HAL, Siren, Collection+JSON, JSON,
    /// text, then the Link header adapter.
    pub fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        vec![
            Arc::new(HalExtension::new(self.hal.clone())),
            Arc::new(SirenExtension::new(self.siren.clone())),
            Arc::new(CollectionJsonExtension::new(self.collection_json.clone())),
            Arc::new(JsonExtension::new(self.json.clone())),
            Arc::new(TextExtension::new(self.text.clone())),
            Arc::new(LinkHeaderExtension),
        ]
    }
}

/// The built-in registry with no extra media types.
pub fn default_extensions() -> Vec<Arc<dyn Extension>> {
    FormatConfig::default().extensions()
}
