//! Command-line configuration.

use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde_json::{Map, Value};

use formats::{FormatConfig, FormatConfigError};
use http_transport::HttpTransportConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Human,
    /// One JSON object per event
    Json,
}

/// Fetch a hypermedia resource and follow relations from it.
#[derive(Parser, Debug, Clone)]
#[command(name = "hyres", version, about = "Hypermedia API traversal from the command line")]
pub struct Args {
    /// Root URL of the API
    #[arg(env = "HYRES_URL")]
    pub url: String,

    /// Relation to follow, with an optional :index (repeatable, applied in order)
    #[arg(long = "follow", value_name = "REL[:INDEX]")]
    pub follow: Vec<Step>,

    /// Template parameter applied to templated links (repeatable). Values that
    /// parse as JSON are used as JSON, anything else as a string.
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<Param>,

    /// Extra media type for a built-in format, e.g. hal=application/vnd.co+json
    #[arg(
        long = "accept-extra",
        value_name = "FORMAT=TYPE",
        env = "HYRES_ACCEPT_EXTRA",
        value_delimiter = ','
    )]
    pub accept_extra: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, env = "HYRES_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Maximum redirects followed per request (0 disables redirects)
    #[arg(long, env = "HYRES_MAX_REDIRECTS", default_value_t = 10)]
    pub max_redirects: usize,

    /// User-Agent header
    #[arg(long, env = "HYRES_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Log output format
    #[arg(long, env = "HYRES_LOG_FORMAT", value_enum, default_value_t = LogFormat::Human)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn transport_config(&self) -> HttpTransportConfig {
        let config = HttpTransportConfig::default()
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_redirects(self.max_redirects);
        match &self.user_agent {
            Some(agent) => config.with_user_agent(agent.clone()),
            None => config,
        }
    }

    pub fn format_config(&self) -> Result<FormatConfig, FormatConfigError> {
        let mut config = FormatConfig::default();
        for mapping in &self.accept_extra {
            config.add_mapping(mapping)?;
        }
        Ok(config)
    }

    /// Template parameters as a JSON object; later values win.
    pub fn template_params(&self) -> Map<String, Value> {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}

/// One hop of the traversal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub relation: String,
    pub index: usize,
}

impl FromStr for Step {
    type Err = String;

    /// Relations may themselves contain colons (curies, URIs); only a
    /// trailing all-digit segment is read as the index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("relation must not be empty".to_string());
        }
        if let Some((relation, index)) = s.rsplit_once(':') {
            if !relation.is_empty()
                && !index.is_empty()
                && index.chars().all(|c| c.is_ascii_digit())
            {
                let index = index
                    .parse()
                    .map_err(|e| format!("invalid index '{index}': {e}"))?;
                return Ok(Self {
                    relation: relation.to_string(),
                    index,
                });
            }
        }
        Ok(Self {
            relation: s.to_string(),
            index: 0,
        })
    }
}

/// A `name=value` template parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

impl FromStr for Param {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
        if name.is_empty() {
            return Err(format!("parameter name missing in '{s}'"));
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self {
            name: name.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn step(s: &str) -> Step {
        s.parse().unwrap()
    }

    #[test]
    fn step_without_index_defaults_to_zero() {
        assert_eq!(
            step("next"),
            Step {
                relation: "next".to_string(),
                index: 0
            }
        );
    }

    #[test]
    fn step_reads_trailing_index() {
        assert_eq!(step("item:3").index, 3);
        assert_eq!(step("item:3").relation, "item");
    }

    #[test]
    fn curie_and_uri_relations_keep_their_colons() {
        assert_eq!(step("ea:orders").relation, "ea:orders");
        assert_eq!(step("ea:orders").index, 0);
        assert_eq!(step("ea:orders:1").relation, "ea:orders");
        assert_eq!(
            step("http://api.co/rels/orders").relation,
            "http://api.co/rels/orders"
        );
    }

    #[test]
    fn empty_step_is_rejected() {
        assert!("".parse::<Step>().is_err());
    }

    #[test]
    fn params_parse_json_or_fall_back_to_string() {
        let p: Param = "id=42".parse().unwrap();
        assert_eq!(p.value, json!(42));

        let p: Param = "tags=[\"a\",\"b\"]".parse().unwrap();
        assert_eq!(p.value, json!(["a", "b"]));

        let p: Param = "q=hello world".parse().unwrap();
        assert_eq!(p.value, json!("hello world"));

        assert!("novalue".parse::<Param>().is_err());
        assert!("=x".parse::<Param>().is_err());
    }

    #[test]
    fn parses_full_command_line() {
        let args = Args::try_parse_from([
            "hyres",
            "http://api.co/",
            "--follow",
            "ea:orders",
            "--follow",
            "item:1",
            "--param",
            "id=7",
            "--accept-extra",
            "hal=application/vnd.co+json",
            "--timeout-secs",
            "5",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.url, "http://api.co/");
        assert_eq!(args.follow.len(), 2);
        assert_eq!(args.template_params()["id"], json!(7));
        assert_eq!(args.log_format, LogFormat::Json);
        assert_eq!(args.transport_config().timeout, Duration::from_secs(5));
        assert_eq!(
            args.format_config().unwrap().hal,
            vec!["application/vnd.co+json"]
        );
    }

    #[test]
    fn invalid_accept_extra_surfaces_error() {
        let args = Args::try_parse_from([
            "hyres",
            "http://api.co/",
            "--accept-extra",
            "atom=application/atom+xml",
        ])
        .unwrap();
        assert!(args.format_config().is_err());
    }
}
