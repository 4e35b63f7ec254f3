//! URI template expansion (RFC 6570, levels 1 through 4).
//!
//! Variables come from a JSON object. Strings, numbers and booleans expand as
//! scalars; arrays as lists; objects as associative arrays. Missing and
//! `null` variables are undefined and contribute nothing.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Characters left as-is by every operator.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters left as-is by the `+` and `#` operators.
const UNRESERVED_AND_RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// Expansion behaviour of one expression operator.
struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

impl Operator {
    fn from_prefix(c: char) -> Option<Self> {
        let op = match c {
            '+' => Self::new("", ",", false, "", true),
            '#' => Self::new("#", ",", false, "", true),
            '.' => Self::new(".", ".", false, "", false),
            '/' => Self::new("/", "/", false, "", false),
            ';' => Self::new(";", ";", true, "", false),
            '?' => Self::new("?", "&", true, "=", false),
            '&' => Self::new("&", "&", true, "=", false),
            _ => return None,
        };
        Some(op)
    }

    fn simple() -> Self {
        Self::new("", ",", false, "", false)
    }

    const fn new(
        first: &'static str,
        sep: &'static str,
        named: bool,
        if_empty: &'static str,
        allow_reserved: bool,
    ) -> Self {
        Self {
            first,
            sep,
            named,
            if_empty,
            allow_reserved,
        }
    }

    fn encode(&self, value: &str) -> String {
        let set = if self.allow_reserved {
            UNRESERVED_AND_RESERVED
        } else {
            UNRESERVED
        };
        utf8_percent_encode(value, set).to_string()
    }

    fn named_value(&self, name: &str, value: &str) -> String {
        if value.is_empty() {
            format!("{name}{}", self.if_empty)
        } else {
            format!("{name}={}", self.encode(value))
        }
    }
}

enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

struct VarSpec<'a> {
    name: &'a str,
    modifier: Modifier,
}

impl<'a> VarSpec<'a> {
    fn parse(spec: &'a str) -> Self {
        if let Some(name) = spec.strip_suffix('*') {
            return Self {
                name,
                modifier: Modifier::Explode,
            };
        }
        if let Some((name, len)) = spec.split_once(':') {
            if let Ok(len) = len.parse::<usize>() {
                return Self {
                    name,
                    modifier: Modifier::Prefix(len),
                };
            }
        }
        Self {
            name: spec,
            modifier: Modifier::None,
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Expands `template` with `params`.
///
/// Unterminated expressions are copied through literally.
pub fn expand(template: &str, params: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                out.push_str(&expand_expression(&after[..close], params));
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Lists the variable names referenced by `template`, in order of appearance.
pub fn variables(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else { break };
        let expr = &after[..close];
        let body = match expr.chars().next().and_then(Operator::from_prefix) {
            Some(_) => &expr[1..],
            None => expr,
        };
        for spec in body.split(',').filter(|s| !s.is_empty()) {
            let name = VarSpec::parse(spec).name.to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        rest = &after[close + 1..];
    }
    names
}

fn expand_expression(expr: &str, params: &Map<String, Value>) -> String {
    let (op, body) = match expr.chars().next().and_then(Operator::from_prefix) {
        Some(op) => (op, &expr[1..]),
        None => (Operator::simple(), expr),
    };

    let parts: Vec<String> = body
        .split(',')
        .filter(|s| !s.is_empty())
        .filter_map(|spec| expand_var(&op, &VarSpec::parse(spec), params))
        .collect();

    if parts.is_empty() {
        String::new()
    } else {
        format!("{}{}", op.first, parts.join(op.sep))
    }
}

fn expand_var(op: &Operator, spec: &VarSpec<'_>, params: &Map<String, Value>) -> Option<String> {
    let value = params.get(spec.name)?;
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            if items.is_empty() {
                return None;
            }
            let part = match (&spec.modifier, op.named) {
                (Modifier::Explode, true) => items
                    .iter()
                    .map(|i| op.named_value(spec.name, i))
                    .collect::<Vec<_>>()
                    .join(op.sep),
                (Modifier::Explode, false) => items
                    .iter()
                    .map(|i| op.encode(i))
                    .collect::<Vec<_>>()
                    .join(op.sep),
                (_, named) => {
                    let joined = items
                        .iter()
                        .map(|i| op.encode(i))
                        .collect::<Vec<_>>()
                        .join(",");
                    if named {
                        format!("{}={joined}", spec.name)
                    } else {
                        joined
                    }
                }
            };
            Some(part)
        }
        Value::Object(pairs) => {
            let pairs: Vec<(&String, String)> = pairs
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k, v)))
                .collect();
            if pairs.is_empty() {
                return None;
            }
            let part = match spec.modifier {
                Modifier::Explode => pairs
                    .iter()
                    .map(|(k, v)| op.named_value(&op.encode(k), v))
                    .collect::<Vec<_>>()
                    .join(op.sep),
                _ => {
                    let joined = pairs
                        .iter()
                        .map(|(k, v)| format!("{},{}", op.encode(k), op.encode(v)))
                        .collect::<Vec<_>>()
                        .join(",");
                    if op.named {
                        format!("{}={joined}", spec.name)
                    } else {
                        joined
                    }
                }
            };
            Some(part)
        }
        other => {
            let mut s = scalar(other)?;
            if let Modifier::Prefix(len) = spec.modifier {
                s = s.chars().take(len).collect();
            }
            if op.named {
                Some(op.named_value(spec.name, &s))
            } else {
                Some(op.encode(&s))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Map<String, Value> {
        json!({
            "var": "value",
            "hello": "Hello World!",
            "path": "/foo/bar",
            "empty": "",
            "x": "1024",
            "y": "768",
            "list": ["red", "green", "blue"],
            "keys": {"semi": ";", "dot": ".", "comma": ","},
            "id": 42,
            "nothing": null
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn simple_and_reserved_expansion() {
        let p = params();
        assert_eq!(expand("{var}", &p), "value");
        assert_eq!(expand("{hello}", &p), "Hello%20World%21");
        assert_eq!(expand("{+hello}", &p), "Hello%20World!");
        assert_eq!(expand("{+path}/here", &p), "/foo/bar/here");
        assert_eq!(expand("X{#var}", &p), "X#value");
        assert_eq!(expand("/things/{id}", &p), "/things/42");
    }

    #[test]
    fn path_label_and_query_operators() {
        let p = params();
        assert_eq!(expand("/things{/id}", &p), "/things/42");
        assert_eq!(expand("{/var,x}/here", &p), "/value/1024/here");
        assert_eq!(expand("X{.var}", &p), "X.value");
        assert_eq!(expand("{;x,y,empty}", &p), ";x=1024;y=768;empty");
        assert_eq!(expand("{?x,y,empty}", &p), "?x=1024&y=768&empty=");
        assert_eq!(expand("?fixed=yes{&x}", &p), "?fixed=yes&x=1024");
    }

    #[test]
    fn lists_maps_and_modifiers() {
        let p = params();
        assert_eq!(expand("{list}", &p), "red,green,blue");
        assert_eq!(expand("{/list*}", &p), "/red/green/blue");
        assert_eq!(expand("{?list*}", &p), "?list=red&list=green&list=blue");
        assert_eq!(expand("{?keys*}", &p), "?semi=%3B&dot=.&comma=%2C");
        assert_eq!(expand("{var:3}", &p), "val");
    }

    #[test]
    fn undefined_variables_are_skipped() {
        let p = params();
        assert_eq!(expand("/things{/missing}", &p), "/things");
        assert_eq!(expand("{?nothing}", &p), "");
        assert_eq!(expand("/things{/id", &p), "/things{/id");
    }

    #[test]
    fn lists_template_variables() {
        assert_eq!(
            variables("/things{/id}{?q,page,id}"),
            vec!["id".to_string(), "q".to_string(), "page".to_string()]
        );
    }
}
