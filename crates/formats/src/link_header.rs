//! Web Linking (RFC 8288) `Link` response headers.
//!
//! Applies to any response carrying a `Link` header, whatever its body.
//! Registered last so that body formats take precedence; a response whose
//! body format is unknown still exposes its header links.

use http::header::LINK;
use http::{HeaderMap, StatusCode};
use tracing::debug;

use hypermedia::{push_link, Context, DataEntry, Document, Extension, Link, LinkMap, Request};

/// Link header adapter.
#[derive(Debug, Clone, Default)]
pub struct LinkHeaderExtension;

impl Extension for LinkHeaderExtension {
    fn name(&self) -> &str {
        "link-header"
    }

    /// Header links carry no media type of their own.
    fn media_types(&self) -> &[String] {
        &[]
    }

    fn applies(&self, _request: &Request, headers: &HeaderMap, status: StatusCode) -> bool {
        status != StatusCode::NO_CONTENT && headers.contains_key(LINK)
    }

    fn link_parser(
        &self,
        _document: &Document,
        headers: &HeaderMap,
        _request: &Request,
        _context: &Context,
    ) -> LinkMap {
        let mut links = LinkMap::new();
        for value in headers.get_all(LINK) {
            let Ok(value) = value.to_str() else {
                debug!("Skipping non-ASCII Link header");
                continue;
            };
            for link in parse_link_header(value) {
                push_link(&mut links, link);
            }
        }
        links
    }

    fn data_parser(&self, _document: &Document, _headers: &HeaderMap) -> Vec<DataEntry> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parses one `Link` header value into links, one per relation listed in
/// each link-value's `rel` parameter.
///
/// Malformed link-values are skipped. Link-values without `rel` produce
/// nothing.
pub fn parse_link_header(value: &str) -> Vec<Link> {
    let mut scanner = Scanner::new(value);
    let mut links = Vec::new();

    loop {
        scanner.skip_while(|c| c == ',' || c.is_whitespace());
        if scanner.at_end() {
            break;
        }
        if !scanner.eat('<') {
            // Not a link-value; resynchronise at the next top-level comma.
            scanner.skip_value();
            continue;
        }
        let href = scanner.take_until('>').to_string();
        if !scanner.eat('>') {
            break;
        }

        let params = scanner.params();
        let relations = params
            .iter()
            .find(|(name, _)| name == "rel")
            .map(|(_, value)| value.clone())
            .unwrap_or_default();
        let param = |key: &str| {
            params
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        };

        for relation in relations.split_whitespace() {
            let mut link = Link::new(relation, href.clone());
            link.title = param("title");
            link.media_type = param("type");
            link.hreflang = param("hreflang");
            links.push(link);
        }
    }
    links
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        self.skip_while(pred);
        &self.input[start..self.pos]
    }

    fn take_until(&mut self, end: char) -> &'a str {
        self.take_while(|c| c != end)
    }

    /// Skips to the next comma outside quotes and angle brackets.
    fn skip_value(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ',' => return,
                '"' => {
                    self.quoted();
                }
                '<' => {
                    self.pos += 1;
                    self.take_until('>');
                    self.eat('>');
                }
                _ => self.pos += c.len_utf8(),
            }
        }
    }

    /// Reads a quoted-string starting at the opening quote, unescaping
    /// `\x` pairs.
    fn quoted(&mut self) -> String {
        let mut out = String::new();
        self.eat('"');
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.peek() {
                        self.pos += escaped.len_utf8();
                        out.push(escaped);
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    /// Reads `;`-separated parameters up to the end of the link-value.
    /// Names are lowercased; the first occurrence of a name wins.
    fn params(&mut self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_while(char::is_whitespace);
            if !self.eat(';') {
                break;
            }
            self.skip_while(char::is_whitespace);
            let name = self
                .take_while(|c| !matches!(c, '=' | ';' | ',') && !c.is_whitespace())
                .to_ascii_lowercase();
            self.skip_while(char::is_whitespace);

            let value = if self.eat('=') {
                self.skip_while(char::is_whitespace);
                if self.peek() == Some('"') {
                    self.quoted()
                } else {
                    self.take_while(|c| !matches!(c, ';' | ',') && !c.is_whitespace())
                        .to_string()
                }
            } else {
                String::new()
            };

            if !name.is_empty() && !params.iter().any(|(n, _)| *n == name) {
                params.push((name, value));
            }
        }
        // Anything else before the next comma is not part of a valid
        // link-value.
        self.skip_value();
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use hypermedia::CanonicalUrl;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_single_link() {
        let links = parse_link_header(r#"<https://api.co/page/2>; rel="next""#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].relation, "next");
        assert_eq!(links[0].href, "https://api.co/page/2");
    }

    #[test]
    fn parses_multiple_link_values() {
        let links = parse_link_header(
            r#"</page/1>; rel="prev first"; title="Back, to start", </page/3>; rel=next"#,
        );
        let rels: Vec<_> = links.iter().map(|l| l.relation.as_str()).collect();
        assert_eq!(rels, vec!["prev", "first", "next"]);
        assert_eq!(links[0].title.as_deref(), Some("Back, to start"));
        assert_eq!(links[1].href, "/page/1");
        assert_eq!(links[2].href, "/page/3");
    }

    #[test]
    fn keeps_type_and_hreflang_and_unescapes() {
        let links = parse_link_header(
            r#"</doc>; REL=alternate; type="text/html"; hreflang=de; title="say \"hi\"""#,
        );
        assert_eq!(links[0].relation, "alternate");
        assert_eq!(links[0].media_type.as_deref(), Some("text/html"));
        assert_eq!(links[0].hreflang.as_deref(), Some("de"));
        assert_eq!(links[0].title.as_deref(), Some(r#"say "hi""#));
    }

    #[test]
    fn commas_inside_uri_do_not_split() {
        let links = parse_link_header(r#"</a,b>; rel=x, </c>; rel=y"#);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/a,b");
    }

    #[test]
    fn malformed_values_are_skipped() {
        assert!(parse_link_header("").is_empty());
        assert!(parse_link_header("garbage, more garbage").is_empty());
        assert!(parse_link_header("</no-rel>").is_empty());

        let links = parse_link_header("junk; rel=x, </ok>; rel=ok");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/ok");
    }

    #[test]
    fn first_rel_parameter_wins() {
        let links = parse_link_header("</x>; rel=a; rel=b");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].relation, "a");
    }

    #[test]
    fn applies_only_with_link_header() {
        let ext = LinkHeaderExtension;
        let request = Request::get(CanonicalUrl::parse("http://api.co/").unwrap());
        let mut headers = HeaderMap::new();
        assert!(!ext.applies(&request, &headers, StatusCode::OK));

        headers.insert(LINK, HeaderValue::from_static("</x>; rel=next"));
        assert!(ext.applies(&request, &headers, StatusCode::OK));
        assert!(!ext.applies(&request, &headers, StatusCode::NO_CONTENT));
    }

    #[test]
    fn link_parser_reads_every_header_value() {
        let ext = LinkHeaderExtension;
        let request = Request::get(CanonicalUrl::parse("http://api.co/").unwrap());
        let mut headers = HeaderMap::new();
        headers.append(LINK, HeaderValue::from_static("</a>; rel=item"));
        headers.append(LINK, HeaderValue::from_static("</b>; rel=item, </>; rel=up"));

        let links = ext.link_parser(
            &Document::from_bytes(Vec::new()),
            &headers,
            &request,
            &Context::offline(Vec::new()),
        );
        assert_eq!(links["item"].len(), 2);
        assert_eq!(links["up"][0].href, "/");
    }
}
