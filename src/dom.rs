//! Markup parser – reads an HTML fragment into a small DOM tree.
//!
//! Only what the card preview emits is understood:
//! - Structural: div, p, h3, img
//! - Inline: span, strong
//! - `<style>` bodies are kept as raw text
//!
//! Used to read a rendered preview back when checking it against the other
//! encodings.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H3,
    Span,
    Strong,
    Img,
    Style,
    /// Any other tag; kept so the tree shape survives.
    Unknown(String),
}

impl Tag {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h3" => Tag::H3,
            "span" => Tag::Span,
            "strong" | "b" => Tag::Strong,
            "img" => Tag::Img,
            "style" => Tag::Style,
            _ => Tag::Unknown(s.to_string()),
        }
    }

    fn is_void(&self) -> bool {
        match self {
            Tag::Img => true,
            Tag::Unknown(name) => matches!(name.to_ascii_lowercase().as_str(), "br" | "hr" | "meta"),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(|s| s.as_str())
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Depth-first search for the first element carrying `class`.
    pub fn find_class(&self, class: &str) -> Option<&ElementNode> {
        find_class(&self.children, class)
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|c| match c {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        })
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) if e.tag != Tag::Style => collect_text(&e.children, out),
            DomNode::Element(_) => {}
        }
    }
}

/// Depth-first search over a node list.
pub fn find_class<'a>(nodes: &'a [DomNode], class: &str) -> Option<&'a ElementNode> {
    nodes.iter().find_map(|node| match node {
        DomNode::Element(e) if e.has_class(class) => Some(e),
        DomNode::Element(e) => find_class(&e.children, class),
        DomNode::Text(_) => None,
    })
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML fragment into a list of DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    /// Move past the next `len` bytes; callers only pass char boundaries.
    fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.input.len());
    }

    /// Consume up to (not including) `pat`, or to the end.
    fn take_until(&mut self, pat: &str) -> &'a str {
        let rest = self.rest();
        let end = rest.find(pat).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() && !self.starts_with("</") {
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.take_until("-->");
            self.advance(3);
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            self.take_until(">");
            self.advance(1);
            return None;
        }
        if self.starts_with("<") {
            return Some(self.parse_element());
        }
        let text = self.take_until("<");
        if text.trim().is_empty() {
            None
        } else {
            Some(DomNode::Text(decode_entities(text)))
        }
    }

    fn parse_element(&mut self) -> DomNode {
        self.advance(1); // '<'
        let tag = Tag::parse(self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character inside the tag.
                self.advance(self.rest().chars().next().map_or(1, char::len_utf8));
                continue;
            }
            elem.attributes.insert(key, value);
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        self.advance(1); // '>'
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }

        if elem.tag == Tag::Style {
            let css = self.take_until("</");
            elem.children.push(DomNode::Text(css.to_string()));
        } else {
            elem.children = self.parse_nodes();
        }

        if self.starts_with("</") {
            self.take_until(">");
            self.advance(1);
        }
        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name().to_ascii_lowercase();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(1);
        self.skip_whitespace();
        let value = if self.starts_with("\"") || self.starts_with("'") {
            let quote = &self.rest()[..1];
            self.advance(1);
            let value = self.take_until(quote);
            self.advance(1);
            value
        } else {
            let rest = self.rest();
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '>')
                .unwrap_or(rest.len());
            self.pos += end;
            &rest[..end]
        };
        (key, decode_entities(value))
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }
}

/// Inverse of [`escape_html`].
pub fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{00A0}")
        .replace("&amp;", "&")
}

/// Escape text for element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
