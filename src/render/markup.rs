//! A small element tree that escapes at serialization time.
//!
//! Text and attribute values are stored raw; `to_html` is the only place
//! that produces markup, so nothing inserted through the builder can break
//! out of its element.

use std::fmt::Write as _;

const VOID_TAGS: [&str; 3] = ["img", "br", "input"];
const BLOCK_TAGS: [&str; 14] = [
    "div", "section", "header", "footer", "nav", "article", "main", "h1", "h2", "h3", "p",
    "ul", "li", "blockquote",
];

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attrs: Vec<(&'static str, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    /// Marks the element as the trigger of an abstract page event.
    pub fn event(self, name: &'static str) -> Self {
        self.attr("data-event", name)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children<I, N>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.children.push(Node::Text(value.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }
}

/// The rendered page: a title plus the body tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayTree {
    pub title: String,
    pub root: Element,
}

impl DisplayTree {
    pub fn new(title: impl Into<String>, root: Element) -> Self {
        Self {
            title: title.into(),
            root,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, &self.root);
        out
    }

    /// Plain-text projection for terminals: blocks on their own lines,
    /// controls in brackets, images dropped.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        write_text(&mut out, &self.root);
        let mut lines: Vec<&str> = Vec::new();
        for line in out.lines().map(str::trim_end) {
            if line.trim().is_empty() && lines.last().map_or(true, |l| l.trim().is_empty()) {
                continue;
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    /// Every element carrying `data-event`, in document order.
    pub fn events(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_events(&self.root, &mut found);
        found
    }
}

fn collect_events<'a>(el: &'a Element, found: &mut Vec<&'a Element>) {
    if el.get_attr("data-event").is_some() {
        found.push(el);
    }
    for child in &el.children {
        if let Node::Element(e) = child {
            collect_events(e, found);
        }
    }
}

fn write_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(el.tag);
    for (name, value) in &el.attrs {
        let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
    }
    out.push('>');
    if VOID_TAGS.contains(&el.tag) {
        return;
    }
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(&escape_html(t)),
            Node::Element(e) => write_element(out, e),
        }
    }
    let _ = write!(out, "</{}>", el.tag);
}

fn write_text(out: &mut String, el: &Element) {
    let block = BLOCK_TAGS.contains(&el.tag);
    match el.tag {
        "img" | "input" => return,
        "br" => {
            out.push('\n');
            return;
        }
        _ => {}
    }
    if block && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    if el.tag == "button" {
        out.push('[');
    }
    for child in &el.children {
        match child {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => write_text(out, e),
        }
    }
    match el.tag {
        "button" => out.push_str("] "),
        "span" | "a" | "strong" | "em" => out.push(' '),
        _ => {}
    }
    if block && !out.ends_with('\n') {
        out.push('\n');
    }
}
