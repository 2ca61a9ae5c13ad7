// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page artifacts and their element trees.
//!
//! A [`PageArtifact`] is one built HTML page in one language. Its markup is
//! parsed once into an owned [`ElementNode`] tree so the checkers can walk it
//! concurrently without touching the parser again.

pub mod stylesheet;

use crate::finding::Location;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use stylesheet::Stylesheet;

/// Color-relevant declarations for one element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylePair {
    /// Declared `color`
    pub foreground: Option<String>,
    /// Declared `background-color` (or the color part of `background`)
    pub background: Option<String>,
    /// Declared `font-size`
    pub font_size: Option<String>,
    /// Declared `font-weight`
    pub font_weight: Option<String>,
}

impl StylePair {
    /// Whether nothing was declared
    pub fn is_empty(&self) -> bool {
        self.foreground.is_none()
            && self.background.is_none()
            && self.font_size.is_none()
            && self.font_weight.is_none()
    }

    /// Whether a color or background was declared
    pub fn declares_color(&self) -> bool {
        self.foreground.is_some() || self.background.is_some()
    }

    /// Overlay `other` on top of `self`; declared values in `other` win.
    pub fn overlay(&mut self, other: &StylePair) {
        if other.foreground.is_some() {
            self.foreground.clone_from(&other.foreground);
        }
        if other.background.is_some() {
            self.background.clone_from(&other.background);
        }
        if other.font_size.is_some() {
            self.font_size.clone_from(&other.font_size);
        }
        if other.font_weight.is_some() {
            self.font_weight.clone_from(&other.font_weight);
        }
    }
}

/// One element of a parsed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes, unique keys
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order
    pub children: Vec<ElementNode>,
    /// Own text content with whitespace collapsed (descendant text excluded)
    pub text: String,
    /// Declared style, if any
    pub style: Option<StylePair>,
}

impl ElementNode {
    /// Create an empty element
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
            style: None,
        }
    }

    /// Set an attribute
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Set own text
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = collapse_whitespace(text);
        self
    }

    /// Set the declared style
    pub fn with_style(mut self, style: StylePair) -> Self {
        self.style = if style.is_empty() { None } else { Some(style) };
        self
    }

    /// Attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether an attribute equals `value`, ignoring ASCII case
    pub fn attr_is(&self, name: &str, value: &str) -> bool {
        self.attr(name)
            .map(|v| v.trim().eq_ignore_ascii_case(value))
            .unwrap_or(false)
    }

    /// ARIA role, lowercased
    pub fn role(&self) -> Option<String> {
        self.attr("role").map(|r| r.trim().to_ascii_lowercase())
    }

    /// Whether this element carries its own text
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Concatenated text of this element and all descendants
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        collect_text(self, &mut parts);
        parts.join(" ")
    }

    /// Depth-first pre-order traversal starting at this element
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![Pending {
                node: self,
                path: self.tag.clone(),
                ancestors: Vec::new(),
            }],
            next_index: 0,
        }
    }
}

fn collect_text<'a>(node: &'a ElementNode, parts: &mut Vec<&'a str>) {
    if node.has_text() {
        parts.push(&node.text);
    }
    for child in &node.children {
        collect_text(child, parts);
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Pending<'a> {
    node: &'a ElementNode,
    path: String,
    ancestors: Vec<&'a ElementNode>,
}

/// An element reached during traversal
#[derive(Debug, Clone)]
pub struct Visit<'a> {
    /// The element
    pub node: &'a ElementNode,
    /// Pre-order index, 0 for the root
    pub index: usize,
    /// Slash-separated path from the root, e.g. `html/body/div[2]/p`
    pub path: String,
    /// Ancestors from the root down to the parent
    pub ancestors: Vec<&'a ElementNode>,
}

impl Visit<'_> {
    /// Location of this element within `page`
    pub fn location(&self, page: &str) -> Location {
        Location {
            page: page.to_string(),
            path: Some(self.path.clone()),
            node_index: Some(self.index),
            byte_offset: None,
        }
    }

    /// Nearest ancestor matching `pred`, innermost first
    pub fn nearest_ancestor(&self, pred: impl Fn(&ElementNode) -> bool) -> Option<&ElementNode> {
        self.ancestors.iter().rev().copied().find(|a| pred(a))
    }
}

/// Pre-order iterator over an element tree
pub struct Walk<'a> {
    stack: Vec<Pending<'a>>,
    next_index: usize,
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Visit<'a>> {
        let Pending { node, path, ancestors } = self.stack.pop()?;
        let index = self.next_index;
        self.next_index += 1;

        let mut totals: HashMap<&str, usize> = HashMap::new();
        for child in &node.children {
            *totals.entry(child.tag.as_str()).or_default() += 1;
        }
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut pending = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let tag = child.tag.as_str();
            let nth = seen.entry(tag).or_default();
            *nth += 1;
            let segment = if totals[tag] > 1 {
                format!("{}[{}]", tag, nth)
            } else {
                tag.to_string()
            };
            let mut child_ancestors = ancestors.clone();
            child_ancestors.push(node);
            pending.push(Pending {
                node: child,
                path: format!("{}/{}", path, segment),
                ancestors: child_ancestors,
            });
        }
        self.stack.extend(pending.into_iter().rev());

        Some(Visit { node, index, path, ancestors })
    }
}

/// One built page in one language
#[derive(Debug, Clone)]
pub struct PageArtifact {
    /// Path or URL identifying the page
    pub id: String,
    /// Language tag, e.g. `zh-Hant`
    pub language: String,
    /// Root element (normally `<html>`)
    pub root: ElementNode,
    /// Raw bytes as supplied
    pub content: Vec<u8>,
    /// Whether a `<!DOCTYPE html>` declaration was present
    pub has_doctype: bool,
    /// Number of `<link rel="stylesheet">` references whose rules are not available
    pub external_stylesheets: usize,
    /// Byte offset of the first invalid UTF-8 sequence, if the content did not decode cleanly
    pub invalid_utf8_at: Option<usize>,
}

impl PageArtifact {
    /// Build an artifact from an already constructed tree
    pub fn new(id: impl Into<String>, language: impl Into<String>, root: ElementNode) -> Self {
        Self {
            id: id.into(),
            language: language.into(),
            root,
            content: Vec::new(),
            has_doctype: true,
            external_stylesheets: 0,
            invalid_utf8_at: None,
        }
    }

    /// Parse raw HTML into an artifact. Invalid UTF-8 is replaced so the
    /// tree can still be built; the offset of the first bad byte is kept.
    pub fn parse(id: impl Into<String>, language: impl Into<String>, content: Vec<u8>) -> Self {
        let invalid_utf8_at = std::str::from_utf8(&content).err().map(|e| e.valid_up_to());
        let text = String::from_utf8_lossy(&content);
        let document = Html::parse_document(&text);

        let has_doctype = document
            .tree
            .root()
            .children()
            .any(|n| matches!(n.value(), Node::Doctype(d) if d.name().eq_ignore_ascii_case("html")));

        let sheet = Stylesheet::from_document(&document);
        let root = convert(document.root_element(), &sheet);
        let external_stylesheets = root
            .walk()
            .filter(|v| {
                v.node.tag == "link"
                    && v.node
                        .attr("rel")
                        .map(|r| r.split_whitespace().any(|t| t.eq_ignore_ascii_case("stylesheet")))
                        .unwrap_or(false)
            })
            .count();

        Self {
            id: id.into(),
            language: language.into(),
            root,
            content,
            has_doctype,
            external_stylesheets,
            invalid_utf8_at,
        }
    }

    /// Depth-first pre-order traversal of the page
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// Location pointing at the page as a whole
    pub fn location(&self) -> Location {
        Location::page(self.id.clone())
    }

    /// The `<html>` element, if the root is one
    pub fn html_element(&self) -> Option<&ElementNode> {
        (self.root.tag == "html").then_some(&self.root)
    }
}

/// Elements whose text children are not rendered content
const NON_TEXT_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

fn convert(element: ElementRef<'_>, sheet: &Stylesheet) -> ElementNode {
    let value = element.value();
    let mut node = ElementNode::new(value.name());
    for (name, attr) in value.attrs() {
        node.attributes.insert(name.to_ascii_lowercase(), attr.to_string());
    }

    let keep_text = !NON_TEXT_ELEMENTS.contains(&node.tag.as_str());
    let mut own_text = String::new();
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            node.children.push(convert(child_element, sheet));
        } else if let Node::Text(text) = child.value() {
            if keep_text {
                own_text.push(' ');
                own_text.push_str(text);
            }
        }
    }
    node.text = collapse_whitespace(&own_text);

    let mut style = sheet.style_for(&node);
    if let Some(inline) = node.attr("style") {
        style.overlay(&stylesheet::parse_declarations(inline));
    }
    node.style = if style.is_empty() { None } else { Some(style) };
    node
}
