// SPDX-License-Identifier: PMPL-1.0-or-later
//! Minimal embedded stylesheet support.
//!
//! Only `<style>` blocks inside the page are read, and only simple compound
//! selectors (`tag`, `.class`, `#id`, `tag.class#id`) are matched. Anything
//! more elaborate is ignored; colours that end up unknown are reported by the
//! contrast rule as unresolved rather than guessed.

use super::{ElementNode, StylePair};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// A simple compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl SimpleSelector {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty()
            || text.contains(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~' | ':' | '[' | '*' | '@'))
        {
            return None;
        }

        let mut selector = SimpleSelector { tag: None, id: None, classes: Vec::new() };
        let mut current = String::new();
        let mut kind = ' ';
        for c in text.chars().chain(std::iter::once('\0')) {
            if matches!(c, '.' | '#' | '\0') {
                if !current.is_empty() {
                    match kind {
                        '.' => selector.classes.push(current.clone()),
                        '#' => selector.id = Some(current.clone()),
                        _ => selector.tag = Some(current.to_ascii_lowercase()),
                    }
                } else if kind != ' ' {
                    return None;
                }
                current.clear();
                kind = c;
            } else {
                current.push(c);
            }
        }
        Some(selector)
    }

    /// (ids, classes, tags)
    fn specificity(&self) -> (usize, usize, usize) {
        (
            usize::from(self.id.is_some()),
            self.classes.len(),
            usize::from(self.tag.is_some()),
        )
    }

    fn matches(&self, node: &ElementNode) -> bool {
        if let Some(ref tag) = self.tag {
            if *tag != node.tag {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if node.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        let node_classes: Vec<&str> = node
            .attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        self.classes.iter().all(|c| node_classes.contains(&c.as_str()))
    }
}

#[derive(Debug, Clone)]
struct StyleRule {
    selector: SimpleSelector,
    declarations: StylePair,
    order: usize,
}

/// Rules collected from a page's `<style>` elements
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parse CSS source text
    pub fn parse(css: &str) -> Self {
        let mut sheet = Stylesheet::default();
        sheet.add_source(css);
        sheet
    }

    /// Collect every `<style>` element of a document
    pub fn from_document(document: &Html) -> Self {
        let style_sel = Selector::parse("style").expect("valid selector");
        let mut sheet = Stylesheet::default();
        for element in document.select(&style_sel) {
            let css: String = element.text().collect();
            sheet.add_source(&css);
        }
        sheet
    }

    fn add_source(&mut self, css: &str) {
        let css = comment_regex().replace_all(css, "");
        for caps in block_regex().captures_iter(&css) {
            let declarations = parse_declarations(&caps[2]);
            if declarations.is_empty() {
                continue;
            }
            for selector in caps[1].split(',').filter_map(SimpleSelector::parse) {
                let order = self.rules.len();
                self.rules.push(StyleRule {
                    selector,
                    declarations: declarations.clone(),
                    order,
                });
            }
        }
    }

    /// Number of usable rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no usable rule was found
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations that apply to `node`, in cascade order
    pub fn style_for(&self, node: &ElementNode) -> StylePair {
        let mut matching: Vec<&StyleRule> =
            self.rules.iter().filter(|r| r.selector.matches(node)).collect();
        matching.sort_by_key(|r| (r.selector.specificity(), r.order));

        let mut style = StylePair::default();
        for rule in matching {
            style.overlay(&rule.declarations);
        }
        style
    }
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"))
}

fn block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").expect("valid regex"))
}

fn color_function_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)rgba?\([^)]*\)").expect("valid regex"))
}

/// Parse a declaration list (`color: #000; background: #fff`)
pub fn parse_declarations(text: &str) -> StylePair {
    let mut style = StylePair::default();
    for declaration in text.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => style.foreground = Some(value.to_string()),
            "background-color" => style.background = Some(value.to_string()),
            "background" => style.background = Some(background_color_part(value)),
            "font-size" => style.font_size = Some(value.to_string()),
            "font-weight" => style.font_weight = Some(value.to_string()),
            _ => {}
        }
    }
    style
}

/// Pick the color out of a `background` shorthand. A shorthand without a
/// color token (`none`, `url(...) no-repeat`) paints no color of its own.
fn background_color_part(value: &str) -> String {
    if let Some(m) = color_function_regex().find(value) {
        return m.as_str().to_string();
    }
    value
        .split_whitespace()
        .find(|token| crate::contrast::parse_color(token).is_ok())
        .unwrap_or("transparent")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let style = parse_declarations("color: #000; background: url(bg.png) no-repeat #fff; font-weight: bold");
        assert_eq!(style.foreground.as_deref(), Some("#000"));
        assert_eq!(style.background.as_deref(), Some("#fff"));
        assert_eq!(style.font_weight.as_deref(), Some("bold"));
    }

    #[test]
    fn test_background_without_color_is_transparent() {
        let style = parse_declarations("background: url(bg.png) no-repeat");
        assert_eq!(style.background.as_deref(), Some("transparent"));
        let style = parse_declarations("background: none !important");
        assert_eq!(style.background.as_deref(), Some("transparent"));
        let style = parse_declarations("background-color: none");
        assert_eq!(style.background.as_deref(), Some("none"));
    }

    #[test]
    fn test_specificity_beats_order() {
        let sheet = Stylesheet::parse(
            "p.note { color: #111111 } /* comment */ p { color: #999999 } .other, h1 { color: red }",
        );
        assert_eq!(sheet.len(), 4);

        let note = ElementNode::new("p").with_attr("class", "note wide");
        assert_eq!(sheet.style_for(&note).foreground.as_deref(), Some("#111111"));

        let plain = ElementNode::new("p");
        assert_eq!(sheet.style_for(&plain).foreground.as_deref(), Some("#999999"));

        let heading = ElementNode::new("h1");
        assert_eq!(sheet.style_for(&heading).foreground.as_deref(), Some("red"));
    }

    #[test]
    fn test_complex_selectors_are_skipped() {
        let sheet = Stylesheet::parse("main p { color: red } a:hover { color: blue } #promo { color: #000 }");
        assert_eq!(sheet.len(), 1);
        let promo = ElementNode::new("div").with_attr("id", "promo");
        assert_eq!(sheet.style_for(&promo).foreground.as_deref(), Some("#000"));
    }
}
