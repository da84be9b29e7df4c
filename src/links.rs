//! Link rendering strategy.
//!
//! The serializer never decides what a link looks like; it asks a
//! [`LinkRenderer`] for a [`Rendering`] and prints that. Implement the
//! trait (all methods have defaults) to customize link output, e.g. to add
//! `rel="nofollow"` to external links.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::ast::Node;
use crate::html::printer::encode_html;

/// Wiki page names are form-encoded after spaces become dashes.
const PAGE_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*');

/// One HTML attribute of a rendered link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The classic `rel="nofollow"`.
    pub fn no_follow() -> Self {
        Attribute::new("rel", "nofollow")
    }
}

/// The concrete properties of a link about to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendering {
    pub href: String,
    pub text: String,
    pub attributes: Vec<Attribute>,
}

impl Rendering {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Rendering {
            href: href.into(),
            text: text.into(),
            attributes: Vec::new(),
        }
    }

    /// Attach an attribute; a repeated name extends the existing value
    /// space-delimited, as multiple classes need.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        match self.attributes.iter().position(|a| a.name == name) {
            Some(i) => {
                let merged = format!("{} {}", self.attributes[i].value, value);
                self.attributes.remove(i);
                self.attributes.push(Attribute::new(name, merged));
            }
            None => self.attributes.push(Attribute::new(name, value)),
        }
        self
    }
}

/// Turns link-like AST nodes into [`Rendering`]s. Every method has a
/// default; implementors override selectively.
pub trait LinkRenderer {
    fn auto_link(&self, node: &Node, url: &str) -> Rendering {
        let _ = node;
        Rendering::new(url, url)
    }

    /// Email addresses are obfuscated character by character.
    fn mail_link(&self, node: &Node, address: &str) -> Rendering {
        let _ = node;
        let obfuscated = obfuscate(address);
        Rendering::new(format!("mailto:{obfuscated}"), obfuscated)
    }

    /// Anchors carry only a `name`; no `href` is emitted for them.
    fn anchor_link(&self, node: &Node, name: &str, text: &str) -> Rendering {
        let _ = node;
        Rendering::new("", text).with_attribute("name", name)
    }

    fn explicit_link(&self, node: &Node, url: &str, title: &str, text: &str) -> Rendering {
        let _ = node;
        with_title(Rendering::new(url, text), title)
    }

    fn image(&self, node: &Node, url: &str, title: &str, alt: &str) -> Rendering {
        let _ = node;
        with_title(Rendering::new(url, alt), title)
    }

    fn reference_link(&self, node: &Node, url: &str, title: &str, text: &str) -> Rendering {
        let _ = node;
        with_title(Rendering::new(url, text), title)
    }

    fn reference_image(&self, node: &Node, url: &str, title: &str, alt: &str) -> Rendering {
        let _ = node;
        with_title(Rendering::new(url, alt), title)
    }

    /// `[[page|text]]` with an optional `#fragment` in the page part.
    fn wiki_link(&self, node: &Node, text: &str) -> Rendering {
        let _ = node;
        let (page, label) = match text.split_once('|') {
            Some((page, label)) => (page, label),
            None => (text, text),
        };
        let (page, fragment) = match page.rfind('#') {
            Some(pos) => (&page[..pos], &page[pos..]),
            None => (page, ""),
        };
        let encoded = utf8_percent_encode(&page.replace(' ', "-"), PAGE_ENCODE).to_string();
        Rendering::new(format!("./{encoded}.html{fragment}"), label)
    }
}

fn with_title(rendering: Rendering, title: &str) -> Rendering {
    if title.is_empty() {
        rendering
    } else {
        rendering.with_attribute("title", &encode_html(title))
    }
}

/// The stock renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultLinkRenderer;

impl LinkRenderer for DefaultLinkRenderer {}

/// Entity-scramble an email address: by character position, a decimal
/// entity, a hex entity, or the literal character.
pub(crate) fn obfuscate(address: &str) -> String {
    let mut out = String::with_capacity(address.len() * 4);
    for (i, c) in address.chars().enumerate() {
        match i % 3 {
            0 => out.push_str(&format!("&#{};", c as u32)),
            1 => out.push_str(&format!("&#x{:x};", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn dummy_node() -> Node {
        Node::new(
            NodeKind::WikiLink {
                text: String::new(),
            },
            0,
            0,
        )
    }

    #[test]
    fn obfuscation_is_deterministic() {
        assert_eq!(obfuscate("ab"), "&#97;&#x62;");
        assert_eq!(obfuscate("abc"), "&#97;&#x62;c");
    }

    #[test]
    fn wiki_link_encodes_page_and_keeps_fragment() {
        let rendering = DefaultLinkRenderer.wiki_link(&dummy_node(), "My Page#sec|see here");
        assert_eq!(rendering.href, "./My-Page.html#sec");
        assert_eq!(rendering.text, "see here");
    }

    #[test]
    fn wiki_link_without_pipe_uses_page_as_text() {
        let rendering = DefaultLinkRenderer.wiki_link(&dummy_node(), "Home");
        assert_eq!(rendering.href, "./Home.html");
        assert_eq!(rendering.text, "Home");
    }

    #[test]
    fn titles_are_html_encoded() {
        let rendering =
            DefaultLinkRenderer.explicit_link(&dummy_node(), "/u", "a \"b\"", "text");
        assert_eq!(rendering.attributes.len(), 1);
        assert_eq!(rendering.attributes[0].value, "a &quot;b&quot;");
    }

    #[test]
    fn repeated_attribute_values_merge() {
        let rendering = Rendering::new("x", "y")
            .with_attribute("class", "a")
            .with_attribute("class", "b");
        assert_eq!(rendering.attributes.len(), 1);
        assert_eq!(rendering.attributes[0].value, "a b");
    }

    #[test]
    fn anchor_rendering_has_no_href() {
        let rendering = DefaultLinkRenderer.anchor_link(&dummy_node(), "h1", "H1");
        assert!(rendering.href.is_empty());
        assert_eq!(rendering.attributes[0].name, "name");
    }
}
