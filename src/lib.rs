//! A Markdown document processor: parses extended Markdown into a typed
//! document tree and serializes that tree to HTML.
//!
//! The pipeline is `source → parser → AST + side tables → serializer →
//! HTML`. Standard Markdown is always on; everything else is behind the
//! [`Extensions`] bitset. Link output goes through a pluggable
//! [`LinkRenderer`], code blocks through pluggable [`VerbatimSerializer`]s,
//! and a wall-clock deadline keeps pathological inputs from monopolizing a
//! thread.
//!
//! ```
//! use pressdown::{markdown_to_html, Extensions};
//!
//! let html = markdown_to_html("# Title\n\nSome *text*.\n", Extensions::empty()).unwrap();
//! assert_eq!(html, "<h1>Title</h1>\n<p>Some <em>text</em>.</p>");
//! ```

pub mod ast;
pub mod error;
pub mod extensions;
pub mod html;
pub mod links;
mod parser;
pub mod plugins;
pub mod processor;
pub mod verbatim;

pub use ast::{
    anchor_name, plain_anchor_name, Alignment, Node, NodeKind, QuoteKind, ReferenceKey, TocHeading,
};
pub use error::{Error, Result};
pub use extensions::Extensions;
pub use html::printer::{encode_html, Printer};
pub use html::{DefaultHeaderIdComputer, HeaderIdComputer, HtmlSerializer};
pub use links::{Attribute, DefaultLinkRenderer, LinkRenderer, Rendering};
pub use plugins::{BlockPlugin, InlinePlugin, PluginCursor, Plugins, SerializerPlugin};
pub use processor::{Processor, DEFAULT_MAX_PARSING_TIME};
pub use verbatim::{
    DefaultVerbatimSerializer, VerbatimSerializer, VerbatimSerializerMap, DEFAULT_VERBATIM_KEY,
};

/// One-shot convenience: build a [`Processor`] with the given extensions
/// and render `source`.
pub fn markdown_to_html(source: &str, extensions: Extensions) -> Result<String> {
    Processor::new(extensions).markdown_to_html(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_paragraph() {
        let html = markdown_to_html("hello world\n", Extensions::empty()).unwrap();
        assert_eq!(html, "<p>hello world</p>");
    }

    #[test]
    fn empty_input_renders_nothing() {
        let html = markdown_to_html("", Extensions::empty()).unwrap();
        assert_eq!(html, "");
    }

    #[test]
    fn input_without_trailing_newline_still_forms_a_paragraph() {
        let html = markdown_to_html("no newline", Extensions::empty()).unwrap();
        assert_eq!(html, "<p>no newline</p>");
    }
}
