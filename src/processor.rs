//! The processor façade: extension flags, parsing deadline, plugins, and
//! the `parse` / `markdown_to_html` entry points.

use std::time::Duration;

use tracing::debug;

use crate::ast::Node;
use crate::error::Result;
use crate::extensions::Extensions;
use crate::html::{DefaultHeaderIdComputer, HeaderIdComputer, HtmlSerializer};
use crate::links::{DefaultLinkRenderer, LinkRenderer};
use crate::parser;
use crate::plugins::Plugins;
use crate::verbatim::VerbatimSerializerMap;

/// The default parsing deadline.
pub const DEFAULT_MAX_PARSING_TIME: Duration = Duration::from_millis(2000);

/// A reusable Markdown processor.
///
/// One instance is not safe for concurrent use; callers serialize access or
/// create one per thread. Sequential reuse is fine — every parse starts
/// from a clean slate.
///
/// ```
/// use pressdown::{Extensions, Processor};
///
/// let mut processor = Processor::new(Extensions::empty());
/// let html = processor.markdown_to_html("*hello*\n").unwrap();
/// assert_eq!(html, "<p><em>hello</em></p>");
/// ```
pub struct Processor {
    extensions: Extensions,
    max_parsing_time: Duration,
    plugins: Plugins,
}

impl Processor {
    pub fn new(extensions: Extensions) -> Self {
        Processor {
            extensions,
            max_parsing_time: DEFAULT_MAX_PARSING_TIME,
            plugins: Plugins::default(),
        }
    }

    /// Override the parsing deadline. Pathological inputs abort with
    /// [`crate::Error::Timeout`] once the budget is spent.
    pub fn with_max_parsing_time(mut self, max_parsing_time: Duration) -> Self {
        self.max_parsing_time = max_parsing_time;
        self
    }

    pub fn with_plugins(mut self, plugins: Plugins) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    /// Parse into the document tree (the Root node carrying the reference,
    /// abbreviation and footnote tables).
    pub fn parse(&mut self, source: &str) -> Result<Node> {
        parser::parse_document(
            source,
            self.extensions,
            self.max_parsing_time,
            &self.plugins,
        )
    }

    /// Parse and serialize with the default link renderer and verbatim
    /// serializer.
    pub fn markdown_to_html(&mut self, source: &str) -> Result<String> {
        self.markdown_to_html_with(
            source,
            &DefaultLinkRenderer,
            &VerbatimSerializerMap::default(),
        )
    }

    /// Parse and serialize with custom strategies.
    pub fn markdown_to_html_with(
        &mut self,
        source: &str,
        link_renderer: &dyn LinkRenderer,
        verbatim_serializers: &VerbatimSerializerMap,
    ) -> Result<String> {
        self.markdown_to_html_full(
            source,
            link_renderer,
            verbatim_serializers,
            &DefaultHeaderIdComputer,
        )
    }

    /// Full-control serialization, including the heading id hook.
    pub fn markdown_to_html_full(
        &mut self,
        source: &str,
        link_renderer: &dyn LinkRenderer,
        verbatim_serializers: &VerbatimSerializerMap,
        header_id_computer: &dyn HeaderIdComputer,
    ) -> Result<String> {
        let root = self.parse(source)?;
        let mut serializer = HtmlSerializer::new(
            link_renderer,
            verbatim_serializers,
            &self.plugins,
            header_id_computer,
        );
        let html = serializer.to_html(&root);
        debug!(input = source.len(), output = html.len(), "rendered markdown");
        Ok(html)
    }
}

impl Default for Processor {
    fn default() -> Self {
        Processor::new(Extensions::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn processor_is_reusable() {
        let mut processor = Processor::new(Extensions::empty());
        let first = processor.markdown_to_html("one\n").unwrap();
        let second = processor.markdown_to_html("two\n").unwrap();
        assert_eq!(first, "<p>one</p>");
        assert_eq!(second, "<p>two</p>");
    }

    #[test]
    fn zero_budget_times_out() {
        let mut processor =
            Processor::new(Extensions::empty()).with_max_parsing_time(Duration::from_millis(0));
        match processor.markdown_to_html("some *text* here\n") {
            Err(Error::Timeout(_)) => {}
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn parse_twice_is_deterministic() {
        let mut processor = Processor::new(Extensions::ALL);
        let source = "# T\n\n- a\n- b\n\n> quoted *em*\n";
        let first = processor.parse(source).unwrap();
        let second = processor.parse(source).unwrap();
        assert_eq!(first, second);
    }
}
