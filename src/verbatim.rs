//! Verbatim (code block) serialization strategy.

use std::collections::HashMap;

use crate::html::attributes::Attributes;
use crate::html::printer::Printer;

/// The map key the default serializer registers under.
pub const DEFAULT_VERBATIM_KEY: &str = "";

/// Emits one fenced/indented code block. Registered per language tag.
pub trait VerbatimSerializer {
    fn serialize(&self, text: &str, language: Option<&str>, printer: &mut Printer);
}

/// `<pre><code[ class="lang"]>…</code></pre>`, with leading newlines turned
/// into `<br/>` and the rest entity-encoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerbatimSerializer;

impl VerbatimSerializer for DefaultVerbatimSerializer {
    fn serialize(&self, text: &str, language: Option<&str>, printer: &mut Printer) {
        let mut attributes = Attributes::new();
        if let Some(language) = language.filter(|l| !l.is_empty()) {
            attributes.add_class(language);
        }
        printer.println().print("<pre><code");
        attributes.print(printer);
        printer.print_char('>');
        let mut rest = text;
        while let Some(stripped) = rest.strip_prefix('\n') {
            printer.print("<br/>");
            rest = stripped;
        }
        printer.print_encoded(rest);
        printer.print("</code></pre>");
    }
}

/// Language tag → serializer, with a default under [`DEFAULT_VERBATIM_KEY`].
pub struct VerbatimSerializerMap {
    serializers: HashMap<String, Box<dyn VerbatimSerializer>>,
}

impl Default for VerbatimSerializerMap {
    fn default() -> Self {
        let mut map = VerbatimSerializerMap {
            serializers: HashMap::new(),
        };
        map.register(DEFAULT_VERBATIM_KEY, Box::new(DefaultVerbatimSerializer));
        map
    }
}

impl VerbatimSerializerMap {
    pub fn new() -> Self {
        VerbatimSerializerMap::default()
    }

    pub fn register(&mut self, language: &str, serializer: Box<dyn VerbatimSerializer>) {
        self.serializers.insert(language.to_string(), serializer);
    }

    /// The serializer for a language tag, falling back to the default.
    pub fn lookup(&self, language: Option<&str>) -> &dyn VerbatimSerializer {
        language
            .and_then(|l| self.serializers.get(l))
            .or_else(|| self.serializers.get(DEFAULT_VERBATIM_KEY))
            .map(Box::as_ref)
            .unwrap_or(&DefaultVerbatimSerializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_default(text: &str, language: Option<&str>) -> String {
        let mut printer = Printer::new();
        DefaultVerbatimSerializer.serialize(text, language, &mut printer);
        printer.take()
    }

    #[test]
    fn emits_language_class() {
        assert_eq!(
            render_default("let x;\n", Some("rust")),
            "<pre><code class=\"rust\">let x;\n</code></pre>"
        );
    }

    #[test]
    fn leading_newlines_become_breaks() {
        assert_eq!(
            render_default("\n\ncode\n", None),
            "<pre><code><br/><br/>code\n</code></pre>"
        );
    }

    #[test]
    fn body_is_encoded() {
        assert_eq!(
            render_default("a < b\n", None),
            "<pre><code>a &lt; b\n</code></pre>"
        );
    }

    #[test]
    fn map_falls_back_to_default() {
        let map = VerbatimSerializerMap::new();
        let mut printer = Printer::new();
        map.lookup(Some("nope")).serialize("x\n", None, &mut printer);
        assert_eq!(printer.take(), "<pre><code>x\n</code></pre>");
    }
}
