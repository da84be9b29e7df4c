use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The extension switches understood by the parser and serializer.
    ///
    /// Each flag is an independent bit; composites like [`Extensions::SMARTYPANTS`]
    /// are plain unions. A default-constructed value enables nothing beyond
    /// standard Markdown.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Extensions: u32 {
        /// Beautify ellipses, dashes and apostrophes.
        const SMARTS = 1 << 0;
        /// Beautify single, double and double-angle quotes.
        const QUOTES = 1 << 1;
        /// Abbreviation definitions (`*[HTML]: Hyper Text Markup Language`).
        const ABBREVIATIONS = 1 << 2;
        /// Treat single newlines inside paragraphs as hard line breaks.
        const HARDWRAPS = 1 << 3;
        /// Recognize plain `http://…` and `user@host` without angle brackets.
        const AUTOLINKS = 1 << 4;
        /// Pipe-and-divider tables.
        const TABLES = 1 << 5;
        /// Definition lists with `:`/`~` bullets.
        const DEFINITIONS = 1 << 6;
        /// Backtick or tilde fenced code blocks.
        const FENCED_CODE_BLOCKS = 1 << 7;
        /// Recognize HTML blocks but emit them as empty text.
        const SUPPRESS_HTML_BLOCKS = 1 << 8;
        /// Recognize inline HTML but emit it as empty text.
        const SUPPRESS_INLINE_HTML = 1 << 9;
        /// `[[page]]` and `[[page|text]]` wiki links.
        const WIKILINKS = 1 << 10;
        /// `~~struck~~` strikethrough.
        const STRIKETHROUGH = 1 << 11;
        /// Wrap a heading's lone text child in a named anchor.
        const ANCHOR_LINKS = 1 << 12;
        /// Require a space between the `#` run and an ATX heading title.
        const ATX_HEADER_SPACE = 1 << 13;
        /// Wrap the first child of every list item in a paragraph.
        const FORCE_LIST_ITEM_PARA = 1 << 14;
        /// Allow horizontal rules without a trailing blank line.
        const RELAXED_HRULES = 1 << 15;
        /// GFM task list items (`- [ ] open`, `- [x] done`).
        const TASK_LIST_ITEMS = 1 << 16;
        /// Prepend an anchor built from the full collected heading text.
        const EXT_ANCHOR_LINKS = 1 << 17;
        /// With [`Extensions::EXT_ANCHOR_LINKS`], wrap the heading text in the anchor
        /// instead of prepending an empty one.
        const EXT_ANCHOR_LINKS_WRAP = 1 << 18;
        /// `[TOC]` marker rendering a table of contents.
        const TOC = 1 << 19;
        /// Mark `[text][]` with a dummy reference key so it is distinguishable
        /// from `[text]` in the AST.
        const DUMMY_REFERENCE_KEY = 1 << 20;
        /// Allow image URLs to span multiple source lines.
        const MULTI_LINE_IMAGE_URLS = 1 << 21;
        /// Let `*` emphasis open after any non-alphanumeric character and close
        /// against letters.
        const RELAXED_STRONG_EMPHASIS_RULES = 1 << 22;
        /// Footnote definitions and references (`[^label]`).
        const FOOTNOTES = 1 << 23;
        /// Accept the IntelliJ completion dummy identifier (`U+001F`) in labels
        /// and allow empty labels.
        const INTELLIJ_DUMMY_IDENTIFIER = 1 << 24;

        /// Convenience alias: smart punctuation plus smart quotes.
        const SMARTYPANTS = Self::SMARTS.bits() | Self::QUOTES.bits();
        /// Every feature extension; the suppression switches and editor hooks
        /// stay opt-in.
        const ALL = Self::SMARTS.bits()
            | Self::QUOTES.bits()
            | Self::ABBREVIATIONS.bits()
            | Self::HARDWRAPS.bits()
            | Self::AUTOLINKS.bits()
            | Self::TABLES.bits()
            | Self::DEFINITIONS.bits()
            | Self::FENCED_CODE_BLOCKS.bits()
            | Self::WIKILINKS.bits()
            | Self::STRIKETHROUGH.bits()
            | Self::ANCHOR_LINKS.bits()
            | Self::ATX_HEADER_SPACE.bits()
            | Self::RELAXED_HRULES.bits()
            | Self::TASK_LIST_ITEMS.bits()
            | Self::TOC.bits()
            | Self::FOOTNOTES.bits();
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Extensions::empty()
    }
}

impl Extensions {
    /// The inline special characters active under this extension set.
    ///
    /// Text runs stop at these characters so the corresponding inline rules
    /// get a chance to match; anything unclaimed falls through to
    /// `SpecialText`.
    pub(crate) fn special_chars(&self) -> String {
        let mut chars = String::from("*_`&[]<>!#\\");
        self.push_conditional_chars(&mut chars);
        chars
    }

    /// The characters a backslash may escape under this extension set.
    pub(crate) fn escapable_chars(&self) -> String {
        let mut chars = String::from("\\`*_{}[]()#+-.!&<>");
        self.push_conditional_chars(&mut chars);
        chars
    }

    fn push_conditional_chars(&self, chars: &mut String) {
        if self.contains(Extensions::QUOTES) {
            chars.push_str("'\"");
        }
        if self.contains(Extensions::SMARTS) {
            chars.push_str(".-");
        }
        if self.contains(Extensions::AUTOLINKS) {
            chars.push_str("(){}");
        }
        if self.contains(Extensions::DEFINITIONS) {
            chars.push(':');
        }
        if self.contains(Extensions::FOOTNOTES) {
            chars.push('^');
        }
        if self.contains(Extensions::TABLES) {
            chars.push('|');
        }
        if self.intersects(
            Extensions::DEFINITIONS | Extensions::FENCED_CODE_BLOCKS | Extensions::STRIKETHROUGH,
        ) {
            chars.push('~');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smartypants_is_smarts_plus_quotes() {
        assert_eq!(
            Extensions::SMARTYPANTS,
            Extensions::SMARTS | Extensions::QUOTES
        );
    }

    #[test]
    fn special_chars_grow_with_extensions() {
        let base = Extensions::empty().special_chars();
        assert!(!base.contains('|'));
        assert!(!base.contains('~'));

        assert!(Extensions::TABLES.special_chars().contains('|'));
        assert!(Extensions::STRIKETHROUGH.special_chars().contains('~'));
        assert!(Extensions::FOOTNOTES.special_chars().contains('^'));
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(Extensions::default(), Extensions::empty());
    }
}
