//! Block altitude: paragraphs, quotes, code blocks, headings, rules,
//! lists, definition lists, HTML blocks and the definition-style blocks
//! (references, abbreviations, footnotes, `[TOC]`).
//!
//! Ordered choice: [`ParseRun::block`] tries alternatives in grammar order
//! and the first match wins.

use crate::ast::{anchor_name, plain_anchor_name, Node, NodeKind};
use crate::extensions::Extensions;
use crate::parser::{is_space_char, ParseRun};
use crate::plugins::PluginCursor;

/// Known HTML tag names eligible to open an HTML block.
const HTML_TAGS: &[&str] = &[
    "html", "base", "head", "link", "meta", "style", "title", "address", "article", "aside",
    "body", "footer", "header", "h1", "h2", "h3", "h4", "h5", "h6", "hgroup", "nav", "section",
    "dd", "div", "dl", "dt", "figcaption", "figure", "hr", "li", "main", "ol", "p", "pre", "ul",
    "a", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd", "mark", "q",
    "rp", "rt", "rtc", "ruby", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u",
    "var", "wbr", "area", "audio", "img", "map", "track", "video", "embed", "iframe", "object",
    "param", "source", "canvas", "noscript", "script", "del", "ins", "caption", "col", "colgroup",
    "table", "tbody", "td", "tfoot", "th", "thead", "tr", "button", "datalist", "fieldset",
    "form", "input", "keygen", "label", "legend", "meter", "optgroup", "option", "output",
    "progress", "select", "textarea", "details", "dialog", "menu", "menuitem", "summary",
    "content", "decorator", "element", "shadow", "template", "acronym", "applet", "basefont",
    "big", "blink", "center", "dir", "frame", "frameset", "isindex", "listing", "noembed",
    "plaintext", "spacer", "strike", "tt", "xmp",
];

/// Which marker opens a list item; definitions reuse the item machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListMarker {
    Bullet,
    Enumerator,
    Definition,
}

impl<'a> ParseRun<'a> {
    /// `Block = BlankLine* (Plugin / BlockQuote / Verbatim / Footnote? /
    /// Abbreviation? / Reference / HorizontalRule / Heading / OrderedList /
    /// BulletList / HtmlBlock / Table? / DefinitionList? / FencedCode? /
    /// Toc? / Para / Inlines)`
    pub(crate) fn block(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        while self.cur.eat_blank_line() {}

        let plugins = self.plugins;
        for plugin in plugins.block_plugins() {
            let p = self.cur.pos();
            if let Some(node) = plugin.try_block(&mut PluginCursor::new(self)) {
                return Some(node);
            }
            self.cur.reset(p);
        }
        if let Some(node) = self.block_quote() {
            return Some(node);
        }
        if let Some(node) = self.verbatim() {
            return Some(node);
        }
        if self.ext(Extensions::FOOTNOTES) {
            if let Some(node) = self.footnote_def() {
                return Some(node);
            }
        }
        if self.ext(Extensions::ABBREVIATIONS) {
            if let Some(node) = self.abbreviation() {
                return Some(node);
            }
        }
        if let Some(node) = self.reference() {
            return Some(node);
        }
        if let Some(node) = self.horizontal_rule() {
            return Some(node);
        }
        if let Some(node) = self.heading() {
            return Some(node);
        }
        if let Some(node) = self.ordered_list() {
            return Some(node);
        }
        if let Some(node) = self.bullet_list() {
            return Some(node);
        }
        if let Some(node) = self.html_block() {
            return Some(node);
        }
        if self.ext(Extensions::TABLES) {
            if let Some(node) = self.table() {
                return Some(node);
            }
        }
        if self.ext(Extensions::DEFINITIONS) {
            if let Some(node) = self.definition_list() {
                return Some(node);
            }
        }
        if self.ext(Extensions::FENCED_CODE_BLOCKS) {
            if let Some(node) = self.fenced_code_block() {
                return Some(node);
            }
        }
        if self.ext(Extensions::TOC) {
            if let Some(node) = self.toc_marker() {
                return Some(node);
            }
        }
        if let Some(node) = self.para() {
            return Some(node);
        }
        if let Some(node) = self.inlines() {
            return Some(node);
        }
        self.cur.reset(mark);
        None
    }

    /// A paragraph matches only when a blank line (or input end) follows;
    /// the blank line is left for the next block to see.
    fn para(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let Some(inlines) = self.inlines() else {
            self.cur.reset(mark);
            return None;
        };
        // EOI is not a blank line: a tight list item's sub-parse must end
        // in a bare inline run, not a paragraph
        if !self.cur.at_blank_line() {
            self.cur.reset(mark);
            return None;
        }
        let (start, end) = (inlines.start, inlines.end);
        let children = match inlines.kind {
            NodeKind::Container { children } => children,
            _ => vec![inlines],
        };
        Some(Node::new(NodeKind::Para { children }, start, end))
    }

    //************* BLOCK QUOTE ****************

    /// Strip `>` markers line by line and re-parse the stripped text.
    /// Trailing blank lines join the quote only when another `>` line
    /// follows them.
    fn block_quote(&mut self) -> Option<Node> {
        if self.cur.peek() != Some('>') {
            return None;
        }
        let origin = self.cur.pos();
        let mut raw: Vec<char> = Vec::new();
        loop {
            if self.cur.peek() != Some('>') {
                break;
            }
            let marker_start = self.cur.pos();
            let raw_len_before = raw.len();
            self.cur.bump();
            self.cur.eat(' ');
            Self::cross_out(&mut raw, marker_start, self.cur.pos());
            if !self.take_line_into(&mut raw) {
                raw.truncate(raw_len_before);
                self.cur.reset(marker_start);
                break;
            }
            // lazy continuation lines
            loop {
                if self.cur.peek() == Some('>') || self.cur.at_blank_line() {
                    break;
                }
                if !self.take_line_into(&mut raw) {
                    break;
                }
            }
            // blank lines belong to the quote only if more `>` follows
            let save = self.cur.pos();
            let blank_start = self.cur.pos();
            let mut any_blank = false;
            while self.cur.eat_blank_line() {
                any_blank = true;
            }
            if any_blank && self.cur.peek() == Some('>') {
                raw.extend_from_slice(self.cur.slice_chars(blank_start, self.cur.pos()));
            } else {
                self.cur.reset(save);
            }
        }
        if raw.is_empty() {
            return None;
        }
        // guarantee a terminating paragraph break for the inner parse
        raw.push('\n');
        raw.push('\n');
        let children = self.sub_parse(&raw, origin);
        Some(Node::new(
            NodeKind::BlockQuote { children },
            origin,
            self.cur.pos(),
        ))
    }

    //************* VERBATIM ****************

    /// Indented code: 4-space/tab indented lines, blank lines preserved
    /// between chunks, tabs expanded to the next multiple of four.
    fn verbatim(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let mut text = String::new();
        let mut chunks = 0;
        loop {
            let iter_mark = self.cur.pos();
            let mut pending = String::new();
            while self.cur.eat_blank_line() {
                pending.push('\n');
            }
            if self.cur.eat_indent().is_none() {
                self.cur.reset(iter_mark);
                break;
            }
            let content_mark = self.cur.pos();
            let mut line = String::new();
            loop {
                match self.cur.peek() {
                    Some('\t') => {
                        let col = self.cur.pos() - content_mark;
                        line.push_str(&" ".repeat(4 - col % 4));
                        self.cur.bump();
                    }
                    Some(c) if c != '\n' && c != '\r' => {
                        line.push(c);
                        self.cur.bump();
                    }
                    _ => break,
                }
            }
            if line.is_empty() || !self.cur.eat_newline() {
                self.cur.reset(iter_mark);
                break;
            }
            text.push_str(&pending);
            text.push_str(&line);
            text.push('\n');
            chunks += 1;
        }
        if chunks == 0 {
            return None;
        }
        Some(Node::new(
            NodeKind::Verbatim {
                text,
                language: None,
            },
            start,
            self.cur.pos(),
        ))
    }

    /// Fenced code: open with three or more backticks or tildes; close on a
    /// fence of the same character with equal or greater length.
    pub(crate) fn fenced_code_block(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let (fence_char, fence_len, language) = self.code_fence_open()?;
        let mut text = String::new();
        let mut lines = 0;
        loop {
            if self.code_fence_close_follows(fence_char, fence_len) {
                break;
            }
            match self.cur.eat_line() {
                Some((s, e)) => {
                    text.push_str(&self.cur.slice(s, e));
                    lines += 1;
                }
                None => {
                    self.cur.reset(start);
                    return None;
                }
            }
        }
        if lines == 0 || !self.code_fence_close(fence_char, fence_len) {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Verbatim { text, language },
            start,
            self.cur.pos(),
        ))
    }

    fn code_fence_open(&mut self) -> Option<(char, usize, Option<String>)> {
        let mark = self.cur.pos();
        let fence_char = match self.cur.peek() {
            Some(c @ ('`' | '~')) => c,
            _ => return None,
        };
        let fence_len = self.cur.eat_n_or_more(fence_char, 3)?;
        self.cur.eat_sp();
        let info_start = self.cur.pos();
        while self
            .cur
            .peek()
            .is_some_and(|c| c != '\n' && c != '\r' && c != '`' && c != '~')
        {
            self.cur.bump();
        }
        let info = self.cur.slice(info_start, self.cur.pos());
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return None;
        }
        let info = info.trim();
        let language = if info.is_empty() {
            None
        } else {
            Some(info.to_string())
        };
        Some((fence_char, fence_len, language))
    }

    fn code_fence_close(&mut self, fence_char: char, fence_len: usize) -> bool {
        let mark = self.cur.pos();
        if self.cur.eat_n_or_more(fence_char, fence_len).is_none() {
            return false;
        }
        self.cur.eat_sp();
        if self.cur.eat_newline() {
            true
        } else {
            self.cur.reset(mark);
            false
        }
    }

    fn code_fence_close_follows(&mut self, fence_char: char, fence_len: usize) -> bool {
        let mark = self.cur.pos();
        let found = self.code_fence_close(fence_char, fence_len);
        self.cur.reset(mark);
        found
    }

    //************* HORIZONTAL RULE ****************

    fn horizontal_rule(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let start = self.cur.pos();
        if !self.hrule_chars('*') && !self.hrule_chars('-') && !self.hrule_chars('_') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return None;
        }
        if !self.ext(Extensions::RELAXED_HRULES) && !self.cur.at_blank_line() {
            self.cur.reset(mark);
            return None;
        }
        Some(Node::new(NodeKind::HorizontalRule, start, self.cur.pos()))
    }

    /// `c Sp c Sp c (Sp c)*`
    fn hrule_chars(&mut self, c: char) -> bool {
        let mark = self.cur.pos();
        for _ in 0..3 {
            if !self.cur.eat(c) {
                self.cur.reset(mark);
                return false;
            }
            self.cur.eat_sp();
        }
        loop {
            let s = self.cur.pos();
            self.cur.eat_sp();
            if !self.cur.eat(c) {
                self.cur.reset(s);
                break;
            }
        }
        true
    }

    fn horizontal_rule_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.horizontal_rule().is_some();
        self.cur.reset(mark);
        found
    }

    //************* HEADINGS ****************

    fn heading(&mut self) -> Option<Node> {
        self.atx_heading().or_else(|| self.setext_heading())
    }

    fn atx_heading(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let hashes = self.cur.run_len('#');
        if hashes == 0 {
            return None;
        }
        let level = hashes.min(6);
        self.cur.bump_n(level);
        if self.ext(Extensions::ATX_HEADER_SPACE) {
            if !self.cur.peek().is_some_and(is_space_char) {
                self.cur.reset(start);
                return None;
            }
            self.cur.bump();
        }
        self.cur.eat_sp();
        let mut children = Vec::new();
        loop {
            if self.cur.at_newline() || self.atx_ending_follows() {
                break;
            }
            match self.inline(&children, None) {
                Some(node) => crate::ast::push_coalescing(&mut children, node),
                None => break,
            }
        }
        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        self.wrap_in_anchor(&mut children);
        // discard an optional trailing hash run
        self.cur.eat_sp();
        while self.cur.eat('#') {}
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Heading {
                level: level as u8,
                is_toc: self.ext(Extensions::TOC),
                is_setext: false,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    /// Trailing `#` run before the newline ends the title.
    fn atx_ending_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_sp();
        while self.cur.eat('#') {}
        self.cur.eat_sp();
        let found = self.cur.at_newline();
        self.cur.reset(mark);
        found
    }

    /// Setext headings commit only after the cheap two-line look-ahead.
    fn setext_heading(&mut self) -> Option<Node> {
        if !self.setext_gate() {
            return None;
        }
        self.setext_with('=', 1).or_else(|| self.setext_with('-', 2))
    }

    fn setext_gate(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = (|| {
            if self.cur.at_newline() {
                return false;
            }
            if self.cur.eat_line().is_none() {
                return false;
            }
            let c = match self.cur.peek() {
                Some(c @ ('=' | '-')) => c,
                _ => return false,
            };
            if self.cur.eat_n_or_more(c, 3).is_none() {
                return false;
            }
            self.cur.eat_sp();
            self.cur.eat_newline()
        })();
        self.cur.reset(mark);
        found
    }

    fn setext_with(&mut self, underline: char, level: u8) -> Option<Node> {
        let start = self.cur.pos();
        let mut children = Vec::new();
        loop {
            if self.endline_follows() {
                break;
            }
            match self.inline(&children, None) {
                Some(node) => crate::ast::push_coalescing(&mut children, node),
                None => break,
            }
        }
        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        self.wrap_in_anchor(&mut children);
        self.cur.eat_sp();
        let ok = self.cur.eat_newline()
            && self.cur.eat_n_or_more(underline, 3).is_some()
            && {
                self.cur.eat_sp();
                self.cur.eat_newline()
            };
        if !ok {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Heading {
                level,
                is_toc: self.ext(Extensions::TOC),
                is_setext: true,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    fn endline_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.endline().is_some();
        self.cur.reset(mark);
        found
    }

    /// Anchor-link extensions rewrite the heading children at parse time.
    fn wrap_in_anchor(&mut self, children: &mut Vec<Node>) {
        if self.ext(Extensions::EXT_ANCHOR_LINKS) {
            if children.is_empty() {
                return;
            }
            let mut collected = AnchorText::default();
            collect_anchor_text(children, &mut collected);
            let text = collected.text.trim().to_string();
            if text.is_empty() {
                return;
            }
            let (anchor_start, anchor_end) =
                (collected.start.unwrap_or(0), collected.end.unwrap_or(0));
            let name = anchor_name(&text);
            if self.ext(Extensions::EXT_ANCHOR_LINKS_WRAP) {
                let anchor = Node::new(NodeKind::AnchorLink { name, text }, anchor_start, anchor_end);
                children.clear();
                children.push(anchor);
            } else {
                let anchor = Node::new(
                    NodeKind::AnchorLink {
                        name,
                        text: String::new(),
                    },
                    anchor_start,
                    anchor_end,
                );
                children.insert(0, anchor);
            }
        } else if self.ext(Extensions::ANCHOR_LINKS) && children.len() == 1 {
            if let NodeKind::Text { text } = &children[0].kind {
                let (start, end) = (children[0].start, children[0].end);
                // the plain extension derives names with the range rule,
                // not the extended sanitizer
                let name = plain_anchor_name(text);
                children[0] = Node::new(
                    NodeKind::AnchorLink {
                        name,
                        text: text.clone(),
                    },
                    start,
                    end,
                );
            }
        }
    }

    //************* DEFINITION BLOCKS ****************

    /// `[label]: url "title"` — recorded in the reference table and kept in
    /// the tree (it renders nothing).
    fn reference(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let start = self.cur.pos();
        let Some(label) = self.label() else {
            self.cur.reset(mark);
            return None;
        };
        if !self.cur.eat(':') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_spn1();
        let Some(url) = self.ref_src() else {
            self.cur.reset(mark);
            return None;
        };
        self.cur.eat_sp();
        let title = self.ref_title();
        self.cur.eat_sp();
        // the EOL stays outside the node's range
        let end = self.cur.pos();
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return None;
        }
        let node = Node::new(
            NodeKind::Reference {
                url,
                title,
                children: label.children().to_vec(),
            },
            start,
            end,
        );
        self.record_definition(&node);
        Some(node)
    }

    fn ref_src(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        if self.cur.eat('<') {
            if let Some(url) = self.ref_src_content() {
                if self.cur.eat('>') {
                    return Some(url);
                }
            }
            self.cur.reset(mark);
        }
        self.ref_src_content()
    }

    fn ref_src_content(&mut self) -> Option<String> {
        let start = self.cur.pos();
        while self
            .cur
            .peek()
            .is_some_and(|c| c != '>' && !is_space_char(c) && c != '\n' && c != '\r')
        {
            self.cur.bump();
        }
        if self.cur.pos() == start {
            return None;
        }
        Some(self.cur.slice(start, self.cur.pos()))
    }

    fn ref_title(&mut self) -> String {
        for (open, close) in [('\'', '\''), ('"', '"'), ('(', ')')] {
            if let Some(title) = self.ref_title_with(open, close) {
                return title;
            }
        }
        String::new()
    }

    /// Title closes only when its delimiter sits at end of line.
    fn ref_title_with(&mut self, open: char, close: char) -> Option<String> {
        let mark = self.cur.pos();
        if !self.cur.eat(open) {
            return None;
        }
        let content_start = self.cur.pos();
        loop {
            if self.close_at_eol_follows(close) {
                break;
            }
            match self.cur.peek() {
                Some(c) if c != '\n' && c != '\r' => {
                    self.cur.bump();
                }
                _ => {
                    self.cur.reset(mark);
                    return None;
                }
            }
        }
        let title = self.cur.slice(content_start, self.cur.pos());
        self.cur.bump();
        Some(title)
    }

    fn close_at_eol_follows(&mut self, close: char) -> bool {
        let mark = self.cur.pos();
        let found = self.cur.eat(close) && {
            self.cur.eat_sp();
            self.cur.at_newline()
        };
        self.cur.reset(mark);
        found
    }

    /// `*[label]: expansion` (abbreviations extension).
    fn abbreviation(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let start = self.cur.pos();
        if !self.cur.eat('*') {
            self.cur.reset(mark);
            return None;
        }
        let Some(label) = self.label() else {
            self.cur.reset(mark);
            return None;
        };
        self.cur.eat_sp();
        if !self.cur.eat(':') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        let exp_start = self.cur.pos();
        let mut exp_children = Vec::new();
        loop {
            if self.cur.at_newline() {
                break;
            }
            match self.inline(&exp_children, None) {
                Some(node) => crate::ast::push_coalescing(&mut exp_children, node),
                None => break,
            }
        }
        let expansion = Node::container(exp_children, exp_start, self.cur.pos());
        let node = Node::new(
            NodeKind::Abbreviation {
                expansion: Box::new(expansion),
                children: label.children().to_vec(),
            },
            start,
            self.cur.pos(),
        );
        self.record_definition(&node);
        Some(node)
    }

    /// `[^label]: body` (footnotes extension). The body is a single inline
    /// sequence.
    fn footnote_def(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let start = self.cur.pos();
        let Some(label) = self.footnote_label() else {
            self.cur.reset(mark);
            return None;
        };
        self.cur.eat_sp();
        if !self.cur.eat(':') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        let body_start = self.cur.pos();
        let mut body_children = Vec::new();
        loop {
            if self.cur.at_newline() {
                break;
            }
            match self.inline(&body_children, None) {
                Some(node) => crate::ast::push_coalescing(&mut body_children, node),
                None => break,
            }
        }
        if body_children.is_empty() {
            self.cur.reset(mark);
            return None;
        }
        let body = Node::container(body_children, body_start, self.cur.pos());
        let node = Node::new(
            NodeKind::FootnoteDef {
                label,
                body: Box::new(body),
            },
            start,
            self.cur.pos(),
        );
        self.record_definition(&node);
        Some(node)
    }

    /// `[TOC]` / `[TOC level=N]`; the heading list is filled in after the
    /// whole tree is built.
    fn toc_marker(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let start = self.cur.pos();
        if !self.cur.eat_str("[TOC") {
            self.cur.reset(mark);
            return None;
        }
        let mut level = 6u8;
        {
            let m = self.cur.pos();
            self.cur.eat_sp();
            let mut matched = false;
            if self.cur.eat_str("level=") {
                if let Some(c) = self.cur.peek() {
                    if c.is_ascii_digit() {
                        self.cur.bump();
                        level = c as u8 - b'0';
                        matched = true;
                    }
                }
            }
            if !matched {
                self.cur.reset(m);
            }
        }
        if !self.cur.eat(']') {
            self.cur.reset(mark);
            return None;
        }
        Some(Node::new(
            NodeKind::Toc {
                level,
                headings: Vec::new(),
            },
            start,
            self.cur.pos(),
        ))
    }

    //************* DEFINITION LISTS ****************

    fn definition_list(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.cur.peek().is_some_and(is_space_char) {
            return None;
        }
        if !self.def_list_gate() {
            return None;
        }
        let mut children: Vec<Node> = Vec::new();
        loop {
            let group_mark = self.cur.pos();
            let mut group = Vec::new();
            while let Some(term) = self.def_list_term() {
                group.push(term);
            }
            if group.is_empty() {
                self.cur.reset(group_mark);
                break;
            }
            let mut definitions = 0;
            while let Some((definition, _)) = self.list_item(ListMarker::Definition) {
                group.push(definition);
                definitions += 1;
            }
            if definitions == 0 {
                self.cur.reset(group_mark);
                break;
            }
            children.extend(group);
            self.cur.eat_blank_line();
        }
        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::DefinitionList { children },
            start,
            self.cur.pos(),
        ))
    }

    /// Look-ahead: one or more term lines, optional blanks, then a
    /// definition bullet.
    fn def_list_gate(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = (|| {
            let mut lines = 0;
            loop {
                if self.cur.at_blank_line() || self.def_list_bullet_follows() {
                    break;
                }
                if self.cur.eat_line().is_none() {
                    break;
                }
                lines += 1;
            }
            if lines == 0 {
                return false;
            }
            while self.cur.eat_blank_line() {}
            self.def_list_bullet()
        })();
        self.cur.reset(mark);
        found
    }

    fn def_list_term(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.cur.peek().is_some_and(is_space_char) || self.def_list_bullet_follows() {
            return None;
        }
        let mut children = Vec::new();
        loop {
            if self.cur.at_newline() || self.term_colon_follows() {
                break;
            }
            match self.inline(&children, None) {
                Some(node) => crate::ast::push_coalescing(&mut children, node),
                None => break,
            }
        }
        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        self.cur.eat(':');
        if !self.cur.eat_newline() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::DefinitionTerm { children },
            start,
            self.cur.pos(),
        ))
    }

    fn term_colon_follows(&mut self) -> bool {
        self.cur.peek() == Some(':') && matches!(self.cur.peek_at(1), Some('\n') | Some('\r'))
    }

    /// `NonindentSpace (":" | "~") Spacechar+`
    pub(crate) fn def_list_bullet(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        if matches!(self.cur.peek(), Some(':') | Some('~')) {
            self.cur.bump();
            if self.cur.eat_sp() >= 1 {
                return true;
            }
        }
        self.cur.reset(mark);
        false
    }

    fn def_list_bullet_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.def_list_bullet();
        self.cur.reset(mark);
        found
    }

    //************* LISTS ****************

    fn bullet_list(&mut self) -> Option<Node> {
        self.list(ListMarker::Bullet)
    }

    fn ordered_list(&mut self) -> Option<Node> {
        self.list(ListMarker::Enumerator)
    }

    fn list(&mut self, marker: ListMarker) -> Option<Node> {
        let start = self.cur.pos();
        let (first, mut any_loose) = self.list_item(marker)?;
        let mut items = vec![first];
        loop {
            let m = self.cur.pos();
            // absorb all blank lines but the last before the next item,
            // so two blank lines do not split the list
            loop {
                let mut probe = self.cur;
                if !(probe.eat_blank_line() && probe.at_blank_line()) {
                    break;
                }
                self.cur.eat_blank_line();
            }
            match self.list_item(marker) {
                Some((item, loose)) => {
                    any_loose |= loose;
                    items.push(item);
                }
                None => {
                    self.cur.reset(m);
                    break;
                }
            }
        }
        // looseness is a per-list property: once any item is loose, every
        // item's first child becomes a paragraph
        if any_loose {
            for item in &mut items {
                wrap_first_child_in_para(item);
            }
        } else if self.ext(Extensions::FORCE_LIST_ITEM_PARA) {
            for item in &mut items {
                if item.children().len() > 1 {
                    wrap_first_child_in_para(item);
                }
            }
        }
        let kind = match marker {
            ListMarker::Bullet => NodeKind::BulletList { children: items },
            ListMarker::Enumerator => NodeKind::OrderedList { children: items },
            ListMarker::Definition => return None,
        };
        Some(Node::new(kind, start, self.cur.pos()))
    }

    /// The recursive item strategy: collect the item's source blocks with
    /// markers and indents crossed out, sub-parse them, splice the results.
    /// Returns the item node and whether the item was loose.
    pub(crate) fn list_item(&mut self, marker: ListMarker) -> Option<(Node, bool)> {
        let origin = self.cur.pos();
        let mut raw: Vec<char> = Vec::new();
        let mut loose = false;
        {
            let m = self.cur.pos();
            if self.cur.eat_blank_line() {
                Self::cross_out(&mut raw, m, self.cur.pos());
                loose = true;
            }
        }
        let marker_start = self.cur.pos();
        if !self.item_start(marker) {
            self.cur.reset(origin);
            return None;
        }
        Self::cross_out(&mut raw, marker_start, self.cur.pos());

        let mut task: Option<(bool, String)> = None;
        if marker == ListMarker::Bullet && self.ext(Extensions::TASK_LIST_ITEMS) {
            let tm = self.cur.pos();
            if self.cur.eat_str("[ ] ") {
                task = Some((false, self.cur.slice(tm, self.cur.pos())));
            } else if self.cur.eat_str("[x] ") || self.cur.eat_str("[X] ") {
                task = Some((true, self.cur.slice(tm, self.cur.pos())));
            }
            if task.is_some() {
                Self::cross_out(&mut raw, tm, self.cur.pos());
            }
        }

        if !self.take_line_into(&mut raw) {
            self.cur.reset(origin);
            return None;
        }
        // further lines of the first block: non-blank, not an item start,
        // optionally indented
        loop {
            let lm = self.cur.pos();
            let mut tmp: Vec<char> = Vec::new();
            {
                let im = self.cur.pos();
                if self.cur.eat_indent().is_some() {
                    Self::cross_out(&mut tmp, im, self.cur.pos());
                }
            }
            if !self.not_item_follows() || !self.take_line_into(&mut tmp) {
                self.cur.reset(lm);
                break;
            }
            raw.extend(tmp);
        }

        let mut children = if loose {
            raw.push('\n');
            self.sub_parse(&raw, origin)
        } else {
            self.sub_parse(&raw, origin)
        };

        // indented continuation blocks
        loop {
            let chunk_origin = self.cur.pos();
            let chunk_loose = self.cur.at_blank_line();
            let mut chunk_raw: Vec<char> = Vec::new();
            if !self.item_indented_blocks(&mut chunk_raw) {
                self.cur.reset(chunk_origin);
                break;
            }
            if chunk_loose {
                loose = true;
                chunk_raw.push('\n');
            }
            let mut chunk = self.sub_parse(&chunk_raw, chunk_origin);
            if chunk_loose {
                wrap_first_sub_item(&mut chunk);
            }
            children.extend(chunk);
        }

        let (start, end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (first.start, last.end),
            _ => (origin, self.cur.pos()),
        };
        let node = match (task, marker) {
            (Some((done, marker_text)), _) => Node::new(
                NodeKind::TaskListItem {
                    done,
                    marker: marker_text,
                    children,
                },
                start,
                end,
            ),
            (None, ListMarker::Definition) => {
                Node::new(NodeKind::Definition { children }, start, end)
            }
            (None, _) => Node::new(NodeKind::ListItem { children }, start, end),
        };
        Some((node, loose))
    }

    fn item_start(&mut self, marker: ListMarker) -> bool {
        match marker {
            ListMarker::Bullet => self.bullet(),
            ListMarker::Enumerator => self.enumerator(),
            ListMarker::Definition => self.def_list_bullet(),
        }
    }

    /// `Bullet = !HorizontalRule NonindentSpace [+*-] Spacechar+`
    fn bullet(&mut self) -> bool {
        if self.horizontal_rule_follows() {
            return false;
        }
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        if matches!(self.cur.peek(), Some('+') | Some('*') | Some('-')) {
            self.cur.bump();
            if self.cur.eat_sp() >= 1 {
                return true;
            }
        }
        self.cur.reset(mark);
        false
    }

    fn bullet_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.bullet();
        self.cur.reset(mark);
        found
    }

    /// `Enumerator = NonindentSpace Digit+ '.' Spacechar+`
    fn enumerator(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let mut digits = 0;
        while self.cur.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cur.bump();
            digits += 1;
        }
        if digits >= 1 && self.cur.eat('.') && self.cur.eat_sp() >= 1 {
            return true;
        }
        self.cur.reset(mark);
        false
    }

    fn enumerator_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.enumerator();
        self.cur.reset(mark);
        found
    }

    /// Continuation lines must not open another item or blank out.
    fn not_item_follows(&mut self) -> bool {
        if self.cur.at_blank_line() {
            return false;
        }
        if self.bullet_follows() || self.enumerator_follows() || self.horizontal_rule_follows() {
            return false;
        }
        if self.ext(Extensions::DEFINITIONS) && self.def_list_bullet_follows() {
            return false;
        }
        true
    }

    fn not_list_item_follows(&mut self) -> bool {
        if self.bullet_follows() || self.enumerator_follows() {
            return false;
        }
        if self.ext(Extensions::DEFINITIONS) && self.def_list_bullet_follows() {
            return false;
        }
        true
    }

    /// Indented blocks continuing a list item. Blank-line runs are crossed
    /// out except for a real `\n` per line so positions stay aligned.
    fn item_indented_blocks(&mut self, raw: &mut Vec<char>) -> bool {
        let mut any = false;
        loop {
            let iter_mark = self.cur.pos();
            let mut part: Vec<char> = Vec::new();
            loop {
                let bm = self.cur.pos();
                if !self.cur.eat_blank_line() {
                    break;
                }
                Self::cross_out(&mut part, bm, self.cur.pos() - 1);
                part.push('\n');
            }
            {
                let im = self.cur.pos();
                if self.cur.eat_indent().is_none() {
                    self.cur.reset(iter_mark);
                    break;
                }
                Self::cross_out(&mut part, im, self.cur.pos());
            }
            if !self.take_line_into(&mut part) {
                self.cur.reset(iter_mark);
                break;
            }
            loop {
                let lm = self.cur.pos();
                if self.cur.at_blank_line() || !self.not_list_item_follows() {
                    break;
                }
                let mut tmp: Vec<char> = Vec::new();
                {
                    let im = self.cur.pos();
                    if self.cur.eat_indent().is_some() {
                        Self::cross_out(&mut tmp, im, self.cur.pos());
                    }
                }
                if !self.take_line_into(&mut tmp) {
                    self.cur.reset(lm);
                    break;
                }
                part.extend(tmp);
            }
            raw.extend(part);
            any = true;
        }
        any
    }

    //************* HTML BLOCK ****************

    fn html_block(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let matched =
            self.html_block_in_tags() || self.html_comment() || self.html_block_self_closing();
        if !matched {
            return None;
        }
        let raw_end = self.cur.pos();
        if !self.cur.eat_blank_line() {
            self.cur.reset(start);
            return None;
        }
        let text = if self.ext(Extensions::SUPPRESS_HTML_BLOCKS) {
            String::new()
        } else {
            self.cur.slice(start, raw_end)
        };
        Some(Node::new(
            NodeKind::HtmlBlock { text },
            start,
            self.cur.pos(),
        ))
    }

    fn html_block_in_tags(&mut self) -> bool {
        let mark = self.cur.pos();
        let Some(tag) = self.probe_block_open_tag() else {
            return false;
        };
        if self.html_tag_block(&tag) {
            true
        } else {
            self.cur.reset(mark);
            false
        }
    }

    fn probe_block_open_tag(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        let tag = self.html_block_open(None);
        self.cur.reset(mark);
        tag
    }

    /// `< name attrs* >` where `name` is a known HTML tag; with `expected`
    /// set, only that tag matches.
    fn html_block_open(&mut self, expected: Option<&str>) -> Option<String> {
        let mark = self.cur.pos();
        let matched = (|| {
            if !self.cur.eat('<') {
                return None;
            }
            self.cur.eat_spn1();
            let name = self.html_tag_name()?;
            match expected {
                Some(expected) if name != expected => return None,
                None if !HTML_TAGS.contains(&name.as_str()) => return None,
                _ => {}
            }
            self.cur.eat_spn1();
            while self.html_attribute() {}
            if !self.cur.eat('>') {
                return None;
            }
            Some(name)
        })();
        if matched.is_none() {
            self.cur.reset(mark);
        }
        matched
    }

    fn html_tag_name(&mut self) -> Option<String> {
        let start = self.cur.pos();
        while self
            .cur
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            self.cur.bump();
        }
        if self.cur.pos() == start {
            return None;
        }
        Some(self.cur.slice(start, self.cur.pos()).to_lowercase())
    }

    /// Balanced same-tag block: nested occurrences recurse, everything
    /// else is raw until the matching close tag.
    fn html_tag_block(&mut self, tag: &str) -> bool {
        let mark = self.cur.pos();
        if self.html_block_open(Some(tag)).is_none() {
            return false;
        }
        loop {
            if self.html_tag_block(tag) {
                continue;
            }
            if self.html_block_close_follows(tag) {
                break;
            }
            if self.cur.bump().is_none() {
                self.cur.reset(mark);
                return false;
            }
        }
        self.html_block_close(tag)
    }

    fn html_block_close(&mut self, tag: &str) -> bool {
        let mark = self.cur.pos();
        let matched = (|| {
            if !self.cur.eat('<') {
                return false;
            }
            self.cur.eat_spn1();
            if !self.cur.eat('/') {
                return false;
            }
            match self.html_tag_name() {
                Some(name) if name == tag => {}
                _ => return false,
            }
            self.cur.eat_spn1();
            self.cur.eat('>')
        })();
        if !matched {
            self.cur.reset(mark);
        }
        matched
    }

    fn html_block_close_follows(&mut self, tag: &str) -> bool {
        let mark = self.cur.pos();
        let found = self.html_block_close(tag);
        self.cur.reset(mark);
        found
    }

    fn html_block_self_closing(&mut self) -> bool {
        let mark = self.cur.pos();
        let matched = (|| {
            if !self.cur.eat('<') {
                return false;
            }
            self.cur.eat_spn1();
            let Some(name) = self.html_tag_name() else {
                return false;
            };
            if !HTML_TAGS.contains(&name.as_str()) {
                return false;
            }
            self.cur.eat_spn1();
            while self.html_attribute() {}
            self.cur.eat('/');
            self.cur.eat_spn1();
            self.cur.eat('>')
        })();
        if !matched {
            self.cur.reset(mark);
        }
        matched
    }

    //************* SHARED ****************

    pub(crate) fn take_line_into(&mut self, raw: &mut Vec<char>) -> bool {
        match self.cur.eat_line() {
            Some((start, end)) => {
                raw.extend_from_slice(self.cur.slice_chars(start, end));
                true
            }
            None => false,
        }
    }
}

#[derive(Default)]
struct AnchorText {
    text: String,
    start: Option<usize>,
    end: Option<usize>,
}

fn collect_anchor_text(children: &[Node], out: &mut AnchorText) {
    for child in children {
        match &child.kind {
            NodeKind::Text { text } | NodeKind::SpecialText { text } => {
                out.text.push_str(text);
                if out.start.is_none() {
                    out.start = Some(child.start);
                }
                out.end = Some(child.end);
            }
            _ => collect_anchor_text(child.children(), out),
        }
    }
}

/// Make an item's leading tight block render as a paragraph.
pub(crate) fn wrap_first_child_in_para(item: &mut Node) {
    let Some(children) = item.children_mut() else {
        return;
    };
    let Some(first) = children.first_mut() else {
        return;
    };
    if let NodeKind::Container { children: inner } = &mut first.kind {
        let inner = std::mem::take(inner);
        first.kind = NodeKind::Para { children: inner };
    }
}

/// A loose continuation chunk that holds a single one-item sub-list would
/// otherwise come back tight from its sub-parse; reflect the looseness.
fn wrap_first_sub_item(chunk: &mut [Node]) {
    let Some(first) = chunk.first_mut() else {
        return;
    };
    let Some(children) = first.children_mut() else {
        return;
    };
    if children.len() == 1 {
        if let Some(item) = children.first_mut() {
            if matches!(
                item.kind,
                NodeKind::ListItem { .. } | NodeKind::TaskListItem { .. }
            ) {
                wrap_first_child_in_para(item);
            }
        }
    }
}
