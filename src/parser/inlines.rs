//! Inline altitude: text runs, endlines, emphasis/strong, links, code,
//! inline HTML, entities, escapes, smart punctuation and footnote refs.
//!
//! Rules are ordered-choice: the first alternative that matches wins, so the
//! order inside [`ParseRun::non_link_inline`] is load-bearing.

use crate::ast::{push_coalescing, Node, NodeKind, QuoteKind, ReferenceKey};
use crate::extensions::Extensions;
use crate::parser::{is_alphanumeric, is_label_char, is_space_char, ParseRun};
use crate::plugins::PluginCursor;

/// Enclosing emphasis state threaded through nested inline parses:
/// `Some(true)` inside a strong-class span, `Some(false)` inside emphasis.
/// Containers such as labels and quoted spans reset it to `None`.
pub(crate) type EmphScope = Option<bool>;

impl<'a> ParseRun<'a> {
    /// `Inlines = InlineOrIntermediateEndline+ (Endline -> dropped)?`
    ///
    /// Returns the transparent container holding the sequence.
    pub(crate) fn inlines(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let mut children: Vec<Node> = Vec::new();
        loop {
            let mark = self.cur.pos();
            // an intermediate endline is kept only when another inline follows
            if let Some(endline) = self.endline() {
                let probe = self.cur.pos();
                if self.inline(&children, None).is_some() {
                    self.cur.reset(probe);
                    push_coalescing(&mut children, endline);
                    continue;
                }
                self.cur.reset(mark);
                break;
            }
            match self.inline(&children, None) {
                Some(node) => push_coalescing(&mut children, node),
                None => break,
            }
        }
        if children.is_empty() {
            return None;
        }
        // a trailing endline is consumed but not kept
        let mark = self.cur.pos();
        if self.endline().is_none() {
            self.cur.reset(mark);
        }
        Some(Node::container(children, start, self.cur.pos()))
    }

    /// `Inline = Link / NonLinkInline`, with the deadline polled on entry.
    pub(crate) fn inline(&mut self, siblings: &[Node], emph: EmphScope) -> Option<Node> {
        if !self.on_schedule() {
            return None;
        }
        let pos = self.cur.pos();
        if self.inline_missed(pos) {
            return None;
        }
        if let Some(node) = self.link() {
            return Some(node);
        }
        if let Some(node) = self.non_link_inline(siblings, emph) {
            return Some(node);
        }
        self.note_inline_miss(pos);
        None
    }

    pub(crate) fn non_link_inline(&mut self, siblings: &[Node], emph: EmphScope) -> Option<Node> {
        let plugins = self.plugins;
        for plugin in plugins.inline_plugins() {
            let mark = self.cur.pos();
            if let Some(node) = plugin.try_inline(&mut PluginCursor::new(self)) {
                return Some(node);
            }
            self.cur.reset(mark);
        }
        if let Some(node) = self.str_rule() {
            return Some(node);
        }
        if let Some(node) = self.endline() {
            return Some(node);
        }
        if let Some(node) = self.ul_or_star_line() {
            return Some(node);
        }
        if let Some(node) = self.spaces() {
            return Some(node);
        }
        if let Some(node) = self.strong_or_emph(siblings, emph) {
            return Some(node);
        }
        if let Some(node) = self.image() {
            return Some(node);
        }
        if let Some(node) = self.code() {
            return Some(node);
        }
        if let Some(node) = self.inline_html() {
            return Some(node);
        }
        if let Some(node) = self.entity() {
            return Some(node);
        }
        if let Some(node) = self.escaped_char() {
            return Some(node);
        }
        if self.ext(Extensions::QUOTES) {
            if let Some(node) = self.single_quoted() {
                return Some(node);
            }
            if let Some(node) = self.double_quoted() {
                return Some(node);
            }
            if let Some(node) = self.double_angle_quoted() {
                return Some(node);
            }
        }
        if self.ext(Extensions::SMARTS) {
            if let Some(node) = self.smarts() {
                return Some(node);
            }
        }
        if self.ext(Extensions::STRIKETHROUGH) {
            if let Some(node) = self.strike(siblings, emph) {
                return Some(node);
            }
        }
        if self.ext(Extensions::FOOTNOTES) {
            if let Some(node) = self.footnote_ref() {
                return Some(node);
            }
        }
        self.symbol()
    }

    /// `Str = NormalChar+`
    fn str_rule(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        while let Some(c) = self.cur.peek() {
            if self.is_special_char(c) || is_space_char(c) || c == '\n' || c == '\r' {
                break;
            }
            self.cur.bump();
        }
        if self.cur.pos() == start {
            return None;
        }
        Some(Node::text(
            self.cur.slice(start, self.cur.pos()),
            start,
            self.cur.pos(),
        ))
    }

    /// `Spaces = Spacechar+`
    fn spaces(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.cur.eat_sp() == 0 {
            return None;
        }
        Some(Node::text(
            self.cur.slice(start, self.cur.pos()),
            start,
            self.cur.pos(),
        ))
    }

    /// `Endline = LineBreak / TerminalEndline / NormalEndline`
    pub(crate) fn endline(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.endline_missed(start) {
            return None;
        }
        // LineBreak: two trailing spaces before the newline
        if self.cur.starts_with("  ") {
            let mark = self.cur.pos();
            self.cur.bump_n(2);
            if self.normal_endline_body() {
                return Some(Node::new(NodeKind::LineBreak, start, self.cur.pos()));
            }
            self.cur.reset(mark);
        }
        // TerminalEndline: the newline that ends the input becomes text
        {
            let mark = self.cur.pos();
            self.cur.eat_sp();
            if self.cur.eat_newline() && self.cur.at_end() {
                return Some(Node::text("\n", start, self.cur.pos()));
            }
            self.cur.reset(mark);
        }
        if self.normal_endline_body() {
            let node = if self.ext(Extensions::HARDWRAPS) {
                Node::new(NodeKind::LineBreak, start, self.cur.pos())
            } else {
                Node::text(" ", start, self.cur.pos())
            };
            return Some(node);
        }
        self.note_endline_miss(start);
        None
    }

    /// Consume `Sp Newline` unless the next line starts a construct that
    /// must terminate the paragraph instead.
    fn normal_endline_body(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return false;
        }
        let after = self.cur.pos();
        let blocked = self.cur.at_blank_line()
            || self.cur.peek() == Some('>')
            || self.cur.peek() == Some('#')
            || self.setext_underline_follows()
            || self.fenced_code_follows();
        self.cur.reset(if blocked { mark } else { after });
        if blocked {
            return false;
        }
        true
    }

    /// Look-ahead: a line, then a setext underline of `=` or `-`.
    fn setext_underline_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = (|| {
            self.cur.eat_line()?;
            let c = match self.cur.peek() {
                Some('=') => '=',
                Some('-') => '-',
                _ => return None,
            };
            self.cur.eat_n_or_more(c, 3)?;
            self.cur.eat_sp();
            if self.cur.eat_newline() {
                Some(())
            } else {
                None
            }
        })()
        .is_some();
        self.cur.reset(mark);
        found
    }

    fn fenced_code_follows(&mut self) -> bool {
        if !self.ext(Extensions::FENCED_CODE_BLOCKS) {
            return false;
        }
        if !matches!(self.cur.peek(), Some('`') | Some('~')) {
            return false;
        }
        let mark = self.cur.pos();
        let found = self.fenced_code_block().is_some();
        self.cur.reset(mark);
        found
    }

    /// `UlOrStarLine`: keeps the parser from drowning in long `*`/`_`/`~`
    /// runs by consuming them as plain text before emphasis is tried.
    fn ul_or_star_line(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        for c in ['_', '*', '~'] {
            if self.char_line(c) {
                return Some(Node::text(
                    self.cur.slice(start, self.cur.pos()),
                    start,
                    self.cur.pos(),
                ));
            }
        }
        None
    }

    /// `CharLine(c) = c{4,} / (Spacechar c+ &Spacechar)`
    fn char_line(&mut self, c: char) -> bool {
        if self.cur.eat_n_or_more(c, 4).is_some() {
            return true;
        }
        let mark = self.cur.pos();
        if self.cur.peek().is_some_and(is_space_char) {
            self.cur.bump();
            if self.cur.eat_n_or_more(c, 1).is_some()
                && self.cur.peek().is_some_and(is_space_char)
            {
                return true;
            }
        }
        self.cur.reset(mark);
        false
    }

    fn char_line_follows(&mut self, c: char) -> bool {
        let mark = self.cur.pos();
        let found = self.char_line(c);
        self.cur.reset(mark);
        found
    }

    /// `StrongOrEmph`: strong delimiters are tried before emphasis ones.
    fn strong_or_emph(&mut self, siblings: &[Node], emph: EmphScope) -> Option<Node> {
        if !matches!(self.cur.peek(), Some('*') | Some('_')) {
            return None;
        }
        for chars in ["**", "__", "*", "_"] {
            if let Some(node) = self.emph_or_strong(chars, siblings, emph) {
                return Some(node);
            }
        }
        None
    }

    /// `~~…~~` parsed with the shared emphasis machinery.
    fn strike(&mut self, siblings: &[Node], emph: EmphScope) -> Option<Node> {
        let node = self.emph_or_strong("~~", siblings, emph)?;
        let (start, end) = (node.start, node.end);
        match node.kind {
            NodeKind::StrongEmph {
                closed, children, ..
            } => Some(Node::new(NodeKind::Strike { closed, children }, start, end)),
            _ => None,
        }
    }

    /// The shared emphasis/strong rule. See the module docs of the crate for
    /// the full contract: entry gating, close gating, close-char stealing
    /// and unclosed preservation.
    fn emph_or_strong(&mut self, chars: &str, siblings: &[Node], emph: EmphScope) -> Option<Node> {
        let start = self.cur.pos();
        let strong = chars.len() == 2;
        let c0 = chars.chars().next().unwrap_or('*');

        if !self.may_enter_emph(chars, siblings, emph) {
            return None;
        }
        // open: not part of a star line, delimiter chars, then no space/newline
        if self.char_line_follows(c0) {
            return None;
        }
        if !self.cur.eat_str(chars) {
            return None;
        }
        match self.cur.peek() {
            Some(c) if !is_space_char(c) && c != '\n' && c != '\r' => {}
            _ => {
                self.cur.reset(start);
                return None;
            }
        }

        let mut children: Vec<Node> = Vec::new();
        let mut closed = false;
        let mut force_close = false;
        loop {
            if force_close {
                // the closer was already stolen from a nested child
                closed = true;
                break;
            }
            if self.emph_close(chars, &children) {
                closed = true;
                break;
            }
            let Some(inline) = self.inline(&children, Some(strong)) else {
                break;
            };
            if strong && steal_candidate(&inline, c0) {
                let mark = self.cur.pos();
                if self.cur.eat(c0) && self.cur.peek() != Some(c0) {
                    // transfer the child's closer back to this node
                    let mut child = inline;
                    if let NodeKind::StrongEmph { closed, .. } = &mut child.kind {
                        *closed = false;
                    }
                    push_coalescing(&mut children, child);
                    force_close = true;
                    continue;
                }
                self.cur.reset(mark);
            }
            push_coalescing(&mut children, inline);
        }

        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::StrongEmph {
                chars: chars.to_string(),
                strong,
                closed,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    /// May this position open an emphasis/strong sequence?
    ///
    /// Nested sequences must alternate (emphasis inside strong or vice
    /// versa), and the preceding sibling must end in a way that permits an
    /// opener: trailing space, a line break marker, or the start of the
    /// enclosing container. The relaxed extension additionally admits any
    /// non-alphanumeric preceding character (`_` also refuses `_`).
    fn may_enter_emph(&self, chars: &str, siblings: &[Node], emph: EmphScope) -> bool {
        let strong = chars.len() == 2;
        if emph == Some(strong) {
            return false;
        }
        let Some(last) = last_leaf(siblings) else {
            return true;
        };
        match &last.kind {
            NodeKind::Text { text } if text.ends_with(' ') => return true,
            NodeKind::LineBreak
            | NodeKind::HorizontalRule
            | NodeKind::Ellipsis
            | NodeKind::Emdash
            | NodeKind::Endash
            | NodeKind::Apostrophe
            | NodeKind::Nbsp => return true,
            _ => {}
        }
        if self.ext(Extensions::RELAXED_STRONG_EMPHASIS_RULES) {
            let Some(prev) = self.cur.prev_char() else {
                return true;
            };
            if chars.starts_with('_') {
                return !prev.is_alphanumeric() && prev != '_';
            }
            return !prev.is_alphanumeric();
        }
        false
    }

    /// Try to consume a closing delimiter for `chars`; resets on failure.
    fn emph_close(&mut self, chars: &str, children: &[Node]) -> bool {
        if !legal_emph_close_pos(children) {
            return false;
        }
        let mark = self.cur.pos();
        match self.cur.peek() {
            Some(c) if !is_space_char(c) && c != '\n' && c != '\r' => {}
            _ => return false,
        }
        if !self.cur.eat_str(chars) {
            return false;
        }
        let allowed = if self.ext(Extensions::RELAXED_STRONG_EMPHASIS_RULES) {
            !chars.starts_with('_')
        } else {
            chars.len() == 2
        };
        if !allowed && self.cur.peek().is_some_and(is_alphanumeric) {
            self.cur.reset(mark);
            return false;
        }
        true
    }

    //************* LINKS ****************

    /// `Link = WikiLink? / (Label (ExplicitLink / ReferenceLink)) / AutoLink`
    fn link(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.link_missed(start) {
            return None;
        }
        if self.ext(Extensions::WIKILINKS) {
            if let Some(node) = self.wiki_link() {
                return Some(node);
            }
        }
        if let Some(node) = self.label_link() {
            return Some(node);
        }
        if let Some(node) = self.auto_link() {
            return Some(node);
        }
        self.note_link_miss(start);
        None
    }

    /// `Label (ExplicitLink / ReferenceLink)`, shared with label-only
    /// contexts that must not recognize autolinks.
    pub(crate) fn label_link(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let label = self.label()?;
        if let Some(node) = self.explicit_link_or_image(false, &label, start) {
            return Some(node);
        }
        Some(self.reference_link_or_image(false, label, start))
    }

    /// `Image = '!' ImageAlt (MultiLineURLImage? / ExplicitLink / ReferenceLink)`
    fn image(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat('!') {
            return None;
        }
        let Some(alt) = self.image_alt() else {
            self.cur.reset(start);
            return None;
        };
        if self.ext(Extensions::MULTI_LINE_IMAGE_URLS) {
            if let Some(node) = self.multi_line_url_image(&alt, start) {
                return Some(node);
            }
        }
        if let Some(node) = self.explicit_link_or_image(true, &alt, start) {
            return Some(node);
        }
        Some(self.reference_link_or_image(true, alt, start))
    }

    /// `ImageAlt = '[' NonLinkInline* ']'` — may be empty, unlike `Label`.
    fn image_alt(&mut self) -> Option<Node> {
        if !self.on_schedule() {
            return None;
        }
        let start = self.cur.pos();
        if !self.cur.eat('[') {
            return None;
        }
        let mut children = Vec::new();
        while self.cur.peek() != Some(']') {
            match self.non_link_inline(&children, None) {
                Some(node) => push_coalescing(&mut children, node),
                None => break,
            }
        }
        if !self.cur.eat(']') {
            self.cur.reset(start);
            return None;
        }
        Some(Node::container(children, start, self.cur.pos()))
    }

    /// `Label = '[' !'^'? NonAutoLinkInline+ ']'`, plus the empty-label
    /// form under the IntelliJ dummy identifier extension.
    pub(crate) fn label(&mut self) -> Option<Node> {
        if !self.on_schedule() {
            return None;
        }
        let start = self.cur.pos();
        if self.cur.eat('[') {
            if self.ext(Extensions::FOOTNOTES) && self.cur.peek() == Some('^') {
                self.cur.reset(start);
            } else {
                let mut children = Vec::new();
                loop {
                    if self.cur.peek() == Some(']') {
                        break;
                    }
                    let node = self
                        .label_link()
                        .or_else(|| self.non_link_inline(&children, None));
                    match node {
                        Some(node) => push_coalescing(&mut children, node),
                        None => break,
                    }
                }
                if !children.is_empty() && self.cur.eat(']') {
                    return Some(Node::container(children, start, self.cur.pos()));
                }
                self.cur.reset(start);
            }
        }
        if self.ext(Extensions::INTELLIJ_DUMMY_IDENTIFIER) && self.cur.starts_with("[]") {
            let mark = self.cur.pos();
            self.cur.bump_n(2);
            let usable = self.empty_label_context_follows();
            if usable {
                return Some(Node::container(Vec::new(), mark, self.cur.pos()));
            }
            self.cur.reset(start);
        }
        None
    }

    /// After an empty `[]` label: a definition colon, another label, `[]`,
    /// or an explicit-link tail must follow for the empty form to count.
    fn empty_label_context_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = (|| {
            if self.cur.eat(':') {
                return true;
            }
            self.cur.reset(mark);
            if self.label().is_some() {
                return true;
            }
            self.cur.reset(mark);
            if self.cur.starts_with("[]") {
                return true;
            }
            self.cur.eat_spn1();
            if self.cur.eat('(') {
                return true;
            }
            false
        })();
        self.cur.reset(mark);
        found
    }

    /// `ExplicitLink = Spn1 '(' Sp LinkSource Spn1 LinkTitle? Sp ')'`
    fn explicit_link_or_image(&mut self, image: bool, label: &Node, start: usize) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_spn1();
        if !self.cur.eat('(') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        let Some(url) = self.link_source() else {
            self.cur.reset(mark);
            return None;
        };
        self.cur.eat_spn1();
        let title = self.link_title().unwrap_or_default();
        self.cur.eat_sp();
        if !self.cur.eat(')') {
            self.cur.reset(mark);
            return None;
        }
        let children = label.children().to_vec();
        let kind = if image {
            NodeKind::ExpImage {
                url,
                title,
                children,
            }
        } else {
            NodeKind::ExpLink {
                url,
                title,
                children,
            }
        };
        Some(Node::new(kind, start, self.cur.pos()))
    }

    /// `ReferenceLink` — always succeeds; the bare `[text]` form resolves
    /// with no key at all.
    fn reference_link_or_image(&mut self, image: bool, label: Node, start: usize) -> Node {
        let mark = self.cur.pos();
        let sep_start = self.cur.pos();
        self.cur.eat_spn1();
        let separator = self.cur.slice(sep_start, self.cur.pos());

        let (reference_key, separator) = if let Some(key) = self.label() {
            (Some(ReferenceKey::Label(Box::new(key))), Some(separator))
        } else if self.cur.eat_str("[]") {
            let key = if self.ext(Extensions::DUMMY_REFERENCE_KEY) {
                Some(ReferenceKey::Dummy)
            } else {
                None
            };
            (key, Some(separator))
        } else {
            self.cur.reset(mark);
            (None, None)
        };

        let children = match label.kind {
            NodeKind::Container { children } => children,
            _ => vec![label],
        };
        let kind = if image {
            NodeKind::RefImage {
                reference_key,
                separator,
                children,
            }
        } else {
            NodeKind::RefLink {
                reference_key,
                separator,
                children,
            }
        };
        Node::new(kind, start, self.cur.pos())
    }

    /// `LinkSource`: `<…>`-wrapped, parenthesized, or bare non-space run
    /// with `\(`/`\)` escapes. May be empty.
    pub(crate) fn link_source(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        if self.cur.eat('(') {
            if let Some(url) = self.link_source() {
                if self.cur.eat(')') {
                    return Some(url);
                }
            }
            self.cur.reset(mark);
        }
        if self.cur.eat('<') {
            if let Some(url) = self.link_source() {
                if self.cur.eat('>') {
                    return Some(url);
                }
            }
            self.cur.reset(mark);
        }
        let mut url = String::new();
        loop {
            match self.cur.peek() {
                Some('\\') if matches!(self.cur.peek_at(1), Some('(') | Some(')')) => {
                    self.cur.bump();
                    url.push(self.cur.bump().unwrap_or_default());
                }
                Some(c)
                    if c != '(' && c != ')' && c != '>' && !is_space_char(c) && c != '\n'
                        && c != '\r' =>
                {
                    url.push(c);
                    self.cur.bump();
                }
                _ => break,
            }
        }
        // the empty alternative always matches
        Some(url)
    }

    /// `LinkTitle = '…'-quoted / "…"-quoted`, closing only before `)` or EOL.
    pub(crate) fn link_title(&mut self) -> Option<String> {
        for delim in ['\'', '"'] {
            if let Some(title) = self.link_title_with(delim) {
                return Some(title);
            }
        }
        None
    }

    fn link_title_with(&mut self, delim: char) -> Option<String> {
        let mark = self.cur.pos();
        if !self.cur.eat(delim) {
            return None;
        }
        let content_start = self.cur.pos();
        loop {
            if self.title_end_follows(delim) {
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
        if !self.cur.eat(delim) {
            self.cur.reset(mark);
            return None;
        }
        Some(title)
    }

    /// The title delimiter counts as closing only when `)` or a newline
    /// follows (after spaces).
    fn title_end_follows(&mut self, delim: char) -> bool {
        let mark = self.cur.pos();
        let found = self.cur.eat(delim) && {
            self.cur.eat_sp();
            matches!(self.cur.peek(), Some(')') | Some('\n') | Some('\r') | None)
        };
        self.cur.reset(mark);
        found
    }

    /// `AutoLink`: `<scheme://…>` / `<user@host>`; with the autolinks
    /// extension the angle brackets become optional.
    fn auto_link(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let relaxed = self.ext(Extensions::AUTOLINKS);
        let had_bracket = self.cur.eat('<');
        if !had_bracket && !relaxed {
            return None;
        }
        let node = self.auto_link_url().or_else(|| self.auto_link_email());
        let Some(mut node) = node else {
            self.cur.reset(start);
            return None;
        };
        if !self.cur.eat('>') && !relaxed {
            self.cur.reset(start);
            return None;
        }
        node.start = start;
        node.end = self.cur.pos();
        Some(node)
    }

    fn auto_link_url(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let mut probe = self.cur;
        let mut scheme_len = 0;
        while probe.peek().is_some_and(|c| self.is_grammar_letter(c)) {
            probe.bump();
            scheme_len += 1;
        }
        if scheme_len == 0 || !probe.starts_with("://") {
            return None;
        }
        self.cur = probe;
        self.cur.bump_n(3);
        if !self.auto_link_end() {
            self.cur.reset(start);
            return None;
        }
        let url = self.cur.slice(start, self.cur.pos());
        Some(Node::new(NodeKind::AutoLink { url }, start, self.cur.pos()))
    }

    fn auto_link_email(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let mut user_len = 0;
        while self
            .cur
            .peek()
            .is_some_and(|c| is_alphanumeric(c) || matches!(c, '-' | '+' | '_' | '.'))
        {
            self.cur.bump();
            user_len += 1;
        }
        if user_len == 0 || !self.cur.eat('@') {
            self.cur.reset(start);
            return None;
        }
        if !self.auto_link_end() {
            self.cur.reset(start);
            return None;
        }
        let address = self.cur.slice(start, self.cur.pos());
        Some(Node::new(
            NodeKind::MailLink { address },
            start,
            self.cur.pos(),
        ))
    }

    /// Consume the tail of an autolink, excluding terminating delimiters
    /// and, in relaxed mode, trailing punctuation before whitespace.
    fn auto_link_end(&mut self) -> bool {
        let relaxed = self.ext(Extensions::AUTOLINKS);
        let mut consumed = 0;
        loop {
            let Some(c) = self.cur.peek() else { break };
            if c == '\n' || c == '\r' {
                break;
            }
            if relaxed {
                if c == '<' || c == '*' || c == '>' {
                    break;
                }
                if c == '~' && self.ext(Extensions::STRIKETHROUGH) {
                    break;
                }
                if self.trailing_punctuation_follows() {
                    break;
                }
            } else if c == '>' {
                break;
            }
            self.cur.bump();
            consumed += 1;
        }
        consumed > 0
    }

    /// Optional punctuation then whitespace: the end of a bare autolink.
    fn trailing_punctuation_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let mut probe = self.cur;
        if probe
            .peek()
            .is_some_and(|c| matches!(c, '.' | ',' | ';' | ':' | ')' | '}' | ']' | '"' | '\''))
        {
            probe.bump();
        }
        let found = matches!(probe.peek(), Some(' ') | Some('\t') | Some('\n') | Some('\r'));
        self.cur.reset(mark);
        found
    }

    /// `[[page]]` / `[[page|text]]`
    fn wiki_link(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat_str("[[") {
            return None;
        }
        let content_start = self.cur.pos();
        loop {
            if self.cur.starts_with("]]") || self.cur.at_blank_line() || self.cur.at_end() {
                break;
            }
            self.cur.bump();
        }
        let text = self.cur.slice(content_start, self.cur.pos());
        let empty_ok = self.ext(Extensions::INTELLIJ_DUMMY_IDENTIFIER);
        if (!empty_ok && text.is_empty()) || !self.cur.eat_str("]]") {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(NodeKind::WikiLink { text }, start, self.cur.pos()))
    }

    /// Multi-line image URL: the URL opens with a `?` ending the line and
    /// absorbs everything verbatim until a `)` (or `"title")`) line.
    fn multi_line_url_image(&mut self, alt: &Node, start: usize) -> Option<Node> {
        let mark = self.cur.pos();
        self.cur.eat_spn1();
        if !self.cur.eat('(') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        let Some(url) = self.multi_line_link_source() else {
            self.cur.reset(mark);
            return None;
        };
        let Some(title) = self.multi_line_image_end() else {
            self.cur.reset(mark);
            return None;
        };
        Some(Node::new(
            NodeKind::ExpImage {
                url,
                title,
                children: alt.children().to_vec(),
            },
            start,
            self.cur.pos(),
        ))
    }

    /// First URL segment ending in `?` at EOL, then raw lines until the
    /// closing segment.
    fn multi_line_link_source(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        let mut url = String::new();
        loop {
            match self.cur.peek() {
                Some('\\') if matches!(self.cur.peek_at(1), Some('(') | Some(')') | Some('?')) => {
                    self.cur.bump();
                    url.push(self.cur.bump().unwrap_or_default());
                }
                Some(c)
                    if !matches!(c, '(' | ')' | '?')
                        && !is_space_char(c)
                        && c != '\n'
                        && c != '\r' =>
                {
                    url.push(c);
                    self.cur.bump();
                }
                _ => break,
            }
        }
        if url.is_empty() {
            self.cur.reset(mark);
            return None;
        }
        // the line must end right after a `?`
        let seg_start = self.cur.pos();
        if !self.cur.eat('?') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return None;
        }
        url.push_str(&self.cur.slice(seg_start, self.cur.pos()));

        let mut absorbed_any = false;
        loop {
            if self.multi_line_image_end_follows() {
                break;
            }
            let Some((line_start, line_end)) = self.cur.eat_line() else {
                self.cur.reset(mark);
                return None;
            };
            url.push_str(&self.cur.slice(line_start, line_end));
            absorbed_any = true;
        }
        if !absorbed_any {
            self.cur.reset(mark);
            return None;
        }
        Some(url)
    }

    fn multi_line_image_end_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = self.multi_line_image_end().is_some();
        self.cur.reset(mark);
        found
    }

    /// `NonindentSpace (LinkTitle Sp)? ')' Sp &Newline`
    fn multi_line_image_end(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        self.cur.eat_nonindent_space();
        let title = match self.link_title() {
            Some(title) => {
                self.cur.eat_sp();
                title
            }
            None => String::new(),
        };
        if !self.cur.eat(')') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        if !self.cur.at_newline() {
            self.cur.reset(mark);
            return None;
        }
        Some(title)
    }

    //************* CODE / HTML / ENTITIES ****************

    /// Inline code spans with 1–5 tick delimiters.
    fn code(&mut self) -> Option<Node> {
        if self.cur.peek() != Some('`') {
            return None;
        }
        for ticks in 1..=5 {
            if let Some(node) = self.code_with(ticks) {
                return Some(node);
            }
        }
        None
    }

    fn code_with(&mut self, ticks: usize) -> Option<Node> {
        let start = self.cur.pos();
        if !self.eat_ticks(ticks) {
            return None;
        }
        self.cur.eat_sp();
        let content_start = self.cur.pos();
        let mut content_end = content_start;
        loop {
            match self.cur.peek() {
                Some('`') => {
                    // a run of a different length stays inside the span
                    if self.ticks_follow(ticks) {
                        break;
                    }
                    while self.cur.peek() == Some('`') {
                        self.cur.bump();
                    }
                    content_end = self.cur.pos();
                }
                Some(c) if is_space_char(c) => {
                    // interior spaces are fine unless they precede the close
                    let mark = self.cur.pos();
                    self.cur.eat_sp();
                    if self.ticks_follow(ticks) {
                        self.cur.reset(mark);
                        break;
                    }
                    content_end = self.cur.pos();
                }
                Some('\n') | Some('\r') => {
                    let mark = self.cur.pos();
                    if !self.cur.eat_newline() || self.cur.at_blank_line() {
                        self.cur.reset(mark);
                        break;
                    }
                    content_end = self.cur.pos();
                }
                Some(_) => {
                    self.cur.bump();
                    content_end = self.cur.pos();
                }
                None => break,
            }
        }
        if content_end == content_start {
            self.cur.reset(start);
            return None;
        }
        let text = self.cur.slice(content_start, content_end);
        self.cur.reset(content_end);
        self.cur.eat_sp();
        if !self.eat_ticks(ticks) {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(NodeKind::Code { text }, start, self.cur.pos()))
    }

    /// Exactly `n` backticks.
    fn eat_ticks(&mut self, n: usize) -> bool {
        if self.cur.run_len('`') == n {
            self.cur.bump_n(n);
            true
        } else {
            false
        }
    }

    fn ticks_follow(&mut self, n: usize) -> bool {
        self.cur.run_len('`') == n
    }

    /// `InlineHtml = HtmlComment / HtmlTag`
    fn inline_html(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.html_comment() && !self.html_tag() {
            return None;
        }
        let text = if self.ext(Extensions::SUPPRESS_INLINE_HTML) {
            String::new()
        } else {
            self.cur.slice(start, self.cur.pos())
        };
        Some(Node::new(
            NodeKind::InlineHtml { text },
            start,
            self.cur.pos(),
        ))
    }

    pub(crate) fn html_comment(&mut self) -> bool {
        let mark = self.cur.pos();
        if !self.cur.eat_str("<!--") {
            return false;
        }
        while !self.cur.starts_with("-->") {
            if self.cur.bump().is_none() {
                self.cur.reset(mark);
                return false;
            }
        }
        self.cur.bump_n(3);
        true
    }

    /// Any well-formed open, close or self-closing tag.
    pub(crate) fn html_tag(&mut self) -> bool {
        let mark = self.cur.pos();
        let matched = (|| {
            if !self.cur.eat('<') {
                return false;
            }
            self.cur.eat_spn1();
            self.cur.eat('/');
            let mut name_len = 0;
            while self.cur.peek().is_some_and(is_alphanumeric) {
                self.cur.bump();
                name_len += 1;
            }
            if name_len == 0 {
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

    pub(crate) fn html_attribute(&mut self) -> bool {
        let mark = self.cur.pos();
        let mut name_len = 0;
        while self
            .cur
            .peek()
            .is_some_and(|c| is_alphanumeric(c) || c == '-' || c == '_')
        {
            self.cur.bump();
            name_len += 1;
        }
        if name_len == 0 {
            self.cur.reset(mark);
            return false;
        }
        self.cur.eat_spn1();
        if self.cur.eat('=') {
            self.cur.eat_spn1();
            if !self.html_quoted_value() {
                let mut value_len = 0;
                while self
                    .cur
                    .peek()
                    .is_some_and(|c| c != '>' && !is_space_char(c) && c != '\n' && c != '\r')
                {
                    self.cur.bump();
                    value_len += 1;
                }
                if value_len == 0 {
                    self.cur.reset(mark);
                    return false;
                }
            }
        }
        self.cur.eat_spn1();
        true
    }

    fn html_quoted_value(&mut self) -> bool {
        for delim in ['"', '\''] {
            let mark = self.cur.pos();
            if self.cur.eat(delim) {
                while self.cur.peek().is_some_and(|c| c != delim) {
                    self.cur.bump();
                }
                if self.cur.eat(delim) {
                    return true;
                }
                self.cur.reset(mark);
            }
        }
        false
    }

    /// `&name;` / `&#123;` / `&#xAB;` pass through as raw text.
    fn entity(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat('&') {
            return None;
        }
        let ok = if self.cur.eat('#') {
            if self.cur.eat('x') || self.cur.eat('X') {
                self.eat_while_min(1, |c| c.is_ascii_hexdigit())
            } else {
                self.eat_while_min(1, |c| c.is_ascii_digit())
            }
        } else {
            self.eat_while_min(1, is_alphanumeric)
        };
        if !ok || !self.cur.eat(';') {
            self.cur.reset(start);
            return None;
        }
        Some(Node::text(
            self.cur.slice(start, self.cur.pos()),
            start,
            self.cur.pos(),
        ))
    }

    fn eat_while_min(&mut self, min: usize, pred: impl Fn(char) -> bool) -> bool {
        let mut count = 0;
        while self.cur.peek().is_some_and(&pred) {
            self.cur.bump();
            count += 1;
        }
        count >= min
    }

    /// `\x` for escapable `x` becomes SpecialText of the bare character.
    fn escaped_char(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat('\\') {
            return None;
        }
        match self.cur.peek() {
            Some(c) if self.is_escapable_char(c) => {
                self.cur.bump();
                Some(Node::special_text(c.to_string(), start, self.cur.pos()))
            }
            _ => {
                self.cur.reset(start);
                None
            }
        }
    }

    /// Any remaining special character becomes SpecialText.
    fn symbol(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        match self.cur.peek() {
            Some(c) if self.is_special_char(c) => {
                self.cur.bump();
                Some(Node::special_text(c.to_string(), start, self.cur.pos()))
            }
            _ => None,
        }
    }

    //************* SMARTS & QUOTES ****************

    fn smarts(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let kind = if self.cur.eat_str("...") || self.cur.eat_str(". . .") {
            NodeKind::Ellipsis
        } else if self.cur.eat_str("---") {
            NodeKind::Emdash
        } else if self.cur.eat_str("--") {
            NodeKind::Endash
        } else if self.cur.eat('\'') {
            NodeKind::Apostrophe
        } else {
            return None;
        };
        Some(Node::new(kind, start, self.cur.pos()))
    }

    fn single_quoted(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if self.cur.prev_char().is_some_and(|c| c.is_alphabetic()) {
            return None;
        }
        if !self.cur.eat('\'') {
            return None;
        }
        let mut children = Vec::new();
        loop {
            if self.single_quote_end_follows() {
                break;
            }
            match self.inline(&children, None) {
                Some(node) => push_coalescing(&mut children, node),
                None => {
                    self.cur.reset(start);
                    return None;
                }
            }
        }
        if children.is_empty() || !self.cur.eat('\'') {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Quoted {
                quote: QuoteKind::Single,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    fn single_quote_end_follows(&mut self) -> bool {
        self.cur.peek() == Some('\'') && !self.cur.peek_at(1).is_some_and(is_alphanumeric)
    }

    fn double_quoted(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat('"') {
            return None;
        }
        let mut children = Vec::new();
        while self.cur.peek() != Some('"') {
            match self.inline(&children, None) {
                Some(node) => push_coalescing(&mut children, node),
                None => {
                    self.cur.reset(start);
                    return None;
                }
            }
        }
        if children.is_empty() || !self.cur.eat('"') {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Quoted {
                quote: QuoteKind::Double,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    fn double_angle_quoted(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        if !self.cur.eat_str("<<") {
            return None;
        }
        let mut children = Vec::new();
        if self.cur.peek().is_some_and(is_space_char) {
            let nbsp_start = self.cur.pos();
            self.cur.bump();
            children.push(Node::new(NodeKind::Nbsp, nbsp_start, self.cur.pos()));
        }
        loop {
            if self.cur.starts_with(">>") {
                break;
            }
            let nbsp_start = self.cur.pos();
            if self.cur.peek().is_some_and(is_space_char) {
                let mut probe = self.cur;
                probe.eat_sp();
                if probe.starts_with(">>") {
                    self.cur = probe;
                    push_coalescing(
                        &mut children,
                        Node::new(NodeKind::Nbsp, nbsp_start, self.cur.pos()),
                    );
                    continue;
                }
            }
            match self.inline(&children, None) {
                Some(node) => push_coalescing(&mut children, node),
                None => {
                    self.cur.reset(start);
                    return None;
                }
            }
        }
        if children.is_empty() || !self.cur.eat_str(">>") {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Quoted {
                quote: QuoteKind::DoubleAngle,
                children,
            },
            start,
            self.cur.pos(),
        ))
    }

    //************* FOOTNOTES ****************

    /// `[^label]` referencing a footnote definition.
    fn footnote_ref(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let label = self.footnote_label()?;
        Some(Node::new(
            NodeKind::FootnoteRef { label },
            start,
            self.cur.pos(),
        ))
    }

    /// `"[^" label-chars "]"`; the label may be empty under the IntelliJ
    /// dummy identifier extension.
    pub(crate) fn footnote_label(&mut self) -> Option<String> {
        let mark = self.cur.pos();
        if !self.cur.eat_str("[^") {
            return None;
        }
        let label_start = self.cur.pos();
        let dummy_ok = self.ext(Extensions::INTELLIJ_DUMMY_IDENTIFIER);
        while self
            .cur
            .peek()
            .is_some_and(|c| is_label_char(c) || (dummy_ok && c == '\u{1f}'))
        {
            self.cur.bump();
        }
        let label = self.cur.slice(label_start, self.cur.pos());
        if label.is_empty() && !self.ext(Extensions::INTELLIJ_DUMMY_IDENTIFIER) {
            self.cur.reset(mark);
            return None;
        }
        if !self.cur.eat(']') {
            self.cur.reset(mark);
            return None;
        }
        Some(label)
    }
}

/// Whether the last child permits a closing delimiter here: not after
/// trailing spaces, not right after a line break.
fn legal_emph_close_pos(children: &[Node]) -> bool {
    match children.last() {
        None => true,
        Some(last) => match &last.kind {
            NodeKind::Text { text } => !text.ends_with(' '),
            NodeKind::LineBreak => false,
            _ => true,
        },
    }
}

/// A closed nested emphasis whose delimiter ends with the parent's close
/// char may have eaten the parent's closer.
fn steal_candidate(node: &Node, c0: char) -> bool {
    match &node.kind {
        NodeKind::StrongEmph { chars, closed, .. } => *closed && chars.ends_with(c0),
        _ => false,
    }
}

/// Descend through containers to the deepest trailing leaf. `None` means
/// the position is effectively a sequence start (no sibling, or an empty
/// container), which always permits an opener.
fn last_leaf(siblings: &[Node]) -> Option<&Node> {
    let mut node = siblings.last()?;
    loop {
        if !node.has_child_slot() {
            return Some(node);
        }
        match node.children().last() {
            None => return None,
            Some(child) => node = child,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steal_candidate_requires_closed_matching_child() {
        let closed_em = Node::new(
            NodeKind::StrongEmph {
                chars: "*".into(),
                strong: false,
                closed: true,
                children: vec![Node::text("a", 3, 4)],
            },
            2,
            5,
        );
        assert!(steal_candidate(&closed_em, '*'));
        assert!(!steal_candidate(&closed_em, '_'));

        let text = Node::text("a", 0, 1);
        assert!(!steal_candidate(&text, '*'));
    }

    #[test]
    fn close_pos_rejects_trailing_space_and_linebreak() {
        let spaced = vec![Node::text("a ", 0, 2)];
        assert!(!legal_emph_close_pos(&spaced));

        let broken = vec![Node::new(NodeKind::LineBreak, 0, 1)];
        assert!(!legal_emph_close_pos(&broken));

        let plain = vec![Node::text("a", 0, 1)];
        assert!(legal_emph_close_pos(&plain));
        assert!(legal_emph_close_pos(&[]));
    }
}
