//! The recursive-descent PEG parser.
//!
//! One [`ParseRun`] drives one parse over one char buffer. Block quotes and
//! list items collect their inner text (with hidden marker characters
//! replaced by [`CROSSED_OUT`]) and hand it to [`ParseRun::sub_parse`],
//! which compacts the sentinels away, runs a fresh inner parse, and remaps
//! the resulting indices back into the original buffer.

mod blocks;
mod cursor;
mod inlines;
mod tables;

use std::cell::Cell;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::ast::{Node, NodeKind, TocHeading};
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use crate::plugins::Plugins;

pub(crate) use cursor::{is_alphanumeric, is_label_char, is_letter, is_space_char, Cursor};

/// Replacement for characters that must stay position-aligned but hidden
/// from an inner parse (list markers, quote markers, indents).
pub(crate) const CROSSED_OUT: char = '\u{ffff}';

/// Wall-clock budget shared between a parse and all its sub-parses.
pub(crate) struct ParseClock {
    started: Instant,
    budget: Duration,
    expired: Cell<bool>,
}

impl ParseClock {
    pub fn new(budget: Duration) -> Self {
        ParseClock {
            started: Instant::now(),
            budget,
            expired: Cell::new(false),
        }
    }

    /// Polled at the hot rule entries. Once the budget is gone this keeps
    /// returning `true` so every rule fails fast and the parse unwinds.
    pub fn expired(&self) -> bool {
        if self.expired.get() {
            return true;
        }
        if self.started.elapsed() > self.budget {
            warn!(budget = ?self.budget, "parsing deadline exceeded, aborting");
            self.expired.set(true);
        }
        self.expired.get()
    }
}

/// Parse the whole document. The working buffer gets two phantom trailing
/// newlines so every block rule can rely on a terminated final line; node
/// indices are clamped back to the source length afterwards.
pub(crate) fn parse_document(
    source: &str,
    extensions: Extensions,
    budget: Duration,
    plugins: &Plugins,
) -> Result<Node> {
    let mut buffer: Vec<char> = source.chars().collect();
    let source_len = buffer.len();
    buffer.push('\n');
    buffer.push('\n');

    let clock = ParseClock::new(budget);
    let mut run = ParseRun::new(&buffer, extensions, plugins, &clock, true);
    let mut root = run.root();

    if clock.expired() {
        return Err(Error::Timeout(budget));
    }

    if let NodeKind::Root {
        references,
        abbreviations,
        footnotes,
        ..
    } = &mut root.kind
    {
        *references = run.references;
        *abbreviations = run.abbreviations;
        *footnotes = run.footnotes;
    }

    root.clamp_indices(source_len);
    if extensions.contains(Extensions::TOC) {
        let headings = collect_headings(&root);
        fill_toc_nodes(&mut root, &headings);
    }

    debug!(
        blocks = root.children().len(),
        chars = source_len,
        "parsed document"
    );
    Ok(root)
}

/// Every heading of the finished tree, in document order.
fn collect_headings(root: &Node) -> Vec<TocHeading> {
    let mut headings = Vec::new();
    root.walk(&mut |node| {
        if let NodeKind::Heading { level, .. } = &node.kind {
            headings.push(TocHeading {
                level: *level,
                start: node.start,
            });
        }
    });
    headings
}

fn fill_toc_nodes(node: &mut Node, headings: &[TocHeading]) {
    if let NodeKind::Toc {
        headings: slot, ..
    } = &mut node.kind
    {
        *slot = headings.to_vec();
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            fill_toc_nodes(child, headings);
        }
    }
}

/// State for one parse over one buffer.
pub(crate) struct ParseRun<'a> {
    pub(crate) cur: Cursor<'a>,
    pub(crate) exts: Extensions,
    pub(crate) plugins: &'a Plugins,
    clock: &'a ParseClock,
    /// Sub-parses discard their accumulators: definitions are only
    /// recognized at top level.
    top_level: bool,
    pub(crate) references: Vec<Node>,
    pub(crate) abbreviations: Vec<Node>,
    pub(crate) footnotes: Vec<Node>,
    /// Mismatch memo sets for the hot inline rules.
    inline_miss: HashSet<usize>,
    endline_miss: HashSet<usize>,
    link_miss: HashSet<usize>,
    special_chars: Vec<char>,
    escapable_chars: Vec<char>,
}

impl<'a> ParseRun<'a> {
    fn new(
        buffer: &'a [char],
        exts: Extensions,
        plugins: &'a Plugins,
        clock: &'a ParseClock,
        top_level: bool,
    ) -> Self {
        let mut special_chars: Vec<char> = exts.special_chars().chars().collect();
        let mut escapable_chars: Vec<char> = exts.escapable_chars().chars().collect();
        for c in plugins.special_chars() {
            if !special_chars.contains(&c) {
                special_chars.push(c);
            }
            if !escapable_chars.contains(&c) {
                escapable_chars.push(c);
            }
        }
        ParseRun {
            cur: Cursor::new(buffer),
            exts,
            plugins,
            clock,
            top_level,
            references: Vec::new(),
            abbreviations: Vec::new(),
            footnotes: Vec::new(),
            inline_miss: HashSet::new(),
            endline_miss: HashSet::new(),
            link_miss: HashSet::new(),
            special_chars,
            escapable_chars,
        }
    }

    pub(crate) fn ext(&self, flags: Extensions) -> bool {
        self.exts.intersects(flags)
    }

    /// `true` while parsing may continue; flips once the deadline passes.
    pub(crate) fn on_schedule(&self) -> bool {
        !self.clock.expired()
    }

    pub(crate) fn is_special_char(&self, c: char) -> bool {
        self.special_chars.contains(&c)
    }

    pub(crate) fn is_escapable_char(&self, c: char) -> bool {
        self.escapable_chars.contains(&c)
    }

    /// ASCII letter, widened by the IntelliJ dummy identifier extension.
    pub(crate) fn is_grammar_letter(&self, c: char) -> bool {
        is_letter(c)
            || (self.ext(Extensions::INTELLIJ_DUMMY_IDENTIFIER) && c == '\u{1f}')
    }

    pub(crate) fn record_definition(&mut self, node: &Node) {
        if !self.top_level {
            return;
        }
        match &node.kind {
            NodeKind::Reference { .. } => self.references.push(node.clone()),
            NodeKind::Abbreviation { .. } => self.abbreviations.push(node.clone()),
            NodeKind::FootnoteDef { .. } => self.footnotes.push(node.clone()),
            _ => {}
        }
    }

    pub(crate) fn inline_missed(&self, pos: usize) -> bool {
        self.inline_miss.contains(&pos)
    }

    pub(crate) fn note_inline_miss(&mut self, pos: usize) {
        self.inline_miss.insert(pos);
    }

    pub(crate) fn endline_missed(&self, pos: usize) -> bool {
        self.endline_miss.contains(&pos)
    }

    pub(crate) fn note_endline_miss(&mut self, pos: usize) {
        self.endline_miss.insert(pos);
    }

    pub(crate) fn link_missed(&self, pos: usize) -> bool {
        self.link_miss.contains(&pos)
    }

    pub(crate) fn note_link_miss(&mut self, pos: usize) {
        self.link_miss.insert(pos);
    }

    /// `Root = ZeroOrMore(Block)`.
    fn root(&mut self) -> Node {
        let start = self.cur.pos();
        let mut children = Vec::new();
        let mut end = start;
        while let Some(block) = self.block() {
            end = self.cur.pos();
            crate::ast::push_coalescing(&mut children, block);
        }
        Node::new(
            NodeKind::Root {
                children,
                references: Vec::new(),
                abbreviations: Vec::new(),
                footnotes: Vec::new(),
            },
            start,
            end,
        )
    }

    /// Run an inner parse over collected raw text and splice its children
    /// back, with all indices pointing into the original buffer.
    ///
    /// `raw` must be position-aligned with the original buffer starting at
    /// `origin`: hidden characters are crossed out, never deleted.
    pub(crate) fn sub_parse(&mut self, raw: &[char], origin: usize) -> Vec<Node> {
        let mut clean: Vec<char> = Vec::with_capacity(raw.len());
        let mut ix_map: Vec<usize> = Vec::with_capacity(raw.len() + 1);
        for (i, &c) in raw.iter().enumerate() {
            if c != CROSSED_OUT {
                ix_map.push(i);
                clean.push(c);
            }
        }
        ix_map.push(raw.len());

        let mut inner = ParseRun::new(&clean, self.exts, self.plugins, self.clock, false);
        let mut root = inner.root();
        root.remap_indices(&ix_map);
        root.shift_indices(origin);

        match root.kind {
            NodeKind::Root { children, .. } => children,
            _ => Vec::new(),
        }
    }

    /// Cross out the range `[start, end)` of the original buffer into `raw`.
    pub(crate) fn cross_out(raw: &mut Vec<char>, start: usize, end: usize) {
        raw.extend(std::iter::repeat(CROSSED_OUT).take(end - start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_expires_once_and_stays_expired() {
        let clock = ParseClock::new(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(2));
        assert!(clock.expired());
        assert!(clock.expired());
    }

    #[test]
    fn generous_clock_does_not_expire() {
        let clock = ParseClock::new(Duration::from_secs(60));
        assert!(!clock.expired());
    }

    #[test]
    fn empty_input_parses_to_empty_root() {
        let plugins = Plugins::default();
        let root = parse_document(
            "",
            Extensions::empty(),
            Duration::from_secs(2),
            &plugins,
        )
        .unwrap();
        assert!(root.children().is_empty());
        assert_eq!(root.start, 0);
        assert_eq!(root.end, 0);
    }
}
