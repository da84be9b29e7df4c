//! The document tree.
//!
//! Every node carries the `[start, end]` char range it was parsed from,
//! referencing the *original* input even for nodes produced by recursive
//! sub-parses (block quotes, list items). The two bulk index operations,
//! [`Node::shift_indices`] and [`Node::remap_indices`], are what keep that
//! property true across sub-parse splicing.

use serde::{Deserialize, Serialize};

/// Column alignment for table cells, derived from the divider row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    None,
    Left,
    Right,
    Center,
}

/// The flavor of a smart-quoted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteKind {
    Single,
    Double,
    DoubleAngle,
}

/// The reference key of a `[text][key]` style link.
///
/// `Dummy` marks the empty-bracket form `[text][]` when
/// [`crate::Extensions::DUMMY_REFERENCE_KEY`] is enabled, so the AST can tell
/// it apart from a bare `[text]` (which has no key at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKey {
    Dummy,
    Label(Box<Node>),
}

/// A heading recorded for `[TOC]` rendering, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocHeading {
    pub level: u8,
    /// Start index of the heading node; the serializer keys its anchor-id
    /// map by this.
    pub start: usize,
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
}

/// The tagged node variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Document root. The three side tables are populated by the outermost
    /// parse only; sub-parse roots are thrown away after splicing.
    Root {
        children: Vec<Node>,
        references: Vec<Node>,
        abbreviations: Vec<Node>,
        footnotes: Vec<Node>,
    },
    Para {
        children: Vec<Node>,
    },
    BlockQuote {
        children: Vec<Node>,
    },
    /// Indented or fenced code block; `language` comes from the fence info
    /// string and selects the verbatim serializer.
    Verbatim {
        text: String,
        language: Option<String>,
    },
    HtmlBlock {
        text: String,
    },
    InlineHtml {
        text: String,
    },
    Heading {
        level: u8,
        is_toc: bool,
        is_setext: bool,
        children: Vec<Node>,
    },
    BulletList {
        children: Vec<Node>,
    },
    OrderedList {
        children: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    TaskListItem {
        done: bool,
        marker: String,
        children: Vec<Node>,
    },
    DefinitionList {
        children: Vec<Node>,
    },
    DefinitionTerm {
        children: Vec<Node>,
    },
    Definition {
        children: Vec<Node>,
    },
    Table {
        /// The column nodes parsed from the divider row; consulted per cell
        /// during serialization, not rendered themselves.
        columns: Vec<Node>,
        children: Vec<Node>,
    },
    TableHeader {
        children: Vec<Node>,
    },
    TableBody {
        children: Vec<Node>,
    },
    TableRow {
        children: Vec<Node>,
    },
    TableCell {
        col_span: usize,
        children: Vec<Node>,
    },
    TableColumn {
        alignment: Alignment,
    },
    TableCaption {
        children: Vec<Node>,
    },
    HorizontalRule,
    LineBreak,
    Ellipsis,
    Emdash,
    Endash,
    Apostrophe,
    Nbsp,
    /// Ordinary text. Adjacent Text siblings are coalesced on insertion and
    /// printed without HTML encoding.
    Text {
        text: String,
    },
    /// Escape-origin text; never coalesces with Text and is HTML-encoded on
    /// emit.
    SpecialText {
        text: String,
    },
    /// Emphasis or strong span. `closed == false` means the closing
    /// delimiter was never found; the serializer then prints `chars`
    /// literally followed by the children.
    StrongEmph {
        chars: String,
        strong: bool,
        closed: bool,
        children: Vec<Node>,
    },
    Strike {
        closed: bool,
        children: Vec<Node>,
    },
    Quoted {
        quote: QuoteKind,
        children: Vec<Node>,
    },
    Code {
        text: String,
    },
    AutoLink {
        url: String,
    },
    MailLink {
        address: String,
    },
    AnchorLink {
        name: String,
        text: String,
    },
    WikiLink {
        text: String,
    },
    ExpLink {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    ExpImage {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    RefLink {
        reference_key: Option<ReferenceKey>,
        separator: Option<String>,
        children: Vec<Node>,
    },
    RefImage {
        reference_key: Option<ReferenceKey>,
        separator: Option<String>,
        children: Vec<Node>,
    },
    FootnoteDef {
        label: String,
        body: Box<Node>,
    },
    FootnoteRef {
        label: String,
    },
    /// Reference definition; `children` hold the label inlines.
    Reference {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    /// Abbreviation definition; `children` hold the label inlines.
    Abbreviation {
        expansion: Box<Node>,
        children: Vec<Node>,
    },
    Toc {
        level: u8,
        headings: Vec<TocHeading>,
    },
    /// Transparent inline sequence; renders as its children.
    Container {
        children: Vec<Node>,
    },
    /// Plugin-produced node; only serializer plugins know how to emit it.
    Custom {
        name: String,
        text: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        Node { kind, start, end }
    }

    pub fn text(text: impl Into<String>, start: usize, end: usize) -> Self {
        Node::new(NodeKind::Text { text: text.into() }, start, end)
    }

    pub fn special_text(text: impl Into<String>, start: usize, end: usize) -> Self {
        Node::new(NodeKind::SpecialText { text: text.into() }, start, end)
    }

    pub fn container(children: Vec<Node>, start: usize, end: usize) -> Self {
        Node::new(NodeKind::Container { children }, start, end)
    }

    /// The ordered child sequence; empty for leaf kinds.
    pub fn children(&self) -> &[Node] {
        self.children_vec().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether this kind carries a child sequence at all (even an empty
    /// one). Leaf kinds like Text do not.
    pub(crate) fn has_child_slot(&self) -> bool {
        self.children_vec().is_some()
    }

    /// Mutable access to the child sequence, when this kind has one.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.children_vec_mut()
    }

    fn children_vec(&self) -> Option<&Vec<Node>> {
        use NodeKind::*;
        match &self.kind {
            Root { children, .. }
            | Para { children }
            | BlockQuote { children }
            | Heading { children, .. }
            | BulletList { children }
            | OrderedList { children }
            | ListItem { children }
            | TaskListItem { children, .. }
            | DefinitionList { children }
            | DefinitionTerm { children }
            | Definition { children }
            | Table { children, .. }
            | TableHeader { children }
            | TableBody { children }
            | TableRow { children }
            | TableCell { children, .. }
            | TableCaption { children }
            | StrongEmph { children, .. }
            | Strike { children, .. }
            | Quoted { children, .. }
            | ExpLink { children, .. }
            | ExpImage { children, .. }
            | RefLink { children, .. }
            | RefImage { children, .. }
            | Reference { children, .. }
            | Abbreviation { children, .. }
            | Container { children }
            | Custom { children, .. } => Some(children),
            Verbatim { .. } | HtmlBlock { .. } | InlineHtml { .. } | TableColumn { .. }
            | HorizontalRule | LineBreak | Ellipsis | Emdash | Endash | Apostrophe | Nbsp
            | Text { .. } | SpecialText { .. } | Code { .. } | AutoLink { .. }
            | MailLink { .. } | AnchorLink { .. } | WikiLink { .. } | FootnoteDef { .. }
            | FootnoteRef { .. } | Toc { .. } => None,
        }
    }

    fn children_vec_mut(&mut self) -> Option<&mut Vec<Node>> {
        use NodeKind::*;
        match &mut self.kind {
            Root { children, .. }
            | Para { children }
            | BlockQuote { children }
            | Heading { children, .. }
            | BulletList { children }
            | OrderedList { children }
            | ListItem { children }
            | TaskListItem { children, .. }
            | DefinitionList { children }
            | DefinitionTerm { children }
            | Definition { children }
            | Table { children, .. }
            | TableHeader { children }
            | TableBody { children }
            | TableRow { children }
            | TableCell { children, .. }
            | TableCaption { children }
            | StrongEmph { children, .. }
            | Strike { children, .. }
            | Quoted { children, .. }
            | ExpLink { children, .. }
            | ExpImage { children, .. }
            | RefLink { children, .. }
            | RefImage { children, .. }
            | Reference { children, .. }
            | Abbreviation { children, .. }
            | Container { children }
            | Custom { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Nodes embedded outside the child sequence that still carry source
    /// indices: reference keys, footnote bodies, abbreviation expansions,
    /// table columns. Index operations must reach them too.
    fn embedded_mut(&mut self) -> Vec<&mut Node> {
        use NodeKind::*;
        match &mut self.kind {
            RefLink { reference_key, .. } | RefImage { reference_key, .. } => {
                match reference_key {
                    Some(ReferenceKey::Label(key)) => vec![key.as_mut()],
                    _ => Vec::new(),
                }
            }
            FootnoteDef { body, .. } => vec![body.as_mut()],
            Abbreviation { expansion, .. } => vec![expansion.as_mut()],
            Table { columns, .. } => columns.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    fn apply_to_indices(&mut self, f: &mut impl FnMut(usize) -> usize) {
        self.start = f(self.start);
        self.end = f(self.end);
        for embedded in self.embedded_mut() {
            embedded.apply_to_indices(f);
        }
        if let Some(children) = self.children_vec_mut() {
            for child in children {
                child.apply_to_indices(f);
            }
        }
    }

    /// Add `delta` to every index in the subtree.
    pub fn shift_indices(&mut self, delta: usize) {
        if delta == 0 {
            return;
        }
        self.apply_to_indices(&mut |i| i + delta);
    }

    /// Replace every index `i` with `map[i]`. The map is produced by the
    /// sub-parse driver's sentinel compaction pass.
    pub fn remap_indices(&mut self, map: &[usize]) {
        self.apply_to_indices(&mut |i| map[i]);
    }

    /// Clamp every index to `max`. The parser works on a buffer with
    /// phantom trailing newlines; clamping afterwards restores the
    /// `end <= |source|` invariant.
    pub(crate) fn clamp_indices(&mut self, max: usize) {
        self.apply_to_indices(&mut |i| i.min(max));
    }

    /// Depth-first walk over this node, its embedded nodes and children.
    pub fn walk<'n>(&'n self, f: &mut impl FnMut(&'n Node)) {
        f(self);
        use NodeKind::*;
        match &self.kind {
            RefLink { reference_key, .. } | RefImage { reference_key, .. } => {
                if let Some(ReferenceKey::Label(key)) = reference_key {
                    key.walk(f);
                }
            }
            FootnoteDef { body, .. } => body.walk(f),
            Abbreviation { expansion, .. } => expansion.walk(f),
            Table { columns, .. } => {
                for column in columns {
                    column.walk(f);
                }
            }
            _ => {}
        }
        for child in self.children() {
            child.walk(f);
        }
    }
}

/// The extended anchor derivation: letters and digits are kept lowercased,
/// runs of anything else collapse to a single `-`.
pub fn anchor_name(text: &str) -> String {
    let mut name = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            name.extend(c.to_lowercase());
        } else if !name.is_empty() && !name.ends_with('-') {
            name.push('-');
        }
    }
    name
}

/// The plain anchor derivation: the first contiguous run of alphanumerics
/// and spaces, with its words joined by single spaces. Case is preserved;
/// nothing is substituted.
pub fn plain_anchor_name(text: &str) -> String {
    let range: String = text
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    range.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `child` to `children`, coalescing adjacent Text nodes the way the
/// parser's add-as-child action does. SpecialText never merges.
pub(crate) fn push_coalescing(children: &mut Vec<Node>, child: Node) {
    if let NodeKind::Text { text } = &child.kind {
        if let Some(last) = children.last_mut() {
            if let NodeKind::Text { text: last_text } = &mut last.kind {
                last_text.push_str(text);
                last.end = child.end;
                return;
            }
        }
    }
    children.push(child);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para_with_text(text: &str, start: usize, end: usize) -> Node {
        Node::new(
            NodeKind::Para {
                children: vec![Node::text(text, start, end)],
            },
            start,
            end,
        )
    }

    #[test]
    fn shift_moves_every_index_in_the_subtree() {
        let mut node = para_with_text("ab", 0, 2);
        node.shift_indices(5);
        assert_eq!(node.start, 5);
        assert_eq!(node.end, 7);
        assert_eq!(node.children()[0].start, 5);
        assert_eq!(node.children()[0].end, 7);
    }

    #[test]
    fn remap_follows_the_compaction_map() {
        // compacted indices 0..=2 map back to raw positions 3, 5, 6
        let map = vec![3, 5, 6];
        let mut node = para_with_text("ab", 0, 2);
        node.remap_indices(&map);
        assert_eq!(node.start, 3);
        assert_eq!(node.end, 6);
    }

    #[test]
    fn shift_reaches_reference_keys() {
        let key = Node::container(vec![Node::text("k", 1, 2)], 1, 2);
        let mut link = Node::new(
            NodeKind::RefLink {
                reference_key: Some(ReferenceKey::Label(Box::new(key))),
                separator: None,
                children: vec![Node::text("t", 0, 1)],
            },
            0,
            2,
        );
        link.shift_indices(10);
        match &link.kind {
            NodeKind::RefLink {
                reference_key: Some(ReferenceKey::Label(key)),
                ..
            } => {
                assert_eq!(key.start, 11);
                assert_eq!(key.end, 12);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn dummy_reference_key_carries_no_indices() {
        let mut link = Node::new(
            NodeKind::RefLink {
                reference_key: Some(ReferenceKey::Dummy),
                separator: Some(String::new()),
                children: vec![Node::text("t", 0, 1)],
            },
            0,
            3,
        );
        link.shift_indices(4);
        assert_eq!(link.start, 4);
    }

    #[test]
    fn adjacent_text_children_coalesce() {
        let mut children = Vec::new();
        push_coalescing(&mut children, Node::text("foo", 0, 3));
        push_coalescing(&mut children, Node::text("bar", 3, 6));
        assert_eq!(children.len(), 1);
        assert_eq!(
            children[0].kind,
            NodeKind::Text {
                text: "foobar".into()
            }
        );
        assert_eq!(children[0].end, 6);
    }

    #[test]
    fn special_text_never_coalesces() {
        let mut children = Vec::new();
        push_coalescing(&mut children, Node::text("foo", 0, 3));
        push_coalescing(&mut children, Node::special_text("*", 3, 4));
        push_coalescing(&mut children, Node::text("bar", 4, 7));
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn anchor_derivations_differ() {
        assert_eq!(anchor_name("My Title!"), "my-title-");
        assert_eq!(plain_anchor_name("My Title!"), "My Title");
        assert_eq!(plain_anchor_name("My  Title, more"), "My Title");
        assert_eq!(plain_anchor_name("!leading"), "");
    }

    #[test]
    fn walk_visits_embedded_and_children() {
        let key = Node::container(vec![], 1, 2);
        let link = Node::new(
            NodeKind::RefLink {
                reference_key: Some(ReferenceKey::Label(Box::new(key))),
                separator: None,
                children: vec![Node::text("t", 0, 1)],
            },
            0,
            2,
        );
        let mut count = 0;
        link.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
    }
}
