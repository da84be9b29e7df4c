//! The tree-to-HTML serializer.
//!
//! A depth-first pass with an exhaustive match over the node kinds. Before
//! any HTML is emitted, a one-pass id visitor assigns every heading its
//! anchor id, so heading emission and `[TOC]` emission agree no matter
//! where the marker sits. Reference resolution, abbreviation expansion and
//! footnote numbering all happen here, not in the parser.

pub mod attributes;
pub mod printer;

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::ast::{plain_anchor_name, Alignment, Node, NodeKind, QuoteKind, ReferenceKey, TocHeading};
use crate::links::{LinkRenderer, Rendering};
use crate::plugins::Plugins;
use crate::verbatim::VerbatimSerializerMap;
use attributes::Attributes;
use printer::Printer;

/// Computes the final anchor id of a heading.
///
/// Receives the heading node, its parse-time anchor child (if any) and the
/// collected heading text. Returning an empty string means "no id": the
/// anchor child is stripped and the heading renders bare.
pub trait HeaderIdComputer {
    fn compute(&self, heading: &Node, anchor: Option<&Node>, text: &str) -> String;
}

/// Uses the parse-time anchor name when present — the anchor already
/// carries the derivation of whichever anchor extension produced it.
/// Headings without an anchor fall back to the plain range rule.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHeaderIdComputer;

impl HeaderIdComputer for DefaultHeaderIdComputer {
    fn compute(&self, _heading: &Node, anchor: Option<&Node>, text: &str) -> String {
        if let Some(anchor) = anchor {
            if let NodeKind::AnchorLink { name, .. } = &anchor.kind {
                return name.clone();
            }
        }
        plain_anchor_name(text)
    }
}

struct TableState {
    alignments: Vec<Alignment>,
    column: usize,
    in_header: bool,
}

/// Serializes one AST into an HTML fragment. One instance per document;
/// the transient maps below are filled during the pass.
pub struct HtmlSerializer<'s> {
    printer: Printer,
    link_renderer: &'s dyn LinkRenderer,
    verbatim: &'s VerbatimSerializerMap,
    plugins: &'s Plugins,
    header_id_computer: &'s dyn HeaderIdComputer,
    /// Normalized reference label → (url, title).
    references: HashMap<String, (String, String)>,
    /// Abbreviation text → rendered expansion HTML.
    abbreviations: Vec<(String, String)>,
    /// Footnote label → number, in first-reference order.
    referenced_footnotes: Vec<(String, usize)>,
    /// Heading start index → anchor id, precomputed before emission.
    header_ids: HashMap<usize, String>,
    header_texts: HashMap<usize, String>,
    table: Option<TableState>,
}

impl<'s> HtmlSerializer<'s> {
    pub fn new(
        link_renderer: &'s dyn LinkRenderer,
        verbatim: &'s VerbatimSerializerMap,
        plugins: &'s Plugins,
        header_id_computer: &'s dyn HeaderIdComputer,
    ) -> Self {
        HtmlSerializer {
            printer: Printer::new(),
            link_renderer,
            verbatim,
            plugins,
            header_id_computer,
            references: HashMap::new(),
            abbreviations: Vec::new(),
            referenced_footnotes: Vec::new(),
            header_ids: HashMap::new(),
            header_texts: HashMap::new(),
            table: None,
        }
    }

    pub fn to_html(&mut self, root: &Node) -> String {
        self.compute_header_ids(root);
        self.visit(root);
        let html = std::mem::take(&mut self.printer).take();
        debug!(bytes = html.len(), "serialized document");
        html
    }

    /// Heading ids are fixed before emission so `[TOC]` links and heading
    /// anchors always agree.
    fn compute_header_ids(&mut self, root: &Node) {
        let mut headings: Vec<&Node> = Vec::new();
        root.walk(&mut |node| {
            if matches!(node.kind, NodeKind::Heading { .. }) {
                headings.push(node);
            }
        });
        for heading in headings {
            let children = heading.children();
            let anchor = children
                .first()
                .filter(|c| matches!(c.kind, NodeKind::AnchorLink { .. }));
            let mut text = String::new();
            collect_heading_text(children, &mut text);
            if text.is_empty() {
                if let Some(anchor) = anchor {
                    if let NodeKind::AnchorLink { text: anchor_text, .. } = &anchor.kind {
                        text = anchor_text.clone();
                    }
                }
            }
            let id = self.header_id_computer.compute(heading, anchor, &text);
            self.header_ids.insert(heading.start, id);
            self.header_texts.insert(heading.start, text);
        }
    }

    fn visit(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Root {
                children,
                references,
                abbreviations,
                footnotes,
            } => {
                self.enter_root(references, abbreviations);
                for child in children {
                    self.visit(child);
                }
                self.print_footnotes(footnotes);
            }
            NodeKind::Para { .. } => self.print_break_before_tag(node, "p"),
            NodeKind::BlockQuote { .. } => self.print_indented_tag(node, "blockquote"),
            NodeKind::Verbatim { text, language } => {
                self.verbatim
                    .lookup(language.as_deref())
                    .serialize(text, language.as_deref(), &mut self.printer);
            }
            NodeKind::HtmlBlock { text } => {
                if !text.is_empty() {
                    self.printer.println();
                }
                self.printer.print(text);
            }
            NodeKind::InlineHtml { text } => {
                self.printer.print(text);
            }
            NodeKind::Heading {
                level, children, ..
            } => self.print_heading(node, *level, children),
            NodeKind::BulletList { .. } => self.print_indented_tag(node, "ul"),
            NodeKind::OrderedList { .. } => self.print_indented_tag(node, "ol"),
            NodeKind::ListItem { .. } => self.print_conditionally_indented_tag(node, "li"),
            NodeKind::TaskListItem { done, children, .. } => {
                self.print_task_list_item(*done, children)
            }
            NodeKind::DefinitionList { .. } => self.print_indented_tag(node, "dl"),
            NodeKind::DefinitionTerm { .. } => self.print_conditionally_indented_tag(node, "dt"),
            NodeKind::Definition { .. } => self.print_conditionally_indented_tag(node, "dd"),
            NodeKind::Table { columns, children } => {
                let alignments = columns
                    .iter()
                    .map(|column| match column.kind {
                        NodeKind::TableColumn { alignment } => alignment,
                        _ => Alignment::None,
                    })
                    .collect();
                let prior = self.table.replace(TableState {
                    alignments,
                    column: 0,
                    in_header: false,
                });
                self.printer.println();
                self.printer.print("<table>");
                self.printer.indent(2);
                for child in children {
                    self.visit(child);
                }
                self.printer.indent(-2);
                self.printer.println();
                self.printer.print("</table>");
                self.table = prior;
            }
            NodeKind::TableHeader { .. } => {
                if let Some(state) = &mut self.table {
                    state.in_header = true;
                }
                self.print_indented_tag(node, "thead");
                if let Some(state) = &mut self.table {
                    state.in_header = false;
                }
            }
            NodeKind::TableBody { .. } => self.print_indented_tag(node, "tbody"),
            NodeKind::TableRow { .. } => {
                if let Some(state) = &mut self.table {
                    state.column = 0;
                }
                self.print_indented_tag(node, "tr");
            }
            NodeKind::TableCell { col_span, children } => {
                self.print_table_cell(*col_span, children)
            }
            NodeKind::TableColumn { alignment } => self.print_alignment(*alignment),
            NodeKind::TableCaption { .. } => {
                self.printer.println();
                self.printer.print("<caption>");
                self.visit_children(node);
                self.printer.print("</caption>");
            }
            NodeKind::HorizontalRule => {
                self.printer.println();
                self.printer.print("<hr/>");
            }
            NodeKind::LineBreak => {
                self.printer.print("<br/>");
            }
            NodeKind::Ellipsis => {
                self.printer.print("&hellip;");
            }
            NodeKind::Emdash => {
                self.printer.print("&mdash;");
            }
            NodeKind::Endash => {
                self.printer.print("&ndash;");
            }
            NodeKind::Apostrophe => {
                self.printer.print("&rsquo;");
            }
            NodeKind::Nbsp => {
                self.printer.print("&nbsp;");
            }
            NodeKind::Text { text } => {
                if self.abbreviations.is_empty() {
                    self.printer.print(text);
                } else {
                    self.print_with_abbreviations(text);
                }
            }
            NodeKind::SpecialText { text } => {
                self.printer.print_encoded(text);
            }
            NodeKind::StrongEmph {
                chars,
                strong,
                closed,
                ..
            } => {
                if *closed {
                    let tag = if *strong { "strong" } else { "em" };
                    self.print_tag(node, tag);
                } else {
                    // unclosed: the opening delimiter is plain text
                    self.printer.print(chars);
                    self.visit_children(node);
                }
            }
            NodeKind::Strike { .. } => self.print_tag(node, "del"),
            NodeKind::Quoted { quote, .. } => {
                let (open, close) = match quote {
                    QuoteKind::Single => ("&lsquo;", "&rsquo;"),
                    QuoteKind::Double => ("&ldquo;", "&rdquo;"),
                    QuoteKind::DoubleAngle => ("&laquo;", "&raquo;"),
                };
                self.printer.print(open);
                self.visit_children(node);
                self.printer.print(close);
            }
            NodeKind::Code { text } => {
                self.printer.print("<code>");
                self.printer.print_encoded(text);
                self.printer.print("</code>");
            }
            NodeKind::AutoLink { url } => {
                let rendering = self.link_renderer.auto_link(node, url);
                self.print_link(&rendering);
            }
            NodeKind::MailLink { address } => {
                let rendering = self.link_renderer.mail_link(node, address);
                self.print_link(&rendering);
            }
            NodeKind::AnchorLink { name, text } => {
                let rendering = self.link_renderer.anchor_link(node, name, text);
                self.print_link(&rendering);
            }
            NodeKind::WikiLink { text } => {
                let rendering = self.link_renderer.wiki_link(node, text);
                self.print_link(&rendering);
            }
            NodeKind::ExpLink { url, title, .. } => {
                let text = self.print_children_to_string(node);
                let rendering = self.link_renderer.explicit_link(node, url, title, &text);
                self.print_link(&rendering);
            }
            NodeKind::ExpImage { url, title, .. } => {
                let alt = self.print_children_to_string(node);
                let rendering = self.link_renderer.image(node, url, title, &alt);
                self.print_image(&rendering);
            }
            NodeKind::RefLink {
                reference_key,
                separator,
                ..
            } => self.print_ref_link(node, reference_key, separator, false),
            NodeKind::RefImage {
                reference_key,
                separator,
                ..
            } => self.print_ref_link(node, reference_key, separator, true),
            NodeKind::FootnoteDef { .. } => {
                // rendered collectively at the bottom of the page
            }
            NodeKind::FootnoteRef { label } => self.print_footnote_ref(label),
            NodeKind::Reference { .. } | NodeKind::Abbreviation { .. } => {
                // definitions render nothing where they stand
            }
            NodeKind::Toc { level, headings } => self.print_toc(*level, headings),
            NodeKind::Container { .. } => self.visit_children(node),
            NodeKind::Custom { name, .. } => {
                let plugins = self.plugins;
                for plugin in plugins.serializer_plugins() {
                    if plugin.visit(node, &mut self.printer) {
                        return;
                    }
                }
                panic!("no serializer plugin accepted custom node kind '{name}'");
            }
        }
    }

    fn visit_children(&mut self, node: &Node) {
        for child in node.children() {
            self.visit(child);
        }
    }

    /// Build the reference and abbreviation tables before any output.
    fn enter_root(&mut self, references: &[Node], abbreviations: &[Node]) {
        for reference in references {
            if let NodeKind::Reference { url, title, .. } = &reference.kind {
                let label = self.print_children_to_string(reference);
                self.references
                    .insert(normalize(&label), (url.clone(), title.clone()));
            }
        }
        for abbreviation in abbreviations {
            if let NodeKind::Abbreviation { expansion, .. } = &abbreviation.kind {
                let label = self.print_children_to_string(abbreviation);
                let expansion_html = self.print_node_to_string(expansion);
                self.abbreviations.push((label, expansion_html));
            }
        }
    }

    //************* HEADINGS & TOC ****************

    fn print_heading(&mut self, node: &Node, level: u8, children: &[Node]) {
        let tag = format!("h{level}");
        let start_was_new_line = self.printer.ends_with_new_line();
        self.printer.println();
        self.printer.print_char('<').print(&tag).print_char('>');

        let id = self.header_ids.get(&node.start).cloned();
        let mut rest = children;
        if let Some(first) = children.first() {
            if let NodeKind::AnchorLink { name, text } = &first.kind {
                match id.as_deref() {
                    // an empty id strips the anchor entirely
                    Some("") => rest = &children[1..],
                    Some(custom) if custom != name => {
                        let rendering = self.link_renderer.anchor_link(first, custom, text);
                        self.print_link(&rendering);
                        rest = &children[1..];
                    }
                    _ => {}
                }
            }
        }
        for child in rest {
            self.visit(child);
        }
        self.printer.print("</").print(&tag).print_char('>');
        if start_was_new_line {
            self.printer.println();
        }
    }

    fn print_toc(&mut self, level: u8, headings: &[TocHeading]) {
        let entries: Vec<&TocHeading> = headings.iter().filter(|h| h.level <= level).collect();
        if entries.is_empty() {
            return;
        }
        self.printer.println();
        let mut open: Vec<u8> = Vec::new();
        for entry in entries {
            if open.is_empty() {
                self.printer.print("<ul class=\"toc\">");
                open.push(entry.level);
            } else {
                while open.len() > 1 && entry.level < *open.last().unwrap_or(&0) {
                    self.printer.print("</ul>");
                    open.pop();
                }
                if entry.level > *open.last().unwrap_or(&0) {
                    self.printer.print("<ul>");
                    open.push(entry.level);
                }
            }
            let id = self.header_ids.get(&entry.start).cloned().unwrap_or_default();
            let text = self
                .header_texts
                .get(&entry.start)
                .cloned()
                .unwrap_or_default();
            self.printer.print("<li><a href=\"#");
            self.printer.print(&id);
            self.printer.print("\">");
            self.printer.print_encoded(text.trim());
            self.printer.print("</a></li>");
        }
        while open.pop().is_some() {
            self.printer.print("</ul>");
        }
    }

    //************* LINK-LIKE NODES ****************

    fn print_ref_link(
        &mut self,
        node: &Node,
        reference_key: &Option<ReferenceKey>,
        separator: &Option<String>,
        image: bool,
    ) {
        let text = self.print_children_to_string(node);
        let key = match reference_key {
            Some(ReferenceKey::Label(key)) => self.print_node_to_string(key),
            Some(ReferenceKey::Dummy) => String::new(),
            None => text.clone(),
        };
        match self.references.get(&normalize(&key)).cloned() {
            Some((url, title)) => {
                let rendering = if image {
                    self.link_renderer.reference_image(node, &url, &title, &text)
                } else {
                    self.link_renderer.reference_link(node, &url, &title, &text)
                };
                if image {
                    self.print_image(&rendering);
                } else {
                    self.print_link(&rendering);
                }
            }
            None => {
                // unresolved: print the source form back
                warn!(key = %key, "unresolved reference link");
                if image {
                    self.printer.print("![");
                } else {
                    self.printer.print_char('[');
                }
                self.printer.print(&text);
                self.printer.print_char(']');
                if let Some(separator) = separator {
                    self.printer.print(separator);
                    self.printer.print_char('[');
                    if reference_key.is_some() {
                        self.printer.print(&key);
                    }
                    self.printer.print_char(']');
                }
            }
        }
    }

    fn print_link(&mut self, rendering: &Rendering) {
        let mut attributes = Attributes::new();
        if !rendering.href.is_empty() {
            attributes.add("href", &rendering.href);
        }
        for attribute in &rendering.attributes {
            attributes.add(&attribute.name, &attribute.value);
        }
        self.printer.print("<a");
        attributes.print(&mut self.printer);
        self.printer.print_char('>');
        self.printer.print(&rendering.text);
        self.printer.print("</a>");
    }

    fn print_image(&mut self, rendering: &Rendering) {
        let mut attributes = Attributes::new();
        attributes.add("src", &rendering.href);
        if !rendering.text.is_empty() {
            attributes.add("alt", &rendering.text);
        }
        for attribute in &rendering.attributes {
            attributes.add(&attribute.name, &attribute.value);
        }
        self.printer.print("<img");
        attributes.print(&mut self.printer);
        self.printer.print(" />");
    }

    fn print_attribute(&mut self, name: &str, value: &str) {
        self.printer
            .print_char(' ')
            .print(name)
            .print("=\"")
            .print(value)
            .print_char('"');
    }

    //************* FOOTNOTES ****************

    fn print_footnote_ref(&mut self, label: &str) {
        let existing = self
            .referenced_footnotes
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, number)| *number);
        let number = match existing {
            Some(number) => number,
            None => {
                let number = self.referenced_footnotes.len() + 1;
                self.referenced_footnotes.push((label.to_string(), number));
                number
            }
        };
        self.printer.print(&format!(
            "<sup id=\"fnref-{number}\"><a href=\"#fn-{number}\" class=\"footnote-ref\">{number}</a></sup>"
        ));
    }

    /// Emit the footnotes block: one `<li>` per referenced footnote, in
    /// numeric order. Unreferenced definitions are dropped; references
    /// without a definition get an empty entry.
    fn print_footnotes(&mut self, definitions: &[Node]) {
        if self.referenced_footnotes.is_empty() {
            return;
        }
        let mut bodies: HashMap<&str, &Node> = HashMap::new();
        for definition in definitions {
            if let NodeKind::FootnoteDef { label, body } = &definition.kind {
                bodies.insert(label.as_str(), body);
            }
        }
        self.printer.print("<div class=\"footnotes\">\n");
        self.printer.print("<hr/>\n");
        self.printer.print("<ol>\n");
        // rendering a body may reference further footnotes, growing the list
        let mut i = 0;
        while i < self.referenced_footnotes.len() {
            let (label, number) = self.referenced_footnotes[i].clone();
            match bodies.get(label.as_str()) {
                None => {
                    self.printer.print(&format!(
                        "<li id=\"fn-{number}\"><p><a href=\"#fnref-{number}\" class=\"footnote-backref\">&#8617;</a></p></li>\n"
                    ));
                }
                Some(body) => {
                    self.printer.print(&format!("<li id=\"fn-{number}\"><p>"));
                    self.visit_children(body);
                    self.printer.print(&format!(
                        "<a href=\"#fnref-{number}\" class=\"footnote-backref\">&#8617;</a></p>"
                    ));
                    self.printer.print("</li>\n");
                }
            }
            i += 1;
        }
        self.printer.print("</ol>\n");
        self.printer.print("</div>\n");
    }

    //************* TABLES ****************

    fn print_table_cell(&mut self, col_span: usize, children: &[Node]) {
        let (tag, alignment) = match &self.table {
            Some(state) => {
                let tag = if state.in_header { "th" } else { "td" };
                let index = state.column.min(state.alignments.len().saturating_sub(1));
                let alignment = state
                    .alignments
                    .get(index)
                    .copied()
                    .unwrap_or(Alignment::None);
                (tag, alignment)
            }
            None => ("td", Alignment::None),
        };
        self.printer.println();
        self.printer.print_char('<').print(tag);
        self.print_alignment(alignment);
        if col_span > 1 {
            self.print_attribute("colspan", &col_span.to_string());
        }
        self.printer.print_char('>');
        for child in children {
            self.visit(child);
        }
        self.printer.print("</").print(tag).print_char('>');
        if let Some(state) = &mut self.table {
            state.column += col_span;
        }
    }

    fn print_alignment(&mut self, alignment: Alignment) {
        match alignment {
            Alignment::None => {}
            Alignment::Left => {
                self.printer.print(" align=\"left\"");
            }
            Alignment::Right => {
                self.printer.print(" align=\"right\"");
            }
            Alignment::Center => {
                self.printer.print(" align=\"center\"");
            }
        }
    }

    //************* LIST ITEMS ****************

    fn print_task_list_item(&mut self, done: bool, children: &[Node]) {
        let first_is_para = matches!(
            children.first().map(|c| &c.kind),
            Some(NodeKind::Para { .. })
        );
        let indent = if children.len() > 1 { 2 } else { 0 };
        let start_was_new_line = self.printer.ends_with_new_line();
        let checkbox = format!(
            "<input type=\"checkbox\" class=\"task-list-item-checkbox\"{} disabled=\"disabled\"></input>",
            if done { " checked=\"checked\"" } else { "" }
        );

        self.printer.println();
        self.printer.print("<li class=\"task-list-item\">");
        self.printer.indent(indent);
        if first_is_para {
            self.printer.println();
            self.printer.print("<p>");
            self.printer.print(&checkbox);
            if let Some(first) = children.first() {
                self.visit_children(first);
            }
            for child in children.iter().skip(1) {
                self.visit(child);
            }
            self.printer.print("</p>");
        } else {
            self.printer.print(&checkbox);
            for child in children {
                self.visit(child);
            }
        }
        self.printer.indent(-indent);
        self.printer.chk_println(indent != 0);
        self.printer.print("</li>");
        self.printer.chk_println(start_was_new_line);
    }

    //************* ABBREVIATIONS ****************

    /// Scan a text run for whole-word abbreviation occurrences; matched
    /// words are wrapped in `<abbr title="…">`.
    fn print_with_abbreviations(&mut self, text: &str) {
        let mut expansions: BTreeMap<usize, (String, String)> = BTreeMap::new();
        for (abbr, expansion) in &self.abbreviations {
            if abbr.is_empty() {
                continue;
            }
            let mut ix = 0;
            while let Some(found) = text[ix..].find(abbr.as_str()) {
                let sx = ix + found;
                ix = sx + abbr.len();
                let before_ok = text[..sx]
                    .chars()
                    .next_back()
                    .map_or(true, |c| !c.is_alphanumeric());
                let after_ok = text[ix..]
                    .chars()
                    .next()
                    .map_or(true, |c| !c.is_alphanumeric());
                if before_ok && after_ok {
                    expansions.insert(sx, (abbr.clone(), expansion.clone()));
                }
            }
        }
        if expansions.is_empty() {
            self.printer.print(text);
            return;
        }
        let mut ix = 0;
        for (sx, (abbr, expansion)) in &expansions {
            if *sx < ix {
                continue;
            }
            self.printer.print_encoded(&text[ix..*sx]);
            self.printer.print("<abbr");
            if !expansion.is_empty() {
                self.printer.print(" title=\"");
                self.printer.print_encoded(expansion);
                self.printer.print_char('"');
            }
            self.printer.print_char('>');
            self.printer.print_encoded(abbr);
            self.printer.print("</abbr>");
            ix = sx + abbr.len();
        }
        self.printer.print(&text[ix..]);
    }

    //************* TAG HELPERS ****************

    fn print_tag(&mut self, node: &Node, tag: &str) {
        self.printer.print_char('<').print(tag).print_char('>');
        self.visit_children(node);
        self.printer.print("</").print(tag).print_char('>');
    }

    fn print_break_before_tag(&mut self, node: &Node, tag: &str) {
        let start_was_new_line = self.printer.ends_with_new_line();
        self.printer.println();
        self.print_tag(node, tag);
        if start_was_new_line {
            self.printer.println();
        }
    }

    fn print_indented_tag(&mut self, node: &Node, tag: &str) {
        self.printer.println();
        self.printer.print_char('<').print(tag).print_char('>');
        self.printer.indent(2);
        self.visit_children(node);
        self.printer.indent(-2);
        self.printer.println();
        self.printer.print("</").print(tag).print_char('>');
    }

    /// List items and definition terms/descriptions collapse to one line
    /// when they hold a single child.
    fn print_conditionally_indented_tag(&mut self, node: &Node, tag: &str) {
        if node.children().len() > 1 {
            self.print_indented_tag(node, tag);
        } else {
            let start_was_new_line = self.printer.ends_with_new_line();
            self.printer.println();
            self.print_tag(node, tag);
            self.printer.chk_println(start_was_new_line);
        }
    }

    /// Render a node's children into a fresh buffer, e.g. for link text
    /// and reference keys.
    fn print_children_to_string(&mut self, node: &Node) -> String {
        let prior = std::mem::take(&mut self.printer);
        self.visit_children(node);
        std::mem::replace(&mut self.printer, prior).take()
    }

    fn print_node_to_string(&mut self, node: &Node) -> String {
        let prior = std::mem::take(&mut self.printer);
        self.visit(node);
        std::mem::replace(&mut self.printer, prior).take()
    }
}

/// Reference labels compare case-insensitively with whitespace removed.
pub(crate) fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\n'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn collect_heading_text(children: &[Node], out: &mut String) {
    for child in children {
        match &child.kind {
            NodeKind::Text { text } => out.push_str(text),
            // multi-char escapes would leak backslashes into anchor ids
            NodeKind::SpecialText { text } if child.end - child.start <= 1 => {
                out.push_str(text)
            }
            _ => collect_heading_text(child.children(), out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_whitespace() {
        assert_eq!(normalize("Foo Bar"), "foobar");
        assert_eq!(normalize("A\tB\nC"), "abc");
        assert_eq!(normalize(normalize("A B").as_str()), "ab");
    }

    #[test]
    fn default_id_computer_prefers_the_anchor_name() {
        let anchor = Node::new(
            NodeKind::AnchorLink {
                name: "custom".into(),
                text: "T".into(),
            },
            0,
            1,
        );
        let heading = Node::new(
            NodeKind::Heading {
                level: 1,
                is_toc: false,
                is_setext: false,
                children: vec![anchor.clone()],
            },
            0,
            1,
        );
        let id = DefaultHeaderIdComputer.compute(&heading, Some(&anchor), "T");
        assert_eq!(id, "custom");
        let id = DefaultHeaderIdComputer.compute(&heading, None, "Some Title!");
        assert_eq!(id, "Some Title");
    }
}
