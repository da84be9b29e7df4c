//! Table block: optional header rows, a required divider row defining the
//! columns, body rows, and an optional caption line.

use crate::ast::{Alignment, Node, NodeKind};
use crate::extensions::Extensions;
use crate::parser::ParseRun;

impl<'a> ParseRun<'a> {
    pub(crate) fn table(&mut self) -> Option<Node> {
        let start = self.cur.pos();
        let mut children: Vec<Node> = Vec::new();

        // optional header section: every row before the divider
        {
            let header_start = self.cur.pos();
            let mut rows = Vec::new();
            while let Some(row) = self.table_row(false) {
                rows.push(row);
            }
            if !rows.is_empty() {
                children.push(Node::new(
                    NodeKind::TableHeader { children: rows },
                    header_start,
                    self.cur.pos(),
                ));
            }
        }

        let mut columns = Vec::new();
        if !self.table_divider(&mut columns) {
            self.cur.reset(start);
            return None;
        }

        // optional body section
        {
            let body_start = self.cur.pos();
            let mut rows = Vec::new();
            while let Some(row) = self.table_row(true) {
                rows.push(row);
            }
            if !rows.is_empty() {
                children.push(Node::new(
                    NodeKind::TableBody { children: rows },
                    body_start,
                    self.cur.pos(),
                ));
            }
        }

        if let Some(caption) = self.table_caption() {
            children.push(caption);
        }

        if children.is_empty() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::Table { columns, children },
            start,
            self.cur.pos(),
        ))
    }

    /// A row is valid with a leading pipe, more than one cell, or a
    /// trailing pipe.
    fn table_row(&mut self, after_divider: bool) -> Option<Node> {
        let start = self.cur.pos();
        let mut leading_pipe = false;
        if self.cur.eat('|') {
            leading_pipe = true;
        }
        let mut cells = Vec::new();
        while let Some(cell) = self.table_cell(after_divider) {
            cells.push(cell);
        }
        if cells.is_empty() {
            self.cur.reset(start);
            return None;
        }
        let valid = leading_pipe || cells.len() > 1 || self.cur.prev_char() == Some('|');
        if !valid {
            self.cur.reset(start);
            return None;
        }
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(start);
            return None;
        }
        Some(Node::new(
            NodeKind::TableRow { children: cells },
            start,
            self.cur.pos(),
        ))
    }

    /// Cell content runs until an unescaped `|` or the end of line; the
    /// number of trailing pipes becomes the colspan. Before the divider a
    /// cell must not look like a divider cell.
    fn table_cell(&mut self, after_divider: bool) -> Option<Node> {
        let start = self.cur.pos();
        if !after_divider && self.divider_cell_follows() {
            return None;
        }
        {
            let m = self.cur.pos();
            self.cur.eat_sp();
            if matches!(self.cur.peek(), Some('|') | Some('\n') | Some('\r') | None) {
                self.cur.reset(m);
            }
        }
        let mut children = Vec::new();
        loop {
            if self.cur.peek() == Some('|') || self.eol_after_spaces_follows() {
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
        let content_end = self.cur.pos();
        let mut pipes = 0;
        while self.cur.eat('|') {
            pipes += 1;
        }
        Some(Node::new(
            NodeKind::TableCell {
                col_span: pipes.max(1),
                children,
            },
            start,
            content_end,
        ))
    }

    fn eol_after_spaces_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_sp();
        let found = self.cur.at_newline();
        self.cur.reset(mark);
        found
    }

    /// `Sp :? Sp -+ Sp :? Sp` before `|` or EOL — a divider cell.
    fn divider_cell_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        let found = (|| {
            self.cur.eat_sp();
            self.cur.eat(':');
            self.cur.eat_sp();
            if self.cur.eat_n_or_more('-', 1).is_none() {
                return false;
            }
            self.cur.eat_sp();
            self.cur.eat(':');
            self.cur.eat_sp();
            matches!(self.cur.peek(), Some('|') | Some('\n') | Some('\r'))
        })();
        self.cur.reset(mark);
        found
    }

    /// The divider needs a pipe somewhere or at least two columns.
    fn table_divider(&mut self, columns: &mut Vec<Node>) -> bool {
        let mark = self.cur.pos();
        let mut pipe_seen = false;
        if self.cur.eat('|') {
            pipe_seen = true;
        }
        while let Some(column) = self.table_column(&mut pipe_seen) {
            columns.push(column);
        }
        if columns.is_empty() || !(pipe_seen || columns.len() >= 2) {
            columns.clear();
            self.cur.reset(mark);
            return false;
        }
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            columns.clear();
            self.cur.reset(mark);
            return false;
        }
        true
    }

    /// `Sp :? Sp -+ Sp :? Sp |?` — colons pick the alignment.
    fn table_column(&mut self, pipe_seen: &mut bool) -> Option<Node> {
        let start = self.cur.pos();
        self.cur.eat_sp();
        let left = self.cur.eat(':');
        self.cur.eat_sp();
        if self.cur.eat_n_or_more('-', 1).is_none() {
            self.cur.reset(start);
            return None;
        }
        self.cur.eat_sp();
        let right = self.cur.eat(':');
        self.cur.eat_sp();
        if self.cur.eat('|') {
            *pipe_seen = true;
        }
        let alignment = match (left, right) {
            (true, true) => Alignment::Center,
            (true, false) => Alignment::Left,
            (false, true) => Alignment::Right,
            (false, false) => Alignment::None,
        };
        Some(Node::new(
            NodeKind::TableColumn { alignment },
            start,
            self.cur.pos(),
        ))
    }

    /// `[caption]` line directly after the table body.
    fn table_caption(&mut self) -> Option<Node> {
        let mark = self.cur.pos();
        if !self.cur.eat('[') {
            return None;
        }
        if self.ext(Extensions::FOOTNOTES) && self.cur.peek() == Some('^') {
            self.cur.reset(mark);
            return None;
        }
        self.cur.eat_sp();
        let caption_start = self.cur.pos();
        let mut children = Vec::new();
        loop {
            if self.cur.at_newline() || self.caption_end_follows() {
                break;
            }
            match self.inline(&children, None) {
                Some(node) => crate::ast::push_coalescing(&mut children, node),
                None => break,
            }
        }
        if children.is_empty() {
            self.cur.reset(mark);
            return None;
        }
        let caption = Node::new(
            NodeKind::TableCaption { children },
            caption_start,
            self.cur.pos(),
        );
        self.cur.eat_sp();
        self.cur.eat(']');
        self.cur.eat_sp();
        if !self.cur.eat_newline() {
            self.cur.reset(mark);
            return None;
        }
        Some(caption)
    }

    fn caption_end_follows(&mut self) -> bool {
        let mark = self.cur.pos();
        self.cur.eat_sp();
        self.cur.eat(']');
        self.cur.eat_sp();
        let found = self.cur.at_newline();
        self.cur.reset(mark);
        found
    }
}
