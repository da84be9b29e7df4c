//! Plugin surfaces: extra block/inline grammar alternatives and serializer
//! fallbacks for the node kinds they produce.
//!
//! Parser plugins see the input through a [`PluginCursor`], a bounded view
//! of the running parse; they build [`Node`]s — typically
//! [`NodeKind::Custom`] — that only a matching [`SerializerPlugin`] knows
//! how to emit.

use crate::ast::{Node, NodeKind};
use crate::html::printer::Printer;
use crate::parser::ParseRun;

/// Contributes alternatives to the block rule. Tried before every built-in
/// block alternative; returning `None` backtracks automatically.
pub trait BlockPlugin {
    fn try_block(&self, cursor: &mut PluginCursor<'_, '_>) -> Option<Node>;
}

/// Contributes alternatives to the inline rule and may claim extra special
/// characters so plain-text runs stop at them.
pub trait InlinePlugin {
    fn special_chars(&self) -> &[char] {
        &[]
    }

    fn try_inline(&self, cursor: &mut PluginCursor<'_, '_>) -> Option<Node>;
}

/// Fallback serializer for nodes the built-in serializer does not
/// recognize. The first plugin returning `true` wins.
pub trait SerializerPlugin {
    fn visit(&self, node: &Node, printer: &mut Printer) -> bool;
}

/// The plugin registry a processor carries.
#[derive(Default)]
pub struct Plugins {
    blocks: Vec<Box<dyn BlockPlugin>>,
    inlines: Vec<Box<dyn InlinePlugin>>,
    serializers: Vec<Box<dyn SerializerPlugin>>,
}

impl Plugins {
    pub fn new() -> Self {
        Plugins::default()
    }

    pub fn with_block_plugin(mut self, plugin: Box<dyn BlockPlugin>) -> Self {
        self.blocks.push(plugin);
        self
    }

    pub fn with_inline_plugin(mut self, plugin: Box<dyn InlinePlugin>) -> Self {
        self.inlines.push(plugin);
        self
    }

    pub fn with_serializer_plugin(mut self, plugin: Box<dyn SerializerPlugin>) -> Self {
        self.serializers.push(plugin);
        self
    }

    pub(crate) fn block_plugins(&self) -> &[Box<dyn BlockPlugin>] {
        &self.blocks
    }

    pub(crate) fn inline_plugins(&self) -> &[Box<dyn InlinePlugin>] {
        &self.inlines
    }

    pub(crate) fn serializer_plugins(&self) -> &[Box<dyn SerializerPlugin>] {
        &self.serializers
    }

    pub(crate) fn special_chars(&self) -> Vec<char> {
        let mut chars = Vec::new();
        for plugin in &self.inlines {
            for &c in plugin.special_chars() {
                if !chars.contains(&c) {
                    chars.push(c);
                }
            }
        }
        chars
    }
}

/// What a parser plugin may do with the input: peek, consume, and read
/// positions for the node it builds. Backtracking on failure is the
/// caller's job — just return `None`.
pub struct PluginCursor<'r, 'a> {
    run: &'r mut ParseRun<'a>,
}

impl<'r, 'a> PluginCursor<'r, 'a> {
    pub(crate) fn new(run: &'r mut ParseRun<'a>) -> Self {
        PluginCursor { run }
    }

    /// Current char index into the parse buffer; use for node ranges.
    pub fn pos(&self) -> usize {
        self.run.cur.pos()
    }

    pub fn at_end(&self) -> bool {
        self.run.cur.at_end()
    }

    pub fn peek(&self) -> Option<char> {
        self.run.cur.peek()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.run.cur.peek_at(offset)
    }

    pub fn bump(&mut self) -> Option<char> {
        self.run.cur.bump()
    }

    pub fn eat(&mut self, c: char) -> bool {
        self.run.cur.eat(c)
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        self.run.cur.eat_str(s)
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.run.cur.starts_with(s)
    }

    /// Consume the rest of the line including its newline.
    pub fn take_line(&mut self) -> Option<String> {
        let (start, end) = self.run.cur.eat_line()?;
        Some(self.run.cur.slice(start, end))
    }

    pub fn at_blank_line(&self) -> bool {
        self.run.cur.at_blank_line()
    }

    /// Build a custom node spanning `start..pos`.
    pub fn custom_node(&self, name: &str, text: String, start: usize) -> Node {
        Node::new(
            NodeKind::Custom {
                name: name.to_string(),
                text,
                children: Vec::new(),
            },
            start,
            self.pos(),
        )
    }
}
