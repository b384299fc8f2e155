//! Renderers from a [`Tree`] to text.
//!
//! Every renderer walks the tree with a [`Walker`] and reacts to enter/exit
//! events. Leaf nodes are handled on enter only. HTML and XML write
//! straight into a `String`. Man, LaTeX and CommonMark share [`Writer`],
//! which tracks the current line prefix, pending newlines and optional
//! greedy word wrapping.

mod commonmark;
mod html;
mod latex;
mod man;
mod xml;

pub use commonmark::render_commonmark;
pub use html::render_html;
pub use latex::render_latex;
pub use man::render_man;
pub use xml::render_xml;

use crate::ast::{ListType, NodeKind, NodeValue};
use crate::iter::{EventType, Walker};
use crate::options::Options;
use crate::tree::{NodeId, Tree};

/// Walk the subtree of `root`, calling `visit` for each event. Exit events
/// of leaf kinds are dropped. When `visit` returns `false` on enter, the
/// node's children are skipped.
pub(crate) fn walk(tree: &Tree, root: NodeId, mut visit: impl FnMut(NodeId, EventType) -> bool) {
    let mut walker = Walker::new(root);
    while let Some((node, event)) = walker.next(tree) {
        let leaf = tree.kind(node).is_some_and(|k| k.is_leaf());
        if leaf && event == EventType::Exit {
            continue;
        }
        if !visit(node, event) && event == EventType::Enter && !leaf {
            walker.resume_at(tree, node, EventType::Exit);
        }
    }
}

/// How [`Writer::out`] treats the characters it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escaping {
    /// Written as is.
    Literal,
    /// Body text.
    Normal,
    /// Link destination.
    Url,
    /// Link title.
    Title,
}

/// Per-character escaping for a target format. Receives the character and
/// the one following it in the same string.
pub(crate) type OutChar = fn(&mut Writer, Escaping, char, Option<char>);

/// Line-oriented output buffer with prefixes and word wrapping.
pub(crate) struct Writer {
    pub buffer: String,
    /// Written at the start of every line (block quote and list indentation).
    pub prefix: String,
    /// Characters on the current line.
    pub column: usize,
    /// Wrap column; 0 disables wrapping.
    pub width: usize,
    /// Newlines owed before the next output: 1 ends the line, 2 leaves a
    /// blank line.
    pub need_cr: u8,
    /// Byte offset of the last space a line may break at.
    pub last_breakable: usize,
    pub begin_line: bool,
    /// Nothing but prefix and list-number digits on this line yet.
    pub begin_content: bool,
    pub no_linebreaks: bool,
    pub in_tight_list_item: bool,
    outc: OutChar,
}

impl Writer {
    pub(crate) fn new(width: usize, outc: OutChar) -> Self {
        Self {
            buffer: String::new(),
            prefix: String::new(),
            column: 0,
            width,
            need_cr: 0,
            last_breakable: 0,
            begin_line: true,
            begin_content: true,
            no_linebreaks: false,
            in_tight_list_item: false,
            outc,
        }
    }

    /// End the current line before the next output.
    pub(crate) fn cr(&mut self) {
        self.need_cr = self.need_cr.max(1);
    }

    /// Leave a blank line before the next output.
    pub(crate) fn blankline(&mut self) {
        self.need_cr = self.need_cr.max(2);
    }

    /// Write `s` without escaping or wrapping.
    pub(crate) fn lit(&mut self, s: &str) {
        self.out(s, false, Escaping::Literal);
    }

    /// Append ASCII text with no newlines, bypassing escaping.
    pub(crate) fn ascii(&mut self, s: &str) {
        self.buffer.push_str(s);
        self.column += s.len();
    }

    pub(crate) fn code_point(&mut self, c: char) {
        self.buffer.push(c);
        self.column += 1;
    }

    fn flush_newlines(&mut self) {
        if self.in_tight_list_item && self.need_cr > 1 {
            self.need_cr = 1;
        }
        // Newlines already at the end of the buffer count towards the debt,
        // and none are written at the very start of the output.
        let mut trailing = self.buffer.bytes().rev().take_while(|&b| b == b'\n').count();
        if trailing == self.buffer.len() {
            trailing = usize::MAX;
        }
        while self.need_cr > 0 {
            if trailing > 0 {
                trailing -= 1;
            } else {
                self.buffer.push('\n');
                if self.need_cr > 1 {
                    self.buffer.push_str(self.prefix.trim_end());
                }
            }
            self.column = 0;
            self.last_breakable = 0;
            self.begin_line = true;
            self.begin_content = true;
            self.need_cr -= 1;
        }
    }

    /// Write `s`, escaping each character for the target format and, when
    /// `wrap` is set and a width is configured, breaking long lines at spaces.
    pub(crate) fn out(&mut self, s: &str, wrap: bool, escape: Escaping) {
        let wrap = wrap && !self.no_linebreaks;
        self.flush_newlines();

        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            let next = chars.peek().copied();
            // Spaces before any content are text, not break opportunities.
            if c == ' ' && wrap && !self.begin_content {
                let breakable = self.buffer.len();
                self.buffer.push(' ');
                self.column += 1;
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                // A line starting with a digit could read as a list marker.
                if !chars.peek().is_some_and(char::is_ascii_digit) {
                    self.last_breakable = breakable;
                }
                continue;
            }

            if self.begin_line {
                self.buffer.push_str(&self.prefix);
                self.column = self.prefix.chars().count();
            }

            if escape == Escaping::Literal {
                self.code_point(c);
            } else {
                (self.outc)(self, escape, c, next);
            }

            // The format let a newline through, so escaping that depends on
            // the start of a line applies again.
            if c == '\n' && self.buffer.ends_with('\n') {
                self.column = 0;
                self.begin_line = true;
                self.begin_content = true;
                self.last_breakable = 0;
                continue;
            }
            self.begin_line = false;
            self.begin_content = self.begin_content && c.is_ascii_digit();

            if self.width > 0 && self.column > self.width && self.last_breakable > 0 {
                let remainder = self.buffer.split_off(self.last_breakable + 1);
                self.buffer.truncate(self.last_breakable);
                self.buffer.push('\n');
                self.buffer.push_str(&self.prefix);
                self.buffer.push_str(&remainder);
                self.column = self.prefix.chars().count() + remainder.chars().count();
                self.last_breakable = 0;
                self.begin_line = false;
                self.begin_content = false;
            }
        }
    }

    /// The rendered text, always ending with a newline.
    pub(crate) fn finish(mut self) -> String {
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer
    }
}

/// Soft and hard breaks may wrap only when a width is set and breaks are
/// not suppressed.
pub(crate) fn allow_wrap(width: usize, options: &Options) -> bool {
    width > 0 && !options.no_breaks
}

/// Display number of an item in an ordered list; `None` for bullet items.
pub(crate) fn item_number(tree: &Tree, item: NodeId) -> Option<usize> {
    let list = tree.parent(item)?;
    match tree.value(list)? {
        NodeValue::List(l) if l.list_type == ListType::Ordered => {
            Some(l.start + tree.children(list).take_while(|&sibling| sibling != item).count())
        }
        _ => None,
    }
}

/// Whether `node` is the first child of a list item.
pub(crate) fn first_in_item(tree: &Tree, node: NodeId) -> bool {
    tree.previous(node).is_none()
        && tree
            .parent(node)
            .is_some_and(|p| tree.kind(p) == Some(NodeKind::Item))
}

/// Whether `node` sits directly in an item of a tight list.
pub(crate) fn in_tight_item(tree: &Tree, node: NodeId) -> bool {
    let list = tree.parent(node).filter(|&p| tree.kind(p) == Some(NodeKind::Item)).and_then(|item| tree.parent(item));
    matches!(list.and_then(|l| tree.value(l)), Some(NodeValue::List(l)) if l.tight)
}

/// Concatenated literal of the leading text children of `node`.
pub(crate) fn leading_text(tree: &Tree, node: NodeId) -> Option<String> {
    let mut text = String::new();
    let mut child = tree.first_child(node);
    let mut any = false;
    while let Some(id) = child {
        match tree.value(id) {
            Some(NodeValue::Text(s)) => text.push_str(s),
            _ => break,
        }
        any = true;
        child = tree.next(id);
    }
    any.then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(w: &mut Writer, _escape: Escaping, c: char, _next: Option<char>) {
        w.code_point(c);
    }

    #[test]
    fn test_walk_skips_children_when_visit_declines() {
        let tree = crate::parse_document("*a* b\n", Options::default()).unwrap();
        let mut seen = Vec::new();
        walk(&tree, tree.root(), |node, event| {
            seen.push((tree.kind(node), event));
            tree.kind(node) != Some(NodeKind::Emph)
        });
        let texts = seen.iter().filter(|(k, _)| *k == Some(NodeKind::Text)).count();
        assert_eq!(texts, 1);
        assert!(!seen.contains(&(Some(NodeKind::Emph), EventType::Exit)));
        assert_eq!(seen.last(), Some(&(Some(NodeKind::Document), EventType::Exit)));
    }

    #[test]
    fn test_wraps_at_last_space() {
        let mut w = Writer::new(10, plain);
        w.out("aaaa bbbb cccc", true, Escaping::Normal);
        assert_eq!(w.finish(), "aaaa bbbb\ncccc\n");
    }

    /// Escapes a dot at the start of a line, the way groff needs it.
    fn dots(w: &mut Writer, _escape: Escaping, c: char, _next: Option<char>) {
        if c == '.' && w.begin_line {
            w.ascii("\\&");
        }
        w.code_point(c);
    }

    #[test]
    fn test_newline_in_escaped_text_starts_a_line() {
        let mut w = Writer::new(0, dots);
        w.prefix.push_str("  ");
        w.out(".a\n.b", false, Escaping::Normal);
        assert_eq!(w.column, 6);
        assert_eq!(w.finish(), "  \\&.a\n  \\&.b\n");
    }

    #[test]
    fn test_leading_space_is_not_a_break() {
        let mut w = Writer::new(4, plain);
        w.out(" aaaaa", true, Escaping::Normal);
        assert_eq!(w.finish(), " aaaaa\n");
    }

    #[test]
    fn test_prefix_on_each_line() {
        let mut w = Writer::new(0, plain);
        w.prefix.push_str("> ");
        w.lit("a\nb");
        assert_eq!(w.finish(), "> a\n> b\n");
    }

    #[test]
    fn test_blankline_collapses_with_existing_newline() {
        let mut w = Writer::new(0, plain);
        w.lit("a");
        w.cr();
        w.lit("b\n");
        w.blankline();
        w.lit("c");
        assert_eq!(w.finish(), "a\nb\n\nc\n");
    }
}
