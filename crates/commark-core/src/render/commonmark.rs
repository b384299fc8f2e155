//! CommonMark output.
//!
//! The output re-parses to a document with the same HTML rendering; the
//! original markup choices (`+` bullets, `_` emphasis, reference links)
//! are not preserved.

use crate::ast::{ListDelim, ListType, NodeKind, NodeLink, NodeValue};
use crate::iter::EventType;
use crate::options::Options;
use crate::scanners;
use crate::strings::{longest_run, shortest_unused_backtick_run};
use crate::tree::{NodeId, Tree};

use super::{first_in_item, in_tight_item, item_number, walk, Escaping, Writer};

fn outc(w: &mut Writer, escape: Escaping, c: char, next: Option<char>) {
    let follows_digit = w.buffer.as_bytes().last().is_some_and(u8::is_ascii_digit);
    let next_is_space = next.map_or(true, |n| n.is_ascii_whitespace());
    let entity_start = c == '&' && next.is_some_and(|n| n.is_ascii_alphanumeric() || n == '#');

    let needs_escaping = c.is_ascii()
        && match escape {
            Escaping::Literal => false,
            Escaping::Normal => {
                (c as u32) < 0x20
                    || matches!(c, '*' | '_' | '[' | ']' | '#' | '<' | '>' | '\\' | '`' | '!')
                    || entity_start
                    || (w.begin_content && matches!(c, '-' | '+' | '=' | '~' | ' ') && !follows_digit)
                    || (w.begin_content && matches!(c, '.' | ')') && follows_digit && next_is_space)
            }
            Escaping::Url => {
                matches!(c, '`' | '<' | '>' | '\\' | ')' | '(') || c.is_ascii_whitespace() || entity_start
            }
            Escaping::Title => matches!(c, '`' | '<' | '>' | '"' | '\\') || entity_start,
        };

    if !needs_escaping {
        w.code_point(c);
    } else if escape == Escaping::Url && c.is_ascii_whitespace() {
        w.ascii(&format!("%{:02X}", c as u32));
    } else if c.is_ascii_punctuation() {
        w.ascii("\\");
        w.code_point(c);
    } else {
        w.ascii(&format!("&#{};", c as u32));
    }
}

/// Whether a link can be written as `<url>`.
fn is_autolink(tree: &Tree, node: NodeId, url: &str, title: &str) -> bool {
    if !title.is_empty() {
        return false;
    }
    let mut children = tree.children(node);
    let text = match (children.next().and_then(|c| tree.value(c)), children.next()) {
        (Some(NodeValue::Text(text)), None) => text,
        _ => return false,
    };
    let target = url.strip_prefix("mailto:").unwrap_or(url);
    if target != text {
        return false;
    }
    let closed = format!("{target}>");
    let scanned = if url.starts_with("mailto:") {
        scanners::autolink_email(closed.as_bytes())
    } else {
        scanners::autolink_uri(closed.as_bytes())
    };
    scanned == Some(closed.len())
}

/// Code blocks use the indented form unless that would change them.
fn use_indented_code(info: &str, code: &str, needs_fence: bool) -> bool {
    let b = code.as_bytes();
    info.is_empty()
        && b.len() > 2
        && !b[0].is_ascii_whitespace()
        && !(b[b.len() - 1].is_ascii_whitespace() && b[b.len() - 2].is_ascii_whitespace())
        && !needs_fence
}

fn is_kind(tree: &Tree, node: Option<NodeId>, kinds: &[NodeKind]) -> bool {
    node.and_then(|n| tree.kind(n)).is_some_and(|k| kinds.contains(&k))
}

const EMPHASIS: &[NodeKind] = &[NodeKind::Emph, NodeKind::Strong];

/// Whether the character written right before (or after) `node` is a
/// letter or digit. `_` cannot open or close next to one.
fn word_char_beside(tree: &Tree, node: NodeId, after: bool) -> bool {
    let sibling = if after { tree.next(node) } else { tree.previous(node) };
    let edge = |s: &str| if after { s.chars().next() } else { s.chars().next_back() };
    let c = match sibling.and_then(|s| tree.value(s)) {
        Some(NodeValue::Text(text)) => edge(text.as_str()),
        Some(NodeValue::CustomInline(custom)) if after => edge(custom.on_enter.as_str()),
        Some(NodeValue::CustomInline(custom)) => edge(custom.on_exit.as_str()),
        _ => None,
    };
    c.is_some_and(char::is_alphanumeric)
}

fn underscore_fits(tree: &Tree, node: NodeId) -> bool {
    !word_char_beside(tree, node, false) && !word_char_beside(tree, node, true)
}

/// Delimiter character for emphasis. Delimiters that touch a parent's or
/// sibling's delimiter alternate between `*` and `_` so the runs do not
/// merge into a different nesting.
fn emphasis_char(tree: &Tree, node: NodeId) -> char {
    let flip = |c: char, fits: bool| if c == '*' && fits { '_' } else { '*' };

    if let Some(prev) = tree.previous(node).filter(|&p| is_kind(tree, Some(p), EMPHASIS)) {
        return flip(emphasis_char(tree, prev), !word_char_beside(tree, node, true));
    }
    let parent = tree.parent(node).filter(|&p| is_kind(tree, Some(p), EMPHASIS));
    if let Some(parent) = parent {
        if tree.previous(node).is_none() || tree.next(node).is_none() {
            return flip(emphasis_char(tree, parent), underscore_fits(tree, node));
        }
    }
    if let Some(next) = tree.next(node).filter(|&n| is_kind(tree, Some(n), EMPHASIS)) {
        if word_char_beside(tree, next, true) && !word_char_beside(tree, node, false) {
            return '_';
        }
    }
    // Take `_` when an edge child cannot.
    let edge_children = [tree.first_child(node), tree.last_child(node)];
    let stuck_child = edge_children
        .into_iter()
        .flatten()
        .any(|c| is_kind(tree, Some(c), EMPHASIS) && !underscore_fits(tree, c));
    if stuck_child && underscore_fits(tree, node) {
        '_'
    } else {
        '*'
    }
}

/// Bullet of a list: `-`, or `*` right after a list drawn with `-` so the
/// two do not merge.
fn bullet_char(tree: &Tree, list: NodeId) -> char {
    match tree.previous(list) {
        Some(prev) if is_bullet_list(tree, prev) && bullet_char(tree, prev) == '-' => '*',
        _ => '-',
    }
}

fn is_bullet_list(tree: &Tree, node: NodeId) -> bool {
    matches!(tree.value(node), Some(NodeValue::List(l)) if l.list_type == ListType::Bullet)
}

/// Ordered list delimiter, switched when the previous list would end up
/// with the same one.
fn ordered_delim(tree: &Tree, list: NodeId) -> char {
    let own = match tree.value(list) {
        Some(NodeValue::List(l)) if l.delimiter == ListDelim::Paren => ')',
        _ => '.',
    };
    let prev_ordered = tree
        .previous(list)
        .filter(|&p| matches!(tree.value(p), Some(NodeValue::List(l)) if l.list_type == ListType::Ordered));
    match prev_ordered {
        Some(prev) if ordered_delim(tree, prev) == own => {
            if own == '.' {
                ')'
            } else {
                '.'
            }
        }
        _ => own,
    }
}

fn item_marker(tree: &Tree, item: NodeId) -> String {
    let Some(list) = tree.parent(item) else {
        return "  - ".to_owned();
    };
    match item_number(tree, item) {
        Some(number) => {
            let pad = if number < 10 { "  " } else { " " };
            format!("{number}{}{pad}", ordered_delim(tree, list))
        }
        // Right after an outer marker, leading spaces would push the
        // outer item's content column.
        None if first_in_item(tree, list) => format!("{}   ", bullet_char(tree, list)),
        None => format!("  {} ", bullet_char(tree, list)),
    }
}

fn has_line_break(tree: &Tree, node: NodeId) -> bool {
    tree.traverse(node)
        .any(|(n, _)| is_kind(tree, Some(n), &[NodeKind::SoftBreak, NodeKind::LineBreak]))
}

fn link_destination(w: &mut Writer, link: &NodeLink) {
    w.lit("](");
    if link.url.is_empty() && !link.title.is_empty() {
        w.lit("<>");
    } else {
        w.out(&link.url, false, Escaping::Url);
    }
    if !link.title.is_empty() {
        w.lit(" \"");
        w.out(&link.title, false, Escaping::Title);
        w.lit("\"");
    }
    w.lit(")");
}

/// Render the document as CommonMark, wrapping text at `width` columns
/// (0 disables wrapping).
pub fn render_commonmark(tree: &Tree, options: &Options, width: usize) -> String {
    let mut w = Writer::new(width, outc);
    let wrap = width > 0 && !options.no_breaks && !options.hard_breaks;

    walk(tree, tree.root(), |node, event| {
        let Some(value) = tree.value(node) else {
            return true;
        };
        let entering = event == EventType::Enter;

        // Blank lines inside a tight item would loosen it on re-parse. A
        // list's own exit restores the state of its enclosing item.
        if entering {
            if tree.parent(node).and_then(|p| tree.kind(p)) == Some(NodeKind::Item) {
                w.in_tight_list_item = in_tight_item(tree, node);
            }
        } else if value.kind() == NodeKind::List {
            w.in_tight_list_item = in_tight_item(tree, node);
        }

        match value {
            NodeValue::Document | NodeValue::List(_) => {}
            NodeValue::BlockQuote => {
                if entering {
                    w.lit("> ");
                    w.begin_content = true;
                    w.prefix.push_str("> ");
                } else {
                    w.prefix.truncate(w.prefix.len().saturating_sub(2));
                    w.blankline();
                }
            }
            NodeValue::Item => {
                let marker = item_marker(tree, node);
                if entering {
                    w.lit(&marker);
                    w.begin_content = true;
                    w.prefix.extend(std::iter::repeat(' ').take(marker.len()));
                } else {
                    w.prefix.truncate(w.prefix.len().saturating_sub(marker.len()));
                    w.cr();
                }
            }
            NodeValue::Heading(heading) => {
                // Line breaks only survive in the underlined form.
                let setext = heading.level <= 2 && has_line_break(tree, node);
                if entering {
                    if !setext {
                        w.lit(&"#".repeat(usize::from(heading.level)));
                        w.lit(" ");
                        w.no_linebreaks = true;
                    }
                    w.begin_content = true;
                } else {
                    if setext {
                        w.cr();
                        w.lit(if heading.level == 1 { "===" } else { "---" });
                    }
                    w.no_linebreaks = false;
                    w.blankline();
                }
            }
            NodeValue::CodeBlock(code) => {
                let first = first_in_item(tree, node);
                if !first {
                    w.blankline();
                }
                // Indented code after a list would join its last item.
                let after_list = is_kind(tree, tree.previous(node), &[NodeKind::List]);
                if use_indented_code(&code.info, &code.literal, first || after_list) {
                    w.lit("    ");
                    w.prefix.push_str("    ");
                    w.lit(&code.literal);
                    w.prefix.truncate(w.prefix.len() - 4);
                } else {
                    let fence_char = if code.info.contains('`') { b'~' } else { b'`' };
                    let length = (longest_run(&code.literal, fence_char) + 1).max(3);
                    w.lit(&char::from(fence_char).to_string().repeat(length));
                    w.lit(" ");
                    w.lit(&code.info.replace('\\', "\\\\").replace('&', "\\&"));
                    w.cr();
                    w.lit(&code.literal);
                    w.cr();
                    w.lit(&char::from(fence_char).to_string().repeat(length));
                }
                w.blankline();
            }
            NodeValue::HtmlBlock(block) => {
                w.blankline();
                w.lit(&block.literal);
                w.blankline();
            }
            NodeValue::CustomBlock(custom) => {
                w.blankline();
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
                w.blankline();
            }
            NodeValue::ThematicBreak => {
                // `-----` could read as a bullet item or a setext underline.
                let first = first_in_item(tree, node);
                if !first {
                    w.blankline();
                }
                w.lit(if first || w.in_tight_list_item { "_____" } else { "-----" });
                w.blankline();
            }
            NodeValue::Paragraph => {
                if !entering {
                    w.blankline();
                }
            }
            NodeValue::Text(text) => {
                // Spaces before a line end are stripped on re-parse.
                let line_end = match tree.next(node) {
                    Some(next) => is_kind(tree, Some(next), &[NodeKind::SoftBreak, NodeKind::LineBreak]),
                    None => tree.parent(node).and_then(|p| tree.kind(p)).is_some_and(NodeKind::is_block),
                };
                let body = if line_end { text.trim_end_matches(' ') } else { text.as_str() };
                w.out(body, wrap, Escaping::Normal);
                for _ in body.len()..text.len() {
                    w.lit("&#32;");
                }
            }
            NodeValue::LineBreak => {
                if !options.hard_breaks {
                    w.lit("\\");
                }
                w.cr();
            }
            NodeValue::SoftBreak => {
                if options.hard_breaks {
                    w.lit("\\");
                    w.cr();
                } else if !w.no_linebreaks && width == 0 && !options.no_breaks {
                    w.cr();
                } else {
                    w.out(" ", wrap, Escaping::Literal);
                }
            }
            NodeValue::Code(code) => {
                let ticks = "`".repeat(shortest_unused_backtick_run(code));
                let padded = code.is_empty()
                    || code.starts_with('`')
                    || code.ends_with('`')
                    || (code.starts_with(' ') && code.ends_with(' ') && code.bytes().any(|b| b != b' '));
                w.lit(&ticks);
                if padded {
                    w.lit(" ");
                }
                w.out(code, wrap, Escaping::Literal);
                if padded {
                    w.lit(" ");
                }
                w.lit(&ticks);
            }
            NodeValue::HtmlInline(html) => w.lit(html),
            NodeValue::CustomInline(custom) => {
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
            }
            NodeValue::Emph => w.lit(&emphasis_char(tree, node).to_string()),
            NodeValue::Strong => w.lit(&emphasis_char(tree, node).to_string().repeat(2)),
            NodeValue::Link(link) => {
                if is_autolink(tree, node, &link.url, &link.title) {
                    if entering {
                        w.lit("<");
                        w.lit(link.url.strip_prefix("mailto:").unwrap_or(&link.url));
                        w.lit(">");
                        return false;
                    }
                } else if entering {
                    w.lit("[");
                } else {
                    link_destination(&mut w, link);
                }
            }
            NodeValue::Image(link) => {
                if entering {
                    w.lit("![");
                } else {
                    link_destination(&mut w, link);
                }
            }
        }
        true
    });
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    #[test]
    fn test_indented_code_only_when_safe() {
        assert!(use_indented_code("", "let x = 1;\n", false));
        assert!(!use_indented_code("rust", "let x = 1;\n", false));
        assert!(!use_indented_code("", "  leading space\n", false));
        assert!(!use_indented_code("", "trailing blank\n\n", false));
        assert!(!use_indented_code("", "let x = 1;\n", true));
    }

    fn emphasis_chars(input: &str) -> Vec<char> {
        let tree = parse_document(input, Options::default()).unwrap();
        tree.traverse(tree.root())
            .filter(|&(n, e)| e == EventType::Enter && is_kind(&tree, Some(n), EMPHASIS))
            .map(|(n, _)| emphasis_char(&tree, n))
            .collect()
    }

    #[test]
    fn test_emphasis_char_alternates_where_runs_touch() {
        assert_eq!(emphasis_chars("*a* and *b*\n"), ['*', '*']);
        assert_eq!(emphasis_chars("*_a_*\n"), ['*', '_']);
        assert_eq!(emphasis_chars("**__a__**\n"), ['*', '_']);
        assert_eq!(emphasis_chars("*a*_b_\n"), ['*', '_']);
        assert_eq!(emphasis_chars("_a_*b*c\n"), ['_', '*']);
        assert_eq!(emphasis_chars("_*a*b_\n"), ['_', '*']);
    }

    #[test]
    fn test_adjacent_lists_alternate_markers() {
        let tree = parse_document("- a\n+ b\n* c\n\n1. x\n1) y\n", Options::default()).unwrap();
        let lists: Vec<NodeId> = tree.children(tree.root()).collect();
        assert_eq!(bullet_char(&tree, lists[0]), '-');
        assert_eq!(bullet_char(&tree, lists[1]), '*');
        assert_eq!(bullet_char(&tree, lists[2]), '-');
        assert_eq!(ordered_delim(&tree, lists[3]), '.');
        assert_eq!(ordered_delim(&tree, lists[4]), ')');
    }
}
