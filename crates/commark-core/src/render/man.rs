//! groff `man` output.

use crate::ast::NodeValue;
use crate::iter::EventType;
use crate::options::Options;
use crate::tree::Tree;

use super::{allow_wrap, first_in_item, item_number, walk, Escaping, Writer};

const HARD_BREAK: &str = ".PD 0\n.P\n.PD";

fn outc(w: &mut Writer, escape: Escaping, c: char, _next: Option<char>) {
    if escape == Escaping::Literal {
        w.code_point(c);
        return;
    }
    match c {
        '.' if w.begin_line => w.ascii("\\&."),
        '\'' if w.begin_line => w.ascii("\\&'"),
        '-' => w.ascii("\\-"),
        '\\' => w.ascii("\\e"),
        '\u{2018}' => w.ascii("\\[oq]"),
        '\u{2019}' => w.ascii("\\[cq]"),
        '\u{201c}' => w.ascii("\\[lq]"),
        '\u{201d}' => w.ascii("\\[rq]"),
        '\u{2014}' => w.ascii("\\[em]"),
        '\u{2013}' => w.ascii("\\[en]"),
        c => w.code_point(c),
    }
}

/// Render the document as a groff man page body, wrapping text at `width`
/// columns (0 disables wrapping).
pub fn render_man(tree: &Tree, options: &Options, width: usize) -> String {
    let mut w = Writer::new(width, outc);
    let wrap = allow_wrap(width, options);

    walk(tree, tree.root(), |node, event| {
        let Some(value) = tree.value(node) else {
            return true;
        };
        let entering = event == EventType::Enter;
        match value {
            NodeValue::Document | NodeValue::List(_) | NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => {}
            NodeValue::BlockQuote => {
                w.cr();
                w.lit(if entering { ".RS" } else { ".RE" });
                w.cr();
            }
            NodeValue::Item => {
                w.cr();
                if entering {
                    w.lit(".IP ");
                    match item_number(tree, node) {
                        Some(number) => w.lit(&format!("\"{number}.\" 4")),
                        None => w.lit("\\[bu] 2"),
                    }
                    w.cr();
                }
            }
            NodeValue::Heading(heading) => {
                w.cr();
                if entering {
                    w.lit(if heading.level == 1 { ".SH" } else { ".SS" });
                    w.cr();
                }
            }
            NodeValue::CodeBlock(code) => {
                w.cr();
                w.lit(".IP\n.nf\n\\f[C]\n");
                w.out(&code.literal, false, Escaping::Normal);
                w.cr();
                w.lit("\\f[]\n.fi");
                w.cr();
            }
            NodeValue::CustomBlock(custom) => {
                w.cr();
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
                w.cr();
            }
            NodeValue::ThematicBreak => {
                w.cr();
                w.lit(".PP\n  *  *  *  *  *");
                w.cr();
            }
            NodeValue::Paragraph => {
                if !entering {
                    w.cr();
                } else if !first_in_item(tree, node) {
                    w.cr();
                    w.lit(".PP");
                    w.cr();
                }
            }
            NodeValue::Text(text) => w.out(text, wrap, Escaping::Normal),
            NodeValue::LineBreak => {
                w.lit(HARD_BREAK);
                w.cr();
            }
            NodeValue::SoftBreak => {
                if options.hard_breaks {
                    w.lit(HARD_BREAK);
                    w.cr();
                } else if width == 0 && !options.no_breaks {
                    w.cr();
                } else {
                    w.out(" ", wrap, Escaping::Literal);
                }
            }
            NodeValue::Code(code) => {
                w.lit("\\f[C]");
                w.out(code, wrap, Escaping::Normal);
                w.lit("\\f[]");
            }
            NodeValue::CustomInline(custom) => {
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
            }
            NodeValue::Strong => w.lit(if entering { "\\f[B]" } else { "\\f[]" }),
            NodeValue::Emph => w.lit(if entering { "\\f[I]" } else { "\\f[]" }),
            NodeValue::Link(link) => {
                if !entering {
                    w.lit(" (");
                    w.out(&link.url, wrap, Escaping::Url);
                    w.lit(")");
                }
            }
            NodeValue::Image(_) => w.lit(if entering { "[IMAGE: " } else { "]" }),
        }
        true
    });
    w.finish()
}
