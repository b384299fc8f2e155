//! LaTeX output.
//!
//! Links need `hyperref`, images `graphicx`, and the quote escapes expect
//! `fontenc` with T1 and `textcomp`.

use crate::ast::{ListType, NodeValue};
use crate::iter::EventType;
use crate::options::Options;
use crate::scanners;
use crate::tree::{NodeId, Tree};

use super::{allow_wrap, leading_text, walk, Escaping, Writer};

fn outc(w: &mut Writer, escape: Escaping, c: char, next: Option<char>) {
    if escape == Escaping::Literal {
        w.code_point(c);
        return;
    }
    let normal = escape == Escaping::Normal;
    match c {
        '{' | '}' | '#' | '%' | '&' => {
            w.ascii("\\");
            w.code_point(c);
        }
        '$' | '_' => {
            if normal {
                w.ascii("\\");
            }
            w.code_point(c);
        }
        // Keep `--` from turning into a ligature.
        '-' if next == Some('-') => w.ascii("-{}"),
        '~' if normal => w.ascii("\\textasciitilde{}"),
        '^' => w.ascii("\\^{}"),
        '\\' if escape == Escaping::Url => w.ascii("/"),
        '\\' => w.ascii("\\textbackslash{}"),
        '|' => w.ascii("\\textbar{}"),
        '<' => w.ascii("\\textless{}"),
        '>' => w.ascii("\\textgreater{}"),
        '[' | ']' => {
            w.ascii("{");
            w.code_point(c);
            w.ascii("}");
        }
        '"' => w.ascii("\\textquotedbl{}"),
        '\'' => w.ascii("\\textquotesingle{}"),
        '\u{a0}' => w.ascii("~"),
        '\u{2026}' => w.ascii("\\ldots{}"),
        '\u{2018}' if normal => w.ascii("`"),
        '\u{2019}' if normal => w.ascii("'"),
        '\u{201c}' if normal => w.ascii("``"),
        '\u{201d}' if normal => w.ascii("''"),
        '\u{2014}' if normal => w.ascii("---"),
        '\u{2013}' if normal => w.ascii("--"),
        c => w.code_point(c),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    NoLink,
    UrlAutolink,
    EmailAutolink,
    Normal,
    Internal,
}

fn link_kind(tree: &Tree, node: NodeId, url: &str, title: &str) -> LinkKind {
    if url.starts_with('#') {
        return LinkKind::Internal;
    }
    if url.is_empty() || scanners::scheme(url.as_bytes()).is_none() {
        return LinkKind::NoLink;
    }
    if !title.is_empty() {
        return LinkKind::Normal;
    }
    let Some(text) = leading_text(tree, node) else {
        return LinkKind::NoLink;
    };
    match url.strip_prefix("mailto:") {
        Some(address) if address == text => LinkKind::EmailAutolink,
        None if url == text => LinkKind::UrlAutolink,
        _ => LinkKind::Normal,
    }
}

/// Number of ordered lists enclosing `node`, itself included.
fn enum_level(tree: &Tree, node: NodeId) -> usize {
    let mut level = 0;
    let mut current = Some(node);
    while let Some(id) = current {
        if matches!(tree.value(id), Some(NodeValue::List(l)) if l.list_type == ListType::Ordered) {
            level += 1;
        }
        current = tree.parent(id);
    }
    level
}

/// Render the document as a LaTeX body, wrapping text at `width` columns
/// (0 disables wrapping).
pub fn render_latex(tree: &Tree, options: &Options, width: usize) -> String {
    let mut w = Writer::new(width, outc);
    let wrap = allow_wrap(width, options);

    walk(tree, tree.root(), |node, event| {
        let Some(value) = tree.value(node) else {
            return true;
        };
        let entering = event == EventType::Enter;
        match value {
            NodeValue::Document | NodeValue::HtmlBlock(_) | NodeValue::HtmlInline(_) => {}
            NodeValue::BlockQuote => {
                if entering {
                    w.lit("\\begin{quote}");
                    w.cr();
                } else {
                    w.lit("\\end{quote}");
                    w.blankline();
                }
            }
            NodeValue::List(list) => {
                let env = match list.list_type {
                    ListType::Ordered => "enumerate",
                    ListType::Bullet => "itemize",
                };
                if entering {
                    w.lit(&format!("\\begin{{{env}}}"));
                    w.cr();
                    if list.start > 1 {
                        let counter = match enum_level(tree, node) {
                            1 => Some("i"),
                            2 => Some("ii"),
                            3 => Some("iii"),
                            4 => Some("iv"),
                            5 => Some("v"),
                            _ => None,
                        };
                        if let Some(counter) = counter {
                            // The counter is incremented before the first item.
                            w.lit(&format!("\\setcounter{{enum{counter}}}{{{}}}", list.start - 1));
                        }
                        w.cr();
                    }
                } else {
                    w.lit(&format!("\\end{{{env}}}"));
                    w.blankline();
                }
            }
            NodeValue::Item => {
                if entering {
                    w.lit("\\item ");
                } else {
                    w.cr();
                }
            }
            NodeValue::Heading(heading) => {
                if entering {
                    w.lit(match heading.level {
                        1 => "\\section",
                        2 => "\\subsection",
                        3 => "\\subsubsection",
                        4 => "\\paragraph",
                        _ => "\\subparagraph",
                    });
                    w.lit("{");
                } else {
                    w.lit("}");
                    w.blankline();
                }
            }
            NodeValue::CodeBlock(code) => {
                w.cr();
                w.lit("\\begin{verbatim}");
                w.cr();
                w.lit(&code.literal);
                w.cr();
                w.lit("\\end{verbatim}");
                w.blankline();
            }
            NodeValue::CustomBlock(custom) => {
                w.cr();
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
                w.cr();
            }
            NodeValue::ThematicBreak => {
                w.blankline();
                w.lit("\\begin{center}\\rule{0.5\\linewidth}{\\linethickness}\\end{center}");
                w.blankline();
            }
            NodeValue::Paragraph => {
                if !entering {
                    w.blankline();
                }
            }
            NodeValue::Text(text) => w.out(text, wrap, Escaping::Normal),
            NodeValue::LineBreak => {
                w.lit("\\\\");
                w.cr();
            }
            NodeValue::SoftBreak => {
                if options.hard_breaks {
                    w.lit("\\\\");
                    w.cr();
                } else if width == 0 && !options.no_breaks {
                    w.cr();
                } else {
                    w.out(" ", wrap, Escaping::Normal);
                }
            }
            NodeValue::Code(code) => {
                w.lit("\\texttt{");
                w.out(code, false, Escaping::Normal);
                w.lit("}");
            }
            NodeValue::CustomInline(custom) => {
                w.lit(if entering { &custom.on_enter } else { &custom.on_exit });
            }
            NodeValue::Strong => w.lit(if entering { "\\textbf{" } else { "}" }),
            NodeValue::Emph => w.lit(if entering { "\\emph{" } else { "}" }),
            NodeValue::Link(link) => {
                if !entering {
                    w.lit("}");
                    return true;
                }
                match link_kind(tree, node, &link.url, &link.title) {
                    LinkKind::UrlAutolink => {
                        w.lit("\\url{");
                        w.out(&link.url, false, Escaping::Url);
                        w.lit("}");
                        return false;
                    }
                    LinkKind::EmailAutolink => {
                        w.lit("\\href{");
                        w.out(&link.url, false, Escaping::Url);
                        w.lit("}\\nolinkurl{");
                    }
                    LinkKind::Normal => {
                        w.lit("\\href{");
                        w.out(&link.url, false, Escaping::Url);
                        w.lit("}{");
                    }
                    LinkKind::Internal => {
                        w.lit("\\protect\\hyperlink{");
                        w.out(&link.url[1..], false, Escaping::Url);
                        w.lit("}{");
                    }
                    LinkKind::NoLink => w.lit("{"),
                }
            }
            NodeValue::Image(link) => {
                if entering {
                    w.lit("\\protect\\includegraphics{");
                    w.out(&link.url, false, Escaping::Url);
                    w.lit("}");
                    return false;
                }
            }
        }
        true
    });
    w.finish()
}
