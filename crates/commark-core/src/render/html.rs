//! HTML output.

use crate::ast::{ListType, NodeValue};
use crate::iter::EventType;
use crate::options::Options;
use crate::strings::{escape_href, escape_html, is_dangerous_url, is_space};
use crate::tree::{NodeId, Tree};

use super::walk;

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Render the document as HTML.
///
/// ```rust
/// use commark_core::{parse_document, render_html, Options};
///
/// let tree = parse_document("Hello *world*\n", Options::default()).unwrap();
/// assert_eq!(render_html(&tree, &Options::default()), "<p>Hello <em>world</em></p>\n");
/// ```
pub fn render_html(tree: &Tree, options: &Options) -> String {
    let mut html = HtmlRenderer {
        tree,
        options,
        out: String::new(),
        plain: None,
    };
    walk(tree, tree.root(), |node, event| {
        html.render_node(node, event);
        true
    });
    tracing::trace!(bytes = html.out.len(), "rendered html");
    html.out
}

struct HtmlRenderer<'a> {
    tree: &'a Tree,
    options: &'a Options,
    out: String,
    /// Image whose alt text is being written; descendants render as text.
    plain: Option<NodeId>,
}

impl HtmlRenderer<'_> {
    fn cr(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn sourcepos(&mut self, node: NodeId) {
        if !self.options.source_pos {
            return;
        }
        if let Some(pos) = self.tree.sourcepos(node) {
            self.out.push_str(&format!(" data-sourcepos=\"{pos}\""));
        }
    }

    fn open_tag(&mut self, tag: &str, node: NodeId) {
        self.out.push('<');
        self.out.push_str(tag);
        self.sourcepos(node);
        self.out.push('>');
    }

    fn url(&mut self, url: &str) {
        if !self.options.safe || !is_dangerous_url(url) {
            escape_href(&mut self.out, url);
        }
    }

    fn raw(&mut self, html: &str) {
        if self.options.safe {
            self.out.push_str(RAW_HTML_OMITTED);
        } else {
            self.out.push_str(html);
        }
    }

    fn tight_paragraph(&self, node: NodeId) -> bool {
        let grandparent = self.tree.parent(node).and_then(|p| self.tree.parent(p));
        match grandparent.and_then(|g| self.tree.value(g)) {
            Some(NodeValue::List(list)) => list.tight,
            _ => false,
        }
    }

    fn render_node(&mut self, node: NodeId, event: EventType) {
        let tree = self.tree;
        let Some(value) = tree.value(node) else {
            return;
        };
        let entering = event == EventType::Enter;

        if self.plain == Some(node) {
            self.plain = None;
        }
        if self.plain.is_some() {
            match value {
                NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::HtmlInline(s) => escape_html(&mut self.out, s),
                NodeValue::LineBreak | NodeValue::SoftBreak => self.out.push(' '),
                _ => {}
            }
            return;
        }

        match value {
            NodeValue::Document => {}
            NodeValue::BlockQuote => {
                self.cr();
                if entering {
                    self.open_tag("blockquote", node);
                    self.out.push('\n');
                } else {
                    self.out.push_str("</blockquote>\n");
                }
            }
            NodeValue::List(list) => {
                if entering {
                    self.cr();
                    match list.list_type {
                        ListType::Bullet => self.open_tag("ul", node),
                        ListType::Ordered if list.start == 1 => self.open_tag("ol", node),
                        ListType::Ordered => self.open_tag(&format!("ol start=\"{}\"", list.start), node),
                    }
                    self.out.push('\n');
                } else if list.list_type == ListType::Bullet {
                    self.out.push_str("</ul>\n");
                } else {
                    self.out.push_str("</ol>\n");
                }
            }
            NodeValue::Item => {
                if entering {
                    self.cr();
                    self.open_tag("li", node);
                } else {
                    self.out.push_str("</li>\n");
                }
            }
            NodeValue::Heading(heading) => {
                if entering {
                    self.cr();
                    self.open_tag(&format!("h{}", heading.level), node);
                } else {
                    self.out.push_str(&format!("</h{}>\n", heading.level));
                }
            }
            NodeValue::CodeBlock(code) => {
                self.cr();
                self.out.push_str("<pre");
                self.sourcepos(node);
                if code.info.is_empty() {
                    self.out.push_str("><code>");
                } else {
                    let lang_end = code.info.bytes().position(is_space).unwrap_or(code.info.len());
                    self.out.push_str("><code class=\"language-");
                    escape_html(&mut self.out, &code.info[..lang_end]);
                    self.out.push_str("\">");
                }
                escape_html(&mut self.out, &code.literal);
                self.out.push_str("</code></pre>\n");
            }
            NodeValue::HtmlBlock(block) => {
                self.cr();
                self.raw(&block.literal);
                self.cr();
            }
            NodeValue::CustomBlock(custom) => {
                self.cr();
                self.out
                    .push_str(if entering { &custom.on_enter } else { &custom.on_exit });
                self.cr();
            }
            NodeValue::ThematicBreak => {
                self.cr();
                self.out.push_str("<hr");
                self.sourcepos(node);
                self.out.push_str(" />\n");
            }
            NodeValue::Paragraph => {
                if self.tight_paragraph(node) {
                    return;
                }
                if entering {
                    self.cr();
                    self.open_tag("p", node);
                } else {
                    self.out.push_str("</p>\n");
                }
            }
            NodeValue::Text(text) => escape_html(&mut self.out, text),
            NodeValue::LineBreak => self.out.push_str("<br />\n"),
            NodeValue::SoftBreak => {
                if self.options.hard_breaks {
                    self.out.push_str("<br />\n");
                } else if self.options.no_breaks {
                    self.out.push(' ');
                } else {
                    self.out.push('\n');
                }
            }
            NodeValue::Code(code) => {
                self.out.push_str("<code>");
                escape_html(&mut self.out, code);
                self.out.push_str("</code>");
            }
            NodeValue::HtmlInline(html) => self.raw(html),
            NodeValue::CustomInline(custom) => {
                self.out
                    .push_str(if entering { &custom.on_enter } else { &custom.on_exit });
            }
            NodeValue::Strong => self.out.push_str(if entering { "<strong>" } else { "</strong>" }),
            NodeValue::Emph => self.out.push_str(if entering { "<em>" } else { "</em>" }),
            NodeValue::Link(link) => {
                if entering {
                    self.out.push_str("<a href=\"");
                    self.url(&link.url);
                    if !link.title.is_empty() {
                        self.out.push_str("\" title=\"");
                        escape_html(&mut self.out, &link.title);
                    }
                    self.out.push_str("\">");
                } else {
                    self.out.push_str("</a>");
                }
            }
            NodeValue::Image(link) => {
                if entering {
                    self.out.push_str("<img src=\"");
                    self.url(&link.url);
                    self.out.push_str("\" alt=\"");
                    self.plain = Some(node);
                } else {
                    if !link.title.is_empty() {
                        self.out.push_str("\" title=\"");
                        escape_html(&mut self.out, &link.title);
                    }
                    self.out.push_str("\" />");
                }
            }
        }
    }
}
