//! XML output following the CommonMark DTD.

use crate::ast::{ListDelim, ListType, NodeValue};
use crate::iter::EventType;
use crate::options::Options;
use crate::strings::escape_html;
use crate::tree::Tree;

use super::walk;

const MAX_INDENT: usize = 40;

/// Render the whole tree as XML, one element per node.
pub fn render_xml(tree: &Tree, options: &Options) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE document SYSTEM \"CommonMark.dtd\">\n");
    let mut indent = 0usize;

    walk(tree, tree.root(), |node, event| {
        let Some(value) = tree.value(node) else {
            return true;
        };
        let name = value.kind().type_string();
        let has_children = tree.first_child(node).is_some();

        if event == EventType::Exit {
            if has_children {
                indent -= 2;
                push_indent(&mut xml, indent);
                xml.push_str("</");
                xml.push_str(name);
                xml.push_str(">\n");
            }
            return true;
        }

        push_indent(&mut xml, indent);
        xml.push('<');
        xml.push_str(name);
        if options.source_pos {
            if let Some(pos) = tree.sourcepos(node) {
                xml.push_str(&format!(" sourcepos=\"{pos}\""));
            }
        }

        let mut literal = None;
        match value {
            NodeValue::Document => xml.push_str(" xmlns=\"http://commonmark.org/xml/1.0\""),
            NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::HtmlInline(s) => literal = Some(s.as_str()),
            NodeValue::HtmlBlock(block) => literal = Some(block.literal.as_str()),
            NodeValue::List(list) => {
                match list.list_type {
                    ListType::Ordered => {
                        xml.push_str(&format!(" type=\"ordered\" start=\"{}\"", list.start));
                        match list.delimiter {
                            ListDelim::Paren => xml.push_str(" delim=\"paren\""),
                            ListDelim::Period => xml.push_str(" delim=\"period\""),
                            ListDelim::None => {}
                        }
                    }
                    ListType::Bullet => xml.push_str(" type=\"bullet\""),
                }
                xml.push_str(&format!(" tight=\"{}\"", list.tight));
            }
            NodeValue::Heading(heading) => xml.push_str(&format!(" level=\"{}\"", heading.level)),
            NodeValue::CodeBlock(code) => {
                if !code.info.is_empty() {
                    attribute(&mut xml, "info", &code.info);
                }
                literal = Some(code.literal.as_str());
            }
            NodeValue::CustomBlock(custom) | NodeValue::CustomInline(custom) => {
                attribute(&mut xml, "on_enter", &custom.on_enter);
                attribute(&mut xml, "on_exit", &custom.on_exit);
            }
            NodeValue::Link(link) | NodeValue::Image(link) => {
                attribute(&mut xml, "destination", &link.url);
                attribute(&mut xml, "title", &link.title);
            }
            _ => {}
        }

        if let Some(text) = literal {
            xml.push_str(" xml:space=\"preserve\">");
            escape_html(&mut xml, text);
            xml.push_str("</");
            xml.push_str(name);
        } else if has_children {
            indent += 2;
        } else {
            xml.push_str(" /");
        }
        xml.push_str(">\n");
        true
    });
    xml
}

fn attribute(xml: &mut String, name: &str, value: &str) {
    xml.push(' ');
    xml.push_str(name);
    xml.push_str("=\"");
    escape_html(xml, value);
    xml.push('"');
}

fn push_indent(xml: &mut String, indent: usize) {
    xml.extend(std::iter::repeat(' ').take(indent.min(MAX_INDENT)));
}
