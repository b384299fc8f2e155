//! Node kinds and per-kind payloads of the CommonMark AST.
//!
//! The set of kinds is closed. Each [`NodeValue`] variant carries only the
//! fields meaningful for its kind, so reading a foreign field is a checked
//! failure on [`Tree`](crate::Tree) rather than a silent default.

use std::fmt;

/// The kind of a node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // Blocks
    Document,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    HtmlBlock,
    CustomBlock,
    Paragraph,
    Heading,
    ThematicBreak,
    // Inlines
    Text,
    SoftBreak,
    LineBreak,
    Code,
    HtmlInline,
    CustomInline,
    Emph,
    Strong,
    Link,
    Image,
}

impl NodeKind {
    /// Name of the kind as used in XML output.
    pub const fn type_string(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::BlockQuote => "block_quote",
            NodeKind::List => "list",
            NodeKind::Item => "item",
            NodeKind::CodeBlock => "code_block",
            NodeKind::HtmlBlock => "html_block",
            NodeKind::CustomBlock => "custom_block",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading => "heading",
            NodeKind::ThematicBreak => "thematic_break",
            NodeKind::Text => "text",
            NodeKind::SoftBreak => "softbreak",
            NodeKind::LineBreak => "linebreak",
            NodeKind::Code => "code",
            NodeKind::HtmlInline => "html_inline",
            NodeKind::CustomInline => "custom_inline",
            NodeKind::Emph => "emph",
            NodeKind::Strong => "strong",
            NodeKind::Link => "link",
            NodeKind::Image => "image",
        }
    }

    /// Whether this is a block-level kind.
    pub const fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::BlockQuote
                | NodeKind::List
                | NodeKind::Item
                | NodeKind::CodeBlock
                | NodeKind::HtmlBlock
                | NodeKind::CustomBlock
                | NodeKind::Paragraph
                | NodeKind::Heading
                | NodeKind::ThematicBreak
        )
    }

    /// Whether this is an inline-level kind.
    pub const fn is_inline(self) -> bool {
        !self.is_block()
    }

    /// Whether nodes of this kind never have children.
    ///
    /// Leaves emit `Enter` immediately followed by `Exit` during traversal.
    pub const fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeKind::CodeBlock
                | NodeKind::HtmlBlock
                | NodeKind::ThematicBreak
                | NodeKind::Text
                | NodeKind::SoftBreak
                | NodeKind::LineBreak
                | NodeKind::Code
                | NodeKind::HtmlInline
        )
    }

    /// Whether a node of this kind may hold a child of kind `child`.
    pub const fn can_contain(self, child: NodeKind) -> bool {
        if matches!(child, NodeKind::Document) {
            return false;
        }
        match self {
            NodeKind::Document | NodeKind::BlockQuote | NodeKind::Item => {
                child.is_block() && !matches!(child, NodeKind::Item)
            }
            NodeKind::List => matches!(child, NodeKind::Item),
            NodeKind::CustomBlock => true,
            NodeKind::Paragraph
            | NodeKind::Heading
            | NodeKind::Emph
            | NodeKind::Strong
            | NodeKind::Link
            | NodeKind::Image
            | NodeKind::CustomInline => child.is_inline(),
            _ => false,
        }
    }

    /// Whether blocks of this kind accumulate raw lines while parsing.
    pub(crate) const fn accepts_lines(self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading | NodeKind::CodeBlock
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_string())
    }
}

/// Bullet or ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    #[default]
    Bullet,
    Ordered,
}

/// Delimiter following an ordered list number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListDelim {
    /// Bullet lists have no delimiter.
    #[default]
    None,
    /// `1.`
    Period,
    /// `1)`
    Paren,
}

/// Payload of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeList {
    pub list_type: ListType,
    pub delimiter: ListDelim,
    /// First number of an ordered list; `0` for bullet lists.
    pub start: usize,
    /// Items render without paragraph markup.
    pub tight: bool,
}

/// Payload of a code block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeCodeBlock {
    /// Whether the block was written with a fence.
    pub fenced: bool,
    /// Text following the opening fence, unescaped.
    pub info: String,
    /// The code, including the final newline.
    pub literal: String,
    pub(crate) fence_char: u8,
    pub(crate) fence_length: usize,
    pub(crate) fence_offset: usize,
}

/// Payload of a raw HTML block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeHtmlBlock {
    pub literal: String,
    /// Which of the seven start conditions opened the block (1..=7).
    pub(crate) block_type: u8,
}

/// Payload of a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeading {
    /// 1..=6
    pub level: u8,
    /// Underlined (`===`/`---`) rather than `#`-prefixed.
    pub setext: bool,
}

/// Payload of a link or image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeLink {
    pub url: String,
    pub title: String,
}

/// Payload of a custom block or inline: literal text emitted verbatim
/// before and after the children by every renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeCustom {
    pub on_enter: String,
    pub on_exit: String,
}

/// A node's kind together with its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Document,
    BlockQuote,
    List(NodeList),
    Item,
    CodeBlock(NodeCodeBlock),
    HtmlBlock(NodeHtmlBlock),
    CustomBlock(NodeCustom),
    Paragraph,
    Heading(NodeHeading),
    ThematicBreak,
    Text(String),
    SoftBreak,
    LineBreak,
    Code(String),
    HtmlInline(String),
    CustomInline(NodeCustom),
    Emph,
    Strong,
    Link(NodeLink),
    Image(NodeLink),
}

impl NodeValue {
    /// The kind of this value.
    pub const fn kind(&self) -> NodeKind {
        match self {
            NodeValue::Document => NodeKind::Document,
            NodeValue::BlockQuote => NodeKind::BlockQuote,
            NodeValue::List(_) => NodeKind::List,
            NodeValue::Item => NodeKind::Item,
            NodeValue::CodeBlock(_) => NodeKind::CodeBlock,
            NodeValue::HtmlBlock(_) => NodeKind::HtmlBlock,
            NodeValue::CustomBlock(_) => NodeKind::CustomBlock,
            NodeValue::Paragraph => NodeKind::Paragraph,
            NodeValue::Heading(_) => NodeKind::Heading,
            NodeValue::ThematicBreak => NodeKind::ThematicBreak,
            NodeValue::Text(_) => NodeKind::Text,
            NodeValue::SoftBreak => NodeKind::SoftBreak,
            NodeValue::LineBreak => NodeKind::LineBreak,
            NodeValue::Code(_) => NodeKind::Code,
            NodeValue::HtmlInline(_) => NodeKind::HtmlInline,
            NodeValue::CustomInline(_) => NodeKind::CustomInline,
            NodeValue::Emph => NodeKind::Emph,
            NodeValue::Strong => NodeKind::Strong,
            NodeValue::Link(_) => NodeKind::Link,
            NodeValue::Image(_) => NodeKind::Image,
        }
    }

    /// A heading of the given level.
    pub fn heading(level: u8) -> Self {
        NodeValue::Heading(NodeHeading {
            level,
            setext: false,
        })
    }

    /// A text node.
    pub fn text(literal: impl Into<String>) -> Self {
        NodeValue::Text(literal.into())
    }

    /// A link with the given destination and title.
    pub fn link(url: impl Into<String>, title: impl Into<String>) -> Self {
        NodeValue::Link(NodeLink {
            url: url.into(),
            title: title.into(),
        })
    }

    /// The literal text of literal-bearing kinds.
    pub fn literal(&self) -> Option<&str> {
        match self {
            NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::HtmlInline(s) => Some(s),
            NodeValue::CodeBlock(c) => Some(&c.literal),
            NodeValue::HtmlBlock(h) => Some(&h.literal),
            _ => None,
        }
    }

    pub(crate) fn literal_mut(&mut self) -> Option<&mut String> {
        match self {
            NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::HtmlInline(s) => Some(s),
            NodeValue::CodeBlock(c) => Some(&mut c.literal),
            NodeValue::HtmlBlock(h) => Some(&mut h.literal),
            _ => None,
        }
    }
}

/// Marker data kept on list and item nodes while the block parser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListMarker {
    pub list_type: ListType,
    pub delimiter: ListDelim,
    pub start: usize,
    pub bullet_char: u8,
    pub marker_offset: usize,
    pub padding: usize,
}

impl ListMarker {
    /// Whether an item with this marker continues a list opened by `other`.
    pub fn matches(&self, other: &ListMarker) -> bool {
        self.list_type == other.list_type
            && self.delimiter == other.delimiter
            && self.bullet_char == other.bullet_char
    }
}
