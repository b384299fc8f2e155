//! # Commark Core
//!
//! A streaming CommonMark parser with an editable AST.
//!
//! Input is fed to a [`Parser`] in chunks of any size; finishing the parser
//! yields a [`Tree`], an arena of nodes addressed by [`NodeId`] handles. The
//! tree can be walked in document order, edited with checked structural
//! operations, and rendered as HTML, XML, groff man, LaTeX or CommonMark.
//!
//! ## Quick Start
//!
//! ```rust
//! use commark_core::{parse_document, render_html, Options};
//!
//! let options = Options::default();
//! let tree = parse_document("# Hello\n\nSome *emphasis*.", options).unwrap();
//! assert_eq!(
//!     render_html(&tree, &options),
//!     "<h1>Hello</h1>\n<p>Some <em>emphasis</em>.</p>\n"
//! );
//! ```
//!
//! ## Streaming
//!
//! Chunk boundaries may fall anywhere, even inside a line ending or a
//! multi-byte character:
//!
//! ```rust
//! use commark_core::{render_xml, Options, Parser};
//!
//! let mut parser = Parser::new(Options::default()).unwrap();
//! parser.feed(b"- a\r");
//! parser.feed(b"\n- b\n");
//! let tree = parser.finish();
//! assert!(render_xml(&tree, &Options::default()).contains("tight=\"true\""));
//! ```
//!
//! ## Editing
//!
//! ```rust
//! use commark_core::{parse_document, render_html, NodeValue, Options};
//!
//! let mut tree = parse_document("Hello", Options::default()).unwrap();
//! let para = tree.first_child(tree.root()).unwrap();
//! let text = tree.new_node(NodeValue::text(", world"));
//! tree.append_child(para, text).unwrap();
//! tree.consolidate_text_nodes(para).unwrap();
//!
//! assert_eq!(render_html(&tree, &Options::default()), "<p>Hello, world</p>\n");
//! ```
//!
//! ## Output formats
//!
//! - [`render_html`] - HTML fragments, with safe mode for untrusted input
//! - [`render_xml`] - full structural dump following the CommonMark DTD
//! - [`render_man`] / [`render_latex`] - text formats with optional wrapping
//! - [`render_commonmark`] - normalised Markdown that re-parses to the same HTML

pub mod ast;
pub mod error;
mod inline;
pub mod iter;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod render;
mod scanners;
pub mod span;
mod strings;
pub mod tree;

pub use ast::{
    ListDelim, ListType, NodeCodeBlock, NodeCustom, NodeHeading, NodeHtmlBlock, NodeKind, NodeLink, NodeList,
    NodeValue,
};
pub use error::{ConfigError, EditError};
pub use iter::{EventType, Traverse, Walker};
pub use options::Options;
pub use parser::{parse_document, Parser};
pub use render::{render_commonmark, render_html, render_latex, render_man, render_xml};
pub use span::SourcePos;
pub use tree::{Node, NodeId, Tree};
