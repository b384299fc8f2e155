//! Streaming two-phase CommonMark parser.
//!
//! Phase one consumes the input line by line as it is fed, maintaining the
//! chain of open blocks from the document down to the innermost container.
//! Phase two runs when the parser is finished: the raw text accumulated by
//! every paragraph and heading is replaced by inline nodes.
//!
//! ```rust
//! use commark_core::{NodeKind, Options, Parser};
//!
//! let mut parser = Parser::new(Options::default()).unwrap();
//! parser.feed(b"# Title\n\nSome *text*");
//! parser.feed(b" continued\n");
//! let tree = parser.finish();
//!
//! let first = tree.first_child(tree.root()).unwrap();
//! assert_eq!(tree.kind(first), Some(NodeKind::Heading));
//! ```

use crate::ast::{ListDelim, ListMarker, ListType, NodeCodeBlock, NodeHeading, NodeHtmlBlock, NodeKind, NodeList, NodeValue};
use crate::error::ConfigError;
use crate::inline::{self, RefMap};
use crate::iter::{EventType, Walker};
use crate::lexer::LineSplitter;
use crate::options::Options;
use crate::scanners;
use crate::span::SourcePos;
use crate::strings::{is_line_end, is_space, is_space_or_tab, trim, unescape_backslashes, unescape_entities};
use crate::tree::{NodeId, Tree};

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

#[inline]
fn peek(line: &[u8], pos: usize) -> u8 {
    line.get(pos).copied().unwrap_or(0)
}

/// Incremental CommonMark parser.
///
/// Feed bytes in chunks of any size with [`feed`](Self::feed), then call
/// [`finish`](Self::finish) to obtain the document. `finish` consumes the
/// parser, so it cannot be fed again.
pub struct Parser {
    options: Options,
    tree: Tree,
    refmap: RefMap,
    splitter: LineSplitter,
    /// Innermost open block.
    current: NodeId,
    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    /// Length of the line being processed without its newline; `None`
    /// once input is exhausted.
    curline_len: Option<usize>,
    last_line_length: usize,
}

impl Parser {
    /// Create a parser, rejecting contradictory options.
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        options.validate()?;
        let mut tree = Tree::new();
        let root = tree.root();
        {
            let doc = tree.node_mut(root);
            doc.open = true;
            doc.sourcepos = Some(SourcePos::new(1, 1, 0, 0));
        }
        Ok(Self {
            options,
            tree,
            refmap: RefMap::default(),
            splitter: LineSplitter::new(options.validate_utf8),
            current: root,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            curline_len: None,
            last_line_length: 0,
        })
    }

    /// The options this parser was built with.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Append a chunk of input. Chunk boundaries may fall anywhere,
    /// including inside a line ending or a UTF-8 sequence.
    pub fn feed(&mut self, chunk: &[u8]) {
        tracing::trace!(bytes = chunk.len(), "feed");
        for line in self.splitter.feed(chunk) {
            self.process_line(&line);
        }
    }

    /// Close all blocks, parse inline content and return the document.
    pub fn finish(mut self) -> Tree {
        if let Some(line) = self.splitter.finish() {
            self.process_line(&line);
        }
        self.curline_len = None;
        let root = self.tree.root();
        while self.current != root {
            self.current = self.finalize(self.current);
        }
        self.finalize(root);
        self.process_inlines();
        self.tree.merge_text_runs(root);
        if !self.options.source_pos {
            self.strip_positions();
        }
        tracing::debug!(
            lines = self.line_number,
            nodes = self.tree.len(),
            references = self.refmap.len(),
            "parse finished"
        );
        self.tree
    }

    // ------------------------------------------------------------------
    // Line state
    // ------------------------------------------------------------------

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
        if self.first_nonspace <= self.offset {
            self.first_nonspace = self.offset;
            self.first_nonspace_column = self.column;
            loop {
                match peek(line, self.first_nonspace) {
                    b' ' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += 1;
                        chars_to_tab -= 1;
                        if chars_to_tab == 0 {
                            chars_to_tab = TAB_STOP;
                        }
                    }
                    b'\t' => {
                        self.first_nonspace += 1;
                        self.first_nonspace_column += chars_to_tab;
                        chars_to_tab = TAB_STOP;
                    }
                    _ => break,
                }
            }
        }
        self.indent = self.first_nonspace_column.saturating_sub(self.column);
        self.blank = is_line_end(peek(line, self.first_nonspace));
    }

    /// Advance by `count` bytes, or by `count` columns when `columns` is
    /// set, in which case a tab may be consumed partially.
    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 {
            let c = peek(line, self.offset);
            if c == 0 {
                break;
            }
            if c == b'\t' {
                let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                if columns {
                    self.partially_consumed_tab = chars_to_tab > count;
                    let advance = count.min(chars_to_tab);
                    self.column += advance;
                    if !self.partially_consumed_tab {
                        self.offset += 1;
                    }
                    count -= advance;
                } else {
                    self.partially_consumed_tab = false;
                    self.column += chars_to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                self.partially_consumed_tab = false;
                self.offset += 1;
                self.column += 1;
                count -= 1;
            }
        }
    }

    fn process_line(&mut self, line: &str) {
        let bytes = line.as_bytes();
        self.line_number += 1;
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        let len = line.strip_suffix('\n').unwrap_or(line).len();
        self.curline_len = Some(len);
        tracing::trace!(line = self.line_number, len, "process line");

        if let Some((last_matched, all_matched)) = self.check_open_blocks(bytes) {
            let mut container = last_matched;
            self.open_new_blocks(bytes, &mut container, all_matched);
            self.add_text_to_container(line, container, last_matched);
        }

        self.last_line_length = len;
        self.curline_len = None;
    }

    // ------------------------------------------------------------------
    // Step 1: continuation of open blocks
    // ------------------------------------------------------------------

    fn open_last_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree
            .node(id)
            .last_child
            .filter(|&child| self.tree.node(child).open)
    }

    /// Walk down the open blocks, consuming each one's continuation marker.
    /// Returns the deepest block that matched and whether all of them did,
    /// or `None` when the line closed a fenced code block.
    fn check_open_blocks(&mut self, line: &[u8]) -> Option<(NodeId, bool)> {
        let mut container = self.tree.root();
        let mut should_continue = true;
        let mut all_matched = true;
        while let Some(child) = self.open_last_child(container) {
            container = child;
            self.find_first_nonspace(line);
            let matched = match self.tree.node(container).kind() {
                NodeKind::BlockQuote => self.parse_block_quote_prefix(line),
                NodeKind::Item => self.parse_item_prefix(line, container),
                NodeKind::CodeBlock => self.parse_code_block_prefix(line, container, &mut should_continue),
                NodeKind::Heading => false,
                NodeKind::HtmlBlock => self.parse_html_block_prefix(container),
                NodeKind::Paragraph => !self.blank,
                _ => true,
            };
            if !matched {
                all_matched = false;
                break;
            }
        }
        if !all_matched {
            container = self.tree.node(container).parent.unwrap_or(self.tree.root());
        }
        should_continue.then_some((container, all_matched))
    }

    fn parse_block_quote_prefix(&mut self, line: &[u8]) -> bool {
        if self.indent <= 3 && peek(line, self.first_nonspace) == b'>' {
            self.advance_offset(line, self.indent + 1, true);
            if is_space_or_tab(peek(line, self.offset)) {
                self.advance_offset(line, 1, true);
            }
            return true;
        }
        false
    }

    fn parse_item_prefix(&mut self, line: &[u8], item: NodeId) -> bool {
        let node = self.tree.node(item);
        let width = node.marker.map_or(0, |m| m.marker_offset + m.padding);
        if self.indent >= width {
            self.advance_offset(line, width, true);
            return true;
        }
        if self.blank && node.first_child.is_some() {
            self.advance_offset(line, self.first_nonspace - self.offset, false);
            return true;
        }
        false
    }

    fn parse_code_block_prefix(&mut self, line: &[u8], code: NodeId, should_continue: &mut bool) -> bool {
        let (fenced, fence_char, fence_length, fence_offset) = match &self.tree.node(code).value {
            NodeValue::CodeBlock(c) => (c.fenced, c.fence_char, c.fence_length, c.fence_offset),
            _ => return false,
        };
        if !fenced {
            if self.indent >= CODE_INDENT {
                self.advance_offset(line, CODE_INDENT, true);
                return true;
            }
            if self.blank {
                self.advance_offset(line, self.first_nonspace - self.offset, false);
                return true;
            }
            return false;
        }

        let closing = if self.indent <= 3 && peek(line, self.first_nonspace) == fence_char {
            scanners::close_code_fence(&line[self.first_nonspace..]).unwrap_or(0)
        } else {
            0
        };
        if closing >= fence_length {
            *should_continue = false;
            self.advance_offset(line, closing, false);
            self.current = self.finalize(code);
            return false;
        }
        let mut skip = fence_offset;
        while skip > 0 && is_space_or_tab(peek(line, self.offset)) {
            self.advance_offset(line, 1, true);
            skip -= 1;
        }
        true
    }

    fn parse_html_block_prefix(&self, html: NodeId) -> bool {
        match &self.tree.node(html).value {
            NodeValue::HtmlBlock(h) => match h.block_type {
                1..=5 => true,
                6 | 7 => !self.blank,
                _ => false,
            },
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Step 2: new block starts
    // ------------------------------------------------------------------

    fn open_new_blocks(&mut self, line: &[u8], container: &mut NodeId, all_matched: bool) {
        let mut maybe_lazy = self.tree.node(self.current).kind() == NodeKind::Paragraph;
        let mut cont_type = self.tree.node(*container).kind();

        while cont_type != NodeKind::CodeBlock && cont_type != NodeKind::HtmlBlock {
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;
            let rest = &line[self.first_nonspace.min(line.len())..];

            if !indented && peek(line, self.first_nonspace) == b'>' {
                let start = self.first_nonspace;
                self.advance_offset(line, self.first_nonspace + 1 - self.offset, false);
                if is_space_or_tab(peek(line, self.offset)) {
                    self.advance_offset(line, 1, true);
                }
                *container = self.add_child(*container, NodeValue::BlockQuote, start + 1);
            } else if let Some(matched) = (!indented).then(|| scanners::atx_heading_start(rest)).flatten() {
                let start = self.first_nonspace;
                let level = rest.iter().take_while(|&&b| b == b'#').count() as u8;
                self.advance_offset(line, self.first_nonspace + matched - self.offset, false);
                *container = self.add_child(*container, NodeValue::heading(level), start + 1);
            } else if let Some(matched) = (!indented).then(|| scanners::open_code_fence(rest)).flatten() {
                let code = NodeCodeBlock {
                    fenced: true,
                    fence_char: rest[0],
                    fence_length: matched,
                    fence_offset: self.first_nonspace - self.offset,
                    ..NodeCodeBlock::default()
                };
                *container = self.add_child(*container, NodeValue::CodeBlock(code), self.first_nonspace + 1);
                self.advance_offset(line, self.first_nonspace + matched - self.offset, false);
            } else if let Some(block_type) = (!indented)
                .then(|| {
                    scanners::html_block_start(rest).or_else(|| {
                        (cont_type != NodeKind::Paragraph)
                            .then(|| scanners::html_block_start_7(rest))
                            .flatten()
                    })
                })
                .flatten()
            {
                let html = NodeHtmlBlock {
                    literal: String::new(),
                    block_type,
                };
                *container = self.add_child(*container, NodeValue::HtmlBlock(html), self.first_nonspace + 1);
            } else if let Some(level) = (!indented && cont_type == NodeKind::Paragraph)
                .then(|| scanners::setext_heading_line(rest))
                .flatten()
            {
                if self.resolve_reference_definitions(*container) {
                    self.tree.node_mut(*container).value = NodeValue::Heading(NodeHeading { level, setext: true });
                    self.advance_offset(line, line.len().saturating_sub(1 + self.offset), false);
                }
            } else if !indented
                && !(cont_type == NodeKind::Paragraph && !all_matched)
                && scanners::thematic_break(rest).is_some()
            {
                *container = self.add_child(*container, NodeValue::ThematicBreak, self.first_nonspace + 1);
                self.advance_offset(line, line.len().saturating_sub(1 + self.offset), false);
            } else if let Some((matched, mut marker)) = ((!indented || cont_type == NodeKind::List)
                && self.indent < 4)
                .then(|| parse_list_marker(line, self.first_nonspace, cont_type == NodeKind::Paragraph))
                .flatten()
            {
                self.advance_offset(line, self.first_nonspace + matched - self.offset, false);
                let saved = (self.offset, self.column, self.partially_consumed_tab);
                while self.column - saved.1 <= 5 && is_space_or_tab(peek(line, self.offset)) {
                    self.advance_offset(line, 1, true);
                }
                let spaces = self.column - saved.1;
                if spaces >= 5 || spaces < 1 || is_line_end(peek(line, self.offset)) {
                    marker.padding = matched + 1;
                    (self.offset, self.column, self.partially_consumed_tab) = saved;
                    if spaces > 0 {
                        self.advance_offset(line, 1, true);
                    }
                } else {
                    marker.padding = matched + spaces;
                }
                marker.marker_offset = self.indent;

                let continues = cont_type == NodeKind::List
                    && self
                        .tree
                        .node(*container)
                        .marker
                        .is_some_and(|m| m.matches(&marker));
                if !continues {
                    let list = NodeList {
                        list_type: marker.list_type,
                        delimiter: marker.delimiter,
                        start: marker.start,
                        tight: false,
                    };
                    *container = self.add_child(*container, NodeValue::List(list), self.first_nonspace + 1);
                    self.tree.node_mut(*container).marker = Some(marker);
                }
                *container = self.add_child(*container, NodeValue::Item, self.first_nonspace + 1);
                self.tree.node_mut(*container).marker = Some(marker);
            } else if indented && !maybe_lazy && !self.blank {
                self.advance_offset(line, CODE_INDENT, true);
                *container = self.add_child(
                    *container,
                    NodeValue::CodeBlock(NodeCodeBlock::default()),
                    self.offset + 1,
                );
            } else {
                break;
            }

            cont_type = self.tree.node(*container).kind();
            if cont_type.accepts_lines() {
                break;
            }
            maybe_lazy = false;
        }
    }

    /// Attach a new open block, closing blocks that cannot hold it.
    fn add_child(&mut self, mut parent: NodeId, value: NodeValue, start_column: usize) -> NodeId {
        let kind = value.kind();
        while !self.tree.node(parent).kind().can_contain(kind) {
            parent = self.finalize(parent);
        }
        let child = self.tree.new_node(value);
        {
            let node = self.tree.node_mut(child);
            node.open = true;
            node.sourcepos = Some(SourcePos::new(self.line_number, start_column, self.line_number, 0));
        }
        self.tree.attach_last(parent, child);
        child
    }

    // ------------------------------------------------------------------
    // Step 3: line content
    // ------------------------------------------------------------------

    fn add_text_to_container(&mut self, line: &str, mut container: NodeId, last_matched: NodeId) {
        let bytes = line.as_bytes();
        self.find_first_nonspace(bytes);

        if self.blank {
            if let Some(last) = self.tree.node(container).last_child {
                self.tree.node_mut(last).last_line_blank = true;
            }
        }

        let node = self.tree.node(container);
        let last_line_blank = self.blank
            && match &node.value {
                NodeValue::BlockQuote | NodeValue::Heading(_) | NodeValue::ThematicBreak => false,
                NodeValue::CodeBlock(c) => !c.fenced,
                NodeValue::Item => {
                    node.first_child.is_some()
                        || node.sourcepos.map_or(0, |p| p.start_line) != self.line_number
                }
                _ => true,
            };
        self.tree.node_mut(container).last_line_blank = last_line_blank;
        let mut ancestor = self.tree.node(container).parent;
        while let Some(a) = ancestor {
            let node = self.tree.node_mut(a);
            node.last_line_blank = false;
            ancestor = node.parent;
        }

        let lazy = self.current != last_matched
            && container == last_matched
            && !self.blank
            && self.tree.node(self.current).kind() == NodeKind::Paragraph;
        if lazy {
            self.add_line(line, self.current, line.len());
            return;
        }

        while self.current != last_matched {
            self.current = self.finalize(self.current);
        }

        match self.tree.node(container).kind() {
            NodeKind::CodeBlock => self.add_line(line, container, line.len()),
            NodeKind::HtmlBlock => {
                self.add_line(line, container, line.len());
                let block_type = match &self.tree.node(container).value {
                    NodeValue::HtmlBlock(h) => h.block_type,
                    _ => 0,
                };
                if scanners::html_block_end(block_type, &bytes[self.first_nonspace.min(bytes.len())..]) {
                    container = self.finalize(container);
                }
            }
            _ if self.blank => {}
            kind if kind.accepts_lines() => {
                let end = match &self.tree.node(container).value {
                    NodeValue::Heading(h) if !h.setext => chop_trailing_hashes(bytes),
                    _ => bytes.len(),
                };
                self.advance_offset(bytes, self.first_nonspace - self.offset, false);
                self.add_line(line, container, end);
            }
            _ => {
                container = self.add_child(container, NodeValue::Paragraph, self.first_nonspace + 1);
                self.advance_offset(bytes, self.first_nonspace - self.offset, false);
                self.add_line(line, container, line.len());
            }
        }
        self.current = container;
    }

    fn add_line(&mut self, line: &str, target: NodeId, end: usize) {
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            let content = &mut self.tree.node_mut(target).content;
            content.extend(std::iter::repeat(' ').take(chars_to_tab));
        }
        let text = line.get(self.offset..end).unwrap_or("");
        self.tree.node_mut(target).content.push_str(text);
    }

    // ------------------------------------------------------------------
    // Block finalisation
    // ------------------------------------------------------------------

    /// Close a block and return its parent.
    fn finalize(&mut self, id: NodeId) -> NodeId {
        let parent = self.tree.node(id).parent;
        let ends_here = match &self.tree.node(id).value {
            NodeValue::Document => true,
            NodeValue::CodeBlock(c) => c.fenced,
            NodeValue::Heading(h) => h.setext,
            _ => false,
        };
        let (end_line, end_column) = match self.curline_len {
            None => (self.line_number, self.last_line_length),
            Some(len) if ends_here => (self.line_number, len),
            Some(_) => (self.line_number.saturating_sub(1), self.last_line_length),
        };
        {
            let node = self.tree.node_mut(id);
            node.open = false;
            if let Some(pos) = node.sourcepos.as_mut() {
                pos.end_line = end_line;
                pos.end_column = end_column;
            }
        }

        match self.tree.node(id).kind() {
            NodeKind::Paragraph => {
                if !self.resolve_reference_definitions(id) {
                    self.tree.remove(id);
                }
            }
            NodeKind::CodeBlock => self.finalize_code_block(id),
            NodeKind::HtmlBlock => {
                let node = self.tree.node_mut(id);
                let content = std::mem::take(&mut node.content);
                if let NodeValue::HtmlBlock(html) = &mut node.value {
                    html.literal = content;
                }
            }
            NodeKind::List => {
                let tight = self.list_is_tight(id);
                if let NodeValue::List(list) = &mut self.tree.node_mut(id).value {
                    list.tight = tight;
                }
            }
            _ => {}
        }
        parent.unwrap_or(self.tree.root())
    }

    fn finalize_code_block(&mut self, id: NodeId) {
        let node = self.tree.node_mut(id);
        let mut content = std::mem::take(&mut node.content);
        let NodeValue::CodeBlock(code) = &mut node.value else {
            return;
        };
        if code.fenced {
            let first_end = content
                .bytes()
                .position(is_line_end)
                .unwrap_or(content.len());
            let info = &content[..first_end];
            code.info = if info.is_empty() {
                String::new()
            } else {
                let decoded = unescape_entities(info);
                unescape_backslashes(trim(&decoded)).into_owned()
            };
            let mut body_start = first_end;
            if content.as_bytes().get(body_start) == Some(&b'\r') {
                body_start += 1;
            }
            if content.as_bytes().get(body_start) == Some(&b'\n') {
                body_start += 1;
            }
            content.drain(..body_start);
        } else {
            remove_trailing_blank_lines(&mut content);
            content.push('\n');
        }
        code.literal = content;
    }

    fn list_is_tight(&self, list: NodeId) -> bool {
        for item in self.tree.children(list) {
            let item_node = self.tree.node(item);
            if item_node.last_line_blank && item_node.next.is_some() {
                return false;
            }
            for sub in self.tree.children(item) {
                if (item_node.next.is_some() || self.tree.node(sub).next.is_some()) && self.ends_with_blank_line(sub) {
                    return false;
                }
            }
        }
        true
    }

    fn ends_with_blank_line(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.tree.node(c);
            if node.last_line_blank {
                return true;
            }
            cur = match node.kind() {
                NodeKind::List | NodeKind::Item => node.last_child,
                _ => None,
            };
        }
        false
    }

    /// Strip leading reference definitions from a paragraph's text.
    /// Returns whether any non-blank text remains.
    fn resolve_reference_definitions(&mut self, id: NodeId) -> bool {
        let content = std::mem::take(&mut self.tree.node_mut(id).content);
        let mut pos = 0;
        while content.as_bytes().get(pos) == Some(&b'[') {
            match inline::parse_reference(&content[pos..], &mut self.refmap) {
                Some(len) => pos += len,
                None => break,
            }
        }
        if pos > 0 {
            tracing::trace!(line = self.line_number, refs = self.refmap.len(), "reference definitions resolved");
        }
        let rest = content.get(pos..).unwrap_or("").to_owned();
        let has_content = !rest.bytes().all(is_space);
        self.tree.node_mut(id).content = rest;
        has_content
    }

    // ------------------------------------------------------------------
    // Phase two
    // ------------------------------------------------------------------

    fn process_inlines(&mut self) {
        let mut leaves = Vec::new();
        let mut walker = Walker::new(self.tree.root());
        while let Some((id, event)) = walker.next(&self.tree) {
            if event == EventType::Enter
                && matches!(self.tree.node(id).kind(), NodeKind::Paragraph | NodeKind::Heading)
            {
                leaves.push(id);
            }
        }
        for id in leaves {
            let content = std::mem::take(&mut self.tree.node_mut(id).content);
            inline::parse_inlines(&mut self.tree, id, &content, &self.refmap, &self.options);
        }
    }

    fn strip_positions(&mut self) {
        let mut walker = Walker::new(self.tree.root());
        while let Some((id, event)) = walker.next(&self.tree) {
            if event == EventType::Enter {
                self.tree.node_mut(id).sourcepos = None;
            }
        }
    }
}

/// Parse a complete document in one call.
///
/// ```rust
/// use commark_core::{parse_document, NodeKind, Options};
///
/// let tree = parse_document("> quote", Options::default()).unwrap();
/// let quote = tree.first_child(tree.root()).unwrap();
/// assert_eq!(tree.kind(quote), Some(NodeKind::BlockQuote));
/// ```
pub fn parse_document(text: &str, options: Options) -> Result<Tree, ConfigError> {
    let mut parser = Parser::new(options)?;
    parser.feed(text.as_bytes());
    Ok(parser.finish())
}

/// Recognise a list marker at `pos`. Returns the marker width and its data;
/// offset and padding are filled in by the caller.
fn parse_list_marker(line: &[u8], pos: usize, interrupts_paragraph: bool) -> Option<(usize, ListMarker)> {
    let start = pos;
    let mut pos = pos;
    let c = peek(line, pos);
    let has_content_after = |from: usize| {
        let mut i = from;
        while is_space_or_tab(peek(line, i)) {
            i += 1;
        }
        !is_line_end(peek(line, i))
    };

    let marker = if matches!(c, b'*' | b'-' | b'+') {
        pos += 1;
        if !is_space(peek(line, pos)) {
            return None;
        }
        if interrupts_paragraph && !has_content_after(pos) {
            return None;
        }
        ListMarker {
            list_type: ListType::Bullet,
            delimiter: ListDelim::None,
            start: 0,
            bullet_char: c,
            marker_offset: 0,
            padding: 0,
        }
    } else if c.is_ascii_digit() {
        let mut number = 0usize;
        let mut digits = 0;
        while digits < 9 && peek(line, pos).is_ascii_digit() {
            number = number * 10 + usize::from(peek(line, pos) - b'0');
            pos += 1;
            digits += 1;
        }
        if interrupts_paragraph && number != 1 {
            return None;
        }
        let delimiter = match peek(line, pos) {
            b'.' => ListDelim::Period,
            b')' => ListDelim::Paren,
            _ => return None,
        };
        pos += 1;
        if !is_space(peek(line, pos)) {
            return None;
        }
        if interrupts_paragraph && !has_content_after(pos) {
            return None;
        }
        ListMarker {
            list_type: ListType::Ordered,
            delimiter,
            start: number,
            bullet_char: 0,
            marker_offset: 0,
            padding: 0,
        }
    } else {
        return None;
    };
    Some((pos - start, marker))
}

/// End of an ATX heading's content once a closing `#` sequence is removed.
fn chop_trailing_hashes(line: &[u8]) -> usize {
    let trimmed = rtrim_len(line);
    let mut len = trimmed;
    while len > 0 && line[len - 1] == b'#' {
        len -= 1;
    }
    if len != trimmed && len > 0 && is_space_or_tab(line[len - 1]) {
        rtrim_len(&line[..len - 1])
    } else {
        trimmed
    }
}

fn rtrim_len(s: &[u8]) -> usize {
    s.iter().rposition(|&b| !is_space(b)).map_or(0, |p| p + 1)
}

fn remove_trailing_blank_lines(s: &mut String) {
    let bytes = s.as_bytes();
    match bytes
        .iter()
        .rposition(|&b| !is_space_or_tab(b) && !is_line_end(b))
    {
        None => s.clear(),
        Some(last) => {
            if let Some(nl) = bytes[last..].iter().position(|&b| is_line_end(b)) {
                s.truncate(last + nl);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chop_trailing_hashes() {
        assert_eq!(chop_trailing_hashes(b"# foo ##\n"), 5);
        assert_eq!(chop_trailing_hashes(b"# foo#\n"), 6);
        assert_eq!(chop_trailing_hashes(b"###\n"), 3);
    }

    #[test]
    fn test_parse_list_marker() {
        let (width, marker) = parse_list_marker(b"12) x\n", 0, false).unwrap();
        assert_eq!(width, 3);
        assert_eq!(marker.start, 12);
        assert_eq!(marker.delimiter, ListDelim::Paren);
        assert!(parse_list_marker(b"2. x\n", 0, true).is_none());
        assert!(parse_list_marker(b"-\n", 0, true).is_none());
        assert!(parse_list_marker(b"-x\n", 0, false).is_none());
    }

    #[test]
    fn test_remove_trailing_blank_lines() {
        let mut s = String::from("code\n\n  \n");
        remove_trailing_blank_lines(&mut s);
        assert_eq!(s, "code");
    }
}
