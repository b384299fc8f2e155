//! Inline parser.
//!
//! Runs once per paragraph or heading after block structure is final,
//! replacing the block's raw text with inline nodes. Emphasis and links are
//! resolved with two stacks: a delimiter list for `*`, `_` and smart quotes,
//! and a bracket stack for `[` and `![`.
//!
//! Link reference definitions are parsed here as well, since they share the
//! label, destination and title grammar with inline links.

use std::collections::HashMap;

use memchr::memchr;

use crate::ast::{NodeLink, NodeValue};
use crate::options::Options;
use crate::scanners::{self, HtmlScanState};
use crate::strings::{
    clean_title, clean_url, decode_entity, is_line_end, is_space, is_unicode_punct, is_unicode_space,
    normalize_label, rtrim, trim, unescape_entities,
};
use crate::tree::{NodeId, Tree};

const MAX_LINK_LABEL_LENGTH: usize = 999;
const MAX_BACKTICKS: usize = 80;
const MAX_LINK_PAREN_DEPTH: usize = 32;

const LEFT_SINGLE_QUOTE: &str = "\u{2018}";
const RIGHT_SINGLE_QUOTE: &str = "\u{2019}";
const LEFT_DOUBLE_QUOTE: &str = "\u{201c}";
const RIGHT_DOUBLE_QUOTE: &str = "\u{201d}";
const EN_DASH: &str = "\u{2013}";
const EM_DASH: &str = "\u{2014}";
const ELLIPSIS: &str = "\u{2026}";

/// Destination and title of a link reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkRef {
    pub url: String,
    pub title: String,
}

/// Reference definitions keyed by normalised label.
pub(crate) type RefMap = HashMap<String, LinkRef>;

#[inline]
fn is_special(b: u8, smart: bool) -> bool {
    matches!(
        b,
        b'\n' | b'\r' | b'!' | b'&' | b'*' | b'<' | b'[' | b'\\' | b']' | b'_' | b'`'
    ) || (smart && matches!(b, b'"' | b'\'' | b'-' | b'.'))
}

/// Byte cursor over the text being parsed.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    #[inline]
    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    #[inline]
    fn peek(&self) -> u8 {
        self.peek_at(self.pos)
    }

    #[inline]
    fn peek_at(&self, pos: usize) -> u8 {
        self.bytes().get(pos).copied().unwrap_or(0)
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_spaces(&mut self) {
        while matches!(self.peek(), b' ' | b'\t') {
            self.advance();
        }
    }

    /// Skip one line ending. End of input counts as one.
    fn skip_line_end(&mut self) -> bool {
        let mut seen = false;
        if self.peek() == b'\r' {
            self.advance();
            seen = true;
        }
        if self.peek() == b'\n' {
            self.advance();
            seen = true;
        }
        seen || self.is_eof()
    }

    /// Spaces, at most one line ending, spaces.
    fn spnl(&mut self) {
        self.skip_spaces();
        if self.skip_line_end() {
            self.skip_spaces();
        }
    }

    /// A `[label]`, returned trimmed and without brackets.
    fn link_label(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if self.peek() != b'[' {
            return None;
        }
        self.advance();
        let mut length = 0;
        while !self.is_eof() && !matches!(self.peek(), b'[' | b']') {
            if self.peek() == b'\\' {
                self.advance();
                length += 1;
                if self.peek().is_ascii_punctuation() {
                    self.advance();
                    length += 1;
                }
            } else {
                self.advance();
                length += 1;
            }
            if length > MAX_LINK_LABEL_LENGTH {
                self.pos = start;
                return None;
            }
        }
        if self.peek() == b']' {
            let raw = self.input.get(start + 1..self.pos).unwrap_or("");
            self.advance();
            return Some(trim(raw));
        }
        self.pos = start;
        None
    }

    /// A link destination starting at `offset`, in `<…>` or bare form.
    /// Returns the number of bytes consumed and the destination text.
    fn scan_link_url(&self, offset: usize) -> Option<(usize, &'a str)> {
        let bytes = self.bytes();
        let mut i = offset;
        if bytes.get(i) == Some(&b'<') {
            i += 1;
            loop {
                match bytes.get(i)? {
                    b'>' => {
                        i += 1;
                        break;
                    }
                    b'\\' => i += 2,
                    b'\n' | b'<' => return None,
                    _ => i += 1,
                }
            }
            if i >= bytes.len() {
                return None;
            }
            return Some((i - offset, self.input.get(offset + 1..i - 1)?));
        }

        let mut depth = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == b'\\' && bytes.get(i + 1).is_some_and(u8::is_ascii_punctuation) {
                i += 2;
            } else if b == b'(' {
                depth += 1;
                i += 1;
                if depth > MAX_LINK_PAREN_DEPTH {
                    return None;
                }
            } else if b == b')' {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                i += 1;
            } else if is_space(b) || b.is_ascii_control() {
                if i == offset {
                    return None;
                }
                break;
            } else {
                i += 1;
            }
        }
        if i >= bytes.len() || depth != 0 {
            return None;
        }
        Some((i - offset, self.input.get(offset..i)?))
    }
}

/// Parse a link reference definition at the start of `input` and record it
/// unless its label is already defined. Returns the bytes consumed.
pub(crate) fn parse_reference(input: &str, refmap: &mut RefMap) -> Option<usize> {
    let mut cur = Cursor::new(input);
    let label = cur.link_label()?;
    if label.is_empty() || cur.peek() != b':' {
        return None;
    }
    cur.advance();

    cur.spnl();
    let (len, dest) = cur.scan_link_url(cur.pos)?;
    cur.pos += len;

    let before_title = cur.pos;
    cur.spnl();
    let title_len = if cur.pos == before_title {
        0
    } else {
        scanners::link_title(&cur.bytes()[cur.pos..]).unwrap_or(0)
    };
    let mut title = "";
    if title_len > 0 {
        title = input.get(cur.pos..cur.pos + title_len).unwrap_or("");
        cur.pos += title_len;
    } else {
        cur.pos = before_title;
    }

    cur.skip_spaces();
    if !cur.skip_line_end() {
        if title_len == 0 {
            return None;
        }
        // The title may belong to the next line of the paragraph instead.
        cur.pos = before_title;
        title = "";
        cur.skip_spaces();
        if !cur.skip_line_end() {
            return None;
        }
    }

    let key = normalize_label(label);
    if !key.is_empty() {
        refmap.entry(key).or_insert_with(|| LinkRef {
            url: clean_url(dest),
            title: clean_title(title),
        });
    }
    Some(cur.pos)
}

/// Replace the raw text of `parent` with inline nodes parsed from `content`.
pub(crate) fn parse_inlines(tree: &mut Tree, parent: NodeId, content: &str, refmap: &RefMap, options: &Options) {
    let mut parser = InlineParser {
        cur: Cursor::new(rtrim(content)),
        tree,
        parent,
        refmap,
        smart: options.smart,
        delimiters: Vec::new(),
        last_delim: None,
        brackets: Vec::new(),
        backticks: [0; MAX_BACKTICKS + 1],
        scanned_for_backticks: false,
        html: HtmlScanState::default(),
    };
    while !parser.cur.is_eof() {
        parser.parse_inline();
    }
    parser.process_emphasis(0);
}

/// An entry of the delimiter list. Removed entries stay in the vector but
/// are unlinked from their neighbours.
#[derive(Debug)]
struct Delimiter {
    prev: Option<usize>,
    next: Option<usize>,
    inl_text: NodeId,
    /// Input position just after the run.
    position: usize,
    delim_char: u8,
    /// Length of the run as scanned.
    length: usize,
    /// Characters not yet consumed by emphasis.
    remaining: usize,
    can_open: bool,
    can_close: bool,
}

#[derive(Debug)]
struct Bracket {
    inl_text: NodeId,
    /// Input position just after `[`.
    position: usize,
    image: bool,
    active: bool,
    bracket_after: bool,
}

struct InlineParser<'a> {
    cur: Cursor<'a>,
    tree: &'a mut Tree,
    parent: NodeId,
    refmap: &'a RefMap,
    smart: bool,
    delimiters: Vec<Delimiter>,
    last_delim: Option<usize>,
    brackets: Vec<Bracket>,
    /// Last seen position of a backtick run of each length.
    backticks: [usize; MAX_BACKTICKS + 1],
    scanned_for_backticks: bool,
    html: HtmlScanState,
}

impl<'a> InlineParser<'a> {
    fn push(&mut self, value: NodeValue) -> NodeId {
        let id = self.tree.new_node(value);
        self.tree.attach_last(self.parent, id);
        id
    }

    fn push_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeValue::Text(text.into()))
    }

    fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeValue::Text(s) = &mut self.tree.node_mut(id).value {
            text.clone_into(s);
        }
    }

    fn parse_inline(&mut self) {
        match self.cur.peek() {
            b'\r' | b'\n' => self.handle_newline(),
            b'`' => self.handle_backticks(),
            b'\\' => self.handle_backslash(),
            b'&' => self.handle_entity(),
            b'<' => self.handle_pointy_brace(),
            c @ (b'*' | b'_' | b'\'' | b'"') => self.handle_delim(c),
            b'-' => self.handle_hyphen(),
            b'.' => self.handle_period(),
            b'[' => {
                self.cur.advance();
                let text = self.push_text("[");
                self.push_bracket(false, text);
            }
            b']' => self.handle_close_bracket(),
            b'!' => {
                self.cur.advance();
                if self.cur.peek() == b'[' {
                    self.cur.advance();
                    let text = self.push_text("![");
                    self.push_bracket(true, text);
                } else {
                    self.push_text("!");
                }
            }
            _ => self.handle_text(),
        }
    }

    fn handle_text(&mut self) {
        let input = self.cur.input;
        let start = self.cur.pos;
        let bytes = input.as_bytes();
        let smart = self.smart;
        let end = bytes[start + 1..]
            .iter()
            .position(|&b| is_special(b, smart))
            .map_or(bytes.len(), |p| start + 1 + p);
        self.cur.pos = end;
        let mut text = input.get(start..end).unwrap_or("");
        if is_line_end(self.cur.peek()) {
            text = rtrim(text);
        }
        if !text.is_empty() {
            self.push_text(text);
        }
    }

    fn handle_newline(&mut self) {
        let nlpos = self.cur.pos;
        if self.cur.peek() == b'\r' {
            self.cur.advance();
        }
        if self.cur.peek() == b'\n' {
            self.cur.advance();
        }
        self.cur.skip_spaces();
        let bytes = self.cur.bytes();
        let hard = nlpos > 1 && bytes[nlpos - 1] == b' ' && bytes[nlpos - 2] == b' ';
        self.push(if hard { NodeValue::LineBreak } else { NodeValue::SoftBreak });
    }

    fn handle_backslash(&mut self) {
        self.cur.advance();
        let next = self.cur.peek();
        if next.is_ascii_punctuation() {
            self.cur.advance();
            self.push_text(char::from(next).to_string());
        } else if !self.cur.is_eof() && self.cur.skip_line_end() {
            self.push(NodeValue::LineBreak);
        } else {
            self.push_text("\\");
        }
    }

    fn handle_entity(&mut self) {
        self.cur.advance();
        match decode_entity(&self.cur.bytes()[self.cur.pos..]) {
            Some((decoded, len)) => {
                self.cur.pos += len;
                self.push_text(decoded);
            }
            None => {
                self.push_text("&");
            }
        }
    }

    // ------------------------------------------------------------------
    // Code spans
    // ------------------------------------------------------------------

    fn handle_backticks(&mut self) {
        let start = self.cur.pos;
        while self.cur.peek() == b'`' {
            self.cur.advance();
        }
        let after_open = self.cur.pos;
        let open_len = after_open - start;
        match self.scan_to_closing_backticks(open_len) {
            Some(end) => {
                let raw = self.cur.input.get(after_open..end - open_len).unwrap_or("");
                self.push(NodeValue::Code(normalize_code(raw)));
            }
            None => {
                self.cur.pos = after_open;
                let input = self.cur.input;
                self.push_text(&input[start..after_open]);
            }
        }
    }

    fn scan_to_closing_backticks(&mut self, open_len: usize) -> Option<usize> {
        if open_len > MAX_BACKTICKS {
            return None;
        }
        if self.scanned_for_backticks && self.backticks[open_len] <= self.cur.pos {
            return None;
        }
        let bytes = self.cur.bytes();
        loop {
            match memchr(b'`', &bytes[self.cur.pos..]) {
                Some(p) => self.cur.pos += p,
                None => break,
            }
            let run_start = self.cur.pos;
            while self.cur.peek() == b'`' {
                self.cur.advance();
            }
            let run = self.cur.pos - run_start;
            if run <= MAX_BACKTICKS {
                self.backticks[run] = run_start;
            }
            if run == open_len {
                return Some(self.cur.pos);
            }
        }
        self.scanned_for_backticks = true;
        None
    }

    // ------------------------------------------------------------------
    // Autolinks and raw HTML
    // ------------------------------------------------------------------

    fn handle_pointy_brace(&mut self) {
        self.cur.advance();
        let input = self.cur.input;
        let pos = self.cur.pos;
        let rest = &input.as_bytes()[pos..];

        if let Some(len) = scanners::autolink_uri(rest) {
            let url = &input[pos..pos + len - 1];
            self.cur.pos += len;
            self.push_autolink(url, false);
        } else if let Some(len) = scanners::autolink_email(rest) {
            let url = &input[pos..pos + len - 1];
            self.cur.pos += len;
            self.push_autolink(url, true);
        } else if let Some(len) = scanners::html_tag(rest, &mut self.html) {
            let html = input.get(pos - 1..pos + len).unwrap_or("");
            self.cur.pos += len;
            self.push(NodeValue::HtmlInline(html.to_owned()));
        } else {
            self.push_text("<");
        }
    }

    fn push_autolink(&mut self, url: &str, email: bool) {
        let mut dest = String::with_capacity(url.len() + 7);
        if email {
            dest.push_str("mailto:");
        }
        dest.push_str(&unescape_entities(trim(url)));
        let link = self.push(NodeValue::Link(NodeLink {
            url: dest,
            title: String::new(),
        }));
        let text = self.tree.new_node(NodeValue::Text(unescape_entities(url).into_owned()));
        self.tree.attach_last(link, text);
    }

    // ------------------------------------------------------------------
    // Smart punctuation
    // ------------------------------------------------------------------

    fn handle_hyphen(&mut self) {
        let start = self.cur.pos;
        self.cur.advance();
        if !self.smart || self.cur.peek() != b'-' {
            self.push_text("-");
            return;
        }
        while self.cur.peek() == b'-' {
            self.cur.advance();
        }
        let n = self.cur.pos - start;
        let (em, en) = if n % 3 == 0 {
            (n / 3, 0)
        } else if n % 2 == 0 {
            (0, n / 2)
        } else if n % 3 == 2 {
            ((n - 2) / 3, 1)
        } else {
            ((n - 4) / 3, 2)
        };
        let mut text = EM_DASH.repeat(em);
        text.push_str(&EN_DASH.repeat(en));
        self.push_text(text);
    }

    fn handle_period(&mut self) {
        self.cur.advance();
        if self.smart && self.cur.peek() == b'.' {
            self.cur.advance();
            if self.cur.peek() == b'.' {
                self.cur.advance();
                self.push_text(ELLIPSIS);
            } else {
                self.push_text("..");
            }
        } else {
            self.push_text(".");
        }
    }

    // ------------------------------------------------------------------
    // Delimiters and emphasis
    // ------------------------------------------------------------------

    /// Scan a delimiter run and classify it as opener and/or closer.
    fn scan_delims(&mut self, c: u8) -> (usize, bool, bool) {
        let before = self.cur.input[..self.cur.pos].chars().next_back().unwrap_or('\n');
        let mut count = 0;
        if c == b'\'' || c == b'"' {
            count = 1;
            self.cur.advance();
        } else {
            while self.cur.peek() == c {
                count += 1;
                self.cur.advance();
            }
        }
        let after = self.cur.input[self.cur.pos..].chars().next().unwrap_or('\n');

        let left_flanking = !is_unicode_space(after)
            && (!is_unicode_punct(after) || is_unicode_space(before) || is_unicode_punct(before));
        let right_flanking = !is_unicode_space(before)
            && (!is_unicode_punct(before) || is_unicode_space(after) || is_unicode_punct(after));

        let (can_open, can_close) = match c {
            b'_' => (
                left_flanking && (!right_flanking || is_unicode_punct(before)),
                right_flanking && (!left_flanking || is_unicode_punct(after)),
            ),
            b'\'' | b'"' => (
                left_flanking && !right_flanking && before != ']' && before != ')',
                right_flanking,
            ),
            _ => (left_flanking, right_flanking),
        };
        (count, can_open, can_close)
    }

    fn handle_delim(&mut self, c: u8) {
        let input = self.cur.input;
        let (count, can_open, can_close) = self.scan_delims(c);
        let quote = c == b'\'' || c == b'"';
        let text = match c {
            b'\'' if self.smart => RIGHT_SINGLE_QUOTE,
            b'"' if self.smart && can_close => RIGHT_DOUBLE_QUOTE,
            b'"' if self.smart => LEFT_DOUBLE_QUOTE,
            _ => input.get(self.cur.pos - count..self.cur.pos).unwrap_or(""),
        };
        let inl_text = self.push_text(text);
        if (can_open || can_close) && (!quote || self.smart) {
            self.push_delimiter(c, count, can_open, can_close, inl_text);
        }
    }

    fn push_delimiter(&mut self, c: u8, length: usize, can_open: bool, can_close: bool, inl_text: NodeId) {
        let index = self.delimiters.len();
        self.delimiters.push(Delimiter {
            prev: self.last_delim,
            next: None,
            inl_text,
            position: self.cur.pos,
            delim_char: c,
            length,
            remaining: length,
            can_open,
            can_close,
        });
        if let Some(last) = self.last_delim {
            self.delimiters[last].next = Some(index);
        }
        self.last_delim = Some(index);
    }

    fn remove_delimiter(&mut self, index: usize) {
        let (prev, next) = (self.delimiters[index].prev, self.delimiters[index].next);
        match next {
            Some(n) => self.delimiters[n].prev = prev,
            None => self.last_delim = prev,
        }
        if let Some(p) = prev {
            self.delimiters[p].next = next;
        }
    }

    /// Resolve emphasis and smart quotes among delimiters positioned at or
    /// after `stack_bottom`, then drop them from the list.
    fn process_emphasis(&mut self, stack_bottom: usize) {
        let mut openers_bottom = [stack_bottom; 14];

        let mut closer = None;
        let mut candidate = self.last_delim;
        while let Some(c) = candidate {
            if self.delimiters[c].position < stack_bottom {
                break;
            }
            closer = Some(c);
            candidate = self.delimiters[c].prev;
        }

        while let Some(ci) = closer {
            let cl = &self.delimiters[ci];
            if !cl.can_close {
                closer = cl.next;
                continue;
            }
            let (delim_char, cl_length, cl_can_open, cl_next, cl_text) =
                (cl.delim_char, cl.length, cl.can_open, cl.next, cl.inl_text);
            let bottom_index = match delim_char {
                b'"' => 0,
                b'\'' => 1,
                b'_' => 2 + if cl_can_open { 3 } else { 0 } + cl_length % 3,
                _ => 8 + if cl_can_open { 3 } else { 0 } + cl_length % 3,
            };

            let mut opener = cl.prev;
            let mut found = false;
            while let Some(oi) = opener {
                let op = &self.delimiters[oi];
                if op.position < openers_bottom[bottom_index] {
                    break;
                }
                if op.can_open && op.delim_char == delim_char {
                    let odd_match = (cl_can_open || op.can_close)
                        && cl_length % 3 != 0
                        && (op.length + cl_length) % 3 == 0;
                    if !odd_match {
                        found = true;
                        break;
                    }
                }
                opener = op.prev;
            }

            match (delim_char, opener.filter(|_| found)) {
                (b'*' | b'_', Some(oi)) => closer = self.insert_emph(oi, ci),
                (b'*' | b'_', None) => closer = cl_next,
                (quote, matched) => {
                    let (left, right) = if quote == b'\'' {
                        (LEFT_SINGLE_QUOTE, RIGHT_SINGLE_QUOTE)
                    } else {
                        (LEFT_DOUBLE_QUOTE, RIGHT_DOUBLE_QUOTE)
                    };
                    self.set_text(cl_text, right);
                    closer = cl_next;
                    if let Some(oi) = matched {
                        let op_text = self.delimiters[oi].inl_text;
                        self.set_text(op_text, left);
                        self.remove_delimiter(oi);
                        self.remove_delimiter(ci);
                    }
                }
            }

            if !found {
                openers_bottom[bottom_index] = self.delimiters[ci].position;
                if !cl_can_open {
                    self.remove_delimiter(ci);
                }
            }
        }

        while let Some(last) = self.last_delim {
            if self.delimiters[last].position < stack_bottom {
                break;
            }
            self.remove_delimiter(last);
        }
    }

    /// Wrap the nodes between an opener and closer in `Emph` or `Strong`.
    /// Returns the next closer to examine.
    fn insert_emph(&mut self, oi: usize, ci: usize) -> Option<usize> {
        let opener_inl = self.delimiters[oi].inl_text;
        let closer_inl = self.delimiters[ci].inl_text;
        let opener_num = self.delimiters[oi].remaining;
        let closer_num = self.delimiters[ci].remaining;
        let use_delims = if opener_num >= 2 && closer_num >= 2 { 2 } else { 1 };

        let opener_num = opener_num - use_delims;
        let closer_num = closer_num - use_delims;
        self.delimiters[oi].remaining = opener_num;
        self.delimiters[ci].remaining = closer_num;
        for (id, len) in [(opener_inl, opener_num), (closer_inl, closer_num)] {
            if let NodeValue::Text(s) = &mut self.tree.node_mut(id).value {
                s.truncate(len);
            }
        }

        let mut between = self.delimiters[ci].prev;
        while let Some(di) = between {
            if di == oi {
                break;
            }
            between = self.delimiters[di].prev;
            self.remove_delimiter(di);
        }

        let emph = self.tree.new_node(if use_delims == 1 {
            NodeValue::Emph
        } else {
            NodeValue::Strong
        });
        let mut tmp = self.tree.node(opener_inl).next;
        while let Some(t) = tmp {
            if t == closer_inl {
                break;
            }
            tmp = self.tree.node(t).next;
            self.tree.detach(t);
            self.tree.attach_last(emph, t);
        }
        self.tree.link_after(opener_inl, emph);

        if opener_num == 0 {
            self.tree.remove(opener_inl);
            self.remove_delimiter(oi);
        }
        if closer_num == 0 {
            self.tree.remove(closer_inl);
            let next = self.delimiters[ci].next;
            self.remove_delimiter(ci);
            return next;
        }
        Some(ci)
    }

    // ------------------------------------------------------------------
    // Links and images
    // ------------------------------------------------------------------

    fn push_bracket(&mut self, image: bool, inl_text: NodeId) {
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            inl_text,
            position: self.cur.pos,
            image,
            active: true,
            bracket_after: false,
        });
    }

    /// Inline `(destination "title")` after the closing bracket.
    fn scan_inline_link(&mut self) -> Option<(String, String)> {
        if self.cur.peek() != b'(' {
            return None;
        }
        let bytes = self.cur.bytes();
        let open = self.cur.pos + 1;
        let url_start = open + scanners::spacechars(&bytes[open..]);
        let (len, dest) = self.cur.scan_link_url(url_start)?;
        let url_end = url_start + len;
        let title_start = url_end + scanners::spacechars(&bytes[url_end..]);
        let title_end = if title_start == url_end {
            title_start
        } else {
            title_start + scanners::link_title(&bytes[title_start..]).unwrap_or(0)
        };
        let end = title_end + scanners::spacechars(&bytes[title_end..]);
        if self.cur.peek_at(end) != b')' {
            return None;
        }
        self.cur.pos = end + 1;
        let title = self.cur.input.get(title_start..title_end).unwrap_or("");
        Some((clean_url(dest), clean_title(title)))
    }

    fn lookup_reference(&self, label: &str) -> Option<(String, String)> {
        if label.is_empty() || label.len() > MAX_LINK_LABEL_LENGTH {
            return None;
        }
        self.refmap
            .get(&normalize_label(label))
            .map(|r| (r.url.clone(), r.title.clone()))
    }

    fn handle_close_bracket(&mut self) {
        self.cur.advance();
        let initial_pos = self.cur.pos;

        let Some((active, image, opener_pos, opener_text, bracket_after)) = self
            .brackets
            .last()
            .map(|b| (b.active, b.image, b.position, b.inl_text, b.bracket_after))
        else {
            self.push_text("]");
            return;
        };
        if !active {
            self.brackets.pop();
            self.push_text("]");
            return;
        }

        let mut target = self.scan_inline_link();
        if target.is_none() {
            let label = match self.cur.link_label() {
                Some(label) if !label.is_empty() => Some(label),
                found => {
                    if found.is_none() {
                        self.cur.pos = initial_pos;
                    }
                    let input = self.cur.input;
                    (!bracket_after).then(|| input.get(opener_pos..initial_pos - 1).unwrap_or(""))
                }
            };
            target = label.and_then(|l| self.lookup_reference(l));
        }

        let Some((url, title)) = target else {
            self.brackets.pop();
            self.cur.pos = initial_pos;
            self.push_text("]");
            return;
        };

        let link = NodeLink { url, title };
        let node = self.tree.new_node(if image {
            NodeValue::Image(link)
        } else {
            NodeValue::Link(link)
        });
        self.tree.link_after(opener_text, node);
        let mut tmp = self.tree.node(node).next;
        while let Some(t) = tmp {
            tmp = self.tree.node(t).next;
            self.tree.detach(t);
            self.tree.attach_last(node, t);
        }
        self.tree.remove(opener_text);

        self.process_emphasis(opener_pos);
        self.brackets.pop();

        // Links may not contain other links.
        if !image {
            for bracket in self.brackets.iter_mut().rev() {
                if !bracket.image {
                    if !bracket.active {
                        break;
                    }
                    bracket.active = false;
                }
            }
        }
    }
}

/// Line endings become spaces; one surrounding space is stripped from each
/// side when both are present and the span is not all spaces.
fn normalize_code(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut s = String::with_capacity(raw.len());
    for (i, c) in raw.char_indices() {
        match c {
            '\r' if bytes.get(i + 1) == Some(&b'\n') => {}
            '\r' | '\n' => s.push(' '),
            c => s.push(c),
        }
    }
    if s.starts_with(' ') && s.ends_with(' ') && s.bytes().any(|b| b != b' ') {
        return s[1..s.len() - 1].to_owned();
    }
    s
}
