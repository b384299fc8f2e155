//! Byte-level recognisers for block starts and inline constructs.
//!
//! Every scanner takes the input starting at the candidate position and
//! returns the length of the match, or `None`. Scanners never allocate.

use memchr::memmem;

use crate::strings::{is_line_end, is_space, is_space_or_tab};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "search", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

const RAW_TAGS: &[&str] = &["script", "pre", "style", "textarea"];

#[inline]
fn at_line_end(s: &[u8], i: usize) -> bool {
    s.get(i).map_or(true, |&b| is_line_end(b))
}

#[inline]
fn skip_spaces_tabs(s: &[u8], mut i: usize) -> usize {
    while s.get(i).is_some_and(|&b| is_space_or_tab(b)) {
        i += 1;
    }
    i
}

#[inline]
fn run_of(s: &[u8], start: usize, c: u8) -> usize {
    s[start.min(s.len())..].iter().take_while(|&&b| b == c).count()
}

/// Number of leading whitespace bytes, newlines included.
pub(crate) fn spacechars(s: &[u8]) -> usize {
    s.iter().take_while(|&&b| is_space(b)).count()
}

/// `#{1,6}` followed by spaces/tabs or the line end. Returns the length of
/// the opening sequence plus the whitespace after it.
pub(crate) fn atx_heading_start(s: &[u8]) -> Option<usize> {
    let hashes = run_of(s, 0, b'#');
    if !(1..=6).contains(&hashes) {
        return None;
    }
    if at_line_end(s, hashes) {
        return Some(hashes);
    }
    if !is_space_or_tab(s[hashes]) {
        return None;
    }
    Some(skip_spaces_tabs(s, hashes))
}

/// Opening code fence; returns the fence length.
pub(crate) fn open_code_fence(s: &[u8]) -> Option<usize> {
    let c = *s.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let len = run_of(s, 0, c);
    if len < 3 {
        return None;
    }
    if c == b'`' {
        let info_end = s[len..].iter().position(|&b| is_line_end(b)).map_or(s.len(), |p| len + p);
        if s[len..info_end].contains(&b'`') {
            return None;
        }
    }
    Some(len)
}

/// Closing code fence; returns the fence length.
pub(crate) fn close_code_fence(s: &[u8]) -> Option<usize> {
    let c = *s.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let len = run_of(s, 0, c);
    if len < 3 || !at_line_end(s, skip_spaces_tabs(s, len)) {
        return None;
    }
    Some(len)
}

/// Setext underline: `1` for `=`, `2` for `-`.
pub(crate) fn setext_heading_line(s: &[u8]) -> Option<u8> {
    let c = *s.first()?;
    let level = match c {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let len = run_of(s, 0, c);
    at_line_end(s, skip_spaces_tabs(s, len)).then_some(level)
}

/// Three or more matching `*`, `-` or `_`, optionally separated by spaces
/// or tabs, and nothing else on the line.
pub(crate) fn thematic_break(s: &[u8]) -> Option<usize> {
    let c = *s.first()?;
    if !matches!(c, b'*' | b'-' | b'_') {
        return None;
    }
    let mut count = 0;
    let mut i = 0;
    while !at_line_end(s, i) {
        match s[i] {
            b if b == c => count += 1,
            b if is_space_or_tab(b) => {}
            _ => return None,
        }
        i += 1;
    }
    (count >= 3).then_some(i)
}

fn tag_name_len(s: &[u8]) -> usize {
    match s.first() {
        Some(b) if b.is_ascii_alphabetic() => {
            1 + s[1..]
                .iter()
                .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
                .count()
        }
        _ => 0,
    }
}

/// Start conditions 1 to 6 of an HTML block.
pub(crate) fn html_block_start(s: &[u8]) -> Option<u8> {
    if s.first() != Some(&b'<') {
        return None;
    }
    let rest = &s[1..];
    if rest.starts_with(b"!--") {
        return Some(2);
    }
    if rest.starts_with(b"?") {
        return Some(3);
    }
    if rest.starts_with(b"![CDATA[") {
        return Some(5);
    }
    if rest.first() == Some(&b'!') && rest.get(1).is_some_and(u8::is_ascii_alphabetic) {
        return Some(4);
    }

    let closing = rest.first() == Some(&b'/');
    let name_start = usize::from(closing);
    let name_len = tag_name_len(&rest[name_start..]);
    if name_len == 0 {
        return None;
    }
    let name = &rest[name_start..name_start + name_len];
    let after = name_start + name_len;

    if !closing && RAW_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t.as_bytes())) {
        let ok = at_line_end(rest, after) || is_space(rest[after]) || rest[after] == b'>';
        if ok {
            return Some(1);
        }
    }
    if BLOCK_TAGS.iter().any(|t| name.eq_ignore_ascii_case(t.as_bytes())) {
        let ok = at_line_end(rest, after)
            || is_space(rest[after])
            || rest[after] == b'>'
            || rest[after..].starts_with(b"/>");
        if ok {
            return Some(6);
        }
    }
    None
}

/// Start condition 7: a complete open or closing tag alone on its line.
pub(crate) fn html_block_start_7(s: &[u8]) -> Option<u8> {
    if s.first() != Some(&b'<') {
        return None;
    }
    let rest = &s[1..];
    let len = if rest.first() == Some(&b'/') {
        closing_tag(&rest[1..]).map(|l| l + 1)?
    } else {
        let len = open_tag(rest)?;
        let name_len = tag_name_len(rest);
        if RAW_TAGS.iter().any(|t| rest[..name_len].eq_ignore_ascii_case(t.as_bytes())) {
            return None;
        }
        len
    };
    at_line_end(rest, skip_spaces_tabs(rest, len)).then_some(7)
}

/// Whether `line` satisfies the end condition of an HTML block of `block_type`.
pub(crate) fn html_block_end(block_type: u8, line: &[u8]) -> bool {
    match block_type {
        1 => {
            let lower = line.to_ascii_lowercase();
            RAW_TAGS.iter().any(|tag| {
                let close = format!("</{tag}>");
                memmem::find(&lower, close.as_bytes()).is_some()
            })
        }
        2 => memmem::find(line, b"-->").is_some(),
        3 => memmem::find(line, b"?>").is_some(),
        4 => line.contains(&b'>'),
        5 => memmem::find(line, b"]]>").is_some(),
        _ => false,
    }
}

fn attribute_value(s: &[u8]) -> Option<usize> {
    match *s.first()? {
        q @ (b'"' | b'\'') => s[1..].iter().position(|&b| b == q).map(|p| p + 2),
        _ => {
            let len = s
                .iter()
                .take_while(|&&b| !is_space(b) && !matches!(b, b'"' | b'\'' | b'=' | b'<' | b'>' | b'`'))
                .count();
            (len > 0).then_some(len)
        }
    }
}

fn attribute(s: &[u8]) -> Option<usize> {
    let first = *s.first()?;
    if !(first.is_ascii_alphabetic() || first == b'_' || first == b':') {
        return None;
    }
    let mut i = 1 + s[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'-'))
        .count();
    let ws = spacechars(&s[i..]);
    if s.get(i + ws) == Some(&b'=') {
        let value_start = i + ws + 1;
        let value_start = value_start + spacechars(&s[value_start..]);
        i = value_start + attribute_value(&s[value_start..])?;
    }
    Some(i)
}

/// Open tag after `<`: name, attributes, optional `/`, `>`.
fn open_tag(s: &[u8]) -> Option<usize> {
    let mut i = tag_name_len(s);
    if i == 0 {
        return None;
    }
    loop {
        let ws = spacechars(&s[i..]);
        if ws > 0 {
            if let Some(len) = attribute(&s[i + ws..]) {
                i += ws + len;
                continue;
            }
        }
        i += ws;
        break;
    }
    if s.get(i) == Some(&b'/') {
        i += 1;
    }
    (s.get(i) == Some(&b'>')).then_some(i + 1)
}

/// Closing tag after `</`.
fn closing_tag(s: &[u8]) -> Option<usize> {
    let name = tag_name_len(s);
    if name == 0 {
        return None;
    }
    let i = name + spacechars(&s[name..]);
    (s.get(i) == Some(&b'>')).then_some(i + 1)
}

/// Remembers which unterminated constructs were already searched for, so a
/// paragraph full of `<!--` does not rescan to its end each time.
#[derive(Debug, Default)]
pub(crate) struct HtmlScanState {
    no_comment_close: bool,
    no_pi_close: bool,
    no_decl_close: bool,
    no_cdata_close: bool,
}

fn find_close(s: &[u8], start: usize, close: &[u8], missing: &mut bool) -> Option<usize> {
    if *missing {
        return None;
    }
    match memmem::find(&s[start..], close) {
        Some(p) => Some(start + p + close.len()),
        None => {
            *missing = true;
            None
        }
    }
}

/// Raw inline HTML after `<`: tags, comments, processing instructions,
/// declarations and CDATA sections.
pub(crate) fn html_tag(s: &[u8], state: &mut HtmlScanState) -> Option<usize> {
    match *s.first()? {
        b'/' => closing_tag(&s[1..]).map(|l| l + 1),
        b'?' => find_close(s, 1, b"?>", &mut state.no_pi_close),
        b'!' => {
            if s.starts_with(b"!--") {
                if s[3..].starts_with(b">") {
                    return Some(4);
                }
                if s[3..].starts_with(b"->") {
                    return Some(5);
                }
                find_close(s, 3, b"-->", &mut state.no_comment_close)
            } else if s.starts_with(b"![CDATA[") {
                find_close(s, 8, b"]]>", &mut state.no_cdata_close)
            } else if s.get(1).is_some_and(u8::is_ascii_alphabetic) {
                find_close(s, 2, b">", &mut state.no_decl_close)
            } else {
                None
            }
        }
        _ => open_tag(s),
    }
}

/// URI scheme: a letter, then 1 to 31 of letters, digits, `+`, `.`, `-`,
/// then `:`. Returns the length including the colon.
pub(crate) fn scheme(s: &[u8]) -> Option<usize> {
    if !s.first()?.is_ascii_alphabetic() {
        return None;
    }
    let rest = s[1..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        .count();
    if !(1..=31).contains(&rest) || s.get(1 + rest) != Some(&b':') {
        return None;
    }
    Some(rest + 2)
}

/// URI autolink after `<`; the length includes the closing `>`.
pub(crate) fn autolink_uri(s: &[u8]) -> Option<usize> {
    let mut i = scheme(s)?;
    while let Some(&b) = s.get(i) {
        match b {
            b'>' => return Some(i + 1),
            b'<' => return None,
            b if b <= 0x20 => return None,
            _ => i += 1,
        }
    }
    None
}

/// E-mail autolink after `<`; the length includes the closing `>`.
pub(crate) fn autolink_email(s: &[u8]) -> Option<usize> {
    let local = s
        .iter()
        .take_while(|&&b| b.is_ascii_alphanumeric() || b".!#$%&'*+/=?^_`{|}~-".contains(&b))
        .count();
    if local == 0 || s.get(local) != Some(&b'@') {
        return None;
    }
    let mut i = local + 1;
    loop {
        let label = s[i..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'-')
            .count();
        if label == 0 || label > 63 || s[i] == b'-' || s[i + label - 1] == b'-' {
            return None;
        }
        i += label;
        match s.get(i) {
            Some(b'.') => i += 1,
            Some(b'>') => return Some(i + 1),
            _ => return None,
        }
    }
}

/// Link title in `"…"`, `'…'` or `(…)`, honouring backslash escapes.
pub(crate) fn link_title(s: &[u8]) -> Option<usize> {
    let close = match *s.first()? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut i = 1;
    while let Some(&b) = s.get(i) {
        match b {
            b'\\' if s.get(i + 1).is_some_and(u8::is_ascii_punctuation) => i += 2,
            b if b == close => return Some(i + 1),
            b'(' if close == b')' => return None,
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atx_heading_start() {
        assert_eq!(atx_heading_start(b"# foo\n"), Some(2));
        assert_eq!(atx_heading_start(b"###\n"), Some(3));
        assert_eq!(atx_heading_start(b"#######\n"), None);
        assert_eq!(atx_heading_start(b"#5 bolt\n"), None);
    }

    #[test]
    fn test_code_fences() {
        assert_eq!(open_code_fence(b"```rust\n"), Some(3));
        assert_eq!(open_code_fence(b"~~~~ a`b\n"), Some(4));
        assert_eq!(open_code_fence(b"``` a`b\n"), None);
        assert_eq!(open_code_fence(b"``\n"), None);
        assert_eq!(close_code_fence(b"````  \n"), Some(4));
        assert_eq!(close_code_fence(b"``` x\n"), None);
    }

    #[test]
    fn test_setext_and_thematic_break() {
        assert_eq!(setext_heading_line(b"===  \n"), Some(1));
        assert_eq!(setext_heading_line(b"- -\n"), None);
        assert!(thematic_break(b"- - -\n").is_some());
        assert!(thematic_break(b"**\n").is_none());
        assert!(thematic_break(b"_ _ x\n").is_none());
    }

    #[test]
    fn test_html_block_start_conditions() {
        assert_eq!(html_block_start(b"<script>\n"), Some(1));
        assert_eq!(html_block_start(b"<PRE\n"), Some(1));
        assert_eq!(html_block_start(b"<!-- x\n"), Some(2));
        assert_eq!(html_block_start(b"<?php\n"), Some(3));
        assert_eq!(html_block_start(b"<!DOCTYPE html>\n"), Some(4));
        assert_eq!(html_block_start(b"<![CDATA[\n"), Some(5));
        assert_eq!(html_block_start(b"</div>\n"), Some(6));
        assert_eq!(html_block_start(b"<table/>\n"), Some(6));
        assert_eq!(html_block_start(b"<span>\n"), None);
        assert_eq!(html_block_start_7(b"<span class=\"x\">\n"), Some(7));
        assert_eq!(html_block_start_7(b"</span>  \n"), Some(7));
        assert_eq!(html_block_start_7(b"<span> text\n"), None);
    }

    #[test]
    fn test_html_block_end() {
        assert!(html_block_end(1, b"x </SCRIPT> y\n"));
        assert!(html_block_end(2, b"end -->\n"));
        assert!(!html_block_end(3, b"?\n"));
        assert!(html_block_end(5, b"]]>\n"));
    }

    #[test]
    fn test_inline_html() {
        let mut st = HtmlScanState::default();
        assert_eq!(html_tag(b"a href=\"x\" disabled>rest", &mut st), Some(20));
        assert_eq!(html_tag(b"/em >", &mut st), Some(5));
        assert_eq!(html_tag(b"!-->", &mut st), Some(4));
        assert_eq!(html_tag(b"!-- c -->", &mut st), Some(9));
        assert_eq!(html_tag(b"?pi ?>", &mut st), Some(6));
        assert_eq!(html_tag(b"a =x>", &mut st), None);
        assert_eq!(html_tag(b"!-- open", &mut st), None);
        assert_eq!(html_tag(b"!-- later -->", &mut st), None);
    }

    #[test]
    fn test_autolinks() {
        assert_eq!(autolink_uri(b"http://a.b/c>"), Some(13));
        assert_eq!(autolink_uri(b"a:b>"), None);
        assert_eq!(autolink_uri(b"http://a b>"), None);
        assert_eq!(autolink_email(b"me@example.com>"), Some(15));
        assert_eq!(autolink_email(b"me@-bad.com>"), None);
    }

    #[test]
    fn test_link_title() {
        assert_eq!(link_title(b"\"a \\\" b\" rest"), Some(8));
        assert_eq!(link_title(b"(a (b))"), None);
        assert_eq!(link_title(b"'open"), None);
    }
}
