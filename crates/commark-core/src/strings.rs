//! String helpers shared by the parser and renderers: character classes,
//! entity and backslash unescaping, label normalisation and escaping.

use std::borrow::Cow;

use memchr::memchr;

/// Longest entity name we try to resolve (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_NAME: usize = 32;

#[inline]
pub(crate) fn is_space_or_tab(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
pub(crate) fn is_line_end(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// ASCII whitespace as CommonMark defines it for scanners.
#[inline]
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Unicode whitespace for flanking rules: Zs plus tab, LF, FF and CR.
pub(crate) fn is_unicode_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\u{0c}' | '\r')
        || matches!(
            c,
            ' ' | '\u{a0}' | '\u{1680}' | '\u{2000}'..='\u{200a}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
        )
}

/// Unicode punctuation or symbol for flanking rules.
pub(crate) fn is_unicode_punct(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation();
    }
    !(c.is_alphanumeric() || c.is_whitespace() || c.is_control())
}

/// Decode a character reference starting after `&`.
///
/// Returns the decoded text and the number of bytes consumed after `&`,
/// including the terminating `;`.
pub(crate) fn decode_entity(s: &[u8]) -> Option<(String, usize)> {
    if s.first() == Some(&b'#') {
        return decode_numeric(&s[1..]).map(|(c, len)| (c.to_string(), len + 1));
    }
    let semi = memchr(b';', &s[..s.len().min(MAX_ENTITY_NAME + 1)])?;
    let name = &s[..semi];
    if name.is_empty() || !name.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    let name = std::str::from_utf8(name).ok()?;
    let reference = format!("&{name};");
    // Legacy entities decode without their `;`, so `&ampx;` would come back
    // as `&x;`. Only whole-reference replacements count.
    match html_escape::decode_html_entities(&reference) {
        Cow::Owned(decoded)
            if decoded != reference && (!decoded.ends_with(';') || name == "semi") =>
        {
            Some((decoded, semi + 1))
        }
        _ => None,
    }
}

fn decode_numeric(s: &[u8]) -> Option<(char, usize)> {
    let (radix, digits_start, max_digits) = match s.first() {
        Some(b'x' | b'X') => (16, 1, 6),
        _ => (10, 0, 7),
    };
    let digits = s[digits_start..]
        .iter()
        .take_while(|b| {
            if radix == 16 {
                b.is_ascii_hexdigit()
            } else {
                b.is_ascii_digit()
            }
        })
        .count();
    if digits == 0 || digits > max_digits {
        return None;
    }
    let end = digits_start + digits;
    if s.get(end) != Some(&b';') {
        return None;
    }
    let text = std::str::from_utf8(&s[digits_start..end]).ok()?;
    let code = u32::from_str_radix(text, radix).ok()?;
    let c = match code {
        0 => char::REPLACEMENT_CHARACTER,
        _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
    };
    Some((c, end + 1))
}

/// Replace character references with the characters they denote.
pub(crate) fn unescape_entities(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some((decoded, len)) = decode_entity(&bytes[i + 1..]) {
                out.push_str(&decoded);
                i += 1 + len;
                continue;
            }
            out.push('&');
            i += 1;
            continue;
        }
        let next = memchr(b'&', &bytes[i..]).map_or(bytes.len(), |p| i + p);
        out.push_str(&s[i..next]);
        i = next;
    }
    Cow::Owned(out)
}

/// Drop backslashes that escape ASCII punctuation.
pub(crate) fn unescape_backslashes(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if memchr(b'\\', bytes).is_none() {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '\\' {
            if let Some(&(_, n)) = chars.peek() {
                if n.is_ascii_punctuation() {
                    out.push(n);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// Entities first, then backslash escapes.
pub(crate) fn unescape(s: &str) -> String {
    unescape_backslashes(&unescape_entities(s)).into_owned()
}

/// Clean a link destination as written in the source.
pub(crate) fn clean_url(url: &str) -> String {
    let url = trim(url);
    if url.is_empty() {
        return String::new();
    }
    unescape(url)
}

/// Clean a link title, removing its delimiters.
pub(crate) fn clean_title(title: &str) -> String {
    let bytes = title.as_bytes();
    if bytes.is_empty() {
        return String::new();
    }
    let inner = match (bytes[0], bytes[bytes.len() - 1]) {
        (b'\'', b'\'') | (b'"', b'"') | (b'(', b')') if bytes.len() >= 2 => &title[1..title.len() - 1],
        _ => title,
    };
    unescape(inner)
}

/// Normalise a link label for reference lookup: case fold, collapse
/// internal whitespace, trim.
pub(crate) fn normalize_label(label: &str) -> String {
    let folded = label.to_lowercase().to_uppercase().to_lowercase();
    let mut out = String::with_capacity(folded.len());
    for word in folded.split(|c: char| is_unicode_space(c)).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Strip leading and trailing ASCII whitespace.
pub(crate) fn trim(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

/// Strip trailing ASCII whitespace.
pub(crate) fn rtrim(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

/// Escape `&`, `<`, `>` and `"` for HTML or XML text and attributes.
pub(crate) fn escape_html(out: &mut String, s: &str) {
    let mut last = 0;
    for (i, b) in s.bytes().enumerate() {
        let rep = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        out.push_str(&s[last..i]);
        out.push_str(rep);
        last = i + 1;
    }
    out.push_str(&s[last..]);
}

/// Percent-encode a URL for an `href`/`src` attribute, keeping characters
/// that are already safe and existing `%` escapes.
pub(crate) fn escape_href(out: &mut String, url: &str) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &b in url.as_bytes() {
        match b {
            b'&' => out.push_str("&amp;"),
            b'\'' => out.push_str("&#x27;"),
            b if b.is_ascii_alphanumeric() => out.push(b as char),
            b'-' | b'_' | b'.' | b'+' | b'!' | b'*' | b'(' | b')' | b',' | b'%' | b'#' | b'@'
            | b'?' | b'=' | b';' | b':' | b'/' | b'$' | b'~' => out.push(b as char),
            _ => {
                out.push('%');
                out.push(HEX[(b >> 4) as usize] as char);
                out.push(HEX[(b & 0x0f) as usize] as char);
            }
        }
    }
}

/// Whether a URL uses a scheme that safe mode refuses to emit.
pub(crate) fn is_dangerous_url(url: &str) -> bool {
    let lower = url.get(..url.len().min(16)).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("data:") {
        let rest = url.get(5..).unwrap_or("").to_ascii_lowercase();
        return !["image/png", "image/gif", "image/jpeg", "image/webp"]
            .iter()
            .any(|ok| rest.starts_with(ok));
    }
    ["javascript:", "vbscript:", "file:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Length of the longest run of `byte` in `s`.
pub(crate) fn longest_run(s: &str, byte: u8) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for b in s.bytes() {
        if b == byte {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Shortest run length of backticks that does not occur in `s`.
pub(crate) fn shortest_unused_backtick_run(s: &str) -> usize {
    let mut used = vec![false; 1];
    let mut current = 0;
    for b in s.bytes().chain(std::iter::once(b' ')) {
        if b == b'`' {
            current += 1;
        } else if current > 0 {
            if used.len() <= current {
                used.resize(current + 1, false);
            }
            used[current] = true;
            current = 0;
        }
    }
    (1..).find(|&n| used.get(n) != Some(&true)).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric_entities() {
        assert_eq!(unescape_entities("&amp; &copy; &#35; &#x22;"), "& © # \"");
        assert_eq!(unescape_entities("&#0;"), "\u{fffd}");
        assert_eq!(unescape_entities("&nosuchentity; &#87654321;"), "&nosuchentity; &#87654321;");
    }

    #[test]
    fn test_unescape_backslashes_only_before_punctuation() {
        assert_eq!(unescape_backslashes(r"\*a\b\\"), r"*a\b\");
    }

    #[test]
    fn test_normalize_label_folds_case_and_whitespace() {
        assert_eq!(normalize_label("  Foo \n  BAR "), "foo bar");
        assert_eq!(normalize_label("ẞ"), normalize_label("SS"));
    }

    #[test]
    fn test_escape_href() {
        let mut out = String::new();
        escape_href(&mut out, "/a b?x=1&y=ä");
        assert_eq!(out, "/a%20b?x=1&amp;y=%C3%A4");
    }

    #[test]
    fn test_dangerous_urls() {
        assert!(is_dangerous_url("JavaScript:alert(1)"));
        assert!(is_dangerous_url("data:text/html;base64,xx"));
        assert!(!is_dangerous_url("data:image/png;base64,xx"));
        assert!(!is_dangerous_url("https://example.com"));
    }

    #[test]
    fn test_backtick_runs() {
        assert_eq!(longest_run("a ``` b ` c", b'`'), 3);
        assert_eq!(longest_run("~~ x ~~~~", b'~'), 4);
        assert_eq!(shortest_unused_backtick_run("a ` b `` c"), 3);
        assert_eq!(shortest_unused_backtick_run("plain"), 1);
    }
}
