//! Integration tests for the output formats

use commark_core::{
    parse_document, render_commonmark, render_html, render_latex, render_man, render_xml, Options,
};
use pretty_assertions::assert_eq;

fn parse_and<F>(input: &str, options: Options, render: F) -> String
where
    F: FnOnce(&commark_core::Tree, &Options) -> String,
{
    let tree = parse_document(input, options).unwrap();
    render(&tree, &options)
}

fn xml(input: &str) -> String {
    parse_and(input, Options::default(), render_xml)
}

fn man(input: &str, width: usize) -> String {
    parse_and(input, Options::default(), |t, o| render_man(t, o, width))
}

fn latex(input: &str) -> String {
    parse_and(input, Options::default(), |t, o| render_latex(t, o, 0))
}

fn commonmark(input: &str, width: usize) -> String {
    parse_and(input, Options::default(), |t, o| render_commonmark(t, o, width))
}

// ============================================================================
// HTML Options
// ============================================================================

#[test]
fn test_html_safe_mode() {
    let input = "<div>x</div>\n\n<b>y</b> [a](javascript:alert(1)) ![i](data:image/png;base64,xx)\n";
    assert_eq!(
        parse_and(input, Options::default().with_safe(true), render_html),
        "<!-- raw HTML omitted -->\n<p><!-- raw HTML omitted -->y<!-- raw HTML omitted --> \
         <a href=\"\">a</a> <img src=\"data:image/png;base64,xx\" alt=\"i\" /></p>\n"
    );
}

#[test]
fn test_html_unsafe_by_default() {
    assert_eq!(
        parse_and("<b>y</b> [a](javascript:x)\n", Options::default(), render_html),
        "<p><b>y</b> <a href=\"javascript:x\">a</a></p>\n"
    );
}

#[test]
fn test_html_soft_break_options() {
    let input = "a\nb\n";
    assert_eq!(parse_and(input, Options::default(), render_html), "<p>a\nb</p>\n");
    assert_eq!(
        parse_and(input, Options::default().with_hard_breaks(true), render_html),
        "<p>a<br />\nb</p>\n"
    );
    assert_eq!(
        parse_and(input, Options::default().with_no_breaks(true), render_html),
        "<p>a b</p>\n"
    );
}

#[test]
fn test_html_escaping() {
    assert_eq!(
        parse_and("a < b & \"c\"\n\n[x](/a?b=1&c=\"d\" 'it\"s')\n", Options::default(), render_html),
        "<p>a &lt; b &amp; &quot;c&quot;</p>\n<p><a href=\"/a?b=1&amp;c=%22d%22\" title=\"it&quot;s\">x</a></p>\n"
    );
}

// ============================================================================
// XML
// ============================================================================

#[test]
fn test_xml_structure() {
    assert_eq!(
        xml("# Hi\n\n- a\n"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE document SYSTEM "CommonMark.dtd">
<document xmlns="http://commonmark.org/xml/1.0">
  <heading level="1">
    <text xml:space="preserve">Hi</text>
  </heading>
  <list type="bullet" tight="true">
    <item>
      <paragraph>
        <text xml:space="preserve">a</text>
      </paragraph>
    </item>
  </list>
</document>
"#
    );
}

#[test]
fn test_xml_attributes() {
    let out = xml("2) x\n\n[a](/u)\n\n```py\n<\n```\n\n---\n");
    assert!(out.contains(r#"<list type="ordered" start="2" delim="paren" tight="true">"#));
    assert!(out.contains(r#"<link destination="/u" title="">"#));
    assert!(out.contains(r#"<code_block info="py" xml:space="preserve">&lt;
</code_block>"#));
    assert!(out.contains("<thematic_break />"));
}

#[test]
fn test_xml_source_positions() {
    let out = parse_and("# Hi\n", Options::default().with_source_pos(true), render_xml);
    assert!(out.contains(r#"<document sourcepos="1:1-1:4" xmlns="http://commonmark.org/xml/1.0">"#));
    assert!(out.contains(r#"<heading sourcepos="1:1-1:4" level="1">"#));
}

// ============================================================================
// Man
// ============================================================================

#[test]
fn test_man_basic() {
    assert_eq!(
        man("# Title\n\nHello *world* and **more**\n", 0),
        ".SH\nTitle\n.PP\nHello \\f[I]world\\f[] and \\f[B]more\\f[]\n"
    );
}

#[test]
fn test_man_lists() {
    assert_eq!(man("- a\n- b\n", 0), ".IP \\[bu] 2\na\n.IP \\[bu] 2\nb\n");
    assert_eq!(man("7. a\n", 0), ".IP \"7.\" 4\na\n");
}

#[test]
fn test_man_escapes() {
    assert_eq!(man("a-b\n\n.x\n", 0), ".PP\na\\-b\n.PP\n\\&.x\n");
}

#[test]
fn test_man_code_block_lines_are_escaped() {
    assert_eq!(
        man("```\na\n.b\n'c\n```\n", 0),
        ".IP\n.nf\n\\f[C]\na\n\\&.b\n\\&'c\n\\f[]\n.fi\n"
    );
}

#[test]
fn test_man_wrapping() {
    assert_eq!(
        man("aaaa bbbb cccc dddd eeee\n", 12),
        ".PP\naaaa bbbb\ncccc dddd\neeee\n"
    );
}

// ============================================================================
// LaTeX
// ============================================================================

#[test]
fn test_latex_basic() {
    assert_eq!(
        latex("# Title\n\nHello *world*\n"),
        "\\section{Title}\n\nHello \\emph{world}\n"
    );
}

#[test]
fn test_latex_escapes() {
    assert_eq!(latex("50% & $5_x\n"), "50\\% \\& \\$5\\_x\n");
}

#[test]
fn test_latex_ordered_list_counter() {
    assert_eq!(
        latex("3. a\n4. b\n"),
        "\\begin{enumerate}\n\\setcounter{enumi}{2}\n\\item a\n\n\\item b\n\n\\end{enumerate}\n"
    );
}

#[test]
fn test_latex_code_block_is_verbatim() {
    assert_eq!(
        latex("```\n50% {x}\n```\n"),
        "\\begin{verbatim}\n50% {x}\n\\end{verbatim}\n"
    );
}

#[test]
fn test_latex_links() {
    assert_eq!(latex("[a](http://x.y)\n"), "\\href{http://x.y}{a}\n");
    assert_eq!(latex("<http://x.y>\n"), "\\url{http://x.y}\n");
    assert_eq!(latex("[a](#sec)\n"), "\\protect\\hyperlink{sec}{a}\n");
}

// ============================================================================
// CommonMark
// ============================================================================

#[test]
fn test_commonmark_basic() {
    assert_eq!(commonmark("# Title\n\nHello *world*\n", 0), "# Title\n\nHello *world*\n");
    assert_eq!(commonmark("Title\n=====\n\n***\n", 0), "# Title\n\n-----\n");
}

#[test]
fn test_commonmark_lists() {
    assert_eq!(commonmark("- a\n- b\n", 0), "  - a\n  - b\n");
    assert_eq!(commonmark("* a\n\n* b\n", 0), "  - a\n\n  - b\n");
    assert_eq!(commonmark("3) a\n4) b\n", 0), "3)  a\n4)  b\n");
    assert_eq!(commonmark("- a\n  - b\n", 0), "  - a\n      - b\n");
}

#[test]
fn test_commonmark_adjacent_lists_stay_separate() {
    assert_eq!(commonmark("- a\n+ b\n", 0), "  - a\n\n  * b\n");
    assert_eq!(commonmark("1. a\n1) b\n", 0), "1.  a\n\n1)  b\n");
    assert_eq!(commonmark("- a\n\n[r]: /u\n\n- b\n", 0), "  - a\n\n  * b\n");
    assert_eq!(commonmark("1. a\n\n[r]: /u\n\n2. b\n", 0), "1.  a\n\n2)  b\n");
}

#[test]
fn test_commonmark_code_block_after_list_is_fenced() {
    assert_eq!(
        commonmark("- a\n\n[r]: /u\n\n    code\n", 0),
        "  - a\n\n``` \ncode\n```\n"
    );
}

#[test]
fn test_commonmark_list_item_starting_with_list() {
    assert_eq!(commonmark("- - a\n\n  b\n", 0), "  - -   a\n\n    b\n");
}

#[test]
fn test_commonmark_thematic_break_in_item() {
    assert_eq!(commonmark("- ***\n", 0), "  - _____\n");
    assert_eq!(commonmark("- a\n  ***\n", 0), "  - a\n    _____\n");
}

#[test]
fn test_commonmark_multiline_heading_is_setext() {
    assert_eq!(commonmark("a\nb\n===\n", 0), "a\nb\n===\n");
}

#[test]
fn test_commonmark_block_quote() {
    assert_eq!(commonmark("> a\n> b\n", 0), "> a\n> b\n");
    assert_eq!(commonmark("> - a\n> - b\n", 0), ">   - a\n>   - b\n");
}

#[test]
fn test_commonmark_code() {
    assert_eq!(commonmark("```rust\nfn x() {}\n```\n", 0), "``` rust\nfn x() {}\n```\n");
    assert_eq!(commonmark("    code\n", 0), "    code\n");
    assert_eq!(commonmark("`` a`b ``\n", 0), "``a`b``\n");
}

#[test]
fn test_commonmark_inlines() {
    assert_eq!(commonmark("\\*not\\*\n", 0), "\\*not\\*\n");
    assert_eq!(commonmark("[a](/u \"t\")\n", 0), "[a](/u \"t\")\n");
    assert_eq!(commonmark("<https://x.y>\n", 0), "<https://x.y>\n");
    assert_eq!(commonmark("*_a_*\n", 0), "*_a_*\n");
    assert_eq!(commonmark("a  \nb\n", 0), "a\\\nb\n");
    assert_eq!(commonmark("[x](mailto:x)\n", 0), "[x](mailto:x)\n");
}

#[test]
fn test_commonmark_line_start_escapes() {
    assert_eq!(commonmark("\\~~~\nx\n", 0), "\\~~~\nx\n");
    assert_eq!(commonmark("&#32;&#32;&#32;&#32;code\n", 0), "&#32;   code\n");
    assert_eq!(commonmark("a\n\\+ b\n", 0), "a\n\\+ b\n");
}

#[test]
fn test_commonmark_spaces_before_line_end() {
    assert_eq!(commonmark("a    \\\na\n", 0), "a&#32;&#32;&#32;&#32;\\\na\n");
    assert_eq!(commonmark("a&#32;\nb\n", 0), "a&#32;\nb\n");
}

#[test]
fn test_commonmark_nested_emphasis() {
    assert_eq!(commonmark("**__a__**\n", 0), "**__a__**\n");
    assert_eq!(commonmark("**_a_**\n", 0), "**_a_**\n");
    assert_eq!(commonmark("*a*_b_\n", 0), "*a*_b_\n");
}

#[test]
fn test_commonmark_wrapping() {
    assert_eq!(
        commonmark("aaaa bbbb cccc dddd eeee ffff\n", 20),
        "aaaa bbbb cccc dddd\neeee ffff\n"
    );
}
