//! Integration tests for the CommonMark parser, checked through HTML output

use commark_core::{parse_document, render_html, NodeKind, Options, Parser, SourcePos};
use pretty_assertions::assert_eq;

fn html(input: &str) -> String {
    html_with(input, Options::default())
}

fn html_with(input: &str, options: Options) -> String {
    let tree = parse_document(input, options).unwrap();
    render_html(&tree, &options)
}

// ============================================================================
// Leaf Blocks
// ============================================================================

#[test]
fn test_atx_headings() {
    assert_eq!(
        html("# foo\n## foo\n###### foo\n"),
        "<h1>foo</h1>\n<h2>foo</h2>\n<h6>foo</h6>\n"
    );
}

#[test]
fn test_atx_heading_too_many_hashes() {
    assert_eq!(html("####### foo\n"), "<p>####### foo</p>\n");
}

#[test]
fn test_atx_heading_closing_sequence() {
    assert_eq!(html("## foo ##\n# foo#\n"), "<h2>foo</h2>\n<h1>foo#</h1>\n");
}

#[test]
fn test_setext_headings() {
    assert_eq!(
        html("Foo *bar*\n=========\n\nFoo *bar*\n---------\n"),
        "<h1>Foo <em>bar</em></h1>\n<h2>Foo <em>bar</em></h2>\n"
    );
}

#[test]
fn test_setext_heading_spans_paragraph_lines() {
    assert_eq!(html("Foo\nbar\n---\n"), "<h2>Foo\nbar</h2>\n");
}

#[test]
fn test_thematic_breaks() {
    assert_eq!(html("***\n---\n___\n"), "<hr />\n<hr />\n<hr />\n");
    assert_eq!(html(" - - -\n"), "<hr />\n");
}

#[test]
fn test_indented_code_block() {
    assert_eq!(
        html("    a simple\n      indented code block\n"),
        "<pre><code>a simple\n  indented code block\n</code></pre>\n"
    );
}

#[test]
fn test_indented_code_cannot_interrupt_paragraph() {
    assert_eq!(html("Foo\n    bar\n"), "<p>Foo\nbar</p>\n");
}

#[test]
fn test_tab_indented_code() {
    assert_eq!(html("\tfoo\tbaz\t\tbim\n"), "<pre><code>foo\tbaz\t\tbim\n</code></pre>\n");
}

#[test]
fn test_fenced_code_with_info() {
    assert_eq!(
        html("```ruby\ndef foo(x)\n  return 3\nend\n```\n"),
        "<pre><code class=\"language-ruby\">def foo(x)\n  return 3\nend\n</code></pre>\n"
    );
}

#[test]
fn test_fenced_code_tilde_and_longer_closer() {
    assert_eq!(html("~~~\naaa\n```\n~~~~\n"), "<pre><code>aaa\n```\n</code></pre>\n");
}

#[test]
fn test_unclosed_fence_runs_to_end() {
    assert_eq!(html("```\naaa\n"), "<pre><code>aaa\n</code></pre>\n");
}

#[test]
fn test_html_block_passes_through() {
    assert_eq!(html("<div>\n*hello*\n</div>\n"), "<div>\n*hello*\n</div>\n");
}

#[test]
fn test_html_comment_block() {
    assert_eq!(html("<!-- a\n\nb -->\nok\n"), "<!-- a\n\nb -->\n<p>ok</p>\n");
}

#[test]
fn test_paragraph_lines_are_stripped() {
    assert_eq!(html("  aaa\n bbb\n"), "<p>aaa\nbbb</p>\n");
}

#[test]
fn test_empty_input() {
    assert_eq!(html(""), "");
    assert_eq!(html("\n\n  \n"), "");
}

// ============================================================================
// Link Reference Definitions
// ============================================================================

#[test]
fn test_reference_definition_used_by_link() {
    assert_eq!(
        html("[foo]: /url \"title\"\n\n[foo]\n"),
        "<p><a href=\"/url\" title=\"title\">foo</a></p>\n"
    );
}

#[test]
fn test_reference_definition_alone_leaves_nothing() {
    assert_eq!(html("[foo]: /url\n"), "");
}

#[test]
fn test_reference_labels_are_case_insensitive() {
    assert_eq!(html("[Foo bar]: /url\n\n[FOO  BAR][]\n"), "<p><a href=\"/url\">FOO  BAR</a></p>\n");
}

#[test]
fn test_reference_definition_later_in_document() {
    assert_eq!(html("[foo]\n\n[foo]: /url\n"), "<p><a href=\"/url\">foo</a></p>\n");
}

// ============================================================================
// Container Blocks
// ============================================================================

#[test]
fn test_block_quote() {
    assert_eq!(
        html("> # Foo\n> bar\n> baz\n"),
        "<blockquote>\n<h1>Foo</h1>\n<p>bar\nbaz</p>\n</blockquote>\n"
    );
}

#[test]
fn test_block_quote_lazy_continuation() {
    assert_eq!(
        html("> bar\nbaz\n> foo\n"),
        "<blockquote>\n<p>bar\nbaz\nfoo</p>\n</blockquote>\n"
    );
}

#[test]
fn test_block_quote_ends_at_blank_line() {
    assert_eq!(
        html("> foo\n\n> bar\n"),
        "<blockquote>\n<p>foo</p>\n</blockquote>\n<blockquote>\n<p>bar</p>\n</blockquote>\n"
    );
}

#[test]
fn test_tight_bullet_list() {
    assert_eq!(html("- foo\n- bar\n"), "<ul>\n<li>foo</li>\n<li>bar</li>\n</ul>\n");
}

#[test]
fn test_changing_bullet_starts_new_list() {
    assert_eq!(
        html("- foo\n- bar\n+ baz\n"),
        "<ul>\n<li>foo</li>\n<li>bar</li>\n</ul>\n<ul>\n<li>baz</li>\n</ul>\n"
    );
}

#[test]
fn test_loose_list() {
    assert_eq!(
        html("- a\n- b\n\n- c\n"),
        "<ul>\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n<li>\n<p>c</p>\n</li>\n</ul>\n"
    );
}

#[test]
fn test_ordered_list_start() {
    assert_eq!(
        html("3. a\n4. b\n"),
        "<ol start=\"3\">\n<li>a</li>\n<li>b</li>\n</ol>\n"
    );
}

#[test]
fn test_ordered_list_must_start_at_one_to_interrupt_paragraph() {
    assert_eq!(
        html("The number of windows in my house is\n14.  The number of doors is 6.\n"),
        "<p>The number of windows in my house is\n14.  The number of doors is 6.</p>\n"
    );
}

#[test]
fn test_nested_lists() {
    assert_eq!(
        html("- foo\n  - bar\n    - baz\n"),
        "<ul>\n<li>foo\n<ul>\n<li>bar\n<ul>\n<li>baz</li>\n</ul>\n</li>\n</ul>\n</li>\n</ul>\n"
    );
}

#[test]
fn test_list_item_with_code_block() {
    assert_eq!(
        html("1.  A paragraph\n\n        indented code\n"),
        "<ol>\n<li>\n<p>A paragraph</p>\n<pre><code>indented code\n</code></pre>\n</li>\n</ol>\n"
    );
}

#[test]
fn test_empty_list_item() {
    assert_eq!(html("- foo\n-\n- bar\n"), "<ul>\n<li>foo</li>\n<li></li>\n<li>bar</li>\n</ul>\n");
}

// ============================================================================
// Inlines
// ============================================================================

#[test]
fn test_code_spans() {
    assert_eq!(html("`foo`\n"), "<p><code>foo</code></p>\n");
    assert_eq!(html("`` foo ` bar ``\n"), "<p><code>foo ` bar</code></p>\n");
    assert_eq!(html("```foo``\n"), "<p>```foo``</p>\n");
}

#[test]
fn test_backslash_escapes() {
    assert_eq!(html("\\*not emphasized*\n"), "<p>*not emphasized*</p>\n");
    assert_eq!(html("\\\\*emphasis*\n"), "<p>\\<em>emphasis</em></p>\n");
}

#[test]
fn test_entities() {
    assert_eq!(html("&nbsp; &amp; &copy;\n"), "<p>\u{a0} &amp; ©</p>\n");
    assert_eq!(html("&#35; &#x22;\n"), "<p># &quot;</p>\n");
    assert_eq!(html("&madeup;\n"), "<p>&amp;madeup;</p>\n");
}

#[test]
fn test_emphasis_and_strong() {
    assert_eq!(html("*foo bar*\n"), "<p><em>foo bar</em></p>\n");
    assert_eq!(html("**foo bar**\n"), "<p><strong>foo bar</strong></p>\n");
    assert_eq!(html("***strong emph***\n"), "<p><em><strong>strong emph</strong></em></p>\n");
    assert_eq!(html("*foo**bar**baz*\n"), "<p><em>foo<strong>bar</strong>baz</em></p>\n");
}

#[test]
fn test_emphasis_flanking_rules() {
    assert_eq!(html("a * foo bar*\n"), "<p>a * foo bar*</p>\n");
    assert_eq!(html("foo*bar*\n"), "<p>foo<em>bar</em></p>\n");
    assert_eq!(html("foo_bar_\n"), "<p>foo_bar_</p>\n");
}

#[test]
fn test_emphasis_rule_of_three() {
    assert_eq!(html("*foo**bar*\n"), "<p><em>foo**bar</em></p>\n");
}

#[test]
fn test_inline_links() {
    assert_eq!(
        html("[link](/uri \"title\")\n"),
        "<p><a href=\"/uri\" title=\"title\">link</a></p>\n"
    );
    assert_eq!(html("[link](<my uri>)\n"), "<p><a href=\"my%20uri\">link</a></p>\n");
    assert_eq!(html("[link]()\n"), "<p><a href=\"\">link</a></p>\n");
}

#[test]
fn test_links_do_not_nest() {
    assert_eq!(
        html("[foo [bar](/uri)](/uri)\n"),
        "<p>[foo <a href=\"/uri\">bar</a>](/uri)</p>\n"
    );
}

#[test]
fn test_images() {
    assert_eq!(
        html("![foo](/url \"title\")\n"),
        "<p><img src=\"/url\" alt=\"foo\" title=\"title\" /></p>\n"
    );
    assert_eq!(html("![foo *bar*](train.jpg)\n"), "<p><img src=\"train.jpg\" alt=\"foo bar\" /></p>\n");
}

#[test]
fn test_autolinks() {
    assert_eq!(
        html("<https://foo.bar.baz>\n"),
        "<p><a href=\"https://foo.bar.baz\">https://foo.bar.baz</a></p>\n"
    );
    assert_eq!(
        html("<foo@bar.example.com>\n"),
        "<p><a href=\"mailto:foo@bar.example.com\">foo@bar.example.com</a></p>\n"
    );
    assert_eq!(html("<m:abc>\n"), "<p>&lt;m:abc&gt;</p>\n");
}

#[test]
fn test_raw_inline_html() {
    assert_eq!(html("<a><bab><c2c>\n"), "<p><a><bab><c2c></p>\n");
    assert_eq!(html("foo <!-- this is a\ncomment -->\n"), "<p>foo <!-- this is a\ncomment --></p>\n");
}

#[test]
fn test_hard_line_breaks() {
    assert_eq!(html("foo  \nbaz\n"), "<p>foo<br />\nbaz</p>\n");
    assert_eq!(html("foo\\\nbaz\n"), "<p>foo<br />\nbaz</p>\n");
    assert_eq!(html("foo  \n"), "<p>foo</p>\n");
}

#[test]
fn test_smart_punctuation() {
    let options = Options::default().with_smart(true);
    assert_eq!(
        html_with("\"foo\" -- bar---baz...\n", options),
        "<p>\u{201c}foo\u{201d} \u{2013} bar\u{2014}baz\u{2026}</p>\n"
    );
    assert_eq!(html_with("it's\n", options), "<p>it\u{2019}s</p>\n");
}

// ============================================================================
// Input Handling
// ============================================================================

#[test]
fn test_line_endings() {
    assert_eq!(html("a\r\nb\rc\n"), "<p>a\nb\nc</p>\n");
}

#[test]
fn test_nul_replaced() {
    assert_eq!(html("a\0b\n"), "<p>a\u{fffd}b</p>\n");
}

#[test]
fn test_invalid_utf8_replaced() {
    let mut parser = Parser::new(Options::default().with_validate_utf8(true)).unwrap();
    parser.feed(b"a\xffb\n");
    let tree = parser.finish();
    assert_eq!(render_html(&tree, &Options::default()), "<p>a\u{fffd}b</p>\n");
}

#[test]
fn test_byte_at_a_time_matches_whole_input() {
    let input = "# Title\r\n\r\n> - one\n>   two\n\n```\ncode\n```\n\n[ref]: /u\n*[ref]* é\n";
    let mut parser = Parser::new(Options::default()).unwrap();
    for b in input.as_bytes() {
        parser.feed(std::slice::from_ref(b));
    }
    let streamed = parser.finish();
    assert_eq!(render_html(&streamed, &Options::default()), html(input));
}

#[test]
fn test_conflicting_options_rejected() {
    let options = Options::default().with_hard_breaks(true).with_no_breaks(true);
    assert!(Parser::new(options).is_err());
    assert!(parse_document("x", options).is_err());
}

// ============================================================================
// Tree Shape
// ============================================================================

#[test]
fn test_document_structure() {
    let tree = parse_document("# Title\n\n- a\n", Options::default()).unwrap();
    let kinds: Vec<_> = tree.children(tree.root()).filter_map(|c| tree.kind(c)).collect();
    assert_eq!(kinds, vec![NodeKind::Heading, NodeKind::List]);

    let heading = tree.first_child(tree.root()).unwrap();
    assert_eq!(tree.heading_level(heading).unwrap(), 1);
    let text = tree.first_child(heading).unwrap();
    assert_eq!(tree.literal(text).unwrap(), "Title");

    let list = tree.next(heading).unwrap();
    assert!(tree.list_tight(list).unwrap());
}

#[test]
fn test_adjacent_text_is_merged() {
    let tree = parse_document("foo*bar\n", Options::default()).unwrap();
    let para = tree.first_child(tree.root()).unwrap();
    let children: Vec<_> = tree.children(para).collect();
    assert_eq!(children.len(), 1);
    assert_eq!(tree.literal(children[0]).unwrap(), "foo*bar");
}

#[test]
fn test_source_positions() {
    let options = Options::default().with_source_pos(true);
    let tree = parse_document("# a\n\nb\nc\n", options).unwrap();
    let heading = tree.first_child(tree.root()).unwrap();
    let para = tree.next(heading).unwrap();
    assert_eq!(tree.sourcepos(heading), Some(SourcePos::new(1, 1, 1, 3)));
    assert_eq!(tree.sourcepos(para), Some(SourcePos::new(3, 1, 4, 1)));
    assert_eq!(
        render_html(&tree, &options),
        "<h1 data-sourcepos=\"1:1-1:3\">a</h1>\n<p data-sourcepos=\"3:1-4:1\">b\nc</p>\n"
    );
}

#[test]
fn test_source_positions_absent_by_default() {
    let tree = parse_document("# a\n", Options::default()).unwrap();
    let heading = tree.first_child(tree.root()).unwrap();
    assert_eq!(tree.sourcepos(heading), None);
}
