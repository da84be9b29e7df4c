//! End-to-end HTML expectations for the standard (extension-free) grammar
//! plus the core extension seed scenarios.

use pressdown::{markdown_to_html, Extensions};

fn html(source: &str) -> String {
    markdown_to_html(source, Extensions::empty()).unwrap()
}

fn html_with(source: &str, extensions: Extensions) -> String {
    markdown_to_html(source, extensions).unwrap()
}

#[test]
fn paragraph() {
    assert_eq!(html("hello world\n"), "<p>hello world</p>");
}

#[test]
fn two_paragraphs() {
    assert_eq!(html("one\n\ntwo\n"), "<p>one</p>\n<p>two</p>");
}

#[test]
fn atx_heading_levels() {
    assert_eq!(html("# One\n"), "<h1>One</h1>");
    assert_eq!(html("### Three\n"), "<h3>Three</h3>");
    assert_eq!(html("###### Six\n"), "<h6>Six</h6>");
}

#[test]
fn atx_trailing_hashes_are_discarded() {
    assert_eq!(html("## Two ##\n"), "<h2>Two</h2>");
}

#[test]
fn setext_headings() {
    assert_eq!(html("Title\n=====\n"), "<h1>Title</h1>");
    assert_eq!(html("Title\n---\n"), "<h2>Title</h2>");
}

#[test]
fn setext_needs_at_least_three_underline_chars() {
    // a single dash is no underline; the lines join into one paragraph
    assert_eq!(html("Title\n-\n"), "<p>Title -</p>");
}

#[test]
fn emphasis_and_strong() {
    assert_eq!(html("*em*\n"), "<p><em>em</em></p>");
    assert_eq!(html("**st**\n"), "<p><strong>st</strong></p>");
    assert_eq!(html("***both***\n"), "<p><strong><em>both</em></strong></p>");
}

#[test]
fn unclosed_emphasis_stays_literal() {
    assert_eq!(html("*foo\n"), "<p>*foo</p>");
    assert_eq!(html("**foo\n"), "<p>**foo</p>");
}

#[test]
fn close_char_stealing() {
    // the nested emphasis gives one closer back to the strong parent
    assert_eq!(html("**a *b** c\n"), "<p><strong>a *b</strong> c</p>");
}

#[test]
fn emphasis_does_not_open_inside_words() {
    assert_eq!(html("a*b*c\n"), "<p>a*b*c</p>");
}

#[test]
fn star_runs_are_plain_text() {
    assert_eq!(html("a **** b\n"), "<p>a **** b</p>");
}

#[test]
fn inline_code() {
    assert_eq!(html("`x`\n"), "<p><code>x</code></p>");
    assert_eq!(html("`a b`\n"), "<p><code>a b</code></p>");
    assert_eq!(html("``a `tick` b``\n"), "<p><code>a `tick` b</code></p>");
}

#[test]
fn inline_code_encodes_html() {
    assert_eq!(html("`a < b`\n"), "<p><code>a &lt; b</code></p>");
}

#[test]
fn entities_pass_through_raw() {
    assert_eq!(html("AT&amp;T\n"), "<p>AT&amp;T</p>");
    assert_eq!(html("&#35; &#x1F;\n"), "<p>&#35; &#x1F;</p>");
}

#[test]
fn bare_ampersand_is_encoded() {
    assert_eq!(html("a & b\n"), "<p>a &amp; b</p>");
}

#[test]
fn escaped_characters() {
    assert_eq!(html("\\*not em\\*\n"), "<p>*not em*</p>");
}

#[test]
fn explicit_link() {
    assert_eq!(
        html("[text](/url \"title\")\n"),
        "<p><a href=\"/url\" title=\"title\">text</a></p>"
    );
    assert_eq!(html("[text](/url)\n"), "<p><a href=\"/url\">text</a></p>");
}

#[test]
fn explicit_image() {
    assert_eq!(
        html("![alt](/img)\n"),
        "<p><img src=\"/img\" alt=\"alt\" /></p>"
    );
}

#[test]
fn reference_link_resolves_case_insensitively() {
    // seed scenario: the label normalizes to lowercase
    assert_eq!(
        html("[x][Y]\n\n[y]: http://e\n"),
        "<p><a href=\"http://e\">x</a></p>"
    );
}

#[test]
fn unresolved_reference_prints_source_form() {
    assert_eq!(html("[x][nope]\n"), "<p>[x][nope]</p>");
}

#[test]
fn implicit_reference_link() {
    assert_eq!(html("[x]\n\n[x]: /u\n"), "<p><a href=\"/u\">x</a></p>");
}

#[test]
fn angle_autolink() {
    assert_eq!(
        html("<http://x.y>\n"),
        "<p><a href=\"http://x.y\">http://x.y</a></p>"
    );
}

#[test]
fn mail_link_is_obfuscated() {
    let out = html("<foo@bar.com>\n");
    assert!(out.starts_with("<p><a href=\"mailto:&#102;"));
    assert!(out.contains("&#x6f;o&#64;"));
    assert!(!out.contains("foo@bar.com"));
}

#[test]
fn hard_line_break_with_two_spaces() {
    assert_eq!(html("a  \nb\n"), "<p>a<br/>b</p>");
}

#[test]
fn soft_newline_becomes_space() {
    assert_eq!(html("a\nb\n"), "<p>a b</p>");
}

#[test]
fn horizontal_rule_requires_following_blank() {
    assert_eq!(html("---\n\ntext\n"), "<hr/>\n<p>text</p>");
    assert_eq!(html("--- text\n"), "<p>--- text</p>");
}

#[test]
fn horizontal_rule_variants() {
    assert_eq!(html("* * *\n\n"), "<hr/>");
    assert_eq!(html("___\n\n"), "<hr/>");
}

#[test]
fn block_quote_with_nesting() {
    // seed scenario 6
    assert_eq!(
        html("> a\n> > b\n> c\n"),
        "<blockquote>\n  <p>a</p>\n  <blockquote>\n    <p>b</p>\n  </blockquote>\n  <p>c</p>\n</blockquote>"
    );
}

#[test]
fn tight_bullet_list() {
    assert_eq!(html("- a\n- b\n"), "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>");
}

#[test]
fn tight_ordered_list() {
    assert_eq!(
        html("1. a\n2. b\n"),
        "<ol>\n  <li>a</li>\n  <li>b</li>\n</ol>"
    );
}

#[test]
fn loose_list_wraps_every_item_in_paragraphs() {
    let out = html("- a\n\n- b\n");
    assert_eq!(
        out,
        "<ul>\n  <li>\n  <p>a</p></li>\n  <li>\n  <p>b</p></li>\n</ul>"
    );
}

#[test]
fn indented_code_block() {
    assert_eq!(html("    code\n"), "<pre><code>code\n</code></pre>");
    assert_eq!(html("\tfn x\n"), "<pre><code>fn x\n</code></pre>");
}

#[test]
fn indented_code_preserves_interior_blank_lines() {
    assert_eq!(
        html("    a\n\n    b\n"),
        "<pre><code>a\n\nb\n</code></pre>"
    );
}

#[test]
fn indented_code_encodes_content() {
    assert_eq!(html("    a < b\n"), "<pre><code>a &lt; b\n</code></pre>");
}

#[test]
fn html_block_passes_through() {
    assert_eq!(html("<div>x</div>\n\n"), "<div>x</div>");
}

#[test]
fn inline_html_passes_through() {
    assert_eq!(html("a <b>x</b> c\n"), "<p>a <b>x</b> c</p>");
}

#[test]
fn html_comment_block() {
    assert_eq!(html("<!-- note -->\n\n"), "<!-- note -->");
}

#[test]
fn empty_input() {
    assert_eq!(html(""), "");
}

#[test]
fn footnote_numbering_follows_first_reference_order() {
    // seed scenario 3: definitions appear b-then-a, references a-then-b
    let out = html_with(
        "A[^a] B[^b]\n\n[^b]: bee\n[^a]: ay\n",
        Extensions::FOOTNOTES,
    );
    assert!(out.contains(
        "<p>A<sup id=\"fnref-1\"><a href=\"#fn-1\" class=\"footnote-ref\">1</a></sup> \
         B<sup id=\"fnref-2\"><a href=\"#fn-2\" class=\"footnote-ref\">2</a></sup></p>"
    ));
    assert!(out.contains("<li id=\"fn-1\"><p>ay<a href=\"#fnref-1\""));
    assert!(out.contains("<li id=\"fn-2\"><p>bee<a href=\"#fnref-2\""));
    assert!(out.contains("<div class=\"footnotes\">\n<hr/>\n<ol>\n"));
}

#[test]
fn unreferenced_footnotes_are_omitted() {
    let out = html_with("text\n\n[^lost]: gone\n", Extensions::FOOTNOTES);
    assert_eq!(out, "<p>text</p>");
}

#[test]
fn ext_anchor_links_seed() {
    // seed scenario 1, wrap off then on
    assert_eq!(
        html_with("# H1\n", Extensions::EXT_ANCHOR_LINKS),
        "<h1><a name=\"h1\"></a>H1</h1>"
    );
    assert_eq!(
        html_with(
            "# H1\n",
            Extensions::EXT_ANCHOR_LINKS | Extensions::EXT_ANCHOR_LINKS_WRAP
        ),
        "<h1><a name=\"h1\">H1</a></h1>"
    );
}

#[test]
fn plain_anchor_links_wrap_the_single_text_child() {
    // the plain extension keeps the leading alphanumeric-and-space range
    // as-is, unlike the extended sanitizer
    assert_eq!(
        html_with("# My Title\n", Extensions::ANCHOR_LINKS),
        "<h1><a name=\"My Title\">My Title</a></h1>"
    );
}

#[test]
fn relaxed_emphasis_seed() {
    // seed scenario 2
    assert_eq!(html("`x`_y_\n"), "<p><code>x</code>_y_</p>");
    assert_eq!(
        html_with("`x`_y_\n", Extensions::RELAXED_STRONG_EMPHASIS_RULES),
        "<p><code>x</code><em>y</em></p>"
    );
}

#[test]
fn table_seed() {
    // seed scenario 4
    let out = html_with("| a | b |\n|---|--:|\n| 1 | 2 |\n", Extensions::TABLES);
    assert_eq!(
        out,
        "<table>\n  <thead>\n    <tr>\n      <th>a </th>\n      <th align=\"right\">b </th>\n    </tr>\n  </thead>\n  \
         <tbody>\n    <tr>\n      <td>1 </td>\n      <td align=\"right\">2 </td>\n    </tr>\n  </tbody>\n</table>"
    );
}

#[test]
fn fence_length_must_match_or_exceed() {
    let out = html_with(
        "````\ncode\n```\nstill\n````\n",
        Extensions::FENCED_CODE_BLOCKS,
    );
    assert_eq!(out, "<pre><code>code\n```\nstill\n</code></pre>");
}

#[test]
fn fence_other_character_does_not_close() {
    let out = html_with("```\ncode\n~~~\n```\n", Extensions::FENCED_CODE_BLOCKS);
    assert_eq!(out, "<pre><code>code\n~~~\n</code></pre>");
}
