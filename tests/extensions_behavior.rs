//! One behavioral check per extension switch.

use pressdown::{markdown_to_html, Extensions};

fn html_with(source: &str, extensions: Extensions) -> String {
    markdown_to_html(source, extensions).unwrap()
}

#[test]
fn smarts_ellipsis_and_dashes() {
    assert_eq!(
        html_with("Wait...\n", Extensions::SMARTS),
        "<p>Wait&hellip;</p>"
    );
    assert_eq!(html_with("A--B\n", Extensions::SMARTS), "<p>A&ndash;B</p>");
    assert_eq!(html_with("A---B\n", Extensions::SMARTS), "<p>A&mdash;B</p>");
}

#[test]
fn smarts_are_off_by_default() {
    assert_eq!(
        html_with("Wait...\n", Extensions::empty()),
        "<p>Wait...</p>"
    );
}

#[test]
fn quotes_become_typographic_entities() {
    assert_eq!(
        html_with("\"q\"\n", Extensions::QUOTES),
        "<p>&ldquo;q&rdquo;</p>"
    );
    assert_eq!(
        html_with("'q'\n", Extensions::QUOTES),
        "<p>&lsquo;q&rsquo;</p>"
    );
    assert_eq!(
        html_with("<<x>>\n", Extensions::QUOTES),
        "<p>&laquo;x&raquo;</p>"
    );
}

#[test]
fn smartypants_apostrophe() {
    assert_eq!(
        html_with("it's\n", Extensions::SMARTYPANTS),
        "<p>it&rsquo;s</p>"
    );
}

#[test]
fn strikethrough() {
    assert_eq!(
        html_with("~~x~~\n", Extensions::STRIKETHROUGH),
        "<p><del>x</del></p>"
    );
}

#[test]
fn hardwraps_turn_newlines_into_breaks() {
    assert_eq!(
        html_with("a\nb\n", Extensions::HARDWRAPS),
        "<p>a<br/>b</p>"
    );
    assert_eq!(html_with("a\nb\n", Extensions::empty()), "<p>a b</p>");
}

#[test]
fn bare_autolinks() {
    assert_eq!(
        html_with("see http://e.com now\n", Extensions::AUTOLINKS),
        "<p>see <a href=\"http://e.com\">http://e.com</a> now</p>"
    );
}

#[test]
fn bare_autolinks_exclude_trailing_punctuation() {
    assert_eq!(
        html_with("go to http://e.com.\n", Extensions::AUTOLINKS),
        "<p>go to <a href=\"http://e.com\">http://e.com</a>.</p>"
    );
}

#[test]
fn bare_email_autolinks() {
    let out = html_with("mail me@host.org now\n", Extensions::AUTOLINKS);
    assert!(out.contains("mailto:"));
    assert!(!out.contains("me@host.org"));
}

#[test]
fn wiki_links() {
    assert_eq!(
        html_with("[[Some Page|here]]\n", Extensions::WIKILINKS),
        "<p><a href=\"./Some-Page.html\">here</a></p>"
    );
    assert_eq!(
        html_with("[[Page#sec]]\n", Extensions::WIKILINKS),
        "<p><a href=\"./Page.html#sec\">Page#sec</a></p>"
    );
}

#[test]
fn definition_lists() {
    assert_eq!(
        html_with("term\n: def\n", Extensions::DEFINITIONS),
        "<dl>\n  <dt>term</dt>\n  <dd>def</dd>\n</dl>"
    );
}

#[test]
fn abbreviations_expand_on_word_boundaries() {
    let out = html_with(
        "*[HTML]: Hyper Text\n\nHTML is nice\n",
        Extensions::ABBREVIATIONS,
    );
    assert_eq!(
        out,
        "<p><abbr title=\"Hyper Text\">HTML</abbr> is nice</p>"
    );
}

#[test]
fn abbreviations_do_not_match_inside_words() {
    let out = html_with(
        "*[AB]: a b\n\nABC stays\n",
        Extensions::ABBREVIATIONS,
    );
    assert_eq!(out, "<p>ABC stays</p>");
}

#[test]
fn task_list_items() {
    let out = html_with(
        "- [x] done\n- [ ] open\n",
        Extensions::TASK_LIST_ITEMS,
    );
    assert_eq!(
        out,
        "<ul>\n  <li class=\"task-list-item\"><input type=\"checkbox\" class=\"task-list-item-checkbox\" checked=\"checked\" disabled=\"disabled\"></input>done</li>\n  \
         <li class=\"task-list-item\"><input type=\"checkbox\" class=\"task-list-item-checkbox\" disabled=\"disabled\"></input>open</li>\n</ul>"
    );
}

#[test]
fn atx_header_space_requires_the_space() {
    assert_eq!(
        html_with("#Hi\n", Extensions::ATX_HEADER_SPACE),
        "<p>#Hi</p>"
    );
    assert_eq!(
        html_with("# Hi\n", Extensions::ATX_HEADER_SPACE),
        "<h1>Hi</h1>"
    );
    assert_eq!(html_with("#Hi\n", Extensions::empty()), "<h1>Hi</h1>");
}

#[test]
fn relaxed_hrules_skip_the_blank_line_requirement() {
    assert_eq!(
        html_with("---\ntext\n", Extensions::RELAXED_HRULES),
        "<hr/>\n<p>text</p>"
    );
    assert_eq!(
        html_with("---\ntext\n", Extensions::empty()),
        "<p>--- text</p>"
    );
}

#[test]
fn suppress_html_blocks() {
    assert_eq!(
        html_with("<div>x</div>\n\n", Extensions::SUPPRESS_HTML_BLOCKS),
        ""
    );
}

#[test]
fn suppress_inline_html() {
    assert_eq!(
        html_with("a <b>x</b> c\n", Extensions::SUPPRESS_INLINE_HTML),
        "<p>a x c</p>"
    );
}

#[test]
fn toc_lists_headings_in_document_order() {
    let out = html_with(
        "[TOC]\n\n# One\n\n## Two\n",
        Extensions::TOC | Extensions::EXT_ANCHOR_LINKS,
    );
    assert_eq!(
        out,
        "<ul class=\"toc\"><li><a href=\"#one\">One</a></li><ul><li><a href=\"#two\">Two</a></li></ul></ul>\n\
         <h1><a name=\"one\"></a>One</h1>\n<h2><a name=\"two\"></a>Two</h2>"
    );
}

#[test]
fn toc_ids_match_heading_anchors_wherever_the_marker_sits() {
    let out = html_with(
        "# One\n\n[TOC]\n\n## Two\n",
        Extensions::TOC | Extensions::EXT_ANCHOR_LINKS,
    );
    // the TOC sees the heading above it and links by the same id
    assert!(out.contains("<a href=\"#one\">One</a>"));
    assert!(out.contains("<a href=\"#two\">Two</a>"));
    assert!(out.contains("<h1><a name=\"one\"></a>One</h1>"));
}

#[test]
fn toc_level_limits_depth() {
    let out = html_with(
        "[TOC level=1]\n\n# One\n\n## Two\n",
        Extensions::TOC | Extensions::EXT_ANCHOR_LINKS,
    );
    assert!(out.contains("<a href=\"#one\">One</a>"));
    assert!(!out.contains("<a href=\"#two\">Two</a>"));
}

#[test]
fn empty_toc_renders_nothing() {
    assert_eq!(html_with("[TOC]\n", Extensions::TOC), "");
}

#[test]
fn multi_line_image_urls() {
    let out = html_with(
        "![alt](http://e/img?\nmore\n)\n",
        Extensions::MULTI_LINE_IMAGE_URLS,
    );
    assert_eq!(
        out,
        "<p><img src=\"http://e/img?%0Amore%0A\" alt=\"alt\" /></p>"
    );
}

#[test]
fn dummy_reference_key_changes_resolution() {
    // with the extension, `[x][]` no longer resolves through its own text
    assert_eq!(
        html_with("[x][]\n\n[x]: /u\n", Extensions::DUMMY_REFERENCE_KEY),
        "<p>[x][]</p>"
    );
    assert_eq!(
        html_with("[x][]\n\n[x]: /u\n", Extensions::empty()),
        "<p><a href=\"/u\">x</a></p>"
    );
}

#[test]
fn fenced_code_blocks_carry_the_language_tag() {
    assert_eq!(
        html_with("```rust\nlet x;\n```\n", Extensions::FENCED_CODE_BLOCKS),
        "<pre><code class=\"rust\">let x;\n</code></pre>"
    );
}

#[test]
fn fenced_code_requires_the_extension() {
    let out = html_with("```\ncode\n```\n", Extensions::empty());
    assert!(!out.contains("<pre>"));
}

#[test]
fn force_list_item_para_wraps_multi_block_items() {
    let out = html_with(
        "- a\n\n      code\n- b\n",
        Extensions::FORCE_LIST_ITEM_PARA,
    );
    assert!(out.contains("<p>a</p>"));
}

#[test]
fn intellij_dummy_identifier_allows_empty_footnote_labels() {
    let out = html_with(
        "x[^]\n\n[^]: note\n",
        Extensions::FOOTNOTES | Extensions::INTELLIJ_DUMMY_IDENTIFIER,
    );
    assert!(out.contains("footnote-ref"));
    assert!(out.contains("note"));
}
