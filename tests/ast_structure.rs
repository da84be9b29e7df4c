//! Structural properties of the parsed tree: index invariants, coalescing,
//! sub-parse index remapping, determinism, and serde round-tripping.

use pressdown::{Extensions, Node, NodeKind, Processor, ReferenceKey};

fn parse(source: &str, extensions: Extensions) -> Node {
    Processor::new(extensions).parse(source).unwrap()
}

fn all_nodes(root: &Node) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    root.walk(&mut |node| spans.push((node.start, node.end)));
    spans
}

#[test]
fn indices_stay_inside_the_source() {
    let source = "# T\n\npara *em* [l](/u) `c`\n\n- item\n\n> quoted\n";
    let root = parse(source, Extensions::empty());
    let len = source.chars().count();
    for (start, end) in all_nodes(&root) {
        assert!(start <= end, "start {start} > end {end}");
        assert!(end <= len, "end {end} beyond source length {len}");
    }
}

#[test]
fn siblings_are_ordered_and_disjoint() {
    let source = "intro *em* mid [l](/u) end\n\n- one\n- two\n";
    let root = parse(source, Extensions::empty());
    fn check(node: &Node) {
        let children = node.children();
        for pair in children.windows(2) {
            assert!(
                pair[0].end <= pair[1].start,
                "overlapping siblings: {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
        for child in children {
            check(child);
        }
    }
    check(&root);
}

#[test]
fn adjacent_text_runs_coalesce_into_one_node() {
    let root = parse("a b c\n", Extensions::empty());
    let NodeKind::Para { children } = &root.children()[0].kind else {
        panic!("expected paragraph");
    };
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0].kind,
        NodeKind::Text {
            text: "a b c".into()
        }
    );
}

#[test]
fn special_text_interrupts_coalescing() {
    let root = parse("a & b\n", Extensions::empty());
    let NodeKind::Para { children } = &root.children()[0].kind else {
        panic!("expected paragraph");
    };
    assert_eq!(children.len(), 3);
    assert!(matches!(children[0].kind, NodeKind::Text { .. }));
    assert!(matches!(children[1].kind, NodeKind::SpecialText { .. }));
    assert!(matches!(children[2].kind, NodeKind::Text { .. }));
}

#[test]
fn sub_parse_indices_point_into_the_original_buffer() {
    // seed scenario 6: the inner `b` sits at offset 8 of the source
    let source = "> a\n> > b\n> c\n";
    let root = parse(source, Extensions::empty());

    let NodeKind::BlockQuote { children } = &root.children()[0].kind else {
        panic!("expected outer block quote");
    };
    assert_eq!(children.len(), 3);
    assert!(matches!(children[0].kind, NodeKind::Para { .. }));
    assert!(matches!(children[2].kind, NodeKind::Para { .. }));

    let NodeKind::BlockQuote { children: inner } = &children[1].kind else {
        panic!("expected inner block quote, got {:?}", children[1].kind);
    };
    let NodeKind::Para { children: para } = &inner[0].kind else {
        panic!("expected inner paragraph");
    };
    assert_eq!(para[0].kind, NodeKind::Text { text: "b".into() });
    assert_eq!(para[0].start, 8);
    assert_eq!(para[0].end, 9);
}

#[test]
fn list_item_indices_point_into_the_original_buffer() {
    let source = "- alpha\n- beta\n";
    let root = parse(source, Extensions::empty());
    let NodeKind::BulletList { children } = &root.children()[0].kind else {
        panic!("expected bullet list");
    };
    // "alpha" starts after "- ", "beta" after the second marker
    assert_eq!(children[0].start, 2);
    assert_eq!(children[1].start, 10);
}

#[test]
fn parsing_is_deterministic() {
    let source = "# H\n\n*a* [x][y] `c`\n\n- 1\n- 2\n\n[y]: /u\n";
    let first = parse(source, Extensions::ALL);
    let second = parse(source, Extensions::ALL);
    assert_eq!(first, second);
}

#[test]
fn empty_input_gives_empty_root() {
    let root = parse("", Extensions::empty());
    assert!(root.children().is_empty());
    assert_eq!((root.start, root.end), (0, 0));
}

#[test]
fn toc_marker_alone_has_empty_heading_list() {
    let root = parse("[TOC]\n", Extensions::TOC);
    let NodeKind::Toc { level, headings } = &root.children()[0].kind else {
        panic!("expected toc node");
    };
    assert_eq!(*level, 6);
    assert!(headings.is_empty());
}

#[test]
fn dummy_reference_key_is_distinguishable() {
    let with_ext = parse("[x][]\n", Extensions::DUMMY_REFERENCE_KEY);
    let NodeKind::Para { children } = &with_ext.children()[0].kind else {
        panic!("expected paragraph");
    };
    let NodeKind::RefLink { reference_key, .. } = &children[0].kind else {
        panic!("expected ref link, got {:?}", children[0].kind);
    };
    assert_eq!(reference_key, &Some(ReferenceKey::Dummy));

    let without_ext = parse("[x][]\n", Extensions::empty());
    let NodeKind::Para { children } = &without_ext.children()[0].kind else {
        panic!("expected paragraph");
    };
    let NodeKind::RefLink { reference_key, .. } = &children[0].kind else {
        panic!("expected ref link");
    };
    assert_eq!(reference_key, &None);
}

#[test]
fn bare_reference_has_no_separator() {
    let root = parse("[x]\n", Extensions::empty());
    let NodeKind::Para { children } = &root.children()[0].kind else {
        panic!("expected paragraph");
    };
    let NodeKind::RefLink {
        reference_key,
        separator,
        ..
    } = &children[0].kind
    else {
        panic!("expected ref link");
    };
    assert_eq!(reference_key, &None);
    assert_eq!(separator, &None);
}

#[test]
fn task_list_item_keeps_its_marker_text() {
    let root = parse("- [x] done\n- [ ] open\n", Extensions::TASK_LIST_ITEMS);
    let NodeKind::BulletList { children } = &root.children()[0].kind else {
        panic!("expected bullet list");
    };
    let NodeKind::TaskListItem { done, marker, .. } = &children[0].kind else {
        panic!("expected task item, got {:?}", children[0].kind);
    };
    assert!(*done);
    assert_eq!(marker, "[x] ");
    let NodeKind::TaskListItem { done, marker, .. } = &children[1].kind else {
        panic!("expected task item");
    };
    assert!(!*done);
    assert_eq!(marker, "[ ] ");
}

#[test]
fn table_columns_carry_divider_alignment() {
    let root = parse(
        "| a | b |\n|---|--:|\n| 1 | 2 |\n",
        Extensions::TABLES,
    );
    let NodeKind::Table { columns, children } = &root.children()[0].kind else {
        panic!("expected table, got {:?}", root.children()[0].kind);
    };
    assert_eq!(columns.len(), 2);
    assert_eq!(
        columns[0].kind,
        NodeKind::TableColumn {
            alignment: pressdown::Alignment::None
        }
    );
    assert_eq!(
        columns[1].kind,
        NodeKind::TableColumn {
            alignment: pressdown::Alignment::Right
        }
    );
    assert!(matches!(children[0].kind, NodeKind::TableHeader { .. }));
    assert!(matches!(children[1].kind, NodeKind::TableBody { .. }));
}

#[test]
fn root_tables_collect_definitions_in_document_order() {
    let source = "[a]: /1\n\n*[X]: expansion\n\n[^f]: note\n\n[b]: /2\n";
    let root = parse(
        source,
        Extensions::ABBREVIATIONS | Extensions::FOOTNOTES,
    );
    let NodeKind::Root {
        references,
        abbreviations,
        footnotes,
        ..
    } = &root.kind
    else {
        panic!("expected root");
    };
    assert_eq!(references.len(), 2);
    assert_eq!(abbreviations.len(), 1);
    assert_eq!(footnotes.len(), 1);
    assert!(references[0].start < references[1].start);
}

#[test]
fn reference_definitions_inside_block_quotes_stay_local() {
    // sub-parse accumulators are discarded by design
    let root = parse("> [a]: /url\n", Extensions::empty());
    let NodeKind::Root { references, .. } = &root.kind else {
        panic!("expected root");
    };
    assert!(references.is_empty());
}

#[test]
fn ast_serializes_through_serde() {
    let source = "# T\n\n*em* and [l](/u \"t\")\n\n- item\n";
    let root = parse(source, Extensions::empty());
    let json = serde_json::to_string(&root).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(root, back);
}
