// ==============================================================================
// Integration Tests: Parse Both Dialects Through the Public API
// ==============================================================================
//
// These tests drive the crate the way an editor would: parse a document, walk
// the resulting tree, apply an edit, and re-parse incrementally. Each section
// checks one observable guarantee: tree shape for valid input, contained
// errors for invalid input, structural sharing after edits, and the byte
// coverage every tree provides.

mod common;

use avro_cst::{
    EditDescriptor, NodeKind, Parser, ParserConfig, SyntaxTree, doc_comment, grammar_table,
    parse, parse_incremental,
};
use common::{find, find_all, leaf_text, nodes, shape};
use pretty_assertions::assert_eq;

const SCHEMA_A: &str = r#"{"type": "record", "name": "X", "fields": []}"#;

/// Documents of both dialects, valid and not, used by the property checks.
const CORPUS: &[&str] = &[
    "",
    SCHEMA_A,
    r#"{"type": "record", "name": "X", "fields": [}"#,
    r#"["null", "string", {"type": "map", "values": "long"}]"#,
    r#"{"type": "enum", "name": "Suit", "symbols": ["SPADES"], "default": "SPADES"}"#,
    r#"{"name": "Ambiguous", "doc": "no type yet"}"#,
    "protocol P { record R { string s; } }",
    "@namespace(\"org.example\")\nprotocol P {\n  /** Doc. */\n  error Oops { string why; }\n  void ping() oneway;\n}\n",
    "record A { int a; }\nrecord B { # }\nrecord C { long c; }\n",
    "record R { int a }",
    "protocol P { record R { union { int, , string } x; } }",
    "schema map<array<decimal(9, 2)>>;",
    "/* unterminated /* nested */ record R {}",
    "\"string\"",
    "}}} ;;; {{{",
];

// ==============================================================================
// Valid Documents
// ==============================================================================

#[test]
fn json_record_with_no_fields() {
    let tree = parse(SCHEMA_A);
    assert!(!tree.has_error());
    let root = tree.root_node();
    let declarations: Vec<NodeKind> = root.named_children().map(|n| n.kind()).collect();
    assert_eq!(declarations, vec![NodeKind::RecordDeclaration]);
    assert!(find(&tree, NodeKind::Field).is_none());
    assert!(nodes(&tree).iter().all(|n| !n.is_error()));
}

#[test]
fn idl_protocol_with_one_field() {
    let source = "protocol P { record R { string s; } }";
    let tree = parse(source);
    assert!(!tree.has_error());

    let protocol = tree.root_node().child(0).expect("protocol");
    assert_eq!(protocol.kind(), NodeKind::ProtocolDeclaration);
    let body = protocol.child_by_field_name("body").expect("protocol body");
    let records: Vec<_> = body
        .named_children()
        .filter(|n| n.kind() == NodeKind::RecordDeclaration)
        .collect();
    assert_eq!(records.len(), 1);

    let record_body = records[0].child_by_field_name("body").expect("record body");
    let fields: Vec<_> = record_body
        .named_children()
        .filter(|n| n.kind() == NodeKind::Field)
        .collect();
    assert_eq!(fields.len(), 1);
    let field_type = fields[0].child_by_field_name("type").expect("field type");
    assert_eq!(field_type.kind(), NodeKind::PrimitiveType);
    assert_eq!(field_type.utf8_text(source), "string");
    let name = fields[0].child_by_field_name("name").expect("field name");
    assert_eq!(name.utf8_text(source), "s");
}

#[test]
fn sexp_of_a_small_idl_file() {
    let tree = parse("fixed MD5(16);\nenum E { A, B } = A;");
    insta::assert_snapshot!(
        tree.to_sexp(),
        @"(source_file (fixed_declaration name: (identifier) size: (number)) (enum_declaration name: (identifier) body: (enum_body (enum_symbol (identifier)) (enum_symbol (identifier))) default: (enum_default (identifier))))"
    );
}

#[test]
fn the_shipped_grammar_has_no_unexpected_conflicts() {
    let table = grammar_table();
    assert!(table.conflicts().is_empty(), "{:?}", table.conflicts());
    assert!(table.state_count() > 0);
}

#[test]
fn doc_comments_through_the_public_api() {
    let source = "protocol P {\n  /**\n   * A point.\n   */\n  record Point { double x; }\n}";
    let tree = parse(source);
    let mut cursor = tree.walk();
    assert!(cursor.goto_first_child());
    let body = cursor.node().child_by_field_name("body").expect("body");
    cursor.goto_first_child_for_byte(body.start_byte()).expect("body");
    let record_start = find(&tree, NodeKind::RecordDeclaration)
        .expect("record")
        .start_byte();
    cursor
        .goto_first_child_for_byte(record_start)
        .expect("record");
    assert_eq!(cursor.node().kind(), NodeKind::RecordDeclaration);
    assert_eq!(doc_comment(&cursor, source).as_deref(), Some("A point."));
}

// ==============================================================================
// Cursor Navigation
// ==============================================================================

#[test]
fn cursor_walks_down_and_back_up() {
    let source = "protocol P { record R { int a; } }";
    let tree = parse(source);
    let mut cursor = tree.walk();
    assert_eq!(cursor.depth(), 0);
    assert_eq!(cursor.node().kind(), NodeKind::SourceFile);

    assert_eq!(cursor.goto_first_child_for_byte(13), Some(0));
    assert_eq!(cursor.node().kind(), NodeKind::ProtocolDeclaration);
    assert_eq!(cursor.field_name(), None);

    assert!(cursor.goto_first_child_for_byte(13).is_some());
    assert_eq!(cursor.node().kind(), NodeKind::ProtocolBody);
    assert_eq!(cursor.field_name(), Some("body"));
    assert_eq!(cursor.depth(), 2);

    assert!(cursor.goto_parent());
    assert!(cursor.goto_parent());
    assert!(!cursor.goto_parent());
    assert_eq!(cursor.node(), tree.root_node());
}

#[test]
fn siblings_include_punctuation_and_trivia() {
    let source = "record R {}";
    let tree = parse(source);
    let mut cursor = tree.walk();
    assert!(cursor.goto_first_child());
    assert!(cursor.goto_first_child());
    let mut texts = vec![cursor.node().utf8_text(source)];
    while cursor.goto_next_sibling() {
        texts.push(cursor.node().utf8_text(source));
    }
    assert_eq!(texts, vec!["record", " ", "R", " ", "{}"]);
}

// ==============================================================================
// Malformed Documents
// ==============================================================================

#[test]
fn unclosed_fields_array_is_contained() {
    let source = r#"{"type": "record", "name": "X", "fields": [}"#;
    let tree = parse(source);
    assert!(tree.has_error());

    let errors: Vec<_> = nodes(&tree).into_iter().filter(|n| n.is_error()).collect();
    assert_eq!(errors.len(), 1, "{}", tree.to_sexp());
    assert!(!errors[0].is_missing());
    assert_eq!(errors[0].byte_range(), 43..source.len());

    let type_property = find(&tree, NodeKind::TypeProperty).expect("type");
    assert_eq!(type_property.utf8_text(source), r#""type": "record""#);
    assert!(!type_property.has_error());
    let name_property = find(&tree, NodeKind::NameProperty).expect("name");
    assert_eq!(name_property.utf8_text(source), r#""name": "X""#);
}

#[test]
fn an_error_in_one_declaration_leaves_the_others_intact() {
    let source = "record A { int a; }\nrecord B { # }\nrecord C { long c; }\n";
    let tree = parse(source);
    assert!(tree.has_error());
    let records: Vec<_> = tree.root_node().named_children().collect();
    assert_eq!(
        records.iter().map(|n| n.kind()).collect::<Vec<_>>(),
        vec![NodeKind::RecordDeclaration; 3]
    );
    assert_eq!(
        records.iter().map(|n| n.has_error()).collect::<Vec<_>>(),
        vec![false, true, false]
    );
    assert_eq!(records[2].utf8_text(source), "record C { long c; }");
}

#[test]
fn exhausted_recovery_budget_still_covers_the_input() {
    let source = "record R { int a } record S { long b }";
    let parser = Parser::new().with_config(ParserConfig::default().with_recovery_budget(0));
    let tree = parser.parse(source);
    assert!(tree.has_error());
    assert_eq!(leaf_text(&tree, source), source);
}

// ==============================================================================
// Incremental Re-parse
// ==============================================================================

fn reparse(old: &str, range: std::ops::Range<usize>, replacement: &str) -> (SyntaxTree, SyntaxTree, String) {
    let prior = parse(old);
    let (text, edit) = EditDescriptor::replace(old, range, replacement).expect("valid edit");
    let tree = parse_incremental(&prior, &text, &edit).expect("consistent edit");
    (prior, tree, text)
}

#[test]
fn inserting_a_field_reuses_the_untouched_members() {
    let field = r#"{"name": "a", "type": "int"}"#;
    let (prior, tree, text) = reparse(SCHEMA_A, 43..43, field);
    assert!(!tree.has_error(), "{}", tree.to_sexp());
    assert_eq!(shape(&tree), shape(&parse(&text)));

    for kind in [NodeKind::TypeProperty, NodeKind::NameProperty] {
        let old = find(&prior, kind).expect("old member");
        let new = find(&tree, kind).expect("new member");
        assert_eq!(new.id(), old.id(), "{kind:?} should be shared");
        assert_eq!(new.byte_range(), old.byte_range());
    }

    let fields = find_all(&tree, NodeKind::Field);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].utf8_text(&text), field);
    assert!(find(&prior, NodeKind::Field).is_none());
    assert_eq!(tree.generation(), 1);
}

#[test]
fn unchanged_declarations_are_shared_between_versions() {
    let source = "record A { int a; }\nrecord B { long b; }\nrecord C { string c; }\n";
    let (prior, tree, text) = reparse(source, 36..37, "bb");
    assert_eq!(shape(&tree), shape(&parse(&text)));

    let old: Vec<_> = prior.root_node().named_children().collect();
    let new: Vec<_> = tree.root_node().named_children().collect();
    assert_eq!(new[0].id(), old[0].id());
    assert_ne!(new[1].id(), old[1].id());
    assert_eq!(new[2].id(), old[2].id());
    assert_eq!(new[2].start_byte(), old[2].start_byte() + 1);
}

#[test]
fn trees_outlive_their_successors() {
    let (prior, tree, _) = reparse("record A { int a; }", 15..16, "b");
    drop(tree);
    assert_eq!(prior.to_sexp(), parse("record A { int a; }").to_sexp());
}

#[test]
fn mismatched_edits_fail_without_a_tree() {
    let prior = parse("record A {}");
    let edit = EditDescriptor {
        start_byte: 0,
        old_end_byte: 3,
        new_end_byte: 3,
        ..EditDescriptor::default()
    };
    let err = parse_incremental(&prior, "record A {} extra", &edit).expect_err("inconsistent");
    assert!(err.to_string().starts_with("inconsistent edit: "), "{err}");
}

// ==============================================================================
// Properties Over the Corpus
// ==============================================================================

#[test]
fn parsing_is_deterministic() {
    for source in CORPUS {
        assert_eq!(shape(&parse(source)), shape(&parse(source)), "{source:?}");
    }
}

#[test]
fn leaves_cover_every_byte_once() {
    for source in CORPUS {
        let tree = parse(source);
        assert_eq!(leaf_text(&tree, source), *source, "{}", tree.to_sexp());
        assert_eq!(tree.root_node().byte_range(), 0..source.len());
        for node in nodes(&tree) {
            let children: Vec<_> = node.children().collect();
            for pair in children.windows(2) {
                assert_eq!(pair[0].end_byte(), pair[1].start_byte(), "{source:?}");
            }
            if let (Some(first), Some(last)) = (children.first(), children.last()) {
                assert_eq!(first.start_byte(), node.start_byte());
                assert_eq!(last.end_byte(), node.end_byte());
            }
        }
    }
}

#[test]
fn error_flags_propagate_to_the_root() {
    for source in CORPUS {
        let tree = parse(source);
        let any_error = nodes(&tree).iter().any(|n| n.is_error());
        assert_eq!(tree.has_error(), any_error, "{source:?}");
    }
}

/// Documents that borrow syntax from the other dialect, each with the
/// spelling its own dialect expects.
const CROSS_DIALECT: &[(&str, &str)] = &[
    (r#"{"type": "array", "items": int}"#, r#"{"type": "array", "items": "int"}"#),
    (r#"{"type": "array", "items": org.Foo}"#, r#"{"type": "array", "items": "org.Foo"}"#),
    (r#"["null", Foo]"#, r#"["null", "Foo"]"#),
    ("org.example.Foo", r#""org.example.Foo""#),
    (r#"{"type": "enum", "name": "E", "symbols": [A]}"#, r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#),
    (
        r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "double", "default": NaN}]}"#,
        "record R { double a = NaN; }",
    ),
    (r#"record R { ["null", "int"] x; }"#, "record R { union { null, int } x; }"),
    (r#"record R { "Foo" y; }"#, "record R { Foo y; }"),
    (r#"record R { "int" y; }"#, "record R { int y; }"),
    (r#"enum E { "A", "B" }"#, "enum E { A, B }"),
    (r#"schema "int";"#, "schema int;"),
];

#[test]
fn syntax_from_the_other_dialect_is_an_error() {
    for (wrong, right) in CROSS_DIALECT {
        let tree = parse(wrong);
        assert!(tree.has_error(), "{wrong:?} parsed cleanly: {}", tree.to_sexp());
        assert!(nodes(&tree).iter().any(|n| n.is_error()), "{wrong:?}");

        let tree = parse(right);
        assert!(!tree.has_error(), "{right:?}: {}", tree.to_sexp());
    }
}

#[test]
fn trees_can_be_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SyntaxTree>();

    let expected: Vec<String> = CORPUS.iter().map(|s| parse(s).to_sexp()).collect();
    let handles: Vec<_> = CORPUS
        .iter()
        .map(|source| std::thread::spawn(move || parse(source).to_sexp()))
        .collect();
    let actual: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().expect("parse thread"))
        .collect();
    assert_eq!(actual, expected);
}
