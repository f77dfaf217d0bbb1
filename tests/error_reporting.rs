// ==============================================================================
// Error Reporting Tests
// ==============================================================================
//
// These tests verify the *content* and *placement* of the diagnostics produced
// for malformed documents. Each test feeds an inline document to the parser
// and checks the messages, spans and hints, and where it matters the text
// `miette` renders from them (with Unicode and color disabled so the output is
// reproducible).

mod common;

use avro_cst::{diagnostics, parse};
use common::render_diagnostics;
use miette::Diagnostic;
use pretty_assertions::assert_eq;

// ==============================================================================
// Test Helpers
// ==============================================================================

/// `(message, offset, length)` for every diagnostic of `source`.
fn spans(source: &str) -> Vec<(String, usize, usize)> {
    let tree = parse(source);
    diagnostics(&tree, "test.avdl", source)
        .into_iter()
        .map(|d| (d.message, d.span.offset(), d.span.len()))
        .collect()
}

// ==============================================================================
// Missing Tokens
// ==============================================================================

#[test]
fn missing_semicolon_points_after_the_field() {
    assert_eq!(spans("record R { int a }"), vec![("missing `;`".to_string(), 17, 0)]);
}

#[test]
fn missing_name_at_end_of_input() {
    assert_eq!(spans("record"), vec![("missing identifier".to_string(), 6, 0)]);
}

#[test]
fn missing_semicolon_renders_with_its_location() {
    let rendered = render_diagnostics("test.avdl", "record R { int a }");
    assert!(rendered.contains("avro_cst::syntax"), "{rendered}");
    assert!(rendered.contains("missing `;`"), "{rendered}");
    assert!(rendered.contains("test.avdl:1:18"), "{rendered}");
    assert!(rendered.contains("record R { int a }"), "{rendered}");
}

// ==============================================================================
// Unexpected Input
// ==============================================================================

#[test]
fn unknown_character() {
    let found = spans("record R { # int a; }");
    assert_eq!(found.len(), 1);
    assert!(found[0].0.starts_with("unexpected character `#`"), "{found:?}");
    assert_eq!((found[0].1, found[0].2), (11, 1));
}

#[test]
fn stray_tokens_are_reported_once() {
    let source = "record R { int a; } }";
    let found = spans(source);
    assert_eq!(found.len(), 1, "{found:?}");
    assert!(found[0].0.starts_with("unexpected `}`"), "{found:?}");
    assert_eq!(found[0].1, 20);
}

#[test]
fn unterminated_string_stops_at_the_line_end() {
    let source = "record R {\n  string s = \"abc;\n}\n";
    let found = spans(source);
    assert!(!found.is_empty());
    assert_eq!(found[0].0, "unterminated string");
    assert_eq!(found[0].1, source.find('"').expect("quote"));
    assert_eq!(found[0].2, "\"abc;".len());
}

#[test]
fn unterminated_comment_runs_to_the_end() {
    let source = "record R {} /* never closed";
    let found = spans(source);
    assert_eq!(found.len(), 1);
    assert!(found[0].0.starts_with("unterminated comment"), "{found:?}");
    assert_eq!((found[0].1, found[0].2), (12, source.len() - 12));
}

#[test]
fn misspelled_keyword_gets_a_hint() {
    let source = "@namespace(\"org.example\")\nprotocl Service {}";
    let tree = parse(source);
    let found = diagnostics(&tree, "service.avdl", source);
    assert_eq!(found.len(), 1);
    let help = found[0].help().map(|h| h.to_string());
    assert_eq!(help.as_deref(), Some("did you mean `protocol`?"));
    assert_eq!(found[0].code().map(|c| c.to_string()).as_deref(), Some("avro_cst::syntax"));

    let rendered = render_diagnostics("service.avdl", source);
    assert!(rendered.contains("did you mean `protocol`?"), "{rendered}");
    assert!(rendered.contains("service.avdl:2:1"), "{rendered}");
}

// ==============================================================================
// Valid Documents
// ==============================================================================

#[test]
fn valid_documents_have_nothing_to_report() {
    for source in [
        "",
        "protocol P { record R { string s; } }",
        r#"{"type": "enum", "name": "E", "symbols": ["A"]}"#,
        r#"["null", "long"]"#,
    ] {
        assert_eq!(spans(source), vec![], "{source:?}");
        assert_eq!(render_diagnostics("test.avdl", source), "");
    }
}
