//! Property-based tests for the parser over generated Avro documents.
//!
//! Documents are either known schemas or random concatenations of Avro
//! tokens, so most of them are malformed in some way. Whatever the input,
//! parsing must be deterministic, cover every byte, and give the same tree
//! whether it starts from scratch or from an edited predecessor.

mod common;

use std::ops::Range;

use avro_cst::{EditDescriptor, parse, parse_incremental};
use common::{leaf_text, shape};
use proptest::prelude::*;
use proptest::sample::{Index, select};

const SEEDS: &[&str] = &[
    r#"{"type": "record", "name": "X", "fields": [{"name": "a", "type": "int"}]}"#,
    r#"{"name": "E", "symbols": ["A", "B"], "type": "enum"}"#,
    r#"["null", {"type": "array", "items": "string"}]"#,
    "protocol P {\n  record R { string s; int? n = null; }\n  void ping() oneway;\n}\n",
    "record A { int a; }\nrecord B { long b; }\n",
    "@namespace(\"org.example\")\nprotocol Q { enum E { X, Y } = X; fixed F(4); }",
];

const FRAGMENTS: &[&str] = &[
    "record", "protocol", "enum", "fixed", "error", "union", "array", "map", "int", "string",
    "null", "void", "R", "a", "b", "{", "}", "(", ")", "<", ">", "[", "]", ";", ",", ":", "=", "?",
    " ", "\n", "\"x\"", "\"type\"", "\"record\"", "\"name\"", "\"fields\"", "12", "1e5", "-0.5",
    "@ns(\"x\")", "/*", "*/", "/** d */", "// c\n", "#", "'",
];

fn document() -> impl Strategy<Value = String> {
    prop_oneof![
        select(SEEDS).prop_map(String::from),
        prop::collection::vec(select(FRAGMENTS), 0..24).prop_map(|parts| parts.concat()),
    ]
}

fn replacement() -> impl Strategy<Value = String> {
    prop::collection::vec(select(FRAGMENTS), 0..4).prop_map(|parts| parts.concat())
}

/// A document, a range inside it and the text to put there.
fn edit() -> impl Strategy<Value = (String, Range<usize>, String)> {
    (document(), any::<Index>(), any::<Index>(), replacement()).prop_map(
        |(text, a, b, inserted)| {
            let (a, b) = (a.index(text.len() + 1), b.index(text.len() + 1));
            (text, a.min(b)..a.max(b), inserted)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn leaves_cover_the_input(text in document()) {
        let tree = parse(&text);
        prop_assert_eq!(leaf_text(&tree, &text), text.clone());
        prop_assert_eq!(tree.root_node().byte_range(), 0..text.len());
    }

    #[test]
    fn parsing_twice_gives_the_same_tree(text in document()) {
        prop_assert_eq!(shape(&parse(&text)), shape(&parse(&text)));
    }

    #[test]
    fn incremental_parse_matches_a_fresh_parse((text, range, inserted) in edit()) {
        let prior = parse(&text);
        let (new_text, descriptor) = EditDescriptor::replace(&text, range, &inserted)
            .expect("ASCII ranges are character ranges");
        let tree = parse_incremental(&prior, &new_text, &descriptor).expect("consistent edit");
        prop_assert_eq!(shape(&tree), shape(&parse(&new_text)));
        prop_assert_eq!(tree.generation(), 1);
    }

    #[test]
    fn chained_edits_match_a_fresh_parse(
        (text, range, inserted) in edit(),
        second in replacement(),
    ) {
        let first = parse(&text);
        let (text, descriptor) = EditDescriptor::replace(&text, range.clone(), &inserted)
            .expect("ASCII ranges are character ranges");
        let second_tree = parse_incremental(&first, &text, &descriptor).expect("consistent edit");

        // Edit again where the first edit started.
        let start = range.start.min(text.len());
        let (text, descriptor) = EditDescriptor::replace(&text, start..start, &second)
            .expect("ASCII ranges are character ranges");
        let third = parse_incremental(&second_tree, &text, &descriptor).expect("consistent edit");
        prop_assert_eq!(shape(&third), shape(&parse(&text)));
        prop_assert_eq!(third.generation(), 2);
    }
}
