//! Concrete syntax trees for Avro schemas, written either as `.avsc` JSON or
//! as Avro IDL (`.avdl`).
//!
//! The parser is a GLR parser over one grammar covering both dialects. It
//! never fails on malformed input: unknown characters, misplaced tokens and
//! truncated text become error and missing nodes, and every byte of the input
//! stays covered by exactly one leaf. After an edit, [`parse_incremental`]
//! reuses the unchanged subtrees of the previous tree.
//!
//! # Parsing
//!
//! ```
//! let source = "record User { string name; }";
//! let tree = avro_cst::parse(source);
//! assert!(!tree.has_error());
//!
//! let record = tree.root_node().child(0).unwrap();
//! let name = record.child_by_field_name("name").unwrap();
//! assert_eq!(name.utf8_text(source), "User");
//! ```
//!
//! # Re-parsing after an edit
//!
//! ```
//! use avro_cst::EditDescriptor;
//!
//! let old = "record User { string name; }";
//! let tree = avro_cst::parse(old);
//! let (new, edit) = EditDescriptor::replace(old, 14..20, "bytes")?;
//! let tree = avro_cst::parse_incremental(&tree, &new, &edit)?;
//! assert_eq!(tree.generation(), 1);
//! # Ok::<(), avro_cst::Error>(())
//! ```
//!
//! # Error handling
//!
//! Syntax errors are part of the tree. [`diagnostics`] turns them into
//! [`ParseDiagnostic`]s that render through [`miette`]. The only hard failure
//! is an [`EditDescriptor`] that does not match the texts it is used with.

pub(crate) mod diagnostics;
pub(crate) mod doc_comments;
pub(crate) mod error;
pub(crate) mod grammar;
pub(crate) mod incremental;
pub(crate) mod lexer;
pub(crate) mod parser;
pub(crate) mod recovery;
pub(crate) mod scanner;
pub(crate) mod suggest;
pub(crate) mod tree;

// Re-export the public API at the crate root.
pub use diagnostics::diagnostics;
pub use doc_comments::doc_comment;
pub use error::{Error, ParseDiagnostic};
pub use grammar::{Conflict, GrammarTable, NodeKind, Terminal, grammar_table};
pub use incremental::EditDescriptor;
pub use parser::{Parser, ParserConfig};
pub use scanner::{Dialect, ScannerState};
pub use tree::{Node, Point, SyntaxNode, SyntaxTree, TreeCursor};

/// Parse `text` with the default [`ParserConfig`].
#[must_use]
pub fn parse(text: &str) -> SyntaxTree {
    Parser::new().parse(text)
}

/// Re-parse `text`, the result of applying `edit` to the text of `prior`,
/// reusing the parts of `prior` the edit did not touch.
///
/// # Errors
///
/// Returns [`Error::EditInconsistency`] when `edit` does not describe a
/// change from a text of `prior.source_len()` bytes to `text`.
pub fn parse_incremental(
    prior: &SyntaxTree,
    text: &str,
    edit: &EditDescriptor,
) -> Result<SyntaxTree, Error> {
    Parser::new().parse_incremental(prior, text, edit)
}
