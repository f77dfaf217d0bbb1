// ==============================================================================
// Syntax Diagnostics
// ==============================================================================
//
// Turns the error and missing nodes of a tree into `ParseDiagnostic`s that
// miette can render against the source. Each error node yields one report;
// nested problems are reported through the node that contains them only when
// it has nothing more specific inside.

use miette::{NamedSource, SourceSpan};

use crate::error::ParseDiagnostic;
use crate::grammar::{NodeKind, Terminal, grammar_table};
use crate::suggest::suggest_keyword;
use crate::tree::{SyntaxNode, SyntaxTree};

/// Expected-token lists longer than this are left out of messages.
const MAX_EXPECTED: usize = 6;

/// One diagnostic per syntax error in `tree`, in document order. `name` is
/// shown as the source's file name; `source` must be the parsed text.
#[must_use]
pub fn diagnostics(tree: &SyntaxTree, name: &str, source: &str) -> Vec<ParseDiagnostic> {
    let mut found = Vec::new();
    collect(tree.root_node(), &mut found);
    found
        .into_iter()
        .map(|node| describe(node, name, source))
        .collect()
}

fn collect<'t>(node: SyntaxNode<'t>, out: &mut Vec<SyntaxNode<'t>>) {
    if !node.has_error() && !node.is_error() {
        return;
    }
    if node.is_error() {
        let nested = node.children().any(|c| c.has_error() || c.is_error());
        if !nested || node.is_missing() {
            out.push(node);
            return;
        }
    }
    for child in node.children() {
        collect(child, out);
    }
}

fn describe(node: SyntaxNode<'_>, name: &str, source: &str) -> ParseDiagnostic {
    let src = NamedSource::new(name, source.to_string());
    if node.is_missing() {
        return ParseDiagnostic {
            src,
            span: SourceSpan::new(node.start_byte().into(), 0),
            message: format!("missing {}", display_name(node)),
            help: None,
        };
    }

    let first = first_token(node).unwrap_or(node);
    let text = first.utf8_text(source);
    let mut message = if first.child_count() == 0 && first.is_error() {
        if text.starts_with("/*") {
            "unterminated comment".to_string()
        } else if text.starts_with(['"', '\'']) {
            "unterminated string".to_string()
        } else {
            format!("unexpected character `{}`", text.escape_debug())
        }
    } else {
        format!("unexpected `{}`", text.escape_debug())
    };
    let expected = grammar_table().expected_terminals(node.arc().parse_state);
    if !expected.is_empty() && expected.len() <= MAX_EXPECTED {
        message.push_str(", expected ");
        message.push_str(&join_alternatives(&expected));
    }

    let help = suggest_keyword(text).map(|keyword| format!("did you mean `{keyword}`?"));
    ParseDiagnostic {
        src,
        span: SourceSpan::new(node.start_byte().into(), node.end_byte() - node.start_byte()),
        message,
        help,
    }
}

/// The first non-trivia leaf at or below `node`.
fn first_token(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    if node.child_count() == 0 {
        let trivia = matches!(node.kind(), NodeKind::Whitespace | NodeKind::Comment);
        return (!trivia).then_some(node);
    }
    node.children().find_map(first_token)
}

fn display_name(node: SyntaxNode<'_>) -> String {
    if node.is_named() {
        node.kind().to_string()
    } else {
        format!("`{}`", node.grammar_name())
    }
}

fn display_terminal(terminal: Terminal) -> String {
    if terminal == Terminal::End {
        "end of input".to_string()
    } else if terminal.kind().is_named() {
        terminal.kind().to_string()
    } else {
        format!("`{}`", terminal.text())
    }
}

/// `a`, `a or b`, `a, b or c`.
fn join_alternatives(terminals: &[Terminal]) -> String {
    let names: Vec<String> = terminals.iter().map(|&t| display_terminal(t)).collect();
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {last}", rest.join(", ")),
    }
}
