// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Common utility functions used across multiple integration test files.
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary. Suppress the resulting dead_code warnings.
#![allow(dead_code)]
// Import this module in each test file with:
//
//     mod common;
//     use common::{leaf_text, nodes, render_diagnostics};

use std::fmt::Write;
use std::ops::Range;

use avro_cst::{NodeKind, SyntaxNode, SyntaxTree};
use miette::{GraphicalReportHandler, GraphicalTheme};

/// Every node of `tree` in pre-order.
pub fn nodes(tree: &SyntaxTree) -> Vec<SyntaxNode<'_>> {
    fn visit<'t>(node: SyntaxNode<'t>, out: &mut Vec<SyntaxNode<'t>>) {
        out.push(node);
        for child in node.children() {
            visit(child, out);
        }
    }
    let mut out = Vec::new();
    visit(tree.root_node(), &mut out);
    out
}

/// The first node of `kind` in pre-order.
pub fn find(tree: &SyntaxTree, kind: NodeKind) -> Option<SyntaxNode<'_>> {
    nodes(tree).into_iter().find(|node| node.kind() == kind)
}

/// All nodes of `kind` in pre-order.
pub fn find_all(tree: &SyntaxTree, kind: NodeKind) -> Vec<SyntaxNode<'_>> {
    nodes(tree)
        .into_iter()
        .filter(|node| node.kind() == kind)
        .collect()
}

/// The text of every leaf, concatenated. Equals the source when the leaves
/// cover it exactly once.
pub fn leaf_text(tree: &SyntaxTree, source: &str) -> String {
    nodes(tree)
        .into_iter()
        .filter(|node| node.child_count() == 0)
        .map(|node| node.utf8_text(source))
        .collect()
}

/// A comparable summary of a tree: kind, byte range and error flags of every
/// node, in pre-order.
pub fn shape(tree: &SyntaxTree) -> Vec<(NodeKind, Range<usize>, bool, bool)> {
    nodes(tree)
        .into_iter()
        .map(|node| (node.kind(), node.byte_range(), node.is_error(), node.is_missing()))
        .collect()
}

/// Render a single diagnostic to a deterministic string for snapshot tests.
/// Uses non-unicode theme at 80 columns.
pub fn render_diagnostic(report: &miette::Report) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, report.as_ref())
        .expect("render to String is infallible");
    buf
}

/// Render the syntax diagnostics of `source`, separated by blank lines.
pub fn render_diagnostics(name: &str, source: &str) -> String {
    let tree = avro_cst::parse(source);
    let mut buf = String::new();
    for (i, diagnostic) in avro_cst::diagnostics(&tree, name, source)
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            writeln!(buf).expect("write to String is infallible");
        }
        buf.push_str(&render_diagnostic(&miette::Report::new(diagnostic)));
    }
    buf
}
