// ==============================================================================
// Concrete Syntax Tree
// ==============================================================================
//
// Nodes are immutable and reference counted. A node stores only its own
// *size*, never its absolute position, so the same `Arc<Node>` can be shared
// by two trees where it sits at different offsets: that is what lets an
// incremental re-parse reuse unchanged subtrees without copying them.
// Absolute positions are recomputed on the way down by the public handles
// (`SyntaxNode`, `TreeCursor`), which pair a node with its start.
//
// There are no parent pointers. Walk up with a `TreeCursor`.

use std::ops::{Add, Range};
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::grammar::{NodeKind, ProductionId, StateId, Symbol, Terminal, TerminalSet, grammar_table};
use crate::scanner::ScannerState;

/// A zero-based position. The column counts bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    #[must_use]
    pub fn new(row: usize, column: usize) -> Point {
        Point { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// The extent of a span of text: its byte length and how far it moves a
/// point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Length {
    pub(crate) bytes: usize,
    pub(crate) point: Point,
}

impl Length {
    pub(crate) const ZERO: Length = Length {
        bytes: 0,
        point: Point { row: 0, column: 0 },
    };

    pub(crate) fn of(text: &str) -> Length {
        let rows = text.bytes().filter(|&b| b == b'\n').count();
        let column = match text.rfind('\n') {
            Some(i) => text.len() - i - 1,
            None => text.len(),
        };
        Length {
            bytes: text.len(),
            point: Point { row: rows, column },
        }
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, other: Length) -> Length {
        let point = if other.point.row > 0 {
            Point {
                row: self.point.row + other.point.row,
                column: other.point.column,
            }
        } else {
            Point {
                row: self.point.row,
                column: self.point.column + other.point.column,
            }
        };
        Length {
            bytes: self.bytes + other.bytes,
            point,
        }
    }
}

// ==============================================================================
// Nodes
// ==============================================================================

/// A node of the syntax tree. Opaque outside the crate; use [`SyntaxNode`] to
/// inspect it.
pub struct Node {
    pub(crate) symbol: Symbol,
    pub(crate) flags: u8,
    pub(crate) size: Length,
    /// Bytes from the node's start to the end of everything the lexer looked
    /// at while producing its tokens and the token that followed them.
    pub(crate) lookahead_len: usize,
    /// The parser state the node was pushed onto.
    pub(crate) parse_state: StateId,
    /// The valid terminal set its first token was lexed with.
    pub(crate) lex_set: TerminalSet,
    pub(crate) scanner_start: [u8; 2],
    pub(crate) scanner_end: [u8; 2],
    pub(crate) dynamic_precedence: i32,
    pub(crate) production: Option<ProductionId>,
    pub(crate) children: Vec<Arc<Node>>,
    /// Field names, by child index.
    pub(crate) fields: Vec<(&'static str, u32)>,
}

impl Node {
    pub(crate) const EXTRA: u8 = 1 << 0;
    pub(crate) const ERROR: u8 = 1 << 1;
    pub(crate) const MISSING: u8 = 1 << 2;
    pub(crate) const HAS_ERROR: u8 = 1 << 3;
    pub(crate) const FRAGILE: u8 = 1 << 4;

    /// A leaf for a lexed token of `size`, spanning `lookahead_len` bytes of
    /// examined input.
    pub(crate) fn leaf(
        terminal: Terminal,
        size: Length,
        lookahead_len: usize,
        lex_set: TerminalSet,
        scanner: (ScannerState, ScannerState),
    ) -> Node {
        let mut flags = 0;
        if terminal.is_trivia() {
            flags |= Node::EXTRA;
        }
        if terminal == Terminal::Error {
            flags |= Node::ERROR | Node::HAS_ERROR;
        }
        Node {
            symbol: Symbol::Terminal(terminal),
            flags,
            size,
            lookahead_len,
            parse_state: 0,
            lex_set,
            scanner_start: scanner.0.serialize(),
            scanner_end: scanner.1.serialize(),
            dynamic_precedence: 0,
            production: None,
            children: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// A zero-width placeholder for a token recovery had to invent.
    pub(crate) fn missing(terminal: Terminal, parse_state: StateId, scanner: ScannerState) -> Node {
        let mut node = Node::leaf(
            terminal,
            Length::ZERO,
            0,
            TerminalSet::EMPTY,
            (scanner, scanner),
        );
        node.flags |= Node::MISSING | Node::ERROR | Node::HAS_ERROR | Node::FRAGILE;
        node.parse_state = parse_state;
        node
    }

    /// An interior node over `children`. Size, checkpoints, lexer context
    /// and error state derive from the children.
    pub(crate) fn internal(
        symbol: Symbol,
        production: Option<ProductionId>,
        children: Vec<Arc<Node>>,
        fields: Vec<(&'static str, u32)>,
    ) -> Node {
        let mut size = Length::ZERO;
        let mut lookahead_len = 0;
        let mut flags = 0;
        let mut dynamic_precedence = 0;
        for child in &children {
            lookahead_len = lookahead_len.max(size.bytes + child.lookahead_len);
            size = size + child.size;
            if child.has_error() {
                flags |= Node::HAS_ERROR;
            }
            if child.is_fragile() {
                flags |= Node::FRAGILE;
            }
            dynamic_precedence += child.dynamic_precedence;
        }
        let first = children.first();
        let last = children.last();
        Node {
            symbol,
            flags,
            size,
            lookahead_len: lookahead_len.max(size.bytes),
            parse_state: 0,
            lex_set: first.map_or(TerminalSet::EMPTY, |c| c.lex_set),
            scanner_start: first.map_or([0; 2], |c| c.scanner_start),
            scanner_end: last.map_or([0; 2], |c| c.scanner_end),
            dynamic_precedence,
            production,
            children,
            fields,
        }
    }

    /// An error node wrapping skipped input.
    pub(crate) fn error(children: Vec<Arc<Node>>) -> Node {
        let mut node = Node::internal(Symbol::Terminal(Terminal::Error), None, children, Vec::new());
        node.flags |= Node::ERROR | Node::HAS_ERROR | Node::EXTRA | Node::FRAGILE;
        node
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self.symbol {
            Symbol::Terminal(t) => t.kind(),
            Symbol::Nonterminal(nt) => grammar_table().grammar().nonterminal(nt).kind,
        }
    }

    pub(crate) fn is_extra(&self) -> bool {
        self.flags & Node::EXTRA != 0
    }

    pub(crate) fn is_error(&self) -> bool {
        self.flags & Node::ERROR != 0
    }

    pub(crate) fn is_missing(&self) -> bool {
        self.flags & Node::MISSING != 0
    }

    pub(crate) fn has_error(&self) -> bool {
        self.flags & Node::HAS_ERROR != 0
    }

    pub(crate) fn is_fragile(&self) -> bool {
        self.flags & Node::FRAGILE != 0
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("bytes", &self.size.bytes)
            .field("flags", &format_args!("{:#07b}", self.flags))
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

// ==============================================================================
// Trees
// ==============================================================================

/// The result of a parse: an immutable tree, cheap to clone and safe to share
/// across threads.
#[derive(Clone)]
pub struct SyntaxTree {
    root: Arc<Node>,
    source_len: usize,
    generation: u64,
}

impl SyntaxTree {
    pub(crate) fn new(root: Arc<Node>, source_len: usize, generation: u64) -> SyntaxTree {
        SyntaxTree {
            root,
            source_len,
            generation,
        }
    }

    #[must_use]
    pub fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            node: &self.root,
            start: Length::ZERO,
        }
    }

    #[must_use]
    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    /// Length in bytes of the text this tree was parsed from.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// 0 for a fresh parse, one more than the prior tree's for an
    /// incremental one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The shared root node. Two trees that share a subtree hold the same
    /// `Arc` for it.
    #[must_use]
    pub fn root_arc(&self) -> &Arc<Node> {
        &self.root
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    #[must_use]
    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// A JSON rendering of the whole tree, trivia excluded.
    #[must_use]
    pub fn to_json(&self, source: &str) -> Value {
        self.root_node().to_json(source)
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("generation", &self.generation)
            .field("root", &self.to_sexp())
            .finish()
    }
}

// ==============================================================================
// Node Handles
// ==============================================================================

/// A node together with its absolute position.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: &'t Arc<Node>,
    start: Length,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self.node, other.node) && self.start == other.start
    }
}

impl Eq for SyntaxNode<'_> {}

impl<'t> SyntaxNode<'t> {
    pub(crate) fn arc(&self) -> &'t Arc<Node> {
        self.node
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.node.kind()
    }

    /// The grammar's own name for this node: the rule name for interior
    /// nodes, the literal text for punctuation and keywords.
    #[must_use]
    pub fn grammar_name(&self) -> &'static str {
        match self.node.symbol {
            Symbol::Terminal(t) => t.text(),
            Symbol::Nonterminal(nt) => grammar_table().grammar().nonterminal(nt).name,
        }
    }

    #[must_use]
    pub fn is_named(&self) -> bool {
        self.kind().is_named()
    }

    /// Trivia and error nodes, which may appear between any two children.
    #[must_use]
    pub fn is_extra(&self) -> bool {
        self.node.is_extra()
    }

    /// True for error nodes, unlexable tokens and missing tokens.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.node.is_error()
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.node.is_missing()
    }

    /// True when this node or any descendant is an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.node.has_error()
    }

    #[must_use]
    pub fn start_byte(&self) -> usize {
        self.start.bytes
    }

    #[must_use]
    pub fn end_byte(&self) -> usize {
        self.start.bytes + self.node.size.bytes
    }

    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    #[must_use]
    pub fn start_position(&self) -> Point {
        self.start.point
    }

    #[must_use]
    pub fn end_position(&self) -> Point {
        (self.start + self.node.size).point
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<SyntaxNode<'t>> {
        self.children().nth(index)
    }

    pub fn children(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        let node: &'t Arc<Node> = self.node;
        let mut offset = self.start;
        node.children.iter().map(move |child| {
            let handle = SyntaxNode {
                node: child,
                start: offset,
            };
            offset = offset + child.size;
            handle
        })
    }

    pub fn named_children(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(SyntaxNode::is_named)
    }

    #[must_use]
    pub fn child_by_field_name(&self, name: &str) -> Option<SyntaxNode<'t>> {
        let &(_, index) = self.node.fields.iter().find(|(field, _)| *field == name)?;
        self.child(index as usize)
    }

    #[must_use]
    pub fn children_by_field_name(&self, name: &str) -> Vec<SyntaxNode<'t>> {
        let indices: Vec<usize> = self
            .node
            .fields
            .iter()
            .filter(|(field, _)| *field == name)
            .map(|&(_, index)| index as usize)
            .collect();
        self.children()
            .enumerate()
            .filter(|(i, _)| indices.contains(i))
            .map(|(_, child)| child)
            .collect()
    }

    #[must_use]
    pub fn field_name_for_child(&self, index: usize) -> Option<&'static str> {
        self.node
            .fields
            .iter()
            .find(|&&(_, i)| i as usize == index)
            .map(|&(name, _)| name)
    }

    /// The smallest node within this one that spans `start..end`.
    #[must_use]
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<SyntaxNode<'t>> {
        if start > end || start < self.start_byte() || end > self.end_byte() {
            return None;
        }
        let mut current = *self;
        'descend: loop {
            for child in current.children() {
                if child.start_byte() <= start
                    && end <= child.end_byte()
                    && (child.end_byte() > start || child.start_byte() == child.end_byte())
                {
                    // A zero-width request at a boundary belongs to the
                    // child that starts there, not the one that ends there.
                    if start == end && child.end_byte() == start && child.start_byte() != start {
                        continue;
                    }
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// The text this node spans. `source` must be the text the tree was
    /// parsed from.
    #[must_use]
    pub fn utf8_text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.byte_range()).unwrap_or("")
    }

    /// A stable identity for the underlying node, shared by every tree that
    /// reuses it.
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(self.node).addr()
    }

    #[must_use]
    pub fn walk(&self) -> TreeCursor<'t> {
        TreeCursor {
            stack: vec![(*self, 0)],
        }
    }

    // --------------------------------------------------------------------------
    // Rendering
    // --------------------------------------------------------------------------

    /// An s-expression of the named nodes below this one, with field labels.
    /// Error nodes print as `ERROR`, missing tokens as `(MISSING ...)`.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        if self.is_missing() {
            out.push_str("(MISSING ");
            if self.is_named() {
                out.push_str(self.kind().as_str());
            } else {
                out.push('"');
                out.push_str(self.grammar_name());
                out.push('"');
            }
            out.push(')');
            return;
        }
        out.push('(');
        if self.kind() == NodeKind::Error {
            out.push_str("ERROR");
        } else {
            out.push_str(self.kind().as_str());
        }
        for (index, child) in self.children().enumerate() {
            if !child.is_named() && !child.is_missing() {
                continue;
            }
            out.push(' ');
            if let Some(field) = self.field_name_for_child(index) {
                out.push_str(field);
                out.push_str(": ");
            }
            child.write_sexp(out);
        }
        out.push(')');
    }

    /// A JSON object for this node and its non-trivia descendants.
    #[must_use]
    pub fn to_json(&self, source: &str) -> Value {
        let mut object = Map::new();
        object.insert("kind".into(), json!(self.kind().as_str()));
        if !self.is_named() {
            object.insert("grammar_name".into(), json!(self.grammar_name()));
        }
        object.insert("start_byte".into(), json!(self.start_byte()));
        object.insert("end_byte".into(), json!(self.end_byte()));
        let (start, end) = (self.start_position(), self.end_position());
        object.insert("start".into(), json!([start.row, start.column]));
        object.insert("end".into(), json!([end.row, end.column]));
        if self.is_error() {
            object.insert("is_error".into(), json!(true));
        }
        if self.is_missing() {
            object.insert("is_missing".into(), json!(true));
        }
        if self.child_count() == 0 {
            object.insert("text".into(), json!(self.utf8_text(source)));
        } else {
            let children: Vec<Value> = self
                .children()
                .enumerate()
                .filter(|(_, child)| child.kind() != NodeKind::Whitespace)
                .map(|(index, child)| {
                    let mut value = child.to_json(source);
                    if let (Some(field), Some(map)) =
                        (self.field_name_for_child(index), value.as_object_mut())
                    {
                        map.insert("field".into(), json!(field));
                    }
                    value
                })
                .collect();
            object.insert("children".into(), Value::Array(children));
        }
        Value::Object(object)
    }
}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{} {}-{}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

// ==============================================================================
// Cursor
// ==============================================================================

/// A stateful walker over a tree, the only way to reach a node's parent.
#[derive(Clone)]
pub struct TreeCursor<'t> {
    /// Path from the starting node; each entry carries its index in the
    /// previous entry's children.
    stack: Vec<(SyntaxNode<'t>, usize)>,
}

impl<'t> TreeCursor<'t> {
    #[must_use]
    pub fn node(&self) -> SyntaxNode<'t> {
        // The stack always holds at least the starting node.
        self.stack[self.stack.len() - 1].0
    }

    /// The field name of the current node within its parent.
    #[must_use]
    pub fn field_name(&self) -> Option<&'static str> {
        let [.., (parent, _), (_, index)] = self.stack.as_slice() else {
            return None;
        };
        parent.field_name_for_child(*index)
    }

    /// The parent of the current node and the node's index among its
    /// children.
    pub(crate) fn parent_and_index(&self) -> Option<(SyntaxNode<'t>, usize)> {
        let [.., (parent, _), (_, index)] = self.stack.as_slice() else {
            return None;
        };
        Some((*parent, *index))
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.node().child(0) {
            Some(child) => {
                self.stack.push((child, 0));
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        let [.., (parent, _), (_, index)] = self.stack.as_slice() else {
            return false;
        };
        let next = *index + 1;
        let Some(sibling) = parent.child(next) else {
            return false;
        };
        self.stack.pop();
        self.stack.push((sibling, next));
        true
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Move to the first child that extends past `byte`, returning its index.
    pub fn goto_first_child_for_byte(&mut self, byte: usize) -> Option<usize> {
        let (index, child) = self
            .node()
            .children()
            .enumerate()
            .find(|(_, child)| child.end_byte() > byte)?;
        self.stack.push((child, index));
        Some(index)
    }

    /// Restart from `node`.
    pub fn reset(&mut self, node: SyntaxNode<'t>) {
        self.stack.clear();
        self.stack.push((node, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn length_addition_tracks_rows() {
        let a = Length::of("ab\ncd");
        assert_eq!(a.point, Point::new(1, 2));
        let b = Length::of("ef");
        assert_eq!((a + b).point, Point::new(1, 4));
        let c = Length::of("\n\nx");
        assert_eq!((a + c).point, Point::new(3, 1));
        assert_eq!((a + c).bytes, 8);
    }

    #[test]
    fn positions_and_text() {
        let source = "record R {\n  int a;\n}";
        let tree = parse(source);
        let root = tree.root_node();
        assert_eq!(root.byte_range(), 0..source.len());
        let record = root.named_children().next().expect("declaration");
        assert_eq!(record.kind(), NodeKind::RecordDeclaration);
        let body = record.child_by_field_name("body").expect("body");
        let field = body
            .named_children()
            .find(|n| n.kind() == NodeKind::Field)
            .expect("field");
        assert_eq!(field.utf8_text(source), "int a;");
        assert_eq!(field.start_position(), Point::new(1, 2));
        assert_eq!(field.end_position(), Point::new(1, 8));
        let name = field.child_by_field_name("name").expect("name");
        assert_eq!(name.utf8_text(source), "a");
        assert_eq!(name.grammar_name(), "identifier");
    }

    #[test]
    fn fields_are_looked_up_by_name() {
        let source = "protocol P { record R { int a; } }";
        let tree = parse(source);
        let protocol = tree.root_node().child(0).expect("protocol");
        assert_eq!(protocol.kind(), NodeKind::ProtocolDeclaration);
        let name = protocol.child_by_field_name("name").expect("name");
        assert_eq!(name.utf8_text(source), "P");
        let index = protocol
            .children()
            .position(|c| c == name)
            .expect("name is a child");
        assert_eq!(protocol.field_name_for_child(index), Some("name"));
        assert_eq!(protocol.children_by_field_name("name").len(), 1);
        assert!(protocol.child_by_field_name("nope").is_none());
    }

    #[test]
    fn descendant_lookup_finds_the_smallest_node() {
        let source = r#"{"type": "fixed", "name": "MD5", "size": 16}"#;
        let tree = parse(source);
        let at = source.find("16").expect("size");
        let node = tree
            .root_node()
            .descendant_for_byte_range(at, at + 2)
            .expect("in range");
        assert_eq!(node.kind(), NodeKind::Number);
        let property = tree
            .root_node()
            .descendant_for_byte_range(at - 8, at + 2)
            .expect("in range");
        assert_eq!(property.kind(), NodeKind::SizeProperty);
        assert!(tree.root_node().descendant_for_byte_range(0, 1000).is_none());
    }

    #[test]
    fn cursor_walks_up_and_down() {
        let source = "enum E { A, B }";
        let tree = parse(source);
        let mut cursor = tree.walk();
        assert_eq!(cursor.depth(), 0);
        assert!(!cursor.goto_parent());
        assert!(cursor.goto_first_child());
        assert_eq!(cursor.node().kind(), NodeKind::EnumDeclaration);
        assert!(cursor.goto_first_child());
        assert_eq!(cursor.node().grammar_name(), "enum");
        assert!(cursor.goto_next_sibling());
        assert_eq!(cursor.node().kind(), NodeKind::Whitespace);
        assert!(cursor.goto_next_sibling());
        assert_eq!(cursor.field_name(), Some("name"));
        assert_eq!(cursor.depth(), 2);
        assert!(cursor.goto_parent());
        assert_eq!(cursor.node().kind(), NodeKind::EnumDeclaration);

        let at = source.find('B').expect("symbol");
        assert!(cursor.goto_first_child_for_byte(at).is_some());
        assert_eq!(cursor.node().kind(), NodeKind::EnumBody);

        cursor.reset(tree.root_node());
        assert_eq!(cursor.depth(), 0);
        assert_eq!(cursor.node(), tree.root_node());
    }

    #[test]
    fn sexp_shows_named_nodes_and_fields() {
        let tree = parse("fixed MD5(16);");
        assert_eq!(
            tree.to_sexp(),
            "(source_file (fixed_declaration name: (identifier) size: (number)))"
        );
    }

    #[test]
    fn json_dump_skips_whitespace() {
        let source = "[\"null\", \"string\"]";
        let tree = parse(source);
        let json = tree.to_json(source);
        assert_eq!(json["kind"], "source_file");
        let union = &json["children"][0];
        assert_eq!(union["kind"], "union_type");
        let members: Vec<&str> = union["children"]
            .as_array()
            .expect("children")
            .iter()
            .filter(|c| c["kind"] == "primitive_type")
            .map(|c| c["children"][0]["text"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(members, vec!["\"null\"", "\"string\""]);
        assert!(
            union["children"]
                .as_array()
                .expect("children")
                .iter()
                .all(|c| c["kind"] != "whitespace")
        );
    }

    #[test]
    fn trees_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyntaxTree>();
        assert_send_sync::<SyntaxNode<'static>>();
    }
}
