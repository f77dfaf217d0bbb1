// ==============================================================================
// Incremental Re-parse
// ==============================================================================
//
// An incremental parse is an ordinary parse of the new text that, before
// lexing each token, asks whether the prior tree has a subtree that can be
// pushed whole instead. A subtree qualifies when neither it nor the input its
// lexer looked at overlaps the edit, when it holds no errors and was built
// without ambiguity or recovery, and when the parser is in the exact state
// (and lexer context) it was in when the subtree was first built. Under those
// conditions the parser would rebuild the same subtree anyway, so the result
// matches a parse from scratch.
//
// Nodes only store their sizes, so a reused subtree needs no adjustment for
// its new offset.

use std::ops::Range;
use std::sync::Arc;

use crate::error::Error;
use crate::grammar::{Action, Symbol, TerminalSet};
use crate::lexer::Token;
use crate::parser::{Entry, ParseState};
use crate::scanner::ScannerState;
use crate::tree::{Length, Node, Point, SyntaxTree};

/// Describes one contiguous replacement in a document: the bytes
/// `start_byte..old_end_byte` of the old text became
/// `start_byte..new_end_byte` of the new text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct EditDescriptor {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl EditDescriptor {
    /// Replace `range` of `old_text` with `replacement`, returning the new
    /// text and the edit that describes the change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EditInconsistency`] when `range` is out of bounds or
    /// splits a character.
    pub fn replace(
        old_text: &str,
        range: Range<usize>,
        replacement: &str,
    ) -> Result<(String, EditDescriptor), Error> {
        let (Some(before), Some(after)) = (old_text.get(..range.start), old_text.get(range.end..))
        else {
            return Err(inconsistent(format!(
                "range {}..{} is not a character range of a {}-byte text",
                range.start,
                range.end,
                old_text.len()
            )));
        };
        if range.start > range.end {
            return Err(inconsistent(format!(
                "range start {} is after its end {}",
                range.start, range.end
            )));
        }
        let start = Length::of(before);
        let old_end = start + Length::of(&old_text[range.clone()]);
        let new_end = start + Length::of(replacement);
        let edit = EditDescriptor {
            start_byte: range.start,
            old_end_byte: range.end,
            new_end_byte: new_end.bytes,
            start_point: start.point,
            old_end_point: old_end.point,
            new_end_point: new_end.point,
        };
        Ok((format!("{before}{replacement}{after}"), edit))
    }

    /// Check that this edit turns a text of `prior`'s length into `text`.
    pub(crate) fn validate(&self, prior: &SyntaxTree, text: &str) -> Result<(), Error> {
        let old_len = prior.source_len();
        if self.start_byte > self.old_end_byte {
            return Err(inconsistent(format!(
                "start_byte {} is after old_end_byte {}",
                self.start_byte, self.old_end_byte
            )));
        }
        if self.old_end_byte > old_len {
            return Err(inconsistent(format!(
                "old_end_byte {} is past the end of the prior text ({old_len} bytes)",
                self.old_end_byte
            )));
        }
        if self.start_byte > self.new_end_byte {
            return Err(inconsistent(format!(
                "start_byte {} is after new_end_byte {}",
                self.start_byte, self.new_end_byte
            )));
        }
        if self.new_end_byte > text.len() {
            return Err(inconsistent(format!(
                "new_end_byte {} is past the end of the new text ({} bytes)",
                self.new_end_byte,
                text.len()
            )));
        }
        let expected = old_len - (self.old_end_byte - self.start_byte)
            + (self.new_end_byte - self.start_byte);
        if text.len() != expected {
            return Err(inconsistent(format!(
                "the edit turns {old_len} bytes into {expected}, but the new text has {}",
                text.len()
            )));
        }
        if !text.is_char_boundary(self.start_byte) || !text.is_char_boundary(self.new_end_byte) {
            return Err(inconsistent(
                "edit boundaries split a character of the new text".to_string(),
            ));
        }
        if self.start_point > self.old_end_point || self.start_point > self.new_end_point {
            return Err(inconsistent(format!(
                "start_point {} is after old_end_point {} or new_end_point {}",
                self.start_point, self.old_end_point, self.new_end_point
            )));
        }
        Ok(())
    }

    /// Where new offset `position` was in the old text, unless it is inside
    /// the inserted text.
    fn old_position(&self, position: usize) -> Option<usize> {
        if position < self.start_byte {
            Some(position)
        } else if position >= self.new_end_byte {
            Some(position - self.new_end_byte + self.old_end_byte)
        } else {
            None
        }
    }

    /// Whether a node at old offset `start` is unaffected by the edit,
    /// including the input its lexer examined past its end.
    fn is_clean(&self, start: usize, node: &Node) -> bool {
        start + node.lookahead_len <= self.start_byte || start >= self.old_end_byte
    }
}

fn inconsistent(reason: String) -> Error {
    Error::EditInconsistency { reason }
}

// ==============================================================================
// Reuse Cursor
// ==============================================================================

/// The prior tree's nodes in document order, offered to the parser as it
/// moves forward through the new text.
pub(crate) struct ReuseCursor<'a> {
    /// Pre-order `(old start, node)` for every non-extra node with a
    /// non-zero width, the root excluded.
    nodes: Vec<(usize, &'a Arc<Node>)>,
    next: usize,
    edit: EditDescriptor,
}

impl<'a> ReuseCursor<'a> {
    pub(crate) fn new(prior: &'a SyntaxTree, edit: &EditDescriptor) -> Self {
        let mut nodes = Vec::new();
        collect(prior.root_arc(), 0, &mut nodes);
        ReuseCursor {
            nodes,
            next: 0,
            edit: *edit,
        }
    }

    /// The nodes starting at new offset `position`, outermost first. Each is
    /// the first child of the one before it.
    fn candidates_at(&mut self, position: usize) -> Vec<(usize, &'a Arc<Node>)> {
        let Some(old) = self.edit.old_position(position) else {
            return Vec::new();
        };
        while self.nodes.get(self.next).is_some_and(|&(start, _)| start < old) {
            self.next += 1;
        }
        self.nodes[self.next..]
            .iter()
            .take_while(|&&(start, _)| start == old)
            .copied()
            .collect()
    }
}

fn collect<'a>(node: &'a Arc<Node>, start: usize, out: &mut Vec<(usize, &'a Arc<Node>)>) {
    let mut offset = start;
    for child in &node.children {
        if !child.is_extra() && child.size.bytes > 0 {
            out.push((offset, child));
            collect(child, offset, out);
        }
        offset += child.size.bytes;
    }
}

// ==============================================================================
// Reuse
// ==============================================================================

impl ParseState<'_> {
    /// Push a subtree of the prior tree in place of `token`, which was just
    /// lexed with `valid` at the current position. Returns false when no
    /// subtree fits, leaving `token` to be processed normally.
    pub(crate) fn try_reuse(&mut self, token: &Token, valid: TerminalSet) -> bool {
        if self.stacks.len() != 1 || self.recovering {
            return false;
        }
        let Some(cursor) = self.reuse.as_mut() else {
            return false;
        };
        let edit = cursor.edit;
        let candidates = cursor.candidates_at(self.position.bytes);
        let Some(&(leaf_start, leaf)) = candidates.last() else {
            return false;
        };

        // The subtree must start with the token just lexed, lexed the same way.
        let matches_token = leaf.children.is_empty()
            && leaf.symbol == Symbol::Terminal(token.terminal)
            && leaf.size.bytes == token.end - token.start
            && leaf.lex_set == valid
            && leaf.scanner_start == self.scanner.serialize()
            && edit.is_clean(leaf_start, leaf)
            && !leaf.has_error()
            && !leaf.is_fragile();
        if !matches_token {
            return false;
        }

        // Perform the reductions the token triggers, as long as they are
        // unambiguous.
        let Some(mut stack) = self.stacks.pop() else {
            return false;
        };
        loop {
            let actions = self.table.actions(stack.top_state(), token.terminal);
            match actions {
                [Action::Reduce(production)] => {
                    if !self.reduce(&mut stack, *production, token) {
                        self.stacks.push(stack);
                        return false;
                    }
                }
                [Action::Shift(_)] => break,
                _ => {
                    self.stacks.push(stack);
                    return false;
                }
            }
        }

        let state = stack.top_state();
        let chosen = candidates.iter().find_map(|&(start, node)| {
            if !edit.is_clean(start, node)
                || node.has_error()
                || node.is_fragile()
                || node.parse_state != state
            {
                return None;
            }
            let next = match node.symbol {
                Symbol::Terminal(t) => match self.table.actions(state, t) {
                    [Action::Shift(next)] => Some(*next),
                    _ => None,
                },
                Symbol::Nonterminal(nt) => self.table.goto(state, nt),
            };
            next.map(|next| (node, next))
        });
        let Some((node, next)) = chosen else {
            self.stacks.push(stack);
            return false;
        };

        tracing::trace!(
            kind = %node.kind(),
            start = self.position.bytes,
            bytes = node.size.bytes,
            "reusing subtree"
        );
        stack.dynamic_precedence += node.dynamic_precedence;
        stack.entries.push(Entry {
            state: next,
            node: Arc::clone(node),
            start: self.position.bytes,
        });
        self.stacks.push(stack);
        self.position = self.position + node.size;
        self.scanner = ScannerState::deserialize(&node.scanner_end);
        self.reused += 1;
        true
    }
}
