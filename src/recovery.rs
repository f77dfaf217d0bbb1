// ==============================================================================
// Error Recovery
// ==============================================================================
//
// Runs when no stack has an action for the current token. Recovery never
// fails: it always makes the parse continue, either by skipping input or by
// inventing a token, and every byte of skipped input ends up in an `error`
// node so the tree still covers the whole text.
//
// The strategies, tried in order on the single surviving stack:
//
//   1. Delete the token, when the token after it fits the current state.
//   2. Insert the token the state most expects, as a zero-width missing
//      leaf, when the current token fits after it.
//   3. Wrap the token and everything up to the next `;` or `}` in an error
//      node.
//
// Each attempt spends one unit of the budget. With the budget gone the rest
// of the input becomes a single error node.

use std::sync::Arc;

use crate::grammar::{Action, Symbol, Terminal, TerminalSet};
use crate::lexer::{Token, lex};
use crate::parser::{Entry, ParseState, Stack, Step};
use crate::tree::Node;

impl ParseState<'_> {
    pub(crate) fn recover(&mut self, stack: Stack, token: Token, lex_set: TerminalSet) -> Step {
        self.recovering = true;
        self.ambiguous = false;
        self.stacks = vec![stack];

        if self.budget == 0 {
            tracing::debug!(position = token.start, "recovery budget exhausted");
            return self.give_up(token, lex_set);
        }
        self.budget -= 1;

        if token.terminal == Terminal::End {
            if self.try_insert(&token, lex_set) {
                return Step::Continue;
            }
            let stack = self.take_stack();
            return Step::Done(self.finish_incomplete(stack));
        }
        if self.try_delete(&token, lex_set) || self.try_insert(&token, lex_set) {
            return Step::Continue;
        }
        self.wrap(token, lex_set);
        Step::Continue
    }

    /// Build the root from a stack that never reached an accepting state.
    /// When nothing on it is an error yet, a missing leaf for what the state
    /// expected marks the end of input.
    fn finish_incomplete(&mut self, mut stack: Stack) -> Arc<Node> {
        if !stack.entries.iter().any(|e| e.node.has_error()) {
            let state = stack.top_state();
            let expected = self
                .table
                .insertion_candidate(state)
                .unwrap_or(Terminal::End);
            tracing::debug!(
                position = self.position.bytes,
                expected = expected.text(),
                "recovery: input ends early"
            );
            let missing = Node::missing(expected, state, self.scanner);
            stack.entries.push(Entry {
                state,
                node: Arc::new(missing),
                start: self.position.bytes,
            });
        }
        self.finish(stack)
    }

    fn take_stack(&mut self) -> Stack {
        self.stacks.pop().unwrap_or_default()
    }

    fn top_state(&self) -> u32 {
        self.stacks.first().map_or(0, Stack::top_state)
    }

    /// Skip `token` when the significant token after it has an action in the
    /// current state.
    fn try_delete(&mut self, token: &Token, lex_set: TerminalSet) -> bool {
        let state = self.top_state();
        let valid = self.table.valid_set(state);
        let mut position = token.end;
        let mut scanner = token.scanner_after;
        let next = loop {
            let next = lex(self.text, position, valid, scanner);
            if !next.is_trivia() {
                break next;
            }
            position = next.end;
            scanner = next.scanner_after;
        };
        if self.table.actions(state, next.terminal).is_empty() {
            return false;
        }
        tracing::debug!(
            position = token.start,
            deleted = token.terminal.text(),
            "recovery: deleting token"
        );
        let mut error = error_node(vec![self.leaf(token, lex_set)]);
        error.parse_state = state;
        self.push_extra(Arc::new(error), token.start);
        self.consume(token);
        true
    }

    /// Insert the state's most expected terminal before `token` when `token`
    /// can be shifted after it.
    fn try_insert(&mut self, token: &Token, lex_set: TerminalSet) -> bool {
        let Some(candidate) = self.table.insertion_candidate(self.top_state()) else {
            return false;
        };
        let Some(mut trial) = self.stacks.first().cloned() else {
            return false;
        };
        let missing = Token {
            terminal: candidate,
            start: token.start,
            end: token.start,
            lookahead_end: token.start,
            scanner_after: self.scanner,
        };
        if !self.advance(&mut trial, &missing, true) || !self.advance(&mut trial, token, false) {
            return false;
        }
        tracing::debug!(
            position = token.start,
            inserted = candidate.text(),
            "recovery: inserting missing token"
        );
        self.stacks = vec![trial];
        self.pending = Some((*token, lex_set));
        true
    }

    /// Follow the preferred actions for `token` on `stack` until it would be
    /// shifted or accepted. With `shift_missing` set, a missing leaf for it is
    /// shifted as well.
    fn advance(&mut self, stack: &mut Stack, token: &Token, shift_missing: bool) -> bool {
        loop {
            let state = stack.top_state();
            match self.table.actions(state, token.terminal).first() {
                Some(&Action::Reduce(production)) => {
                    if !self.reduce(stack, production, token) {
                        return false;
                    }
                }
                Some(&Action::Shift(next)) => {
                    if shift_missing {
                        let leaf = Node::missing(token.terminal, state, self.scanner);
                        stack.entries.push(Entry {
                            state: next,
                            node: Arc::new(leaf),
                            start: token.start,
                        });
                    }
                    return true;
                }
                Some(&Action::Accept) => return !shift_missing,
                None => return false,
            }
        }
    }

    /// Skip `token` and what follows it up to a statement or block boundary.
    fn wrap(&mut self, token: Token, lex_set: TerminalSet) {
        let start = token.start;
        let mut skipped = vec![self.leaf(&token, lex_set)];
        self.consume(&token);

        if !is_boundary(token.terminal) {
            let at_top_level = self.stacks.first().is_none_or(Stack::at_top_level);
            loop {
                let next = lex(self.text, self.position.bytes, TerminalSet::all(), self.scanner);
                if next.terminal == Terminal::End
                    || (next.terminal == Terminal::LBrace && at_top_level)
                {
                    break;
                }
                skipped.push(self.leaf(&next, TerminalSet::all()));
                self.consume(&next);
                if is_boundary(next.terminal) {
                    break;
                }
            }
        }

        // Trivia after the last skipped token stays outside the error node.
        let mut trailing = Vec::new();
        while skipped.len() > 1 && skipped.last().is_some_and(Node::is_extra) {
            trailing.extend(skipped.pop());
        }
        tracing::debug!(
            position = start,
            tokens = skipped.len(),
            "recovery: wrapping input in an error node"
        );
        let mut error = error_node(skipped);
        error.parse_state = self.top_state();
        let mut offset = start + error.size.bytes;
        self.push_extra(Arc::new(error), start);
        for trivia in trailing.into_iter().rev() {
            let size = trivia.size.bytes;
            self.push_extra(Arc::new(trivia), offset);
            offset += size;
        }
    }

    /// Wrap everything from `token` to the end of input in one error node and
    /// finish.
    fn give_up(&mut self, token: Token, lex_set: TerminalSet) -> Step {
        let start = token.start;
        let mut skipped = Vec::new();
        let mut next = token;
        let mut next_set = lex_set;
        while next.terminal != Terminal::End {
            skipped.push(self.leaf(&next, next_set));
            self.consume(&next);
            next_set = TerminalSet::all();
            next = lex(self.text, self.position.bytes, next_set, self.scanner);
        }
        if !skipped.is_empty() {
            let mut error = error_node(skipped);
            error.parse_state = self.top_state();
            self.push_extra(Arc::new(error), start);
        }
        let stack = self.take_stack();
        Step::Done(self.finish(stack))
    }
}

fn is_boundary(terminal: Terminal) -> bool {
    matches!(terminal, Terminal::Semicolon | Terminal::RBrace)
}

/// An error node over skipped tokens. A single unlexable character is its
/// own error node.
fn error_node(mut children: Vec<Node>) -> Node {
    if children.len() == 1 && children[0].symbol == Symbol::Terminal(Terminal::Error) {
        let mut node = children.remove(0);
        node.flags |= Node::EXTRA | Node::FRAGILE;
        return node;
    }
    Node::error(children.into_iter().map(Arc::new).collect())
}
