// ==============================================================================
// GLR Parser Engine
// ==============================================================================
//
// A table-driven LR parser that can run several stacks side by side. Most of
// the time there is exactly one stack and this is an ordinary LR(1) parser.
// When the table holds more than one action for a lookahead (only where the
// grammar declares the conflict), the stack forks and every copy advances in
// lockstep, token by token. Copies whose state sequences converge are merged;
// copies with no action for the next token die. When every copy dies, error
// recovery takes over on the best one.
//
// All per-parse state lives in `ParseState`, which is threaded through the
// engine and through `recovery.rs` and `incremental.rs`, each of which adds an
// `impl ParseState` block of its own.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::error::Error;
use crate::grammar::{
    Action, Grammar, GrammarTable, ProductionId, StateId, Symbol, Terminal, TerminalSet,
    grammar_table,
};
use crate::incremental::{EditDescriptor, ReuseCursor};
use crate::lexer::{Token, lex};
use crate::scanner::ScannerState;
use crate::tree::{Length, Node, SyntaxTree};

// ==============================================================================
// Configuration
// ==============================================================================

/// Limits for a single parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    /// The most stacks kept alive at once. Extra stacks with the lowest
    /// dynamic precedence are dropped.
    pub max_stack_width: usize,
    /// How many recovery attempts a parse may make before the rest of the
    /// input is wrapped in one error node. `None` scales with the input:
    /// `256 + len / 4`.
    pub recovery_budget: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            max_stack_width: 8,
            recovery_budget: None,
        }
    }
}

impl ParserConfig {
    #[must_use]
    pub fn with_max_stack_width(mut self, width: usize) -> Self {
        self.max_stack_width = width.max(1);
        self
    }

    #[must_use]
    pub fn with_recovery_budget(mut self, budget: usize) -> Self {
        self.recovery_budget = Some(budget);
        self
    }

    fn budget_for(&self, text: &str) -> usize {
        self.recovery_budget.unwrap_or(256 + text.len() / 4)
    }
}

/// A parser with non-default limits. [`parse`](crate::parse) and
/// [`parse_incremental`](crate::parse_incremental) use the defaults.
#[derive(Clone, Debug, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Parser::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse `text` from scratch. Always returns a tree; malformed input
    /// shows up as error and missing nodes.
    #[must_use]
    pub fn parse(&self, text: &str) -> SyntaxTree {
        let root = ParseState::new(text, &self.config, None).run();
        SyntaxTree::new(root, text.len(), 0)
    }

    /// Re-parse `text`, which is `prior`'s source after `edit`, reusing the
    /// subtrees of `prior` the edit cannot have affected.
    ///
    /// The result is identical to `parse(text)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EditInconsistency`] when `edit` does not describe a
    /// change from `prior`'s source to `text`.
    pub fn parse_incremental(
        &self,
        prior: &SyntaxTree,
        text: &str,
        edit: &EditDescriptor,
    ) -> Result<SyntaxTree, Error> {
        edit.validate(prior, text)?;
        let cursor = ReuseCursor::new(prior, edit);
        let mut state = ParseState::new(text, &self.config, Some(cursor));
        let root = state.run_to_end();
        tracing::debug!(
            generation = prior.generation() + 1,
            reused = state.reused,
            "incremental parse finished"
        );
        Ok(SyntaxTree::new(root, text.len(), prior.generation() + 1))
    }
}

// ==============================================================================
// Stacks
// ==============================================================================

#[derive(Clone)]
pub(crate) struct Entry {
    /// The state after pushing `node`. Extras repeat the state below them.
    pub(crate) state: StateId,
    pub(crate) node: Arc<Node>,
    /// Absolute byte offset of `node`.
    pub(crate) start: usize,
}

#[derive(Clone, Default)]
pub(crate) struct Stack {
    pub(crate) entries: Vec<Entry>,
    pub(crate) dynamic_precedence: i32,
}

impl Stack {
    pub(crate) fn top_state(&self) -> StateId {
        self.entries.last().map_or(0, |e| e.state)
    }

    /// Whether nothing but extras has been pushed yet.
    pub(crate) fn at_top_level(&self) -> bool {
        self.entries.iter().all(|e| e.node.is_extra())
    }

    fn same_states(&self, other: &Stack) -> bool {
        let states = |s: &Stack| {
            s.entries
                .iter()
                .filter(|e| !e.node.is_extra())
                .map(|e| e.state)
                .collect::<Vec<_>>()
        };
        states(self) == states(other)
    }
}

// ==============================================================================
// Parse State
// ==============================================================================

pub(crate) struct ParseState<'a> {
    pub(crate) text: &'a str,
    pub(crate) table: &'static GrammarTable,
    pub(crate) stacks: Vec<Stack>,
    /// Where the next token starts.
    pub(crate) position: Length,
    pub(crate) scanner: ScannerState,
    pub(crate) budget: usize,
    max_stack_width: usize,
    /// A token recovery put back after inserting a missing one before it,
    /// with the valid set it was lexed with.
    pub(crate) pending: Option<(Token, TerminalSet)>,
    /// Set while the current token is being processed by more than one
    /// stack.
    pub(crate) ambiguous: bool,
    /// Set from the start of a recovery until the next successful shift.
    pub(crate) recovering: bool,
    pub(crate) reuse: Option<ReuseCursor<'a>>,
    pub(crate) reused: usize,
}

/// The outcome of processing one token.
pub(crate) enum Step {
    Continue,
    Done(Arc<Node>),
}

impl<'a> ParseState<'a> {
    pub(crate) fn new(
        text: &'a str,
        config: &ParserConfig,
        reuse: Option<ReuseCursor<'a>>,
    ) -> Self {
        ParseState {
            text,
            table: grammar_table(),
            stacks: vec![Stack::default()],
            position: Length::ZERO,
            scanner: ScannerState::default(),
            budget: config.budget_for(text),
            max_stack_width: config.max_stack_width.max(1),
            pending: None,
            ambiguous: false,
            recovering: false,
            reuse,
            reused: 0,
        }
    }

    pub(crate) fn grammar(&self) -> &'static Grammar {
        self.table.grammar()
    }

    pub(crate) fn run(mut self) -> Arc<Node> {
        self.run_to_end()
    }

    pub(crate) fn run_to_end(&mut self) -> Arc<Node> {
        loop {
            if let Step::Done(root) = self.step() {
                return root;
            }
        }
    }

    /// The terminals any live stack can act on.
    pub(crate) fn valid_set(&self) -> TerminalSet {
        let mut valid = TerminalSet::EMPTY;
        for stack in &self.stacks {
            valid.union_with(self.table.valid_set(stack.top_state()));
        }
        valid
    }

    fn step(&mut self) -> Step {
        let (token, lex_set) = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let valid = self.valid_set();
                let token = lex(self.text, self.position.bytes, valid, self.scanner);
                if token.is_trivia() {
                    let leaf = Arc::new(self.leaf(&token, valid));
                    self.push_extra(leaf, token.start);
                    self.consume(&token);
                    return Step::Continue;
                }
                if self.try_reuse(&token, valid) {
                    return Step::Continue;
                }
                (token, valid)
            }
        };
        self.process(token, lex_set)
    }

    /// Run every stack over `token`: reduce as far as the table says, then
    /// shift. Stacks fork on multiple actions and die on none.
    fn process(&mut self, token: Token, lex_set: TerminalSet) -> Step {
        let stacks = std::mem::take(&mut self.stacks);
        self.ambiguous = stacks.len() > 1;

        let mut shifted = Vec::new();
        let mut accepted = Vec::new();
        let mut failed = Vec::new();
        for stack in stacks {
            let mut work = Vec::new();
            self.schedule(stack, token.terminal, &mut work, &mut failed);
            while let Some((mut stack, action)) = work.pop() {
                match action {
                    Action::Shift(state) => {
                        self.shift(&mut stack, state, &token, lex_set);
                        shifted.push(stack);
                    }
                    Action::Accept => accepted.push(stack),
                    Action::Reduce(production) => {
                        if self.reduce(&mut stack, production, &token) {
                            self.schedule(stack, token.terminal, &mut work, &mut failed);
                        } else {
                            failed.push(stack);
                        }
                    }
                }
            }
        }

        if let Some(best) = best_of(accepted) {
            return Step::Done(self.finish(best));
        }
        if !shifted.is_empty() {
            self.consume(&token);
            self.recovering = false;
            self.stacks = self.merge(shifted);
            return Step::Continue;
        }
        match failed.into_iter().next() {
            Some(stack) => self.recover(stack, token, lex_set),
            None => Step::Done(self.finish(Stack::default())),
        }
    }

    /// Queue `stack`'s actions on `terminal`, preferred action on top.
    fn schedule(
        &mut self,
        stack: Stack,
        terminal: Terminal,
        work: &mut Vec<(Stack, Action)>,
        failed: &mut Vec<Stack>,
    ) {
        let actions = self.table.actions(stack.top_state(), terminal);
        let Some((&first, rest)) = actions.split_first() else {
            failed.push(stack);
            return;
        };
        if !rest.is_empty() {
            self.ambiguous = true;
            tracing::debug!(
                state = stack.top_state(),
                lookahead = terminal.text(),
                actions = actions.len(),
                "forking stack"
            );
        }
        for &action in rest.iter().rev() {
            work.push((stack.clone(), action));
        }
        work.push((stack, first));
    }

    pub(crate) fn shift(&mut self, stack: &mut Stack, state: StateId, token: &Token, lex_set: TerminalSet) {
        let mut leaf = self.leaf(token, lex_set);
        leaf.parse_state = stack.top_state();
        if self.ambiguous || self.recovering {
            leaf.flags |= Node::FRAGILE;
        }
        tracing::trace!(terminal = token.terminal.text(), state, "shift");
        stack.entries.push(Entry {
            state,
            node: Arc::new(leaf),
            start: token.start,
        });
    }

    /// Reduce by `production` with `lookahead` as the next token. Returns
    /// false when the table has no goto for the result.
    pub(crate) fn reduce(&mut self, stack: &mut Stack, production_id: ProductionId, lookahead: &Token) -> bool {
        let grammar = self.grammar();
        let production = grammar.production(production_id);
        let count = production.rhs.len();

        // Extras after the last child stay outside the new node.
        let mut trailing = Vec::new();
        if count > 0 {
            while stack.entries.last().is_some_and(|e| e.node.is_extra()) {
                trailing.extend(stack.entries.pop());
            }
            trailing.reverse();
        }
        let mut popped = Vec::with_capacity(count);
        let mut remaining = count;
        while remaining > 0 {
            let Some(entry) = stack.entries.pop() else {
                break;
            };
            if !entry.node.is_extra() {
                remaining -= 1;
            }
            popped.push(entry);
        }
        popped.reverse();

        let below = stack.top_state();
        let start = popped.first().map_or(self.position.bytes, |e| e.start);
        let (children, fields) = self.flatten(&popped, Some(production_id), false);
        let mut node = Node::internal(
            Symbol::Nonterminal(production.lhs),
            Some(production_id),
            children,
            fields,
        );
        node.dynamic_precedence += production.dynamic_precedence;
        node.parse_state = below;
        node.lookahead_len = node
            .lookahead_len
            .max(lookahead.lookahead_end.saturating_sub(start));
        if count == 0 {
            let checkpoint = self.scanner.serialize();
            node.scanner_start = checkpoint;
            node.scanner_end = checkpoint;
        }
        if self.ambiguous || self.recovering {
            node.flags |= Node::FRAGILE;
        }
        stack.dynamic_precedence += production.dynamic_precedence;

        let Some(state) = self.table.goto(below, production.lhs) else {
            return false;
        };
        tracing::trace!(rule = grammar.nonterminal(production.lhs).name, state, "reduce");
        stack.entries.push(Entry {
            state,
            node: Arc::new(node),
            start,
        });
        for extra in trailing {
            stack.entries.push(Entry { state, ..extra });
        }
        true
    }

    /// The children and fields a node over `entries` gets: hidden rules are
    /// spliced in place, and a field on a hidden rule labels each of its
    /// non-extra children. `splice_root` also splices `source_file` nodes,
    /// for building the final root.
    #[allow(clippy::type_complexity)]
    pub(crate) fn flatten(
        &self,
        entries: &[Entry],
        production: Option<ProductionId>,
        splice_root: bool,
    ) -> (Vec<Arc<Node>>, Vec<(&'static str, u32)>) {
        let grammar = self.grammar();
        let field_names = production.map(|p| grammar.production(p).fields.as_slice());
        let mut children: Vec<Arc<Node>> = Vec::new();
        let mut fields: Vec<(&'static str, u32)> = Vec::new();
        let mut position = 0;
        for entry in entries {
            let node = &entry.node;
            let field = if node.is_extra() {
                None
            } else {
                let field = field_names.and_then(|names| names.get(position).copied().flatten());
                position += 1;
                field
            };
            let splice = match node.symbol {
                Symbol::Nonterminal(nt) => {
                    grammar.nonterminal(nt).hidden || (splice_root && nt == grammar.root)
                }
                Symbol::Terminal(_) => false,
            };
            if splice {
                let base = index(children.len());
                if let Some(field) = field {
                    for (i, child) in node.children.iter().enumerate() {
                        if !child.is_extra() {
                            fields.push((field, base + index(i)));
                        }
                    }
                }
                fields.extend(node.fields.iter().map(|&(name, i)| (name, base + i)));
                children.extend(node.children.iter().cloned());
            } else {
                if let Some(field) = field {
                    fields.push((field, index(children.len())));
                }
                children.push(Arc::clone(node));
            }
        }
        fields.sort_by_key(|&(_, i)| i);
        (children, fields)
    }

    /// Build the root from everything left on `stack`.
    pub(crate) fn finish(&mut self, stack: Stack) -> Arc<Node> {
        let grammar = self.grammar();
        let production = stack.entries.iter().find_map(|e| match e.node.symbol {
            Symbol::Nonterminal(nt) if nt == grammar.root => e.node.production,
            _ => None,
        });
        let (children, fields) = self.flatten(&stack.entries, None, true);
        let mut root = Node::internal(Symbol::Nonterminal(grammar.root), production, children, fields);
        if root.children.is_empty() {
            let checkpoint = self.scanner.serialize();
            root.scanner_start = checkpoint;
            root.scanner_end = checkpoint;
        }
        tracing::debug!(
            bytes = root.size.bytes,
            has_error = root.has_error(),
            "parse finished"
        );
        Arc::new(root)
    }

    /// Merge stacks that reached the same states, then keep the best
    /// `max_stack_width` of them.
    fn merge(&self, stacks: Vec<Stack>) -> Vec<Stack> {
        let mut merged: Vec<Stack> = Vec::with_capacity(stacks.len());
        for stack in stacks {
            match merged.iter_mut().find(|m| m.same_states(&stack)) {
                Some(existing) => {
                    tracing::debug!(
                        kept = existing.dynamic_precedence.max(stack.dynamic_precedence),
                        "merging stacks"
                    );
                    if stack.dynamic_precedence > existing.dynamic_precedence {
                        *existing = stack;
                    }
                }
                None => merged.push(stack),
            }
        }
        merged.sort_by_key(|s| Reverse(s.dynamic_precedence));
        if merged.len() > self.max_stack_width {
            tracing::debug!(
                dropped = merged.len() - self.max_stack_width,
                "stack width limit reached"
            );
            merged.truncate(self.max_stack_width);
        }
        merged
    }

    // ==========================================================================
    // Tokens
    // ==========================================================================

    /// A leaf for `token`, which must start at the current position.
    pub(crate) fn leaf(&self, token: &Token, lex_set: TerminalSet) -> Node {
        let size = Length::of(&self.text[token.start..token.end]);
        Node::leaf(
            token.terminal,
            size,
            token.lookahead_end - token.start,
            lex_set,
            (self.scanner, token.scanner_after),
        )
    }

    /// Push an extra onto every live stack.
    pub(crate) fn push_extra(&mut self, node: Arc<Node>, start: usize) {
        for stack in &mut self.stacks {
            let state = stack.top_state();
            stack.entries.push(Entry {
                state,
                node: Arc::clone(&node),
                start,
            });
        }
    }

    /// Move past `token`.
    pub(crate) fn consume(&mut self, token: &Token) {
        self.position = self.position + Length::of(&self.text[token.start..token.end]);
        self.scanner = token.scanner_after;
    }
}

/// The accepted stack with the highest dynamic precedence, the earliest on
/// ties.
fn best_of(stacks: Vec<Stack>) -> Option<Stack> {
    let mut best: Option<Stack> = None;
    for stack in stacks {
        match &best {
            Some(b) if b.dynamic_precedence >= stack.dynamic_precedence => {}
            _ => best = Some(stack),
        }
    }
    best
}

fn index(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}
