// ==============================================================================
// LR(1) Table Construction
// ==============================================================================
//
// Canonical LR(1): a state is a kernel of items, each with its own lookahead
// set, and two kernels with the same items but different lookaheads are
// different states. States are numbered in discovery order, which together
// with the fixed rule order makes the tables identical from build to build.
//
// Conflicts are settled here where the grammar says how (static precedence,
// associativity). Conflicts among nonterminals the grammar declares as
// expected keep every action, and the parser forks on them at runtime.

use indexmap::{IndexMap, IndexSet};

use super::rules::{
    Associativity, Grammar, GrammarError, NonterminalId, ProductionId, Symbol,
};
use super::terminals::{TERMINAL_COUNT, Terminal, TerminalSet};

pub(crate) type StateId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Shift(StateId),
    Reduce(ProductionId),
    Accept,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Item {
    production: ProductionId,
    dot: u16,
}

type Kernel = Vec<(Item, TerminalSet)>;

/// An unresolved conflict: more than one action for a lookahead, among
/// nonterminals the grammar did not declare as conflicting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: u32,
    pub lookahead: Terminal,
    /// Names of the left-hand sides involved.
    pub symbols: Vec<&'static str>,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "state {}: conflict on `{}` between {}",
            self.state,
            self.lookahead.text(),
            self.symbols.join(", ")
        )
    }
}

/// The compiled parse tables for both Avro dialects.
///
/// Built once per process by [`grammar_table`](crate::grammar_table) and
/// shared read-only by every parse.
pub struct GrammarTable {
    grammar: Grammar,
    actions: Vec<Vec<Action>>,
    gotos: Vec<Option<StateId>>,
    valid: Vec<TerminalSet>,
    insertion: Vec<Option<Terminal>>,
    conflicts: Vec<Conflict>,
}

impl std::fmt::Debug for GrammarTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarTable")
            .field("states", &self.state_count())
            .field("productions", &self.grammar.productions.len())
            .field("conflicts", &self.conflicts.len())
            .finish_non_exhaustive()
    }
}

impl GrammarTable {
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.valid.len()
    }

    /// Conflicts the construction had to settle by default. Empty for the
    /// shipped grammar.
    #[must_use]
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// The terminals state `state` has an action for.
    #[must_use]
    pub fn expected_terminals(&self, state: u32) -> Vec<Terminal> {
        self.valid_set(state).iter().collect()
    }

    pub(crate) fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub(crate) fn actions(&self, state: StateId, t: Terminal) -> &[Action] {
        &self.actions[state as usize * TERMINAL_COUNT + t.index()]
    }

    pub(crate) fn goto(&self, state: StateId, nt: NonterminalId) -> Option<StateId> {
        let columns = self.grammar.nonterminals.len();
        self.gotos
            .get(state as usize * columns + usize::from(nt))
            .copied()
            .flatten()
    }

    pub(crate) fn valid_set(&self, state: StateId) -> TerminalSet {
        self.valid
            .get(state as usize)
            .copied()
            .unwrap_or(TerminalSet::EMPTY)
    }

    /// The terminal most items in `state` expect next, used when recovery
    /// inserts a missing token.
    pub(crate) fn insertion_candidate(&self, state: StateId) -> Option<Terminal> {
        self.insertion.get(state as usize).copied().flatten()
    }

    pub(crate) fn build(grammar: Grammar) -> Result<GrammarTable, GrammarError> {
        let tables = Builder::new(&grammar).run()?;
        Ok(GrammarTable {
            grammar,
            actions: tables.actions,
            gotos: tables.gotos,
            valid: tables.valid,
            insertion: tables.insertion,
            conflicts: tables.conflicts,
        })
    }
}

// ==============================================================================
// FIRST Sets
// ==============================================================================

struct First {
    sets: Vec<TerminalSet>,
    nullable: Vec<bool>,
}

impl First {
    fn compute(grammar: &Grammar) -> First {
        let count = grammar.nonterminals.len();
        let mut sets = vec![TerminalSet::EMPTY; count];
        let mut nullable = vec![false; count];
        let mut changed = true;
        while changed {
            changed = false;
            for production in &grammar.productions {
                let lhs = usize::from(production.lhs);
                let mut all_nullable = true;
                for symbol in &production.rhs {
                    match *symbol {
                        Symbol::Terminal(t) => {
                            changed |= sets[lhs].insert(t);
                            all_nullable = false;
                        }
                        Symbol::Nonterminal(nt) => {
                            let inner = sets[usize::from(nt)];
                            changed |= sets[lhs].union_with(inner);
                            if !nullable[usize::from(nt)] {
                                all_nullable = false;
                            }
                        }
                    }
                    if !all_nullable {
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }
        First { sets, nullable }
    }

    /// FIRST of `symbols` followed by any terminal of `tail`.
    fn of_sequence(&self, symbols: &[Symbol], tail: TerminalSet) -> TerminalSet {
        let mut out = TerminalSet::EMPTY;
        for symbol in symbols {
            match *symbol {
                Symbol::Terminal(t) => {
                    out.insert(t);
                    return out;
                }
                Symbol::Nonterminal(nt) => {
                    out.union_with(self.sets[usize::from(nt)]);
                    if !self.nullable[usize::from(nt)] {
                        return out;
                    }
                }
            }
        }
        out.union_with(tail);
        out
    }
}

// ==============================================================================
// Builder
// ==============================================================================

struct ShiftCandidate {
    target: StateId,
    precedence: i32,
    lhs: Vec<NonterminalId>,
}

#[derive(Default)]
struct Tables {
    actions: Vec<Vec<Action>>,
    gotos: Vec<Option<StateId>>,
    valid: Vec<TerminalSet>,
    insertion: Vec<Option<Terminal>>,
    conflicts: Vec<Conflict>,
}

struct Builder<'g> {
    grammar: &'g Grammar,
    first: First,
    states: IndexSet<Kernel>,
    tables: Tables,
}

impl<'g> Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Builder {
            grammar,
            first: First::compute(grammar),
            states: IndexSet::new(),
            tables: Tables::default(),
        }
    }

    fn run(mut self) -> Result<Tables, GrammarError> {
        let start = Item {
            production: self.grammar.accept,
            dot: 0,
        };
        self.states
            .insert(vec![(start, TerminalSet::single(Terminal::End))]);

        let columns = self.grammar.nonterminals.len();
        let mut index = 0;
        while index < self.states.len() {
            let state = StateId::try_from(index).map_err(|_| GrammarError::TooLarge)?;
            let items = self.closure(&self.states[index]);

            // Successor kernels, grouped by the symbol after the dot in order
            // of first appearance.
            let mut successors: IndexMap<Symbol, Kernel> = IndexMap::new();
            let mut reduces: Vec<(Item, TerminalSet)> = Vec::new();
            let mut expected = [0u32; TERMINAL_COUNT];
            for (&item, &lookahead) in &items {
                let production = self.grammar.production(item.production);
                match production.rhs.get(usize::from(item.dot)) {
                    Some(&symbol) => {
                        if let Symbol::Terminal(t) = symbol {
                            expected[t.index()] += 1;
                        }
                        let next = Item {
                            production: item.production,
                            dot: item.dot + 1,
                        };
                        successors.entry(symbol).or_default().push((next, lookahead));
                    }
                    None => reduces.push((item, lookahead)),
                }
            }

            let mut row: Vec<Vec<Action>> = vec![Vec::new(); TERMINAL_COUNT];
            let mut shifts: Vec<Option<ShiftCandidate>> =
                (0..TERMINAL_COUNT).map(|_| None).collect();
            let mut goto_row = vec![None; columns];
            for (symbol, mut kernel) in successors {
                kernel.sort_by_key(|&(item, _)| item);
                let precedence = kernel
                    .iter()
                    .map(|(item, _)| self.grammar.production(item.production).precedence)
                    .max()
                    .unwrap_or(0);
                let mut lhs: Vec<NonterminalId> = kernel
                    .iter()
                    .map(|(item, _)| self.grammar.production(item.production).lhs)
                    .collect();
                lhs.sort_unstable();
                lhs.dedup();
                let (target, _) = self.states.insert_full(kernel);
                let target = StateId::try_from(target).map_err(|_| GrammarError::TooLarge)?;
                match symbol {
                    Symbol::Terminal(t) => {
                        shifts[t.index()] = Some(ShiftCandidate {
                            target,
                            precedence,
                            lhs,
                        });
                    }
                    Symbol::Nonterminal(nt) => goto_row[usize::from(nt)] = Some(target),
                }
            }

            // A state that can only reduce expects whatever may follow.
            if expected.iter().all(|&count| count == 0) {
                for (_, lookahead) in &reduces {
                    for t in lookahead.iter() {
                        expected[t.index()] += 1;
                    }
                }
            }

            let mut reduce_by_terminal: Vec<Vec<ProductionId>> = vec![Vec::new(); TERMINAL_COUNT];
            for (item, lookahead) in reduces {
                if item.production == self.grammar.accept {
                    row[Terminal::End.index()].push(Action::Accept);
                    continue;
                }
                for t in lookahead.iter() {
                    reduce_by_terminal[t.index()].push(item.production);
                }
            }

            let mut valid = TerminalSet::EMPTY;
            for (i, (shift, mut reduce)) in shifts.into_iter().zip(reduce_by_terminal).enumerate() {
                let Some(t) = Terminal::from_index(i) else {
                    continue;
                };
                reduce.sort_unstable();
                reduce.dedup();
                let resolved = self.resolve(state, t, shift, reduce);
                row[i].extend(resolved);
                if !row[i].is_empty() {
                    valid.insert(t);
                }
            }

            let insertion = expected
                .iter()
                .enumerate()
                .filter(|&(i, &count)| count > 0 && i != Terminal::End.index())
                // `max_by_key` keeps the last maximum; reversing keeps the lowest id.
                .rev()
                .max_by_key(|&(_, &count)| count)
                .and_then(|(i, _)| Terminal::from_index(i));

            self.tables.actions.extend(row);
            self.tables.gotos.extend(goto_row);
            self.tables.valid.push(valid);
            self.tables.insertion.push(insertion);
            index += 1;
        }
        tracing::debug!(
            states = self.states.len(),
            conflicts = self.tables.conflicts.len(),
            "constructed LR(1) automaton"
        );
        Ok(self.tables)
    }

    fn closure(&self, kernel: &Kernel) -> IndexMap<Item, TerminalSet> {
        let mut items: IndexMap<Item, TerminalSet> = kernel.iter().copied().collect();
        let mut work: Vec<usize> = (0..items.len()).rev().collect();
        while let Some(index) = work.pop() {
            let Some((&item, &lookahead)) = items.get_index(index) else {
                continue;
            };
            let production = self.grammar.production(item.production);
            let dot = usize::from(item.dot);
            let Some(&Symbol::Nonterminal(nt)) = production.rhs.get(dot) else {
                continue;
            };
            let follow = self.first.of_sequence(&production.rhs[dot + 1..], lookahead);
            for &p in &self.grammar.by_lhs[usize::from(nt)] {
                let new_item = Item {
                    production: p,
                    dot: 0,
                };
                match items.get_index_of(&new_item) {
                    Some(existing) => {
                        if let Some((_, set)) = items.get_index_mut(existing)
                            && set.union_with(follow)
                        {
                            work.push(existing);
                        }
                    }
                    None => {
                        let (inserted, _) = items.insert_full(new_item, follow);
                        work.push(inserted);
                    }
                }
            }
        }
        items
    }

    fn resolve(
        &mut self,
        state: StateId,
        lookahead: Terminal,
        shift: Option<ShiftCandidate>,
        mut reduces: Vec<ProductionId>,
    ) -> Vec<Action> {
        let grammar = self.grammar;
        if reduces.is_empty() {
            return shift.map(|s| Action::Shift(s.target)).into_iter().collect();
        }
        if shift.is_none() && reduces.len() == 1 {
            return vec![Action::Reduce(reduces[0])];
        }

        // Static precedence: only the highest level survives.
        let top = reduces
            .iter()
            .map(|&p| grammar.production(p).precedence)
            .chain(shift.as_ref().map(|s| s.precedence))
            .max()
            .unwrap_or(0);
        reduces.retain(|&p| grammar.production(p).precedence == top);
        let mut shift = shift.filter(|s| s.precedence == top);

        // Associativity settles a shift against reductions at the same level.
        if shift.is_some() && !reduces.is_empty() {
            let associativity = |a: Associativity| {
                reduces
                    .iter()
                    .all(|&p| grammar.production(p).associativity == a)
            };
            if associativity(Associativity::Left) {
                shift = None;
            } else if associativity(Associativity::Right) {
                reduces.clear();
            }
        }

        let candidates = reduces.len() + usize::from(shift.is_some());
        if candidates <= 1 {
            return match (shift, reduces.first()) {
                (Some(s), _) => vec![Action::Shift(s.target)],
                (None, Some(&p)) => vec![Action::Reduce(p)],
                (None, None) => Vec::new(),
            };
        }

        let mut involved: Vec<NonterminalId> =
            reduces.iter().map(|&p| grammar.production(p).lhs).collect();
        if let Some(s) = &shift {
            involved.extend(&s.lhs);
        }
        involved.sort_unstable();
        involved.dedup();

        let expected = grammar
            .expected_conflicts
            .iter()
            .any(|set| involved.iter().all(|nt| set.contains(nt)));
        if expected {
            reduces.sort_by_key(|&p| (std::cmp::Reverse(grammar.production(p).dynamic_precedence), p));
            return shift
                .map(|s| Action::Shift(s.target))
                .into_iter()
                .chain(reduces.into_iter().map(Action::Reduce))
                .collect();
        }

        let symbols = involved
            .iter()
            .map(|&nt| grammar.nonterminal(nt).name)
            .collect();
        tracing::debug!(state, lookahead = lookahead.text(), "unresolved conflict");
        self.tables.conflicts.push(Conflict {
            state,
            lookahead,
            symbols,
        });
        match shift {
            Some(s) => vec![Action::Shift(s.target)],
            None => reduces.iter().min().map(|&p| Action::Reduce(p)).into_iter().collect(),
        }
    }
}
