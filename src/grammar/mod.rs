//! The Avro grammar and its compiled LR(1) tables.
//!
//! The rule set in [`rules`] covers both dialects. [`GrammarTable`] is built
//! from it once per process, on first use, and never changes afterwards.

mod kinds;
mod lr;
mod rules;
mod terminals;

use std::sync::LazyLock;

pub use kinds::NodeKind;
pub use lr::{Conflict, GrammarTable};
pub use terminals::Terminal;

pub(crate) use lr::{Action, StateId};
pub(crate) use rules::{Grammar, ProductionId, Symbol};
pub(crate) use terminals::TerminalSet;

static TABLE: LazyLock<GrammarTable> = LazyLock::new(|| {
    let grammar = rules::avro_grammar().expect("built-in grammar is well formed");
    let table = GrammarTable::build(grammar).expect("built-in grammar fits the table limits");
    tracing::info!(
        states = table.state_count(),
        conflicts = table.conflicts().len(),
        "built grammar table"
    );
    table
});

/// The shared parse tables, built on first use.
#[must_use]
pub fn grammar_table() -> &'static GrammarTable {
    &TABLE
}
