//! Parse table construction for LR(0), SLR(1), LALR(1), canonical LR(1)
//! and LL(1) parsers.
//!
//! ```
//! use lrkit::{grammar::{Assoc, Grammar}, Algorithm};
//!
//! let g = Grammar::define(|g| {
//!     g.precedence(Assoc::Left, ["+"])?;
//!     g.rule("expr", ["expr", "+", "expr"])?;
//!     g.rule("expr", ["num"])?;
//!     Ok(())
//! })?;
//! let table = lrkit::compute(&g, Algorithm::LALR)?;
//! assert_eq!(table.conflict_count(), 0);
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

pub mod automaton;
pub mod conflict;
pub mod digraph;
pub mod first_sets;
pub mod grammar;
pub mod lalr;
pub mod ll;
pub mod lr0;
pub mod lr1;
pub mod table;
pub mod util;

pub use crate::{
    automaton::Automaton,
    grammar::{Grammar, GrammarError},
    ll::LLTable,
    lr0::TooManyStates,
    table::ParseTable,
};

use crate::{grammar::TerminalSet, lr1::MergeMode};

/// The flavour of LR automaton to build.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Reduce on every terminal.
    LR0,
    /// Reduce on `Follow(A)`.
    SLR,
    /// DeRemer and Pennello look-ahead propagation over the LR(0) automaton.
    #[default]
    LALR,
    /// Knuth's canonical LR(1) collection.
    LR1,
}

/// Build the automaton of the requested flavour, with its reduce look-aheads.
#[tracing::instrument(skip_all, fields(algorithm = ?algorithm))]
pub fn automaton(g: &Grammar, algorithm: Algorithm) -> Result<Automaton, TooManyStates> {
    Ok(match algorithm {
        Algorithm::LR0 => {
            let lr0 = lr0::lr0(g)?;
            let all: TerminalSet = g.terminals.keys().copied().collect();
            Automaton::from_lr0(&lr0, |_, _| all.clone())
        }
        Algorithm::SLR => {
            let lr0 = lr0::lr0(g)?;
            Automaton::from_lr0(&lr0, |_, p| g.follow(g.production(p).left()).clone())
        }
        Algorithm::LALR => {
            let lr0 = lr0::lr0(g)?;
            let lalr = lalr::lalr(g, &lr0);
            Automaton::from_lr0(&lr0, |s, p| {
                lalr.lookahead(s, p).cloned().unwrap_or_default()
            })
        }
        Algorithm::LR1 => lr1::lr1(g, MergeMode::Canonical)?,
    })
}

/// Build the parse table of the requested flavour.
pub fn compute(g: &Grammar, algorithm: Algorithm) -> Result<ParseTable, TooManyStates> {
    Ok(ParseTable::generate(g, &automaton(g, algorithm)?))
}

/// Build the LL(1) prediction table.
pub fn compute_ll(g: &Grammar) -> LLTable {
    LLTable::generate(g)
}
