//! LR automata with the look-ahead sets of their reductions resolved.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID, TerminalSet},
    lr0::{LR0Automaton, LR0Item, StateID},
    util::{display_fn, Map},
};
use std::fmt;

/// A kernel item, with its look-ahead set when the construction tracks one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub core: LR0Item,
    pub lookaheads: Option<TerminalSet>,
}

#[derive(Debug, Clone)]
pub struct State {
    pub kernels: Vec<Item>,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
    /// The terminals on which each completed production is reduced.
    pub reduces: Map<ProductionID, TerminalSet>,
    pub accept: bool,
}

impl State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## items:")?;
            for item in &self.kernels {
                write!(f, "- {}", item.core.display(g))?;
                if let Some(lookaheads) = &item.lookaheads {
                    write!(f, "  [{}]", terminal_names(g, lookaheads))?;
                }
                writeln!(f)?;
            }
            for (t, to) in &self.shifts {
                writeln!(f, "- {} => shift({:?})", g.terminals[t], to)?;
            }
            for (n, to) in &self.gotos {
                writeln!(f, "- {} => goto({:?})", g.nonterminals[n], to)?;
            }
            for (p, lookaheads) in &self.reduces {
                writeln!(
                    f,
                    "- [{}] => reduce({})",
                    terminal_names(g, lookaheads),
                    g.production(*p).display(g)
                )?;
            }
            if self.accept {
                writeln!(f, "- {} => accept", g.terminals[&TerminalID::EOI])?;
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct Automaton {
    pub states: Map<StateID, State>,
}

impl Automaton {
    /// Attach look-ahead sets to the reductions of an LR(0) automaton.
    pub fn from_lr0<F>(lr0: &LR0Automaton, mut lookaheads: F) -> Self
    where
        F: FnMut(StateID, ProductionID) -> TerminalSet,
    {
        let states = lr0
            .states
            .iter()
            .map(|(&id, state)| {
                let reduces = state
                    .reduces
                    .iter()
                    .map(|&p| (p, lookaheads(id, p)))
                    .collect();
                let state = State {
                    kernels: state
                        .kernels
                        .iter()
                        .map(|&core| Item {
                            core,
                            lookaheads: None,
                        })
                        .collect(),
                    shifts: state.shifts.clone(),
                    gotos: state.gotos.clone(),
                    reduces,
                    accept: state.accept,
                };
                (id, state)
            })
            .collect();
        Self { states }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

fn terminal_names<'g>(g: &'g Grammar, set: &'g TerminalSet) -> impl fmt::Display + 'g {
    display_fn(move |f| {
        for (i, t) in set.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", g.terminals[&t])?;
        }
        Ok(())
    })
}
