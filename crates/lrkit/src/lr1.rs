//! The implementation of canonical LR(1) automaton.

use crate::{
    automaton::{Automaton, Item, State},
    grammar::{Grammar, ProductionID, SymbolID, TerminalID, TerminalSet},
    lr0::{LR0Item, StateID, TooManyStates},
    util::Map,
};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// Item sets are equivalent in the sense of Knuth's canonical LR(1) method,
    /// that is, they have the same LR(0) cores and equal lookahead sets.
    #[default]
    Canonical,

    /// After the canonical construction, item sets with the same LR(0) cores
    /// are merged and their lookahead sets united.
    LALR,
}

/// The kernel of an LR(1) state, ordered by core.
type Kernel = BTreeMap<LR0Item, TerminalSet>;

/// Build the canonical collection of LR(1) item sets.
#[tracing::instrument(skip_all, fields(mode = ?mode))]
pub fn lr1(g: &Grammar, mode: MergeMode) -> Result<Automaton, TooManyStates> {
    let canonical = canonical(g)?;
    tracing::debug!("canonical LR(1) automaton: {} states", canonical.states.len());
    Ok(match mode {
        MergeMode::Canonical => canonical,
        MergeMode::LALR => {
            let merged = merge_cores(canonical)?;
            tracing::debug!("merged LALR(1) automaton: {} states", merged.states.len());
            merged
        }
    })
}

fn canonical(g: &Grammar) -> Result<Automaton, TooManyStates> {
    let mut states = Map::<StateID, State>::default();
    let mut ids = Map::<Vec<(LR0Item, Vec<TerminalID>)>, StateID>::default();
    let mut pending = VecDeque::<(StateID, Kernel)>::new();

    let mut initial = Kernel::new();
    initial.insert(LR0Item::start(ProductionID::ACCEPT), TerminalSet::default());
    ids.insert(identity(&initial), StateID::INITIAL);
    pending.push_back((StateID::INITIAL, initial));

    while let Some((current, kernel)) = pending.pop_front() {
        let items = closure(g, &kernel);

        let mut reduces = Map::<ProductionID, TerminalSet>::default();
        let mut accept = false;
        let mut new_kernels = Map::<SymbolID, Kernel>::default();
        for (core, lookaheads) in &items {
            match core.next_symbol(g) {
                Some(SymbolID::T(TerminalID::EOI)) => accept = true,
                Some(symbol) => {
                    new_kernels
                        .entry(symbol)
                        .or_default()
                        .entry(core.advance())
                        .or_default()
                        .union_with(lookaheads);
                }
                None => {
                    reduces
                        .entry(core.production)
                        .or_default()
                        .union_with(lookaheads);
                }
            }
        }

        let mut shifts = Map::default();
        let mut gotos = Map::default();
        for (symbol, new_kernel) in new_kernels {
            let key = identity(&new_kernel);
            let next = match ids.get(&key) {
                Some(id) => *id,
                None => {
                    let id = StateID::from_index(ids.len())?;
                    ids.insert(key, id);
                    pending.push_back((id, new_kernel));
                    id
                }
            };
            match symbol {
                SymbolID::T(t) => {
                    shifts.insert(t, next);
                }
                SymbolID::N(n) => {
                    gotos.insert(n, next);
                }
            }
        }

        let kernels = kernel
            .into_iter()
            .map(|(core, lookaheads)| Item {
                core,
                lookaheads: Some(lookaheads),
            })
            .collect();
        states.insert(
            current,
            State {
                kernels,
                shifts,
                gotos,
                reduces,
                accept,
            },
        );
    }

    states.sort_keys();
    Ok(Automaton { states })
}

fn identity(kernel: &Kernel) -> Vec<(LR0Item, Vec<TerminalID>)> {
    kernel
        .iter()
        .map(|(core, lookaheads)| (*core, lookaheads.iter().collect()))
        .collect()
}

/// Expand `[A -> α . B β, L]` into `[B -> . γ, First(β L)]` until nothing changes.
fn closure(g: &Grammar, kernel: &Kernel) -> Map<LR0Item, TerminalSet> {
    let mut items: Map<LR0Item, TerminalSet> = kernel
        .iter()
        .map(|(core, lookaheads)| (*core, lookaheads.clone()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..items.len() {
            let (core, lookaheads) = match items.get_index(i) {
                Some((core, lookaheads)) => (*core, lookaheads.clone()),
                None => break,
            };
            let Some(SymbolID::N(b)) = core.next_symbol(g) else {
                continue;
            };
            let beta = &g.production(core.production).right()[core.index as usize + 1..];
            let (mut added, nullable) = g.first_of(beta);
            if nullable {
                added.union_with(&lookaheads);
            }
            for p in g.productions_of(b) {
                let entry = items.entry(LR0Item::start(p.id()));
                changed |= matches!(entry, indexmap::map::Entry::Vacant(..));
                changed |= entry.or_default().extend_from(&added);
            }
        }
    }

    items
}

/// Merge the states sharing the same LR(0) core, in order of first appearance.
fn merge_cores(canonical: Automaton) -> Result<Automaton, TooManyStates> {
    let mut cores = Map::<Vec<LR0Item>, StateID>::default();
    let mut renumber = Map::<StateID, StateID>::default();
    for (&id, state) in &canonical.states {
        let core: Vec<_> = state.kernels.iter().map(|item| item.core).collect();
        let next = StateID::from_index(cores.len())?;
        let merged = *cores.entry(core).or_insert(next);
        renumber.insert(id, merged);
    }

    let mut states = Map::<StateID, State>::default();
    for (id, state) in canonical.states {
        let target = renumber[&id];
        let shifts = state
            .shifts
            .iter()
            .map(|(&t, to)| (t, renumber[to]))
            .collect();
        let gotos = state
            .gotos
            .iter()
            .map(|(&n, to)| (n, renumber[to]))
            .collect();
        match states.get_mut(&target) {
            None => {
                states.insert(
                    target,
                    State {
                        shifts,
                        gotos,
                        ..state
                    },
                );
            }
            Some(merged) => {
                for (item, added) in merged.kernels.iter_mut().zip(&state.kernels) {
                    if let (Some(lookaheads), Some(added)) =
                        (&mut item.lookaheads, &added.lookaheads)
                    {
                        lookaheads.union_with(added);
                    }
                }
                for (p, lookaheads) in state.reduces {
                    merged.reduces.entry(p).or_default().union_with(&lookaheads);
                }
            }
        }
    }
    states.sort_keys();

    Ok(Automaton { states })
}
