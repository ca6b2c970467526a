//! The canonical collection of LR(0) item sets.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    util::{display_fn, Map, Set},
};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);
impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}
impl StateID {
    pub const INITIAL: Self = Self(0);

    pub(crate) const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Number the state at `index`, failing once the 16-bit range runs out.
    pub(crate) fn from_index(index: usize) -> Result<Self, TooManyStates> {
        u16::try_from(index).map(Self).map_err(|_| TooManyStates)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl From<StateID> for usize {
    fn from(id: StateID) -> Self {
        id.index()
    }
}

/// The automaton outgrew the range of [`StateID`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("the automaton needs more than {} states", u16::MAX as usize + 1)]
pub struct TooManyStates;

/// The LR(0) item, a.k.a. LR item core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub index: u16,
}

impl LR0Item {
    pub(crate) fn start(production: ProductionID) -> Self {
        Self {
            production,
            index: 0,
        }
    }

    /// The symbol right after the dot, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right()
            .get(self.index as usize)
            .copied()
    }

    pub(crate) fn advance(self) -> Self {
        Self {
            index: self.index + 1,
            ..self
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} -> [", g.nonterminals[&production.left()])?;
            for (i, symbol) in production.right().iter().enumerate() {
                if i == self.index as usize {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if production.right().len() == self.index as usize {
                f.write_str(" .")?;
            }
            f.write_str(" ]")
        })
    }
}

#[derive(Debug, Clone)]
pub struct LR0State {
    /// Sorted, so that equal cores compare equal.
    pub kernels: Vec<LR0Item>,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
    pub reduces: Set<ProductionID>,
    /// Whether this state holds `$accept -> Start . $end`.
    pub accept: bool,
    pub predecessors: Map<StateID, SymbolID>,
}

impl LR0State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "## kernels:")?;
            for kernel in &self.kernels {
                writeln!(f, "- {}", kernel.display(g))?;
            }
            if !self.shifts.is_empty() {
                writeln!(f, "## shifts:")?;
                for (t, to) in &self.shifts {
                    writeln!(f, "- {} => {:?}", g.terminals[t], to)?;
                }
            }
            if !self.gotos.is_empty() {
                writeln!(f, "## gotos:")?;
                for (n, to) in &self.gotos {
                    writeln!(f, "- {} => {:?}", g.nonterminals[n], to)?;
                }
            }
            if !self.reduces.is_empty() {
                writeln!(f, "## reduces:")?;
                for reduce in &self.reduces {
                    writeln!(f, "- {}", g.production(*reduce).display(g))?;
                }
            }
            if self.accept {
                writeln!(f, "## accept on {}", g.terminals[&TerminalID::EOI])?;
            }
            Ok(())
        })
    }
}

#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Map<StateID, LR0State>,
}

impl LR0Automaton {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (id, state) in &self.states {
                writeln!(f, "#### State {:?}", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Calculate the LR(0) automaton based on the specified grammar.
#[tracing::instrument(skip_all)]
pub fn lr0(g: &Grammar) -> Result<LR0Automaton, TooManyStates> {
    let nonkernels = nonkernels(g);

    let mut states = Map::<StateID, LR0State>::default();
    let mut next_id = 0usize;
    let mut state_id = move || {
        let id = StateID::from_index(next_id);
        next_id += 1;
        id
    };

    let mut pending = VecDeque::<(StateID, Vec<LR0Item>)>::new();
    pending.push_back((state_id()?, vec![LR0Item::start(ProductionID::ACCEPT)]));

    let mut items = Set::default();
    let mut new_kernels = Map::<SymbolID, Vec<LR0Item>>::default();
    let mut isocores = Map::<Vec<LR0Item>, StateID>::default();
    let mut predecessors = Map::<StateID, Map<StateID, SymbolID>>::default();
    while let Some((current, kernels)) = pending.pop_front() {
        items.clear();
        for kernel in &kernels {
            items.insert(*kernel);
            if let Some(SymbolID::N(n)) = kernel.next_symbol(g) {
                items.extend(nonkernels[&n].iter().copied());
            }
        }

        let mut reduces = Set::default();
        let mut accept = false;
        new_kernels.clear();
        for item in items.drain(..) {
            match item.next_symbol(g) {
                Some(SymbolID::T(TerminalID::EOI)) => accept = true,
                Some(symbol) => new_kernels.entry(symbol).or_default().push(item.advance()),
                None => {
                    reduces.insert(item.production);
                }
            }
        }

        let mut shifts = Map::default();
        let mut gotos = Map::default();
        for (symbol, mut new_kernel) in new_kernels.drain(..) {
            new_kernel.sort();
            new_kernel.dedup();
            let next = match isocores.get(&new_kernel) {
                Some(id) => *id,
                None => {
                    let id = state_id()?;
                    isocores.insert(new_kernel.clone(), id);
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
            predecessors.entry(next).or_default().insert(current, symbol);
        }

        tracing::trace!(
            "state {:?}: {} shifts, {} gotos, {} reduces",
            current,
            shifts.len(),
            gotos.len(),
            reduces.len()
        );
        states.insert(
            current,
            LR0State {
                kernels,
                shifts,
                gotos,
                reduces,
                accept,
                predecessors: Map::default(),
            },
        );
    }

    for (id, predecessors) in predecessors {
        states[&id].predecessors = predecessors;
    }

    tracing::debug!("LR(0) automaton: {} states", states.len());
    Ok(LR0Automaton { states })
}

/// For each nonterminal `N`, the closure of `{ N -> . γ }`.
pub(crate) fn nonkernels(g: &Grammar) -> Map<NonterminalID, Set<LR0Item>> {
    let mut nonkernels: Map<NonterminalID, Set<LR0Item>> = Map::default();
    for &n in g.nonterminals.keys() {
        let mut items: Set<LR0Item> = g
            .productions_of(n)
            .map(|p| LR0Item::start(p.id()))
            .collect();

        let mut i = 0;
        while let Some(item) = items.get_index(i).copied() {
            i += 1;
            if let Some(SymbolID::N(m)) = item.next_symbol(g) {
                items.extend(g.productions_of(m).map(|p| LR0Item::start(p.id())));
            }
        }
        nonkernels.insert(n, items);
    }
    nonkernels
}
