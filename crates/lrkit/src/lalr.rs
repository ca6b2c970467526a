//! LALR(1) look-ahead sets computation.
//!
//! The algorithm is based on DeRemer and Pennello's method\[1\]: the
//! look-ahead sets are propagated over the LR(0) automaton through the
//! `reads`, `includes` and `lookback` relations, without building the
//! canonical LR(1) collection.
//!
//! \[1\]: DeRemer and Pennello, Efficient Computation of LALR(1) Look-Ahead Sets
//!       <https://dl.acm.org/doi/10.1145/69622.357187>

use crate::{
    digraph::digraph,
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID, TerminalSet},
    lr0::{LR0Automaton, StateID},
    util::{Map, Set},
};
use std::fmt;

/// A nonterminal transition `from --(symbol)-->`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Goto {
    pub from: StateID,
    pub symbol: NonterminalID,
}

impl fmt::Debug for Goto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.from, self.symbol)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Reduce {
    pub state: StateID,
    pub production: ProductionID,
}

impl fmt::Debug for Reduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?},{:?})", self.state, self.production)
    }
}

#[derive(Debug)]
pub struct LALRData {
    /// `Follow(p,A)` for every nonterminal transition.
    pub follows: Map<Goto, TerminalSet>,
    /// `LA(q,A->ω)` for every reduction in the automaton.
    pub lookaheads: Map<Reduce, TerminalSet>,
}

impl LALRData {
    pub fn lookahead(&self, state: StateID, production: ProductionID) -> Option<&TerminalSet> {
        self.lookaheads.get(&Reduce { state, production })
    }
}

/// Compute the look-ahead sets corresponding to the reductions in the provided LR automaton.
#[tracing::instrument(skip_all)]
pub fn lalr(g: &Grammar, lr0: &LR0Automaton) -> LALRData {
    // Step 0: the direct-read sets of the goto transitions.
    //   DirectRead(p,A) := { t | p --(A)--> r --(t)--> }
    // plus the end of input when r is the accepting state.
    let mut gotos = Map::default();
    let mut reads_init = Map::default();
    for (&from, state) in &lr0.states {
        for (&n, &to) in &state.gotos {
            let key = Goto { from, symbol: n };
            gotos.insert(key, to);
            let target = &lr0.states[&to];
            let mut direct: TerminalSet = target.shifts.keys().copied().collect();
            if target.accept {
                direct.insert(TerminalID::EOI);
            }
            reads_init.insert(key, direct);
        }
    }

    // - (p,A) `reads` (r,C) <==> p --(A)--> r --(C)--> && C =>* ε
    // - (p,A) `includes` (p',B) <==> B -> βAγ, γ =>* ε, p' -(β)-> p
    // - (q, A->ω) `lookback` (p,A) <==> p --(ω)--> q
    let reads = calc_reads(g, lr0, &gotos);
    let includes = calc_includes(g, lr0, &gotos);

    // Step 1: Read(p,A) = DirectRead(p,A) ∪ ⋃{ Read(r,C) | (p,A) reads (r,C) }
    let mut follows = reads_init;
    digraph(&mut follows, |a| reads.get(a).into_iter().flatten().copied());

    // Step 2: Follow(p,A) = Read(p,A) ∪ ⋃{ Follow(p',B) | (p,A) includes (p',B) }
    digraph(&mut follows, |a| includes.get(a).into_iter().flatten().copied());

    // Step 3: LA(q,A->ω) = ⋃{ Follow(p,A) | (q,A->ω) lookback (p,A) }
    let mut lookaheads = Map::<Reduce, TerminalSet>::default();
    for (state, &production) in lr0
        .states
        .iter()
        .flat_map(|(id, s)| s.reduces.iter().map(move |p| (*id, p)))
    {
        lookaheads.insert(Reduce { state, production }, TerminalSet::default());
    }
    for (goto, follow) in &follows {
        for p in g.productions_of(goto.symbol) {
            let Some(q) = walk(lr0, goto.from, p.right()) else {
                continue;
            };
            if let Some(la) = lookaheads.get_mut(&Reduce {
                state: q,
                production: p.id(),
            }) {
                la.union_with(follow);
            }
        }
    }

    LALRData {
        follows,
        lookaheads,
    }
}

/// Follow the transitions labelled by `symbols` from `from`.
fn walk(lr0: &LR0Automaton, from: StateID, symbols: &[SymbolID]) -> Option<StateID> {
    symbols.iter().try_fold(from, |current, symbol| {
        let state = &lr0.states[&current];
        match symbol {
            SymbolID::T(t) => state.shifts.get(t).copied(),
            SymbolID::N(n) => state.gotos.get(n).copied(),
        }
    })
}

fn calc_reads(g: &Grammar, lr0: &LR0Automaton, gotos: &Map<Goto, StateID>) -> Map<Goto, Vec<Goto>> {
    gotos
        .iter()
        .map(|(key, r)| {
            let reads = lr0.states[r]
                .gotos
                .keys()
                .filter(|&&c| g.is_nullable(c))
                .map(|&c| Goto {
                    from: *r,
                    symbol: c,
                })
                .collect();
            (*key, reads)
        })
        .collect()
}

fn calc_includes(
    g: &Grammar,
    lr0: &LR0Automaton,
    gotos: &Map<Goto, StateID>,
) -> Map<Goto, Set<Goto>> {
    let mut includes = Map::<Goto, Set<Goto>>::default();

    for b_key in gotos.keys() {
        for p in g.productions_of(b_key.symbol) {
            // walk B -> β A γ from p', recording (p,A) wherever γ =>* ε.
            let right = p.right();
            let mut current = b_key.from;
            for (i, symbol) in right.iter().enumerate() {
                if let SymbolID::N(a) = *symbol {
                    let (_, gamma_nullable) = g.first_of(&right[i + 1..]);
                    if gamma_nullable {
                        includes
                            .entry(Goto {
                                from: current,
                                symbol: a,
                            })
                            .or_default()
                            .insert(*b_key);
                    }
                }
                match walk(lr0, current, std::slice::from_ref(symbol)) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
    }

    includes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr0::lr0;

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        let mut names: Vec<_> = set.iter().map(|t| g.terminals[&t].name().to_owned()).collect();
        names.sort();
        names
    }

    #[test]
    fn nullable_reduction_sees_end_of_input() {
        let g = Grammar::define(|g| {
            g.rule("A", ["x", "A"])?;
            g.rule("A", [] as [&str; 0])?;
            Ok(())
        })
        .unwrap();
        let lr0 = lr0(&g).unwrap();
        let lalr = lalr(&g, &lr0);
        assert_eq!(lalr.lookaheads.len(), 3);
        for la in lalr.lookaheads.values() {
            assert_eq!(names(&g, la), ["$end"]);
        }
    }

    #[test]
    fn tighter_than_follow_sets() {
        // The classic grammar that is LALR(1) but not SLR(1):
        //   S -> L = R | R ; L -> * R | id ; R -> L
        let g = Grammar::define(|g| {
            g.rule("S", ["L", "=", "R"])?;
            g.rule("S", ["R"])?;
            g.rule("L", ["*", "R"])?;
            g.rule("L", ["id"])?;
            g.rule("R", ["L"])?;
            Ok(())
        })
        .unwrap();
        let r = g.nonterminal_by_name("R").unwrap();
        assert_eq!(names(&g, g.follow(r)), ["$end", "="]);

        let lr0 = lr0(&g).unwrap();
        let lalr = lalr(&g, &lr0);
        // the state reached by `S -> L . = R` also reduces `R -> L`, only on $end.
        let l = g.nonterminal_by_name("L").unwrap();
        let after_l = lr0.states[&StateID::INITIAL].gotos[&l];
        let r_to_l = g.productions_of(r).next().unwrap().id();
        let la = lalr.lookahead(after_l, r_to_l).unwrap();
        assert_eq!(names(&g, la), ["$end"]);
    }
}
