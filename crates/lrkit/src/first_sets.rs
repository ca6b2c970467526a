//! Calculation of nullable, first and follow sets.

use crate::{
    grammar::{NonterminalID, Production, ProductionID, SymbolID, TerminalID, TerminalSet},
    util::{Map, Set},
};

/// The nullable, first and follow sets of a grammar, closed under their
/// defining equations.
#[derive(Debug)]
pub struct FirstSets {
    nulls: Set<NonterminalID>,
    firsts: Map<NonterminalID, TerminalSet>,
    follows: Map<NonterminalID, TerminalSet>,
}

/// `sup ⊇ sub`
#[derive(Debug)]
struct Constraint {
    sup: NonterminalID,
    sub: NonterminalID,
}

impl FirstSets {
    #[tracing::instrument(skip_all)]
    pub(crate) fn new(
        nonterminals: impl Iterator<Item = NonterminalID>,
        productions: &Map<ProductionID, Production>,
        start: NonterminalID,
    ) -> Self {
        let nonterminals: Vec<_> = nonterminals.collect();
        let nulls = nulls_set(productions);
        let mut sets = Self {
            nulls,
            firsts: nonterminals
                .iter()
                .map(|&n| (n, TerminalSet::default()))
                .collect(),
            follows: nonterminals
                .iter()
                .map(|&n| (n, TerminalSet::default()))
                .collect(),
        };
        sets.populate_firsts(productions);
        sets.populate_follows(productions, start);
        sets
    }

    pub fn is_nullable(&self, n: NonterminalID) -> bool {
        self.nulls.contains(&n)
    }

    pub fn nullables(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        self.nulls.iter().copied()
    }

    pub fn first(&self, n: NonterminalID) -> &TerminalSet {
        &self.firsts[&n]
    }

    pub fn follow(&self, n: NonterminalID) -> &TerminalSet {
        &self.follows[&n]
    }

    /// `First(symbols)`, and whether the whole sequence derives ε.
    pub fn first_of(&self, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        let mut res = TerminalSet::default();
        for symbol in symbols {
            match symbol {
                SymbolID::T(t) => {
                    res.insert(*t);
                    return (res, false);
                }
                SymbolID::N(n) => {
                    res.union_with(&self.firsts[n]);
                    if !self.nulls.contains(n) {
                        return (res, false);
                    }
                }
            }
        }
        (res, true)
    }

    fn populate_firsts(&mut self, productions: &Map<ProductionID, Production>) {
        // For X -> Y1 Y2 ... Yn, walk Y1, Y2, ... up to the first non-nullable
        // symbol Yk and require First(X) ⊇ First(Yi) for i = 1..k.
        let mut constraints = vec![];
        for p in productions.values() {
            for symbol in p.right() {
                match symbol {
                    SymbolID::T(t) => {
                        self.firsts[&p.left()].insert(*t);
                        break;
                    }
                    SymbolID::N(n) => {
                        if *n != p.left() {
                            constraints.push(Constraint {
                                sup: p.left(),
                                sub: *n,
                            });
                        }
                        if !self.nulls.contains(n) {
                            break;
                        }
                    }
                }
            }
        }
        solve(&mut self.firsts, &constraints);
    }

    fn populate_follows(&mut self, productions: &Map<ProductionID, Production>, start: NonterminalID) {
        self.follows[&start].insert(TerminalID::EOI);

        // For B -> α A β: Follow(A) ⊇ First(β), and Follow(A) ⊇ Follow(B) if β =>* ε.
        let mut constraints = vec![];
        for p in productions.values() {
            let right = p.right();
            for (i, symbol) in right.iter().enumerate() {
                let SymbolID::N(a) = *symbol else { continue };
                let (first, nullable) = self.first_of(&right[i + 1..]);
                self.follows[&a].union_with(&first);
                if nullable && a != p.left() {
                    constraints.push(Constraint {
                        sup: a,
                        sub: p.left(),
                    });
                }
            }
        }
        solve(&mut self.follows, &constraints);
    }
}

/// Calculate the set of nullable symbols in this grammar.
fn nulls_set(productions: &Map<ProductionID, Production>) -> Set<NonterminalID> {
    let mut nulls: Set<NonterminalID> = productions
        .values()
        .filter_map(|p| p.right().is_empty().then_some(p.left()))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for p in productions.values() {
            if nulls.contains(&p.left()) {
                continue;
            }
            let is_rhs_nullable = p
                .right()
                .iter()
                .all(|s| matches!(s, SymbolID::N(n) if nulls.contains(n)));
            if is_rhs_nullable {
                changed = true;
                nulls.insert(p.left());
            }
        }
    }

    nulls
}

/// Grow the sets until every constraint holds.
fn solve(sets: &mut Map<NonterminalID, TerminalSet>, constraints: &[Constraint]) {
    let mut changed = true;
    while changed {
        changed = false;
        for Constraint { sup, sub } in constraints {
            let subset = sets[sub].clone();
            changed |= sets[sup].extend_from(&subset);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{Grammar, TerminalID};

    fn names(g: &Grammar, set: &crate::grammar::TerminalSet) -> Vec<String> {
        let mut names: Vec<_> = set
            .iter()
            .map(|t| g.terminals[&t].name().to_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn nullable_right_recursion() {
        let g = Grammar::define(|g| {
            g.rule("A", ["x", "A"])?;
            g.rule("A", [] as [&str; 0])?;
            Ok(())
        })
        .unwrap();
        let a = g.start_symbol;
        assert!(g.is_nullable(a));
        assert_eq!(names(&g, g.first(a)), ["x"]);
        assert_eq!(names(&g, g.follow(a)), ["$end"]);
    }

    #[test]
    fn first_and_follow_through_nullables() {
        // E -> T E' ; E' -> + T E' | ε ; T -> F T' ; T' -> * F T' | ε ; F -> ( E ) | id
        let g = Grammar::define(|g| {
            g.rule("E", ["T", "E'"])?;
            g.rule("E'", ["+", "T", "E'"])?;
            g.rule("E'", [] as [&str; 0])?;
            g.rule("T", ["F", "T'"])?;
            g.rule("T'", ["*", "F", "T'"])?;
            g.rule("T'", [] as [&str; 0])?;
            g.rule("F", ["(", "E", ")"])?;
            g.rule("F", ["id"])?;
            Ok(())
        })
        .unwrap();
        let n = |name| g.nonterminal_by_name(name).unwrap();

        assert!(!g.is_nullable(n("E")));
        assert!(g.is_nullable(n("E'")));
        assert!(g.is_nullable(n("T'")));

        assert_eq!(names(&g, g.first(n("E"))), ["(", "id"]);
        assert_eq!(names(&g, g.first(n("E'"))), ["+"]);
        assert_eq!(names(&g, g.first(n("T'"))), ["*"]);

        assert_eq!(names(&g, g.follow(n("E"))), ["$end", ")"]);
        assert_eq!(names(&g, g.follow(n("E'"))), ["$end", ")"]);
        assert_eq!(names(&g, g.follow(n("T"))), ["$end", ")", "+"]);
        assert_eq!(names(&g, g.follow(n("F"))), ["$end", ")", "*", "+"]);

        let (first, nullable) = g.first_of(g.production(crate::grammar::ProductionID::ACCEPT).right());
        assert!(!nullable);
        assert!(!first.contains(TerminalID::EOI));
    }
}
