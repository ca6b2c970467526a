//! LL(1) predictive parse tables.

use crate::{
    grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID},
    util::{display_fn, Map},
};
use lrkit_runtime::{Alias, PredictSymbol, PredictiveDef, ProductionInfo};
use std::fmt;

/// A cell that more than one production was predicted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LLConflict {
    pub symbol: NonterminalID,
    pub lookahead: TerminalID,
    /// The production installed first, which stays in the table.
    pub kept: ProductionID,
    pub rejected: ProductionID,
}

#[derive(Debug)]
struct LLProduction {
    left: NonterminalID,
    right: Vec<PredictSymbol<TerminalID, NonterminalID>>,
    aliases: Vec<Alias>,
}

#[derive(Debug)]
pub struct LLTable {
    pub table: Map<NonterminalID, Map<TerminalID, ProductionID>>,
    conflicts: Vec<LLConflict>,
    terminals: Vec<String>,
    terminal_ids: Map<String, TerminalID>,
    nonterminals: Map<NonterminalID, String>,
    productions: Vec<LLProduction>,
}

impl LLTable {
    /// Predict `A -> α` on `First(α)`, and also on `Follow(A)` when `α =>* ε`.
    #[tracing::instrument(skip_all)]
    pub fn generate(g: &Grammar) -> Self {
        let mut table: Map<NonterminalID, Map<TerminalID, ProductionID>> = g
            .nonterminals
            .keys()
            .map(|&n| (n, Map::default()))
            .collect();
        let mut conflicts = vec![];

        for p in g.productions.values() {
            let (mut lookaheads, nullable) = g.first_of(p.right());
            if nullable {
                lookaheads.union_with(g.follow(p.left()));
            }
            let row = table.entry(p.left()).or_default();
            for t in lookaheads.iter() {
                match row.get(&t) {
                    Some(&kept) => {
                        tracing::warn!(
                            "LL(1) conflict on {} for {}: kept {}, rejected {}",
                            g.terminals[&t],
                            g.nonterminals[&p.left()],
                            g.production(kept).display(g),
                            p.display(g),
                        );
                        conflicts.push(LLConflict {
                            symbol: p.left(),
                            lookahead: t,
                            kept,
                            rejected: p.id(),
                        });
                    }
                    None => {
                        row.insert(t, p.id());
                    }
                }
            }
        }
        tracing::debug!("LL(1) table: {} conflicts", conflicts.len());

        Self {
            table,
            conflicts,
            terminals: g.terminals.values().map(|t| t.name().to_owned()).collect(),
            terminal_ids: g
                .terminals
                .values()
                .map(|t| (t.name().to_owned(), t.id()))
                .collect(),
            nonterminals: g
                .nonterminals
                .values()
                .map(|n| (n.id(), n.name().to_owned()))
                .collect(),
            productions: g
                .productions
                .values()
                .map(|p| LLProduction {
                    left: p.left(),
                    right: p
                        .right()
                        .iter()
                        .map(|s| match *s {
                            SymbolID::T(t) => PredictSymbol::T(t),
                            SymbolID::N(n) => PredictSymbol::N(n),
                        })
                        .collect(),
                    aliases: p.aliases().to_vec(),
                })
                .collect(),
        }
    }

    pub fn conflicts(&self) -> &[LLConflict] {
        &self.conflicts
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (n, row) in &self.table {
                writeln!(f, "## {}", g.nonterminals[n])?;
                for (t, p) in row {
                    writeln!(f, "- {} => {}", g.terminals[t], g.production(*p).display(g))?;
                }
            }
            Ok(())
        })
    }
}

impl PredictiveDef for LLTable {
    type Terminal = TerminalID;
    type Nonterminal = NonterminalID;
    type Production = ProductionID;

    fn start_symbol(&self) -> NonterminalID {
        NonterminalID::ACCEPT
    }

    fn end_of_input(&self) -> TerminalID {
        TerminalID::EOI
    }

    fn terminal(&self, name: &str) -> Option<TerminalID> {
        self.terminal_ids.get(name).copied()
    }

    fn terminal_name(&self, terminal: TerminalID) -> &str {
        self.terminals.get(terminal.index()).map_or("", String::as_str)
    }

    fn nonterminal_name(&self, symbol: NonterminalID) -> &str {
        self.nonterminals.get(&symbol).map_or("", String::as_str)
    }

    fn predict(&self, symbol: NonterminalID, lookahead: TerminalID) -> Option<ProductionID> {
        self.table.get(&symbol)?.get(&lookahead).copied()
    }

    fn production(&self, production: ProductionID) -> ProductionInfo<'_, NonterminalID> {
        let p = &self.productions[production.index()];
        ProductionInfo {
            index: production.index(),
            lhs: p.left,
            len: p.right.len(),
            aliases: &p.aliases,
        }
    }

    fn right(&self, production: ProductionID) -> Vec<PredictSymbol<TerminalID, NonterminalID>> {
        self.productions[production.index()].right.clone()
    }

    fn expected_terminals(&self, symbol: NonterminalID) -> Vec<TerminalID> {
        let mut expected: Vec<_> = self
            .table
            .get(&symbol)
            .into_iter()
            .flat_map(|row| row.keys().copied())
            .filter(|&t| t != TerminalID::EOI && t != TerminalID::ERROR)
            .collect();
        expected.sort();
        expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_on_first_and_follow() {
        let g = Grammar::define(|g| {
            g.rule("A", ["x", "A"])?;
            g.rule("A", [] as [&str; 0])?;
            Ok(())
        })
        .unwrap();
        let table = LLTable::generate(&g);
        assert_eq!(table.conflict_count(), 0);

        let x = g.terminal_by_name("x").unwrap();
        let a = g.nonterminal_by_name("A").unwrap();
        let index = |n, t| table.predict(n, t).map(ProductionID::index);
        assert_eq!(index(NonterminalID::ACCEPT, x), Some(0));
        assert_eq!(index(NonterminalID::ACCEPT, TerminalID::EOI), Some(0));
        assert_eq!(index(a, x), Some(1));
        assert_eq!(index(a, TerminalID::EOI), Some(2));
        assert_eq!(table.expected_terminals(a), vec![x]);
    }

    #[test]
    fn left_recursion_conflicts() {
        let g = Grammar::define(|g| {
            g.rule("e", ["e", "+", "x"])?;
            g.rule("e", ["x"])?;
            Ok(())
        })
        .unwrap();
        let table = LLTable::generate(&g);
        assert_eq!(table.conflict_count(), 1);
        let conflict = &table.conflicts()[0];
        assert_eq!(conflict.kept.index(), 1);
        assert_eq!(conflict.rejected.index(), 2);
        assert_eq!(g.terminals[&conflict.lookahead].name(), "x");
    }
}
