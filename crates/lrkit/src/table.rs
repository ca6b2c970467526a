//! Calculation of LR parse table with conflict resolution.

use crate::{
    automaton::Automaton,
    conflict::{display_action, Action, Conflict, ConflictResolver},
    grammar::{Grammar, NonterminalID, ProductionID, TerminalID},
    lr0::StateID,
    util::{display_fn, Map},
};
use lrkit_runtime::{
    encoded::{KIND_ACCEPT, KIND_ERROR, KIND_REDUCE, KIND_SHIFT},
    Alias, EncodedProduction, EncodedTable, ParseAction, ParserDef, ProductionInfo,
};
use std::fmt;

#[derive(Debug)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
    /// Reduced without reading a lookahead, since it is the only action of
    /// the state.
    pub default_reduce: Option<ProductionID>,
}

#[derive(Debug)]
struct ProductionShape {
    left: NonterminalID,
    len: usize,
    aliases: Vec<Alias>,
}

/// A deterministic LR parse table.
///
/// The table keeps its own copy of the symbol names and production shapes,
/// so it can drive a [`Parser`](lrkit_runtime::Parser) without the grammar.
#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
    conflicts: Vec<Conflict>,
    terminals: Vec<String>,
    terminal_ids: Map<String, TerminalID>,
    nonterminals: Vec<String>,
    productions: Vec<ProductionShape>,
}

impl ParseTable {
    /// Install the shift, reduce and accept actions of every state in `automaton`.
    #[tracing::instrument(skip_all)]
    pub fn generate(g: &Grammar, automaton: &Automaton) -> Self {
        let mut resolver = ConflictResolver::new(g);
        let mut states = Map::default();
        for (&id, state) in &automaton.states {
            let mut actions = Map::default();
            for &t in g.terminals.keys() {
                let shift = match state.shifts.get(&t) {
                    Some(&next) => Some(ParseAction::Shift(next)),
                    None if t == TerminalID::EOI && state.accept => Some(ParseAction::Accept),
                    None => None,
                };
                let reduces: Vec<ProductionID> = state
                    .reduces
                    .iter()
                    .filter(|(_, lookaheads)| lookaheads.contains(t))
                    .map(|(&p, _)| p)
                    .collect();
                if let Some(action) = resolver.resolve(id, t, shift, &reduces) {
                    actions.insert(t, action);
                }
            }
            let gotos = state.gotos.clone();
            let default_reduce = default_reduce(&actions);
            states.insert(
                id,
                ParseTableRow {
                    actions,
                    gotos,
                    default_reduce,
                },
            );
        }

        let conflicts = resolver.into_conflicts();
        let table = Self {
            states,
            terminals: g.terminals.values().map(|t| t.name().to_owned()).collect(),
            terminal_ids: g
                .terminals
                .values()
                .map(|t| (t.name().to_owned(), t.id()))
                .collect(),
            nonterminals: g.nonterminals.values().map(|n| n.name().to_owned()).collect(),
            productions: g
                .productions
                .values()
                .map(|p| ProductionShape {
                    left: p.left(),
                    len: p.right().len(),
                    aliases: p.aliases().to_vec(),
                })
                .collect(),
            conflicts,
        };
        tracing::debug!(
            "parse table: {} states, {} conflicts ({} resolved by precedence)",
            table.states.len(),
            table.conflict_count(),
            table.conflicts.len() - table.conflict_count(),
        );
        table
    }

    /// Every conflict settled while building the table.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// The number of conflicts that signal an ambiguity in the grammar.
    pub fn conflict_count(&self) -> usize {
        self.conflicts.iter().filter(|c| c.counted).count()
    }

    pub fn action(&self, state: StateID, t: TerminalID) -> Action {
        self.states
            .get(&state)
            .and_then(|row| row.actions.get(&t))
            .copied()
            .unwrap_or(ParseAction::Error)
    }

    /// Convert into the self-contained, serializable representation.
    pub fn encode(&self) -> EncodedTable {
        let rows = self
            .states
            .values()
            .map(|row| {
                let mut cells = vec![(KIND_ERROR, 0); self.terminals.len() + self.nonterminals.len()];
                for (t, action) in &row.actions {
                    cells[t.index()] = match *action {
                        ParseAction::Shift(next) => (KIND_SHIFT, next.index() as u32),
                        ParseAction::Reduce(p) => (KIND_REDUCE, p.index() as u32),
                        ParseAction::Accept => (KIND_ACCEPT, 0),
                        ParseAction::Error => (KIND_ERROR, 0),
                    };
                }
                for (n, next) in &row.gotos {
                    cells[self.terminals.len() + n.index()] = (KIND_SHIFT, next.index() as u32);
                }
                cells
            })
            .collect();
        EncodedTable {
            terminals: self.terminals.clone(),
            nonterminals: self.nonterminals.clone(),
            productions: self
                .productions
                .iter()
                .map(|p| EncodedProduction {
                    lhs: p.left.index(),
                    len: p.len,
                    aliases: p.aliases.clone(),
                })
                .collect(),
            rows,
            default_reductions: self
                .states
                .values()
                .map(|row| row.default_reduce.map(|p| p.index() as u32))
                .collect(),
            conflicts: self.conflict_count(),
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:?}", id)?;
                writeln!(f, "## actions")?;
                for (t, action) in &row.actions {
                    writeln!(f, "- {} => {}", g.terminals[t], display_action(g, action))?;
                }
                if let Some(p) = row.default_reduce {
                    writeln!(f, "- $default => {}", display_action(g, &ParseAction::Reduce(p)))?;
                }
                if !row.gotos.is_empty() {
                    writeln!(f, "## gotos")?;
                    for (n, next) in &row.gotos {
                        writeln!(f, "- {} => goto({:?})", g.nonterminals[n], next)?;
                    }
                }
            }
            if !self.conflicts.is_empty() {
                writeln!(f, "\n#### conflicts ({} counted)", self.conflict_count())?;
                for conflict in &self.conflicts {
                    let mark = if conflict.counted { "!" } else { "-" };
                    writeln!(f, "{} {}", mark, conflict.display(g))?;
                }
            }
            Ok(())
        })
    }
}

/// The production every action of a state reduces, if there is one.
///
/// A cell set to `Error` by `%nonassoc` keeps the state from reducing by
/// default.
fn default_reduce(actions: &Map<TerminalID, Action>) -> Option<ProductionID> {
    let mut reduces = actions.values().map(|action| match *action {
        ParseAction::Reduce(p) => Some(p),
        _ => None,
    });
    let first = reduces.next()??;
    reduces.all(|p| p == Some(first)).then_some(first)
}

impl ParserDef for ParseTable {
    type State = StateID;
    type Terminal = TerminalID;
    type Nonterminal = NonterminalID;
    type Reduce = ProductionID;

    fn initial_state(&self) -> StateID {
        StateID::INITIAL
    }

    fn end_of_input(&self) -> TerminalID {
        TerminalID::EOI
    }

    fn error_token(&self) -> TerminalID {
        TerminalID::ERROR
    }

    fn terminal(&self, name: &str) -> Option<TerminalID> {
        self.terminal_ids.get(name).copied()
    }

    fn terminal_name(&self, terminal: TerminalID) -> &str {
        self.terminals.get(terminal.index()).map_or("", String::as_str)
    }

    fn action(&self, current: StateID, lookahead: TerminalID) -> Action {
        ParseTable::action(self, current, lookahead)
    }

    fn goto(&self, current: StateID, symbol: NonterminalID) -> Option<StateID> {
        self.states.get(&current)?.gotos.get(&symbol).copied()
    }

    fn default_reduce(&self, current: StateID) -> Option<ProductionID> {
        self.states.get(&current)?.default_reduce
    }

    fn production(&self, reduce: ProductionID) -> ProductionInfo<'_, NonterminalID> {
        let shape = &self.productions[reduce.index()];
        ProductionInfo {
            index: reduce.index(),
            lhs: shape.left,
            len: shape.len,
            aliases: &shape.aliases,
        }
    }

    fn expected_terminals(&self, current: StateID) -> Vec<TerminalID> {
        let Some(row) = self.states.get(&current) else {
            return vec![];
        };
        let mut expected: Vec<_> = row
            .actions
            .iter()
            .filter(|(t, action)| {
                !matches!(action, ParseAction::Error)
                    && **t != TerminalID::EOI
                    && **t != TerminalID::ERROR
            })
            .map(|(t, _)| *t)
            .collect();
        expected.sort();
        expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grammar::Assoc, lalr::lalr, lr0::lr0};

    fn lalr_table(g: &Grammar) -> ParseTable {
        let lr0 = lr0(g).unwrap();
        let lalr = lalr(g, &lr0);
        let automaton = Automaton::from_lr0(&lr0, |s, p| {
            lalr.lookahead(s, p).cloned().unwrap_or_default()
        });
        ParseTable::generate(g, &automaton)
    }

    #[test]
    fn accept_and_reduce_cells() {
        let g = Grammar::define(|g| {
            g.rule("A", ["x", "A"])?;
            g.rule("A", [] as [&str; 0])?;
            Ok(())
        })
        .unwrap();
        let table = lalr_table(&g);
        assert_eq!(table.states.len(), 4);
        assert_eq!(table.conflict_count(), 0);

        let x = g.terminal_by_name("x").unwrap();
        let a = g.nonterminal_by_name("A").unwrap();
        let accepting = table.goto(StateID::INITIAL, a).unwrap();
        assert_eq!(table.action(accepting, TerminalID::EOI), ParseAction::Accept);
        assert!(matches!(table.action(StateID::INITIAL, x), ParseAction::Shift(..)));
        assert!(matches!(
            table.action(StateID::INITIAL, TerminalID::EOI),
            ParseAction::Reduce(..)
        ));
        assert_eq!(table.expected_terminals(StateID::INITIAL), vec![x]);
        assert_eq!(table.expected_terminals(accepting), vec![]);
    }

    #[test]
    fn encode_matches_table() {
        let g = Grammar::define(|g| {
            g.rule("list", ["list", "item[it]"])?;
            g.rule("list", ["item"])?;
            Ok(())
        })
        .unwrap();
        let table = lalr_table(&g);
        let encoded = table.encode();
        encoded.validate().unwrap();
        assert_eq!(encoded.rows.len(), table.states.len());
        assert_eq!(encoded.terminals, ["$end", "error", "item"]);
        assert_eq!(encoded.nonterminals, ["$accept", "list"]);
        assert_eq!(encoded.productions[1].lhs, 1);
        assert_eq!(encoded.productions[1].len, 2);
        assert!(!encoded.productions[1].aliases.is_empty());

        for (id, row) in &table.states {
            for &t in g.terminals.keys() {
                let expected = match table.action(*id, t) {
                    ParseAction::Shift(s) => ParseAction::Shift(s.index()),
                    ParseAction::Reduce(p) => ParseAction::Reduce(p.index()),
                    ParseAction::Accept => ParseAction::Accept,
                    ParseAction::Error => ParseAction::Error,
                };
                assert_eq!(ParserDef::action(&encoded, id.index(), t.index()), expected);
            }
            for (n, next) in &row.gotos {
                assert_eq!(encoded.goto(id.index(), n.index()), Some(next.index()));
            }
        }
    }

    #[test]
    fn display_lists_conflicts() {
        let g = Grammar::define(|g| {
            g.rule("e", ["e", "+", "e"])?;
            g.rule("e", ["x"])?;
            Ok(())
        })
        .unwrap();
        let table = lalr_table(&g);
        assert_eq!(table.conflict_count(), 1);
        let rendered = table.display(&g).to_string();
        assert!(rendered.contains("#### conflicts (1 counted)"), "{}", rendered);
        assert!(rendered.contains("shift/reduce without precedence"), "{}", rendered);
    }

    #[test]
    fn default_reductions() {
        let g = Grammar::define(|g| {
            g.precedence(Assoc::Nonassoc, ["<"])?;
            g.rule("e", ["e", "<", "e"])?;
            g.rule("e", ["x"])?;
            Ok(())
        })
        .unwrap();
        let table = lalr_table(&g);
        let x = g.terminal_by_name("x").unwrap();
        let lt = g.terminal_by_name("<").unwrap();
        let e = g.nonterminal_by_name("e").unwrap();
        let e_to_x = g.productions_of(e).nth(1).unwrap().id();

        let ParseAction::Shift(after_x) = table.action(StateID::INITIAL, x) else {
            panic!("no shift on x");
        };
        assert_eq!(table.default_reduce(after_x), Some(e_to_x));
        assert_eq!(table.default_reduce(StateID::INITIAL), None);

        // `e < e .` reduces on `$end`, but rejects a second `<`.
        let after_e = table.goto(StateID::INITIAL, e).unwrap();
        let ParseAction::Shift(after_lt) = table.action(after_e, lt) else {
            panic!("no shift on <");
        };
        let after_rhs = table.goto(after_lt, e).unwrap();
        assert_eq!(table.action(after_rhs, lt), ParseAction::Error);
        assert_eq!(table.default_reduce(after_rhs), None);

        let encoded = table.encode();
        for (id, row) in &table.states {
            assert_eq!(
                encoded.default_reduce(id.index()),
                row.default_reduce.map(|p| p.index())
            );
        }
        assert!(table.display(&g).to_string().contains("- $default => reduce("));
    }
}
