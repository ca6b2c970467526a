//! A self-contained, serializable form of an LR parse table.
//!
//! Symbols are addressed by a dense index: terminals first (`0` is the end
//! of input, `1` is `error`), followed by the nonterminals (the first one is
//! the augmented start symbol). Each cell is a `(kind, target)` pair.
//! States whose only action reduces one production also list it in
//! `default_reductions`.

use crate::definition::{Alias, ParseAction, ParserDef, ProductionInfo};
use serde::{Deserialize, Serialize};

pub const KIND_ERROR: u8 = 0;
/// Shift in terminal columns, goto in nonterminal columns.
pub const KIND_SHIFT: u8 = 1;
pub const KIND_REDUCE: u8 = 2;
pub const KIND_ACCEPT: u8 = 3;

pub const END_OF_INPUT: usize = 0;
pub const ERROR_TOKEN: usize = 1;

/// A parse table decoupled from the grammar it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedTable {
    pub terminals: Vec<String>,
    pub nonterminals: Vec<String>,
    pub productions: Vec<EncodedProduction>,
    /// One row per state, one cell per symbol.
    pub rows: Vec<Vec<(u8, u32)>>,
    /// Per state, the production reduced without reading a lookahead.
    #[serde(default)]
    pub default_reductions: Vec<Option<u32>>,
    /// The number of conflicts recorded while building the table.
    pub conflicts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedProduction {
    /// Index into `nonterminals`.
    pub lhs: usize,
    pub len: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed table: {}", _0)]
    Json(#[from] serde_json::Error),

    #[error("unknown action kind {kind} at state {state}, symbol {symbol}")]
    ActionKind { state: usize, symbol: usize, kind: u8 },

    #[error("action target {target} out of range at state {state}, symbol {symbol}")]
    TargetOutOfRange {
        state: usize,
        symbol: usize,
        target: u32,
    },

    #[error("row {state} has {found} cells, expected {expected}")]
    RowWidth {
        state: usize,
        expected: usize,
        found: usize,
    },

    #[error("{found} default reductions for {expected} states")]
    DefaultReductionCount { expected: usize, found: usize },

    #[error("default reduction of state {state} names unknown production {target}")]
    DefaultReduction { state: usize, target: u32 },
}

impl EncodedTable {
    /// The number of cells in each row.
    pub fn width(&self) -> usize {
        self.terminals.len() + self.nonterminals.len()
    }

    pub fn to_json(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DecodeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, DecodeError> {
        let table: Self = serde_json::from_str(s)?;
        table.validate()?;
        Ok(table)
    }

    /// Check that every cell can be interpreted against this table.
    pub fn validate(&self) -> Result<(), DecodeError> {
        let width = self.width();
        for (state, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(DecodeError::RowWidth {
                    state,
                    expected: width,
                    found: row.len(),
                });
            }
            for (symbol, &(kind, target)) in row.iter().enumerate() {
                let bound = match kind {
                    KIND_ERROR | KIND_ACCEPT => continue,
                    KIND_SHIFT => self.rows.len(),
                    KIND_REDUCE => self.productions.len(),
                    kind => return Err(DecodeError::ActionKind { state, symbol, kind }),
                };
                if target as usize >= bound {
                    return Err(DecodeError::TargetOutOfRange {
                        state,
                        symbol,
                        target,
                    });
                }
            }
        }
        // an empty list means the table reduces by default nowhere.
        if !self.default_reductions.is_empty() && self.default_reductions.len() != self.rows.len()
        {
            return Err(DecodeError::DefaultReductionCount {
                expected: self.rows.len(),
                found: self.default_reductions.len(),
            });
        }
        for (state, default) in self.default_reductions.iter().enumerate() {
            if let Some(target) = *default {
                if target as usize >= self.productions.len() {
                    return Err(DecodeError::DefaultReduction { state, target });
                }
            }
        }
        for (index, production) in self.productions.iter().enumerate() {
            if production.lhs >= self.nonterminals.len() {
                return Err(DecodeError::TargetOutOfRange {
                    state: 0,
                    symbol: index,
                    target: production.lhs as u32,
                });
            }
        }
        Ok(())
    }

    fn cell(&self, state: usize, symbol: usize) -> (u8, u32) {
        self.rows
            .get(state)
            .and_then(|row| row.get(symbol))
            .copied()
            .unwrap_or((KIND_ERROR, 0))
    }
}

impl ParserDef for EncodedTable {
    type State = usize;
    type Terminal = usize;
    type Nonterminal = usize;
    type Reduce = usize;

    fn initial_state(&self) -> usize {
        0
    }

    fn end_of_input(&self) -> usize {
        END_OF_INPUT
    }

    fn error_token(&self) -> usize {
        ERROR_TOKEN
    }

    fn terminal(&self, name: &str) -> Option<usize> {
        self.terminals.iter().position(|t| t == name)
    }

    fn terminal_name(&self, terminal: usize) -> &str {
        self.terminals.get(terminal).map_or("", String::as_str)
    }

    fn action(&self, current: usize, lookahead: usize) -> ParseAction<usize, usize> {
        match self.cell(current, lookahead) {
            (KIND_SHIFT, target) => ParseAction::Shift(target as usize),
            (KIND_REDUCE, target) => ParseAction::Reduce(target as usize),
            (KIND_ACCEPT, _) => ParseAction::Accept,
            _ => ParseAction::Error,
        }
    }

    fn goto(&self, current: usize, symbol: usize) -> Option<usize> {
        match self.cell(current, self.terminals.len() + symbol) {
            (KIND_SHIFT, target) => Some(target as usize),
            _ => None,
        }
    }

    fn default_reduce(&self, current: usize) -> Option<usize> {
        let target = (*self.default_reductions.get(current)?)?;
        Some(target as usize)
    }

    fn production(&self, reduce: usize) -> ProductionInfo<'_, usize> {
        let p = &self.productions[reduce];
        ProductionInfo {
            index: reduce,
            lhs: p.lhs,
            len: p.len,
            aliases: &p.aliases,
        }
    }

    fn expected_terminals(&self, current: usize) -> Vec<usize> {
        (ERROR_TOKEN + 1..self.terminals.len())
            .filter(|&t| self.cell(current, t).0 != KIND_ERROR)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // $accept -> A $end ; A -> x
    fn tiny() -> EncodedTable {
        EncodedTable {
            terminals: vec!["$end".into(), "error".into(), "x".into()],
            nonterminals: vec!["$accept".into(), "A".into()],
            productions: vec![
                EncodedProduction {
                    lhs: 0,
                    len: 2,
                    aliases: vec![],
                },
                EncodedProduction {
                    lhs: 1,
                    len: 1,
                    aliases: vec![Alias::new("x", 1)],
                },
            ],
            rows: vec![
                vec![(0, 0), (0, 0), (1, 2), (0, 0), (1, 1)],
                vec![(3, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
                vec![(2, 1), (0, 0), (0, 0), (0, 0), (0, 0)],
            ],
            default_reductions: vec![None, None, Some(1)],
            conflicts: 0,
        }
    }

    #[test]
    fn json_round_trip() {
        let table = tiny();
        let json = table.to_json().unwrap();
        let decoded = EncodedTable::from_json(&json).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.action(0, 2), ParseAction::Shift(2));
        assert_eq!(decoded.action(2, 0), ParseAction::Reduce(1));
        assert_eq!(decoded.action(1, 0), ParseAction::Accept);
        assert_eq!(decoded.goto(0, 1), Some(1));
        assert_eq!(decoded.expected_terminals(0), vec![2]);
        assert_eq!(decoded.terminal("x"), Some(2));
        assert_eq!(decoded.default_reduce(2), Some(1));
        assert_eq!(decoded.default_reduce(0), None);
    }

    #[test]
    fn rejects_malformed_rows() {
        let mut table = tiny();
        table.rows[1].pop();
        let err = EncodedTable::from_json(&table.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::RowWidth { state: 1, .. }));

        let mut table = tiny();
        table.rows[0][2] = (7, 0);
        let err = EncodedTable::from_json(&table.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::ActionKind { kind: 7, .. }));

        let mut table = tiny();
        table.rows[2][0] = (2, 9);
        let err = EncodedTable::from_json(&table.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::TargetOutOfRange { target: 9, .. }));

        let mut table = tiny();
        table.default_reductions.pop();
        let err = EncodedTable::from_json(&table.to_json().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DefaultReductionCount {
                expected: 3,
                found: 2
            }
        ));

        let mut table = tiny();
        table.default_reductions[0] = Some(5);
        let err = EncodedTable::from_json(&table.to_json().unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::DefaultReduction { state: 0, target: 5 }));

        assert!(matches!(
            EncodedTable::from_json("{"),
            Err(DecodeError::Json(..))
        ));
    }
}
