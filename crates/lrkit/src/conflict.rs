//! Precedence-based resolution of parse table conflicts.

use crate::{
    grammar::{Assoc, Grammar, Precedence, ProductionID, TerminalID},
    lr0::StateID,
    util::display_fn,
};
use lrkit_runtime::ParseAction;
use std::{cmp::Ordering, fmt};

pub type Action = ParseAction<StateID, ProductionID>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictReason {
    /// More than one production can be reduced; the earliest one wins.
    ReduceReduce,

    /// The precedence levels of the shift and the reduction differ.
    Precedence,

    /// Equal precedence, decided by the associativity of the lookahead.
    Associativity(Assoc),

    /// The lookahead or the reduction has no precedence; shift wins.
    MissingPrecedence,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReduceReduce => f.write_str("reduce/reduce"),
            Self::Precedence => f.write_str("precedence"),
            Self::Associativity(assoc) => write!(f, "%{}", assoc),
            Self::MissingPrecedence => f.write_str("shift/reduce without precedence"),
        }
    }
}

/// A table cell that received more than one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub lookahead: TerminalID,
    /// The competing actions, the winner first.
    pub candidates: Vec<Action>,
    pub resolution: Action,
    pub reason: ConflictReason,
    /// Whether this conflict is reported as a grammar ambiguity. Conflicts
    /// settled by declared precedence are recorded but not counted.
    pub counted: bool,
}

impl Conflict {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "{:?} on {}: {} => {}",
                self.state,
                g.terminals[&self.lookahead],
                self.reason,
                display_action(g, &self.resolution)
            )?;
            f.write_str(" (")?;
            for (i, candidate) in self.candidates.iter().enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{}", display_action(g, candidate))?;
            }
            f.write_str(")")
        })
    }
}

pub(crate) fn display_action<'g>(g: &'g Grammar, action: &'g Action) -> impl fmt::Display + 'g {
    display_fn(move |f| match action {
        ParseAction::Shift(next) => write!(f, "shift({:?})", next),
        ParseAction::Reduce(p) => write!(f, "reduce({})", g.production(*p).display(g)),
        ParseAction::Accept => f.write_str("accept"),
        ParseAction::Error => f.write_str("error"),
    })
}

/// Decides a single action for every table cell, keeping a record of each
/// conflict it settles.
#[derive(Debug)]
pub struct ConflictResolver<'g> {
    g: &'g Grammar,
    conflicts: Vec<Conflict>,
}

impl<'g> ConflictResolver<'g> {
    pub fn new(g: &'g Grammar) -> Self {
        Self {
            g,
            conflicts: vec![],
        }
    }

    /// Resolve the actions competing for `(state, lookahead)`.
    ///
    /// `shift` is the shift or accept action on the lookahead, if any.
    /// Returns `None` when no action applies.
    pub fn resolve(
        &mut self,
        state: StateID,
        lookahead: TerminalID,
        shift: Option<Action>,
        reduces: &[ProductionID],
    ) -> Option<Action> {
        let mut reduces = reduces.to_vec();
        reduces.sort_unstable();
        reduces.dedup();

        let reduce = match reduces.split_first() {
            Some((&winner, losers)) => {
                for &loser in losers {
                    self.record(Conflict {
                        state,
                        lookahead,
                        candidates: vec![ParseAction::Reduce(winner), ParseAction::Reduce(loser)],
                        resolution: ParseAction::Reduce(winner),
                        reason: ConflictReason::ReduceReduce,
                        counted: true,
                    });
                }
                Some(winner)
            }
            None => None,
        };

        match (shift, reduce) {
            (shift, None) => shift,
            (None, Some(reduce)) => Some(ParseAction::Reduce(reduce)),
            (Some(shift), Some(reduce)) => {
                let shift_prec = match shift {
                    ParseAction::Shift(..) => self.g.terminals[&lookahead].precedence(),
                    _ => None,
                };
                let reduce_prec = self.g.production(reduce).precedence(self.g);
                let (resolution, reason, counted) =
                    compare_precs(shift, reduce, shift_prec, reduce_prec);
                self.record(Conflict {
                    state,
                    lookahead,
                    candidates: vec![shift, ParseAction::Reduce(reduce)],
                    resolution,
                    reason,
                    counted,
                });
                Some(resolution)
            }
        }
    }

    fn record(&mut self, conflict: Conflict) {
        if conflict.counted {
            tracing::warn!("conflict: {}", conflict.display(self.g));
        } else {
            tracing::trace!("resolved: {}", conflict.display(self.g));
        }
        self.conflicts.push(conflict);
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn into_conflicts(self) -> Vec<Conflict> {
        self.conflicts
    }
}

fn compare_precs(
    shift: Action,
    reduce: ProductionID,
    shift_prec: Option<Precedence>,
    reduce_prec: Option<Precedence>,
) -> (Action, ConflictReason, bool) {
    let reduce = ParseAction::Reduce(reduce);
    match (shift_prec, reduce_prec) {
        (Some(s), Some(r)) => match Ord::cmp(&s.priority, &r.priority) {
            Ordering::Greater => (shift, ConflictReason::Precedence, false),
            Ordering::Less => (reduce, ConflictReason::Precedence, false),
            Ordering::Equal => match s.assoc {
                Assoc::Left => (reduce, ConflictReason::Associativity(Assoc::Left), false),
                Assoc::Right => (shift, ConflictReason::Associativity(Assoc::Right), false),
                Assoc::Nonassoc => (
                    ParseAction::Error,
                    ConflictReason::Associativity(Assoc::Nonassoc),
                    true,
                ),
            },
        },
        _ => (shift, ConflictReason::MissingPrecedence, true),
    }
}
