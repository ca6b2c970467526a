//! Parser definitions.

use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc, sync::Arc};

/// The trait for abstracting the generated LR(1) parse table.
pub trait ParserDef {
    /// The number to identify the state of LR automaton.
    type State: Copy + fmt::Debug;

    /// The number to identify the terminal symbols.
    type Terminal: Copy + Eq + fmt::Debug;

    /// The number to identify the nonterminal symbols.
    type Nonterminal: Copy + fmt::Debug;

    /// The number to identify the production rules.
    type Reduce: Copy + fmt::Debug;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the terminal symbol that marks the end of input.
    fn end_of_input(&self) -> Self::Terminal;

    /// Return the reserved `error` terminal used as recovery point.
    fn error_token(&self) -> Self::Terminal;

    /// Look up the terminal symbol by its name.
    fn terminal(&self, name: &str) -> Option<Self::Terminal>;

    /// Return the name of the specified terminal symbol.
    fn terminal_name(&self, terminal: Self::Terminal) -> &str;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> ParseAction<Self::State, Self::Reduce>;

    /// Return the state to transition after reducing to `symbol`.
    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State>;

    /// Return the production to reduce in the specified state without
    /// reading a lookahead symbol.
    fn default_reduce(&self, current: Self::State) -> Option<Self::Reduce>;

    /// Return the shape of the specified production rule.
    fn production(&self, reduce: Self::Reduce) -> ProductionInfo<'_, Self::Nonterminal>;

    /// Return the terminal symbols that are acceptable in the specified state,
    /// excluding the `error` token and the end of input.
    fn expected_terminals(&self, current: Self::State) -> Vec<Self::Terminal>;
}

macro_rules! impl_parser_def_for_pointer {
    ($($t:ident),*) => {$(
        impl<T: ?Sized> ParserDef for $t<T>
        where
            T: ParserDef,
        {
            type State = T::State;
            type Terminal = T::Terminal;
            type Nonterminal = T::Nonterminal;
            type Reduce = T::Reduce;

            fn initial_state(&self) -> Self::State {
                (**self).initial_state()
            }
            fn end_of_input(&self) -> Self::Terminal {
                (**self).end_of_input()
            }
            fn error_token(&self) -> Self::Terminal {
                (**self).error_token()
            }
            fn terminal(&self, name: &str) -> Option<Self::Terminal> {
                (**self).terminal(name)
            }
            fn terminal_name(&self, terminal: Self::Terminal) -> &str {
                (**self).terminal_name(terminal)
            }
            fn action(
                &self,
                current: Self::State,
                lookahead: Self::Terminal,
            ) -> ParseAction<Self::State, Self::Reduce> {
                (**self).action(current, lookahead)
            }
            fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
                (**self).goto(current, symbol)
            }
            fn default_reduce(&self, current: Self::State) -> Option<Self::Reduce> {
                (**self).default_reduce(current)
            }
            fn production(&self, reduce: Self::Reduce) -> ProductionInfo<'_, Self::Nonterminal> {
                (**self).production(reduce)
            }
            fn expected_terminals(&self, current: Self::State) -> Vec<Self::Terminal> {
                (**self).expected_terminals(current)
            }
        }
    )*};
}

type Ref<'a, T> = &'a T;
impl_parser_def_for_pointer!(Rc, Arc);

impl<T: ?Sized> ParserDef for Ref<'_, T>
where
    T: ParserDef,
{
    type State = T::State;
    type Terminal = T::Terminal;
    type Nonterminal = T::Nonterminal;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }
    fn end_of_input(&self) -> Self::Terminal {
        (**self).end_of_input()
    }
    fn error_token(&self) -> Self::Terminal {
        (**self).error_token()
    }
    fn terminal(&self, name: &str) -> Option<Self::Terminal> {
        (**self).terminal(name)
    }
    fn terminal_name(&self, terminal: Self::Terminal) -> &str {
        (**self).terminal_name(terminal)
    }
    fn action(
        &self,
        current: Self::State,
        lookahead: Self::Terminal,
    ) -> ParseAction<Self::State, Self::Reduce> {
        (**self).action(current, lookahead)
    }
    fn goto(&self, current: Self::State, symbol: Self::Nonterminal) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }
    fn default_reduce(&self, current: Self::State) -> Option<Self::Reduce> {
        (**self).default_reduce(current)
    }
    fn production(&self, reduce: Self::Reduce) -> ProductionInfo<'_, Self::Nonterminal> {
        (**self).production(reduce)
    }
    fn expected_terminals(&self, current: Self::State) -> Vec<Self::Terminal> {
        (**self).expected_terminals(current)
    }
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseAction<TState, TReduce> {
    /// Read the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Reduce by the specified production rule.
    Reduce(TReduce),

    /// Terminate successfully.
    Accept,

    /// No action is applicable, or the cell was explicitly rejected
    /// by resolving a non-associative conflict.
    Error,
}

/// The shape of a production rule, as seen by the parser engine.
#[derive(Debug, Copy, Clone)]
pub struct ProductionInfo<'d, TNonterminal> {
    /// The dense index of the production, used to look up the semantic action.
    pub index: usize,

    /// The left-hand side of the production.
    pub lhs: TNonterminal,

    /// The number of symbols in the right-hand side.
    pub len: usize,

    /// The named positions in the right-hand side.
    pub aliases: &'d [Alias],
}

/// A name that refers to a position in the right-hand side of a production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    /// One-based position, as `$1`, `$2`, ...
    pub position: usize,
}

impl Alias {
    pub fn new(name: impl Into<String>, position: usize) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// Look up the position bound to `name`.
pub fn resolve_alias(aliases: &[Alias], name: &str) -> Option<usize> {
    aliases
        .iter()
        .find(|alias| alias.name == name)
        .map(|alias| alias.position)
}

/// The trait for abstracting LL(1) prediction tables.
pub trait PredictiveDef {
    type Terminal: Copy + Eq + fmt::Debug;
    type Nonterminal: Copy + Eq + fmt::Debug;
    type Production: Copy + fmt::Debug;

    /// Return the nonterminal the derivation starts from.
    fn start_symbol(&self) -> Self::Nonterminal;

    fn end_of_input(&self) -> Self::Terminal;

    fn terminal(&self, name: &str) -> Option<Self::Terminal>;

    fn terminal_name(&self, terminal: Self::Terminal) -> &str;

    fn nonterminal_name(&self, symbol: Self::Nonterminal) -> &str;

    /// Return the production predicted for `symbol` on `lookahead`.
    fn predict(
        &self,
        symbol: Self::Nonterminal,
        lookahead: Self::Terminal,
    ) -> Option<Self::Production>;

    fn production(&self, production: Self::Production) -> ProductionInfo<'_, Self::Nonterminal>;

    /// Return the right-hand side of the specified production.
    fn right(
        &self,
        production: Self::Production,
    ) -> Vec<PredictSymbol<Self::Terminal, Self::Nonterminal>>;

    fn expected_terminals(&self, symbol: Self::Nonterminal) -> Vec<Self::Terminal>;
}

/// A symbol in the right-hand side of a production, as seen by the
/// predictive engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PredictSymbol<TTerminal, TNonterminal> {
    T(TTerminal),
    N(TNonterminal),
}
