#![allow(dead_code)]

use lrkit::{lr0::StateID, table::ParseTable, Grammar};
use lrkit_runtime::{LexError, Lexer, Location, ParseAction, ParserDef, Token};
use std::{collections::VecDeque, fmt};

macro_rules! assert_matches {
    ($($t:tt)*) => { assert!(matches!($($t)*)) };
}
pub(crate) use assert_matches;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The semantic value used throughout the tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn atom(s: impl fmt::Display) -> Self {
        Self::Atom(s.to_string())
    }

    pub fn list(items: impl IntoIterator<Item = Sexp>) -> Self {
        Self::List(items.into_iter().collect())
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Every non-blank character is a token named after itself; `#` is a
/// lexical error.
#[derive(Debug, Default)]
pub struct CharLexer {
    chars: VecDeque<char>,
    line: usize,
    column: usize,
}

impl Lexer<Sexp> for CharLexer {
    fn set_input(&mut self, input: &str) {
        self.chars = input.chars().collect();
        self.line = 1;
        self.column = 0;
    }

    fn next_token(&mut self) -> Result<Option<Token<Sexp>>, LexError> {
        while let Some(c) = self.chars.pop_front() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.column = 0;
                }
                ' ' | '\t' => self.column += 1,
                '#' => {
                    return Err(LexError::new("unrecognized text", self.line, c.to_string()))
                }
                c => {
                    let location =
                        Location::new(self.line, self.column, self.line, self.column + 1);
                    self.column += 1;
                    let token = Token::new(c.to_string(), Sexp::atom(c))
                        .with_text(c.to_string())
                        .at(location);
                    return Ok(Some(token));
                }
            }
        }
        Ok(None)
    }
}

/// Whether the two tables have the same shape up to a renumbering of states.
pub fn isomorphic(g: &Grammar, a: &ParseTable, b: &ParseTable) -> bool {
    if a.states.len() != b.states.len() {
        return false;
    }
    let mut mapping = std::collections::HashMap::new();
    let mut queue = VecDeque::new();
    mapping.insert(StateID::INITIAL, StateID::INITIAL);
    queue.push_back((StateID::INITIAL, StateID::INITIAL));

    let mut pair = |x: StateID, y: StateID, queue: &mut VecDeque<(StateID, StateID)>| {
        match mapping.get(&x) {
            Some(mapped) => *mapped == y,
            None => {
                mapping.insert(x, y);
                queue.push_back((x, y));
                true
            }
        }
    };

    while let Some((x, y)) = queue.pop_front() {
        for &t in g.terminals.keys() {
            let ok = match (a.action(x, t), b.action(y, t)) {
                (ParseAction::Shift(nx), ParseAction::Shift(ny)) => pair(nx, ny, &mut queue),
                (ax, bx) => ax == bx,
            };
            if !ok {
                return false;
            }
        }
        for &n in g.nonterminals.keys() {
            let ok = match (a.goto(x, n), b.goto(y, n)) {
                (Some(nx), Some(ny)) => pair(nx, ny, &mut queue),
                (None, None) => true,
                _ => false,
            };
            if !ok {
                return false;
            }
        }
    }
    true
}

/// Whether `sup` performs every action `sub` performs, on the same states.
pub fn reduces_superset(g: &Grammar, sup: &ParseTable, sub: &ParseTable) -> bool {
    sub.states.keys().all(|&s| {
        g.terminals.keys().all(|&t| match sub.action(s, t) {
            ParseAction::Error => true,
            action => sup.action(s, t) == action,
        })
    })
}
