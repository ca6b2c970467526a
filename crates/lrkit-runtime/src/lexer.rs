//! The contract between the parser engines and a token source.

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// A span in the source text.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub first_line: usize,
    pub last_line: usize,
    pub first_column: usize,
    pub last_column: usize,
}

impl Location {
    pub const fn new(
        first_line: usize,
        first_column: usize,
        last_line: usize,
        last_column: usize,
    ) -> Self {
        Self {
            first_line,
            last_line,
            first_column,
            last_column,
        }
    }

    /// Return the span from the start of `self` to the end of `last`.
    pub fn merge(&self, last: &Location) -> Location {
        Location {
            first_line: self.first_line,
            first_column: self.first_column,
            last_line: last.last_line,
            last_column: last.last_column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.first_line, self.first_column, self.last_line, self.last_column
        )
    }
}

/// A lexeme produced by a [`Lexer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Token<V> {
    /// The terminal symbol name this token stands for.
    pub name: Cow<'static, str>,
    /// The matched source text.
    pub text: String,
    pub value: V,
    pub location: Location,
}

impl<V> Token<V> {
    pub fn new(name: impl Into<Cow<'static, str>>, value: V) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            value,
            location: Location::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A lexical error reported by the token source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Lexical error on line {line}: {message}\n{context}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    /// A snippet of the input around the offending position.
    pub context: String,
}

impl LexError {
    pub fn new(message: impl Into<String>, line: usize, context: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line,
            context: context.into(),
        }
    }
}

/// A token source consumed by the parser engines.
///
/// `next_token` returns `Ok(None)` at the end of input. A lexer may be
/// reused for several inputs; `set_input` resets it.
pub trait Lexer<V> {
    fn set_input(&mut self, input: &str);

    fn next_token(&mut self) -> Result<Option<Token<V>>, LexError>;
}

impl<V, L: ?Sized + Lexer<V>> Lexer<V> for &mut L {
    fn set_input(&mut self, input: &str) {
        (**self).set_input(input)
    }

    fn next_token(&mut self) -> Result<Option<Token<V>>, LexError> {
        (**self).next_token()
    }
}

impl<V, L: ?Sized + Lexer<V>> Lexer<V> for Box<L> {
    fn set_input(&mut self, input: &str) {
        (**self).set_input(input)
    }

    fn next_token(&mut self) -> Result<Option<Token<V>>, LexError> {
        (**self).next_token()
    }
}
