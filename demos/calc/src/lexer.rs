use crate::syntax::{Expr, Value};
use logos::Logos;
use lrkit_runtime::{LexError, Location, Token};
use std::collections::VecDeque;

#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Kind {
    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("^")]
    Caret,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Num,
}

impl Kind {
    /// The terminal name used in the grammar.
    fn terminal(self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Caret => "^",
            Self::Num => "NUM",
        }
    }
}

/// Adapts the `logos` scanner to the parser's token contract.
///
/// The whole input is scanned up front, so a lexical error surfaces when the
/// parser reaches the offending position.
#[derive(Debug, Default)]
pub struct Lexer {
    tokens: VecDeque<Result<Token<Value>, LexError>>,
}

impl lrkit_runtime::Lexer<Value> for Lexer {
    fn set_input(&mut self, input: &str) {
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let position = |offset: usize| {
            let line = line_starts.partition_point(|&start| start <= offset);
            (line, offset - line_starts[line - 1])
        };

        self.tokens = Kind::lexer(input)
            .spanned()
            .map(|(kind, span)| -> Result<Token<Value>, LexError> {
                let text = &input[span.clone()];
                let (line, column) = position(span.start);
                let kind = kind.map_err(|()| {
                    LexError::new("unrecognized text", line, text)
                })?;
                let value = match kind {
                    Kind::Num => {
                        let n = text.parse().map_err(|_| {
                            LexError::new("invalid number", line, text)
                        })?;
                        Value::Expr(Box::new(Expr::Num(n)))
                    }
                    _ => Value::Token(text.to_owned()),
                };
                let (last_line, last_column) = position(span.end);
                Ok(Token::new(kind.terminal(), value)
                    .with_text(text)
                    .at(Location::new(line, column, last_line, last_column)))
            })
            .collect();
        tracing::trace!("scanned {} tokens", self.tokens.len());
    }

    fn next_token(&mut self) -> Result<Option<Token<Value>>, LexError> {
        self.tokens.pop_front().transpose()
    }
}
