//! Runtime implementation for `lrkit` parse tables.
//!
//! The engines here only depend on the [`ParserDef`] and [`PredictiveDef`]
//! abstractions, so they run equally against tables built in-process and
//! tables decoded from an [`EncodedTable`].

pub mod action;
pub mod definition;
pub mod encoded;
pub mod lexer;
pub mod parser;
pub mod predictive;

pub use crate::{
    action::{ActionContext, Actions, Control, Parse},
    definition::{Alias, ParseAction, ParserDef, PredictSymbol, PredictiveDef, ProductionInfo},
    encoded::{DecodeError, EncodedProduction, EncodedTable},
    lexer::{LexError, Lexer, Location, Token},
    parser::{ParseError, Parser, SyntaxError},
    predictive::PredictiveParser,
};
