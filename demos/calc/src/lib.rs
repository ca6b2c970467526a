//! A calculator built on `lrkit` parse tables.

pub mod lexer;
pub mod parser;
pub mod syntax;
