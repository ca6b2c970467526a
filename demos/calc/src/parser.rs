//! The calculator grammar and its semantic actions.

use crate::{
    lexer::Lexer,
    syntax::{BinOp, Expr, Value},
};
use anyhow::Context as _;
use lrkit::{
    grammar::{Assoc, Grammar, GrammarDef, GrammarError},
    Algorithm, ParseTable,
};
use lrkit_runtime::{ActionContext, Actions, Control, ParseError, Parser, SyntaxError};

type Context<'a> = ActionContext<'a, Value, ()>;

fn grammar_def(g: &mut GrammarDef, actions: &mut Actions<Value>) -> Result<(), GrammarError> {
    // declare terminal symbols.
    g.tokens(["(", ")", "+", "-", "*", "/", "^", "NUM"])?;

    // declare precedences.
    g.precedence(Assoc::Left, ["+", "-"])?;
    g.precedence(Assoc::Left, ["*", "/"])?;
    g.precedence(Assoc::Right, ["NEG"])?;
    g.precedence(Assoc::Right, ["^"])?;

    g.start_symbol("expr")?;

    // declare production rules.
    for (op, binop) in [
        ("+", BinOp::Add),
        ("-", BinOp::Sub),
        ("*", BinOp::Mul),
        ("/", BinOp::Div),
        ("^", BinOp::Pow),
    ] {
        let rule = g.rule("expr", ["expr[lhs]", op, "expr[rhs]"])?;
        actions.bind(rule, move |ctx| {
            match (expr(ctx, "lhs"), expr(ctx, "rhs")) {
                (Some(lhs), Some(rhs)) => Control::Value(Value::Expr(Box::new(Expr::Binary {
                    op: binop,
                    lhs,
                    rhs,
                }))),
                _ => Control::Abort,
            }
        });
    }
    let neg = g.rule_with_prec("expr", ["-", "expr"], "NEG")?;
    actions.bind(neg, |ctx| match expr(ctx, "expr") {
        Some(e) => Control::Value(Value::Expr(Box::new(Expr::Neg(e)))),
        None => Control::Abort,
    });
    let paren = g.rule("expr", ["(", "expr", ")"])?;
    actions.bind(paren, |ctx| match expr(ctx, "expr") {
        Some(e) => Control::Value(Value::Expr(Box::new(Expr::Paren(e)))),
        None => Control::Abort,
    });
    // `$$ = $1` keeps the number lexed into the token.
    g.rule("expr", ["NUM"])?;
    let error = g.rule("expr", ["error"])?;
    actions.bind(error, |_| {
        Control::Value(Value::Expr(Box::new(Expr::Error)))
    });

    Ok(())
}

fn expr(ctx: &mut Context<'_>, name: &str) -> Option<Box<Expr>> {
    ctx.take_named(name)?.into_expr()
}

/// The result of parsing one input.
#[derive(Debug)]
pub struct Parsed {
    pub expr: Box<Expr>,
    /// The syntax errors recovered from, in order.
    pub errors: Vec<SyntaxError>,
}

pub struct Calculator {
    grammar: Grammar,
    parser: Parser<ParseTable, Value>,
}

impl Calculator {
    pub fn new(algorithm: Algorithm) -> anyhow::Result<Self> {
        let mut actions = Actions::new();
        let grammar = Grammar::define(|g| grammar_def(g, &mut actions))?;
        let table = lrkit::compute(&grammar, algorithm)?;
        tracing::debug!(
            "{:?} table: {} states, {} conflicts",
            algorithm,
            table.states.len(),
            table.conflict_count()
        );
        Ok(Self {
            grammar,
            parser: Parser::new(table, actions),
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParseTable {
        self.parser.definition()
    }

    pub fn parse(&self, input: &str) -> anyhow::Result<Parsed> {
        let span = tracing::trace_span!("parse");
        let _entered = span.enter();

        let mut errors = vec![];
        let parsed = self
            .parser
            .parse_with(Lexer::default(), input, &mut (), |err| {
                tracing::error!("caught syntax error: {}", err);
                errors.push(err.clone());
                Ok(())
            })
            .map_err(|err| match err {
                ParseError::Syntax(err) => anyhow::anyhow!("{}", err),
                err => anyhow::Error::new(err),
            })?
            .context("empty parse result")?;
        let expr = parsed.into_expr().context("unexpected stack item")?;
        Ok(Parsed { expr, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(input: &str) -> String {
        let calculator = Calculator::new(Algorithm::LALR).unwrap();
        assert_eq!(calculator.table().conflict_count(), 0);
        calculator.parse(input).unwrap().expr.to_string()
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(calc("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(calc("1 - 2 - 3"), "(- (- 1 2) 3)");
        assert_eq!(calc("2 ^ 3 ^ 2"), "(^ 2 (^ 3 2))");
        assert_eq!(calc("-2 ^ 2"), "(neg (^ 2 2))");
        assert_eq!(calc("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn every_algorithm_agrees() {
        for algorithm in [Algorithm::SLR, Algorithm::LALR, Algorithm::LR1] {
            let calculator = Calculator::new(algorithm).unwrap();
            let parsed = calculator.parse("-(4 - 1) * 2 / 3").unwrap();
            assert_eq!(parsed.expr.eval(), Some(-2.0), "{:?}", algorithm);
        }
    }

    #[test]
    fn recovers_from_errors() {
        let calculator = Calculator::new(Algorithm::LALR).unwrap();
        let parsed = calculator.parse("1 + * 2").unwrap();
        assert_eq!(parsed.expr.to_string(), "(+ 1 (* <error> 2))");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.expr.eval(), None);
    }

    #[test]
    fn recovers_at_end_of_input() {
        let calculator = Calculator::new(Algorithm::LALR).unwrap();
        let parsed = calculator.parse("1 +").unwrap();
        assert_eq!(parsed.expr.to_string(), "(+ 1 <error>)");
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0].message.ends_with("Unexpected end of input"));
    }

    #[test]
    fn lexical_errors_are_fatal() {
        let calculator = Calculator::new(Algorithm::LALR).unwrap();
        let err = calculator.parse("1 $ 2").unwrap_err();
        assert!(err.to_string().contains("unrecognized text"), "{}", err);
    }
}
