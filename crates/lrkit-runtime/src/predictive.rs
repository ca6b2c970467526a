//! The table-driven LL(1) parser engine.

use crate::{
    action::{ActionContext, Actions, Control, Parse},
    definition::{PredictSymbol, PredictiveDef},
    lexer::{Lexer, Location, Token},
    parser::{ParseError, SyntaxError},
};
use std::fmt;

enum Slot<T, N, R> {
    Match(T),
    Expand(N),
    /// The right-hand side of the production has been fully recognized.
    Reduce(R),
}

/// A predictive parser driven by an LL(1) table.
///
/// The semantic actions are the same as those of [`Parser`](crate::parser::Parser):
/// each one runs once its production's right-hand side has been matched.
pub struct PredictiveParser<D, V, P = ()> {
    definition: D,
    actions: Actions<V, P>,
}

impl<D: fmt::Debug, V, P> fmt::Debug for PredictiveParser<D, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictiveParser")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl<D, V, P> PredictiveParser<D, V, P>
where
    D: PredictiveDef,
{
    pub fn new(definition: D, actions: Actions<V, P>) -> Self {
        Self {
            definition,
            actions,
        }
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn parse<L>(
        &self,
        mut lexer: L,
        input: &str,
        params: &mut P,
    ) -> Result<Option<V>, ParseError>
    where
        L: Lexer<V>,
    {
        let mut ignore = |_: &SyntaxError| -> Result<(), ParseError> { Ok(()) };
        self.run(&mut lexer, input, params, &mut ignore)
    }

    pub fn parse_with<L, F>(
        &self,
        mut lexer: L,
        input: &str,
        params: &mut P,
        mut on_error: F,
    ) -> Result<Option<V>, ParseError>
    where
        L: Lexer<V>,
        F: FnMut(&SyntaxError) -> Result<(), ParseError>,
    {
        self.run(&mut lexer, input, params, &mut on_error)
    }

    fn run(
        &self,
        lexer: &mut dyn Lexer<V>,
        input: &str,
        params: &mut P,
        on_error: &mut dyn FnMut(&SyntaxError) -> Result<(), ParseError>,
    ) -> Result<Option<V>, ParseError> {
        let span = tracing::trace_span!("predictive_parse");
        let _enter = span.enter();

        lexer.set_input(input);
        let end = self.definition.end_of_input();
        let mut slots = vec![Slot::Expand(self.definition.start_symbol())];
        let mut values: Vec<Option<V>> = vec![None];
        let mut locations = vec![Location::default()];
        let mut lookahead: Option<(Option<D::Terminal>, Option<Token<V>>)> = None;
        // open expansions since the last consumed token, with the depth of
        // their reduce slots.
        let mut pending: Vec<(D::Nonterminal, usize)> = vec![];

        while let Some(slot) = slots.pop() {
            let (terminal, token) = match lookahead.take() {
                Some(la) => la,
                None => match lexer.next_token()? {
                    Some(token) => (self.definition.terminal(&token.name), Some(token)),
                    None => (Some(end), None),
                },
            };

            match slot {
                Slot::Match(expected) if terminal == Some(expected) => {
                    tracing::trace!("match {:?}", expected);
                    match token {
                        Some(token) => {
                            pending.clear();
                            values.push(Some(token.value));
                            locations.push(token.location);
                        }
                        None => {
                            // the end marker is matched without consuming it.
                            values.push(None);
                            locations.push(locations.last().copied().unwrap_or_default());
                            lookahead = Some((terminal, None));
                        }
                    }
                }

                Slot::Expand(symbol) => {
                    let predicted = terminal.and_then(|t| self.definition.predict(symbol, t));
                    let Some(production) = predicted else {
                        let err = self.syntax_error(
                            self.definition.expected_terminals(symbol),
                            token.as_ref(),
                            &locations,
                        );
                        on_error(&err)?;
                        return Err(ParseError::Syntax(Box::new(err)));
                    };
                    tracing::trace!("expand {:?} by {:?}", symbol, production);
                    if pending.iter().any(|&(open, _)| open == symbol) {
                        let name = self.definition.nonterminal_name(symbol);
                        return Err(ParseError::LeftRecursion(name.to_owned()));
                    }
                    pending.push((symbol, slots.len()));
                    slots.push(Slot::Reduce(production));
                    for symbol in self.definition.right(production).into_iter().rev() {
                        slots.push(match symbol {
                            PredictSymbol::T(t) => Slot::Match(t),
                            PredictSymbol::N(n) => Slot::Expand(n),
                        });
                    }
                    lookahead = Some((terminal, token));
                }

                Slot::Reduce(production) => {
                    pending.retain(|&(_, depth)| depth < slots.len());
                    lookahead = Some((terminal, token));
                    let info = self.definition.production(production);
                    let split = values
                        .len()
                        .checked_sub(info.len)
                        .ok_or(ParseError::EmptyStack)?;
                    let mut rhs = values.split_off(split);
                    let rhs_locations = locations.split_off(split);
                    let location = match (rhs_locations.first(), rhs_locations.last()) {
                        (Some(first), Some(last)) => first.merge(last),
                        _ => locations.last().copied().unwrap_or_default(),
                    };
                    let mut ctx = ActionContext {
                        production: info.index,
                        values: &mut rhs,
                        locations: &rhs_locations,
                        below: &values,
                        below_locations: &locations,
                        aliases: info.aliases,
                        location,
                        params: &mut *params,
                        parser: self,
                    };
                    let value = match self.actions.run(&mut ctx) {
                        Ok(value) => value,
                        Err(Control::Accept(value)) => return Ok(value),
                        Err(_) => return Err(ParseError::Aborted),
                    };
                    let location = ctx.location;
                    values.push(value);
                    locations.push(location);
                }

                Slot::Match(expected) => {
                    let err = self.syntax_error(vec![expected], token.as_ref(), &locations);
                    on_error(&err)?;
                    return Err(ParseError::Syntax(Box::new(err)));
                }
            }
        }

        Ok(values.pop().flatten())
    }

    fn syntax_error(
        &self,
        expected: Vec<D::Terminal>,
        token: Option<&Token<V>>,
        locations: &[Location],
    ) -> SyntaxError {
        let expected: Vec<String> = expected
            .into_iter()
            .map(|t| format!("'{}'", self.definition.terminal_name(t)))
            .collect();
        let location = match token {
            Some(token) => token.location,
            None => locations.last().copied().unwrap_or_default(),
        };
        let line = location.first_line;
        let message = match token {
            Some(token) => format!(
                "Parse error on line {}: Expecting {}, got '{}'",
                line,
                expected.join(", "),
                token.name
            ),
            None => format!("Parse error on line {}: Unexpected end of input", line),
        };
        SyntaxError {
            message,
            text: token.map_or_else(String::new, |t| t.text.clone()),
            token: token.map_or_else(|| "$end".to_owned(), |t| t.name.to_string()),
            line,
            location,
            expected,
            recoverable: false,
        }
    }
}

impl<D, V, P> Parse<V, P> for PredictiveParser<D, V, P>
where
    D: PredictiveDef,
{
    fn parse_input(
        &self,
        lexer: &mut dyn Lexer<V>,
        input: &str,
        params: &mut P,
    ) -> Result<Option<V>, ParseError> {
        self.parse(lexer, input, params)
    }
}
