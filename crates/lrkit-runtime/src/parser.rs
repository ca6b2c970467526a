//! The shift-reduce parser engine.

use crate::{
    action::{ActionContext, Actions, Control, Parse},
    definition::{ParseAction, ParserDef},
    lexer::{LexError, Lexer, Location, Token},
};
use std::fmt;

/// Real tokens to shift after a recovery before errors are reported again.
const RECOVERY_SHIFTS: usize = 3;

/// The parser driven based on the generated parse table.
///
/// A `Parser` holds no per-parse state, so one instance can serve any number
/// of concurrent or nested `parse` calls.
pub struct Parser<D, V, P = ()> {
    definition: D,
    actions: Actions<V, P>,
}

impl<D: fmt::Debug, V, P> fmt::Debug for Parser<D, V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("definition", &self.definition)
            .field("actions", &self.actions)
            .finish()
    }
}

impl<D, V, P> Parser<D, V, P>
where
    D: ParserDef,
{
    /// Create an instance of `Parser` using the specified parse table.
    pub fn new(definition: D, actions: Actions<V, P>) -> Self {
        Self {
            definition,
            actions,
        }
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    pub fn actions(&self) -> &Actions<V, P> {
        &self.actions
    }

    /// Parse `input`, returning the semantic value of the start symbol.
    ///
    /// Recoverable syntax errors are logged and recovered from silently.
    pub fn parse<L>(
        &self,
        mut lexer: L,
        input: &str,
        params: &mut P,
    ) -> Result<Option<V>, ParseError>
    where
        L: Lexer<V>,
    {
        let mut log = |err: &SyntaxError| -> Result<(), ParseError> {
            tracing::debug!("{}", err.message);
            Ok(())
        };
        self.run(&mut lexer, input, params, &mut log)
    }

    /// Parse `input`, reporting each syntax error to `on_error` first.
    ///
    /// Returning `Err` from the callback ends the parse with that error.
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
        let span = tracing::trace_span!("parse");
        let _enter = span.enter();

        lexer.set_input(input);
        let mut stack = ParseStack::new(self.definition.initial_state());
        let mut lookahead: Option<Lookahead<D::Terminal, V>> = None;
        let mut recovering = 0usize;

        loop {
            let current = stack.current()?;
            // a state with a single reduction does not consult the lookahead.
            if let Some(reduce) = self.definition.default_reduce(current) {
                tracing::trace!("state={:?}, default reduce", current);
                if let Some(value) = self.reduce(&mut stack, reduce, params)? {
                    return Ok(value);
                }
                continue;
            }

            let mut la = match lookahead.take() {
                Some(la) => la,
                None => self.read(lexer, &stack)?,
            };
            let action = self.action_for(current, &la);
            tracing::trace!(
                "state={:?}, lookahead={}, action={:?}",
                current,
                la.name(),
                action
            );

            match action {
                ParseAction::Shift(next) => {
                    let value = la.token.map(|token| token.value);
                    stack.push(next, value, la.location);
                    recovering = recovering.saturating_sub(1);
                }

                ParseAction::Reduce(reduce) => {
                    lookahead = Some(la);
                    if let Some(value) = self.reduce(&mut stack, reduce, params)? {
                        return Ok(value);
                    }
                }

                ParseAction::Accept => {
                    tracing::trace!("accept");
                    return Ok(stack.values.pop().flatten());
                }

                ParseAction::Error => {
                    let err = self.syntax_error(current, &la, &stack);
                    if recovering == 0 {
                        on_error(&err)?;
                        if !err.recoverable {
                            return Err(ParseError::Syntax(Box::new(err)));
                        }
                    } else if recovering == RECOVERY_SHIFTS {
                        // no real token was shifted since the last recovery.
                        if la.is_end() {
                            return Err(ParseError::RecoveryHalted(Box::new(err)));
                        }
                        tracing::trace!("discard {}", la.name());
                        la = self.read(lexer, &stack)?;
                    }

                    if !self.recover(&mut stack, la.location) {
                        return Err(ParseError::Syntax(Box::new(err)));
                    }
                    recovering = RECOVERY_SHIFTS;

                    // discard tokens the recovered state cannot handle.
                    loop {
                        let current = stack.current()?;
                        if self.definition.default_reduce(current).is_some()
                            || !matches!(self.action_for(current, &la), ParseAction::Error)
                        {
                            break;
                        }
                        if la.is_end() {
                            let err = self.syntax_error(current, &la, &stack);
                            return Err(ParseError::RecoveryHalted(Box::new(err)));
                        }
                        tracing::trace!("discard {}", la.name());
                        la = self.read(lexer, &stack)?;
                    }
                    lookahead = Some(la);
                }
            }
        }
    }

    fn read(
        &self,
        lexer: &mut dyn Lexer<V>,
        stack: &ParseStack<D::State, V>,
    ) -> Result<Lookahead<D::Terminal, V>, ParseError> {
        Ok(match lexer.next_token()? {
            Some(token) => Lookahead {
                terminal: self.definition.terminal(&token.name),
                location: token.location,
                token: Some(token),
            },
            None => {
                let last = stack.locations.last().copied().unwrap_or_default();
                Lookahead {
                    terminal: Some(self.definition.end_of_input()),
                    location: Location::new(
                        last.last_line,
                        last.last_column,
                        last.last_line,
                        last.last_column,
                    ),
                    token: None,
                }
            }
        })
    }

    fn action_for(
        &self,
        current: D::State,
        la: &Lookahead<D::Terminal, V>,
    ) -> ParseAction<D::State, D::Reduce> {
        match la.terminal {
            Some(t) => self.definition.action(current, t),
            None => ParseAction::Error,
        }
    }

    /// Reduce the handle on top of the stack.
    ///
    /// Returns `Some(result)` when the action ended the parse.
    fn reduce(
        &self,
        stack: &mut ParseStack<D::State, V>,
        reduce: D::Reduce,
        params: &mut P,
    ) -> Result<Option<Option<V>>, ParseError> {
        let production = self.definition.production(reduce);
        let n = production.len;
        if stack.states.len() <= n {
            return Err(ParseError::EmptyStack);
        }

        let split = stack.values.len() - n;
        let mut values = stack.values.split_off(split);
        let locations = stack.locations.split_off(split);
        stack.states.truncate(stack.states.len() - n);

        let location = match (locations.first(), locations.last()) {
            (Some(first), Some(last)) => first.merge(last),
            _ => stack.locations.last().copied().unwrap_or_default(),
        };

        let mut ctx = ActionContext {
            production: production.index,
            values: &mut values,
            locations: &locations,
            below: &stack.values,
            below_locations: &stack.locations,
            aliases: production.aliases,
            location,
            params,
            parser: self,
        };
        let value = match self.actions.run(&mut ctx) {
            Ok(value) => value,
            Err(Control::Accept(value)) => {
                tracing::trace!("accepted by action of production {}", production.index);
                return Ok(Some(value));
            }
            Err(_) => {
                tracing::trace!("aborted by action of production {}", production.index);
                return Err(ParseError::Aborted);
            }
        };
        let location = ctx.location;

        let current = stack.current()?;
        let next = self
            .definition
            .goto(current, production.lhs)
            .ok_or(ParseError::MissingGoto)?;
        tracing::trace!("reduce by {} -> goto {:?}", production.index, next);
        stack.push(next, value, location);

        Ok(None)
    }

    /// Pop the stack down to the nearest state that shifts `error`, then
    /// shift it.
    fn recover(&self, stack: &mut ParseStack<D::State, V>, location: Location) -> bool {
        let error = self.definition.error_token();
        for depth in (0..stack.states.len()).rev() {
            if let ParseAction::Shift(next) = self.definition.action(stack.states[depth], error) {
                tracing::trace!("recover at depth {} -> {:?}", depth, next);
                stack.truncate(depth + 1);
                stack.push(next, None, location);
                return true;
            }
        }
        false
    }

    fn find_error_state(&self, stack: &ParseStack<D::State, V>) -> bool {
        let error = self.definition.error_token();
        stack
            .states
            .iter()
            .any(|&s| matches!(self.definition.action(s, error), ParseAction::Shift(..)))
    }

    fn syntax_error(
        &self,
        current: D::State,
        la: &Lookahead<D::Terminal, V>,
        stack: &ParseStack<D::State, V>,
    ) -> SyntaxError {
        let expected: Vec<String> = self
            .definition
            .expected_terminals(current)
            .into_iter()
            .map(|t| format!("'{}'", self.definition.terminal_name(t)))
            .collect();
        let line = la.location.first_line;
        let message = if la.is_end() {
            format!("Parse error on line {}: Unexpected end of input", line)
        } else {
            format!(
                "Parse error on line {}: Expecting {}, got '{}'",
                line,
                expected.join(", "),
                la.name()
            )
        };
        SyntaxError {
            message,
            text: la.token.as_ref().map_or_else(String::new, |t| t.text.clone()),
            token: la.name().to_owned(),
            line,
            location: la.location,
            expected,
            recoverable: self.find_error_state(stack),
        }
    }
}

impl<D, V, P> Parse<V, P> for Parser<D, V, P>
where
    D: ParserDef,
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

struct Lookahead<T, V> {
    terminal: Option<T>,
    location: Location,
    /// `None` at the end of input.
    token: Option<Token<V>>,
}

impl<T, V> Lookahead<T, V> {
    fn is_end(&self) -> bool {
        self.token.is_none()
    }

    fn name(&self) -> &str {
        self.token.as_ref().map_or("$end", |t| t.name.as_ref())
    }
}

/// The per-call stack of states, semantic values and locations.
///
/// The value and location stacks start with a sentinel frame matching the
/// initial state.
pub(crate) struct ParseStack<S, V> {
    pub(crate) states: Vec<S>,
    pub(crate) values: Vec<Option<V>>,
    pub(crate) locations: Vec<Location>,
}

impl<S: Copy, V> ParseStack<S, V> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            states: vec![initial],
            values: vec![None],
            locations: vec![Location::default()],
        }
    }

    pub(crate) fn current(&self) -> Result<S, ParseError> {
        self.states.last().copied().ok_or(ParseError::EmptyStack)
    }

    pub(crate) fn push(&mut self, state: S, value: Option<V>, location: Location) {
        self.states.push(state);
        self.values.push(value);
        self.locations.push(location);
    }

    fn truncate(&mut self, len: usize) {
        self.states.truncate(len);
        self.values.truncate(len);
        self.locations.truncate(len);
    }
}

/// The details of a syntax error, passed to the error callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// The source text of the offending token.
    pub text: String,
    /// The terminal name of the offending token, `$end` at the end of input.
    pub token: String,
    pub line: usize,
    pub location: Location,
    /// The quoted names of the terminals acceptable in the failing state.
    pub expected: Vec<String>,
    /// Whether some state on the stack can shift `error`.
    pub recoverable: bool,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{}", _0)]
    Syntax(Box<SyntaxError>),

    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("parse aborted by semantic action")]
    Aborted,

    #[error("Parsing halted while starting to recover from another error: {}", _0)]
    RecoveryHalted(Box<SyntaxError>),

    #[error("missing goto entry in parse table")]
    MissingGoto,

    #[error("empty parse stack")]
    EmptyStack,

    #[error("left recursion on `{}' without consuming input", _0)]
    LeftRecursion(String),
}

impl ParseError {
    /// Return the syntax error details, if this is a syntax error.
    pub fn syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::Syntax(err) | Self::RecoveryHalted(err) => Some(err),
            _ => None,
        }
    }
}
