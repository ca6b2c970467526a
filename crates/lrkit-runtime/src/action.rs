//! Semantic actions bound to production rules.

use crate::{
    definition::{resolve_alias, Alias},
    lexer::{Lexer, Location},
    parser::ParseError,
};
use std::{fmt, sync::Arc};

/// What the engine does after a semantic action returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Control<V> {
    /// Keep the default result, `$$ = $1`.
    Default,
    /// Use the given value as `$$`.
    Value(V),
    /// Stop parsing and succeed with the given value.
    Accept(Option<V>),
    /// Stop parsing and fail with [`ParseError::Aborted`].
    Abort,
}

/// Something that can parse an input string, used for nested parses from
/// inside a semantic action.
pub trait Parse<V, P> {
    fn parse_input(
        &self,
        lexer: &mut dyn Lexer<V>,
        input: &str,
        params: &mut P,
    ) -> Result<Option<V>, ParseError>;
}

/// The view of the parse stack given to a semantic action.
pub struct ActionContext<'a, V, P> {
    pub(crate) production: usize,
    pub(crate) values: &'a mut [Option<V>],
    pub(crate) locations: &'a [Location],
    pub(crate) below: &'a [Option<V>],
    pub(crate) below_locations: &'a [Location],
    pub(crate) aliases: &'a [Alias],
    pub(crate) location: Location,
    pub(crate) params: &'a mut P,
    pub(crate) parser: &'a dyn Parse<V, P>,
}

impl<'a, V, P> ActionContext<'a, V, P> {
    /// The index of the production being reduced.
    pub fn production(&self) -> usize {
        self.production
    }

    /// The number of right-hand side symbols.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return `$i`.
    ///
    /// `1..=len()` address the right-hand side. `0` and negative positions
    /// address the frames still on the stack beneath the handle, so `$0` is
    /// the value directly preceding `$1`.
    pub fn get(&self, i: isize) -> Option<&V> {
        if i > 0 {
            self.values.get(i as usize - 1)?.as_ref()
        } else {
            let idx = self.below.len() as isize - 1 + i;
            if idx < 0 {
                return None;
            }
            self.below.get(idx as usize)?.as_ref()
        }
    }

    /// Move `$i` out of the handle.
    pub fn take(&mut self, i: usize) -> Option<V> {
        i.checked_sub(1)
            .and_then(|i| self.values.get_mut(i))
            .and_then(Option::take)
    }

    /// Return the value bound to an alias such as `$expr` or `$expr1`.
    pub fn named(&self, name: &str) -> Option<&V> {
        let pos = resolve_alias(self.aliases, name)?;
        self.get(pos as isize)
    }

    pub fn take_named(&mut self, name: &str) -> Option<V> {
        let pos = resolve_alias(self.aliases, name)?;
        self.take(pos)
    }

    /// Return `@i`, with the same addressing as [`get`](Self::get).
    pub fn location(&self, i: isize) -> Option<&Location> {
        if i > 0 {
            self.locations.get(i as usize - 1)
        } else {
            let idx = self.below_locations.len() as isize - 1 + i;
            if idx < 0 {
                return None;
            }
            self.below_locations.get(idx as usize)
        }
    }

    /// `@$`
    pub fn result_location(&self) -> &Location {
        &self.location
    }

    pub fn result_location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    pub fn params(&self) -> &P {
        &*self.params
    }

    pub fn params_mut(&mut self) -> &mut P {
        &mut *self.params
    }

    /// The parser running this action, for nested parses.
    pub fn parser(&self) -> &'a dyn Parse<V, P> {
        self.parser
    }

    /// Take `$1`, the value used when an action returns [`Control::Default`].
    pub(crate) fn default_value(&mut self) -> Option<V> {
        self.take(1)
    }
}

/// A semantic action.
pub type SemanticAction<V, P> =
    Arc<dyn Fn(&mut ActionContext<'_, V, P>) -> Control<V> + Send + Sync>;

/// The set of semantic actions, addressed by production index.
pub struct Actions<V, P = ()> {
    actions: Vec<Option<SemanticAction<V, P>>>,
}

impl<V, P> Default for Actions<V, P> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl<V, P> Clone for Actions<V, P> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}

impl<V, P> fmt::Debug for Actions<V, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.actions.iter().map(|a| a.is_some()))
            .finish()
    }
}

impl<V, P> Actions<V, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to the production with the given index, replacing any
    /// previous binding.
    pub fn bind<F>(&mut self, production: impl Into<usize>, action: F) -> &mut Self
    where
        F: Fn(&mut ActionContext<'_, V, P>) -> Control<V> + Send + Sync + 'static,
    {
        let index = production.into();
        if self.actions.len() <= index {
            self.actions.resize_with(index + 1, || None);
        }
        self.actions[index] = Some(Arc::new(action));
        self
    }

    /// Builder-style variant of [`bind`](Self::bind).
    pub fn with<F>(mut self, production: impl Into<usize>, action: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, V, P>) -> Control<V> + Send + Sync + 'static,
    {
        self.bind(production, action);
        self
    }

    pub fn get(&self, production: usize) -> Option<&SemanticAction<V, P>> {
        self.actions.get(production)?.as_ref()
    }

    /// Run the action of the given production, producing `$$`.
    ///
    /// Returns `Err(control)` for the signals that end the parse.
    pub(crate) fn run(
        &self,
        ctx: &mut ActionContext<'_, V, P>,
    ) -> Result<Option<V>, Control<V>> {
        let control = match self.get(ctx.production) {
            Some(action) => action(ctx),
            None => Control::Default,
        };
        match control {
            Control::Default => Ok(ctx.default_value()),
            Control::Value(v) => Ok(Some(v)),
            signal => Err(signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;
    impl Parse<i32, ()> for Nop {
        fn parse_input(
            &self,
            _: &mut dyn Lexer<i32>,
            _: &str,
            _: &mut (),
        ) -> Result<Option<i32>, ParseError> {
            Ok(None)
        }
    }

    #[test]
    fn positional_and_lookback() {
        let mut values = vec![Some(10), Some(20)];
        let locations = vec![Location::default(); 2];
        let below = vec![None, Some(1), Some(2)];
        let below_locations = vec![Location::default(); 3];
        let aliases = vec![Alias::new("a", 1), Alias::new("b", 2)];
        let mut params = ();
        let mut ctx = ActionContext {
            production: 3,
            values: &mut values,
            locations: &locations,
            below: &below,
            below_locations: &below_locations,
            aliases: &aliases,
            location: Location::default(),
            params: &mut params,
            parser: &Nop,
        };

        assert_eq!(ctx.get(1), Some(&10));
        assert_eq!(ctx.get(2), Some(&20));
        assert_eq!(ctx.get(3), None);
        assert_eq!(ctx.get(0), Some(&2));
        assert_eq!(ctx.get(-1), Some(&1));
        assert_eq!(ctx.get(-2), None);
        assert_eq!(ctx.get(-3), None);
        assert_eq!(ctx.named("b"), Some(&20));
        assert_eq!(ctx.take_named("a"), Some(10));
        assert_eq!(ctx.get(1), None);
        assert_eq!(ctx.take(0), None);
    }

    #[test]
    fn default_action_keeps_first_value() {
        let actions: Actions<i32> = Actions::new().with(1usize, |_| Control::Value(7));
        let mut values = vec![Some(1), Some(2)];
        let locations = vec![Location::default(); 2];
        let below = vec![None];
        let below_locations = vec![Location::default()];
        let mut params = ();
        let mut ctx = ActionContext {
            production: 2,
            values: &mut values,
            locations: &locations,
            below: &below,
            below_locations: &below_locations,
            aliases: &[],
            location: Location::default(),
            params: &mut params,
            parser: &Nop,
        };
        assert_eq!(actions.run(&mut ctx).ok(), Some(Some(1)));
        ctx.production = 1;
        assert_eq!(actions.run(&mut ctx).ok(), Some(Some(7)));
    }
}
