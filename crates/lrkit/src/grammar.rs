//! Context-free grammars.

use crate::{
    first_sets::FirstSets,
    util::{display_fn, Map, Set},
};
use lrkit_runtime::Alias;
use std::{collections::VecDeque, fmt};

/// The name of the augmented start symbol.
pub const ACCEPT_NAME: &str = "$accept";
/// The name of the end-of-input terminal.
pub const EOI_NAME: &str = "$end";
/// The name of the reserved error token.
pub const ERROR_NAME: &str = "error";

// ==== Symbols =====

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID(u16);
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self(0);

    /// Reserved symbol used as an error token.
    pub const ERROR: Self = Self(1);

    const OFFSET: u16 = 2;

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for TerminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EOI => write!(f, "T#End"),
            Self::ERROR => write!(f, "T#Error"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID(u16);
impl NonterminalID {
    /// The augmented start symbol, `$accept`.
    pub const ACCEPT: Self = Self(0);

    const OFFSET: u16 = 1;

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for NonterminalID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ACCEPT => write!(f, "N#Accept"),
            _ => write!(f, "N#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}
impl fmt::Debug for SymbolID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => fmt::Debug::fmt(t, f),
            Self::N(n) => fmt::Debug::fmt(n, f),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID(u16);
impl ProductionID {
    /// The augmented production `$accept -> S $end`.
    pub const ACCEPT: Self = Self(0);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
impl fmt::Debug for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ACCEPT => write!(f, "P#Accept"),
            _ => write!(f, "P#{:03}", self.0),
        }
    }
}
impl From<ProductionID> for usize {
    fn from(id: ProductionID) -> Self {
        id.index()
    }
}

/// A set of terminal symbols.
#[derive(Debug, Default, Clone)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}
impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.index())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.index())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    /// Add the elements of `other`, returning whether `self` grew.
    pub fn extend_from(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }
    pub fn is_subset(&self, other: &Self) -> bool {
        self.inner.is_subset(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| TerminalID(raw as u16))
    }
}
impl PartialEq for TerminalSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}
impl Eq for TerminalSet {}
impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(TerminalID::index).collect(),
        }
    }
}
impl crate::digraph::Set for TerminalSet {
    fn union_with(&mut self, other: &Self) {
        self.union_with(other)
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
    precedence: Option<Precedence>,
}
impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn precedence(&self) -> Option<Precedence> {
        self.precedence
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}
impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    precedence: Option<Precedence>,
    aliases: Vec<Alias>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return the names bound to positions in the right-hand side.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases[..]
    }

    /// The precedence of this production: the explicitly assigned one, or
    /// that of the rightmost terminal of the right-hand side.
    pub fn precedence(&self, g: &Grammar) -> Option<Precedence> {
        match self.precedence {
            Some(prec) => Some(prec),
            None => {
                for symbol in self.right.iter().rev() {
                    if let SymbolID::T(t) = symbol {
                        return g.terminals[t].precedence();
                    }
                }
                None
            }
        }
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                f.write_str(" ε")?;
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Precedence {
    pub priority: u16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn new(priority: u16, assoc: Assoc) -> Self {
        Self { priority, assoc }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Nonassoc => write!(f, "nonassoc"),
        }
    }
}

// ==== Grammar =====

/// The grammar definition used to derive the parser tables.
///
/// The nullable, first and follow sets are computed once the definition is
/// complete, so every `Grammar` value is ready for automaton construction.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub productions: Map<ProductionID, Production>,
    pub start_symbol: NonterminalID,
    first_sets: FirstSets,
}

impl Grammar {
    pub fn define<F>(f: F) -> Result<Self, GrammarError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarError>,
    {
        let mut def = GrammarDef::default();
        f(&mut def)?;
        def.end()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    /// Iterate the productions whose left-hand side is `n`.
    pub fn productions_of(&self, n: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values().filter(move |p| p.left == n)
    }

    pub fn terminal_by_name(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|t| t.name == name)
            .map(Terminal::id)
    }

    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .values()
            .find(|n| n.name == name)
            .map(Nonterminal::id)
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => &self.terminals[&t].name,
            SymbolID::N(n) => &self.nonterminals[&n].name,
        }
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn is_nullable(&self, n: NonterminalID) -> bool {
        self.first_sets.is_nullable(n)
    }

    pub fn first(&self, n: NonterminalID) -> &TerminalSet {
        self.first_sets.first(n)
    }

    pub fn follow(&self, n: NonterminalID) -> &TerminalSet {
        self.first_sets.follow(n)
    }

    /// `First(symbols)`, and whether the whole sequence is nullable.
    pub fn first_of(&self, symbols: &[SymbolID]) -> (TerminalSet, bool) {
        self.first_sets.first_of(symbols)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#### terminals: ")?;
        for (i, t) in self.terminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", t)?;
            if let Some(prec) = t.precedence {
                write!(f, "({}, {})", prec.assoc, prec.priority)?;
            }
        }
        write!(f, "\n#### nonterminals: ")?;
        for (i, n) in self.nonterminals.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", n)?;
        }
        writeln!(f, "\n#### productions:")?;
        for p in self.productions.values() {
            writeln!(f, "- {}", p.display(self))?;
        }
        Ok(())
    }
}

// ==== GrammarDef =====

/// The contextural values for building a `Grammar`.
///
/// Symbols are referred to by name. A right-hand side entry may carry an
/// alias, as in `expr[lhs]`.
#[derive(Debug, Default)]
pub struct GrammarDef {
    tokens: Set<String>,
    precedences: Map<String, Precedence>,
    next_priority: u16,
    rules: Vec<RuleDef>,
    start: Option<String>,
}

#[derive(Debug)]
struct RuleDef {
    left: String,
    right: Vec<RightSymbol>,
    precedence: Option<String>,
}

#[derive(Debug)]
struct RightSymbol {
    name: String,
    alias: Option<String>,
}

impl RightSymbol {
    fn parse(s: &str) -> Self {
        match s.strip_suffix(']').and_then(|s| s.split_once('[')) {
            Some((name, alias)) if !name.is_empty() && !alias.is_empty() => Self {
                name: name.to_owned(),
                alias: Some(alias.to_owned()),
            },
            _ => Self {
                name: s.to_owned(),
                alias: None,
            },
        }
    }
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    ///
    /// Once any terminal is declared, every symbol that appears in a
    /// right-hand side must be either declared or defined by a rule.
    pub fn token(&mut self, name: &str) -> Result<(), GrammarError> {
        check_reserved(name)?;
        if name != ERROR_NAME {
            self.tokens.insert(name.to_owned());
        }
        Ok(())
    }

    pub fn tokens<I, S>(&mut self, names: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.token(name.as_ref())?;
        }
        Ok(())
    }

    /// Declare a precedence level shared by `names`.
    ///
    /// Each call opens a new level that binds tighter than the previous ones.
    pub fn precedence<I, S>(&mut self, assoc: Assoc, names: I) -> Result<(), GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.next_priority = self
            .next_priority
            .checked_add(1)
            .ok_or(GrammarError::TooManySymbols)?;
        let prec = Precedence::new(self.next_priority, assoc);
        for name in names {
            let name = name.as_ref();
            check_reserved(name)?;
            self.precedences.insert(name.to_owned(), prec);
        }
        Ok(())
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, name: &str) -> Result<(), GrammarError> {
        self.start.replace(name.to_owned());
        Ok(())
    }

    /// Specify a production rule into this grammar.
    pub fn rule<I, S>(&mut self, left: &str, right: I) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_rule(left, right, None)
    }

    /// Specify a production rule whose precedence is taken from `precedence`
    /// rather than from its rightmost terminal.
    pub fn rule_with_prec<I, S>(
        &mut self,
        left: &str,
        right: I,
        precedence: &str,
    ) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_rule(left, right, Some(precedence))
    }

    fn add_rule<I, S>(
        &mut self,
        left: &str,
        right: I,
        precedence: Option<&str>,
    ) -> Result<ProductionID, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_reserved(left)?;
        if left == ERROR_NAME {
            return Err(GrammarError::ReservedName(left.to_owned()));
        }
        let right: Vec<_> = right
            .into_iter()
            .map(|s| RightSymbol::parse(s.as_ref()))
            .collect();
        if u16::try_from(right.len()).is_err() {
            return Err(GrammarError::TooManySymbols);
        }
        let id = ProductionID(id_from_index(self.rules.len(), 1)?);

        for rule in &self.rules {
            if rule.left == left
                && rule.right.len() == right.len()
                && rule.right.iter().zip(&right).all(|(a, b)| a.name == b.name)
            {
                return Err(GrammarError::DuplicateProduction(left.to_owned()));
            }
        }

        self.rules.push(RuleDef {
            left: left.to_owned(),
            right,
            precedence: precedence.map(ToOwned::to_owned),
        });
        Ok(id)
    }

    fn end(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        // nonterminals are the symbols defined by some rule, in order of appearance.
        let mut nonterminal_names: Set<&str> = Set::default();
        for rule in &self.rules {
            nonterminal_names.insert(&rule.left);
        }

        let explicit = !self.tokens.is_empty();
        let mut terminal_names: Set<&str> = Set::default();
        for token in &self.tokens {
            if nonterminal_names.contains(token.as_str()) {
                tracing::warn!("token `{}' is defined by a rule, treated as a nonterminal", token);
                continue;
            }
            terminal_names.insert(token);
        }
        for rule in &self.rules {
            for symbol in &rule.right {
                let name = symbol.name.as_str();
                if name == ERROR_NAME || nonterminal_names.contains(name) {
                    continue;
                }
                check_reserved(name)?;
                if explicit {
                    if !terminal_names.contains(name) {
                        return Err(GrammarError::UndefinedSymbol {
                            symbol: name.to_owned(),
                            rule: rule.left.clone(),
                        });
                    }
                } else {
                    terminal_names.insert(name);
                }
            }
        }

        let start_name = match &self.start {
            Some(start) => start.as_str(),
            None => self.rules[0].left.as_str(),
        };
        if start_name == ERROR_NAME || terminal_names.contains(start_name) {
            return Err(GrammarError::TerminalAsStart(start_name.to_owned()));
        }
        let Some(start_index) = nonterminal_names.get_index_of(start_name) else {
            return Err(GrammarError::UnknownStartSymbol(start_name.to_owned()));
        };
        let start_symbol = NonterminalID(id_from_index(start_index, NonterminalID::OFFSET)?);

        let mut terminals = Map::default();
        for (id, name) in [(TerminalID::EOI, EOI_NAME), (TerminalID::ERROR, ERROR_NAME)] {
            terminals.insert(
                id,
                Terminal {
                    id,
                    name: name.to_owned(),
                    precedence: None,
                },
            );
        }
        for (i, name) in terminal_names.iter().enumerate() {
            let id = TerminalID(id_from_index(i, TerminalID::OFFSET)?);
            terminals.insert(
                id,
                Terminal {
                    id,
                    name: (*name).to_owned(),
                    precedence: self.precedences.get(*name).copied(),
                },
            );
        }

        let mut nonterminals = Map::default();
        nonterminals.insert(
            NonterminalID::ACCEPT,
            Nonterminal {
                id: NonterminalID::ACCEPT,
                name: ACCEPT_NAME.to_owned(),
            },
        );
        for (i, name) in nonterminal_names.iter().enumerate() {
            let id = NonterminalID(id_from_index(i, NonterminalID::OFFSET)?);
            nonterminals.insert(
                id,
                Nonterminal {
                    id,
                    name: (*name).to_owned(),
                },
            );
        }

        let resolve = |name: &str| -> Result<SymbolID, GrammarError> {
            if let Some(i) = nonterminal_names.get_index_of(name) {
                Ok(SymbolID::N(NonterminalID(id_from_index(
                    i,
                    NonterminalID::OFFSET,
                )?)))
            } else if name == ERROR_NAME {
                Ok(SymbolID::T(TerminalID::ERROR))
            } else {
                // every other name was checked above.
                let i = terminal_names.get_index_of(name).unwrap_or_default();
                Ok(SymbolID::T(TerminalID(id_from_index(i, TerminalID::OFFSET)?)))
            }
        };

        let mut productions = Map::default();
        productions.insert(
            ProductionID::ACCEPT,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::ACCEPT,
                right: vec![SymbolID::N(start_symbol), SymbolID::T(TerminalID::EOI)],
                precedence: None,
                aliases: vec![],
            },
        );
        for (i, rule) in self.rules.iter().enumerate() {
            let id = ProductionID(id_from_index(i, 1)?);
            // every rule head was registered as a nonterminal above.
            let left_index = nonterminal_names
                .get_index_of(rule.left.as_str())
                .unwrap_or_default();
            let left = NonterminalID(id_from_index(left_index, NonterminalID::OFFSET)?);
            let precedence = match &rule.precedence {
                Some(name) => Some(
                    self.precedences
                        .get(name)
                        .copied()
                        .ok_or_else(|| GrammarError::UnknownPrecedence(name.clone()))?,
                ),
                None => None,
            };
            productions.insert(
                id,
                Production {
                    id,
                    left,
                    right: rule
                        .right
                        .iter()
                        .map(|s| resolve(&s.name))
                        .collect::<Result<_, _>>()?,
                    precedence,
                    aliases: aliases(&rule.right),
                },
            );
        }

        check_reachability(&nonterminals, &productions, start_symbol)?;

        let first_sets = FirstSets::new(nonterminals.keys().copied(), &productions, start_symbol);

        Ok(Grammar {
            terminals,
            nonterminals,
            productions,
            start_symbol,
            first_sets,
        })
    }
}

/// Shift a registration index into the 16-bit identifier space.
fn id_from_index(index: usize, offset: u16) -> Result<u16, GrammarError> {
    u16::try_from(index)
        .ok()
        .and_then(|raw| raw.checked_add(offset))
        .ok_or(GrammarError::TooManySymbols)
}

fn check_reserved(name: &str) -> Result<(), GrammarError> {
    if name == ACCEPT_NAME || name == EOI_NAME || name.is_empty() {
        return Err(GrammarError::ReservedName(name.to_owned()));
    }
    Ok(())
}

/// Bind names to right-hand side positions.
///
/// Each position is reachable by its alias (or symbol name) and by the
/// numbered form of it; a repeated name gets `name1`, `name2`, ... in order.
fn aliases(right: &[RightSymbol]) -> Vec<Alias> {
    let mut aliases = vec![];
    let mut counts: Map<&str, usize> = Map::default();
    for (i, symbol) in right.iter().enumerate() {
        let name = symbol.alias.as_deref().unwrap_or(&symbol.name);
        let count = counts.entry(name).or_insert(0);
        *count += 1;
        if *count == 1 {
            aliases.push(Alias::new(name, i + 1));
        }
        aliases.push(Alias::new(format!("{}{}", name, count), i + 1));
    }
    aliases
}

fn check_reachability(
    nonterminals: &Map<NonterminalID, Nonterminal>,
    productions: &Map<ProductionID, Production>,
    start: NonterminalID,
) -> Result<(), GrammarError> {
    let mut reached: Set<NonterminalID> = Set::default();
    reached.insert(NonterminalID::ACCEPT);
    reached.insert(start);
    let mut queue = VecDeque::from([start]);
    while let Some(n) = queue.pop_front() {
        for p in productions.values().filter(|p| p.left == n) {
            for symbol in &p.right {
                if let SymbolID::N(next) = symbol {
                    if reached.insert(*next) {
                        queue.push_back(*next);
                    }
                }
            }
        }
    }

    match nonterminals.values().find(|n| !reached.contains(&n.id)) {
        Some(n) => Err(GrammarError::UnreachableNonterminal(n.name.clone())),
        None => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("undefined symbol `{symbol}' in a production of `{rule}'")]
    UndefinedSymbol { symbol: String, rule: String },

    #[error("the terminal `{}' cannot be the start symbol", _0)]
    TerminalAsStart(String),

    #[error("the start symbol `{}' is not defined by any rule", _0)]
    UnknownStartSymbol(String),

    #[error("the nonterminal `{}' is unreachable from the start symbol", _0)]
    UnreachableNonterminal(String),

    #[error("duplicate production rule for `{}'", _0)]
    DuplicateProduction(String),

    #[error("the grammar has no production rules")]
    EmptyGrammar,

    #[error("unknown precedence `{}'", _0)]
    UnknownPrecedence(String),

    #[error("`{}' is a reserved name", _0)]
    ReservedName(String),

    #[error("the grammar exceeds the 16-bit identifier space")]
    TooManySymbols,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_terminals() {
        let g = Grammar::define(|g| {
            g.rule("A", ["x", "A"])?;
            g.rule("A", [] as [&str; 0])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(g.terminals.len(), 3);
        assert!(g.terminal_by_name("x").is_some());
        assert_eq!(g.nonterminal_by_name("A"), Some(g.start_symbol));
        assert_eq!(g.productions.len(), 3);
        assert_eq!(
            g.production(ProductionID::ACCEPT).right(),
            &[SymbolID::N(g.start_symbol), SymbolID::T(TerminalID::EOI)]
        );
    }

    #[test]
    fn explicit_tokens_reject_undefined_symbols() {
        let err = Grammar::define(|g| {
            g.token("x")?;
            g.rule("A", ["x", "y"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            GrammarError::UndefinedSymbol { ref symbol, .. } if symbol == "y"
        ));
    }

    #[test]
    fn start_symbol_errors() {
        let err = Grammar::define(|g| {
            g.start_symbol("x")?;
            g.rule("A", ["x"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::TerminalAsStart(..)));

        let err = Grammar::define(|g| {
            g.start_symbol("B")?;
            g.rule("A", ["x"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::UnknownStartSymbol(..)));
    }

    #[test]
    fn unreachable_and_duplicates() {
        let err = Grammar::define(|g| {
            g.rule("A", ["x"])?;
            g.rule("B", ["y"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::UnreachableNonterminal(ref n) if n == "B"));

        let err = Grammar::define(|g| {
            g.rule("A", ["x[a]"])?;
            g.rule("A", ["x"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateProduction(..)));

        let err = Grammar::define(|g| {
            g.rule("A", ["$end"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::ReservedName(..)));
    }

    #[test]
    fn precedence_levels() {
        let g = Grammar::define(|g| {
            g.precedence(Assoc::Left, ["+", "-"])?;
            g.precedence(Assoc::Left, ["*"])?;
            g.precedence(Assoc::Right, ["UMINUS"])?;
            g.rule("e", ["e", "+", "e"])?;
            g.rule("e", ["e", "*", "e"])?;
            g.rule_with_prec("e", ["-", "e"], "UMINUS")?;
            g.rule("e", ["x"])?;
            Ok(())
        })
        .unwrap();
        let plus = &g.terminals[&g.terminal_by_name("+").unwrap()];
        let star = &g.terminals[&g.terminal_by_name("*").unwrap()];
        assert!(star.precedence().unwrap().priority > plus.precedence().unwrap().priority);
        let neg = g.productions.values().nth(3).unwrap();
        assert_eq!(neg.precedence(&g).unwrap().assoc, Assoc::Right);
        let add = g.productions.values().nth(1).unwrap();
        assert_eq!(add.precedence(&g), plus.precedence());
        let atom = g.productions.values().nth(4).unwrap();
        assert_eq!(atom.precedence(&g), None);

        let err = Grammar::define(|g| {
            g.rule_with_prec("e", ["x"], "NOPE")?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::UnknownPrecedence(..)));
    }

    #[test]
    fn alias_names() {
        let g = Grammar::define(|g| {
            g.rule("e", ["e", "+", "e[rhs]"])?;
            g.rule("e", ["x", "x", "x"])?;
            Ok(())
        })
        .unwrap();
        let add = g.production(ProductionID(1));
        let find = |p: &Production, name: &str| {
            lrkit_runtime::definition::resolve_alias(p.aliases(), name)
        };
        assert_eq!(find(add, "e"), Some(1));
        assert_eq!(find(add, "e1"), Some(1));
        assert_eq!(find(add, "rhs"), Some(3));
        assert_eq!(find(add, "e2"), None);
        let xs = g.production(ProductionID(2));
        assert_eq!(find(xs, "x"), Some(1));
        assert_eq!(find(xs, "x2"), Some(2));
        assert_eq!(find(xs, "x3"), Some(3));
        assert_eq!(add.display(&g).to_string(), "e -> e + e");
    }

    #[test]
    fn identifiers_stay_in_range() {
        assert_eq!(id_from_index(0, TerminalID::OFFSET).unwrap(), 2);
        assert_eq!(id_from_index(65534, NonterminalID::OFFSET).unwrap(), 65535);
        assert!(matches!(
            id_from_index(65534, TerminalID::OFFSET),
            Err(GrammarError::TooManySymbols)
        ));
        assert!(matches!(
            id_from_index(70000, 0),
            Err(GrammarError::TooManySymbols)
        ));

        let err = Grammar::define(|g| {
            for _ in 0..=u16::MAX {
                g.precedence(Assoc::Left, [] as [&str; 0])?;
            }
            g.rule("e", ["x"])?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarError::TooManySymbols));
    }
}
