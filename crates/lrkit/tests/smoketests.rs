mod support;

use lrkit::{grammar::Grammar, Algorithm};

mod grammars {
    use lrkit::grammar::{GrammarDef, GrammarError};

    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("E", ["E", "+", "T"])?;
        g.rule("E", ["T"])?;
        g.rule("T", ["T", "*", "F"])?;
        g.rule("T", ["F"])?;
        g.rule("F", ["(", "E", ")"])?;
        g.rule("F", ["n"])?;
        Ok(())
    }

    pub fn assignment(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("S", ["L", "=", "R"])?;
        g.rule("S", ["R"])?;
        g.rule("L", ["*", "R"])?;
        g.rule("L", ["n"])?;
        g.rule("R", ["L"])?;
        Ok(())
    }

    pub fn nullable(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("A", ["x", "A"])?;
        g.rule("A", [] as [&str; 0])?;
        Ok(())
    }

    pub fn merge_sensitive(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("S", ["a", "A", "d"])?;
        g.rule("S", ["b", "B", "d"])?;
        g.rule("S", ["a", "B", "e"])?;
        g.rule("S", ["b", "A", "e"])?;
        g.rule("A", ["c"])?;
        g.rule("B", ["c"])?;
        Ok(())
    }

    pub fn ambiguous(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("e", ["e", "+", "e"])?;
        g.rule("e", ["n"])?;
        Ok(())
    }

    pub fn dangling_else(g: &mut GrammarDef) -> Result<(), GrammarError> {
        g.rule("s", ["i", "s"])?;
        g.rule("s", ["i", "s", "e", "s"])?;
        g.rule("s", ["x"])?;
        Ok(())
    }
}

/// `name => [LR(0), SLR, LALR, LR(1), LL(1)]` conflict counts.
macro_rules! define_tests {
    ($($name:ident => [$lr0:expr, $slr:expr, $lalr:expr, $lr1:expr, $ll:expr]),*$(,)?) => {$(
        #[test]
        fn $name() {
            support::init_tracing();
            let grammar = Grammar::define(grammars::$name).unwrap();
            for (algorithm, expected) in [
                (Algorithm::LR0, $lr0),
                (Algorithm::SLR, $slr),
                (Algorithm::LALR, $lalr),
                (Algorithm::LR1, $lr1),
            ] {
                let table = lrkit::compute(&grammar, algorithm).unwrap();
                assert_eq!(table.conflict_count(), expected, "{:?}", algorithm);
                table.encode().validate().unwrap();
            }
            let ll = lrkit::compute_ll(&grammar);
            assert_eq!(ll.conflict_count(), $ll, "LL(1)");
        }
    )*};
}

define_tests! {
    arithmetic => [2, 0, 0, 0, 4],
    assignment => [1, 1, 0, 0, 2],
    nullable => [2, 0, 0, 0, 0],
    merge_sensitive => [7, 2, 2, 0, 2],
    ambiguous => [1, 1, 1, 1, 1],
    dangling_else => [1, 1, 1, 1, 1],
}
