use criterion::{criterion_group, criterion_main, Criterion};
use lrkit::{
    grammar::{Assoc, Grammar, GrammarDef, GrammarError},
    lr1::{lr1, MergeMode},
    Algorithm,
};

criterion_main!(benches);
criterion_group!(benches, bench_arithmetic, bench_statements);

fn bench_arithmetic(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic", arithmetic);
    bench_table_gen(c, "arithmetic_prec", arithmetic_prec);
}

fn bench_statements(c: &mut Criterion) {
    bench_table_gen(c, "statements", statements);
}

fn bench_table_gen(
    c: &mut Criterion,
    grammar_name: &str,
    def: fn(&mut GrammarDef) -> Result<(), GrammarError>,
) {
    let grammar = Grammar::define(def).unwrap();

    let mut group = c.benchmark_group(grammar_name);
    for algorithm in [
        Algorithm::LR0,
        Algorithm::SLR,
        Algorithm::LALR,
        Algorithm::LR1,
    ] {
        group.bench_function(format!("{:?}", algorithm), |b| {
            b.iter(|| lrkit::compute(&grammar, algorithm));
        });
    }
    group.bench_function("LR1-merged", |b| {
        b.iter(|| lr1(&grammar, MergeMode::LALR));
    });
    group.bench_function("LL1", |b| {
        b.iter(|| lrkit::compute_ll(&grammar));
    });
    group.finish();
}

fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.rule("E", ["E", "+", "T"])?;
    g.rule("E", ["E", "-", "T"])?;
    g.rule("E", ["T"])?;
    g.rule("T", ["T", "*", "F"])?;
    g.rule("T", ["T", "/", "F"])?;
    g.rule("T", ["F"])?;
    g.rule("F", ["(", "E", ")"])?;
    g.rule("F", ["-", "F"])?;
    g.rule("F", ["num"])?;
    Ok(())
}

fn arithmetic_prec(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.precedence(Assoc::Left, ["+", "-"])?;
    g.precedence(Assoc::Left, ["*", "/"])?;
    g.precedence(Assoc::Right, ["^"])?;
    g.precedence(Assoc::Right, ["UMINUS"])?;
    for op in ["+", "-", "*", "/", "^"] {
        g.rule("expr", ["expr", op, "expr"])?;
    }
    g.rule_with_prec("expr", ["-", "expr"], "UMINUS")?;
    g.rule("expr", ["(", "expr", ")"])?;
    g.rule("expr", ["num"])?;
    Ok(())
}

fn statements(g: &mut GrammarDef) -> Result<(), GrammarError> {
    g.precedence(Assoc::Nonassoc, ["==", "<"])?;
    g.precedence(Assoc::Left, ["+"])?;
    g.rule("program", ["stmts"])?;
    g.rule("stmts", ["stmts", "stmt"])?;
    g.rule("stmts", [] as [&str; 0])?;
    g.rule("stmt", ["id", "=", "expr", ";"])?;
    g.rule("stmt", ["if", "(", "expr", ")", "block", "else", "block"])?;
    g.rule("stmt", ["while", "(", "expr", ")", "block"])?;
    g.rule("stmt", ["error", ";"])?;
    g.rule("block", ["{", "stmts", "}"])?;
    g.rule("expr", ["expr", "==", "expr"])?;
    g.rule("expr", ["expr", "<", "expr"])?;
    g.rule("expr", ["expr", "+", "expr"])?;
    g.rule("expr", ["id", "(", "args", ")"])?;
    g.rule("expr", ["id"])?;
    g.rule("expr", ["num"])?;
    g.rule("args", ["args", ",", "expr"])?;
    g.rule("args", ["expr"])?;
    Ok(())
}
