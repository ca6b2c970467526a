use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lrkit::Algorithm;
use lrkit_demo_calc::parser::Calculator;
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Method {
    Lr0,
    Slr,
    Lalr,
    Lr1,
}

impl From<Method> for Algorithm {
    fn from(method: Method) -> Self {
        match method {
            Method::Lr0 => Self::LR0,
            Method::Slr => Self::SLR,
            Method::Lalr => Self::LALR,
            Method::Lr1 => Self::LR1,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The expression to evaluate.
    input: String,

    /// The parse table construction.
    #[arg(long, value_enum, default_value_t = Method::Lalr)]
    method: Method,

    /// Write the grammar and the parse table in a readable form to this path.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the encoded parse table as JSON to this path.
    #[arg(long)]
    encode: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_ansi(true)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let calculator = Calculator::new(args.method.into())?;
    let table = calculator.table();
    if table.conflict_count() > 0 {
        let suffix = if table.conflict_count() == 1 { "" } else { "s" };
        println!(
            "[warning] The parse table has {} conflict{}.",
            table.conflict_count(),
            suffix
        );
    }

    if let Some(path) = &args.dump {
        let grammar = calculator.grammar();
        let dump = format!("{}\n{}", grammar, table.display(grammar));
        fs::write(path, dump).context("writing the table dump")?;
    }
    if let Some(path) = &args.encode {
        let json = table.encode().to_json_pretty()?;
        fs::write(path, json).context("writing the encoded table")?;
    }

    let parsed = calculator.parse(&args.input).context("parser error")?;
    for err in &parsed.errors {
        println!("[recovered] {}", err);
    }
    println!("parsed: {}", parsed.expr);
    match parsed.expr.eval() {
        Some(value) => println!("value: {}", value),
        None => println!("value: <unavailable>"),
    }

    Ok(())
}
