use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;
use vesper_core::environment::Environment;
use vesper_core::error::ParseErrors;
use vesper_core::eval::Evaluator;

#[derive(Debug, ClapParser)]
#[command(name = "vesper", about = "A tree-walking interpreter with a mark-sweep heap")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Override the statement-count GC sweep cadence (default 100).
    #[arg(long, global = true)]
    gc_threshold: Option<usize>,

    /// Raise the log level; repeat for more detail (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse and evaluate a source file.
    Run { path: PathBuf },
    /// Start an interactive read-eval-print loop.
    Repl,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let gc_threshold = cli.gc_threshold.unwrap_or(100);
    let result = match cli.command.unwrap_or(Command::Repl) {
        Command::Run { path } => run_file(&path, gc_threshold),
        Command::Repl => run_repl(gc_threshold),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_file(path: &PathBuf, gc_threshold: usize) -> Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut evaluator = Evaluator::with_gc_threshold(gc_threshold);
    let env = Environment::new_global();

    match vesper_core::run_in(&source, &mut evaluator, &env) {
        Ok(value) => {
            println!("{}", value.inspect(&evaluator.heap));
            if value.is_error() {
                anyhow::bail!("script raised an error");
            }
            Ok(())
        }
        Err(ParseErrors(errors)) => {
            for error in &errors {
                eprintln!("{error}");
            }
            anyhow::bail!("{} parse error(s) in {}", errors.len(), path.display());
        }
    }
}

fn run_repl(gc_threshold: usize) -> Result<()> {
    let mut evaluator = Evaluator::with_gc_threshold(gc_threshold);
    let env = Environment::new_global();
    let mut editor = DefaultEditor::new().context("initializing line editor")?;

    loop {
        match editor.readline(">> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match vesper_core::run_in(&line, &mut evaluator, &env) {
                    Ok(value) => println!("{}", value.inspect(&evaluator.heap)),
                    Err(ParseErrors(errors)) => {
                        for error in &errors {
                            println!("{error}");
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err).context("reading line"),
        }
    }
    Ok(())
}
