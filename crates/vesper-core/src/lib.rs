//! Lexer, parser and tree-walking evaluator for a small dynamically-typed
//! scripting language, backed by [`vesper_gc`] for heap-allocated values.

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

use environment::EnvRef;
use error::ParseErrors;
use eval::Evaluator;
use parser::Parser;
use value::Value;

/// Parse and evaluate `source` in a fresh global environment, returning the
/// value of its last statement, or the collected parse diagnostics if the
/// source did not parse.
pub fn run(source: &str) -> Result<Value, ParseErrors> {
    let mut evaluator = Evaluator::new();
    let env = environment::Environment::new_global();
    run_in(source, &mut evaluator, &env)
}

/// Parse and evaluate `source` against an existing evaluator and
/// environment, so a REPL can thread state between inputs.
pub fn run_in(source: &str, evaluator: &mut Evaluator, env: &EnvRef) -> Result<Value, ParseErrors> {
    let (program, errors) = Parser::new(source).parse_program();
    if !errors.is_empty() {
        return Err(ParseErrors(errors));
    }
    Ok(evaluator.run_program(&program, env))
}
