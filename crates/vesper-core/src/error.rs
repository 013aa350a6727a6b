//! Host-level error types. Errors that are part of the *language* (division
//! by an unsupported pair of types, an unbound identifier, a wrong-arity
//! call) are represented as `Value::Error` at runtime, not as these types —
//! these cover failures the host program itself needs to report to its
//! caller: malformed source text, and I/O around running a script.

use thiserror::Error;

/// A single parser diagnostic, tied to the token that triggered it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// All parse errors collected while parsing one program, reported together
/// rather than stopping at the first one.
#[derive(Debug, Error)]
#[error("{} parse error(s):\n{}", self.0.len(), render(&self.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn render(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(std::string::ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
