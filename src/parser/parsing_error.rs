//! Error and warning types for report parsing.
//!
//! This module provides [ParsingError] and [ErrorKind]. The same type
//! serves as hard failure and as warning: [ErrorKind::is_fatal] tells
//! which is which. Fatal errors abort the current result, recoverable ones
//! are collected on the [PamlResult](crate::model::PamlResult).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximal number of characters of the offending line kept as context
const DEFAULT_CONTEXT_LENGTH: usize = 60;

// =#========================================================================#=
// ERROR KIND
// =#========================================================================$=
/// Kinds of problems that can occur while reading a report.
#[derive(Error, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Header or banner names a mode that is recognized but not supported,
    /// e.g. heuristic tree search.
    #[error("Not implemented - unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Input ended before any known dialect signature was seen.
    #[error("Unrecognized format - {0}")]
    UnrecognizedFormat(String),

    /// A sub-feature that is deliberately not handled.
    #[error("Not yet implemented - {0}")]
    NotYetImplemented(String),

    /// A branch id, tree or vector could not be matched up (recoverable).
    #[error("Correlation miss - {0}")]
    CorrelationMiss(String),

    /// A line did not match what its section expected (recoverable unless
    /// it breaks a required structural count).
    #[error("Malformed line - {0}")]
    MalformedLine(String),

    /// Bracket-notation tree could not be parsed.
    #[error("Invalid Newick string - {0}")]
    InvalidNewick(String),

    #[error("IO error - {0}")]
    Io(String),
}

impl ErrorKind {
    /// Returns whether this kind aborts the current result.
    ///
    /// [CorrelationMiss](Self::CorrelationMiss) and
    /// [MalformedLine](Self::MalformedLine) are warnings; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::CorrelationMiss(_) | ErrorKind::MalformedLine(_))
    }
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================$=
/// Parsing error (or warning) with the line number and an excerpt of the line.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} at line {line}{}", format_context(.context))]
pub struct ParsingError {
    kind: ErrorKind,
    line: usize,
    context: String,
}

fn format_context(context: &str) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!("\n  Context: {context}")
    }
}

impl ParsingError {
    /// Create a ParsingError from an error kind, line number and the offending line
    pub fn new(kind: ErrorKind, line: usize, context: &str) -> Self {
        let context: String = context.trim().chars().take(DEFAULT_CONTEXT_LENGTH).collect();
        Self { kind, line, context }
    }

    /// Create a ParsingError without line context
    pub fn without_context(kind: ErrorKind) -> Self {
        Self { kind, line: 0, context: String::new() }
    }

    /// Convenience constructor for UnsupportedDialect
    pub fn unsupported_dialect(line: usize, context: &str, mode: &str) -> Self {
        Self::new(ErrorKind::UnsupportedDialect(mode.to_string()), line, context)
    }

    /// Convenience constructor for UnrecognizedFormat
    pub fn unrecognized_format(line: usize, msg: String) -> Self {
        Self::new(ErrorKind::UnrecognizedFormat(msg), line, "")
    }

    /// Convenience constructor for NotYetImplemented
    pub fn not_yet_implemented(line: usize, context: &str, feature: &str) -> Self {
        Self::new(ErrorKind::NotYetImplemented(feature.to_string()), line, context)
    }

    /// Convenience constructor for CorrelationMiss
    pub fn correlation_miss(line: usize, msg: String) -> Self {
        Self::new(ErrorKind::CorrelationMiss(msg), line, "")
    }

    /// Convenience constructor for MalformedLine
    pub fn malformed_line(line: usize, context: &str, msg: String) -> Self {
        Self::new(ErrorKind::MalformedLine(msg), line, context)
    }

    /// Convenience constructor for InvalidNewick
    pub fn invalid_newick(position: usize, context: &str, msg: String) -> Self {
        Self::new(ErrorKind::InvalidNewick(format!("{msg} (at byte {position})")), 0, context)
    }

    /// Get the error kind
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Get the 1-based line where the problem occurred (0 if unknown)
    pub fn line(&self) -> usize {
        self.line
    }

    /// Get the excerpt of the offending line
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Shorthand for `self.kind().is_fatal()`
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }

    /// Re-anchors an error raised without line information (e.g. by the
    /// Newick parser working on a single string) at a report line.
    pub(crate) fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Turns a fatal bracket-notation error into a recoverable malformed-line warning.
    pub(crate) fn into_warning(self) -> Self {
        let msg = self.kind.to_string();
        Self { kind: ErrorKind::MalformedLine(msg), ..self }
    }
}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError::without_context(ErrorKind::Io(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_split() {
        assert!(ErrorKind::UnsupportedDialect("x".into()).is_fatal());
        assert!(ErrorKind::UnrecognizedFormat("x".into()).is_fatal());
        assert!(ErrorKind::NotYetImplemented("x".into()).is_fatal());
        assert!(!ErrorKind::CorrelationMiss("x".into()).is_fatal());
        assert!(!ErrorKind::MalformedLine("x".into()).is_fatal());
    }

    #[test]
    fn test_display_contains_line_and_context() {
        let err = ParsingError::malformed_line(12, "  p:  0.5 0.5  ", "bad".to_string());
        let text = err.to_string();
        assert!(text.contains("Malformed line - bad"));
        assert!(text.contains("line 12"));
        assert!(text.contains("p:  0.5 0.5"));
        assert_eq!(err.context(), "p:  0.5 0.5");
    }

    #[test]
    fn test_newick_error_downgrades_to_warning() {
        let err = ParsingError::invalid_newick(3, "((a,b)", "Expected ')'".to_string()).at_line(40);
        assert!(err.is_fatal());
        let warning = err.into_warning();
        assert!(!warning.is_fatal());
        assert_eq!(warning.line(), 40);
    }
}
