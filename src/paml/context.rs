//! Per-parse state shared by the section grammars.

use crate::model::Dialect;
use crate::parser::ParsingError;
use tracing::warn;

/// Explicit context threaded through every grammar of one parse.
///
/// Collects warnings (recoverable [ParsingError]s) in encounter order and
/// carries the configuration the grammars consult.
#[derive(Debug)]
pub(crate) struct ParseContext {
    warnings: Vec<ParsingError>,
    strict_sequence_count: bool,
    dialect: Option<Dialect>,
    version: Option<String>,
}

impl ParseContext {
    pub(crate) fn new(strict_sequence_count: bool) -> Self {
        Self {
            warnings: Vec::new(),
            strict_sequence_count,
            dialect: None,
            version: None,
        }
    }

    /// Records a recoverable problem and logs it.
    pub(crate) fn warn(&mut self, warning: ParsingError) {
        warn!(line = warning.line(), "{}", warning.kind());
        self.warnings.push(warning);
    }

    /// Records a line that did not match what its section expected.
    pub(crate) fn malformed(&mut self, line_number: usize, line: &str, msg: &str) {
        self.warn(ParsingError::malformed_line(line_number, line, msg.to_string()));
    }

    /// Records a branch, tree or vector that could not be matched up.
    pub(crate) fn correlation_miss(&mut self, line_number: usize, msg: String) {
        self.warn(ParsingError::correlation_miss(line_number, msg));
    }

    /// Moves the warnings collected so far out of the context.
    pub(crate) fn take_warnings(&mut self) -> Vec<ParsingError> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn strict_sequence_count(&self) -> bool {
        self.strict_sequence_count
    }

    pub(crate) fn set_strict_sequence_count(&mut self, strict: bool) {
        self.strict_sequence_count = strict;
    }

    /// Sets dialect and program version of the report being parsed.
    pub(crate) fn set_program(&mut self, dialect: Dialect, version: Option<String>) {
        self.dialect = Some(dialect);
        self.version = version;
    }

    pub(crate) fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Returns `(major, minor)` of the program version, e.g. `(4, 9)` for `4.9e`.
    pub(crate) fn version(&self) -> Option<(u32, u32)> {
        let version = self.version.as_deref()?;
        let mut parts = version.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()
            .map(|m| m.chars().take_while(char::is_ascii_digit).collect::<String>())
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        Some((major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        let mut ctx = ParseContext::new(true);
        assert_eq!(ctx.version(), None);
        ctx.set_program(Dialect::CodonModel, Some("4.9e".to_string()));
        assert_eq!(ctx.version(), Some((4, 9)));
        ctx.set_program(Dialect::CodonModel, Some("3.12".to_string()));
        assert_eq!(ctx.version(), Some((3, 12)));
    }

    #[test]
    fn test_warnings_are_taken() {
        let mut ctx = ParseContext::new(false);
        ctx.malformed(3, "p: x", "bad proportions");
        assert_eq!(ctx.take_warnings().len(), 1);
        assert!(ctx.take_warnings().is_empty());
        assert!(!ctx.strict_sequence_count());
    }
}
