//! Byte-by-byte scanner for single bracket-notation strings.
//!
//! Trees inside a report are printed on one line each, so [ByteParser]
//! works on an in-memory slice only. It offers peeking, consuming and
//! label scanning (quoted or unquoted) used by the
//! [NewickParser](crate::newick::NewickParser).

use crate::parser::parsing_error::ParsingError;

/// Default length of context provided with errors
const DEFAULT_CONTEXT_LENGTH: usize = 30;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser over an ASCII string.
///
/// # Example
/// ```
/// use pamlwick::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  (human: 0.1, chimp: 0.2);");
/// parser.skip_whitespace();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",:;()").unwrap(), "human");
/// ```
pub struct ByteParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteParser<'a> {
    /// Creates a new `ByteParser` over the given string.
    pub fn for_str(input: &'a str) -> Self {
        Self { bytes: input.as_bytes(), pos: 0 }
    }

    /// Peeks at the current byte without consuming it.
    ///
    /// # Returns
    /// * `Some(u8)` - The current byte if available
    /// * `None` - If at end of data (EOF)
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Gets the current byte and advances the position (consumes it).
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Skips (consumes) all consecutive whitespace characters.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Checks if the current byte matches the target byte.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it matches the target byte.
    ///
    /// # Returns
    /// `true` if the byte was matched and consumed, `false` otherwise
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the end of data (EOF) has been reached.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Returns the current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns up to `k` bytes from the current position as string, for error context.
    pub fn get_context_as_string(&self, k: usize) -> String {
        let end = (self.pos + k).min(self.bytes.len());
        let start = self.pos.min(end);
        String::from_utf8_lossy(&self.bytes[start..end]).into_owned()
    }

    /// Builds an [InvalidNewick](crate::parser::ErrorKind::InvalidNewick)
    /// error at the current position.
    pub fn error(&self, msg: String) -> ParsingError {
        ParsingError::invalid_newick(self.pos, &self.get_context_as_string(DEFAULT_CONTEXT_LENGTH), msg)
    }

    /// Parses a label (quoted or unquoted) with the given delimiter set.
    ///
    /// # Errors
    /// Returns an error if a quoted label is not closed.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_whitespace();

        if self.peek() == Some(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a quoted label enclosed in single quotes; `''` is an escaped quote.
    ///
    /// Assumes the opening quote has not been consumed yet.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // consume opening '

        let mut label = String::new();
        loop {
            match self.next_byte() {
                Some(b'\'') => {
                    if self.peek() == Some(b'\'') {
                        label.push('\'');
                        self.next_byte();
                    } else {
                        return Ok(label);
                    }
                }
                Some(b) => label.push(b as char),
                None => return Err(self.error("Unclosed quoted label".to_string())),
            }
        }
    }

    /// Parses an unquoted label until any of the given delimiters (or EOF).
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }

    /// Consumes a numeric token (digits, sign, decimal point, exponent) and returns it.
    pub fn parse_number_token(&mut self) -> &'a str {
        let bytes: &'a [u8] = self.bytes;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        // Only ASCII bytes were consumed, so the slice is valid UTF-8.
        std::str::from_utf8(&bytes[start..self.pos]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::ByteParser;

    #[test]
    fn test_quoted_label_with_escape() {
        let mut parser = ByteParser::for_str("'Wilson''s petrel':1.0");
        assert_eq!(parser.parse_label(b":,)").unwrap(), "Wilson's petrel");
        assert!(parser.consume_if(b':'));
        assert_eq!(parser.parse_number_token(), "1.0");
        assert!(parser.is_eof());
    }

    #[test]
    fn test_unclosed_quote_is_error() {
        let mut parser = ByteParser::for_str("'open");
        assert!(parser.parse_label(b",").is_err());
    }

    #[test]
    fn test_number_token_scientific() {
        let mut parser = ByteParser::for_str("1.5e-10,");
        assert_eq!(parser.parse_number_token(), "1.5e-10");
        assert_eq!(parser.peek(), Some(b','));
    }
}
