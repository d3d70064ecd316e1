//! Line-oriented reading with a single line of push-back.
//!
//! This module provides [LineCursor], the reader every section grammar
//! pulls from. It wraps any [BufRead] (a byte slice held in memory or a
//! [BufReader](std::io::BufReader) on a file) and hands out one line at a
//! time with trailing line terminators removed. Bytes that are not valid
//! UTF-8 are decoded lossily (as U+FFFD), so a stray byte in a line no
//! grammar cares about never ends the parse.
//!
//! A grammar that reads one line too far (the first line of the next block)
//! gives it back via [LineCursor::push_back]. There is exactly one slot:
//! pushing back twice without reading in between is a bug in the calling
//! grammar and panics.

use crate::parser::parsing_error::ParsingError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// =#========================================================================#=
// LINE CURSOR
// =#========================================================================$=
/// A line reader with one line of look-back.
///
/// # Example
/// ```
/// use pamlwick::parser::LineCursor;
///
/// let mut cursor = LineCursor::from_str("TREE # 1\nlnL(ntime: 3 np: 4): -10.0\n");
/// let line = cursor.next_line().unwrap().unwrap();
/// assert_eq!(line, "TREE # 1");
/// cursor.push_back(line);
/// assert_eq!(cursor.next_line().unwrap().as_deref(), Some("TREE # 1"));
/// ```
pub struct LineCursor<R: BufRead> {
    reader: R,
    /// Single push-back slot
    pushed_back: Option<String>,
    /// 1-based number of the line most recently handed out
    line_number: usize,
    /// Scratch buffer reused across reads
    buffer: Vec<u8>,
    eof: bool,
}

impl<'a> LineCursor<&'a [u8]> {
    /// Creates a cursor over an in-memory string.
    pub fn from_str(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }
}

impl LineCursor<BufReader<File>> {
    /// Creates a cursor reading a file through a [BufReader].
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineCursor<R> {
    /// Creates a cursor on top of any buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pushed_back: None,
            line_number: 0,
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Returns the next line without its line terminator.
    ///
    /// A line previously given back with [push_back](Self::push_back) is
    /// returned first.
    ///
    /// # Returns
    /// * `Ok(Some(line))` - The next line
    /// * `Ok(None)` - End of stream
    /// * `Err(ParsingError)` - If the underlying reader fails
    pub fn next_line(&mut self) -> Result<Option<String>, ParsingError> {
        if let Some(line) = self.pushed_back.take() {
            self.line_number += 1;
            return Ok(Some(line));
        }

        if self.eof {
            return Ok(None);
        }

        self.buffer.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buffer)
            .map_err(|e| ParsingError::from(e).at_line(self.line_number + 1))?;
        if read == 0 {
            self.eof = true;
            return Ok(None);
        }

        self.line_number += 1;
        let line = String::from_utf8_lossy(&self.buffer);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Gives a consumed line back, so that the next call to
    /// [next_line](Self::next_line) returns it again.
    ///
    /// # Panics
    /// Panics if a line is already waiting in the push-back slot.
    pub fn push_back(&mut self, line: String) {
        assert!(
            self.pushed_back.is_none(),
            "LineCursor::push_back called twice without an intervening read (line {})",
            self.line_number
        );
        self.pushed_back = Some(line);
        self.line_number = self.line_number.saturating_sub(1);
    }

    /// Returns whether a line is waiting in the push-back slot.
    pub fn has_pushed_back(&self) -> bool {
        self.pushed_back.is_some()
    }

    /// Returns the 1-based number of the line most recently returned,
    /// or 0 before the first read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Skips blank lines and returns the first non-blank one (or `None` at end of stream).
    pub fn next_non_blank(&mut self) -> Result<Option<String>, ParsingError> {
        while let Some(line) = self.next_line()? {
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

// =#========================================================================#=
// TESTS - LINE CURSOR
// =#========================================================================$=
#[cfg(test)]
mod tests {
    use super::LineCursor;

    #[test]
    fn test_reads_lines_and_strips_terminators() {
        let mut cursor = LineCursor::from_str("a\r\nb\n\nc");
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("a"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some(""));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(cursor.next_line().unwrap(), None);
        assert_eq!(cursor.next_line().unwrap(), None);
    }

    #[test]
    fn test_push_back_replays_line_and_line_number() {
        let mut cursor = LineCursor::from_str("first\nsecond\n");
        let first = cursor.next_line().unwrap().unwrap();
        assert_eq!(cursor.line_number(), 1);
        cursor.push_back(first);
        assert_eq!(cursor.line_number(), 0);
        assert!(cursor.has_pushed_back());
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("first"));
        assert_eq!(cursor.line_number(), 1);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("second"));
        assert_eq!(cursor.line_number(), 2);
    }

    #[test]
    fn test_push_back_at_end_of_stream() {
        let mut cursor = LineCursor::from_str("only");
        let line = cursor.next_line().unwrap().unwrap();
        assert_eq!(cursor.next_line().unwrap(), None);
        cursor.push_back(line);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("only"));
        assert_eq!(cursor.next_line().unwrap(), None);
    }

    #[test]
    #[should_panic(expected = "push_back called twice")]
    fn test_double_push_back_panics() {
        let mut cursor = LineCursor::from_str("a\nb\n");
        let a = cursor.next_line().unwrap().unwrap();
        let b = cursor.next_line().unwrap().unwrap();
        cursor.push_back(b);
        cursor.push_back(a);
    }

    #[test]
    fn test_next_non_blank() {
        let mut cursor = LineCursor::from_str("\n   \nvalue\n");
        assert_eq!(cursor.next_non_blank().unwrap().as_deref(), Some("value"));
        assert_eq!(cursor.next_non_blank().unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let mut cursor = LineCursor::new(&b"ns = 2\nnote: caf\xE9\nls = 4\n"[..]);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("ns = 2"));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("note: caf\u{FFFD}"));
        assert_eq!(cursor.line_number(), 2);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("ls = 4"));
        assert_eq!(cursor.line_number(), 3);
    }
}
