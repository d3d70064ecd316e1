//! Low-level reading infrastructure.
//!
//! This module provides the [LineCursor] every section grammar reads from,
//! the [ByteParser] used for bracket-notation trees, the error and warning
//! type [ParsingError], and small numeric helpers in [utils].

pub mod byte_parser;
pub mod line_cursor;
pub mod parsing_error;
pub mod utils;

pub use byte_parser::ByteParser;
pub use line_cursor::LineCursor;
pub use parsing_error::{ErrorKind, ParsingError};
