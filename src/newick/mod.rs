//! Bracket-notation (Newick) trees as printed inside reports.
//!
//! Provides the [NewickParser] for single tree strings, [to_newick] to write
//! a [PhyloTree] back, and the quick entry point [parse_str].

mod defs;
mod parser;
mod writer;

pub use parser::NewickParser;
pub use writer::{to_newick, write_newick};

use crate::model::PhyloTree;
use crate::parser::byte_parser::ByteParser;
use crate::parser::parsing_error::ParsingError;

/// Parses a single bracket-notation string to obtain a [PhyloTree].
///
/// This is a convenience function for quick parsing of a single tree
/// using default settings and thus not requiring configuration of a parser.
///
/// # Arguments
/// * `newick` - The tree string to parse, terminated by `;`
///
/// # Returns
/// * [PhyloTree] - Tree parsed from the string
/// * [ParsingError] - If the string is not valid bracket notation
///
/// # Example
/// ```
/// use pamlwick::newick::parse_str;
///
/// let tree = parse_str("((1: 0.1, 2: 0.2) 4: 0.3, 3: 0.4) 5;")?;
/// assert_eq!(tree.num_leaves(), 3);
/// # Ok::<(), pamlwick::parser::ParsingError>(())
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new().parse_str(&mut byte_parser)
}
