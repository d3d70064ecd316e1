//! Reading PAML result reports (`codeml`, `aaml`, `baseml`, `yn00`).
//!
//! A report is a sequence of loosely formatted blocks, each opened by a
//! recognisable line. The [PamlParser] reads the header to learn the
//! dialect, then hands each block to its grammar and collects the
//! fragments into one [PamlResult] per run. Lines outside any known block
//! are skipped, and recoverable problems end up in
//! [PamlResult::warnings](crate::model::PamlResult::warnings).
//!
//! # Usage patterns
//! 1. Quick access with default settings: [parse_file] and [parse_str].
//! 2. A configured [PamlParserBuilder], for control over the reconstruction
//!    file, read strategy and sequence-count strictness.

mod branches;
pub(crate) mod context;
mod defs;
mod distances;
pub(crate) mod forestry;
mod frequencies;
mod nssites;
mod pairwise;
mod parser;
mod rates;
pub(crate) mod sequences;
mod summary;

pub use parser::{PamlParser, PamlParserBuilder, ReadStrategy};
pub use sequences::expand_placeholders;

use crate::model::PamlResult;
use crate::parser::ParsingError;
use std::path::Path;

/// Parses all runs of a report file with default settings.
///
/// The reconstruction file `rst` next to the report is correlated into the
/// first run if it exists.
///
/// # Arguments
/// * `path` - Path to the report (e.g. `mlc`)
///
/// # Returns
/// One [PamlResult] per run, in file order.
///
/// # Errors
/// Returns the first fatal [ParsingError], or an I/O error if the file
/// cannot be read.
///
/// # Example
/// ```no_run
/// use pamlwick::paml;
///
/// let results = paml::parse_file("codeml/mlc")?;
/// for result in &results {
///     println!("{} sequences, {} trees", result.sequences().len(), result.trees().len());
/// }
/// # Ok::<(), pamlwick::parser::ParsingError>(())
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<PamlResult>, ParsingError> {
    PamlParserBuilder::for_file(path)?.build()?.into_results()
}

/// Parses all runs of a report held in a string (without reconstruction stream).
///
/// # Example
/// ```
/// use pamlwick::paml;
///
/// let report = "YN00 seq.nuc\n\nns =   2\tls =   6\n\nhuman  ATG GCC\nchimp  ... ..T\n";
/// let results = paml::parse_str(report)?;
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].sequence("chimp").unwrap().residues, "ATGGCT");
/// # Ok::<(), pamlwick::parser::ParsingError>(())
/// ```
pub fn parse_str(text: &str) -> Result<Vec<PamlResult>, ParsingError> {
    PamlParser::from_str(text).into_results()
}
