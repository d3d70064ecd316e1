//! Pamlwick is a library to parse the result reports of the PAML
//! programs `codeml`, `aaml`, `baseml` and `yn00` into a typed model.
//!
//! The reports have no formal grammar: blocks are recognised by their
//! opening lines, appear depending on the options of the run, and refer to
//! tree nodes by integer ids that differ between sections and files. This
//! crate reads them block by block and reconciles the ids with the trees.
//! Core functionality provided:
//! - Report: header and input parameters, site patterns, sequences
//!   (with `.` placeholders expanded), frequency tables, distance matrices
//!   (Nei & Gojobori, pairwise ML, Yang & Nielsen, amino-acid and nucleotide
//!   distances), trees with likelihoods, per-branch statistics, site-class
//!   models with positively selected sites, and rate parameters.
//! - Reconstruction: the `rst` file next to the report, with per-site
//!   ancestral states, substitutions per branch and reconstructed sequences.
//! - Tree model: [PhyloTree](crate::model::PhyloTree) is an arena tree
//!   (no direct vertex references, only vertex indices) whose vertices
//!   carry open key/value [Tags](crate::model::Tags).
//! - Errors: fatal problems end the current run, recoverable ones are
//!   kept as warnings on the result. See [crate::parser::ErrorKind].
//!
//! Limitations:
//! - Heuristic tree searches are reported as unsupported
//! - Pairwise amino-acid ML distances (`aaml`) are not read yet
//! - Codon usage tables are skipped
//!
//! # Usage patterns
//! 1. Quick access with default settings: [parse_file], [parse_str] and
//!    [parse_newick_str].
//! 2. Configure a parser using [PamlParserBuilder](crate::paml::PamlParserBuilder)
//!    for control over the reconstruction file, read strategy and
//!    sequence-count strictness.
//!
//! ## Example Default Configuration
//!
//! Parse a report and its reconstruction file:
//! ```no_run
//! use pamlwick::parse_file;
//!
//! let results = parse_file("positive_selection/mlc")?;
//! let result = &results[0];
//! for model in result.site_class_models() {
//!     println!("Model {}: lnL = {:?}", model.model_num, model.likelihood);
//! }
//! if let Some(reconstruction) = result.reconstruction() {
//!     println!("{} reconstructed sites", reconstruction.site_probabilities.len());
//! }
//! # Ok::<(), pamlwick::parser::ParsingError>(())
//! ```
//!
//! ## Example Parser Configuration
//! ```no_run
//! use pamlwick::paml::PamlParserBuilder;
//!
//! let mut parser = PamlParserBuilder::for_file("baseml/out.txt")?
//!     .without_reconstruction()
//!     .with_strict_sequence_count(false)
//!     .with_buffered_source()
//!     .build()?;
//!
//! while let Some(result) = parser.next_result()? {
//!     for warning in result.warnings() {
//!         eprintln!("{warning}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod model;
pub mod newick;
pub mod paml;
pub mod parser;
pub mod rst;

use crate::model::{PamlResult, PhyloTree};
use crate::parser::ParsingError;
use std::path::Path;

// ============================================================================
// Quick report API
// ============================================================================
/// Parses all runs of a report file using default settings.
///
/// See [`paml::parse_file`] for full documentation.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<PamlResult>, ParsingError> {
    paml::parse_file(path)
}

/// Parses all runs of a report held in a string using default settings.
///
/// See [`paml::parse_str`] for full documentation.
pub fn parse_str(text: &str) -> Result<Vec<PamlResult>, ParsingError> {
    paml::parse_str(text)
}

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parse a bracket-notation string, returning a [PhyloTree].
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    newick::parse_str(newick)
}
