//! Dispatcher: drives the section grammars over a report and assembles
//! one [PamlResult] per run.

use crate::model::{
    Collected, Dialect, FrequencyTable, NodeIdResolver, PamlResult, RateParameters, RunSummary, SequenceRecord,
};
use crate::paml::branches::parse_branch_table;
use crate::paml::context::ParseContext;
use crate::paml::defs::{AUTO_IN_MEMORY_THRESHOLD, Block, DEFAULT_RECONSTRUCTION_FILE};
use crate::paml::distances::{parse_aa_distances, parse_ng86, parse_nt_distances, parse_yn00};
use crate::paml::forestry::parse_forest;
use crate::paml::frequencies::{parse_frequencies, parse_position_frequencies, skip_codon_usage};
use crate::paml::nssites::parse_site_class_model;
use crate::paml::pairwise::parse_pairwise;
use crate::paml::rates::parse_rate_parameters;
use crate::paml::sequences::{is_sequence_row, parse_sequences};
use crate::paml::summary::{parse_header, parse_patterns, push_pattern_counts};
use crate::parser::utils::{is_blank, parse_number};
use crate::parser::{ErrorKind, LineCursor, ParsingError};
use crate::rst;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `kappa (ts/tv) = x`, `omega (dN/dS) = x`, `ln Lmax (unconstrained) = x`
static SCALAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(kappa \(ts/tv\)|omega \(dN/dS\)|ln Lmax \(unconstrained\))\s*=\s*(\S+)").unwrap()
});

/// Reconstruction stream, always held in memory
type ReconstructionCursor = LineCursor<Cursor<Vec<u8>>>;

// =#========================================================================#=
// READ STRATEGY
// =#========================================================================$=
/// Controls how the report is read during parsing.
///
/// By default, the [PamlParserBuilder] uses [ReadStrategy::Automatic],
/// which picks a strategy based on file size. Use
/// [with_buffered_source()](PamlParserBuilder::with_buffered_source) or
/// [with_in_memory_source()](PamlParserBuilder::with_in_memory_source)
/// to override this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStrategy {
    /// Read the file line by line through a buffered I/O reader.
    Buffered,

    /// Load the entire file into memory before parsing.
    InMemory,

    /// Choose between [ReadStrategy::Buffered] and [ReadStrategy::InMemory]
    /// based on file size. This is the default.
    #[default]
    Automatic,
}

// =#========================================================================#=
// PAML PARSER BUILDER
// =#========================================================================$=
/// Builder for configuring and creating a [PamlParser] on a report file.
///
/// # Configuration Options
/// * **Reconstruction file**: looked up next to the report
///   - [`with_reconstruction_file()`](Self::with_reconstruction_file)
///     — Use another file name than `rst`
///   - [`without_reconstruction()`](Self::without_reconstruction)
///     — Do not read it at all
///
/// * **Read strategy**:
///   - [`with_read_strategy()`](Self::with_read_strategy),
///     [`with_buffered_source()`](Self::with_buffered_source) or
///     [`with_in_memory_source()`](Self::with_in_memory_source)
///
/// * **Sequence count**:
///   - [`with_strict_sequence_count()`](Self::with_strict_sequence_count)
///     — Whether fewer or more sequence rows than `ns` abort the result (default)
///
/// # Example
/// ```no_run
/// use pamlwick::paml::PamlParserBuilder;
///
/// let parser = PamlParserBuilder::for_file("results/mlc")?
///     .with_reconstruction_file("rst")
///     .with_strict_sequence_count(false)
///     .build()?;
///
/// for result in parser {
///     let result = result?;
///     println!("{}: {} trees", result.dialect(), result.trees().len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PamlParserBuilder {
    path: PathBuf,
    reconstruction_file: Option<String>,
    read_strategy: ReadStrategy,
    strict_sequence_count: bool,
}

impl PamlParserBuilder {
    /// Creates a new builder for the report at `path`.
    ///
    /// # Arguments
    /// * `path` - Path to the report (accepting `&str`, `String`, `Path`, or `PathBuf`)
    ///
    /// # Errors
    /// Returns an I/O error if the file does not exist or is not readable.
    pub fn for_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        std::fs::metadata(&path)?;
        Ok(Self {
            path,
            reconstruction_file: Some(DEFAULT_RECONSTRUCTION_FILE.to_string()),
            read_strategy: ReadStrategy::default(),
            strict_sequence_count: true,
        })
    }

    /// Sets the file name of the reconstruction stream, looked up in the
    /// directory of the report.
    pub fn with_reconstruction_file<S: Into<String>>(mut self, name: S) -> Self {
        self.reconstruction_file = Some(name.into());
        self
    }

    /// Disables reading the reconstruction stream.
    pub fn without_reconstruction(mut self) -> Self {
        self.reconstruction_file = None;
        self
    }

    pub fn with_read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.read_strategy = strategy;
        self
    }

    /// Configure the parser to read the report using a **buffered reader**.
    ///
    /// See also [with_in_memory_source()](Self::with_in_memory_source).
    pub fn with_buffered_source(self) -> Self {
        self.with_read_strategy(ReadStrategy::Buffered)
    }

    /// Configure the parser to read the **entire report into memory** upfront.
    ///
    /// See also [with_buffered_source()](Self::with_buffered_source).
    pub fn with_in_memory_source(self) -> Self {
        self.with_read_strategy(ReadStrategy::InMemory)
    }

    /// Sets whether a sequence block with a row count other than `ns`
    /// aborts the result (`true`, default) or is recorded as warning.
    pub fn with_strict_sequence_count(mut self, strict: bool) -> Self {
        self.strict_sequence_count = strict;
        self
    }

    /// Opens the report (and the reconstruction stream, if present) and
    /// creates the [PamlParser].
    ///
    /// Nothing is parsed yet; results are produced by
    /// [next_result()](PamlParser::next_result).
    ///
    /// # Errors
    /// Returns an I/O error if the report cannot be read, or if the
    /// reconstruction file exists but cannot be read. A missing
    /// reconstruction file is not an error.
    pub fn build(self) -> Result<PamlParser, ParsingError> {
        let reconstruction = match &self.reconstruction_file {
            Some(name) => {
                let rst_path = self.path.parent().unwrap_or(Path::new("")).join(name);
                read_reconstruction(&rst_path)?
            }
            None => None,
        };

        let use_buffered = match self.read_strategy {
            ReadStrategy::Buffered => true,
            ReadStrategy::InMemory => false,
            ReadStrategy::Automatic => {
                let file_size = std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
                file_size >= AUTO_IN_MEMORY_THRESHOLD
            }
        };
        debug!(path = %self.path.display(), use_buffered, "opening report");

        let ctx = ParseContext::new(self.strict_sequence_count);
        if use_buffered {
            let cursor = LineCursor::from_file(&self.path)?;
            Ok(PamlParser::Buffered(PamlParserInner::new(cursor, ctx, reconstruction)))
        } else {
            let bytes = std::fs::read(&self.path)?;
            let cursor = LineCursor::new(Cursor::new(bytes));
            Ok(PamlParser::InMemory(PamlParserInner::new(cursor, ctx, reconstruction)))
        }
    }
}

/// Reads the reconstruction stream into memory; `None` if there is no such file.
fn read_reconstruction(path: &Path) -> Result<Option<ReconstructionCursor>, ParsingError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(LineCursor::new(Cursor::new(bytes)))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no reconstruction file");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

// =#========================================================================#=
// PAML PARSER
// =#========================================================================$=
/// Parser producing one [PamlResult] per run in a report.
///
/// Created via [PamlParserBuilder] for files, or with
/// [from_str()](Self::from_str) and [from_reader()](Self::from_reader).
///
/// # Usage
/// Call [next_result()](Self::next_result) until it returns `Ok(None)`,
/// or iterate: the parser is an [Iterator] over `Result<PamlResult, ParsingError>`.
/// A fatal error ends only the current run; the next call resumes at the
/// next report header.
///
/// ```
/// use pamlwick::paml::PamlParser;
///
/// let report = "BASEML (in paml version 4.9, March 2015)  seq.txt  HKY85\n\
///               ns =   2  ls =   4\n\n\
///               human    ACGT\n\
///               chimp    ..A.\n";
/// let mut parser = PamlParser::from_str(report);
/// let result = parser.next_result()?.expect("one run");
/// assert_eq!(result.sequences()[1].residues, "ACAT");
/// assert!(parser.next_result()?.is_none());
/// # Ok::<(), pamlwick::parser::ParsingError>(())
/// ```
#[allow(private_interfaces)]
pub enum PamlParser {
    /// Parser reading the report through a buffered file reader
    Buffered(PamlParserInner<BufReader<File>>),
    /// Parser on a report held in memory
    InMemory(PamlParserInner<Cursor<Vec<u8>>>),
}

/// Helper macro to delegate a method call to the inner parser variant.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            PamlParser::Buffered(inner) => inner.$method($($arg),*),
            PamlParser::InMemory(inner) => inner.$method($($arg),*),
        }
    };
}

impl PamlParser {
    /// Creates a parser on a report held in a string, with a strict sequence count.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self::from_bytes(text.as_bytes().to_vec())
    }

    /// Creates a parser on a report read completely from `reader`.
    ///
    /// # Errors
    /// Returns an I/O error if reading fails.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ParsingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        let cursor = LineCursor::new(Cursor::new(bytes));
        PamlParser::InMemory(PamlParserInner::new(cursor, ParseContext::new(true), None))
    }

    /// Attaches a reconstruction stream, read completely from `reader`.
    /// It is correlated into the first result.
    ///
    /// # Errors
    /// Returns an I/O error if reading fails.
    pub fn with_reconstruction_reader<R: Read>(mut self, mut reader: R) -> Result<Self, ParsingError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let cursor = LineCursor::new(Cursor::new(bytes));
        let parser = &mut self;
        delegate!(parser, set_reconstruction, cursor);
        Ok(self)
    }

    /// Sets whether a sequence row count other than `ns` aborts the result.
    pub fn with_strict_sequence_count(mut self, strict: bool) -> Self {
        let parser = &mut self;
        delegate!(parser, set_strict_sequence_count, strict);
        self
    }

    /// Parses the next run.
    ///
    /// # Returns
    /// * `Ok(Some(result))` - The next run with at least some structured data
    /// * `Ok(None)` - No further run in the report
    ///
    /// # Errors
    /// A fatal [ParsingError] for the current run:
    /// [UnrecognizedFormat](ErrorKind::UnrecognizedFormat) if no header is
    /// found, [UnsupportedDialect](ErrorKind::UnsupportedDialect) for
    /// heuristic tree searches,
    /// [NotYetImplemented](ErrorKind::NotYetImplemented) for unsupported
    /// blocks, a sequence-count mismatch in strict mode, or I/O failures.
    pub fn next_result(&mut self) -> Result<Option<PamlResult>, ParsingError> {
        delegate!(self, next_result)
    }

    /// Returns the warnings raised after the last result, once
    /// [next_result](Self::next_result) has returned `Ok(None)`.
    ///
    /// A trailing section without structured data (e.g. a header followed
    /// only by an unreadable tree) yields no result to attach them to.
    pub fn take_trailing_warnings(&mut self) -> Vec<ParsingError> {
        delegate!(self, take_trailing_warnings)
    }

    /// Consumes the parser and returns all runs.
    ///
    /// # Errors
    /// Returns the first fatal error met.
    pub fn into_results(self) -> Result<Vec<PamlResult>, ParsingError> {
        self.collect()
    }
}

impl Iterator for PamlParser {
    type Item = Result<PamlResult, ParsingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_result().transpose()
    }
}

// ============================================================================
// Inner parser
// ============================================================================
struct PamlParserInner<R: BufRead> {
    cursor: LineCursor<R>,
    ctx: ParseContext,
    /// Correlated into the first result, then dropped
    reconstruction: Option<ReconstructionCursor>,
    summary: Option<RunSummary>,
    /// Data carried from earlier runs of the same document
    sequences: Vec<SequenceRecord>,
    frequencies: Option<FrequencyTable>,
    need_header: bool,
    /// Whether reaching the end without header is a regular end
    lenient_header: bool,
    done: bool,
    /// Warnings of trailing sections that produced no result
    trailing_warnings: Vec<ParsingError>,
}

impl<R: BufRead> PamlParserInner<R> {
    fn new(cursor: LineCursor<R>, ctx: ParseContext, reconstruction: Option<ReconstructionCursor>) -> Self {
        Self {
            cursor,
            ctx,
            reconstruction,
            summary: None,
            sequences: Vec::new(),
            frequencies: None,
            need_header: true,
            lenient_header: false,
            done: false,
            trailing_warnings: Vec::new(),
        }
    }

    fn set_reconstruction(&mut self, cursor: ReconstructionCursor) {
        self.reconstruction = Some(cursor);
    }

    fn set_strict_sequence_count(&mut self, strict: bool) {
        self.ctx.set_strict_sequence_count(strict);
    }

    fn take_trailing_warnings(&mut self) -> Vec<ParsingError> {
        std::mem::take(&mut self.trailing_warnings)
    }

    fn next_result(&mut self) -> Result<Option<PamlResult>, ParsingError> {
        if self.done {
            return Ok(None);
        }
        match self.read_result() {
            Ok(Some(result)) => Ok(Some(result)),
            Ok(None) => {
                self.done = true;
                let trailing = self.ctx.take_warnings();
                if !trailing.is_empty() {
                    warn!(count = trailing.len(), "warnings after the last result");
                    self.trailing_warnings.extend(trailing);
                }
                Ok(None)
            }
            Err(err) => {
                self.ctx.take_warnings();
                self.summary = None;
                self.need_header = true;
                self.lenient_header = true;
                if matches!(err.kind(), ErrorKind::Io(_) | ErrorKind::UnrecognizedFormat(_)) {
                    self.done = true;
                }
                Err(err)
            }
        }
    }

    fn read_result(&mut self) -> Result<Option<PamlResult>, ParsingError> {
        loop {
            if self.need_header {
                let Some(summary) = parse_header(&mut self.cursor, &mut self.ctx, self.lenient_header)? else {
                    return Ok(None);
                };
                debug!(dialect = %summary.dialect, line = self.cursor.line_number(), "header");
                self.summary = Some(summary);
                self.sequences.clear();
                self.frequencies = None;
                self.need_header = false;
                self.lenient_header = true;
            }
            let Some(summary) = self.summary.clone() else {
                return Ok(None);
            };

            let (result, exhausted) = self.read_sections(summary)?;
            if let Some(result) = self.finish(result) {
                return Ok(Some(result));
            }
            if exhausted {
                return Ok(None);
            }
        }
    }

    /// Runs the grammars until the end of the stream or a run boundary.
    ///
    /// # Returns
    /// The result and whether the stream is exhausted.
    fn read_sections(&mut self, summary: RunSummary) -> Result<(PamlResult, bool), ParsingError> {
        let dialect = summary.dialect;
        let mut result = PamlResult::new(summary);
        let mut resolver: Option<NodeIdResolver> = None;
        let mut rates = RateParameters::default();
        let mut in_data = false;

        while let Some(line) = self.cursor.next_line()? {
            let Some(block) = Block::classify(&line) else {
                if in_data {
                    if result.sequences.is_empty() && is_sequence_row(&line) {
                        self.cursor.push_back(line);
                        let expected = result.summary.num_sequences;
                        result.sequences = parse_sequences(&mut self.cursor, &mut self.ctx, expected)?;
                    } else if !is_blank(&line) && !push_pattern_counts(&line, &mut result.summary) {
                        in_data = false;
                    }
                }
                continue;
            };
            in_data = false;
            if !block.applies_to(dialect) {
                debug!(?block, %dialect, "block not read for dialect");
                continue;
            }
            let line_number = self.cursor.line_number();
            debug!(?block, line = line_number, "block");

            match block {
                Block::Header => {
                    self.cursor.push_back(line);
                    self.need_header = true;
                    return Ok((result, false));
                }
                Block::DataSet => return Ok((result, false)),
                Block::Heuristic => {
                    return Err(ParsingError::unsupported_dialect(line_number, &line, "heuristic tree search"));
                }
                Block::AaPairwise => {
                    return Err(ParsingError::not_yet_implemented(
                        line_number,
                        &line,
                        "pairwise amino-acid distances",
                    ));
                }
                Block::Patterns => {
                    result.summary.pattern_counts.clear();
                    result.summary.num_patterns = 0;
                    parse_patterns(&mut self.cursor, &mut self.ctx, &line, &mut result.summary)?;
                    in_data = true;
                }
                Block::CodonUsage => skip_codon_usage(&mut self.cursor)?,
                Block::PositionFrequencies => {
                    let tables = parse_position_frequencies(&mut self.cursor, &mut self.ctx)?;
                    result.position_frequencies.extend(tables);
                }
                Block::Frequencies => {
                    let alphabet = dialect.alphabet();
                    if let Some(table) = parse_frequencies(&mut self.cursor, &mut self.ctx, alphabet, &mut result.stats)? {
                        result.frequencies = Some(table);
                    }
                }
                Block::Ng86 => {
                    if let Some(matrix) = parse_ng86(&mut self.cursor, &mut self.ctx, &line)? {
                        result.ng_matrix = Some(matrix);
                    }
                }
                Block::AaDistances => {
                    if let Some(matrix) = parse_aa_distances(&mut self.cursor, &mut self.ctx, &line)? {
                        result.distances = Some(matrix);
                    }
                }
                Block::NtDistances => {
                    if let Some(matrix) = parse_nt_distances(&mut self.cursor, &mut self.ctx, &line)? {
                        result.distances = Some(matrix);
                    }
                }
                Block::Yn00 => {
                    let names = self.sequence_names(&result);
                    if let Some(matrix) = parse_yn00(&mut self.cursor, &mut self.ctx, result.summary.num_sequences, &names)? {
                        result.yn_matrix = Some(matrix);
                    }
                }
                Block::Pairwise => {
                    let names = self.sequence_names(&result);
                    let matrix = parse_pairwise(&mut self.cursor, &mut self.ctx, &result.summary, &names)?;
                    if let Some(matrix) = matrix {
                        result.ml_matrix = Some(matrix);
                    }
                }
                Block::SiteClassModel => {
                    let names = self.sequence_names(&result);
                    let model = parse_site_class_model(&mut self.cursor, &mut self.ctx, &line, &names)?;
                    result.site_class_models.push(model);
                }
                Block::Tree => {
                    let names = self.sequence_names(&result);
                    if let Some(forest) = parse_forest(&mut self.cursor, &mut self.ctx, &line, &names)? {
                        result.trees.push(forest.tree);
                        resolver = Some(forest.resolver);
                    }
                }
                Block::BranchTable => {
                    let target = result.trees.last_mut().zip(resolver.as_mut());
                    parse_branch_table(&mut self.cursor, &mut self.ctx, target)?;
                }
                Block::RateParameters => {
                    parse_rate_parameters(&mut self.cursor, &mut self.ctx, &line, &mut rates)?;
                }
                Block::Scalar => read_scalar(&line, &mut result.stats),
                Block::TimeUsed => {}
            }
        }

        if matches!(dialect, Dialect::AminoAcidModel | Dialect::NucleotideModel) && !rates.is_empty() {
            result.rate_parameters = Collected::Collected(rates);
        }
        Ok((result, true))
    }

    /// Names of the sequences of this run, or of the earlier run it continues.
    fn sequence_names(&self, result: &PamlResult) -> Vec<String> {
        let sequences = if result.sequences.is_empty() {
            &self.sequences
        } else {
            &result.sequences
        };
        sequences.iter().map(|s| s.id.clone()).collect()
    }

    /// Fills in carried data, correlates the reconstruction stream and
    /// moves the warnings onto the result. `None` for an empty result.
    fn finish(&mut self, mut result: PamlResult) -> Option<PamlResult> {
        if result.is_empty() {
            return None;
        }

        if result.sequences.is_empty() {
            result.sequences = self.sequences.clone();
        } else {
            self.sequences = result.sequences.clone();
        }
        match &result.frequencies {
            Some(table) => self.frequencies = Some(table.clone()),
            None => result.frequencies = self.frequencies.clone(),
        }

        if let Some(mut rst_cursor) = self.reconstruction.take() {
            match rst::correlate(&mut rst_cursor, &mut self.ctx) {
                Ok(reconstruction) if !reconstruction.is_empty() => result.reconstruction = Some(reconstruction),
                Ok(_) => debug!("reconstruction stream without content"),
                Err(err) => self.ctx.warn(err.into_warning()),
            }
        }

        result.warnings = self.ctx.take_warnings();
        info!(
            dialect = %result.dialect(),
            sequences = result.sequences.len(),
            trees = result.trees.len(),
            models = result.site_class_models.len(),
            warnings = result.warnings.len(),
            "parsed result"
        );
        Some(result)
    }
}

/// Stores a top-level `kappa`, `omega` or `loglikelihood` line.
fn read_scalar(line: &str, stats: &mut BTreeMap<String, f64>) {
    let Some(caps) = SCALAR.captures(line) else {
        return;
    };
    let key = match &caps[1] {
        "kappa (ts/tv)" => "kappa",
        "omega (dN/dS)" => "omega",
        _ => "loglikelihood",
    };
    if let Some(value) = parse_number(&caps[2]) {
        stats.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalar() {
        let mut stats = BTreeMap::new();
        read_scalar("kappa (ts/tv) =  2.11433", &mut stats);
        read_scalar("omega (dN/dS) =  0.2", &mut stats);
        read_scalar("ln Lmax (unconstrained) = -1234.5", &mut stats);
        assert_eq!(stats.get("kappa"), Some(&2.11433));
        assert_eq!(stats.get("omega"), Some(&0.2));
        assert_eq!(stats.get("loglikelihood"), Some(&-1234.5));
    }

    #[test]
    fn test_missing_reconstruction_is_none() {
        let dir = std::env::temp_dir().join("pamlwick-no-rst");
        assert!(read_reconstruction(&dir.join("rst-does-not-exist")).unwrap().is_none());
    }
}
