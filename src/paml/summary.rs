//! Header, input parameters and site patterns.

use crate::model::{Dialect, RunSummary};
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::parser::utils::{is_blank, parse_all_numbers};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(CODONML|AAML|BASEML|YN00)\s*(?:\(([^)]*)\))?\s*(\S+)?\s*(?:Model:\s*)?(.*)$").unwrap()
});
static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:in\s+)?paml\s+(?:version\s+)?([^\s,]+)").unwrap());
static MODEL_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*Model:\s*(.+?)\s*$").unwrap());
static INPUT_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z][^:=]*?)\s*:\s*(.*?)\s*$").unwrap());
static NS_LS: Lazy<Regex> = Lazy::new(|| Regex::new(r"ns\s*=\s*(\d+)\s+ls\s*=\s*(\d+)").unwrap());
static SITE_PATTERNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\s*site patterns\s*=\s*(\d+)").unwrap());

/// Reads up to and including the header line and the input parameters below it.
///
/// Leading blank lines, `seed used` lines and any other text before the
/// header are skipped. Input parameters (`key: value`) are read until the
/// first line that opens a block, which is pushed back.
///
/// # Arguments
/// * `cursor` - Primary stream
/// * `lenient` - If `true`, reaching the end without header is not an error
///
/// # Returns
/// * `Ok(Some(summary))` - Header found
/// * `Ok(None)` - End of stream, and either only blank lines were left or `lenient` is set
/// * `Err(UnrecognizedFormat)` - Content ended without a dialect signature
pub(crate) fn parse_header<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    lenient: bool,
) -> Result<Option<RunSummary>, ParsingError> {
    let mut skipped_content = false;
    let mut summary = loop {
        let Some(line) = cursor.next_line()? else {
            if skipped_content && !lenient {
                return Err(ParsingError::unrecognized_format(
                    cursor.line_number(),
                    "no CODONML, AAML, BASEML or YN00 header found".to_string(),
                ));
            }
            return Ok(None);
        };
        if let Some(summary) = header_from_line(&line) {
            break summary;
        }
        if !is_blank(&line) && !line.trim_start().starts_with("seed used") {
            skipped_content = true;
        }
    };
    ctx.set_program(summary.dialect, summary.version.clone());

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }
        if let Some(caps) = MODEL_LINE.captures(&line) {
            summary.model.get_or_insert_with(|| caps[1].to_string());
        } else if let Some(caps) = INPUT_PARAM.captures(&line) {
            summary.input_params.insert(caps[1].to_string(), caps[2].to_string());
        }
    }
    Ok(Some(summary))
}

/// Builds a summary from a header line, if it is one.
pub(crate) fn header_from_line(line: &str) -> Option<RunSummary> {
    let caps = HEADER.captures(line.trim_end())?;
    let dialect = Dialect::from_keyword(&caps[1])?;
    let mut summary = RunSummary::new(dialect);
    summary.version = caps
        .get(2)
        .and_then(|m| VERSION.captures(m.as_str()))
        .map(|v| v[1].to_string());
    summary.input_file = caps.get(3).map(|m| m.as_str().to_string());
    summary.model = caps
        .get(4)
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty());
    Some(summary)
}

/// Parses the `ns = N ls = L` line and the site pattern information after it.
///
/// Consumes a following `# site patterns = P` line and the integer pattern
/// counts printed below it; stops at (and pushes back) the first other
/// non-blank line.
pub(crate) fn parse_patterns<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    first_line: &str,
    summary: &mut RunSummary,
) -> Result<(), ParsingError> {
    match NS_LS.captures(first_line) {
        Some(caps) => {
            summary.num_sequences = caps[1].parse().unwrap_or(0);
            summary.alignment_length = caps[2].parse().unwrap_or(0);
        }
        None => ctx.malformed(cursor.line_number(), first_line, "expected 'ns = N ls = L'"),
    }

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if let Some(caps) = SITE_PATTERNS.captures(&line) {
            summary.num_patterns = caps[1].parse().unwrap_or(0);
        } else if summary.num_patterns > 0 && push_pattern_counts(&line, summary) {
            continue;
        } else {
            cursor.push_back(line);
            break;
        }
    }
    Ok(())
}

/// Appends the integers of a pattern-count line to the summary.
///
/// # Returns
/// `false` if the line is not a list of non-negative integers.
pub(crate) fn push_pattern_counts(line: &str, summary: &mut RunSummary) -> bool {
    let Some(values) = parse_all_numbers(line) else {
        return false;
    };
    if values.is_empty() || values.iter().any(|v| v.fract() != 0.0 || *v < 0.0) {
        return false;
    }
    summary.pattern_counts.extend(values.into_iter().map(|v| v as u32));
    if summary.num_patterns == 0 {
        summary.num_patterns = summary.pattern_counts.len();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_variants() {
        let s = header_from_line("CODONML (in paml version 4.9, March 2015)  brown.nuc   Model: One dN/dS ratio ").unwrap();
        assert_eq!(s.dialect, Dialect::CodonModel);
        assert_eq!(s.version.as_deref(), Some("4.9"));
        assert_eq!(s.input_file.as_deref(), Some("brown.nuc"));
        assert_eq!(s.model.as_deref(), Some("One dN/dS ratio"));

        let s = header_from_line("BASEML (in paml 3.12 February 2002)  brown.nuc  HKY85 dGamma (ncatG=5)").unwrap();
        assert_eq!(s.dialect, Dialect::NucleotideModel);
        assert_eq!(s.version.as_deref(), Some("3.12"));
        assert_eq!(s.model.as_deref(), Some("HKY85 dGamma (ncatG=5)"));

        let s = header_from_line("YN00").unwrap();
        assert_eq!(s.dialect, Dialect::PairwiseDistance);
        assert_eq!(s.input_file, None);

        assert!(header_from_line("MCMCTREE (in paml version 4.9)").is_none());
    }

    #[test]
    fn test_header_params_and_patterns() {
        let text = "seed used = 123\n\nCODONML (in paml version 4.8, March 2014)  x.nuc\n\
                    Codon frequency model: F3x4\nSite-class models: \nns =   3  ls = 10\n\
                    # site patterns =   4\n    2    3\n    1    4\n\nTREE # 1\n";
        let mut cursor = LineCursor::from_str(text);
        let mut ctx = ParseContext::new(true);
        let mut summary = parse_header(&mut cursor, &mut ctx, false).unwrap().unwrap();
        assert_eq!(summary.input_params.get("Codon frequency model").map(String::as_str), Some("F3x4"));
        assert_eq!(summary.input_params.get("Site-class models").map(String::as_str), Some(""));

        let ns_line = cursor.next_line().unwrap().unwrap();
        parse_patterns(&mut cursor, &mut ctx, &ns_line, &mut summary).unwrap();
        assert_eq!((summary.num_sequences, summary.alignment_length, summary.num_patterns), (3, 10, 4));
        assert_eq!(summary.pattern_counts, vec![2, 3, 1, 4]);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("TREE # 1"));
    }

    #[test]
    fn test_missing_header() {
        let mut ctx = ParseContext::new(true);
        let mut cursor = LineCursor::from_str("some other program\noutput\n");
        let err = parse_header(&mut cursor, &mut ctx, false).unwrap_err();
        assert!(matches!(err.kind(), crate::parser::ErrorKind::UnrecognizedFormat(_)));

        let mut cursor = LineCursor::from_str("\n\n");
        assert!(parse_header(&mut cursor, &mut ctx, false).unwrap().is_none());
    }
}
