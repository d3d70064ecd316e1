//! Sequence blocks with first-row placeholder compression.
//!
//! The first row of a sequence block is literal. In later rows a `.`
//! stands for "same residue as the first sequence in this column" and is
//! substituted positionally before the record is stored.

use crate::model::SequenceRecord;
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::parser::utils::{is_blank, strip_whitespace};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::BufRead;

/// Placeholder for "same as first sequence"
const PLACEHOLDER: char = '.';

/// `name  residues`, where residues are letters, gaps, ambiguity marks or placeholders
static SEQUENCE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^\s:=]+)\s+([A-Za-z\-\?\.\*~][A-Za-z\-\?\.\*~ \t]*)$").unwrap());

/// Row-count line printed above some sequence blocks, e.g. `     5    113  P`
static COUNT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\s+\d+(\s+[A-Z])?\s*$").unwrap());

/// Lines after which a sequence block is over
static BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(Printing|After|TREE|Codon)").unwrap());

/// Returns whether a line looks like the row of a sequence block.
pub(crate) fn is_sequence_row(line: &str) -> bool {
    !BOUNDARY.is_match(line)
        && SEQUENCE_ROW
            .captures(line)
            .is_some_and(|caps| caps[1].parse::<f64>().is_err())
}

/// Splits a sequence row into its name and residues (whitespace removed).
pub(crate) fn split_sequence_row(line: &str) -> Option<(String, String)> {
    let caps = SEQUENCE_ROW.captures(line)?;
    Some((caps[1].to_string(), strip_whitespace(&caps[2])))
}

/// Replaces every placeholder in `row` by the residue of `first` at the same position.
///
/// Positions beyond the end of `first` keep the placeholder.
///
/// # Example
/// ```
/// use pamlwick::paml::expand_placeholders;
///
/// assert_eq!(expand_placeholders("ATGCCA", "..A.T."), "ATACTA");
/// ```
pub fn expand_placeholders(first: &str, row: &str) -> String {
    let first: Vec<char> = first.chars().collect();
    row.chars()
        .enumerate()
        .map(|(i, c)| match (c, first.get(i)) {
            (PLACEHOLDER, Some(&f)) => f,
            _ => c,
        })
        .collect()
}

/// Turns parsed `(name, residues)` rows into records: placeholders are
/// expanded against the first row and duplicate names are made unique
/// (`name_2`, `name_3`, ...) with a warning.
pub(crate) fn build_records(
    rows: Vec<(String, String)>,
    ctx: &mut ParseContext,
    line_number: usize,
) -> Vec<SequenceRecord> {
    let mut records: Vec<SequenceRecord> = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    for (name, residues) in rows {
        let residues = match records.first() {
            Some(first) => expand_placeholders(&first.residues, &residues),
            None => residues,
        };
        let mut id = name.clone();
        let mut k = 2;
        while !seen.insert(id.clone()) {
            id = format!("{name}_{k}");
            k += 1;
        }
        if id != name {
            ctx.malformed(line_number, &name, &format!("duplicate sequence name renamed to '{id}'"));
        }
        records.push(SequenceRecord::new(id, residues));
    }
    records
}

/// Parses a block of sequence rows.
///
/// Starts at the next line; leading blank and row-count lines are skipped.
/// The block ends at a blank line after the first row, or at (pushed back)
/// a line starting with `Printing`, `After`, `TREE`, `Codon` or opening another block.
///
/// # Errors
/// With a strict context, a number of rows differing from `expected` is a
/// fatal [MalformedLine](crate::parser::ErrorKind::MalformedLine).
/// Otherwise it is recorded as warning.
pub(crate) fn parse_sequences<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    expected: usize,
) -> Result<Vec<SequenceRecord>, ParsingError> {
    let mut rows: Vec<(String, String)> = Vec::new();
    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        if BOUNDARY.is_match(&line) || Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }
        if rows.is_empty() && COUNT_LINE.is_match(&line) {
            continue;
        }
        match split_sequence_row(&line) {
            Some(row) => rows.push(row),
            None => ctx.malformed(cursor.line_number(), &line, "expected sequence row"),
        }
    }

    let line_number = cursor.line_number();
    if expected > 0 && rows.len() != expected {
        let err = ParsingError::malformed_line(
            line_number,
            "",
            format!("expected {expected} sequences, found {}", rows.len()),
        );
        if ctx.strict_sequence_count() {
            return Err(err);
        }
        ctx.warn(err);
    }
    Ok(build_records(rows, ctx, line_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorKind;

    #[test]
    fn test_placeholders_and_boundary() {
        let text = "\n     3     12  P\n\nhuman      ATG GCC AAA TTT\nchimp      ... ..T ... ...\n\
                    gorilla    ... ... ..G ...\n\nCodon usage in sequences\n";
        let mut cursor = LineCursor::from_str(text);
        let mut ctx = ParseContext::new(true);
        let seqs = parse_sequences(&mut cursor, &mut ctx, 3).unwrap();
        assert_eq!(seqs.len(), 3);
        assert_eq!(seqs[0].residues, "ATGGCCAAATTT");
        assert_eq!(seqs[1].residues, "ATGGCTAAATTT");
        assert_eq!(seqs[2].residues, "ATGGCCAAGTTT");
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn test_count_mismatch_strict_and_lenient() {
        let text = "a  ACGT\nb  ..G.\n\n";
        let mut ctx = ParseContext::new(true);
        let err = parse_sequences(&mut LineCursor::from_str(text), &mut ctx, 3).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedLine(_)));

        let mut ctx = ParseContext::new(false);
        let seqs = parse_sequences(&mut LineCursor::from_str(text), &mut ctx, 3).unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(ctx.take_warnings().len(), 1);
    }

    #[test]
    fn test_duplicate_names_renamed() {
        let text = "a  ACGT\na  ..G.\n\n";
        let mut ctx = ParseContext::new(true);
        let seqs = parse_sequences(&mut LineCursor::from_str(text), &mut ctx, 2).unwrap();
        assert_eq!(seqs[1].id, "a_2");
        assert_eq!(seqs[1].residues, "ACGT");
        assert_eq!(ctx.take_warnings().len(), 1);
    }

    #[test]
    fn test_is_sequence_row() {
        assert!(is_sequence_row("human   ATG GCC"));
        assert!(!is_sequence_row("    1    2    1"));
        assert!(!is_sequence_row("Codon frequency model: F3x4"));
        assert!(!is_sequence_row("Printing out site pattern counts"));
    }
}
