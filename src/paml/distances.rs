//! Lower-triangular distance matrices: Nei & Gojobori (1986), amino-acid
//! and nucleotide distances, and the Yang & Nielsen (2000) table.

use crate::model::{DistanceCell, DistanceMatrix, Dialect};
use crate::paml::context::ParseContext;
use crate::paml::defs::{Block, METHOD_BANNER};
use crate::parser::utils::{is_blank, parse_number};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

const NUM: &str = r"(-?\d+\.\d+(?:[eE][-+]?\d+)?|-?nan)";

/// `w (dN dS)`
static NG86_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{NUM}\s*\(\s*{NUM}\s+{NUM}\s*\)")).unwrap());
/// `d( k)`
static NT_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"{NUM}\s*\(\s*{NUM}\s*\)")).unwrap());
static NT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Distances:\s*(\S+)(?:.*alpha set at\s*([\d.]+))?").unwrap());
static AA_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^AA distances\s*\(([^)]*)\)").unwrap());
static YN00_COLUMNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*seq\.\s+seq\.").unwrap());

const YN00_FIELDS: [&str; 9] = ["S", "N", "t", "kappa", "omega", "dN", "dN_SE", "dS", "dS_SE"];

/// Maximal number of note/citation lines between a banner and its matrix.
///
/// Newer versions print a citation below the yn00 banner, and the
/// `(Pairwise deletion)` note was added to the codon-model banner in version 4.
fn ng86_preamble_lines(dialect: Option<Dialect>, version: Option<(u32, u32)>) -> usize {
    match (dialect, version) {
        (Some(Dialect::PairwiseDistance), Some((major, _))) if major >= 4 => 5,
        (Some(Dialect::PairwiseDistance), _) => 3,
        (_, Some((major, _))) if major >= 4 => 3,
        _ => 2,
    }
}

// =#========================================================================#=
// GENERIC LOWER TRIANGLE
// =#========================================================================$=
/// Reads `name cell cell ...` rows of a lower-triangular matrix.
///
/// Row `i` must contain exactly `i` cells. Before the first row, blank
/// lines, banners of the same block and up to `max_preamble` note lines
/// (starting with `(`, `Use`, or prose) are skipped. The matrix ends at a
/// blank line after rows, or at (pushed back) any line not shaped like a row.
fn parse_lower_triangle<R: BufRead, F>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    method: &str,
    max_preamble: usize,
    parse_cells: F,
) -> Result<Option<DistanceMatrix>, ParsingError>
where
    F: Fn(&str) -> Option<Vec<DistanceCell>>,
{
    let own_block = Block::classify(method);
    let mut preamble_left = max_preamble;
    let mut rows: Vec<(String, Vec<DistanceCell>)> = Vec::new();

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        let trimmed = line.trim();
        let mut tokens = trimmed.splitn(2, char::is_whitespace);
        let name = tokens.next().unwrap_or("");
        let rest = tokens.next().unwrap_or("");

        if rows.is_empty() {
            let block = Block::classify(&line);
            if block.is_some() && block == own_block {
                continue;
            }
            if rest.trim().is_empty() && !name.starts_with('(') && block.is_none() {
                rows.push((name.to_string(), Vec::new()));
                continue;
            }
            if block.is_none() && preamble_left > 0 {
                preamble_left -= 1;
                continue;
            }
            if block.is_none() {
                ctx.malformed(cursor.line_number(), &line, "expected start of distance matrix");
            }
            cursor.push_back(line);
            return Ok(None);
        }

        match parse_cells(rest) {
            Some(cells) if cells.len() == rows.len() => rows.push((name.to_string(), cells)),
            Some(cells) if !cells.is_empty() => {
                ctx.malformed(
                    cursor.line_number(),
                    &line,
                    &format!("expected {} cells, found {}", rows.len(), cells.len()),
                );
                rows.push((name.to_string(), cells));
            }
            _ => {
                cursor.push_back(line);
                break;
            }
        }
    }

    if rows.is_empty() {
        return Ok(None);
    }
    let names = rows.iter().map(|(n, _)| n.clone()).collect();
    let mut matrix = DistanceMatrix::new(names, method_name(method));
    for (i, (_, cells)) in rows.into_iter().enumerate() {
        for (j, cell) in cells.into_iter().enumerate().take(i) {
            matrix.set(i, j, cell);
        }
    }
    Ok(Some(matrix))
}

fn method_name(banner: &str) -> String {
    match Block::classify(banner) {
        Some(Block::Ng86) => "NG86".to_string(),
        Some(Block::AaDistances) => "AA".to_string(),
        _ => banner.trim().to_string(),
    }
}

/// Cells are all the regex matches in `rest`, which must not contain anything else.
fn cells_from_regex(rest: &str, regex: &Regex, fields: &[&str]) -> Option<Vec<DistanceCell>> {
    let mut cells = Vec::new();
    let mut covered = 0;
    for caps in regex.captures_iter(rest) {
        covered += caps.get(0).map_or(0, |m| m.as_str().split_whitespace().count());
        let mut cell = DistanceCell::new();
        for (k, field) in fields.iter().enumerate() {
            cell.insert(field.to_string(), parse_number(caps.get(k + 1)?.as_str())?);
        }
        cells.push(cell);
    }
    (covered == rest.split_whitespace().count()).then_some(cells)
}

// =#========================================================================#=
// SECTION GRAMMARS
// =#========================================================================$=
/// Parses a Nei & Gojobori (1986) matrix of `omega (dN dS)` cells.
pub(crate) fn parse_ng86<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    banner: &str,
) -> Result<Option<DistanceMatrix>, ParsingError> {
    let max_preamble = ng86_preamble_lines(ctx.dialect(), ctx.version());
    parse_lower_triangle(cursor, ctx, banner, max_preamble, |rest| {
        cells_from_regex(rest, &NG86_CELL, &["omega", "dN", "dS"])
    })
}

/// Parses an `AA distances (...)` matrix of single `distance` values.
pub(crate) fn parse_aa_distances<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    banner: &str,
) -> Result<Option<DistanceMatrix>, ParsingError> {
    let matrix = parse_lower_triangle(cursor, ctx, banner, 1, |rest| {
        rest.split_whitespace()
            .map(|t| parse_number(t).map(|v| DistanceCell::from([("distance".to_string(), v)])))
            .collect()
    })?;
    Ok(matrix.map(|mut m| {
        if let Some(caps) = AA_HEADER.captures(banner) {
            m = rename(m, &format!("AA {}", &caps[1]));
        }
        m
    }))
}

/// Parses a `Distances: MODEL (kappa) (alpha set at A)` matrix of `d( k)` cells,
/// stored as `kappa` and `alpha`. The model name becomes the method and a
/// fixed alpha is recorded as matrix parameter.
pub(crate) fn parse_nt_distances<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    banner: &str,
) -> Result<Option<DistanceMatrix>, ParsingError> {
    let matrix = parse_lower_triangle(cursor, ctx, banner, 2, |rest| {
        cells_from_regex(rest, &NT_CELL, &["kappa", "alpha"])
    })?;
    let Some(mut matrix) = matrix else {
        return Ok(None);
    };
    if let Some(caps) = NT_HEADER.captures(banner) {
        matrix = rename(matrix, &caps[1]);
        if let Some(alpha) = caps.get(2).and_then(|a| parse_number(a.as_str())) {
            matrix.set_parameter("alpha", alpha);
        }
    }
    Ok(Some(matrix))
}

fn rename(matrix: DistanceMatrix, method: &str) -> DistanceMatrix {
    let mut renamed = DistanceMatrix::new(matrix.names().to_vec(), method);
    for (i, j, cell) in matrix.iter() {
        renamed.set(i, j, cell.clone());
    }
    for (key, value) in matrix.parameters() {
        renamed.set_parameter(key, *value);
    }
    renamed
}

/// Parses the `(B) Yang & Nielsen (2000) method` table.
///
/// Rows `i j S N t kappa omega dN +- SE dS +- SE` give 1-based sequence
/// indices; `names` label the axes (numbers are used where missing).
/// Rows with an index beyond `num_sequences` and the known names are
/// skipped as malformed. The table ends at a blank line after rows or at
/// the next method banner.
pub(crate) fn parse_yn00<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    num_sequences: usize,
    names: &[String],
) -> Result<Option<DistanceMatrix>, ParsingError> {
    let bound = index_bound(num_sequences, names);
    let mut entries: Vec<(usize, usize, DistanceCell)> = Vec::new();
    let mut in_table = false;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            if entries.is_empty() {
                continue;
            }
            break;
        }
        if METHOD_BANNER.is_match(&line) || Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }
        if YN00_COLUMNS.is_match(&line) {
            in_table = true;
            continue;
        }
        if !in_table {
            continue; // citation and weighting notes
        }
        let values: Option<Vec<f64>> = line
            .split_whitespace()
            .filter(|t| *t != "+-")
            .map(parse_number)
            .collect();
        match values {
            Some(values) if values.len() == 2 + YN00_FIELDS.len() => {
                let (i, j) = (values[0] as usize, values[1] as usize);
                if i == 0 || j == 0 || i == j {
                    ctx.malformed(cursor.line_number(), &line, "invalid sequence indices");
                    continue;
                }
                if i > bound || j > bound {
                    ctx.malformed(
                        cursor.line_number(),
                        &line,
                        &format!("sequence index out of range (at most {bound})"),
                    );
                    continue;
                }
                let cell = YN00_FIELDS
                    .iter()
                    .zip(&values[2..])
                    .map(|(f, v)| (f.to_string(), *v))
                    .collect();
                entries.push((i - 1, j - 1, cell));
            }
            _ => ctx.malformed(cursor.line_number(), &line, "expected yn00 row"),
        }
    }

    if entries.is_empty() {
        return Ok(None);
    }
    let size = entries.iter().map(|(i, j, _)| i.max(j) + 1).max().unwrap_or(0);
    let axis = axis_names(names, size);
    let mut matrix = DistanceMatrix::new(axis, "YN00");
    for (i, j, cell) in entries {
        matrix.set(i, j, cell);
    }
    Ok(Some(matrix))
}

/// Largest 1-based sequence index a pairwise row may refer to.
pub(crate) fn index_bound(num_sequences: usize, names: &[String]) -> usize {
    num_sequences.max(names.len())
}

/// Returns `names` if it covers `size` entries, otherwise `1..=size` as strings.
pub(crate) fn axis_names(names: &[String], size: usize) -> Vec<String> {
    if names.len() >= size && size > 0 {
        names.to_vec()
    } else {
        (1..=size).map(|k| k.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ng86_with_notes() {
        let banner = "Nei & Gojobori 1986. dN/dS (dN, dS)";
        let text = "(Pairwise deletion)\n(Note: This matrix is not used in later ML. analysis.\n\
                    Use runmode = -2 for ML pairwise comparison.)\n\nhuman\n\
                    chimp        0.2782 (0.1226 0.4406)\n\
                    gorilla      0.3000 (0.0100 0.0333) -1.0000 (0.0000 0.0000)\n\n";
        let mut ctx = ParseContext::new(true);
        ctx.set_program(Dialect::CodonModel, Some("4.9".into()));
        let m = parse_ng86(&mut LineCursor::from_str(text), &mut ctx, banner).unwrap().unwrap();
        assert_eq!(m.size(), 3);
        assert_eq!(m.method(), "NG86");
        assert_eq!(m.value(1, 0, "omega"), Some(0.2782));
        assert_eq!(m.value(2, 1, "dS"), Some(0.0));
        assert_eq!(m.value(2, 0, "dN"), Some(0.01));
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn test_nt_distances() {
        let banner = "Distances: HKY85 (kappa) (alpha set at 0.50)";
        let text = "This matrix is not used in later m.l. analysis.\n\nhuman\n\
                    chimpanzee   0.0321( 5.8101)\ngorilla      0.0468( 6.5678)  0.0497( 7.3000)\n\nTREE # 1\n";
        let mut ctx = ParseContext::new(true);
        let m = parse_nt_distances(&mut LineCursor::from_str(text), &mut ctx, banner).unwrap().unwrap();
        assert_eq!(m.method(), "HKY85");
        assert_eq!(m.parameters().get("alpha"), Some(&0.5));
        assert_eq!(m.value(2, 1, "kappa"), Some(0.0497));
        assert_eq!(m.value(2, 1, "alpha"), Some(7.3));
    }

    #[test]
    fn test_aa_distances() {
        let banner = "AA distances (raw proportions of different sites)";
        let text = "\nhuman\nchimp    0.0123\ngorilla  0.0200  0.0150\n\n";
        let mut ctx = ParseContext::new(true);
        let m = parse_aa_distances(&mut LineCursor::from_str(text), &mut ctx, banner).unwrap().unwrap();
        assert_eq!(m.method(), "AA raw proportions of different sites");
        assert_eq!(m.value(2, 1, "distance"), Some(0.015));
    }

    #[test]
    fn test_yn00_table() {
        let text = "\nYang Z, Nielsen R (2000) Estimating synonymous rates. Mol. Biol. Evol. 17:32-43\n\n\
                    (equal weighting of pathways)\n\nseq. seq.     S       N        t   kappa   omega     dN +- SE    dS +- SE\n\n\
                    2    1    89.1   342.9   0.5066  2.3478  0.2709 0.0992 +- 0.0154  0.3661 +- 0.0564\n\n\
                    (C) LWL85, LPB93 & LWLm methods\n";
        let names = vec!["human".to_string(), "chimp".to_string()];
        let mut cursor = LineCursor::from_str(text);
        let m = parse_yn00(&mut cursor, &mut ParseContext::new(true), 2, &names).unwrap().unwrap();
        assert_eq!(m.names(), &names[..]);
        assert_eq!(m.value(1, 0, "omega"), Some(0.2709));
        assert_eq!(m.value(1, 0, "dS_SE"), Some(0.0564));
    }

    #[test]
    fn test_yn00_out_of_range_row_is_skipped() {
        let text = "seq. seq.     S       N        t   kappa   omega     dN +- SE    dS +- SE\n\n\
                    3000000    1    89.1   342.9   0.5066  2.3478  0.2709 0.0992 +- 0.0154  0.3661 +- 0.0564\n\
                    2    1    89.1   342.9   0.5066  2.3478  0.2709 0.0992 +- 0.0154  0.3661 +- 0.0564\n\n";
        let names = vec!["human".to_string(), "chimp".to_string()];
        let mut ctx = ParseContext::new(true);
        let m = parse_yn00(&mut LineCursor::from_str(text), &mut ctx, 2, &names).unwrap().unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.num_defined(), 1);
        let warnings = ctx.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].kind(), crate::parser::ErrorKind::MalformedLine(_)));
    }

    const YN00_CITATION_NOTES: &str = "Nei & Gojobori 1986. dN/dS (dN, dS)\n\
        Nei M, Gojobori T (1986) Simple methods for estimating the numbers of\n\
        synonymous and nonsynonymous nucleotide substitutions. Mol. Biol. Evol. 3:418-426\n\
        (Pairwise deletion)\n\
        (Note: This matrix is not used in later ML. analysis.\n\
        Use runmode = -2 for ML pairwise comparison.)\n\n\
        human\n\
        chimp          -1.0000 (0.0000 0.3333)\n\n";

    #[test]
    fn test_ng86_preamble_before_version_4() {
        let banner = "Nei & Gojobori 1986. dN/dS (dN, dS)";
        let text = "(Note: This matrix is not used in later ML. analysis.\n\
                    Use runmode = -2 for ML pairwise comparison.)\n\nhuman\n\
                    chimp        0.2782 (0.1226 0.4406)\n\n";
        let mut ctx = ParseContext::new(true);
        ctx.set_program(Dialect::CodonModel, Some("3.14".into()));
        assert_eq!(ng86_preamble_lines(ctx.dialect(), ctx.version()), 2);
        let m = parse_ng86(&mut LineCursor::from_str(text), &mut ctx, banner).unwrap().unwrap();
        assert_eq!(m.names(), ["human", "chimp"]);
        assert_eq!(m.value(1, 0, "dN"), Some(0.1226));
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn test_ng86_yn00_citation_preamble() {
        let mut ctx = ParseContext::new(true);
        ctx.set_program(Dialect::PairwiseDistance, Some("4.9".into()));
        assert_eq!(ng86_preamble_lines(ctx.dialect(), ctx.version()), 5);
        let banner = "(A) Nei-Gojobori (1986) method";
        let m = parse_ng86(&mut LineCursor::from_str(YN00_CITATION_NOTES), &mut ctx, banner)
            .unwrap()
            .unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.value(1, 0, "dS"), Some(0.3333));
        assert!(ctx.take_warnings().is_empty());
    }

    #[test]
    fn test_ng86_preamble_longer_than_version_allows() {
        let banner = "(A) Nei-Gojobori (1986) method";
        for (dialect, version) in [(Dialect::PairwiseDistance, "3.15"), (Dialect::CodonModel, "3.14")] {
            let mut ctx = ParseContext::new(true);
            ctx.set_program(dialect, Some(version.into()));
            let mut cursor = LineCursor::from_str(YN00_CITATION_NOTES);
            assert!(parse_ng86(&mut cursor, &mut ctx, banner).unwrap().is_none());
            let warnings = ctx.take_warnings();
            assert_eq!(warnings.len(), 1);
            assert!(matches!(warnings[0].kind(), crate::parser::ErrorKind::MalformedLine(_)));
        }
    }
}
