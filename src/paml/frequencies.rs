//! Composition tables: per-sequence frequencies, codon position x base
//! tables, and the (skipped) codon usage counts.

use crate::model::{Alphabet, FrequencyKey, FrequencyTable, PositionFrequencies};
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::parser::utils::{is_blank, parse_number};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::BufRead;

static CONSTANT_SITES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*constant sites:\s*(\d+)\s*\(\s*([\d.]+)\s*%\s*\)").unwrap());
static LN_LMAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*ln Lmax \(unconstrained\)\s*=\s*(\S+)").unwrap());
static SEQUENCE_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#\d+:\s*(\S+)").unwrap());
static POSITION_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*position\s+(\d)\s*:\s*(.*)$").unwrap());
static AVERAGE_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*Average\s*(.*)$").unwrap());
static BASE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([TCAG]):\s*(-?[\d.]+)").unwrap());

const BASES: [&str; 4] = ["T", "C", "A", "G"];

// =#========================================================================#=
// FREQUENCIES
// =#========================================================================$=
/// Parses a `Frequencies..` block: a symbol header, one row per sequence
/// and usually an `Average` row.
///
/// `# constant sites: N (x%)` and `ln Lmax (unconstrained) = x` are stored
/// in `stats` as `constant_sites`, `constant_sites_percentage` and
/// `loglikelihood`; the latter ends the block. Any line opening another
/// block ends it as well and is pushed back.
///
/// # Returns
/// The table, or `None` if no symbol header was found.
pub(crate) fn parse_frequencies<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    alphabet: Alphabet,
    stats: &mut BTreeMap<String, f64>,
) -> Result<Option<FrequencyTable>, ParsingError> {
    let mut table = FrequencyTable::new(alphabet, Vec::new());

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if let Some(caps) = CONSTANT_SITES.captures(&line) {
            insert_stat(stats, "constant_sites", &caps[1]);
            insert_stat(stats, "constant_sites_percentage", &caps[2]);
            continue;
        }
        if let Some(caps) = LN_LMAX.captures(&line) {
            insert_stat(stats, "loglikelihood", &caps[1]);
            break;
        }
        if Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }

        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else { continue };
        let rest: Vec<&str> = tokens.collect();
        let values: Option<Vec<f64>> = rest.iter().map(|t| parse_number(t)).collect();

        match values {
            Some(values) if !values.is_empty() && !table.symbols.is_empty() => {
                if values.len() != table.symbols.len() {
                    ctx.malformed(
                        cursor.line_number(),
                        &line,
                        &format!("expected {} frequencies, found {}", table.symbols.len(), values.len()),
                    );
                    continue;
                }
                let key = match name {
                    "Average" => FrequencyKey::Average,
                    _ => FrequencyKey::Sequence(name.to_string()),
                };
                table.push_row(key, &values);
            }
            _ if table.rows.is_empty() && parse_number(name).is_none() && !is_numeric_row(&rest) => {
                // Symbol header, possibly wrapped over several lines
                table.symbols.extend(line.split_whitespace().map(str::to_string));
            }
            _ => ctx.malformed(cursor.line_number(), &line, "expected frequency row"),
        }
    }

    if table.symbols.is_empty() {
        return Ok(None);
    }
    Ok(Some(table))
}

fn is_numeric_row(tokens: &[&str]) -> bool {
    tokens.iter().any(|t| parse_number(t).is_some())
}

fn insert_stat(stats: &mut BTreeMap<String, f64>, key: &str, value: &str) {
    if let Some(v) = parse_number(value) {
        stats.insert(key.to_string(), v);
    }
}

// =#========================================================================#=
// CODON POSITION x BASE
// =#========================================================================$=
/// Parses a `Codon position x base (3x4) table` block.
///
/// The per-sequence variant lists groups `#k: name` of three `position`
/// rows and an `Average` row, optionally followed by an alignment-wide group
/// introduced by a bare `Average` line. The `overall` variant has a
/// single alignment-wide group.
pub(crate) fn parse_position_frequencies<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
) -> Result<Vec<PositionFrequencies>, ParsingError> {
    let mut tables = Vec::new();
    let mut current: Option<PositionFrequencies> = None;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if let Some(caps) = SEQUENCE_GROUP.captures(&line) {
            finish_group(&mut current, &mut tables);
            current = Some(new_group(Some(caps[1].to_string())));
        } else if let Some(caps) = POSITION_ROW.captures(&line) {
            let values = base_values(&caps[2]);
            let position: u8 = caps[1].parse().unwrap_or(0);
            if values.len() != BASES.len() || !(1..=3).contains(&position) {
                ctx.malformed(cursor.line_number(), &line, "expected 'position k:' with four bases");
                continue;
            }
            current
                .get_or_insert_with(|| new_group(None))
                .table
                .push_row(FrequencyKey::Position(position), &values);
        } else if let Some(caps) = AVERAGE_ROW.captures(&line) {
            let values = base_values(&caps[1]);
            if values.is_empty() {
                // Bare `Average` opens the alignment-wide group
                finish_group(&mut current, &mut tables);
                current = Some(new_group(None));
            } else {
                current
                    .get_or_insert_with(|| new_group(None))
                    .table
                    .push_row(FrequencyKey::Average, &values);
                finish_group(&mut current, &mut tables);
            }
        } else {
            cursor.push_back(line);
            break;
        }
    }
    finish_group(&mut current, &mut tables);
    Ok(tables)
}

fn new_group(sequence: Option<String>) -> PositionFrequencies {
    let symbols = BASES.iter().map(|b| b.to_string()).collect();
    PositionFrequencies {
        sequence,
        table: FrequencyTable::new(Alphabet::Nucleotide, symbols),
    }
}

fn finish_group(current: &mut Option<PositionFrequencies>, tables: &mut Vec<PositionFrequencies>) {
    if let Some(group) = current.take() {
        if !group.table.is_empty() {
            tables.push(group);
        }
    }
}

/// Reads `T:0.1 C:0.2 A:0.3 G:0.4` into values in `T C A G` order.
fn base_values(text: &str) -> Vec<f64> {
    let found: BTreeMap<&str, f64> = BASE_VALUE
        .captures_iter(text)
        .filter_map(|c| Some((c.get(1)?.as_str(), parse_number(c.get(2)?.as_str())?)))
        .collect();
    BASES.iter().filter_map(|b| found.get(b).copied()).collect()
}

// =#========================================================================#=
// CODON USAGE
// =#========================================================================$=
/// Consumes a codon usage table up to the next line that opens a block
/// other than another codon usage table (pushed back).
///
/// Codon usage counts are not collected.
pub(crate) fn skip_codon_usage<R: BufRead>(cursor: &mut LineCursor<R>) -> Result<(), ParsingError> {
    while let Some(line) = cursor.next_line()? {
        match Block::classify(&line) {
            None | Some(Block::CodonUsage) => continue,
            Some(_) => {
                cursor.push_back(line);
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequencies_until_ln_lmax() {
        let text = "\n          A      R      N      D\nhuman   0.1 0.2 0.3 0.4\nchimp   0.25 0.25 0.25 0.25\n\n\
                    ln Lmax (unconstrained) = -99.9\n\nTREE #  1\n";
        let mut cursor = LineCursor::from_str(text);
        let mut ctx = ParseContext::new(true);
        let mut stats = BTreeMap::new();
        let table = parse_frequencies(&mut cursor, &mut ctx, Alphabet::AminoAcid, &mut stats)
            .unwrap()
            .unwrap();
        assert_eq!(table.symbols, vec!["A", "R", "N", "D"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.sequence("chimp").and_then(|r| r.get("N")), Some(0.25));
        assert_eq!(stats.get("loglikelihood"), Some(&-99.9));
        assert_eq!(cursor.next_non_blank().unwrap().as_deref(), Some("TREE #  1"));
    }

    #[test]
    fn test_constant_sites_and_average() {
        let text = "   T  C  A  G\nh  0.1 0.2 0.3 0.4\nAverage 0.1 0.2 0.3 0.4\n\n#  constant sites:    321 (71.97%)\n\
                    ln Lmax (unconstrained) = -1802.108371\n";
        let mut stats = BTreeMap::new();
        let table = parse_frequencies(
            &mut LineCursor::from_str(text),
            &mut ParseContext::new(true),
            Alphabet::Nucleotide,
            &mut stats,
        )
        .unwrap()
        .unwrap();
        assert!(table.average().is_some());
        assert_eq!(stats.get("constant_sites"), Some(&321.0));
        assert_eq!(stats.get("constant_sites_percentage"), Some(&71.97));
    }

    #[test]
    fn test_position_tables() {
        let text = "\n#1: human\nposition  1:    T:0.1    C:0.2    A:0.3    G:0.4\n\
                    position  2:    T:0.2    C:0.2    A:0.3    G:0.3\nposition  3:    T:0.25    C:0.25    A:0.25    G:0.25\n\
                    Average         T:0.18    C:0.22    A:0.28    G:0.32\n\n#2: chimp\n\
                    position  1:    T:0.1    C:0.2    A:0.3    G:0.4\nAverage         T:0.1    C:0.2    A:0.3    G:0.4\n\n\
                    Average\nposition  1:    T:0.1    C:0.2    A:0.3    G:0.4\nAverage         T:0.1    C:0.2    A:0.3    G:0.4\n\n\
                    Sums of codon usage counts\n";
        let mut cursor = LineCursor::from_str(text);
        let tables = parse_position_frequencies(&mut cursor, &mut ParseContext::new(true)).unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0].sequence.as_deref(), Some("human"));
        assert_eq!(tables[0].table.rows.len(), 4);
        assert_eq!(
            tables[0].table.row(&FrequencyKey::Position(2)).and_then(|r| r.get("A")),
            Some(0.3)
        );
        assert_eq!(tables[2].sequence, None);
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("Sums of codon usage counts"));
    }
}
