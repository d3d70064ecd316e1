//! Per-site table of the marginal reconstruction (`Prob of best state at each node, listed by site`).

use crate::model::{AncestralState, ExtantResidue, SiteReconstruction};
use crate::paml::context::ParseContext;
use crate::parser::utils::{is_blank, parse_number};
use crate::parser::{LineCursor, ParsingError};
use crate::rst::RstBlock;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

/// `   12     2   ATG (M) ATG (M) ... :  ATG M 0.998 (M 0.999) ...`
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s+(\d+)\s+(.*?):\s*(.*)$").unwrap());
/// `ATG (M)` on the extant side
static EXTANT_CODON: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z*\-?]{3})\s*\(([A-Z*\-?])\)").unwrap());
/// `ATG M 0.998 (M 0.999)`; the amino acid and the bracketed alternate are optional
static ANCESTRAL_CODON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z*\-]+)\s+(?:([A-Z*\-])\s+)?(\d\.\d+)(?:\s*\(\s*([A-Z*\-])\s+(\d\.\d+)\s*\))?").unwrap()
});
/// `A(0.999)` as printed by nucleotide and amino-acid runs
static ANCESTRAL_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z*\-])\((\d\.\d+)\)").unwrap());

fn parse_extant(text: &str) -> Vec<ExtantResidue> {
    if EXTANT_CODON.is_match(text) {
        return EXTANT_CODON
            .captures_iter(text)
            .map(|c| ExtantResidue {
                residue: c[1].to_string(),
                amino_acid: Some(c[2].to_string()),
            })
            .collect();
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let residues: Vec<String> = match tokens.as_slice() {
        [single] => single.chars().map(String::from).collect(),
        many => many.iter().map(|t| t.to_string()).collect(),
    };
    residues
        .into_iter()
        .map(|residue| ExtantResidue { residue, amino_acid: None })
        .collect()
}

fn parse_ancestral(text: &str) -> Vec<AncestralState> {
    if ANCESTRAL_SINGLE.is_match(text) {
        return ANCESTRAL_SINGLE
            .captures_iter(text)
            .filter_map(|c| {
                Some(AncestralState {
                    residue: c[1].to_string(),
                    amino_acid: None,
                    probability: parse_number(&c[2])?,
                    alternate: None,
                })
            })
            .collect();
    }
    ANCESTRAL_CODON
        .captures_iter(text)
        .filter_map(|c| {
            let alternate = match (c.get(4), c.get(5).and_then(|p| parse_number(p.as_str()))) {
                (Some(aa), Some(p)) => Some((aa.as_str().to_string(), p)),
                _ => None,
            };
            Some(AncestralState {
                residue: c[1].to_string(),
                amino_acid: c.get(2).map(|m| m.as_str().to_string()),
                probability: parse_number(&c[3])?,
                alternate,
            })
        })
        .collect()
}

/// Parses the site rows of a per-site table.
///
/// Rows are `site freq extant : ancestral` with increasing site numbers.
/// Skipped sites are reported once per gap and the following rows are kept
/// under their printed numbers; a row repeating or going back to an earlier
/// site is dropped. Both cases are correlation warnings. The table ends at
/// the first other line after the rows, which is pushed back.
pub(crate) fn parse_site_table<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    sites: &mut Vec<SiteReconstruction>,
) -> Result<(), ParsingError> {
    let mut rows_seen = false;
    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        let Some(caps) = ROW.captures(&line) else {
            if rows_seen || RstBlock::classify(&line).is_some() {
                cursor.push_back(line);
                break;
            }
            continue;
        };
        rows_seen = true;

        let site: u32 = caps[1].parse().unwrap_or(0);
        let expected = sites.last().map_or(1, |s| s.site + 1);
        if site < expected {
            ctx.correlation_miss(
                cursor.line_number(),
                format!("site {} out of order, expected site {}", site, expected),
            );
            continue;
        }
        if site > expected {
            ctx.correlation_miss(
                cursor.line_number(),
                format!("sites {}..{} missing from table", expected, site - 1),
            );
        }
        sites.push(SiteReconstruction {
            site,
            frequency: caps[2].parse().unwrap_or(0),
            extant: parse_extant(&caps[3]),
            ancestral: parse_ancestral(&caps[4]),
        });
    }
    Ok(())
}
