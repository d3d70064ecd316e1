//! Pairwise maximum-likelihood comparisons (`runmode = -2`).

use crate::model::{DistanceCell, DistanceMatrix, RunSummary};
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::paml::distances::{axis_names, index_bound};
use crate::parser::utils::{is_blank, parse_all_numbers, parse_number};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::BufRead;

/// `2 (chimp) ... 1 (human)`
static PAIR_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+\((.+?)\)\s*\.\.\.\s*(\d+)\s+\((.+?)\)\s*$").unwrap());
static LNL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*lnL\s*=\s*(\S+)").unwrap());
static RATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"t\s*=\s*(\S+)\s+S\s*=\s*(\S+)\s+N\s*=\s*(\S+)\s+dN/dS\s*=\s*(\S+)\s+dN\s*=\s*(\S+)\s+dS\s*=\s*(\S+)",
    )
    .unwrap()
});
static FIXED_KAPPA: Lazy<Regex> = Lazy::new(|| Regex::new(r"kappa\s*=\s*([\d.]+)\s+fixed").unwrap());

const RATE_FIELDS: [&str; 6] = ["t", "S", "N", "omega", "dN", "dS"];

/// Returns the kappa value if the model description says `kappa = K fixed`.
pub(crate) fn fixed_kappa(summary: &RunSummary) -> Option<f64> {
    summary
        .model
        .iter()
        .chain(summary.input_params.values())
        .find_map(|text| FIXED_KAPPA.captures(text))
        .and_then(|caps| parse_number(&caps[1]))
}

/// Parses the pair blocks following `pairwise comparison, codon frequencies: ...`.
///
/// Every pair `a (A) ... b (B)` contributes one cell at `[max][min]` with the
/// fields `lnL`, `t`, `kappa`, `omega`, `S`, `N`, `dN` and `dS`. With a fixed
/// kappa the estimate row holds only `t omega` and `kappa` is the fixed value.
/// A banner naming an index beyond the sequence count is malformed and its
/// block is skipped. Unknown lines are skipped; any line opening another block ends the
/// section and is pushed back.
pub(crate) fn parse_pairwise<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    summary: &RunSummary,
    sequence_names: &[String],
) -> Result<Option<DistanceMatrix>, ParsingError> {
    let kappa = fixed_kappa(summary);
    let bound = index_bound(summary.num_sequences, sequence_names);
    let mut banner_names: BTreeMap<usize, String> = BTreeMap::new();
    let mut cells: BTreeMap<(usize, usize), DistanceCell> = BTreeMap::new();
    let mut current: Option<(usize, usize)> = None;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }

        if let Some(caps) = PAIR_BANNER.captures(&line) {
            let a: usize = caps[1].parse().unwrap_or(0);
            let b: usize = caps[3].parse().unwrap_or(0);
            if a == 0 || b == 0 || a == b {
                ctx.malformed(cursor.line_number(), &line, "invalid pair indices");
                current = None;
                continue;
            }
            if a > bound || b > bound {
                ctx.malformed(
                    cursor.line_number(),
                    &line,
                    &format!("sequence index out of range (at most {bound})"),
                );
                current = None;
                continue;
            }
            banner_names.insert(a - 1, caps[2].trim().to_string());
            banner_names.insert(b - 1, caps[4].trim().to_string());
            let key = ((a - 1).max(b - 1), (a - 1).min(b - 1));
            cells.entry(key).or_default();
            current = Some(key);
        } else if let Some(caps) = LNL.captures(&line) {
            let Some(key) = current else {
                ctx.malformed(cursor.line_number(), &line, "lnL outside a pair block");
                continue;
            };
            let cell = cells.entry(key).or_default();
            if let Some(lnl) = parse_number(&caps[1]) {
                cell.insert("lnL".to_string(), lnl);
            }
            let Some(estimates) = cursor.next_non_blank()? else { break };
            match (parse_all_numbers(&estimates).as_deref(), kappa) {
                (Some(&[t, k, omega]), _) => {
                    cell.insert("t".to_string(), t);
                    cell.insert("kappa".to_string(), k);
                    cell.insert("omega".to_string(), omega);
                }
                (Some(&[t, omega]), fixed) => {
                    cell.insert("t".to_string(), t);
                    cell.insert("omega".to_string(), omega);
                    if let Some(k) = fixed {
                        cell.insert("kappa".to_string(), k);
                    }
                }
                _ => {
                    ctx.malformed(cursor.line_number(), &estimates, "expected 't kappa omega' estimates");
                    cursor.push_back(estimates);
                }
            }
        } else if let Some(caps) = RATES.captures(&line) {
            let Some(key) = current else {
                ctx.malformed(cursor.line_number(), &line, "rates outside a pair block");
                continue;
            };
            let cell = cells.entry(key).or_default();
            for (k, field) in RATE_FIELDS.iter().enumerate() {
                if let Some(v) = parse_number(&caps[k + 1]) {
                    cell.insert(field.to_string(), v);
                }
            }
        }
    }

    if cells.is_empty() {
        return Ok(None);
    }
    let size = cells
        .keys()
        .map(|(i, _)| i + 1)
        .max()
        .unwrap_or(0)
        .max(summary.num_sequences);
    let mut names = axis_names(sequence_names, size);
    for (index, name) in banner_names {
        if let Some(slot) = names.get_mut(index) {
            *slot = name;
        }
    }
    let mut matrix = DistanceMatrix::new(names, "ML");
    for ((i, j), cell) in cells {
        matrix.set(i, j, cell);
    }
    Ok(Some(matrix))
}
