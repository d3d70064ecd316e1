//! Rate-matrix and discrete-gamma estimates of nucleotide and amino-acid runs.

use crate::model::RateParameters;
use crate::paml::context::ParseContext;
use crate::parser::utils::{is_blank, parse_all_numbers, parse_number};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

static KAPPA_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Parameters \(kappa\) in the rate matrix").unwrap());
static RATE_PARAMETERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Rate parameters:\s*(.*)$").unwrap());
static BASE_FREQUENCIES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Base frequencies:\s*(.*)$").unwrap());
static RATE_MATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Rate matrix Q(?:.*Average Ts/Tv.*?=\s*(\S+))?").unwrap());
static GAMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*alpha \(gamma, K\s*=\s*(\d+)\)\s*=\s*(\S+)").unwrap());
static GAMMA_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(rate|freq):\s*(.*)$").unwrap());

/// Parses whitespace-separated numbers that must all be present,
/// recording a malformed-line warning otherwise.
fn numbers_or_warn(ctx: &mut ParseContext, line_number: usize, line: &str, text: &str) -> Option<Vec<f64>> {
    let values = parse_all_numbers(text);
    if values.is_none() {
        ctx.malformed(line_number, line, "expected numbers");
    }
    values
}

/// Discrete-gamma rate categories: `alpha (gamma, K = n) = a` plus `rate:` and `freq:` rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct GammaCategories {
    pub(crate) categories: u32,
    pub(crate) alpha: f64,
    pub(crate) rates: Vec<f64>,
    pub(crate) freqs: Vec<f64>,
}

/// Parses a gamma line and the `rate:`/`freq:` rows right after it.
///
/// # Returns
/// `None` if `first` is not a gamma line.
pub(crate) fn parse_gamma<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    first: &str,
) -> Result<Option<GammaCategories>, ParsingError> {
    let Some(caps) = GAMMA.captures(first) else {
        return Ok(None);
    };
    let Some(alpha) = parse_number(&caps[2]) else {
        ctx.malformed(cursor.line_number(), first, "invalid gamma shape");
        return Ok(None);
    };
    let mut gamma = GammaCategories {
        categories: caps[1].parse().unwrap_or(0),
        alpha,
        ..GammaCategories::default()
    };

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        let Some(row) = GAMMA_ROW.captures(&line) else {
            cursor.push_back(line);
            break;
        };
        let values = numbers_or_warn(ctx, cursor.line_number(), &line, &row[2]).unwrap_or_default();
        if &row[1] == "rate" {
            gamma.rates = values;
        } else {
            gamma.freqs = values;
        }
    }
    Ok(Some(gamma))
}

// =#========================================================================#=
// RATE PARAMETERS
// =#========================================================================$=
/// Parses one rate-parameter group, starting at its trigger line `first`, into `params`.
///
/// Groups are `Parameters (kappa) ...` (values on the next non-blank line),
/// `Rate parameters:` and `Base frequencies:` (values on the same line),
/// `Rate matrix Q, Average Ts/Tv = x` (matrix rows until a blank line) and
/// the discrete-gamma lines.
pub(crate) fn parse_rate_parameters<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    first: &str,
    params: &mut RateParameters,
) -> Result<(), ParsingError> {
    let line_number = cursor.line_number();
    if KAPPA_HEADER.is_match(first) {
        if let Some(line) = cursor.next_non_blank()? {
            match parse_all_numbers(&line) {
                Some(values) => params.kappa = values,
                None => {
                    ctx.malformed(cursor.line_number(), &line, "expected kappa values");
                    cursor.push_back(line);
                }
            }
        }
    } else if let Some(caps) = RATE_PARAMETERS.captures(first) {
        if let Some(values) = numbers_or_warn(ctx, line_number, first, &caps[1]) {
            params.rate_parameters = values;
        }
    } else if let Some(caps) = BASE_FREQUENCIES.captures(first) {
        if let Some(values) = numbers_or_warn(ctx, line_number, first, &caps[1]) {
            params.base_frequencies = values;
        }
    } else if let Some(caps) = RATE_MATRIX.captures(first) {
        params.average_ts_tv = caps.get(1).and_then(|m| parse_number(m.as_str()));
        params.rate_matrix.clear();
        while let Some(line) = cursor.next_line()? {
            match parse_all_numbers(&line) {
                Some(row) if !row.is_empty() => params.rate_matrix.push(row),
                _ => {
                    cursor.push_back(line);
                    break;
                }
            }
        }
    } else if let Some(gamma) = parse_gamma(cursor, ctx, first)? {
        params.alpha = Some(gamma.alpha);
        params.gamma_categories = Some(gamma.categories);
        params.rates = gamma.rates;
        params.freqs = gamma.freqs;
    }
    Ok(())
}
