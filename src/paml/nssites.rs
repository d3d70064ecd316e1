//! Site-class (NSsites) model sections: one `Model N:` banner each, holding
//! trees, class proportions and ratios, shape parameters and the
//! positively selected sites.

use crate::model::{SelectedSite, ShapeParams, SiteClassModel, SiteClasses};
use crate::paml::branches::parse_branch_table;
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::paml::forestry::parse_forest;
use crate::paml::rates::parse_gamma;
use crate::parser::utils::{is_blank, parse_all_numbers, parse_number};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::BufRead;
use tracing::debug;

static BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:NSsites\s+)?Model\s+(\d+)\s*:\s*(.*?)\s*$").unwrap());
static KAPPA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*kappa \(ts/tv\)\s*=\s*(\S+)").unwrap());
static OMEGA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*omega \(dN/dS\)\s*=\s*(\S+)").unwrap());
static PROPORTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*p:\s+(.*)$").unwrap());
static OMEGAS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*w:\s+(.*)$").unwrap());
static BETA: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*p\s*=\s*(\S+)\s+q\s*=\s*(\S+)").unwrap());
static BETA_W: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*p0\s*=\s*(\S+)\s+p\s*=\s*(\S+)\s+q\s*=\s*(\S+)").unwrap());
static POSITIVE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(p1\s*=\s*(\S+)\)\s+w\s*=\s*(\S+)").unwrap());
static NEB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Naive Empirical Bayes \(NEB\)").unwrap());
static BEB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Bayes Empirical Bayes \(BEB\)").unwrap());

/// `   28 T      0.998**       4.236 +- 0.620`
static SITE_FULL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+([A-Z*\-])\s+(\d+\.\d+)(\**)\s+(\d+\.\d+)\s+\+-\s+(\d+\.\d+)\s*$").unwrap()
});
/// `   28 T      0.998**       4.236`
static SITE_MEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s+([A-Z*\-])\s+(\d+\.\d+)(\**)\s+(\d+\.\d+)\s*$").unwrap());
/// `   28 T      0.998**`
static SITE_PROB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s+([A-Z*\-])\s+(\d+\.\d+)(\**)\s*$").unwrap());

/// Which selected-site list rows currently go to
#[derive(Debug, Clone, Copy, PartialEq)]
enum SiteList {
    None,
    Neb,
    Beb,
}

/// Parses a positively-selected-site row of any of the three printed widths.
///
/// A missing significance marker yields an empty `significance`.
///
/// # Example
/// ```text
///    28 T      0.998**       4.236 +- 0.620   -> all fields
///    45 R      0.700                           -> no marker, no mean
/// ```
fn parse_site_row(line: &str) -> Option<SelectedSite> {
    let site = |caps: &Captures, mean: Option<f64>, se: Option<f64>| -> Option<SelectedSite> {
        Some(SelectedSite {
            position: caps[1].parse().ok()?,
            residue: caps[2].to_string(),
            probability: parse_number(&caps[3])?,
            significance: caps[4].to_string(),
            mean_omega: mean,
            standard_error: se,
        })
    };
    if let Some(caps) = SITE_FULL.captures(line) {
        site(&caps, parse_number(&caps[5]), parse_number(&caps[6]))
    } else if let Some(caps) = SITE_MEAN.captures(line) {
        site(&caps, parse_number(&caps[5]), None)
    } else if let Some(caps) = SITE_PROB.captures(line) {
        site(&caps, None, None)
    } else {
        None
    }
}

fn number_at(caps: &Captures, group: usize) -> Option<f64> {
    caps.get(group).and_then(|m| parse_number(m.as_str()))
}

// =#========================================================================#=
// SITE CLASS MODEL
// =#========================================================================$=
/// Parses one `Model N: description` section, starting after its banner.
///
/// Trees and `dN & dS` tables inside the section are parsed with the
/// forestry and branch grammars and kept in the model. The section ends at
/// `Time used` (consumed), or at the next model banner, a document boundary
/// or the end of input (pushed back). The likelihood of the model is the
/// score of its last tree.
pub(crate) fn parse_site_class_model<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    banner: &str,
    sequence_names: &[String],
) -> Result<SiteClassModel, ParsingError> {
    let mut model = match BANNER.captures(banner) {
        Some(caps) => SiteClassModel::new(caps[1].parse().unwrap_or(0), &caps[2]),
        None => SiteClassModel::new(0, banner.trim()),
    };
    debug!(model = model.model_num, line = cursor.line_number(), "site-class model");

    let mut resolver = None;
    let mut proportions: Option<Vec<f64>> = None;
    let mut site_list = SiteList::None;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        let line_number = cursor.line_number();

        match Block::classify(&line) {
            Some(Block::TimeUsed) => break,
            Some(Block::SiteClassModel) | Some(Block::Header) | Some(Block::DataSet) => {
                cursor.push_back(line);
                break;
            }
            Some(Block::Tree) => {
                if let Some(forest) = parse_forest(cursor, ctx, &line, sequence_names)? {
                    model.trees.push(forest.tree);
                    resolver = Some(forest.resolver);
                }
                continue;
            }
            Some(Block::BranchTable) => {
                let target = model.trees.last_mut().zip(resolver.as_mut());
                parse_branch_table(cursor, ctx, target)?;
                continue;
            }
            _ => {}
        }

        if let Some(caps) = KAPPA.captures(&line) {
            model.kappa = number_at(&caps, 1);
        } else if let Some(caps) = OMEGA.captures(&line) {
            // one-ratio model: a single class holding every site
            if let Some(omega) = number_at(&caps, 1) {
                model.site_classes = Some(SiteClasses { proportions: vec![1.0], omegas: vec![omega] });
            }
        } else if let Some(caps) = PROPORTIONS.captures(&line) {
            proportions = parse_all_numbers(&caps[1]);
            if proportions.is_none() {
                ctx.malformed(line_number, &line, "non-numeric class proportions");
            }
        } else if let Some(caps) = OMEGAS.captures(&line) {
            match (proportions.take(), parse_all_numbers(&caps[1])) {
                (Some(p), Some(w)) if p.len() == w.len() => {
                    model.site_classes = Some(SiteClasses { proportions: p, omegas: w });
                }
                _ => ctx.malformed(line_number, &line, "class ratios do not align with proportions"),
            }
        } else if let Some(caps) = BETA_W.captures(&line) {
            if let (Some(p0), Some(p), Some(q)) = (number_at(&caps, 1), number_at(&caps, 2), number_at(&caps, 3)) {
                model.shape_params = Some(ShapeParams::BetaW { p0, p, q, p1: None, w: None });
            }
        } else if let Some(caps) = POSITIVE_CLASS.captures(&line) {
            if let Some(ShapeParams::BetaW { p1, w, .. }) = model.shape_params.as_mut() {
                *p1 = number_at(&caps, 1);
                *w = number_at(&caps, 2);
            }
        } else if let Some(caps) = BETA.captures(&line) {
            if let (Some(p), Some(q)) = (number_at(&caps, 1), number_at(&caps, 2)) {
                model.shape_params = Some(ShapeParams::Beta { p, q });
            }
        } else if let Some(gamma) = parse_gamma(cursor, ctx, &line)? {
            model.shape_params = Some(ShapeParams::Gamma {
                gamma: gamma.alpha,
                rates: gamma.rates,
                freqs: gamma.freqs,
            });
        } else if NEB.is_match(&line) {
            model.neb_sites = Some(Vec::new());
            site_list = SiteList::Neb;
        } else if BEB.is_match(&line) {
            model.beb_sites = Some(Vec::new());
            site_list = SiteList::Beb;
        } else if let Some(site) = parse_site_row(&line) {
            let list = match site_list {
                SiteList::Neb => model.neb_sites.as_mut(),
                SiteList::Beb => model.beb_sites.as_mut(),
                SiteList::None => None,
            };
            if let Some(list) = list {
                list.push(site);
            }
        }
    }

    model.likelihood = model.trees.last().and_then(|t| t.score());
    Ok(model)
}
