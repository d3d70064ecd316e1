//! Ancestral reconstruction stream (`rst`).
//!
//! The reconstruction file is written next to the report and read in a
//! second, independent pass. It provides:
//! - trees whose vertices carry node ids (`tree with node labels for ...`)
//! - the per-site table of ancestral states and their probabilities
//! - substitutions along each branch, attached to the tree under `changes`
//! - extant and reconstructed sequences, with the overall accuracy of each
//!   reconstructed sequence folded into its description
//!
//! Usually reached through the [PamlParser](crate::paml::PamlParser), which
//! attaches the reconstruction to the first result. [parse_str] reads one on its own.

mod changes;
mod sites;

use crate::model::{AncestralReconstruction, PhyloTree, SequenceRecord};
use crate::paml::context::ParseContext;
use crate::paml::forestry::{is_tree_line, parse_tree_line};
use crate::paml::sequences::{build_records, split_sequence_row};
use crate::parser::utils::{is_blank, parse_numbers};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use std::io::BufRead;
use tracing::debug;

/// Tag holding the integer node id of a reconstruction-tree vertex
pub const NODE_ID_TAG: &str = "node_id";

/// Section kinds of the reconstruction stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RstBlock {
    NodeLabelTree,
    SiteTable,
    Changes,
    Sequences,
    Accuracy,
}

const RST_BLOCKS: [RstBlock; 5] = [
    RstBlock::NodeLabelTree,
    RstBlock::SiteTable,
    RstBlock::Changes,
    RstBlock::Sequences,
    RstBlock::Accuracy,
];

static RST_TRIGGERS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^tree with node labels for",
        r"^(Prob of best \w+ at each node, listed by site|\s*[Ss]ite\s+Freq\s+Data:)",
        r"^Summary of changes along branches",
        r"^List of extant and reconstructed sequences",
        r"^Overall accuracy of the \d+ ancestral sequences",
    ])
    .unwrap()
});

static LEAF_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)_(.+)$").unwrap());
static NODE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)node\s+#(\d+)").unwrap());
static ACCURACY_SITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)for a site").unwrap());
static ACCURACY_SEQUENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)for a sequence").unwrap());

impl RstBlock {
    pub(crate) fn classify(line: &str) -> Option<RstBlock> {
        RST_TRIGGERS.matches(line).iter().next().map(|i| RST_BLOCKS[i])
    }
}

/// Splits `N_name` leaf labels into name and [NODE_ID_TAG]; numeric labels
/// only get the tag.
pub(crate) fn label_node_ids(tree: &mut PhyloTree) {
    for index in 0..tree.num_vertices() {
        let vertex = tree.vertex_mut(index);
        let Some(label) = vertex.label().map(str::to_string) else {
            continue;
        };
        if let Ok(id) = label.parse::<u32>() {
            vertex.tags_mut().set(NODE_ID_TAG, id);
        } else if let Some(caps) = LEAF_LABEL.captures(&label) {
            if let Ok(id) = caps[1].parse::<u32>() {
                vertex.tags_mut().set(NODE_ID_TAG, id);
                vertex.set_label(caps[2].to_string());
            }
        }
    }
}

// =#========================================================================#=
// CORRELATOR
// =#========================================================================$=
/// Reads a whole reconstruction stream.
///
/// Sections are recognised in any order; lines outside them are skipped.
/// Problems that leave the rest usable (an unresolved branch, a site out
/// of order, accuracy vectors of different lengths) are recorded in `ctx`.
pub(crate) fn correlate<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
) -> Result<AncestralReconstruction, ParsingError> {
    let mut reconstruction = AncestralReconstruction::default();
    let mut accuracies: Option<(Vec<f64>, Vec<f64>, usize)> = None;

    while let Some(line) = cursor.next_line()? {
        let Some(block) = RstBlock::classify(&line) else {
            continue;
        };
        debug!(?block, line = cursor.line_number(), "reconstruction block");
        match block {
            RstBlock::NodeLabelTree => {
                if let Some(tree_line) = cursor.next_non_blank()? {
                    if !is_tree_line(&tree_line) {
                        cursor.push_back(tree_line);
                        continue;
                    }
                    match parse_tree_line(&tree_line, cursor.line_number()) {
                        Ok(mut tree) => {
                            label_node_ids(&mut tree);
                            reconstruction.trees.push(tree);
                        }
                        Err(e) => ctx.warn(e),
                    }
                }
            }
            RstBlock::SiteTable => {
                sites::parse_site_table(cursor, ctx, &mut reconstruction.site_probabilities)?;
            }
            RstBlock::Changes => {
                changes::parse_changes(
                    cursor,
                    ctx,
                    reconstruction.trees.last_mut(),
                    &mut reconstruction.branch_changes,
                )?;
            }
            RstBlock::Sequences => {
                reconstruction.sequences = parse_sequence_list(cursor, ctx)?;
            }
            RstBlock::Accuracy => {
                accuracies = Some(parse_accuracy(cursor)?);
            }
        }
    }

    if let Some((per_site, per_sequence, line_number)) = accuracies {
        fold_accuracy(&mut reconstruction.sequences, &per_site, &per_sequence, ctx, line_number);
    }
    Ok(reconstruction)
}

/// Reads the sequence list, naming reconstructed sequences `node#N`.
fn parse_sequence_list<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
) -> Result<Vec<SequenceRecord>, ParsingError> {
    let mut rows = Vec::new();
    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            if rows.is_empty() {
                continue;
            }
            break;
        }
        if RstBlock::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }
        let line = NODE_NAME.replace(&line, "${1}node#${2}");
        match split_sequence_row(&line) {
            Some(row) => rows.push(row),
            // row-count line above the list
            None if rows.is_empty() => continue,
            None => ctx.malformed(cursor.line_number(), &line, "expected sequence row"),
        }
    }
    Ok(build_records(rows, ctx, cursor.line_number()))
}

/// Reads the `... for a site.` and `... for a sequence.` vectors.
fn parse_accuracy<R: BufRead>(cursor: &mut LineCursor<R>) -> Result<(Vec<f64>, Vec<f64>, usize), ParsingError> {
    let line_number = cursor.line_number();
    let mut per_site = Vec::new();
    let mut per_sequence = Vec::new();
    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if let Some(caps) = ACCURACY_SITE.captures(&line) {
            per_site = parse_numbers(&caps[1]);
        } else if let Some(caps) = ACCURACY_SEQUENCE.captures(&line) {
            per_sequence = parse_numbers(&caps[1]);
        } else {
            cursor.push_back(line);
            break;
        }
    }
    Ok((per_site, per_sequence, line_number))
}

/// Writes `overall_accuracy_site=x overall_accuracy_seq=y` into the
/// descriptions of the reconstructed (`node#`) sequences, in order.
///
/// Vectors of different lengths are a correlation miss; the values are
/// then paired up as far as all three lists reach.
fn fold_accuracy(
    sequences: &mut [SequenceRecord],
    per_site: &[f64],
    per_sequence: &[f64],
    ctx: &mut ParseContext,
    line_number: usize,
) {
    let mut reconstructed: Vec<&mut SequenceRecord> =
        sequences.iter_mut().filter(|s| s.id.starts_with("node#")).collect();
    if per_site.len() != per_sequence.len() || per_site.len() != reconstructed.len() {
        ctx.correlation_miss(
            line_number,
            format!(
                "{} site and {} sequence accuracies for {} reconstructed sequences",
                per_site.len(),
                per_sequence.len(),
                reconstructed.len()
            ),
        );
    }
    for ((record, site), seq) in reconstructed.iter_mut().zip(per_site).zip(per_sequence) {
        record.description = Some(format!(
            "overall_accuracy_site={} overall_accuracy_seq={}",
            site, seq
        ));
    }
}

// ============================================================================
// Quick API (pub)
// ============================================================================
/// Parses a reconstruction stream held in a string.
///
/// # Returns
/// The reconstruction and the recoverable problems met on the way.
///
/// # Errors
/// Only I/O failures are fatal here.
///
/// # Example
/// ```
/// use pamlwick::rst;
///
/// let text = "tree with node labels for Rod Page's TreeView\n((1_human, 2_chimp) 5 , 3_gorilla) 4 ;\n";
/// let (reconstruction, warnings) = rst::parse_str(text)?;
/// let tree = &reconstruction.trees[0];
/// assert!(tree.find_by_label("human").is_some());
/// assert!(warnings.is_empty());
/// # Ok::<(), pamlwick::parser::ParsingError>(())
/// ```
pub fn parse_str(text: &str) -> Result<(AncestralReconstruction, Vec<ParsingError>), ParsingError> {
    let mut ctx = ParseContext::new(false);
    let reconstruction = correlate(&mut LineCursor::from_str(text), &mut ctx)?;
    Ok((reconstruction, ctx.take_warnings()))
}
