//! Tree sections: `TREE #` banners, likelihood lines and the bracket-notation
//! renderings that follow them.

use crate::model::{NodeIdResolver, PhyloTree};
use crate::newick;
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::parser::utils::{is_blank, parse_number, strip_whitespace};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;
use tracing::debug;

static TREE_BANNER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^TREE\s+#\s*\d+:?\s*(?P<tree>\(.*;)?\s*(?:MP\s+score:\s*(?P<mp>-?[\d.]+))?").unwrap()
});
static LNL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^lnL\(ntime:\s*(\d+)\s+np:\s*(\d+)\):\s*(\S+)").unwrap());
static BRANCH_IDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+\.\.\d+\s*)+$").unwrap());
pub(crate) static BRANCH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\.\.(\d+)").unwrap());
static TREE_LENGTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*tree length\s*=\s*(\S+)").unwrap());
static TREEVIEW: Lazy<Regex> = Lazy::new(|| Regex::new(r"ratios as labels for TreeView").unwrap());
static DETAILED_OUTPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Detailed output identifying parameters").unwrap());

/// A canonical tree together with the id lookup used to annotate it.
#[derive(Debug)]
pub(crate) struct Forest {
    pub(crate) tree: PhyloTree,
    pub(crate) resolver: NodeIdResolver,
}

/// Returns whether the line is a bracket-notation tree.
pub(crate) fn is_tree_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('(') && trimmed.ends_with(';')
}

/// Parses a tree line after stripping all whitespace.
///
/// # Errors
/// Bracket-notation errors are returned as malformed-line warnings at `line_number`.
pub(crate) fn parse_tree_line(line: &str, line_number: usize) -> Result<PhyloTree, ParsingError> {
    newick::parse_str(strip_whitespace(line)).map_err(|e| e.into_warning().at_line(line_number))
}

// =#========================================================================#=
// FORESTRY
// =#========================================================================$=
/// Parses one tree section, starting after its `TREE #` banner.
///
/// A report prints the same tree up to three times: in the banner (leaves
/// numbered, no lengths), as a numbered tree with branch lengths, and with
/// sequence names. The named rendering is the canonical tree; the numbered
/// rendering is paired with it leaf by leaf to build the [NodeIdResolver].
/// Without a named rendering the numbered tree (or the banner tree) is
/// canonical, and without any numbered tree ids are mapped through
/// `sequence_names`.
///
/// The section ends with `Detailed output identifying parameters` (consumed)
/// or a line opening another block (pushed back).
///
/// # Returns
/// `None` if no tree could be built.
pub(crate) fn parse_forest<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    banner: &str,
    sequence_names: &[String],
) -> Result<Option<Forest>, ParsingError> {
    let banner_line = cursor.line_number();
    let mut banner_tree = None;
    let mut parsimony_score = None;
    if let Some(caps) = TREE_BANNER.captures(banner) {
        parsimony_score = caps.name("mp").and_then(|m| parse_number(m.as_str()));
        if let Some(text) = caps.name("tree") {
            match parse_tree_line(text.as_str(), banner_line) {
                Ok(tree) => banner_tree = Some(tree),
                Err(e) => ctx.warn(e),
            }
        }
    }

    let mut numbered: Option<PhyloTree> = None;
    let mut labelled: Option<PhyloTree> = None;
    let mut branches: Vec<(u32, u32)> = Vec::new();
    let mut score = None;
    let mut num_params = None;
    let mut skip_next_tree = false;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if DETAILED_OUTPUT.is_match(&line) {
            break;
        }
        if Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }

        if let Some(caps) = LNL.captures(&line) {
            num_params = caps[2].parse::<u32>().ok();
            score = parse_number(&caps[3]);
        } else if BRANCH_IDS.is_match(&line) {
            branches.extend(BRANCH_ID.captures_iter(&line).filter_map(|c| {
                Some((c[1].parse::<u32>().ok()?, c[2].parse::<u32>().ok()?))
            }));
        } else if let Some(caps) = TREE_LENGTH.captures(&line) {
            debug!(line = cursor.line_number(), length = parse_number(&caps[1]), "tree length");
        } else if TREEVIEW.is_match(&line) {
            skip_next_tree = true;
        } else if is_tree_line(&line) {
            if std::mem::take(&mut skip_next_tree) {
                continue;
            }
            match parse_tree_line(&line, cursor.line_number()) {
                Ok(tree) if tree.has_numbered_leaves() => numbered = Some(tree),
                Ok(tree) => labelled = Some(tree),
                Err(e) => ctx.warn(e),
            }
        }
    }

    let numbered = numbered.or_else(|| banner_tree.filter(PhyloTree::has_numbered_leaves));
    let (mut tree, mut resolver) = match (labelled, numbered) {
        (Some(labelled), Some(numbered)) => {
            let resolver = NodeIdResolver::from_numbered_tree(&numbered, &labelled).unwrap_or_else(|msg| {
                ctx.correlation_miss(banner_line, msg);
                NodeIdResolver::from_leaf_names(sequence_names, &labelled)
            });
            (labelled, resolver)
        }
        (Some(labelled), None) => {
            let resolver = NodeIdResolver::from_leaf_names(sequence_names, &labelled);
            (labelled, resolver)
        }
        (None, Some(numbered)) => match NodeIdResolver::from_numbered_tree(&numbered, &numbered) {
            Ok(resolver) => (numbered, resolver),
            Err(msg) => {
                ctx.correlation_miss(banner_line, msg);
                (numbered, NodeIdResolver::new())
            }
        },
        (None, None) => return Ok(None),
    };

    for (parent, child) in branches {
        resolver.add_branch(parent, child);
    }
    if let Some(score) = score {
        tree.set_score(score);
    }
    if let Some(np) = num_params {
        tree.set_name(format!("num_param:{}", np));
    }
    if let Some(mp) = parsimony_score {
        tree.set_parsimony_score(mp);
    }
    Ok(Some(Forest { tree, resolver }))
}
