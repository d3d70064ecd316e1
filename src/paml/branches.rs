//! `dN & dS for each branch` tables and the annotation of resolved vertices.

use crate::model::{NodeIdResolver, PhyloTree};
use crate::paml::context::ParseContext;
use crate::paml::defs::Block;
use crate::parser::utils::{is_blank, parse_all_numbers};
use crate::parser::{LineCursor, ParsingError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*branch\s+(.+)$").unwrap());
static ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\.\.(\d+)\s+(.+)$").unwrap());

/// Columns printed by codeml when the header row is missing
const DEFAULT_COLUMNS: [&str; 8] = ["t", "N", "S", "omega", "dN", "dS", "N*dN", "S*dS"];

/// Maps a printed column name onto its tag key.
fn tag_key(column: &str) -> String {
    match column {
        "dN/dS" | "w" => "omega".to_string(),
        other => other.to_string(),
    }
}

/// Resolves `child` through `resolver` and writes `fields` as tags onto it.
///
/// The branch `parent..child` is recorded first, so ids of internal
/// vertices resolve from the ids below them. A resolved vertex without
/// label is labelled with `child`.
///
/// # Returns
/// `false` (after recording a correlation miss) if `child` does not resolve.
pub(crate) fn annotate_branch(
    tree: &mut PhyloTree,
    resolver: &mut NodeIdResolver,
    (parent, child): (u32, u32),
    fields: &[(String, f64)],
    ctx: &mut ParseContext,
    line_number: usize,
) -> bool {
    resolver.add_branch(parent, child);
    let Some(vertex) = resolver.resolve(child, tree) else {
        ctx.correlation_miss(line_number, format!("branch {}..{} does not resolve to a vertex", parent, child));
        return false;
    };
    let vertex = tree.vertex_mut(vertex);
    if vertex.label().is_none() {
        vertex.set_label(child.to_string());
    }
    for (key, value) in fields {
        vertex.tags_mut().add(key, *value);
    }
    true
}

// =#========================================================================#=
// BRANCH TABLE
// =#========================================================================$=
/// Parses the rows of a `dN & dS for each branch` table onto `target`.
///
/// The header row (`branch t N S dN/dS dN dS N*dN S*dS`) names the fields,
/// `dN/dS` being stored as `omega`. Each row `a..b v1 v2 ...` annotates the
/// vertex for `b`. Without a target tree every row is a correlation miss.
/// The table ends at the first other line after its rows, which is pushed back.
///
/// # Returns
/// The number of annotated branches.
pub(crate) fn parse_branch_table<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    mut target: Option<(&mut PhyloTree, &mut NodeIdResolver)>,
) -> Result<usize, ParsingError> {
    let mut columns: Vec<String> = DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut rows_seen = false;
    let mut annotated = 0;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if let Some(caps) = ROW.captures(&line) {
            rows_seen = true;
            let line_number = cursor.line_number();
            let (Ok(parent), Ok(child)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
                ctx.malformed(line_number, &line, "branch ids out of range");
                continue;
            };
            let Some(values) = parse_all_numbers(&caps[3]) else {
                ctx.malformed(line_number, &line, "non-numeric branch value");
                continue;
            };
            let fields: Vec<(String, f64)> = columns.iter().cloned().zip(values).collect();
            match target.as_mut() {
                Some((tree, resolver)) => {
                    if annotate_branch(tree, resolver, (parent, child), &fields, ctx, line_number) {
                        annotated += 1;
                    }
                }
                None => ctx.correlation_miss(line_number, format!("no tree for branch {}..{}", parent, child)),
            }
            continue;
        }
        if rows_seen || Block::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }
        if let Some(caps) = HEADER.captures(&line) {
            columns = caps[1].split_whitespace().map(tag_key).collect();
        }
    }
    Ok(annotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    const TABLE: &str = "
 branch          t       N       S   dN/dS      dN      dS  N*dN  S*dS

   4..1      0.100   200.0   100.0  0.5000  0.0100  0.0200   2.0   2.0
   4..2      0.200   200.0   100.0  0.2500  0.0100  0.0400   2.0   4.0

tree length for dN:       0.0200
";

    #[test]
    fn test_rows_annotate_leaves() {
        let mut tree = parse_str("(human:0.1,chimp:0.2,gorilla:0.3);").unwrap();
        let numbered = parse_str("(1:0.1,2:0.2,3:0.3);").unwrap();
        let mut resolver = NodeIdResolver::from_numbered_tree(&numbered, &tree).unwrap();
        let mut cursor = LineCursor::from_str(TABLE);
        let mut ctx = ParseContext::new(true);

        let n = parse_branch_table(&mut cursor, &mut ctx, Some((&mut tree, &mut resolver))).unwrap();
        assert_eq!(n, 2);
        let chimp = tree.find_by_label("chimp").unwrap();
        assert_eq!(tree[chimp].tags().get_f64("omega"), Some(0.25));
        assert_eq!(tree[chimp].tags().get_f64("dS"), Some(0.04));
        assert_eq!(tree[chimp].tags().get_f64("N*dN"), Some(2.0));
        assert_eq!(cursor.next_line().unwrap().as_deref(), Some("tree length for dN:       0.0200"));
    }

    #[test]
    fn test_singleton_id_annotates_leaf_directly() {
        let mut tree = parse_str("((1,2)4,3)5;").unwrap();
        let mut resolver = NodeIdResolver::from_numbered_tree(&tree.clone(), &tree.clone()).unwrap();
        let mut ctx = ParseContext::new(true);
        let fields = vec![("dN".to_string(), 0.01)];
        assert!(annotate_branch(&mut tree, &mut resolver, (4, 1), &fields, &mut ctx, 1));

        let one = tree.find_by_label("1").unwrap();
        assert_eq!(tree[one].tags().get_f64("dN"), Some(0.01));
        let four = tree.find_by_label("4").unwrap();
        assert!(tree[four].tags().is_empty());
    }

    #[test]
    fn test_unresolved_branch_is_warning() {
        let mut cursor = LineCursor::from_str("   7..9  0.1 1 1 0.5 0.01 0.02 1 1\n");
        let mut ctx = ParseContext::new(true);
        let n = parse_branch_table(&mut cursor, &mut ctx, None).unwrap();
        assert_eq!(n, 0);
        let warnings = ctx.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!warnings[0].is_fatal());
    }
}
