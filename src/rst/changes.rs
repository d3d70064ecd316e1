//! `Summary of changes along branches.`
//!
//! Branches are printed as `Branch k:  a..b  (name)` followed by one line
//! per substitution. The ids refer to the node labels of the preceding
//! reconstruction tree: leaves `1..=ns` in sequence order, ancestors above.

use crate::model::{PhyloTree, SubstitutionEvent, VertexIndex};
use crate::paml::context::ParseContext;
use crate::parser::utils::{is_blank, parse_number};
use crate::parser::{LineCursor, ParsingError};
use crate::rst::{NODE_ID_TAG, RstBlock};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::BufRead;

static BRANCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*Branch\s+\d+:\s+(\d+)\.\.(\d+)").unwrap());
/// `   12 GCC (A) 0.998 -> GCT (A) 0.610`
static CODON_EVENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(\d+)\s+([A-Za-z*\-]{3})\s+\(([A-Z*\-])\)\s+(\d\.\d+)\s+->\s+([A-Za-z*\-]{3})\s+\(([A-Z*\-])\)(?:\s+(\d\.\d+))?",
    )
    .unwrap()
});
/// `   12 A 0.998 -> V 0.610` with or without the derived probability
static SINGLE_EVENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+([A-Za-z*\-])\s+(\d\.\d+)\s+->\s+([A-Za-z*\-])(?:\s+(\d\.\d+))?").unwrap()
});

fn parse_event(line: &str) -> Option<SubstitutionEvent> {
    if let Some(c) = CODON_EVENT.captures(line) {
        return Some(SubstitutionEvent {
            site: c[1].parse().ok()?,
            ancestral: c[2].to_string(),
            ancestral_amino_acid: Some(c[3].to_string()),
            ancestral_probability: parse_number(&c[4])?,
            derived: c[5].to_string(),
            derived_amino_acid: Some(c[6].to_string()),
            derived_probability: c.get(7).and_then(|m| parse_number(m.as_str())),
        });
    }
    let c = SINGLE_EVENT.captures(line)?;
    Some(SubstitutionEvent {
        site: c[1].parse().ok()?,
        ancestral: c[2].to_string(),
        ancestral_amino_acid: None,
        ancestral_probability: parse_number(&c[3])?,
        derived: c[4].to_string(),
        derived_amino_acid: None,
        derived_probability: c.get(5).and_then(|m| parse_number(m.as_str())),
    })
}

/// Lists the vertices of `tree` by node id, with an empty sentinel at index 0.
///
/// # Example
/// For `((1_a,2_b)5,3_c)4;` the order is `[-, a, b, c, 4, 5]`, so
/// `order[k]` is the vertex with id `k` when ids are contiguous.
pub(crate) fn node_order(tree: &PhyloTree) -> Vec<Option<(u32, VertexIndex)>> {
    let mut ids: Vec<(u32, VertexIndex)> = tree
        .vertices()
        .iter()
        .filter_map(|v| {
            let id = v.tags().get(NODE_ID_TAG)?.as_f64()? as u32;
            Some((id, v.index()))
        })
        .collect();
    ids.sort_unstable();
    std::iter::once(None).chain(ids.into_iter().map(Some)).collect()
}

/// Parses the branch-change summary and attaches each event to the vertex
/// at the right end of its branch, under the tag `changes`.
///
/// Events are also collected in `branch_changes` under `"a..b"`. Without
/// a tree, or when the id does not match the node order, the events are
/// kept in `branch_changes` only and a correlation warning is recorded.
pub(crate) fn parse_changes<R: BufRead>(
    cursor: &mut LineCursor<R>,
    ctx: &mut ParseContext,
    mut tree: Option<&mut PhyloTree>,
    branch_changes: &mut BTreeMap<String, Vec<SubstitutionEvent>>,
) -> Result<(), ParsingError> {
    let order = tree.as_deref().map(node_order).unwrap_or_default();
    let mut current: Option<(String, Option<VertexIndex>)> = None;

    while let Some(line) = cursor.next_line()? {
        if is_blank(&line) {
            continue;
        }
        if RstBlock::classify(&line).is_some() {
            cursor.push_back(line);
            break;
        }

        if let Some(caps) = BRANCH.captures(&line) {
            let key = format!("{}..{}", &caps[1], &caps[2]);
            let child: usize = caps[2].parse().unwrap_or(0);
            let vertex = match order.get(child) {
                Some(Some((id, vertex))) if *id as usize == child => Some(*vertex),
                _ => {
                    ctx.correlation_miss(cursor.line_number(), format!("branch {} has no vertex in the tree", key));
                    None
                }
            };
            branch_changes.entry(key.clone()).or_default();
            current = Some((key, vertex));
        } else if let Some(event) = parse_event(&line) {
            let Some((key, vertex)) = current.as_ref() else {
                continue;
            };
            if let (Some(vertex), Some(tree)) = (vertex, tree.as_deref_mut()) {
                tree.vertex_mut(*vertex).tags_mut().add("changes", event.clone());
            }
            branch_changes.entry(key.clone()).or_default().push(event);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rst::label_node_ids;
    use crate::newick::parse_str;

    #[test]
    fn test_events_attach_to_child_vertex() {
        let mut tree = parse_str("((1_human,2_chimp)5,3_gorilla)4;").unwrap();
        label_node_ids(&mut tree);
        let text = "Check root for directions of change.\n\n\
                    Branch 1:    4..5  \n\n\
                    Branch 2:    5..1  (human) \n\n    2 GCC (A) 0.998 -> GCT (A) 0.990\n   17 AAA (K) 1.000 -> AGA (R)\n\n\
                    Branch 3:    5..2  (chimp) \n\n\
                    List of extant and reconstructed sequences\n";
        let mut cursor = LineCursor::from_str(text);
        let mut ctx = ParseContext::new(true);
        let mut changes = BTreeMap::new();
        parse_changes(&mut cursor, &mut ctx, Some(&mut tree), &mut changes).unwrap();

        let human = tree.find_by_label("human").unwrap();
        let events = tree[human].tags().get_all("changes");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].as_change().unwrap().derived_amino_acid.as_deref(), Some("R"));
        assert_eq!(events[1].as_change().unwrap().derived_probability, None);
        assert_eq!(changes["5..1"].len(), 2);
        assert!(changes["5..2"].is_empty());
        assert!(ctx.take_warnings().is_empty());
        assert_eq!(
            cursor.next_line().unwrap().as_deref(),
            Some("List of extant and reconstructed sequences")
        );
    }

    #[test]
    fn test_amino_acid_events_without_tree() {
        let text = "Branch 1:    4..1  (human)\n\n   3 A 0.998 -> V\n";
        let mut cursor = LineCursor::from_str(text);
        let mut ctx = ParseContext::new(true);
        let mut changes = BTreeMap::new();
        parse_changes(&mut cursor, &mut ctx, None, &mut changes).unwrap();
        assert_eq!(changes["4..1"][0].derived, "V");
        assert_eq!(ctx.take_warnings().len(), 1);
    }
}
