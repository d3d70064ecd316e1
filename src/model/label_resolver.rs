//! Resolution of integer node ids to vertices of a tree.
//!
//! Reports refer to tree vertices by integer ids: leaves are numbered
//! `1..=ns` in sequence order, internal vertices get ids above `ns` that
//! only appear in branch keys such as `7..1`. The [NodeIdResolver] maps each
//! id to the set of vertices of the canonical (labelled) tree it covers.
//! Resolving an id folds that set through lowest-common-ancestor queries
//! until one vertex remains.

use crate::model::tree::{PhyloTree, VertexIndex};
use std::collections::{BTreeMap, BTreeSet};

// =#========================================================================#=
// NODE ID RESOLVER
// =#========================================================================$=
/// Lookup table from node ids to vertex sets of one canonical tree.
///
/// Ids get their vertex set in one of two ways:
/// 1. Directly, from a numbered tree paired with the canonical tree
///    ([from_numbered_tree](Self::from_numbered_tree)) or from the
///    sequence order ([from_leaf_names](Self::from_leaf_names)).
/// 2. Progressively, through recorded `parent..child` branches
///    ([add_branch](Self::add_branch)): an id without direct entry covers
///    the union of what its children cover.
///
/// # Example
/// ```
/// use pamlwick::model::NodeIdResolver;
/// use pamlwick::newick::parse_str;
///
/// let numbered = parse_str("((1,2),3);").unwrap();
/// let labelled = parse_str("((human,chimp),gorilla);").unwrap();
/// let mut resolver = NodeIdResolver::from_numbered_tree(&numbered, &labelled).unwrap();
/// resolver.add_branch(5, 4);
/// resolver.add_branch(4, 1);
/// resolver.add_branch(4, 2);
///
/// let human = labelled.find_by_label("human").unwrap();
/// assert_eq!(resolver.resolve(1, &labelled), Some(human));
/// assert_eq!(resolver.resolve(4, &labelled), labelled[human].parent());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeIdResolver {
    direct: BTreeMap<u32, Vec<VertexIndex>>,
    children: BTreeMap<u32, Vec<u32>>,
}

impl NodeIdResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs a numbered tree with the canonical tree by leaf order.
    ///
    /// The `k`-th leaf (left to right) of `numbered` is matched with the
    /// `k`-th leaf of `canonical`. Every vertex of `numbered` whose label is
    /// an integer gets an entry: leaves their partner, internal vertices the
    /// union of their children.
    ///
    /// # Errors
    /// Returns a message if the trees differ in their number of leaves.
    pub fn from_numbered_tree(numbered: &PhyloTree, canonical: &PhyloTree) -> Result<Self, String> {
        let numbered_leaves = numbered.leaves();
        let canonical_leaves = canonical.leaves();
        if numbered_leaves.len() != canonical_leaves.len() {
            return Err(format!(
                "numbered tree has {} leaves, labelled tree has {}",
                numbered_leaves.len(),
                canonical_leaves.len()
            ));
        }

        let partner: BTreeMap<VertexIndex, VertexIndex> =
            numbered_leaves.into_iter().zip(canonical_leaves).collect();
        let mut covered: BTreeMap<VertexIndex, Vec<VertexIndex>> = BTreeMap::new();
        let mut resolver = Self::new();

        for vertex in numbered.post_order_iter() {
            let set = match partner.get(&vertex.index()) {
                Some(&leaf) => vec![leaf],
                None => vertex
                    .children()
                    .iter()
                    .filter_map(|c| covered.get(c))
                    .flatten()
                    .copied()
                    .collect(),
            };
            if let Some(id) = vertex.label().and_then(|l| l.parse::<u32>().ok()) {
                resolver.direct.insert(id, set.clone());
            }
            covered.insert(vertex.index(), set);
        }
        Ok(resolver)
    }

    /// Maps id `k` to the leaf of `canonical` labelled with the `k`-th name.
    ///
    /// Used when no numbered tree was printed; names not found in the tree are skipped.
    pub fn from_leaf_names(names: &[String], canonical: &PhyloTree) -> Self {
        let mut resolver = Self::new();
        for leaf in canonical.leaves() {
            let label = canonical[leaf].label();
            if let Some(k) = names.iter().position(|n| Some(n.as_str()) == label) {
                resolver.direct.insert(k as u32 + 1, vec![leaf]);
            }
        }
        resolver
    }

    /// Records the branch `parent..child`.
    pub fn add_branch(&mut self, parent: u32, child: u32) {
        let children = self.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Returns whether anything is known about `id`.
    pub fn contains(&self, id: u32) -> bool {
        self.direct.contains_key(&id) || self.children.contains_key(&id)
    }

    /// Returns the canonical vertices covered by `id`, or `None` if it covers none.
    pub fn covered(&self, id: u32) -> Option<Vec<VertexIndex>> {
        let mut set = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(direct) = self.direct.get(&current) {
                set.extend(direct.iter().copied());
            } else if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().copied());
            }
        }
        (!set.is_empty()).then(|| set.into_iter().collect())
    }

    /// Resolves `id` to a single vertex of `tree` by folding its covered set through LCA.
    ///
    /// A singleton set resolves to its own vertex.
    pub fn resolve(&self, id: u32, tree: &PhyloTree) -> Option<VertexIndex> {
        let covered = self.covered(id)?;
        if covered.iter().any(|&v| v >= tree.num_vertices()) {
            return None;
        }
        tree.lca_of(&covered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    #[test]
    fn test_single_numbered_tree_resolves_to_itself() {
        let tree = parse_str("((1,2)4,3)5;").unwrap();
        let resolver = NodeIdResolver::from_numbered_tree(&tree, &tree).unwrap();
        let one = tree.find_by_label("1").unwrap();
        let four = tree.find_by_label("4").unwrap();
        assert_eq!(resolver.resolve(1, &tree), Some(one));
        assert_eq!(resolver.resolve(4, &tree), Some(four));
        assert_eq!(resolver.resolve(5, &tree), Some(tree.root_index()));
        assert_eq!(resolver.resolve(6, &tree), None);
    }

    #[test]
    fn test_progressive_branches() {
        let numbered = parse_str("(1,2,(3,(4,5)));").unwrap();
        let labelled = parse_str("(a,b,(c,(d,e)));").unwrap();
        let mut resolver = NodeIdResolver::from_numbered_tree(&numbered, &labelled).unwrap();
        for (parent, child) in [(6, 1), (6, 2), (6, 7), (7, 3), (7, 8), (8, 4), (8, 5)] {
            resolver.add_branch(parent, child);
        }
        let d = labelled.find_by_label("d").unwrap();
        let c = labelled.find_by_label("c").unwrap();
        let eight = labelled[d].parent().unwrap();
        assert_eq!(resolver.resolve(8, &labelled), Some(eight));
        assert_eq!(resolver.resolve(7, &labelled), labelled[c].parent());
        assert_eq!(resolver.resolve(6, &labelled), Some(labelled.root_index()));
        assert!(resolver.contains(7));
    }

    #[test]
    fn test_leaf_count_mismatch_and_names() {
        let numbered = parse_str("(1,2,3);").unwrap();
        let labelled = parse_str("(a,b);").unwrap();
        assert!(NodeIdResolver::from_numbered_tree(&numbered, &labelled).is_err());

        let names = vec!["b".to_string(), "a".to_string()];
        let resolver = NodeIdResolver::from_leaf_names(&names, &labelled);
        assert_eq!(resolver.resolve(1, &labelled), labelled.find_by_label("b"));
    }
}
