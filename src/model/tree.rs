//! Arena-based phylogenetic tree.
//!
//! Provides core data structures for representing trees found in reports:
//! * [PhyloTree] - Tree structure using the arena pattern, with any number
//!   of children per vertex and an open tag map per vertex
//! * [VertexIndex] as type used to index vertices in tree

use crate::model::vertex::Vertex;
use crate::newick;
use serde::{Deserialize, Serialize};

/// Index of a vertex in a tree (arena).
pub type VertexIndex = usize;

/// *During construction only*, index for unset root.
const NO_ROOT_SET_INDEX: VertexIndex = usize::MAX;

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A phylogenetic tree represented using the arena pattern on [Vertex].
///
/// Vertices are stored in a contiguous vector and referenced by
/// [VertexIndex], so vertex identity survives any number of annotation
/// passes and can be shared with lookup tables such as the
/// [NodeIdResolver](crate::model::NodeIdResolver).
///
/// # Structure
/// - All vertices (root, internal, and leaves) are stored in the arena.
/// - Index of root is maintained.
/// - Children are stored in the order they appear in bracket notation,
///   and the Newick parser adds vertices bottom-up, left to right.
///   Two trees parsed from strings with the same bracket structure thus
///   have identical index layouts.
/// - Branch lengths are optional.
///
/// # Tree-level data
/// - `name`: identity label, e.g. `num_param:10` for trees from a likelihood run
/// - `score`: log-likelihood of the tree
/// - `parsimony_score`: maximum-parsimony score from the tree banner, if printed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhyloTree {
    /// Vertices of this tree (arena pattern)
    vertices: Vec<Vertex>,

    /// Index of the root of this tree
    root_index: VertexIndex,

    name: Option<String>,
    score: Option<f64>,
    parsimony_score: Option<f64>,
}

impl Default for PhyloTree {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl PhyloTree {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        PhyloTree {
            vertices: Vec::new(),
            root_index: NO_ROOT_SET_INDEX,
            name: None,
            score: None,
            parsimony_score: None,
        }
    }

    /// Creates a new empty tree with space for `num_vertices` vertices.
    pub fn with_capacity(num_vertices: usize) -> Self {
        let mut tree = Self::new();
        tree.vertices.reserve(num_vertices);
        tree
    }

    /// Adds a leaf to the tree, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `label` - Label of the leaf (sequence name or number), if any
    /// * `branch_length` - Length of incoming branch
    pub fn add_leaf(&mut self, label: Option<String>, branch_length: Option<f64>) -> VertexIndex {
        let index = self.vertices.len();
        self.vertices.push(Vertex::new(index, Vec::new(), label, branch_length));
        index
    }

    /// Adds a vertex above the given children, assigning a unique index, which gets returned.
    ///
    /// # Arguments
    /// * `children` - Indices of already added vertices
    /// * `label` - Optional label (e.g. node number)
    /// * `branch_length` - Length of incoming branch
    ///
    /// # Panics
    /// Panics if a child index is out of bounds.
    pub fn add_internal(
        &mut self,
        children: Vec<VertexIndex>,
        label: Option<String>,
        branch_length: Option<f64>,
    ) -> VertexIndex {
        let index = self.vertices.len();
        for &child in &children {
            self.vertices[child].set_parent(index);
        }
        self.vertices.push(Vertex::new(index, children, label, branch_length));
        index
    }

    /// Adds a vertex above the given children and makes it the root.
    ///
    /// # Returns
    /// The index of the newly created root vertex.
    pub fn add_root(
        &mut self,
        children: Vec<VertexIndex>,
        label: Option<String>,
        branch_length: Option<f64>,
    ) -> VertexIndex {
        let index = self.add_internal(children, label, branch_length);
        self.root_index = index;
        index
    }

    /// Marks an existing parentless vertex as root (e.g. a single-leaf tree).
    pub fn set_root(&mut self, index: VertexIndex) {
        self.root_index = index;
    }

    /// Returns reference to name of this tree, or `None` if not set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set a name for this tree.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Returns the log-likelihood score, if known.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Sets the log-likelihood score.
    pub fn set_score(&mut self, score: f64) {
        self.score = Some(score);
    }

    /// Returns the maximum-parsimony score, if printed.
    pub fn parsimony_score(&self) -> Option<f64> {
        self.parsimony_score
    }

    /// Sets the maximum-parsimony score.
    pub fn set_parsimony_score(&mut self, score: f64) {
        self.parsimony_score = Some(score);
    }

    /// Returns whether root of tree has been set.
    pub fn is_root_set(&self) -> bool {
        self.root_index != NO_ROOT_SET_INDEX
    }

    /// Returns a reference to the root vertex.
    ///
    /// # Panics
    /// Panics if the root hasn't been set.
    pub fn root(&self) -> &Vertex {
        &self[self.root_index]
    }

    /// Returns the index of the root.
    pub fn root_index(&self) -> VertexIndex {
        self.root_index
    }

    /// Returns a reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex(&self, index: VertexIndex) -> &Vertex {
        &self[index]
    }

    /// Returns a mutable reference to the vertex at the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn vertex_mut(&mut self, index: VertexIndex) -> &mut Vertex {
        &mut self.vertices[index]
    }

    /// Returns all vertices in arena order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of leaves in this tree.
    pub fn num_leaves(&self) -> usize {
        self.vertices.iter().filter(|&v| v.is_leaf()).count()
    }

    /// Returns the number of internal (non-leaf) vertices in this tree, root included.
    pub fn num_internal(&self) -> usize {
        self.vertices.len() - self.num_leaves()
    }

    /// Returns the number of vertices in this tree.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the leaf indices in left-to-right order of the bracket notation.
    pub fn leaves(&self) -> Vec<VertexIndex> {
        self.pre_order_iter()
            .filter(|v| v.is_leaf())
            .map(|v| v.index())
            .collect()
    }

    /// Returns the index of the first vertex (in pre-order) carrying `label`.
    pub fn find_by_label(&self, label: &str) -> Option<VertexIndex> {
        self.pre_order_iter()
            .find(|v| v.label() == Some(label))
            .map(|v| v.index())
    }

    /// Returns whether every leaf label is a positive integer,
    /// as in the numbered trees of a report.
    pub fn has_numbered_leaves(&self) -> bool {
        let mut leaves = self.vertices.iter().filter(|v| v.is_leaf()).peekable();
        leaves.peek().is_some()
            && leaves.all(|v| v.label().is_some_and(|l| l.parse::<u32>().is_ok()))
    }

    /// Returns the number of edges between the vertex and the root.
    pub fn depth(&self, index: VertexIndex) -> usize {
        let mut depth = 0;
        let mut current = index;
        while let Some(parent) = self[current].parent() {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Returns the lowest common ancestor of two vertices.
    ///
    /// The LCA of a vertex with itself (or with one of its descendants) is the vertex itself.
    pub fn lca(&self, a: VertexIndex, b: VertexIndex) -> VertexIndex {
        let (mut a, mut b) = (a, b);
        let (mut depth_a, mut depth_b) = (self.depth(a), self.depth(b));
        while depth_a > depth_b {
            a = self.parent_or_self(a);
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = self.parent_or_self(b);
            depth_b -= 1;
        }
        while a != b {
            a = self.parent_or_self(a);
            b = self.parent_or_self(b);
        }
        a
    }

    /// Folds a set of vertices pairwise through [lca](Self::lca) until one vertex remains.
    ///
    /// # Returns
    /// `None` for an empty set, the vertex itself for a singleton.
    pub fn lca_of(&self, vertices: &[VertexIndex]) -> Option<VertexIndex> {
        let (&first, rest) = vertices.split_first()?;
        Some(rest.iter().fold(first, |acc, &v| self.lca(acc, v)))
    }

    /// Returns the sum of all branch lengths in the tree.
    pub fn total_branch_length(&self) -> f64 {
        self.vertices.iter().filter_map(|v| v.branch_length()).sum()
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is valid and the root has no parent
    /// - All vertex indices match their position in the arena
    /// - All children point back to their parent and vice versa
    /// - Every vertex is reachable from the root
    pub fn is_valid(&self) -> bool {
        if !self.is_root_set() || self.root_index >= self.vertices.len() {
            return false;
        }
        if self.vertices[self.root_index].parent().is_some() {
            return false;
        }

        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.index() != index {
                return false;
            }
            for &child in vertex.children() {
                if child >= self.vertices.len() || self.vertices[child].parent() != Some(index) {
                    return false;
                }
            }
            if let Some(parent) = vertex.parent() {
                if parent >= self.vertices.len() || !self.vertices[parent].children().contains(&index) {
                    return false;
                }
            }
        }

        self.pre_order_iter().count() == self.vertices.len()
    }

    /// Convenience method to convert this tree to a Newick string
    pub fn to_newick(&self) -> String {
        newick::to_newick(self)
    }

    fn parent_or_self(&self, index: VertexIndex) -> VertexIndex {
        self[index].parent().unwrap_or(index)
    }
}

impl std::ops::Index<VertexIndex> for PhyloTree {
    type Output = Vertex;

    fn index(&self, index: VertexIndex) -> &Self::Output {
        &self.vertices[index]
    }
}

impl std::ops::IndexMut<VertexIndex> for PhyloTree {
    fn index_mut(&mut self, index: VertexIndex) -> &mut Self::Output {
        &mut self.vertices[index]
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl PhyloTree {
    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children).
    ///
    /// Children are visited in the order they were written.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

/// Iterator for post-order traversal (children before parents).
///
/// Uses a stack instead of recursion; each vertex is visited after all its descendants.
pub struct PostOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<(VertexIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a PhyloTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push((tree.root_index, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vertex = &self.tree[index];

            if children_visited || vertex.is_leaf() {
                return Some(vertex);
            }

            self.stack.push((index, true));
            // Push in reverse, so the leftmost child is processed first
            for &child in vertex.children().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
pub struct PreOrderIter<'a> {
    tree: &'a PhyloTree,
    stack: Vec<VertexIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a PhyloTree) -> Self {
        let mut stack = Vec::new();
        if tree.is_root_set() {
            stack.push(tree.root_index);
        }
        PreOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vertex;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vertex = &self.tree[index];
        for &child in vertex.children().iter().rev() {
            self.stack.push(child);
        }
        Some(vertex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((A,B)x,C,(D,E)y)r
    fn sample() -> (PhyloTree, [VertexIndex; 8]) {
        let mut tree = PhyloTree::new();
        let a = tree.add_leaf(Some("A".into()), Some(0.1));
        let b = tree.add_leaf(Some("B".into()), Some(0.2));
        let x = tree.add_internal(vec![a, b], Some("x".into()), Some(0.3));
        let c = tree.add_leaf(Some("C".into()), Some(0.4));
        let d = tree.add_leaf(Some("D".into()), None);
        let e = tree.add_leaf(Some("E".into()), None);
        let y = tree.add_internal(vec![d, e], Some("y".into()), None);
        let r = tree.add_root(vec![x, c, y], None, None);
        (tree, [a, b, x, c, d, e, y, r])
    }

    #[test]
    fn test_structure_and_validity() {
        let (tree, [a, _, x, c, _, _, _, r]) = sample();
        assert!(tree.is_valid());
        assert_eq!(tree.num_leaves(), 5);
        assert_eq!(tree.num_internal(), 3);
        assert_eq!(tree.root_index(), r);
        assert_eq!(tree[a].parent(), Some(x));
        assert_eq!(tree.root().children().len(), 3);
        assert_eq!(tree.depth(a), 2);
        assert_eq!(tree.depth(c), 1);
        assert!((tree.total_branch_length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lca() {
        let (tree, [a, b, x, c, d, e, y, r]) = sample();
        assert_eq!(tree.lca(a, b), x);
        assert_eq!(tree.lca(a, a), a);
        assert_eq!(tree.lca(a, x), x);
        assert_eq!(tree.lca(a, c), r);
        assert_eq!(tree.lca(d, e), y);
        assert_eq!(tree.lca_of(&[a]), Some(a));
        assert_eq!(tree.lca_of(&[a, b, d]), Some(r));
        assert_eq!(tree.lca_of(&[]), None);
    }

    #[test]
    fn test_orders_and_lookup() {
        let (tree, [a, b, _, c, d, e, _, _]) = sample();
        assert_eq!(tree.leaves(), vec![a, b, c, d, e]);
        let post: Vec<_> = tree.post_order_iter().filter_map(|v| v.label()).collect();
        assert_eq!(post, vec!["A", "B", "x", "C", "D", "E", "y"]);
        assert_eq!(tree.find_by_label("y"), Some(6));
        assert_eq!(tree.find_by_label("Z"), None);
        assert!(!tree.has_numbered_leaves());
    }
}
