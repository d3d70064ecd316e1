//! Vertex of a [PhyloTree](crate::model::PhyloTree).

use crate::model::annotation::Tags;
use crate::model::tree::VertexIndex;
use serde::{Deserialize, Serialize};

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// Represents a vertex (node) in a phylogenetic tree.
///
/// Trees in PAML reports are rooted at an arbitrary (often trifurcating)
/// vertex, so a vertex has any number of children:
/// - **Root**: no parent
/// - **Internal**: parent and at least one child; may carry a label
///   (e.g. a node number in reconstruction trees)
/// - **Leaf**: parent and no children; carries the sequence name
///
/// # Invariants
/// - `index` is the position in the tree arena
/// - `parent` is `None` exactly for the root (and during construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    index: VertexIndex,
    parent: Option<VertexIndex>,
    children: Vec<VertexIndex>,
    label: Option<String>,
    branch_length: Option<f64>,
    tags: Tags,
}

impl Vertex {
    /// Creates a new vertex without parent.
    ///
    /// # Arguments
    /// * `index` - The unique index of this vertex in the tree (arena)
    /// * `children` - Child indices (empty for a leaf)
    /// * `label` - Optional label
    /// * `branch_length` - Optional length of the branch to the parent
    pub fn new(
        index: VertexIndex,
        children: Vec<VertexIndex>,
        label: Option<String>,
        branch_length: Option<f64>,
    ) -> Self {
        Vertex {
            index,
            parent: None,
            children,
            label,
            branch_length,
            tags: Tags::new(),
        }
    }

    /// Returns the index of this vertex.
    pub fn index(&self) -> VertexIndex {
        self.index
    }

    /// Returns the index of the parent, `None` for the root.
    pub fn parent(&self) -> Option<VertexIndex> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: VertexIndex) {
        self.parent = Some(parent);
    }

    /// Returns the child indices in the order they were written.
    pub fn children(&self) -> &[VertexIndex] {
        &self.children
    }

    /// Returns `true` if this vertex has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if this vertex has a parent and children.
    pub fn is_internal(&self) -> bool {
        self.parent.is_some() && !self.children.is_empty()
    }

    /// Returns `true` if this vertex has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets (or replaces) the label.
    pub fn set_label<S: Into<String>>(&mut self, label: S) {
        self.label = Some(label.into());
    }

    /// Returns the length of the branch to the parent, if known.
    pub fn branch_length(&self) -> Option<f64> {
        self.branch_length
    }

    /// Sets the length of the branch to the parent.
    pub fn set_branch_length(&mut self, length: Option<f64>) {
        self.branch_length = length;
    }

    /// Returns the tags of this vertex.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Returns the tags of this vertex for modification.
    pub fn tags_mut(&mut self) -> &mut Tags {
        &mut self.tags
    }
}
