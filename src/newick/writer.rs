//! Writing trees back to bracket notation.

use crate::model::tree::{PhyloTree, VertexIndex};
use crate::newick::defs::CHARS_PER_VERTEX_GUESS;
use crate::parser::utils::escape_label;
use std::io::{self, Write};

/// Returns the bracket-notation representation of the tree with closing semicolon.
///
/// Labels of all vertices (internal ones included) and branch lengths are
/// written when present; labels are escaped if necessary.
///
/// # Example
/// ```
/// use pamlwick::model::PhyloTree;
/// use pamlwick::newick::to_newick;
///
/// let mut tree = PhyloTree::new();
/// let a = tree.add_leaf(Some("A".into()), Some(1.0));
/// let b = tree.add_leaf(Some("B".into()), Some(2.5));
/// let c = tree.add_leaf(Some("C".into()), None);
/// tree.add_root(vec![a, b, c], Some("4".into()), None);
///
/// assert_eq!(to_newick(&tree), "(A:1,B:2.5,C)4;");
/// ```
pub fn to_newick(tree: &PhyloTree) -> String {
    let mut newick = String::with_capacity(tree.num_vertices() * CHARS_PER_VERTEX_GUESS);
    if tree.is_root_set() {
        write_vertex(tree, tree.root_index(), &mut newick);
    }
    newick.push(';');
    newick
}

/// Writes the given trees, one per line, to any writer.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick<W: Write>(mut writer: W, trees: &[PhyloTree]) -> io::Result<()> {
    for tree in trees {
        writer.write_all(to_newick(tree).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn write_vertex(tree: &PhyloTree, index: VertexIndex, newick: &mut String) {
    let vertex = &tree[index];
    if !vertex.is_leaf() {
        newick.push('(');
        for (i, &child) in vertex.children().iter().enumerate() {
            if i > 0 {
                newick.push(',');
            }
            write_vertex(tree, child, newick);
        }
        newick.push(')');
    }
    if let Some(label) = vertex.label() {
        newick.push_str(&escape_label(label));
    }
    if let Some(length) = vertex.branch_length() {
        newick.push(':');
        newick.push_str(&length.to_string());
    }
}
