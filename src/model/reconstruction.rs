//! Ancestral-sequence reconstruction records from the secondary stream.

use crate::model::sequence::SequenceRecord;
use crate::model::tree::PhyloTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One substitution along a branch, e.g. `12 CTG (L) 0.998 -> CTA (L) 0.521`.
///
/// For amino-acid or nucleotide reconstructions only `ancestral` and
/// `derived` are set; codon reconstructions also carry the translated residues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionEvent {
    /// 1-based alignment site
    pub site: u32,
    pub ancestral: String,
    pub ancestral_amino_acid: Option<String>,
    pub ancestral_probability: f64,
    pub derived: String,
    pub derived_amino_acid: Option<String>,
    pub derived_probability: Option<f64>,
}

/// An observed residue at a leaf: codon (or base/amino acid) and its translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtantResidue {
    pub residue: String,
    pub amino_acid: Option<String>,
}

/// Best reconstructed state at one internal node for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncestralState {
    pub residue: String,
    pub amino_acid: Option<String>,
    pub probability: f64,
    /// Amino acid and probability from the alternate (amino-acid level)
    /// reconstruction, printed in parentheses after the codon call
    pub alternate: Option<(String, f64)>,
}

/// One row of the per-site table `Prob of best state at each node, listed by site`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReconstruction {
    /// 1-based site number
    pub site: u32,
    /// Number of identical site patterns
    pub frequency: u32,
    /// Observed residues, one per extant sequence
    pub extant: Vec<ExtantResidue>,
    /// Reconstructed states, one per internal node in node-number order
    pub ancestral: Vec<AncestralState>,
}

/// Everything taken from the ancestral reconstruction stream.
///
/// Substitution events are also attached to the vertices of the tree they
/// belong to under the tag `changes`; [branch_changes](Self::branch_changes)
/// offers the same events keyed by branch (`"7..1"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AncestralReconstruction {
    pub trees: Vec<PhyloTree>,
    /// Per-site table in increasing site order; gaps are possible
    pub site_probabilities: Vec<SiteReconstruction>,
    pub branch_changes: BTreeMap<String, Vec<SubstitutionEvent>>,
    /// Extant and reconstructed (`node#N`) sequences
    pub sequences: Vec<SequenceRecord>,
}

impl AncestralReconstruction {
    /// Returns the reconstruction of the given 1-based site.
    pub fn site(&self, site: u32) -> Option<&SiteReconstruction> {
        let index = (site as usize).checked_sub(1)?;
        match self.site_probabilities.get(index) {
            Some(found) if found.site == site => Some(found),
            _ => self
                .site_probabilities
                .binary_search_by_key(&site, |s| s.site)
                .ok()
                .map(|i| &self.site_probabilities[i]),
        }
    }

    /// Returns whether nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.site_probabilities.is_empty() && self.sequences.is_empty()
    }
}
