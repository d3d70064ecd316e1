//! Sequence records.

use serde::{Deserialize, Serialize};

/// A named sequence as printed in a report (display id plus residues).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRecord {
    /// Display identifier, unique within one result
    pub id: String,
    pub residues: String,
    /// Free text; reconstruction accuracies are folded in here
    pub description: Option<String>,
}

impl SequenceRecord {
    /// Creates a record without description.
    pub fn new<S: Into<String>, T: Into<String>>(id: S, residues: T) -> Self {
        Self {
            id: id.into(),
            residues: residues.into(),
            description: None,
        }
    }

    /// Returns the number of residues (characters).
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    /// Returns whether the residue string is empty.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}
