//! Strict lower-triangular distance matrices.
//!
//! Pairwise results are printed for `i > j` only, so [DistanceMatrix]
//! stores exactly that triangle in packed form. Reading the diagonal or
//! the upper triangle through [DistanceMatrix::get] yields `None`;
//! [DistanceMatrix::get_symmetric] mirrors the request instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named numeric fields of one matrix cell (e.g. `omega`, `dN`, `dS`).
pub type DistanceCell = BTreeMap<String, f64>;

// =#========================================================================#=
// DISTANCE MATRIX
// =#========================================================================$=
/// Square matrix over the sequence set with defined cells for `i > j` only.
///
/// # Example
/// ```
/// use pamlwick::model::DistanceMatrix;
///
/// let mut m = DistanceMatrix::new(vec!["A".into(), "B".into(), "C".into()], "NG86");
/// m.set_field(0, 2, "dN", 0.01);
/// assert_eq!(m.value(2, 0, "dN"), Some(0.01));
/// assert!(m.get(0, 2).is_none());
/// assert_eq!(m.get_symmetric(0, 2), m.get(2, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    method: String,
    names: Vec<String>,
    /// Row-major packed lower triangle: `(i, j)` with `i > j` at `i*(i-1)/2 + j`
    cells: Vec<Option<DistanceCell>>,
    /// Matrix-wide parameters (e.g. a fixed `alpha`)
    parameters: BTreeMap<String, f64>,
}

impl DistanceMatrix {
    /// Creates an empty matrix over the given names.
    ///
    /// # Arguments
    /// * `names` - Axis labels in sequence order
    /// * `method` - Name of the estimation method (e.g. `NG86`, `ML`, `YN00`)
    pub fn new<S: Into<String>>(names: Vec<String>, method: S) -> Self {
        let n = names.len();
        Self {
            method: method.into(),
            names,
            cells: vec![None; n * n.saturating_sub(1) / 2],
            parameters: BTreeMap::new(),
        }
    }

    /// Returns the number of rows (equal to the number of columns).
    pub fn size(&self) -> usize {
        self.names.len()
    }

    /// Returns the axis labels.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the name of the estimation method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the position of `name` on the axes.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns the matrix-wide parameters.
    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        &self.parameters
    }

    /// Records a matrix-wide parameter.
    pub fn set_parameter(&mut self, key: &str, value: f64) {
        self.parameters.insert(key.to_string(), value);
    }

    fn packed_index(&self, i: usize, j: usize) -> Option<usize> {
        (i > j && i < self.size()).then(|| i * (i - 1) / 2 + j)
    }

    /// Returns cell `(i, j)`; defined only for `i > j`.
    pub fn get(&self, i: usize, j: usize) -> Option<&DistanceCell> {
        self.packed_index(i, j).and_then(|k| self.cells[k].as_ref())
    }

    /// Returns cell `(i, j)` or `(j, i)`, whichever is in the lower triangle.
    pub fn get_symmetric(&self, i: usize, j: usize) -> Option<&DistanceCell> {
        self.get(i.max(j), i.min(j))
    }

    /// Returns one field of cell `(i, j)`; defined only for `i > j`.
    pub fn value(&self, i: usize, j: usize, field: &str) -> Option<f64> {
        self.get(i, j).and_then(|c| c.get(field).copied())
    }

    /// Stores a whole cell for the pair `{i, j}` at `(max, min)`.
    ///
    /// # Returns
    /// `false` (and stores nothing) for the diagonal or out-of-range indices.
    pub fn set(&mut self, i: usize, j: usize, cell: DistanceCell) -> bool {
        match self.packed_index(i.max(j), i.min(j)) {
            Some(k) => {
                self.cells[k] = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Sets one field of the cell for the pair `{i, j}`, creating the cell if needed.
    ///
    /// # Returns
    /// `false` (and stores nothing) for the diagonal or out-of-range indices.
    pub fn set_field(&mut self, i: usize, j: usize, field: &str, value: f64) -> bool {
        match self.packed_index(i.max(j), i.min(j)) {
            Some(k) => {
                self.cells[k]
                    .get_or_insert_with(DistanceCell::new)
                    .insert(field.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Returns the number of defined cells.
    pub fn num_defined(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Iterates over all defined cells as `(i, j, cell)` with `i > j`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &DistanceCell)> {
        (1..self.size())
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .filter_map(|(i, j)| self.get(i, j).map(|c| (i, j, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{i}")).collect()
    }

    #[test]
    fn test_defined_iff_lower_triangle() {
        let mut m = DistanceMatrix::new(names(4), "ML");
        for i in 0..4 {
            for j in 0..4 {
                m.set_field(i, j, "t", (i * 10 + j) as f64);
            }
        }
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(m.get(i, j).is_some(), i > j, "cell ({i}, {j})");
                if i != j {
                    assert_eq!(m.get_symmetric(i, j), m.get_symmetric(j, i));
                }
            }
        }
        assert_eq!(m.num_defined(), 6);
        assert_eq!(m.iter().count(), 6);
    }

    #[test]
    fn test_set_rejects_diagonal_and_out_of_range() {
        let mut m = DistanceMatrix::new(names(2), "NG86");
        assert!(!m.set(1, 1, DistanceCell::new()));
        assert!(!m.set_field(5, 0, "dN", 1.0));
        assert!(m.set(0, 1, DistanceCell::from([("omega".to_string(), 0.5)])));
        assert_eq!(m.value(1, 0, "omega"), Some(0.5));
        assert_eq!(m.index_of("s1"), Some(1));
    }
}
