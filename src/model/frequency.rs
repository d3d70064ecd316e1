//! Composition tables (base, codon position or amino-acid frequencies).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Symbol set of a frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alphabet {
    Nucleotide,
    Codon,
    AminoAcid,
}

/// Key of one row in a [FrequencyTable].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FrequencyKey {
    /// Row of a per-sequence table
    Sequence(String),
    /// Codon position (1 to 3) of a positional table
    Position(u8),
    /// Trailing aggregate row
    Average,
}

/// One row of symbol frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub key: FrequencyKey,
    pub values: BTreeMap<String, f64>,
}

impl FrequencyRow {
    /// Returns the frequency of `symbol`.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.values.get(symbol).copied()
    }
}

/// Ordered rows of symbol frequencies, usually ending with an `Average` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub alphabet: Alphabet,
    /// Column symbols in printed order
    pub symbols: Vec<String>,
    pub rows: Vec<FrequencyRow>,
}

impl FrequencyTable {
    /// Creates an empty table over the given symbols.
    pub fn new(alphabet: Alphabet, symbols: Vec<String>) -> Self {
        Self {
            alphabet,
            symbols,
            rows: Vec::new(),
        }
    }

    /// Appends a row, pairing values with the symbols in order.
    pub fn push_row(&mut self, key: FrequencyKey, values: &[f64]) {
        let values = self.symbols.iter().cloned().zip(values.iter().copied()).collect();
        self.rows.push(FrequencyRow { key, values });
    }

    /// Returns the row with the given key.
    pub fn row(&self, key: &FrequencyKey) -> Option<&FrequencyRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Returns the row of the named sequence.
    pub fn sequence(&self, name: &str) -> Option<&FrequencyRow> {
        self.rows
            .iter()
            .find(|r| matches!(&r.key, FrequencyKey::Sequence(s) if s == name))
    }

    /// Returns the aggregate row.
    pub fn average(&self) -> Option<&FrequencyRow> {
        self.row(&FrequencyKey::Average)
    }

    /// Returns whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Codon position x base table of one sequence, or of the whole alignment (`sequence == None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFrequencies {
    pub sequence: Option<String>,
    /// Rows `Position(1..=3)` plus `Average`, over `T C A G`
    pub table: FrequencyTable,
}
