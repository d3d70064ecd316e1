//! Block kinds of a report and their trigger lines.
//!
//! Every section grammar starts at a recognisable line. [Block::classify]
//! maps a line onto the block it opens with a single [RegexSet] pass;
//! the first matching pattern (in declaration order) wins.

use crate::model::Dialect;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

/// Default file name of the ancestral reconstruction stream.
pub(crate) const DEFAULT_RECONSTRUCTION_FILE: &str = "rst";

/// File size threshold (in bytes) for the automatic read strategy.
/// Files smaller than this are read into memory; larger files use buffered I/O.
pub(crate) const AUTO_IN_MEMORY_THRESHOLD: u64 = 64 * 1024 * 1024;

/// Report block types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Block {
    /// `CODONML (in paml version 4.9, March 2015) ...`
    Header,
    /// `Data set 2`
    DataSet,
    /// Heuristic tree search or star decomposition, not supported
    Heuristic,
    /// `ns =   5  ls = 300`
    Patterns,
    /// `Codon usage in sequences` or `Sums of codon usage counts`
    CodonUsage,
    /// `Codon position x base (3x4) table ...`
    PositionFrequencies,
    /// `Frequencies..`
    Frequencies,
    /// `Nei & Gojobori 1986. dN/dS (dN, dS)` or `(A) Nei-Gojobori (1986) method`
    Ng86,
    /// `AA distances (...)`
    AaDistances,
    /// `Distances: HKY85 (kappa) (alpha set at 0.50)`
    NtDistances,
    /// `(B) Yang & Nielsen (2000) method`
    Yn00,
    /// `ML distances of aa seqs.`
    AaPairwise,
    /// `pairwise comparison, codon frequencies: F3x4.`
    Pairwise,
    /// `Model 2: PositiveSelection`
    SiteClassModel,
    /// `TREE #  1:  (1, 2, 3);   MP score: 12`
    Tree,
    /// `dN & dS for each branch`
    BranchTable,
    /// Rate matrix and gamma lines of nucleotide and amino-acid runs
    RateParameters,
    /// `kappa (ts/tv) = 2.1`, `omega (dN/dS) = 0.3`, `ln Lmax (unconstrained) = -99.9`
    Scalar,
    /// `Time used:  0:02`
    TimeUsed,
}

const BLOCKS: [Block; 19] = [
    Block::Header,
    Block::DataSet,
    Block::Heuristic,
    Block::Patterns,
    Block::CodonUsage,
    Block::PositionFrequencies,
    Block::Frequencies,
    Block::Ng86,
    Block::AaDistances,
    Block::NtDistances,
    Block::Yn00,
    Block::AaPairwise,
    Block::Pairwise,
    Block::SiteClassModel,
    Block::Tree,
    Block::BranchTable,
    Block::RateParameters,
    Block::Scalar,
    Block::TimeUsed,
];

/// Trigger patterns, aligned with [BLOCKS]
static TRIGGERS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^(CODONML|AAML|BASEML|YN00)\b",
        r"^\s*Data set\s+\d+",
        r"^(Heuristic tree search by (stepwise addition|NNI perturbation)|stage 0:)",
        r"^\s*ns\s*=\s*\d+",
        r"^(Codon usage in sequences|Sums of codon usage counts)",
        r"^Codon position x base \(3x4\) table",
        r"^Frequencies\.{1,2}\s*$",
        r"^(Nei & Gojobori 1986\. dN/dS|\(A\) Nei-Gojobori \(1986\) method)",
        r"^AA distances",
        r"^Distances:\s*\S+",
        r"^\(B\) Yang & Nielsen \(2000\) method",
        r"^ML distances of aa seqs",
        r"^pairwise comparison, codon frequencies",
        r"^(NSsites\s+)?Model\s+\d+\s*:",
        r"^TREE\s+#\s*\d+",
        r"^dN & dS for each branch",
        r"^(Parameters \(kappa\) in the rate matrix|Rate parameters:|Base frequencies:|Rate matrix Q|alpha \(gamma, K\s*=\s*\d+\)\s*=)",
        r"^\s*(kappa \(ts/tv\)|omega \(dN/dS\)|ln Lmax \(unconstrained\))\s*=",
        r"^Time used",
    ])
    .unwrap()
});

/// Lines that end a yn00 `(B)` table or any other table without own terminator
pub(crate) static METHOD_BANNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\([A-Z]\)\s").unwrap());

impl Block {
    /// Classifies a line into the block it opens, if any.
    pub(crate) fn classify(line: &str) -> Option<Block> {
        TRIGGERS.matches(line).iter().next().map(|i| BLOCKS[i])
    }

    /// Returns whether the block ends the current result (new document or data set).
    pub(crate) fn is_document_boundary(&self) -> bool {
        matches!(self, Block::Header | Block::DataSet)
    }

    /// Returns the blocks a report of the given dialect may contain, in the order they are printed.
    pub(crate) fn sequence_for(dialect: Dialect) -> &'static [Block] {
        match dialect {
            Dialect::CodonModel => &[
                Block::Patterns,
                Block::CodonUsage,
                Block::PositionFrequencies,
                Block::Ng86,
                Block::Pairwise,
                Block::SiteClassModel,
                Block::Tree,
                Block::Scalar,
                Block::BranchTable,
                Block::TimeUsed,
            ],
            Dialect::AminoAcidModel => &[
                Block::Patterns,
                Block::Frequencies,
                Block::AaDistances,
                Block::AaPairwise,
                Block::Tree,
                Block::Scalar,
                Block::RateParameters,
                Block::TimeUsed,
            ],
            Dialect::NucleotideModel => &[
                Block::Patterns,
                Block::Frequencies,
                Block::NtDistances,
                Block::Tree,
                Block::Scalar,
                Block::RateParameters,
                Block::TimeUsed,
            ],
            Dialect::PairwiseDistance => &[
                Block::Patterns,
                Block::PositionFrequencies,
                Block::CodonUsage,
                Block::Ng86,
                Block::Yn00,
                Block::TimeUsed,
            ],
        }
    }

    /// Returns whether a report of the given dialect may contain this block.
    pub(crate) fn applies_to(&self, dialect: Dialect) -> bool {
        self.is_document_boundary()
            || *self == Block::Heuristic
            || Block::sequence_for(dialect).contains(self)
    }
}
