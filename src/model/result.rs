//! The result aggregate and its run summary.

use crate::model::frequency::{Alphabet, FrequencyTable, PositionFrequencies};
use crate::model::matrix::DistanceMatrix;
use crate::model::rates::RateParameters;
use crate::model::reconstruction::AncestralReconstruction;
use crate::model::sequence::SequenceRecord;
use crate::model::site_class::SiteClassModel;
use crate::model::tree::PhyloTree;
use crate::parser::ParsingError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =#========================================================================#=
// DIALECT
// =#========================================================================$=
/// The four report formats, named by the program keyword in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// `CODONML`
    CodonModel,
    /// `AAML`
    AminoAcidModel,
    /// `BASEML`
    NucleotideModel,
    /// `YN00`
    PairwiseDistance,
}

impl Dialect {
    /// Classifies a header keyword (case-sensitive, as printed).
    ///
    /// # Example
    /// ```
    /// use pamlwick::model::Dialect;
    ///
    /// assert_eq!(Dialect::from_keyword("CODONML"), Some(Dialect::CodonModel));
    /// assert_eq!(Dialect::from_keyword("MCMCTREE"), None);
    /// ```
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "CODONML" => Some(Dialect::CodonModel),
            "AAML" => Some(Dialect::AminoAcidModel),
            "BASEML" => Some(Dialect::NucleotideModel),
            "YN00" => Some(Dialect::PairwiseDistance),
            _ => None,
        }
    }

    /// Returns the header keyword of this dialect.
    pub fn keyword(&self) -> &'static str {
        match self {
            Dialect::CodonModel => "CODONML",
            Dialect::AminoAcidModel => "AAML",
            Dialect::NucleotideModel => "BASEML",
            Dialect::PairwiseDistance => "YN00",
        }
    }

    /// Returns the alphabet of the per-sequence frequency table.
    pub fn alphabet(&self) -> Alphabet {
        match self {
            Dialect::CodonModel | Dialect::PairwiseDistance => Alphabet::Codon,
            Dialect::AminoAcidModel => Alphabet::AminoAcid,
            Dialect::NucleotideModel => Alphabet::Nucleotide,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// =#========================================================================#=
// RUN SUMMARY
// =#========================================================================$=
/// Header information of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub dialect: Dialect,
    pub version: Option<String>,
    /// Sequence (or tree/control) file named in the header
    pub input_file: Option<String>,
    pub model: Option<String>,
    pub input_params: BTreeMap<String, String>,
    pub num_sequences: usize,
    pub alignment_length: usize,
    pub num_patterns: usize,
    pub pattern_counts: Vec<u32>,
}

impl RunSummary {
    /// Creates a summary with only the dialect known.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            version: None,
            input_file: None,
            model: None,
            input_params: BTreeMap::new(),
            num_sequences: 0,
            alignment_length: 0,
            num_patterns: 0,
            pattern_counts: Vec::new(),
        }
    }
}

// =#========================================================================#=
// COLLECTED
// =#========================================================================$=
/// Marks a field whose section is consumed but not (yet) collected for a dialect,
/// as opposed to one that was collected and turned out empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Collected<T> {
    #[default]
    NotCollected,
    Collected(T),
}

impl<T> Collected<T> {
    /// Returns the collected value, if any.
    pub fn get(&self) -> Option<&T> {
        match self {
            Collected::Collected(v) => Some(v),
            Collected::NotCollected => None,
        }
    }

    /// Returns whether this section is not collected.
    pub fn is_not_collected(&self) -> bool {
        matches!(self, Collected::NotCollected)
    }
}

// =#========================================================================#=
// PAML RESULT
// =#========================================================================$=
/// All data extracted from one run of a report (and its reconstruction file).
///
/// Produced by [PamlParser](crate::paml::PamlParser); read-only for callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PamlResult {
    pub(crate) summary: RunSummary,
    pub(crate) sequences: Vec<SequenceRecord>,
    pub(crate) trees: Vec<PhyloTree>,
    pub(crate) frequencies: Option<FrequencyTable>,
    pub(crate) position_frequencies: Vec<PositionFrequencies>,
    pub(crate) codon_counts: Collected<BTreeMap<String, u32>>,
    pub(crate) ng_matrix: Option<DistanceMatrix>,
    pub(crate) ml_matrix: Option<DistanceMatrix>,
    pub(crate) yn_matrix: Option<DistanceMatrix>,
    pub(crate) distances: Option<DistanceMatrix>,
    pub(crate) site_class_models: Vec<SiteClassModel>,
    pub(crate) rate_parameters: Collected<RateParameters>,
    pub(crate) stats: BTreeMap<String, f64>,
    pub(crate) reconstruction: Option<AncestralReconstruction>,
    pub(crate) warnings: Vec<ParsingError>,
}

impl PamlResult {
    pub(crate) fn new(summary: RunSummary) -> Self {
        Self {
            summary,
            sequences: Vec::new(),
            trees: Vec::new(),
            frequencies: None,
            position_frequencies: Vec::new(),
            codon_counts: Collected::NotCollected,
            ng_matrix: None,
            ml_matrix: None,
            yn_matrix: None,
            distances: None,
            site_class_models: Vec::new(),
            rate_parameters: Collected::NotCollected,
            stats: BTreeMap::new(),
            reconstruction: None,
            warnings: Vec::new(),
        }
    }

    /// Returns the run header.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Returns the dialect of the run.
    pub fn dialect(&self) -> Dialect {
        self.summary.dialect
    }

    /// Returns the sequences in printed order.
    pub fn sequences(&self) -> &[SequenceRecord] {
        &self.sequences
    }

    /// Returns the sequence with the given display id.
    pub fn sequence(&self, id: &str) -> Option<&SequenceRecord> {
        self.sequences.iter().find(|s| s.id == id)
    }

    /// Returns the trees outside site-class models, in emission order.
    pub fn trees(&self) -> &[PhyloTree] {
        &self.trees
    }

    /// Returns the per-sequence frequency table.
    pub fn frequencies(&self) -> Option<&FrequencyTable> {
        self.frequencies.as_ref()
    }

    /// Returns the codon position x base tables (per sequence, then the alignment).
    pub fn position_frequencies(&self) -> &[PositionFrequencies] {
        &self.position_frequencies
    }

    /// Returns the codon usage counts (currently never collected).
    pub fn codon_counts(&self) -> &Collected<BTreeMap<String, u32>> {
        &self.codon_counts
    }

    /// Returns the Nei & Gojobori (1986) matrix.
    pub fn ng_matrix(&self) -> Option<&DistanceMatrix> {
        self.ng_matrix.as_ref()
    }

    /// Returns the pairwise maximum-likelihood matrix.
    pub fn ml_matrix(&self) -> Option<&DistanceMatrix> {
        self.ml_matrix.as_ref()
    }

    /// Returns the Yang & Nielsen (2000) matrix.
    pub fn yn_matrix(&self) -> Option<&DistanceMatrix> {
        self.yn_matrix.as_ref()
    }

    /// Returns the amino-acid or nucleotide distance matrix.
    pub fn distances(&self) -> Option<&DistanceMatrix> {
        self.distances.as_ref()
    }

    /// Returns the site-class models in banner order.
    pub fn site_class_models(&self) -> &[SiteClassModel] {
        &self.site_class_models
    }

    /// Returns the rate parameters (collected for nucleotide and amino-acid runs).
    pub fn rate_parameters(&self) -> &Collected<RateParameters> {
        &self.rate_parameters
    }

    /// Returns named scalars such as `loglikelihood` or `constant_sites`.
    pub fn stats(&self) -> &BTreeMap<String, f64> {
        &self.stats
    }

    /// Returns one named scalar.
    pub fn stat(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied()
    }

    /// Returns the ancestral reconstruction, `None` if no reconstruction file was read.
    pub fn reconstruction(&self) -> Option<&AncestralReconstruction> {
        self.reconstruction.as_ref()
    }

    /// Returns the recoverable problems met while parsing.
    pub fn warnings(&self) -> &[ParsingError] {
        &self.warnings
    }

    /// Returns whether no structured data was extracted besides the header.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
            && self.trees.is_empty()
            && self.frequencies.is_none()
            && self.position_frequencies.is_empty()
            && self.ng_matrix.is_none()
            && self.ml_matrix.is_none()
            && self.yn_matrix.is_none()
            && self.distances.is_none()
            && self.site_class_models.is_empty()
            && self.stats.is_empty()
            && self.rate_parameters.get().is_none_or(RateParameters::is_empty)
    }
}
