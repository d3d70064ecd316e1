//! Substitution-rate parameters of nucleotide and amino-acid runs.

use serde::{Deserialize, Serialize};

/// Rate-matrix and among-site rate variation estimates.
///
/// Every field is optional: which lines appear depends on the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateParameters {
    /// Values under `Parameters (kappa) in the rate matrix`
    pub kappa: Vec<f64>,
    /// `Rate parameters:` values
    pub rate_parameters: Vec<f64>,
    /// `Base frequencies:` values
    pub base_frequencies: Vec<f64>,
    /// Average transition/transversion ratio printed with the rate matrix
    pub average_ts_tv: Option<f64>,
    /// Rows of the rate matrix Q
    pub rate_matrix: Vec<Vec<f64>>,
    /// Gamma shape parameter
    pub alpha: Option<f64>,
    /// Number of discrete gamma categories
    pub gamma_categories: Option<u32>,
    /// `rate:` values of the gamma categories
    pub rates: Vec<f64>,
    /// `freq:` values of the gamma categories
    pub freqs: Vec<f64>,
}

impl RateParameters {
    /// Returns whether no parameter was found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
