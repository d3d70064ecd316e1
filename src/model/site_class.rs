//! Site-class (NSsites) mixture models and positively selected sites.

use crate::model::tree::PhyloTree;
use serde::{Deserialize, Serialize};

/// Proportions `p[]` and rate ratios `w[]` of the discrete site classes, aligned by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteClasses {
    pub proportions: Vec<f64>,
    pub omegas: Vec<f64>,
}

/// Shape parameters of a continuous site-class distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeParams {
    /// Beta distribution of omega (`p = x q = y`)
    Beta { p: f64, q: f64 },
    /// Beta plus an extra positive-selection class
    /// (`p0 = x p = y q = z` and `(p1 = u) w = v`)
    BetaW {
        p0: f64,
        p: f64,
        q: f64,
        p1: Option<f64>,
        w: Option<f64>,
    },
    /// Discrete gamma with shape `gamma` and category rates/frequencies
    Gamma {
        gamma: f64,
        rates: Vec<f64>,
        freqs: Vec<f64>,
    },
}

/// One line of a positively-selected-site listing,
/// e.g. `   28 T      0.998**       4.236 +- 0.620`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSite {
    /// 1-based alignment position
    pub position: u32,
    pub residue: String,
    /// Posterior probability of the positive-selection class
    pub probability: f64,
    /// `*`, `**` or empty when not printed
    pub significance: String,
    pub mean_omega: Option<f64>,
    pub standard_error: Option<f64>,
}

/// One `Model N: description` section of a site-class batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteClassModel {
    pub model_num: u32,
    pub description: String,
    pub trees: Vec<PhyloTree>,
    /// Log-likelihood, taken from the score of the model's last tree
    pub likelihood: Option<f64>,
    pub kappa: Option<f64>,
    pub site_classes: Option<SiteClasses>,
    pub shape_params: Option<ShapeParams>,
    /// Naive empirical Bayes sites; `None` if the block was not printed
    pub neb_sites: Option<Vec<SelectedSite>>,
    /// Bayes empirical Bayes sites; `None` if the block was not printed
    pub beb_sites: Option<Vec<SelectedSite>>,
}

impl SiteClassModel {
    /// Creates a model from its banner number and description.
    pub fn new<S: Into<String>>(model_num: u32, description: S) -> Self {
        Self {
            model_num,
            description: description.into(),
            ..Self::default()
        }
    }
}
