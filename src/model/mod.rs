//! Data model of a parsed report.
//!
//! Provides the [PamlResult] aggregate and everything it holds:
//! * [PhyloTree] - arena tree with multifurcating [Vertex]es carrying [Tags]
//! * [NodeIdResolver] - maps integer node ids onto tree vertices
//! * [SequenceRecord], [FrequencyTable], [DistanceMatrix]
//! * [SiteClassModel] for site-class batch runs
//! * [AncestralReconstruction] for the reconstruction file
//!
//! All types serialize with `serde`.

pub mod annotation;
pub mod frequency;
pub mod label_resolver;
pub mod matrix;
pub mod rates;
pub mod reconstruction;
pub mod result;
pub mod sequence;
pub mod site_class;
pub mod tree;
pub mod vertex;

pub use annotation::{TagValue, Tags};
pub use frequency::{Alphabet, FrequencyKey, FrequencyRow, FrequencyTable, PositionFrequencies};
pub use label_resolver::NodeIdResolver;
pub use matrix::{DistanceCell, DistanceMatrix};
pub use rates::RateParameters;
pub use reconstruction::{
    AncestralReconstruction, AncestralState, ExtantResidue, SiteReconstruction, SubstitutionEvent,
};
pub use result::{Collected, Dialect, PamlResult, RunSummary};
pub use sequence::SequenceRecord;
pub use site_class::{SelectedSite, ShapeParams, SiteClassModel, SiteClasses};
pub use tree::{PhyloTree, VertexIndex};
pub use vertex::Vertex;
