//! Core models shared by the biobin crates.
//!
//! - [`models`]: loci and alleles, chromosomes, regions and groups
//! - [`knowledge`]: the region/group knowledge base
//! - [`config`]: run configuration
//! - [`traits`]: interfaces to external knowledge sources
pub mod config;
pub mod errors;
pub mod knowledge;
pub mod models;
pub mod traits;

// re-exports
pub use self::config::{BiobinConfig, DiseaseModel, WeightModel};
pub use self::knowledge::KnowledgeBase;
