//! Genotypes, phenotypes and weighted contributions.
//!
//! [`PopulationManager`] stores every individual's genotype at every locus as
//! a pair of bit vectors and classifies individuals into cases and controls.
//! [`ContributionCalculator`] turns genotypes into (optionally weighted)
//! per-individual contributions for a single phenotype.
pub mod calculator;
pub mod errors;
pub mod genotype;
pub mod manager;
pub mod phenotype;
pub mod weights;

// re-exports
pub use self::calculator::ContributionCalculator;
pub use self::genotype::{Bits, GenotypeBits};
pub use self::manager::{BinCapacity, PopulationManager};
pub use self::phenotype::{PhenotypeStatus, PhenotypeTable};
