//! # Input/Output for biobin
//!
//! Readers for the inputs of a binning run (VCF genotypes, phenotype files,
//! region tables, group archives and SNP weight tables) and writers for its
//! reports. All readers accept plain or gzip'd files.
pub mod errors;
pub mod knowledge;
pub mod phenotype;
pub mod report;
pub mod utils;
pub mod vcf;
pub mod weights;

// re-exports
pub use self::errors::{IoError, IoResult};
pub use self::knowledge::{GroupArchiveLoader, RegionFileLoader};
pub use self::phenotype::{read_phenotype_file, read_phenotypes};
pub use self::report::BinReport;
pub use self::vcf::{VcfOptions, VcfReader, VcfSummary, load_vcf, load_vcf_file};
pub use self::weights::WeightTable;
