pub mod allele;
pub mod chrom;
pub mod group;
pub mod interval;
pub mod locus;
pub mod region;

// re-export for cleaner imports
pub use self::allele::{Allele, AllelePool, AlleleSym};
pub use self::chrom::Chromosome;
pub use self::group::{Group, GroupId, SourceId};
pub use self::interval::Interval;
pub use self::locus::{EncodedGenotype, GenotypeCall, Locus, LocusId, LocusSet};
pub use self::region::{Boundary, Region, RegionId, RegionKey};
