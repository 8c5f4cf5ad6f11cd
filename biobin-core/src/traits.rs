use std::error::Error;
use std::fmt::{self, Display};

use crate::knowledge::KnowledgeBase;
use crate::models::{Chromosome, Locus, Region};

/// Functional role of a SNP relative to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SnpRole {
    Exon,
    Intron,
    Regulatory,
    #[default]
    Other,
}

impl Display for SnpRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnpRole::Exon => "exon",
            SnpRole::Intron => "intron",
            SnpRole::Regulatory => "regulatory",
            SnpRole::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Boxed error type shared by the external collaborator traits.
pub type LoaderError = Box<dyn Error + Send + Sync>;

/// Populates a knowledge base with regions.
pub trait RegionLoader {
    ///
    /// Load regions into `kb`. Empty filters load everything; otherwise only
    /// regions whose id or alias appears in a filter are kept.
    ///
    /// Returns the number of regions added.
    fn load_regions(
        &mut self,
        kb: &mut KnowledgeBase,
        filter_ids: &[String],
        filter_aliases: &[String],
    ) -> Result<usize, LoaderError>;
}

/// Populates a knowledge base with groups and their region memberships.
pub trait GroupLoader {
    /// Returns the number of groups added.
    fn load_groups(
        &mut self,
        kb: &mut KnowledgeBase,
        filter_names: &[String],
        filter_ids: &[String],
    ) -> Result<usize, LoaderError>;
}

/// Per-SNP annotations from an external knowledge source.
pub trait Information {
    /// Custom weight of `locus`, optionally in the context of `region`. Unknown loci weigh 1.
    fn snp_weight(&self, locus: &Locus, region: Option<&Region>) -> f32;

    fn snp_role(&self, _locus: &Locus, _region: Option<&Region>) -> SnpRole {
        SnpRole::Other
    }
}

/// Converts coordinates between genome builds.
pub trait Liftover {
    /// `None` when the position has no counterpart in the target build.
    fn convert_locus(&self, chrom: Chromosome, pos: u32) -> Option<(Chromosome, u32)>;
}
