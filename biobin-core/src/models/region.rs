use std::collections::{BTreeMap, BTreeSet};

use super::chrom::Chromosome;
use super::group::{GroupId, SourceId};
use super::locus::LocusId;

/// Handle of a [`Region`] inside a [`KnowledgeBase`](crate::knowledge::KnowledgeBase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Closed coordinate range of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Boundary {
    pub start: u32,
    pub end: u32,
}

impl Boundary {
    pub fn contains(&self, pos: u32) -> bool {
        self.start <= pos && pos <= self.end
    }
}

/// Total order key for regions: chromosome, start, end, then id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionKey {
    pub chrom: Chromosome,
    pub start: u32,
    pub end: u32,
    pub id: RegionId,
}

///
/// A named genomic region, usually a gene.
///
/// Besides its default boundary a region may carry an effective boundary
/// (a population-specific extension). Loci and parent groups are filled in
/// by the knowledge base and the region index.
///
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) name: String,
    pub(crate) chrom: Chromosome,
    pub(crate) aliases: BTreeSet<String>,
    pub(crate) bounds: Boundary,
    pub(crate) effective: Option<Boundary>,
    pub(crate) loci: BTreeSet<LocusId>,
    pub(crate) groups: BTreeMap<SourceId, BTreeSet<GroupId>>,
}

impl Region {
    pub fn id(&self) -> RegionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chrom(&self) -> Chromosome {
        self.chrom
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    pub fn bounds(&self) -> Boundary {
        self.bounds
    }

    /// The effective boundary, falling back to the default one.
    pub fn effective_bounds(&self) -> Boundary {
        self.effective.unwrap_or(self.bounds)
    }

    pub fn has_effective_bounds(&self) -> bool {
        self.effective.is_some()
    }

    /// `true` if `pos` falls in either boundary.
    pub fn contains(&self, chrom: Chromosome, pos: u32) -> bool {
        chrom == self.chrom
            && (self.bounds.contains(pos) || self.effective.is_some_and(|b| b.contains(pos)))
    }

    pub fn loci(&self) -> &BTreeSet<LocusId> {
        &self.loci
    }

    pub fn contains_locus(&self, locus: LocusId) -> bool {
        self.loci.contains(&locus)
    }

    /// All parent groups, across sources.
    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.values().flatten().copied()
    }

    pub fn groups_from(&self, source: SourceId) -> impl Iterator<Item = GroupId> + '_ {
        self.groups.get(&source).into_iter().flatten().copied()
    }

    pub fn sort_key(&self) -> RegionKey {
        RegionKey {
            chrom: self.chrom,
            start: self.bounds.start,
            end: self.bounds.end,
            id: self.id,
        }
    }
}
