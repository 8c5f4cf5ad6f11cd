//! Genome-wide point lookup of the regions covering a position.
//!
//! A [`RegionIndexBuilder`] collects region boundaries; [`RegionIndexBuilder::build`]
//! freezes them into a [`RegionIndex`] holding one [`AIList`] per chromosome.
//! Queries are only possible on the frozen index.
//!
//! # Examples
//!
//! ```
//! use biobin_core::KnowledgeBase;
//! use biobin_core::models::Chromosome;
//! use biobin_overlaprs::region_index::IntoRegionIndex;
//!
//! let chr1: Chromosome = "chr1".parse().unwrap();
//! let mut kb = KnowledgeBase::new();
//! let gene = kb.add_region("GENE1", chr1, 1000, 2000).unwrap();
//!
//! let index = (&kb).into_region_index();
//! assert!(index.regions_at(chr1, 2000).contains(&gene));
//! assert!(index.regions_at(chr1, 2001).is_empty());
//! ```
use std::collections::BTreeSet;

use fxhash::FxHashMap as HashMap;

use biobin_core::KnowledgeBase;
use biobin_core::models::{Chromosome, Interval, LocusSet, Region, RegionId};

use crate::{AIList, Overlapper};

/// Collects region intervals until [`build`](RegionIndexBuilder::build) is called.
#[derive(Debug, Default)]
pub struct RegionIndexBuilder {
    intervals: HashMap<Chromosome, Vec<Interval<u32, RegionId>>>,
}

impl RegionIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region's default boundary and, when it has one, its effective boundary.
    pub fn index_region(&mut self, region: &Region) {
        let entry = self.intervals.entry(region.chrom()).or_default();

        let bounds = region.bounds();
        entry.push(Interval {
            start: bounds.start,
            end: bounds.end,
            val: region.id(),
        });

        let effective = region.effective_bounds();
        if effective != bounds {
            entry.push(Interval {
                start: effective.start,
                end: effective.end,
                val: region.id(),
            });
        }
    }

    pub fn build(self) -> RegionIndex {
        let mut index_maps: HashMap<Chromosome, Box<dyn Overlapper<u32, RegionId>>> =
            HashMap::default();
        index_maps.reserve(self.intervals.len());

        for (chrom, intervals) in self.intervals {
            if intervals.is_empty() {
                continue;
            }
            index_maps.insert(chrom, Box::new(AIList::build(intervals)));
        }

        RegionIndex { index_maps }
    }
}

/// Frozen per-chromosome interval index over region ids.
pub struct RegionIndex {
    index_maps: HashMap<Chromosome, Box<dyn Overlapper<u32, RegionId>>>,
}

impl RegionIndex {
    /// Ids of every region containing `pos`, deduplicated. Empty when nothing overlaps.
    pub fn regions_at(&self, chrom: Chromosome, pos: u32) -> BTreeSet<RegionId> {
        match self.index_maps.get(&chrom) {
            Some(overlapper) => overlapper.find_point(pos).map(|iv| iv.val).collect(),
            None => BTreeSet::new(),
        }
    }

    ///
    /// Record every locus on the regions that contain it.
    ///
    /// Returns the number of (locus, region) pairs added.
    ///
    pub fn associate_loci(&self, kb: &mut KnowledgeBase, loci: &LocusSet) -> usize {
        let mut added = 0;
        for (id, locus) in loci.iter() {
            for region in self.regions_at(locus.chrom, locus.pos) {
                if kb.add_locus(region, id) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn num_chromosomes(&self) -> usize {
        self.index_maps.len()
    }
}

/// Build a [`RegionIndex`] from everything a source holds.
pub trait IntoRegionIndex {
    fn into_region_index(self) -> RegionIndex;
}

impl IntoRegionIndex for &KnowledgeBase {
    fn into_region_index(self) -> RegionIndex {
        let mut builder = RegionIndexBuilder::new();
        for region in self.regions() {
            builder.index_region(region);
        }
        builder.build()
    }
}
