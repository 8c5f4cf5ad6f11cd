use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use biobin_core::DiseaseModel;
use biobin_core::config::BinSizePolicy;
use biobin_core::models::{Chromosome, GroupId, LocusId, RegionId, RegionKey};
use biobin_population::{PhenotypeStatus, PopulationManager};

/// What a bin aggregates over. Variant order is the bin sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinKind {
    Group(GroupId),
    Region(RegionKey),
    Intergenic { chrom: Chromosome, window: u32 },
}

/// Total genotype contribution of a bin's loci over controls and cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinTotals {
    pub control: u32,
    pub case: u32,
}

///
/// A set of rare loci aggregated under one gene, pathway or intergenic window.
///
/// Contribution totals are computed on first use and cached until the
/// membership changes.
///
#[derive(Debug, Clone)]
pub struct Bin {
    kind: BinKind,
    name: String,
    loci: BTreeSet<LocusId>,
    totals: Cell<Option<BinTotals>>,
}

impl Bin {
    pub fn new(kind: BinKind, name: impl Into<String>) -> Self {
        Bin {
            kind,
            name: name.into(),
            loci: BTreeSet::new(),
            totals: Cell::new(None),
        }
    }

    pub fn intergenic_name(chrom: Chromosome, window: u32) -> String {
        format!("chr{}:{}", chrom, window)
    }

    pub fn kind(&self) -> BinKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for group bins, which may span chromosomes.
    pub fn chrom(&self) -> Option<Chromosome> {
        match self.kind {
            BinKind::Group(_) => None,
            BinKind::Region(key) => Some(key.chrom),
            BinKind::Intergenic { chrom, .. } => Some(chrom),
        }
    }

    pub fn group_id(&self) -> Option<GroupId> {
        match self.kind {
            BinKind::Group(id) => Some(id),
            _ => None,
        }
    }

    pub fn region_id(&self) -> Option<RegionId> {
        match self.kind {
            BinKind::Region(key) => Some(key.id),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, BinKind::Group(_))
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, BinKind::Region(_))
    }

    pub fn is_intergenic(&self) -> bool {
        matches!(self.kind, BinKind::Intergenic { .. })
    }

    pub fn add_locus(&mut self, locus: LocusId) -> bool {
        let added = self.loci.insert(locus);
        if added {
            self.totals.set(None);
        }
        added
    }

    pub fn remove_locus(&mut self, locus: LocusId) -> bool {
        let removed = self.loci.remove(&locus);
        if removed {
            self.totals.set(None);
        }
        removed
    }

    pub fn loci(&self) -> impl Iterator<Item = LocusId> + '_ {
        self.loci.iter().copied()
    }

    pub fn contains(&self, locus: LocusId) -> bool {
        self.loci.contains(&locus)
    }

    pub fn num_loci(&self) -> usize {
        self.loci.len()
    }

    pub fn totals(
        &self,
        pop: &PopulationManager,
        status: &PhenotypeStatus,
        model: DiseaseModel,
    ) -> BinTotals {
        if let Some(totals) = self.totals.get() {
            return totals;
        }

        let totals = self.loci.iter().fold(BinTotals::default(), |acc, locus| BinTotals {
            control: acc.control + pop.total_contribution(*locus, &status.controls, model),
            case: acc.case + pop.total_contribution(*locus, &status.cases, model),
        });
        self.totals.set(Some(totals));
        totals
    }

    /// Size compared against the collapse and prune thresholds.
    pub fn size(
        &self,
        pop: &PopulationManager,
        status: &PhenotypeStatus,
        model: DiseaseModel,
        policy: BinSizePolicy,
    ) -> u32 {
        match policy {
            BinSizePolicy::Contribution => {
                let totals = self.totals(pop, status, model);
                totals.control + totals.case
            }
            BinSizePolicy::Variants => self.loci.len() as u32,
        }
    }

    pub fn reset_cache(&self) {
        self.totals.set(None);
    }
}

impl PartialEq for Bin {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for Bin {}

impl Ord for Bin {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for Bin {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
