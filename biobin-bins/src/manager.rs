use std::collections::{BTreeMap, BTreeSet};

use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
use log::{debug, info};

use biobin_core::config::{BinningConfig, ConfigResult};
use biobin_core::models::{Chromosome, GroupId, Locus, LocusId, LocusSet, RegionId};
use biobin_core::{BiobinConfig, DiseaseModel, KnowledgeBase};
use biobin_overlaprs::RegionIndex;
use biobin_population::{PhenotypeStatus, PopulationManager};

use crate::bin::{Bin, BinKind};

/// Read-only inputs of one bin construction pass.
pub struct BinContext<'a> {
    pub kb: &'a KnowledgeBase,
    pub index: &'a RegionIndex,
    pub loci: &'a LocusSet,
    pub pop: &'a PopulationManager,
    pub status: &'a PhenotypeStatus,
}

///
/// Builds and owns the bins of one phenotype.
///
/// Construction runs in three stages: every rare locus is assigned to
/// group, region or intergenic bins; oversized group bins are collapsed
/// into region bins; bins below the minimum size are pruned.
///
#[derive(Debug)]
pub struct BinManager {
    params: BinningConfig,
    model: DiseaseModel,
    bins: BTreeMap<BinKind, Bin>,
    group_bins: HashMap<GroupId, BinKind>,
    region_bins: HashMap<RegionId, BinKind>,
    intergenic_bins: HashMap<(Chromosome, u32), BinKind>,
    locus_bins: HashMap<LocusId, BTreeSet<BinKind>>,
    locus_regions: HashMap<LocusId, BTreeSet<RegionId>>,
    rare_loci: BTreeSet<LocusId>,
}

impl BinManager {
    /// Fails when `config` does not validate, e.g. a zero intergenic bin width.
    pub fn new(config: &BiobinConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(BinManager {
            params: config.binning.clone(),
            model: config.population.disease_model,
            bins: BTreeMap::new(),
            group_bins: HashMap::default(),
            region_bins: HashMap::default(),
            intergenic_bins: HashMap::default(),
            locus_bins: HashMap::default(),
            locus_regions: HashMap::default(),
            rare_loci: BTreeSet::new(),
        })
    }

    fn clear(&mut self) {
        self.bins.clear();
        self.group_bins.clear();
        self.region_bins.clear();
        self.intergenic_bins.clear();
        self.locus_bins.clear();
        self.locus_regions.clear();
        self.rare_loci.clear();
    }

    fn is_rare(&self, locus: &Locus) -> bool {
        locus
            .is_rare()
            .unwrap_or_else(|| locus.minor_allele_freq() < self.params.maf_cutoff)
    }

    ///
    /// Build the bin set from scratch: assign, collapse, prune.
    ///
    /// Any bins from an earlier call are discarded first.
    ///
    pub fn init_bins(&mut self, ctx: &BinContext) {
        self.clear();

        for (id, locus) in ctx.loci.iter() {
            if self.is_rare(locus) {
                self.assign_locus(ctx, id, locus);
            }
        }
        info!(
            "Assigned {} rare loci to {} bins",
            self.rare_loci.len(),
            self.bins.len()
        );

        self.collapse_bins(ctx);
        self.prune_bins(ctx);

        info!(
            "Final bins: {} ({} group, {} region, {} intergenic)",
            self.bins.len(),
            self.group_bins.len(),
            self.region_bins.len(),
            self.intergenic_bins.len()
        );
    }

    fn assign_locus(&mut self, ctx: &BinContext, id: LocusId, locus: &Locus) {
        self.rare_loci.insert(id);

        let regions = ctx.index.regions_at(locus.chrom, locus.pos);
        if regions.is_empty() {
            let window = locus.pos / self.params.intergenic_bin_width;
            let kind = *self
                .intergenic_bins
                .entry((locus.chrom, window))
                .or_insert(BinKind::Intergenic {
                    chrom: locus.chrom,
                    window,
                });
            self.add_to_bin(kind, id, || Bin::intergenic_name(locus.chrom, window));
            return;
        }

        for rid in &regions {
            let Some(region) = ctx.kb.region(*rid) else {
                continue;
            };
            let groups: BTreeSet<GroupId> = region.groups().collect();
            if groups.is_empty() {
                self.add_to_region_bin(ctx.kb, *rid, id);
                continue;
            }
            for gid in groups {
                let Some(group) = ctx.kb.group(gid) else {
                    continue;
                };
                let kind = *self.group_bins.entry(gid).or_insert(BinKind::Group(gid));
                self.add_to_bin(kind, id, || group.name().to_string());
            }
        }

        self.locus_regions.insert(id, regions);
    }

    fn add_to_region_bin(&mut self, kb: &KnowledgeBase, rid: RegionId, locus: LocusId) {
        let Some(region) = kb.region(rid) else {
            return;
        };
        let kind = *self
            .region_bins
            .entry(rid)
            .or_insert(BinKind::Region(region.sort_key()));
        self.add_to_bin(kind, locus, || region.name().to_string());
    }

    fn add_to_bin(&mut self, kind: BinKind, locus: LocusId, name: impl FnOnce() -> String) {
        self.bins
            .entry(kind)
            .or_insert_with(|| Bin::new(kind, name()))
            .add_locus(locus);
        self.locus_bins.entry(locus).or_default().insert(kind);
    }

    ///
    /// Replace every group bin larger than the traverse threshold by region
    /// bins for the group's regions that hold at least one of its loci.
    ///
    fn collapse_bins(&mut self, ctx: &BinContext) {
        let group_kinds: Vec<BinKind> = self
            .bins
            .keys()
            .take_while(|k| matches!(k, BinKind::Group(_)))
            .copied()
            .collect();

        let mut visited: HashSet<GroupId> = HashSet::default();
        for kind in group_kinds {
            let BinKind::Group(gid) = kind else {
                continue;
            };
            if !visited.insert(gid) {
                continue;
            }
            let Some(bin) = self.bins.get(&kind) else {
                continue;
            };
            let size = bin.size(ctx.pop, ctx.status, self.model, self.params.size_policy);
            if size <= self.params.bin_traverse_threshold {
                continue;
            }

            let loci: Vec<LocusId> = bin.loci().collect();
            let regions = ctx.kb.descendant_regions(gid);
            for locus in loci {
                let Some(locus_regions) = self.locus_regions.get(&locus) else {
                    continue;
                };
                let targets: Vec<RegionId> =
                    locus_regions.intersection(&regions).copied().collect();
                for rid in targets {
                    self.add_to_region_bin(ctx.kb, rid, locus);
                }
            }

            debug!("Collapsed group bin {} (size {})", bin_name(ctx.kb, gid), size);
            self.erase_bin(&kind);
        }
    }

    /// Delete every bin smaller than the minimum bin size.
    fn prune_bins(&mut self, ctx: &BinContext) {
        let small: Vec<BinKind> = self
            .bins
            .iter()
            .filter(|(_, bin)| {
                bin.size(ctx.pop, ctx.status, self.model, self.params.size_policy)
                    < self.params.min_bin_size
            })
            .map(|(kind, _)| *kind)
            .collect();

        if !small.is_empty() {
            debug!("Pruning {} bins below size {}", small.len(), self.params.min_bin_size);
        }
        for kind in small {
            self.erase_bin(&kind);
        }
    }

    /// Remove a bin from the bin set, its lookup map and every locus membership.
    pub fn erase_bin(&mut self, kind: &BinKind) -> Option<Bin> {
        let bin = self.bins.remove(kind)?;

        match *kind {
            BinKind::Group(gid) => {
                self.group_bins.remove(&gid);
            }
            BinKind::Region(key) => {
                self.region_bins.remove(&key.id);
            }
            BinKind::Intergenic { chrom, window } => {
                self.intergenic_bins.remove(&(chrom, window));
            }
        }

        for locus in bin.loci() {
            if let Some(kinds) = self.locus_bins.get_mut(&locus) {
                kinds.remove(kind);
                if kinds.is_empty() {
                    self.locus_bins.remove(&locus);
                }
            }
        }

        Some(bin)
    }

    /// Bins in sort order.
    pub fn bins(&self) -> impl Iterator<Item = &Bin> {
        self.bins.values()
    }

    pub fn get(&self, kind: &BinKind) -> Option<&Bin> {
        self.bins.get(kind)
    }

    pub fn group_bin(&self, id: GroupId) -> Option<&Bin> {
        self.group_bins.get(&id).and_then(|k| self.bins.get(k))
    }

    pub fn region_bin(&self, id: RegionId) -> Option<&Bin> {
        self.region_bins.get(&id).and_then(|k| self.bins.get(k))
    }

    pub fn intergenic_bin(&self, chrom: Chromosome, window: u32) -> Option<&Bin> {
        self.intergenic_bins
            .get(&(chrom, window))
            .and_then(|k| self.bins.get(k))
    }

    /// Bins holding `locus`, in sort order.
    pub fn bins_of(&self, locus: LocusId) -> impl Iterator<Item = &Bin> + '_ {
        self.locus_bins
            .get(&locus)
            .into_iter()
            .flatten()
            .filter_map(|k| self.bins.get(k))
    }

    /// Regions found to contain `locus` during assignment.
    pub fn regions_of(&self, locus: LocusId) -> impl Iterator<Item = RegionId> + '_ {
        self.locus_regions.get(&locus).into_iter().flatten().copied()
    }

    pub fn rare_loci(&self) -> &BTreeSet<LocusId> {
        &self.rare_loci
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn disease_model(&self) -> DiseaseModel {
        self.model
    }

    /// Drop every cached bin total, e.g. before sizing against another phenotype.
    pub fn reset_size_cache(&self) {
        for bin in self.bins.values() {
            bin.reset_cache();
        }
    }
}

fn bin_name(kb: &KnowledgeBase, gid: GroupId) -> &str {
    kb.group(gid).map(|g| g.name()).unwrap_or("?")
}
