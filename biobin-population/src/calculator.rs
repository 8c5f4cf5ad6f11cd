use std::cell::RefCell;

use fxhash::FxHashMap as HashMap;

use biobin_core::BiobinConfig;
use biobin_core::DiseaseModel;
use biobin_core::config::WeightConfig;
use biobin_core::models::{LocusId, LocusSet, Region, RegionId};
use biobin_core::traits::Information;

use crate::manager::PopulationManager;
use crate::phenotype::PhenotypeStatus;
use crate::weights::{AlleleCounts, select_weight};

///
/// Weighted genotype contributions for one phenotype and one output pass.
///
/// Weights are memoized per locus (Madsen-Browning) and per (locus, region)
/// pair (custom weights). The caches live as long as the calculator, so a
/// fresh calculator starts with empty caches.
///
pub struct ContributionCalculator<'a> {
    pop: &'a PopulationManager,
    loci: &'a LocusSet,
    status: &'a PhenotypeStatus,
    model: DiseaseModel,
    weights: WeightConfig,
    info: Option<&'a dyn Information>,
    calc_cache: RefCell<HashMap<LocusId, f64>>,
    custom_cache: RefCell<HashMap<(LocusId, Option<RegionId>), f64>>,
}

impl<'a> ContributionCalculator<'a> {
    pub fn new(
        pop: &'a PopulationManager,
        loci: &'a LocusSet,
        status: &'a PhenotypeStatus,
        config: &BiobinConfig,
    ) -> Self {
        ContributionCalculator {
            pop,
            loci,
            status,
            model: config.population.disease_model,
            weights: config.weights.clone(),
            info: None,
            calc_cache: RefCell::new(HashMap::default()),
            custom_cache: RefCell::new(HashMap::default()),
        }
    }

    /// Source of custom SNP weights.
    pub fn with_information(mut self, info: &'a dyn Information) -> Self {
        self.info = Some(info);
        self
    }

    pub fn status(&self) -> &PhenotypeStatus {
        self.status
    }

    pub fn disease_model(&self) -> DiseaseModel {
        self.model
    }

    /// Madsen-Browning weight of `locus` under the configured weight model.
    pub fn calc_weight(&self, locus: LocusId) -> f64 {
        if let Some(w) = self.calc_cache.borrow().get(&locus) {
            return *w;
        }

        let weight = match self.pop.genotypes(locus) {
            Some(g) => {
                let controls = AlleleCounts {
                    n: g.nonmissing_count(&self.status.controls),
                    m: g.minor_allele_count(&self.status.controls),
                };
                let cases = AlleleCounts {
                    n: g.nonmissing_count(&self.status.cases),
                    m: g.minor_allele_count(&self.status.cases),
                };
                select_weight(self.weights.model, controls, cases)
            }
            None => 1.0,
        };

        self.calc_cache.borrow_mut().insert(locus, weight);
        weight
    }

    /// Externally supplied weight of `locus` in `region`; 1 without a source.
    pub fn custom_weight(&self, locus: LocusId, region: Option<&Region>) -> f64 {
        let Some(info) = self.info else {
            return 1.0;
        };

        let key = (locus, region.map(Region::id));
        if let Some(w) = self.custom_cache.borrow().get(&key) {
            return *w;
        }

        let weight = info.snp_weight(self.loci.get(locus), region) as f64;
        let weight = if weight.is_finite() { weight } else { 1.0 };

        self.custom_cache.borrow_mut().insert(key, weight);
        weight
    }

    /// Product of the enabled weights.
    pub fn weight(&self, locus: LocusId, region: Option<&Region>) -> f64 {
        let mut weight = 1.0;
        if self.weights.calculated {
            weight *= self.calc_weight(locus);
        }
        if self.weights.custom {
            weight *= self.custom_weight(locus, region);
        }
        weight
    }

    ///
    /// Contribution of `individual` at `locus`, multiplied by the locus weight
    /// when `use_weights` is set. Missing calls contribute 0.
    ///
    pub fn weighted_contribution(
        &self,
        locus: LocusId,
        individual: usize,
        use_weights: bool,
        region: Option<&Region>,
    ) -> f64 {
        let raw = self.pop.contribution(locus, individual, self.model);
        if raw == 0 {
            return 0.0;
        }
        if use_weights {
            raw as f64 * self.weight(locus, region)
        } else {
            raw as f64
        }
    }

    /// Sum of weighted contributions of `individual` over `loci`.
    pub fn contribution_sum<I>(
        &self,
        loci: I,
        individual: usize,
        use_weights: bool,
        region: Option<&Region>,
    ) -> f64
    where
        I: IntoIterator<Item = LocusId>,
    {
        loci.into_iter()
            .map(|l| self.weighted_contribution(l, individual, use_weights, region))
            .sum()
    }
}
