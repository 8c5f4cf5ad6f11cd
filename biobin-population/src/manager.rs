use fxhash::FxHashMap as HashMap;
use log::{info, warn};

use biobin_core::DiseaseModel;
use biobin_core::config::PopulationConfig;
use biobin_core::models::LocusId;

use crate::errors::{PopulationError, PopulationResult};
use crate::genotype::{Bits, GenotypeBits};
use crate::phenotype::{PhenotypeStatus, PhenotypeTable};

/// Non-missing allele slots of a set of loci, split by subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinCapacity {
    pub control: u32,
    pub case: u32,
}

///
/// Owns the individuals of a dataset, their genotypes at every locus, and the
/// case/control classification of each phenotype.
///
/// Individuals are addressed by their position, the order in which
/// [`load_individuals`](PopulationManager::load_individuals) received them.
///
#[derive(Debug, Default)]
pub struct PopulationManager {
    individuals: Vec<String>,
    positions: HashMap<String, usize>,
    genotypes: HashMap<LocusId, GenotypeBits>,
    phenotypes: Vec<PhenotypeStatus>,
}

impl PopulationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_individuals<S: AsRef<str>>(&mut self, ids: &[S]) -> PopulationResult<()> {
        self.individuals.clear();
        self.positions.clear();
        for (pos, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            if self.positions.insert(id.to_string(), pos).is_some() {
                return Err(PopulationError::DuplicateIndividual(id.to_string()));
            }
            self.individuals.push(id.to_string());
        }
        Ok(())
    }

    pub fn individuals(&self) -> &[String] {
        &self.individuals
    }

    pub fn num_individuals(&self) -> usize {
        self.individuals.len()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn add_genotypes(&mut self, locus: LocusId, bits: GenotypeBits) -> PopulationResult<()> {
        if bits.len() != self.individuals.len() {
            return Err(PopulationError::GenotypeLength {
                expected: self.individuals.len(),
                found: bits.len(),
            });
        }
        self.genotypes.insert(locus, bits);
        Ok(())
    }

    pub fn genotypes(&self, locus: LocusId) -> Option<&GenotypeBits> {
        self.genotypes.get(&locus)
    }

    /// Contribution of one individual at one locus. Unknown loci contribute 0.
    pub fn contribution(&self, locus: LocusId, individual: usize, model: DiseaseModel) -> u32 {
        self.genotypes
            .get(&locus)
            .map(|g| g.contribution(individual, model))
            .unwrap_or(0)
    }

    /// Sum of contributions over the individuals in `mask`.
    pub fn total_contribution(&self, locus: LocusId, mask: &Bits, model: DiseaseModel) -> u32 {
        self.genotypes
            .get(&locus)
            .map(|g| g.total_contribution(mask, model))
            .unwrap_or(0)
    }

    /// Minor allele frequency among the non-missing individuals in `mask`.
    pub fn maf(&self, locus: LocusId, mask: &Bits) -> f32 {
        let Some(g) = self.genotypes.get(&locus) else {
            return 0.0;
        };
        let n = g.nonmissing_count(mask);
        if n == 0 {
            return 0.0;
        }
        g.minor_allele_count(mask) as f32 / (2 * n) as f32
    }

    ///
    /// Non-missing allele slots over `loci` for controls and cases.
    ///
    /// Every non-missing individual provides two slots under the additive
    /// model and one otherwise (integer halving).
    ///
    pub fn bin_capacity<L>(&self, loci: L, status: &PhenotypeStatus, model: DiseaseModel) -> BinCapacity
    where
        L: IntoIterator<Item = LocusId>,
    {
        let mut capacity = BinCapacity::default();
        for locus in loci {
            if let Some(g) = self.genotypes.get(&locus) {
                capacity.control += 2 * g.nonmissing_count(&status.controls);
                capacity.case += 2 * g.nonmissing_count(&status.cases);
            }
        }
        if model != DiseaseModel::Additive {
            capacity.control /= 2;
            capacity.case /= 2;
        }
        capacity
    }

    /// Treat every individual as a control under a single unnamed phenotype.
    pub fn classify_all_controls(&mut self) -> &[PhenotypeStatus] {
        self.phenotypes = vec![PhenotypeStatus::all_controls("", self.individuals.len())];
        &self.phenotypes
    }

    ///
    /// Split the individuals into cases and controls for every phenotype in `table`.
    ///
    /// A value equal to the control value marks a control, NaN marks a missing
    /// phenotype and anything else a case. Individuals without a row are
    /// controls. When controls make up less than the configured minimum
    /// fraction, every case is folded into the controls.
    ///
    pub fn classify(
        &mut self,
        table: &PhenotypeTable,
        config: &PopulationConfig,
        maf_cutoff: f32,
    ) -> &[PhenotypeStatus] {
        let n = self.individuals.len();

        for id in table.individuals() {
            if !self.positions.contains_key(id) {
                warn!("Cannot find {} among the genotyped individuals, ignoring", id);
            }
        }

        let mut statuses = Vec::with_capacity(table.names().len());
        for (col, name) in table.names().iter().enumerate() {
            let mut status = PhenotypeStatus::empty(name, n);

            for (pos, id) in self.individuals.iter().enumerate() {
                match table.values(id).and_then(|v| v.get(col)) {
                    Some(value) if *value == config.phenotype_control => {
                        status.controls.set(pos, true)
                    }
                    Some(value) if value.is_nan() => {}
                    Some(_) => status.cases.set(pos, true),
                    None => status.controls.set(pos, true),
                }
            }

            check_status(&mut status, config.min_control_frac, maf_cutoff);
            statuses.push(status);
        }

        self.phenotypes = statuses;
        &self.phenotypes
    }

    pub fn phenotypes(&self) -> &[PhenotypeStatus] {
        &self.phenotypes
    }
}

/// A single minor allele among `n` individuals already reaches `maf_cutoff`.
fn only_fixed_variants_rare(n: usize, maf_cutoff: f32) -> bool {
    n > 0 && 1.0 / (2 * n) as f32 > maf_cutoff
}

fn check_status(status: &mut PhenotypeStatus, min_control_frac: f32, maf_cutoff: f32) {
    let n_controls = status.n_controls();
    let total = n_controls + status.n_cases();
    if total == 0 {
        warn!("Phenotype '{}' has no individuals with a known status", status.name);
        return;
    }

    let control_frac = n_controls as f32 / total as f32;
    if control_frac < min_control_frac {
        warn!(
            "In phenotype '{}', controls are less than {}% of the data. Using all individuals as controls",
            status.name,
            min_control_frac * 100.0
        );
        status.fold_into_controls();
    } else if 1.0 - control_frac < min_control_frac && n_controls != total {
        warn!(
            "In phenotype '{}', cases are less than {}% of the data. Allele frequencies for cases may be unreliable",
            status.name,
            min_control_frac * 100.0
        );
    }

    let n_controls = status.n_controls();
    let n_cases = status.n_cases();
    if only_fixed_variants_rare(n_controls, maf_cutoff) {
        warn!(
            "MAF cutoff is so low that only variants fixed in controls are rare for phenotype '{}'",
            status.name
        );
    }
    if only_fixed_variants_rare(n_cases, maf_cutoff) {
        warn!(
            "MAF cutoff is so low that only variants fixed in cases are rare for phenotype '{}'",
            status.name
        );
    }

    info!(
        "Phenotype '{}': {} controls, {} cases",
        status.name, n_controls, n_cases
    );
}
