use bitvec::prelude::*;
use fxhash::FxHashMap as HashMap;

use crate::genotype::Bits;

/// Raw phenotype values per individual, one column per named phenotype.
/// Missing or unparsable values are stored as NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhenotypeTable {
    names: Vec<String>,
    values: HashMap<String, Vec<f32>>,
}

impl PhenotypeTable {
    pub fn new(names: Vec<String>) -> Self {
        PhenotypeTable {
            names,
            values: HashMap::default(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn insert(&mut self, individual: &str, values: Vec<f32>) {
        self.values.insert(individual.to_string(), values);
    }

    pub fn values(&self, individual: &str) -> Option<&[f32]> {
        self.values.get(individual).map(Vec::as_slice)
    }

    pub fn individuals(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Case/control split of all individuals for one phenotype.
///
/// An individual is in at most one of the two sets; individuals in neither
/// have a missing phenotype.
#[derive(Debug, Clone, PartialEq)]
pub struct PhenotypeStatus {
    pub name: String,
    pub controls: Bits,
    pub cases: Bits,
}

impl PhenotypeStatus {
    pub fn empty(name: &str, n_individuals: usize) -> Self {
        PhenotypeStatus {
            name: name.to_string(),
            controls: bitvec![u64, Lsb0; 0; n_individuals],
            cases: bitvec![u64, Lsb0; 0; n_individuals],
        }
    }

    pub fn all_controls(name: &str, n_individuals: usize) -> Self {
        PhenotypeStatus {
            name: name.to_string(),
            controls: bitvec![u64, Lsb0; 1; n_individuals],
            cases: bitvec![u64, Lsb0; 0; n_individuals],
        }
    }

    pub fn is_control(&self, idx: usize) -> bool {
        self.controls[idx]
    }

    pub fn is_case(&self, idx: usize) -> bool {
        self.cases[idx]
    }

    /// `Some(true)` for cases, `Some(false)` for controls, `None` when missing.
    pub fn status(&self, idx: usize) -> Option<bool> {
        if self.cases[idx] {
            Some(true)
        } else if self.controls[idx] {
            Some(false)
        } else {
            None
        }
    }

    pub fn n_controls(&self) -> usize {
        self.controls.count_ones()
    }

    pub fn n_cases(&self) -> usize {
        self.cases.count_ones()
    }

    /// Move every case into the controls.
    pub fn fold_into_controls(&mut self) {
        self.controls |= self.cases.clone();
        self.cases.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_status_and_fold() {
        let mut status = PhenotypeStatus::empty("p", 4);
        status.controls.set(0, true);
        status.cases.set(1, true);
        status.cases.set(2, true);

        assert_eq!(status.status(0), Some(false));
        assert_eq!(status.status(1), Some(true));
        assert_eq!(status.status(3), None);

        status.fold_into_controls();
        assert_eq!(status.n_controls(), 3);
        assert_eq!(status.n_cases(), 0);
        assert_eq!(status.status(3), None);
    }

    #[rstest]
    fn test_table_lookup() {
        let mut table = PhenotypeTable::new(vec!["bmi".to_string()]);
        table.insert("ind1", vec![1.0]);

        assert_eq!(table.values("ind1"), Some(&[1.0f32][..]));
        assert_eq!(table.values("ind2"), None);
        assert_eq!(table.names(), &["bmi".to_string()]);
    }
}
