use bitvec::prelude::*;

use biobin_core::DiseaseModel;
use biobin_core::models::GenotypeCall;

/// Bit vector with one bit per individual.
pub type Bits = BitVec<u64, Lsb0>;

///
/// Two-bit genotype encoding of one locus across all individuals.
///
/// | `first` | `second` | call      |
/// |---------|----------|-----------|
/// | 0       | 0        | hom-major |
/// | 0       | 1        | het       |
/// | 1       | 0        | hom-minor |
/// | 1       | 1        | missing   |
///
/// Counts over a subset are computed a machine word at a time.
///
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeBits {
    first: Bits,
    second: Bits,
}

impl GenotypeBits {
    /// All individuals homozygous for the major allele.
    pub fn new(n_individuals: usize) -> Self {
        GenotypeBits {
            first: bitvec![u64, Lsb0; 0; n_individuals],
            second: bitvec![u64, Lsb0; 0; n_individuals],
        }
    }

    pub fn from_calls(calls: &[GenotypeCall]) -> Self {
        let mut bits = Self::new(calls.len());
        for (idx, call) in calls.iter().enumerate() {
            bits.set(idx, *call);
        }
        bits
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    pub fn set(&mut self, idx: usize, call: GenotypeCall) {
        let (first, second) = match call {
            GenotypeCall::HomMajor => (false, false),
            GenotypeCall::Het => (false, true),
            GenotypeCall::HomMinor => (true, false),
            GenotypeCall::Missing => (true, true),
        };
        self.first.set(idx, first);
        self.second.set(idx, second);
    }

    /// Call of individual `idx`; out of range individuals read as missing.
    pub fn get(&self, idx: usize) -> GenotypeCall {
        let bit = |bits: &Bits| bits.get(idx).map_or(true, |b| *b);
        match (bit(&self.first), bit(&self.second)) {
            (false, false) => GenotypeCall::HomMajor,
            (false, true) => GenotypeCall::Het,
            (true, false) => GenotypeCall::HomMinor,
            (true, true) => GenotypeCall::Missing,
        }
    }

    /// Contribution of individual `idx`; missing calls contribute 0.
    pub fn contribution(&self, idx: usize, model: DiseaseModel) -> u32 {
        call_contribution(self.get(idx), model)
    }

    /// Number of non-missing individuals in `mask`.
    pub fn nonmissing_count(&self, mask: &Bits) -> u32 {
        self.masked_count(mask, |f, s| !(f & s))
    }

    /// Non-missing hom-minor individuals in `mask`.
    fn hom_minor_count(&self, mask: &Bits) -> u32 {
        self.masked_count(mask, |f, s| f & !s)
    }

    /// Non-missing het individuals in `mask`.
    fn het_count(&self, mask: &Bits) -> u32 {
        self.masked_count(mask, |f, s| s & !f)
    }

    /// Copies of non-major alleles carried by individuals in `mask`.
    pub fn minor_allele_count(&self, mask: &Bits) -> u32 {
        2 * self.hom_minor_count(mask) + self.het_count(mask)
    }

    /// Sum of per-individual contributions over `mask` under `model`.
    pub fn total_contribution(&self, mask: &Bits, model: DiseaseModel) -> u32 {
        match model {
            DiseaseModel::Additive => self.minor_allele_count(mask),
            DiseaseModel::Dominant => self.hom_minor_count(mask) + self.het_count(mask),
            DiseaseModel::Recessive => self.hom_minor_count(mask),
        }
    }

    /// Popcount of `op(first, second) & mask`, one word at a time.
    fn masked_count(&self, mask: &Bits, op: impl Fn(u64, u64) -> u64) -> u32 {
        let len = self.len().min(mask.len());
        if len == 0 {
            return 0;
        }
        let n_words = len.div_ceil(64);
        let tail_bits = len % 64;

        let first = self.first.as_raw_slice();
        let second = self.second.as_raw_slice();
        let mask = mask.as_raw_slice();

        let mut total = 0;
        for w in 0..n_words {
            let mut word = op(first[w], second[w]) & mask[w];
            if w == n_words - 1 && tail_bits != 0 {
                word &= (1u64 << tail_bits) - 1;
            }
            total += word.count_ones();
        }
        total
    }
}

/// Contribution of a single call under `model`.
pub fn call_contribution(call: GenotypeCall, model: DiseaseModel) -> u32 {
    let copies = match call {
        GenotypeCall::HomMajor | GenotypeCall::Missing => 0,
        GenotypeCall::Het => 1,
        GenotypeCall::HomMinor => 2,
    };
    match model {
        DiseaseModel::Additive => copies,
        DiseaseModel::Dominant => (copies > 0) as u32,
        DiseaseModel::Recessive => (copies > 1) as u32,
    }
}
