use std::fmt::{self, Display};

use super::allele::{Allele, AllelePool};
use super::chrom::Chromosome;

/// Index of a [`Locus`] inside its [`LocusSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocusId(u32);

impl LocusId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A single individual's call at a locus, in copies of non-major alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenotypeCall {
    HomMajor,
    Het,
    HomMinor,
    Missing,
}

/// Packed pair of allele ordinals, see [`Locus::encode_genotype`].
pub type EncodedGenotype = u32;

///
/// A variant site: chromosome, position, identifier and its alleles.
///
/// Alleles are kept sorted by descending frequency (ties broken by allele
/// string), so the first allele is always the major allele.
///
#[derive(Debug, Clone)]
pub struct Locus {
    pub chrom: Chromosome,
    pub pos: u32,
    pub id: String,
    alleles: Vec<Allele>,
    rare: Option<bool>,
}

impl Locus {
    pub const MISSING_GENOTYPE: EncodedGenotype = EncodedGenotype::MAX;

    ///
    /// Create a locus. An empty or `.` identifier is replaced by
    /// `chr<chrom>-<pos>`.
    ///
    pub fn new(chrom: Chromosome, pos: u32, id: &str) -> Self {
        let id = match id.trim() {
            "" | "." => format!("chr{}-{}", chrom, pos),
            other => other.to_string(),
        };
        Locus {
            chrom,
            pos,
            id,
            alleles: Vec::new(),
            rare: None,
        }
    }

    /// Add an allele, keeping the allele list sorted. Returns the allele's ordinal.
    pub fn add_allele(&mut self, pool: &mut AllelePool, data: &str, freq: f32) -> u16 {
        let pos = self.alleles.len() as u16;
        let allele = Allele::new(pool.intern(data), freq, pos);
        let pool: &AllelePool = pool;
        let at = self
            .alleles
            .partition_point(|a| a.cmp_in(&allele, pool).is_le());
        self.alleles.insert(at, allele);
        pos
    }

    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    pub fn major_allele(&self) -> Option<&Allele> {
        self.alleles.first()
    }

    /// Frequency of the major allele. A locus without alleles counts as fixed.
    pub fn major_allele_freq(&self) -> f32 {
        self.major_allele().map(|a| a.freq).unwrap_or(1.0)
    }

    pub fn minor_allele_freq(&self) -> f32 {
        1.0 - self.major_allele_freq()
    }

    /// `true` when `data` is one of this locus' alleles and not the major one.
    pub fn is_minor(&self, pool: &AllelePool, data: &str) -> bool {
        match pool.get(data) {
            Some(sym) => self.alleles.iter().skip(1).any(|a| a.sym == sym),
            None => false,
        }
    }

    pub fn is_rare(&self) -> Option<bool> {
        self.rare
    }

    /// Set the rare flag. The first value written wins.
    pub fn set_rare(&mut self, rare: bool) -> bool {
        if self.rare.is_some() {
            return false;
        }
        self.rare = Some(rare);
        true
    }

    /// Pack two allele ordinals; a missing call on either side gives [`Locus::MISSING_GENOTYPE`].
    pub fn encode_genotype(a1: Option<u16>, a2: Option<u16>) -> EncodedGenotype {
        match (a1, a2) {
            (Some(a1), Some(a2)) => ((a1 as u32) << 16) | a2 as u32,
            _ => Self::MISSING_GENOTYPE,
        }
    }

    pub fn decode_genotype(encoded: EncodedGenotype) -> Option<(u16, u16)> {
        if encoded == Self::MISSING_GENOTYPE {
            return None;
        }
        Some(((encoded >> 16) as u16, (encoded & 0xFFFF) as u16))
    }

    /// Classify an encoded genotype by how many non-major alleles it carries.
    pub fn minor_allele_count(&self, encoded: EncodedGenotype) -> GenotypeCall {
        let (Some((a1, a2)), Some(major)) = (Self::decode_genotype(encoded), self.major_allele())
        else {
            return GenotypeCall::Missing;
        };

        match (a1 != major.pos) as u8 + (a2 != major.pos) as u8 {
            0 => GenotypeCall::HomMajor,
            1 => GenotypeCall::Het,
            _ => GenotypeCall::HomMinor,
        }
    }

    /// Distance in bases, `None` across chromosomes.
    pub fn distance(&self, other: &Locus) -> Option<u32> {
        (self.chrom == other.chrom).then(|| self.pos.abs_diff(other.pos))
    }

    /// Alleles joined by `:` in sorted order.
    pub fn allele_string(&self, pool: &AllelePool) -> String {
        self.alleles
            .iter()
            .map(|a| pool.resolve(a.sym))
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.pos, self.id)
    }
}

///
/// Arena of all loci of a dataset together with their allele pool.
///
/// Loci are addressed by [`LocusId`]; ids stay valid for the life of the set.
///
#[derive(Debug, Default, Clone)]
pub struct LocusSet {
    loci: Vec<Locus>,
    pool: AllelePool,
}

impl LocusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, locus: Locus) -> LocusId {
        self.loci.push(locus);
        LocusId((self.loci.len() - 1) as u32)
    }

    pub fn add_allele(&mut self, id: LocusId, data: &str, freq: f32) -> u16 {
        self.loci[id.index()].add_allele(&mut self.pool, data, freq)
    }

    pub fn get(&self, id: LocusId) -> &Locus {
        &self.loci[id.index()]
    }

    pub fn get_mut(&mut self, id: LocusId) -> &mut Locus {
        &mut self.loci[id.index()]
    }

    pub fn pool(&self) -> &AllelePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut AllelePool {
        &mut self.pool
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocusId, &Locus)> {
        self.loci
            .iter()
            .enumerate()
            .map(|(i, locus)| (LocusId(i as u32), locus))
    }

    pub fn ids(&self) -> impl Iterator<Item = LocusId> + use<> {
        (0..self.loci.len() as u32).map(LocusId)
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Set the rare flag on every locus that has none yet. Returns the number of rare loci.
    pub fn mark_rare(&mut self, maf_cutoff: f32) -> usize {
        for locus in self.loci.iter_mut() {
            let rare = locus.minor_allele_freq() < maf_cutoff;
            locus.set_rare(rare);
        }
        self.loci
            .iter()
            .filter(|l| l.is_rare() == Some(true))
            .count()
    }
}
