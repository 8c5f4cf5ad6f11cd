use std::cmp::Ordering;

use fxhash::FxHashMap as HashMap;

/// Handle to an interned allele string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlleleSym(u32);

///
/// Interning table for allele strings.
///
/// Many loci share the same short allele strings (`A`, `C`, `G`, `T`), so each
/// distinct string is stored once and referenced through an [`AlleleSym`]. The
/// pool belongs to a single dataset; there is no process-wide table.
///
#[derive(Debug, Default, Clone)]
pub struct AllelePool {
    strings: Vec<String>,
    lookup: HashMap<String, AlleleSym>,
}

impl AllelePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `data`, interning it on first sight.
    pub fn intern(&mut self, data: &str) -> AlleleSym {
        if let Some(sym) = self.lookup.get(data) {
            return *sym;
        }
        let sym = AlleleSym(self.strings.len() as u32);
        self.strings.push(data.to_string());
        self.lookup.insert(data.to_string(), sym);
        sym
    }

    /// Look up a handle without interning.
    pub fn get(&self, data: &str) -> Option<AlleleSym> {
        self.lookup.get(data).copied()
    }

    pub fn resolve(&self, sym: AlleleSym) -> &str {
        &self.strings[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// One allele of a locus with its observed frequency.
///
/// `pos` is the allele's ordinal in the source data (0 for the reference
/// allele of a VCF record) and is what genotype encodings refer to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allele {
    pub sym: AlleleSym,
    pub freq: f32,
    pub pos: u16,
}

impl Allele {
    pub fn new(sym: AlleleSym, freq: f32, pos: u16) -> Self {
        Allele { sym, freq, pos }
    }

    /// Descending frequency, then allele string ascending.
    pub fn cmp_in(&self, other: &Allele, pool: &AllelePool) -> Ordering {
        other
            .freq
            .total_cmp(&self.freq)
            .then_with(|| pool.resolve(self.sym).cmp(pool.resolve(other.sym)))
    }
}
