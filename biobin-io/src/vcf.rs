//! Line-oriented VCF ingestion.
//!
//! Only the fixed columns and the `GT` subfield are read. Every record must
//! carry exactly one genotype column per sample; anything else aborts the
//! load, since bins built from a partially read file would be wrong.
use std::io::BufRead;
use std::path::Path;

use log::{debug, info, warn};

use biobin_core::DiseaseModel;
use biobin_core::models::{Chromosome, GenotypeCall, Locus, LocusSet};
use biobin_core::traits::Liftover;
use biobin_population::genotype::call_contribution;
use biobin_population::{GenotypeBits, PopulationManager};

use crate::errors::{IoError, IoResult};
use crate::utils::get_dynamic_reader;

const FIXED_COLUMNS: [&str; 9] = [
    "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT",
];

/// One allele ordinal per chromosome copy, `None` when missing.
pub type RawCall = (Option<u16>, Option<u16>);

#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    pub chrom: String,
    pub pos: u32,
    pub id: String,
    /// Reference allele first, then the alternates.
    pub alleles: Vec<String>,
    pub calls: Vec<RawCall>,
}

/// Streaming reader over the records of a VCF file.
pub struct VcfReader<R: BufRead> {
    reader: R,
    line_no: usize,
    samples: Vec<String>,
    buf: String,
}

impl<R: BufRead> VcfReader<R> {
    /// Consume the meta lines and the `#CHROM` header.
    pub fn new(mut reader: R) -> IoResult<Self> {
        let mut line_no = 0;
        let mut buf = String::new();

        loop {
            buf.clear();
            if reader.read_line(&mut buf)? == 0 {
                return Err(IoError::VcfHeader("missing #CHROM line".to_string()));
            }
            line_no += 1;

            let line = buf.trim_end();
            if line.starts_with("##") {
                continue;
            }
            if !line.starts_with("#CHROM") {
                return Err(IoError::VcfHeader(format!(
                    "expected #CHROM line at line {}",
                    line_no
                )));
            }

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < FIXED_COLUMNS.len() {
                return Err(IoError::VcfHeader(format!(
                    "expected at least {} columns, found {}",
                    FIXED_COLUMNS.len(),
                    columns.len()
                )));
            }
            for (found, expected) in columns.iter().zip(FIXED_COLUMNS.iter()) {
                if !found.eq_ignore_ascii_case(expected) {
                    return Err(IoError::VcfHeader(format!(
                        "expected column {}, found {}",
                        expected, found
                    )));
                }
            }

            let samples = columns[FIXED_COLUMNS.len()..]
                .iter()
                .map(|s| s.to_string())
                .collect();
            return Ok(VcfReader {
                reader,
                line_no,
                samples,
                buf: String::new(),
            });
        }
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn next_record(&mut self) -> IoResult<Option<VcfRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = self.buf.trim_end();
            if line.is_empty() {
                continue;
            }
            return parse_record(line, self.line_no, self.samples.len()).map(Some);
        }
    }
}

fn parse_record(line: &str, line_no: usize, n_samples: usize) -> IoResult<VcfRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let expected = FIXED_COLUMNS.len() + n_samples;
    if fields.len() != expected {
        return Err(IoError::VcfFieldCount {
            line: line_no,
            expected,
            found: fields.len(),
        });
    }

    let record_err = |reason: String| IoError::VcfRecord {
        line: line_no,
        reason,
    };

    let pos = fields[1]
        .parse::<u32>()
        .map_err(|_| record_err(format!("invalid position {}", fields[1])))?;

    let mut alleles = vec![fields[3].to_string()];
    if fields[4] != "." {
        alleles.extend(fields[4].split(',').map(str::to_string));
    }

    let gt_idx = fields[8]
        .split(':')
        .position(|key| key == "GT")
        .ok_or_else(|| record_err("no GT in FORMAT".to_string()))?;

    let mut calls = Vec::with_capacity(n_samples);
    for sample in &fields[FIXED_COLUMNS.len()..] {
        let gt = sample.split(':').nth(gt_idx).unwrap_or(".");
        let call = parse_gt(gt, alleles.len()).map_err(|reason| record_err(reason))?;
        calls.push(call);
    }

    Ok(VcfRecord {
        chrom: fields[0].to_string(),
        pos,
        id: fields[2].to_string(),
        alleles,
        calls,
    })
}

/// Parse a `GT` value such as `0/1`, `1|1`, `./.` or a haploid `1`.
fn parse_gt(gt: &str, n_alleles: usize) -> Result<RawCall, String> {
    let parse_one = |a: &str| -> Result<Option<u16>, String> {
        if a == "." {
            return Ok(None);
        }
        match a.parse::<u16>() {
            Ok(idx) if (idx as usize) < n_alleles => Ok(Some(idx)),
            _ => Err(format!("invalid allele {} in genotype {}", a, gt)),
        }
    };

    let mut parts = gt.split(['/', '|']);
    let first = parse_one(parts.next().unwrap_or("."))?;
    let second = match parts.next() {
        Some(a) => parse_one(a)?,
        None => first,
    };
    Ok((first, second))
}

/// Options for [`load_vcf`].
#[derive(Default)]
pub struct VcfOptions<'a> {
    pub disease_model: DiseaseModel,
    pub liftover: Option<&'a dyn Liftover>,
}

/// What happened to the records of a VCF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VcfSummary {
    pub records: usize,
    pub loaded: usize,
    pub monomorphic: usize,
    pub unknown_chrom: usize,
    pub unmapped: usize,
}

///
/// Read every record of `reader` into `loci` and `pop`.
///
/// The samples become the individuals of `pop`. Allele frequencies are
/// computed over the non-missing calls. Records on unrecognized chromosomes,
/// records the liftover cannot place, and loci that are monomorphic under the
/// disease model are skipped.
///
pub fn load_vcf<R: BufRead>(
    reader: R,
    loci: &mut LocusSet,
    pop: &mut PopulationManager,
    opts: &VcfOptions,
) -> IoResult<VcfSummary> {
    let mut vcf = VcfReader::new(reader)?;
    pop.load_individuals(vcf.samples())?;

    let mut summary = VcfSummary::default();
    while let Some(record) = vcf.next_record()? {
        summary.records += 1;

        let chrom = match record.chrom.parse::<Chromosome>() {
            Ok(chrom) => chrom,
            Err(e) => {
                debug!("Skipping {}:{}: {}", record.chrom, record.pos, e);
                summary.unknown_chrom += 1;
                continue;
            }
        };

        let (chrom, pos) = match opts.liftover {
            Some(liftover) => match liftover.convert_locus(chrom, record.pos) {
                Some(converted) => converted,
                None => {
                    debug!("No liftover position for {}:{}", chrom, record.pos);
                    summary.unmapped += 1;
                    continue;
                }
            },
            None => (chrom, record.pos),
        };

        let mut counts = vec![0u32; record.alleles.len()];
        for (a1, a2) in &record.calls {
            for idx in [a1, a2].into_iter().flatten() {
                counts[*idx as usize] += 1;
            }
        }
        let observed: u32 = counts.iter().sum();
        if observed == 0 {
            summary.monomorphic += 1;
            continue;
        }

        let mut locus = Locus::new(chrom, pos, &record.id);
        for (allele, count) in record.alleles.iter().zip(&counts) {
            locus.add_allele(loci.pool_mut(), allele, *count as f32 / observed as f32);
        }

        let calls: Vec<GenotypeCall> = record
            .calls
            .iter()
            .map(|(a1, a2)| locus.minor_allele_count(Locus::encode_genotype(*a1, *a2)))
            .collect();

        let total: u32 = calls
            .iter()
            .map(|c| call_contribution(*c, opts.disease_model))
            .sum();
        if total == 0 {
            summary.monomorphic += 1;
            continue;
        }

        let id = loci.push(locus);
        pop.add_genotypes(id, GenotypeBits::from_calls(&calls))?;
        summary.loaded += 1;
    }

    if summary.unknown_chrom > 0 {
        warn!(
            "Skipped {} records on unrecognized chromosomes",
            summary.unknown_chrom
        );
    }
    info!(
        "Loaded {} of {} VCF records ({} monomorphic, {} unmapped)",
        summary.loaded, summary.records, summary.monomorphic, summary.unmapped
    );
    Ok(summary)
}

/// [`load_vcf`] on a plain or gzip'd file.
pub fn load_vcf_file(
    path: &Path,
    loci: &mut LocusSet,
    pop: &mut PopulationManager,
    opts: &VcfOptions,
) -> IoResult<VcfSummary> {
    let reader = get_dynamic_reader(path)?;
    load_vcf(reader, loci, pop, opts)
}
