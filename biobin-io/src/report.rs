//! Delimited text reports of a finished binning pass.
use std::io::Write;

use biobin_bins::{Bin, BinKind, BinManager};
use biobin_core::KnowledgeBase;
use biobin_core::models::{LocusId, LocusSet};
use biobin_core::traits::Information;
use biobin_population::{ContributionCalculator, PopulationManager};

use crate::errors::IoResult;

const MULTI_SEP: &str = "|";

/// Replacement for separator characters inside names.
fn escape_string(sep: &str) -> &'static str {
    if sep == "_" { "-" } else { "_" }
}

///
/// Writes the bin matrix, the locus table and the bin summary for one
/// phenotype.
///
/// Cells of the bin matrix are per-individual contributions summed over the
/// bin's loci, weighted by the calculator when `use_weights` is set.
///
pub struct BinReport<'a> {
    kb: &'a KnowledgeBase,
    loci: &'a LocusSet,
    pop: &'a PopulationManager,
    bins: &'a BinManager,
    calc: &'a ContributionCalculator<'a>,
    use_weights: bool,
    sep: String,
    repl: &'static str,
}

impl<'a> BinReport<'a> {
    pub fn new(
        kb: &'a KnowledgeBase,
        loci: &'a LocusSet,
        pop: &'a PopulationManager,
        bins: &'a BinManager,
        calc: &'a ContributionCalculator<'a>,
    ) -> Self {
        BinReport {
            kb,
            loci,
            pop,
            bins,
            calc,
            use_weights: true,
            sep: ",".to_string(),
            repl: escape_string(","),
        }
    }

    pub fn with_separator(mut self, sep: &str) -> Self {
        self.sep = sep.to_string();
        self.repl = escape_string(sep);
        self
    }

    pub fn with_weights(mut self, use_weights: bool) -> Self {
        self.use_weights = use_weights;
        self
    }

    fn escape(&self, value: &str) -> String {
        value.replace(self.sep.as_str(), self.repl)
    }

    fn cell(&self, bin: &Bin, individual: usize) -> f64 {
        let region = bin.region_id().and_then(|id| self.kb.region(id));
        self.calc
            .contribution_sum(bin.loci(), individual, self.use_weights, region)
    }

    fn status_label(&self, individual: usize) -> &'static str {
        match self.calc.status().status(individual) {
            Some(false) => "0",
            Some(true) => "1",
            None => "NaN",
        }
    }

    fn loci_with_carriers(&self, bin: &Bin, case: bool) -> usize {
        let status = self.calc.status();
        let mask = if case { &status.cases } else { &status.controls };
        bin.loci()
            .filter(|l| {
                self.pop
                    .total_contribution(*l, mask, self.calc.disease_model())
                    > 0
            })
            .count()
    }

    /// (label, one value per bin) rows printed ahead of the individuals.
    fn summary_rows(&self) -> Vec<(&'static str, Vec<String>)> {
        let status = self.calc.status();
        let model = self.calc.disease_model();

        let mut rows: Vec<(&'static str, Vec<String>)> = vec![
            ("Total Contribution", Vec::new()),
            ("Total Loci", Vec::new()),
            ("Control Loci Totals", Vec::new()),
            ("Case Loci Totals", Vec::new()),
            ("Control Bin Capacity", Vec::new()),
            ("Case Bin Capacity", Vec::new()),
        ];

        for bin in self.bins.bins() {
            let totals = bin.totals(self.pop, status, model);
            let capacity = self.pop.bin_capacity(bin.loci(), status, model);
            let values = [
                totals.control + totals.case,
                bin.num_loci() as u32,
                self.loci_with_carriers(bin, false) as u32,
                self.loci_with_carriers(bin, true) as u32,
                capacity.control,
                capacity.case,
            ];
            for (row, value) in rows.iter_mut().zip(values) {
                row.1.push(value.to_string());
            }
        }
        rows
    }

    ///
    /// One column per bin and one row per individual, preceded by the
    /// summary rows (status `-1`).
    ///
    pub fn write_bins<W: Write>(&self, out: &mut W) -> IoResult<()> {
        let sep = self.sep.as_str();

        write!(out, "ID{}Status", sep)?;
        for bin in self.bins.bins() {
            write!(out, "{}{}", sep, self.escape(bin.name()))?;
        }
        writeln!(out)?;

        for (label, values) in self.summary_rows() {
            write!(out, "{}{}-1", label, sep)?;
            for value in values {
                write!(out, "{}{}", sep, value)?;
            }
            writeln!(out)?;
        }

        for (idx, id) in self.pop.individuals().iter().enumerate() {
            write!(out, "{}{}{}", self.escape(id), sep, self.status_label(idx))?;
            for bin in self.bins.bins() {
                write!(out, "{}{}", sep, self.cell(bin, idx))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// [`BinReport::write_bins`] with bins as rows and individuals as columns.
    pub fn write_bins_transposed<W: Write>(&self, out: &mut W) -> IoResult<()> {
        let sep = self.sep.as_str();
        let summary = self.summary_rows();

        write!(out, "Bin")?;
        for (label, _) in &summary {
            write!(out, "{}{}", sep, label)?;
        }
        for id in self.pop.individuals() {
            write!(out, "{}{}", sep, self.escape(id))?;
        }
        writeln!(out)?;

        write!(out, "Status")?;
        for _ in &summary {
            write!(out, "{}-1", sep)?;
        }
        for idx in 0..self.pop.num_individuals() {
            write!(out, "{}{}", sep, self.status_label(idx))?;
        }
        writeln!(out)?;

        for (col, bin) in self.bins.bins().enumerate() {
            write!(out, "{}", self.escape(bin.name()))?;
            for (_, values) in &summary {
                write!(out, "{}{}", sep, values[col])?;
            }
            for idx in 0..self.pop.num_individuals() {
                write!(out, "{}{}", sep, self.cell(bin, idx))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    ///
    /// One row per locus with its control and case minor allele frequencies,
    /// its bins, containing regions and, when `info` is given, the locus'
    /// role in each region.
    ///
    pub fn write_loci<W: Write>(
        &self,
        out: &mut W,
        info: Option<&dyn Information>,
    ) -> IoResult<()> {
        let sep = self.sep.as_str();
        let status = self.calc.status();
        writeln!(
            out,
            "{}",
            [
                "Locus",
                "Chromosome",
                "Position",
                "Alleles",
                "MAF",
                "Control MAF",
                "Case MAF",
                "Rare",
                "Bins",
                "Regions",
                "Roles"
            ]
            .join(sep)
        )?;

        for (id, locus) in self.loci.iter() {
            let bins: Vec<&str> = self.bins.bins_of(id).map(Bin::name).collect();
            let regions: Vec<_> = self
                .bins
                .regions_of(id)
                .filter_map(|r| self.kb.region(r))
                .collect();
            let region_names: Vec<&str> = regions.iter().map(|r| r.name()).collect();
            let roles: Vec<String> = match info {
                Some(info) => regions
                    .iter()
                    .map(|r| info.snp_role(locus, Some(*r)).to_string())
                    .collect(),
                None => Vec::new(),
            };

            writeln!(
                out,
                "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
                self.escape(&locus.id),
                locus.chrom,
                locus.pos,
                self.escape(&locus.allele_string(self.loci.pool())),
                locus.minor_allele_freq(),
                self.pop.maf(id, &status.controls),
                self.pop.maf(id, &status.cases),
                u8::from(self.bins.rare_loci().contains(&id)),
                self.escape(&bins.join(MULTI_SEP)),
                self.escape(&region_names.join(MULTI_SEP)),
                self.escape(&roles.join(MULTI_SEP)),
                sep = sep,
            )?;
        }
        Ok(())
    }

    /// One row per bin with its kind, locus count and contribution totals.
    pub fn write_bin_summary<W: Write>(&self, out: &mut W) -> IoResult<()> {
        let sep = self.sep.as_str();
        let status = self.calc.status();
        let model = self.calc.disease_model();

        writeln!(
            out,
            "{}",
            ["Bin", "Kind", "Chromosome", "Loci", "Control Size", "Case Size"].join(sep)
        )?;
        for bin in self.bins.bins() {
            let kind = match bin.kind() {
                BinKind::Group(_) => "group",
                BinKind::Region(_) => "region",
                BinKind::Intergenic { .. } => "intergenic",
            };
            let chrom = bin.chrom().map(|c| c.to_string()).unwrap_or_default();
            let totals = bin.totals(self.pop, status, model);
            writeln!(
                out,
                "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
                self.escape(bin.name()),
                kind,
                chrom,
                bin.num_loci(),
                totals.control,
                totals.case,
                sep = sep,
            )?;
        }
        Ok(())
    }

    /// Rare loci that ended up in at least one bin.
    pub fn binned_loci(&self) -> Vec<LocusId> {
        self.bins
            .rare_loci()
            .iter()
            .copied()
            .filter(|l| self.bins.bins_of(*l).next().is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use biobin_bins::BinContext;
    use biobin_core::BiobinConfig;
    use biobin_core::models::{Chromosome, GenotypeCall, Locus};
    use biobin_overlaprs::IntoRegionIndex;
    use biobin_population::{GenotypeBits, PhenotypeStatus};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use GenotypeCall::*;

    struct Fixture {
        kb: KnowledgeBase,
        loci: LocusSet,
        pop: PopulationManager,
        status: PhenotypeStatus,
        bins: BinManager,
        config: BiobinConfig,
    }

    fn fixture() -> Fixture {
        let chr1 = Chromosome::new(1).unwrap();
        let mut kb = KnowledgeBase::new();
        kb.add_region("GENE,1", chr1, 100, 200).unwrap();

        let mut loci = LocusSet::new();
        let mut pop = PopulationManager::new();
        pop.load_individuals(&["a", "b", "c"]).unwrap();

        for (pos, calls) in [(150, [Het, HomMajor, Missing]), (160, [HomMajor, HomMajor, HomMinor])] {
            let id = loci.push(Locus::new(chr1, pos, ""));
            loci.add_allele(id, "A", 0.99);
            loci.add_allele(id, "T", 0.01);
            pop.add_genotypes(id, GenotypeBits::from_calls(&calls)).unwrap();
        }

        let mut status = PhenotypeStatus::empty("p", 3);
        status.controls.set(0, true);
        status.cases.set(2, true);

        let config = BiobinConfig::default();
        let index = (&kb).into_region_index();
        index.associate_loci(&mut kb, &loci);
        let mut bins = BinManager::new(&config).unwrap();
        bins.init_bins(&BinContext {
            kb: &kb,
            index: &index,
            loci: &loci,
            pop: &pop,
            status: &status,
        });

        Fixture {
            kb,
            loci,
            pop,
            status,
            bins,
            config,
        }
    }

    #[rstest]
    fn test_write_bins() {
        let f = fixture();
        let calc = ContributionCalculator::new(&f.pop, &f.loci, &f.status, &f.config);
        let report = BinReport::new(&f.kb, &f.loci, &f.pop, &f.bins, &calc);

        let mut out = Vec::new();
        report.write_bins(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
ID,Status,GENE_1
Total Contribution,-1,3
Total Loci,-1,2
Control Loci Totals,-1,1
Case Loci Totals,-1,1
Control Bin Capacity,-1,4
Case Bin Capacity,-1,2
a,0,1
b,NaN,0
c,1,2
";
        assert_eq!(text, expected);
    }

    #[rstest]
    fn test_write_bins_transposed_with_tabs() {
        let f = fixture();
        let calc = ContributionCalculator::new(&f.pop, &f.loci, &f.status, &f.config);
        let report = BinReport::new(&f.kb, &f.loci, &f.pop, &f.bins, &calc).with_separator("\t");

        let mut out = Vec::new();
        report.write_bins_transposed(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Bin\tTotal Contribution\t"));
        assert!(lines[0].ends_with("\ta\tb\tc"));
        assert_eq!(lines[1], "Status\t-1\t-1\t-1\t-1\t-1\t-1\t0\tNaN\t1");
        assert_eq!(lines[2], "GENE,1\t3\t2\t1\t1\t4\t2\t1\t0\t2");
    }

    #[rstest]
    fn test_write_loci_and_summary() {
        let f = fixture();
        let calc = ContributionCalculator::new(&f.pop, &f.loci, &f.status, &f.config);
        let report = BinReport::new(&f.kb, &f.loci, &f.pop, &f.bins, &calc);

        let mut out = Vec::new();
        report.write_loci(&mut out, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Locus,Chromosome,Position,Alleles,MAF,Control MAF,Case MAF,Rare,Bins,Regions,Roles"
        );
        assert!(lines[1].starts_with("chr1-150,1,150,A:T,"));
        // a is a het control, c has no call
        assert!(lines[1].ends_with(",0.5,0,1,GENE_1,GENE_1,"));
        // c is a hom-minor case
        assert!(lines[2].ends_with(",0,1,1,GENE_1,GENE_1,"));

        let mut out = Vec::new();
        report.write_bin_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Bin,Kind,Chromosome,Loci,Control Size,Case Size\nGENE_1,region,1,2,1,2\n"
        );
        assert_eq!(report.binned_loci().len(), 2);
    }

    #[rstest]
    #[case(",", "_")]
    #[case("_", "-")]
    #[case("\t", "_")]
    fn test_escape_string(#[case] sep: &str, #[case] expected: &str) {
        assert_eq!(escape_string(sep), expected);
    }
}
