use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use biobin_bins::{BinContext, BinManager};
use biobin_core::models::LocusSet;
use biobin_core::traits::{GroupLoader, RegionLoader};
use biobin_core::{BiobinConfig, KnowledgeBase};
use biobin_io::{
    BinReport, GroupArchiveLoader, RegionFileLoader, VcfOptions, load_vcf_file, read_phenotype_file,
};
use biobin_overlaprs::IntoRegionIndex;
use biobin_population::{ContributionCalculator, PopulationManager};

const VCF: &str = "\
##fileformat=VCFv4.1
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tc1\tc2\tc3\tc4\tk1\tk2\tk3\tk4
1\t1000\trs1\tA\tG\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/0\t0/1\t0/0\t0/0\t0/0
1\t2000\trs2\tC\tT\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/0\t0/0\t1/1\t0/0\t0/0
1\t3500\trs3\tG\tA\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0
1\t5000000\trs4\tT\tC\t.\tPASS\t.\tGT\t0/1\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0
1\t6000\trs5\tA\tC\t.\tPASS\t.\tGT\t0/1\t0/1\t0/1\t0/1\t0/1\t0/1\t0/1\t0/1
";

const REGIONS: &str = "\
E1\tG1\t1\t500\t2500
E2\tG2\t1\t1800\t3000
";

const ARCHIVE: &str = "\
TEST
GROUP P1
G2
";

const PHENOTYPES: &str = "\
#ID\tdisease
c1\t0
c2\t0
c3\t0
c4\t0
k1\t1
k2\t1
k3\t1
k4\t1
";

struct Inputs {
    dir: TempDir,
}

impl Inputs {
    fn write(&self, name: &str, content: &str) -> std::path::PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }
}

#[fixture]
fn inputs() -> Inputs {
    Inputs {
        dir: tempfile::tempdir().unwrap(),
    }
}

#[rstest]
fn test_vcf_to_bin_matrix(inputs: Inputs) {
    let vcf = inputs.write("data.vcf", VCF);
    let regions = inputs.write("regions.tsv", REGIONS);
    let archive = inputs.write("custom.txt", ARCHIVE);
    let phenotypes = inputs.write("pheno.txt", PHENOTYPES);

    // 8 individuals: a single het has frequency 1/16
    let mut config = BiobinConfig::default();
    config.binning.maf_cutoff = 0.2;
    let none: Vec<String> = Vec::new();

    let mut kb = KnowledgeBase::new();
    RegionFileLoader::new(&regions)
        .load_regions(&mut kb, &none, &none)
        .unwrap();
    GroupArchiveLoader::new(vec![archive])
        .load_groups(&mut kb, &none, &none)
        .unwrap();

    let mut loci = LocusSet::new();
    let mut pop = PopulationManager::new();
    let summary = load_vcf_file(&vcf, &mut loci, &mut pop, &VcfOptions::default()).unwrap();
    assert_eq!(summary.loaded, 4);
    assert_eq!(summary.monomorphic, 1);

    let table = read_phenotype_file(&phenotypes).unwrap();
    let status = pop
        .classify(&table, &config.population, config.binning.maf_cutoff)
        .to_vec();
    assert_eq!(status.len(), 1);
    let status = &status[0];
    assert_eq!(status.n_controls(), 4);
    assert_eq!(status.n_cases(), 4);

    let index = (&kb).into_region_index();
    index.associate_loci(&mut kb, &loci);

    let mut bins = BinManager::new(&config).unwrap();
    bins.init_bins(&BinContext {
        kb: &kb,
        index: &index,
        loci: &loci,
        pop: &pop,
        status,
    });

    let names: Vec<&str> = bins.bins().map(|b| b.name()).collect();
    assert_eq!(names, vec!["TEST:P1", "G1", "chr1:100"]);

    let calc = ContributionCalculator::new(&pop, &loci, status, &config);
    let report = BinReport::new(&kb, &loci, &pop, &bins, &calc);
    let mut out = Vec::new();
    report.write_bins(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], "ID,Status,TEST:P1,G1,chr1:100");
    assert_eq!(lines[1], "Total Contribution,-1,2,3,1");
    assert_eq!(lines[2], "Total Loci,-1,1,2,1");
    assert_eq!(lines[7], "c1,0,0,0,1");
    assert_eq!(lines[11], "k1,1,0,1,0");
    assert_eq!(lines[12], "k2,1,2,2,0");
    assert_eq!(lines.len(), 15);
}
