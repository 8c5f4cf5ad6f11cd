use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use biobin_bins::{BinContext, BinManager};
use biobin_core::models::LocusSet;
use biobin_core::traits::{GroupLoader, Information, LoaderError, RegionLoader};
use biobin_core::{BiobinConfig, DiseaseModel, KnowledgeBase, WeightModel};
use biobin_io::{
    BinReport, GroupArchiveLoader, RegionFileLoader, VcfOptions, WeightTable, load_vcf_file,
    read_phenotype_file,
};
use biobin_overlaprs::IntoRegionIndex;
use biobin_population::{ContributionCalculator, PopulationManager};

/// Input files and output options of a run.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub vcf: PathBuf,
    pub regions: Option<PathBuf>,
    pub groups: Vec<PathBuf>,
    pub phenotypes: Option<PathBuf>,
    pub weights: Option<PathBuf>,
    pub include_regions: Vec<String>,
    pub include_groups: Vec<String>,
    pub output: String,
    pub sep: String,
    pub transpose: bool,
}

impl RunArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        let path = |id: &str| matches.get_one::<String>(id).map(PathBuf::from);
        let many = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|v| v.cloned().collect())
                .unwrap_or_default()
        };

        RunArgs {
            vcf: path("vcf").unwrap_or_default(),
            regions: path("regions"),
            groups: many("groups").into_iter().map(PathBuf::from).collect(),
            phenotypes: path("phenotypes"),
            weights: path("weights"),
            include_regions: many("include-regions"),
            include_groups: many("include-groups"),
            output: matches
                .get_one::<String>("output")
                .cloned()
                .unwrap_or_else(|| "biobin".to_string()),
            sep: matches
                .get_one::<String>("sep")
                .cloned()
                .unwrap_or_else(|| ",".to_string()),
            transpose: matches.get_flag("transpose"),
        }
    }
}

/// Configuration file (or defaults) with command line overrides applied.
fn build_config(matches: &ArgMatches) -> Result<BiobinConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => BiobinConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => BiobinConfig::default(),
    };

    if let Some(maf) = matches.get_one::<f32>("maf-cutoff") {
        config.binning.maf_cutoff = *maf;
    }
    if let Some(width) = matches.get_one::<u32>("bin-width") {
        config.binning.intergenic_bin_width = *width;
    }
    if let Some(size) = matches.get_one::<u32>("traverse-threshold") {
        config.binning.bin_traverse_threshold = *size;
    }
    if let Some(size) = matches.get_one::<u32>("min-bin-size") {
        config.binning.min_bin_size = *size;
    }
    if let Some(model) = matches.get_one::<String>("disease-model") {
        config.population.disease_model = model.parse::<DiseaseModel>()?;
    }
    if let Some(model) = matches.get_one::<String>("weight-model") {
        config.weights.model = model.parse::<WeightModel>()?;
    }
    if let Some(value) = matches.get_one::<f32>("control-value") {
        config.population.phenotype_control = *value;
    }
    if matches.get_flag("calc-weights") {
        config.weights.calculated = true;
    }
    if matches.contains_id("weights") {
        config.weights.custom = true;
    }

    config.validate()?;
    Ok(config)
}

pub fn run_biobin(matches: &ArgMatches) -> Result<()> {
    let config = build_config(matches)?;
    let args = RunArgs::from_matches(matches);
    run_pipeline(&args, &config)?;
    Ok(())
}

fn loader_error(e: LoaderError, path: &Path) -> anyhow::Error {
    anyhow::anyhow!(e).context(format!("Failed to load {}", path.display()))
}

fn output_path(args: &RunArgs, phenotype: &str, suffix: &str) -> PathBuf {
    let ext = if args.sep == "," { "csv" } else { "txt" };
    let name = if phenotype.is_empty() {
        format!("{}-{}.{}", args.output, suffix, ext)
    } else {
        let phenotype: String = phenotype
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}-{}-{}.{}", args.output, phenotype, suffix, ext)
    };
    PathBuf::from(name)
}

fn write_report<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> biobin_io::IoResult<()>,
{
    let file = File::create(path).with_context(|| format!("Can't create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out).with_context(|| format!("Failed to write {}", path.display()))?;
    out.flush()?;
    Ok(())
}

///
/// Run the whole binning pipeline and return the paths of the written reports.
///
/// Knowledge is loaded first, then genotypes and phenotypes. Bins are built
/// and reported once per phenotype.
///
pub fn run_pipeline(args: &RunArgs, config: &BiobinConfig) -> Result<Vec<PathBuf>> {
    let mut kb = KnowledgeBase::new();
    if let Some(path) = &args.regions {
        RegionFileLoader::new(path)
            .load_regions(&mut kb, &[], &args.include_regions)
            .map_err(|e| loader_error(e, path))?;
    }
    for path in &args.groups {
        GroupArchiveLoader::new(vec![path.clone()])
            .load_groups(&mut kb, &args.include_groups, &[])
            .map_err(|e| loader_error(e, path))?;
    }

    let mut loci = LocusSet::new();
    let mut pop = PopulationManager::new();
    let opts = VcfOptions {
        disease_model: config.population.disease_model,
        liftover: None,
    };
    load_vcf_file(&args.vcf, &mut loci, &mut pop, &opts)
        .with_context(|| format!("Failed to load VCF file {}", args.vcf.display()))?;

    let statuses = match &args.phenotypes {
        Some(path) => {
            let table = read_phenotype_file(path)
                .with_context(|| format!("Failed to read phenotypes from {}", path.display()))?;
            pop.classify(&table, &config.population, config.binning.maf_cutoff)
                .to_vec()
        }
        None => pop.classify_all_controls().to_vec(),
    };

    let index = (&kb).into_region_index();
    let associated = index.associate_loci(&mut kb, &loci);
    info!(
        "{} of {} loci fall inside a known region",
        associated,
        loci.len()
    );

    let weights = match &args.weights {
        Some(path) => Some(
            WeightTable::from_file(path)
                .with_context(|| format!("Failed to read weights from {}", path.display()))?,
        ),
        None => None,
    };

    let mut written = Vec::new();
    for status in &statuses {
        let mut bins = BinManager::new(config)?;
        bins.init_bins(&BinContext {
            kb: &kb,
            index: &index,
            loci: &loci,
            pop: &pop,
            status,
        });

        let mut calc = ContributionCalculator::new(&pop, &loci, status, config);
        if let Some(table) = &weights {
            calc = calc.with_information(table);
        }
        let report = BinReport::new(&kb, &loci, &pop, &bins, &calc).with_separator(&args.sep);
        let info = weights.as_ref().map(|w| w as &dyn Information);

        let path = output_path(args, &status.name, "bins");
        if args.transpose {
            write_report(&path, |out| report.write_bins_transposed(out))?;
        } else {
            write_report(&path, |out| report.write_bins(out))?;
        }
        written.push(path);

        let path = output_path(args, &status.name, "locus");
        write_report(&path, |out| report.write_loci(out, info))?;
        written.push(path);

        let path = output_path(args, &status.name, "summary");
        write_report(&path, |out| report.write_bin_summary(out))?;
        written.push(path);

        info!(
            "Phenotype '{}': {} bins over {} rare variants",
            status.name,
            bins.len(),
            report.binned_loci().len()
        );
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::build_parser;

    const VCF: &str = "\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ta\tb\tc\td\te\tf\tg\th\ti\tj\tk
1\t150\trs1\tA\tG\t.\tPASS\t.\tGT\t0/1\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0
1\t900000\trs2\tA\tG\t.\tPASS\t.\tGT\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/0\t0/1
";

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[rstest]
    fn test_run_pipeline_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            vcf: write(dir.path(), "data.vcf", VCF),
            regions: Some(write(dir.path(), "regions.tsv", "E1\tGENE1\t1\t100\t200\n")),
            phenotypes: Some(write(dir.path(), "pheno.txt", "#ID status\nk 1\n")),
            output: dir.path().join("out").display().to_string(),
            sep: ",".to_string(),
            ..Default::default()
        };

        let written = run_pipeline(&args, &BiobinConfig::default()).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["out-status-bins.csv", "out-status-locus.csv", "out-status-summary.csv"]
        );

        let bins = std::fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = bins.lines().collect();
        assert_eq!(lines[0], "ID,Status,GENE1,chr1:18");
        assert_eq!(lines[7], "a,0,1,0");
        assert_eq!(lines[17], "k,1,0,1");
    }

    #[rstest]
    fn test_cli_overrides_config() {
        let matches = build_parser().get_matches_from([
            "biobin",
            "run",
            "--vcf",
            "data.vcf",
            "--maf-cutoff",
            "0.01",
            "--disease-model",
            "dominant",
            "--calc-weights",
            "-w",
            "weights.tsv",
        ]);
        let (_, run) = matches.subcommand().unwrap();
        let config = build_config(run).unwrap();

        assert_eq!(config.binning.maf_cutoff, 0.01);
        assert_eq!(config.population.disease_model, DiseaseModel::Dominant);
        assert!(config.weights.calculated);
        assert!(config.weights.custom);

        let args = RunArgs::from_matches(run);
        assert_eq!(args.vcf, PathBuf::from("data.vcf"));
        assert_eq!(args.output, "biobin");
    }

    #[rstest]
    #[case("", "bins", "out-bins.csv")]
    #[case("case status", "locus", "out-case_status-locus.csv")]
    fn test_output_path(#[case] phenotype: &str, #[case] suffix: &str, #[case] expected: &str) {
        let args = RunArgs {
            output: "out".to_string(),
            sep: ",".to_string(),
            ..Default::default()
        };
        assert_eq!(output_path(&args, phenotype, suffix), PathBuf::from(expected));
    }
}
