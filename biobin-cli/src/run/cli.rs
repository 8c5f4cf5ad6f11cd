use clap::{Command, arg, value_parser};

pub const RUN_CMD: &str = "run";

pub fn create_run_cli() -> Command {
    Command::new(RUN_CMD)
        .about("Bin the rare variants of a VCF file and write the bin reports")
        .arg_required_else_help(true)
        .arg(arg!(--vcf <vcf> "VCF file with the genotypes (plain or gzip'd)"))
        .arg(arg!(-r --regions <regions> "Region table (id, name, chrom, start, end, ...)").required(false))
        .arg(
            arg!(-g --groups <archive> "Group archive file; may be given more than once")
                .required(false)
                .num_args(1..),
        )
        .arg(arg!(-p --phenotypes <phenotypes> "Phenotype file").required(false))
        .arg(arg!(-c --config <config> "TOML configuration file").required(false))
        .arg(arg!(-w --weights <weights> "Custom SNP weight table; enables custom weights").required(false))
        .arg(
            arg!(--"include-regions" <aliases> "Only load regions with these names or aliases")
                .required(false)
                .num_args(1..),
        )
        .arg(
            arg!(--"include-groups" <names> "Only load groups with these names")
                .required(false)
                .num_args(1..),
        )
        .arg(
            arg!(--"maf-cutoff" <maf> "Minor allele frequency below which a variant is rare")
                .required(false)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            arg!(--"bin-width" <width> "Width of intergenic bins in bases")
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"traverse-threshold" <size> "Group bins above this size are split into region bins")
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"min-bin-size" <size> "Bins below this size are dropped")
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(arg!(--"disease-model" <model> "additive, dominant or recessive").required(false))
        .arg(arg!(--"weight-model" <model> "max, min, control or overall").required(false))
        .arg(arg!(--"calc-weights" "Apply Madsen-Browning weights"))
        .arg(
            arg!(--"control-value" <value> "Phenotype value marking a control")
                .required(false)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            arg!(-o --output <prefix> "Prefix of the output files")
                .required(false)
                .default_value("biobin"),
        )
        .arg(
            arg!(--sep <sep> "Output field separator")
                .required(false)
                .default_value(","),
        )
        .arg(arg!(--transpose "Write bins as rows and individuals as columns"))
}
