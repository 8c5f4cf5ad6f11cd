use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use biobin_core::BiobinConfig;

pub fn render_config(config: &BiobinConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

pub fn print_config(matches: &ArgMatches) -> Result<()> {
    let config = match matches.get_one::<String>("check") {
        Some(path) => BiobinConfig::try_from(Path::new(path))
            .with_context(|| format!("Invalid configuration file {}", path))?,
        None => BiobinConfig::default(),
    };
    print!("{}", render_config(&config)?);
    Ok(())
}
