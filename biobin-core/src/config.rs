use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::CoreError;

/// How a genotype is turned into a contribution count.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseModel {
    #[default]
    Additive,
    Dominant,
    Recessive,
}

/// How the case and control Madsen-Browning weights are combined.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeightModel {
    #[default]
    Max,
    Min,
    Control,
    Overall,
}

/// What a bin's size means when comparing against the collapse and prune thresholds.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BinSizePolicy {
    /// Total genotype contribution of the bin's loci over cases and controls.
    #[default]
    Contribution,
    /// Number of loci in the bin.
    Variants,
}

impl FromStr for DiseaseModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().chars().next() {
            Some('a') => Ok(DiseaseModel::Additive),
            Some('d') => Ok(DiseaseModel::Dominant),
            Some('r') => Ok(DiseaseModel::Recessive),
            _ => Err(CoreError::InvalidDiseaseModel(s.to_string())),
        }
    }
}

impl FromStr for WeightModel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "max" => Ok(WeightModel::Max),
            "min" => Ok(WeightModel::Min),
            l if l.starts_with('c') => Ok(WeightModel::Control),
            l if l.starts_with('o') => Ok(WeightModel::Overall),
            _ => Err(CoreError::InvalidWeightModel(s.to_string())),
        }
    }
}

impl Display for DiseaseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiseaseModel::Additive => "additive",
            DiseaseModel::Dominant => "dominant",
            DiseaseModel::Recessive => "recessive",
        };
        write!(f, "{}", name)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BinningConfig {
    pub maf_cutoff: f32,
    pub intergenic_bin_width: u32,
    pub bin_traverse_threshold: u32,
    pub min_bin_size: u32,
    pub size_policy: BinSizePolicy,
}

impl Default for BinningConfig {
    fn default() -> Self {
        BinningConfig {
            maf_cutoff: 0.05,
            intergenic_bin_width: 50000,
            bin_traverse_threshold: 50,
            min_bin_size: 1,
            size_policy: BinSizePolicy::Contribution,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub disease_model: DiseaseModel,
    pub min_control_frac: f32,
    pub phenotype_control: f32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            disease_model: DiseaseModel::Additive,
            min_control_frac: 0.125,
            phenotype_control: 0.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct WeightConfig {
    pub model: WeightModel,
    /// Apply Madsen-Browning weights.
    pub calculated: bool,
    /// Apply externally supplied SNP weights.
    pub custom: bool,
}

///
/// Run configuration shared by the bin engine and the contribution calculator.
///
/// Every field has a default, so an empty TOML file is a valid configuration.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct BiobinConfig {
    pub binning: BinningConfig,
    pub population: PopulationConfig,
    pub weights: WeightConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl BiobinConfig {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        let b = &self.binning;
        if !(b.maf_cutoff > 0.0 && b.maf_cutoff <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "binning.maf_cutoff",
                reason: format!("{} is outside (0, 1]", b.maf_cutoff),
            });
        }
        if b.intergenic_bin_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "binning.intergenic_bin_width",
                reason: "must be positive".to_string(),
            });
        }
        let frac = self.population.min_control_frac;
        if !(0.0..=1.0).contains(&frac) {
            return Err(ConfigError::InvalidValue {
                field: "population.min_control_frac",
                reason: format!("{} is outside [0, 1]", frac),
            });
        }
        Ok(())
    }
}

impl TryFrom<&Path> for BiobinConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config: BiobinConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
