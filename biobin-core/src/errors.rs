use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CoreError {
    #[error("Unrecognized chromosome: {0}")]
    InvalidChromosome(String),

    #[error("Unrecognized disease model: {0}")]
    InvalidDiseaseModel(String),

    #[error("Unrecognized weight model: {0}")]
    InvalidWeightModel(String),

    #[error("Invalid region boundary for {name}: start {start} > end {end}")]
    InvalidBoundary { name: String, start: u32, end: u32 },
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
