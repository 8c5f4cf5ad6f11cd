use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PopulationError {
    #[error("Individual {0} appears more than once")]
    DuplicateIndividual(String),

    #[error("Genotype data covers {found} individuals, expected {expected}")]
    GenotypeLength { expected: usize, found: usize },
}

pub type PopulationResult<T> = std::result::Result<T, PopulationError>;
