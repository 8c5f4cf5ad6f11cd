use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Malformed VCF header: {0}")]
    VcfHeader(String),

    #[error("VCF line {line}: expected {expected} fields, found {found}")]
    VcfFieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("VCF line {line}: {reason}")]
    VcfRecord { line: usize, reason: String },

    #[error("{path} line {line}: {reason}")]
    ParseError {
        path: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] biobin_core::errors::CoreError),

    #[error(transparent)]
    Population(#[from] biobin_population::errors::PopulationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type IoResult<T> = std::result::Result<T, IoError>;
