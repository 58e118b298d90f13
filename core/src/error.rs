use thiserror::Error;

#[derive(Error, Debug)]
pub enum TapeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid distribution parameters: {0}")]
    Distribution(#[from] rand_distr::NormalError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing input: {what}")]
    MissingInput { what: String },

    #[error("Tape column '{column}' missing or not of type {expected}")]
    SchemaMismatch { column: String, expected: String },

    #[error("Invalid {column} value '{value}'")]
    InvalidBand { column: String, value: String },

    #[error("Invalid loan count {count}: must be at least 1")]
    InvalidLoanCount { count: usize },

    #[error("No data: {what}")]
    NoData { what: String },
}

pub type TapeResult<T> = Result<T, TapeError>;
