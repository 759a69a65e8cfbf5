use thiserror::Error;

/// Result type local to reltab-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("engine error: {0}")]
    Engine(#[from] reltab_core::error::Error),

    #[error("malformed input: {0}")]
    Format(String),
}
