use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure taxonomy for the whole engine.
///
/// All failures are local and synchronous; nothing retries. The only
/// swallow-and-continue behaviors live at call sites (cardinality
/// truncation in joins, overwrite-with-log on duplicate registration)
/// and never surface as an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown reference: {0}")]
    UnknownReference(String),

    #[error("type conversion failed: {0}")]
    TypeConversion(String),

    #[error("unsupported operation '{0}' for {1} field")]
    Unsupported(&'static str, &'static str),

    // Manual-apply mode only: a derived property was read while its
    // pipeline stage is still pending.
    #[error("stale state: {0} read while a pipeline stage is pending")]
    StaleState(&'static str),

    #[error("referential integrity: {0}")]
    ReferentialIntegrity(String),

    #[error("name collision: {0}")]
    NameCollision(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::TypeConversion(e.to_string())
    }
}
