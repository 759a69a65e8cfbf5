//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_key_tuple, hash_serde, Hash256};
pub use crate::id::TableId;
pub use crate::matrix::MatchMatrix;
pub use crate::value::{ColumnValues, Value};
