//! Engine configuration, constructed once at process start and passed down.
//!
//! There is deliberately no lazily-initialized global here; whichever
//! component needs a cache path or a date format receives the config
//! explicitly.

use serde::{Deserialize, Serialize};

/// Default parse/render format for `Date` columns.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default parse/render format for `DateTime` columns.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory used by cache-store implementations for large computed
    /// fields. The core never touches it.
    pub cache_dir: String,

    /// Preferred parse/render format for inferred `Date` columns.
    pub date_format: String,

    /// Preferred parse/render format for inferred `DateTime` columns.
    pub datetime_format: String,

    /// When false, tables start in manual mode and only recompute on an
    /// explicit `apply()`.
    pub auto_apply: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: "/tmp/reltab-cache".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            auto_apply: true,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RELTAB_CACHE_DIR`: cache directory for computed fields
    /// - `RELTAB_DATE_FORMAT`: date parse/render format
    /// - `RELTAB_DATETIME_FORMAT`: datetime parse/render format
    /// - `RELTAB_AUTO_APPLY`: "0"/"false" switches tables to manual mode
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RELTAB_CACHE_DIR") {
            cfg.cache_dir = s;
        }

        if let Ok(s) = std::env::var("RELTAB_DATE_FORMAT") {
            cfg.date_format = s;
        }

        if let Ok(s) = std::env::var("RELTAB_DATETIME_FORMAT") {
            cfg.datetime_format = s;
        }

        if let Ok(s) = std::env::var("RELTAB_AUTO_APPLY") {
            cfg.auto_apply = !matches!(s.trim(), "0" | "false" | "no");
        }

        cfg
    }
}
