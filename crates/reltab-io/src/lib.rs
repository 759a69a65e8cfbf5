//! Import, export, and rendering for tables, plus the result cache.
//!
//! Everything here consumes the table read API only; no module in this
//! crate reaches into storage internals.

pub mod cache;
pub mod csv_io;
pub mod error;
pub mod html;
pub mod text;

pub use cache::{CacheKey, CacheStore, MemoryCache};
pub use csv_io::{read_csv, read_csv_path, read_csv_with_config, write_csv, write_csv_path};
pub use error::{Error, Result};
pub use html::write_html;
pub use text::render_text;
