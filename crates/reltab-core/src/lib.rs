//! Core building blocks shared by every reltab crate.
//!
//! Nothing here does I/O or owns a table: just the dynamic value model,
//! the error taxonomy, engine configuration, stable hashing, the boolean
//! match-matrix primitive, and typed registry IDs.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod matrix;
pub mod prelude;
pub mod value;
