//! The registry: named tables, their relationships, and cross-table
//! lookup dispatch, with referential cascades when a table's row set
//! shrinks.

pub mod database;

pub use database::Database;
