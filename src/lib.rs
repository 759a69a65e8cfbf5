//! reltab: an in-process relational data engine.
//!
//! Tables carry typed columns behind a deferred three-stage pipeline;
//! relationships join tables by key fields; the database registry binds
//! both together with referential cascades. This crate re-exports the
//! workspace members as one surface.

pub use reltab_core as core;
pub use reltab_db as db;
pub use reltab_fields as fields;
pub use reltab_io as io;
pub use reltab_rel as rel;
pub use reltab_table as table;

pub mod prelude {
    pub use reltab_core::config::EngineConfig;
    pub use reltab_core::error::{Error, Result};
    pub use reltab_core::id::TableId;
    pub use reltab_core::value::{ColumnValues, Value};
    pub use reltab_db::Database;
    pub use reltab_fields::descriptor::FieldDescriptor;
    pub use reltab_io::{read_csv, render_text, write_csv, write_html};
    pub use reltab_rel::{MatchOptions, RelatedIdx, RelationshipDef};
    pub use reltab_table::{FilterSpec, SortSpec, Table};
}
