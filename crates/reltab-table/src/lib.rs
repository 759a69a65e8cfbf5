//! The table engine: ordered rows over named typed columns, with a
//! three-stage deferred pipeline (fields → mask → data) and value
//! semantics: every mutator consumes the table and returns the updated
//! value.

pub mod memory;
pub mod spec;
pub mod storage;
pub mod table;

pub use memory::MemoryBackend;
pub use spec::{CmpOp, FilterAction, FilterSpec, Predicate, SortKeySpec, SortSpec};
pub use storage::{RowStruct, StorageBackend, StructOfArrays};
pub use table::Table;
