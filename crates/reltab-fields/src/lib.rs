//! The column-type system: a closed set of field behaviors governing
//! conversion, comparison, sorting, uniqueness, and cross-table matching.
//!
//! One `FieldDescriptor` per column, immutable and shared by all of its
//! rows. Behaviors live as capability methods on the enum rather than a
//! class hierarchy; `Date` is "floor to whole days, then delegate to
//! DateTime", expressed as a thin wrapping function.

pub mod descriptor;
pub mod infer;
pub mod timecode;

pub use descriptor::{FieldDescriptor, SortKey};
pub use infer::{infer_descriptor, infer_descriptor_with_formats};
