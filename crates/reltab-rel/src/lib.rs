//! Relationship declarations and the join/matching engine.
//!
//! A relationship is a declarative binding between two tables' key
//! fields (optionally through a junction table) with one matching
//! strategy fixed at construction. Matching never mutates state: the
//! registry calls in and turns the resulting index sets into filtered
//! tables.

pub mod related;
pub mod relationship;

pub use related::{related_from_matrix, MatchOptions, RelatedIdx};
pub use relationship::{default_foreign_key, Endpoint, MatchStrategy, Relationship, RelationshipDef};
