//! Typed identifiers used across the engine.
//!
//! A `TableId` is a generation-checked index into the registry-owned
//! arena: a stale id (table replaced since the id was handed out) is
//! detectable instead of silently pointing at the wrong table.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd)]
pub struct TableId {
    index: u32,
    generation: u32,
}

impl TableId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({}v{})", self.index, self.generation)
    }
}
