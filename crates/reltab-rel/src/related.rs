//! Turning a match matrix into related-row index sets.

use reltab_core::matrix::MatchMatrix;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Flatten to one de-duplicated, first-occurrence-ordered index set
    /// instead of one list per source row.
    pub combine: bool,
    /// In *-to-one joins, insert a placeholder for unmatched source rows
    /// so the output stays index-aligned.
    pub fill_missing_with_nan: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedIdx {
    /// De-duplicated target rows in first-occurrence order.
    Combined(Vec<usize>),
    /// One independent result list per source row.
    PerRow(Vec<Vec<usize>>),
    /// Index-aligned to-one result; `None` is the NaN placeholder.
    Aligned(Vec<Option<usize>>),
}

impl RelatedIdx {
    /// All referenced target rows, de-duplicated, first-occurrence order.
    pub fn flattened(&self) -> Vec<usize> {
        match self {
            RelatedIdx::Combined(v) => v.clone(),
            RelatedIdx::PerRow(rows) => dedup_in_order(rows.iter().flatten().copied()),
            RelatedIdx::Aligned(rows) => dedup_in_order(rows.iter().filter_map(|r| *r)),
        }
    }
}

/// Resolve a match matrix into index sets under the declared target
/// cardinality. A to-one join that produced extra matches is a
/// cardinality violation, downgraded to a warning: the extras are
/// truncated keeping the first match in pre-truncation row order.
pub fn related_from_matrix(
    matrix: &MatchMatrix,
    target_is_one: bool,
    opts: MatchOptions,
    context: &str,
) -> RelatedIdx {
    let mut per_row: Vec<Vec<usize>> = (0..matrix.rows()).map(|i| matrix.row_matches(i)).collect();

    if target_is_one {
        for (row, matches) in per_row.iter_mut().enumerate() {
            if matches.len() > 1 {
                tracing::warn!(
                    relationship = context,
                    row,
                    matches = matches.len(),
                    "to-one join returned multiple matches; keeping the first"
                );
                matches.truncate(1);
            }
        }
        if opts.fill_missing_with_nan {
            return RelatedIdx::Aligned(per_row.into_iter().map(|m| m.first().copied()).collect());
        }
    }

    if opts.combine {
        RelatedIdx::Combined(dedup_in_order(per_row.into_iter().flatten()))
    } else {
        RelatedIdx::PerRow(per_row)
    }
}

fn dedup_in_order(indices: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    indices.filter(|i| seen.insert(*i)).collect()
}
