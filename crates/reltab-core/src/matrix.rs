//! Boolean match matrix: `M[i][j]` says whether left row `i` and right
//! row `j` are equal under the active field descriptor(s).
//!
//! Pre-sized, flat storage; the join engine combines matrices with AND
//! (multiple key fields), OR (union of relationships, bidirectional
//! self-references) and boolean multiplication (junction tables).

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchMatrix {
    rows: usize,
    cols: usize,
    data: Vec<bool>,
}

impl MatchMatrix {
    /// All-false matrix of the given shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![false; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: bool) {
        self.data[i * self.cols + j] = v;
    }

    fn check_shape(&self, other: &MatchMatrix, op: &str) -> Result<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(Error::Invariant(format!(
                "match-matrix {}: shape {}x{} vs {}x{}",
                op, self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }

    /// Elementwise AND, used to combine per-key-field matrices.
    pub fn and_assign(&mut self, other: &MatchMatrix) -> Result<()> {
        self.check_shape(other, "and")?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a &= *b;
        }
        Ok(())
    }

    /// Elementwise OR, used to union results of several relationships
    /// resolving the same (entry, reference) pair.
    pub fn or_assign(&mut self, other: &MatchMatrix) -> Result<()> {
        self.check_shape(other, "or")?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a |= *b;
        }
        Ok(())
    }

    /// `self |= other^T`; both directions of a self-referential
    /// relationship contribute matches.
    pub fn or_transpose(&mut self, other: &MatchMatrix) -> Result<()> {
        if self.rows != other.cols || self.cols != other.rows {
            return Err(Error::Invariant(format!(
                "match-matrix or-transpose: shape {}x{} vs {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        for i in 0..self.rows {
            for j in 0..self.cols {
                if other.get(j, i) {
                    self.set(i, j, true);
                }
            }
        }
        Ok(())
    }

    pub fn transpose(&self) -> MatchMatrix {
        let mut out = MatchMatrix::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                if self.get(i, j) {
                    out.set(j, i, true);
                }
            }
        }
        out
    }

    /// Boolean matrix product: `out[i][j]` iff some `k` has
    /// `self[i][k] && other[k][j]`. This is the junction-table step:
    /// left row i matches right row j iff some junction row k matches both.
    pub fn multiply(&self, other: &MatchMatrix) -> Result<MatchMatrix> {
        if self.cols != other.rows {
            return Err(Error::Invariant(format!(
                "match-matrix multiply: inner dims {} vs {}",
                self.cols, other.rows
            )));
        }
        let mut out = MatchMatrix::new(self.rows, other.cols);
        for i in 0..self.rows {
            let row = &self.data[i * self.cols..(i + 1) * self.cols];
            for (k, &hit) in row.iter().enumerate() {
                if !hit {
                    continue;
                }
                for j in 0..other.cols {
                    if other.get(k, j) {
                        out.set(i, j, true);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Column indices matching row `i`, ascending.
    pub fn row_matches(&self, i: usize) -> Vec<usize> {
        let row = &self.data[i * self.cols..(i + 1) * self.cols];
        row.iter()
            .enumerate()
            .filter_map(|(j, &hit)| if hit { Some(j) } else { None })
            .collect()
    }

    pub fn any_in_row(&self, i: usize) -> bool {
        self.data[i * self.cols..(i + 1) * self.cols]
            .iter()
            .any(|&b| b)
    }

    /// Per-row "has any match" flags; drives referential cascades.
    pub fn row_any(&self) -> Vec<bool> {
        (0..self.rows).map(|i| self.any_in_row(i)).collect()
    }
}
