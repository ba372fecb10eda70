//! Fixed-shape unit tables.
//!
//! A [`Matrix`] is sized once and never reshaped. Shape checks happen in
//! [`Matrix::from_rows`]; element access afterwards relies on that.

use serde::{Serialize, Serializer};

use crate::error::ToolkitError;

/// Count of resource instances.
pub type Units = u32;

/// Row-major `rows x cols` table of unit counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Units>,
}

impl Matrix {
    /// All-zero matrix of the given shape.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Build from nested rows, checking the row count and every row length.
    ///
    /// `what` names the input in the returned error.
    pub fn from_rows(
        what: &str,
        rows: &[Vec<Units>],
        expected_rows: usize,
        expected_cols: usize,
    ) -> Result<Self, ToolkitError> {
        if rows.len() != expected_rows {
            return Err(ToolkitError::DimensionMismatch {
                what: format!("{what} rows"),
                expected: expected_rows,
                found: rows.len(),
            });
        }
        let mut data = Vec::with_capacity(expected_rows * expected_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected_cols {
                return Err(ToolkitError::DimensionMismatch {
                    what: format!("{what} row {i}"),
                    expected: expected_cols,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: expected_rows,
            cols: expected_cols,
            data,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[Units] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [Units] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Element at `(row, col)`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Units {
        self.data[row * self.cols + col]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Units]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Sum of row `i`, widened so it cannot overflow.
    #[must_use]
    pub fn row_sum(&self, i: usize) -> u64 {
        self.row(i).iter().map(|&v| u64::from(v)).sum()
    }

    /// Sum of column `c` over all rows.
    #[must_use]
    pub fn column_sum(&self, c: usize) -> u64 {
        self.iter_rows().map(|row| u64::from(row[c])).sum()
    }

    /// Copy out as nested rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Units>> {
        self.iter_rows().map(<[Units]>::to_vec).collect()
    }

    /// True if every element is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_rows())
    }
}
