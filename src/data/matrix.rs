// matrix.rs - Packed symmetric distance matrix

//! Strictly lower-triangular storage for symmetric pairwise distances.
//!
//! Entry `(row, col)` with `row > col` lives at `row * (row - 1) / 2 + col`,
//! so the entries of the last row are always the tail of the buffer. That is
//! what makes [`DistanceMatrix::shrink`] a truncation: callers relocate the
//! clusters they want to drop into the last position with
//! [`DistanceMatrix::swap`] first.

use crate::error::{Result, TreeError};

/// Row/column coordinate of a packed entry, always reported with `row > col`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixCoord {
    pub row: usize,
    pub col: usize,
}

impl MatrixCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Symmetric distance matrix without diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    width: usize,
    values: Vec<f64>,
}

/// Number of packed entries for a given width, `None` on overflow
fn packed_len(width: usize) -> Option<usize> {
    if width < 2 {
        return Some(0);
    }
    width.checked_mul(width - 1).map(|n| n / 2)
}

/// Packed position of `(hi, lo)` with `hi > lo`; no bounds checks
#[inline]
fn packed_index(hi: usize, lo: usize) -> usize {
    hi * (hi - 1) / 2 + lo
}

impl DistanceMatrix {
    /// Create a `width × width` matrix with every off-diagonal entry set to `fill`
    pub fn new(width: usize, fill: f64) -> Result<Self> {
        let len = packed_len(width).ok_or(TreeError::Allocation { width })?;
        let bytes = len.checked_mul(std::mem::size_of::<f64>());
        if bytes.map_or(true, |b| b > isize::MAX as usize) {
            return Err(TreeError::Allocation { width });
        }

        let mut values = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| TreeError::Allocation { width })?;
        values.resize(len, fill);

        Ok(Self { width, values })
    }

    /// Build from a flat row-major `width × width` array.
    ///
    /// Only the strictly lower triangle is read; the diagonal and the upper
    /// triangle are ignored.
    pub fn from_square(width: usize, full: &[f64]) -> Result<Self> {
        let expected = width
            .checked_mul(width)
            .ok_or(TreeError::Allocation { width })?;
        if full.len() != expected {
            return Err(TreeError::dimension_mismatch(
                "flat square matrix",
                expected,
                full.len(),
            ));
        }

        let mut matrix = Self::new(width, 0.0)?;
        for row in 1..width {
            for col in 0..row {
                matrix.values[packed_index(row, col)] = full[row * width + col];
            }
        }
        Ok(matrix)
    }

    /// Build from nested rows of a full square matrix
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.len();
        let mut matrix = Self::new(width, 0.0)?;
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(TreeError::dimension_mismatch(
                    format!("row {} of square matrix", row),
                    width,
                    values.len(),
                ));
            }
            for (col, &value) in values.iter().enumerate().take(row) {
                matrix.values[packed_index(row, col)] = value;
            }
        }
        Ok(matrix)
    }

    /// Current number of clusters (rows)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of stored pairwise entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw packed entries in storage order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Packed position of `(row, col)`
    pub fn index(&self, row: usize, col: usize) -> Result<usize> {
        if self.width == 0 {
            return Err(TreeError::InvalidIndex(format!(
                "({}, {}) requested on an empty matrix",
                row, col
            )));
        }
        if row >= self.width || col >= self.width {
            return Err(TreeError::InvalidIndex(format!(
                "({}, {}) out of range for width {}",
                row, col, self.width
            )));
        }
        if row == col {
            return Err(TreeError::InvalidIndex(format!(
                "diagonal ({}, {}) is not stored",
                row, col
            )));
        }
        let (hi, lo) = if row > col { (row, col) } else { (col, row) };
        Ok(packed_index(hi, lo))
    }

    /// Inverse of [`index`](Self::index): recover `(row, col)` from a packed position
    pub fn coord_of(&self, index: usize) -> Result<MatrixCoord> {
        if index >= self.values.len() {
            return Err(TreeError::InvalidIndex(format!(
                "packed index {} out of range ({} entries)",
                index,
                self.values.len()
            )));
        }
        Ok(Self::coord_unchecked(index))
    }

    /// Invert the triangular-number series; the float estimate is corrected
    /// by at most a step either way.
    fn coord_unchecked(index: usize) -> MatrixCoord {
        let estimate = (1.0 + (1.0 + 8.0 * index as f64).sqrt()) / 2.0;
        let mut row = (estimate as usize).max(1);
        while row > 1 && row * (row - 1) / 2 > index {
            row -= 1;
        }
        while (row + 1) * row / 2 <= index {
            row += 1;
        }
        MatrixCoord {
            row,
            col: index - row * (row - 1) / 2,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        let idx = self.index(row, col)?;
        Ok(self.values[idx])
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let idx = self.index(row, col)?;
        self.values[idx] = value;
        Ok(())
    }

    /// Exchange every entry involving `a` with the matching entry involving `b`.
    ///
    /// The shared entry `(a, b)` stays where it is.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        if a >= self.width || b >= self.width {
            return Err(TreeError::InvalidIndex(format!(
                "swap ({}, {}) out of range for width {}",
                a, b, self.width
            )));
        }
        if a == b {
            return Ok(());
        }

        for k in 0..self.width {
            if k == a || k == b {
                continue;
            }
            let ia = if a > k { packed_index(a, k) } else { packed_index(k, a) };
            let ib = if b > k { packed_index(b, k) } else { packed_index(k, b) };
            self.values.swap(ia, ib);
        }
        Ok(())
    }

    /// Drop the last row and column. Capacity is retained for the rest of the run.
    pub fn shrink(&mut self) -> Result<()> {
        if self.width == 0 {
            return Err(TreeError::InvalidIndex(
                "cannot shrink an empty matrix".to_string(),
            ));
        }
        self.width -= 1;
        // packed_len cannot overflow for a width smaller than an existing one
        let len = packed_len(self.width).unwrap_or(0);
        self.values.truncate(len);
        Ok(())
    }

    /// Smallest entry; ties go to the first one in storage order
    pub fn minimum(&self) -> Result<f64> {
        self.minimum_with_coord().map(|(value, _)| value)
    }

    pub fn minimum_with_coord(&self) -> Result<(f64, MatrixCoord)> {
        self.extreme(|candidate, best| candidate < best)
    }

    /// Largest entry; ties go to the first one in storage order
    pub fn maximum(&self) -> Result<f64> {
        self.maximum_with_coord().map(|(value, _)| value)
    }

    pub fn maximum_with_coord(&self) -> Result<(f64, MatrixCoord)> {
        self.extreme(|candidate, best| candidate > best)
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> Result<(f64, MatrixCoord)> {
        if self.values.is_empty() {
            return Err(TreeError::InvalidIndex(format!(
                "no pairwise entries in a matrix of width {}",
                self.width
            )));
        }

        let mut best: Option<(f64, usize)> = None;
        for (idx, &value) in self.values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some((current, _)) if !better(value, current) => {}
                _ => best = Some((value, idx)),
            }
        }

        best.map(|(value, idx)| (value, Self::coord_unchecked(idx)))
            .ok_or_else(|| TreeError::InvalidIndex("matrix holds only NaN entries".to_string()))
    }

    /// Iterate `(coord, value)` in storage order
    pub fn iter_pairs(&self) -> impl Iterator<Item = (MatrixCoord, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, &value)| (Self::coord_unchecked(idx), value))
    }

    /// Expand into a full square matrix with a zero diagonal
    pub fn to_square(&self) -> Vec<Vec<f64>> {
        let mut square = vec![vec![0.0; self.width]; self.width];
        for (coord, value) in self.iter_pairs() {
            square[coord.row][coord.col] = value;
            square[coord.col][coord.row] = value;
        }
        square
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix(width: usize) -> DistanceMatrix {
        let mut matrix = DistanceMatrix::new(width, 0.0).unwrap();
        for row in 1..width {
            for col in 0..row {
                matrix.set(row, col, (row * 10 + col) as f64).unwrap();
            }
        }
        matrix
    }

    #[test]
    fn test_zero_filled_extremes() {
        for width in 2..12 {
            let matrix = DistanceMatrix::new(width, 0.0).unwrap();
            assert_eq!(matrix.len(), width * (width - 1) / 2);
            assert_eq!(matrix.minimum().unwrap(), 0.0);
            assert_eq!(matrix.maximum().unwrap(), 0.0);
        }
    }

    #[test]
    fn test_symmetric_access() {
        let mut matrix = DistanceMatrix::new(5, 1.5).unwrap();
        matrix.set(1, 3, 0.25).unwrap();
        assert_eq!(matrix.get(3, 1).unwrap(), 0.25);
        assert_eq!(matrix.get(1, 3).unwrap(), 0.25);
        assert_eq!(matrix.get(4, 0).unwrap(), 1.5);
    }

    #[test]
    fn test_index_mapping_and_inverse() {
        let matrix = DistanceMatrix::new(60, 0.0).unwrap();
        let mut expected = 0;
        for row in 1..60 {
            for col in 0..row {
                let idx = matrix.index(row, col).unwrap();
                assert_eq!(idx, expected);
                assert_eq!(matrix.index(col, row).unwrap(), idx);
                assert_eq!(matrix.coord_of(idx).unwrap(), MatrixCoord::new(row, col));
                expected += 1;
            }
        }
        assert!(matrix.coord_of(expected).is_err());
    }

    #[test]
    fn test_invalid_indices_rejected() {
        let matrix = DistanceMatrix::new(4, 0.0).unwrap();
        assert!(matches!(matrix.get(2, 2), Err(TreeError::InvalidIndex(_))));
        assert!(matches!(matrix.get(4, 0), Err(TreeError::InvalidIndex(_))));
        assert!(matches!(matrix.get(0, 7), Err(TreeError::InvalidIndex(_))));

        let empty = DistanceMatrix::new(0, 0.0).unwrap();
        assert!(matches!(empty.get(0, 1), Err(TreeError::InvalidIndex(_))));
        assert!(matches!(empty.minimum(), Err(TreeError::InvalidIndex(_))));

        let single = DistanceMatrix::new(1, 0.0).unwrap();
        assert!(single.is_empty());
        assert!(matches!(single.maximum(), Err(TreeError::InvalidIndex(_))));
    }

    #[test]
    fn test_allocation_failure_is_explicit() {
        assert!(matches!(
            DistanceMatrix::new(usize::MAX, 0.0),
            Err(TreeError::Allocation { .. })
        ));
        assert!(matches!(
            DistanceMatrix::new(1 << 40, 0.0),
            Err(TreeError::Allocation { .. })
        ));
    }

    #[test]
    fn test_swap_exchanges_rows() {
        let mut matrix = sample_matrix(5);
        let before = matrix.clone();
        matrix.swap(1, 3).unwrap();

        // the shared entry is left alone
        assert_eq!(matrix.get(1, 3).unwrap(), before.get(1, 3).unwrap());
        for k in [0, 2, 4] {
            assert_eq!(matrix.get(1, k).unwrap(), before.get(3, k).unwrap());
            assert_eq!(matrix.get(3, k).unwrap(), before.get(1, k).unwrap());
        }
        // entries not touching 1 or 3 are unchanged
        assert_eq!(matrix.get(0, 2).unwrap(), before.get(0, 2).unwrap());
        assert_eq!(matrix.get(4, 2).unwrap(), before.get(4, 2).unwrap());
    }

    #[test]
    fn test_swap_is_self_inverse() {
        let original = sample_matrix(7);
        for a in 0..7 {
            for b in 0..7 {
                let mut matrix = original.clone();
                matrix.swap(a, b).unwrap();
                matrix.swap(a, b).unwrap();
                assert_eq!(matrix, original, "swap({}, {}) twice", a, b);
            }
        }
        let mut matrix = original.clone();
        assert!(matrix.swap(0, 7).is_err());
    }

    #[test]
    fn test_shrink_preserves_survivors() {
        let mut matrix = sample_matrix(6);
        let before = matrix.clone();
        matrix.shrink().unwrap();

        assert_eq!(matrix.width(), 5);
        assert_eq!(matrix.len(), 10);
        for row in 1..5 {
            for col in 0..row {
                assert_eq!(matrix.get(row, col).unwrap(), before.get(row, col).unwrap());
            }
        }
        assert!(matrix.get(5, 0).is_err());

        let mut empty = DistanceMatrix::new(0, 0.0).unwrap();
        assert!(empty.shrink().is_err());
    }

    #[test]
    fn test_extremes_report_first_occurrence() {
        let matrix = DistanceMatrix::from_rows(&[
            vec![0.0, 2.0, 5.0, 9.0],
            vec![2.0, 0.0, 2.0, 9.0],
            vec![5.0, 2.0, 0.0, 1.0],
            vec![9.0, 9.0, 1.0, 0.0],
        ])
        .unwrap();

        let (min, at) = matrix.minimum_with_coord().unwrap();
        assert_eq!(min, 1.0);
        assert_eq!(at, MatrixCoord::new(3, 2));

        let (max, at) = matrix.maximum_with_coord().unwrap();
        assert_eq!(max, 9.0);
        assert_eq!(at, MatrixCoord::new(3, 0));

        let ties = DistanceMatrix::new(4, 3.0).unwrap();
        assert_eq!(ties.minimum_with_coord().unwrap().1, MatrixCoord::new(1, 0));
    }

    #[test]
    fn test_nan_entries_are_skipped() {
        let mut matrix = DistanceMatrix::new(3, 4.0).unwrap();
        matrix.set(1, 0, f64::NAN).unwrap();
        matrix.set(2, 1, 1.0).unwrap();
        assert_eq!(matrix.minimum().unwrap(), 1.0);
        assert_eq!(matrix.maximum().unwrap(), 4.0);
    }

    #[test]
    fn test_from_square_reads_lower_triangle() {
        let flat = [
            0.0, 9.0, 9.0, //
            1.0, 0.0, 9.0, //
            2.0, 3.0, 0.0,
        ];
        let matrix = DistanceMatrix::from_square(3, &flat).unwrap();
        assert_eq!(matrix.get(0, 1).unwrap(), 1.0);
        assert_eq!(matrix.get(0, 2).unwrap(), 2.0);
        assert_eq!(matrix.get(1, 2).unwrap(), 3.0);

        assert!(matches!(
            DistanceMatrix::from_square(4, &flat),
            Err(TreeError::DimensionMismatch { expected: 16, found: 9, .. })
        ));
    }

    #[test]
    fn test_to_square_roundtrip() {
        let rows = vec![
            vec![0.0, 0.3, 0.5],
            vec![0.3, 0.0, 0.6],
            vec![0.5, 0.6, 0.0],
        ];
        let matrix = DistanceMatrix::from_rows(&rows).unwrap();
        assert_eq!(matrix.to_square(), rows);
        assert!(DistanceMatrix::from_rows(&[vec![0.0, 1.0], vec![1.0]]).is_err());
    }
}
