//! Boolean-valued sparse pattern produced by elementwise comparisons.

/// Set of `(row, col)` positions stored row-major, columns ascending per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseMask {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl SparseMask {
    /// Build from row pointers and per-row sorted column indices
    pub(crate) fn from_parts(
        rows: usize,
        cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(row_ptr.len(), rows + 1);
        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
        }
    }

    /// Mask shape as `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of `true` positions
    pub fn count(&self) -> usize {
        self.col_idx.len()
    }

    /// True when no position is set
    pub fn is_empty(&self) -> bool {
        self.col_idx.is_empty()
    }

    /// Test a single position
    pub fn contains(&self, row: usize, col: usize) -> bool {
        if row >= self.rows {
            return false;
        }
        self.row_cols(row).binary_search(&col).is_ok()
    }

    /// Sorted column indices set in `row`
    pub(crate) fn row_cols(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// Iterate set positions in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows).flat_map(move |r| self.row_cols(r).iter().map(move |&c| (r, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_iter() {
        let mask = SparseMask::from_parts(3, 3, vec![0, 1, 1, 3], vec![2, 0, 1]);

        assert_eq!(mask.count(), 3);
        assert!(mask.contains(0, 2));
        assert!(mask.contains(2, 1));
        assert!(!mask.contains(1, 1));
        assert!(!mask.contains(7, 0));
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![(0, 2), (2, 0), (2, 1)]);
    }
}
