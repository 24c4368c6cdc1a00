//! Compressed sparse row operator

use super::mask::SparseMask;
use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;

/// Sparse matrix in Compressed Sparse Row (CSR) format.
///
/// Invariants: `row_ptr.len() == rows + 1`, columns strictly ascending
/// within a row, every stored value is nonzero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseOperator<T> {
    rows: usize,
    cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Scalar> SparseOperator<T> {
    /// All-zero operator of the given shape
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Identity operator of size `n`
    pub fn identity(n: usize) -> Self {
        Self::diagonal(&vec![T::one(); n])
    }

    /// Square operator with `diag` on the main diagonal
    pub fn diagonal(diag: &[T]) -> Self {
        let n = diag.len();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_idx = Vec::with_capacity(n);
        let mut values = Vec::with_capacity(n);
        row_ptr.push(0);
        for (i, &d) in diag.iter().enumerate() {
            if d != T::zero() {
                col_idx.push(i);
                values.push(d);
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            rows: n,
            cols: n,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Build from coordinate triples.
    ///
    /// Duplicate `(row, col)` pairs are summed in input order; entries that
    /// sum to exactly zero are dropped.
    pub fn from_coo(
        shape: (usize, usize),
        rows: &[usize],
        cols: &[usize],
        values: &[T],
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(SpectralError::LengthMismatch {
                rows: rows.len(),
                cols: cols.len(),
                values: values.len(),
            });
        }
        let entries = rows
            .iter()
            .zip(cols)
            .zip(values)
            .map(|((&r, &c), &v)| (r, c, v));
        Self::from_entries(shape, entries)
    }

    /// Build from an iterator of `(row, col, value)` entries
    pub fn from_entries<I>(shape: (usize, usize), entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, T)>,
    {
        let (rows, cols) = shape;
        let mut triplets: Vec<(usize, usize, T)> = Vec::new();
        for (r, c, v) in entries {
            if r >= rows || c >= cols {
                return Err(SpectralError::index_out_of_bounds(r, c, shape));
            }
            triplets.push((r, c, v));
        }

        // Stable sort keeps input order among duplicates
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());

        let mut i = 0;
        while i < triplets.len() {
            let (r, c, mut sum) = triplets[i];
            i += 1;
            while i < triplets.len() && triplets[i].0 == r && triplets[i].1 == c {
                sum = sum + triplets[i].2;
                i += 1;
            }
            if sum != T::zero() {
                col_idx.push(c);
                values.push(sum);
                row_ptr[r + 1] += 1;
            }
        }
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Ok(Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Raw adjacency of `n` nodes from directed edges with unit weight.
    ///
    /// Repeated edges are summed, not rejected.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        Self::from_entries((n, n), edges.iter().map(|&(u, v)| (u, v, T::one())))
    }

    /// Raw adjacency of `n` nodes from weighted directed edges
    pub fn from_weighted_edges(n: usize, edges: &[(usize, usize, T)]) -> Result<Self> {
        Self::from_entries((n, n), edges.iter().copied())
    }

    /// Operator shape as `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (nonzero) entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// True for `N x N` operators
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Entries of one row as `(col, value)`, columns ascending
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// All entries as `(row, col, value)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.rows).flat_map(move |r| self.row(r).map(move |(c, v)| (r, c, v)))
    }

    /// Element at `(row, col)`; zero outside the pattern or shape
    pub fn get(&self, row: usize, col: usize) -> T {
        if row >= self.rows || col >= self.cols {
            return T::zero();
        }
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(k) => self.values[range.start + k],
            Err(_) => T::zero(),
        }
    }

    /// Row-major `(coordinates, values)` of the stored entries
    pub fn to_canonical_coordinates(&self) -> (Vec<(usize, usize)>, Vec<T>) {
        let coords = self.iter().map(|(r, c, _)| (r, c)).collect();
        (coords, self.values.clone())
    }

    /// Dense row-major copy, mostly useful in tests
    pub fn to_dense(&self) -> Vec<Vec<T>> {
        let mut dense = vec![vec![T::zero(); self.cols]; self.rows];
        for (r, c, v) in self.iter() {
            dense[r][c] = v;
        }
        dense
    }

    /// Multiply every entry by `alpha`
    pub fn scale(&self, alpha: T) -> Self {
        self.map_entries(|_, _, v| alpha * v)
    }

    /// Elementwise sum `self + other`
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    /// Elementwise difference `self - other`
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Transposed operator
    pub fn transpose(&self) -> Self {
        let mut row_ptr = vec![0usize; self.cols + 1];
        for &c in &self.col_idx {
            row_ptr[c + 1] += 1;
        }
        for c in 0..self.cols {
            row_ptr[c + 1] += row_ptr[c];
        }

        let mut next = row_ptr.clone();
        let mut col_idx = vec![0usize; self.nnz()];
        let mut values = vec![T::zero(); self.nnz()];
        // Rows are visited ascending, so every output row comes out sorted
        for (r, c, v) in self.iter() {
            let slot = next[c];
            col_idx[slot] = r;
            values[slot] = v;
            next[c] += 1;
        }

        Self {
            rows: self.cols,
            cols: self.rows,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Positions where `self[i, j] > other[i, j]`, implicit entries read as zero
    pub fn elementwise_greater(&self, other: &Self) -> Result<SparseMask> {
        self.check_same_shape(other, "elementwise_greater")?;

        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for r in 0..self.rows {
            merge_row(self.row(r), other.row(r), |c, a, b| {
                if a > b {
                    col_idx.push(c);
                }
            });
            row_ptr.push(col_idx.len());
        }

        Ok(SparseMask::from_parts(self.rows, self.cols, row_ptr, col_idx))
    }

    /// Keep only the entries at positions set in `mask` (Hadamard product)
    pub fn masked(&self, mask: &SparseMask) -> Result<Self> {
        self.filter_by_mask(mask, true)
    }

    /// Drop the entries at positions set in `mask`
    pub fn masked_out(&self, mask: &SparseMask) -> Result<Self> {
        self.filter_by_mask(mask, false)
    }

    /// Sparse matrix product `self · other`.
    ///
    /// Row-wise Gustavson accumulation. For output row `i` the terms
    /// `a_ik * b_kj` are added for `k` ascending, then `j` ascending, so the
    /// result is reproducible bit for bit.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(SpectralError::shape_mismatch(
                "multiply",
                self.shape(),
                other.shape(),
            ));
        }

        let out_cols = other.cols;
        let mut acc = vec![T::zero(); out_cols];
        let mut touched = vec![false; out_cols];
        let mut pattern: Vec<usize> = Vec::new();

        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for i in 0..self.rows {
            for (k, a_ik) in self.row(i) {
                for (j, b_kj) in other.row(k) {
                    if !touched[j] {
                        touched[j] = true;
                        pattern.push(j);
                    }
                    acc[j] = acc[j] + a_ik * b_kj;
                }
            }

            pattern.sort_unstable();
            for &j in &pattern {
                let v = acc[j];
                if v != T::zero() {
                    col_idx.push(j);
                    values.push(v);
                }
                acc[j] = T::zero();
                touched[j] = false;
            }
            pattern.clear();
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            rows: self.rows,
            cols: out_cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    /// Sparse matrix-vector product: y = A * x
    pub fn mul_vec(&self, x: &[T]) -> Result<Vec<T>> {
        if x.len() != self.cols {
            return Err(SpectralError::shape_mismatch(
                "mul_vec",
                self.shape(),
                (x.len(), 1),
            ));
        }
        Ok((0..self.rows)
            .map(|r| {
                self.row(r)
                    .fold(T::zero(), |acc, (c, v)| acc + v * x[c])
            })
            .collect())
    }

    /// Row sums, accumulated with columns ascending
    pub fn row_sums(&self) -> Vec<T> {
        (0..self.rows)
            .map(|r| self.row(r).fold(T::zero(), |acc, (_, v)| acc + v))
            .collect()
    }

    /// Infinity norm (max absolute row sum), an upper bound on the spectral radius
    pub fn max_abs_row_sum(&self) -> T {
        (0..self.rows)
            .map(|r| self.row(r).fold(T::zero(), |acc, (_, v)| acc + v.abs()))
            .fold(T::zero(), T::max)
    }

    /// Exact symmetry check
    pub fn is_symmetric(&self) -> bool {
        self.is_square() && *self == self.transpose()
    }

    /// Apply `f(row, col, value)` to every stored entry, pruning zeros produced
    pub(crate) fn map_entries<F>(&self, f: F) -> Self
    where
        F: Fn(usize, usize, T) -> T,
    {
        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        let mut values = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for r in 0..self.rows {
            for (c, v) in self.row(r) {
                let mapped = f(r, c, v);
                if mapped != T::zero() {
                    col_idx.push(c);
                    values.push(mapped);
                }
            }
            row_ptr.push(col_idx.len());
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    fn check_same_shape(&self, other: &Self, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(SpectralError::shape_mismatch(op, self.shape(), other.shape()));
        }
        Ok(())
    }

    /// Union-pattern elementwise combination with implicit zeros
    fn zip_with<F>(&self, other: &Self, op: &'static str, f: F) -> Result<Self>
    where
        F: Fn(T, T) -> T,
    {
        self.check_same_shape(other, op)?;

        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::with_capacity(self.nnz().max(other.nnz()));
        let mut values = Vec::with_capacity(self.nnz().max(other.nnz()));
        row_ptr.push(0);
        for r in 0..self.rows {
            merge_row(self.row(r), other.row(r), |c, a, b| {
                let v = f(a, b);
                if v != T::zero() {
                    col_idx.push(c);
                    values.push(v);
                }
            });
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        })
    }

    fn filter_by_mask(&self, mask: &SparseMask, keep_set: bool) -> Result<Self> {
        if self.shape() != mask.shape() {
            return Err(SpectralError::shape_mismatch("mask", self.shape(), mask.shape()));
        }

        let mut row_ptr = Vec::with_capacity(self.rows + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);
        for r in 0..self.rows {
            let set = mask.row_cols(r);
            let mut m = 0;
            for (c, v) in self.row(r) {
                while m < set.len() && set[m] < c {
                    m += 1;
                }
                let in_mask = m < set.len() && set[m] == c;
                if in_mask == keep_set {
                    col_idx.push(c);
                    values.push(v);
                }
            }
            row_ptr.push(col_idx.len());
        }

        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            row_ptr,
            col_idx,
            values,
        })
    }
}

/// Walk two sorted rows in lockstep, reporting `(col, a, b)` over the union
/// of their patterns with missing entries read as zero.
fn merge_row<T, A, B, F>(a: A, b: B, mut visit: F)
where
    T: Scalar,
    A: Iterator<Item = (usize, T)>,
    B: Iterator<Item = (usize, T)>,
    F: FnMut(usize, T, T),
{
    let mut a = a.peekable();
    let mut b = b.peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (Some((ca, va)), Some((cb, vb))) => {
                if ca == cb {
                    visit(ca, va, vb);
                    a.next();
                    b.next();
                } else if ca < cb {
                    visit(ca, va, T::zero());
                    a.next();
                } else {
                    visit(cb, T::zero(), vb);
                    b.next();
                }
            }
            (Some((ca, va)), None) => {
                visit(ca, va, T::zero());
                a.next();
            }
            (None, Some((cb, vb))) => {
                visit(cb, T::zero(), vb);
                b.next();
            }
            (None, None) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(shape: (usize, usize), entries: &[(usize, usize, f64)]) -> SparseOperator<f64> {
        SparseOperator::from_entries(shape, entries.iter().copied()).unwrap()
    }

    #[test]
    fn test_from_coo_sums_duplicates() {
        let m = SparseOperator::from_coo((2, 2), &[0, 0, 1], &[1, 1, 0], &[1.0, 2.5, 4.0]).unwrap();

        assert_eq!(m.nnz(), 2);
        assert_eq!(m.get(0, 1), 3.5);
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.get(1, 1), 0.0);
    }

    #[test]
    fn test_from_coo_drops_cancelled_entries() {
        let m = SparseOperator::from_coo((2, 2), &[0, 0], &[0, 0], &[1.0, -1.0]).unwrap();
        assert_eq!(m.nnz(), 0);
    }

    #[test]
    fn test_from_coo_rejects_bad_input() {
        let err = SparseOperator::<f64>::from_coo((2, 2), &[0, 2], &[0, 0], &[1.0, 1.0]).unwrap_err();
        assert_eq!(err, SpectralError::index_out_of_bounds(2, 0, (2, 2)));

        let err = SparseOperator::<f64>::from_coo((2, 2), &[0], &[0, 1], &[1.0]).unwrap_err();
        assert!(matches!(err, SpectralError::LengthMismatch { .. }));
    }

    #[test]
    fn test_from_edges_counts_repeats() {
        let a = SparseOperator::<f32>::from_edges(3, &[(0, 1), (0, 1), (2, 0)]).unwrap();
        assert_eq!(a.get(0, 1), 2.0);
        assert_eq!(a.get(1, 0), 0.0);
        assert_eq!(a.get(2, 0), 1.0);
    }

    #[test]
    fn test_identity_and_diagonal() {
        let i = SparseOperator::<f64>::identity(3);
        assert_eq!(i.nnz(), 3);
        assert_eq!(i.get(1, 1), 1.0);
        assert_eq!(i.get(0, 1), 0.0);

        let d = SparseOperator::diagonal(&[2.0, 0.0, 3.0]);
        assert_eq!(d.nnz(), 2);
    }

    #[test]
    fn test_add_sub_scale() {
        let a = op((2, 2), &[(0, 0, 1.0), (0, 1, 2.0)]);
        let b = op((2, 2), &[(0, 1, -2.0), (1, 1, 5.0)]);

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.get(0, 0), 1.0);
        assert_eq!(sum.get(0, 1), 0.0);
        assert_eq!(sum.get(1, 1), 5.0);
        assert_eq!(sum.nnz(), 2);

        let diff = a.sub(&a).unwrap();
        assert_eq!(diff.nnz(), 0);

        let scaled = a.scale(3.0);
        assert_eq!(scaled.get(0, 1), 6.0);
        assert_eq!(a.scale(0.0).nnz(), 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = op((2, 2), &[(0, 0, 1.0)]);
        let b = op((3, 3), &[(0, 0, 1.0)]);

        assert!(matches!(
            a.add(&b),
            Err(SpectralError::ShapeMismatch { op: "add", .. })
        ));
        assert!(matches!(
            a.multiply(&b),
            Err(SpectralError::ShapeMismatch { op: "multiply", .. })
        ));
        assert!(a.elementwise_greater(&b).is_err());
        assert!(a.mul_vec(&[1.0]).is_err());
    }

    #[test]
    fn test_transpose() {
        let a = op((2, 3), &[(0, 2, 1.0), (1, 0, 2.0), (1, 2, 3.0)]);
        let t = a.transpose();

        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.get(2, 0), 1.0);
        assert_eq!(t.get(0, 1), 2.0);
        assert_eq!(t.get(2, 1), 3.0);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_elementwise_greater_reads_implicit_zero() {
        let a = op((2, 2), &[(0, 1, 1.0), (1, 0, -1.0)]);
        let b = op((2, 2), &[(0, 1, 0.5), (1, 1, 2.0)]);

        let mask = a.elementwise_greater(&b).unwrap();
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![(0, 1)]);

        let mask = b.elementwise_greater(&a).unwrap();
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![(1, 0), (1, 1)]);
    }

    #[test]
    fn test_masked_partitions_entries() {
        let a = op((2, 2), &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]);
        let mask = a.elementwise_greater(&SparseOperator::identity(2)).unwrap();

        let kept = a.masked(&mask).unwrap();
        let dropped = a.masked_out(&mask).unwrap();
        assert_eq!(kept.get(0, 1), 2.0);
        assert_eq!(kept.get(1, 1), 3.0);
        assert_eq!(dropped.get(0, 0), 1.0);
        assert_eq!(kept.add(&dropped).unwrap(), a);
    }

    #[test]
    fn test_multiply() {
        // [1 2] [0 1]   [2 1]
        // [0 3] [1 0] = [3 0]
        let a = op((2, 2), &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]);
        let b = op((2, 2), &[(0, 1, 1.0), (1, 0, 1.0)]);

        let c = a.multiply(&b).unwrap();
        assert_eq!(c.to_dense(), vec![vec![2.0, 1.0], vec![3.0, 0.0]]);
        assert_eq!(c.nnz(), 3);
    }

    #[test]
    fn test_multiply_rectangular_and_identity() {
        let a = op((2, 3), &[(0, 0, 1.0), (1, 2, 4.0)]);
        let b = op((3, 1), &[(2, 0, 0.5)]);

        let c = a.multiply(&b).unwrap();
        assert_eq!(c.shape(), (2, 1));
        assert_eq!(c.get(1, 0), 2.0);

        let i = SparseOperator::identity(3);
        assert_eq!(a.multiply(&i).unwrap(), a);
    }

    #[test]
    fn test_mul_vec_and_row_sums() {
        let m = op((2, 2), &[(0, 0, 1.0), (0, 1, 2.0), (1, 0, 3.0), (1, 1, 4.0)]);
        let y = m.mul_vec(&[1.0, 2.0]).unwrap();
        assert_eq!(y, vec![5.0, 11.0]);
        assert_eq!(m.row_sums(), vec![3.0, 7.0]);
        assert_eq!(m.max_abs_row_sum(), 7.0);
    }

    #[test]
    fn test_canonical_coordinates_are_row_major() {
        let m = op((3, 3), &[(2, 0, 1.0), (0, 2, 2.0), (0, 1, 3.0)]);
        let (coords, values) = m.to_canonical_coordinates();
        assert_eq!(coords, vec![(0, 1), (0, 2), (2, 0)]);
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_is_symmetric() {
        assert!(op((2, 2), &[(0, 1, 1.0), (1, 0, 1.0)]).is_symmetric());
        assert!(!op((2, 2), &[(0, 1, 1.0)]).is_symmetric());
        assert!(!op((2, 3), &[]).is_symmetric());
    }
}
