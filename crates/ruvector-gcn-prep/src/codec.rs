//! Canonical `(coordinates, values, shape)` interchange form
//!
//! Downstream tensor consumers that do not understand CSR receive operators
//! as a triple. Coordinates are always emitted row-major with columns
//! ascending, so two encodings of equal operators are identical.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// Sparse operator as parallel coordinate and value sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Scalar")]
pub struct SparseTriple<T> {
    /// `(row, col)` of each stored entry
    pub coords: Vec<(usize, usize)>,
    /// Value of each entry, parallel to `coords`
    pub values: Vec<T>,
    /// Operator shape as `(rows, cols)`
    pub shape: (usize, usize),
}

impl<T: Scalar> SparseTriple<T> {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the triple encodes an all-zero operator
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encode an operator into its canonical triple
pub fn to_triple<T: Scalar>(op: &SparseOperator<T>) -> SparseTriple<T> {
    let (coords, values) = op.to_canonical_coordinates();
    SparseTriple {
        coords,
        values,
        shape: op.shape(),
    }
}

/// Decode a triple back into an operator.
///
/// Duplicate coordinates are summed; coordinates outside `shape` and
/// coordinate/value length disagreements are rejected.
pub fn from_triple<T: Scalar>(triple: &SparseTriple<T>) -> Result<SparseOperator<T>> {
    if triple.coords.len() != triple.values.len() {
        return Err(SpectralError::LengthMismatch {
            rows: triple.coords.len(),
            cols: triple.coords.len(),
            values: triple.values.len(),
        });
    }
    SparseOperator::from_entries(
        triple.shape,
        triple
            .coords
            .iter()
            .zip(&triple.values)
            .map(|(&(r, c), &v)| (r, c, v)),
    )
}

impl<T: Scalar> From<&SparseOperator<T>> for SparseTriple<T> {
    fn from(op: &SparseOperator<T>) -> Self {
        to_triple(op)
    }
}

impl<T: Scalar> TryFrom<&SparseTriple<T>> for SparseOperator<T> {
    type Error = SpectralError;

    fn try_from(triple: &SparseTriple<T>) -> Result<Self> {
        from_triple(triple)
    }
}
