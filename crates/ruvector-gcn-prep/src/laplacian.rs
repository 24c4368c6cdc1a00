//! Normalized graph Laplacian

use crate::error::{Result, SpectralError};
use crate::normalize::{normalize, NormalizationMode};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// `L = I - A_norm` for an already normalized adjacency (without self-loops)
pub fn laplacian<T: Scalar>(a_norm: &SparseOperator<T>) -> Result<SparseOperator<T>> {
    if !a_norm.is_square() {
        return Err(SpectralError::shape_mismatch(
            "laplacian",
            a_norm.shape(),
            (a_norm.rows(), a_norm.rows()),
        ));
    }
    SparseOperator::identity(a_norm.rows()).sub(a_norm)
}

/// Normalize a symmetric adjacency and derive its Laplacian in one step
pub fn normalized_laplacian_of<T: Scalar>(
    adj: &SparseOperator<T>,
    mode: NormalizationMode,
) -> Result<SparseOperator<T>> {
    laplacian(&normalize(adj, mode)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laplacian_plus_adjacency_is_identity() {
        let adj = SparseOperator::<f64>::from_edges(3, &[(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        let a_norm = normalize(&adj, NormalizationMode::Symmetric).unwrap();
        let l = laplacian(&a_norm).unwrap();

        assert_eq!(l.add(&a_norm).unwrap(), SparseOperator::identity(3));
    }

    #[test]
    fn test_laplacian_of_path() {
        let adj = SparseOperator::<f64>::from_edges(2, &[(0, 1), (1, 0)]).unwrap();
        let l = normalized_laplacian_of(&adj, NormalizationMode::Symmetric).unwrap();

        assert_eq!(l.to_dense(), vec![vec![1.0, -1.0], vec![-1.0, 1.0]]);
    }

    #[test]
    fn test_isolated_node_has_unit_diagonal() {
        let adj = SparseOperator::<f32>::zeros(2, 2);
        let l = normalized_laplacian_of(&adj, NormalizationMode::RandomWalk).unwrap();
        assert_eq!(l, SparseOperator::identity(2));
    }

    #[test]
    fn test_rejects_rectangular() {
        let op = SparseOperator::<f64>::zeros(2, 3);
        assert!(matches!(
            laplacian(&op),
            Err(SpectralError::ShapeMismatch { op: "laplacian", .. })
        ));
    }
}
