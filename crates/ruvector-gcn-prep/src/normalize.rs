//! Adjacency symmetrization and degree normalization
//!
//! A raw adjacency built from directed edge lists is first made symmetric
//! (each pair keeps the larger of its two directions), then normalized by
//! node degree:
//!
//! - **Symmetric**: `D^{-1/2} A D^{-1/2}`
//! - **Random walk**: `D^{-1} A`
//!
//! Degrees are row sums. A node with zero degree gets an inverse-power of 0,
//! so isolated nodes stay isolated instead of turning into NaN rows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// Degree normalization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// `D^{-1/2} A D^{-1/2}`
    #[default]
    Symmetric,
    /// `D^{-1} A`, rows of non-isolated nodes sum to one
    RandomWalk,
}

impl NormalizationMode {
    /// Mode selected by the `symmetric` configuration flag
    pub fn from_symmetric(symmetric: bool) -> Self {
        if symmetric {
            Self::Symmetric
        } else {
            Self::RandomWalk
        }
    }
}

/// Make `adj` symmetric without double-counting reciprocal edges.
///
/// Wherever `transpose(A)[i, j] > A[i, j]` the entry is replaced by the
/// transposed one, i.e. `A' = A + Aᵀ⊙(Aᵀ>A) − A⊙(Aᵀ>A)`. The replacement is
/// done by masking rather than add-then-subtract, which keeps `A' == A'ᵀ`
/// exact for arbitrary float weights.
pub fn symmetrize<T: Scalar>(adj: &SparseOperator<T>) -> Result<SparseOperator<T>> {
    ensure_square(adj, "symmetrize")?;
    let transposed = adj.transpose();
    let upgrade = transposed.elementwise_greater(adj)?;
    adj.masked_out(&upgrade)?.add(&transposed.masked(&upgrade)?)
}

/// Add self-loops: `A + I`
pub fn add_self_loops<T: Scalar>(adj: &SparseOperator<T>) -> Result<SparseOperator<T>> {
    ensure_square(adj, "add_self_loops")?;
    adj.add(&SparseOperator::identity(adj.rows()))
}

/// Row-sum degree vector
pub fn degrees<T: Scalar>(adj: &SparseOperator<T>) -> Vec<T> {
    adj.row_sums()
}

/// Inverse power `d^{-1/2}` or `d^{-1}` of each degree, 0 for non-positive degrees
pub fn inverse_degree_powers<T: Scalar>(degrees: &[T], mode: NormalizationMode) -> Vec<T> {
    degrees
        .iter()
        .map(|&d| {
            if d > T::zero() {
                match mode {
                    NormalizationMode::Symmetric => d.sqrt().recip(),
                    NormalizationMode::RandomWalk => d.recip(),
                }
            } else {
                T::zero()
            }
        })
        .collect()
}

/// Degree-normalize an adjacency operator.
///
/// The operator is expected to be symmetric already (see [`symmetrize`]).
/// Symmetric entries are computed as `a_ij * (d_i * d_j)`, which keeps the
/// result exactly symmetric.
pub fn normalize<T: Scalar>(
    adj: &SparseOperator<T>,
    mode: NormalizationMode,
) -> Result<SparseOperator<T>> {
    ensure_square(adj, "normalize")?;

    let inv = inverse_degree_powers(&degrees(adj), mode);
    let isolated = inv.iter().filter(|d| **d == T::zero()).count();
    debug!(
        nodes = adj.rows(),
        nnz = adj.nnz(),
        isolated,
        ?mode,
        "normalizing adjacency"
    );

    let normalized = match mode {
        NormalizationMode::Symmetric => adj.map_entries(|i, j, a| a * (inv[i] * inv[j])),
        NormalizationMode::RandomWalk => adj.map_entries(|i, _, a| a * inv[i]),
    };
    Ok(normalized)
}

/// First-order spectral preprocessing: `normalize(A + I)`
pub fn preprocess_adjacency<T: Scalar>(
    adj: &SparseOperator<T>,
    mode: NormalizationMode,
) -> Result<SparseOperator<T>> {
    normalize(&add_self_loops(adj)?, mode)
}

fn ensure_square<T: Scalar>(op: &SparseOperator<T>, name: &'static str) -> Result<()> {
    if !op.is_square() {
        return Err(SpectralError::shape_mismatch(
            name,
            op.shape(),
            (op.rows(), op.rows()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn path_graph() -> SparseOperator<f64> {
        // 0 -> 1 -> 2, directed
        SparseOperator::from_edges(3, &[(0, 1), (1, 2)]).unwrap()
    }

    #[test]
    fn test_symmetrize_directed_edges() {
        let sym = symmetrize(&path_graph()).unwrap();

        assert!(sym.is_symmetric());
        assert_eq!(sym.get(1, 0), 1.0);
        assert_eq!(sym.get(2, 1), 1.0);
        assert_eq!(sym.nnz(), 4);
    }

    #[test]
    fn test_symmetrize_does_not_double_count() {
        let adj = SparseOperator::from_weighted_edges(2, &[(0, 1, 1.0), (1, 0, 3.0)]).unwrap();
        let sym = symmetrize(&adj).unwrap();

        assert_eq!(sym.get(0, 1), 3.0);
        assert_eq!(sym.get(1, 0), 3.0);
    }

    #[test]
    fn test_symmetrize_rejects_rectangular() {
        let adj = SparseOperator::<f64>::zeros(2, 3);
        assert!(matches!(
            symmetrize(&adj),
            Err(SpectralError::ShapeMismatch { op: "symmetrize", .. })
        ));
    }

    #[test]
    fn test_symmetric_normalization() {
        let sym = symmetrize(&path_graph()).unwrap();
        let norm = normalize(&sym, NormalizationMode::Symmetric).unwrap();

        // degrees 1, 2, 1
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((norm.get(0, 1) - expected).abs() < TOL);
        assert!((norm.get(1, 2) - expected).abs() < TOL);
        assert!(norm.is_symmetric());
    }

    #[test]
    fn test_random_walk_rows_sum_to_one() {
        let sym = symmetrize(&path_graph()).unwrap();
        let norm = normalize(&sym, NormalizationMode::RandomWalk).unwrap();

        for sum in norm.row_sums() {
            assert!((sum - 1.0).abs() < TOL);
        }
        assert_eq!(norm.get(1, 0), 0.5);
    }

    #[test]
    fn test_isolated_node_stays_zero() {
        let adj = SparseOperator::<f64>::from_edges(3, &[(0, 1), (1, 0)]).unwrap();

        for mode in [NormalizationMode::Symmetric, NormalizationMode::RandomWalk] {
            let norm = normalize(&adj, mode).unwrap();
            assert!(norm.row(2).next().is_none());
            assert!(norm.iter().all(|(_, _, v)| v.is_finite()));
        }
    }

    #[test]
    fn test_inverse_degree_powers() {
        let inv = inverse_degree_powers(&[4.0, 0.0, 2.0], NormalizationMode::Symmetric);
        assert_eq!(inv, vec![0.5, 0.0, 1.0 / 2.0_f64.sqrt()]);

        let inv = inverse_degree_powers(&[4.0f32, 0.0], NormalizationMode::RandomWalk);
        assert_eq!(inv, vec![0.25, 0.0]);
    }

    #[test]
    fn test_preprocess_adds_self_loops() {
        let adj = SparseOperator::<f64>::from_edges(2, &[(0, 1), (1, 0)]).unwrap();
        let pre = preprocess_adjacency(&adj, NormalizationMode::Symmetric).unwrap();

        // Each node has degree 2 after the self-loop
        for i in 0..2 {
            for j in 0..2 {
                assert!((pre.get(i, j) - 0.5).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_mode_from_flag() {
        assert_eq!(NormalizationMode::from_symmetric(true), NormalizationMode::Symmetric);
        assert_eq!(NormalizationMode::from_symmetric(false), NormalizationMode::RandomWalk);
    }
}
