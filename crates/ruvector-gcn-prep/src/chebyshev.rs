//! Chebyshev polynomial basis of a rescaled Laplacian
//!
//! ```text
//! T[0] = I
//! T[1] = L
//! T[i] = 2 · L · T[i-1] − T[i-2]
//! ```
//!
//! Each step evaluates the product `L · T[i-1]` completely, scales it by two
//! and only then subtracts `T[i-2]`. Together with the fixed SpGEMM
//! summation order this makes the basis bit-for-bit reproducible.

use tracing::debug;

use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// Largest accepted polynomial order
///
/// Each order adds one SpGEMM and one densifying operator to the basis, so
/// orders much beyond this are never useful and only exhaust memory.
pub const MAX_CHEBYSHEV_ORDER: usize = 128;

/// Builds `[T[0], ..., T[k]]` for a fixed order `k`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChebyshevBasisBuilder {
    order: usize,
}

impl ChebyshevBasisBuilder {
    /// Validate the order
    ///
    /// Negative orders are [`SpectralError::InvalidOrder`], orders above
    /// [`MAX_CHEBYSHEV_ORDER`] are [`SpectralError::InvalidParameter`].
    pub fn try_new(order: i64) -> Result<Self> {
        let order = usize::try_from(order).map_err(|_| SpectralError::InvalidOrder { order })?;
        if order > MAX_CHEBYSHEV_ORDER {
            return Err(SpectralError::invalid_parameter(
                "chebyshev_order",
                format!("{order} exceeds the maximum of {MAX_CHEBYSHEV_ORDER}"),
            ));
        }
        Ok(Self { order })
    }

    /// Polynomial order `k`
    pub fn order(&self) -> usize {
        self.order
    }

    /// Evaluate the recurrence on `l_scaled`
    pub fn build<T: Scalar>(&self, l_scaled: &SparseOperator<T>) -> Result<Vec<SparseOperator<T>>> {
        if !l_scaled.is_square() {
            return Err(SpectralError::shape_mismatch(
                "chebyshev_basis",
                l_scaled.shape(),
                (l_scaled.rows(), l_scaled.rows()),
            ));
        }

        let mut basis = Vec::new();
        basis.push(SparseOperator::identity(l_scaled.rows()));
        if self.order >= 1 {
            basis.push(l_scaled.clone());
        }

        let two = T::from_config(2.0);
        for i in 2..=self.order {
            let next = l_scaled
                .multiply(&basis[i - 1])?
                .scale(two)
                .sub(&basis[i - 2])?;
            basis.push(next);
        }

        debug!(
            order = self.order,
            nodes = l_scaled.rows(),
            nnz = ?basis.iter().map(SparseOperator::nnz).collect::<Vec<_>>(),
            "built chebyshev basis"
        );
        Ok(basis)
    }
}

/// Chebyshev basis of order `order` for `l_scaled`
pub fn chebyshev_basis<T: Scalar>(
    l_scaled: &SparseOperator<T>,
    order: i64,
) -> Result<Vec<SparseOperator<T>>> {
    ChebyshevBasisBuilder::try_new(order)?.build(l_scaled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_operator() -> SparseOperator<f64> {
        SparseOperator::from_weighted_edges(
            3,
            &[(0, 1, 0.5), (1, 0, 0.5), (1, 2, -0.25), (2, 1, -0.25), (1, 1, 0.1)],
        )
        .unwrap()
    }

    #[test]
    fn test_negative_order_rejected() {
        assert_eq!(
            ChebyshevBasisBuilder::try_new(-1),
            Err(SpectralError::InvalidOrder { order: -1 })
        );
        assert!(chebyshev_basis(&path_operator(), -3).is_err());
    }

    #[test]
    fn test_oversized_order_rejected() {
        for order in [i64::MAX, MAX_CHEBYSHEV_ORDER as i64 + 1] {
            assert!(matches!(
                ChebyshevBasisBuilder::try_new(order),
                Err(SpectralError::InvalidParameter { ref name, .. }) if name == "chebyshev_order"
            ));
        }
        assert!(chebyshev_basis(&SparseOperator::diagonal(&[0.5]), i64::MAX).is_err());

        let builder = ChebyshevBasisBuilder::try_new(MAX_CHEBYSHEV_ORDER as i64).unwrap();
        assert_eq!(builder.order(), MAX_CHEBYSHEV_ORDER);
    }

    #[test]
    fn test_order_zero_is_identity() {
        let basis = chebyshev_basis(&path_operator(), 0).unwrap();
        assert_eq!(basis, vec![SparseOperator::identity(3)]);
    }

    #[test]
    fn test_order_one() {
        let l = path_operator();
        let basis = chebyshev_basis(&l, 1).unwrap();
        assert_eq!(basis.len(), 2);
        assert_eq!(basis[0], SparseOperator::identity(3));
        assert_eq!(basis[1], l);
    }

    #[test]
    fn test_recurrence_matches_manual_evaluation() {
        let l = path_operator();
        let basis = chebyshev_basis(&l, 3).unwrap();
        assert_eq!(basis.len(), 4);

        let t2 = l.multiply(&l).unwrap().scale(2.0).sub(&basis[0]).unwrap();
        assert_eq!(basis[2], t2);
        let t3 = l.multiply(&t2).unwrap().scale(2.0).sub(&l).unwrap();
        assert_eq!(basis[3], t3);
    }

    #[test]
    fn test_second_order_is_symmetric() {
        let basis = chebyshev_basis(&path_operator(), 2).unwrap();
        assert!(basis[2].is_symmetric());
    }

    #[test]
    fn test_scalar_case_matches_chebyshev_polynomials() {
        // A 1x1 operator x gives T_k(x)
        let x: f64 = 0.3;
        let l = SparseOperator::diagonal(&[x]);
        let basis = chebyshev_basis(&l, 4).unwrap();
        let expected = [1.0, x, 2.0 * x * x - 1.0, 4.0 * x * x * x - 3.0 * x];
        for (op, want) in basis.iter().zip(expected) {
            assert!((op.get(0, 0) - want).abs() < 1e-12);
        }
        let t4 = 8.0 * x.powi(4) - 8.0 * x * x + 1.0;
        assert!((basis[4].get(0, 0) - t4).abs() < 1e-12);
    }

    #[test]
    fn test_build_is_deterministic() {
        let l = path_operator();
        let builder = ChebyshevBasisBuilder::try_new(5).unwrap();
        assert_eq!(builder.build(&l).unwrap(), builder.build(&l).unwrap());
    }

    #[test]
    fn test_rejects_rectangular() {
        let op = SparseOperator::<f32>::zeros(2, 3);
        assert!(matches!(
            chebyshev_basis(&op, 2),
            Err(SpectralError::ShapeMismatch { op: "chebyshev_basis", .. })
        ));
    }
}
