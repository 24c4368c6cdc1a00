//! Lanczos estimation of the largest-magnitude eigenvalue
//!
//! Only the eigenvalue is returned. Within one cycle the Krylov basis is
//! kept fully reorthogonalized (two Gram-Schmidt passes per step) so the
//! tridiagonal projection stays faithful on graphs with clustered spectra.
//!
//! A cycle holds at most `krylov_dimension` basis vectors. When it fills up
//! without converging, the solver restarts from the current Ritz vector
//! `y = V·s`, so memory stays at `O(n · krylov_dimension)` however large
//! the step budget is.
//!
//! Each step the extreme Ritz values of the tridiagonal `T_m` are found by
//! Sturm-sequence bisection, and the residual of the selected Ritz pair is
//! estimated as `β_m · |s_m|`, where `s` is the Ritz vector of `T_m`
//! (obtained by inverse iteration). The iteration stops when
//! `β_m · |s_m| <= tol · max(ε^{2/3}, |θ|)` or when the Krylov space becomes
//! invariant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SpectralError};
use crate::scalar::Scalar;
use crate::sparse::SparseOperator;

/// Default Lanczos step budget
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Default number of Krylov vectors held per restart cycle
pub const DEFAULT_KRYLOV_DIMENSION: usize = 20;

/// Default relative residual tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default start-vector seed
pub const DEFAULT_SEED: u64 = 42;

const BISECTION_STEPS: usize = 256;
const INVERSE_ITERATION_STEPS: usize = 3;

/// A converged eigenvalue estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Scalar")]
pub struct EigenEstimate<T> {
    /// Ritz value of largest magnitude
    pub value: T,
    /// Lanczos steps taken, summed over restarts
    pub iterations: usize,
    /// Restarts performed
    pub restarts: usize,
    /// Largest Krylov basis held at any point
    pub krylov_dimension: usize,
    /// Residual estimate at termination
    pub residual: T,
}

/// Lanczos eigensolver for symmetric sparse operators
#[derive(Debug, Clone, PartialEq)]
pub struct LanczosSolver {
    /// Maximum number of Lanczos steps, summed over restarts
    pub max_iterations: usize,
    /// Basis vectors held before restarting
    pub krylov_dimension: usize,
    /// Relative residual tolerance, floored at a few ulps of the working precision
    pub tolerance: f64,
    /// Seed of the deterministic start vector
    pub seed: u64,
}

impl Default for LanczosSolver {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            krylov_dimension: DEFAULT_KRYLOV_DIMENSION,
            tolerance: DEFAULT_TOLERANCE,
            seed: DEFAULT_SEED,
        }
    }
}

impl LanczosSolver {
    /// Create a solver with an iteration budget and tolerance
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
            ..Default::default()
        }
    }

    /// Bound the Krylov basis held per restart cycle
    pub fn with_krylov_dimension(mut self, krylov_dimension: usize) -> Self {
        self.krylov_dimension = krylov_dimension;
        self
    }

    /// Use a different start-vector seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Largest-magnitude eigenvalue of a symmetric operator.
    ///
    /// Returns [`SpectralError::EigensolverNonConvergence`] when the budget
    /// runs out first. An empty or all-zero operator has eigenvalue 0.
    pub fn largest_eigenvalue<T: Scalar>(
        &self,
        op: &SparseOperator<T>,
    ) -> Result<EigenEstimate<T>> {
        if !op.is_square() {
            return Err(SpectralError::shape_mismatch(
                "largest_eigenvalue",
                op.shape(),
                (op.rows(), op.rows()),
            ));
        }
        if self.max_iterations == 0 {
            return Err(SpectralError::invalid_parameter(
                "max_iterations",
                "must be at least 1",
            ));
        }
        if self.krylov_dimension < 2 {
            return Err(SpectralError::invalid_parameter(
                "krylov_dimension",
                "must be at least 2",
            ));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(SpectralError::invalid_parameter(
                "tolerance",
                "must be non-negative",
            ));
        }

        let n = op.rows();
        let anorm = op.max_abs_row_sum();
        if n == 0 || anorm == T::zero() {
            return Ok(EigenEstimate {
                value: T::zero(),
                iterations: 0,
                restarts: 0,
                krylov_dimension: 0,
                residual: T::zero(),
            });
        }

        let eps = T::epsilon();
        let four = T::from_config(4.0);
        let tol = T::from_config(self.tolerance).max(four * eps);
        let eps23 = eps.powf(T::from_config(2.0 / 3.0));
        let breakdown = eps * anorm * T::from_config(n as f64).sqrt();
        let ncv = self.krylov_dimension.min(n);

        let mut start = random_unit_vector(n, self.seed);
        let mut steps = 0;
        let mut restarts = 0;
        let mut held = 0;
        let mut residual = T::infinity();

        while steps < self.max_iterations {
            let cycle = ncv.min(self.max_iterations - steps);
            let mut basis: Vec<Vec<T>> = vec![start];
            let mut alpha: Vec<T> = Vec::with_capacity(cycle);
            let mut beta: Vec<T> = Vec::with_capacity(cycle);
            let mut ritz = vec![T::one()];

            for j in 0..cycle {
                steps += 1;
                held = held.max(basis.len());

                let mut w = op.mul_vec(&basis[j])?;
                let a = dot(&w, &basis[j]);
                axpy(&mut w, &basis[j], a);
                if j > 0 {
                    axpy(&mut w, &basis[j - 1], beta[j - 1]);
                }
                for _ in 0..2 {
                    for q in &basis {
                        let proj = dot(&w, q);
                        axpy(&mut w, q, proj);
                    }
                }
                let b = norm(&w);
                alpha.push(a);

                let theta = largest_magnitude_ritz_value(&alpha, &beta);

                if b <= breakdown {
                    debug!(iterations = steps, restarts, "Krylov space became invariant");
                    return Ok(EigenEstimate {
                        value: theta,
                        iterations: steps,
                        restarts,
                        krylov_dimension: held,
                        residual: b,
                    });
                }

                ritz = ritz_vector(&alpha, &beta, theta);
                residual = b * ritz[j].abs();
                if residual <= tol * eps23.max(theta.abs()) {
                    debug!(iterations = steps, restarts, %theta, %residual, "Lanczos converged");
                    return Ok(EigenEstimate {
                        value: theta,
                        iterations: steps,
                        restarts,
                        krylov_dimension: held,
                        residual,
                    });
                }

                if j + 1 < cycle {
                    beta.push(b);
                    basis.push(w.iter().map(|&x| x / b).collect());
                }
            }

            if steps >= self.max_iterations {
                break;
            }
            start = combine(&basis, &ritz);
            restarts += 1;
            debug!(restarts, steps, %residual, "restarting Lanczos from Ritz vector");
        }

        Err(SpectralError::non_convergence(
            steps,
            residual.to_f64_lossless(),
        ))
    }
}

/// Deterministic pseudo-random unit vector (LCG)
fn random_unit_vector<T: Scalar>(n: usize, seed: u64) -> Vec<T> {
    let mut state = seed;
    let mut v: Vec<T> = (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = ((state >> 33) as f64) / ((1u64 << 31) as f64) - 0.5;
            T::from_config(r)
        })
        .collect();

    let nrm = norm(&v);
    if nrm > T::zero() {
        v.iter_mut().for_each(|x| *x = *x / nrm);
    } else {
        let uniform = T::one() / T::from_config(n as f64).sqrt();
        v.iter_mut().for_each(|x| *x = uniform);
    }
    v
}

fn dot<T: Scalar>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

fn norm<T: Scalar>(v: &[T]) -> T {
    dot(v, v).sqrt()
}

/// Unit vector `V·s` in the span of `basis`
fn combine<T: Scalar>(basis: &[Vec<T>], s: &[T]) -> Vec<T> {
    let mut y = vec![T::zero(); basis[0].len()];
    for (v, &c) in basis.iter().zip(s) {
        axpy(&mut y, v, -c);
    }
    let nrm = norm(&y);
    if nrm > T::zero() && nrm.is_finite() {
        y.iter_mut().for_each(|x| *x = *x / nrm);
        y
    } else {
        basis[0].clone()
    }
}

/// a = a - scale * b
fn axpy<T: Scalar>(a: &mut [T], b: &[T], scale: T) {
    for (ai, &bi) in a.iter_mut().zip(b) {
        *ai = *ai - scale * bi;
    }
}

/// Number of eigenvalues of the tridiagonal `(alpha, beta)` strictly below `x`
fn sturm_count<T: Scalar>(alpha: &[T], beta: &[T], x: T) -> usize {
    let tiny = T::min_positive_value();
    let mut count = 0;
    let mut q = T::one();
    for (i, &a) in alpha.iter().enumerate() {
        let coupling = if i == 0 {
            T::zero()
        } else {
            beta[i - 1] * beta[i - 1] / q
        };
        q = a - x - coupling;
        if q == T::zero() {
            q = -tiny;
        }
        if q < T::zero() {
            count += 1;
        }
    }
    count
}

/// Gershgorin interval containing every eigenvalue of the tridiagonal
fn gershgorin_bounds<T: Scalar>(alpha: &[T], beta: &[T]) -> (T, T) {
    let mut lo = T::infinity();
    let mut hi = T::neg_infinity();
    for (i, &a) in alpha.iter().enumerate() {
        let left = if i > 0 { beta[i - 1].abs() } else { T::zero() };
        let right = if i < beta.len() { beta[i].abs() } else { T::zero() };
        lo = lo.min(a - left - right);
        hi = hi.max(a + left + right);
    }
    (lo, hi)
}

/// Bisect for the `k`-th smallest eigenvalue (1-based)
fn bisect_eigenvalue<T: Scalar>(alpha: &[T], beta: &[T], k: usize) -> T {
    let (mut lo, mut hi) = gershgorin_bounds(alpha, beta);
    let two = T::from_config(2.0);
    for _ in 0..BISECTION_STEPS {
        let mid = lo + (hi - lo) / two;
        if mid <= lo || mid >= hi {
            break;
        }
        if sturm_count(alpha, beta, mid) >= k {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo + (hi - lo) / two
}

/// Extreme Ritz value of largest magnitude ("LM")
fn largest_magnitude_ritz_value<T: Scalar>(alpha: &[T], beta: &[T]) -> T {
    let m = alpha.len();
    let top = bisect_eigenvalue(alpha, beta, m);
    let bottom = bisect_eigenvalue(alpha, beta, 1);
    if bottom.abs() > top.abs() {
        bottom
    } else {
        top
    }
}

/// Unit Ritz vector of the tridiagonal for `theta`
fn ritz_vector<T: Scalar>(alpha: &[T], beta: &[T], theta: T) -> Vec<T> {
    let m = alpha.len();
    if m == 1 {
        return vec![T::one()];
    }

    let scale = alpha
        .iter()
        .chain(beta)
        .fold(T::min_positive_value(), |acc, x| acc.max(x.abs()));
    let pivot_floor = T::epsilon() * scale;

    let mut x = vec![T::one() / T::from_config(m as f64).sqrt(); m];
    for _ in 0..INVERSE_ITERATION_STEPS {
        let y = solve_shifted_tridiagonal(alpha, beta, theta, &x, pivot_floor);
        let nrm = norm(&y);
        if !(nrm > T::zero() && nrm.is_finite()) {
            break;
        }
        x = y.into_iter().map(|v| v / nrm).collect();
    }
    x
}

/// Solve `(T - shift·I) x = rhs` by Gaussian elimination with partial
/// pivoting; pivots smaller than `pivot_floor` are replaced by it.
fn solve_shifted_tridiagonal<T: Scalar>(
    alpha: &[T],
    beta: &[T],
    shift: T,
    rhs: &[T],
    pivot_floor: T,
) -> Vec<T> {
    let m = alpha.len();
    let floor = |p: T| {
        if p.abs() < pivot_floor {
            if p < T::zero() {
                -pivot_floor
            } else {
                pivot_floor
            }
        } else {
            p
        }
    };

    let mut d: Vec<T> = alpha.iter().map(|&a| a - shift).collect();
    let mut dl: Vec<T> = beta.to_vec();
    let mut du: Vec<T> = beta.to_vec();
    let mut du2 = vec![T::zero(); m.saturating_sub(2)];
    let mut b = rhs.to_vec();

    for i in 0..m - 1 {
        if d[i].abs() >= dl[i].abs() {
            d[i] = floor(d[i]);
            let fact = dl[i] / d[i];
            d[i + 1] = d[i + 1] - fact * du[i];
            b[i + 1] = b[i + 1] - fact * b[i];
            dl[i] = T::zero();
        } else {
            // Swap rows i and i+1
            let fact = d[i] / dl[i];
            d[i] = dl[i];
            let tmp = d[i + 1];
            d[i + 1] = du[i] - fact * tmp;
            if i + 2 < m {
                du2[i] = du[i + 1];
                du[i + 1] = -fact * du2[i];
            }
            du[i] = tmp;
            let b_i = b[i];
            b[i] = b[i + 1];
            b[i + 1] = b_i - fact * b[i];
        }
    }
    d[m - 1] = floor(d[m - 1]);

    let mut x = vec![T::zero(); m];
    x[m - 1] = b[m - 1] / d[m - 1];
    if m > 1 {
        x[m - 2] = (b[m - 2] - du[m - 2] * x[m - 1]) / d[m - 2];
    }
    for i in (0..m.saturating_sub(2)).rev() {
        x[i] = (b[i] - du[i] * x[i + 1] - du2[i] * x[i + 2]) / d[i];
    }
    x
}
