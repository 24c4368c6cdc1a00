//! Immutable sparse operators
//!
//! [`SparseOperator`] stores a matrix in compressed sparse row form with
//! columns sorted inside each row and exact zeros pruned. Every arithmetic
//! method returns a new operator; nothing is mutated after construction, so
//! operators can be shared freely between pipeline stages.
//!
//! ## Summation order
//!
//! Floating-point results depend on the order in which terms are summed.
//! The order is fixed for every operation:
//!
//! - duplicate coordinates are summed in input order
//! - `multiply` accumulates row `i` of `A·B` for `k` ascending over row `i`
//!   of `A`, then `j` ascending over row `k` of `B`

mod mask;
mod operator;

pub use mask::SparseMask;
pub use operator::SparseOperator;
