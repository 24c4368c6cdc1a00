//! Floating-point element type shared by every operator in a pipeline run.

use num_traits::{Float, FromPrimitive};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};

/// Element type of a [`SparseOperator`](crate::SparseOperator).
///
/// Implemented for `f32` and `f64` only. Operators, eigensolver and
/// Chebyshev basis are all generic over a single `T`, so a run never mixes
/// precisions.
pub trait Scalar:
    Float + FromPrimitive + Debug + Display + Default + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Lossless widening used for logging and error payloads
    fn to_f64_lossless(self) -> f64;

    /// Conversion of configuration constants into the working precision
    fn from_config(value: f64) -> Self;
}

impl Scalar for f32 {
    #[inline]
    fn to_f64_lossless(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_config(value: f64) -> Self {
        value as f32
    }
}

impl Scalar for f64 {
    #[inline]
    fn to_f64_lossless(self) -> f64 {
        self
    }

    #[inline]
    fn from_config(value: f64) -> Self {
        value
    }
}
