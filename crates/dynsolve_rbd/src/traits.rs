use num_traits::NumAssign;
use std::fmt::Debug;
use std::ops::Neg;

/// A trait for types the rigid-body algorithms can run on.
/// `f64` carries plain values; `Dual` additionally carries one directional derivative.
pub trait Scalar: NumAssign + Neg<Output = Self> + Copy + PartialEq + Debug + 'static {
    /// Lifts a constant into the scalar type (zero derivative part).
    fn from_f64(value: f64) -> Self;

    /// Real (value) part.
    fn re(self) -> f64;

    fn sin(self) -> Self;

    fn cos(self) -> Self;
}

impl Scalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn re(self) -> f64 {
        self
    }

    fn sin(self) -> Self {
        f64::sin(self)
    }

    fn cos(self) -> Self {
        f64::cos(self)
    }
}
