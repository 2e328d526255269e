//! Configuration manifolds the state's position block lives on.
//!
//! A [`ConfigurationSpace`] provides the three operators the solvers need:
//! `difference` (log map), its Jacobian and `integrate` (exp map). Tangent
//! vectors always have `nv` entries, configurations `nq`.

use crate::error::{DynamicsError, Result};
use dynsolve_rbd::Model;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Which argument of a two-argument operator a Jacobian is taken with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentPosition {
    Arg0,
    Arg1,
}

impl ArgumentPosition {
    pub fn flipped(self) -> Self {
        match self {
            Self::Arg0 => Self::Arg1,
            Self::Arg1 => Self::Arg0,
        }
    }
}

impl TryFrom<usize> for ArgumentPosition {
    type Error = DynamicsError;

    fn try_from(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Self::Arg0),
            1 => Ok(Self::Arg1),
            other => Err(DynamicsError::InvalidArgumentPosition(other)),
        }
    }
}

impl From<ArgumentPosition> for dynsolve_rbd::ArgumentPosition {
    fn from(arg: ArgumentPosition) -> Self {
        match arg {
            ArgumentPosition::Arg0 => Self::Arg0,
            ArgumentPosition::Arg1 => Self::Arg1,
        }
    }
}

/// How a scalar coordinate is differenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleWrapping {
    /// Plain subtraction.
    #[default]
    Algebraic,
    /// Shortest signed angle, wrapped to `[-π, π)`.
    Geodesic,
}

impl AngleWrapping {
    pub fn difference(self, a: f64, b: f64) -> f64 {
        let d = b - a;
        match self {
            Self::Algebraic => d,
            Self::Geodesic => (d + PI).rem_euclid(2.0 * PI) - PI,
        }
    }
}

pub trait ConfigurationSpace {
    /// Size of a configuration.
    fn nq(&self) -> usize;

    /// Size of a tangent vector.
    fn nv(&self) -> usize;

    /// Tangent vector taking `q0` to `q1` (`q1 ⊖ q0`).
    fn difference(&self, q0: &[f64], q1: &[f64]) -> Result<DVector<f64>>;

    /// Jacobian of [`ConfigurationSpace::difference`] with respect to `q0` or `q1`.
    fn d_difference(&self, q0: &[f64], q1: &[f64], arg: ArgumentPosition)
        -> Result<DMatrix<f64>>;

    /// `q ⊕ v`.
    fn integrate(&self, q: &[f64], v: &[f64]) -> Result<DVector<f64>>;
}

/// `R^n` with a per-coordinate differencing rule.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSpace {
    wrapping: Vec<AngleWrapping>,
}

impl VectorSpace {
    pub fn euclidean(dim: usize) -> Self {
        Self {
            wrapping: vec![AngleWrapping::Algebraic; dim],
        }
    }

    pub fn with_wrapping(wrapping: Vec<AngleWrapping>) -> Self {
        Self { wrapping }
    }

    pub fn wrapping(&self) -> &[AngleWrapping] {
        &self.wrapping
    }

    fn check(&self, what: &'static str, x: &[f64]) -> Result<()> {
        DynamicsError::check_len(what, self.wrapping.len(), x.len())
    }
}

impl ConfigurationSpace for VectorSpace {
    fn nq(&self) -> usize {
        self.wrapping.len()
    }

    fn nv(&self) -> usize {
        self.wrapping.len()
    }

    fn difference(&self, q0: &[f64], q1: &[f64]) -> Result<DVector<f64>> {
        self.check("configuration", q0)?;
        self.check("configuration", q1)?;
        Ok(DVector::from_iterator(
            self.wrapping.len(),
            self.wrapping
                .iter()
                .zip(q0.iter().zip(q1))
                .map(|(mode, (&a, &b))| mode.difference(a, b)),
        ))
    }

    fn d_difference(
        &self,
        q0: &[f64],
        q1: &[f64],
        arg: ArgumentPosition,
    ) -> Result<DMatrix<f64>> {
        self.check("configuration", q0)?;
        self.check("configuration", q1)?;
        // Wrapping is piecewise constant, so both modes share the Jacobian.
        let n = self.wrapping.len();
        Ok(match arg {
            ArgumentPosition::Arg0 => -DMatrix::<f64>::identity(n, n),
            ArgumentPosition::Arg1 => DMatrix::identity(n, n),
        })
    }

    fn integrate(&self, q: &[f64], v: &[f64]) -> Result<DVector<f64>> {
        self.check("configuration", q)?;
        self.check("tangent", v)?;
        Ok(DVector::from_iterator(
            q.len(),
            q.iter().zip(v).map(|(a, b)| a + b),
        ))
    }
}

impl ConfigurationSpace for Model {
    fn nq(&self) -> usize {
        self.nq
    }

    fn nv(&self) -> usize {
        self.nv
    }

    fn difference(&self, q0: &[f64], q1: &[f64]) -> Result<DVector<f64>> {
        Ok(Model::difference(self, q0, q1)?)
    }

    fn d_difference(
        &self,
        q0: &[f64],
        q1: &[f64],
        arg: ArgumentPosition,
    ) -> Result<DMatrix<f64>> {
        Ok(Model::d_difference(self, q0, q1, arg.into())?)
    }

    fn integrate(&self, q: &[f64], v: &[f64]) -> Result<DVector<f64>> {
        Ok(Model::integrate(self, q, v)?)
    }
}
