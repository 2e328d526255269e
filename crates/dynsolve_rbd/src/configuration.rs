//! Configuration-space operators: integrate, difference and its Jacobian.
//!
//! Revolute and prismatic joints are Euclidean. A continuous joint stores the
//! unit complex number `(cos θ, sin θ)`, so its configuration block has two
//! entries for one velocity.

use crate::description::JointKind;
use crate::error::ModelError;
use crate::model::Model;
use crate::traits::Scalar;
use nalgebra::{DMatrix, DVector};

/// Which argument of `difference(q0, q1)` a Jacobian is taken with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentPosition {
    Arg0,
    Arg1,
}

impl Model {
    /// Reference configuration: zero angles and displacements.
    pub fn neutral(&self) -> DVector<f64> {
        let mut q = DVector::zeros(self.nq);
        for joint in self.joints() {
            if joint.kind == JointKind::Continuous {
                q[joint.idx_q] = 1.0;
            }
        }
        q
    }

    /// `q ⊕ v`, written into `out`. Generic so derivative passes can seed `v`.
    pub fn integrate_into<T: Scalar>(&self, q: &[T], v: &[T], out: &mut [T]) {
        for joint in self.joints() {
            let (iq, iv) = (joint.idx_q, joint.idx_v);
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => out[iq] = q[iq] + v[iv],
                JointKind::Continuous => {
                    let (c0, s0) = (q[iq], q[iq + 1]);
                    let (c, s) = (v[iv].cos(), v[iv].sin());
                    out[iq] = c0 * c - s0 * s;
                    out[iq + 1] = s0 * c + c0 * s;
                }
                JointKind::Fixed => {}
            }
        }
    }

    pub fn integrate(&self, q: &[f64], v: &[f64]) -> Result<DVector<f64>, ModelError> {
        ModelError::check_len("configuration", self.nq, q.len())?;
        ModelError::check_len("tangent", self.nv, v.len())?;
        let mut out = DVector::zeros(self.nq);
        self.integrate_into(q, v, out.as_mut_slice());
        Ok(out)
    }

    /// Tangent vector taking `q0` to `q1`, i.e. `q1 ⊖ q0`.
    pub fn difference(&self, q0: &[f64], q1: &[f64]) -> Result<DVector<f64>, ModelError> {
        ModelError::check_len("configuration", self.nq, q0.len())?;
        ModelError::check_len("configuration", self.nq, q1.len())?;
        let mut dv = DVector::zeros(self.nv);
        for joint in self.joints() {
            let (iq, iv) = (joint.idx_q, joint.idx_v);
            match joint.kind {
                JointKind::Revolute | JointKind::Prismatic => dv[iv] = q1[iq] - q0[iq],
                JointKind::Continuous => {
                    let (c0, s0) = (q0[iq], q0[iq + 1]);
                    let (c1, s1) = (q1[iq], q1[iq + 1]);
                    dv[iv] = (c0 * s1 - s0 * c1).atan2(c0 * c1 + s0 * s1);
                }
                JointKind::Fixed => {}
            }
        }
        Ok(dv)
    }

    /// Jacobian of [`Model::difference`] with respect to `q0` or `q1`, in tangent coordinates.
    pub fn d_difference(
        &self,
        q0: &[f64],
        q1: &[f64],
        arg: ArgumentPosition,
    ) -> Result<DMatrix<f64>, ModelError> {
        ModelError::check_len("configuration", self.nq, q0.len())?;
        ModelError::check_len("configuration", self.nq, q1.len())?;
        // Every supported joint group is one-dimensional and commutative, so the
        // log-map Jacobian is 1 and only the sign depends on the argument.
        let sign = match arg {
            ArgumentPosition::Arg0 => -1.0,
            ArgumentPosition::Arg1 => 1.0,
        };
        Ok(DMatrix::identity(self.nv, self.nv) * sign)
    }

    /// Project a configuration back onto the manifold (unit `(cos, sin)` pairs).
    pub fn normalize(&self, q: &mut [f64]) -> Result<(), ModelError> {
        ModelError::check_len("configuration", self.nq, q.len())?;
        for joint in self.joints() {
            if joint.kind == JointKind::Continuous {
                let iq = joint.idx_q;
                let norm = q[iq].hypot(q[iq + 1]);
                if norm > 0.0 {
                    q[iq] /= norm;
                    q[iq + 1] /= norm;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::ModelDescription;

    fn continuous_chain() -> Model {
        Model::from_description(&ModelDescription::pendulum_chain(
            2,
            0.5,
            1.0,
            JointKind::Continuous,
        ))
        .expect("valid model")
    }

    #[test]
    fn integrate_zero_tangent_is_identity() {
        let model = continuous_chain();
        let q = model
            .integrate(model.neutral().as_slice(), &[0.4, -2.0])
            .expect("integrate");
        let same = model.integrate(q.as_slice(), &[0.0, 0.0]).expect("integrate");
        assert!((same - &q).norm() < 1e-15);
    }

    #[test]
    fn difference_inverts_integrate() {
        let model = continuous_chain();
        let q0 = model
            .integrate(model.neutral().as_slice(), &[2.9, -0.3])
            .expect("integrate");
        let v = [0.7, -1.1];
        let q1 = model.integrate(q0.as_slice(), &v).expect("integrate");
        let dv = model.difference(q0.as_slice(), q1.as_slice()).expect("difference");
        assert!((dv[0] - v[0]).abs() < 1e-12);
        assert!((dv[1] - v[1]).abs() < 1e-12);
    }

    #[test]
    fn difference_wraps_across_pi() {
        let model = continuous_chain();
        let q0 = model
            .integrate(model.neutral().as_slice(), &[3.0, 0.0])
            .expect("integrate");
        let q1 = model
            .integrate(model.neutral().as_slice(), &[-3.0, 0.0])
            .expect("integrate");
        let dv = model.difference(q0.as_slice(), q1.as_slice()).expect("difference");
        let expected = 2.0 * std::f64::consts::PI - 6.0;
        assert!((dv[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn d_difference_matches_finite_differences() {
        let model = continuous_chain();
        let q0 = model.integrate(model.neutral().as_slice(), &[0.3, 1.2]).expect("q0");
        let q1 = model.integrate(model.neutral().as_slice(), &[-0.5, 2.0]).expect("q1");
        let h = 1e-6;

        for (arg, base_is_q0) in [(ArgumentPosition::Arg0, true), (ArgumentPosition::Arg1, false)] {
            let jac = model
                .d_difference(q0.as_slice(), q1.as_slice(), arg)
                .expect("jacobian");
            for k in 0..model.nv {
                let mut step = vec![0.0; model.nv];
                step[k] = h;
                let plus_step = step.clone();
                step[k] = -h;
                let minus_step = step;
                let eval = |s: &[f64]| {
                    if base_is_q0 {
                        let q = model.integrate(q0.as_slice(), s).expect("integrate");
                        model.difference(q.as_slice(), q1.as_slice()).expect("difference")
                    } else {
                        let q = model.integrate(q1.as_slice(), s).expect("integrate");
                        model.difference(q0.as_slice(), q.as_slice()).expect("difference")
                    }
                };
                let column = (eval(&plus_step) - eval(&minus_step)) / (2.0 * h);
                for i in 0..model.nv {
                    assert!((jac[(i, k)] - column[i]).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn normalize_projects_onto_unit_circle() {
        let model = continuous_chain();
        let mut q = vec![2.0, 0.0, 0.0, -0.5];
        model.normalize(&mut q).expect("normalize");
        assert_eq!(q, vec![1.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let model = continuous_chain();
        let err = model.integrate(&[1.0, 0.0], &[0.0, 0.0]).expect_err("short q");
        assert!(matches!(
            err,
            ModelError::Dimension {
                expected: 4,
                actual: 2,
                ..
            }
        ));
    }
}
