//! Partial derivatives of forward dynamics.
//!
//! Forward dynamics satisfies `RNEA(q, v, ABA(q, v, tau)) = tau`. Differentiating
//! that identity gives
//!
//! ```text
//! ∂ddq/∂q   = -M⁻¹ ∂RNEA/∂q |_(a = ddq)
//! ∂ddq/∂v   = -M⁻¹ ∂RNEA/∂v |_(a = ddq)
//! ∂ddq/∂tau =  M⁻¹
//! ```
//!
//! The RNEA partials are exact directional derivatives obtained by running the
//! scalar-generic RNEA on dual numbers, one tangent direction at a time.
//! Configuration directions are applied through [`Model::integrate_into`] so the
//! result is expressed in tangent coordinates even for manifold joints.

use crate::aba::aba;
use crate::autodiff::Dual;
use crate::crba::crba;
use crate::data::Data;
use crate::error::ModelError;
use crate::model::Model;
use crate::rnea::rnea_pass;
use tracing::trace;

/// Compute `ddq`, `ddq_dq`, `ddq_dv` and `minv` (= `∂ddq/∂tau`) in one call.
pub fn compute_aba_derivatives(
    model: &Model,
    data: &mut Data,
    q: &[f64],
    v: &[f64],
    tau: &[f64],
) -> Result<(), ModelError> {
    aba(model, data, q, v, tau)?;
    crba(model, data, q)?;

    data.minv = data
        .mass_matrix
        .clone()
        .cholesky()
        .ok_or(ModelError::Singular)?
        .inverse();

    let nv = model.nv;
    let dual = &mut data.dual;
    for (slot, &value) in dual.a.iter_mut().zip(data.ddq.iter()) {
        *slot = Dual::constant(value);
    }
    let q_const: Vec<Dual> = q.iter().map(|&x| Dual::constant(x)).collect();

    // ∂RNEA/∂q along each tangent direction.
    for k in 0..nv {
        dual.tangent.fill(Dual::constant(0.0));
        dual.tangent[k] = Dual::variable(0.0);
        model.integrate_into(q_const.as_slice(), dual.tangent.as_slice(), dual.q.as_mut_slice());
        for (slot, &value) in dual.v.iter_mut().zip(v) {
            *slot = Dual::constant(value);
        }
        rnea_pass(
            model,
            &mut data.dual_ws,
            dual.q.as_slice(),
            dual.v.as_slice(),
            dual.a.as_slice(),
            dual.tau.as_mut_slice(),
        );
        for (i, t) in dual.tau.iter().enumerate() {
            data.dtau_dq[(i, k)] = t.eps;
        }
    }

    // ∂RNEA/∂v.
    dual.q.copy_from_slice(&q_const);
    for k in 0..nv {
        for (j, (slot, &value)) in dual.v.iter_mut().zip(v).enumerate() {
            *slot = if j == k {
                Dual::variable(value)
            } else {
                Dual::constant(value)
            };
        }
        rnea_pass(
            model,
            &mut data.dual_ws,
            dual.q.as_slice(),
            dual.v.as_slice(),
            dual.a.as_slice(),
            dual.tau.as_mut_slice(),
        );
        for (i, t) in dual.tau.iter().enumerate() {
            data.dtau_dv[(i, k)] = t.eps;
        }
    }

    data.ddq_dq = -(&data.minv * &data.dtau_dq);
    data.ddq_dv = -(&data.minv * &data.dtau_dv);

    trace!(model = %model.name, nv, "computed forward-dynamics derivatives");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{JointKind, ModelDescription};
    use nalgebra::DMatrix;

    /// Central differences of ABA in tangent coordinates.
    fn finite_difference(
        model: &Model,
        q: &[f64],
        v: &[f64],
        tau: &[f64],
    ) -> (DMatrix<f64>, DMatrix<f64>, DMatrix<f64>) {
        let h = 1e-6;
        let nv = model.nv;
        let mut data = Data::new(model);
        let mut eval = |q: &[f64], v: &[f64], tau: &[f64]| {
            aba(model, &mut data, q, v, tau).expect("aba").clone()
        };
        let mut dq = DMatrix::zeros(nv, nv);
        let mut dv = DMatrix::zeros(nv, nv);
        let mut dtau = DMatrix::zeros(nv, nv);
        for k in 0..nv {
            let mut step = vec![0.0; nv];
            step[k] = h;
            let q_plus = model.integrate(q, &step).expect("integrate");
            step[k] = -h;
            let q_minus = model.integrate(q, &step).expect("integrate");
            dq.set_column(
                k,
                &((eval(q_plus.as_slice(), v, tau) - eval(q_minus.as_slice(), v, tau)) / (2.0 * h)),
            );

            let mut v_plus = v.to_vec();
            let mut v_minus = v.to_vec();
            v_plus[k] += h;
            v_minus[k] -= h;
            dv.set_column(k, &((eval(q, &v_plus, tau) - eval(q, &v_minus, tau)) / (2.0 * h)));

            let mut t_plus = tau.to_vec();
            let mut t_minus = tau.to_vec();
            t_plus[k] += h;
            t_minus[k] -= h;
            dtau.set_column(k, &((eval(q, v, &t_plus) - eval(q, v, &t_minus)) / (2.0 * h)));
        }
        (dq, dv, dtau)
    }

    fn check_against_finite_differences(model: &Model, q: &[f64], v: &[f64], tau: &[f64]) {
        let mut data = Data::new(model);
        compute_aba_derivatives(model, &mut data, q, v, tau).expect("derivatives");
        let (dq, dv, dtau) = finite_difference(model, q, v, tau);
        assert!((&data.ddq_dq - dq).amax() < 1e-5, "ddq_dq mismatch");
        assert!((&data.ddq_dv - dv).amax() < 1e-5, "ddq_dv mismatch");
        assert!((&data.minv - dtau).amax() < 1e-5, "ddq_dtau mismatch");
    }

    #[test]
    fn revolute_chain_matches_finite_differences() {
        let mut description = ModelDescription::pendulum_chain(3, 0.6, 1.1, JointKind::Revolute);
        description.bodies[2].joint.axis = [1.0, 0.0, 0.0];
        let model = Model::from_description(&description).expect("valid model");
        check_against_finite_differences(
            &model,
            &[0.4, -1.2, 0.7],
            &[1.0, 0.3, -0.6],
            &[0.2, -0.1, 0.5],
        );
    }

    #[test]
    fn continuous_joints_use_tangent_directions() {
        let model = Model::from_description(&ModelDescription::cart_pole(
            1.0,
            0.3,
            0.8,
            JointKind::Continuous,
        ))
        .expect("valid model");
        let angle: f64 = 2.2;
        let q = [0.5, angle.cos(), angle.sin()];
        check_against_finite_differences(&model, &q, &[-0.4, 1.5], &[0.7, 0.0]);
    }

    #[test]
    fn derivatives_refresh_acceleration() {
        let model = Model::from_description(&ModelDescription::pendulum_chain(
            2,
            1.0,
            1.0,
            JointKind::Revolute,
        ))
        .expect("valid model");
        let mut data = Data::new(&model);
        let (q, v, tau) = ([0.3, 0.1], [0.0, 0.2], [0.0, 0.0]);
        compute_aba_derivatives(&model, &mut data, &q, &v, &tau).expect("derivatives");
        let from_derivatives = data.ddq.clone();
        let direct = aba(&model, &mut data, &q, &v, &tau).expect("aba");
        assert!((&from_derivatives - direct).norm() < 1e-14);
    }
}
