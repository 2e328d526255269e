//! Articulated Body Algorithm (ABA): O(n) forward dynamics.
//!
//! Given (q, v, tau), compute ddq in three passes over the kinematic tree:
//! 1. Forward pass: body transforms, velocities, velocity-product terms
//! 2. Backward pass: articulated inertias and bias forces
//! 3. Forward pass: accelerations

use crate::data::Data;
use crate::error::ModelError;
use crate::model::Model;
use crate::spatial::Motion;
use nalgebra::{DVector, Vector6};

/// Run ABA and return the joint accelerations stored in `data.ddq`.
pub fn aba<'a>(
    model: &Model,
    data: &'a mut Data,
    q: &[f64],
    v: &[f64],
    tau: &[f64],
) -> Result<&'a DVector<f64>, ModelError> {
    ModelError::check_len("configuration", model.nq, q.len())?;
    ModelError::check_len("velocity", model.nv, v.len())?;
    ModelError::check_len("joint force", model.nv, tau.len())?;

    let ws = &mut data.ws;
    let scratch = &mut data.articulated;

    // -- Pass 1: Forward -- velocities and bias --
    for (i, body) in model.bodies.iter().enumerate() {
        let joint = &body.joint;
        let x = joint.body_transform(&q[joint.idx_q..joint.idx_q + joint.nq()]);
        ws.x_tree[i] = x;

        let v_joint = match joint.motion_subspace::<f64>() {
            Some(s) => s.scale(v[joint.idx_v]),
            None => Motion::zero(),
        };
        let v_parent = match body.parent {
            Some(p) => ws.vel[p],
            None => Motion::zero(),
        };
        let vel = x.apply_motion(&v_parent) + v_joint;
        ws.vel[i] = vel;

        scratch.coriolis[i] = vel.cross_motion(&v_joint).to_vector();
        scratch.inertia[i] = body.inertia.to_matrix();
        scratch.bias[i] = vel.cross_force(&body.inertia.mul_motion(&vel)).to_vector();
    }

    // -- Pass 2: Backward -- articulated inertias and forces --
    for (i, body) in model.bodies.iter().enumerate().rev() {
        let joint = &body.joint;
        let ia = scratch.inertia[i];

        let (ia_child, pa_child) = match joint.motion_subspace::<f64>() {
            Some(s) => {
                let s = s.to_vector();
                let u_vec = ia * s;
                let d = s.dot(&u_vec);
                let u = tau[joint.idx_v] - s.dot(&scratch.bias[i]);
                scratch.u_vec[i] = u_vec;
                scratch.d[i] = d;
                scratch.u[i] = u;

                let ia_new = ia - u_vec * u_vec.transpose() / d;
                let pa_new = scratch.bias[i] + ia_new * scratch.coriolis[i] + u_vec * (u / d);
                (ia_new, pa_new)
            }
            None => (ia, scratch.bias[i] + ia * scratch.coriolis[i]),
        };

        if let Some(p) = body.parent {
            let x = ws.x_tree[i].motion_matrix();
            scratch.inertia[p] += x.transpose() * ia_child * x;
            scratch.bias[p] += x.transpose() * pa_child;
        }
    }

    // -- Pass 3: Forward -- accelerations --
    let a0 = model.base_acceleration::<f64>();
    for (i, body) in model.bodies.iter().enumerate() {
        let joint = &body.joint;
        let a_parent = match body.parent {
            Some(p) => ws.acc[p],
            None => a0,
        };
        let a_prime: Vector6<f64> =
            ws.x_tree[i].apply_motion(&a_parent).to_vector() + scratch.coriolis[i];

        let acc = match joint.motion_subspace::<f64>() {
            Some(s) => {
                let s = s.to_vector();
                let qdd = (scratch.u[i] - scratch.u_vec[i].dot(&a_prime)) / scratch.d[i];
                data.ddq[joint.idx_v] = qdd;
                a_prime + s * qdd
            }
            None => a_prime,
        };
        ws.acc[i] = Motion::from_vector(&acc);
    }

    Ok(&data.ddq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crba::crba;
    use crate::description::{JointKind, ModelDescription};
    use crate::rnea::rnea;
    use approx::assert_relative_eq;

    fn three_link(kind: JointKind) -> Model {
        let mut description = ModelDescription::pendulum_chain(3, 0.7, 1.3, kind);
        description.bodies[1].joint.axis = [1.0, 0.0, 0.0];
        description.bodies[2].joint.origin.rpy = [0.2, 0.0, -0.4];
        Model::from_description(&description).expect("valid model")
    }

    #[test]
    fn aba_inverts_rnea() {
        let model = three_link(JointKind::Revolute);
        let mut data = Data::new(&model);
        let q = [0.3, -0.8, 1.4];
        let v = [0.5, 1.0, -0.7];
        let tau = [1.0, -2.0, 0.25];

        let ddq = aba(&model, &mut data, &q, &v, &tau).expect("aba").clone();
        let tau_back = rnea(&model, &mut data, &q, &v, ddq.as_slice()).expect("rnea");
        assert_relative_eq!(tau_back.as_slice(), &tau[..], epsilon = 1e-9);
    }

    #[test]
    fn aba_matches_mass_matrix_solve() {
        let model = three_link(JointKind::Revolute);
        let mut data = Data::new(&model);
        let q = [-1.1, 0.4, 0.9];
        let v = [0.2, -0.3, 0.8];
        let tau = DVector::from_column_slice(&[0.5, 0.5, -1.0]);

        let bias = rnea(&model, &mut data, &q, &v, &[0.0; 3]).expect("rnea").clone();
        let mass = crba(&model, &mut data, &q).expect("crba").clone();
        let expected = mass.lu().solve(&(&tau - bias)).expect("invertible");
        let ddq = aba(&model, &mut data, &q, &v, tau.as_slice()).expect("aba");
        assert_relative_eq!(*ddq, expected, epsilon = 1e-9);
    }

    #[test]
    fn fixed_joints_are_transparent() {
        // A rigid extension welded to the first link behaves like extra mass on it.
        let mut description = ModelDescription::pendulum_chain(2, 0.5, 1.0, JointKind::Revolute);
        description.bodies[1].joint.kind = JointKind::Fixed;
        let model = Model::from_description(&description).expect("valid model");
        assert_eq!(model.nv, 1);

        let mut data = Data::new(&model);
        let q = [0.4];
        let ddq = aba(&model, &mut data, &q, &[0.0], &[0.0]).expect("aba")[0];
        let tau = rnea(&model, &mut data, &q, &[0.0], &[ddq]).expect("rnea")[0];
        assert!(tau.abs() < 1e-10);
    }
}
