//! Recursive Newton-Euler Algorithm (RNEA): inverse dynamics.
//!
//! Given (q, v, a), compute the joint forces tau.

use crate::data::{Data, Workspace};
use crate::error::ModelError;
use crate::model::Model;
use crate::spatial::Motion;
use crate::traits::Scalar;
use nalgebra::DVector;

/// Run RNEA and return the joint forces stored in `data.tau`.
pub fn rnea<'a>(
    model: &Model,
    data: &'a mut Data,
    q: &[f64],
    v: &[f64],
    a: &[f64],
) -> Result<&'a DVector<f64>, ModelError> {
    ModelError::check_len("configuration", model.nq, q.len())?;
    ModelError::check_len("velocity", model.nv, v.len())?;
    ModelError::check_len("acceleration", model.nv, a.len())?;
    rnea_pass(model, &mut data.ws, q, v, a, data.tau.as_mut_slice());
    Ok(&data.tau)
}

/// Scalar-generic RNEA core. Sizes are the caller's responsibility.
pub(crate) fn rnea_pass<T: Scalar>(
    model: &Model,
    ws: &mut Workspace<T>,
    q: &[T],
    v: &[T],
    a: &[T],
    tau: &mut [T],
) {
    let a0: Motion<T> = model.base_acceleration();

    // ── Forward pass: velocities, accelerations, body forces ──
    for (i, body) in model.bodies.iter().enumerate() {
        let joint = &body.joint;
        let x = joint.body_transform(&q[joint.idx_q..joint.idx_q + joint.nq()]);
        ws.x_tree[i] = x;

        let (v_joint, a_joint) = match joint.motion_subspace::<T>() {
            Some(s) => (s.scale(v[joint.idx_v]), s.scale(a[joint.idx_v])),
            None => (Motion::zero(), Motion::zero()),
        };

        let (v_parent, a_parent) = match body.parent {
            Some(p) => (ws.vel[p], ws.acc[p]),
            None => (Motion::zero(), a0),
        };

        let vel = x.apply_motion(&v_parent) + v_joint;
        let acc = x.apply_motion(&a_parent) + a_joint + vel.cross_motion(&v_joint);

        let inertia = body.inertia.cast::<T>();
        ws.force[i] = inertia.mul_motion(&acc) + vel.cross_force(&inertia.mul_motion(&vel));
        ws.vel[i] = vel;
        ws.acc[i] = acc;
    }

    // ── Backward pass: project onto joints, accumulate into parents ──
    for (i, body) in model.bodies.iter().enumerate().rev() {
        let joint = &body.joint;
        if let Some(s) = joint.motion_subspace::<T>() {
            tau[joint.idx_v] = s.dot(&ws.force[i]);
        }
        if let Some(p) = body.parent {
            let f = ws.x_tree[i].inv_apply_force(&ws.force[i]);
            ws.force[p] = ws.force[p] + f;
        }
    }
}
