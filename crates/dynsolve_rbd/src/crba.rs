//! Composite Rigid Body Algorithm (CRBA): joint-space inertia matrix.

use crate::data::Data;
use crate::error::ModelError;
use crate::model::Model;
use nalgebra::DMatrix;

/// Compute the symmetric joint-space inertia `M(q)` into `data.mass_matrix`.
pub fn crba<'a>(model: &Model, data: &'a mut Data, q: &[f64]) -> Result<&'a DMatrix<f64>, ModelError> {
    ModelError::check_len("configuration", model.nq, q.len())?;

    let ws = &mut data.ws;
    let composite = &mut data.articulated.inertia;
    for (i, body) in model.bodies.iter().enumerate() {
        let joint = &body.joint;
        ws.x_tree[i] = joint.body_transform(&q[joint.idx_q..joint.idx_q + joint.nq()]);
        composite[i] = body.inertia.to_matrix();
    }

    // Backward pass: accumulate composite inertias.
    for (i, body) in model.bodies.iter().enumerate().rev() {
        if let Some(p) = body.parent {
            let x = ws.x_tree[i].motion_matrix();
            let folded = x.transpose() * composite[i] * x;
            composite[p] += folded;
        }
    }

    let mass = &mut data.mass_matrix;
    mass.fill(0.0);
    for (i, body) in model.bodies.iter().enumerate() {
        let Some(s_i) = body.joint.motion_subspace::<f64>() else {
            continue;
        };
        let row = body.joint.idx_v;
        let mut f = composite[i] * s_i.to_vector();
        mass[(row, row)] = s_i.to_vector().dot(&f);

        // Off-diagonal entries: walk up the tree.
        let mut j = i;
        while let Some(p) = model.bodies[j].parent {
            f = ws.x_tree[j].motion_matrix().transpose() * f;
            if let Some(s_p) = model.bodies[p].joint.motion_subspace::<f64>() {
                let col = model.bodies[p].joint.idx_v;
                let value = s_p.to_vector().dot(&f);
                mass[(row, col)] = value;
                mass[(col, row)] = value;
            }
            j = p;
        }
    }

    Ok(&data.mass_matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{JointKind, ModelDescription};
    use crate::rnea::rnea;

    #[test]
    fn columns_match_unit_acceleration_rnea() {
        let model = Model::from_description(
            &ModelDescription::pendulum_chain(3, 0.4, 0.9, JointKind::Revolute)
                .with_gravity([0.0, 0.0, 0.0]),
        )
        .expect("valid model");
        let mut data = Data::new(&model);
        let q = [0.2, -0.5, 1.0];
        let mass = crba(&model, &mut data, &q).expect("crba").clone();

        for k in 0..model.nv {
            let mut a = [0.0; 3];
            a[k] = 1.0;
            let column = rnea(&model, &mut data, &q, &[0.0; 3], &a).expect("rnea");
            for i in 0..model.nv {
                assert!((mass[(i, k)] - column[i]).abs() < 1e-12);
            }
        }
        assert!((mass.clone() - mass.transpose()).norm() < 1e-14);
    }
}
