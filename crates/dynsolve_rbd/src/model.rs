//! Static articulated-body model built from a [`ModelDescription`].

use crate::description::{JointKind, ModelDescription};
use crate::error::ModelError;
use crate::spatial::{axis_rotation, Inertia, Motion, Transform};
use crate::traits::Scalar;
use nalgebra::{Matrix3, Rotation3, Vector3};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,
    pub kind: JointKind,
    /// Unit axis in the joint frame.
    pub axis: Vector3<f64>,
    /// Parent body frame -> joint frame (before joint motion).
    pub placement: Transform<f64>,
    /// Offset of this joint's block in the configuration vector.
    pub idx_q: usize,
    /// Offset of this joint's block in the velocity vector.
    pub idx_v: usize,
}

impl Joint {
    pub fn nq(&self) -> usize {
        self.kind.nq()
    }

    pub fn nv(&self) -> usize {
        self.kind.nv()
    }

    /// Joint motion transform for this joint's configuration block `q`.
    pub fn joint_transform<T: Scalar>(&self, q: &[T]) -> Transform<T> {
        let axis = self.axis.map(T::from_f64);
        match self.kind {
            JointKind::Revolute => {
                Transform::from_rotation(axis_rotation(&axis, q[0].cos(), q[0].sin()).transpose())
            }
            JointKind::Continuous => {
                Transform::from_rotation(axis_rotation(&axis, q[0], q[1]).transpose())
            }
            JointKind::Prismatic => Transform::from_translation(axis * q[0]),
            JointKind::Fixed => Transform::identity(),
        }
    }

    /// Parent body frame -> child body frame for configuration block `q`.
    pub fn body_transform<T: Scalar>(&self, q: &[T]) -> Transform<T> {
        self.joint_transform(q).compose(&self.placement.cast())
    }

    /// Motion subspace column `S`; `None` for joints without degrees of freedom.
    pub fn motion_subspace<T: Scalar>(&self) -> Option<Motion<T>> {
        let axis = self.axis.map(T::from_f64);
        match self.kind {
            JointKind::Revolute | JointKind::Continuous => {
                Some(Motion::new(axis, Vector3::zeros()))
            }
            JointKind::Prismatic => Some(Motion::new(Vector3::zeros(), axis)),
            JointKind::Fixed => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub name: String,
    /// Index of the parent body; `None` for bodies attached to the world.
    pub parent: Option<usize>,
    pub joint: Joint,
    pub inertia: Inertia<f64>,
}

/// Fixed-base articulated model. Bodies are stored in topological order
/// (every parent precedes its children).
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub gravity: Vector3<f64>,
    pub bodies: Vec<Body>,
    pub nq: usize,
    pub nv: usize,
}

impl Model {
    pub fn from_description(description: &ModelDescription) -> Result<Self, ModelError> {
        if !description.gravity.iter().all(|g| g.is_finite()) {
            return Err(ModelError::description("gravity must be finite"));
        }

        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut bodies = Vec::with_capacity(description.bodies.len());
        let (mut nq, mut nv) = (0usize, 0usize);

        for (i, body) in description.bodies.iter().enumerate() {
            if index_of.insert(body.name.as_str(), i).is_some() {
                return Err(ModelError::description(format!(
                    "duplicate body name '{}'",
                    body.name
                )));
            }

            let parent = match &body.parent {
                None => None,
                Some(name) => Some(*index_of.get(name.as_str()).ok_or_else(|| {
                    ModelError::description(format!(
                        "body '{}' references parent '{}' which is not declared before it",
                        body.name, name
                    ))
                })?),
            };

            let joint = &body.joint;
            let axis = Vector3::from(joint.axis);
            let axis_norm = axis.norm();
            if joint.kind != JointKind::Fixed && !(axis_norm.is_finite() && axis_norm > 1e-12) {
                return Err(ModelError::description(format!(
                    "joint '{}' has a degenerate axis",
                    joint.name
                )));
            }
            let axis = if joint.kind == JointKind::Fixed {
                Vector3::zeros()
            } else {
                axis / axis_norm
            };

            let [roll, pitch, yaw] = joint.origin.rpy;
            let orientation = Rotation3::from_euler_angles(roll, pitch, yaw).into_inner();
            let placement = Transform::new(orientation.transpose(), Vector3::from(joint.origin.xyz));

            let inertia = build_inertia(&body.name, &body.inertial)?;

            bodies.push(Body {
                name: body.name.clone(),
                parent,
                joint: Joint {
                    name: joint.name.clone(),
                    kind: joint.kind,
                    axis,
                    placement,
                    idx_q: nq,
                    idx_v: nv,
                },
                inertia,
            });
            nq += joint.kind.nq();
            nv += joint.kind.nv();
        }

        if nv == 0 {
            return Err(ModelError::description(
                "model has no movable joints",
            ));
        }

        debug!(
            model = %description.name,
            bodies = bodies.len(),
            nq,
            nv,
            "built articulated model"
        );

        Ok(Self {
            name: description.name.clone(),
            gravity: Vector3::from(description.gravity),
            bodies,
            nq,
            nv,
        })
    }

    pub fn nbodies(&self) -> usize {
        self.bodies.len()
    }

    /// Spatial acceleration of the fixed base that emulates gravity.
    pub fn base_acceleration<T: Scalar>(&self) -> Motion<T> {
        Motion::new(Vector3::zeros(), -self.gravity.map(T::from_f64))
    }

    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.bodies.iter().map(|b| &b.joint)
    }
}

fn build_inertia(
    body: &str,
    inertial: &crate::description::InertialDescription,
) -> Result<Inertia<f64>, ModelError> {
    let [ixx, ixy, ixz, iyy, iyz, izz] = inertial.inertia;
    let values = std::iter::once(inertial.mass)
        .chain(inertial.com)
        .chain(inertial.inertia);
    if values.into_iter().any(|v| !v.is_finite()) {
        return Err(ModelError::description(format!(
            "body '{body}' has non-finite inertial parameters"
        )));
    }
    if inertial.mass <= 0.0 {
        return Err(ModelError::description(format!(
            "body '{body}' must have positive mass, got {}",
            inertial.mass
        )));
    }
    if ixx < 0.0 || iyy < 0.0 || izz < 0.0 {
        return Err(ModelError::description(format!(
            "body '{body}' has negative principal inertia"
        )));
    }
    let rotational = Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz);
    Ok(Inertia::new(inertial.mass, Vector3::from(inertial.com), rotational))
}
