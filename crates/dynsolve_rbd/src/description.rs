//! Serializable kinematic/inertial description consumed by [`Model::from_description`].
//!
//! The layout follows URDF conventions: every body is attached to its parent by
//! exactly one joint, the joint frame is placed by an `origin` (translation plus
//! roll/pitch/yaw) relative to the parent body frame, and the body frame coincides
//! with the joint frame.
//!
//! [`Model::from_description`]: crate::model::Model::from_description

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointKind {
    /// Bounded rotation about `axis`; configuration is the angle.
    Revolute,
    /// Unbounded rotation about `axis`; configuration is `(cos, sin)` of the angle.
    Continuous,
    /// Translation along `axis`.
    Prismatic,
    /// Rigid attachment, no degrees of freedom.
    Fixed,
}

impl JointKind {
    pub fn nq(self) -> usize {
        match self {
            JointKind::Revolute | JointKind::Prismatic => 1,
            JointKind::Continuous => 2,
            JointKind::Fixed => 0,
        }
    }

    pub fn nv(self) -> usize {
        match self {
            JointKind::Revolute | JointKind::Prismatic | JointKind::Continuous => 1,
            JointKind::Fixed => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Origin {
    #[serde(default)]
    pub xyz: [f64; 3],
    #[serde(default)]
    pub rpy: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointDescription {
    pub name: String,
    pub kind: JointKind,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],
}

impl JointDescription {
    pub fn new(name: impl Into<String>, kind: JointKind, axis: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            kind,
            origin: Origin::default(),
            axis,
        }
    }

    pub fn at(mut self, xyz: [f64; 3]) -> Self {
        self.origin.xyz = xyz;
        self
    }

    pub fn rotated(mut self, rpy: [f64; 3]) -> Self {
        self.origin.rpy = rpy;
        self
    }
}

/// Mass properties of a body. `inertia` holds `[ixx, ixy, ixz, iyy, iyz, izz]`
/// about the centre of mass, in the body frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InertialDescription {
    pub mass: f64,
    #[serde(default)]
    pub com: [f64; 3],
    #[serde(default)]
    pub inertia: [f64; 6],
}

impl InertialDescription {
    /// A point mass located at `com`.
    pub fn point_mass(mass: f64, com: [f64; 3]) -> Self {
        Self {
            mass,
            com,
            inertia: [0.0; 6],
        }
    }

    /// A thin rod of length `length` hanging along `-z` from the joint.
    pub fn rod(mass: f64, length: f64) -> Self {
        let i = mass * length * length / 12.0;
        Self {
            mass,
            com: [0.0, 0.0, -0.5 * length],
            inertia: [i, 0.0, 0.0, i, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyDescription {
    pub name: String,
    /// Parent body name; `None` attaches the body to the fixed world frame.
    #[serde(default)]
    pub parent: Option<String>,
    pub joint: JointDescription,
    #[serde(default)]
    pub inertial: InertialDescription,
}

impl BodyDescription {
    pub fn new(
        name: impl Into<String>,
        parent: Option<&str>,
        joint: JointDescription,
        inertial: InertialDescription,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_owned),
            joint,
            inertial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    pub name: String,
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
    pub bodies: Vec<BodyDescription>,
}

impl ModelDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gravity: default_gravity(),
            bodies: Vec::new(),
        }
    }

    pub fn with_gravity(mut self, gravity: [f64; 3]) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_body(mut self, body: BodyDescription) -> Self {
        self.bodies.push(body);
        self
    }

    /// Number of joints carrying at least one degree of freedom.
    pub fn num_movable_joints(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| b.joint.kind != JointKind::Fixed)
            .count()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Cart sliding along `x` carrying a point-mass pole of length `pole_length`
    /// swinging in the `x-z` plane; pole angle zero hangs straight down.
    pub fn cart_pole(cart_mass: f64, pole_mass: f64, pole_length: f64, pole: JointKind) -> Self {
        Self::new("cart_pole")
            .with_body(BodyDescription::new(
                "cart",
                None,
                JointDescription::new("slider", JointKind::Prismatic, [1.0, 0.0, 0.0]),
                InertialDescription::point_mass(cart_mass, [0.0; 3]),
            ))
            .with_body(BodyDescription::new(
                "pole",
                Some("cart"),
                JointDescription::new("hinge", pole, [0.0, -1.0, 0.0]),
                InertialDescription::point_mass(pole_mass, [0.0, 0.0, -pole_length]),
            ))
    }

    /// Planar chain of `links` rods of equal length hinged about `y`.
    pub fn pendulum_chain(links: usize, length: f64, mass: f64, kind: JointKind) -> Self {
        let mut description = Self::new(format!("chain_{links}"));
        for i in 0..links {
            let name = format!("link_{i}");
            let parent = (i > 0).then(|| format!("link_{}", i - 1));
            let offset = if i == 0 { 0.0 } else { -length };
            description.bodies.push(BodyDescription {
                name,
                parent,
                joint: JointDescription::new(format!("joint_{i}"), kind, [0.0, 1.0, 0.0])
                    .at([0.0, 0.0, offset]),
                inertial: InertialDescription::rod(mass, length),
            });
        }
        description
    }
}

fn default_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

fn default_gravity() -> [f64; 3] {
    [0.0, 0.0, -9.81]
}
