//! Kinematic description collaborator handed to `assign_scene`.

use anyhow::{Context, Result};
use dynsolve_rbd::ModelDescription;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base topology declared by a kinematic description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    #[default]
    Fixed,
    Planar,
    Floating,
}

/// What a solver may ask of the scene it is bound to.
pub trait KinematicDescription {
    /// Number of actuated degrees of freedom.
    fn num_controlled_joints(&self) -> usize;

    fn base_type(&self) -> BaseType;

    /// Description consumable by the engine's model builder.
    fn model_description(&self) -> &ModelDescription;
}

/// Plain [`KinematicDescription`] holding its three items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scene {
    pub num_controlled_joints: usize,
    #[serde(default)]
    pub base_type: BaseType,
    pub model: ModelDescription,
}

impl Scene {
    pub fn new(num_controlled_joints: usize, base_type: BaseType, model: ModelDescription) -> Self {
        Self {
            num_controlled_joints,
            base_type,
            model,
        }
    }

    /// Fixed-base scene controlling every movable joint of `model`.
    pub fn from_description(model: ModelDescription) -> Self {
        Self::new(model.num_movable_joints(), BaseType::Fixed, model)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse scene description")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("Invalid scene file {}", path.display()))
    }
}

impl KinematicDescription for Scene {
    fn num_controlled_joints(&self) -> usize {
        self.num_controlled_joints
    }

    fn base_type(&self) -> BaseType {
        self.base_type
    }

    fn model_description(&self) -> &ModelDescription {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynsolve_rbd::JointKind;

    #[test]
    fn from_description_counts_movable_joints() {
        let mut model = ModelDescription::pendulum_chain(3, 1.0, 1.0, JointKind::Revolute);
        model.bodies[1].joint.kind = JointKind::Fixed;
        let scene = Scene::from_description(model);
        assert_eq!(scene.num_controlled_joints(), 2);
        assert_eq!(scene.base_type(), BaseType::Fixed);
    }

    #[test]
    fn parses_scene_json() {
        let json = r#"{
            "num_controlled_joints": 1,
            "base_type": "floating",
            "model": {
                "name": "arm",
                "bodies": [
                    {
                        "name": "link",
                        "joint": { "name": "j", "kind": "revolute", "axis": [0.0, 1.0, 0.0] },
                        "inertial": { "mass": 1.0 }
                    }
                ]
            }
        }"#;
        let scene = Scene::from_json_str(json).expect("valid scene");
        assert_eq!(scene.base_type, BaseType::Floating);
        assert_eq!(scene.model_description().bodies.len(), 1);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Scene::from_json_file("/nonexistent/scene.json").expect_err("missing file");
        assert!(format!("{err}").contains("/nonexistent/scene.json"));
    }
}
