//! Typed solver parameters.
//!
//! Every field is validated once, when a solver is built from its config; the
//! per-step paths never re-check parameters.

use crate::articulated::ArticulatedDynamicsSolver;
use crate::cartpole::CartpoleDynamicsSolver;
use crate::error::{DynamicsError, Result};
use crate::manifold::AngleWrapping;
use crate::solver::DynamicsSolver;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DT: f64 = 0.01;
pub const DEFAULT_GRAVITY: f64 = 9.81;

fn default_dt() -> f64 {
    DEFAULT_DT
}

fn default_gravity() -> f64 {
    DEFAULT_GRAVITY
}

fn default_unit() -> f64 {
    1.0
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::configuration(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartpoleConfig {
    #[serde(default = "default_unit")]
    pub cart_mass: f64,
    #[serde(default = "default_unit")]
    pub pole_mass: f64,
    #[serde(default = "default_unit")]
    pub pole_length: f64,
    /// Magnitude of gravitational acceleration.
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Differencing rule for the pole angle in `state_delta`.
    #[serde(default)]
    pub angle_wrapping: AngleWrapping,
}

impl Default for CartpoleConfig {
    fn default() -> Self {
        Self {
            cart_mass: 1.0,
            pole_mass: 1.0,
            pole_length: 1.0,
            gravity: DEFAULT_GRAVITY,
            dt: DEFAULT_DT,
            angle_wrapping: AngleWrapping::Algebraic,
        }
    }
}

impl CartpoleConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("cart_mass", self.cart_mass)?;
        check_positive("pole_mass", self.pole_mass)?;
        check_positive("pole_length", self.pole_length)?;
        check_positive("dt", self.dt)?;
        if !self.gravity.is_finite() {
            return Err(DynamicsError::configuration("gravity must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticulatedConfig {
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Overrides the gravity vector of the bound model description.
    #[serde(default)]
    pub gravity: Option<[f64; 3]>,
}

impl Default for ArticulatedConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            gravity: None,
        }
    }
}

impl ArticulatedConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("dt", self.dt)?;
        if let Some(g) = self.gravity {
            if !g.iter().all(|x| x.is_finite()) {
                return Err(DynamicsError::configuration("gravity must be finite"));
            }
        }
        Ok(())
    }
}

/// Configuration of any built-in solver, tagged by its registry name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolverConfig {
    #[serde(rename = "CartpoleDynamicsSolver")]
    Cartpole(CartpoleConfig),
    #[serde(rename = "ArticulatedDynamicsSolver")]
    Articulated(ArticulatedConfig),
}

impl SolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DynamicsError::configuration(format!("invalid solver config: {e}")))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Cartpole(_) => CartpoleDynamicsSolver::TYPE_NAME,
            Self::Articulated(_) => ArticulatedDynamicsSolver::TYPE_NAME,
        }
    }

    /// Validate and construct an unbound solver.
    pub fn build(self) -> Result<Box<dyn DynamicsSolver>> {
        Ok(match self {
            Self::Cartpole(config) => Box::new(CartpoleDynamicsSolver::new(config)?),
            Self::Articulated(config) => Box::new(ArticulatedDynamicsSolver::new(config)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: CartpoleConfig =
            serde_json::from_str(r#"{ "pole_length": 0.5 }"#).expect("valid config");
        assert_eq!(config.pole_length, 0.5);
        assert_eq!(config.cart_mass, 1.0);
        assert_eq!(config.dt, DEFAULT_DT);
        assert_eq!(config.angle_wrapping, AngleWrapping::Algebraic);
        config.validate().expect("valid");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<CartpoleConfig>(r#"{ "pole_lenght": 0.5 }"#)
            .expect_err("typo");
        assert!(err.to_string().contains("pole_lenght"));
    }

    #[test]
    fn validation_rejects_non_physical_values() {
        let config = CartpoleConfig {
            pole_mass: 0.0,
            ..CartpoleConfig::default()
        };
        let err = config.validate().expect_err("zero mass");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("pole_mass"));

        let config = ArticulatedConfig {
            dt: f64::NAN,
            gravity: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn tagged_config_builds_named_solver() {
        let config = SolverConfig::from_json_str(
            r#"{ "type": "CartpoleDynamicsSolver", "cart_mass": 2.0, "angle_wrapping": "geodesic" }"#,
        )
        .expect("valid config");
        assert_eq!(config.type_name(), "CartpoleDynamicsSolver");
        let solver = config.build().expect("buildable");
        assert_eq!(solver.type_name(), "CartpoleDynamicsSolver");
        assert!(solver.dimensions().is_none());

        let err = SolverConfig::from_json_str(r#"{ "type": "QuadrotorDynamicsSolver" }"#)
            .expect_err("unknown type");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn build_validates() {
        let config = SolverConfig::Articulated(ArticulatedConfig {
            dt: -1.0,
            gravity: None,
        });
        assert!(config.build().is_err());
    }
}
