//! Closed-form single pole on a cart.
//!
//! State `x = [x_cart, θ, ẋ, θ̇]`, control `u = [force on the cart]`. The pole
//! hangs straight down at `θ = 0` and is upright at `θ = π`.
//!
//! With `s = sin θ`, `c = cos θ`:
//!
//! ```text
//! ẍ = (u + m_p s (l θ̇² + g c)) / (m_c + m_p s²)
//! θ̈ = -(l m_p c s θ̇² + u c + (m_c + m_p) g s) / (l m_c + l m_p s²)
//! ```
//!
//! The Jacobians are the exact partials of these expressions.

use crate::config::CartpoleConfig;
use crate::error::{DynamicsError, Result};
use crate::manifold::{AngleWrapping, ConfigurationSpace, VectorSpace};
use crate::scene::KinematicDescription;
use crate::solver::{Dimensions, DynamicsSolver};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;
use tracing::debug;

const DIMENSIONS: Dimensions = Dimensions {
    num_positions: 2,
    num_velocities: 2,
    num_controls: 1,
};

#[derive(Debug, Clone)]
pub struct CartpoleDynamicsSolver {
    config: CartpoleConfig,
    space: VectorSpace,
    dims: Option<Dimensions>,
    xdot: DVector<f64>,
    fx: DMatrix<f64>,
    fu: DMatrix<f64>,
}

impl Default for CartpoleDynamicsSolver {
    fn default() -> Self {
        Self::with_valid_config(CartpoleConfig::default())
    }
}

/// Trigonometric terms shared by `f` and its Jacobians.
struct Terms {
    s: f64,
    c: f64,
    tdot: f64,
    u: f64,
    /// `m_c + m_p s²`
    d1: f64,
    /// `l (m_c + m_p s²)`
    d2: f64,
}

impl CartpoleDynamicsSolver {
    pub const TYPE_NAME: &'static str = "CartpoleDynamicsSolver";

    pub fn new(config: CartpoleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: CartpoleConfig) -> Self {
        Self {
            space: VectorSpace::with_wrapping(vec![
                AngleWrapping::Algebraic,
                config.angle_wrapping,
            ]),
            config,
            dims: None,
            xdot: DVector::zeros(0),
            fx: DMatrix::zeros(0, 0),
            fu: DMatrix::zeros(0, 0),
        }
    }

    pub fn config(&self) -> &CartpoleConfig {
        &self.config
    }

    fn terms(&self, x: &[f64], u: &[f64]) -> Result<Terms> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x)?;
        dims.check_control(u)?;
        let CartpoleConfig {
            cart_mass: mc,
            pole_mass: mp,
            pole_length: l,
            ..
        } = self.config;
        let (s, c) = x[1].sin_cos();
        let d1 = mc + mp * s * s;
        Ok(Terms {
            s,
            c,
            tdot: x[3],
            u: u[0],
            d1,
            d2: l * d1,
        })
    }
}

impl DynamicsSolver for CartpoleDynamicsSolver {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn dimensions(&self) -> Option<Dimensions> {
        self.dims
    }

    fn dt(&self) -> f64 {
        self.config.dt
    }

    /// Accepts any description with exactly two controlled joints. The
    /// mechanism itself is not inspected.
    fn assign_scene(&mut self, scene: &dyn KinematicDescription) -> Result<()> {
        if self.dims.is_some() {
            return Err(DynamicsError::configuration(format!(
                "{} is already bound to a scene",
                Self::TYPE_NAME
            )));
        }
        let controlled = scene.num_controlled_joints();
        if controlled != 2 {
            return Err(DynamicsError::configuration(format!(
                "{} expects a scene with 2 controlled joints, got {controlled}",
                Self::TYPE_NAME
            )));
        }

        let ndx = DIMENSIONS.ndx();
        self.xdot = DVector::zeros(ndx);
        self.fx = DMatrix::zeros(ndx, ndx);
        self.fu = DMatrix::zeros(ndx, DIMENSIONS.num_controls);
        self.dims = Some(DIMENSIONS);
        debug!(
            solver = Self::TYPE_NAME,
            scene = %scene.model_description().name,
            nq = DIMENSIONS.num_positions,
            nv = DIMENSIONS.num_velocities,
            nu = DIMENSIONS.num_controls,
            "bound solver to scene"
        );
        Ok(())
    }

    fn configuration_space(&self) -> Result<&dyn ConfigurationSpace> {
        self.bound_dimensions()?;
        Ok(&self.space)
    }

    fn f(&mut self, x: &[f64], u: &[f64]) -> Result<&DVector<f64>> {
        let Terms {
            s,
            c,
            tdot,
            u,
            d1,
            d2,
        } = self.terms(x, u)?;
        let CartpoleConfig {
            cart_mass: mc,
            pole_mass: mp,
            pole_length: l,
            gravity: g,
            ..
        } = self.config;

        self.xdot[0] = x[2];
        self.xdot[1] = tdot;
        self.xdot[2] = (u + mp * s * (l * tdot * tdot + g * c)) / d1;
        self.xdot[3] = -(l * mp * c * s * tdot * tdot + u * c + (mc + mp) * g * s) / d2;
        Ok(&self.xdot)
    }

    fn fx(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>> {
        let Terms {
            s,
            c,
            tdot,
            u,
            d1,
            d2,
        } = self.terms(x, u)?;
        let CartpoleConfig {
            cart_mass: mc,
            pole_mass: mp,
            pole_length: l,
            gravity: g,
            ..
        } = self.config;
        let tdot2 = tdot * tdot;

        let fx = &mut self.fx;
        fx.fill(0.0);
        fx[(0, 2)] = 1.0;
        fx[(1, 3)] = 1.0;

        fx[(2, 1)] = -2.0 * mp * (mp * (g * c + l * tdot2) * s + u) * s * c / (d1 * d1)
            + (-g * mp * s * s + mp * (g * c + l * tdot2) * c) / d1;
        fx[(2, 3)] = 2.0 * l * mp * tdot * s / d1;

        fx[(3, 1)] = -2.0 * l * mp * (-g * (mc + mp) * s - l * mp * tdot2 * s * c - u * c) * s * c
            / (d2 * d2)
            + (-g * (mc + mp) * c + l * mp * tdot2 * s * s - l * mp * tdot2 * c * c + u * s) / d2;
        fx[(3, 3)] = -2.0 * l * mp * tdot * s * c / d2;

        Ok(&self.fx)
    }

    fn fu(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>> {
        let Terms { c, d1, d2, .. } = self.terms(x, u)?;
        self.fu[(0, 0)] = 0.0;
        self.fu[(1, 0)] = 0.0;
        self.fu[(2, 0)] = 1.0 / d1;
        self.fu[(3, 0)] = -c / d2;
        Ok(&self.fu)
    }

    /// Force that zeroes the cart acceleration. The pole channel is
    /// unactuated, so `θ̈` is generally non-zero under this control.
    fn inverse_dynamics(&mut self, x: &[f64]) -> Result<DVector<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x)?;
        let CartpoleConfig {
            pole_mass: mp,
            pole_length: l,
            gravity: g,
            ..
        } = self.config;
        let (s, c) = x[1].sin_cos();
        let tdot = x[3];
        Ok(DVector::from_element(1, -mp * s * (l * tdot * tdot + g * c)))
    }

    /// `(x_cart, π - θ)`: the pole angle measured from upright.
    fn get_position(&self, x: &[f64]) -> Result<DVector<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x)?;
        Ok(DVector::from_column_slice(&[x[0], PI - x[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scene::{BaseType, Scene};
    use dynsolve_rbd::{JointKind, ModelDescription};

    fn scene(controlled: usize) -> Scene {
        Scene::new(
            controlled,
            BaseType::Fixed,
            ModelDescription::cart_pole(1.0, 1.0, 1.0, JointKind::Revolute),
        )
    }

    fn bound(config: CartpoleConfig) -> CartpoleDynamicsSolver {
        let mut solver = CartpoleDynamicsSolver::new(config).expect("valid config");
        solver.assign_scene(&scene(2)).expect("two controlled joints");
        solver
    }

    #[test]
    fn unbound_solver_reports_configuration_error() {
        let mut solver = CartpoleDynamicsSolver::default();
        assert_eq!(solver.num_state(), 0);
        let err = solver.f(&[0.0; 4], &[0.0]).expect_err("not bound");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("not bound"));
    }

    #[test]
    fn rebinding_is_rejected() {
        let mut solver = bound(CartpoleConfig::default());
        let err = solver.assign_scene(&scene(2)).expect_err("second bind");
        assert!(err.to_string().contains("already bound"));
        assert_eq!(solver.dimensions(), Some(DIMENSIONS));
    }

    #[test]
    fn hanging_pole_at_rest_stays_at_rest() {
        let mut solver = bound(CartpoleConfig::default());
        let xdot = solver.f(&[0.3, 0.0, 0.0, 0.0], &[0.0]).expect("f");
        assert!(xdot.iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn pushing_the_cart_swings_the_pole_back() {
        let mut solver = bound(CartpoleConfig::default());
        let xdot = solver.f(&[0.0, 0.0, 0.0, 0.0], &[2.0]).expect("f").clone();
        // m_c = m_p = l = 1: ẍ = u, θ̈ = -u.
        assert!((xdot[2] - 2.0).abs() < 1e-12);
        assert!((xdot[3] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn fx_structure() {
        let mut solver = bound(CartpoleConfig::default());
        let fx = solver.fx(&[0.1, 0.7, -0.2, 1.3], &[0.4]).expect("fx");
        assert_eq!(fx.shape(), (4, 4));
        assert_eq!(fx[(0, 2)], 1.0);
        assert_eq!(fx[(1, 3)], 1.0);
        // Nothing depends on the cart position or velocity.
        for row in 0..4 {
            assert_eq!(fx[(row, 0)], 0.0);
        }
        assert_eq!(fx[(2, 2)], 0.0);
        assert_eq!(fx[(3, 2)], 0.0);
    }

    #[test]
    fn inverse_dynamics_zeroes_cart_acceleration() {
        let mut solver = bound(CartpoleConfig {
            pole_mass: 0.3,
            pole_length: 0.7,
            ..CartpoleConfig::default()
        });
        let x = [0.0, 1.1, 0.5, -2.0];
        let u = solver.inverse_dynamics(&x).expect("inverse dynamics");
        let xdot = solver.f(&x, u.as_slice()).expect("f");
        assert!(xdot[2].abs() < 1e-12);
    }

    #[test]
    fn position_is_measured_from_upright() {
        let solver = bound(CartpoleConfig::default());
        let p = solver.get_position(&[1.5, PI, 0.0, 0.0]).expect("position");
        assert_eq!(p[0], 1.5);
        assert!(p[1].abs() < 1e-15);
    }

    #[test]
    fn geodesic_state_delta_wraps_pole_angle() {
        let algebraic = bound(CartpoleConfig::default());
        let geodesic = bound(CartpoleConfig {
            angle_wrapping: AngleWrapping::Geodesic,
            ..CartpoleConfig::default()
        });
        assert_eq!(geodesic.config().angle_wrapping, AngleWrapping::Geodesic);
        assert_eq!(
            geodesic.space.wrapping(),
            &[AngleWrapping::Algebraic, AngleWrapping::Geodesic]
        );
        let x1 = [0.0, -3.0, 0.0, 0.0];
        let x2 = [0.0, 3.0, 0.0, 0.0];
        let plain = algebraic.state_delta(&x1, &x2).expect("delta");
        let wrapped = geodesic.state_delta(&x1, &x2).expect("delta");
        assert!((plain[1] + 6.0).abs() < 1e-12);
        assert!((wrapped[1] - (2.0 * PI - 6.0)).abs() < 1e-12);
    }

    #[test]
    fn wrong_control_size_is_a_dimension_error() {
        let mut solver = bound(CartpoleConfig::default());
        let err = solver.fu(&[0.0; 4], &[0.0, 1.0]).expect_err("two controls");
        assert_eq!(err.kind(), ErrorKind::Dimension);
    }
}
