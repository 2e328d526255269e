//! The dynamics solver contract shared by every model.
//!
//! A state is `x = [q; v]` with `q` on a [`ConfigurationSpace`] and `v` in its
//! tangent space. Derivatives and state differences live in the tangent bundle
//! of size `ndx = 2 * nv`.

use crate::error::{DynamicsError, Result};
use crate::manifold::{ArgumentPosition, ConfigurationSpace};
use crate::scene::KinematicDescription;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub num_positions: usize,
    pub num_velocities: usize,
    pub num_controls: usize,
}

impl Dimensions {
    pub fn new(num_positions: usize, num_velocities: usize, num_controls: usize) -> Self {
        Self {
            num_positions,
            num_velocities,
            num_controls,
        }
    }

    pub fn state_size(&self) -> usize {
        self.num_positions + self.num_velocities
    }

    /// Size of the tangent space of the state.
    pub fn ndx(&self) -> usize {
        2 * self.num_velocities
    }

    pub fn check_state(&self, x: &[f64]) -> Result<()> {
        DynamicsError::check_len("state", self.state_size(), x.len())
    }

    pub fn check_control(&self, u: &[f64]) -> Result<()> {
        DynamicsError::check_len("control", self.num_controls, u.len())
    }

    pub fn check_tangent(&self, dx: &[f64]) -> Result<()> {
        DynamicsError::check_len("state tangent", self.ndx(), dx.len())
    }

    /// Split a state into its configuration and velocity blocks.
    pub fn split<'a>(&self, x: &'a [f64]) -> (&'a [f64], &'a [f64]) {
        x.split_at(self.num_positions)
    }
}

/// A differentiable continuous-time model `xdot = f(x, u)`.
///
/// Per-step methods return views into solver-owned buffers; the borrow ends
/// at the next call on the same instance, so clone to keep a value.
pub trait DynamicsSolver: Send {
    /// Stable name used by the registry.
    fn type_name(&self) -> &'static str;

    /// Bound dimensions, `None` until [`DynamicsSolver::assign_scene`] succeeds.
    fn dimensions(&self) -> Option<Dimensions>;

    /// Step size of [`DynamicsSolver::simulate_one_step`].
    fn dt(&self) -> f64;

    /// Bind the solver to a kinematic description. Only the first successful
    /// call is accepted.
    fn assign_scene(&mut self, scene: &dyn KinematicDescription) -> Result<()>;

    fn configuration_space(&self) -> Result<&dyn ConfigurationSpace>;

    /// Continuous-time state derivative `[dq; ddq]` in tangent coordinates.
    fn f(&mut self, x: &[f64], u: &[f64]) -> Result<&DVector<f64>>;

    /// `∂f/∂x`, `ndx × ndx`.
    fn fx(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>>;

    /// `∂f/∂u`, `ndx × nu`.
    fn fu(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>>;

    /// Both Jacobians. Solvers whose derivative routine yields both at once
    /// override this to evaluate it a single time.
    fn jacobians(&mut self, x: &[f64], u: &[f64]) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        let fx = self.fx(x, u)?.clone();
        let fu = self.fu(x, u)?.clone();
        Ok((fx, fu))
    }

    fn num_positions(&self) -> usize {
        self.dimensions().map_or(0, |d| d.num_positions)
    }

    fn num_velocities(&self) -> usize {
        self.dimensions().map_or(0, |d| d.num_velocities)
    }

    fn num_controls(&self) -> usize {
        self.dimensions().map_or(0, |d| d.num_controls)
    }

    fn num_state(&self) -> usize {
        self.dimensions().map_or(0, |d| d.state_size())
    }

    fn num_state_derivative(&self) -> usize {
        self.dimensions().map_or(0, |d| d.ndx())
    }

    fn bound_dimensions(&self) -> Result<Dimensions> {
        self.dimensions()
            .ok_or_else(|| DynamicsError::not_bound(self.type_name()))
    }

    /// `x1 ⊖ x2`: the tangent vector taking `x2` to `x1`.
    fn state_delta(&self, x1: &[f64], x2: &[f64]) -> Result<DVector<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x1)?;
        dims.check_state(x2)?;
        let nv = dims.num_velocities;
        let (q1, v1) = dims.split(x1);
        let (q2, v2) = dims.split(x2);

        let dq = self.configuration_space()?.difference(q2, q1)?;
        let mut dx = DVector::zeros(dims.ndx());
        dx.rows_mut(0, nv).copy_from(&dq);
        for (i, (a, b)) in v1.iter().zip(v2).enumerate() {
            dx[nv + i] = a - b;
        }
        Ok(dx)
    }

    /// Jacobian of [`DynamicsSolver::state_delta`] with respect to `x1` (`Arg0`)
    /// or `x2` (`Arg1`).
    fn d_state_delta(
        &self,
        x1: &[f64],
        x2: &[f64],
        wrt: ArgumentPosition,
    ) -> Result<DMatrix<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x1)?;
        dims.check_state(x2)?;
        let nv = dims.num_velocities;
        let (q1, _) = dims.split(x1);
        let (q2, _) = dims.split(x2);

        // x1 is the second argument of difference(q2, q1).
        let jq = self
            .configuration_space()?
            .d_difference(q2, q1, wrt.flipped())?;

        let mut jac = DMatrix::identity(dims.ndx(), dims.ndx());
        jac.view_mut((0, 0), (nv, nv)).copy_from(&jq);
        if wrt == ArgumentPosition::Arg1 {
            jac.view_mut((nv, nv), (nv, nv)).fill_diagonal(-1.0);
        }
        Ok(jac)
    }

    /// `x ⊕ dt·dx`.
    fn integrate(&self, x: &[f64], dx: &[f64], dt: f64) -> Result<DVector<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x)?;
        dims.check_tangent(dx)?;
        let (nq, nv) = (dims.num_positions, dims.num_velocities);
        let (q, v) = dims.split(x);
        let (dq, dv) = dx.split_at(nv);

        let step: Vec<f64> = dq.iter().map(|d| dt * d).collect();
        let q_next = self.configuration_space()?.integrate(q, &step)?;

        let mut out = DVector::zeros(dims.state_size());
        out.rows_mut(0, nq).copy_from(&q_next);
        for (i, (a, d)) in v.iter().zip(dv).enumerate() {
            out[nq + i] = a + dt * d;
        }
        Ok(out)
    }

    /// One explicit Euler step of size [`DynamicsSolver::dt`].
    fn simulate_one_step(&mut self, x: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        let xdot = self.f(x, u)?.clone();
        let dt = self.dt();
        self.integrate(x, xdot.as_slice(), dt)
    }

    /// Control that produces zero acceleration at `x`.
    fn inverse_dynamics(&mut self, _x: &[f64]) -> Result<DVector<f64>> {
        Err(DynamicsError::Unsupported(format!(
            "{} does not provide inverse dynamics",
            self.type_name()
        )))
    }

    /// Solver-specific readout of the configuration; the raw block by default.
    fn get_position(&self, x: &[f64]) -> Result<DVector<f64>> {
        let dims = self.bound_dimensions()?;
        dims.check_state(x)?;
        Ok(DVector::from_column_slice(dims.split(x).0))
    }
}

/// Apply [`DynamicsSolver::simulate_one_step`] over `controls`, returning every
/// visited state including `x0`.
pub fn rollout(
    solver: &mut dyn DynamicsSolver,
    x0: &[f64],
    controls: &[DVector<f64>],
) -> Result<Vec<DVector<f64>>> {
    let mut x = DVector::from_column_slice(x0);
    let mut states = Vec::with_capacity(controls.len() + 1);
    states.push(x.clone());
    for u in controls {
        x = solver.simulate_one_step(x.as_slice(), u.as_slice())?;
        states.push(x.clone());
    }
    Ok(states)
}
