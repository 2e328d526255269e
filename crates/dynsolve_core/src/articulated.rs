//! Generic fixed-base articulated model backed by `dynsolve_rbd`.
//!
//! `nq = model.nq`, `nv = nu = model.nv`. Every joint is actuated.

use crate::config::ArticulatedConfig;
use crate::error::{DynamicsError, Result};
use crate::manifold::ConfigurationSpace;
use crate::scene::{BaseType, KinematicDescription};
use crate::solver::{Dimensions, DynamicsSolver};
use dynsolve_rbd::{aba, compute_aba_derivatives, rnea, Data, Model};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace, warn};

/// Engine model plus the buffers allocated at bind time.
#[derive(Debug, Clone)]
struct Binding {
    model: Model,
    data: Data,
    dims: Dimensions,
    xdot: DVector<f64>,
    /// Top-right `nv × nv` block is the identity, written once at bind.
    fx: DMatrix<f64>,
    fu: DMatrix<f64>,
    zero_acceleration: Vec<f64>,
}

impl Binding {
    fn new(model: Model) -> Self {
        let (nq, nv) = (model.nq, model.nv);
        let dims = Dimensions::new(nq, nv, nv);
        let ndx = dims.ndx();
        let mut fx = DMatrix::zeros(ndx, ndx);
        fx.view_mut((0, nv), (nv, nv)).fill_with_identity();
        Self {
            data: Data::new(&model),
            model,
            dims,
            xdot: DVector::zeros(ndx),
            fx,
            fu: DMatrix::zeros(ndx, nv),
            zero_acceleration: vec![0.0; nv],
        }
    }

    fn check(&self, x: &[f64], u: &[f64]) -> Result<()> {
        self.dims.check_state(x)?;
        self.dims.check_control(u)
    }

    /// Run the combined derivative pass and scatter it into `fx` and `fu`.
    fn update_derivatives(&mut self, x: &[f64], u: &[f64]) -> Result<()> {
        self.check(x, u)?;
        let nv = self.dims.num_velocities;
        let (q, v) = self.dims.split(x);
        compute_aba_derivatives(&self.model, &mut self.data, q, v, u)?;

        self.fx
            .view_mut((nv, 0), (nv, nv))
            .copy_from(&self.data.ddq_dq);
        self.fx
            .view_mut((nv, nv), (nv, nv))
            .copy_from(&self.data.ddq_dv);
        self.fu.view_mut((nv, 0), (nv, nv)).copy_from(&self.data.minv);
        trace!(model = %self.model.name, "updated dynamics jacobians");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticulatedDynamicsSolver {
    config: ArticulatedConfig,
    binding: Option<Binding>,
}

impl ArticulatedDynamicsSolver {
    pub const TYPE_NAME: &'static str = "ArticulatedDynamicsSolver";

    pub fn new(config: ArticulatedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            binding: None,
        })
    }

    pub fn config(&self) -> &ArticulatedConfig {
        &self.config
    }

    /// The bound engine model, if any.
    pub fn model(&self) -> Option<&Model> {
        self.binding.as_ref().map(|b| &b.model)
    }

    fn binding(&self) -> Result<&Binding> {
        self.binding
            .as_ref()
            .ok_or_else(|| DynamicsError::not_bound(Self::TYPE_NAME))
    }

    fn binding_mut(&mut self) -> Result<&mut Binding> {
        self.binding
            .as_mut()
            .ok_or_else(|| DynamicsError::not_bound(Self::TYPE_NAME))
    }
}

impl DynamicsSolver for ArticulatedDynamicsSolver {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn dimensions(&self) -> Option<Dimensions> {
        self.binding.as_ref().map(|b| b.dims)
    }

    fn dt(&self) -> f64 {
        self.config.dt
    }

    fn assign_scene(&mut self, scene: &dyn KinematicDescription) -> Result<()> {
        if self.binding.is_some() {
            return Err(DynamicsError::configuration(format!(
                "{} is already bound to a scene",
                Self::TYPE_NAME
            )));
        }
        let base = scene.base_type();
        if base != BaseType::Fixed {
            return Err(DynamicsError::configuration(format!(
                "{} only supports a fixed base, scene declares {base:?}",
                Self::TYPE_NAME
            )));
        }

        let mut description = scene.model_description().clone();
        if let Some(gravity) = self.config.gravity {
            description.gravity = gravity;
        }
        let model = Model::from_description(&description).map_err(|e| {
            DynamicsError::configuration(format!(
                "failed to build model '{}': {e}",
                description.name
            ))
        })?;

        if scene.num_controlled_joints() != model.nv {
            warn!(
                controlled = scene.num_controlled_joints(),
                nv = model.nv,
                "scene controlled-joint count differs from model velocity count; every joint is actuated"
            );
        }

        let binding = Binding::new(model);
        debug!(
            solver = Self::TYPE_NAME,
            model = %binding.model.name,
            nq = binding.dims.num_positions,
            nv = binding.dims.num_velocities,
            nu = binding.dims.num_controls,
            "bound solver to scene"
        );
        self.binding = Some(binding);
        Ok(())
    }

    fn configuration_space(&self) -> Result<&dyn ConfigurationSpace> {
        Ok(&self.binding()?.model)
    }

    fn f(&mut self, x: &[f64], u: &[f64]) -> Result<&DVector<f64>> {
        let b = self.binding_mut()?;
        b.check(x, u)?;
        let nv = b.dims.num_velocities;
        let (q, v) = b.dims.split(x);
        let ddq = aba(&b.model, &mut b.data, q, v, u)?;
        b.xdot.rows_mut(0, nv).copy_from_slice(v);
        b.xdot.rows_mut(nv, nv).copy_from(ddq);
        Ok(&b.xdot)
    }

    fn fx(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>> {
        let b = self.binding_mut()?;
        b.update_derivatives(x, u)?;
        Ok(&b.fx)
    }

    fn fu(&mut self, x: &[f64], u: &[f64]) -> Result<&DMatrix<f64>> {
        let b = self.binding_mut()?;
        b.update_derivatives(x, u)?;
        Ok(&b.fu)
    }

    fn jacobians(&mut self, x: &[f64], u: &[f64]) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
        let b = self.binding_mut()?;
        b.update_derivatives(x, u)?;
        Ok((b.fx.clone(), b.fu.clone()))
    }

    /// Joint forces holding the mechanism at zero acceleration: `rnea(q, v, 0)`.
    fn inverse_dynamics(&mut self, x: &[f64]) -> Result<DVector<f64>> {
        let b = self.binding_mut()?;
        b.dims.check_state(x)?;
        let (q, v) = b.dims.split(x);
        let tau = rnea(&b.model, &mut b.data, q, v, &b.zero_acceleration)?;
        Ok(tau.clone())
    }
}
