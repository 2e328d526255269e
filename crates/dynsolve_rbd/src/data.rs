//! Mutable workspace and results associated with a [`Model`].

use crate::autodiff::Dual;
use crate::model::Model;
use crate::spatial::{Force, Motion, Transform};
use crate::traits::Scalar;
use nalgebra::{DMatrix, DVector, Matrix6, Vector6};

/// Per-body kinematic scratch used by the recursive passes.
#[derive(Debug, Clone)]
pub(crate) struct Workspace<T: Scalar> {
    pub x_tree: Vec<Transform<T>>,
    pub vel: Vec<Motion<T>>,
    pub acc: Vec<Motion<T>>,
    pub force: Vec<Force<T>>,
}

impl<T: Scalar> Workspace<T> {
    fn new(nbodies: usize) -> Self {
        Self {
            x_tree: vec![Transform::identity(); nbodies],
            vel: vec![Motion::zero(); nbodies],
            acc: vec![Motion::zero(); nbodies],
            force: vec![Force::zero(); nbodies],
        }
    }
}

/// Scratch for the articulated-body pass.
#[derive(Debug, Clone)]
pub(crate) struct ArticulatedScratch {
    pub inertia: Vec<Matrix6<f64>>,
    pub bias: Vec<Vector6<f64>>,
    pub coriolis: Vec<Vector6<f64>>,
    pub u_vec: Vec<Vector6<f64>>,
    pub d: Vec<f64>,
    pub u: Vec<f64>,
}

/// Dual-number buffers for the derivative passes.
#[derive(Debug, Clone)]
pub(crate) struct DualScratch {
    pub q: Vec<Dual>,
    pub v: Vec<Dual>,
    pub a: Vec<Dual>,
    pub tangent: Vec<Dual>,
    pub tau: Vec<Dual>,
}

/// Results of the last algorithm calls plus their scratch storage.
/// Every result field is overwritten by the algorithm that produces it.
#[derive(Debug, Clone)]
pub struct Data {
    pub(crate) ws: Workspace<f64>,
    pub(crate) dual_ws: Workspace<Dual>,
    pub(crate) articulated: ArticulatedScratch,
    pub(crate) dual: DualScratch,
    /// Joint accelerations from [`crate::aba`].
    pub ddq: DVector<f64>,
    /// Joint forces from [`crate::rnea`].
    pub tau: DVector<f64>,
    /// Joint-space inertia from [`crate::crba`].
    pub mass_matrix: DMatrix<f64>,
    /// Inverse joint-space inertia, equal to `∂ddq/∂τ`.
    pub minv: DMatrix<f64>,
    pub dtau_dq: DMatrix<f64>,
    pub dtau_dv: DMatrix<f64>,
    pub ddq_dq: DMatrix<f64>,
    pub ddq_dv: DMatrix<f64>,
}

impl Data {
    pub fn new(model: &Model) -> Self {
        let nb = model.nbodies();
        let (nq, nv) = (model.nq, model.nv);
        Self {
            ws: Workspace::new(nb),
            dual_ws: Workspace::new(nb),
            articulated: ArticulatedScratch {
                inertia: vec![Matrix6::zeros(); nb],
                bias: vec![Vector6::zeros(); nb],
                coriolis: vec![Vector6::zeros(); nb],
                u_vec: vec![Vector6::zeros(); nb],
                d: vec![0.0; nb],
                u: vec![0.0; nb],
            },
            dual: DualScratch {
                q: vec![Dual::constant(0.0); nq],
                v: vec![Dual::constant(0.0); nv],
                a: vec![Dual::constant(0.0); nv],
                tangent: vec![Dual::constant(0.0); nv],
                tau: vec![Dual::constant(0.0); nv],
            },
            ddq: DVector::zeros(nv),
            tau: DVector::zeros(nv),
            mass_matrix: DMatrix::zeros(nv, nv),
            minv: DMatrix::zeros(nv, nv),
            dtau_dq: DMatrix::zeros(nv, nv),
            dtau_dv: DMatrix::zeros(nv, nv),
            ddq_dq: DMatrix::zeros(nv, nv),
            ddq_dv: DMatrix::zeros(nv, nv),
        }
    }
}
