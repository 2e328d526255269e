pub mod aba;
pub mod autodiff;
pub mod configuration;
pub mod crba;
pub mod data;
pub mod derivatives;
pub mod description;
pub mod error;
pub mod model;
pub mod rnea;
pub mod spatial;
/// The `dynsolve_rbd` crate is the articulated-body engine behind the generic
/// dynamics solver in `dynsolve_core`.
///
/// Key components:
/// - **Description**: serializable, URDF-like kinematic and inertial description.
/// - **Model / Data**: immutable model built from a description, plus the mutable
///   workspace the algorithms write into.
/// - **Algorithms**: `aba` (forward dynamics), `rnea` (inverse dynamics),
///   `crba` (joint-space inertia) and `compute_aba_derivatives`.
/// - **Configuration space**: `integrate`, `difference`, `d_difference` over
///   joint configurations, including unit-complex continuous joints.
/// - **Autodiff**: `Scalar` abstraction and the `Dual` number used by the
///   derivative routine.
pub mod traits;

pub use aba::aba;
pub use configuration::ArgumentPosition;
pub use crba::crba;
pub use data::Data;
pub use derivatives::compute_aba_derivatives;
pub use description::{
    BodyDescription, InertialDescription, JointDescription, JointKind, ModelDescription, Origin,
};
pub use error::ModelError;
pub use model::Model;
pub use rnea::rnea;
