pub mod articulated;
pub mod cartpole;
pub mod config;
pub mod error;
pub mod manifold;
pub mod registry;
pub mod scene;
/// The `dynsolve_core` crate provides differentiable dynamics models for
/// trajectory optimization behind one contract.
///
/// Key components:
/// - **Solver**: the `DynamicsSolver` trait (`f`, `fx`, `fu`, manifold-aware
///   `state_delta` / `integrate`, forward-Euler `simulate_one_step`).
/// - **Manifold**: `ConfigurationSpace` with a Euclidean `VectorSpace` and the
///   engine model's joint-wise operators.
/// - **Models**: closed-form `CartpoleDynamicsSolver` and the engine-backed
///   `ArticulatedDynamicsSolver`.
/// - **Scene / Config / Registry**: kinematic description collaborator, typed
///   parameters and name-based construction.
pub mod solver;

pub use articulated::ArticulatedDynamicsSolver;
pub use cartpole::CartpoleDynamicsSolver;
pub use config::{ArticulatedConfig, CartpoleConfig, SolverConfig};
pub use error::{DynamicsError, ErrorKind};
pub use manifold::{AngleWrapping, ArgumentPosition, ConfigurationSpace, VectorSpace};
pub use registry::{builtin, SolverRegistry};
pub use scene::{BaseType, KinematicDescription, Scene};
pub use solver::{rollout, Dimensions, DynamicsSolver};
