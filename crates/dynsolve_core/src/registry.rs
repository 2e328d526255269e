//! Name → constructor mapping for solvers.

use crate::articulated::ArticulatedDynamicsSolver;
use crate::cartpole::CartpoleDynamicsSolver;
use crate::error::{DynamicsError, Result};
use crate::solver::DynamicsSolver;
use std::collections::HashMap;
use std::sync::OnceLock;

pub type SolverConstructor = fn() -> Box<dyn DynamicsSolver>;

fn construct<S: DynamicsSolver + Default + 'static>() -> Box<dyn DynamicsSolver> {
    Box::new(S::default())
}

#[derive(Debug, Clone, Default)]
pub struct SolverRegistry {
    constructors: HashMap<String, SolverConstructor>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every solver shipped with this crate.
    pub fn with_builtin_solvers() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(
            CartpoleDynamicsSolver::TYPE_NAME.to_string(),
            construct::<CartpoleDynamicsSolver>,
        );
        registry.constructors.insert(
            ArticulatedDynamicsSolver::TYPE_NAME.to_string(),
            construct::<ArticulatedDynamicsSolver>,
        );
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: SolverConstructor) -> Result<()> {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(DynamicsError::configuration(format!(
                "solver '{name}' is already registered"
            )));
        }
        self.constructors.insert(name, constructor);
        Ok(())
    }

    /// Register a default-constructible solver under its own type name.
    pub fn register_default<S: DynamicsSolver + Default + 'static>(&mut self) -> Result<()> {
        let name = S::default().type_name();
        self.register(name, construct::<S>)
    }

    /// A fresh, unbound solver.
    pub fn create(&self, name: &str) -> Result<Box<dyn DynamicsSolver>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor())
            .ok_or_else(|| DynamicsError::configuration(format!("unknown solver type '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Process-wide registry of the built-in solvers, built on first use.
pub fn builtin() -> &'static SolverRegistry {
    static BUILTIN: OnceLock<SolverRegistry> = OnceLock::new();
    BUILTIN.get_or_init(SolverRegistry::with_builtin_solvers)
}
