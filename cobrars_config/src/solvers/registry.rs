//! Registry mapping solver names to backend interfaces
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::solvers::{SolverDescriptor, SolverInterface, SolverRef};

/// Ordered collection of the solver backends that can be selected by name
///
/// Names are kept in insertion order, which is also the order they are listed in when a
/// lookup fails.
#[derive(Debug, Clone, Default)]
pub struct SolverRegistry {
    interfaces: IndexMap<String, Arc<dyn SolverInterface>>,
}

impl SolverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            interfaces: IndexMap::new(),
        }
    }

    /// Create a registry holding the backends compiled into this build
    ///
    /// Clarabel is always available, the other backends depend on the enabled features
    /// (`scip`, `osqp`, `highs`, `minilp`).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SolverDescriptor::clarabel()));
        #[cfg(feature = "scip")]
        registry.register(Arc::new(SolverDescriptor::scip()));
        #[cfg(feature = "osqp")]
        registry.register(Arc::new(SolverDescriptor::osqp()));
        #[cfg(feature = "highs")]
        registry.register(Arc::new(SolverDescriptor::highs()));
        #[cfg(feature = "minilp")]
        registry.register(Arc::new(SolverDescriptor::microlp()));
        registry
    }

    /// Add a backend to the registry, keyed by its name
    ///
    /// Returns the backend previously registered under the same name, if any.
    pub fn register(
        &mut self,
        interface: Arc<dyn SolverInterface>,
    ) -> Option<Arc<dyn SolverInterface>> {
        self.interfaces
            .insert(interface.name().to_string(), interface)
    }

    /// Get the backend registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SolverInterface>> {
        self.interfaces.get(name)
    }

    /// Check whether a backend is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Iterate over the registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Resolve a solver reference into a backend interface
    ///
    /// Names must be registered, interfaces are returned unchanged.
    pub fn resolve(&self, solver: SolverRef) -> Result<Arc<dyn SolverInterface>, SolverNotFound> {
        match solver {
            SolverRef::Name(name) => match self.interfaces.get(&name) {
                Some(interface) => Ok(interface.clone()),
                None => Err(SolverNotFound {
                    value: name,
                    valid: self.names().map(str::to_string).collect(),
                }),
            },
            SolverRef::Interface(interface) => Ok(interface),
        }
    }
}

/// Error when a solver can't be resolved to a backend interface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid solver interface. Please pick one from {}.", .valid.join(", "))]
pub struct SolverNotFound {
    /// Value which failed to resolve
    pub value: String,
    /// Names which would have resolved
    pub valid: Vec<String>,
}
