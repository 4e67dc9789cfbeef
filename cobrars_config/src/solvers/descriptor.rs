//! Provides a plain description of a solver backend, used for the registry entries
use std::any::Any;

use crate::solvers::SolverInterface;

/// Describes a solver backend by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverDescriptor {
    /// Raw interface name, also the registry key
    name: String,
}

impl SolverDescriptor {
    /// Create a new solver descriptor
    pub fn new(name: &str) -> Self {
        SolverDescriptor {
            name: name.to_string(),
        }
    }

    /// Clarabel interior point solver
    pub fn clarabel() -> Self {
        Self::new("clarabel")
    }

    /// SCIP mixed integer solver
    pub fn scip() -> Self {
        Self::new("scip")
    }

    /// OSQP quadratic program solver
    pub fn osqp() -> Self {
        Self::new("osqp")
    }

    /// HiGHS linear and mixed integer solver
    pub fn highs() -> Self {
        Self::new("highs")
    }

    /// microlp, a pure rust linear and mixed integer solver
    pub fn microlp() -> Self {
        Self::new("microlp")
    }
}

impl SolverInterface for SolverDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
