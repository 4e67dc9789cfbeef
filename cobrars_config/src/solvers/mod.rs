//! Solver backends known to the configuration, and the registry used to look them up by name
//!
//! The configuration never drives a solver itself, it only records which backend the
//! optimization layer should build models with. A backend is anything implementing
//! [`SolverInterface`].

pub mod descriptor;
pub mod registry;

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

pub use descriptor::SolverDescriptor;
pub use registry::{SolverNotFound, SolverRegistry};

/// Interface to an optimization backend able to construct solvable models
///
/// Implementing this trait is what makes a value acceptable as the configured solver, no
/// registration is required for values passed directly through [`SolverRef::Interface`].
pub trait SolverInterface: Debug + Send + Sync {
    /// Raw name of the interface, used as the registry key
    fn name(&self) -> &str;

    /// Short human-readable name used when displaying the configuration
    fn display_name(&self) -> String {
        short_name(self.name()).to_string()
    }

    /// Access to the concrete backend, for callers that need more than the name
    fn as_any(&self) -> &dyn Any;
}

/// Value accepted when selecting a solver
#[derive(Debug, Clone)]
pub enum SolverRef {
    /// Name to look up in a [`SolverRegistry`]
    Name(String),
    /// Already resolved backend, used as-is
    Interface(Arc<dyn SolverInterface>),
}

impl From<&str> for SolverRef {
    fn from(name: &str) -> Self {
        SolverRef::Name(name.to_string())
    }
}

impl From<String> for SolverRef {
    fn from(name: String) -> Self {
        SolverRef::Name(name)
    }
}

impl From<Arc<dyn SolverInterface>> for SolverRef {
    fn from(interface: Arc<dyn SolverInterface>) -> Self {
        SolverRef::Interface(interface)
    }
}

/// Translate a raw interface name into its short display form
///
/// Only the last `.` separated segment is kept, and a trailing `_interface` is removed, so
/// `optlang.glpk_interface` becomes `glpk`.
pub fn short_name(raw: &str) -> &str {
    let last = raw.rsplit('.').next().unwrap_or(raw);
    last.strip_suffix("_interface").unwrap_or(last)
}
