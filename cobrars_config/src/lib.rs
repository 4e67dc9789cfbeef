//! Process-wide default settings for Cobra.rs, a crate for constraint based metabolic modeling.
//!
//! The [`Configuration`] holds the solver, tolerance, default reaction bounds and degree of
//! parallelism used whenever a caller doesn't supply its own values.

pub mod configuration;
pub mod environment;
pub mod solvers;

pub use configuration::{configuration, configuration_mut, Configuration, ConfigurationError};
pub use environment::{EnvironmentProbe, FixedProbe, SystemProbe};
pub use solvers::{SolverInterface, SolverNotFound, SolverRef, SolverRegistry};
