//! Process-wide configuration holding the default values used when building and solving models
//!
//! There is a single [`Configuration`] per process, created the first time it is accessed
//! through [`configuration`] or [`configuration_mut`]. Values are read-mostly, typically set
//! once at startup and then consulted whenever a caller doesn't supply its own value.
use std::fmt::{Display, Formatter};
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use crate::environment::{default_processes, EnvironmentProbe, SystemProbe};
use crate::solvers::{SolverInterface, SolverNotFound, SolverRef, SolverRegistry};

/// Default solver tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-07;
/// Default reaction lower bound
pub const DEFAULT_LOWER_BOUND: f64 = -1000.;
/// Default reaction upper bound
pub const DEFAULT_UPPER_BOUND: f64 = 1000.;
/// Solvers tried, in order, when picking the default solver
pub const PREFERRED_SOLVERS: [&str; 8] = [
    "gurobi", "cplex", "glpk", "scip", "highs", "clarabel", "osqp", "microlp",
];

static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::new()));

/// Get read access to the process-wide configuration, creating it on first use
pub fn configuration() -> RwLockReadGuard<'static, Configuration> {
    CONFIGURATION.read().unwrap_or_else(PoisonError::into_inner)
}

/// Get write access to the process-wide configuration, creating it on first use
pub fn configuration_mut() -> RwLockWriteGuard<'static, Configuration> {
    CONFIGURATION.write().unwrap_or_else(PoisonError::into_inner)
}

/// Default values used by model construction and optimization
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Backend used for new models, None if no backend could be found
    solver: Option<Arc<dyn SolverInterface>>,
    /// General solver tolerance (feasibility, integrality, etc.)
    tolerance: f64,
    /// Default lower bound for reversible reactions
    lower_bound: Option<f64>,
    /// Default upper bound for all reactions
    upper_bound: Option<f64>,
    /// Default number of processes for parallel work
    processes: usize,
    /// Backends which can be selected by name
    registry: SolverRegistry,
}

impl Configuration {
    // region Creation Functions
    /// Create a new configuration using the builtin solvers and the host's core count
    pub fn new() -> Self {
        Self::with_environment(SolverRegistry::builtin(), &SystemProbe)
    }

    /// Create a new configuration resolving solvers through `registry`, and taking the core
    /// count from `probe`
    pub fn with_environment(registry: SolverRegistry, probe: &dyn EnvironmentProbe) -> Self {
        let mut configuration = Configuration {
            solver: None,
            tolerance: DEFAULT_TOLERANCE,
            lower_bound: Some(DEFAULT_LOWER_BOUND),
            upper_bound: Some(DEFAULT_UPPER_BOUND),
            processes: default_processes(probe),
            registry,
        };
        configuration.set_default_solver();
        configuration
    }

    /// Select the first preferred solver which is available
    fn set_default_solver(&mut self) {
        for name in PREFERRED_SOLVERS {
            if self.set_solver(name).is_ok() {
                debug!("Using {} as the default solver", name);
                return;
            }
        }
        debug!("None of the preferred solvers are available, no default solver set");
    }
    // endregion Creation Functions

    // region Solver
    /// Backend used for new models
    pub fn solver(&self) -> Option<&Arc<dyn SolverInterface>> {
        self.solver.as_ref()
    }

    /// Change the backend used for new models
    ///
    /// Names are looked up in the configuration's registry, interfaces are used as they are.
    /// The current solver is kept if the value can't be resolved.
    pub fn set_solver(&mut self, solver: impl Into<SolverRef>) -> Result<(), ConfigurationError> {
        let interface = self.registry.resolve(solver.into())?;
        self.solver = Some(interface);
        Ok(())
    }

    /// Registry solver names are resolved against
    pub fn registry(&self) -> &SolverRegistry {
        &self.registry
    }

    /// Mutable access to the registry, to add further backends
    pub fn registry_mut(&mut self) -> &mut SolverRegistry {
        &mut self.registry
    }
    // endregion Solver

    // region Tolerance
    /// General solver tolerance
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Update the solver tolerance, which must be finite and positive
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), ConfigurationError> {
        if !tolerance.is_finite() || tolerance <= 0. {
            return Err(ConfigurationError::InvalidTolerance(tolerance));
        }
        self.tolerance = tolerance;
        Ok(())
    }
    // endregion Tolerance

    // region Bounds
    /// Default reaction lower bound
    pub fn lower_bound(&self) -> Option<f64> {
        self.lower_bound
    }

    /// Default reaction upper bound
    pub fn upper_bound(&self) -> Option<f64> {
        self.upper_bound
    }

    /// Default (lower, upper) reaction bounds
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.lower_bound, self.upper_bound)
    }

    /// Update both default reaction bounds
    ///
    /// # Errors
    /// Fails with [`ConfigurationError::InvalidBounds`] when both bounds are present and
    /// lower > upper, or either bound is NaN. Neither bound is changed in that case.
    pub fn set_bounds(
        &mut self,
        bounds: (Option<f64>, Option<f64>),
    ) -> Result<(), ConfigurationError> {
        let (lower, upper) = bounds;
        let invalid = match (lower, upper) {
            (Some(l), Some(u)) => !(l <= u),
            (Some(b), None) | (None, Some(b)) => b.is_nan(),
            (None, None) => false,
        };
        if invalid {
            return Err(ConfigurationError::InvalidBounds { lower, upper });
        }
        self.lower_bound = lower;
        self.upper_bound = upper;
        Ok(())
    }

    /// Update the default reaction lower bound, keeping the current upper bound
    pub fn set_lower_bound(&mut self, lower_bound: Option<f64>) -> Result<(), ConfigurationError> {
        self.set_bounds((lower_bound, self.upper_bound))
    }

    /// Update the default reaction upper bound, keeping the current lower bound
    pub fn set_upper_bound(&mut self, upper_bound: Option<f64>) -> Result<(), ConfigurationError> {
        self.set_bounds((self.lower_bound, upper_bound))
    }
    // endregion Bounds

    // region Processes
    /// Default number of processes for parallel work
    pub fn processes(&self) -> usize {
        self.processes
    }

    /// Update the default number of processes, at least one is required
    pub fn set_processes(&mut self, processes: usize) -> Result<(), ConfigurationError> {
        if processes == 0 {
            return Err(ConfigurationError::InvalidProcesses(processes));
        }
        self.processes = processes;
        Ok(())
    }
    // endregion Processes

    // region Display
    /// Short name of the current solver, "None" when there isn't one
    fn solver_display_name(&self) -> String {
        match &self.solver {
            Some(solver) => solver.display_name(),
            None => "None".to_string(),
        }
    }

    /// Render the configuration as an HTML table, for notebook style front ends
    pub fn to_html(&self) -> String {
        let rows = [
            (
                "solver",
                "Mathematical optimization solver",
                self.solver_display_name(),
            ),
            (
                "tolerance",
                "General solver tolerance (feasibility, integrality, etc.)",
                format!("{:?}", self.tolerance),
            ),
            (
                "lower_bound",
                "Default reaction lower bound",
                format_bound(self.lower_bound),
            ),
            (
                "upper_bound",
                "Default reaction upper bound",
                format_bound(self.upper_bound),
            ),
            (
                "processes",
                "Number of parallel processes",
                self.processes.to_string(),
            ),
        ];
        let body: String = rows
            .iter()
            .map(|(attribute, description, value)| {
                format!(
                    "    <tr>\n      \
                     <td><pre>{attribute}</pre></td>\n      \
                     <td>{description}</td>\n      \
                     <td>{}</td>\n    \
                     </tr>\n",
                    escape_html(value)
                )
            })
            .collect();
        format!(
            "<table>\n  <thead>\n    <tr>\n      \
             <td><strong>Attribute</strong></td>\n      \
             <td><strong>Description</strong></td>\n      \
             <td><strong>Value</strong></td>\n    \
             </tr>\n  </thead>\n  <tbody>\n{body}  </tbody>\n</table>\n"
        )
    }
    // endregion Display
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Configuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "solver: {}", self.solver_display_name())?;
        writeln!(f, "tolerance: {:?}", self.tolerance)?;
        writeln!(f, "lower_bound: {}", format_bound(self.lower_bound))?;
        writeln!(f, "upper_bound: {}", format_bound(self.upper_bound))?;
        writeln!(f, "processes: {}", self.processes)
    }
}

/// Escape the characters which would break the surrounding markup
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(b) => format!("{b:?}"),
        None => "None".to_string(),
    }
}

/// Errors associated with updating the Configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Error when the requested solver can't be resolved
    #[error(transparent)]
    SolverNotFound(#[from] SolverNotFound),
    /// Error when trying to set bounds with lower_bound > upper_bound
    #[error("Tried to set bounds with lower_bound > upper_bound ({lower:?}, {upper:?})")]
    InvalidBounds {
        lower: Option<f64>,
        upper: Option<f64>,
    },
    /// Error when trying to set a tolerance which isn't finite and positive
    #[error("Tolerance must be finite and positive, got {0}")]
    InvalidTolerance(f64),
    /// Error when trying to use fewer than one process
    #[error("At least one process is required, got {0}")]
    InvalidProcesses(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedProbe;
    use crate::solvers::SolverDescriptor;

    fn registry_with(names: &[&str]) -> SolverRegistry {
        let mut registry = SolverRegistry::new();
        for name in names {
            registry.register(Arc::new(SolverDescriptor::new(name)));
        }
        registry
    }

    fn test_configuration() -> Configuration {
        Configuration::with_environment(
            registry_with(&["glpk", "cplex", "gurobi"]),
            &FixedProbe(Some(4)),
        )
    }

    #[test]
    fn defaults() {
        let config = test_configuration();
        assert!((config.tolerance() - 1e-7).abs() < 1e-25);
        assert_eq!(config.bounds(), (Some(-1000.), Some(1000.)));
        assert_eq!(config.lower_bound(), Some(-1000.));
        assert_eq!(config.upper_bound(), Some(1000.));
        assert_eq!(config.processes(), 3);
        assert_eq!(config.solver().unwrap().name(), "gurobi");
    }

    #[test]
    fn default_solver_priority() {
        let config = Configuration::with_environment(
            registry_with(&["glpk", "cplex"]),
            &FixedProbe(Some(1)),
        );
        assert_eq!(config.solver().unwrap().name(), "cplex");

        let config = Configuration::with_environment(
            registry_with(&["microlp", "glpk"]),
            &FixedProbe(Some(1)),
        );
        assert_eq!(config.solver().unwrap().name(), "glpk");

        let config =
            Configuration::with_environment(SolverRegistry::builtin(), &FixedProbe(Some(1)));
        assert!(config.solver().is_some());
    }

    #[test]
    fn no_solver_available() {
        let config = Configuration::with_environment(registry_with(&["mosek"]), &FixedProbe(None));
        assert!(config.solver().is_none());
        assert_eq!(config.processes(), 1);
        assert!(config.to_string().starts_with("solver: None\n"));
    }

    #[test]
    fn default_processes_from_probe() {
        for (cores, expected) in [(Some(16), 15), (Some(2), 1), (Some(1), 1), (None, 1)] {
            let config = Configuration::with_environment(SolverRegistry::new(), &FixedProbe(cores));
            assert_eq!(config.processes(), expected, "cores: {cores:?}");
        }
    }

    #[test]
    fn set_solver_by_name() {
        let mut config = test_configuration();
        let names: Vec<String> = config.registry().names().map(str::to_string).collect();
        for name in names {
            config.set_solver(name.as_str()).unwrap();
            assert!(Arc::ptr_eq(
                config.solver().unwrap(),
                config.registry().get(&name).unwrap()
            ));
        }
    }

    #[test]
    fn set_unknown_solver() {
        let mut config = test_configuration();
        config.set_solver("glpk").unwrap();
        match config.set_solver("not_a_solver") {
            Err(ConfigurationError::SolverNotFound(err)) => {
                let message = err.to_string();
                for name in ["glpk", "cplex", "gurobi"] {
                    assert!(message.contains(name), "{name} missing from {message}");
                }
            }
            _ => panic!("Unknown solver accepted"),
        }
        // The previous solver is kept
        assert_eq!(config.solver().unwrap().name(), "glpk");
    }

    #[test]
    fn set_solver_interface() {
        let mut config = test_configuration();
        let interface: Arc<dyn SolverInterface> =
            Arc::new(SolverDescriptor::new("optlang.osqp_interface"));
        config.set_solver(interface.clone()).unwrap();
        assert!(Arc::ptr_eq(config.solver().unwrap(), &interface));
        assert!(!config.registry().contains("optlang.osqp_interface"));
        assert!(config.to_string().contains("solver: osqp\n"));
    }

    #[test]
    fn registering_new_solver() {
        let mut config = test_configuration();
        config
            .registry_mut()
            .register(Arc::new(SolverDescriptor::scip()));
        config.set_solver("scip").unwrap();
        assert_eq!(config.solver().unwrap().name(), "scip");
    }

    #[test]
    fn set_valid_bounds() {
        let mut config = test_configuration();
        let pairs = [
            (Some(-10.), Some(10.)),
            (Some(5.), Some(5.)),
            (None, Some(-3.)),
            (Some(3.), None),
            (None, None),
            (Some(0.), Some(1e9)),
        ];
        for pair in pairs {
            config.set_bounds(pair).unwrap();
            assert_eq!(config.bounds(), pair);
            assert_eq!(config.lower_bound(), pair.0);
            assert_eq!(config.upper_bound(), pair.1);
        }
    }

    #[test]
    fn set_invalid_bounds() {
        let mut config = test_configuration();
        config.set_bounds((Some(-5.), Some(5.))).unwrap();
        for pair in [
            (Some(10.), Some(-10.)),
            (Some(1.), Some(0.999)),
            (Some(f64::NAN), Some(1.)),
            (None, Some(f64::NAN)),
        ] {
            if let Err(ConfigurationError::InvalidBounds { .. }) = config.set_bounds(pair) {
                // Intentionally blank
            } else {
                panic!("Invalid bounds {pair:?} not caught")
            }
            assert_eq!(config.bounds(), (Some(-5.), Some(5.)));
        }
    }

    #[test]
    fn set_single_bound() {
        let mut config = test_configuration();
        config.set_lower_bound(Some(0.)).unwrap();
        assert_eq!(config.bounds(), (Some(0.), Some(1000.)));
        config.set_upper_bound(None).unwrap();
        config.set_lower_bound(Some(5000.)).unwrap();
        assert_eq!(config.bounds(), (Some(5000.), None));
        assert!(config.set_upper_bound(Some(10.)).is_err());
        assert_eq!(config.bounds(), (Some(5000.), None));
    }

    #[test]
    fn set_tolerance_and_processes() {
        let mut config = test_configuration();
        config.set_tolerance(1e-9).unwrap();
        assert!((config.tolerance() - 1e-9).abs() < 1e-25);
        for bad in [0., -1e-7, f64::NAN, f64::INFINITY] {
            assert!(config.set_tolerance(bad).is_err());
        }
        assert!((config.tolerance() - 1e-9).abs() < 1e-25);

        config.set_processes(12).unwrap();
        assert_eq!(config.processes(), 12);
        assert_eq!(
            config.set_processes(0),
            Err(ConfigurationError::InvalidProcesses(0))
        );
        assert_eq!(config.processes(), 12);
    }

    #[test]
    fn text_representation() {
        let mut config = test_configuration();
        assert_eq!(
            config.to_string(),
            "solver: gurobi\n\
             tolerance: 1e-7\n\
             lower_bound: -1000.0\n\
             upper_bound: 1000.0\n\
             processes: 3\n"
        );
        config.set_solver("glpk").unwrap();
        config.set_tolerance(2.5e-6).unwrap();
        config.set_bounds((None, Some(42.5))).unwrap();
        config.set_processes(7).unwrap();
        let text = config.to_string();
        assert!(text.contains("solver: glpk\n"));
        assert!(text.contains(&format!("tolerance: {:?}\n", 2.5e-6)));
        assert!(text.contains("lower_bound: None\n"));
        assert!(text.contains("upper_bound: 42.5\n"));
        assert!(text.contains("processes: 7\n"));
    }

    #[test]
    fn html_representation() {
        let mut config = test_configuration();
        config.set_solver("cplex").unwrap();
        config.set_bounds((Some(-20.), Some(30.))).unwrap();
        config.set_processes(5).unwrap();
        let html = config.to_html();
        assert!(html.starts_with("<table>"));
        assert!(html.contains("<td><strong>Attribute</strong></td>"));
        for expected in [
            "<td><pre>solver</pre></td>",
            "<td>cplex</td>",
            "<td>1e-7</td>",
            "<td>-20.0</td>",
            "<td>30.0</td>",
            "<td>5</td>",
            "<td>Number of parallel processes</td>",
        ] {
            assert!(html.contains(expected), "{expected} missing from {html}");
        }
        // Rows are in the same order as the text representation
        let names = ["solver", "tolerance", "lower_bound", "upper_bound", "processes"];
        let positions: Vec<usize> = names
            .iter()
            .map(|name| html.find(&format!("<pre>{name}</pre>")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn html_escapes_solver_name() {
        let mut config = test_configuration();
        let interface: Arc<dyn SolverInterface> =
            Arc::new(SolverDescriptor::new("<b>fast & loose</b>"));
        config.set_solver(interface).unwrap();
        let html = config.to_html();
        assert!(html.contains("<td>&lt;b&gt;fast &amp; loose&lt;/b&gt;</td>"));
        assert!(!html.contains("<b>"));
        // The text representation is left as is
        assert!(config.to_string().contains("solver: <b>fast & loose</b>\n"));
    }

    // The only test touching the process-wide instance
    #[test]
    fn global_configuration_is_shared() {
        let original = configuration().tolerance();
        let first: *const Configuration = &*configuration();
        let second: *const Configuration = &*configuration();
        assert!(std::ptr::eq(first, second));

        configuration_mut().set_tolerance(1e-5).unwrap();
        assert!((configuration().tolerance() - 1e-5).abs() < 1e-25);
        configuration_mut().set_tolerance(original).unwrap();

        assert!(configuration().processes() >= 1);
        assert_eq!(
            configuration().bounds(),
            (Some(DEFAULT_LOWER_BOUND), Some(DEFAULT_UPPER_BOUND))
        );
    }
}
