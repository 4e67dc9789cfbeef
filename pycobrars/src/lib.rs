use std::any::Any;
use std::sync::Arc;

use cobrars_config::{
    configuration, configuration_mut, ConfigurationError, SolverInterface, SolverRef,
};
use pyo3::create_exception;
use pyo3::exceptions::{PyAssertionError, PyException, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyString;

create_exception!(_core, SolverNotFound, PyException);

fn to_py_err(err: ConfigurationError) -> PyErr {
    match err {
        ConfigurationError::SolverNotFound(_) => SolverNotFound::new_err(err.to_string()),
        ConfigurationError::InvalidBounds { .. } => PyAssertionError::new_err(err.to_string()),
        ConfigurationError::InvalidTolerance(_) | ConfigurationError::InvalidProcesses(_) => {
            PyValueError::new_err(err.to_string())
        }
    }
}

/// Solver interface provided from python, any object with a `Model` attribute
#[derive(Debug)]
struct PySolverInterface {
    name: String,
    module: PyObject,
}

impl SolverInterface for PySolverInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convert a python value into a solver reference
///
/// Strings are registry names, objects with a `Model` attribute are solver interfaces, and
/// anything else is looked up by its string form.
fn solver_ref(value: &Bound<'_, PyAny>) -> PyResult<SolverRef> {
    if let Ok(name) = value.extract::<String>() {
        return Ok(SolverRef::Name(name));
    }
    if value.hasattr("Model")? {
        let name = match value.getattr("__name__") {
            Ok(name) => name.extract::<String>()?,
            Err(_) => value.str()?.to_string(),
        };
        let interface: Arc<dyn SolverInterface> = Arc::new(PySolverInterface {
            name,
            module: value.clone().unbind(),
        });
        return Ok(SolverRef::Interface(interface));
    }
    Ok(SolverRef::Name(value.str()?.to_string()))
}

/// Convert a solver interface back into the python value it was set from
///
/// Python provided interfaces give back the original object, registry backends their name.
fn solver_object(py: Python<'_>, solver: &Arc<dyn SolverInterface>) -> PyObject {
    match solver.as_any().downcast_ref::<PySolverInterface>() {
        Some(interface) => interface.module.clone_ref(py),
        None => PyString::new(py, solver.name()).into_any().unbind(),
    }
}

/// View of the process-wide configuration, every instance shares the same values
#[pyclass(name = "Configuration")]
struct PyConfiguration {}

#[pymethods]
impl PyConfiguration {
    #[new]
    fn new() -> Self {
        PyConfiguration {}
    }

    #[getter]
    fn solver(&self, py: Python<'_>) -> Option<PyObject> {
        configuration().solver().map(|s| solver_object(py, s))
    }

    #[setter]
    fn set_solver(&self, value: Bound<'_, PyAny>) -> PyResult<()> {
        let solver = solver_ref(&value)?;
        configuration_mut().set_solver(solver).map_err(to_py_err)
    }

    #[getter]
    fn tolerance(&self) -> f64 {
        configuration().tolerance()
    }

    #[setter]
    fn set_tolerance(&self, value: f64) -> PyResult<()> {
        configuration_mut().set_tolerance(value).map_err(to_py_err)
    }

    #[getter]
    fn lower_bound(&self) -> Option<f64> {
        configuration().lower_bound()
    }

    #[setter]
    fn set_lower_bound(&self, value: Option<f64>) -> PyResult<()> {
        configuration_mut().set_lower_bound(value).map_err(to_py_err)
    }

    #[getter]
    fn upper_bound(&self) -> Option<f64> {
        configuration().upper_bound()
    }

    #[setter]
    fn set_upper_bound(&self, value: Option<f64>) -> PyResult<()> {
        configuration_mut().set_upper_bound(value).map_err(to_py_err)
    }

    #[getter]
    fn bounds(&self) -> (Option<f64>, Option<f64>) {
        configuration().bounds()
    }

    #[setter]
    fn set_bounds(&self, value: (Option<f64>, Option<f64>)) -> PyResult<()> {
        configuration_mut().set_bounds(value).map_err(to_py_err)
    }

    #[getter]
    fn processes(&self) -> usize {
        configuration().processes()
    }

    #[setter]
    fn set_processes(&self, value: usize) -> PyResult<()> {
        configuration_mut().set_processes(value).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        configuration().to_string()
    }

    fn _repr_html_(&self) -> String {
        configuration().to_html()
    }
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyConfiguration>()?;
    m.add("SolverNotFound", m.py().get_type::<SolverNotFound>())?;
    Ok(())
}
