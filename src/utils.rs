#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::optimization::{
    errors::{OptError, OptResult},
    nesterov::{
        traits::{
            BbPreference, ConstraintProjector, Evaluation, NesterovOptions, ObjectiveOracle,
            ScaleOptions, StepRule, WolfeOptions,
        },
        types::{Coords, DEFAULT_HISTORY_CAPACITY},
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D array-like into an owned coordinate vector.
#[cfg(feature = "python-bindings")]
pub fn extract_coords<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Coords> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array or sequence"))
    })?;
    Ok(Coords::from(slice.to_vec()))
}

#[cfg(feature = "python-bindings")]
pub fn build_nesterov_options(
    lr: f64, step_rule: Option<&str>, history: Option<usize>, bb_preference: Option<&str>,
    wolfe_c1: Option<f64>, wolfe_c2: Option<f64>, backtrack: Option<f64>,
    max_trials: Option<usize>,
) -> PyResult<NesterovOptions> {
    use std::str::FromStr;

    let rule = match step_rule {
        Some(name) => StepRule::from_str(name)?,
        None => StepRule::BarzilaiBorwein,
    };
    let preference = match bb_preference {
        Some(name) => BbPreference::from_str(name)?,
        None => BbPreference::Short,
    };
    let capacity = history.unwrap_or(DEFAULT_HISTORY_CAPACITY);
    let wolfe = WolfeOptions::with_overrides(wolfe_c1, wolfe_c2, backtrack, max_trials)?;
    let opts = NesterovOptions::new(lr, rule, preference, capacity, wolfe)?;
    Ok(opts)
}

/// `None` when `scales` is not given: the optimizer then runs single steps.
#[cfg(feature = "python-bindings")]
pub fn build_scale_options(
    scales: Option<usize>, coarse_iter: usize, fine_iter: usize, convergence_threshold: f64,
) -> PyResult<Option<ScaleOptions>> {
    match scales {
        Some(scales) => {
            Ok(Some(ScaleOptions::new(scales, coarse_iter, fine_iter, convergence_threshold)?))
        }
        None => Ok(None),
    }
}

/// Python callable `obj_and_grad_fn(x) -> (cost, grad)` as an objective oracle.
///
/// A `grad` of `None` marks a group without gradient; the step is skipped.
#[cfg(feature = "python-bindings")]
pub struct PyOracle {
    func: Py<PyAny>,
}

#[cfg(feature = "python-bindings")]
impl PyOracle {
    pub fn new(func: Py<PyAny>) -> Self {
        Self { func }
    }
}

#[cfg(feature = "python-bindings")]
impl ObjectiveOracle for PyOracle {
    fn evaluate(&mut self, x: &Coords) -> OptResult<Evaluation> {
        let result = Python::with_gil(|py| -> PyResult<Option<Evaluation>> {
            let out = self.func.call1(py, (x.to_vec().into_pyarray(py),))?;
            let (cost, grad): (f64, Option<Bound<'_, PyAny>>) = out.bind(py).extract()?;
            grad.map(|grad| {
                extract_coords(py, &grad, "gradient").map(|grad| Evaluation::new(cost, grad))
            })
            .transpose()
        })
        .map_err(|err| OptError::OracleFailure { text: err.to_string() })?;
        result.ok_or(OptError::GradientUnavailable)
    }
}

/// Python callable `constraint_fn(x)` as a projector.
///
/// The callable may modify the NumPy array in place and return `None`, or
/// return the projected coordinates.
#[cfg(feature = "python-bindings")]
pub struct PyProjector {
    func: Py<PyAny>,
}

#[cfg(feature = "python-bindings")]
impl PyProjector {
    pub fn new(func: Py<PyAny>) -> Self {
        Self { func }
    }
}

#[cfg(feature = "python-bindings")]
impl ConstraintProjector for PyProjector {
    fn project(&mut self, x: &mut Coords) -> OptResult<()> {
        let projected = Python::with_gil(|py| -> PyResult<Coords> {
            let arr = x.to_vec().into_pyarray(py);
            let out = self.func.call1(py, (arr.clone(),))?;
            let out = out.bind(py);
            if out.is_none() {
                let view = arr.readonly();
                let slice = view.as_slice().map_err(|_| {
                    PyValueError::new_err("constraint_fn left a non-contiguous array")
                })?;
                Ok(Coords::from(slice.to_vec()))
            } else {
                extract_coords(py, out, "constraint_fn result")
            }
        })
        .map_err(|err| OptError::ProjectorFailure { text: err.to_string() })?;
        *x = projected;
        Ok(())
    }
}
