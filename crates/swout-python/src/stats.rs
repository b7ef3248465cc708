use numpy::PyReadonlyArray1;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::convert::contiguous_slice;

use swout_core::stats::RunningStat;

define_value_result! {
    /// Running mean and sum of squared deviations.
    pub struct RunningStatResult from RunningStat {
        mean, ss,
    }
}

/// Welford statistics of a series, one value per iteration.
#[pyfunction]
fn running_stat<'py>(values: PyReadonlyArray1<'py, f64>) -> PyResult<RunningStatResult> {
    let mut stat = RunningStat::default();
    for (i, x) in contiguous_slice(&values)?.iter().enumerate() {
        stat.update(i + 1, *x);
    }
    Ok(RunningStatResult::from_core(&stat))
}

/// Mean and sample standard deviation of a series.
#[pyfunction]
fn summary<'py>(py: Python<'py>, values: PyReadonlyArray1<'py, f64>) -> PyResult<Bound<'py, PyDict>> {
    let slice = contiguous_slice(&values)?;
    let mut stat = RunningStat::default();
    for (i, x) in slice.iter().enumerate() {
        stat.update(i + 1, *x);
    }
    let dict = values_to_dict!(py, stat, mean, ss);
    dict.set_item("sd", stat.sd(slice.len()))?;
    Ok(dict)
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "stats")?;
    m.add_function(wrap_pyfunction!(running_stat, &m)?)?;
    m.add_function(wrap_pyfunction!(summary, &m)?)?;
    m.add_class::<RunningStatResult>()?;
    parent.add_submodule(&m)?;
    Ok(())
}
