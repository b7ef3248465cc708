use numpy::{PyArray1, PyArrayMethods, PyReadonlyArray1};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::convert::{checked_slice, output_err, to_row_major};

use swout_core::registry::{Registry, SiteDims};
use swout_core::{
    DailyState, ModelClock, OutKey, OutPeriod, OutputRun, OutputSetup, SimulationSpan, Site,
    SoilLayer,
};

/// Run the output engine over daily series and return the array output.
///
/// `swc` holds `n_layers` values per day, day-major. Returns a dict mapping
/// `"<KEY>_<PERIOD>"` to 2-D arrays of shape (rows, time columns + values).
#[pyfunction]
#[pyo3(signature = (setup, start_year, end_year, ppt, temp_avg, swc, n_layers=1, layer_width=10.0))]
#[allow(clippy::too_many_arguments)]
fn run_output<'py>(
    py: Python<'py>,
    setup: &str,
    start_year: u32,
    end_year: u32,
    ppt: PyReadonlyArray1<'py, f64>,
    temp_avg: PyReadonlyArray1<'py, f64>,
    swc: PyReadonlyArray1<'py, f64>,
    n_layers: usize,
    layer_width: f64,
) -> PyResult<Bound<'py, PyDict>> {
    let span = SimulationSpan::years(start_year, end_year)
        .map_err(pyo3::exceptions::PyValueError::new_err)?;
    let n_days = span.n_days();
    let ppt = checked_slice(&ppt, n_days, "ppt")?;
    let temp_avg = checked_slice(&temp_avg, n_days, "temp_avg")?;
    let swc = checked_slice(&swc, n_days * n_layers, "swc")?;

    let (setup, _) = OutputSetup::parse(setup, false).map_err(output_err)?;
    let layer = SoilLayer::new(layer_width, 0.0, 0.0, -3.0, 45.0, 6.0);
    let site = Site::uniform(n_layers, layer, n_layers.min(1))
        .map_err(pyo3::exceptions::PyValueError::new_err)?;
    let mut run = OutputRun::new(setup, site)
        .map_err(output_err)?
        .with_array_sink(&span);

    let mut clock = ModelClock::new(span);
    let mut daily = DailyState::new(0);
    let mut day = 0;
    for year in span.start_year..=span.end_year {
        clock.new_year(year);
        run.new_year(&clock);
        for doy in clock.days() {
            clock.new_day(doy);
            daily.weather.ppt = ppt[day];
            daily.weather.temp_avg = temp_avg[day];
            daily.soil.swc_today[..n_layers].copy_from_slice(&swc[day * n_layers..(day + 1) * n_layers]);
            run.end_day(&clock, &daily).map_err(output_err)?;
            daily.soil.end_day();
            day += 1;
        }
        clock.end_year();
        run.flush(&clock, &daily).map_err(output_err)?;
    }

    let dict = PyDict::new(py);
    let Some(array) = run.sinks.array.as_ref() else {
        return Ok(dict);
    };
    for cfg in run.setup.active_keys() {
        for &p in &cfg.periods {
            let Some(buf) = array.array(cfg.key, p) else {
                continue;
            };
            let ncol = array.ncol_total(cfg.key, p);
            let rows = array.rows_written(p).min(array.nrow(p));
            let mut values = to_row_major(buf, array.nrow(p));
            values.truncate(rows * ncol);
            let arr = PyArray1::from_vec(py, values).reshape([rows, ncol])?;
            dict.set_item(format!("{}_{}", cfg.key.name(), p.keyword()), arr)?;
        }
    }
    Ok(dict)
}

/// Column names of an output key for a site.
#[pyfunction]
#[pyo3(signature = (key, n_layers, n_evap_layers=1, species=Vec::new()))]
fn column_names(key: &str, n_layers: usize, n_evap_layers: usize, species: Vec<String>) -> PyResult<Vec<String>> {
    let key = OutKey::parse(key).map_err(output_err)?;
    let dims = SiteDims::new(n_layers, n_evap_layers, species)
        .map_err(pyo3::exceptions::PyValueError::new_err)?;
    Ok(Registry::new(dims).colnames(key).to_vec())
}

/// Parse setup file text into per-key settings and warnings.
#[pyfunction]
#[pyo3(signature = (text, deep_drain=false))]
fn parse_setup<'py>(
    py: Python<'py>,
    text: &str,
    deep_drain: bool,
) -> PyResult<(Bound<'py, PyDict>, Bound<'py, PyList>)> {
    let (setup, diags) = OutputSetup::parse(text, deep_drain).map_err(output_err)?;
    let keys = PyDict::new(py);
    for cfg in setup.active_keys() {
        let entry = PyDict::new(py);
        entry.set_item("sumtype", cfg.sumtype.keyword())?;
        let periods: Vec<&str> = cfg.periods.iter().map(|p| p.keyword()).collect();
        entry.set_item("periods", periods)?;
        entry.set_item("first", cfg.first)?;
        entry.set_item("last", cfg.last)?;
        keys.set_item(cfg.key.name(), entry)?;
    }
    let warnings: Vec<String> = diags.entries().iter().map(|d| d.message.clone()).collect();
    Ok((keys, PyList::new(py, warnings)?))
}

/// Number of rows reserved per period for a span of years.
#[pyfunction]
fn period_rows(start_year: u32, end_year: u32) -> PyResult<Vec<usize>> {
    let span = SimulationSpan::years(start_year, end_year)
        .map_err(pyo3::exceptions::PyValueError::new_err)?;
    Ok(OutPeriod::ALL.iter().map(|&p| span.n_rows(p)).collect())
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let m = PyModule::new(parent.py(), "output")?;
    m.add_function(wrap_pyfunction!(run_output, &m)?)?;
    m.add_function(wrap_pyfunction!(column_names, &m)?)?;
    m.add_function(wrap_pyfunction!(parse_setup, &m)?)?;
    m.add_function(wrap_pyfunction!(period_rows, &m)?)?;
    parent.add_submodule(&m)?;
    Ok(())
}
