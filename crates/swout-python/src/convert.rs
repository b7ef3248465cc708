use numpy::PyReadonlyArray1;
use pyo3::prelude::*;

use swout_core::OutputError;

/// Validate that a numpy array is C-contiguous and return its slice.
pub fn contiguous_slice<'py>(arr: &'py PyReadonlyArray1<'py, f64>) -> PyResult<&'py [f64]> {
    arr.as_slice().map_err(|_| {
        pyo3::exceptions::PyValueError::new_err("array must be C-contiguous")
    })
}

/// Validate length + contiguity of a numpy array.
pub fn checked_slice<'py>(
    arr: &'py PyReadonlyArray1<'py, f64>,
    expected_len: usize,
    name: &str,
) -> PyResult<&'py [f64]> {
    let slice = contiguous_slice(arr)?;
    if slice.len() != expected_len {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must have {} elements, got {}",
            name, expected_len, slice.len()
        )));
    }
    Ok(slice)
}

/// Map an engine error to a Python exception.
pub fn output_err(e: OutputError) -> PyErr {
    match e {
        OutputError::Io(io) => pyo3::exceptions::PyOSError::new_err(io.to_string()),
        other => pyo3::exceptions::PyValueError::new_err(other.to_string()),
    }
}

/// Reorder a column-major buffer of `nrow` rows into row-major order.
pub fn to_row_major(buf: &[f64], nrow: usize) -> Vec<f64> {
    if nrow == 0 {
        return Vec::new();
    }
    let ncol = buf.len() / nrow;
    let mut out = Vec::with_capacity(buf.len());
    for row in 0..nrow {
        for col in 0..ncol {
            out.push(buf[row + nrow * col]);
        }
    }
    out
}

