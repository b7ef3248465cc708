//! Dimensional index calculator.
//!
//! Pure functions that map (variable, time row, soil layer, vegetation
//! type) to flat offsets. Two layouts are used:
//!
//! - row-major per variable (`nc_offset`, [`OffsetTable`]): vegetation type
//!   fastest, then soil layer, then time; variables of a key occupy
//!   back-to-back blocks. Used by the grid sink.
//! - column-major (`column_major`): the row varies fastest inside each
//!   column, after the leading time columns. Used by the array and
//!   running-statistics sinks.
//!
//! Absent dimensions are passed as extent 0 or 1; both count as 1.

use smallvec::SmallVec;

use crate::constants::SW_MISSING;
use crate::registry::{KeyInfo, VariableShape};

/// Offset of (t, s, v) inside one variable's block.
pub fn nc_offset(t: usize, s: usize, v: usize, n_sl: usize, n_pft: usize) -> usize {
    let n_sl = n_sl.max(1);
    let n_pft = n_pft.max(1);
    v + n_pft * (s + n_sl * t)
}

/// Within-row column index of (s, v) of a variable starting at column
/// `var_col`.
pub fn flat_column(var_col: usize, s: usize, v: usize, n_pft: usize) -> usize {
    var_col + s * n_pft.max(1) + v
}

/// Column-major offset of `row` in data column `col`, after `n_time_cols`
/// leading time columns.
pub fn column_major(row: usize, nrow: usize, n_time_cols: usize, col: usize) -> usize {
    row + nrow * (n_time_cols + col)
}

/// Column-major offset of soil layer `layer` in column block `block`, where
/// each block spans `n_layers` columns.
pub fn column_major_layered(
    row: usize,
    nrow: usize,
    n_time_cols: usize,
    layer: usize,
    block: usize,
    n_layers: usize,
) -> usize {
    column_major(row, nrow, n_time_cols, layer + n_layers * block)
}

/// Per-variable block offsets of one (key, period) buffer.
///
/// Soil extents can be widened to a domain-wide maximum so that sites with
/// different layer counts share one layout; the extra layers are filled
/// with [`SW_MISSING`].
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetTable {
    nrow: usize,
    shapes: SmallVec<[VariableShape; 8]>,
    offsets: SmallVec<[usize; 8]>,
    len: usize,
}

impl OffsetTable {
    /// Build the table for `nrow` rows. Variables with a soil dimension use
    /// `max_layers` as their extent when it is larger.
    pub fn new(info: &KeyInfo, nrow: usize, max_layers: usize) -> Self {
        let mut shapes = SmallVec::with_capacity(info.variables.len());
        let mut offsets = SmallVec::with_capacity(info.variables.len());
        let mut len = 0;
        for var in &info.variables {
            let mut shape = var.shape;
            if shape.n_sl > 0 && info.key.has_soil_layers() {
                shape.n_sl = shape.n_sl.max(max_layers);
            }
            offsets.push(len);
            len += nrow * shape.n_cols();
            shapes.push(shape);
        }
        Self {
            nrow,
            shapes,
            offsets,
            len,
        }
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    /// Stored (possibly padded) shape of variable `var`.
    pub fn shape(&self, var: usize) -> VariableShape {
        self.shapes[var]
    }

    /// Start of variable `var`'s block.
    pub fn offset(&self, var: usize) -> usize {
        self.offsets[var]
    }

    /// Flat position of (var, t, s, v).
    pub fn position(&self, var: usize, t: usize, s: usize, v: usize) -> usize {
        let shape = self.shapes[var];
        self.offsets[var] + nc_offset(t, s, v, shape.n_sl, shape.n_pft)
    }
}

/// Fill soil layers `n_layers..` of row `t` with the missing sentinel.
///
/// Returns the number of cells written. In-range layers are untouched.
pub fn pad_missing_layers(buf: &mut [f64], table: &OffsetTable, t: usize, n_layers: usize) -> usize {
    let mut written = 0;
    for var in 0..table.shapes.len() {
        let shape = table.shape(var);
        if shape.n_sl <= n_layers {
            continue;
        }
        for s in n_layers..shape.n_sl {
            for v in 0..shape.pft_extent() {
                buf[table.position(var, t, s, v)] = SW_MISSING;
                written += 1;
            }
        }
    }
    written
}
