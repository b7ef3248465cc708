//! Gridded (netCDF-style) output arrays.
//!
//! Each active (key, period) buffer holds one block per variable, laid out
//! row-major with vegetation type fastest, then soil layer, then time.
//! Soil extents are widened to a domain-wide layer count; layers beyond
//! the site's own are written as the missing sentinel.

use log::debug;

use crate::calendar::SimulationSpan;
use crate::config::OutputSetup;
use crate::constants::N_PERIODS;
use crate::error::OutputError;
use crate::index::{pad_missing_layers, OffsetTable};
use crate::keys::{OutKey, N_KEYS};
use crate::period::OutPeriod;
use crate::registry::Registry;

use super::{RowLeader, Sink};

#[derive(Debug, Clone, PartialEq)]
struct GridBuffer {
    table: OffsetTable,
    /// (variable, layer, vegtype) of every within-row column.
    placement: Vec<(usize, usize, usize)>,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSink {
    buffers: Vec<[Option<GridBuffer>; N_PERIODS]>,
    /// Leader rows per period: simulation year, then sub-unit if any.
    times: [Vec<RowLeader>; N_PERIODS],
    nrow: [usize; N_PERIODS],
    irow: [usize; N_PERIODS],
    n_layers: usize,
    max_layers: usize,
}

impl GridSink {
    /// Allocate grids of every active key and period, with soil extents of
    /// at least `max_layers`.
    pub fn new(
        setup: &OutputSetup,
        registry: &Registry,
        span: &SimulationSpan,
        max_layers: usize,
    ) -> Self {
        let mut nrow = [0; N_PERIODS];
        for p in OutPeriod::ALL {
            nrow[p.index()] = span.n_rows(p);
        }
        let mut buffers: Vec<[Option<GridBuffer>; N_PERIODS]> =
            (0..N_KEYS).map(|_| Default::default()).collect();

        for cfg in setup.active_keys() {
            let info = registry.info(cfg.key);
            let placement: Vec<_> = (0..info.ncol).filter_map(|c| info.locate(c)).collect();
            for &p in &cfg.periods {
                let table = OffsetTable::new(info, nrow[p.index()], max_layers);
                let values = vec![0.0; table.len()];
                buffers[cfg.key.index()][p.index()] = Some(GridBuffer {
                    table,
                    placement: placement.clone(),
                    values,
                });
            }
        }
        let n_layers = registry.dims.n_layers;
        debug!(
            "grid sink: {} site layers padded to {}",
            n_layers,
            max_layers.max(n_layers)
        );

        Self {
            buffers,
            times: Default::default(),
            nrow,
            irow: [0; N_PERIODS],
            n_layers,
            max_layers: max_layers.max(n_layers),
        }
    }

    /// Flat grid of `key` for `period`, if allocated.
    pub fn grid(&self, key: OutKey, period: OutPeriod) -> Option<&[f64]> {
        self.buffers[key.index()][period.index()]
            .as_ref()
            .map(|b| b.values.as_slice())
    }

    /// Offset table of `key` for `period`, if allocated.
    pub fn table(&self, key: OutKey, period: OutPeriod) -> Option<&OffsetTable> {
        self.buffers[key.index()][period.index()]
            .as_ref()
            .map(|b| &b.table)
    }

    /// Value of variable `var` at (row, layer, vegtype).
    pub fn get(
        &self,
        key: OutKey,
        period: OutPeriod,
        var: usize,
        t: usize,
        s: usize,
        v: usize,
    ) -> Option<f64> {
        let buf = self.buffers[key.index()][period.index()].as_ref()?;
        buf.values.get(buf.table.position(var, t, s, v)).copied()
    }

    /// Time leaders written so far for `period`.
    pub fn times(&self, period: OutPeriod) -> &[RowLeader] {
        &self.times[period.index()]
    }

    pub fn max_layers(&self) -> usize {
        self.max_layers
    }
}

impl Sink for GridSink {
    fn begin_row(&mut self, period: OutPeriod, leader: RowLeader) -> Result<(), OutputError> {
        if self.irow[period.index()] < self.nrow[period.index()] {
            self.times[period.index()].push(leader);
        }
        Ok(())
    }

    fn write_key(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        _leader: RowLeader,
        values: &[f64],
    ) -> Result<(), OutputError> {
        let row = self.irow[period.index()];
        let nrow = self.nrow[period.index()];
        let n_layers = self.n_layers;
        let Some(buf) = self.buffers[key.index()][period.index()].as_mut() else {
            return Ok(());
        };
        if row >= nrow {
            return Err(OutputError::RowOverflow { key, row, nrow });
        }

        for (&(var, s, v), x) in buf.placement.iter().zip(values) {
            let pos = buf.table.position(var, row, s, v);
            buf.values[pos] = *x;
        }
        if key.has_soil_layers() {
            pad_missing_layers(&mut buf.values, &buf.table, row, n_layers);
        }
        Ok(())
    }

    fn end_row(&mut self, period: OutPeriod) -> Result<(), OutputError> {
        self.irow[period.index()] += 1;
        Ok(())
    }
}
