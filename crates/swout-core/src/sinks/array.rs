//! Column-major in-memory output arrays.
//!
//! One buffer per active (key, period) of `nrow * (n_time_cols + ncol)`
//! values. Inside a column the row varies fastest; the first columns hold
//! the simulation year and the day, week or month number.

use log::debug;

use crate::calendar::SimulationSpan;
use crate::config::OutputSetup;
use crate::constants::N_PERIODS;
use crate::error::OutputError;
use crate::index::{column_major, column_major_layered, flat_column};
use crate::keys::{OutKey, N_KEYS};
use crate::period::OutPeriod;
use crate::registry::{Registry, VariableShape};

use super::{RowLeader, Sink};

/// Columns of one variable inside a key's row.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    var_col: usize,
    shape: VariableShape,
}

impl Block {
    /// Column-major position of (s, v). Layer-only variables are addressed
    /// as blocks of `n_sl` layer columns.
    fn position(&self, row: usize, nrow: usize, n_time_cols: usize, s: usize, v: usize) -> usize {
        let shape = self.shape;
        if shape.n_pft == 0 && shape.n_sl > 0 && self.var_col % shape.n_sl == 0 {
            column_major_layered(row, nrow, n_time_cols, s, self.var_col / shape.n_sl, shape.n_sl)
        } else {
            column_major(row, nrow, n_time_cols, flat_column(self.var_col, s, v, shape.n_pft))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySink {
    /// Buffers indexed by key, then period.
    buffers: Vec<[Option<Vec<f64>>; N_PERIODS]>,
    /// Variable blocks indexed by key.
    blocks: Vec<Vec<Block>>,
    ncol: [usize; N_KEYS],
    nrow: [usize; N_PERIODS],
    irow: [usize; N_PERIODS],
}

impl ArraySink {
    /// Allocate the arrays of every active key and period.
    pub fn new(setup: &OutputSetup, registry: &Registry, span: &SimulationSpan) -> Self {
        let mut nrow = [0; N_PERIODS];
        for p in OutPeriod::ALL {
            nrow[p.index()] = span.n_rows(p);
        }
        let mut ncol = [0; N_KEYS];
        let mut buffers: Vec<[Option<Vec<f64>>; N_PERIODS]> =
            (0..N_KEYS).map(|_| Default::default()).collect();
        let mut blocks = vec![Vec::new(); N_KEYS];

        for cfg in setup.active_keys() {
            let k = cfg.key.index();
            let info = registry.info(cfg.key);
            ncol[k] = info.ncol;
            blocks[k] = info
                .variables
                .iter()
                .zip(&info.var_cols)
                .map(|(var, &var_col)| Block {
                    var_col,
                    shape: var.shape,
                })
                .collect();
            for &p in &cfg.periods {
                let len = nrow[p.index()] * (p.n_time_cols() + ncol[k]);
                buffers[k][p.index()] = Some(vec![0.0; len]);
            }
        }
        debug!("array sink: rows per period {:?}", nrow);

        Self {
            buffers,
            blocks,
            ncol,
            nrow,
            irow: [0; N_PERIODS],
        }
    }

    /// Column-major array of `key` for `period`, if allocated.
    pub fn array(&self, key: OutKey, period: OutPeriod) -> Option<&[f64]> {
        self.buffers[key.index()][period.index()].as_deref()
    }

    pub fn nrow(&self, period: OutPeriod) -> usize {
        self.nrow[period.index()]
    }

    /// Total columns of `key` for `period`, time columns included.
    pub fn ncol_total(&self, key: OutKey, period: OutPeriod) -> usize {
        period.n_time_cols() + self.ncol[key.index()]
    }

    /// Rows written so far for `period`.
    pub fn rows_written(&self, period: OutPeriod) -> usize {
        self.irow[period.index()]
    }

    /// Value at (row, col) of the full array, time columns included.
    pub fn get(&self, key: OutKey, period: OutPeriod, row: usize, col: usize) -> Option<f64> {
        let buf = self.array(key, period)?;
        buf.get(column_major(row, self.nrow(period), 0, col)).copied()
    }

    /// Zero every array and rewind the row cursors.
    pub fn clear(&mut self) {
        for per_key in &mut self.buffers {
            for buf in per_key.iter_mut().flatten() {
                buf.fill(0.0);
            }
        }
        self.irow = [0; N_PERIODS];
    }
}

impl Sink for ArraySink {
    fn write_key(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        leader: RowLeader,
        values: &[f64],
    ) -> Result<(), OutputError> {
        let row = self.irow[period.index()];
        let nrow = self.nrow[period.index()];
        let Some(buf) = self.buffers[key.index()][period.index()].as_mut() else {
            return Ok(());
        };
        if row >= nrow {
            return Err(OutputError::RowOverflow { key, row, nrow });
        }

        let n_time_cols = period.n_time_cols();
        for (c, t) in leader.values().enumerate() {
            buf[column_major(row, nrow, 0, c)] = t;
        }
        for block in &self.blocks[key.index()] {
            for s in 0..block.shape.sl_extent() {
                for v in 0..block.shape.pft_extent() {
                    let col = flat_column(block.var_col, s, v, block.shape.n_pft);
                    let value = values.get(col).copied().ok_or(OutputError::Unhandled {
                        key,
                        context: "array row shorter than its columns",
                    })?;
                    buf[block.position(row, nrow, n_time_cols, s, v)] = value;
                }
            }
        }
        Ok(())
    }

    fn end_row(&mut self, period: OutPeriod) -> Result<(), OutputError> {
        self.irow[period.index()] += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::period::OutSum;
    use crate::registry::SiteDims;

    fn sink() -> ArraySink {
        let mut setup = OutputSetup::new();
        setup
            .enable(
                OutKey::Temp,
                OutSum::Average,
                &[OutPeriod::Month, OutPeriod::Year],
                1,
                366,
                false,
                &mut Diagnostics::new(),
            )
            .unwrap();
        let registry = Registry::new(SiteDims::new(2, 1, vec![]).unwrap());
        let span = SimulationSpan::years(2001, 2002).unwrap();
        ArraySink::new(&setup, &registry, &span)
    }

    #[test]
    fn only_active_pairs_are_allocated() {
        let s = sink();
        assert_eq!(s.array(OutKey::Temp, OutPeriod::Month).unwrap().len(), 24 * 8);
        assert_eq!(s.array(OutKey::Temp, OutPeriod::Year).unwrap().len(), 2 * 7);
        assert!(s.array(OutKey::Temp, OutPeriod::Day).is_none());
        assert!(s.array(OutKey::Precip, OutPeriod::Month).is_none());
        assert_eq!(s.ncol_total(OutKey::Temp, OutPeriod::Month), 8);
    }

    #[test]
    fn rows_are_column_major_with_leader() {
        let mut s = sink();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        for month in 1..=2 {
            let leader = RowLeader {
                simyear: 2001,
                subunit: Some(month),
            };
            s.write_key(OutKey::Temp, OutPeriod::Month, leader, &values)
                .unwrap();
            s.end_row(OutPeriod::Month).unwrap();
        }
        assert_eq!(s.rows_written(OutPeriod::Month), 2);
        assert_eq!(s.get(OutKey::Temp, OutPeriod::Month, 1, 0), Some(2001.0));
        assert_eq!(s.get(OutKey::Temp, OutPeriod::Month, 1, 1), Some(2.0));
        assert_eq!(s.get(OutKey::Temp, OutPeriod::Month, 1, 7), Some(6.0));
        let buf = s.array(OutKey::Temp, OutPeriod::Month).unwrap();
        // Row 1 of the first data column.
        assert_eq!(buf[24 * 2 + 1], 1.0);

        s.clear();
        assert_eq!(s.rows_written(OutPeriod::Month), 0);
        assert_eq!(s.get(OutKey::Temp, OutPeriod::Month, 1, 0), Some(0.0));
    }

    #[test]
    fn layered_keys_keep_column_order() {
        let mut setup = OutputSetup::new();
        let mut diags = Diagnostics::new();
        for key in [OutKey::SoilTemp, OutKey::Transp] {
            setup
                .enable(key, OutSum::Average, &[OutPeriod::Year], 1, 366, false, &mut diags)
                .unwrap();
        }
        let registry = Registry::new(SiteDims::new(2, 1, vec![]).unwrap());
        let span = SimulationSpan::years(2001, 2002).unwrap();
        let mut s = ArraySink::new(&setup, &registry, &span);
        let leader = RowLeader {
            simyear: 2002,
            subunit: None,
        };

        for key in [OutKey::SoilTemp, OutKey::Transp] {
            let values: Vec<f64> = (0..registry.ncol(key)).map(|c| c as f64 + 0.5).collect();
            s.write_key(key, OutPeriod::Year, leader, &values).unwrap();
            for (c, v) in values.iter().enumerate() {
                assert_eq!(s.get(key, OutPeriod::Year, 0, 1 + c), Some(*v), "{} col {}", key, c);
            }
        }

        let err = s
            .write_key(OutKey::Transp, OutPeriod::Year, leader, &[0.0; 3])
            .unwrap_err();
        assert!(matches!(err, OutputError::Unhandled { key: OutKey::Transp, .. }));
    }

    #[test]
    fn writing_past_the_last_row_fails() {
        let mut s = sink();
        let leader = RowLeader {
            simyear: 2001,
            subunit: None,
        };
        for _ in 0..2 {
            s.write_key(OutKey::Temp, OutPeriod::Year, leader, &[0.0; 6])
                .unwrap();
            s.end_row(OutPeriod::Year).unwrap();
        }
        let err = s
            .write_key(OutKey::Temp, OutPeriod::Year, leader, &[0.0; 6])
            .unwrap_err();
        assert!(matches!(err, OutputError::RowOverflow { row: 2, nrow: 2, .. }));
    }
}
