//! Running statistics across repeated iterations of a run.
//!
//! Layout matches the array sink: column-major per (key, period) with the
//! time columns first. Time columns are stored as-is; value cells hold a
//! running mean and sum of squares.

use crate::calendar::SimulationSpan;
use crate::config::OutputSetup;
use crate::constants::{N_PERIODS, NAME_SEP, OUT_DIGITS, OUTSEP};
use crate::error::OutputError;
use crate::index::column_major;
use crate::keys::{OutKey, N_KEYS};
use crate::period::OutPeriod;
use crate::registry::Registry;
use crate::stats::RunningCells;

use super::{RowLeader, Sink};

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSink {
    cells: Vec<[Option<RunningCells>; N_PERIODS]>,
    ncol: [usize; N_KEYS],
    nrow: [usize; N_PERIODS],
    irow: [usize; N_PERIODS],
    iteration: usize,
}

impl StatsSink {
    pub fn new(setup: &OutputSetup, registry: &Registry, span: &SimulationSpan) -> Self {
        let mut nrow = [0; N_PERIODS];
        for p in OutPeriod::ALL {
            nrow[p.index()] = span.n_rows(p);
        }
        let mut ncol = [0; N_KEYS];
        let mut cells: Vec<[Option<RunningCells>; N_PERIODS]> =
            (0..N_KEYS).map(|_| Default::default()).collect();
        for cfg in setup.active_keys() {
            let k = cfg.key.index();
            ncol[k] = registry.ncol(cfg.key);
            for &p in &cfg.periods {
                let len = nrow[p.index()] * (p.n_time_cols() + ncol[k]);
                cells[k][p.index()] = Some(RunningCells::new(len));
            }
        }
        Self {
            cells,
            ncol,
            nrow,
            irow: [0; N_PERIODS],
            iteration: 1,
        }
    }

    /// Start iteration `n` (1-based) and rewind the row cursors.
    pub fn start_iteration(&mut self, n: usize) {
        self.iteration = n.max(1);
        self.irow = [0; N_PERIODS];
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Drop all statistics.
    pub fn reset(&mut self) {
        for per_key in &mut self.cells {
            for c in per_key.iter_mut().flatten() {
                c.reset();
            }
        }
        self.irow = [0; N_PERIODS];
        self.iteration = 1;
    }

    pub fn nrow(&self, period: OutPeriod) -> usize {
        self.nrow[period.index()]
    }

    /// Running mean of data column `col` at `row`.
    pub fn mean(&self, key: OutKey, period: OutPeriod, row: usize, col: usize) -> Option<f64> {
        let cells = self.cells[key.index()][period.index()].as_ref()?;
        let idx = column_major(row, self.nrow(period), period.n_time_cols(), col);
        (idx < cells.len()).then(|| cells.mean(idx))
    }

    /// Sample standard deviation of data column `col` at `row` after
    /// `iterations` iterations.
    pub fn sd(
        &self,
        key: OutKey,
        period: OutPeriod,
        row: usize,
        col: usize,
        iterations: usize,
    ) -> Option<f64> {
        let cells = self.cells[key.index()][period.index()].as_ref()?;
        let idx = column_major(row, self.nrow(period), period.n_time_cols(), col);
        (idx < cells.len()).then(|| cells.sd(idx, iterations))
    }

    /// `,mean,sd` pairs of every data column of `key` at `row`.
    pub fn summary_row(
        &self,
        key: OutKey,
        period: OutPeriod,
        row: usize,
        iterations: usize,
    ) -> Result<String, OutputError> {
        let cells = self.cells[key.index()][period.index()]
            .as_ref()
            .ok_or(OutputError::Unhandled {
                key,
                context: "running statistics",
            })?;
        let nrow = self.nrow(period);
        if row >= nrow {
            return Err(OutputError::RowOverflow { key, row, nrow });
        }
        let sep = OUTSEP as char;
        let mut out = String::new();
        for col in 0..self.ncol[key.index()] {
            let idx = column_major(row, nrow, period.n_time_cols(), col);
            out.push_str(&format!(
                "{sep}{:.prec$}{sep}{:.prec$}",
                cells.mean(idx),
                cells.sd(idx, iterations),
                prec = OUT_DIGITS
            ));
        }
        Ok(out)
    }
}

/// Aggregated header fields of `key`: `<KEY>_<col>_Mean`, `<KEY>_<col>_SD`.
pub fn summary_header(key: OutKey, registry: &Registry) -> Vec<String> {
    registry
        .colnames(key)
        .iter()
        .flat_map(|c| {
            let stem = format!("{}{}{}", key.name(), NAME_SEP, c);
            [
                format!("{}{}Mean", stem, NAME_SEP),
                format!("{}{}SD", stem, NAME_SEP),
            ]
        })
        .collect()
}

impl Sink for StatsSink {
    fn write_key(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        leader: RowLeader,
        values: &[f64],
    ) -> Result<(), OutputError> {
        let row = self.irow[period.index()];
        let nrow = self.nrow[period.index()];
        let n = self.iteration;
        let Some(cells) = self.cells[key.index()][period.index()].as_mut() else {
            return Ok(());
        };
        if row >= nrow {
            return Err(OutputError::RowOverflow { key, row, nrow });
        }
        for (c, t) in leader.values().enumerate() {
            cells.set(column_major(row, nrow, 0, c), t);
        }
        let n_time_cols = period.n_time_cols();
        for (col, x) in values.iter().enumerate() {
            cells.update(column_major(row, nrow, n_time_cols, col), n, *x);
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
    use approx::assert_relative_eq;

    fn setup() -> (OutputSetup, Registry, SimulationSpan) {
        let mut setup = OutputSetup::new();
        setup
            .enable(
                OutKey::SoilInf,
                OutSum::Sum,
                &[OutPeriod::Year],
                1,
                366,
                false,
                &mut Diagnostics::new(),
            )
            .unwrap();
        let registry = Registry::new(SiteDims::new(1, 1, vec![]).unwrap());
        (setup, registry, SimulationSpan::years(2001, 2001).unwrap())
    }

    #[test]
    fn statistics_accumulate_over_iterations() {
        let (setup, registry, span) = setup();
        let mut s = StatsSink::new(&setup, &registry, &span);
        let leader = RowLeader {
            simyear: 2001,
            subunit: None,
        };
        let sample = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        for (i, x) in sample.iter().enumerate() {
            s.start_iteration(i + 1);
            s.begin_row(OutPeriod::Year, leader).unwrap();
            s.write_key(OutKey::SoilInf, OutPeriod::Year, leader, &[*x])
                .unwrap();
            s.end_row(OutPeriod::Year).unwrap();
        }
        assert_relative_eq!(s.mean(OutKey::SoilInf, OutPeriod::Year, 0, 0).unwrap(), 5.0);
        assert_relative_eq!(
            s.sd(OutKey::SoilInf, OutPeriod::Year, 0, 0, 8).unwrap(),
            2.138089935,
            epsilon = 1e-9
        );
        assert_eq!(
            s.summary_row(OutKey::SoilInf, OutPeriod::Year, 0, 8).unwrap(),
            ",5.000000,2.138090"
        );

        s.reset();
        assert_eq!(s.mean(OutKey::SoilInf, OutPeriod::Year, 0, 0), Some(0.0));
        assert_eq!(s.iteration(), 1);
    }

    #[test]
    fn summary_of_inactive_key_is_unhandled() {
        let (setup, registry, span) = setup();
        let s = StatsSink::new(&setup, &registry, &span);
        assert!(matches!(
            s.summary_row(OutKey::Temp, OutPeriod::Year, 0, 1),
            Err(OutputError::Unhandled { .. })
        ));
        assert!(matches!(
            s.summary_row(OutKey::SoilInf, OutPeriod::Year, 1, 1),
            Err(OutputError::RowOverflow { .. })
        ));
    }

    #[test]
    fn header_pairs_mean_and_sd() {
        let (_, registry, _) = setup();
        assert_eq!(
            summary_header(OutKey::SnowPack, &registry),
            vec![
                "SNOWPACK_snowpackWaterEquivalent_cm_Mean",
                "SNOWPACK_snowpackWaterEquivalent_cm_SD",
                "SNOWPACK_snowdepth_cm_Mean",
                "SNOWPACK_snowdepth_cm_SD",
            ]
        );
    }
}
