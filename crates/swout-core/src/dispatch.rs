//! Output dispatcher.
//!
//! Drives one simulation instance's output through the day loop:
//!
//! ```text
//! engine.new_year(&clock)
//! for each day: clock.new_day(doy); engine.end_day(&clock, &daily)
//! clock.end_year(); engine.flush(&clock, &daily)
//! ```
//!
//! `end_day` finalizes the periods that just rolled over, adds today to the
//! running sums and writes the rows that are due. `flush` finalizes and
//! writes the partial week, month and the year after the last day.

use std::io::Write;

use log::{debug, trace};

use crate::accumulator::Accumulators;
use crate::aggregate::{finalize_category, period_window};
use crate::calendar::{ModelClock, SimulationSpan};
use crate::config::{KeyConfig, OutputSetup};
use crate::error::OutputError;
use crate::format::{key_values, FormatContext};
use crate::keys::ObjType;
use crate::period::OutPeriod;
use crate::registry::Registry;
use crate::sinks::{ArraySink, GridSink, RowLeader, Sink, SinkSet, StatsSink, TextSink};
use crate::site::Site;
use crate::state::DailyState;

/// Period number of `period` used for bound checks, or `None` if the key
/// has no window for it.
fn period_index(
    period: OutPeriod,
    flush: bool,
    t_offset: u32,
    clock: &ModelClock,
    cfg: &KeyConfig,
) -> Option<u32> {
    match period {
        OutPeriod::Day => Some(clock.doy),
        _ => period_window(period, flush, t_offset, clock, cfg)
            .and_then(|w| u32::try_from(w.index).ok()),
    }
}

/// Index of today inside each period while summing.
fn accumulation_index(period: OutPeriod, clock: &ModelClock) -> u32 {
    match period {
        OutPeriod::Day | OutPeriod::Year => clock.doy,
        OutPeriod::Week => clock.week as u32 + 1,
        OutPeriod::Month => clock.month as u32 + 1,
    }
}

fn row_leader(period: OutPeriod, t_offset: u32, clock: &ModelClock) -> RowLeader {
    let subunit = match period {
        OutPeriod::Day => Some(clock.doy),
        OutPeriod::Week => Some((clock.week as u32 + 1).saturating_sub(t_offset)),
        OutPeriod::Month => Some((clock.month as u32 + 1).saturating_sub(t_offset)),
        OutPeriod::Year => None,
    };
    RowLeader {
        simyear: clock.simyear,
        subunit,
    }
}

/// Output state of one simulation instance, without file handles.
#[derive(Debug, Clone)]
pub struct OutputRun {
    pub setup: OutputSetup,
    pub registry: Registry,
    pub site: Site,
    pub accumulators: Accumulators,
    pub sinks: SinkSet,
    values: Vec<f64>,
}

impl OutputRun {
    pub fn new(setup: OutputSetup, site: Site) -> Result<Self, OutputError> {
        let registry = Registry::new(site.dims().map_err(OutputError::Invalid)?);
        debug!(
            "output run: {} active keys, periods {:?}",
            setup.active_keys().count(),
            setup.periods_in_use()
        );
        Ok(Self {
            setup,
            registry,
            site,
            accumulators: Accumulators::new(),
            sinks: SinkSet::default(),
            values: Vec::new(),
        })
    }

    pub fn with_array_sink(mut self, span: &SimulationSpan) -> Self {
        self.sinks.array = Some(ArraySink::new(&self.setup, &self.registry, span));
        self
    }

    pub fn with_grid_sink(mut self, span: &SimulationSpan, max_layers: usize) -> Self {
        self.sinks.grid = Some(GridSink::new(&self.setup, &self.registry, span, max_layers));
        self
    }

    pub fn with_stats_sink(mut self, span: &SimulationSpan) -> Self {
        self.sinks.stats = Some(StatsSink::new(&self.setup, &self.registry, span));
        self
    }

    /// Prepare iteration `n` (1-based): zero the running sums and the
    /// array sink, keep the running statistics.
    pub fn begin_iteration(&mut self, n: usize) {
        self.accumulators = Accumulators::new();
        if let Some(array) = self.sinks.array.as_mut() {
            array.clear();
        }
        if let Some(stats) = self.sinks.stats.as_mut() {
            stats.start_iteration(n);
        }
    }

    /// Clamp key bounds to the simulated days of the clock's year.
    pub fn new_year(&mut self, clock: &ModelClock) {
        self.setup.new_year(clock.firstdoy, clock.lastdoy);
    }

    pub fn end_day(&mut self, clock: &ModelClock, daily: &DailyState) -> Result<(), OutputError> {
        self.collect(clock, daily, false, 1, None)
    }

    pub fn flush(&mut self, clock: &ModelClock, daily: &DailyState) -> Result<(), OutputError> {
        self.collect(clock, daily, true, 0, None)
    }

    pub(crate) fn collect(
        &mut self,
        clock: &ModelClock,
        daily: &DailyState,
        flush: bool,
        t_offset: u32,
        text: Option<&mut dyn Sink>,
    ) -> Result<(), OutputError> {
        let periods = self.setup.periods_in_use();

        for category in ObjType::SUM_ORDER {
            for &p in &periods {
                if flush || clock.is_newperiod(p) {
                    finalize_category(
                        &self.setup,
                        category,
                        p,
                        flush,
                        t_offset,
                        clock,
                        &mut self.accumulators,
                        daily,
                        &self.site,
                    )?;
                }
            }
            if flush {
                continue;
            }
            for cfg in self
                .setup
                .active_keys()
                .filter(|k| k.key.category() == category)
            {
                for &p in &cfg.periods {
                    if cfg.in_bounds(accumulation_index(p, clock)) {
                        self.accumulators.accumulate(cfg.key, p, daily, &self.site)?;
                    }
                }
            }
        }

        self.write_due(clock, daily, flush, t_offset, text)
    }

    fn write_due(
        &mut self,
        clock: &ModelClock,
        daily: &DailyState,
        flush: bool,
        t_offset: u32,
        mut text: Option<&mut dyn Sink>,
    ) -> Result<(), OutputError> {
        let ctx = FormatContext {
            accs: &self.accumulators,
            daily,
            site: &self.site,
        };
        let mut targets: Vec<&mut dyn Sink> = self.sinks.active();
        if let Some(t) = text.as_deref_mut() {
            targets.push(t);
        }
        if targets.is_empty() {
            return Ok(());
        }

        for p in self.setup.periods_in_use() {
            let due = match p {
                OutPeriod::Day => !flush,
                OutPeriod::Week | OutPeriod::Month => flush || clock.is_newperiod(p),
                OutPeriod::Year => flush,
            };
            if !due {
                continue;
            }

            let leader = row_leader(p, t_offset, clock);
            trace!("{} row {:?}", p, leader);
            for sink in targets.iter_mut() {
                sink.begin_row(p, leader)?;
            }
            for cfg in self.setup.active_keys().filter(|k| k.subscribes(p)) {
                let in_bounds = period_index(p, flush, t_offset, clock, cfg)
                    .is_some_and(|idx| cfg.in_bounds(idx));
                if !in_bounds {
                    continue;
                }
                self.values.clear();
                key_values(cfg.key, p, &ctx, &mut self.values)?;
                for sink in targets.iter_mut() {
                    sink.write_key(cfg.key, p, leader, &self.values)?;
                }
            }
            for sink in targets.iter_mut() {
                sink.end_row(p)?;
            }
        }
        Ok(())
    }
}

/// An [`OutputRun`] with optional CSV files attached.
#[derive(Debug)]
pub struct OutputEngine<W: Write> {
    pub run: OutputRun,
    text: Option<TextSink<W>>,
}

impl<W: Write> OutputEngine<W> {
    pub fn new(run: OutputRun) -> Self {
        Self { run, text: None }
    }

    pub fn with_text(mut self, text: TextSink<W>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn text_mut(&mut self) -> Option<&mut TextSink<W>> {
        self.text.as_mut()
    }

    pub fn new_year(&mut self, clock: &ModelClock) {
        self.run.new_year(clock);
    }

    pub fn end_day(&mut self, clock: &ModelClock, daily: &DailyState) -> Result<(), OutputError> {
        let text = self.text.as_mut().map(|t| t as &mut dyn Sink);
        self.run.collect(clock, daily, false, 1, text)
    }

    /// Year-end flush; also flushes the CSV writers.
    pub fn flush(&mut self, clock: &ModelClock, daily: &DailyState) -> Result<(), OutputError> {
        let text = self.text.as_mut().map(|t| t as &mut dyn Sink);
        self.run.collect(clock, daily, true, 0, text)?;
        if let Some(t) = self.text.as_mut() {
            t.flush()?;
        }
        Ok(())
    }

    pub fn into_parts(self) -> (OutputRun, Option<TextSink<W>>) {
        (self.run, self.text)
    }
}
