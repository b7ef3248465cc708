//! Simulation calendar clock.
//!
//! Tracks year, day of year, base-0 week and month, and raises the
//! "new period" flags the output dispatcher reacts to:
//! - `Day` is always new
//! - `Week`/`Month` become new on the first day of the next week/month,
//!   never on the first simulated day of a year
//! - all periods become new once the day loop has passed `lastdoy`

use crate::constants::{MAX_MONTHS, MAX_WEEKS, N_PERIODS, WKDAYS};
use crate::period::OutPeriod;

const DAYS_IN_MONTH: [u32; MAX_MONTHS] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year test.
pub fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Last day of year (365 or 366).
pub fn last_doy(year: u32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Days of each month of `year`.
pub fn days_in_months(year: u32) -> [u32; MAX_MONTHS] {
    let mut days = DAYS_IN_MONTH;
    if is_leap_year(year) {
        days[1] = 29;
    }
    days
}

/// Cumulative days at the end of each month.
pub fn cumulative_month_days(days: &[u32; MAX_MONTHS]) -> [u32; MAX_MONTHS] {
    let mut cum = [0; MAX_MONTHS];
    let mut total = 0;
    for (c, d) in cum.iter_mut().zip(days) {
        total += d;
        *c = total;
    }
    cum
}

/// Base-0 month of a base-1 day of year.
pub fn doy_to_month(doy: u32, cum_monthdays: &[u32; MAX_MONTHS]) -> usize {
    cum_monthdays
        .iter()
        .position(|&c| doy <= c)
        .unwrap_or(MAX_MONTHS - 1)
}

/// Base-0 week of a base-1 day of year.
pub fn doy_to_week(doy: u32) -> usize {
    (doy.saturating_sub(1) / WKDAYS) as usize
}

/// First and last simulated day of the run, with an optional offset added
/// to every reported year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSpan {
    pub start_year: u32,
    pub end_year: u32,
    pub start_doy: u32,
    pub end_doy: u32,
    pub year_offset: i32,
}

impl SimulationSpan {
    /// Create a span covering whole calendar years.
    pub fn years(start_year: u32, end_year: u32) -> Result<Self, String> {
        Self::new(start_year, end_year, 1, last_doy(end_year))
    }

    /// Create a span with partial first and last years.
    pub fn new(start_year: u32, end_year: u32, start_doy: u32, end_doy: u32) -> Result<Self, String> {
        if end_year < start_year {
            return Err(format!(
                "end year {} is before start year {}",
                end_year, start_year
            ));
        }
        if start_doy == 0 || start_doy > last_doy(start_year) {
            return Err(format!("start day {} is outside year {}", start_doy, start_year));
        }
        if end_doy == 0 || end_doy > last_doy(end_year) {
            return Err(format!("end day {} is outside year {}", end_doy, end_year));
        }
        if start_year == end_year && end_doy < start_doy {
            return Err(format!(
                "end day {} is before start day {} of a single-year run",
                end_doy, start_doy
            ));
        }
        Ok(Self {
            start_year,
            end_year,
            start_doy,
            end_doy,
            year_offset: 0,
        })
    }

    pub fn with_year_offset(mut self, offset: i32) -> Self {
        self.year_offset = offset;
        self
    }

    pub fn n_years(&self) -> usize {
        (self.end_year - self.start_year + 1) as usize
    }

    /// Number of simulated days over the whole span.
    pub fn n_days(&self) -> usize {
        if self.start_year == self.end_year {
            return (self.end_doy - self.start_doy + 1) as usize;
        }
        let first = last_doy(self.start_year) - self.start_doy + 1;
        let middle: u32 = (self.start_year + 1..self.end_year).map(last_doy).sum();
        (first + middle + self.end_doy) as usize
    }

    /// Rows reserved per period in the in-memory arrays.
    pub fn n_rows(&self, period: OutPeriod) -> usize {
        match period {
            OutPeriod::Day => self.n_days(),
            OutPeriod::Week => self.n_years() * MAX_WEEKS,
            OutPeriod::Month => self.n_years() * MAX_MONTHS,
            OutPeriod::Year => self.n_years(),
        }
    }

    /// First simulated day of `year`.
    pub fn first_doy(&self, year: u32) -> u32 {
        if year == self.start_year {
            self.start_doy
        } else {
            1
        }
    }

    /// Last simulated day of `year`.
    pub fn last_doy(&self, year: u32) -> u32 {
        if year == self.end_year {
            self.end_doy
        } else {
            last_doy(year)
        }
    }
}

/// Clock state of the running simulation.
#[derive(Debug, Clone)]
pub struct ModelClock {
    pub span: SimulationSpan,
    pub year: u32,
    /// Year written to output rows.
    pub simyear: i32,
    /// Base-1 day of year.
    pub doy: u32,
    /// Base-0 week of year.
    pub week: usize,
    /// Base-0 month of year.
    pub month: usize,
    pub firstdoy: u32,
    pub lastdoy: u32,
    newperiod: [bool; N_PERIODS],
    prev_week: Option<usize>,
    prev_month: Option<usize>,
    days_in_month: [u32; MAX_MONTHS],
    cum_monthdays: [u32; MAX_MONTHS],
}

impl ModelClock {
    /// Create a clock positioned on the first day of the span.
    pub fn new(span: SimulationSpan) -> Self {
        let mut clock = Self {
            span,
            year: span.start_year,
            simyear: span.start_year as i32 + span.year_offset,
            doy: span.start_doy,
            week: 0,
            month: 0,
            firstdoy: span.start_doy,
            lastdoy: span.last_doy(span.start_year),
            newperiod: [true, false, false, false],
            prev_week: None,
            prev_month: None,
            days_in_month: DAYS_IN_MONTH,
            cum_monthdays: cumulative_month_days(&DAYS_IN_MONTH),
        };
        clock.new_year(span.start_year);
        clock
    }

    /// Start a new simulation year.
    pub fn new_year(&mut self, year: u32) {
        self.year = year;
        self.simyear = year as i32 + self.span.year_offset;
        self.prev_week = None;
        self.prev_month = None;
        self.days_in_month = days_in_months(year);
        self.cum_monthdays = cumulative_month_days(&self.days_in_month);
        self.firstdoy = self.span.first_doy(year);
        self.lastdoy = self.span.last_doy(year);
        self.doy = self.firstdoy;
        self.newperiod = [true, false, false, false];
    }

    /// Advance to `doy` and update the new-period flags.
    pub fn new_day(&mut self, doy: u32) {
        self.doy = doy;

        if doy > self.lastdoy {
            // The day loop is over and the year-end flush follows. Week and
            // month stay on the last simulated day, which the flush reports.
            self.newperiod = [true; N_PERIODS];
            return;
        }

        self.month = doy_to_month(doy, &self.cum_monthdays);
        self.week = doy_to_week(doy);

        let month_changed = self.prev_month != Some(self.month);
        self.newperiod[OutPeriod::Month.index()] = month_changed && self.prev_month.is_some();
        if month_changed {
            self.prev_month = Some(self.month);
        }

        let week_changed = self.prev_week != Some(self.week);
        self.newperiod[OutPeriod::Week.index()] = week_changed && self.prev_week.is_some();
        if week_changed {
            self.prev_week = Some(self.week);
        }

        self.newperiod[OutPeriod::Day.index()] = true;
        self.newperiod[OutPeriod::Year.index()] = false;
    }

    /// Move past the last day of the year, ahead of the year-end flush.
    pub fn end_year(&mut self) {
        self.new_day(self.lastdoy + 1);
    }

    pub fn is_newperiod(&self, period: OutPeriod) -> bool {
        self.newperiod[period.index()]
    }

    /// Days of base-0 `month` in the current year.
    pub fn days_in_month(&self, month: usize) -> u32 {
        self.days_in_month[month.min(MAX_MONTHS - 1)]
    }

    /// Simulated days of the current year.
    pub fn days(&self) -> std::ops::RangeInclusive<u32> {
        self.firstdoy..=self.lastdoy
    }
}
