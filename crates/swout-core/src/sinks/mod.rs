//! Output sinks.
//!
//! Every sink receives, per due period, one row: the time leader, then the
//! values of each active key in registry order, then the end of the row.
//! - `text`: CSV files, one per period and file family
//! - `array`: column-major in-memory arrays with leading time columns
//! - `grid`: netCDF-style row-major arrays padded to a common layer count
//! - `stats`: running mean and standard deviation across iterations

pub mod array;
pub mod grid;
pub mod stats;
pub mod text;

pub use array::ArraySink;
pub use grid::GridSink;
pub use stats::StatsSink;
pub use text::{FileFamily, TextSink};

use crate::error::OutputError;
use crate::keys::OutKey;
use crate::period::OutPeriod;

/// Time columns of one output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLeader {
    pub simyear: i32,
    /// Day, week or month number; `None` for yearly rows.
    pub subunit: Option<u32>,
}

impl RowLeader {
    /// Leader values as reals, in column order.
    pub fn values(&self) -> impl Iterator<Item = f64> {
        std::iter::once(self.simyear as f64).chain(self.subunit.map(|s| s as f64))
    }
}

/// Receiver of formatted output rows.
pub trait Sink {
    /// Start the row of `period`.
    fn begin_row(&mut self, _period: OutPeriod, _leader: RowLeader) -> Result<(), OutputError> {
        Ok(())
    }

    /// Values of one key, in column order.
    fn write_key(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        leader: RowLeader,
        values: &[f64],
    ) -> Result<(), OutputError>;

    /// Close the row of `period` and advance the row cursor.
    fn end_row(&mut self, period: OutPeriod) -> Result<(), OutputError>;
}

/// In-memory sinks of a run, each optional.
#[derive(Debug, Clone, Default)]
pub struct SinkSet {
    pub array: Option<ArraySink>,
    pub grid: Option<GridSink>,
    pub stats: Option<StatsSink>,
}

impl SinkSet {
    pub fn is_empty(&self) -> bool {
        self.array.is_none() && self.grid.is_none() && self.stats.is_none()
    }

    /// Active sinks as trait objects.
    pub fn active(&mut self) -> Vec<&mut dyn Sink> {
        let mut sinks: Vec<&mut dyn Sink> = Vec::with_capacity(3);
        if let Some(s) = self.array.as_mut() {
            sinks.push(s);
        }
        if let Some(s) = self.grid.as_mut() {
            sinks.push(s);
        }
        if let Some(s) = self.stats.as_mut() {
            sinks.push(s);
        }
        sinks
    }
}
