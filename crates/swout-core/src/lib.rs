/// swout-core — output aggregation engine for daily ecohydrology runs.
///
/// Accumulates daily weather, soil water, establishment and vegetation
/// values into weekly, monthly and yearly aggregates (sum, average or final
/// value) and writes them to CSV files, column-major arrays, padded
/// netCDF-style grids and running statistics across iterations.
pub mod accumulator;
pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod index;
pub mod keys;
pub mod period;
pub mod registry;
pub mod sinks;
pub mod site;
pub mod state;
pub mod stats;

pub use calendar::{ModelClock, SimulationSpan};
pub use config::OutputSetup;
pub use dispatch::{OutputEngine, OutputRun};
pub use error::{Diagnostics, OutputError};
pub use keys::{ObjType, OutKey};
pub use period::{OutPeriod, OutSum};
pub use registry::{Registry, SiteDims};
pub use site::{Site, SoilLayer};
pub use state::DailyState;
