//! Output engine dimensions, sentinels and name tables.
//!
//! Centralises the fixed values shared by the registry, the index
//! calculator and the sinks.

// -- Dimensions --

/// Number of vegetation types (tree, shrub, forbs, grass).
pub const NVEGTYPES: usize = 4;

/// Domain-wide maximum number of soil layers.
pub const MAX_LAYERS: usize = 25;

/// Number of output periods (day, week, month, year).
pub const N_PERIODS: usize = 4;

/// Days per week.
pub const WKDAYS: u32 = 7;

/// Weeks per year reserved in the in-memory arrays.
pub const MAX_WEEKS: usize = 53;

/// Months per year.
pub const MAX_MONTHS: usize = 12;

/// Last possible day of year, also the meaning of `END` in the setup file.
pub const MAX_DOY: u32 = 366;

// -- Formatting --

/// Decimal digits of every numeric text field.
pub const OUT_DIGITS: usize = 6;

/// Field separator of the text sink.
pub const OUTSEP: u8 = b',';

/// Capacity of one formatted field group, in bytes.
pub const OUTSTRLEN: usize = 3000;

/// Capacity of one per-period text row buffer, in bytes.
pub const ROW_CAPACITY: usize = MAX_LAYERS * OUTSTRLEN;

// -- Sentinels --

/// Value written for soil layers that do not exist at a site.
pub const SW_MISSING: f64 = 999.0;

/// Bar to MPa style conversion of the Campbell retention curve [cm / bar].
pub const BARCONV: f64 = 1024.0;

// -- Name tables --

/// Vegetation type names in index order.
pub const VEG_NAMES: [&str; NVEGTYPES] = ["tree", "shrub", "forbs", "grass"];

/// Aggregate labels used by cover and evaporation columns.
pub const TOTAL_NAME: &str = "total";
pub const LITTER_NAME: &str = "litter";
pub const BARE_GROUND_NAME: &str = "BareGround";

/// Column name stem of soil layers, followed by the 1-based layer number.
pub const LAYER_STEM: &str = "Lyr";

/// Separator joining the parts of a generated column name.
pub const NAME_SEP: &str = "_";

/// Default CSV file names, regular family, indexed by period.
pub const REGULAR_FILES: [&str; N_PERIODS] = [
    "sw2_daily.csv",
    "sw2_weekly.csv",
    "sw2_monthly.csv",
    "sw2_yearly.csv",
];

/// Default CSV file names, soil-layer family, indexed by period.
pub const SOIL_FILES: [&str; N_PERIODS] = [
    "sw2_daily_slyrs.csv",
    "sw2_weekly_slyrs.csv",
    "sw2_monthly_slyrs.csv",
    "sw2_yearly_slyrs.csv",
];
