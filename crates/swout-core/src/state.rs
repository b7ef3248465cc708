//! Daily simulation values read by the output engine.
//!
//! The physical model owns these values and fills them once per day; the
//! engine only reads them. Soil arrays are sized to the domain maximum and
//! indexed by base-0 layer; vegetation arrays by vegetation type, then
//! layer.

use crate::constants::{MAX_LAYERS, NVEGTYPES};

/// Per-layer values.
pub type Layers = [f64; MAX_LAYERS];

/// Per-vegetation-type, per-layer values.
pub type VegLayers = [[f64; MAX_LAYERS]; NVEGTYPES];

#[derive(Debug, Clone, Default)]
pub struct WeatherDaily {
    /// Air temperature [C]
    pub temp_max: f64,
    pub temp_min: f64,
    pub temp_avg: f64,
    /// Soil surface temperature [C]
    pub surface_max: f64,
    pub surface_min: f64,
    pub surface_avg: f64,
    /// Precipitation and its partition [cm]
    pub ppt: f64,
    pub rain: f64,
    pub snow: f64,
    pub snowmelt: f64,
    /// Sublimation from the snowpack [cm]
    pub snowloss: f64,
    /// Infiltration into the soil [cm]
    pub soil_inf: f64,
    pub snow_runoff: f64,
    pub surface_runoff: f64,
    pub surface_runon: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SoilWaterDaily {
    /// Bulk soil water content of today and of the last completed day [cm]
    pub swc_today: Layers,
    pub swc_yesterday: Layers,
    pub transpiration: VegLayers,
    pub evap_baresoil: Layers,
    pub evap_veg: [f64; NVEGTYPES],
    pub litter_evap: f64,
    pub surface_water_evap: f64,
    pub int_veg: [f64; NVEGTYPES],
    pub litter_int: f64,
    /// Percolation out of each layer; the bottom value is deep drainage [cm]
    pub drain: Layers,
    pub hydred: VegLayers,
    /// Ponded water [cm]
    pub surface_water: f64,
    pub aet: f64,
    pub pet: f64,
    /// Horizontal/tilted surface radiation terms [MJ/m2]
    pub h_oh: f64,
    pub h_ot: f64,
    pub h_gh: f64,
    pub h_gt: f64,
    pub is_wet: [bool; MAX_LAYERS],
    /// Snow water equivalent and depth [cm]
    pub snowpack: f64,
    pub snowdepth: f64,
    pub soil_temp_max: Layers,
    pub soil_temp_min: Layers,
    pub soil_temp_avg: Layers,
    pub frozen: [bool; MAX_LAYERS],
    /// Available water repartitioned among vegetation types [cm]
    pub swa_veg: VegLayers,
}

impl SoilWaterDaily {
    /// Close the day: today's water content becomes yesterday's.
    pub fn end_day(&mut self) {
        self.swc_yesterday = self.swc_today;
    }
}

#[derive(Debug, Clone, Default)]
pub struct VegEstabDaily {
    /// Day of year each species established this year, 0 if it did not.
    pub estab_doy: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct VegProdDaily {
    pub bare_cover: f64,
    /// Cover fraction per vegetation type [-]
    pub cover: [f64; NVEGTYPES],
    /// Today's biomass, litter and live biomass per type [g/m2]
    pub biomass: [f64; NVEGTYPES],
    pub litter: [f64; NVEGTYPES],
    pub biolive: [f64; NVEGTYPES],
    pub lai: [f64; NVEGTYPES],
    /// CO2 multipliers of the current year
    pub co2_bio: [f64; NVEGTYPES],
    pub co2_wue: [f64; NVEGTYPES],
}

/// Everything the engine reads for one simulated day.
#[derive(Debug, Clone, Default)]
pub struct DailyState {
    pub weather: WeatherDaily,
    pub soil: SoilWaterDaily,
    pub estab: VegEstabDaily,
    pub veg: VegProdDaily,
}

impl DailyState {
    pub fn new(n_species: usize) -> Self {
        Self {
            estab: VegEstabDaily {
                estab_doy: vec![0; n_species],
            },
            ..Self::default()
        }
    }
}
