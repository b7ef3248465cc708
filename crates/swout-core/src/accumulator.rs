//! Period accumulators.
//!
//! One sum struct per object category and output period. Every period owns
//! a running sum (`accu`) and a finalized aggregate (`oagg`); the daily
//! aggregate is the daily sum itself, so day rows never go through the
//! aggregator.

use swout_macros::Accumulator;

use crate::constants::{MAX_LAYERS, NVEGTYPES};
use crate::error::OutputError;
use crate::keys::{ObjType, OutKey};
use crate::period::OutPeriod;
use crate::site::Site;
use crate::state::{DailyState, Layers, VegProdDaily, WeatherDaily};

// -- Sum structs --

#[derive(Debug, Clone, Default, Accumulator)]
#[accumulator(label = "weather")]
pub struct WeatherSums {
    pub temp_max: f64,
    pub temp_min: f64,
    pub temp_avg: f64,
    pub surface_max: f64,
    pub surface_min: f64,
    pub surface_avg: f64,
    pub ppt: f64,
    pub rain: f64,
    pub snow: f64,
    pub snowmelt: f64,
    pub snowloss: f64,
    pub soil_inf: f64,
    pub snow_runoff: f64,
    pub surface_runoff: f64,
    pub surface_runon: f64,
}

/// Soil water sums. The water content keys hold bulk water content and are
/// converted when formatted. Array fields are spelled out for the derive.
#[derive(Debug, Clone, Default, Accumulator)]
#[accumulator(label = "soil water")]
pub struct SoilWaterSums {
    pub vwc_bulk: [f64; MAX_LAYERS],
    pub vwc_matric: [f64; MAX_LAYERS],
    pub swc_bulk: [f64; MAX_LAYERS],
    pub swp_matric: [f64; MAX_LAYERS],
    pub swa_bulk: [f64; MAX_LAYERS],
    pub swa_matric: [f64; MAX_LAYERS],
    pub swa_veg: [[f64; MAX_LAYERS]; NVEGTYPES],
    pub surface_water: f64,
    pub transp_total: [f64; MAX_LAYERS],
    pub transp: [[f64; MAX_LAYERS]; NVEGTYPES],
    pub evap_baresoil: [f64; MAX_LAYERS],
    pub total_evap: f64,
    pub evap_veg: [f64; NVEGTYPES],
    pub litter_evap: f64,
    pub surface_water_evap: f64,
    pub total_int: f64,
    pub int_veg: [f64; NVEGTYPES],
    pub litter_int: f64,
    pub lyrdrain: [f64; MAX_LAYERS],
    pub hydred_total: [f64; MAX_LAYERS],
    pub hydred: [[f64; MAX_LAYERS]; NVEGTYPES],
    pub aet: f64,
    pub tran: f64,
    pub esoil: f64,
    pub ecnw: f64,
    pub esurf: f64,
    pub esnow: f64,
    pub pet: f64,
    pub h_oh: f64,
    pub h_ot: f64,
    pub h_gh: f64,
    pub h_gt: f64,
    pub wetdays: [f64; MAX_LAYERS],
    pub snowpack: f64,
    pub snowdepth: f64,
    pub deep: f64,
    pub soil_temp_max: [f64; MAX_LAYERS],
    pub soil_temp_min: [f64; MAX_LAYERS],
    pub soil_temp_avg: [f64; MAX_LAYERS],
    pub frozen: [f64; MAX_LAYERS],
}

/// Vegetation production sums, scaled by cover fraction.
#[derive(Debug, Clone, Default, Accumulator)]
#[accumulator(label = "vegetation production")]
pub struct VegProdSums {
    pub biomass_total: f64,
    pub biomass: [f64; NVEGTYPES],
    pub litter_total: f64,
    pub litter: [f64; NVEGTYPES],
    pub biolive_total: f64,
    pub biolive: [f64; NVEGTYPES],
    pub lai: f64,
}

/// Evaporation from snow reported in the AET output.
///
/// The soil water balance does not compute snow evaporation itself; the
/// weather module's daily snow loss (sublimation) stands in for it.
pub fn esnow_stand_in(weather: &WeatherDaily) -> f64 {
    weather.snowloss
}

// -- Daily sums --

/// Add today's weather values of `key`.
pub fn sum_weather(key: OutKey, s: &mut WeatherSums, w: &WeatherDaily) -> Result<(), OutputError> {
    match key {
        OutKey::Temp => {
            s.temp_max += w.temp_max;
            s.temp_min += w.temp_min;
            s.temp_avg += w.temp_avg;
            s.surface_max += w.surface_max;
            s.surface_min += w.surface_min;
            s.surface_avg += w.surface_avg;
        }
        OutKey::Precip => {
            s.ppt += w.ppt;
            s.rain += w.rain;
            s.snow += w.snow;
            s.snowmelt += w.snowmelt;
            s.snowloss += w.snowloss;
        }
        OutKey::SoilInf => s.soil_inf += w.soil_inf,
        OutKey::Runoff => {
            s.snow_runoff += w.snow_runoff;
            s.surface_runoff += w.surface_runoff;
            s.surface_runon += w.surface_runon;
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "weather sum",
            })
        }
    }
    Ok(())
}

/// Add today's soil water values of `key`.
pub fn sum_soil_water(
    key: OutKey,
    s: &mut SoilWaterSums,
    daily: &DailyState,
    site: &Site,
) -> Result<(), OutputError> {
    let v = &daily.soil;
    let nl = site.n_layers();
    let ne = site.n_evap_layers;

    match key {
        OutKey::VWCBulk => add_layers(&mut s.vwc_bulk, &v.swc_today, nl),
        OutKey::VWCMatric => add_layers(&mut s.vwc_matric, &v.swc_today, nl),
        OutKey::SWCBulk => add_layers(&mut s.swc_bulk, &v.swc_today, nl),
        OutKey::SWPMatric => add_layers(&mut s.swp_matric, &v.swc_today, nl),
        OutKey::SWABulk | OutKey::SWAMatric => {
            let target = if key == OutKey::SWABulk {
                &mut s.swa_bulk
            } else {
                &mut s.swa_matric
            };
            for (i, lyr) in site.layers.iter().enumerate() {
                target[i] += (v.swc_today[i] - lyr.swc_wiltpt).max(0.0);
            }
        }
        OutKey::SWA => {
            for j in 0..NVEGTYPES {
                add_layers(&mut s.swa_veg[j], &v.swa_veg[j], nl);
            }
        }
        OutKey::SurfaceWater => s.surface_water += v.surface_water,
        OutKey::Transp => {
            for j in 0..NVEGTYPES {
                for i in 0..nl {
                    s.transp_total[i] += v.transpiration[j][i];
                    s.transp[j][i] += v.transpiration[j][i];
                }
            }
        }
        OutKey::EvapSoil => add_layers(&mut s.evap_baresoil, &v.evap_baresoil, ne),
        OutKey::EvapSurface => {
            for j in 0..NVEGTYPES {
                s.total_evap += v.evap_veg[j];
                s.evap_veg[j] += v.evap_veg[j];
            }
            s.total_evap += v.litter_evap + v.surface_water_evap;
            s.litter_evap += v.litter_evap;
            s.surface_water_evap += v.surface_water_evap;
        }
        OutKey::Interception => {
            for j in 0..NVEGTYPES {
                s.total_int += v.int_veg[j];
                s.int_veg[j] += v.int_veg[j];
            }
            s.total_int += v.litter_int;
            s.litter_int += v.litter_int;
        }
        OutKey::LyrDrain => add_layers(&mut s.lyrdrain, &v.drain, nl.saturating_sub(1)),
        OutKey::HydRed => {
            for j in 0..NVEGTYPES {
                for i in 0..nl {
                    s.hydred_total[i] += v.hydred[j][i];
                    s.hydred[j][i] += v.hydred[j][i];
                }
            }
        }
        OutKey::AET => {
            s.aet += v.aet;
            s.tran += v
                .transpiration
                .iter()
                .map(|veg| veg[..nl].iter().sum::<f64>())
                .sum::<f64>();
            s.esoil += v.evap_baresoil[..ne].iter().sum::<f64>();
            s.ecnw += v.evap_veg.iter().sum::<f64>();
            s.esurf += v.litter_evap + v.surface_water_evap;
            s.esnow += esnow_stand_in(&daily.weather);
        }
        OutKey::PET => {
            s.pet += v.pet;
            s.h_oh += v.h_oh;
            s.h_ot += v.h_ot;
            s.h_gh += v.h_gh;
            s.h_gt += v.h_gt;
        }
        OutKey::WetDays => {
            for i in 0..nl {
                if v.is_wet[i] {
                    s.wetdays[i] += 1.0;
                }
            }
        }
        OutKey::SnowPack => {
            s.snowpack += v.snowpack;
            s.snowdepth += v.snowdepth;
        }
        OutKey::DeepSWC => s.deep += v.drain[site.deep_lyr],
        OutKey::SoilTemp => {
            add_layers(&mut s.soil_temp_max, &v.soil_temp_max, nl);
            add_layers(&mut s.soil_temp_min, &v.soil_temp_min, nl);
            add_layers(&mut s.soil_temp_avg, &v.soil_temp_avg, nl);
        }
        OutKey::Frozen => {
            for i in 0..nl {
                if v.frozen[i] {
                    s.frozen[i] += 1.0;
                }
            }
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "soil water sum",
            })
        }
    }
    Ok(())
}

/// Add today's vegetation production values of `key`.
///
/// CO2 multipliers are reported as-is and have nothing to sum.
pub fn sum_veg_prod(key: OutKey, s: &mut VegProdSums, v: &VegProdDaily) -> Result<(), OutputError> {
    match key {
        OutKey::CO2Effects => {}
        OutKey::Biomass => {
            for k in 0..NVEGTYPES {
                let cover = v.cover[k];

                let tmp = v.biomass[k] * cover;
                s.biomass[k] += tmp;
                s.biomass_total += tmp;

                let tmp = v.litter[k] * cover;
                s.litter[k] += tmp;
                s.litter_total += tmp;

                let tmp = v.biolive[k] * cover;
                s.biolive[k] += tmp;
                s.biolive_total += tmp;

                s.lai += v.lai[k] * cover;
            }
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "vegetation production sum",
            })
        }
    }
    Ok(())
}

fn add_layers(target: &mut Layers, today: &Layers, n: usize) {
    let n = n.min(MAX_LAYERS);
    for (t, x) in target[..n].iter_mut().zip(&today[..n]) {
        *t += x;
    }
}

// -- Per-period storage --

/// Running sums and finalized aggregates of one category, per period.
#[derive(Debug, Clone)]
pub struct PeriodSlots<T> {
    accu: Vec<T>,
    oagg: Vec<T>,
}

impl<T: Default + Clone> Default for PeriodSlots<T> {
    fn default() -> Self {
        Self {
            accu: vec![T::default(); OutPeriod::ALL.len()],
            oagg: vec![T::default(); OutPeriod::ALL.len()],
        }
    }
}

impl<T> PeriodSlots<T> {
    pub fn accu(&self, period: OutPeriod) -> &T {
        &self.accu[period.index()]
    }

    pub fn accu_mut(&mut self, period: OutPeriod) -> &mut T {
        &mut self.accu[period.index()]
    }

    /// Running sum and aggregate of `period`, both borrowed.
    pub fn split_mut(&mut self, period: OutPeriod) -> (&T, &mut T) {
        let i = period.index();
        (&self.accu[i], &mut self.oagg[i])
    }

    /// Aggregate to report for `period`. Days report the daily sum.
    pub fn aggregate(&self, period: OutPeriod) -> &T {
        match period {
            OutPeriod::Day => &self.accu[period.index()],
            _ => &self.oagg[period.index()],
        }
    }
}

/// Accumulators of every category.
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    pub weather: PeriodSlots<WeatherSums>,
    pub soil: PeriodSlots<SoilWaterSums>,
    pub veg: PeriodSlots<VegProdSums>,
}

impl Accumulators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add today's contribution of `key` to the running sum of `period`.
    pub fn accumulate(
        &mut self,
        key: OutKey,
        period: OutPeriod,
        daily: &DailyState,
        site: &Site,
    ) -> Result<(), OutputError> {
        match key.category() {
            ObjType::Weather => sum_weather(key, self.weather.accu_mut(period), &daily.weather),
            ObjType::SoilWater => sum_soil_water(key, self.soil.accu_mut(period), daily, site),
            ObjType::VegEstab => match key {
                // Establishment days are reported as-is.
                OutKey::Estab => Ok(()),
                _ => Err(OutputError::Unhandled {
                    key,
                    context: "establishment sum",
                }),
            },
            ObjType::VegProd => sum_veg_prod(key, self.veg.accu_mut(period), &daily.veg),
        }
    }

    /// Zero the running sum of `category` for `period`.
    pub fn reset(&mut self, category: ObjType, period: OutPeriod) {
        match category {
            ObjType::Weather => self.weather.accu_mut(period).reset(),
            ObjType::SoilWater => self.soil.accu_mut(period).reset(),
            ObjType::VegProd => self.veg.accu_mut(period).reset(),
            ObjType::VegEstab => {}
        }
    }

    pub fn is_reset(&self, category: ObjType, period: OutPeriod) -> bool {
        match category {
            ObjType::Weather => self.weather.accu(period).is_reset(),
            ObjType::SoilWater => self.soil.accu(period).is_reset(),
            ObjType::VegProd => self.veg.accu(period).is_reset(),
            ObjType::VegEstab => true,
        }
    }
}
