//! Temporal aggregator.
//!
//! Turns a period's running sums into the reported aggregate once the
//! period is complete:
//! - `SUM` keeps the sum
//! - `AVG` divides by the number of days in the period
//! - `FIN` reports the state of the last completed day
//!
//! Finalization happens right after a period rolls over, so the clock's
//! week and month are one past the summarized period unless the year is
//! being flushed (`t_offset` is 1 during the year and 0 at the flush).

use log::trace;

use crate::accumulator::{Accumulators, SoilWaterSums, VegProdSums, WeatherSums};
use crate::calendar::ModelClock;
use crate::config::{KeyConfig, OutputSetup};
use crate::constants::{MAX_LAYERS, NVEGTYPES, WKDAYS};
use crate::error::OutputError;
use crate::keys::{ObjType, OutKey};
use crate::period::{OutPeriod, OutSum};
use crate::site::Site;
use crate::state::{DailyState, Layers};

/// Index and length of the period being finalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodWindow {
    /// Week or month number (base 1), or the first day of the year window.
    pub index: i64,
    /// Days in the period.
    pub divisor: f64,
}

/// Window of the period that just ended. `None` for days, which are never
/// finalized.
pub fn period_window(
    period: OutPeriod,
    flush: bool,
    t_offset: u32,
    clock: &ModelClock,
    cfg: &KeyConfig,
) -> Option<PeriodWindow> {
    let t_offset = t_offset as i64;
    match period {
        OutPeriod::Day => None,
        OutPeriod::Week => {
            let divisor = if flush {
                match clock.lastdoy % WKDAYS {
                    0 => WKDAYS,
                    rest => rest,
                }
            } else {
                WKDAYS
            };
            Some(PeriodWindow {
                index: clock.week as i64 + 1 - t_offset,
                divisor: divisor as f64,
            })
        }
        OutPeriod::Month => {
            let month = (clock.month as i64 - t_offset).max(0) as usize;
            Some(PeriodWindow {
                index: clock.month as i64 + 1 - t_offset,
                divisor: clock.days_in_month(month) as f64,
            })
        }
        OutPeriod::Year => Some(PeriodWindow {
            index: cfg.first as i64,
            divisor: (cfg.last as f64 - cfg.first as f64 + 1.0).max(1.0),
        }),
    }
}

/// Finalize `cfg`'s key for `period` into the category aggregate.
///
/// Returns `false` if the period lies outside the key's bounds and nothing
/// was done.
#[allow(clippy::too_many_arguments)]
pub fn finalize(
    cfg: &KeyConfig,
    period: OutPeriod,
    flush: bool,
    t_offset: u32,
    clock: &ModelClock,
    accs: &mut Accumulators,
    daily: &DailyState,
    site: &Site,
) -> Result<bool, OutputError> {
    let Some(window) = period_window(period, flush, t_offset, clock, cfg) else {
        return Ok(false);
    };
    if window.index < cfg.first as i64 || window.index > cfg.last as i64 {
        return Ok(false);
    }

    let key = cfg.key;
    let div = match cfg.sumtype {
        OutSum::Sum => 1.0,
        _ => window.divisor,
    };
    let fin = cfg.sumtype == OutSum::FinalValue;

    match key.category() {
        ObjType::Weather => {
            let (accu, oagg) = accs.weather.split_mut(period);
            finalize_weather(key, accu, oagg, div)?;
        }
        ObjType::SoilWater => {
            let (accu, oagg) = accs.soil.split_mut(period);
            finalize_soil_water(key, accu, oagg, div, fin, daily, site)?;
        }
        ObjType::VegEstab => {
            if key != OutKey::Estab {
                return Err(OutputError::Unhandled {
                    key,
                    context: "establishment aggregate",
                });
            }
        }
        ObjType::VegProd => {
            let (accu, oagg) = accs.veg.split_mut(period);
            finalize_veg_prod(key, accu, oagg, div)?;
        }
    }
    trace!("{} {} finalized over {} (divisor {})", key, period, window.index, div);
    Ok(true)
}

/// Finalize every subscribed key of `category` for `period`, then zero the
/// category's running sum.
#[allow(clippy::too_many_arguments)]
pub fn finalize_category(
    setup: &OutputSetup,
    category: ObjType,
    period: OutPeriod,
    flush: bool,
    t_offset: u32,
    clock: &ModelClock,
    accs: &mut Accumulators,
    daily: &DailyState,
    site: &Site,
) -> Result<(), OutputError> {
    if period != OutPeriod::Day {
        for cfg in setup
            .active_keys()
            .filter(|k| k.key.category() == category && k.subscribes(period))
        {
            finalize(cfg, period, flush, t_offset, clock, accs, daily, site)?;
        }
    }
    accs.reset(category, period);
    Ok(())
}

// -- Per-category aggregates --

fn finalize_weather(
    key: OutKey,
    a: &WeatherSums,
    o: &mut WeatherSums,
    div: f64,
) -> Result<(), OutputError> {
    match key {
        OutKey::Temp => {
            o.temp_max = a.temp_max / div;
            o.temp_min = a.temp_min / div;
            o.temp_avg = a.temp_avg / div;
            o.surface_max = a.surface_max / div;
            o.surface_min = a.surface_min / div;
            o.surface_avg = a.surface_avg / div;
        }
        OutKey::Precip => {
            o.ppt = a.ppt / div;
            o.rain = a.rain / div;
            o.snow = a.snow / div;
            o.snowmelt = a.snowmelt / div;
            o.snowloss = a.snowloss / div;
        }
        OutKey::SoilInf => o.soil_inf = a.soil_inf / div,
        OutKey::Runoff => {
            o.snow_runoff = a.snow_runoff / div;
            o.surface_runoff = a.surface_runoff / div;
            o.surface_runon = a.surface_runon / div;
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "weather aggregate",
            })
        }
    }
    Ok(())
}

fn divide(dst: &mut [f64], src: &[f64], n: usize, div: f64) {
    for (d, s) in dst[..n].iter_mut().zip(&src[..n]) {
        *d = s / div;
    }
}

/// Either the averaged sum or, for `FIN`, the given instantaneous values.
fn average_or_final(dst: &mut Layers, src: &Layers, fin_value: &Layers, n: usize, div: f64, fin: bool) {
    if fin {
        dst[..n].copy_from_slice(&fin_value[..n]);
    } else {
        divide(dst, src, n, div);
    }
}

#[allow(clippy::too_many_arguments)]
fn finalize_soil_water(
    key: OutKey,
    a: &SoilWaterSums,
    o: &mut SoilWaterSums,
    div: f64,
    fin: bool,
    daily: &DailyState,
    site: &Site,
) -> Result<(), OutputError> {
    let v = &daily.soil;
    let nl = site.n_layers();

    match key {
        OutKey::VWCBulk => average_or_final(&mut o.vwc_bulk, &a.vwc_bulk, &v.swc_yesterday, nl, div, fin),
        OutKey::VWCMatric => {
            average_or_final(&mut o.vwc_matric, &a.vwc_matric, &v.swc_yesterday, nl, div, fin)
        }
        OutKey::SWCBulk => average_or_final(&mut o.swc_bulk, &a.swc_bulk, &v.swc_yesterday, nl, div, fin),
        OutKey::SWPMatric => {
            average_or_final(&mut o.swp_matric, &a.swp_matric, &v.swc_yesterday, nl, div, fin)
        }
        OutKey::SWABulk | OutKey::SWAMatric => {
            let mut available: Layers = [0.0; MAX_LAYERS];
            for (i, lyr) in site.layers.iter().enumerate() {
                available[i] = (v.swc_yesterday[i] - lyr.swc_wiltpt).max(0.0);
            }
            if key == OutKey::SWABulk {
                average_or_final(&mut o.swa_bulk, &a.swa_bulk, &available, nl, div, fin);
            } else {
                average_or_final(&mut o.swa_matric, &a.swa_matric, &available, nl, div, fin);
            }
        }
        OutKey::SWA => {
            for j in 0..NVEGTYPES {
                average_or_final(&mut o.swa_veg[j], &a.swa_veg[j], &v.swa_veg[j], nl, div, fin);
            }
        }
        // FIN is configured as AVG for keys without soil layers.
        OutKey::DeepSWC => o.deep = a.deep / div,
        OutKey::SoilTemp => {
            average_or_final(&mut o.soil_temp_max, &a.soil_temp_max, &v.soil_temp_max, nl, div, fin);
            average_or_final(&mut o.soil_temp_min, &a.soil_temp_min, &v.soil_temp_min, nl, div, fin);
            average_or_final(&mut o.soil_temp_avg, &a.soil_temp_avg, &v.soil_temp_avg, nl, div, fin);
        }
        OutKey::Frozen => {
            let mut frozen: Layers = [0.0; MAX_LAYERS];
            for (f, is_frozen) in frozen.iter_mut().zip(&v.frozen) {
                *f = if *is_frozen { 1.0 } else { 0.0 };
            }
            average_or_final(&mut o.frozen, &a.frozen, &frozen, nl, div, fin);
        }
        OutKey::SurfaceWater => o.surface_water = a.surface_water / div,
        OutKey::Transp => {
            divide(&mut o.transp_total, &a.transp_total, nl, div);
            for j in 0..NVEGTYPES {
                divide(&mut o.transp[j], &a.transp[j], nl, div);
            }
        }
        OutKey::EvapSoil => divide(&mut o.evap_baresoil, &a.evap_baresoil, site.n_evap_layers, div),
        OutKey::EvapSurface => {
            o.total_evap = a.total_evap / div;
            divide(&mut o.evap_veg, &a.evap_veg, NVEGTYPES, div);
            o.litter_evap = a.litter_evap / div;
            o.surface_water_evap = a.surface_water_evap / div;
        }
        OutKey::Interception => {
            o.total_int = a.total_int / div;
            divide(&mut o.int_veg, &a.int_veg, NVEGTYPES, div);
            o.litter_int = a.litter_int / div;
        }
        OutKey::AET => {
            o.aet = a.aet / div;
            o.tran = a.tran / div;
            o.esoil = a.esoil / div;
            o.ecnw = a.ecnw / div;
            o.esurf = a.esurf / div;
            o.esnow = a.esnow / div;
        }
        OutKey::LyrDrain => divide(&mut o.lyrdrain, &a.lyrdrain, nl.saturating_sub(1), div),
        OutKey::HydRed => {
            divide(&mut o.hydred_total, &a.hydred_total, nl, div);
            for j in 0..NVEGTYPES {
                divide(&mut o.hydred[j], &a.hydred[j], nl, div);
            }
        }
        OutKey::PET => {
            o.pet = a.pet / div;
            o.h_oh = a.h_oh / div;
            o.h_ot = a.h_ot / div;
            o.h_gh = a.h_gh / div;
            o.h_gt = a.h_gt / div;
        }
        OutKey::WetDays => divide(&mut o.wetdays, &a.wetdays, nl, div),
        OutKey::SnowPack => {
            o.snowpack = a.snowpack / div;
            o.snowdepth = a.snowdepth / div;
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "soil water aggregate",
            })
        }
    }
    Ok(())
}

fn finalize_veg_prod(
    key: OutKey,
    a: &VegProdSums,
    o: &mut VegProdSums,
    div: f64,
) -> Result<(), OutputError> {
    match key {
        OutKey::CO2Effects => {}
        OutKey::Biomass => {
            divide(&mut o.biomass, &a.biomass, NVEGTYPES, div);
            divide(&mut o.litter, &a.litter, NVEGTYPES, div);
            divide(&mut o.biolive, &a.biolive, NVEGTYPES, div);
            o.biomass_total = a.biomass_total / div;
            o.litter_total = a.litter_total / div;
            o.biolive_total = a.biolive_total / div;
            o.lai = a.lai / div;
        }
        _ => {
            return Err(OutputError::Unhandled {
                key,
                context: "vegetation production aggregate",
            })
        }
    }
    Ok(())
}
