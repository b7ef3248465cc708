//! Per-key formatters.
//!
//! A formatter turns a key's period aggregate into its values in column
//! order (the order of [`crate::registry::Registry::colnames`]). Unit
//! conversions that cannot be averaged (water potential, volumetric
//! content) are applied here, after aggregation. Values that are
//! instantaneous by nature (CO2 multipliers, cover fractions,
//! establishment days) are read from today's state.

use crate::accumulator::Accumulators;
use crate::error::OutputError;
use crate::keys::{ObjType, OutKey};
use crate::period::OutPeriod;
use crate::site::Site;
use crate::state::{DailyState, VegLayers};

/// Read-only inputs of a formatter.
#[derive(Debug, Clone, Copy)]
pub struct FormatContext<'a> {
    pub accs: &'a Accumulators,
    pub daily: &'a DailyState,
    pub site: &'a Site,
}

/// Produces the values of one category's keys.
pub trait Formatter {
    fn category(&self) -> ObjType;

    /// Append the values of `key` for `period` to `out`, in column order.
    fn values(
        &self,
        key: OutKey,
        period: OutPeriod,
        ctx: &FormatContext<'_>,
        out: &mut Vec<f64>,
    ) -> Result<(), OutputError>;
}

pub struct WeatherFormatter;
pub struct SoilWaterFormatter;
pub struct EstabFormatter;
pub struct VegProdFormatter;

/// Formatter of a category.
pub fn formatter_for(category: ObjType) -> &'static dyn Formatter {
    match category {
        ObjType::Weather => &WeatherFormatter,
        ObjType::SoilWater => &SoilWaterFormatter,
        ObjType::VegEstab => &EstabFormatter,
        ObjType::VegProd => &VegProdFormatter,
    }
}

/// Values of `key` for `period`, in column order.
pub fn key_values(
    key: OutKey,
    period: OutPeriod,
    ctx: &FormatContext<'_>,
    out: &mut Vec<f64>,
) -> Result<(), OutputError> {
    formatter_for(key.category()).values(key, period, ctx, out)
}

impl Formatter for WeatherFormatter {
    fn category(&self) -> ObjType {
        ObjType::Weather
    }

    fn values(
        &self,
        key: OutKey,
        period: OutPeriod,
        ctx: &FormatContext<'_>,
        out: &mut Vec<f64>,
    ) -> Result<(), OutputError> {
        let v = ctx.accs.weather.aggregate(period);
        match key {
            OutKey::Temp => out.extend_from_slice(&[
                v.temp_max,
                v.temp_min,
                v.temp_avg,
                v.surface_max,
                v.surface_min,
                v.surface_avg,
            ]),
            OutKey::Precip => {
                out.extend_from_slice(&[v.ppt, v.rain, v.snow, v.snowmelt, v.snowloss])
            }
            OutKey::SoilInf => out.push(v.soil_inf),
            OutKey::Runoff => out.extend_from_slice(&[
                v.surface_runoff + v.snow_runoff - v.surface_runon,
                v.surface_runoff,
                v.snow_runoff,
                v.surface_runon,
            ]),
            _ => {
                return Err(OutputError::Unhandled {
                    key,
                    context: "weather format",
                })
            }
        }
        Ok(())
    }
}

/// Layer-major, vegetation-fastest values of a (type, layer) table.
fn push_veg_layers(out: &mut Vec<f64>, table: &VegLayers, nl: usize) {
    for i in 0..nl {
        for veg in table {
            out.push(veg[i]);
        }
    }
}

impl Formatter for SoilWaterFormatter {
    fn category(&self) -> ObjType {
        ObjType::SoilWater
    }

    fn values(
        &self,
        key: OutKey,
        period: OutPeriod,
        ctx: &FormatContext<'_>,
        out: &mut Vec<f64>,
    ) -> Result<(), OutputError> {
        let v = ctx.accs.soil.aggregate(period);
        let site = ctx.site;
        let nl = site.n_layers();

        match key {
            OutKey::VWCBulk => out.extend((0..nl).map(|i| site.vwc_bulk(i, v.vwc_bulk[i]))),
            OutKey::VWCMatric => out.extend((0..nl).map(|i| site.vwc_matric(i, v.vwc_matric[i]))),
            OutKey::SWCBulk => out.extend_from_slice(&v.swc_bulk[..nl]),
            OutKey::SWPMatric => out.extend((0..nl).map(|i| site.swp_matric(i, v.swp_matric[i]))),
            OutKey::SWABulk => out.extend_from_slice(&v.swa_bulk[..nl]),
            OutKey::SWAMatric => out.extend((0..nl).map(|i| site.swa_matric(i, v.swa_matric[i]))),
            OutKey::SWA => push_veg_layers(out, &v.swa_veg, nl),
            OutKey::SurfaceWater => out.push(v.surface_water),
            OutKey::Transp => {
                out.extend_from_slice(&v.transp_total[..nl]);
                push_veg_layers(out, &v.transp, nl);
            }
            OutKey::EvapSoil => out.extend_from_slice(&v.evap_baresoil[..site.n_evap_layers]),
            OutKey::EvapSurface => {
                out.push(v.total_evap);
                out.extend_from_slice(&v.evap_veg);
                out.push(v.litter_evap);
                out.push(v.surface_water_evap);
            }
            OutKey::Interception => {
                out.push(v.total_int);
                out.extend_from_slice(&v.int_veg);
                out.push(v.litter_int);
            }
            OutKey::LyrDrain => out.extend_from_slice(&v.lyrdrain[..nl.saturating_sub(1)]),
            OutKey::HydRed => {
                out.extend_from_slice(&v.hydred_total[..nl]);
                push_veg_layers(out, &v.hydred, nl);
            }
            OutKey::AET => out.extend_from_slice(&[v.aet, v.tran, v.esoil, v.ecnw, v.esurf, v.esnow]),
            OutKey::PET => out.extend_from_slice(&[v.pet, v.h_oh, v.h_ot, v.h_gh, v.h_gt]),
            OutKey::WetDays => out.extend_from_slice(&v.wetdays[..nl]),
            OutKey::SnowPack => out.extend_from_slice(&[v.snowpack, v.snowdepth]),
            OutKey::DeepSWC => out.push(v.deep),
            OutKey::SoilTemp => {
                out.extend_from_slice(&v.soil_temp_max[..nl]);
                out.extend_from_slice(&v.soil_temp_min[..nl]);
                out.extend_from_slice(&v.soil_temp_avg[..nl]);
            }
            OutKey::Frozen => out.extend_from_slice(&v.frozen[..nl]),
            _ => {
                return Err(OutputError::Unhandled {
                    key,
                    context: "soil water format",
                })
            }
        }
        Ok(())
    }
}

impl Formatter for EstabFormatter {
    fn category(&self) -> ObjType {
        ObjType::VegEstab
    }

    fn values(
        &self,
        key: OutKey,
        _period: OutPeriod,
        ctx: &FormatContext<'_>,
        out: &mut Vec<f64>,
    ) -> Result<(), OutputError> {
        match key {
            OutKey::Estab => {
                let n = ctx.site.species.len();
                let doys = &ctx.daily.estab.estab_doy;
                out.extend((0..n).map(|i| doys.get(i).copied().unwrap_or(0) as f64));
                Ok(())
            }
            _ => Err(OutputError::Unhandled {
                key,
                context: "establishment format",
            }),
        }
    }
}

impl Formatter for VegProdFormatter {
    fn category(&self) -> ObjType {
        ObjType::VegProd
    }

    fn values(
        &self,
        key: OutKey,
        period: OutPeriod,
        ctx: &FormatContext<'_>,
        out: &mut Vec<f64>,
    ) -> Result<(), OutputError> {
        let today = &ctx.daily.veg;
        match key {
            OutKey::CO2Effects => {
                out.extend_from_slice(&today.co2_bio);
                out.extend_from_slice(&today.co2_wue);
            }
            OutKey::Biomass => {
                let v = ctx.accs.veg.aggregate(period);
                out.push(today.bare_cover);
                out.extend_from_slice(&today.cover);
                out.push(v.biomass_total);
                out.extend_from_slice(&v.biomass);
                out.push(v.litter_total);
                out.push(v.biolive_total);
                out.extend_from_slice(&v.biolive);
                out.push(v.lai);
            }
            _ => {
                return Err(OutputError::Unhandled {
                    key,
                    context: "vegetation production format",
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_LAYERS, NVEGTYPES};
    use crate::registry::Registry;
    use crate::site::SoilLayer;
    use approx::assert_relative_eq;

    fn site(nl: usize, species: usize) -> Site {
        Site::new(
            vec![SoilLayer::new(10.0, 0.2, 1.0, 15.0, 45.0, 5.0); nl],
            1,
            true,
            (0..species).map(|i| format!("sp{}", i)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn every_real_key_fills_its_columns() {
        for nl in [1, 3, 7] {
            let site = site(nl, 2);
            let registry = Registry::new(site.dims().unwrap());
            let accs = Accumulators::new();
            let daily = DailyState::new(2);
            let ctx = FormatContext {
                accs: &accs,
                daily: &daily,
                site: &site,
            };
            for key in OutKey::ALL.into_iter().filter(|k| !k.is_marker()) {
                for period in OutPeriod::ALL {
                    let mut out = Vec::new();
                    key_values(key, period, &ctx, &mut out).unwrap();
                    assert_eq!(out.len(), registry.ncol(key), "key {} with {} layers", key, nl);
                }
            }
        }
    }

    #[test]
    fn markers_are_unhandled_in_every_category() {
        let site = site(2, 0);
        let accs = Accumulators::new();
        let daily = DailyState::default();
        let ctx = FormatContext {
            accs: &accs,
            daily: &daily,
            site: &site,
        };
        for key in OutKey::ALL.into_iter().filter(|k| k.is_marker()) {
            let err = key_values(key, OutPeriod::Day, &ctx, &mut Vec::new()).unwrap_err();
            assert!(matches!(err, OutputError::Unhandled { .. }));
        }
    }

    #[test]
    fn formatters_reject_foreign_keys() {
        let site = site(2, 0);
        let accs = Accumulators::new();
        let daily = DailyState::default();
        let ctx = FormatContext {
            accs: &accs,
            daily: &daily,
            site: &site,
        };
        let categories = [
            ObjType::Weather,
            ObjType::SoilWater,
            ObjType::VegEstab,
            ObjType::VegProd,
        ];
        for category in categories {
            let f = formatter_for(category);
            assert_eq!(f.category(), category);
            for key in OutKey::ALL.into_iter().filter(|k| k.category() != category) {
                assert!(f.values(key, OutPeriod::Day, &ctx, &mut Vec::new()).is_err());
            }
        }
    }

    #[test]
    fn conversions_are_applied_at_format_time() {
        let site = site(1, 0);
        let mut accs = Accumulators::new();
        accs.soil.accu_mut(OutPeriod::Day).vwc_bulk[0] = 2.0;
        accs.soil.accu_mut(OutPeriod::Day).vwc_matric[0] = 2.0;
        accs.soil.accu_mut(OutPeriod::Day).swa_matric[0] = 0.8;
        accs.soil.accu_mut(OutPeriod::Day).swp_matric[0] = 2.0;
        let daily = DailyState::default();
        let ctx = FormatContext {
            accs: &accs,
            daily: &daily,
            site: &site,
        };
        let value = |key| {
            let mut out = Vec::new();
            key_values(key, OutPeriod::Day, &ctx, &mut out).unwrap();
            out[0]
        };
        assert_relative_eq!(value(OutKey::VWCBulk), 0.2);
        assert_relative_eq!(value(OutKey::VWCMatric), 0.25);
        assert_relative_eq!(value(OutKey::SWAMatric), 1.0);
        assert_relative_eq!(value(OutKey::SWPMatric), site.swp_matric(0, 2.0));
    }

    #[test]
    fn layered_values_follow_column_names() {
        let site = site(2, 0);
        let registry = Registry::new(site.dims().unwrap());
        let mut accs = Accumulators::new();
        {
            let a = accs.soil.accu_mut(OutPeriod::Day);
            for j in 0..NVEGTYPES {
                for i in 0..MAX_LAYERS {
                    a.transp[j][i] = (10 * j + i) as f64;
                    a.swa_veg[j][i] = (100 * j + i) as f64;
                }
            }
            a.transp_total[0] = -1.0;
            a.transp_total[1] = -2.0;
        }
        let daily = DailyState::default();
        let ctx = FormatContext {
            accs: &accs,
            daily: &daily,
            site: &site,
        };

        let mut out = Vec::new();
        key_values(OutKey::Transp, OutPeriod::Day, &ctx, &mut out).unwrap();
        let names = registry.colnames(OutKey::Transp);
        let lookup = |name: &str| out[names.iter().position(|n| n == name).unwrap()];
        assert_eq!(lookup("transp_total_Lyr_2"), -2.0);
        assert_eq!(lookup("transp_tree_Lyr_1"), 0.0);
        assert_eq!(lookup("transp_grass_Lyr_1"), 30.0);
        assert_eq!(lookup("transp_shrub_Lyr_2"), 11.0);

        let mut out = Vec::new();
        key_values(OutKey::SWA, OutPeriod::Day, &ctx, &mut out).unwrap();
        let names = registry.colnames(OutKey::SWA);
        let lookup = |name: &str| out[names.iter().position(|n| n == name).unwrap()];
        assert_eq!(lookup("swa_forbs_Lyr_1"), 200.0);
        assert_eq!(lookup("swa_grass_Lyr_2"), 301.0);
    }

    #[test]
    fn runoff_net_and_instantaneous_values() {
        let site = site(1, 2);
        let mut accs = Accumulators::new();
        {
            let w = accs.weather.accu_mut(OutPeriod::Day);
            w.surface_runoff = 0.5;
            w.snow_runoff = 0.25;
            w.surface_runon = 0.125;
        }
        let mut daily = DailyState::new(2);
        daily.estab.estab_doy = vec![120, 0];
        daily.veg.co2_bio = [1.1; NVEGTYPES];
        daily.veg.cover = [0.25; NVEGTYPES];
        let ctx = FormatContext {
            accs: &accs,
            daily: &daily,
            site: &site,
        };

        let mut out = Vec::new();
        key_values(OutKey::Runoff, OutPeriod::Day, &ctx, &mut out).unwrap();
        assert_relative_eq!(out[0], 0.625);

        let mut out = Vec::new();
        key_values(OutKey::Estab, OutPeriod::Year, &ctx, &mut out).unwrap();
        assert_eq!(out, vec![120.0, 0.0]);

        let mut out = Vec::new();
        key_values(OutKey::CO2Effects, OutPeriod::Year, &ctx, &mut out).unwrap();
        assert_eq!(out[0], 1.1);
        assert_eq!(out[4], 0.0);

        let mut out = Vec::new();
        key_values(OutKey::Biomass, OutPeriod::Month, &ctx, &mut out).unwrap();
        assert_eq!(out[1], 0.25);
    }
}
