//! Output keys and their object categories.
//!
//! Keys are listed in the fixed order used by every per-key table and by
//! the column order of the text files. Four marker keys (`WTHR`, `ALLH2O`,
//! `ET`, `ALLVEG`) are recognised by the setup parser but never produce
//! output.

use std::fmt;

use crate::error::OutputError;

/// Object category owning a key's daily values and accumulators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjType {
    Weather,
    SoilWater,
    VegEstab,
    VegProd,
}

impl ObjType {
    /// Order in which categories are summed each day.
    pub const SUM_ORDER: [ObjType; 4] = [
        ObjType::SoilWater,
        ObjType::Weather,
        ObjType::VegEstab,
        ObjType::VegProd,
    ];
}

/// Output key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutKey {
    AllWthr,
    Temp,
    Precip,
    SoilInf,
    Runoff,
    AllH2O,
    VWCBulk,
    VWCMatric,
    SWCBulk,
    SWABulk,
    SWAMatric,
    SWA,
    SWPMatric,
    SurfaceWater,
    Transp,
    EvapSoil,
    EvapSurface,
    Interception,
    LyrDrain,
    HydRed,
    ET,
    AET,
    PET,
    WetDays,
    SnowPack,
    DeepSWC,
    SoilTemp,
    Frozen,
    AllVeg,
    Estab,
    CO2Effects,
    Biomass,
}

/// Number of output keys, markers included.
pub const N_KEYS: usize = 32;

impl OutKey {
    /// All keys in table order.
    pub const ALL: [OutKey; N_KEYS] = [
        OutKey::AllWthr,
        OutKey::Temp,
        OutKey::Precip,
        OutKey::SoilInf,
        OutKey::Runoff,
        OutKey::AllH2O,
        OutKey::VWCBulk,
        OutKey::VWCMatric,
        OutKey::SWCBulk,
        OutKey::SWABulk,
        OutKey::SWAMatric,
        OutKey::SWA,
        OutKey::SWPMatric,
        OutKey::SurfaceWater,
        OutKey::Transp,
        OutKey::EvapSoil,
        OutKey::EvapSurface,
        OutKey::Interception,
        OutKey::LyrDrain,
        OutKey::HydRed,
        OutKey::ET,
        OutKey::AET,
        OutKey::PET,
        OutKey::WetDays,
        OutKey::SnowPack,
        OutKey::DeepSWC,
        OutKey::SoilTemp,
        OutKey::Frozen,
        OutKey::AllVeg,
        OutKey::Estab,
        OutKey::CO2Effects,
        OutKey::Biomass,
    ];

    /// Position in per-key tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Setup file and column header name.
    pub fn name(self) -> &'static str {
        match self {
            OutKey::AllWthr => "WTHR",
            OutKey::Temp => "TEMP",
            OutKey::Precip => "PRECIP",
            OutKey::SoilInf => "SOILINFILT",
            OutKey::Runoff => "RUNOFF",
            OutKey::AllH2O => "ALLH2O",
            OutKey::VWCBulk => "VWCBULK",
            OutKey::VWCMatric => "VWCMATRIC",
            OutKey::SWCBulk => "SWCBULK",
            OutKey::SWABulk => "SWABULK",
            OutKey::SWAMatric => "SWAMATRIC",
            OutKey::SWA => "SWA",
            OutKey::SWPMatric => "SWPMATRIC",
            OutKey::SurfaceWater => "SURFACEWATER",
            OutKey::Transp => "TRANSP",
            OutKey::EvapSoil => "EVAPSOIL",
            OutKey::EvapSurface => "EVAPSURFACE",
            OutKey::Interception => "INTERCEPTION",
            OutKey::LyrDrain => "LYRDRAIN",
            OutKey::HydRed => "HYDRED",
            OutKey::ET => "ET",
            OutKey::AET => "AET",
            OutKey::PET => "PET",
            OutKey::WetDays => "WETDAY",
            OutKey::SnowPack => "SNOWPACK",
            OutKey::DeepSWC => "DEEPSWC",
            OutKey::SoilTemp => "SOILTEMP",
            OutKey::Frozen => "FROZEN",
            OutKey::AllVeg => "ALLVEG",
            OutKey::Estab => "ESTABL",
            OutKey::CO2Effects => "CO2EFFECTS",
            OutKey::Biomass => "BIOMASS",
        }
    }

    /// Parse a key name, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, OutputError> {
        OutKey::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| OutputError::UnknownKey(s.to_string()))
    }

    pub fn category(self) -> ObjType {
        use OutKey::*;
        match self {
            AllWthr | Temp | Precip | SoilInf | Runoff => ObjType::Weather,
            AllVeg | Estab => ObjType::VegEstab,
            CO2Effects | Biomass => ObjType::VegProd,
            AllH2O | VWCBulk | VWCMatric | SWCBulk | SWABulk | SWAMatric | SWA | SWPMatric
            | SurfaceWater | Transp | EvapSoil | EvapSurface | Interception | LyrDrain | HydRed
            | ET | AET | PET | WetDays | SnowPack | DeepSWC | SoilTemp | Frozen => {
                ObjType::SoilWater
            }
        }
    }

    /// Keys whose columns carry a soil-layer dimension. They go to the
    /// soil-layer text files and accept the FIN policy.
    pub fn has_soil_layers(self) -> bool {
        use OutKey::*;
        matches!(
            self,
            VWCBulk
                | VWCMatric
                | SWCBulk
                | SWABulk
                | SWAMatric
                | SWA
                | SWPMatric
                | Transp
                | EvapSoil
                | LyrDrain
                | HydRed
                | WetDays
                | SoilTemp
                | Frozen
        )
    }

    /// Category markers without output of their own.
    pub fn is_marker(self) -> bool {
        matches!(
            self,
            OutKey::AllWthr | OutKey::AllH2O | OutKey::ET | OutKey::AllVeg
        )
    }
}

impl fmt::Display for OutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_index() {
        for (i, k) in OutKey::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
        assert_eq!(OutKey::Biomass.index(), N_KEYS - 1);
    }

    #[test]
    fn names_round_trip_through_parse() {
        for k in OutKey::ALL {
            assert_eq!(OutKey::parse(k.name()).unwrap(), k);
            assert_eq!(OutKey::parse(&k.name().to_lowercase()).unwrap(), k);
        }
        assert!(matches!(
            OutKey::parse("RAINFALL"),
            Err(OutputError::UnknownKey(_))
        ));
    }

    #[test]
    fn four_markers_and_28_real_keys() {
        let markers = OutKey::ALL.iter().filter(|k| k.is_marker()).count();
        assert_eq!(markers, 4);
        assert_eq!(N_KEYS - markers, 28);
    }

    #[test]
    fn categories() {
        assert_eq!(OutKey::Temp.category(), ObjType::Weather);
        assert_eq!(OutKey::Runoff.category(), ObjType::Weather);
        assert_eq!(OutKey::AET.category(), ObjType::SoilWater);
        assert_eq!(OutKey::Frozen.category(), ObjType::SoilWater);
        assert_eq!(OutKey::Estab.category(), ObjType::VegEstab);
        assert_eq!(OutKey::Biomass.category(), ObjType::VegProd);
    }

    #[test]
    fn soil_layer_keys() {
        let sl: Vec<OutKey> = OutKey::ALL
            .into_iter()
            .filter(|k| k.has_soil_layers())
            .collect();
        assert_eq!(sl.len(), 14);
        assert!(sl.contains(&OutKey::Transp));
        assert!(!sl.contains(&OutKey::DeepSWC));
        assert!(!sl.contains(&OutKey::SurfaceWater));
    }
}
