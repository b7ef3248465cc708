//! Output key registry.
//!
//! For every key: the ordered variables with their soil-layer and
//! vegetation-type extents, the total column count, and the generated
//! column names. Names are produced in the same order as the within-row
//! column index of [`crate::index::flat_column`]: variables back to back,
//! and inside a variable the vegetation type varies fastest, then the soil
//! layer.

use smallvec::SmallVec;

use crate::constants::{
    BARE_GROUND_NAME, LAYER_STEM, LITTER_NAME, MAX_LAYERS, NAME_SEP, NVEGTYPES, TOTAL_NAME,
    VEG_NAMES,
};
use crate::keys::OutKey;

/// Soil-layer and vegetation-type extents of one variable; 0 means the
/// dimension is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableShape {
    pub n_sl: usize,
    pub n_pft: usize,
}

impl VariableShape {
    pub const SCALAR: VariableShape = VariableShape { n_sl: 0, n_pft: 0 };

    pub fn layers(n_sl: usize) -> Self {
        Self { n_sl, n_pft: 0 }
    }

    pub fn vegtypes() -> Self {
        Self {
            n_sl: 0,
            n_pft: NVEGTYPES,
        }
    }

    pub fn layers_by_vegtype(n_sl: usize) -> Self {
        Self {
            n_sl,
            n_pft: NVEGTYPES,
        }
    }

    /// Soil extent with an absent dimension counted as 1.
    pub fn sl_extent(&self) -> usize {
        self.n_sl.max(1)
    }

    /// Vegetation extent with an absent dimension counted as 1.
    pub fn pft_extent(&self) -> usize {
        self.n_pft.max(1)
    }

    /// Columns occupied by this variable in one row.
    pub fn n_cols(&self) -> usize {
        self.sl_extent() * self.pft_extent()
    }
}

/// One variable of an output key.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    /// Leading part of the column name; may be empty.
    pub prefix: String,
    /// Trailing part of the column name; may be empty.
    pub suffix: &'static str,
    pub shape: VariableShape,
}

impl VarSpec {
    fn scalar(name: impl Into<String>) -> Self {
        Self {
            prefix: name.into(),
            suffix: "",
            shape: VariableShape::SCALAR,
        }
    }

    fn new(prefix: impl Into<String>, shape: VariableShape) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: "",
            shape,
        }
    }

    fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Column name of soil layer `s` and vegetation type `v` (both base 0,
    /// ignored when the dimension is absent).
    pub fn column_name(&self, s: usize, v: usize) -> String {
        let mut parts: SmallVec<[String; 4]> = SmallVec::new();
        if !self.prefix.is_empty() {
            parts.push(self.prefix.clone());
        }
        if self.shape.n_pft > 0 {
            parts.push(VEG_NAMES[v].to_string());
        }
        if self.shape.n_sl > 0 {
            parts.push(format!("{}{}{}", LAYER_STEM, NAME_SEP, s + 1));
        }
        if !self.suffix.is_empty() {
            parts.push(self.suffix.to_string());
        }
        parts.join(NAME_SEP)
    }

    /// All column names of this variable in flat order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.shape.n_cols());
        for s in 0..self.shape.sl_extent() {
            for v in 0..self.shape.pft_extent() {
                names.push(self.column_name(s, v));
            }
        }
        names
    }
}

/// Site-dependent extents that size the per-key variables.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDims {
    pub n_layers: usize,
    pub n_evap_layers: usize,
    /// Names of the species tracked by establishment output.
    pub species: Vec<String>,
}

impl SiteDims {
    pub fn new(n_layers: usize, n_evap_layers: usize, species: Vec<String>) -> Result<Self, String> {
        if n_layers == 0 || n_layers > MAX_LAYERS {
            return Err(format!(
                "number of soil layers {} must be within 1..={}",
                n_layers, MAX_LAYERS
            ));
        }
        if n_evap_layers > n_layers {
            return Err(format!(
                "evaporation layers {} exceed soil layers {}",
                n_evap_layers, n_layers
            ));
        }
        Ok(Self {
            n_layers,
            n_evap_layers,
            species,
        })
    }
}

const TEMP_COLS: [&str; 6] = [
    "max_C",
    "min_C",
    "avg_C",
    "surfaceTemp_max_C",
    "surfaceTemp_min_C",
    "surfaceTemp_avg_C",
];
const PRECIP_COLS: [&str; 5] = ["ppt", "rain", "snow_fall", "snowmelt", "snowloss"];
const RUNOFF_COLS: [&str; 4] = ["net", "ponded_runoff", "snowmelt_runoff", "ponded_runon"];
const AET_COLS: [&str; 6] = [
    "evapotr_cm",
    "tran_cm",
    "esoil_cm",
    "ecnw_cm",
    "esurf_cm",
    "esnow_cm",
];
const PET_COLS: [&str; 5] = ["pet_cm", "H_oh_MJm-2", "H_ot_MJm-2", "H_gh_MJm-2", "H_gt_MJm-2"];
const SNOWPACK_COLS: [&str; 2] = ["snowpackWaterEquivalent_cm", "snowdepth_cm"];

/// `<stem>_<label>`, e.g. `evap_litter`.
fn labelled(stem: &str, label: &str) -> String {
    format!("{}{}{}", stem, NAME_SEP, label)
}

fn scalars(names: &[&str]) -> Vec<VarSpec> {
    names.iter().map(|n| VarSpec::scalar(*n)).collect()
}

/// Ordered variables of `key` for a site.
pub fn variables(key: OutKey, dims: &SiteDims) -> Vec<VarSpec> {
    let nl = dims.n_layers;
    match key {
        OutKey::AllWthr | OutKey::AllH2O | OutKey::ET | OutKey::AllVeg => Vec::new(),

        OutKey::Temp => scalars(&TEMP_COLS),
        OutKey::Precip => scalars(&PRECIP_COLS),
        OutKey::SoilInf => scalars(&["soil_inf"]),
        OutKey::Runoff => scalars(&RUNOFF_COLS),

        OutKey::VWCBulk
        | OutKey::VWCMatric
        | OutKey::SWCBulk
        | OutKey::SWABulk
        | OutKey::SWAMatric
        | OutKey::SWPMatric
        | OutKey::WetDays
        | OutKey::Frozen => vec![VarSpec::new("", VariableShape::layers(nl))],

        OutKey::SWA => vec![VarSpec::new("swa", VariableShape::layers_by_vegtype(nl))],
        OutKey::SurfaceWater => scalars(&["surfaceWater_cm"]),
        OutKey::Transp => vec![
            VarSpec::new(labelled("transp", TOTAL_NAME), VariableShape::layers(nl)),
            VarSpec::new("transp", VariableShape::layers_by_vegtype(nl)),
        ],
        OutKey::EvapSoil if dims.n_evap_layers == 0 => Vec::new(),
        OutKey::EvapSoil => vec![VarSpec::new("", VariableShape::layers(dims.n_evap_layers))],
        OutKey::EvapSurface => vec![
            VarSpec::scalar(labelled("evap", TOTAL_NAME)),
            VarSpec::new("evap", VariableShape::vegtypes()),
            VarSpec::scalar(labelled("evap", LITTER_NAME)),
            VarSpec::scalar("evap_surfaceWater"),
        ],
        OutKey::Interception => vec![
            VarSpec::scalar(labelled("int", TOTAL_NAME)),
            VarSpec::new("int", VariableShape::vegtypes()),
            VarSpec::scalar(labelled("int", LITTER_NAME)),
        ],
        OutKey::LyrDrain if nl < 2 => Vec::new(),
        OutKey::LyrDrain => vec![VarSpec::new("", VariableShape::layers(nl - 1))],
        OutKey::HydRed => vec![
            VarSpec::new(TOTAL_NAME, VariableShape::layers(nl)),
            VarSpec::new("", VariableShape::layers_by_vegtype(nl)),
        ],
        OutKey::AET => scalars(&AET_COLS),
        OutKey::PET => scalars(&PET_COLS),
        OutKey::SnowPack => scalars(&SNOWPACK_COLS),
        OutKey::DeepSWC => scalars(&["lowLayerDrain_cm"]),
        OutKey::SoilTemp => vec![
            VarSpec::new("", VariableShape::layers(nl)).with_suffix("max_C"),
            VarSpec::new("", VariableShape::layers(nl)).with_suffix("min_C"),
            VarSpec::new("", VariableShape::layers(nl)).with_suffix("avg_C"),
        ],

        OutKey::Estab => dims.species.iter().map(VarSpec::scalar).collect(),
        OutKey::CO2Effects => vec![
            VarSpec::new("BioMult", VariableShape::vegtypes()),
            VarSpec::new("WUEMult", VariableShape::vegtypes()),
        ],
        OutKey::Biomass => vec![
            VarSpec::scalar(labelled("fCover", BARE_GROUND_NAME)),
            VarSpec::new("fCover", VariableShape::vegtypes()),
            VarSpec::scalar(labelled("Biomass", TOTAL_NAME)),
            VarSpec::new("Biomass", VariableShape::vegtypes()),
            VarSpec::scalar(labelled("Biomass", LITTER_NAME)),
            VarSpec::scalar(labelled("Biolive", TOTAL_NAME)),
            VarSpec::new("Biolive", VariableShape::vegtypes()),
            VarSpec::scalar(labelled("LAI", TOTAL_NAME)),
        ],
    }
}

/// Reference column counts, written out per key.
pub fn expected_ncol(key: OutKey, dims: &SiteDims) -> usize {
    let nl = dims.n_layers;
    match key {
        OutKey::AllWthr | OutKey::AllH2O | OutKey::ET | OutKey::AllVeg => 0,
        OutKey::Temp => 6,
        OutKey::Precip => 5,
        OutKey::SoilInf => 1,
        OutKey::Runoff => 4,
        OutKey::VWCBulk
        | OutKey::VWCMatric
        | OutKey::SWCBulk
        | OutKey::SWABulk
        | OutKey::SWAMatric
        | OutKey::SWPMatric
        | OutKey::WetDays
        | OutKey::Frozen => nl,
        OutKey::SWA => nl * NVEGTYPES,
        OutKey::SurfaceWater => 1,
        OutKey::Transp | OutKey::HydRed => nl * (NVEGTYPES + 1),
        OutKey::EvapSoil => dims.n_evap_layers,
        OutKey::EvapSurface => NVEGTYPES + 3,
        OutKey::Interception => NVEGTYPES + 2,
        OutKey::LyrDrain => nl.saturating_sub(1),
        OutKey::AET => 6,
        OutKey::PET => 5,
        OutKey::SnowPack => 2,
        OutKey::DeepSWC => 1,
        OutKey::SoilTemp => 3 * nl,
        OutKey::Estab => dims.species.len(),
        OutKey::CO2Effects => 2 * NVEGTYPES,
        OutKey::Biomass => (NVEGTYPES + 1) + (NVEGTYPES + 2) + (NVEGTYPES + 1) + 1,
    }
}

/// Per-key metadata, resolved once for a site.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    pub key: OutKey,
    pub variables: Vec<VarSpec>,
    /// Column index at which each variable starts.
    pub var_cols: SmallVec<[usize; 8]>,
    pub ncol: usize,
    pub colnames: Vec<String>,
}

impl KeyInfo {
    fn new(key: OutKey, dims: &SiteDims) -> Self {
        let variables = variables(key, dims);
        let mut var_cols = SmallVec::with_capacity(variables.len());
        let mut ncol = 0;
        let mut colnames = Vec::new();
        for var in &variables {
            var_cols.push(ncol);
            ncol += var.shape.n_cols();
            colnames.extend(var.column_names());
        }
        Self {
            key,
            variables,
            var_cols,
            ncol,
            colnames,
        }
    }

    /// Variable and (soil layer, vegetation type) of within-row column
    /// `col`.
    pub fn locate(&self, col: usize) -> Option<(usize, usize, usize)> {
        let var = self.var_cols.iter().rposition(|&start| start <= col)?;
        let shape = self.variables[var].shape;
        let rel = col - self.var_cols[var];
        if rel >= shape.n_cols() {
            return None;
        }
        Some((var, rel / shape.pft_extent(), rel % shape.pft_extent()))
    }
}

/// Registry of all keys for one site.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub dims: SiteDims,
    infos: Vec<KeyInfo>,
}

impl Registry {
    pub fn new(dims: SiteDims) -> Self {
        let infos = OutKey::ALL.iter().map(|&k| KeyInfo::new(k, &dims)).collect();
        Self { dims, infos }
    }

    pub fn info(&self, key: OutKey) -> &KeyInfo {
        &self.infos[key.index()]
    }

    pub fn ncol(&self, key: OutKey) -> usize {
        self.info(key).ncol
    }

    pub fn colnames(&self, key: OutKey) -> &[String] {
        &self.info(key).colnames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{nc_offset, OffsetTable};

    fn dims(nl: usize, ne: usize, ns: usize) -> SiteDims {
        let species = (0..ns).map(|i| format!("sp{}", i + 1)).collect();
        SiteDims::new(nl, ne, species).unwrap()
    }

    // -- Column counts --

    #[test]
    fn column_count_invariant_holds_for_every_key() {
        for nl in [1, 2, 5, 8, MAX_LAYERS] {
            for ne in [0, 1, nl] {
                for ns in [0, 1, 3] {
                    let d = dims(nl, ne.min(nl), ns);
                    for key in OutKey::ALL {
                        let from_shapes: usize =
                            variables(key, &d).iter().map(|v| v.shape.n_cols()).sum();
                        assert_eq!(
                            from_shapes,
                            expected_ncol(key, &d),
                            "key {} with {} layers",
                            key,
                            nl
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn names_match_column_count() {
        let reg = Registry::new(dims(5, 3, 2));
        for key in OutKey::ALL {
            assert_eq!(reg.colnames(key).len(), reg.ncol(key), "key {}", key);
        }
        assert_eq!(reg.ncol(OutKey::Biomass), 17);
        assert_eq!(reg.ncol(OutKey::AllWthr), 0);
    }

    #[test]
    fn site_dims_validation() {
        assert!(SiteDims::new(0, 0, vec![]).is_err());
        assert!(SiteDims::new(MAX_LAYERS + 1, 0, vec![]).is_err());
        assert!(SiteDims::new(3, 4, vec![]).is_err());
        assert!(SiteDims::new(3, 3, vec![]).is_ok());
    }

    // -- Column names --

    #[test]
    fn scalar_and_layer_names() {
        let reg = Registry::new(dims(3, 2, 0));
        assert_eq!(reg.colnames(OutKey::Temp)[3], "surfaceTemp_max_C");
        assert_eq!(reg.colnames(OutKey::VWCBulk), &["Lyr_1", "Lyr_2", "Lyr_3"]);
        assert_eq!(reg.colnames(OutKey::LyrDrain), &["Lyr_1", "Lyr_2"]);
        assert_eq!(reg.colnames(OutKey::EvapSoil), &["Lyr_1", "Lyr_2"]);
        assert_eq!(
            reg.colnames(OutKey::SoilTemp),
            &[
                "Lyr_1_max_C",
                "Lyr_2_max_C",
                "Lyr_3_max_C",
                "Lyr_1_min_C",
                "Lyr_2_min_C",
                "Lyr_3_min_C",
                "Lyr_1_avg_C",
                "Lyr_2_avg_C",
                "Lyr_3_avg_C",
            ]
        );
    }

    #[test]
    fn vegtype_names() {
        let reg = Registry::new(dims(2, 1, 0));
        assert_eq!(
            reg.colnames(OutKey::EvapSurface),
            &[
                "evap_total",
                "evap_tree",
                "evap_shrub",
                "evap_forbs",
                "evap_grass",
                "evap_litter",
                "evap_surfaceWater",
            ]
        );
        assert_eq!(reg.colnames(OutKey::CO2Effects)[0], "BioMult_tree");
        assert_eq!(reg.colnames(OutKey::CO2Effects)[7], "WUEMult_grass");
        assert_eq!(reg.colnames(OutKey::Biomass)[0], "fCover_BareGround");
        assert_eq!(reg.colnames(OutKey::Biomass)[16], "LAI_total");
    }

    #[test]
    fn layered_vegtype_names() {
        let reg = Registry::new(dims(2, 1, 0));
        let transp = reg.colnames(OutKey::Transp);
        assert_eq!(transp[0], "transp_total_Lyr_1");
        assert_eq!(transp[1], "transp_total_Lyr_2");
        assert_eq!(transp[2], "transp_tree_Lyr_1");
        assert_eq!(transp[3], "transp_shrub_Lyr_1");
        assert_eq!(transp[6], "transp_tree_Lyr_2");
        let hydred = reg.colnames(OutKey::HydRed);
        assert_eq!(hydred[0], "total_Lyr_1");
        assert_eq!(hydred[2], "tree_Lyr_1");
    }

    #[test]
    fn establishment_uses_species_names() {
        let reg = Registry::new(dims(2, 1, 2));
        assert_eq!(reg.colnames(OutKey::Estab), &["sp1", "sp2"]);
    }

    #[test]
    fn locate_inverts_column_order() {
        let reg = Registry::new(dims(3, 1, 0));
        let info = reg.info(OutKey::Transp);
        assert_eq!(info.locate(0), Some((0, 0, 0)));
        assert_eq!(info.locate(2), Some((0, 2, 0)));
        assert_eq!(info.locate(3), Some((1, 0, 0)));
        assert_eq!(info.locate(4), Some((1, 0, 1)));
        assert_eq!(info.locate(7), Some((1, 1, 0)));
        assert_eq!(info.locate(info.ncol), None);
    }

    // -- Names and offsets --

    /// Base-0 vegetation type (if any) and soil layer of a column name.
    fn parse_column(name: &str) -> (Option<usize>, usize) {
        let parts: Vec<&str> = name.split(NAME_SEP).collect();
        let v = parts
            .iter()
            .find_map(|p| VEG_NAMES.iter().position(|veg| veg == p));
        let lyr = parts.iter().position(|p| *p == LAYER_STEM).unwrap();
        let s: usize = parts[lyr + 1].parse().unwrap();
        (v, s - 1)
    }

    #[test]
    fn column_names_follow_grid_offsets() {
        let nl = 3;
        let reg = Registry::new(dims(nl, 1, 0));
        for key in [OutKey::Transp, OutKey::SWA] {
            let info = reg.info(key);
            let table = OffsetTable::new(info, 1, nl);
            for (n, name) in info.colnames.iter().enumerate() {
                let (var, _, _) = info.locate(n).unwrap();
                let (v, s) = parse_column(name);
                let v = match v {
                    Some(v) => v,
                    None => {
                        assert_eq!(info.variables[var].shape.n_pft, 0, "{}", name);
                        0
                    }
                };
                let shape = info.variables[var].shape;
                assert_eq!(table.position(var, 0, s, v), n, "{} {}", key, name);
                assert_eq!(
                    info.var_cols[var] + nc_offset(0, s, v, shape.n_sl, shape.n_pft),
                    n,
                    "{} {}",
                    key,
                    name
                );
            }
        }
    }
}
