//! Site description and format-time soil water conversions.
//!
//! Per-layer parameters:
//! - `width`: layer thickness [cm]
//! - `gravel`: volumetric gravel fraction [-]
//! - `swc_wiltpt`: bulk water content at wilting point [cm]
//! - `psis`, `thetas`, `b`: Campbell (1974) matric retention parameters
//!   (air-entry potential [cm], saturated water content [%], shape [-])

use crate::constants::{BARCONV, MAX_LAYERS};
use crate::registry::SiteDims;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilLayer {
    pub width: f64,
    pub gravel: f64,
    pub swc_wiltpt: f64,
    pub psis: f64,
    pub thetas: f64,
    pub b: f64,
}

impl SoilLayer {
    pub fn new(width: f64, gravel: f64, swc_wiltpt: f64, psis: f64, thetas: f64, b: f64) -> Self {
        Self {
            width,
            gravel,
            swc_wiltpt,
            psis,
            thetas,
            b,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub layers: Vec<SoilLayer>,
    /// Layers contributing to bare-soil evaporation, counted from the top.
    pub n_evap_layers: usize,
    /// Whether the bottom layer drains into deep storage.
    pub deep_drain: bool,
    /// Base-0 layer whose drainage is reported as deep drainage.
    pub deep_lyr: usize,
    /// Species tracked by establishment output.
    pub species: Vec<String>,
}

impl Site {
    /// Create a validated site.
    pub fn new(
        layers: Vec<SoilLayer>,
        n_evap_layers: usize,
        deep_drain: bool,
        species: Vec<String>,
    ) -> Result<Self, String> {
        let n = layers.len();
        if n == 0 || n > MAX_LAYERS {
            return Err(format!(
                "number of soil layers {} must be within 1..={}",
                n, MAX_LAYERS
            ));
        }
        if n_evap_layers > n {
            return Err(format!(
                "evaporation layers {} exceed soil layers {}",
                n_evap_layers, n
            ));
        }
        for (i, lyr) in layers.iter().enumerate() {
            if lyr.width <= 0.0 {
                return Err(format!("layer {}: width must be positive", i + 1));
            }
            if !(0.0..1.0).contains(&lyr.gravel) {
                return Err(format!("layer {}: gravel fraction must be in [0, 1)", i + 1));
            }
            if lyr.thetas <= 0.0 {
                return Err(format!("layer {}: thetas must be positive", i + 1));
            }
        }
        Ok(Self {
            deep_lyr: n - 1,
            layers,
            n_evap_layers,
            deep_drain,
            species,
        })
    }

    /// Uniform site, handy for setups without measured profiles.
    pub fn uniform(n_layers: usize, layer: SoilLayer, n_evap_layers: usize) -> Result<Self, String> {
        Self::new(vec![layer; n_layers], n_evap_layers, false, Vec::new())
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    /// Extents used by the key registry.
    pub fn dims(&self) -> Result<SiteDims, String> {
        SiteDims::new(self.n_layers(), self.n_evap_layers, self.species.clone())
    }

    /// Bulk volumetric water content [cm/cm].
    pub fn vwc_bulk(&self, lyr: usize, swc: f64) -> f64 {
        swc / self.layers[lyr].width
    }

    /// Matric volumetric water content [cm/cm], excluding gravel.
    pub fn vwc_matric(&self, lyr: usize, swc: f64) -> f64 {
        let l = &self.layers[lyr];
        swc / (1.0 - l.gravel) / l.width
    }

    /// Available water of the matric fraction [cm].
    pub fn swa_matric(&self, lyr: usize, swa: f64) -> f64 {
        swa / (1.0 - self.layers[lyr].gravel)
    }

    /// Matric soil water potential [-bar] from bulk water content.
    ///
    /// Dry layers report 0.
    pub fn swp_matric(&self, lyr: usize, swc: f64) -> f64 {
        if swc <= 0.0 {
            return 0.0;
        }
        let l = &self.layers[lyr];
        let theta1 = (swc / l.width) * 100.0 / (1.0 - l.gravel);
        l.psis / (theta1 / l.thetas).powf(l.b) / BARCONV
    }
}
