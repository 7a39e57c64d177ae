//! Process-level queries: electromigration limits and layout hooks.

use arcstr::ArcStr;
use derive_builder::Builder;
use laygeom::Rect;
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::Result;

/// Which side of a via the queried layer is on.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The queried layer is the via's bottom layer.
    #[default]
    Lower,
    /// The queried layer is the via's top layer.
    Upper,
}

/// Current limits in amperes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmSpecs {
    pub idc: f64,
    pub irms: f64,
    pub ipeak: f64,
}

impl EmSpecs {
    pub fn new(idc: f64, irms: f64, ipeak: f64) -> Self {
        Self { idc, irms, ipeak }
    }
}

impl From<EmSpecs> for (f64, f64, f64) {
    fn from(value: EmSpecs) -> Self {
        (value.idc, value.irms, value.ipeak)
    }
}

/// A via electromigration query.
///
/// Metal dimensions are in layout units; `None` means unknown.
/// Temperatures are in degrees Celsius; `None` selects the process default.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ViaEmQuery {
    #[builder(default)]
    pub layer_dir: Direction,
    pub layer: ArcStr,
    #[builder(default)]
    pub purpose: ArcStr,
    pub adj_layer: ArcStr,
    #[builder(default)]
    pub adj_purpose: ArcStr,
    pub cut_w: i64,
    pub cut_h: i64,
    #[builder(default)]
    pub m_w: Option<f64>,
    #[builder(default)]
    pub m_l: Option<f64>,
    #[builder(default)]
    pub adj_m_w: Option<f64>,
    #[builder(default)]
    pub adj_m_l: Option<f64>,
    #[builder(default)]
    pub array: bool,
    #[builder(default)]
    pub dc_temp: Option<f64>,
    #[builder(default)]
    pub rms_dt: Option<f64>,
}

impl ViaEmQuery {
    pub fn builder() -> ViaEmQueryBuilder {
        ViaEmQueryBuilder::default()
    }
}

/// A metal or resistor electromigration query.
#[derive(Debug, Default, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(default, setter(into))]
pub struct WireEmQuery {
    /// Width in layout units.
    pub w: f64,
    /// Length in layout units, if known.
    pub length: Option<f64>,
    pub vertical: bool,
    pub dc_temp: Option<f64>,
    pub rms_dt: Option<f64>,
}

impl WireEmQuery {
    pub fn new(w: f64) -> Self {
        Self {
            w,
            ..Default::default()
        }
    }

    pub fn builder() -> WireEmQueryBuilder {
        WireEmQueryBuilder::default()
    }
}

/// Process information not tied to a particular device row.
pub trait TechInfo {
    /// Layout resolution in layout units.
    fn resolution(&self) -> f64;

    /// Layout unit in meters.
    fn layout_unit(&self) -> f64;

    fn metal_em_specs(&self, layer: &str, purpose: &str, query: &WireEmQuery)
        -> Result<EmSpecs>;

    fn via_em_specs(&self, query: &ViaEmQuery) -> Result<EmSpecs>;

    fn res_em_specs(&self, res_type: &str, query: &WireEmQuery) -> Result<EmSpecs>;

    fn add_cell_boundary(&self, canvas: &mut dyn Canvas, bbox: Rect);

    fn draw_device_blockage(&self, canvas: &mut dyn Canvas);
}
