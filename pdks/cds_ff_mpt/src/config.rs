//! The process parameter table.

use std::collections::HashMap;
use std::path::Path;

use arcstr::ArcStr;
use laygen::error::{ErrorContext, ErrorSource, LaygenError, Result};
use laygen::layers::LayerSpec;
use laygen::mos::error::MosError;
use laygen::mos::MosType;
use laylut::FloatLut1;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("error parsing YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid table {name}: {reason}")]
    InvalidTable { name: &'static str, reason: String },
    #[error("expected {expected} via levels in {name}, found {found}")]
    ViaLevels {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("no channel lengths defined")]
    NoChannelLengths,
}

impl From<ConfigError> for ErrorSource {
    fn from(value: ConfigError) -> Self {
        ErrorSource::Config(value.to_string())
    }
}

/// Metal layer classes, which share spacing and EM rules.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerType {
    #[serde(rename = "1x")]
    OneX,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "2x")]
    TwoX,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleTable {
    pub temp: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScaleTable {
    fn to_lut(&self, name: &'static str) -> std::result::Result<FloatLut1, ConfigError> {
        FloatLut1::builder()
            .k1(self.temp.clone())
            .values(self.scale.clone())
            .build()
            .map_err(|err| ConfigError::InvalidTable {
                name,
                reason: err.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmConfig {
    pub dc_temp: f64,
    pub rms_dt: f64,
    pub idc_scale: ScaleTable,
    pub res_idc_scale: ScaleTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaIdEntry {
    pub bot: LayerSpec,
    pub top: LayerSpec,
    pub id: ArcStr,
}

/// Front-end rules shared by every channel length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosRules {
    pub fin_h: i64,
    pub fin_pitch: i64,
    pub od_spy: i64,
    pub cpo_h: i64,
    pub cpo_od_sp: i64,
    pub cpo_po_ency: i64,
    pub mp_h: i64,
    pub mp_spy: i64,
    pub mp_cpo_sp: i64,
    pub mp_md_sp: i64,
    pub mp_po_ovl: i64,
    pub md_w: i64,
    pub md_h_min: i64,
    pub md_od_exty: i64,
    pub md_spy: i64,
    pub mos_conn_w: i64,
}

impl MosRules {
    /// Height of an OD with `w` fins.
    #[inline]
    pub fn od_h(&self, w: i64) -> i64 {
        (w - 1) * self.fin_pitch + self.fin_h
    }

    /// Height of the MD covering an OD with `w` fins.
    #[inline]
    pub fn md_h(&self, w: i64) -> i64 {
        std::cmp::max(self.od_h(w) + 2 * self.md_od_exty, self.md_h_min)
    }

    /// Number of fins in an OD of height `od_h`.
    #[inline]
    pub fn num_fins(&self, od_h: i64) -> i64 {
        (od_h - self.fin_h).div_euclid(self.fin_pitch) + 1
    }
}

/// Rules that depend on channel length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LchRules {
    pub lch_unit: i64,
    pub sd_pitch: i64,
}

/// Edge and guard ring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRules {
    pub outer_fg: i64,
    pub gr_nf_min: i64,
    pub gr_sub_fg_margin: i64,
    pub gr_sep_fg: i64,
    pub cpo_po_extx: i64,
}

/// Cut size and metal enclosures of one via level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaLevel {
    pub w: i64,
    pub h: i64,
    pub bot_encx: i64,
    pub bot_ency: i64,
    pub top_encx: i64,
    pub top_ency: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosLayers {
    pub fin_area: LayerSpec,
    pub implant: HashMap<MosType, Vec<LayerSpec>>,
    pub threshold: HashMap<ArcStr, Vec<LayerSpec>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosConfig {
    #[serde(flatten)]
    pub rules: MosRules,
    pub lch: Vec<LchRules>,
    pub edge: EdgeRules,
    pub via_g: Vec<ViaLevel>,
    pub via_d: Vec<ViaLevel>,
    pub layers: MosLayers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechConfig {
    pub tech_lib: ArcStr,
    pub resolution: f64,
    pub layout_unit: f64,
    pub em: EmConfig,
    pub layer_type: HashMap<ArcStr, LayerType>,
    pub via_id: Vec<ViaIdEntry>,
    pub mos: MosConfig,
}

/// Number of via levels between the contact layers and M3.
pub const NUM_VIA_LEVELS: usize = 3;

impl TechConfig {
    /// Parses and validates a YAML process table.
    pub fn from_yaml(s: &str) -> std::result::Result<Self, ConfigError> {
        let config: TechConfig = serde_yaml::from_str(s)?;
        config.validate()?;
        debug!(
            "loaded {} process table with {} channel lengths",
            config.tech_lib,
            config.mos.lch.len()
        );
        Ok(config)
    }

    /// Reads a YAML process table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|err| LaygenError::from_context(err, ErrorContext::ReadFile(path.into())))?;
        Self::from_yaml(&s)
            .map_err(|err| LaygenError::from_context(err, ErrorContext::ReadFile(path.into())))
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (name, levels) in [("via_g", &self.mos.via_g), ("via_d", &self.mos.via_d)] {
            if levels.len() != NUM_VIA_LEVELS {
                return Err(ConfigError::ViaLevels {
                    name,
                    expected: NUM_VIA_LEVELS,
                    found: levels.len(),
                });
            }
        }
        if self.mos.lch.is_empty() {
            return Err(ConfigError::NoChannelLengths);
        }
        self.em.idc_scale.to_lut("em.idc_scale")?;
        self.em.res_idc_scale.to_lut("em.res_idc_scale")?;
        Ok(())
    }

    pub(crate) fn idc_scale_lut(&self) -> std::result::Result<FloatLut1, ConfigError> {
        self.em.idc_scale.to_lut("em.idc_scale")
    }

    pub(crate) fn res_idc_scale_lut(&self) -> std::result::Result<FloatLut1, ConfigError> {
        self.em.res_idc_scale.to_lut("em.res_idc_scale")
    }

    #[inline]
    pub fn mos_rules(&self) -> &MosRules {
        &self.mos.rules
    }

    #[inline]
    pub fn edge_rules(&self) -> &EdgeRules {
        &self.mos.edge
    }

    pub fn lch_rules(&self, lch_unit: i64) -> Result<LchRules> {
        self.mos
            .lch
            .iter()
            .find(|r| r.lch_unit == lch_unit)
            .copied()
            .ok_or_else(|| MosError::UnsupportedLch(lch_unit).into())
    }

    /// The gate via stack, from LiPo up to M3.
    pub fn via_g(&self) -> &[ViaLevel] {
        &self.mos.via_g
    }

    /// The drain/source via stack, from LiAct up to M3.
    pub fn via_d(&self) -> &[ViaLevel] {
        &self.mos.via_d
    }

    pub fn layer_type(&self, layer: &str) -> Result<LayerType> {
        self.layer_type
            .get(layer)
            .copied()
            .ok_or_else(|| MosError::UnknownLayer(ArcStr::from(layer)).into())
    }

    /// Looks up the via identity connecting `bot` to `top`.
    pub fn via_id(&self, bot: &LayerSpec, top: &LayerSpec) -> Result<&ArcStr> {
        self.via_id
            .iter()
            .find(|e| &e.bot == bot && &e.top == top)
            .map(|e| &e.id)
            .ok_or_else(|| {
                MosError::UnknownVia {
                    bot: ArcStr::from(bot.to_string()),
                    top: ArcStr::from(top.to_string()),
                }
                .into()
            })
    }

    /// Fin, implant and threshold layers of a device flavor.
    pub fn mos_layers(&self, mos_type: MosType, threshold: &str) -> Result<Vec<LayerSpec>> {
        let layers = &self.mos.layers;
        let thres = layers
            .threshold
            .get(threshold)
            .ok_or_else(|| MosError::UnknownThreshold(ArcStr::from(threshold)))?;
        let mut out = vec![layers.fin_area.clone()];
        out.extend(layers.implant.get(&mos_type).into_iter().flatten().cloned());
        out.extend(thres.iter().cloned());
        Ok(out)
    }
}
