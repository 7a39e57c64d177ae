//! Electromigration limits and metal spacing rules.

use arcstr::ArcStr;
use laygen::canvas::Canvas;
use laygen::error::{ErrorSource, Result};
use laygen::layers::LayerSpec;
use laygen::mos::error::MosError;
use laygen::tech::{Direction, EmSpecs, TechInfo, ViaEmQuery, WireEmQuery};
use laygeom::{ceil_div, Rect};
use laylut::FloatLut1;
use log::trace;

use crate::config::LayerType;
use crate::constants::{MX_AREA_MIN, MX_SPY_MIN};
use crate::CdsFfMpt;

/// Via identities whose current limit depends on the cut shape.
const SHAPED_VIAS: [&str; 5] = ["M1_LiPo", "M1_LiAct", "M2_M1", "M3_M2", "M4_M3"];

fn scale_at(lut: &FloatLut1, temp: f64) -> Result<f64> {
    lut.get_clamped(&temp)
        .copied()
        .ok_or_else(|| ErrorSource::Internal("empty temperature scale table".to_string()).into())
}

impl CdsFfMpt {
    pub fn layer_type(&self, layer: &str) -> Result<LayerType> {
        self.config.layer_type(layer)
    }

    fn dc_temp(&self, dc_temp: Option<f64>) -> f64 {
        dc_temp.unwrap_or(self.config.em.dc_temp)
    }

    fn rms_dt(&self, rms_dt: Option<f64>) -> f64 {
        rms_dt.unwrap_or(self.config.em.rms_dt)
    }

    /// DC current derating of a metal of the given dimensions. Flat in this process.
    fn metal_idc_factor(&self, _layer: &LayerSpec, _w: Option<f64>, _l: Option<f64>) -> f64 {
        1.0
    }

    fn metal_idc(&self, layer: &LayerSpec, query: &WireEmQuery) -> Result<f64> {
        if query.vertical {
            return Err(MosError::VerticalDcCurrent.into());
        }
        let (inorm, woff) = (1.0, 0.0);
        let idc = inorm * self.metal_idc_factor(layer, Some(query.w), query.length) * (query.w - woff);
        let scale = scale_at(&self.idc_scale, self.dc_temp(query.dc_temp))?;
        Ok(scale * idc * 1e-3)
    }

    fn metal_irms(&self, query: &WireEmQuery) -> f64 {
        let b = 0.0443;
        let (k, wo, a) = (6.0, 0.0, 0.2);
        let w = query.w - wo;
        let irms_ma = (k * self.rms_dt(query.rms_dt) * w * w * (w + a) / (w + b)).sqrt();
        irms_ma * 1e-3
    }

    fn via_idc(&self, query: &ViaEmQuery) -> Result<f64> {
        let layer = LayerSpec::new(query.layer.clone(), query.purpose.parse().unwrap_or_default());
        let adj_layer = LayerSpec::new(
            query.adj_layer.clone(),
            query.adj_purpose.parse().unwrap_or_default(),
        );
        let ((bot, bot_dim), (top, top_dim)) = match query.layer_dir {
            Direction::Lower => (
                (layer, (query.m_w, query.m_l)),
                (adj_layer, (query.adj_m_w, query.adj_m_l)),
            ),
            Direction::Upper => (
                (adj_layer, (query.adj_m_w, query.adj_m_l)),
                (layer, (query.m_w, query.m_l)),
            ),
        };
        let factor_of = |lay: &LayerSpec, (w, l): (Option<f64>, Option<f64>)| match w {
            Some(w) if w > 0.0 => self.metal_idc_factor(lay, Some(w), l),
            _ => 1.0,
        };
        let factor = f64::min(factor_of(&bot, bot_dim), factor_of(&top, top_dim));

        let via_id = self.config.via_id(&bot, &top)?;
        let (cut_w, cut_h) = (query.cut_w, query.cut_h);
        let idc = if SHAPED_VIAS.contains(&via_id.as_str()) {
            if cut_w == 32 && cut_h == 32 {
                0.1
            } else if cut_w != cut_h {
                0.2
            } else {
                // large square cuts have prohibitive spacing rules to other vias
                return Err(MosError::UnsupportedViaDims { w: cut_w, h: cut_h }.into());
            }
        } else {
            0.4
        };
        trace!("via {via_id} base idc {idc} mA, factor {factor}");

        let scale = scale_at(&self.idc_scale, self.dc_temp(query.dc_temp))?;
        Ok(factor * scale * idc * 1e-3)
    }

    /// Minimum space in resolution units to a neighbor of a `width` wide wire.
    pub fn min_space(&self, layer_type: LayerType, width: i64, same_color: bool) -> i64 {
        let (w_list, sp_list, sp_default): (&[i64], &[i64], i64) = match layer_type {
            LayerType::OneX if same_color => (&[1499, 749, 99], &[220, 112, 72], 48),
            LayerType::OneX => (&[], &[], 32),
            LayerType::Four => (&[1499, 749, 99], &[220, 112, 72], 48),
            LayerType::TwoX => (&[89, 59], &[100, 80], 68),
        };
        w_list
            .iter()
            .zip(sp_list)
            .find(|(w, _)| width > **w)
            .map(|(_, sp)| *sp)
            .unwrap_or(sp_default)
    }

    /// Minimum line-end space in resolution units. Independent of width in this process.
    pub fn min_line_end_space(&self, layer_type: LayerType, _width: i64) -> i64 {
        match layer_type {
            LayerType::OneX | LayerType::Four => MX_SPY_MIN,
            LayerType::TwoX => 74,
        }
    }

    /// Minimum wire length in resolution units from the minimum area rule.
    pub fn min_length(&self, layer_type: LayerType, width: i64) -> i64 {
        let area_min = match layer_type {
            LayerType::OneX | LayerType::Four => MX_AREA_MIN,
            LayerType::TwoX => 8200,
        };
        ceil_div(area_min, width)
    }
}

impl TechInfo for CdsFfMpt {
    fn resolution(&self) -> f64 {
        self.config.resolution
    }

    fn layout_unit(&self) -> f64 {
        self.config.layout_unit
    }

    fn metal_em_specs(&self, layer: &str, purpose: &str, query: &WireEmQuery) -> Result<EmSpecs> {
        self.layer_type(layer)?;
        let layer = LayerSpec::new(ArcStr::from(layer), purpose.parse().unwrap_or_default());
        let idc = self.metal_idc(&layer, query)?;
        let irms = self.metal_irms(query);
        Ok(EmSpecs::new(idc, irms, f64::INFINITY))
    }

    fn via_em_specs(&self, query: &ViaEmQuery) -> Result<EmSpecs> {
        let idc = self.via_idc(query)?;
        // vias have no AC current limits
        Ok(EmSpecs::new(idc, f64::INFINITY, f64::INFINITY))
    }

    fn res_em_specs(&self, _res_type: &str, query: &WireEmQuery) -> Result<EmSpecs> {
        let w = query.w;
        let idc_scale = scale_at(&self.res_idc_scale, self.dc_temp(query.dc_temp))?;
        let idc = 1.0e-3 * w * idc_scale;
        let irms = 1e-3 * (0.02 * self.rms_dt(query.rms_dt) * w * (w + 0.5)).sqrt();
        let ipeak = 5e-3 * 2.0 * w;
        Ok(EmSpecs::new(idc, irms, ipeak))
    }

    fn add_cell_boundary(&self, _canvas: &mut dyn Canvas, _bbox: Rect) {}

    fn draw_device_blockage(&self, _canvas: &mut dyn Canvas) {}
}
