//! Edge, guard ring and guard ring separator blocks.

use laygen::error::Result;
use laygen::mos::error::MosError;
use laygen::mos::{
    BlkEdgeInfo, BlkType, EdgeGeometry, EdgeInfo, ImpParams, LayerRect, LayoutInfo, OdKind,
    OdType, PolyPurpose,
};
use laygeom::Span;
use log::debug;

use crate::layers::is_cut_poly;
use crate::CdsFfMpt;

/// Poly purposes of a `fg` finger block whose last finger faces an adjacent row.
///
/// The facing finger is drawing poly only when the adjacent row has active OD.
fn facing_po_types(fg: i64, adj_edge: Option<&EdgeInfo>) -> Vec<PolyPurpose> {
    let fg = fg.max(0) as usize;
    let mut po_types = vec![PolyPurpose::Dummy; fg];
    if adj_edge.map(EdgeInfo::is_active).unwrap_or(false) {
        if let Some(last) = po_types.last_mut() {
            *last = PolyPurpose::Drawing;
        }
    }
    po_types
}

impl CdsFfMpt {
    fn check_guard_ring_nf(&self, guard_ring_nf: i64) -> Result<()> {
        let gr_nf_min = self.config.edge_rules().gr_nf_min;
        if guard_ring_nf < gr_nf_min {
            return Err(MosError::GuardRingTooSmall {
                nf: guard_ring_nf,
                min: gr_nf_min,
            }
            .into());
        }
        Ok(())
    }

    /// Cut poly layers of `lay_info_list` starting at `cpo_xl`, followed by substrate
    /// implants regenerated from `imp_params`.
    fn substrate_implants(
        &self,
        lay_info_list: &[LayerRect],
        imp_params: &[ImpParams],
        cpo_xl: i64,
    ) -> Result<Vec<LayerRect>> {
        let mut out: Vec<_> = lay_info_list
            .iter()
            .filter(|l| is_cut_poly(&l.layer))
            .map(|l| LayerRect::new(l.layer.clone(), cpo_xl, l.y))
            .collect();
        for imp in imp_params {
            for lay in self
                .config
                .mos_layers(imp.mos_type.tap_type(), &imp.threshold)?
            {
                out.push(LayerRect::new(lay, 0, imp.imp_y));
            }
        }
        Ok(out)
    }

    pub(crate) fn get_edge_info(
        &self,
        lch_unit: i64,
        guard_ring_nf: i64,
        is_end: bool,
    ) -> Result<EdgeGeometry> {
        let sd_pitch = self.config.lch_rules(lch_unit)?.sd_pitch;
        let edge = self.config.edge_rules();
        if guard_ring_nf > 0 {
            self.check_guard_ring_nf(guard_ring_nf)?;
        }
        let outer_fg = if is_end || guard_ring_nf > 0 {
            edge.outer_fg
        } else {
            0
        };
        let cpo_xl = if outer_fg > 0 {
            sd_pitch / 2 - lch_unit / 2 - edge.cpo_po_extx
        } else {
            0
        };
        Ok(EdgeGeometry { outer_fg, cpo_xl })
    }

    /// Builds the outer edge block of a row from the row's layout description.
    pub(crate) fn get_outer_edge_info(
        &self,
        guard_ring_nf: i64,
        layout_info: &LayoutInfo,
        is_end: bool,
        adj_blk_info: Option<&BlkEdgeInfo>,
    ) -> Result<LayoutInfo> {
        let lch_unit = layout_info.lch_unit;
        let EdgeGeometry { outer_fg, cpo_xl } =
            self.get_edge_info(lch_unit, guard_ring_nf, is_end)?;

        let row_info_list = layout_info
            .row_info_list
            .iter()
            .map(|r| r.with_od_x_list(Vec::new()))
            .collect();

        let lay_info_list = match &layout_info.imp_params {
            Some(imp_params) if guard_ring_nf != 0 => {
                self.substrate_implants(&layout_info.lay_info_list, imp_params, cpo_xl)?
            }
            _ => layout_info
                .lay_info_list
                .iter()
                .map(|l| {
                    let xl = if is_cut_poly(&l.layer) { cpo_xl } else { 0 };
                    LayerRect::new(l.layer.clone(), xl, l.y)
                })
                .collect(),
        };

        let adj_edges: Vec<Option<&EdgeInfo>> = match adj_blk_info {
            Some(blk) => blk.adj.iter().map(Some).collect(),
            None => vec![None; layout_info.adj_info_list.len()],
        };
        let adj_info_list = if outer_fg > 0 {
            adj_edges
                .into_iter()
                .zip(&layout_info.adj_info_list)
                .map(|(edge, adj)| adj.with_po_types(facing_po_types(outer_fg, edge)))
                .collect()
        } else {
            Vec::new()
        };

        let sd_pitch = layout_info.sd_pitch;
        let x_intv_list = if outer_fg > 0 {
            let m1_w = self.config.mos_rules().mos_conn_w;
            vec![Span::new_unchecked(sd_pitch - m1_w / 2, sd_pitch + m1_w / 2)]
        } else {
            Vec::new()
        };
        let fill_info_list = layout_info
            .fill_info_list
            .iter()
            .map(|f| f.with_x_intv_list(x_intv_list.clone()))
            .collect();

        debug!("outer edge gr_nf={guard_ring_nf} is_end={is_end}: fg={outer_fg} cpo_xl={cpo_xl}");

        Ok(LayoutInfo {
            blk_type: if guard_ring_nf == 0 {
                BlkType::Edge
            } else {
                BlkType::GrEdge
            },
            lch_unit,
            md_w: layout_info.md_w,
            fg: outer_fg,
            sd_pitch,
            array_box_xl: 0,
            array_box_y: layout_info.array_box_y,
            draw_od: true,
            row_info_list,
            lay_info_list,
            adj_info_list,
            left_blk_info: Some(EdgeInfo::new(None)),
            right_blk_info: adj_blk_info.map(|b| b.edge),
            fill_info_list,
            imp_params: None,
        })
    }

    /// Builds the substrate contact block of a guard ring.
    pub(crate) fn get_gr_sub_info(
        &self,
        guard_ring_nf: i64,
        layout_info: &LayoutInfo,
    ) -> Result<LayoutInfo> {
        self.check_guard_ring_nf(guard_ring_nf)?;
        let edge = self.config.edge_rules();
        let gr_nf_min = edge.gr_nf_min;
        let margin = edge.gr_sub_fg_margin;
        let fg = gr_nf_min + 2 + 2 * margin;

        let od_x_list = vec![(margin + 1, margin + 1 + gr_nf_min)];
        let row_info_list = layout_info
            .row_info_list
            .iter()
            .map(|r| {
                r.with_od_x_list(od_x_list.clone())
                    .with_od_type(OdType::new(OdKind::Sub, r.od_type.mos_type.tap_type()))
            })
            .collect();

        let lay_info_list = match &layout_info.imp_params {
            None => layout_info.lay_info_list.clone(),
            Some(imp_params) => {
                self.substrate_implants(&layout_info.lay_info_list, imp_params, 0)?
            }
        };

        let margin = margin as usize;
        let po_types: Vec<_> = std::iter::repeat(PolyPurpose::Dummy)
            .take(margin)
            .chain(std::iter::repeat(PolyPurpose::Drawing).take((gr_nf_min + 2) as usize))
            .chain(std::iter::repeat(PolyPurpose::Dummy).take(margin))
            .collect();
        let adj_info_list = layout_info
            .adj_info_list
            .iter()
            .map(|adj| adj.with_po_types(po_types.clone()))
            .collect();

        let fill_info_list = layout_info
            .fill_info_list
            .iter()
            .map(|f| f.with_x_intv_list(Vec::new()))
            .collect();

        Ok(LayoutInfo {
            blk_type: BlkType::GrSub,
            lch_unit: layout_info.lch_unit,
            md_w: layout_info.md_w,
            fg,
            sd_pitch: layout_info.sd_pitch,
            array_box_xl: 0,
            array_box_y: layout_info.array_box_y,
            draw_od: true,
            row_info_list,
            lay_info_list,
            adj_info_list,
            left_blk_info: None,
            right_blk_info: None,
            fill_info_list,
            imp_params: None,
        })
    }

    /// Builds the block separating a guard ring from the array it surrounds.
    pub(crate) fn get_gr_sep_info(
        &self,
        layout_info: &LayoutInfo,
        adj_blk_info: &BlkEdgeInfo,
    ) -> Result<LayoutInfo> {
        let fg = self.config.edge_rules().gr_sep_fg;

        let row_info_list = layout_info
            .row_info_list
            .iter()
            .map(|r| r.with_od_x_list(Vec::new()))
            .collect();

        let adj_info_list = adj_blk_info
            .adj
            .iter()
            .zip(&layout_info.adj_info_list)
            .map(|(edge, adj)| adj.with_po_types(facing_po_types(fg, Some(edge))))
            .collect();

        let m1_w = self.config.mos_rules().mos_conn_w;
        let x_intv_list = vec![Span::new_unchecked((-m1_w).div_euclid(2), m1_w / 2)];
        let fill_info_list = layout_info
            .fill_info_list
            .iter()
            .map(|f| f.with_x_intv_list(x_intv_list.clone()))
            .collect();

        Ok(LayoutInfo {
            blk_type: BlkType::GrSep,
            lch_unit: layout_info.lch_unit,
            md_w: layout_info.md_w,
            fg,
            sd_pitch: layout_info.sd_pitch,
            array_box_xl: 0,
            array_box_y: layout_info.array_box_y,
            draw_od: true,
            row_info_list,
            lay_info_list: layout_info.lay_info_list.clone(),
            adj_info_list,
            left_blk_info: None,
            right_blk_info: Some(adj_blk_info.edge),
            fill_info_list,
            imp_params: None,
        })
    }
}
