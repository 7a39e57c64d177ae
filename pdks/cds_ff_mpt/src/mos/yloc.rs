//! Y coordinate solvers for transistor and substrate rows.

use laygen::error::{ErrorSource, Result};
use laygen::layers::LayerSpec;
use laygen::mos::error::MosError;
use laygen::mos::{
    BlkEdgeInfo, BlkType, EdgeInfo, ExtInfo, FillInfo, ImpParams, LayerRect, LayoutInfo,
    Margin, Margins, MosInfo, MosRowSpec, MosYLocInfo, OdKind, OdType, PolyPurpose, RowInfo,
    SubInfo,
};
use laygeom::{lcm, round_down_offset, round_up, round_up_offset, Span};
use log::debug;

use super::ConnKind;
use crate::constants::M2_SPY_DS;
use crate::layers::M1;
use crate::CdsFfMpt;

impl CdsFfMpt {
    /// Solves the Y coordinates of a transistor row.
    ///
    /// The bottom cut poly is centered on y = 0. The gate contact sits above it, and the
    /// OD is placed above the gate M1 at line-end spacing, then snapped so that its fins
    /// land on the fin grid.
    pub(crate) fn get_mos_yloc_info(&self, row: &MosRowSpec) -> Result<MosYLocInfo> {
        if row.w < 1 {
            return Err(MosError::InvalidNumFins(row.w).into());
        }
        self.config.lch_rules(row.lch_unit)?;
        let rules = self.config.mos_rules();
        let fin_p = rules.fin_pitch;

        let [g_m1, g_m2, g_m3] = self.conn_drc_info(ConnKind::Gate)?;
        let [d_m1, d_m2, d_m3] = self.conn_drc_info(ConnKind::DrainSource)?;

        let od_h = rules.od_h(row.w);
        let md_h = rules.md_h(row.w);

        // bottom CPO and gate contact
        let blk_yb = 0;
        let cpo_bot_yt = blk_yb - rules.cpo_h / 2 + rules.cpo_h;
        let mp = Span::with_start_and_length(cpo_bot_yt + rules.mp_cpo_sp, rules.mp_h);
        let g_m1_yt = mp.center() + g_m1.top_ext;

        // OD on the fin grid: even fin counts center between fins, odd ones on a fin
        let od_yc = g_m1_yt + g_m1.sp_le + md_h / 2;
        let od_yc = if row.w % 2 == 0 {
            round_up(od_yc, fin_p)
        } else {
            round_up_offset(od_yc, fin_p, fin_p / 2)
        };
        let od = Span::with_start_and_length(od_yc - od_h / 2, od_h);
        let md = Span::with_start_and_length(od_yc - md_h / 2, md_h);
        let d_m1_y = Span::with_start_and_length(md.start(), d_m1.min_len);

        // gate M1 is pushed down to line-end spacing from the drain M1
        let g_m1_y = Span::with_stop_and_length(d_m1_y.start() - g_m1.sp_le, g_m1.min_len);
        let g_m2_yc = g_m1_y.stop() - g_m1.bot_ext;

        let blk_yt = round_up(od.stop() + rules.cpo_od_sp + rules.cpo_h / 2, fin_p);

        let g_m2_y = Span::with_stop_and_length(g_m2_yc + g_m2.w / 2, g_m2.w);
        let g_m3_y = Span::with_stop_and_length(g_m2_yc + g_m3.top_ext, g_m3.min_len);

        let s_m2_yc = d_m1_y.start() + d_m1.bot_ext;
        let s_m2_y = Span::with_start_and_length(s_m2_yc - d_m2.w / 2, d_m2.w);
        let s_m3_y = Span::with_start_and_length(s_m2_yc - d_m3.min_len / 2, d_m3.min_len);

        let d_m2_y = Span::with_start_and_length(s_m2_y.stop() + M2_SPY_DS, d_m2.w);
        let d_m3_y = Span::with_start_and_length(d_m2_y.center() - d_m3.min_len / 2, d_m3.min_len);

        debug!(
            "mos yloc lch={} w={}: blk=({}, {}) od=({}, {}) g_m1=({}, {})",
            row.lch_unit,
            row.w,
            blk_yb,
            blk_yt,
            od.start(),
            od.stop(),
            g_m1_y.start(),
            g_m1_y.stop()
        );

        Ok(MosYLocInfo {
            blk: Span::new_unchecked(blk_yb, blk_yt),
            od,
            md,
            top_margins: Margins {
                od: Margin::new(blk_yt - od.stop(), rules.od_spy),
                md: Margin::new(blk_yt - md.stop(), rules.md_spy),
                m1: Margin::new(blk_yt - d_m1_y.stop(), g_m1.sp_le),
                m3: Margin::new(blk_yt - d_m3_y.stop(), d_m3.sp_le),
            },
            bot_margins: Margins {
                od: Margin::new(od.start() - blk_yb, rules.od_spy),
                md: Margin::new(md.start() - blk_yb, rules.md_spy),
                m1: Margin::new(g_m1_y.start() - blk_yb, g_m1.sp_le),
                m3: Margin::new(g_m3_y.start() - blk_yb, d_m3.sp_le),
            },
            g_y_list: [mp, g_m1_y, g_m2_y, g_m3_y],
            d_y_list: [md, d_m1_y, d_m2_y, d_m3_y],
            s_y_list: [md, d_m1_y, s_m2_y, s_m3_y],
        })
    }

    /// Builds the layout description of a transistor row.
    pub(crate) fn get_mos_info(&self, row: &MosRowSpec) -> Result<MosInfo> {
        let yloc = self.get_mos_yloc_info(row)?;
        let sd_pitch = self.config.lch_rules(row.lch_unit)?.sd_pitch;
        let rules = self.config.mos_rules();
        let blk = yloc.blk;

        let lay_info_list = self
            .config
            .mos_layers(row.mos_type, &row.threshold)?
            .into_iter()
            .map(|lay| LayerRect::new(lay, 0, blk))
            .collect();
        let row_info = RowInfo {
            od_x_list: vec![(0, row.fg)],
            od_y: yloc.od,
            od_type: OdType::new(OdKind::Mos, row.mos_type),
            po_y: blk,
            md_y: yloc.md,
        };
        let layout_info = LayoutInfo {
            blk_type: BlkType::Mos,
            lch_unit: row.lch_unit,
            md_w: rules.md_w,
            fg: row.fg,
            sd_pitch,
            array_box_xl: 0,
            array_box_y: blk,
            draw_od: true,
            row_info_list: vec![row_info],
            lay_info_list,
            adj_info_list: Vec::new(),
            left_blk_info: None,
            right_blk_info: None,
            fill_info_list: Vec::new(),
            imp_params: Some(vec![ImpParams {
                mos_type: row.mos_type,
                threshold: row.threshold.clone(),
                imp_y: blk,
                thres_y: blk,
            }]),
        };

        let edge = EdgeInfo::new(Some(OdKind::Mos));
        let ext_info = |margins: &Margins| ExtInfo {
            mx_margin: margins.m3.avail,
            od_margin: margins.od.avail,
            md_margin: margins.md.avail,
            m1_margin: margins.m1.avail,
            imp_min_w: 0,
            mtype: (row.mos_type, row.mos_type),
            threshold: row.threshold.clone(),
            po_types: vec![PolyPurpose::Drawing; row.fg.max(0) as usize],
            edgel_info: edge,
            edger_info: edge,
        };
        let ext_top_info = ext_info(&yloc.top_margins);
        let ext_bot_info = ext_info(&yloc.bot_margins);
        let blk_edge = BlkEdgeInfo {
            edge,
            adj: Vec::new(),
        };

        Ok(MosInfo {
            gate_yc: yloc.g_y_list[0].center(),
            sd_yc: yloc.od.center(),
            g_conn_y: yloc.g_y_list[3],
            d_conn_y: yloc.d_y_list[3],
            layout_info,
            yloc,
            ext_top_info,
            ext_bot_info,
            left_edge_info: blk_edge.clone(),
            right_edge_info: blk_edge,
        })
    }

    /// Solves a substrate row.
    ///
    /// The OD is placed from the bottom cut poly and gate contact spacing, the block height
    /// is made symmetric around the OD and rounded up to the block pitch, and the OD is then
    /// recentered on the fin grid. Gate contacts straddle the OD above and below the MD.
    pub(crate) fn get_sub_yloc_info(&self, row: &MosRowSpec, blk_pitch: i64) -> Result<SubInfo> {
        if !row.mos_type.is_substrate() {
            return Err(ErrorSource::InvalidArgs(format!(
                "{} is not a substrate type",
                row.mos_type
            ))
            .into());
        }
        if row.w < 1 {
            return Err(MosError::InvalidNumFins(row.w).into());
        }
        let sd_pitch = self.config.lch_rules(row.lch_unit)?.sd_pitch;
        let rules = self.config.mos_rules();
        let fin_p = rules.fin_pitch;
        let fin_p2 = fin_p / 2;
        let fin_h2 = rules.fin_h / 2;

        let od_h = rules.od_h(row.w);
        let md_h = rules.md_h(row.w);
        let md_od_exty = (md_h - od_h) / 2;

        // provisional OD above the bottom CPO and gate contact
        let cpo_bot_yt = rules.cpo_h / 2;
        let mp_yb = std::cmp::max(rules.mp_spy / 2, cpo_bot_yt + rules.mp_cpo_sp);
        let mp_yt = mp_yb + rules.mp_h;
        let od_bfin_yc = round_up_offset(mp_yt + rules.mp_md_sp + md_od_exty, fin_p, fin_p2);
        let od_yb = od_bfin_yc - fin_h2;
        let od_yt = od_yb + od_h;

        // symmetric block height on the block pitch, then recenter OD
        let blk_pitch = lcm([blk_pitch, fin_p]);
        let blk_h = round_up(od_yt + od_yb, blk_pitch);
        let od_yb = round_down_offset(blk_h / 2 - od_h / 2, fin_p, fin_p2 - fin_h2);
        let od = Span::with_start_and_length(od_yb, od_h);
        let md = Span::with_start_and_length((od.start() + od.stop() - md_h) / 2, md_h);

        let [v0, ..] = self.ds_via_info(row.w, false)?.levels;
        let gm1_delta = v0.h / 2 + v0.top_ency;
        let mp_bot = Span::with_stop_and_length(md.start() - rules.mp_md_sp, rules.mp_h);
        let mp_top = Span::with_start_and_length(md.stop() + rules.mp_md_sp, rules.mp_h);
        let ds_conn_y = Span::new_unchecked(mp_bot.center() - gm1_delta, mp_top.center() + gm1_delta);

        let po_y = Span::new_unchecked(0, blk_h);

        debug!(
            "sub yloc lch={} w={} pitch={}: blk_h={} od=({}, {})",
            row.lch_unit,
            row.w,
            blk_pitch,
            blk_h,
            od.start(),
            od.stop()
        );

        let lay_info_list = self
            .config
            .mos_layers(row.mos_type, &row.threshold)?
            .into_iter()
            .map(|lay| LayerRect::new(lay, 0, po_y))
            .collect();
        let lr_edge_info = EdgeInfo::new(Some(OdKind::Sub));
        let fill_info = FillInfo {
            layer: LayerSpec::drawing(M1),
            exc_layer: None,
            x_intv_list: Vec::new(),
            y_intv_list: vec![ds_conn_y],
        };

        let layout_info = LayoutInfo {
            blk_type: BlkType::Sub,
            lch_unit: row.lch_unit,
            md_w: rules.md_w,
            fg: row.fg,
            sd_pitch,
            array_box_xl: 0,
            array_box_y: po_y,
            draw_od: true,
            row_info_list: vec![RowInfo {
                od_x_list: vec![(0, row.fg)],
                od_y: od,
                od_type: OdType::new(OdKind::Sub, row.mos_type),
                po_y,
                md_y: md,
            }],
            lay_info_list,
            adj_info_list: Vec::new(),
            left_blk_info: None,
            right_blk_info: None,
            fill_info_list: vec![fill_info],
            imp_params: None,
        };

        let po_types = vec![PolyPurpose::Drawing; row.fg.max(0) as usize];
        let ext_info = |mx_margin, od_margin, md_margin| ExtInfo {
            mx_margin,
            od_margin,
            md_margin,
            m1_margin: mx_margin,
            imp_min_w: 0,
            mtype: (row.mos_type, row.mos_type),
            threshold: row.threshold.clone(),
            po_types: po_types.clone(),
            edgel_info: lr_edge_info,
            edger_info: lr_edge_info,
        };
        let ext_top_info = ext_info(
            po_y.stop() - ds_conn_y.stop(),
            po_y.stop() - od.stop(),
            po_y.stop() - md.stop(),
        );
        let ext_bot_info = ext_info(
            ds_conn_y.start() - po_y.start(),
            od.start() - po_y.start(),
            md.start() - po_y.start(),
        );
        let blk_edge = BlkEdgeInfo {
            edge: lr_edge_info,
            adj: Vec::new(),
        };

        Ok(SubInfo {
            layout_info,
            sd_yc: od.center(),
            ext_top_info,
            ext_bot_info,
            left_edge_info: blk_edge.clone(),
            right_edge_info: blk_edge,
            blk_height: po_y.stop(),
            gb_conn_y: ds_conn_y,
            ds_conn_y,
        })
    }
}
