//! Array end rows.

use laygen::error::Result;
use laygen::mos::{
    AdjRowInfo, BlkEdgeInfo, BlkType, EdgeInfo, EndInfo, LayerRect, LayoutInfo, MosType, OdKind,
    PolyPurpose,
};
use laygeom::{lcm, Span};
use log::debug;

use crate::layers::{cut_poly, is_fin_area};
use crate::CdsFfMpt;

impl CdsFfMpt {
    /// Solves the row that terminates a transistor array at the top or bottom.
    ///
    /// Between two arrays (`is_end == false`) only the shared cut poly is drawn. At the
    /// true end of an array, the block is shifted up by whole block pitches until every
    /// layer is above y = 0; poly from the adjacent row is extended to satisfy the cut
    /// poly enclosure, and implants cover the extension.
    pub(crate) fn get_analog_end_info(
        &self,
        lch_unit: i64,
        sub_type: MosType,
        threshold: &str,
        fg: i64,
        is_end: bool,
        blk_pitch: i64,
    ) -> Result<EndInfo> {
        let rules = self.config.mos_rules();
        let sd_pitch = self.config.lch_rules(lch_unit)?.sd_pitch;
        let fin_p = rules.fin_pitch;
        let fin_p2 = fin_p / 2;
        let fin_h2 = rules.fin_h / 2;
        let cpo_h = rules.cpo_h;

        let lr_edge_info = EdgeInfo::new(Some(OdKind::Sub));
        let (arr_yt, lay_info_list, adj_info_list, adj_edge_infos) = if is_end {
            let blk_pitch = lcm([blk_pitch, fin_p]);
            let mut arr_yt = 0;
            let mut cpo_bot_yt = arr_yt + cpo_h / 2;
            let mut cpo_bot_yb = cpo_bot_yt - cpo_h;
            let mut finbound_yb = arr_yt - fin_p2 - fin_h2;
            let min_yb = std::cmp::min(finbound_yb, cpo_bot_yb);
            if min_yb < 0 {
                let yshift = -min_yb.div_euclid(blk_pitch) * blk_pitch;
                arr_yt += yshift;
                cpo_bot_yt += yshift;
                cpo_bot_yb += yshift;
                finbound_yb += yshift;
            }
            let finbound_yt = arr_yt + fin_p2 + fin_h2;
            let cpo_bot_yc = (cpo_bot_yb + cpo_bot_yt).div_euclid(2);

            let po_y = Span::new_unchecked(cpo_bot_yt - rules.cpo_po_ency, arr_yt);
            let (adj_info_list, adj_edge_infos) = if po_y.is_physical() {
                (
                    vec![AdjRowInfo {
                        po_y,
                        po_types: vec![PolyPurpose::Drawing; fg.max(0) as usize],
                    }],
                    vec![lr_edge_info],
                )
            } else {
                (Vec::new(), Vec::new())
            };

            let mut lay_info_list = vec![LayerRect::new(
                cut_poly(),
                0,
                Span::new_unchecked(cpo_bot_yb, cpo_bot_yt),
            )];
            for lay in self.config.mos_layers(sub_type, threshold)? {
                let y = if is_fin_area(&lay) {
                    Span::new_unchecked(finbound_yb, finbound_yt)
                } else {
                    Span::new_unchecked(std::cmp::min(po_y.start(), cpo_bot_yc), arr_yt)
                };
                if y.is_physical() {
                    lay_info_list.push(LayerRect::new(lay, 0, y));
                }
            }
            debug!("end row lch={lch_unit} pitch={blk_pitch}: array top at {arr_yt}");
            (arr_yt, lay_info_list, adj_info_list, adj_edge_infos)
        } else {
            let cpo_y = Span::new_unchecked((-cpo_h).div_euclid(2), cpo_h / 2);
            (
                0,
                vec![LayerRect::new(cut_poly(), 0, cpo_y)],
                Vec::new(),
                Vec::new(),
            )
        };

        let layout_info = LayoutInfo {
            blk_type: BlkType::End,
            lch_unit,
            md_w: rules.md_w,
            fg,
            sd_pitch,
            array_box_xl: 0,
            array_box_y: Span::new_unchecked(0, arr_yt),
            draw_od: true,
            row_info_list: Vec::new(),
            lay_info_list,
            adj_info_list,
            left_blk_info: None,
            right_blk_info: None,
            fill_info_list: Vec::new(),
            imp_params: None,
        };
        let blk_edge = BlkEdgeInfo {
            edge: lr_edge_info,
            adj: adj_edge_infos,
        };
        Ok(EndInfo {
            layout_info,
            left_edge_info: blk_edge.clone(),
            right_edge_info: blk_edge,
        })
    }
}
