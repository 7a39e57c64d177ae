//! Transistor-row layout for cds_ff_mpt.
//!
//! Solvers live in [`yloc`] (transistor and substrate rows), [`end`] (array ends) and
//! [`edge`] (edge and guard ring blocks). [`draw`] turns a [`LayoutInfo`] into geometry,
//! and the connection routines in [`conn`] wire up a solved row using the via stacks in
//! [`via`].

use laygen::canvas::Canvas;
use laygen::error::{ErrorSource, Result};
use laygen::mos::{
    BlkEdgeInfo, EdgeGeometry, EdgeMode, EndInfo, LayoutInfo, MosConnParams, MosInfo,
    MosRowSpec, MosTech, MosType, MosYLocInfo, SubInfo,
};
use laygeom::{round_up, HalfInt};
use serde::{Deserialize, Serialize};

use crate::config::{ViaLevel, NUM_VIA_LEVELS};
use crate::constants::{mx_min_len, MX_SPY_MIN, V0_SP};
use crate::CdsFfMpt;

pub mod conn;
pub mod draw;
pub mod edge;
pub mod end;
pub mod via;
pub mod yloc;

/// Which via stack a connection uses.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnKind {
    /// Gate: LiPo up to M3.
    Gate,
    /// Drain/source: LiAct up to M3.
    DrainSource,
}

/// A via stack from the contact layer up to M3, sized for one transistor width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaInfo {
    /// VIA0, VIA1 and VIA2, in that order.
    pub levels: [ViaLevel; NUM_VIA_LEVELS],
    /// Number of VIA0 rows.
    pub num_v0: i64,
    pub m1_h: i64,
    pub m2_h: i64,
    pub m3_h: i64,
}

/// Design rules of the metal wire on one level of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnDrcInfo {
    pub w: i64,
    pub min_len: i64,
    /// Line-end spacing.
    pub sp_le: i64,
    /// Distance from the center of the via below this wire to the wire end.
    pub top_ext: i64,
    /// Distance from the center of the via above this wire to the wire end.
    pub bot_ext: i64,
}

fn via_levels(levels: &[ViaLevel]) -> Result<[ViaLevel; NUM_VIA_LEVELS]> {
    levels.try_into().map_err(|_| {
        ErrorSource::Internal(format!(
            "expected {NUM_VIA_LEVELS} via levels, found {}",
            levels.len()
        ))
        .into()
    })
}

impl CdsFfMpt {
    fn via_stack(&self, kind: ConnKind) -> Result<[ViaLevel; NUM_VIA_LEVELS]> {
        match kind {
            ConnKind::Gate => via_levels(self.config.via_g()),
            ConnKind::DrainSource => via_levels(self.config.via_d()),
        }
    }

    /// Wire rules on M1, M2 and M3 of a gate or drain/source connection.
    pub fn conn_drc_info(&self, kind: ConnKind) -> Result<[ConnDrcInfo; 3]> {
        let [v0, v1, v2] = self.via_stack(kind)?;
        let conn_w = self.config.mos_rules().mos_conn_w;
        let m2_w = v1.h + 2 * v1.top_ency;
        Ok([
            ConnDrcInfo {
                w: conn_w,
                min_len: mx_min_len(conn_w),
                sp_le: MX_SPY_MIN,
                top_ext: v0.h / 2 + v0.top_ency,
                bot_ext: v1.h / 2 + v1.bot_ency,
            },
            ConnDrcInfo {
                w: m2_w,
                min_len: mx_min_len(m2_w),
                sp_le: MX_SPY_MIN,
                top_ext: v1.w / 2 + v1.top_encx,
                bot_ext: v2.w / 2 + v2.bot_encx,
            },
            ConnDrcInfo {
                w: conn_w,
                min_len: mx_min_len(conn_w),
                sp_le: MX_SPY_MIN,
                top_ext: v2.h / 2 + v2.top_ency,
                bot_ext: v2.h / 2 + v2.top_ency,
            },
        ])
    }

    /// The gate via stack. Gates always use a single VIA0.
    pub fn gate_via_info(&self) -> Result<ViaInfo> {
        let levels = self.via_stack(ConnKind::Gate)?;
        let [v0, v1, v2] = levels;
        Ok(ViaInfo {
            levels,
            num_v0: 1,
            m1_h: mx_min_len(v0.w + 2 * v0.top_encx),
            m2_h: v1.h + 2 * v1.top_ency,
            m3_h: mx_min_len(v2.w + 2 * v2.top_encx),
        })
    }

    /// The drain/source via stack of a `w` fin transistor.
    ///
    /// VIA0 rows fill the MD height. A `compact` stack sizes M1 to just cover the VIA0
    /// array instead of meeting the minimum length rule.
    pub fn ds_via_info(&self, w: i64, compact: bool) -> Result<ViaInfo> {
        let levels = self.via_stack(ConnKind::DrainSource)?;
        let [v0, v1, v2] = levels;
        let md_h = self.config.mos_rules().md_h(w);
        let num_v0 = std::cmp::max(1, (md_h - 2 * v0.bot_ency + V0_SP) / (v0.h + V0_SP));
        let arr_h = num_v0 * v0.h + (num_v0 - 1) * V0_SP;
        let m1_h = if compact {
            arr_h + 2 * v0.top_ency
        } else {
            std::cmp::max(
                mx_min_len(v0.w + 2 * v0.top_encx),
                round_up(arr_h + 2 * v0.top_ency, 2),
            )
        };
        Ok(ViaInfo {
            levels,
            num_v0,
            m1_h,
            m2_h: v1.h + 2 * v1.top_ency,
            m3_h: mx_min_len(v2.w + 2 * v2.top_encx),
        })
    }
}

impl MosTech for CdsFfMpt {
    fn mos_yloc_info(&self, row: &MosRowSpec) -> Result<MosYLocInfo> {
        self.get_mos_yloc_info(row)
    }

    fn mos_info(&self, row: &MosRowSpec) -> Result<MosInfo> {
        self.get_mos_info(row)
    }

    fn sub_yloc_info(&self, row: &MosRowSpec, blk_pitch: i64) -> Result<SubInfo> {
        self.get_sub_yloc_info(row, blk_pitch)
    }

    fn analog_end_info(
        &self,
        lch_unit: i64,
        sub_type: MosType,
        threshold: &str,
        fg: i64,
        is_end: bool,
        blk_pitch: i64,
    ) -> Result<EndInfo> {
        self.get_analog_end_info(lch_unit, sub_type, threshold, fg, is_end, blk_pitch)
    }

    fn edge_info(&self, lch_unit: i64, guard_ring_nf: i64, is_end: bool) -> Result<EdgeGeometry> {
        self.get_edge_info(lch_unit, guard_ring_nf, is_end)
    }

    fn outer_edge_info(
        &self,
        guard_ring_nf: i64,
        layout_info: &LayoutInfo,
        is_end: bool,
        adj_blk_info: Option<&BlkEdgeInfo>,
    ) -> Result<LayoutInfo> {
        self.get_outer_edge_info(guard_ring_nf, layout_info, is_end, adj_blk_info)
    }

    fn gr_sub_info(&self, guard_ring_nf: i64, layout_info: &LayoutInfo) -> Result<LayoutInfo> {
        self.get_gr_sub_info(guard_ring_nf, layout_info)
    }

    fn gr_sep_info(
        &self,
        layout_info: &LayoutInfo,
        adj_blk_info: &BlkEdgeInfo,
    ) -> Result<LayoutInfo> {
        self.get_gr_sep_info(layout_info, adj_blk_info)
    }

    fn draw_mos(&self, canvas: &mut dyn Canvas, layout_info: &LayoutInfo) -> Result<()> {
        self.draw_mos_layout(canvas, layout_info)
    }

    fn draw_substrate_connection(
        &self,
        canvas: &mut dyn Canvas,
        layout_info: &LayoutInfo,
        port_tracks: &[HalfInt],
        dummy_only: bool,
        is_guardring: bool,
    ) -> Result<bool> {
        self.draw_sub_conn(canvas, layout_info, port_tracks, dummy_only, is_guardring)
    }

    fn draw_mos_connection(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        params: &MosConnParams,
    ) -> Result<()> {
        self.draw_mos_conn(canvas, mos_info, params)
    }

    fn draw_dum_connection(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        edge_mode: EdgeMode,
    ) -> Result<()> {
        self.draw_dum_conn(canvas, mos_info, edge_mode)
    }
}
