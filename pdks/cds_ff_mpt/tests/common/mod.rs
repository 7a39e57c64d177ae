#![allow(dead_code)]

use cds_ff_mpt::{CdsFfMpt, DEFAULT_TECH_PARAMS};
use laygen::canvas::LayoutCell;
use laygen::mos::{MosInfo, MosRowSpec, MosTech, MosType};

pub const LCH_LIST: [i64; 2] = [18, 20];

pub fn setup_tech() -> CdsFfMpt {
    CdsFfMpt::from_yaml(DEFAULT_TECH_PARAMS).expect("failed to parse built-in process parameters")
}

pub fn new_cell(tech: &CdsFfMpt, lch_unit: i64) -> LayoutCell {
    LayoutCell::new(tech.routing_grid(lch_unit).expect("unsupported channel length"))
}

pub fn mos_row(tech: &CdsFfMpt, mos_type: MosType, w: i64, fg: i64) -> MosInfo {
    tech.mos_info(&MosRowSpec::new(18, w, mos_type, "standard", fg))
        .expect("failed to solve transistor row")
}

/// Panics if any rectangle drawn in `cell` has no area.
pub fn assert_no_degenerate_rects(cell: &LayoutCell) {
    for (layer, rect) in cell.rects.iter() {
        assert!(rect.is_physical(), "degenerate {layer} rectangle {rect:?}");
    }
}
