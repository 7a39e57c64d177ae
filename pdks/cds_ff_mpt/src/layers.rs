//! Layer names of the cds_ff_mpt process.

use laygen::grid::LayerId;
use laygen::layers::{LayerPurpose, LayerSpec};
use laygen::mos::{OdKind, PolyPurpose};

pub const ACTIVE: &str = "Active";
pub const POLY: &str = "Poly";
/// Source/drain contact (MD).
pub const LI_ACT: &str = "LiAct";
/// Gate contact (MP).
pub const LI_PO: &str = "LiPo";
pub const CUT_POLY: &str = "CutPoly";
pub const FIN_AREA: &str = "FinArea";
pub const M1: &str = "M1";
pub const M2: &str = "M2";

pub const VIA_M1_LIPO: &str = "M1_LiPo";
pub const VIA_M1_LIACT: &str = "M1_LiAct";
pub const VIA_M2_M1: &str = "M2_M1";
pub const VIA_M3_M2: &str = "M3_M2";

pub const M1_ID: LayerId = 1;
pub const M2_ID: LayerId = 2;
pub const M3_ID: LayerId = 3;

/// The OD layer for the given OD kind.
pub fn od_layer(kind: Option<OdKind>) -> LayerSpec {
    match kind {
        Some(OdKind::Mos | OdKind::Sub) => LayerSpec::drawing(ACTIVE),
        _ => LayerSpec::dummy(ACTIVE),
    }
}

pub fn po_layer(purpose: PolyPurpose) -> LayerSpec {
    LayerSpec::new(POLY, purpose.layer_purpose())
}

#[inline]
pub fn is_cut_poly(layer: &LayerSpec) -> bool {
    layer.name() == CUT_POLY
}

#[inline]
pub fn is_fin_area(layer: &LayerSpec) -> bool {
    layer.name() == FIN_AREA
}

pub fn cut_poly() -> LayerSpec {
    LayerSpec::new(CUT_POLY, LayerPurpose::Drawing)
}
