//! Transistor-row layout records and the technology interface that produces them.
//!
//! A technology plugin solves Y coordinates for each kind of row block (transistor,
//! substrate, array end, edge, guard ring) and describes the result as a [`LayoutInfo`].
//! The host places blocks side by side and asks the plugin to draw each one with
//! [`MosTech::draw_mos`], then to draw wiring with the connection routines.

use std::fmt::Display;
use std::str::FromStr;

use arcstr::ArcStr;
use laygeom::{HalfInt, Span};
use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::error::{ErrorSource, Result};
use crate::layers::{LayerPurpose, LayerSpec};

pub mod conn;
pub mod error;

pub use conn::{ConnDir, EdgeMode, GateLoc, M2Loc, MosConnParams, MosConnParamsBuilder};

pub use self::error::MosError;

/// Device flavor of a transistor or substrate row.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MosType {
    Nch,
    Pch,
    Ptap,
    Ntap,
}

impl MosType {
    pub fn is_substrate(&self) -> bool {
        matches!(self, Self::Ptap | Self::Ntap)
    }

    /// The substrate tap type sharing this device's well.
    pub fn tap_type(&self) -> MosType {
        match self {
            Self::Nch | Self::Ptap => Self::Ptap,
            Self::Pch | Self::Ntap => Self::Ntap,
        }
    }
}

impl Display for MosType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Nch => "nch",
            Self::Pch => "pch",
            Self::Ptap => "ptap",
            Self::Ntap => "ntap",
        };
        write!(f, "{s}")
    }
}

impl FromStr for MosType {
    type Err = MosError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nch" => Ok(Self::Nch),
            "pch" => Ok(Self::Pch),
            "ptap" => Ok(Self::Ptap),
            "ntap" => Ok(Self::Ntap),
            _ => Err(MosError::UnknownMosType(ArcStr::from(s))),
        }
    }
}

/// What an OD region in a row is used for.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OdKind {
    Mos,
    Sub,
    Dum,
}

impl OdKind {
    /// Returns `true` for active transistor or substrate OD.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Mos | Self::Sub)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdType {
    pub kind: Option<OdKind>,
    pub mos_type: MosType,
}

impl OdType {
    pub fn new(kind: OdKind, mos_type: MosType) -> Self {
        Self {
            kind: Some(kind),
            mos_type,
        }
    }
}

/// Poly layer purpose tag.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolyPurpose {
    Drawing,
    Dummy,
    Edge,
}

impl PolyPurpose {
    pub fn layer_purpose(&self) -> LayerPurpose {
        match self {
            Self::Drawing => LayerPurpose::Drawing,
            Self::Dummy => LayerPurpose::Dummy,
            Self::Edge => LayerPurpose::Edge,
        }
    }
}

/// Chooses the poly purpose of one finger.
///
/// `od_kind` is the OD type the finger sits on, or the type of the neighboring block when
/// the finger is off-OD at the block edge.
pub fn poly_purpose(is_edge: bool, od_kind: Option<OdKind>) -> PolyPurpose {
    match od_kind {
        Some(_) if is_edge => PolyPurpose::Edge,
        Some(kind) if kind.is_active() => PolyPurpose::Drawing,
        _ => PolyPurpose::Dummy,
    }
}

/// One transistor row of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowInfo {
    /// OD intervals in MD column indices.
    pub od_x_list: Vec<(i64, i64)>,
    pub od_y: Span,
    pub od_type: OdType,
    pub po_y: Span,
    pub md_y: Span,
}

impl RowInfo {
    pub fn with_od_x_list(&self, od_x_list: Vec<(i64, i64)>) -> Self {
        Self {
            od_x_list,
            ..self.clone()
        }
    }

    pub fn with_od_type(&self, od_type: OdType) -> Self {
        Self {
            od_type,
            ..self.clone()
        }
    }
}

/// Poly of an adjacent row that extends into this block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjRowInfo {
    pub po_y: Span,
    pub po_types: Vec<PolyPurpose>,
}

impl AdjRowInfo {
    pub fn with_po_types(&self, po_types: Vec<PolyPurpose>) -> Self {
        Self {
            po_types,
            ..self.clone()
        }
    }
}

/// What sits at the left or right boundary of a block.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInfo {
    pub od_type: Option<OdKind>,
}

impl EdgeInfo {
    pub fn new(od_type: Option<OdKind>) -> Self {
        Self { od_type }
    }

    pub fn is_active(&self) -> bool {
        self.od_type.map(|k| k.is_active()).unwrap_or(false)
    }
}

/// A block edge together with the edges of the rows adjacent to it.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlkEdgeInfo {
    pub edge: EdgeInfo,
    pub adj: Vec<EdgeInfo>,
}

/// Metal fill to draw over a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInfo {
    pub layer: LayerSpec,
    pub exc_layer: Option<LayerSpec>,
    pub x_intv_list: Vec<Span>,
    pub y_intv_list: Vec<Span>,
}

impl FillInfo {
    pub fn with_x_intv_list(&self, x_intv_list: Vec<Span>) -> Self {
        Self {
            x_intv_list,
            ..self.clone()
        }
    }
}

/// A layer spanning the block horizontally from `xl` to the block's right edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRect {
    pub layer: LayerSpec,
    pub xl: i64,
    pub y: Span,
}

impl LayerRect {
    pub fn new(layer: LayerSpec, xl: i64, y: Span) -> Self {
        Self { layer, xl, y }
    }
}

/// Implant extents of a row, used to regenerate implants in edge blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpParams {
    pub mos_type: MosType,
    pub threshold: ArcStr,
    pub imp_y: Span,
    pub thres_y: Span,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlkType {
    Mos,
    Sub,
    End,
    Edge,
    GrEdge,
    GrSub,
    GrSep,
}

/// Everything needed to draw one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub blk_type: BlkType,
    pub lch_unit: i64,
    pub md_w: i64,
    pub fg: i64,
    pub sd_pitch: i64,
    pub array_box_xl: i64,
    pub array_box_y: Span,
    pub draw_od: bool,
    pub row_info_list: Vec<RowInfo>,
    pub lay_info_list: Vec<LayerRect>,
    pub adj_info_list: Vec<AdjRowInfo>,
    pub left_blk_info: Option<EdgeInfo>,
    pub right_blk_info: Option<EdgeInfo>,
    pub fill_info_list: Vec<FillInfo>,
    pub imp_params: Option<Vec<ImpParams>>,
}

/// Vertical extension constraints of a block, consumed when stacking rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtInfo {
    pub mx_margin: i64,
    pub od_margin: i64,
    pub md_margin: i64,
    pub m1_margin: i64,
    pub imp_min_w: i64,
    pub mtype: (MosType, MosType),
    pub threshold: ArcStr,
    pub po_types: Vec<PolyPurpose>,
    pub edgel_info: EdgeInfo,
    pub edger_info: EdgeInfo,
}

/// Available distance to the block boundary against the distance a rule requires.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margin {
    pub avail: i64,
    pub required: i64,
}

impl Margin {
    pub fn new(avail: i64, required: i64) -> Self {
        Self { avail, required }
    }

    /// Extra space the host must add for the rule to hold.
    pub fn shortfall(&self) -> i64 {
        (self.required - self.avail).max(0)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub od: Margin,
    pub md: Margin,
    pub m1: Margin,
    pub m3: Margin,
}

/// Y spans of a connection from the contact layer up to M3.
///
/// Index 0 is MP (gate) or MD (source/drain), indices 1 to 3 are M1 to M3.
pub type ConnYStack = [Span; 4];

/// Solved Y coordinates of a transistor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosYLocInfo {
    pub blk: Span,
    pub od: Span,
    pub md: Span,
    pub top_margins: Margins,
    pub bot_margins: Margins,
    pub g_y_list: ConnYStack,
    pub d_y_list: ConnYStack,
    pub s_y_list: ConnYStack,
}

/// Identifies a transistor or substrate row to solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosRowSpec {
    pub lch_unit: i64,
    /// Number of fins.
    pub w: i64,
    pub mos_type: MosType,
    pub threshold: ArcStr,
    pub fg: i64,
}

impl MosRowSpec {
    pub fn new(
        lch_unit: i64,
        w: i64,
        mos_type: MosType,
        threshold: impl Into<ArcStr>,
        fg: i64,
    ) -> Self {
        Self {
            lch_unit,
            w,
            mos_type,
            threshold: threshold.into(),
            fg,
        }
    }
}

/// A solved transistor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosInfo {
    pub layout_info: LayoutInfo,
    pub yloc: MosYLocInfo,
    pub ext_top_info: ExtInfo,
    pub ext_bot_info: ExtInfo,
    pub left_edge_info: BlkEdgeInfo,
    pub right_edge_info: BlkEdgeInfo,
    /// Center of the gate contact.
    pub gate_yc: i64,
    /// Center of the OD.
    pub sd_yc: i64,
    pub g_conn_y: Span,
    pub d_conn_y: Span,
}

/// A solved substrate row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubInfo {
    pub layout_info: LayoutInfo,
    pub sd_yc: i64,
    pub ext_top_info: ExtInfo,
    pub ext_bot_info: ExtInfo,
    pub left_edge_info: BlkEdgeInfo,
    pub right_edge_info: BlkEdgeInfo,
    pub blk_height: i64,
    pub gb_conn_y: Span,
    pub ds_conn_y: Span,
}

/// A solved array-end row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndInfo {
    pub layout_info: LayoutInfo,
    pub left_edge_info: BlkEdgeInfo,
    pub right_edge_info: BlkEdgeInfo,
}

/// Horizontal parameters of an outer edge block.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeGeometry {
    /// Number of dummy fingers in the edge block.
    pub outer_fg: i64,
    /// Left coordinate of cut poly in the edge block.
    pub cpo_xl: i64,
}

/// The row-level layout interface of a FinFET technology.
pub trait MosTech {
    fn mos_yloc_info(&self, row: &MosRowSpec) -> Result<MosYLocInfo>;

    fn mos_info(&self, row: &MosRowSpec) -> Result<MosInfo>;

    fn sub_yloc_info(&self, row: &MosRowSpec, blk_pitch: i64) -> Result<SubInfo>;

    fn analog_end_info(
        &self,
        lch_unit: i64,
        sub_type: MosType,
        threshold: &str,
        fg: i64,
        is_end: bool,
        blk_pitch: i64,
    ) -> Result<EndInfo>;

    fn sub_ring_end_info(
        &self,
        _sub_type: MosType,
        _threshold: &str,
        _fg: i64,
        _end_ext_info: &ExtInfo,
    ) -> Result<EndInfo> {
        Err(ErrorSource::NotImplemented("substrate ring end info").into())
    }

    fn edge_info(&self, lch_unit: i64, guard_ring_nf: i64, is_end: bool) -> Result<EdgeGeometry>;

    fn outer_edge_info(
        &self,
        guard_ring_nf: i64,
        layout_info: &LayoutInfo,
        is_end: bool,
        adj_blk_info: Option<&BlkEdgeInfo>,
    ) -> Result<LayoutInfo>;

    fn gr_sub_info(&self, guard_ring_nf: i64, layout_info: &LayoutInfo) -> Result<LayoutInfo>;

    fn gr_sep_info(&self, layout_info: &LayoutInfo, adj_blk_info: &BlkEdgeInfo)
        -> Result<LayoutInfo>;

    fn draw_mos(&self, canvas: &mut dyn Canvas, layout_info: &LayoutInfo) -> Result<()>;

    /// Draws substrate contacts and exports supply pins. Returns `true` if any row had OD.
    fn draw_substrate_connection(
        &self,
        canvas: &mut dyn Canvas,
        layout_info: &LayoutInfo,
        port_tracks: &[HalfInt],
        dummy_only: bool,
        is_guardring: bool,
    ) -> Result<bool>;

    fn draw_mos_connection(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        params: &MosConnParams,
    ) -> Result<()>;

    fn draw_dum_connection(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        edge_mode: EdgeMode,
    ) -> Result<()>;

    fn draw_decap_connection(
        &self,
        _canvas: &mut dyn Canvas,
        _mos_info: &MosInfo,
        _params: &MosConnParams,
    ) -> Result<()> {
        Err(ErrorSource::NotImplemented("decap connection").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_purpose() {
        use OdKind::*;
        assert_eq!(poly_purpose(false, Some(Mos)), PolyPurpose::Drawing);
        assert_eq!(poly_purpose(false, Some(Sub)), PolyPurpose::Drawing);
        assert_eq!(poly_purpose(false, Some(Dum)), PolyPurpose::Dummy);
        assert_eq!(poly_purpose(false, None), PolyPurpose::Dummy);
        assert_eq!(poly_purpose(true, Some(Mos)), PolyPurpose::Edge);
        assert_eq!(poly_purpose(true, Some(Dum)), PolyPurpose::Edge);
        assert_eq!(poly_purpose(true, None), PolyPurpose::Dummy);
    }

    #[test]
    fn test_tap_type() {
        assert_eq!(MosType::Nch.tap_type(), MosType::Ptap);
        assert_eq!(MosType::Ptap.tap_type(), MosType::Ptap);
        assert_eq!(MosType::Pch.tap_type(), MosType::Ntap);
        assert_eq!(MosType::Ntap.tap_type(), MosType::Ntap);
        assert_eq!("pch".parse::<MosType>().unwrap(), MosType::Pch);
        assert!("foo".parse::<MosType>().is_err());
    }

    #[test]
    fn test_margin_shortfall() {
        assert_eq!(Margin::new(-39, 64).shortfall(), 103);
        assert_eq!(Margin::new(113, 50).shortfall(), 0);
    }

    #[test]
    fn test_row_info_copy_with() {
        let row = RowInfo {
            od_x_list: vec![(0, 4)],
            od_y: Span::new(10, 20),
            od_type: OdType::new(OdKind::Mos, MosType::Nch),
            po_y: Span::new(0, 40),
            md_y: Span::new(5, 25),
        };
        let cleared = row.with_od_x_list(Vec::new());
        assert!(cleared.od_x_list.is_empty());
        assert_eq!(row.od_x_list, vec![(0, 4)]);
        assert_eq!(cleared.od_y, row.od_y);
    }
}
