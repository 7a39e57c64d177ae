//! Parameters of transistor connection routines.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Direction an M3 wire extends from its via.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnDir {
    /// The wire ends just above the via and extends downward.
    #[default]
    Down,
    /// The wire is centered on the via.
    Center,
    /// The wire starts just below the via and extends upward.
    Up,
}

impl ConnDir {
    /// Decodes the integer encoding `0 = down, 1 = center, 2 = up`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Down),
            1 => Some(Self::Center),
            2 => Some(Self::Up),
            _ => None,
        }
    }
}

/// Vertical placement of the M2 bar inside the M1 wire.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum M2Loc {
    Bottom,
    Center,
    Top,
}

impl M2Loc {
    pub fn opposite(&self) -> Self {
        match self {
            Self::Bottom => Self::Top,
            Self::Center => Self::Center,
            Self::Top => Self::Bottom,
        }
    }
}

/// Which side of the transistor the gate M3 wires share columns with.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateLoc {
    Source,
    #[default]
    Drain,
}

/// Left/right flags, encoded as bit 0 (left) and bit 1 (right).
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMode {
    pub left: bool,
    pub right: bool,
}

impl EdgeMode {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & 1 == 1,
            right: (bits >> 1) & 1 == 1,
        }
    }

    pub fn both() -> Self {
        Self {
            left: true,
            right: true,
        }
    }
}

/// Options of [`MosTech::draw_mos_connection`](crate::mos::MosTech::draw_mos_connection).
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(default)]
pub struct MosConnParams {
    pub sdir: ConnDir,
    pub ddir: ConnDir,
    pub gate_pref_loc: GateLoc,
    /// Extends the gate M2 bar to the left and/or right block edge.
    pub gate_ext_mode: EdgeMode,
    /// Not supported by every technology; ignored when unsupported.
    pub min_ds_cap: bool,
    pub is_diff: bool,
    pub diode_conn: bool,
    /// Number of series fingers per source/drain segment.
    pub stack: i64,
}

impl Default for MosConnParams {
    fn default() -> Self {
        Self {
            sdir: ConnDir::Down,
            ddir: ConnDir::Up,
            gate_pref_loc: GateLoc::Drain,
            gate_ext_mode: EdgeMode::default(),
            min_ds_cap: false,
            is_diff: false,
            diode_conn: false,
            stack: 1,
        }
    }
}

impl MosConnParams {
    pub fn builder() -> MosConnParamsBuilder {
        MosConnParamsBuilder::default()
    }
}
