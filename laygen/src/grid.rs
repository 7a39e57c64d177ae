//! A minimal routing grid: one set of uniformly spaced tracks per routing layer.

use std::collections::HashMap;

use laygeom::{Dir, HalfInt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Routing layer index (1 = M1, 2 = M2, ...).
pub type LayerId = u32;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GridError {
    #[error("layer {0} is not a routing layer")]
    UnknownLayer(LayerId),
    #[error("coordinate {coord} is not on a half-track of layer {layer}")]
    OffGrid { layer: LayerId, coord: i64 },
}

/// Track parameters of a single routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSpec {
    pub dir: Dir,
    pub pitch: i64,
    pub width: i64,
    /// Center of track 0. Defaults to half a pitch.
    #[serde(default)]
    pub offset: Option<i64>,
}

impl TrackSpec {
    pub fn new(dir: Dir, pitch: i64, width: i64) -> Self {
        Self {
            dir,
            pitch,
            width,
            offset: None,
        }
    }

    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(self.pitch / 2)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingGrid {
    layers: HashMap<LayerId, TrackSpec>,
}

impl RoutingGrid {
    pub fn new(layers: impl IntoIterator<Item = (LayerId, TrackSpec)>) -> Self {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    pub fn track_spec(&self, layer: LayerId) -> Result<&TrackSpec, GridError> {
        self.layers
            .get(&layer)
            .ok_or(GridError::UnknownLayer(layer))
    }

    /// Converts a coordinate to the half-integer track index centered on it.
    pub fn coord_to_track(&self, layer: LayerId, coord: i64) -> Result<HalfInt, GridError> {
        let spec = self.track_spec(layer)?;
        let dbl = 2 * (coord - spec.offset());
        if dbl.rem_euclid(spec.pitch) != 0 {
            return Err(GridError::OffGrid { layer, coord });
        }
        Ok(HalfInt::from_double(dbl.div_euclid(spec.pitch)))
    }

    /// Returns the center coordinate of the given track.
    pub fn track_to_coord(&self, layer: LayerId, track: HalfInt) -> Result<i64, GridError> {
        let spec = self.track_spec(layer)?;
        Ok(spec.offset() + (track.double() * spec.pitch).div_euclid(2))
    }

    pub fn track_width(&self, layer: LayerId) -> Result<i64, GridError> {
        Ok(self.track_spec(layer)?.width)
    }
}
