//! The drawing surface that technology plugins emit geometry onto.

use arcstr::ArcStr;
use itertools::Itertools;
use laygeom::{HalfInt, Point, Rect};
use serde::{Deserialize, Serialize};

use crate::grid::{LayerId, RoutingGrid};
use crate::layers::LayerSpec;
use crate::log::trace;

/// Metal enclosure of a via cut on its four sides.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaEnclosure {
    pub left: i64,
    pub right: i64,
    pub bot: i64,
    pub top: i64,
}

impl ViaEnclosure {
    pub fn new(left: i64, right: i64, bot: i64, top: i64) -> Self {
        Self {
            left,
            right,
            bot,
            top,
        }
    }

    /// An enclosure of `x` on the left and right and `y` on the bottom and top.
    pub fn symmetric(x: i64, y: i64) -> Self {
        Self::new(x, x, y, y)
    }
}

/// A via instance: one or more cuts of a named via type, with metal enclosures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaPrimitive {
    pub name: ArcStr,
    /// Center of the lower-left cut.
    pub loc: Point,
    pub enc1: ViaEnclosure,
    pub enc2: ViaEnclosure,
    pub num_rows: usize,
    pub num_cols: usize,
    pub sp_rows: i64,
    pub sp_cols: i64,
    pub cut_width: Option<i64>,
    pub cut_height: Option<i64>,
}

impl ViaPrimitive {
    pub fn new(name: impl Into<ArcStr>, loc: Point, enc1: ViaEnclosure, enc2: ViaEnclosure) -> Self {
        Self {
            name: name.into(),
            loc,
            enc1,
            enc2,
            num_rows: 1,
            num_cols: 1,
            sp_rows: 0,
            sp_cols: 0,
            cut_width: None,
            cut_height: None,
        }
    }

    /// Sets the number of cut rows and their edge-to-edge spacing.
    pub fn with_rows(mut self, num_rows: usize, sp_rows: i64) -> Self {
        self.num_rows = num_rows;
        self.sp_rows = sp_rows;
        self
    }

    /// Repeats the via `num_cols` times with center-to-center pitch `pitch`.
    pub fn with_cols(mut self, num_cols: usize, pitch: i64) -> Self {
        self.num_cols = num_cols;
        self.sp_cols = pitch;
        self
    }

    pub fn with_cut_height(mut self, h: i64) -> Self {
        self.cut_height = Some(h);
        self
    }
}

/// A set of uniformly spaced tracks on one layer.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackId {
    pub base: HalfInt,
    pub num: usize,
    pub pitch: HalfInt,
}

impl TrackId {
    pub fn single(base: HalfInt) -> Self {
        Self {
            base,
            num: 1,
            pitch: HalfInt::from_int(0),
        }
    }

    pub fn array(base: HalfInt, num: usize, pitch: HalfInt) -> Self {
        Self { base, num, pitch }
    }

    /// Iterates over every track index in the set.
    pub fn tracks(&self) -> impl Iterator<Item = HalfInt> + '_ {
        (0..self.num as i64).map(move |i| self.base + self.pitch * i)
    }
}

/// Wires of identical extent on a set of tracks.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireArray {
    pub layer: LayerId,
    pub track_id: TrackId,
    pub lower: i64,
    pub upper: i64,
}

impl WireArray {
    pub fn new(layer: LayerId, track_id: TrackId, lower: i64, upper: i64) -> Self {
        Self {
            layer,
            track_id,
            lower,
            upper,
        }
    }

    /// Merges single-track wires into as few arrays as possible.
    ///
    /// Wires are merged only when they share layer and extents and sit on evenly spaced
    /// tracks; otherwise the input is returned unchanged.
    pub fn merge(warrs: &[WireArray]) -> Vec<WireArray> {
        let Some(first) = warrs.first() else {
            return Vec::new();
        };
        let uniform = warrs.iter().all(|w| {
            w.track_id.num == 1
                && w.layer == first.layer
                && w.lower == first.lower
                && w.upper == first.upper
        });
        if !uniform || warrs.len() == 1 {
            return warrs.to_vec();
        }
        let tracks = warrs.iter().map(|w| w.track_id.base).sorted().collect_vec();
        let pitches = tracks
            .iter()
            .tuple_windows()
            .map(|(a, b)| *b - *a)
            .collect_vec();
        if !pitches.iter().all_equal() || pitches[0] == HalfInt::from_int(0) {
            return warrs.to_vec();
        }
        vec![WireArray::new(
            first.layer,
            TrackId::array(tracks[0], tracks.len(), pitches[0]),
            first.lower,
            first.upper,
        )]
    }
}

/// The layout surface a technology plugin draws into.
///
/// Coordinates are in layout resolution units.
pub trait Canvas {
    fn grid(&self) -> &RoutingGrid;

    fn add_rect(&mut self, layer: LayerSpec, rect: Rect);

    fn add_via(&mut self, via: ViaPrimitive);

    fn add_wires(&mut self, layer: LayerId, track_id: TrackId, lower: i64, upper: i64)
        -> WireArray;

    /// Extends all given wires on each layer to a common extent, optionally further to
    /// `lower` and `upper`.
    fn connect_wires(
        &mut self,
        warrs: &[WireArray],
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Vec<WireArray>;

    fn add_pin(&mut self, name: &str, warrs: &[WireArray], show: bool);

    fn set_array_box(&mut self, rect: Rect);

    fn set_prim_bound_box(&mut self, rect: Rect);
}

/// A named pin on a set of wires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub name: ArcStr,
    pub wires: Vec<WireArray>,
    pub show: bool,
}

/// An in-memory [`Canvas`] that records everything drawn on it.
#[derive(Debug, Clone, Default)]
pub struct LayoutCell {
    grid: RoutingGrid,
    pub rects: Vec<(LayerSpec, Rect)>,
    pub vias: Vec<ViaPrimitive>,
    pub wires: Vec<WireArray>,
    pub pins: Vec<Pin>,
    pub array_box: Option<Rect>,
    pub prim_bound_box: Option<Rect>,
}

impl LayoutCell {
    pub fn new(grid: RoutingGrid) -> Self {
        Self {
            grid,
            ..Default::default()
        }
    }

    /// Iterates over the rectangles drawn on the given layer.
    pub fn rects_on<'a>(&'a self, layer: &LayerSpec) -> impl Iterator<Item = &'a Rect> + 'a {
        let layer = layer.clone();
        self.rects
            .iter()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, r)| r)
    }

    /// Iterates over the vias of the given type.
    pub fn vias_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ViaPrimitive> + 'a {
        let name = ArcStr::from(name);
        self.vias.iter().filter(move |v| v.name == name)
    }

    /// Returns every pin with the given name.
    pub fn pins_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Pin> + 'a {
        let name = ArcStr::from(name);
        self.pins.iter().filter(move |p| p.name == name)
    }
}

impl Canvas for LayoutCell {
    fn grid(&self) -> &RoutingGrid {
        &self.grid
    }

    fn add_rect(&mut self, layer: LayerSpec, rect: Rect) {
        trace!("add_rect {layer} {rect:?}");
        self.rects.push((layer, rect));
    }

    fn add_via(&mut self, via: ViaPrimitive) {
        self.vias.push(via);
    }

    fn add_wires(
        &mut self,
        layer: LayerId,
        track_id: TrackId,
        lower: i64,
        upper: i64,
    ) -> WireArray {
        let warr = WireArray::new(layer, track_id, lower, upper);
        self.wires.push(warr);
        warr
    }

    fn connect_wires(
        &mut self,
        warrs: &[WireArray],
        lower: Option<i64>,
        upper: Option<i64>,
    ) -> Vec<WireArray> {
        let mut out = Vec::with_capacity(warrs.len());
        for (layer, group) in &warrs.iter().group_by(|w| w.layer) {
            let group = group.collect_vec();
            let lo = group
                .iter()
                .map(|w| w.lower)
                .chain(lower)
                .min()
                .unwrap_or_default();
            let hi = group
                .iter()
                .map(|w| w.upper)
                .chain(upper)
                .max()
                .unwrap_or_default();
            for w in group {
                out.push(self.add_wires(layer, w.track_id, lo, hi));
            }
        }
        out
    }

    fn add_pin(&mut self, name: &str, warrs: &[WireArray], show: bool) {
        self.pins.push(Pin {
            name: ArcStr::from(name),
            wires: warrs.to_vec(),
            show,
        });
    }

    fn set_array_box(&mut self, rect: Rect) {
        self.array_box = Some(rect);
    }

    fn set_prim_bound_box(&mut self, rect: Rect) {
        self.prim_bound_box = Some(rect);
    }
}
