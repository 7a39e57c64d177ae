//! Via stacks stamped by the connection routines.
//!
//! Both stacks go from the contact layer (LiPo for gates, LiAct for drain/source) up to M3.
//! Coordinates passed in are relative to the block origin; the returned wires are the M1
//! and M3 wires that were drawn.

use laygen::canvas::{Canvas, TrackId, ViaEnclosure, ViaPrimitive, WireArray};
use laygen::error::Result;
use laygen::layers::LayerSpec;
use laygen::mos::{ConnDir, EdgeMode, M2Loc, MosError};
use laygeom::{Point, Rect, Span};
use log::trace;

use crate::config::ViaLevel;
use crate::constants::{m2_min_w, V0_SP};
use crate::layers::{LI_PO, M1_ID, M2, M3_ID, VIA_M1_LIACT, VIA_M1_LIPO, VIA_M2_M1, VIA_M3_M2};
use crate::mos::ViaInfo;
use crate::CdsFfMpt;

/// Wires drawn by a via stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViaWires {
    pub m1: Vec<WireArray>,
    pub m3: Vec<WireArray>,
}

/// Placement of a gate via stack.
#[derive(Debug, Clone, Copy)]
pub struct GateVia<'a> {
    pub lch_unit: i64,
    pub fg: i64,
    pub sd_pitch: i64,
    /// Gate contact center.
    pub gate_yc: i64,
    /// X coordinates of the M3 gate wires. No M2 or M3 is drawn if empty.
    pub m3_x_list: &'a [i64],
    pub ext_mode: EdgeMode,
    /// X offset of the first finger.
    pub dx: i64,
}

/// Placement of a drain/source via stack.
#[derive(Debug, Clone, Copy)]
pub struct DsVia<'a> {
    /// Pitch between adjacent M1 wires.
    pub wire_pitch: i64,
    pub od_yc: i64,
    /// Number of wire pitches covered by the VIA0 array.
    pub num_seg: i64,
    pub m2_loc: M2Loc,
    pub m3_dir: ConnDir,
    pub m1_x_list: &'a [i64],
    pub m3_x_list: &'a [i64],
    /// Shift applied to every X coordinate.
    pub xshift: i64,
    pub draw_m2: bool,
}

fn enclosures(level: &ViaLevel) -> (ViaEnclosure, ViaEnclosure) {
    (
        ViaEnclosure::symmetric(level.bot_encx, level.bot_ency),
        ViaEnclosure::symmetric(level.top_encx, level.top_ency),
    )
}

/// Splits `fg` gate fingers into poly contact groups.
///
/// Even finger counts use groups of 2. Odd counts up to 5 use a single group; larger odd
/// counts put one group of 3 between runs of 2.
///
/// The groups always sum to `fg`. The `(fg - 3) / 2` groups of 2 are split around the 3,
/// with the extra one on the right, rather than repeated on both sides of it.
pub fn gate_groups(fg: i64) -> Result<Vec<i64>> {
    if fg % 2 == 0 {
        return Ok(vec![2; (fg / 2).max(0) as usize]);
    }
    if fg == 1 {
        return Err(MosError::SingleFingerConnection.into());
    }
    if fg <= 5 {
        return Ok(vec![fg]);
    }
    let num_two = (fg - 3) / 2;
    let num_left = (num_two / 2) as usize;
    let num_right = (num_two as usize) - num_left;
    let mut groups = vec![2; num_left];
    groups.push(3);
    groups.extend(std::iter::repeat(2).take(num_right));
    Ok(groups)
}

/// Widens the M2 bar `[xl, xr]` to meet the minimum area rule, never extending left of
/// `xmin`.
fn fix_m2_area(xl: i64, xr: i64, m2_h: i64, xmin: Option<i64>) -> Span {
    let w_min = m2_min_w(m2_h);
    let xc = (xl + xr).div_euclid(2);
    let mut xl = std::cmp::min(xl, xc - w_min / 2);
    if let Some(xmin) = xmin {
        xl = std::cmp::max(xl, xmin);
    }
    let xr = std::cmp::max(xr, xl + w_min);
    Span::new_unchecked(xl, xr)
}

impl CdsFfMpt {
    /// Draws gate contacts of all fingers and connects them to M1, and optionally to M2
    /// and M3.
    pub(crate) fn draw_g_via(
        &self,
        canvas: &mut dyn Canvas,
        info: &ViaInfo,
        gate: &GateVia,
    ) -> Result<ViaWires> {
        let rules = self.config.mos_rules();
        let [v0, v1, v2] = info.levels;
        let GateVia {
            lch_unit,
            fg,
            sd_pitch,
            gate_yc,
            m3_x_list,
            ext_mode,
            dx,
        } = *gate;
        let groups = gate_groups(fg)?;
        trace!("gate groups for fg={fg}: {groups:?}");

        let m1_y = Span::with_stop_and_length(gate_yc + v0.h / 2 + v0.top_ency, info.m1_h);
        let m2_y = Span::from_center_length(gate_yc, info.m2_h);
        let mp_y = Span::from_center_length(gate_yc, rules.mp_h);

        let mut m2_xl = dx + fg * sd_pitch / 2;
        let mut m2_xr = m2_xl;
        if ext_mode.left {
            m2_xl = dx;
        }
        if ext_mode.right {
            m2_xr = dx + fg * sd_pitch;
        }

        let (v0_enc1, v0_enc2) = enclosures(&v0);
        let (v1_enc1, v1_enc2) = enclosures(&v1);
        let mut wires = ViaWires::default();
        let mut tot_fg = 0;
        for num_fg in groups {
            let via_xoff = dx + (tot_fg + 1) * sd_pitch;
            let cur_xc = dx + tot_fg * sd_pitch + num_fg * sd_pitch / 2;
            let mp_w = (num_fg - 1) * sd_pitch - lch_unit + 2 * rules.mp_po_ovl;
            let mp_x = Span::with_start_and_length(cur_xc - mp_w / 2, mp_w);
            canvas.add_rect(LayerSpec::drawing(LI_PO), Rect::from_spans(mp_x, mp_y));

            for idx in 0..num_fg - 1 {
                let via_xc = via_xoff + idx * sd_pitch;
                let loc = Point::new(via_xc, gate_yc);
                canvas.add_via(ViaPrimitive::new(VIA_M1_LIPO, loc, v0_enc1, v0_enc2));
                let track = canvas.grid().coord_to_track(M1_ID, via_xc)?;
                wires.m1.push(canvas.add_wires(
                    M1_ID,
                    TrackId::single(track),
                    m1_y.start(),
                    m1_y.stop(),
                ));
                if !m3_x_list.is_empty() {
                    canvas.add_via(ViaPrimitive::new(VIA_M2_M1, loc, v1_enc1, v1_enc2));
                }
            }

            m2_xl = std::cmp::min(via_xoff - v1.w / 2 - v1.top_encx, m2_xl);
            m2_xr = std::cmp::max(
                via_xoff + (num_fg - 2) * sd_pitch + v1.w / 2 + v1.top_encx,
                m2_xr,
            );
            tot_fg += num_fg;
        }

        if !m3_x_list.is_empty() {
            let m2_x = fix_m2_area(m2_xl, m2_xr, info.m2_h, Some(dx));
            canvas.add_rect(LayerSpec::drawing(M2), Rect::from_spans(m2_x, m2_y));
        }

        let (v2_enc1, v2_enc2) = enclosures(&v2);
        let m3_y = Span::with_stop_and_length(gate_yc + v2.h / 2 + v2.top_ency, info.m3_h);
        for &xc in m3_x_list {
            canvas.add_via(
                ViaPrimitive::new(VIA_M3_M2, Point::new(xc, gate_yc), v2_enc1, v2_enc2)
                    .with_cut_height(v2.h),
            );
            let track = canvas.grid().coord_to_track(M3_ID, xc)?;
            wires.m3.push(canvas.add_wires(
                M3_ID,
                TrackId::single(track),
                m3_y.start(),
                m3_y.stop(),
            ));
        }
        Ok(wires)
    }

    /// Draws drain/source contacts up to M1, and optionally to M2 and M3.
    pub(crate) fn draw_ds_via(
        &self,
        canvas: &mut dyn Canvas,
        info: &ViaInfo,
        ds: &DsVia,
    ) -> Result<ViaWires> {
        let [v0, v1, v2] = info.levels;
        let DsVia {
            wire_pitch,
            od_yc,
            num_seg,
            m2_loc,
            m3_dir,
            m1_x_list,
            m3_x_list,
            xshift,
            draw_m2,
        } = *ds;

        let (v0_enc1, v0_enc2) = enclosures(&v0);
        canvas.add_via(
            ViaPrimitive::new(VIA_M1_LIACT, Point::new(xshift, od_yc), v0_enc1, v0_enc2)
                .with_rows(info.num_v0.max(1) as usize, V0_SP)
                .with_cols((num_seg + 1).max(1) as usize, wire_pitch),
        );

        let m1_y = Span::from_center_length(od_yc, info.m1_h);
        let via_yc = match m2_loc {
            M2Loc::Bottom => m1_y.start() + v1.bot_ency + v1.h / 2,
            M2Loc::Center => od_yc,
            M2Loc::Top => m1_y.stop() - v1.bot_ency - v1.h / 2,
        };

        let (v1_enc1, v1_enc2) = enclosures(&v1);
        let mut wires = ViaWires::default();
        let mut m2_x: Option<Span> = None;
        for &x in m1_x_list {
            let xc = xshift + x;
            let track = canvas.grid().coord_to_track(M1_ID, xc)?;
            wires.m1.push(canvas.add_wires(
                M1_ID,
                TrackId::single(track),
                m1_y.start(),
                m1_y.stop(),
            ));
            if draw_m2 {
                canvas.add_via(
                    ViaPrimitive::new(VIA_M2_M1, Point::new(xc, via_yc), v1_enc1, v1_enc2)
                        .with_cut_height(v1.h),
                );
                let pt = Span::new_unchecked(xc, xc);
                m2_x = Some(m2_x.map_or(pt, |s| s.union(pt)));
            }
        }

        let (v2_enc1, v2_enc2) = enclosures(&v2);
        let m3_y = match m3_dir {
            ConnDir::Down => {
                Span::with_stop_and_length(via_yc + v2.h / 2 + v2.top_ency, info.m3_h)
            }
            ConnDir::Up => {
                Span::with_start_and_length(via_yc - v2.h / 2 - v2.top_ency, info.m3_h)
            }
            ConnDir::Center => Span::from_center_length(via_yc, info.m3_h),
        };
        for &x in m3_x_list {
            let xc = xshift + x;
            canvas.add_via(
                ViaPrimitive::new(VIA_M3_M2, Point::new(xc, via_yc), v2_enc1, v2_enc2)
                    .with_cut_height(v2.h),
            );
            let track = canvas.grid().coord_to_track(M3_ID, xc)?;
            wires.m3.push(canvas.add_wires(
                M3_ID,
                TrackId::single(track),
                m3_y.start(),
                m3_y.stop(),
            ));
        }

        if let Some(x) = m2_x {
            let m2_x = fix_m2_area(x.start(), x.stop(), info.m2_h, None);
            let m2_y = Span::from_center_length(via_yc, info.m2_h);
            canvas.add_rect(LayerSpec::drawing(M2), Rect::from_spans(m2_x, m2_y));
        }
        Ok(wires)
    }
}

#[cfg(test)]
mod tests {
    use laygen::canvas::LayoutCell;
    use laygeom::HalfInt;

    use super::*;
    use crate::DEFAULT_TECH_PARAMS;

    fn tech() -> CdsFfMpt {
        CdsFfMpt::from_yaml(DEFAULT_TECH_PARAMS).unwrap()
    }

    #[test]
    fn test_gate_groups() {
        assert_eq!(gate_groups(4).unwrap(), vec![2, 2]);
        assert_eq!(gate_groups(3).unwrap(), vec![3]);
        assert_eq!(gate_groups(5).unwrap(), vec![5]);
        assert_eq!(gate_groups(7).unwrap(), vec![2, 3, 2]);
        assert_eq!(gate_groups(9).unwrap(), vec![2, 3, 2, 2]);
        assert!(gate_groups(1).is_err());
        for fg in 2..40 {
            assert_eq!(gate_groups(fg).unwrap().iter().sum::<i64>(), fg);
        }
    }

    #[test]
    fn test_fix_m2_area() {
        assert_eq!(fix_m2_area(100, 100, 40, None), Span::new_unchecked(22, 178));
        assert_eq!(fix_m2_area(0, 10, 40, Some(0)), Span::new_unchecked(0, 156));
        assert_eq!(fix_m2_area(0, 500, 40, None), Span::new_unchecked(0, 500));
    }

    #[test]
    fn test_draw_g_via() {
        let tech = tech();
        let info = tech.gate_via_info().unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        let m3_x_list = [90, 270];
        let wires = tech
            .draw_g_via(
                &mut cell,
                &info,
                &GateVia {
                    lch_unit: 18,
                    fg: 4,
                    sd_pitch: 90,
                    gate_yc: 0,
                    m3_x_list: &m3_x_list,
                    ext_mode: EdgeMode::default(),
                    dx: 0,
                },
            )
            .unwrap();

        let mp: Vec<_> = cell.rects_on(&LayerSpec::drawing(LI_PO)).collect();
        assert_eq!(
            mp,
            vec![
                &Rect::from_sides(44, -20, 136, 20),
                &Rect::from_sides(224, -20, 316, 20)
            ]
        );
        assert_eq!(wires.m1.len(), 2);
        assert_eq!(wires.m1[0].track_id.base, HalfInt::from_double(1));
        assert_eq!((wires.m1[0].lower, wires.m1[0].upper), (-128, 36));
        assert_eq!(cell.vias_named(VIA_M2_M1).count(), 2);

        let m2: Vec<_> = cell.rects_on(&LayerSpec::drawing(M2)).collect();
        assert_eq!(m2, vec![&Rect::from_sides(54, -20, 306, 20)]);
        assert_eq!(wires.m3.len(), 2);
        assert_eq!((wires.m3[1].lower, wires.m3[1].upper), (-128, 36));
    }

    #[test]
    fn test_draw_g_via_without_m3() {
        let tech = tech();
        let info = tech.gate_via_info().unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        let wires = tech
            .draw_g_via(
                &mut cell,
                &info,
                &GateVia {
                    lch_unit: 18,
                    fg: 5,
                    sd_pitch: 90,
                    gate_yc: 100,
                    m3_x_list: &[],
                    ext_mode: EdgeMode::both(),
                    dx: 0,
                },
            )
            .unwrap();
        assert_eq!(wires.m1.len(), 4);
        assert!(wires.m3.is_empty());
        assert_eq!(cell.rects_on(&LayerSpec::drawing(M2)).count(), 0);
        assert_eq!(cell.vias_named(VIA_M2_M1).count(), 0);
        assert_eq!(cell.vias_named(VIA_M1_LIPO).count(), 4);
    }

    #[test]
    fn test_draw_ds_via() {
        let tech = tech();
        let info = tech.ds_via_info(4, false).unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        let x_list = [0, 180];
        let wires = tech
            .draw_ds_via(
                &mut cell,
                &info,
                &DsVia {
                    wire_pitch: 90,
                    od_yc: 0,
                    num_seg: 2,
                    m2_loc: M2Loc::Bottom,
                    m3_dir: ConnDir::Down,
                    m1_x_list: &x_list,
                    m3_x_list: &x_list,
                    xshift: 0,
                    draw_m2: true,
                },
            )
            .unwrap();

        let v0: Vec<_> = cell.vias_named(VIA_M1_LIACT).collect();
        assert_eq!(v0.len(), 1);
        assert_eq!((v0[0].num_rows, v0[0].num_cols), (3, 3));

        assert_eq!(wires.m1.len(), 2);
        assert_eq!((wires.m1[0].lower, wires.m1[0].upper), (-100, 100));
        assert_eq!(wires.m1[0].track_id.base, HalfInt::from_double(-1));

        let m2: Vec<_> = cell.rects_on(&LayerSpec::drawing(M2)).collect();
        assert_eq!(m2, vec![&Rect::from_sides(0, -84, 180, -44)]);
        assert_eq!((wires.m3[0].lower, wires.m3[0].upper), (-192, -28));
    }

    #[test]
    fn test_draw_ds_via_shift() {
        let tech = tech();
        let info = tech.ds_via_info(2, false).unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        let wires = tech
            .draw_ds_via(
                &mut cell,
                &info,
                &DsVia {
                    wire_pitch: 90,
                    od_yc: 0,
                    num_seg: 1,
                    m2_loc: M2Loc::Center,
                    m3_dir: ConnDir::Up,
                    m1_x_list: &[0, 90],
                    m3_x_list: &[90],
                    xshift: 180,
                    draw_m2: false,
                },
            )
            .unwrap();
        assert_eq!(wires.m1[0].track_id.base, HalfInt::from_double(3));
        assert_eq!(wires.m3[0].track_id.base, HalfInt::from_double(5));
        assert_eq!(wires.m3[0].lower, -36);
        assert_eq!(cell.rects_on(&LayerSpec::drawing(M2)).count(), 0);
        assert_eq!(cell.vias_named(VIA_M1_LIACT).next().unwrap().loc, Point::new(180, 0));
    }
}
