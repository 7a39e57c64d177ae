//! Connection routines for substrate, transistor and dummy rows.
//!
//! Transistor and dummy connections are drawn in a frame whose origin is at the left edge
//! of the block, vertically at the OD center.

use std::collections::BTreeSet;

use itertools::Itertools;
use laygen::canvas::{Canvas, TrackId, ViaEnclosure, ViaPrimitive, WireArray};
use laygen::error::{ErrorSource, Result};
use laygen::layers::LayerSpec;
use laygen::mos::{
    ConnDir, EdgeMode, GateLoc, LayoutInfo, M2Loc, MosConnParams, MosError, MosInfo, MosType,
};
use laygeom::{HalfInt, Point, Rect, Span};
use log::debug;

use crate::constants::M1_DUM_H;
use crate::layers::{LI_PO, M1, M1_ID, VIA_M1_LIPO};
use crate::mos::via::{DsVia, GateVia, ViaWires};
use crate::CdsFfMpt;

/// OD extent of the first row of a transistor block.
fn transistor_od(layout_info: &LayoutInfo) -> Result<Span> {
    layout_info
        .row_info_list
        .first()
        .map(|row| row.od_y)
        .filter(|od| od.is_physical())
        .ok_or_else(|| MosError::NoOd.into())
}

fn first_wire(warrs: &[WireArray], what: &str) -> Result<WireArray> {
    warrs
        .first()
        .copied()
        .ok_or_else(|| ErrorSource::Internal(format!("no {what} M1 wires drawn")).into())
}

/// X coordinates from `start` through `stop` inclusive, `step` apart.
fn x_range(start: i64, stop: i64, step: i64) -> Vec<i64> {
    (start..=stop).step_by(step.max(1) as usize).collect_vec()
}

/// Half-track indices of the supply M3 wires: the requested port tracks, plus every
/// sd column that has no port track next to it.
fn supply_half_tracks(port_tracks: &[HalfInt], fg: i64) -> BTreeSet<i64> {
    let mut htr_set: BTreeSet<i64> = port_tracks.iter().map(|v| v.double() + 1).collect();
    for htr in (0..=2 * fg).step_by(2) {
        if !htr_set.contains(&(htr + 2)) && !htr_set.contains(&(htr - 2)) {
            htr_set.insert(htr);
        }
    }
    htr_set
}

/// A drain or source via stack of a transistor row, with M3 on every M1 column.
fn row_ds_via(
    wire_pitch: i64,
    num_seg: i64,
    m2_loc: M2Loc,
    m3_dir: ConnDir,
    x_list: &[i64],
) -> DsVia<'_> {
    DsVia {
        wire_pitch,
        od_yc: 0,
        num_seg,
        m2_loc,
        m3_dir,
        m1_x_list: x_list,
        m3_x_list: x_list,
        xshift: 0,
        draw_m2: true,
    }
}

impl CdsFfMpt {
    pub(crate) fn draw_sub_conn(
        &self,
        canvas: &mut dyn Canvas,
        layout_info: &LayoutInfo,
        port_tracks: &[HalfInt],
        dummy_only: bool,
        is_guardring: bool,
    ) -> Result<bool> {
        let rules = self.config.mos_rules();
        let lch_unit = layout_info.lch_unit;
        let sd_pitch = layout_info.sd_pitch;

        let mut has_od = false;
        for row in layout_info.row_info_list.iter() {
            if !row.od_y.is_physical() {
                continue;
            }
            let Some(&(od_start, od_stop)) = row.od_x_list.first() else {
                continue;
            };
            has_od = true;
            let fg = od_stop - od_start;
            let xshift = od_start * sd_pitch;
            let port_name = if row.od_type.mos_type == MosType::Ntap {
                "VDD"
            } else {
                "VSS"
            };

            let od_yc = row.od_y.center();
            let w = rules.num_fins(row.od_y.length());
            let via_info = self.ds_via_info(w, is_guardring)?;

            let m1_x_list = x_range(0, fg * sd_pitch, sd_pitch);
            let m3_x_list = if dummy_only {
                Vec::new()
            } else {
                supply_half_tracks(port_tracks, fg)
                    .into_iter()
                    .map(|htr| sd_pitch / 2 * htr)
                    .collect_vec()
            };
            debug!(
                "{port_name} substrate contact: fg={fg} w={w} with {} M3 wires",
                m3_x_list.len()
            );

            let ViaWires { m1, m3 } = self.draw_ds_via(
                canvas,
                &via_info,
                &DsVia {
                    wire_pitch: sd_pitch,
                    od_yc,
                    num_seg: fg,
                    m2_loc: M2Loc::Center,
                    m3_dir: ConnDir::Center,
                    m1_x_list: &m1_x_list,
                    m3_x_list: &m3_x_list,
                    xshift,
                    draw_m2: true,
                },
            )?;
            canvas.add_pin(port_name, &m1, false);
            if !m3.is_empty() {
                canvas.add_pin(port_name, &m3, false);
            }

            if !is_guardring {
                // poly contact straps above and below the MD
                let [v0, ..] = via_info.levels;
                let gm1_delta = v0.h / 2 + v0.top_ency;
                let m1_w = v0.w + 2 * v0.top_encx;
                let enc1 = ViaEnclosure::symmetric((m1_w - v0.w) / 2, (rules.mp_h - v0.h) / 2);
                let enc2 = ViaEnclosure::symmetric(v0.top_encx, v0.top_ency);
                let mp_y_list = [
                    Span::with_stop_and_length(row.md_y.start() - rules.mp_md_sp, rules.mp_h),
                    Span::with_start_and_length(row.md_y.stop() + rules.mp_md_sp, rules.mp_h),
                ];
                let m1_y = Span::new_unchecked(
                    mp_y_list[0].center() - gm1_delta,
                    mp_y_list[1].center() + gm1_delta,
                );
                let mp_dx = sd_pitch / 2 - lch_unit / 2 + rules.mp_po_ovl;
                for idx in (0..=fg).step_by(2) {
                    let xc = xshift + idx * sd_pitch;
                    for mp_y in mp_y_list {
                        canvas.add_rect(
                            LayerSpec::drawing(LI_PO),
                            Rect::from_spans(Span::new_unchecked(xc - mp_dx, xc + mp_dx), mp_y),
                        );
                    }
                    canvas.add_rect(
                        LayerSpec::drawing(M1),
                        Rect::from_spans(Span::new_unchecked(xc - m1_w / 2, xc + m1_w / 2), m1_y),
                    );
                    for mp_y in mp_y_list {
                        canvas.add_via(ViaPrimitive::new(
                            VIA_M1_LIPO,
                            Point::new(xc, mp_y.center()),
                            enc1,
                            enc2,
                        ));
                    }
                }
            }
        }
        Ok(has_od)
    }

    pub(crate) fn draw_mos_conn(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        params: &MosConnParams,
    ) -> Result<()> {
        if params.is_diff {
            return Err(MosError::DifferentialUnsupported.into());
        }
        if params.min_ds_cap {
            debug!("min_ds_cap is not supported; ignoring");
        }

        let layout_info = &mos_info.layout_info;
        let lch_unit = layout_info.lch_unit;
        let fg = layout_info.fg;
        let sd_pitch = layout_info.sd_pitch;
        let od_y = transistor_od(layout_info)?;
        let sd_yc = od_y.center();
        let w = self.config.mos_rules().num_fins(od_y.length());
        let ds_via_info = self.ds_via_info(w, false)?;
        let g_via_info = self.gate_via_info()?;

        let stack = params.stack;
        if stack < 1 {
            return Err(
                ErrorSource::InvalidArgs(format!("stack must be positive, got {stack}")).into(),
            );
        }
        if fg % stack != 0 {
            return Err(MosError::StackNotDivisible { stack, fg }.into());
        }
        let wire_pitch = stack * sd_pitch;
        let num_seg = fg / stack;
        let s_x_list = x_range(0, num_seg * wire_pitch, 2 * wire_pitch);
        let d_x_list = x_range(wire_pitch, num_seg * wire_pitch, 2 * wire_pitch);

        let gate = GateVia {
            lch_unit,
            fg,
            sd_pitch,
            gate_yc: mos_info.gate_yc - sd_yc,
            m3_x_list: &[],
            ext_mode: params.gate_ext_mode,
            dx: 0,
        };

        if params.diode_conn {
            if fg == 1 {
                return Err(MosError::SingleFingerConnection.into());
            }
            let sloc = if params.sdir == ConnDir::Up {
                M2Loc::Top
            } else {
                M2Loc::Bottom
            };
            let sarr = self
                .draw_ds_via(
                    canvas,
                    &ds_via_info,
                    &row_ds_via(wire_pitch, num_seg, sloc, params.sdir, &s_x_list),
                )?
                .m3;
            let drain = self.draw_ds_via(
                canvas,
                &ds_via_info,
                &row_ds_via(wire_pitch, num_seg, sloc.opposite(), params.ddir, &d_x_list),
            )?;
            let m1g = self.draw_g_via(canvas, &g_via_info, &gate)?.m1;

            // short each drain wire down to the gate contacts
            let m1d_first = first_wire(&drain.m1, "drain")?;
            let m1g_first = first_wire(&m1g, "gate")?;
            canvas.add_wires(
                M1_ID,
                TrackId::array(
                    m1d_first.track_id.base,
                    drain.m1.len(),
                    HalfInt::from_int(2 * stack),
                ),
                m1g_first.lower,
                m1d_first.upper,
            );
            let darr = WireArray::merge(&drain.m3);
            canvas.add_pin("g", &darr, false);
            canvas.add_pin("d", &darr, false);
            canvas.add_pin("s", &WireArray::merge(&sarr), false);
        } else {
            let gloc = if params.sdir == ConnDir::Down {
                GateLoc::Drain
            } else if params.ddir == ConnDir::Down {
                GateLoc::Source
            } else {
                params.gate_pref_loc
            };
            let (sloc, dloc) = match gloc {
                GateLoc::Source if num_seg != 2 => (M2Loc::Top, M2Loc::Bottom),
                _ => (M2Loc::Bottom, M2Loc::Top),
            };
            let g_x_list = match gloc {
                GateLoc::Drain => x_range(wire_pitch, num_seg * wire_pitch - 1, 2 * wire_pitch),
                GateLoc::Source if num_seg == 2 => vec![0, 2 * wire_pitch],
                GateLoc::Source => {
                    x_range(2 * wire_pitch, num_seg * wire_pitch - 1, 2 * wire_pitch)
                }
            };
            debug!("transistor connection fg={fg} stack={stack}: gate on {gloc:?} side");

            let gate = GateVia {
                m3_x_list: &g_x_list,
                ..gate
            };
            let garr = self.draw_g_via(canvas, &g_via_info, &gate)?.m3;
            let sarr = self
                .draw_ds_via(
                    canvas,
                    &ds_via_info,
                    &row_ds_via(wire_pitch, num_seg, sloc, params.sdir, &s_x_list),
                )?
                .m3;
            let darr = self
                .draw_ds_via(
                    canvas,
                    &ds_via_info,
                    &row_ds_via(wire_pitch, num_seg, dloc, params.ddir, &d_x_list),
                )?
                .m3;

            canvas.add_pin("s", &WireArray::merge(&sarr), false);
            canvas.add_pin("d", &WireArray::merge(&darr), false);
            canvas.add_pin("g", &WireArray::merge(&garr), false);
        }
        Ok(())
    }

    pub(crate) fn draw_dum_conn(
        &self,
        canvas: &mut dyn Canvas,
        mos_info: &MosInfo,
        edge_mode: EdgeMode,
    ) -> Result<()> {
        let layout_info = &mos_info.layout_info;
        let fg = layout_info.fg;
        let sd_pitch = layout_info.sd_pitch;
        let od_y = transistor_od(layout_info)?;
        let sd_yc = od_y.center();
        let w = self.config.mos_rules().num_fins(od_y.length());
        let ds_via_info = self.ds_via_info(w, false)?;
        let g_via_info = self.gate_via_info()?;

        let ds_x_start = if edge_mode.left { 0 } else { sd_pitch };
        let ds_x_stop = if edge_mode.right {
            fg * sd_pitch
        } else {
            (fg - 1) * sd_pitch
        };
        let ds_x_list = x_range(ds_x_start, ds_x_stop, sd_pitch);

        let m1g = self
            .draw_g_via(
                canvas,
                &g_via_info,
                &GateVia {
                    lch_unit: layout_info.lch_unit,
                    fg,
                    sd_pitch,
                    gate_yc: mos_info.gate_yc - sd_yc,
                    m3_x_list: &[],
                    ext_mode: EdgeMode::default(),
                    dx: 0,
                },
            )?
            .m1;
        let m1d = self
            .draw_ds_via(
                canvas,
                &ds_via_info,
                &DsVia {
                    wire_pitch: sd_pitch,
                    od_yc: 0,
                    num_seg: fg,
                    m2_loc: M2Loc::Center,
                    m3_dir: ConnDir::Center,
                    m1_x_list: &ds_x_list,
                    m3_x_list: &[],
                    xshift: 0,
                    draw_m2: false,
                },
            )?
            .m1;

        // tie gates and drain/source together with an M1 bar below the gate contacts
        let m1_yb = first_wire(&m1g, "gate")?.lower;
        let num_gate = m1g.len();
        let all_m1: Vec<WireArray> = m1g.into_iter().chain(m1d).collect();
        let connected = canvas.connect_wires(&all_m1, Some(m1_yb), None);
        if ds_x_stop > ds_x_start {
            canvas.add_rect(
                LayerSpec::drawing(M1),
                Rect::from_sides(ds_x_start, m1_yb, ds_x_stop, m1_yb + M1_DUM_H),
            );
        }
        canvas.add_pin("dummy", &connected[..num_gate], false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use laygen::canvas::LayoutCell;
    use laygen::mos::MosRowSpec;

    use super::*;
    use crate::layers::{M3_ID, VIA_M3_M2};
    use crate::DEFAULT_TECH_PARAMS;

    fn tech() -> CdsFfMpt {
        CdsFfMpt::from_yaml(DEFAULT_TECH_PARAMS).unwrap()
    }

    fn nch(fg: i64) -> MosInfo {
        tech()
            .get_mos_info(&MosRowSpec::new(18, 4, MosType::Nch, "standard", fg))
            .unwrap()
    }

    fn cell() -> LayoutCell {
        LayoutCell::new(tech().routing_grid(18).unwrap())
    }

    #[test]
    fn test_supply_half_tracks() {
        let tracks = supply_half_tracks(&[HalfInt::from_int(1)], 4);
        assert_eq!(tracks.into_iter().collect::<Vec<_>>(), vec![0, 3, 4, 8]);
        let tracks = supply_half_tracks(&[], 4);
        assert_eq!(tracks.into_iter().collect::<Vec<_>>(), vec![0, 4, 8]);
    }

    #[test]
    fn test_draw_sub_conn() {
        let tech = tech();
        let sub = tech
            .get_sub_yloc_info(&MosRowSpec::new(18, 4, MosType::Ptap, "standard", 4), 96)
            .unwrap();
        let mut cell = cell();
        let has_od = tech
            .draw_sub_conn(&mut cell, &sub.layout_info, &[HalfInt::from_int(1)], false, false)
            .unwrap();
        assert!(has_od);

        let pins: Vec<_> = cell.pins_named("VSS").collect();
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].wires.len(), 5);
        assert!(pins[0].wires.iter().all(|w| w.lower == 140 && w.upper == 340));
        let m3_x: Vec<_> = pins[1]
            .wires
            .iter()
            .map(|w| cell.grid().track_to_coord(M3_ID, w.track_id.base).unwrap())
            .collect();
        assert_eq!(m3_x, vec![0, 135, 180, 360]);
        assert_eq!(cell.pins_named("VDD").count(), 0);

        let mp: Vec<_> = cell.rects_on(&LayerSpec::drawing(LI_PO)).collect();
        assert_eq!(mp.len(), 6);
        assert_eq!(mp[0], &Rect::from_sides(-46, 87, 46, 127));
        assert_eq!(mp[1], &Rect::from_sides(-46, 353, 46, 393));
        let m1: Vec<_> = cell.rects_on(&LayerSpec::drawing(M1)).collect();
        assert_eq!(m1.len(), 3);
        assert_eq!(m1[0], &Rect::from_sides(-19, 71, 19, 409));
        assert_eq!(cell.vias_named(VIA_M1_LIPO).count(), 6);
    }

    #[test]
    fn test_draw_sub_conn_guard_ring_dummy_only() {
        let tech = tech();
        let sub = tech
            .get_sub_yloc_info(&MosRowSpec::new(18, 4, MosType::Ntap, "standard", 2), 96)
            .unwrap();
        let mut cell = cell();
        assert!(tech
            .draw_sub_conn(&mut cell, &sub.layout_info, &[], true, true)
            .unwrap());
        let pins: Vec<_> = cell.pins_named("VDD").collect();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].wires.len(), 3);
        assert_eq!(cell.rects_on(&LayerSpec::drawing(LI_PO)).count(), 0);
        assert_eq!(cell.vias_named(VIA_M3_M2).count(), 0);
    }

    #[test]
    fn test_draw_mos_conn() {
        let tech = tech();
        let mut cell = cell();
        tech.draw_mos_conn(&mut cell, &nch(4), &MosConnParams::default())
            .unwrap();

        let s: Vec<_> = cell.pins_named("s").collect();
        assert_eq!(s[0].wires.len(), 1);
        let s_tid = s[0].wires[0].track_id;
        assert_eq!((s_tid.base, s_tid.num), (HalfInt::from_double(-1), 3));
        assert_eq!(s_tid.pitch, HalfInt::from_int(2));

        let d = cell.pins_named("d").next().unwrap();
        assert_eq!(d.wires[0].track_id.num, 2);
        assert_eq!(d.wires[0].track_id.base, HalfInt::from_double(1));

        // gate M3 shares columns with the drain
        let g = cell.pins_named("g").next().unwrap();
        assert_eq!(g.wires[0].track_id, d.wires[0].track_id);
        assert_eq!(g.wires[0].upper, -218 + 36);
    }

    #[test]
    fn test_draw_mos_conn_gate_on_source() {
        let tech = tech();
        let mut cell = cell();
        let params = MosConnParams::builder()
            .sdir(ConnDir::Up)
            .ddir(ConnDir::Down)
            .build()
            .unwrap();
        tech.draw_mos_conn(&mut cell, &nch(8), &params).unwrap();
        let g = cell.pins_named("g").next().unwrap();
        let g_x: Vec<_> = g.wires[0]
            .track_id
            .tracks()
            .map(|t| cell.grid().track_to_coord(M3_ID, t).unwrap())
            .collect();
        assert_eq!(g_x, vec![180, 360, 540]);
    }

    #[test]
    fn test_draw_mos_conn_stacked() {
        let tech = tech();
        let mut cell = cell();
        let params = MosConnParams::builder().stack(2).build().unwrap();
        tech.draw_mos_conn(&mut cell, &nch(4), &params).unwrap();
        let s = cell.pins_named("s").next().unwrap();
        assert_eq!(s.wires[0].track_id.num, 2);
        assert_eq!(s.wires[0].track_id.pitch, HalfInt::from_int(4));

        let err = tech
            .draw_mos_conn(
                &mut cell,
                &nch(6),
                &MosConnParams::builder().stack(4).build().unwrap(),
            )
            .unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Mos(MosError::StackNotDivisible { stack: 4, fg: 6 })
        ));
    }

    #[test]
    fn test_draw_mos_conn_diode() {
        let tech = tech();
        let mut cell = cell();
        let params = MosConnParams::builder().diode_conn(true).build().unwrap();
        tech.draw_mos_conn(&mut cell, &nch(4), &params).unwrap();
        let g = cell.pins_named("g").next().unwrap();
        let d = cell.pins_named("d").next().unwrap();
        assert_eq!(g.wires, d.wires);
        let short = cell
            .wires
            .iter()
            .find(|w| w.layer == M1_ID && w.track_id.num == 2)
            .unwrap();
        assert_eq!((short.lower, short.upper), (-346, 100));

        let err = tech
            .draw_mos_conn(&mut cell, &nch(1), &params)
            .unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Mos(MosError::SingleFingerConnection)
        ));
    }

    #[test]
    fn test_draw_mos_conn_rejects_differential() {
        let params = MosConnParams::builder().is_diff(true).build().unwrap();
        let err = tech()
            .draw_mos_conn(&mut cell(), &nch(4), &params)
            .unwrap_err();
        assert!(matches!(
            err.source(),
            ErrorSource::Mos(MosError::DifferentialUnsupported)
        ));
    }

    #[test]
    fn test_draw_dum_conn() {
        let tech = tech();
        let mut cell = cell();
        tech.draw_dum_conn(&mut cell, &nch(4), EdgeMode::both())
            .unwrap();

        let dummy: Vec<_> = cell.pins_named("dummy").collect();
        assert_eq!(dummy.len(), 1);
        assert_eq!(dummy[0].wires.len(), 2);
        assert!(dummy[0].wires.iter().all(|w| w.lower == -346 && w.upper == 100));
        let bar: Vec<_> = cell.rects_on(&LayerSpec::drawing(M1)).collect();
        assert_eq!(bar, vec![&Rect::from_sides(0, -346, 360, -306)]);
        assert_eq!(cell.rects_on(&LayerSpec::drawing(crate::layers::M2)).count(), 0);
    }

    #[test]
    fn test_draw_dum_conn_interior() {
        let tech = tech();
        let mut cell = cell();
        tech.draw_dum_conn(&mut cell, &nch(2), EdgeMode::default())
            .unwrap();
        // only the middle column is contacted, so no bar is needed
        assert_eq!(cell.rects_on(&LayerSpec::drawing(M1)).count(), 0);
        assert_eq!(cell.pins_named("dummy").count(), 1);
    }
}
