//! Drawing a block from its [`LayoutInfo`].

use laygen::canvas::Canvas;
use laygen::error::Result;
use laygen::layers::LayerSpec;
use laygen::mos::{poly_purpose, BlkType, EdgeInfo, LayoutInfo};
use laygen::tech::TechInfo;
use laygeom::{round_down_offset, round_up_offset, Rect, Span};
use log::trace;

use crate::layers::{is_fin_area, od_layer, po_layer, LI_ACT};
use crate::CdsFfMpt;

/// Adds `rect` unless it has no area.
fn add_physical_rect(canvas: &mut dyn Canvas, layer: LayerSpec, rect: Rect) {
    if rect.is_physical() {
        canvas.add_rect(layer, rect);
    } else {
        trace!("skipping degenerate {layer} rectangle {rect:?}");
    }
}

impl CdsFfMpt {
    /// Expands `y` outward so that both edges land on fin boundaries.
    pub fn snap_to_fin_bound(&self, y: Span) -> Span {
        let rules = self.config.mos_rules();
        let fin_p2 = rules.fin_pitch / 2;
        let fin_h2 = rules.fin_h / 2;
        Span::new_unchecked(
            round_down_offset(y.start(), rules.fin_pitch, fin_p2 - fin_h2),
            round_up_offset(y.stop(), rules.fin_pitch, fin_p2 + fin_h2),
        )
    }

    pub(crate) fn draw_mos_layout(
        &self,
        canvas: &mut dyn Canvas,
        layout_info: &LayoutInfo,
    ) -> Result<()> {
        let LayoutInfo {
            blk_type,
            lch_unit,
            md_w,
            fg,
            sd_pitch,
            array_box_xl: arr_xl,
            array_box_y: arr_y,
            draw_od,
            ..
        } = *layout_info;

        // a single finger takes its poly purpose from whichever neighbor is known
        let default_edge = EdgeInfo::new(None);
        let left_blk_info = match (layout_info.left_blk_info, layout_info.right_blk_info) {
            (Some(left), _) => left,
            (None, Some(right)) if fg == 1 => right,
            _ => default_edge,
        };
        let right_blk_info = match layout_info.right_blk_info {
            Some(right) => right,
            None if fg == 1 => left_blk_info,
            None => default_edge,
        };

        let blk_w = fg * sd_pitch + arr_xl;
        let num_po = fg.max(0) as usize;
        let po_xc = arr_xl + sd_pitch / 2;
        let po_x = |idx: i64| Span::with_start_and_length(po_xc + idx * sd_pitch - lch_unit / 2, lch_unit);
        let md_layer = LayerSpec::drawing(LI_ACT);

        for row in layout_info.row_info_list.iter() {
            let od_kind = row.od_type.kind;
            let od_lay = od_layer(od_kind);

            let mut po_on_od = vec![false; num_po];
            let mut md_on_od = vec![false; num_po + 1];
            if row.od_y.is_physical() {
                for &(od_start, od_stop) in row.od_x_list.iter() {
                    if od_start >= 1 && od_start - 1 < fg {
                        po_on_od[(od_start - 1) as usize] = true;
                    }
                    for idx in od_start.max(0)..=od_stop.min(fg) {
                        md_on_od[idx as usize] = true;
                        if idx < fg {
                            po_on_od[idx as usize] = true;
                        }
                    }
                    if draw_od {
                        let od_xl = po_xc - lch_unit / 2 + (od_start - 1) * sd_pitch;
                        let od_xr = po_xc + lch_unit / 2 + od_stop * sd_pitch;
                        add_physical_rect(
                            canvas,
                            od_lay.clone(),
                            Rect::from_spans(Span::new_unchecked(od_xl, od_xr), row.od_y),
                        );
                    }
                }
            }

            if row.po_y.is_physical() {
                for idx in 0..fg {
                    let purpose = if po_on_od[idx as usize] {
                        poly_purpose(false, od_kind)
                    } else if idx == 0 {
                        poly_purpose(true, left_blk_info.od_type)
                    } else if idx == fg - 1 {
                        poly_purpose(true, right_blk_info.od_type)
                    } else {
                        poly_purpose(false, None)
                    };
                    canvas.add_rect(po_layer(purpose), Rect::from_spans(po_x(idx), row.po_y));
                }
            }

            if row.md_y.is_physical() && fg > 0 {
                // guard ring contacts leave the outermost MD columns empty
                let md_range = if blk_type == BlkType::GrSub {
                    1..fg
                } else {
                    0..fg + 1
                };
                for idx in md_range.filter(|&idx| md_on_od[idx as usize]) {
                    let md_x = Span::with_start_and_length(arr_xl + idx * sd_pitch - md_w / 2, md_w);
                    canvas.add_rect(md_layer.clone(), Rect::from_spans(md_x, row.md_y));
                }
            }
        }

        for lay in layout_info.lay_info_list.iter() {
            let y = if is_fin_area(&lay.layer) {
                self.snap_to_fin_bound(lay.y)
            } else {
                lay.y
            };
            add_physical_rect(
                canvas,
                lay.layer.clone(),
                Rect::from_spans(Span::new_unchecked(lay.xl, blk_w), y),
            );
        }

        for adj in layout_info.adj_info_list.iter() {
            for (idx, po_type) in adj.po_types.iter().enumerate() {
                add_physical_rect(
                    canvas,
                    po_layer(*po_type),
                    Rect::from_spans(po_x(idx as i64), adj.po_y),
                );
            }
        }

        let arr_box = Rect::from_spans(Span::new_unchecked(arr_xl, blk_w), arr_y);
        let bound_box = Rect::from_sides(0, 0, arr_box.right(), arr_box.top());
        canvas.set_array_box(arr_box);
        canvas.set_prim_bound_box(bound_box);
        if bound_box.is_physical() {
            self.add_cell_boundary(canvas, bound_box);
            self.draw_device_blockage(canvas);
            for fill in layout_info.fill_info_list.iter() {
                if let Some(exc_layer) = &fill.exc_layer {
                    canvas.add_rect(exc_layer.clone(), bound_box);
                }
                for x in fill.x_intv_list.iter() {
                    for y in fill.y_intv_list.iter() {
                        add_physical_rect(canvas, fill.layer.clone(), Rect::from_spans(*x, *y));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use laygen::canvas::LayoutCell;
    use laygen::mos::{MosRowSpec, MosTech, MosType};

    use super::*;
    use crate::DEFAULT_TECH_PARAMS;

    fn tech() -> CdsFfMpt {
        CdsFfMpt::from_yaml(DEFAULT_TECH_PARAMS).unwrap()
    }

    #[test]
    fn test_snap_to_fin_bound() {
        let tech = tech();
        assert_eq!(
            tech.snap_to_fin_bound(Span::new_unchecked(0, 480)),
            Span::new_unchecked(-31, 511)
        );
        assert_eq!(
            tech.snap_to_fin_bound(Span::new_unchecked(17, 31)),
            Span::new_unchecked(17, 31)
        );
    }

    #[test]
    fn test_draw_mos_row() {
        let tech = tech();
        let info = tech
            .get_mos_info(&MosRowSpec::new(18, 4, MosType::Nch, "standard", 4))
            .unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        tech.draw_mos(&mut cell, &info.layout_info).unwrap();

        let od: Vec<_> = cell.rects_on(&LayerSpec::drawing("Active")).collect();
        assert_eq!(od, vec![&Rect::from_sides(-54, 209, 414, 367)]);
        assert_eq!(cell.rects_on(&LayerSpec::drawing("Poly")).count(), 4);
        assert_eq!(cell.rects_on(&LayerSpec::drawing("LiAct")).count(), 5);
        let fin: Vec<_> = cell
            .rects_on(&"FinArea:fin48".parse().unwrap())
            .collect();
        assert_eq!(fin, vec![&Rect::from_sides(0, -31, 360, 511)]);
        assert_eq!(cell.array_box, Some(Rect::from_sides(0, 0, 360, 480)));
        assert_eq!(cell.prim_bound_box, cell.array_box);
    }

    #[test]
    fn test_draw_mos_never_degenerate() {
        let tech = tech();
        let end = tech
            .get_analog_end_info(18, MosType::Ptap, "standard", 4, false, 96)
            .unwrap();
        let mut cell = LayoutCell::new(tech.routing_grid(18).unwrap());
        tech.draw_mos(&mut cell, &end.layout_info).unwrap();
        assert!(cell.rects.iter().all(|(_, r)| r.is_physical()));
        assert!(!cell.prim_bound_box.unwrap().is_physical());
    }
}
