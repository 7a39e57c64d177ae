mod common;
use common::{assert_no_degenerate_rects, mos_row, new_cell, setup_tech};
use laygen::canvas::Canvas;
use laygen::error::ErrorSource;
use laygen::layers::{LayerPurpose, LayerSpec};
use laygen::mos::{BlkType, EdgeMode, MosConnParams, MosError, MosRowSpec, MosTech, MosType};
use laygeom::{HalfInt, Rect};

fn edge_poly() -> LayerSpec {
    LayerSpec::new("Poly", LayerPurpose::Edge)
}

#[test]
fn test_transistor_row_with_connections() {
    let tech = setup_tech();
    let info = mos_row(&tech, MosType::Pch, 4, 6);
    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &info.layout_info).unwrap();
    tech.draw_mos_connection(&mut cell, &info, &MosConnParams::default())
        .unwrap();
    assert_no_degenerate_rects(&cell);

    for name in ["s", "d", "g"] {
        let pins: Vec<_> = cell.pins_named(name).collect();
        assert_eq!(pins.len(), 1, "pin {name}");
        assert!(pins[0].wires.iter().all(|w| w.layer == 3));
        assert!(!pins[0].show);
    }
    let s = cell.pins_named("s").next().unwrap();
    assert_eq!(s.wires[0].track_id.num, 4);
    assert_eq!(cell.rects_on(&LayerSpec::drawing("Poly")).count(), 6);
}

#[test]
fn test_connection_errors() {
    let tech = setup_tech();
    let info = mos_row(&tech, MosType::Nch, 2, 6);
    let mut cell = new_cell(&tech, 18);

    let stacked = MosConnParams::builder().stack(4).build().unwrap();
    let err = tech
        .draw_mos_connection(&mut cell, &info, &stacked)
        .unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Mos(MosError::StackNotDivisible { stack: 4, fg: 6 })
    ));

    let one_finger = mos_row(&tech, MosType::Nch, 2, 1);
    let diode = MosConnParams::builder().diode_conn(true).build().unwrap();
    assert!(tech
        .draw_mos_connection(&mut cell, &one_finger, &diode)
        .is_err());
    assert!(tech
        .draw_mos_connection(&mut cell, &one_finger, &MosConnParams::default())
        .is_err());

    let err = tech
        .draw_decap_connection(&mut cell, &info, &MosConnParams::default())
        .unwrap_err();
    assert!(matches!(err.source(), ErrorSource::NotImplemented(_)));
}

#[test]
fn test_dummy_row() {
    let tech = setup_tech();
    let info = mos_row(&tech, MosType::Nch, 3, 4);
    let mut cell = new_cell(&tech, 18);
    tech.draw_dum_connection(&mut cell, &info, EdgeMode::from_bits(1))
        .unwrap();
    let dummy: Vec<_> = cell.pins_named("dummy").collect();
    assert_eq!(dummy.len(), 1);
    assert_eq!(dummy[0].wires.len(), 2);
    assert_eq!(cell.pins_named("g").count(), 0);
    // columns 0 through 3 are shorted by one bar
    let bar: Vec<_> = cell.rects_on(&LayerSpec::drawing("M1")).collect();
    assert_eq!(bar.len(), 1);
    assert_eq!((bar[0].left(), bar[0].right()), (0, 270));
}

#[test]
fn test_substrate_row() {
    let tech = setup_tech();
    for (sub_type, port) in [(MosType::Ptap, "VSS"), (MosType::Ntap, "VDD")] {
        let sub = tech
            .sub_yloc_info(&MosRowSpec::new(18, 3, sub_type, "standard", 6), 96)
            .unwrap();
        let mut cell = new_cell(&tech, 18);
        tech.draw_mos(&mut cell, &sub.layout_info).unwrap();
        let has_od = tech
            .draw_substrate_connection(
                &mut cell,
                &sub.layout_info,
                &[HalfInt::from_int(2)],
                false,
                false,
            )
            .unwrap();
        assert!(has_od);
        assert_no_degenerate_rects(&cell);
        assert_eq!(cell.pins_named(port).count(), 2);
        assert_eq!(cell.rects_on(&LayerSpec::drawing("LiAct")).count(), 7);
    }
}

#[test]
fn test_end_row_draws_nothing_without_od() {
    let tech = setup_tech();
    let end = tech
        .analog_end_info(18, MosType::Ptap, "standard", 4, true, 96)
        .unwrap();
    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &end.layout_info).unwrap();
    assert!(!tech
        .draw_substrate_connection(&mut cell, &end.layout_info, &[], false, false)
        .unwrap());
    assert!(cell.pins.is_empty());
    assert_no_degenerate_rects(&cell);
    assert_eq!(cell.rects_on(&LayerSpec::drawing("Poly")).count(), 4);
}

#[test]
fn test_outer_edge_of_end_row() {
    let tech = setup_tech();
    let geom = tech.edge_info(18, 0, true).unwrap();
    assert_eq!((geom.outer_fg, geom.cpo_xl), (3, 2));
    assert_eq!(tech.edge_info(18, 0, false).unwrap().outer_fg, 0);

    let end = tech
        .analog_end_info(18, MosType::Ptap, "standard", 4, true, 96)
        .unwrap();
    let edge = tech
        .outer_edge_info(0, &end.layout_info, true, Some(&end.left_edge_info))
        .unwrap();
    assert_eq!(edge.blk_type, BlkType::Edge);
    assert_eq!(edge.fg, 3);
    assert_eq!(edge.adj_info_list[0].po_types.len(), 3);

    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &edge).unwrap();
    let cpo: Vec<_> = cell.rects_on(&LayerSpec::drawing("CutPoly")).collect();
    assert_eq!(cpo, vec![&Rect::from_sides(2, 66, 270, 126)]);
    assert_no_degenerate_rects(&cell);
}

#[test]
fn test_guard_ring_blocks() {
    let tech = setup_tech();
    let info = mos_row(&tech, MosType::Nch, 4, 4);

    let err = tech.gr_sub_info(1, &info.layout_info).unwrap_err();
    assert!(matches!(
        err.source(),
        ErrorSource::Mos(MosError::GuardRingTooSmall { nf: 1, min: 2 })
    ));
    assert!(tech.edge_info(18, 1, false).is_err());

    let gr_sub = tech.gr_sub_info(2, &info.layout_info).unwrap();
    assert_eq!(gr_sub.blk_type, BlkType::GrSub);
    assert_eq!(gr_sub.fg, 6);
    assert_eq!(gr_sub.row_info_list[0].od_x_list, vec![(2, 4)]);
    assert_eq!(gr_sub.row_info_list[0].od_type.mos_type, MosType::Ptap);

    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &gr_sub).unwrap();
    let md_x: Vec<_> = cell
        .rects_on(&LayerSpec::drawing("LiAct"))
        .map(|r| r.center().x)
        .collect();
    assert_eq!(md_x, vec![180, 270, 360]);

    assert!(tech
        .draw_substrate_connection(&mut cell, &gr_sub, &[], false, true)
        .unwrap());
    let vss = cell.pins_named("VSS").next().unwrap();
    let m1_x: Vec<_> = vss
        .wires
        .iter()
        .map(|w| cell.grid().track_to_coord(1, w.track_id.base).unwrap())
        .collect();
    assert_eq!(m1_x, vec![180, 270, 360]);
    assert_eq!(cell.rects_on(&LayerSpec::drawing("LiPo")).count(), 0);

    let sep = tech
        .gr_sep_info(&info.layout_info, &info.left_edge_info)
        .unwrap();
    assert_eq!(sep.blk_type, BlkType::GrSep);
    assert!(sep.row_info_list.iter().all(|r| r.od_x_list.is_empty()));
    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &sep).unwrap();
    assert_eq!(cell.rects_on(&LayerSpec::drawing("Active")).count(), 0);
    assert_eq!(cell.rects_on(&LayerSpec::dummy("Poly")).count(), 1);
    assert_eq!(cell.rects_on(&edge_poly()).count(), 1);
}

#[test]
fn test_outer_edge_poly_faces_neighbor() {
    let tech = setup_tech();
    let info = mos_row(&tech, MosType::Nch, 2, 2);
    let edge = tech
        .outer_edge_info(0, &info.layout_info, true, Some(&info.left_edge_info))
        .unwrap();
    assert!(edge.row_info_list.iter().all(|r| r.od_x_list.is_empty()));

    let mut cell = new_cell(&tech, 18);
    tech.draw_mos(&mut cell, &edge).unwrap();
    assert_eq!(cell.rects_on(&LayerSpec::dummy("Poly")).count(), 2);
    let facing: Vec<_> = cell.rects_on(&edge_poly()).collect();
    assert_eq!(facing.len(), 1);
    assert_eq!(facing[0].center().x, 225);
    assert_eq!(cell.rects_on(&LayerSpec::drawing("LiAct")).count(), 0);
    assert_eq!(
        cell.array_box.map(|r| r.width()),
        Some(3 * info.layout_info.sd_pitch)
    );
}
