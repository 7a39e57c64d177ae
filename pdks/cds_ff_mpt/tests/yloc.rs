mod common;
use cds_ff_mpt::mos::ConnKind;
use common::{setup_tech, LCH_LIST};
use laygen::mos::{MosRowSpec, MosTech, MosType};

#[test]
fn test_mos_yloc_fin_grid() {
    let tech = setup_tech();
    let fin_p = tech.config().mos_rules().fin_pitch;
    for lch_unit in LCH_LIST {
        for w in 1..=12 {
            let row = MosRowSpec::new(lch_unit, w, MosType::Nch, "standard", 4);
            let yloc = tech.mos_yloc_info(&row).unwrap();
            assert!(yloc.od.is_physical());
            assert!(yloc.md.contains(yloc.od));
            assert_eq!(yloc.od.center(), yloc.md.center(), "w = {w}");
            let expected_rem = if w % 2 == 0 { 0 } else { fin_p / 2 };
            assert_eq!(yloc.od.center().rem_euclid(fin_p), expected_rem, "w = {w}");
            assert_eq!(yloc.blk.stop().rem_euclid(fin_p), 0);
            assert!(yloc.blk.contains(yloc.od));
            assert!(yloc.g_y_list[0].stop() <= yloc.od.start());
        }
    }
}

#[test]
fn test_mos_yloc_od_center_is_smallest_on_grid() {
    let tech = setup_tech();
    let rules = *tech.config().mos_rules();
    let fin_p = rules.fin_pitch;
    let [g_m1, _, _] = tech.conn_drc_info(ConnKind::Gate).unwrap();

    // lowest OD center allowed by the gate contact and gate M1 line end
    let mp_yb = rules.cpo_h - rules.cpo_h / 2 + rules.mp_cpo_sp;
    let mp_yc = mp_yb + rules.mp_h / 2;
    for lch_unit in LCH_LIST {
        for w in 1..=12 {
            let min_yc = mp_yc + g_m1.top_ext + g_m1.sp_le + rules.md_h(w) / 2;
            let row = MosRowSpec::new(lch_unit, w, MosType::Nch, "standard", 4);
            let od_yc = tech.mos_yloc_info(&row).unwrap().od.center();
            assert!(od_yc >= min_yc, "lch = {lch_unit}, w = {w}");
            assert!(od_yc - fin_p < min_yc, "lch = {lch_unit}, w = {w}");
        }
    }
}

#[test]
fn test_mos_yloc_is_deterministic() {
    let tech = setup_tech();
    let row = MosRowSpec::new(20, 5, MosType::Pch, "lvt", 6);
    assert_eq!(
        tech.mos_yloc_info(&row).unwrap(),
        tech.mos_yloc_info(&row).unwrap()
    );
    let info = tech.mos_info(&row).unwrap();
    assert_eq!(info.yloc, tech.mos_yloc_info(&row).unwrap());
    assert_eq!(info.sd_yc, info.yloc.od.center());
}

#[test]
fn test_sub_yloc_on_block_pitch() {
    let tech = setup_tech();
    let rules = *tech.config().mos_rules();
    for blk_pitch in [48, 96, 120] {
        for w in 1..=8 {
            let row = MosRowSpec::new(18, w, MosType::Ntap, "standard", 4);
            let sub = tech.sub_yloc_info(&row, blk_pitch).unwrap();
            assert_eq!(sub.blk_height % blk_pitch, 0);

            let od = sub.layout_info.row_info_list[0].od_y;
            let md = sub.layout_info.row_info_list[0].md_y;
            assert_eq!(od.length(), rules.od_h(w));
            assert_eq!(
                (od.start() - (rules.fin_pitch - rules.fin_h) / 2).rem_euclid(rules.fin_pitch),
                0
            );
            assert!((2 * od.center() - sub.blk_height).abs() <= 2 * rules.fin_pitch);
            assert_eq!(md.center(), od.center());
            assert!(sub.ds_conn_y.contains(md));
            assert_eq!(sub.sd_yc, od.center());
        }
    }
}

#[test]
fn test_invalid_rows() {
    let tech = setup_tech();
    assert!(tech
        .mos_yloc_info(&MosRowSpec::new(18, 0, MosType::Nch, "standard", 2))
        .is_err());
    assert!(tech
        .mos_info(&MosRowSpec::new(18, 2, MosType::Nch, "xvt", 2))
        .is_err());
    assert!(tech
        .sub_yloc_info(&MosRowSpec::new(18, 2, MosType::Pch, "standard", 2), 96)
        .is_err());
}
