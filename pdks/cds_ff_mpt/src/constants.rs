//! Fixed design rules of the cds_ff_mpt process, in layout resolution units.

/// Space between VIA0 cuts.
pub const V0_SP: i64 = 32;
/// Minimum area of 1x metals.
pub const MX_AREA_MIN: i64 = 6176;
/// Minimum line-end spacing of 1x metals.
pub const MX_SPY_MIN: i64 = 64;
/// Height of the horizontal M1 bar shorting dummy transistors.
pub const M1_DUM_H: i64 = 40;
/// Vertical space between drain and source M2 bars.
pub const M2_SPY_DS: i64 = 48;

/// Minimum length of a 1x metal wire of width `w` so that it meets [`MX_AREA_MIN`],
/// rounded up to an even number.
pub const fn mx_min_len(w: i64) -> i64 {
    let len = (MX_AREA_MIN + w - 1) / w;
    len + len % 2
}

/// Minimum width of an M2 bar of height `h` that meets [`MX_AREA_MIN`], rounded up to an
/// even number.
pub const fn m2_min_w(h: i64) -> i64 {
    (MX_AREA_MIN + 2 * h - 1) / (2 * h) * 2
}
