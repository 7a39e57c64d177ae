//! Layout technology plugin for the `cds_ff_mpt` FinFET process.
//!
//! [`CdsFfMpt`] implements [`MosTech`](laygen::mos::MosTech) for transistor-row layout and
//! [`TechInfo`](laygen::tech::TechInfo) for electromigration queries. All process numbers
//! come from a [`TechConfig`] table; the table shipped with the crate is
//! [`DEFAULT_TECH_PARAMS`].

use std::path::Path;

use laygen::error::Result;
use laygen::grid::{RoutingGrid, TrackSpec};
use laygeom::Dir;
use laylut::FloatLut1;

pub mod config;
pub mod constants;
pub mod layers;
pub mod mos;
pub mod tech;

pub use config::TechConfig;

use crate::layers::{M1_ID, M2_ID, M3_ID};

/// The process parameter table shipped with this crate.
pub const DEFAULT_TECH_PARAMS: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/tech_params.yaml"));

/// The `cds_ff_mpt` technology.
#[derive(Debug, Clone)]
pub struct CdsFfMpt {
    config: TechConfig,
    idc_scale: FloatLut1,
    res_idc_scale: FloatLut1,
}

impl CdsFfMpt {
    pub fn new(config: TechConfig) -> Result<Self> {
        let idc_scale = config.idc_scale_lut()?;
        let res_idc_scale = config.res_idc_scale_lut()?;
        Ok(Self {
            config,
            idc_scale,
            res_idc_scale,
        })
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        Self::new(TechConfig::from_yaml(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(TechConfig::load(path)?)
    }

    /// Parses [`DEFAULT_TECH_PARAMS`].
    pub fn default_config() -> Result<TechConfig> {
        Ok(TechConfig::from_yaml(DEFAULT_TECH_PARAMS)?)
    }

    #[inline]
    pub fn config(&self) -> &TechConfig {
        &self.config
    }

    /// The M1 to M3 routing grid of transistor rows with channel length `lch_unit`.
    ///
    /// M1 and M3 tracks are vertical and aligned to the source/drain pitch, so that track
    /// `i - 1/2` sits on MD column `i`.
    pub fn routing_grid(&self, lch_unit: i64) -> Result<RoutingGrid> {
        let sd_pitch = self.config.lch_rules(lch_unit)?.sd_pitch;
        let conn_w = self.config.mos_rules().mos_conn_w;
        let m2_h = self.config.via_d()[1].h + 2 * self.config.via_d()[1].top_ency;
        Ok(RoutingGrid::new([
            (M1_ID, TrackSpec::new(Dir::Vert, sd_pitch, conn_w)),
            (M2_ID, TrackSpec::new(Dir::Horiz, sd_pitch, m2_h)),
            (M3_ID, TrackSpec::new(Dir::Vert, sd_pitch, conn_w)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use laygeom::HalfInt;

    use super::*;

    #[test]
    fn test_default_tech() {
        let tech = CdsFfMpt::new(CdsFfMpt::default_config().unwrap()).unwrap();
        assert_eq!(tech.config().tech_lib, "cds_ff_mpt");
    }

    #[test]
    fn test_load_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/tech_params.yaml");
        let tech = CdsFfMpt::load(path).unwrap();
        assert_eq!(tech.config().mos_rules(), CdsFfMpt::default_config().unwrap().mos_rules());

        let err = CdsFfMpt::load("no/such/tech_params.yaml").unwrap_err();
        assert_eq!(err.context().len(), 1);
        assert!(err.to_string().contains("reading file"));
    }

    #[test]
    fn test_routing_grid_aligns_to_md() {
        let tech = CdsFfMpt::from_yaml(DEFAULT_TECH_PARAMS).unwrap();
        let grid = tech.routing_grid(18).unwrap();
        assert_eq!(
            grid.coord_to_track(M1_ID, 0).unwrap(),
            HalfInt::from_double(-1)
        );
        assert_eq!(
            grid.coord_to_track(M3_ID, 270).unwrap(),
            HalfInt::from_double(5)
        );
        assert_eq!(grid.track_width(M1_ID).unwrap(), 38);
        assert!(tech.routing_grid(19).is_err());
    }
}
