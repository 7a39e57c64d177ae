//! Host-side interfaces for FinFET analog layout technology plugins.
//!
//! A plugin implements [`mos::MosTech`] and [`tech::TechInfo`] for its process and draws
//! onto anything implementing [`canvas::Canvas`].

pub mod canvas;
pub mod error;
pub mod grid;
pub mod layers;
pub(crate) mod log;
pub mod mos;
pub mod tech;

pub mod deps {
    pub use arcstr;
    pub use laygeom;
}
