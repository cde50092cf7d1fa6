//! Scene building and rendering for glacier time series
//!
//! This crate turns a [`glacierviz_core::GlacierSeries`] into a 3D scene and
//! draws it:
//! - The [`GlacierSceneAdapter`] binding a series and stepping through time
//! - Colormaps for ice thickness and bedrock elevation
//! - A z-up perspective camera fitted to the scene
//! - Map annotations (labels, arrows, outlines, legends), optionally placed
//!   by latitude and longitude
//! - A CPU rasterizer for frame and animation export

pub mod adapter;
pub mod annotations;
pub mod camera;
pub mod colormap;
pub mod config;
pub mod projection;
pub mod renderer;
pub mod scene;

pub use adapter::*;
pub use annotations::*;
pub use camera::*;
pub use colormap::*;
pub use config::*;
pub use projection::*;
pub use renderer::*;
pub use scene::*;
