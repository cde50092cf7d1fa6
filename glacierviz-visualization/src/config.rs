//! Scene configuration
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "vertical_exaggeration": 2.0, "camera": { "azimuth": 45.0 } }
//! ```

use crate::colormap::{parse_color, Colormap};
use crate::renderer::MAX_FRAME_DIMENSION;
use glacierviz_core::{Error, Result, Rgb8};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Camera placement relative to the scene bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees clockwise from north-facing
    pub azimuth: f32,
    /// Degrees above the horizon
    pub elevation: f32,
    /// Values above 1 move the camera closer
    pub zoom: f32,
    /// Vertical field of view in degrees
    pub fov: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 30.0,
            zoom: 1.0,
            fov: 30.0,
        }
    }
}

/// Mesh format written by mesh export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Ply,
    Obj,
}

impl MeshFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            MeshFormat::Ply => "ply",
            MeshFormat::Obj => "obj",
        }
    }
}

/// Configuration for building and rendering glacier scenes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    /// Scale factor applied to all elevations
    pub vertical_exaggeration: f32,
    pub ice_colormap: String,
    pub terrain_colormap: String,
    /// Fixed ice thickness color limits; the series range when absent
    pub thickness_clim: Option<(f32, f32)>,
    /// Ice thinner than this (meters) is not drawn
    pub ice_threshold: f32,
    pub background: String,
    pub camera: CameraConfig,
    /// Frame size in pixels `(width, height)`
    pub frame_size: (u32, u32),
    pub frames_per_second: u32,
    pub time_label_prefix: String,
    pub mesh_format: MeshFormat,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            vertical_exaggeration: 1.0,
            ice_colormap: "blues".to_string(),
            terrain_colormap: "terrain".to_string(),
            thickness_clim: None,
            ice_threshold: 0.1,
            background: "white".to_string(),
            camera: CameraConfig::default(),
            frame_size: (1200, 800),
            frames_per_second: 5,
            time_label_prefix: "Year".to_string(),
            mesh_format: MeshFormat::Ply,
        }
    }
}

impl VizConfig {
    /// Parse a configuration from JSON text and validate it
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| Error::InvalidData(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Check value ranges and that colormaps and colors resolve
    pub fn validate(&self) -> Result<()> {
        if !(self.vertical_exaggeration.is_finite() && self.vertical_exaggeration > 0.0) {
            return Err(Error::InvalidData(
                "vertical_exaggeration must be a positive number".to_string(),
            ));
        }
        let (width, height) = self.frame_size;
        if width == 0 || height == 0 {
            return Err(Error::InvalidData("frame_size must be non-zero".to_string()));
        }
        if width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
            return Err(Error::InvalidData(format!(
                "frame_size {}x{} exceeds the {} pixel limit",
                width, height, MAX_FRAME_DIMENSION
            )));
        }
        if let Some((lo, hi)) = self.thickness_clim {
            if !(lo < hi) {
                return Err(Error::InvalidData(format!(
                    "thickness_clim must be increasing, got ({}, {})",
                    lo, hi
                )));
            }
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(Error::InvalidData("camera.fov must be within (0, 180)".to_string()));
        }
        if !(self.camera.zoom > 0.0) {
            return Err(Error::InvalidData("camera.zoom must be positive".to_string()));
        }
        self.ice_colormap()?;
        self.terrain_colormap()?;
        self.background_color()?;
        Ok(())
    }

    pub fn ice_colormap(&self) -> Result<Colormap> {
        Colormap::by_name(&self.ice_colormap)
    }

    pub fn terrain_colormap(&self) -> Result<Colormap> {
        Colormap::by_name(&self.terrain_colormap)
    }

    pub fn background_color(&self) -> Result<Rgb8> {
        let [r, g, b, _] = parse_color(&self.background)?;
        Ok([r, g, b])
    }

    /// Frame aspect ratio, width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.frame_size.0 as f32 / self.frame_size.1.max(1) as f32
    }

    pub fn with_vertical_exaggeration(mut self, factor: f32) -> Self {
        self.vertical_exaggeration = factor;
        self
    }

    pub fn with_ice_colormap(mut self, name: impl Into<String>) -> Self {
        self.ice_colormap = name.into();
        self
    }

    pub fn with_thickness_clim(mut self, min: f32, max: f32) -> Self {
        self.thickness_clim = Some((min, max));
        self
    }

    pub fn with_ice_threshold(mut self, threshold: f32) -> Self {
        self.ice_threshold = threshold;
        self
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = color.into();
        self
    }

    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = (width, height);
        self
    }

    pub fn with_frames_per_second(mut self, fps: u32) -> Self {
        self.frames_per_second = fps;
        self
    }

    pub fn with_mesh_format(mut self, format: MeshFormat) -> Self {
        self.mesh_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = VizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.background_color().unwrap(), [255, 255, 255]);
        assert_eq!(config.aspect_ratio(), 1.5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = VizConfig::from_json_str(
            r#"{ "vertical_exaggeration": 2.0, "camera": { "azimuth": 45.0 }, "mesh_format": "obj" }"#,
        )
        .unwrap();
        assert_eq!(config.vertical_exaggeration, 2.0);
        assert_eq!(config.camera.azimuth, 45.0);
        assert_eq!(config.camera.elevation, 30.0);
        assert_eq!(config.mesh_format, MeshFormat::Obj);
        assert_eq!(config.ice_colormap, "blues");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(VizConfig::from_json_str(r#"{ "vertical_exaggeration": 0.0 }"#).is_err());
        assert!(VizConfig::from_json_str(r#"{ "ice_colormap": "rainbow" }"#).is_err());
        assert!(VizConfig::from_json_str(r#"{ "thickness_clim": [10.0, 5.0] }"#).is_err());
        assert!(VizConfig::from_json_str(r#"{ "frame_size": [0, 10] }"#).is_err());
        assert!(VizConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let result = VizConfig::from_json_str(r#"{ "frame_size": [70000, 70000] }"#);
        assert!(matches!(result, Err(Error::InvalidData(m)) if m.contains("70000x70000")));

        let config = VizConfig::default().with_frame_size(MAX_FRAME_DIMENSION + 1, 10);
        assert!(matches!(config.validate(), Err(Error::InvalidData(_))));
        let config = VizConfig::default().with_frame_size(MAX_FRAME_DIMENSION, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = VizConfig::default()
            .with_vertical_exaggeration(3.0)
            .with_thickness_clim(0.0, 300.0)
            .with_frame_size(320, 240)
            .with_background("#000000");
        assert!(config.validate().is_ok());
        assert_eq!(config.thickness_clim, Some((0.0, 300.0)));
        assert_eq!(config.background_color().unwrap(), [0, 0, 0]);
    }
}
