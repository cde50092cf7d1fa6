//! The glacier scene adapter
//!
//! [`GlacierSceneAdapter`] binds a borrowed [`GlacierSeries`], keeps a scene
//! with a bedrock and an ice surface in sync with the active time step and
//! exports frames, animations and meshes.
//!
//! ```no_run
//! use glacierviz_visualization::{GlacierSceneAdapter, VizConfig};
//!
//! # fn main() -> glacierviz_core::Result<()> {
//! let series = glacierviz_io::read_series("glacier.json")?;
//! let mut adapter = GlacierSceneAdapter::new(VizConfig::default());
//! adapter.bind(&series)?;
//! adapter.set_time_index(1)?;
//! adapter.export_frame("glacier_1.png")?;
//! # Ok(())
//! # }
//! ```

use crate::annotations::{AnnotationContext, MapAnnotation};
use crate::camera::Camera;
use crate::colormap::Colormap;
use crate::config::VizConfig;
use crate::scene::{Scene, SceneActor, SceneHandle, ICE_ACTOR, TERRAIN_ACTOR};
use glacierviz_core::{
    grid_scalars, grid_surface, update_surface_heights, Error, GlacierSeries, Result,
};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Builds and updates a renderable scene from a glacier series
#[derive(Debug, Default)]
pub struct GlacierSceneAdapter<'a> {
    config: VizConfig,
    annotations: Vec<Box<dyn MapAnnotation>>,
    state: Option<SceneState<'a>>,
}

/// Everything held while a series is bound
#[derive(Debug)]
struct SceneState<'a> {
    series: &'a GlacierSeries,
    time_index: usize,
    terrain_varies: bool,
    scene: Scene,
    ice_colormap: Colormap,
    terrain_colormap: Colormap,
    ice_clim: (f32, f32),
    terrain_clim: (f32, f32),
}

impl<'a> GlacierSceneAdapter<'a> {
    pub fn new(config: VizConfig) -> Self {
        Self {
            config,
            annotations: Vec::new(),
            state: None,
        }
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn is_bound(&self) -> bool {
        self.state.is_some()
    }

    /// Active time index, `None` while unbound
    pub fn time_index(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.time_index)
    }

    /// Bind a series and build its scene at time index 0.
    ///
    /// On failure the adapter keeps whatever it had bound before.
    pub fn bind(&mut self, series: &'a GlacierSeries) -> Result<()> {
        self.config.validate()?;
        let shape = series.validate_shapes()?;

        let mut state = SceneState {
            series,
            time_index: 0,
            terrain_varies: series.terrain_varies(),
            scene: Scene::new(self.config.background_color()?),
            ice_colormap: self.config.ice_colormap()?,
            terrain_colormap: self.config.terrain_colormap()?,
            ice_clim: self
                .config
                .thickness_clim
                .unwrap_or((0.0, series.max_thickness().unwrap_or(0.0))),
            terrain_clim: series.terrain_range().unwrap_or((0.0, 0.0)),
        };
        state.build_terrain(&self.config);
        state.build_ice(&self.config)?;
        state.reset_annotations(&self.annotations, &self.config)?;
        state.fit_camera(&self.config);

        tracing::info!(
            "Bound glacier series: {} snapshots on a {}x{} grid, terrain {}",
            series.len(),
            shape.0,
            shape.1,
            if state.terrain_varies { "varying" } else { "static" }
        );
        self.state = Some(state);
        Ok(())
    }

    /// Switch the scene to another snapshot
    pub fn set_time_index(&mut self, index: i64) -> Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Err(Error::IndexOutOfRange { index, len: 0 });
        };
        let len = state.series.len();
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i < len)
            .ok_or(Error::IndexOutOfRange { index, len })?;

        if index == state.time_index {
            return Ok(());
        }
        state.time_index = index;
        if state.terrain_varies {
            state.build_terrain(&self.config);
        }
        state.build_ice(&self.config)?;
        if state.terrain_varies {
            state.reset_annotations(&self.annotations, &self.config)?;
        }

        tracing::debug!(
            "Time index set to {} ({})",
            index,
            state.series[index].time
        );
        Ok(())
    }

    /// Read-only view of the scene at the active time step
    pub fn render(&self) -> Result<SceneHandle<'_>> {
        let state = self.state.as_ref().ok_or(Error::NotBound)?;
        Ok(SceneHandle {
            scene: &state.scene,
            time_index: state.time_index,
            time: state.series[state.time_index].time,
            label_prefix: &self.config.time_label_prefix,
        })
    }

    /// Rasterize the active time step and write it as an image
    pub fn export_frame<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let (width, height) = self.config.frame_size;
        let frame = self.render()?.rasterize(width, height);
        glacierviz_io::write_frame(&frame, path)
    }

    /// Render every time step into an animated GIF.
    ///
    /// The active time index is restored afterwards, also on failure.
    pub fn export_animation<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let (previous, len) = match &self.state {
            Some(state) => (state.time_index, state.series.len()),
            None => return Err(Error::NotBound),
        };
        let (width, height) = self.config.frame_size;

        let frames = (0..len)
            .map(|i| -> Result<RgbaImage> {
                self.set_time_index(i as i64)?;
                Ok(self.render()?.rasterize(width, height))
            })
            .collect::<Result<Vec<_>>>();
        self.set_time_index(previous as i64)?;

        glacierviz_io::write_gif(frames?, self.config.frames_per_second, path)
    }

    /// Write the bedrock and the visible ice surface of the active time step.
    ///
    /// Files are named `<actor>_<index>.<ext>` inside `dir`, which is
    /// created if needed. Returns the written paths.
    pub fn export_meshes<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let state = self.state.as_ref().ok_or(Error::NotBound)?;
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for name in [TERRAIN_ACTOR, ICE_ACTOR] {
            let Some(actor) = state.scene.actor(name) else {
                continue;
            };
            let path = dir.join(format!(
                "{}_{:04}.{}",
                name,
                state.time_index,
                self.config.mesh_format.extension()
            ));
            glacierviz_io::write_mesh(&actor.visible_mesh(), &path)?;
            written.push(path);
        }

        tracing::info!("Exported {} meshes to {}", written.len(), dir.display());
        Ok(written)
    }

    /// Register an annotation; applied now if bound and on every later bind
    pub fn add_annotation<A: MapAnnotation + 'static>(&mut self, annotation: A) -> Result<()> {
        let annotation: Box<dyn MapAnnotation> = Box::new(annotation);
        if let Some(state) = self.state.as_mut() {
            state.annotate(std::slice::from_ref(&annotation), &self.config)?;
        }
        self.annotations.push(annotation);
        Ok(())
    }

    /// Mutable access to the camera for orbiting and zooming
    pub fn camera_mut(&mut self) -> Result<&mut Camera> {
        self.state
            .as_mut()
            .map(|s| &mut s.scene.camera)
            .ok_or(Error::NotBound)
    }

    /// Re-fit the camera to the scene using the configured angles
    pub fn reset_camera(&mut self) -> Result<()> {
        let state = self.state.as_mut().ok_or(Error::NotBound)?;
        state.fit_camera(&self.config);
        Ok(())
    }

    /// Drop the bound series and its scene
    pub fn release(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!("Released glacier series");
        }
    }
}

impl<'a> SceneState<'a> {
    fn build_terrain(&mut self, config: &VizConfig) {
        let snapshot = &self.series[self.time_index];
        let mut mesh = grid_surface(
            &snapshot.geometry,
            &snapshot.terrain,
            config.vertical_exaggeration,
        );
        let scalars = grid_scalars(&snapshot.terrain);
        mesh.set_colors(self.terrain_colormap.map_all(&scalars, self.terrain_clim));
        mesh.set_scalars(scalars);

        self.scene.add_actor(SceneActor::new(TERRAIN_ACTOR, mesh));
        tracing::debug!("Built terrain surface for time index {}", self.time_index);
    }

    fn build_ice(&mut self, config: &VizConfig) -> Result<()> {
        let snapshot = &self.series[self.time_index];
        let surface = snapshot.surface_elevation();
        let thickness = grid_scalars(&snapshot.thickness);
        let colors = self.ice_colormap.map_all(&thickness, self.ice_clim);
        let visible: Vec<bool> = thickness.iter().map(|&t| t > config.ice_threshold).collect();

        match self.scene.actor_mut(ICE_ACTOR) {
            Some(actor) => {
                update_surface_heights(&mut actor.mesh, &surface, config.vertical_exaggeration)?;
                actor.mesh.set_colors(colors);
                actor.mesh.set_scalars(thickness);
                actor.visible = Some(visible);
            }
            None => {
                let mut mesh = grid_surface(&snapshot.geometry, &surface, config.vertical_exaggeration);
                mesh.set_colors(colors);
                mesh.set_scalars(thickness);
                self.scene.add_actor(SceneActor::new(ICE_ACTOR, mesh).with_visibility(visible));
            }
        }
        Ok(())
    }

    /// Remove annotation actors and overlays, then apply `annotations` again
    fn reset_annotations(
        &mut self,
        annotations: &[Box<dyn MapAnnotation>],
        config: &VizConfig,
    ) -> Result<()> {
        self.scene
            .actors
            .retain(|a| a.name == TERRAIN_ACTOR || a.name == ICE_ACTOR);
        self.scene.overlays.clear();
        self.annotate(annotations, config)
    }

    fn annotate(&mut self, annotations: &[Box<dyn MapAnnotation>], config: &VizConfig) -> Result<()> {
        if annotations.is_empty() {
            return Ok(());
        }
        let snapshot = &self.series[self.time_index];
        let terrain = self
            .scene
            .actor(TERRAIN_ACTOR)
            .map(|a| a.mesh.clone())
            .unwrap_or_default();
        let ctx = AnnotationContext {
            series: self.series,
            geometry: &snapshot.geometry,
            shape: snapshot.shape(),
            z_scale: config.vertical_exaggeration,
            terrain: &terrain,
        };
        for annotation in annotations {
            annotation.add_annotation(&ctx, &mut self.scene)?;
        }
        Ok(())
    }

    fn fit_camera(&mut self, config: &VizConfig) {
        let Some((min, max)) = self.scene.bounds() else {
            return;
        };
        let camera = &config.camera;
        self.scene.camera = Camera::fit_bounds(
            min,
            max,
            camera.azimuth,
            camera.elevation,
            camera.zoom,
            camera.fov.to_radians(),
            config.aspect_ratio(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glacierviz_core::{GlacierSnapshot, GridGeometry};
    use ndarray::Array2;

    fn varying_terrain_series() -> GlacierSeries {
        let geometry = GridGeometry::new((0.0, 0.0), (50.0, 50.0), "");
        let snapshots = (0..2)
            .map(|i| {
                GlacierSnapshot::new(
                    2000.0 + i as f64,
                    Array2::from_elem((4, 4), 100.0 + i as f32 * 10.0),
                    Array2::from_elem((4, 4), 5.0),
                    geometry.clone(),
                )
            })
            .collect();
        GlacierSeries::new(snapshots).unwrap()
    }

    #[test]
    fn test_varying_terrain_is_rebuilt() {
        let series = varying_terrain_series();
        let mut adapter = GlacierSceneAdapter::new(VizConfig::default().with_vertical_exaggeration(2.0));
        adapter.bind(&series).unwrap();

        adapter.set_time_index(1).unwrap();
        let handle = adapter.render().unwrap();
        let terrain = handle.terrain_mesh().unwrap();
        assert!(terrain.vertices.iter().all(|v| v.z == 220.0));
        let ice = handle.ice_mesh().unwrap();
        assert!(ice.vertices.iter().all(|v| v.z == 230.0));
    }

    #[test]
    fn test_failed_bind_keeps_previous_binding() {
        let good = varying_terrain_series();
        let bad = GlacierSeries::new(vec![GlacierSnapshot::new(
            2000.0,
            Array2::zeros((2, 2)),
            Array2::zeros((3, 2)),
            GridGeometry::default(),
        )])
        .unwrap();

        let mut adapter = GlacierSceneAdapter::default();
        adapter.bind(&good).unwrap();
        adapter.set_time_index(1).unwrap();
        assert!(adapter.bind(&bad).is_err());
        assert_eq!(adapter.time_index(), Some(1));
    }

    #[test]
    fn test_camera_reset_restores_fit() {
        let series = varying_terrain_series();
        let mut adapter = GlacierSceneAdapter::default();
        adapter.bind(&series).unwrap();
        let fitted = adapter.render().unwrap().camera().clone();

        adapter.camera_mut().unwrap().zoom(3.0);
        assert_ne!(adapter.render().unwrap().camera(), &fitted);
        adapter.reset_camera().unwrap();
        assert_eq!(adapter.render().unwrap().camera(), &fitted);
    }

    #[test]
    fn test_release_unbinds() {
        let series = varying_terrain_series();
        let mut adapter = GlacierSceneAdapter::default();
        adapter.bind(&series).unwrap();
        adapter.release();
        assert!(!adapter.is_bound());
        assert!(matches!(adapter.render(), Err(Error::NotBound)));
        assert!(matches!(adapter.camera_mut(), Err(Error::NotBound)));
    }
}
