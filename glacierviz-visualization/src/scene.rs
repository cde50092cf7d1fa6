//! Scene graph: mesh actors, overlays and the camera

use crate::camera::Camera;
use crate::renderer::Renderer;
use glacierviz_core::{union_bounds, Point3f, Rgb8, Rgba8, TriangleMesh, Vector3f};
use image::RgbaImage;

/// Actor name of the bedrock surface
pub const TERRAIN_ACTOR: &str = "terrain";
/// Actor name of the ice surface
pub const ICE_ACTOR: &str = "ice";

/// A mesh placed in the scene
#[derive(Debug, Clone)]
pub struct SceneActor {
    pub name: String,
    pub mesh: TriangleMesh,
    /// Per-vertex visibility; a face is drawn when any of its vertices is visible
    pub visible: Option<Vec<bool>>,
}

impl SceneActor {
    pub fn new(name: impl Into<String>, mesh: TriangleMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            visible: None,
        }
    }

    pub fn with_visibility(mut self, visible: Vec<bool>) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn is_face_visible(&self, face: &[usize; 3]) -> bool {
        match &self.visible {
            Some(mask) => face.iter().any(|&i| mask.get(i).copied().unwrap_or(false)),
            None => true,
        }
    }

    /// Number of faces that will be drawn
    pub fn visible_face_count(&self) -> usize {
        self.mesh.faces.iter().filter(|f| self.is_face_visible(f)).count()
    }

    /// Copy of the mesh keeping only the drawn faces
    pub fn visible_mesh(&self) -> TriangleMesh {
        let mut mesh = self.mesh.clone();
        if self.visible.is_some() {
            mesh.faces.retain(|f| self.is_face_visible(f));
        }
        mesh
    }
}

/// A text label anchored at a world position
#[derive(Debug, Clone, PartialEq)]
pub struct PointLabel {
    pub position: Point3f,
    pub text: String,
    pub color: Rgba8,
    /// Marker size in pixels; zero hides the marker
    pub point_size: f32,
}

/// An arrow drawn in world space
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowOverlay {
    pub tail: Point3f,
    pub direction: Vector3f,
    pub magnitude: f32,
    pub color: Rgb8,
    pub label: Option<PointLabel>,
}

impl ArrowOverlay {
    pub fn tip(&self) -> Point3f {
        self.tail + self.direction * self.magnitude
    }
}

/// Where a legend is anchored in the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LegendLocation {
    #[default]
    LowerCenter,
    LowerLeft,
    LowerRight,
    UpperCenter,
    UpperLeft,
    UpperRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgba8,
}

/// A legend box with one color swatch per entry
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub background: Rgb8,
    /// Fraction of the frame `(width, height)`
    pub size: (f32, f32),
    pub location: LegendLocation,
}

/// Screen-space annotations drawn over the meshes
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Label(PointLabel),
    Arrow(ArrowOverlay),
    Legend(Legend),
}

/// Everything needed to draw one frame
#[derive(Debug, Clone)]
pub struct Scene {
    pub actors: Vec<SceneActor>,
    pub overlays: Vec<Overlay>,
    pub camera: Camera,
    pub background: Rgb8,
}

impl Scene {
    pub fn new(background: Rgb8) -> Self {
        Self {
            actors: Vec::new(),
            overlays: Vec::new(),
            camera: Camera::default(),
            background,
        }
    }

    /// Add an actor, replacing one with the same name
    pub fn add_actor(&mut self, actor: SceneActor) {
        match self.actors.iter_mut().find(|a| a.name == actor.name) {
            Some(existing) => *existing = actor,
            None => self.actors.push(actor),
        }
    }

    pub fn add_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    pub fn actor(&self, name: &str) -> Option<&SceneActor> {
        self.actors.iter().find(|a| a.name == name)
    }

    pub fn actor_mut(&mut self, name: &str) -> Option<&mut SceneActor> {
        self.actors.iter_mut().find(|a| a.name == name)
    }

    /// Bounding box of all actor meshes
    pub fn bounds(&self) -> Option<(Point3f, Point3f)> {
        union_bounds(self.actors.iter().map(|a| &a.mesh))
    }
}

/// Read-only view of a bound scene at its active time step
#[derive(Debug, Clone, Copy)]
pub struct SceneHandle<'s> {
    pub(crate) scene: &'s Scene,
    pub(crate) time_index: usize,
    pub(crate) time: f64,
    pub(crate) label_prefix: &'s str,
}

impl<'s> SceneHandle<'s> {
    pub fn scene(&self) -> &'s Scene {
        self.scene
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Human readable time, e.g. `"Year 2003"` or `"Year 2003.50"`
    pub fn time_label(&self) -> String {
        format_time_label(self.label_prefix, self.time)
    }

    pub fn terrain_mesh(&self) -> Option<&'s TriangleMesh> {
        self.scene.actor(TERRAIN_ACTOR).map(|a| &a.mesh)
    }

    pub fn ice_mesh(&self) -> Option<&'s TriangleMesh> {
        self.scene.actor(ICE_ACTOR).map(|a| &a.mesh)
    }

    /// Ice thickness of the active snapshot, in grid row-major order
    pub fn ice_thickness(&self) -> &'s [f32] {
        self.ice_mesh()
            .and_then(|m| m.scalars.as_deref())
            .unwrap_or(&[])
    }

    pub fn actors(&self) -> &'s [SceneActor] {
        &self.scene.actors
    }

    pub fn overlays(&self) -> &'s [Overlay] {
        &self.scene.overlays
    }

    pub fn camera(&self) -> &'s Camera {
        &self.scene.camera
    }

    /// Draw the scene into a new image, captioned with the time label
    pub fn rasterize(&self, width: u32, height: u32) -> RgbaImage {
        Renderer::new(width, height).render_with_caption(self.scene, Some(&self.time_label()))
    }
}

pub(crate) fn format_time_label(prefix: &str, time: f64) -> String {
    let value = if time.fract() == 0.0 {
        format!("{:.0}", time)
    } else {
        format!("{:.2}", time)
    };
    if prefix.is_empty() {
        value
    } else {
        format!("{} {}", prefix, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_face_visibility() {
        let actor = SceneActor::new(ICE_ACTOR, quad()).with_visibility(vec![false, true, false, false]);
        assert!(actor.is_face_visible(&[0, 1, 2]));
        assert!(!actor.is_face_visible(&[0, 2, 3]));
        assert_eq!(actor.visible_face_count(), 1);
        assert_eq!(actor.visible_mesh().faces, vec![[0, 1, 2]]);
        assert_eq!(actor.visible_mesh().vertex_count(), 4);
    }

    #[test]
    fn test_add_actor_replaces_by_name() {
        let mut scene = Scene::new([255, 255, 255]);
        scene.add_actor(SceneActor::new(TERRAIN_ACTOR, quad()));
        scene.add_actor(SceneActor::new(TERRAIN_ACTOR, TriangleMesh::new()));
        assert_eq!(scene.actors.len(), 1);
        assert!(scene.actor(TERRAIN_ACTOR).unwrap().mesh.is_empty());
    }

    #[test]
    fn test_time_label_formatting() {
        assert_eq!(format_time_label("Year", 2003.0), "Year 2003");
        assert_eq!(format_time_label("Year", 2003.5), "Year 2003.50");
        assert_eq!(format_time_label("", 12.0), "12");
    }
}
