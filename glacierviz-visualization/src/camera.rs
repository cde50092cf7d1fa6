//! Camera utilities for 3D visualization
//!
//! Scenes are z-up: x/y are map coordinates, z is elevation. Azimuth is
//! measured clockwise from looking north (camera south of the target) and
//! elevation is the angle above the horizontal plane.

use glacierviz_core::{Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3, Vector4};

const MAX_ELEVATION: f32 = 89.0_f32 * std::f32::consts::PI / 180.0;

/// A perspective camera looking at glacier scenes
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    /// Place the camera so that the box `min..max` fills the view.
    ///
    /// Angles are in degrees; `zoom > 1` moves closer.
    pub fn fit_bounds(
        min: Point3f,
        max: Point3f,
        azimuth_deg: f32,
        elevation_deg: f32,
        zoom: f32,
        fov: f32,
        aspect_ratio: f32,
    ) -> Self {
        let target = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() / 2.0).max(1.0);

        // Fit the bounding sphere into the narrower of the two view angles
        let half_fov = (fov / 2.0).min((aspect_ratio * (fov / 2.0).tan()).atan());
        let distance = radius / half_fov.sin().max(1e-3) / zoom.max(1e-3);

        let position = target + direction(azimuth_deg.to_radians(), elevation_deg.to_radians()) * distance;
        Self::new(
            position,
            target,
            Vector3::z(),
            fov,
            aspect_ratio,
            (distance - radius).max(distance * 1e-3),
            distance + radius * 2.0,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far);
        perspective.into_inner()
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    /// Current `(azimuth, elevation)` in degrees
    pub fn angles(&self) -> (f32, f32) {
        let offset = self.position - self.target;
        let r = offset.norm().max(f32::EPSILON);
        let azimuth = offset.x.atan2(-offset.y);
        let elevation = (offset.z / r).clamp(-1.0, 1.0).asin();
        (azimuth.to_degrees(), elevation.to_degrees())
    }

    /// Rotate the camera around the target by angles in radians
    pub fn orbit(&mut self, horizontal: f32, vertical: f32) {
        let radius = self.distance();
        let (azimuth, elevation) = self.angles();
        let azimuth = azimuth.to_radians() + horizontal;
        let elevation = (elevation.to_radians() + vertical).clamp(-MAX_ELEVATION, MAX_ELEVATION);
        self.position = self.target + direction(azimuth, elevation) * radius;
    }

    /// Scale the distance to the target; `factor > 1` moves closer
    pub fn zoom(&mut self, factor: f32) {
        if factor <= 0.0 {
            return;
        }
        let offset = (self.position - self.target) / factor;
        self.position = self.target + offset;
    }

    /// Project a world point to pixel coordinates and NDC depth.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, point: &Point3f, width: u32, height: u32) -> Option<(f32, f32, f32)> {
        project_with(&self.view_projection(), point, width, height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(0.0, -5.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            std::f32::consts::FRAC_PI_6,
            3.0 / 2.0,
            0.1,
            100.0,
        )
    }
}

/// Project with a precomputed view-projection matrix
pub(crate) fn project_with(
    view_proj: &Matrix4<f32>,
    point: &Point3f,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = view_proj * Vector4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    let px = (ndc.x + 1.0) * 0.5 * width as f32;
    let py = (1.0 - ndc.y) * 0.5 * height as f32;
    Some((px, py, ndc.z))
}

fn direction(azimuth: f32, elevation: f32) -> Vector3f {
    Vector3f::new(
        elevation.cos() * azimuth.sin(),
        -elevation.cos() * azimuth.cos(),
        elevation.sin(),
    )
}
