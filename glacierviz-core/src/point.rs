//! Point and vector aliases

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// RGB color with 8 bits per channel
pub type Rgb8 = [u8; 3];

/// RGBA color with 8 bits per channel
pub type Rgba8 = [u8; 4];
