//! Map annotations: labels, a north arrow, glacier outlines and legends

use crate::colormap::{parse_color, rgb_from_unit};
use crate::projection::lat_lon_to_map;
use crate::scene::{
    ArrowOverlay, Legend, LegendEntry, LegendLocation, Overlay, PointLabel, Scene, SceneActor,
};
use glacierviz_core::{
    Error, GlacierSeries, GridGeometry, Point3f, Result, Rgb8, Rgba8, TriangleMesh, Vector3f,
};
use ndarray::Array2;
use std::fmt::Debug;

/// Actor name used by [`OutlineAnnotation`]
pub const OUTLINE_ACTOR: &str = "outline";

/// What an annotation may look at while placing itself
#[derive(Debug, Clone, Copy)]
pub struct AnnotationContext<'s> {
    pub series: &'s GlacierSeries,
    pub geometry: &'s GridGeometry,
    /// Grid shape `(rows, cols)`
    pub shape: (usize, usize),
    /// Vertical exaggeration applied to every elevation
    pub z_scale: f32,
    /// The bedrock surface as currently built
    pub terrain: &'s TriangleMesh,
}

impl<'s> AnnotationContext<'s> {
    /// `(min, max)` of the grid x coordinates
    pub fn x_range(&self) -> (f32, f32) {
        let ((x0, x1), _) = self.geometry.extent(self.shape);
        (x0 as f32, x1 as f32)
    }

    /// `(min, max)` of the grid y coordinates
    pub fn y_range(&self) -> (f32, f32) {
        let (_, (y0, y1)) = self.geometry.extent(self.shape);
        (y0 as f32, y1 as f32)
    }

    /// `(min, max)` of the scaled bedrock elevation
    pub fn z_range(&self) -> (f32, f32) {
        let (lo, hi) = self.series.terrain_range().unwrap_or((0.0, 0.0));
        (lo * self.z_scale, hi * self.z_scale)
    }
}

/// Something that adds itself to a glacier scene
pub trait MapAnnotation: Debug {
    fn add_annotation(&self, ctx: &AnnotationContext<'_>, scene: &mut Scene) -> Result<()>;
}

/// Where a [`PointAnnotation`] sits on the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointLocation {
    /// Coordinates in the grid's CRS
    Map { x: f64, y: f64 },
    /// WGS84 degrees, projected into the grid's CRS when placed
    Geographic { lat: f64, lon: f64 },
}

/// A marker with text at a map position
#[derive(Debug, Clone, PartialEq)]
pub struct PointAnnotation {
    pub location: PointLocation,
    /// Height in meters, before vertical exaggeration
    pub height: f32,
    pub text: String,
    pub color: Rgba8,
    pub point_size: f32,
}

impl PointAnnotation {
    /// A point at map coordinates in the grid's CRS
    pub fn new(x: f64, y: f64, height: f32, text: impl Into<String>) -> Self {
        Self::at(PointLocation::Map { x, y }, height, text)
    }

    /// A point at WGS84 latitude and longitude in degrees
    pub fn from_lat_lon(lat: f64, lon: f64, height: f32, text: impl Into<String>) -> Self {
        Self::at(PointLocation::Geographic { lat, lon }, height, text)
    }

    fn at(location: PointLocation, height: f32, text: impl Into<String>) -> Self {
        Self {
            location,
            height,
            text: text.into(),
            color: [0, 0, 0, 255],
            point_size: 5.0,
        }
    }

    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = color;
        self
    }

    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    /// Map coordinates in the CRS of `geometry`
    pub fn map_position(&self, geometry: &GridGeometry) -> Result<(f64, f64)> {
        match self.location {
            PointLocation::Map { x, y } => Ok((x, y)),
            PointLocation::Geographic { lat, lon } => lat_lon_to_map(&geometry.crs, lat, lon),
        }
    }
}

impl MapAnnotation for PointAnnotation {
    fn add_annotation(&self, ctx: &AnnotationContext<'_>, scene: &mut Scene) -> Result<()> {
        let (x, y) = self.map_position(ctx.geometry)?;
        scene.add_overlay(Overlay::Label(PointLabel {
            position: Point3f::new(x as f32, y as f32, self.height * ctx.z_scale),
            text: self.text.clone(),
            color: self.color,
            point_size: self.point_size,
        }));
        Ok(())
    }
}

/// An arrow placed relative to the map extent, a north arrow by default
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowAnnotation {
    /// Position within the x extent, 0 is the minimum and 1 the maximum
    pub x_position: f32,
    pub y_position: f32,
    /// Position within the bedrock elevation range
    pub z_position: f32,
    pub direction: Vector3f,
    /// Length relative to the y extent
    pub magnitude: f32,
    pub text: String,
    /// Text anchor along the arrow, 0 at the tail and 1 at the tip
    pub text_position: f32,
    /// Channels in `[0, 1]`
    pub color: [f32; 3],
}

impl Default for ArrowAnnotation {
    fn default() -> Self {
        Self {
            x_position: 1.05,
            y_position: 0.5,
            z_position: 0.5,
            direction: Vector3f::new(0.0, 1.0, 0.0),
            magnitude: 0.2,
            text: "N".to_string(),
            text_position: 1.3,
            color: [0.2, 0.2, 0.2],
        }
    }
}

impl ArrowAnnotation {
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.x_position = x;
        self.y_position = y;
        self.z_position = z;
        self
    }

    pub fn with_direction(mut self, direction: Vector3f) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_magnitude(mut self, magnitude: f32) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>, position: f32) -> Self {
        self.text = text.into();
        self.text_position = position;
        self
    }

    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = color;
        self
    }

    /// World-space tail and absolute length for a scene
    pub fn placement(&self, ctx: &AnnotationContext<'_>) -> (Point3f, f32) {
        let at = |(lo, hi): (f32, f32), t: f32| lo + t * (hi - lo);
        let (y_lo, y_hi) = ctx.y_range();
        let tail = Point3f::new(
            at(ctx.x_range(), self.x_position),
            at((y_lo, y_hi), self.y_position),
            at(ctx.z_range(), self.z_position),
        );
        (tail, (y_hi - y_lo) * self.magnitude)
    }
}

impl MapAnnotation for ArrowAnnotation {
    fn add_annotation(&self, ctx: &AnnotationContext<'_>, scene: &mut Scene) -> Result<()> {
        let (tail, magnitude) = self.placement(ctx);
        let color = rgb_from_unit(self.color);
        let [r, g, b] = color;

        let label = (!self.text.is_empty()).then(|| PointLabel {
            position: tail + self.direction * magnitude * self.text_position,
            text: self.text.clone(),
            color: [r, g, b, 255],
            point_size: 0.0,
        });

        scene.add_overlay(Overlay::Arrow(ArrowOverlay {
            tail,
            direction: self.direction,
            magnitude,
            color,
            label,
        }));
        Ok(())
    }
}

/// A gridded outline painted over the bedrock surface
///
/// Non-zero mask cells are part of the outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineAnnotation {
    pub mask: Array2<f32>,
    pub color: Rgb8,
}

impl OutlineAnnotation {
    pub fn new(mask: Array2<f32>) -> Self {
        Self {
            mask,
            color: [0, 0, 0],
        }
    }

    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = color;
        self
    }

    /// Set the color from a name or hex string
    pub fn with_color_str(self, color: &str) -> Result<Self> {
        let [r, g, b, _] = parse_color(color)?;
        Ok(self.with_color([r, g, b]))
    }
}

impl MapAnnotation for OutlineAnnotation {
    fn add_annotation(&self, ctx: &AnnotationContext<'_>, scene: &mut Scene) -> Result<()> {
        if self.mask.dim() != ctx.shape {
            return Err(Error::ShapeMismatch {
                snapshot: 0,
                expected: ctx.shape,
                found: self.mask.dim(),
            });
        }

        let mut mesh = ctx.terrain.clone();
        mesh.set_colors(vec![self.color; mesh.vertex_count()]);
        let visible = self.mask.iter().map(|&m| m != 0.0 && !m.is_nan()).collect();

        scene.add_actor(SceneActor::new(OUTLINE_ACTOR, mesh).with_visibility(visible));
        Ok(())
    }
}

/// A legend box with colored entries
#[derive(Debug, Clone, PartialEq)]
pub struct LegendAnnotation {
    pub entries: Vec<LegendEntry>,
    pub background: Rgb8,
    /// Fraction of the frame `(width, height)`
    pub size: (f32, f32),
    pub location: LegendLocation,
}

impl Default for LegendAnnotation {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            background: [128, 128, 128],
            size: (0.2, 0.1),
            location: LegendLocation::LowerCenter,
        }
    }
}

impl LegendAnnotation {
    /// Build from `(label, color)` pairs with colors given as names or hex
    pub fn from_labels(labels: &[(&str, &str)]) -> Result<Self> {
        let entries = labels
            .iter()
            .map(|(label, color)| {
                Ok(LegendEntry {
                    label: label.to_string(),
                    color: parse_color(color)?,
                })
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            entries,
            ..Self::default()
        })
    }

    pub fn with_entry(mut self, label: impl Into<String>, color: Rgba8) -> Self {
        self.entries.push(LegendEntry {
            label: label.into(),
            color,
        });
        self
    }

    pub fn with_background(mut self, color: Rgb8) -> Self {
        self.background = color;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_location(mut self, location: LegendLocation) -> Self {
        self.location = location;
        self
    }
}

impl MapAnnotation for LegendAnnotation {
    fn add_annotation(&self, _ctx: &AnnotationContext<'_>, scene: &mut Scene) -> Result<()> {
        scene.add_overlay(Overlay::Legend(Legend {
            entries: self.entries.clone(),
            background: self.background,
            size: self.size,
            location: self.location,
        }));
        Ok(())
    }
}
