//! CPU rendering engine
//!
//! Meshes are rasterized with a depth buffer, Gouraud-interpolated vertex
//! colors and two-sided Lambert shading from face normals. Overlays are
//! drawn afterwards without depth testing. Text uses the 8x8 bitmap glyphs
//! from `font8x8`, scaled by whole pixels.

use crate::camera::project_with;
use crate::scene::{ArrowOverlay, Legend, LegendLocation, Overlay, PointLabel, Scene, SceneActor};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use glacierviz_core::{Rgb8, Rgba8, Vector3f};
use image::{Rgba, RgbaImage};
use nalgebra::{Matrix4, Vector2};

const DEFAULT_MESH_COLOR: Rgb8 = [200, 200, 200];
const GLYPH_SIZE: i64 = 8;

/// Largest frame width or height, in pixels
pub const MAX_FRAME_DIMENSION: u32 = 16384;

/// Software renderer producing RGBA frames
#[derive(Debug, Clone)]
pub struct Renderer {
    width: u32,
    height: u32,
    /// Direction towards the light
    light_direction: Vector3f,
    ambient: f32,
}

struct FrameTarget {
    image: RgbaImage,
    depth: Vec<f32>,
}

/// Pixel rectangle `[x0, y0, x1, y1)` that text is clipped to
type ClipRect = [i64; 4];

/// A projected vertex: pixel x, pixel y, NDC depth
type ScreenVertex = (f32, f32, f32);

impl Renderer {
    /// Create a new renderer for frames of the given size.
    ///
    /// Each dimension is clamped to `1..=MAX_FRAME_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.clamp(1, MAX_FRAME_DIMENSION),
            height: height.clamp(1, MAX_FRAME_DIMENSION),
            light_direction: Vector3f::new(-0.5, 0.5, 1.0).normalize(),
            ambient: 0.35,
        }
    }

    /// Frame size in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render a scene into a new image
    pub fn render(&self, scene: &Scene) -> RgbaImage {
        self.render_with_caption(scene, None)
    }

    /// Render a scene and write `caption` in the upper left corner
    pub fn render_with_caption(&self, scene: &Scene, caption: Option<&str>) -> RgbaImage {
        let [r, g, b] = scene.background;
        // Both sides are at most MAX_FRAME_DIMENSION, so the product fits
        let pixels = self.width as usize * self.height as usize;
        let mut target = FrameTarget {
            image: RgbaImage::from_pixel(self.width, self.height, Rgba([r, g, b, 255])),
            depth: vec![f32::INFINITY; pixels],
        };

        // The frame decides the aspect ratio, not the stored camera
        let mut camera = scene.camera.clone();
        camera.aspect_ratio = self.width as f32 / self.height as f32;
        let view_proj = camera.view_projection();

        for actor in &scene.actors {
            self.draw_actor(&mut target, &view_proj, actor);
        }
        for overlay in &scene.overlays {
            match overlay {
                Overlay::Label(label) => self.draw_label(&mut target, &view_proj, label),
                Overlay::Arrow(arrow) => self.draw_arrow(&mut target, &view_proj, arrow),
                Overlay::Legend(legend) => self.draw_legend(&mut target, legend),
            }
        }

        if let Some(text) = caption.filter(|t| !t.is_empty()) {
            let margin = 10.0;
            let color = contrasting_text(scene.background);
            target.draw_text(margin, margin, text, self.text_scale(), color, None);
        }

        target.image
    }

    /// Whole-pixel glyph scale for the frame height
    fn text_scale(&self) -> u32 {
        (self.height / 400).clamp(1, 4)
    }

    fn draw_actor(&self, target: &mut FrameTarget, view_proj: &Matrix4<f32>, actor: &SceneActor) {
        let mesh = &actor.mesh;
        let projected: Vec<Option<ScreenVertex>> = mesh
            .vertices
            .iter()
            .map(|v| project_with(view_proj, v, self.width, self.height))
            .collect();

        for face in &mesh.faces {
            if !actor.is_face_visible(face) {
                continue;
            }
            let Some(screen) = face_screen_vertices(&projected, face) else {
                continue;
            };

            let v0 = mesh.vertices[face[0]];
            let normal = (mesh.vertices[face[1]] - v0).cross(&(mesh.vertices[face[2]] - v0));
            let lambert = normal
                .try_normalize(f32::EPSILON)
                .map(|n| n.dot(&self.light_direction).abs())
                .unwrap_or(1.0);
            let shade = self.ambient + (1.0 - self.ambient) * lambert;

            let colors = face.map(|i| {
                mesh.colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .unwrap_or(DEFAULT_MESH_COLOR)
                    .map(|c| c as f32 * shade)
            });

            target.fill_triangle(screen, colors);
        }
    }

    fn draw_label(&self, target: &mut FrameTarget, view_proj: &Matrix4<f32>, label: &PointLabel) {
        let Some((x, y, _)) = project_with(view_proj, &label.position, self.width, self.height) else {
            return;
        };

        let scale = self.text_scale();
        let glyph = (GLYPH_SIZE * scale as i64) as f32;
        if label.point_size > 0.0 {
            let size = label.point_size;
            target.fill_rect(x - size / 2.0, y - size / 2.0, size, size, label.color);
            // Text sits to the right of the marker
            target.draw_text(x + size / 2.0 + 4.0, y - glyph / 2.0, &label.text, scale, label.color, None);
        } else {
            // Without a marker the text is centered on the point
            let width = text_width(&label.text, scale) as f32;
            target.draw_text(x - width / 2.0, y - glyph / 2.0, &label.text, scale, label.color, None);
        }
    }

    fn draw_arrow(&self, target: &mut FrameTarget, view_proj: &Matrix4<f32>, arrow: &ArrowOverlay) {
        let (Some(tail), Some(tip)) = (
            project_with(view_proj, &arrow.tail, self.width, self.height),
            project_with(view_proj, &arrow.tip(), self.width, self.height),
        ) else {
            return;
        };

        let [r, g, b] = arrow.color;
        let color = [r, g, b, 255];
        let tail = Vector2::new(tail.0, tail.1);
        let tip = Vector2::new(tip.0, tip.1);
        target.draw_line(tail, tip, 3.0, color);

        // Arrow head: two strokes folded back from the tip
        let shaft = tip - tail;
        let length = shaft.norm();
        if length > 1.0 {
            let back = -shaft / length * (length * 0.25).max(4.0);
            for angle in [0.5_f32, -0.5] {
                let (s, c) = angle.sin_cos();
                let stroke = Vector2::new(back.x * c - back.y * s, back.x * s + back.y * c);
                target.draw_line(tip, tip + stroke, 3.0, color);
            }
        }

        if let Some(label) = &arrow.label {
            self.draw_label(target, view_proj, label);
        }
    }

    fn draw_legend(&self, target: &mut FrameTarget, legend: &Legend) {
        let margin = 10.0;
        let (w, h) = (self.width as f32, self.height as f32);
        let box_w = (legend.size.0 * w).max(1.0);
        let box_h = (legend.size.1 * h).max(1.0);

        let x = match legend.location {
            LegendLocation::LowerLeft | LegendLocation::UpperLeft => margin,
            LegendLocation::LowerCenter | LegendLocation::UpperCenter => (w - box_w) / 2.0,
            LegendLocation::LowerRight | LegendLocation::UpperRight => w - box_w - margin,
        };
        let y = match legend.location {
            LegendLocation::UpperLeft | LegendLocation::UpperCenter | LegendLocation::UpperRight => margin,
            _ => h - box_h - margin,
        };

        let [r, g, b] = legend.background;
        target.fill_rect(x, y, box_w, box_h, [r, g, b, 255]);

        if legend.entries.is_empty() {
            return;
        }
        let row_h = box_h / legend.entries.len() as f32;
        let swatch = (row_h * 0.6).min(box_w * 0.3);
        let pad = swatch * 0.5;
        let text_x = x + pad * 2.0 + swatch;
        let text_color = contrasting_text(legend.background);
        let clip = [
            x.round() as i64,
            y.round() as i64,
            (x + box_w).round() as i64,
            (y + box_h).round() as i64,
        ];

        for (i, entry) in legend.entries.iter().enumerate() {
            let row_y = y + row_h * i as f32;
            target.fill_rect(x + pad, row_y + (row_h - swatch) / 2.0, swatch, swatch, entry.color);

            // Largest glyph scale that keeps the label inside its row
            let available = (x + box_w - pad - text_x).max(0.0);
            let chars = entry.label.chars().count().max(1) as f32;
            let by_height = row_h * 0.6 / GLYPH_SIZE as f32;
            let by_width = available / (chars * GLYPH_SIZE as f32);
            let scale = by_height.min(by_width).floor().clamp(1.0, 4.0) as u32;
            let glyph = (GLYPH_SIZE * scale as i64) as f32;
            target.draw_text(text_x, row_y + (row_h - glyph) / 2.0, &entry.label, scale, text_color, Some(clip));
        }
    }
}

fn face_screen_vertices(projected: &[Option<ScreenVertex>], face: &[usize; 3]) -> Option<[ScreenVertex; 3]> {
    let a = projected.get(face[0]).copied().flatten()?;
    let b = projected.get(face[1]).copied().flatten()?;
    let c = projected.get(face[2]).copied().flatten()?;
    let finite = [a, b, c]
        .iter()
        .all(|(x, y, z)| x.is_finite() && y.is_finite() && z.is_finite());
    finite.then_some([a, b, c])
}

/// Black text on light backgrounds, white on dark ones
fn contrasting_text(background: Rgb8) -> Rgba8 {
    let [r, g, b] = background.map(|c| c as f32);
    let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
    if luminance > 140.0 {
        [0, 0, 0, 255]
    } else {
        [255, 255, 255, 255]
    }
}

fn text_width(text: &str, scale: u32) -> i64 {
    text.chars().count() as i64 * GLYPH_SIZE * scale as i64
}

fn glyph_bitmap(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (p.0 - a.0) * (b.1 - a.1) - (p.1 - a.1) * (b.0 - a.0)
}

impl FrameTarget {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_triangle(&mut self, v: [ScreenVertex; 3], colors: [[f32; 3]; 3]) {
        let p = v.map(|(x, y, _)| (x, y));
        let area = edge(p[0], p[1], p[2]);
        if area.abs() < 1e-8 {
            return;
        }

        let max_x = self.width() as f32 - 1.0;
        let max_y = self.height() as f32 - 1.0;
        let min_px = p.iter().map(|q| q.0).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_px = p.iter().map(|q| q.0).fold(f32::NEG_INFINITY, f32::max).ceil().min(max_x);
        let min_py = p.iter().map(|q| q.1).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_py = p.iter().map(|q| q.1).fold(f32::NEG_INFINITY, f32::max).ceil().min(max_y);
        if min_px > max_px || min_py > max_py {
            return;
        }

        for py in min_py as u32..=max_py as u32 {
            for px in min_px as u32..=max_px as u32 {
                let sample = (px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(p[1], p[2], sample) / area;
                let w1 = edge(p[2], p[0], sample) / area;
                let w2 = edge(p[0], p[1], sample) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v[0].2 + w1 * v[1].2 + w2 * v[2].2;
                if !(-1.0..=1.0).contains(&depth) {
                    continue;
                }
                let index = (py * self.width() + px) as usize;
                // Ties go to the later actor
                if depth > self.depth[index] {
                    continue;
                }
                self.depth[index] = depth;

                let mut rgb = [0u8; 3];
                for (c, out) in rgb.iter_mut().enumerate() {
                    let value = w0 * colors[0][c] + w1 * colors[1][c] + w2 * colors[2][c];
                    *out = value.round().clamp(0.0, 255.0) as u8;
                }
                self.image.put_pixel(px, py, Rgba([rgb[0], rgb[1], rgb[2], 255]));
            }
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba8) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let alpha = color[3] as f32 / 255.0;
        for c in 0..3 {
            let mixed = color[c] as f32 * alpha + pixel.0[c] as f32 * (1.0 - alpha);
            pixel.0[c] = mixed.round() as u8;
        }
        pixel.0[3] = 255;
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba8) {
        let x0 = x.round() as i64;
        let y0 = y.round() as i64;
        let x1 = (x + w).round() as i64;
        let y1 = (y + h).round() as i64;
        for py in y0..y1.max(y0 + 1) {
            for px in x0..x1.max(x0 + 1) {
                self.blend(px, py, color);
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`
    fn draw_text(&mut self, x: f32, y: f32, text: &str, scale: u32, color: Rgba8, clip: Option<ClipRect>) {
        let scale = scale.max(1) as i64;
        let (x0, y0) = (x.round() as i64, y.round() as i64);
        let [cx0, cy0, cx1, cy1] = clip.unwrap_or([0, 0, self.width() as i64, self.height() as i64]);

        for (n, c) in text.chars().enumerate() {
            let gx = x0 + n as i64 * GLYPH_SIZE * scale;
            if gx >= cx1 {
                break;
            }
            for (row, bits) in glyph_bitmap(c).iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    // Bit 0 is the leftmost pixel
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let px = gx + col * scale + dx;
                            let py = y0 + row as i64 * scale + dy;
                            if (cx0..cx1).contains(&px) && (cy0..cy1).contains(&py) {
                                self.blend(px, py, color);
                            }
                        }
                    }
                }
            }
        }
    }

    fn draw_line(&mut self, from: Vector2<f32>, to: Vector2<f32>, thickness: f32, color: Rgba8) {
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        // Bound the work for lines projected far outside the frame
        let steps = steps.min(4 * (self.width() + self.height()) as usize);
        let half = thickness / 2.0;
        for i in 0..=steps {
            let point = from + delta * (i as f32 / steps as f32);
            self.fill_rect(point.x - half, point.y - half, thickness, thickness, color);
        }
    }
}
