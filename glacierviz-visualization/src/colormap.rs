//! Colormaps and color parsing

use glacierviz_core::{Error, Result, Rgb8, Rgba8};

/// A piecewise-linear colormap over `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    stops: Vec<(f32, Rgb8)>,
}

const BLUES: &[(f32, Rgb8)] = &[
    (0.0, [247, 251, 255]),
    (0.25, [198, 219, 239]),
    (0.5, [107, 174, 214]),
    (0.75, [33, 113, 181]),
    (1.0, [8, 48, 107]),
];

const TERRAIN: &[(f32, Rgb8)] = &[
    (0.0, [51, 51, 153]),
    (0.15, [0, 153, 255]),
    (0.25, [0, 204, 102]),
    (0.5, [255, 255, 153]),
    (0.75, [128, 92, 84]),
    (1.0, [255, 255, 255]),
];

const VIRIDIS: &[(f32, Rgb8)] = &[
    (0.0, [68, 1, 84]),
    (0.25, [59, 82, 139]),
    (0.5, [33, 145, 140]),
    (0.75, [94, 201, 98]),
    (1.0, [253, 231, 37]),
];

const GREYS: &[(f32, Rgb8)] = &[(0.0, [255, 255, 255]), (1.0, [0, 0, 0])];

impl Colormap {
    /// Names accepted by [`Colormap::by_name`]
    pub const NAMES: &'static [&'static str] = &["blues", "terrain", "viridis", "greys"];

    /// Look up a named colormap; a `_r` suffix reverses it
    pub fn by_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let stops = match base {
            "blues" => BLUES,
            "terrain" => TERRAIN,
            "viridis" => VIRIDIS,
            "greys" | "grays" => GREYS,
            _ => {
                return Err(Error::Visualization(format!(
                    "Unknown colormap '{}', expected one of {:?}",
                    name,
                    Self::NAMES
                )))
            }
        };
        let map = Self::from_stops(&lower, stops.to_vec())?;
        Ok(if reversed { map.reversed() } else { map })
    }

    /// Build a colormap from `(position, color)` stops sorted by position in `[0, 1]`
    pub fn from_stops(name: impl Into<String>, stops: Vec<(f32, Rgb8)>) -> Result<Self> {
        let sorted = stops.windows(2).all(|w| w[0].0 <= w[1].0);
        let in_range = stops.iter().all(|(p, _)| (0.0..=1.0).contains(p));
        if stops.is_empty() || !sorted || !in_range {
            return Err(Error::Visualization(
                "Colormap stops must be non-empty, sorted and within [0, 1]".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            stops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same colormap running backwards
    pub fn reversed(&self) -> Self {
        let stops = self.stops.iter().rev().map(|&(p, c)| (1.0 - p, c)).collect();
        Self {
            name: self.name.clone(),
            stops,
        }
    }

    /// Color at normalized position `t`, clamped to `[0, 1]`
    pub fn sample(&self, t: f32) -> Rgb8 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let span = p1 - p0;
                let f = if span > 0.0 { (t - p0) / span } else { 1.0 };
                return lerp_rgb(c0, c1, f);
            }
        }
        self.stops[self.stops.len() - 1].1
    }

    /// Color of `value` mapped through the color limits `(min, max)`
    pub fn map(&self, value: f32, clim: (f32, f32)) -> Rgb8 {
        let (lo, hi) = clim;
        let span = hi - lo;
        let t = if span.abs() > f32::EPSILON { (value - lo) / span } else { 0.0 };
        self.sample(t)
    }

    /// Map a whole scalar field
    pub fn map_all(&self, values: &[f32], clim: (f32, f32)) -> Vec<Rgb8> {
        values.iter().map(|&v| self.map(v, clim)).collect()
    }
}

fn lerp_rgb(a: Rgb8, b: Rgb8, f: f32) -> Rgb8 {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = a[i] as f32 + (b[i] as f32 - a[i] as f32) * f;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Parse a color given by name (`"black"`), hex (`"#1f77b4"`, `"#1f77b480"`)
/// or as comma-separated 0-255 channels (`"51,51,51"`, `"51,51,51,255"`)
pub fn parse_color(text: &str) -> Result<Rgba8> {
    let s = text.trim().to_ascii_lowercase();
    let named = match s.as_str() {
        "black" => Some([0, 0, 0]),
        "white" => Some([255, 255, 255]),
        "red" => Some([255, 0, 0]),
        "green" => Some([0, 128, 0]),
        "blue" => Some([0, 0, 255]),
        "yellow" => Some([255, 255, 0]),
        "orange" => Some([255, 165, 0]),
        "gray" | "grey" => Some([128, 128, 128]),
        "lightgray" | "lightgrey" => Some([211, 211, 211]),
        "darkgray" | "darkgrey" => Some([169, 169, 169]),
        "skyblue" => Some([135, 206, 235]),
        "navy" => Some([0, 0, 128]),
        _ => None,
    };
    if let Some([r, g, b]) = named {
        return Ok([r, g, b, 255]);
    }

    let invalid = || Error::Visualization(format!("Invalid color '{}'", text));

    if let Some(hex) = s.strip_prefix('#') {
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        return Ok([channel(0)?, channel(2)?, channel(4)?, alpha]);
    }

    let channels: Vec<u8> = s
        .split(',')
        .map(|p| p.trim().parse::<u8>().map_err(|_| invalid()))
        .collect::<Result<_>>()?;
    match channels.as_slice() {
        [r, g, b] => Ok([*r, *g, *b, 255]),
        [r, g, b, a] => Ok([*r, *g, *b, *a]),
        _ => Err(invalid()),
    }
}

/// Convert `[0, 1]` float channels to 8-bit RGB
pub fn rgb_from_unit(rgb: [f32; 3]) -> Rgb8 {
    rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}
