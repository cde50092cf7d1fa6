//! Still image and animation output for rendered frames

use crate::error::IoError;
use glacierviz_core::{Error, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{DynamicImage, Delay, Frame, ImageError, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Still image formats accepted by [`write_frame`]
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Write a rendered frame, picking the format from the file extension.
///
/// Formats without an alpha channel (JPEG, BMP) are written as RGB.
pub fn write_frame<P: AsRef<Path>>(frame: &RgbaImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = crate::extension(path).unwrap_or_default();
    if !FRAME_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::UnsupportedFormat(format!(
            "Unsupported image format: {:?}",
            path.extension()
        )));
    }

    let result = match ext.as_str() {
        "jpg" | "jpeg" | "bmp" => DynamicImage::ImageRgba8(frame.clone()).to_rgb8().save(path),
        _ => frame.save(path),
    };
    result.map_err(image_error)?;

    tracing::info!(
        "Wrote {}x{} frame to {}",
        frame.width(),
        frame.height(),
        path.display()
    );
    Ok(())
}

/// Write frames as an endlessly looping animated GIF
pub fn write_gif<P, I>(frames: I, frames_per_second: u32, path: P) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = RgbaImage>,
{
    let path = path.as_ref();
    if crate::extension(path).as_deref() != Some("gif") {
        return Err(Error::UnsupportedFormat(format!(
            "Animations are written as GIF, got {:?}",
            path.extension()
        )));
    }

    let file = File::create(path)?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite).map_err(image_error)?;

    let delay = Delay::from_numer_denom_ms(1000, frames_per_second.max(1));
    let mut count = 0usize;
    let frames = frames.into_iter().map(|buffer| {
        count += 1;
        Frame::from_parts(buffer, 0, 0, delay)
    });
    encoder.encode_frames(frames).map_err(image_error)?;

    tracing::info!("Wrote {} animation frames to {}", count, path.display());
    Ok(())
}

fn image_error(e: ImageError) -> Error {
    match e {
        ImageError::IoError(io) => Error::Io(io),
        other => IoError::WriteError {
            message: other.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(size: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 80, 255])
            }
        })
    }

    #[test]
    fn test_write_png_and_jpeg() {
        for name in ["glacierviz_frame.png", "glacierviz_frame.jpg"] {
            let path = std::env::temp_dir().join(name);
            write_frame(&checker(8), &path).unwrap();
            let loaded = image::open(&path).unwrap();
            assert_eq!(loaded.width(), 8);
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn test_unwritable_location_is_io_error() {
        let path = std::env::temp_dir()
            .join("glacierviz_missing_dir")
            .join("nested")
            .join("frame.png");
        assert!(matches!(write_frame(&checker(4), &path), Err(Error::Io(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let result = write_frame(&checker(4), "frame.xyz");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_write_gif() {
        let path = std::env::temp_dir().join("glacierviz_animation.gif");
        write_gif(vec![checker(6), checker(6), checker(6)], 5, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        let _ = std::fs::remove_file(path);

        assert!(write_gif(vec![checker(2)], 5, "animation.png").is_err());
    }
}
