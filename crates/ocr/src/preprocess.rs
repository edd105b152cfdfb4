use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not encode normalized image: {0}")]
    Encode(String),
}

/// Upper bound on either dimension before recognition; phone photos of
/// statements routinely exceed what Tesseract handles well.
const MAX_DIMENSION: u32 = 2600;

/// Normalize raw upload bytes (JPEG / PNG / WEBP / …) for recognition:
/// grayscale, full-range contrast stretch, bounded size, PNG output.
pub fn prepare_image(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let decoded = image::load_from_memory(data)?;
    let normalized = stretch_contrast(shrink(decoded));

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(normalized)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

fn shrink(img: DynamicImage) -> DynamicImage {
    if img.width().max(img.height()) > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, image::imageops::FilterType::Triangle)
    } else {
        img
    }
}

/// Remap grayscale levels so the darkest pixel lands at 0 and the
/// brightest at 255. A uniform image is passed through untouched.
fn stretch_contrast(img: DynamicImage) -> GrayImage {
    let gray = img.to_luma8();

    let (lo, hi) = gray
        .pixels()
        .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi == lo {
        return gray;
    }

    let span = (hi - lo) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let v = (gray.get_pixel(x, y)[0] - lo) as u32;
        Luma([(v * 255 / span) as u8])
    })
}
