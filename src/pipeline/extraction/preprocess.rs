//! Image preparation ahead of OCR.
//!
//! Report photos arrive in whatever container the phone or scanner produced.
//! Each one is decoded once, turned upright from its EXIF orientation,
//! reduced to grayscale and re-encoded as PNG, which every OCR backend reads.
//! A payload that does not decode is the only hard failure here.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::debug;

use super::types::PreparedImage;
use super::ExtractionError;

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial uploads.
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024; // 20 MB

/// Decode, orient and normalize an uploaded image for OCR.
pub fn prepare_image(image_bytes: &[u8]) -> Result<PreparedImage, ExtractionError> {
    validate_image_bytes(image_bytes)?;

    let img = image::load_from_memory(image_bytes)
        .map_err(|e| ExtractionError::ImageDecode(e.to_string()))?;

    let orientation = read_exif_orientation(image_bytes);
    let img = apply_orientation(img, orientation);

    let gray = DynamicImage::ImageLuma8(img.to_luma8());
    let (width, height) = gray.dimensions();
    let png_bytes = encode_png(&gray)?;

    debug!(
        input_size = image_bytes.len(),
        png_size = png_bytes.len(),
        width,
        height,
        orientation,
        "Image prepared for OCR"
    );

    Ok(PreparedImage {
        png_bytes,
        width,
        height,
        orientation,
    })
}

/// Reject payloads that cannot be a usable image before decoding them.
pub fn validate_image_bytes(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::EmptyImage);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageTooLarge(MAX_IMAGE_BYTES / (1024 * 1024)));
    }
    Ok(())
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
///
/// 1 = Normal, 2 = Mirrored, 3 = 180deg, 4 = Flipped V,
/// 5 = Mirrored + 90deg CW, 6 = 90deg CW, 7 = Mirrored + 270deg CW, 8 = 270deg CW
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}
