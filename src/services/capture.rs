use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;

/// Normalize captured image bytes to JPEG.
///
/// JPEG input is passed through untouched. Other supported formats are
/// decoded and re-encoded at `quality` (1-100).
pub fn to_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, CaptureError> {
    let format = image::guess_format(bytes).map_err(CaptureError::Decode)?;
    if format == ImageFormat::Jpeg {
        return Ok(bytes.to_vec());
    }

    let decoded = image::load_from_memory_with_format(bytes, format).map_err(CaptureError::Decode)?;
    let rgb = decoded.to_rgb8();

    let mut jpeg = Vec::with_capacity(bytes.len() / 4);
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(CaptureError::Encode)?;

    tracing::debug!(
        source_format = ?format,
        source_bytes = bytes.len(),
        jpeg_bytes = jpeg.len(),
        quality,
        "Re-encoded capture as JPEG"
    );
    Ok(jpeg)
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Unrecognized or corrupt image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("JPEG encoding failed: {0}")]
    Encode(#[source] image::ImageError),
}
