use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use follow::{FollowError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// Encode `frame` as JPEG and wrap it in standard base64.
pub fn encode_frame(frame: &RgbaImage) -> Result<String> {
    let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf)
        .encode_image(&rgb)
        .map_err(|e| FollowError::Camera(format!("jpeg encode: {e}")))?;
    Ok(BASE64.encode(buf))
}

/// Inverse of [`encode_frame`], up to JPEG loss.
pub fn decode_frame(data: &str) -> Result<RgbaImage> {
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|e| FollowError::Camera(format!("base64: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| FollowError::Camera(format!("jpeg decode: {e}")))?;
    Ok(img.to_rgba8())
}
