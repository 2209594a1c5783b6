use crate::foundation::error::{PlatenError, PlatenResult};
use crate::render::backend::RasterBitmap;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub(crate) const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// PNG-encode straight-alpha RGBA8 pixels into a self-contained data URI.
pub(crate) fn encode_png(width: u32, height: u32, rgba: &[u8]) -> PlatenResult<String> {
    let mut png = Vec::new();
    let enc = image::codecs::png::PngEncoder::new(&mut png);
    image::ImageEncoder::write_image(enc, rgba, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| PlatenError::raster(format!("encode png: {e}")))?;

    let mut uri = String::with_capacity(PNG_DATA_URI_PREFIX.len() + png.len().div_ceil(3) * 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(&png, &mut uri);
    Ok(uri)
}

/// Decode a `data:image/png;base64,` URI back into straight-alpha RGBA8
/// pixels.
pub fn decode_png(uri: &str) -> PlatenResult<RasterBitmap> {
    let b64 = uri
        .strip_prefix(PNG_DATA_URI_PREFIX)
        .ok_or_else(|| PlatenError::validation("not a png data uri"))?;
    let png = STANDARD
        .decode(b64)
        .map_err(|e| PlatenError::validation(format!("decode data uri payload: {e}")))?;
    let img = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
        .map_err(|e| PlatenError::validation(format!("decode data uri png: {e}")))?
        .to_rgba8();

    Ok(RasterBitmap {
        width: img.width(),
        height: img.height(),
        data: img.into_raw(),
        premultiplied: false,
    })
}
