use std::path::Path;

use anyhow::Context;
use image::{DynamicImage, ImageFormat};

use super::{dds, ColorSpace, DecodedTexture};

/// Decode image file bytes (PNG, JPG, BMP, TGA, ...) into BGRA8.
///
/// The format is sniffed from the content. DDS content is routed to the DDS
/// decoder so its mip chain survives.
pub fn decode_image_bytes(bytes: &[u8], color_space: ColorSpace) -> Option<DecodedTexture> {
    match try_decode_image_bytes(bytes, color_space) {
        Ok(tex) => Some(tex),
        Err(e) => {
            log::warn!("failed to decode image data: {:#}", e);
            None
        }
    }
}

pub(crate) fn try_decode_image_bytes(
    bytes: &[u8],
    color_space: ColorSpace,
) -> anyhow::Result<DecodedTexture> {
    let format = image::guess_format(bytes).context("unrecognised image format")?;
    if format == ImageFormat::Dds {
        return dds::try_decode_dds_bytes(bytes);
    }
    let img = image::load_from_memory_with_format(bytes, format)
        .with_context(|| format!("failed to decode {:?} image", format))?;
    dynamic_to_texture(&img, color_space)
}

/// Decode a texture file, routing `.dds` to the DDS decoder.
pub fn decode_image_file(path: &Path, color_space: ColorSpace) -> Option<DecodedTexture> {
    let is_dds = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("dds"));
    if is_dds {
        return dds::decode_dds(path);
    }

    let result = std::fs::read(path)
        .with_context(|| format!("failed to read texture {}", path.display()))
        .and_then(|bytes| try_decode_image_bytes(&bytes, color_space));
    match result {
        Ok(tex) => {
            log::debug!("loaded texture {} ({}x{})", path.display(), tex.width(), tex.height());
            Some(tex)
        }
        Err(e) => {
            log::warn!("texture {} could not be decoded: {:#}", path.display(), e);
            None
        }
    }
}

/// Convert any decoded image into a BGRA8 texture.
pub fn dynamic_to_texture(img: &DynamicImage, color_space: ColorSpace) -> anyhow::Result<DecodedTexture> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixels = rgba.into_raw();
    rgba_to_bgra_in_place(&mut pixels);
    DecodedTexture::from_bgra8(width, height, pixels, color_space)
        .with_context(|| format!("decoded image has invalid dimensions {}x{}", width, height))
}

/// Swap the R and B channels of a tightly packed 4-byte-per-pixel buffer.
pub fn rgba_to_bgra_in_place(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}
