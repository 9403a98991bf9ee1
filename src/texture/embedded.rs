use super::{decoder, ColorSpace, DecodedTexture, MipLevel};
use crate::source::EmbeddedTexture;

/// Decode a texture stored inside the model file.
///
/// Compressed blobs (`height == 0`) go through image-format detection; raw
/// blobs are `width * height` texels already in BGRA8 order and are copied.
pub fn decode_embedded(blob: &EmbeddedTexture, color_space: ColorSpace) -> Option<DecodedTexture> {
    if blob.data.is_empty() {
        log::warn!("embedded texture {:?} has no data", blob.filename);
        return None;
    }

    if blob.is_compressed() {
        let tex = match decoder::try_decode_image_bytes(&blob.data, color_space) {
            Ok(tex) => tex,
            Err(e) => {
                log::warn!(
                    "embedded texture {:?} (hint {:?}) failed to decode: {:#}",
                    blob.filename,
                    blob.format_hint,
                    e
                );
                return None;
            }
        };
        let expected = MipLevel::expected_len(tex.width(), tex.height());
        if expected != Some(tex.pixels().len()) {
            log::warn!(
                "embedded texture decoded to {} bytes, expected {:?}",
                tex.pixels().len(),
                expected
            );
            return None;
        }
        return Some(tex);
    }

    let Some(expected) = MipLevel::expected_len(blob.width, blob.height) else {
        return None;
    };
    if blob.data.len() != expected {
        log::warn!(
            "raw embedded texture {}x{} holds {} bytes, expected {}",
            blob.width,
            blob.height,
            blob.data.len(),
            expected
        );
        return None;
    }
    DecodedTexture::from_bgra8(blob.width, blob.height, blob.data.clone(), color_space)
}
