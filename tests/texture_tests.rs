// Texture decoding through the public API: files, embedded blobs, DDS.

use scene_import_lib::source::EmbeddedTexture;
use scene_import_lib::texture::{decode_embedded, decode_image_file, locate};
use scene_import_lib::ColorSpace;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::{dds_bgra_bytes, png_bytes, write_file};

#[test]
fn embedded_compressed_blob_round_trip_dimensions() {
    for (w, h) in [(1, 1), (7, 3), (16, 16)] {
        let blob = EmbeddedTexture::compressed(png_bytes(w, h, [1, 2, 3, 4]), Some("png".into()));
        let tex = decode_embedded(&blob, ColorSpace::Srgb).unwrap();
        assert_eq!(tex.width(), w);
        assert_eq!(tex.height(), h);
        assert_eq!(tex.pixels().len(), (w * h * 4) as usize);
        assert_eq!(tex.mip_levels().len(), 1);
    }
}

#[test]
fn embedded_dds_blob_uses_dds_decoder() {
    let blob = EmbeddedTexture::compressed(dds_bgra_bytes(4, 4, 3, 0), Some("dds".into()));
    let tex = decode_embedded(&blob, ColorSpace::Srgb).unwrap();
    assert_eq!(tex.mip_levels().len(), 3);
    assert_eq!(tex.color_space(), ColorSpace::Linear);
}

#[test]
fn dds_file_with_truncated_tail_mip() {
    let tmp = TempDir::new().unwrap();
    // 4x4 + 2x2 + 1x1 levels; cutting 2 bytes breaks only the 1x1 level.
    let path = write_file(tmp.path(), "cut.dds", &dds_bgra_bytes(4, 4, 3, 2));
    let tex = decode_image_file(&path, ColorSpace::Srgb).unwrap();
    let sizes: Vec<(u32, u32)> = tex.mip_levels().iter().map(|m| (m.width, m.height)).collect();
    assert_eq!(sizes, vec![(4, 4), (2, 2)]);
    assert_eq!(tex.pixel(3, 3), Some([0, 0, 200, 255]));
    assert_eq!(tex.mip_levels()[1].pixels[0], 10);
}

#[test]
fn dds_file_without_top_level_data_fails() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "empty.dds", &dds_bgra_bytes(4, 4, 1, 4 * 4 * 4));
    assert!(decode_image_file(&path, ColorSpace::Linear).is_none());
}

#[test]
fn mislabelled_file_is_sniffed_by_content() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(tmp.path(), "actually_png.tga", &png_bytes(2, 3, [0, 0, 0, 255]));
    let tex = decode_image_file(&path, ColorSpace::Linear).unwrap();
    assert_eq!((tex.width(), tex.height()), (2, 3));
}

#[test]
fn any_existing_duplicate_is_accepted() {
    let tmp = TempDir::new().unwrap();
    write_file(tmp.path(), "one/dup.png", &png_bytes(1, 1, [0; 4]));
    write_file(tmp.path(), "two/DUP.png", &png_bytes(1, 1, [0; 4]));
    let found = locate::resolve_texture_path(tmp.path(), "dup.png", true).unwrap();
    assert!(found.exists());
    assert!(found.starts_with(tmp.path()));
}
