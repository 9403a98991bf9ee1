//! Texture decoding into a uniform BGRA8 pixel layout.

use serde::Serialize;

pub mod dds;
pub mod decoder;
pub mod embedded;
pub mod locate;

pub use decoder::{decode_image_bytes, decode_image_file};
pub use embedded::decode_embedded;

/// Every decoded pixel is 4 bytes in B, G, R, A order.
pub const BYTES_PER_PIXEL: usize = 4;

/// How the host should sample the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl MipLevel {
    pub fn expected_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
    }

    /// True when the buffer holds exactly `width * height` BGRA8 pixels.
    pub fn is_consistent(&self) -> bool {
        Self::expected_len(self.width, self.height) == Some(self.pixels.len())
    }
}

/// A decoded texture. The first mip level is the full-size image; only the
/// DDS path produces more than one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    mip_levels: Vec<MipLevel>,
}

impl DecodedTexture {
    /// Single-level texture. `None` if the buffer size does not match.
    pub fn from_bgra8(width: u32, height: u32, pixels: Vec<u8>, color_space: ColorSpace) -> Option<Self> {
        Self::from_mips(
            vec![MipLevel {
                width,
                height,
                pixels,
            }],
            color_space,
        )
    }

    /// `None` if the chain is empty or any level's buffer size is off.
    pub fn from_mips(mip_levels: Vec<MipLevel>, color_space: ColorSpace) -> Option<Self> {
        let top = mip_levels.first()?;
        if top.width == 0 || top.height == 0 || !mip_levels.iter().all(MipLevel::is_consistent) {
            return None;
        }
        Some(Self {
            width: top.width,
            height: top.height,
            color_space,
            mip_levels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Full-size BGRA8 pixels.
    pub fn pixels(&self) -> &[u8] {
        self.mip_levels
            .first()
            .map(|m| m.pixels.as_slice())
            .unwrap_or(&[])
    }

    pub fn mip_levels(&self) -> &[MipLevel] {
        &self.mip_levels
    }

    /// BGRA8 pixel at `(x, y)` of the top level.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let p = self.pixels().get(offset..offset + BYTES_PER_PIXEL)?;
        Some([p[0], p[1], p[2], p[3]])
    }
}
