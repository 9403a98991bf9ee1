//! DirectDraw Surface decoding.
//!
//! The container header is parsed with `binrw`; block-compressed payloads are
//! expanded with `texture2ddecoder` (BC2 locally). Every surviving mip level
//! comes out as BGRA8 and the result is always tagged linear.

use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use binrw::{binrw, BinReaderExt};

use super::{ColorSpace, DecodedTexture, MipLevel, BYTES_PER_PIXEL};

pub const DDS_HEADER_SIZE: u32 = 124;

pub const DDSD_MIPMAPCOUNT: u32 = 0x0002_0000;
pub const DDPF_ALPHAPIXELS: u32 = 0x1;
pub const DDPF_FOURCC: u32 = 0x4;
pub const DDPF_RGB: u32 = 0x40;
pub const DDPF_LUMINANCE: u32 = 0x0002_0000;
pub const DDSCAPS2_CUBEMAP: u32 = 0x200;
pub const DDSCAPS2_VOLUME: u32 = 0x0020_0000;

pub const fn four_cc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

pub const FOURCC_DX10: u32 = four_cc(b"DX10");

// ============================================================================
// Container layout
// ============================================================================

#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[br(little)]
pub struct DdsPixelFormat {
    pub size: u32,
    pub flags: u32,
    pub four_cc: u32,
    pub rgb_bit_count: u32,
    pub r_mask: u32,
    pub g_mask: u32,
    pub b_mask: u32,
    pub a_mask: u32,
}

#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[br(little)]
pub struct DdsHeaderDx10 {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

#[binrw]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[brw(magic = b"DDS ")]
#[br(little)]
pub struct DdsHeader {
    #[br(assert(size == DDS_HEADER_SIZE))]
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mip_map_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
    #[br(if(pixel_format.flags & DDPF_FOURCC != 0 && pixel_format.four_cc == FOURCC_DX10))]
    pub dx10: Option<DdsHeaderDx10>,
}

impl DdsHeader {
    /// Number of mip levels the file claims, clamped to what the dimensions
    /// allow.
    pub fn mip_count(&self) -> u32 {
        let declared = if self.flags & DDSD_MIPMAPCOUNT != 0 {
            self.mip_map_count.max(1)
        } else {
            1
        };
        let largest = self.width.max(self.height).max(1);
        declared.min(32 - largest.leading_zeros())
    }
}

// ============================================================================
// Pixel formats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdsFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Bc7,
    /// 32-bit, bytes B, G, R, A.
    Bgra8,
    /// 32-bit, bytes B, G, R, unused.
    Bgrx8,
    /// 32-bit, bytes R, G, B, A.
    Rgba8,
    /// 32-bit, bytes R, G, B, unused.
    Rgbx8,
    /// 24-bit, bytes B, G, R.
    Bgr8,
    Luminance8,
}

impl DdsFormat {
    pub fn from_header(header: &DdsHeader) -> Option<Self> {
        if let Some(dx10) = &header.dx10 {
            return Self::from_dxgi(dx10.dxgi_format);
        }

        let pf = &header.pixel_format;
        if pf.flags & DDPF_FOURCC != 0 {
            return match &pf.four_cc.to_le_bytes() {
                b"DXT1" => Some(DdsFormat::Bc1),
                b"DXT2" | b"DXT3" => Some(DdsFormat::Bc2),
                b"DXT4" | b"DXT5" => Some(DdsFormat::Bc3),
                b"ATI1" | b"BC4U" => Some(DdsFormat::Bc4),
                b"ATI2" | b"BC5U" => Some(DdsFormat::Bc5),
                _ => None,
            };
        }

        let has_alpha = pf.flags & DDPF_ALPHAPIXELS != 0 && pf.a_mask != 0;
        if pf.flags & DDPF_RGB != 0 {
            return match (pf.rgb_bit_count, pf.r_mask, pf.g_mask, pf.b_mask) {
                (32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff) if has_alpha => Some(DdsFormat::Bgra8),
                (32, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff) => Some(DdsFormat::Bgrx8),
                (32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000) if has_alpha => Some(DdsFormat::Rgba8),
                (32, 0x0000_00ff, 0x0000_ff00, 0x00ff_0000) => Some(DdsFormat::Rgbx8),
                (24, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff) => Some(DdsFormat::Bgr8),
                _ => None,
            };
        }
        if pf.flags & DDPF_LUMINANCE != 0 && pf.rgb_bit_count == 8 {
            return Some(DdsFormat::Luminance8);
        }
        None
    }

    /// Only UNORM (and sRGB-typed, decoded as raw) variants are accepted.
    pub fn from_dxgi(format: u32) -> Option<Self> {
        match format {
            28 | 29 => Some(DdsFormat::Rgba8),
            87 | 91 => Some(DdsFormat::Bgra8),
            88 | 93 => Some(DdsFormat::Bgrx8),
            71 | 72 => Some(DdsFormat::Bc1),
            74 | 75 => Some(DdsFormat::Bc2),
            77 | 78 => Some(DdsFormat::Bc3),
            80 => Some(DdsFormat::Bc4),
            83 => Some(DdsFormat::Bc5),
            98 | 99 => Some(DdsFormat::Bc7),
            _ => None,
        }
    }

    pub fn block_bytes(&self) -> Option<usize> {
        match self {
            DdsFormat::Bc1 | DdsFormat::Bc4 => Some(8),
            DdsFormat::Bc2 | DdsFormat::Bc3 | DdsFormat::Bc5 | DdsFormat::Bc7 => Some(16),
            _ => None,
        }
    }

    fn pixel_bytes(&self) -> usize {
        match self {
            DdsFormat::Bgr8 => 3,
            DdsFormat::Luminance8 => 1,
            _ => 4,
        }
    }

    /// Bytes one mip level of the given size occupies in the file. `None`
    /// when the size does not fit in `usize`.
    pub fn level_size(&self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width.max(1) as usize, height.max(1) as usize);
        match self.block_bytes() {
            Some(block) => w.div_ceil(4).checked_mul(h.div_ceil(4))?.checked_mul(block),
            None => w.checked_mul(h)?.checked_mul(self.pixel_bytes()),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a `.dds` file. `None` on any container or top-level format failure.
pub fn decode_dds(path: &Path) -> Option<DecodedTexture> {
    let result = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|bytes| try_decode_dds_bytes(&bytes));
    match result {
        Ok(tex) => {
            log::debug!(
                "loaded DDS {} ({}x{}, {} mips)",
                path.display(),
                tex.width(),
                tex.height(),
                tex.mip_levels().len()
            );
            Some(tex)
        }
        Err(e) => {
            log::warn!("DDS {} could not be decoded: {:#}", path.display(), e);
            None
        }
    }
}

pub fn decode_dds_bytes(bytes: &[u8]) -> Option<DecodedTexture> {
    match try_decode_dds_bytes(bytes) {
        Ok(tex) => Some(tex),
        Err(e) => {
            log::warn!("DDS data could not be decoded: {:#}", e);
            None
        }
    }
}

pub(crate) fn try_decode_dds_bytes(bytes: &[u8]) -> anyhow::Result<DecodedTexture> {
    let mut cursor = Cursor::new(bytes);
    let header: DdsHeader = cursor.read_le().context("invalid DDS header")?;

    if header.width == 0 || header.height == 0 {
        bail!("DDS has zero dimensions {}x{}", header.width, header.height);
    }
    if header.caps2 & (DDSCAPS2_CUBEMAP | DDSCAPS2_VOLUME) != 0 {
        bail!("cube map and volume DDS textures are not supported");
    }
    let format = DdsFormat::from_header(&header).ok_or_else(|| {
        anyhow!(
            "unsupported DDS pixel format (fourcc {:#x}, dxgi {:?})",
            header.pixel_format.four_cc,
            header.dx10.as_ref().map(|d| d.dxgi_format)
        )
    })?;

    let mut offset = cursor.position() as usize;
    let mut mips = Vec::new();
    for level in 0..header.mip_count() {
        let width = (header.width >> level).max(1);
        let height = (header.height >> level).max(1);
        let end = format
            .level_size(width, height)
            .and_then(|size| offset.checked_add(size));
        let Some(end) = end else {
            if level == 0 {
                bail!("DDS dimensions {}x{} are too large", width, height);
            }
            log::warn!("skipping DDS mips from {} ({}x{}): size overflow", level, width, height);
            break;
        };
        let data = bytes.get(offset..end);
        offset = end;

        let decoded = data
            .ok_or_else(|| anyhow!("mip {} truncated", level))
            .and_then(|data| decode_level(format, data, width, height));
        match decoded {
            Ok(pixels) => mips.push(MipLevel {
                width,
                height,
                pixels,
            }),
            Err(e) if level == 0 => return Err(e.context("top mip level")),
            Err(e) => log::warn!("skipping DDS mip {} ({}x{}): {:#}", level, width, height, e),
        }
    }

    DecodedTexture::from_mips(mips, ColorSpace::Linear)
        .ok_or_else(|| anyhow!("DDS produced no usable mip levels"))
}

fn decode_level(format: DdsFormat, data: &[u8], width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let texels = w * h;

    let block_decoder: Option<fn(&[u8], usize, usize, &mut [u32]) -> Result<(), &'static str>> =
        match format {
            DdsFormat::Bc1 => Some(texture2ddecoder::decode_bc1),
            DdsFormat::Bc3 => Some(texture2ddecoder::decode_bc3),
            DdsFormat::Bc4 => Some(texture2ddecoder::decode_bc4),
            DdsFormat::Bc5 => Some(texture2ddecoder::decode_bc5),
            DdsFormat::Bc7 => Some(texture2ddecoder::decode_bc7),
            _ => None,
        };
    if let Some(decode) = block_decoder {
        let mut image = vec![0u32; texels];
        decode(data, w, h, &mut image).map_err(|e| anyhow!("{:?}: {}", format, e))?;
        // Decoders pack B in the low byte.
        for px in image.iter_mut() {
            *px = px.to_le();
        }
        return Ok(bytemuck::cast_slice::<u32, u8>(&image).to_vec());
    }

    let mut out = Vec::with_capacity(texels * BYTES_PER_PIXEL);
    match format {
        DdsFormat::Bc2 => return Ok(decode_bc2(data, w, h)),
        DdsFormat::Bgra8 => out.extend_from_slice(&data[..texels * 4]),
        DdsFormat::Bgrx8 => {
            for px in data.chunks_exact(4).take(texels) {
                out.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        DdsFormat::Rgba8 => {
            for px in data.chunks_exact(4).take(texels) {
                out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        }
        DdsFormat::Rgbx8 => {
            for px in data.chunks_exact(4).take(texels) {
                out.extend_from_slice(&[px[2], px[1], px[0], 255]);
            }
        }
        DdsFormat::Bgr8 => {
            for px in data.chunks_exact(3).take(texels) {
                out.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }
        }
        DdsFormat::Luminance8 => {
            for &l in data.iter().take(texels) {
                out.extend_from_slice(&[l, l, l, 255]);
            }
        }
        _ => bail!("no decoder for {:?}", format),
    }
    Ok(out)
}

/// Expand an RGB565 endpoint to `[b, g, r]`.
fn rgb565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1f) as u8;
    let g = ((c >> 5) & 0x3f) as u8;
    let b = (c & 0x1f) as u8;
    [(b << 3) | (b >> 2), (g << 2) | (g >> 4), (r << 3) | (r >> 2)]
}

/// BC2 (DXT3): explicit 4-bit alpha followed by a four-colour BC1 block.
/// `data` must hold every block of the level.
fn decode_bc2(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let blocks_x = width.div_ceil(4);
    let mut out = vec![0u8; width * height * BYTES_PER_PIXEL];

    for (block_index, block) in data.chunks_exact(16).enumerate() {
        let bx = block_index % blocks_x;
        let by = block_index / blocks_x;

        let mut alpha_bytes = [0u8; 8];
        alpha_bytes.copy_from_slice(&block[0..8]);
        let alpha = u64::from_le_bytes(alpha_bytes);

        let c0 = rgb565(u16::from_le_bytes([block[8], block[9]]));
        let c1 = rgb565(u16::from_le_bytes([block[10], block[11]]));
        let mix = |a: u8, b: u8, wa: u16, wb: u16| ((a as u16 * wa + b as u16 * wb) / 3) as u8;
        let palette = [
            c0,
            c1,
            [mix(c0[0], c1[0], 2, 1), mix(c0[1], c1[1], 2, 1), mix(c0[2], c1[2], 2, 1)],
            [mix(c0[0], c1[0], 1, 2), mix(c0[1], c1[1], 1, 2), mix(c0[2], c1[2], 1, 2)],
        ];
        let indices = u32::from_le_bytes([block[12], block[13], block[14], block[15]]);

        for i in 0..16 {
            let x = bx * 4 + i % 4;
            let y = by * 4 + i / 4;
            if x >= width || y >= height {
                continue;
            }
            let [b, g, r] = palette[((indices >> (2 * i)) & 0x3) as usize];
            let a = ((alpha >> (4 * i)) & 0xf) as u8 * 17;
            let o = (y * width + x) * BYTES_PER_PIXEL;
            out[o..o + 4].copy_from_slice(&[b, g, r, a]);
        }
    }
    out
}
