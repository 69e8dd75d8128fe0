//! Truevision TGA decoding.
//!
//! TGA has no magic number, so probing validates the whole 18-byte header
//! instead. Supported: colormapped (8/16-bit indices), truecolor
//! (15/16/24/32-bit) and grayscale (8-bit, 16-bit gray+alpha), each raw or
//! RLE.

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};
use crate::pixel::{PixelBuffer, try_zeroed_vec};
use crate::reader::BinReader;
use crate::sink::Rect;
use crate::state::DecodeState;
use crate::traits::{ImageDecoder, ScanMode};
use crate::{CodecCapabilities, ImageFormat, Orientation};

const HEADER_LEN: usize = 18;

static CAPABILITIES: CodecCapabilities = CodecCapabilities::new()
    .with_decode_cancel(true)
    .with_cheap_probe(true)
    .with_native_gray(true)
    .with_enforces_max_pixels(true)
    .with_enforces_max_memory(true);

/// TGA decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct TgaDecoder;

/// The fixed header, with the image type split into base type and RLE
/// flag.
#[derive(Clone, Copy, Debug)]
struct Header {
    id_len: u8,
    colormap_type: u8,
    base_type: u8,
    rle: bool,
    colormap_start: u16,
    colormap_len: u16,
    colormap_bits: u8,
    width: u16,
    height: u16,
    bits: u8,
    descriptor: u8,
}

/// Stored pixel layout once the header has been checked.
#[derive(Clone, Copy, Debug)]
struct Shape {
    components: u8,
    /// Pixels (or colormap entries) are packed RGB555.
    rgb16: bool,
}

/// Channel count for a pixel or colormap entry of `bits` bits.
fn components_for(bits: u8, gray: bool) -> Option<Shape> {
    let (components, rgb16) = match bits {
        8 => (1, false),
        16 if gray => (2, false),
        15 | 16 => (3, true),
        24 | 32 => (bits / 8, false),
        _ => return None,
    };
    Some(Shape { components, rgb16 })
}

impl Header {
    fn from_bytes(b: &[u8; HEADER_LEN]) -> Self {
        let image_type = b[2];
        Self {
            id_len: b[0],
            colormap_type: b[1],
            base_type: if image_type >= 8 { image_type - 8 } else { image_type },
            rle: image_type >= 8,
            colormap_start: u16::from_le_bytes([b[3], b[4]]),
            colormap_len: u16::from_le_bytes([b[5], b[6]]),
            colormap_bits: b[7],
            width: u16::from_le_bytes([b[12], b[13]]),
            height: u16::from_le_bytes([b[14], b[15]]),
            bits: b[16],
            descriptor: b[17],
        }
    }

    fn indexed(&self) -> bool {
        self.colormap_type == 1
    }

    /// Check every field and derive the stored pixel layout.
    fn validate(&self) -> Result<Shape> {
        if self.colormap_type > 1 {
            return Err(DecodeError::BadColorType(self.colormap_type as u16));
        }
        let shape = if self.indexed() {
            if self.base_type != 1 {
                return Err(DecodeError::BadColorType(self.base_type as u16));
            }
            if self.bits != 8 && self.bits != 16 {
                return Err(DecodeError::UnsupportedBitDepth(self.bits as u16));
            }
            if self.colormap_len == 0 {
                return Err(DecodeError::Corrupt("TGA colormap has no entries"));
            }
            components_for(self.colormap_bits, false)
                .ok_or(DecodeError::UnsupportedBitDepth(self.colormap_bits as u16))?
        } else {
            if self.base_type != 2 && self.base_type != 3 {
                return Err(DecodeError::BadColorType(self.base_type as u16));
            }
            components_for(self.bits, self.base_type == 3)
                .ok_or(DecodeError::UnsupportedBitDepth(self.bits as u16))?
        };
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::Corrupt("zero-size TGA image"));
        }
        Ok(shape)
    }
}

/// Whether `data` starts with a header this decoder would accept.
pub(crate) fn plausible_header(data: &[u8]) -> bool {
    data.first_chunk::<HEADER_LEN>()
        .is_some_and(|b| Header::from_bytes(b).validate().is_ok())
}

/// Expand packed RGB555 into 8-bit RGB.
#[inline]
fn expand_rgb16(px: u16) -> [u8; 3] {
    let scale = |c: u16| ((c & 31) * 255 / 31) as u8;
    [scale(px >> 10), scale(px >> 5), scale(px)]
}

/// Read one stored pixel (or colormap entry) into `out`.
fn read_pixel(reader: &mut BinReader<'_>, shape: Shape, out: &mut [u8]) -> Result<()> {
    if shape.rgb16 {
        out.copy_from_slice(&expand_rgb16(reader.read_u16_le()?));
        Ok(())
    } else {
        reader.read_bytes(out)
    }
}

impl TgaDecoder {
    fn parse(
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<Option<(Header, Shape)>> {
        state.reset_parsed();
        let mut raw = [0u8; HEADER_LEN];
        reader.read_bytes(&mut raw)?;
        let header = Header::from_bytes(&raw);
        let shape = match header.validate() {
            Ok(shape) => shape,
            Err(_) if mode.is_probe() => return Ok(None),
            Err(e) => return Err(e),
        };
        if mode == ScanMode::Type {
            return Ok(Some((header, shape)));
        }

        let orientation = Orientation::from_tga_descriptor(header.descriptor);
        state.width = header.width as u32;
        state.height = header.height as u32;
        state.native_depth = 8;
        state.native_components = shape.components;
        // rows are flipped during decode, only a mirror can remain
        state.orientation = orientation.without_vertical_flip();
        state.format = Some(ImageFormat::Tga);
        log::debug!(
            "TGA {}x{} type {} rle {} {}-bit, {} components, {:?}",
            header.width,
            header.height,
            header.base_type,
            header.rle,
            header.bits,
            shape.components,
            orientation
        );
        Ok(Some((header, shape)))
    }

    fn read_colormap(
        reader: &mut BinReader<'_>,
        header: &Header,
        shape: Shape,
    ) -> Result<Vec<u8>> {
        reader.skip(header.colormap_start as u64)?;
        let comp = shape.components as usize;
        let mut colormap = try_zeroed_vec(header.colormap_len as usize * comp)?;
        if shape.rgb16 {
            for entry in colormap.chunks_exact_mut(comp) {
                read_pixel(reader, shape, entry)?;
            }
        } else {
            reader.read_bytes(&mut colormap)?;
        }
        Ok(colormap)
    }
}

impl ImageDecoder for TgaDecoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Tga
    }

    fn capabilities(&self) -> &'static CodecCapabilities {
        &CAPABILITIES
    }

    fn parse_header(
        &self,
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<bool> {
        Ok(Self::parse(reader, state, mode)?.is_some())
    }

    fn load(&self, reader: &mut BinReader<'_>, state: &mut DecodeState<'_>) -> Result<PixelBuffer> {
        let Some((header, shape)) = Self::parse(reader, state, ScanMode::Load)? else {
            return Err(DecodeError::UnknownFormat("TGA"));
        };
        state.prepare()?;

        let comp = shape.components as usize;
        let mut out = PixelBuffer::new(state.width, state.height, shape.components, 8)?;
        reader.skip(header.id_len as u64)?;

        if !header.indexed() && !header.rle && !shape.rgb16 {
            reader.read_bytes(out.as_bytes_mut())?;
        } else {
            let colormap = if header.indexed() {
                Some(Self::read_colormap(reader, &header, shape)?)
            } else {
                None
            };
            let entries = header.colormap_len as usize;
            let mut bad_indices = 0usize;
            let mut current = [0u8; 4];
            let mut run_left = 0u8;
            let mut repeating = false;

            for px in out.as_bytes_mut().chunks_exact_mut(comp) {
                let fetch = if header.rle {
                    if run_left == 0 {
                        let packet = reader.read_u8()?;
                        run_left = (packet & 0x7F) + 1;
                        repeating = packet & 0x80 != 0;
                        true
                    } else {
                        !repeating
                    }
                } else {
                    true
                };
                if fetch {
                    if let Some(colormap) = &colormap {
                        let mut index = if header.bits == 8 {
                            reader.read_u8()? as usize
                        } else {
                            reader.read_u16_le()? as usize
                        };
                        if index >= entries {
                            bad_indices += 1;
                            index = 0;
                        }
                        current[..comp].copy_from_slice(&colormap[index * comp..(index + 1) * comp]);
                    } else {
                        read_pixel(reader, shape, &mut current[..comp])?;
                    }
                }
                px.copy_from_slice(&current[..comp]);
                run_left = run_left.saturating_sub(1);
            }
            if bad_indices > 0 {
                log::warn!("{bad_indices} TGA colormap indices out of range, used entry 0");
            }
        }

        if Orientation::from_tga_descriptor(header.descriptor).flips_vertically() {
            out.flip_vertical();
        }
        if comp >= 3 && !shape.rgb16 {
            for px in out.as_bytes_mut().chunks_exact_mut(comp) {
                px.swap(0, 2);
            }
        }
        state.progress(1.0, Some(Rect::new(0, 0, state.width, state.height)));
        state.finish(out)
    }
}
