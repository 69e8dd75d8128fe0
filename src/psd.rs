//! Photoshop (PSD) composite image decoding.
//!
//! Only the flattened composite at the end of the file is read: RGB color
//! mode, 8- or 16-bit raw planes, or 8-bit PackBits planes. Layers and
//! resources are skipped.

use crate::convert::{unpremultiply_rgba8, unpremultiply_rgba16};
use crate::error::{DecodeError, Result};
use crate::pixel::{PixelBuffer, set_sample16};
use crate::reader::BinReader;
use crate::sink::Rect;
use crate::state::DecodeState;
use crate::traits::{ImageDecoder, ScanMode};
use crate::{CodecCapabilities, ImageFormat, Orientation};

const SIGNATURE: u32 = 0x3842_5053; // "8BPS"
const COLOR_MODE_RGB: u16 = 3;
const MAX_CHANNELS: i16 = 16;

static CAPABILITIES: CodecCapabilities = CodecCapabilities::new()
    .with_decode_cancel(true)
    .with_cheap_probe(true)
    .with_native_16bit(true)
    .with_enforces_max_pixels(true)
    .with_enforces_max_memory(true);

/// PSD composite decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct PsdDecoder;

/// Per-call fields beyond what [`DecodeState`] holds.
#[derive(Clone, Copy, Debug, Default)]
struct Layout {
    channels: i16,
    packbits: bool,
}

impl PsdDecoder {
    fn parse(
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<Option<Layout>> {
        state.reset_parsed();
        if reader.read_u32_be()? != SIGNATURE || reader.read_u16_be()? != 1 {
            return if mode.is_probe() {
                Ok(None)
            } else {
                Err(DecodeError::UnknownFormat("PSD"))
            };
        }
        if mode == ScanMode::Type {
            return Ok(Some(Layout::default()));
        }

        // reserved
        reader.skip(6)?;
        let channels = reader.read_i16_be()?;
        if !(0..=MAX_CHANNELS).contains(&channels) {
            return Err(DecodeError::BadChannelCount(channels));
        }
        let height = reader.read_i32_be()?;
        let width = reader.read_i32_be()?;
        let depth = reader.read_u16_be()?;
        if depth != 8 && depth != 16 {
            return Err(DecodeError::UnsupportedBitDepth(depth));
        }
        let color_mode = reader.read_u16_be()?;
        if color_mode != COLOR_MODE_RGB {
            return Err(DecodeError::BadColorType(color_mode));
        }

        if width <= 0 || height <= 0 {
            return Err(DecodeError::Corrupt("PSD dimensions must be positive"));
        }
        state.width = width as u32;
        state.height = height as u32;
        state.native_depth = depth as u8;
        state.native_components = 4;
        state.orientation = Orientation::Normal;
        state.format = Some(ImageFormat::Psd);
        // header probes stay within the fixed 26 bytes
        if mode == ScanMode::Header {
            return Ok(Some(Layout {
                channels,
                packbits: false,
            }));
        }

        // color mode data, image resources, layer and mask info
        for _ in 0..3 {
            let len = reader.read_i32_be()?;
            if len < 0 {
                return Err(DecodeError::Corrupt("negative PSD section length"));
            }
            reader.skip(len as u64)?;
        }

        let compression = reader.read_u16_be()?;
        if compression > 1 {
            return Err(DecodeError::BadCompression(compression));
        }
        let packbits = compression == 1;
        if packbits && depth == 16 {
            return Err(DecodeError::UnsupportedBitDepth(depth));
        }
        log::debug!(
            "PSD {width}x{height} {channels} channels, {depth}-bit, {}",
            if packbits { "PackBits" } else { "raw" }
        );
        Ok(Some(Layout { channels, packbits }))
    }
}

/// Expand one PackBits-coded channel into every fourth byte of `out`,
/// starting at `offset`, for `count` samples.
fn unpack_channel(
    reader: &mut BinReader<'_>,
    out: &mut [u8],
    offset: usize,
    count: usize,
) -> Result<()> {
    let mut at = offset;
    let mut done = 0;
    while done < count {
        let left = count - done;
        let len = reader.read_u8()? as usize;
        match len {
            128 => {}
            0..=127 => {
                let run = len + 1;
                if run > left {
                    return Err(DecodeError::Corrupt("PackBits run past the channel"));
                }
                for _ in 0..run {
                    out[at] = reader.read_u8()?;
                    at += 4;
                }
                done += run;
            }
            _ => {
                let run = 257 - len;
                if run > left {
                    return Err(DecodeError::Corrupt("PackBits run past the channel"));
                }
                let value = reader.read_u8()?;
                for _ in 0..run {
                    out[at] = value;
                    at += 4;
                }
                done += run;
            }
        }
    }
    Ok(())
}

fn fill_channel(out: &mut PixelBuffer, channel: usize) {
    let alpha = channel == 3;
    match out.depth() {
        16 => {
            let value = if alpha { u16::MAX } else { 0 };
            let data = out.as_bytes_mut();
            for px in data.chunks_exact_mut(8) {
                set_sample16(px, channel, value);
            }
        }
        _ => {
            let value = if alpha { u8::MAX } else { 0 };
            for px in out.as_bytes_mut().chunks_exact_mut(4) {
                px[channel] = value;
            }
        }
    }
}

impl ImageDecoder for PsdDecoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Psd
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
        let Some(layout) = Self::parse(reader, state, ScanMode::Load)? else {
            return Err(DecodeError::UnknownFormat("PSD"));
        };
        state.prepare()?;

        let mut out = PixelBuffer::new(state.width, state.height, 4, state.native_depth)?;
        let count = out.pixel_count();
        let stored = layout.channels as usize;

        if layout.packbits {
            // per-row byte counts, not needed to decode sequentially
            reader.skip(state.height as u64 * stored as u64 * 2)?;
        }
        for channel in 0..4 {
            if channel >= stored {
                fill_channel(&mut out, channel);
            } else if layout.packbits {
                unpack_channel(reader, out.as_bytes_mut(), channel, count)?;
            } else if out.depth() == 16 {
                let data = out.as_bytes_mut();
                for i in 0..count {
                    set_sample16(data, i * 4 + channel, reader.read_u16_be()?);
                }
            } else {
                let data = out.as_bytes_mut();
                for i in 0..count {
                    data[i * 4 + channel] = reader.read_u8()?;
                }
            }
            log::trace!("PSD channel {channel} done");
            state.progress((channel + 1) as f32 / 4.0, None);
        }

        if stored >= 4 && state.unpremultiply_alpha {
            match out.depth() {
                16 => unpremultiply_rgba16(out.as_bytes_mut()),
                _ => unpremultiply_rgba8(out.as_bytes_mut()),
            }
        }
        state.progress(1.0, Some(Rect::new(0, 0, state.width, state.height)));
        state.finish(out)
    }
}
