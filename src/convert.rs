//! Channel-layout and bit-depth conversion.
//!
//! Every decoder produces its native shape; [`convert_pixels`] maps that
//! onto whatever the caller asked for. Component changes happen at the
//! source depth, then samples are rescaled.

use crate::error::Result;
use crate::pixel::{PixelBuffer, check_shape, sample16, set_sample16};

/// Rec. 601 luma in 8.8 fixed point.
#[inline]
fn luma(r: u16, g: u16, b: u16) -> u16 {
    ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u16
}

/// Map one pixel from `from` to `to` channels. `max` is the opaque
/// alpha value at the current depth.
#[inline]
fn map_components(px: [u16; 4], from: u8, to: u8, max: u16) -> [u16; 4] {
    let [a, b, c, d] = px;
    match (from, to) {
        (1, 2) => [a, max, 0, 0],
        (1, 3) => [a, a, a, 0],
        (1, 4) => [a, a, a, max],
        (2, 1) => [a, 0, 0, 0],
        (2, 3) => [a, a, a, 0],
        (2, 4) => [a, a, a, b],
        (3, 1) => [luma(a, b, c), 0, 0, 0],
        (3, 2) => [luma(a, b, c), max, 0, 0],
        (3, 4) => [a, b, c, max],
        (4, 1) => [luma(a, b, c), 0, 0, 0],
        (4, 2) => [luma(a, b, c), d, 0, 0],
        (4, 3) => [a, b, c, 0],
        _ => px,
    }
}

/// Rescale an 8-bit sample to 16 bits.
#[inline]
pub(crate) fn widen(v: u8) -> u16 {
    v as u16 * 257
}

/// Rescale a 16-bit sample to 8 bits, rounding.
#[inline]
pub(crate) fn narrow(v: u16) -> u8 {
    ((v as u32 + 128) / 257) as u8
}

/// Convert `src` to `components` channels at `depth` bits.
///
/// Returns `src` unchanged when it already has that shape; otherwise a
/// fresh buffer is allocated and `src` is dropped. Gray expands by
/// replication, color collapses to Rec. 601 luma, dropped alpha is
/// discarded and added alpha is opaque.
///
/// # Errors
///
/// [`DecodeError::UnsupportedBitDepth`](crate::DecodeError::UnsupportedBitDepth)
/// unless `depth` is 8 or 16, and
/// [`DecodeError::Unsupported`](crate::DecodeError::Unsupported) unless
/// `components` is 1 to 4.
pub fn convert_pixels(src: PixelBuffer, components: u8, depth: u8) -> Result<PixelBuffer> {
    check_shape(components, depth)?;
    if src.components() == components && src.depth() == depth {
        return Ok(src);
    }
    log::debug!(
        "converting {}ch/{}bit to {}ch/{}bit",
        src.components(),
        src.depth(),
        components,
        depth
    );

    let mut out = PixelBuffer::new(src.width(), src.height(), components, depth)?;
    let in_c = src.components() as usize;
    let out_c = components as usize;
    let in_wide = src.depth() == 16;
    let out_wide = depth == 16;
    let max = if in_wide { u16::MAX } else { u8::MAX as u16 };
    let input = src.as_bytes();
    let output = out.as_bytes_mut();

    for i in 0..src.pixel_count() {
        let mut px = [0u16; 4];
        for (c, slot) in px.iter_mut().take(in_c).enumerate() {
            let at = i * in_c + c;
            *slot = if in_wide {
                sample16(input, at)
            } else {
                input[at] as u16
            };
        }
        let mapped = map_components(px, in_c as u8, components, max);
        for (c, &v) in mapped.iter().take(out_c).enumerate() {
            let at = i * out_c + c;
            match (in_wide, out_wide) {
                (false, false) => output[at] = v as u8,
                (true, true) => set_sample16(output, at, v),
                (false, true) => set_sample16(output, at, widen(v as u8)),
                (true, false) => output[at] = narrow(v),
            }
        }
    }
    Ok(out)
}

/// `max - (max - c) * max / a`, rounded, clamped at zero.
#[inline]
fn unpremultiply(c: u64, a: u64, max: u64) -> u64 {
    let removed = ((max - c.min(max)) * max + a / 2) / a;
    max.saturating_sub(removed)
}

/// Undo premultiplication against a white matte for interleaved RGBA8.
///
/// Pixels with alpha 0 or 255 are left alone.
pub fn unpremultiply_rgba8(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u64;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = unpremultiply(*c as u64, a, 255) as u8;
        }
    }
}

/// Undo premultiplication against a white matte for interleaved RGBA16
/// stored in native byte order.
///
/// Pixels with alpha 0 or 65535 are left alone.
pub fn unpremultiply_rgba16(data: &mut [u8]) {
    for px in data.chunks_exact_mut(8) {
        let a = sample16(px, 3) as u64;
        if a == 0 || a == 65535 {
            continue;
        }
        for c in 0..3 {
            let v = unpremultiply(sample16(px, c) as u64, a, 65535);
            set_sample16(px, c, v as u16);
        }
    }
}
