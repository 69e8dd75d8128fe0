//! Owned pixel buffers.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{DecodeError, Result};
use crate::limits::checked_buffer_len;

/// Allocate a zero-filled byte vector, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_zeroed_vec(len: usize) -> Result<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, 0);
    Ok(v)
}

/// Read the `index`-th 16-bit sample of a native-endian byte buffer.
#[inline]
pub(crate) fn sample16(data: &[u8], index: usize) -> u16 {
    debug_assert!(index * 2 + 1 < data.len());
    u16::from_ne_bytes([data[index * 2], data[index * 2 + 1]])
}

/// Write the `index`-th 16-bit sample of a native-endian byte buffer.
#[inline]
pub(crate) fn set_sample16(data: &mut [u8], index: usize, value: u16) {
    debug_assert!(index * 2 + 1 < data.len());
    data[index * 2..index * 2 + 2].copy_from_slice(&value.to_ne_bytes());
}

/// A decoded image: row-major, channel-interleaved, tightly packed.
///
/// Channel order is gray, gray+alpha, RGB or RGBA depending on
/// [`components`](Self::components). 16-bit samples are stored in
/// native byte order.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    components: u8,
    depth: u8,
}

/// Reject shapes no decoder produces: 1 to 4 components at 8 or 16 bits.
pub(crate) fn check_shape(components: u8, depth: u8) -> Result<()> {
    if depth != 8 && depth != 16 {
        return Err(DecodeError::UnsupportedBitDepth(depth as u16));
    }
    if !(1..=4).contains(&components) {
        return Err(DecodeError::Unsupported("component count outside 1..=4"));
    }
    Ok(())
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of the given shape.
    ///
    /// Fails with `UnsupportedBitDepth` or `Unsupported` for a shape
    /// outside 1..=4 components at 8 or 16 bits, with `TooLarge` if the
    /// size guard rejects the geometry and with `OutOfMemory` if the
    /// allocation fails.
    pub fn new(width: u32, height: u32, components: u8, depth: u8) -> Result<Self> {
        check_shape(components, depth)?;
        let len = checked_buffer_len(width, height, components as usize, depth as usize / 8)?;
        Ok(Self {
            data: try_zeroed_vec(len)?,
            width,
            height,
            components,
            depth,
        })
    }

    /// Wrap existing bytes. Returns `None` if the length does not match
    /// the shape or the shape is not one this crate produces.
    pub fn from_vec(
        data: Vec<u8>,
        width: u32,
        height: u32,
        components: u8,
        depth: u8,
    ) -> Option<Self> {
        check_shape(components, depth).ok()?;
        let len = checked_buffer_len(width, height, components as usize, depth as usize / 8).ok()?;
        (data.len() == len).then_some(Self {
            data,
            width,
            height,
            components,
            depth,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Samples per pixel (1–4).
    pub fn components(&self) -> u8 {
        self.components
    }

    /// Bits per sample (8 or 16).
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Bytes per sample.
    pub fn bytes_per_sample(&self) -> usize {
        self.depth as usize / 8
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> usize {
        self.components as usize * self.bytes_per_sample()
    }

    /// Bytes per row.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total byte length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutably borrow the raw bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume and return the raw bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Borrow row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.row_bytes();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.row_bytes().max(1))
    }

    /// Samples of the pixel at `(x, y)`, widened to `u16`.
    pub fn pixel(&self, x: u32, y: u32) -> [u16; 4] {
        let mut out = [0u16; 4];
        let index = (y as usize * self.width as usize + x as usize) * self.components as usize;
        for (c, slot) in out.iter_mut().take(self.components as usize).enumerate() {
            *slot = if self.depth == 16 {
                sample16(&self.data, index + c)
            } else {
                self.data[index + c] as u16
            };
        }
        out
    }

    /// Reverse row order in place.
    pub fn flip_vertical(&mut self) {
        let stride = self.row_bytes();
        let height = self.height as usize;
        for y in 0..height / 2 {
            let (top, bottom) = self.data.split_at_mut((height - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("components", &self.components)
            .field("depth", &self.depth)
            .field("len", &self.data.len())
            .finish()
    }
}

impl AsRef<[u8]> for PixelBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
