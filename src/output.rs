//! Animation output types.

use alloc::vec::Vec;

use crate::pixel::PixelBuffer;

/// A single composited animation frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pixels: PixelBuffer,
    delay_cs: u16,
    index: u32,
}

impl Frame {
    /// Create a new frame.
    pub fn new(pixels: PixelBuffer, delay_cs: u16, index: u32) -> Self {
        Self {
            pixels,
            delay_cs,
            index,
        }
    }

    /// Borrow the full-canvas pixels.
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Take ownership of the pixels.
    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    /// Display time in hundredths of a second, as stored in the file.
    pub fn delay(&self) -> u16 {
        self.delay_cs
    }

    /// Display time in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay_cs as u32 * 10
    }

    /// Zero-based position in the animation.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Every frame of an animation plus the parallel delay list.
///
/// All frames share one shape. `delays[i]` is the display time of
/// `frames[i]` in hundredths of a second.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Animation {
    /// Composited frames, in display order.
    pub frames: Vec<PixelBuffer>,
    /// Per-frame delay in centiseconds.
    pub delays: Vec<u16>,
}

impl Animation {
    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether there are no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total display time in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.delays.iter().map(|&d| d as u64 * 10).sum()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.delays.push(frame.delay_cs);
        self.frames.push(frame.pixels);
    }

    /// Iterate frames paired with their delays.
    pub fn iter(&self) -> impl Iterator<Item = (&PixelBuffer, u16)> {
        self.frames.iter().zip(self.delays.iter().copied())
    }
}
