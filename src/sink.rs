//! Progressive output observer.
//!
//! A [`DecodeObserver`] attached to a [`DecodeState`](crate::DecodeState)
//! is told about the parsed header, each finished row and overall
//! progress. It is purely observational: decoders never read anything
//! back from it, and every method has a no-op default so implementors
//! only override what they need.
//!
//! # Contract
//!
//! - [`on_header`](DecodeObserver::on_header) fires once per decode call,
//!   after the header validates and before pixels are allocated.
//! - [`on_row`](DecodeObserver::on_row) fires once per output row, top to
//!   bottom, with bytes in the caller's requested shape.
//! - [`on_progress`](DecodeObserver::on_progress) reports a fraction in
//!   `0.0..=1.0` and optionally the region that changed.

use crate::info::ImageInfo;
use crate::pixel::PixelBuffer;

/// Direction a [`RowEvent`] runs along.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MajorAxis {
    /// The event covers part of a row.
    Row,
    /// The event covers part of a column.
    Column,
}

/// A rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One emitted line of pixels.
#[derive(Clone, Copy, Debug)]
pub struct RowEvent<'a> {
    /// Which axis `line` indexes.
    pub axis: MajorAxis,
    /// Row (or column) index.
    pub line: u32,
    /// First pixel of the line covered by `pixels`.
    pub start: u32,
    /// Samples between consecutive pixels in `pixels`.
    pub stride: u32,
    /// Raw sample bytes.
    pub pixels: &'a [u8],
}

/// Receives progressive decode events.
///
/// # Object safety
///
/// This trait is object-safe; decoders hold it as `&mut dyn DecodeObserver`.
///
/// # Example implementation
///
/// ```
/// use legacyimg::{DecodeObserver, RowEvent};
///
/// struct RowCounter(u32);
///
/// impl DecodeObserver for RowCounter {
///     fn on_row(&mut self, _row: RowEvent<'_>) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait DecodeObserver {
    /// The header parsed successfully.
    fn on_header(&mut self, info: ImageInfo) {
        let _ = info;
    }

    /// A line of output is final.
    fn on_row(&mut self, row: RowEvent<'_>) {
        let _ = row;
    }

    /// Decoding advanced to `fraction` of the total work.
    fn on_progress(&mut self, fraction: f32, dirty: Option<Rect>) {
        let _ = (fraction, dirty);
    }
}

/// Report every row of `buffer` to `observer`, top to bottom.
pub(crate) fn emit_rows(observer: &mut dyn DecodeObserver, buffer: &PixelBuffer) {
    let stride = buffer.components() as u32;
    for (y, row) in buffer.rows().enumerate() {
        observer.on_row(RowEvent {
            axis: MajorAxis::Row,
            line: y as u32,
            start: 0,
            stride,
            pixels: row,
        });
    }
}
