//! Caller caps and the fixed allocation guard.
//!
//! Two layers protect against hostile headers. [`checked_buffer_len`] is
//! always on: no decoder allocates a buffer whose byte length overflows
//! or exceeds [`MAX_BUFFER_BYTES`]. [`ResourceLimits`] is opt-in and lets
//! the caller tighten that per call.

use crate::error::DecodeError;

/// Largest pixel buffer any decoder will allocate, in bytes.
///
/// Extents stay within a signed 32-bit range, matching what the formats
/// themselves can address.
pub const MAX_BUFFER_BYTES: usize = i32::MAX as usize;

/// Per-call caps, checked after the header parse and before any pixel
/// buffer is allocated. `None` leaves a resource uncapped.
///
/// # Example
///
/// ```
/// use legacyimg::{DecodeState, ResourceLimits};
///
/// // thumbnails only, and no long animations
/// let limits = ResourceLimits::none()
///     .with_max_width(4096)
///     .with_max_height(4096)
///     .with_max_frames(250);
/// let state = DecodeState::new().with_limits(limits);
/// assert_eq!(state.limits.max_frames, Some(250));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct ResourceLimits {
    /// Cap on `width * height`.
    pub max_pixels: Option<u64>,
    /// Cap on the returned buffer's byte length (requested shape).
    pub max_memory_bytes: Option<u64>,
    /// Cap on image width.
    pub max_width: Option<u32>,
    /// Cap on image height.
    pub max_height: Option<u32>,
    /// Cap on the number of GIF frames decoded.
    pub max_frames: Option<u32>,
}

/// `Some(max)` when `actual` is over the cap.
#[inline]
fn over<T: PartialOrd + Copy>(cap: Option<T>, actual: T) -> Option<T> {
    cap.filter(|&max| actual > max)
}

impl ResourceLimits {
    /// Nothing capped.
    pub fn none() -> Self {
        Self::default()
    }

    /// Cap `width * height`.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }

    /// Cap the returned buffer's byte length.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Cap image width.
    pub fn with_max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Cap image height.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Cap the number of GIF frames decoded.
    pub fn with_max_frames(mut self, frames: u32) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Whether anything is capped.
    pub fn has_any(&self) -> bool {
        *self != Self::none()
    }

    /// Width, height and pixel count.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), LimitExceeded> {
        if let Some(max) = over(self.max_width, width) {
            return Err(LimitExceeded::Width { actual: width, max });
        }
        if let Some(max) = over(self.max_height, height) {
            return Err(LimitExceeded::Height { actual: height, max });
        }
        let pixels = width as u64 * height as u64;
        match over(self.max_pixels, pixels) {
            Some(max) => Err(LimitExceeded::Pixels { actual: pixels, max }),
            None => Ok(()),
        }
    }

    /// Output buffer size in bytes.
    pub fn check_memory(&self, bytes: u64) -> Result<(), LimitExceeded> {
        match over(self.max_memory_bytes, bytes) {
            Some(max) => Err(LimitExceeded::Memory { actual: bytes, max }),
            None => Ok(()),
        }
    }

    /// Number of frames decoded so far.
    pub fn check_frames(&self, count: u32) -> Result<(), LimitExceeded> {
        match over(self.max_frames, count) {
            Some(max) => Err(LimitExceeded::Frames { actual: count, max }),
            None => Ok(()),
        }
    }
}

/// Which cap a decode ran into.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LimitExceeded {
    #[error("width {actual} exceeds limit {max}")]
    Width { actual: u32, max: u32 },
    #[error("height {actual} exceeds limit {max}")]
    Height { actual: u32, max: u32 },
    #[error("{actual} pixels exceed limit {max}")]
    Pixels { actual: u64, max: u64 },
    #[error("{actual}-byte buffer exceeds limit {max}")]
    Memory { actual: u64, max: u64 },
    #[error("frame {actual} exceeds limit {max}")]
    Frames { actual: u32, max: u32 },
}

/// Byte length of a `width * height * components * bytes_per_sample`
/// buffer, or [`DecodeError::TooLarge`] if it overflows or exceeds
/// [`MAX_BUFFER_BYTES`].
pub fn checked_buffer_len(
    width: u32,
    height: u32,
    components: usize,
    bytes_per_sample: usize,
) -> Result<usize, DecodeError> {
    [height as usize, components, bytes_per_sample]
        .into_iter()
        .try_fold(width as usize, usize::checked_mul)
        .filter(|&len| len <= MAX_BUFFER_BYTES)
        .ok_or(DecodeError::TooLarge { width, height })
}
