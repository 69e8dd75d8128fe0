//! Per-call decode state.

use core::fmt;

use crate::convert;
use crate::error::Result;
use crate::info::ImageInfo;
use crate::limits::{ResourceLimits, checked_buffer_len};
use crate::pixel::{PixelBuffer, check_shape};
use crate::sink::{self, DecodeObserver, Rect};
use crate::{ImageFormat, Orientation};

/// Geometry, native shape and requested output shape of one decode call.
///
/// The caller builds one (optionally pre-setting the requested depth and
/// component count), a decoder's header parse fills in the geometry and
/// native shape, and `load` reads it to decide how to convert. A state
/// belongs to a single call and is not meant to be shared across threads.
///
/// # Example
///
/// ```
/// use legacyimg::{DecodeState, ResourceLimits};
///
/// let state = DecodeState::new()
///     .with_components(4)
///     .with_depth(8)
///     .with_limits(ResourceLimits::none().with_max_pixels(1 << 24));
/// assert_eq!(state.requested_components, Some(4));
/// ```
pub struct DecodeState<'o> {
    /// Image width in pixels; zero until a header is parsed.
    pub width: u32,
    /// Image height in pixels; zero until a header is parsed.
    pub height: u32,
    /// Bits per channel as stored (8 or 16).
    pub native_depth: u8,
    /// Channels as stored (1–4).
    pub native_components: u8,
    /// Bits per channel to return; `None` means native.
    pub requested_depth: Option<u8>,
    /// Channels to return; `None` means native.
    pub requested_components: Option<u8>,
    /// Orientation of the returned pixel data.
    pub orientation: Orientation,
    /// Undo premultiplied alpha where the format stores it (PSD).
    pub unpremultiply_alpha: bool,
    /// Caps checked after the header parse, before allocation.
    pub limits: ResourceLimits,
    /// Format of the last parsed header.
    pub format: Option<ImageFormat>,
    observer: Option<&'o mut dyn DecodeObserver>,
}

impl<'o> DecodeState<'o> {
    /// An empty state requesting the native shape.
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            native_depth: 0,
            native_components: 0,
            requested_depth: None,
            requested_components: None,
            orientation: Orientation::Normal,
            unpremultiply_alpha: true,
            limits: ResourceLimits::none(),
            format: None,
            observer: None,
        }
    }

    /// Request a bit depth (8 or 16) for the output.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.requested_depth = Some(depth);
        self
    }

    /// Request a channel count (1–4) for the output.
    pub fn with_components(mut self, components: u8) -> Self {
        self.requested_components = Some(components);
        self
    }

    /// Enable or disable alpha unpremultiplication.
    pub fn with_unpremultiply_alpha(mut self, enabled: bool) -> Self {
        self.unpremultiply_alpha = enabled;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Attach a progressive-output observer.
    pub fn with_observer(mut self, observer: &'o mut dyn DecodeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Whether an observer is attached.
    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// Bit depth the output will have.
    pub fn out_depth(&self) -> u8 {
        self.requested_depth.unwrap_or(self.native_depth)
    }

    /// Channel count the output will have.
    pub fn out_components(&self) -> u8 {
        self.requested_components.unwrap_or(self.native_components)
    }

    /// Whether a header has been parsed into this state.
    pub fn is_parsed(&self) -> bool {
        self.format.is_some() && self.width > 0 && self.height > 0
    }

    /// Snapshot of the parsed header, or `None` before a parse.
    pub fn info(&self) -> Option<ImageInfo> {
        let format = self.format?;
        Some(
            ImageInfo::new(self.width, self.height, format)
                .with_depth(self.native_depth)
                .with_components(self.native_components)
                .with_orientation(self.orientation),
        )
    }

    /// Clear parsed fields while keeping the caller's configuration.
    pub(crate) fn reset_parsed(&mut self) {
        self.width = 0;
        self.height = 0;
        self.native_depth = 0;
        self.native_components = 0;
        self.orientation = Orientation::Normal;
        self.format = None;
    }

    /// Validate the parsed header against the request, the size guard
    /// and the resource limits, then announce it to the observer.
    ///
    /// Runs before any pixel allocation.
    pub(crate) fn prepare(&mut self) -> Result<()> {
        check_shape(self.out_components(), self.out_depth())?;
        self.check_size()?;
        self.limits.check_dimensions(self.width, self.height)?;
        let out_bytes = self.width as u64
            * self.height as u64
            * self.out_components() as u64
            * (self.out_depth() as u64 / 8);
        self.limits.check_memory(out_bytes)?;

        log::debug!(
            "{}x{} native {}ch/{}bit -> {}ch/{}bit",
            self.width,
            self.height,
            self.native_components,
            self.native_depth,
            self.out_components(),
            self.out_depth()
        );
        if let Some(info) = self.info()
            && let Some(observer) = self.observer.as_deref_mut()
        {
            observer.on_header(info);
        }
        Ok(())
    }

    /// Size guard for both the native and the requested buffer shape.
    pub(crate) fn check_size(&self) -> Result<()> {
        checked_buffer_len(
            self.width,
            self.height,
            self.native_components as usize,
            self.native_depth as usize / 8,
        )?;
        checked_buffer_len(
            self.width,
            self.height,
            self.out_components() as usize,
            self.out_depth() as usize / 8,
        )?;
        Ok(())
    }

    /// Convert a native buffer to the requested shape and report its rows.
    pub(crate) fn finish(&mut self, native: PixelBuffer) -> Result<PixelBuffer> {
        let out = convert::convert_pixels(native, self.out_components(), self.out_depth())?;
        if let Some(observer) = self.observer.as_deref_mut() {
            sink::emit_rows(observer, &out);
        }
        Ok(out)
    }

    pub(crate) fn progress(&mut self, fraction: f32, dirty: Option<Rect>) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_progress(fraction.clamp(0.0, 1.0), dirty);
        }
    }
}

impl Default for DecodeState<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecodeState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeState")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("native_depth", &self.native_depth)
            .field("native_components", &self.native_components)
            .field("requested_depth", &self.requested_depth)
            .field("requested_components", &self.requested_components)
            .field("orientation", &self.orientation)
            .field("unpremultiply_alpha", &self.unpremultiply_alpha)
            .field("limits", &self.limits)
            .field("format", &self.format)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ErrorKind};
    use crate::sink::RowEvent;
    use alloc::vec;
    use alloc::vec::Vec;

    fn parsed(width: u32, height: u32, components: u8, depth: u8) -> DecodeState<'static> {
        let mut state = DecodeState::new();
        state.width = width;
        state.height = height;
        state.native_components = components;
        state.native_depth = depth;
        state.format = Some(ImageFormat::Psd);
        state
    }

    #[test]
    fn requested_defaults_to_native() {
        let mut state = parsed(2, 2, 3, 8);
        assert_eq!(state.out_depth(), 8);
        assert_eq!(state.out_components(), 3);
        state.requested_depth = Some(16);
        assert_eq!(state.out_depth(), 16);
        assert!(state.unpremultiply_alpha);
    }

    #[test]
    fn info_requires_parse() {
        let state = DecodeState::new();
        assert!(state.info().is_none());
        assert!(!state.is_parsed());
        let info = parsed(5, 6, 4, 16).info().unwrap();
        assert_eq!((info.width, info.height, info.components, info.depth), (5, 6, 4, 16));
    }

    #[test]
    fn prepare_rejects_bad_request() {
        let mut state = parsed(2, 2, 3, 8).with_depth(12);
        assert!(matches!(
            state.prepare(),
            Err(DecodeError::UnsupportedBitDepth(12))
        ));
        let mut state = parsed(2, 2, 3, 8).with_components(5);
        assert_eq!(state.prepare().unwrap_err().kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn prepare_applies_limits_and_guard() {
        let mut state =
            parsed(100, 100, 4, 8).with_limits(ResourceLimits::none().with_max_width(99));
        assert_eq!(state.prepare().unwrap_err().kind(), ErrorKind::TooLarge);

        let mut state =
            parsed(100, 100, 1, 8).with_components(4).with_limits(ResourceLimits::none().with_max_memory(39_999));
        assert!(matches!(
            state.prepare(),
            Err(DecodeError::LimitExceeded(_))
        ));

        let mut state = parsed(40_000, 40_000, 4, 16);
        assert!(matches!(state.prepare(), Err(DecodeError::TooLarge { .. })));
    }

    #[test]
    fn reset_keeps_configuration() {
        let mut state = parsed(3, 3, 1, 8).with_components(4).with_unpremultiply_alpha(false);
        state.reset_parsed();
        assert_eq!(state.width, 0);
        assert!(state.format.is_none());
        assert_eq!(state.requested_components, Some(4));
        assert!(!state.unpremultiply_alpha);
    }

    #[test]
    fn observer_sees_header_rows_and_progress() {
        #[derive(Default)]
        struct Log {
            headers: u32,
            rows: Vec<u32>,
            progress: Vec<f32>,
        }
        impl DecodeObserver for Log {
            fn on_header(&mut self, info: ImageInfo) {
                assert_eq!(info.width, 2);
                self.headers += 1;
            }
            fn on_row(&mut self, row: RowEvent<'_>) {
                assert_eq!(row.pixels.len(), 2 * 3);
                self.rows.push(row.line);
            }
            fn on_progress(&mut self, fraction: f32, _dirty: Option<Rect>) {
                self.progress.push(fraction);
            }
        }

        let mut log = Log::default();
        {
            let mut state = DecodeState::new().with_observer(&mut log).with_components(3);
            state.width = 2;
            state.height = 2;
            state.native_components = 1;
            state.native_depth = 8;
            state.format = Some(ImageFormat::Tga);
            assert!(state.has_observer());
            state.prepare().unwrap();
            state.progress(2.0, None);
            let native = PixelBuffer::from_vec(vec![1, 2, 3, 4], 2, 2, 1, 8).unwrap();
            let out = state.finish(native).unwrap();
            assert_eq!(out.as_bytes(), &[1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
        }
        assert_eq!(log.headers, 1);
        assert_eq!(log.rows, vec![0, 1]);
        assert_eq!(log.progress, vec![1.0]);
    }
}
