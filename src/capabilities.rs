//! What each decoder can do, queryable before a decode starts.

/// A decoder's feature set.
///
/// Built in `const` context so decoders can hand out a `&'static`
/// reference from [`ImageDecoder::capabilities`](crate::ImageDecoder::capabilities).
///
/// ```
/// use legacyimg::{ImageFormat, registry};
///
/// let gif = registry::decoder_for(ImageFormat::Gif).capabilities();
/// assert!(gif.decode_animation());
/// assert!(!gif.native_16bit());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct CodecCapabilities {
    decode_cancel: bool,
    native_gray: bool,
    cheap_probe: bool,
    decode_animation: bool,
    native_16bit: bool,
    enforces_max_pixels: bool,
    enforces_max_memory: bool,
    enforces_max_frames: bool,
}

impl CodecCapabilities {
    /// Nothing supported.
    pub const fn new() -> Self {
        Self {
            decode_cancel: false,
            native_gray: false,
            cheap_probe: false,
            decode_animation: false,
            native_16bit: false,
            enforces_max_pixels: false,
            enforces_max_memory: false,
            enforces_max_frames: false,
        }
    }

    /// The decoder polls the reader's [`Stop`](crate::Stop) token.
    pub const fn decode_cancel(&self) -> bool {
        self.decode_cancel
    }

    /// Grayscale files decode to one component without expansion.
    pub const fn native_gray(&self) -> bool {
        self.native_gray
    }

    /// `test` decides from a small fixed-size prefix.
    pub const fn cheap_probe(&self) -> bool {
        self.cheap_probe
    }

    /// More than one frame can be decoded from a stream.
    pub const fn decode_animation(&self) -> bool {
        self.decode_animation
    }

    /// Samples can come back as `u16`.
    pub const fn native_16bit(&self) -> bool {
        self.native_16bit
    }

    /// Width, height and pixel-count caps are checked.
    pub const fn enforces_max_pixels(&self) -> bool {
        self.enforces_max_pixels
    }

    /// `ResourceLimits::max_memory_bytes` is checked before allocating.
    pub const fn enforces_max_memory(&self) -> bool {
        self.enforces_max_memory
    }

    /// `ResourceLimits::max_frames` stops an animation decode.
    pub const fn enforces_max_frames(&self) -> bool {
        self.enforces_max_frames
    }

    /// Set whether a stop token is honored between reads.
    pub const fn with_decode_cancel(mut self, on: bool) -> Self {
        self.decode_cancel = on;
        self
    }

    /// Set whether grayscale stays one component natively.
    pub const fn with_native_gray(mut self, on: bool) -> Self {
        self.native_gray = on;
        self
    }

    /// Set whether probing reads only a fixed-size prefix.
    pub const fn with_cheap_probe(mut self, on: bool) -> Self {
        self.cheap_probe = on;
        self
    }

    /// Set multi-frame decode support.
    pub const fn with_decode_animation(mut self, on: bool) -> Self {
        self.decode_animation = on;
        self
    }

    /// Set whether 16-bit samples are kept natively.
    pub const fn with_native_16bit(mut self, on: bool) -> Self {
        self.native_16bit = on;
        self
    }

    /// Set whether the dimension and pixel-count caps are enforced.
    pub const fn with_enforces_max_pixels(mut self, on: bool) -> Self {
        self.enforces_max_pixels = on;
        self
    }

    /// Set whether the memory cap is enforced.
    pub const fn with_enforces_max_memory(mut self, on: bool) -> Self {
        self.enforces_max_memory = on;
        self
    }

    /// Set whether the frame cap is enforced.
    pub const fn with_enforces_max_frames(mut self, on: bool) -> Self {
        self.enforces_max_frames = on;
        self
    }
}

// Lists only the supported features.
impl core::fmt::Debug for CodecCapabilities {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let flags = [
            (self.decode_cancel, "decode_cancel"),
            (self.native_gray, "native_gray"),
            (self.cheap_probe, "cheap_probe"),
            (self.decode_animation, "decode_animation"),
            (self.native_16bit, "native_16bit"),
            (self.enforces_max_pixels, "enforces_max_pixels"),
            (self.enforces_max_memory, "enforces_max_memory"),
            (self.enforces_max_frames, "enforces_max_frames"),
        ];
        f.debug_set()
            .entries(flags.iter().filter(|(on, _)| *on).map(|(_, name)| name))
            .finish()
    }
}
