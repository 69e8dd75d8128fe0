//! Header summary handed to observers.

use crate::{ImageFormat, Orientation};

/// What a header parse learned, in the file's native shape.
///
/// Built by [`DecodeState::info`](crate::DecodeState::info) and passed to
/// [`DecodeObserver::on_header`](crate::DecodeObserver::on_header) before
/// any pixel is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Format whose header was parsed.
    pub format: ImageFormat,
    /// Bits per sample, 8 or 16.
    pub depth: u8,
    /// Samples per pixel: 1 gray, 2 gray+alpha, 3 RGB, 4 RGBA.
    pub components: u8,
    /// What the caller still has to apply to the returned rows. A TGA
    /// vertical flip is undone by the decoder and never shows up here.
    pub orientation: Orientation,
}

impl ImageInfo {
    /// RGBA8, upright. Adjust with the `with_*` methods.
    pub fn new(width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            width,
            height,
            format,
            depth: 8,
            components: 4,
            orientation: Orientation::Normal,
        }
    }

    /// Set the native bits per sample.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Set the native samples per pixel.
    pub fn with_components(mut self, components: u8) -> Self {
        self.components = components;
        self
    }

    /// Set the orientation left for the caller.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Whether the native layout carries alpha.
    pub fn has_alpha(&self) -> bool {
        matches!(self.components, 2 | 4)
    }

    /// Whether the native layout is gray or gray+alpha.
    pub fn is_gray(&self) -> bool {
        self.components <= 2
    }

    /// Byte length of one native-shape frame, saturating.
    pub fn native_buffer_size(&self) -> u64 {
        [self.height as u64, self.components as u64, self.depth as u64 / 8]
            .into_iter()
            .fold(self.width as u64, u64::saturating_mul)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tga_gray_alpha_header() {
        let info = ImageInfo::new(40, 30, ImageFormat::Tga)
            .with_components(2)
            .with_orientation(Orientation::FlipHorizontal);
        assert!(info.has_alpha());
        assert!(info.is_gray());
        assert_eq!(info.native_buffer_size(), 40 * 30 * 2);
        assert!(info.orientation.flips_horizontally());
    }

    #[test]
    fn psd_sixteen_bit() {
        let info = ImageInfo::new(10, 10, ImageFormat::Psd).with_depth(16);
        assert_eq!(info.native_buffer_size(), 10 * 10 * 4 * 2);
        assert!(info.has_alpha() && !info.is_gray());
    }

    #[test]
    fn size_saturates() {
        let info = ImageInfo::new(u32::MAX, u32::MAX, ImageFormat::Psd).with_depth(16);
        assert_eq!(info.native_buffer_size(), u64::MAX);
    }
}
