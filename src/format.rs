//! The formats this crate decodes, and byte-level detection.

/// A decodable file format.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// GIF87a or GIF89a, possibly animated.
    Gif,
    /// Photoshop document; only the flattened composite is read.
    Psd,
    /// Truevision TGA, raw or RLE.
    Tga,
}

impl ImageFormat {
    /// Every format, in probe order.
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Gif, ImageFormat::Psd, ImageFormat::Tga];

    /// Identify a format from the first bytes of a file.
    ///
    /// GIF and PSD carry a magic number. TGA has none, so it is reported
    /// only when the first 18 bytes form a plausible TGA header.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match data {
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageFormat::Gif),
            // big-endian version 1
            [b'8', b'B', b'P', b'S', 0, 1, ..] => Some(ImageFormat::Psd),
            _ if crate::tga::plausible_header(data) => Some(ImageFormat::Tga),
            _ => None,
        }
    }

    /// Look up a file extension, ignoring ASCII case. No leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| {
            format
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    /// Registered or customary MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Gif => "image/gif",
            ImageFormat::Psd => "image/vnd.adobe.photoshop",
            ImageFormat::Tga => "image/x-tga",
        }
    }

    /// Lowercase extensions, most common first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Gif => &["gif"],
            ImageFormat::Psd => &["psd"],
            ImageFormat::Tga => &["tga", "tpic", "icb", "vda", "vst"],
        }
    }

    /// Only GIF streams hold more than one frame.
    pub fn supports_animation(self) -> bool {
        matches!(self, ImageFormat::Gif)
    }

    /// Bytes a probe reads before it can decide. A [`BinReader`] window
    /// smaller than this cannot rewind after probing.
    ///
    /// [`BinReader`]: crate::BinReader
    pub fn min_probe_bytes(self) -> usize {
        match self {
            // signature + logical screen descriptor
            ImageFormat::Gif => 13,
            ImageFormat::Psd => 26,
            ImageFormat::Tga => 18,
        }
    }
}

impl core::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ImageFormat::Gif => "GIF",
            ImageFormat::Psd => "PSD",
            ImageFormat::Tga => "TGA",
        })
    }
}
