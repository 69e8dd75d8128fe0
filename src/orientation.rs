//! Stored pixel orientation.

/// How stored rows and columns map onto the displayed image.
///
/// Values match the EXIF Orientation tag for the four non-rotating
/// cases, which are the only ones the supported formats can express.
/// Decoders report the orientation of the data they return: when a
/// decoder fixes up row order itself it clears the vertical component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// Rows top-to-bottom, columns left-to-right.
    #[default]
    Normal = 1,
    /// Columns stored right-to-left.
    FlipHorizontal = 2,
    /// Rows bottom-to-top and columns right-to-left.
    Rotate180 = 3,
    /// Rows stored bottom-to-top.
    FlipVertical = 4,
}

impl Orientation {
    /// Orientation from the two origin bits of a TGA image descriptor
    /// (bit 4: right-to-left, bit 5: top-to-bottom).
    pub fn from_tga_descriptor(descriptor: u8) -> Self {
        let right_to_left = descriptor & 0x10 != 0;
        let top_to_bottom = descriptor & 0x20 != 0;
        match (right_to_left, top_to_bottom) {
            (false, true) => Self::Normal,
            (true, true) => Self::FlipHorizontal,
            (false, false) => Self::FlipVertical,
            (true, false) => Self::Rotate180,
        }
    }

    /// EXIF tag value.
    pub fn exif_value(self) -> u16 {
        self as u16
    }

    /// Whether rows are stored bottom-to-top.
    pub fn flips_vertically(self) -> bool {
        matches!(self, Self::FlipVertical | Self::Rotate180)
    }

    /// Whether columns are stored right-to-left.
    pub fn flips_horizontally(self) -> bool {
        matches!(self, Self::FlipHorizontal | Self::Rotate180)
    }

    /// The orientation left over once row order has been corrected.
    pub fn without_vertical_flip(self) -> Self {
        if self.flips_horizontally() {
            Self::FlipHorizontal
        } else {
            Self::Normal
        }
    }

    /// Whether any transformation is needed.
    pub fn is_identity(self) -> bool {
        matches!(self, Self::Normal)
    }
}
