//! Common decoder trait.
//!
//! Every format implements [`ImageDecoder`] on a unit type. The trait is
//! object-safe so the registry can hold decoders as `&'static dyn
//! ImageDecoder` and sniff formats in order.

use crate::error::Result;
use crate::pixel::PixelBuffer;
use crate::reader::BinReader;
use crate::state::DecodeState;
use crate::{CodecCapabilities, ImageFormat};

/// How much of a header [`ImageDecoder::parse_header`] should read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanMode {
    /// Signature only.
    Type,
    /// Signature plus geometry and native shape.
    Header,
    /// Everything a decode needs. A signature mismatch is an error here.
    Load,
}

impl ScanMode {
    /// Whether this is a probe (mismatches return `Ok(false)`).
    pub fn is_probe(self) -> bool {
        !matches!(self, ScanMode::Load)
    }
}

/// Per-format probe, header parse and decode.
///
/// `test` and `info` never consume the reader: they parse from the start
/// and then [`rewind`](BinReader::rewind). If the header did not fit in
/// the reader's initial window the rewind fails and they report no
/// match, since a following `load` could not start from the beginning.
pub trait ImageDecoder: Send + Sync {
    /// The format this decoder handles.
    fn format(&self) -> ImageFormat;

    /// What this decoder supports.
    fn capabilities(&self) -> &'static CodecCapabilities;

    /// Validate the signature and, depending on `mode`, fill `state` with
    /// geometry and native shape.
    ///
    /// Returns `Ok(false)` on a signature mismatch in probe modes and
    /// [`UnknownFormat`](crate::DecodeError::UnknownFormat) in
    /// [`ScanMode::Load`]. Out-of-range header values fail with the
    /// format's structured error in every mode.
    fn parse_header(
        &self,
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<bool>;

    /// Whether the stream looks like this format. Leaves the reader at
    /// the start.
    fn test(&self, reader: &mut BinReader<'_>) -> bool {
        let mut state = DecodeState::new();
        let matched = matches!(self.parse_header(reader, &mut state, ScanMode::Type), Ok(true));
        rewind_after_probe(reader, self.format()) && matched
    }

    /// Parse the header without decoding pixels. Leaves the reader at
    /// the start. Every failure collapses to `None`.
    fn info(&self, reader: &mut BinReader<'_>) -> Option<DecodeState<'static>> {
        let mut state = DecodeState::new();
        let matched = matches!(
            self.parse_header(reader, &mut state, ScanMode::Header),
            Ok(true)
        );
        (rewind_after_probe(reader, self.format()) && matched).then_some(state)
    }

    /// Decode the first image into the shape `state` requests.
    ///
    /// Parses the header in [`ScanMode::Load`] from the reader's current
    /// position, so call this on a fresh or rewound reader.
    fn load(&self, reader: &mut BinReader<'_>, state: &mut DecodeState<'_>) -> Result<PixelBuffer>;
}

fn rewind_after_probe(reader: &mut BinReader<'_>, format: ImageFormat) -> bool {
    if reader.rewind() {
        true
    } else {
        log::warn!("{format} probe ran past the reader's initial window; cannot rewind");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use alloc::vec;

    /// Matches streams starting with "AB", then reads a u8 width.
    struct Toy;

    static TOY_CAPS: CodecCapabilities = CodecCapabilities::new().with_cheap_probe(true);

    impl ImageDecoder for Toy {
        fn format(&self) -> ImageFormat {
            ImageFormat::Tga
        }

        fn capabilities(&self) -> &'static CodecCapabilities {
            &TOY_CAPS
        }

        fn parse_header(
            &self,
            reader: &mut BinReader<'_>,
            state: &mut DecodeState<'_>,
            mode: ScanMode,
        ) -> Result<bool> {
            if reader.read_u8()? != b'A' || reader.read_u8()? != b'B' {
                return if mode.is_probe() {
                    Ok(false)
                } else {
                    Err(DecodeError::UnknownFormat("toy"))
                };
            }
            if mode == ScanMode::Type {
                return Ok(true);
            }
            state.width = reader.read_u8()? as u32;
            state.height = 1;
            state.native_components = 1;
            state.native_depth = 8;
            state.format = Some(self.format());
            Ok(true)
        }

        fn load(
            &self,
            reader: &mut BinReader<'_>,
            state: &mut DecodeState<'_>,
        ) -> Result<PixelBuffer> {
            self.parse_header(reader, state, ScanMode::Load)?;
            PixelBuffer::new(state.width, 1, 1, 8)
        }
    }

    #[test]
    fn probes_are_repeatable_and_rewind() {
        let mut src: &[u8] = b"AB\x05";
        let mut reader = BinReader::new(&mut src);
        let toy: &dyn ImageDecoder = &Toy;
        for _ in 0..3 {
            assert!(toy.test(&mut reader));
            assert_eq!(toy.info(&mut reader).unwrap().width, 5);
            assert_eq!(reader.position(), 0);
        }
        let mut state = DecodeState::new();
        assert_eq!(toy.load(&mut reader, &mut state).unwrap().width(), 5);
    }

    #[test]
    fn mismatch_and_truncation_are_silent_in_probes() {
        let mut src: &[u8] = b"XY\x05";
        let mut reader = BinReader::new(&mut src);
        assert!(!Toy.test(&mut reader));
        assert!(Toy.info(&mut reader).is_none());
        let mut state = DecodeState::new();
        assert!(matches!(
            Toy.load(&mut reader, &mut state),
            Err(DecodeError::UnknownFormat(_))
        ));

        let mut src: &[u8] = b"AB";
        let mut reader = BinReader::new(&mut src);
        assert!(Toy.test(&mut reader));
        assert!(Toy.info(&mut reader).is_none());
    }

    #[test]
    fn probe_fails_when_window_is_lost() {
        let mut data = vec![0u8; 64];
        data[0] = b'A';
        data[1] = b'B';
        let mut src: &[u8] = &data;
        let mut reader = BinReader::with_buffer(&mut src, vec![0; 16]);
        reader.skip(40).unwrap();
        assert!(!Toy.test(&mut reader));
    }

    #[test]
    fn scan_mode_probe_flag() {
        assert!(ScanMode::Type.is_probe());
        assert!(ScanMode::Header.is_probe());
        assert!(!ScanMode::Load.is_probe());
    }
}
