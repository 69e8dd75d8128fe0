//! Format sniffing and dispatch over the built-in decoders.

use crate::error::{DecodeError, Result};
use crate::gif::GifDecoder;
use crate::pixel::PixelBuffer;
use crate::psd::PsdDecoder;
use crate::reader::BinReader;
use crate::state::DecodeState;
use crate::tga::TgaDecoder;
use crate::traits::ImageDecoder;
use crate::ImageFormat;

/// Probe order. TGA has no magic number, so it goes last.
static DECODERS: [&dyn ImageDecoder; 3] = [&GifDecoder, &PsdDecoder, &TgaDecoder];

/// Every built-in decoder, in probe order.
pub fn decoders() -> &'static [&'static dyn ImageDecoder] {
    &DECODERS
}

/// The decoder for `format`.
pub fn decoder_for(format: ImageFormat) -> &'static dyn ImageDecoder {
    match format {
        ImageFormat::Gif => &GifDecoder,
        ImageFormat::Psd => &PsdDecoder,
        ImageFormat::Tga => &TgaDecoder,
    }
}

fn sniff(reader: &mut BinReader<'_>) -> Option<&'static dyn ImageDecoder> {
    DECODERS.iter().copied().find(|d| d.test(reader))
}

/// Identify the stream's format. Leaves the reader at the start.
pub fn detect(reader: &mut BinReader<'_>) -> Option<ImageFormat> {
    sniff(reader).map(|d| d.format())
}

/// Parse the header of whichever format matches. Leaves the reader at
/// the start.
///
/// The first decoder whose signature test passes is asked for its
/// header; a header error there is reported as `None` rather than
/// falling through to later formats.
pub fn info(reader: &mut BinReader<'_>) -> Option<DecodeState<'static>> {
    sniff(reader)?.info(reader)
}

/// Decode the first image of whichever format matches.
///
/// # Errors
///
/// [`DecodeError::UnknownFormat`] if no decoder recognizes the stream,
/// otherwise whatever the matching decoder reports.
pub fn load(reader: &mut BinReader<'_>, state: &mut DecodeState<'_>) -> Result<PixelBuffer> {
    let decoder = sniff(reader).ok_or(DecodeError::UnknownFormat("no decoder matched"))?;
    log::debug!("decoding as {}", decoder.format());
    decoder.load(reader, state)
}
