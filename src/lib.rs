//! Decoders for legacy raster formats: GIF (including animation), PSD
//! composites and TGA.
//!
//! Every format implements [`ImageDecoder`] against the same pieces:
//!
//! - [`BinReader`]: buffered, cancellable, endian-aware reads over any
//!   [`ByteSource`], with rewind for non-destructive probing
//! - [`DecodeState`]: geometry, native and requested shape, limits and an
//!   optional [`DecodeObserver`] for progressive output
//! - [`PixelBuffer`]: the owned, row-major, interleaved result
//! - [`convert_pixels`]: maps a native buffer onto the requested shape
//!
//! The [`registry`] functions sniff the format and dispatch; [`GifDecoder`]
//! adds [`frames`](GifDecoder::frames) and
//! [`load_animation`](GifDecoder::load_animation) for multi-frame files.
//!
//! ```
//! use legacyimg::{BinReader, DecodeState, registry};
//!
//! // 1x1 grayscale TGA
//! let tga = [0u8, 0, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 8, 0x20, 200];
//! let mut src: &[u8] = &tga;
//! let mut reader = BinReader::new(&mut src);
//! let mut state = DecodeState::new().with_components(3);
//! let img = registry::load(&mut reader, &mut state).unwrap();
//! assert_eq!(img.as_bytes(), &[200, 200, 200]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod capabilities;
mod convert;
mod error;
mod format;
mod gif;
mod info;
mod limits;
mod orientation;
mod output;
mod pixel;
mod psd;
mod reader;
pub mod registry;
mod sink;
mod source;
mod state;
mod tga;
mod traits;

#[cfg(test)]
mod testutil;

pub use capabilities::CodecCapabilities;
pub use convert::{convert_pixels, unpremultiply_rgba8, unpremultiply_rgba16};
pub use error::{DecodeError, ErrorKind, Result, SourceError};
pub use format::ImageFormat;
pub use gif::{Frames, GifDecoder};
pub use info::ImageInfo;
pub use limits::{LimitExceeded, MAX_BUFFER_BYTES, ResourceLimits, checked_buffer_len};
pub use orientation::Orientation;
pub use output::{Animation, Frame};
pub use pixel::PixelBuffer;
pub use psd::PsdDecoder;
pub use reader::{BinReader, DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};
pub use sink::{DecodeObserver, MajorAxis, Rect, RowEvent};
pub use source::ByteSource;
pub use state::DecodeState;
pub use tga::TgaDecoder;
pub use traits::{ImageDecoder, ScanMode};

// Cancellation tokens, so callers need not depend on `enough` directly.
pub use enough::{Stop, StopReason, Unstoppable};
