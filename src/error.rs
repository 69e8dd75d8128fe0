//! Decode error types.

use core::fmt;

use enough::StopReason;

use crate::limits::LimitExceeded;

/// Broad category of a [`DecodeError`].
///
/// Probing entry points (`test`, `info`) swallow every kind; `load`
/// surfaces the specific error so callers can match on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Signature mismatch during an explicit decode attempt.
    UnknownFormat,
    /// Structurally invalid data mid-stream.
    Corrupt,
    /// Valid but unhandled bit depth, color type or compression.
    UnsupportedFeature,
    /// Geometry failed the size guard or a resource limit.
    TooLarge,
    /// An allocation could not be satisfied.
    OutOfMemory,
    /// The byte source ran dry before a required read completed.
    EndOfStream,
    /// Cooperative cancellation was observed.
    Cancelled,
    /// The byte source itself reported an error.
    Io,
}

/// Error returned by decode operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("not a {0} file")]
    UnknownFormat(&'static str),

    #[error("corrupt image: {0}")]
    Corrupt(&'static str),

    #[error("bad channel count: {0}")]
    BadChannelCount(i16),

    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    #[error("unsupported color type: {0}")]
    BadColorType(u16),

    #[error("unsupported compression: {0}")]
    BadCompression(u16),

    #[error("unsupported feature: {0}")]
    Unsupported(&'static str),

    #[error("image too large: {width}x{height}")]
    TooLarge { width: u32, height: u32 },

    #[error(transparent)]
    LimitExceeded(#[from] LimitExceeded),

    #[error("out of memory")]
    OutOfMemory,

    #[error("unexpected end of stream")]
    EndOfStream,

    /// Decoding was cancelled via a [`enough::Stop`] token.
    #[error("decoding cancelled: {0}")]
    Cancelled(StopReason),

    #[error("byte source error: {0}")]
    Io(#[from] SourceError),
}

impl DecodeError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownFormat(_) => ErrorKind::UnknownFormat,
            Self::Corrupt(_) => ErrorKind::Corrupt,
            Self::BadChannelCount(_)
            | Self::UnsupportedBitDepth(_)
            | Self::BadColorType(_)
            | Self::BadCompression(_)
            | Self::Unsupported(_) => ErrorKind::UnsupportedFeature,
            Self::TooLarge { .. } | Self::LimitExceeded(_) => ErrorKind::TooLarge,
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::EndOfStream => ErrorKind::EndOfStream,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<StopReason> for DecodeError {
    fn from(reason: StopReason) -> Self {
        DecodeError::Cancelled(reason)
    }
}

impl From<alloc::collections::TryReserveError> for DecodeError {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        DecodeError::OutOfMemory
    }
}

/// Failure reported by a [`ByteSource`](crate::ByteSource).
///
/// With the `std` feature this wraps [`std::io::Error`]; otherwise it
/// carries a static description.
#[derive(Debug)]
pub struct SourceError {
    #[cfg(feature = "std")]
    inner: std::io::Error,
    #[cfg(not(feature = "std"))]
    message: &'static str,
}

impl SourceError {
    /// Create an error from a static description.
    #[cfg(not(feature = "std"))]
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }

    /// Create an error from a static description.
    #[cfg(feature = "std")]
    pub fn new(message: &'static str) -> Self {
        Self {
            inner: std::io::Error::other(message),
        }
    }

    /// Borrow the wrapped I/O error.
    #[cfg(feature = "std")]
    pub fn io_error(&self) -> &std::io::Error {
        &self.inner
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "std")]
        {
            self.inner.fmt(f)
        }
        #[cfg(not(feature = "std"))]
        {
            f.write_str(self.message)
        }
    }
}

impl core::error::Error for SourceError {
    #[cfg(feature = "std")]
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.inner.source()
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for SourceError {
    fn from(inner: std::io::Error) -> Self {
        Self { inner }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, DecodeError>;
