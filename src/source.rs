//! Byte source contract.
//!
//! A [`ByteSource`] is any forward-only producer of bytes. It may return
//! fewer bytes than requested; returning `0` means the source is
//! exhausted. [`BinReader`](crate::BinReader) handles retries and
//! buffering on top of it.

use crate::error::SourceError;

/// Sequential, forward-only byte provider.
pub trait ByteSource {
    /// Read up to `buf.len()` bytes, returning how many were written.
    ///
    /// `Ok(0)` signals the end of the source.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;
}

#[cfg(feature = "std")]
impl<R: std::io::Read + ?Sized> ByteSource for R {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        loop {
            match std::io::Read::read(self, buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(not(feature = "std"))]
impl ByteSource for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let n = buf.len().min(self.len());
        let (head, tail) = self.split_at(n);
        buf[..n].copy_from_slice(head);
        *self = tail;
        Ok(n)
    }
}
