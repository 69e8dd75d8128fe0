//! Buffered binary reader over a [`ByteSource`].
//!
//! [`BinReader`] owns a scratch buffer that it refills from the source on
//! demand. Every refill checks the cancellation token first, so a
//! cancelled decode stops at the next read boundary.
//!
//! The first fill captures the start of the stream. As long as nothing
//! has been discarded from that window, [`rewind`](BinReader::rewind)
//! returns to offset zero without touching the source; this is what lets
//! format probes run before a real decode.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use enough::{Stop, Unstoppable};

use crate::error::{DecodeError, Result};
use crate::source::ByteSource;

/// Scratch buffer size used by [`BinReader::new`].
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Smallest scratch buffer a reader will work with.
pub const MIN_BUFFER_SIZE: usize = 16;

/// Endian-aware buffered reader with rewind support for probing.
pub struct BinReader<'a> {
    source: &'a mut dyn ByteSource,
    stop: &'a dyn Stop,
    buffer: Vec<u8>,
    /// Next unread byte in `buffer`.
    offset: usize,
    /// End of valid data in `buffer`.
    filled: usize,
    /// Stream bytes that precede `buffer[0]`.
    discarded: u64,
}

macro_rules! read_primitive {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $from:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            Ok(<$ty>::$from(self.take()?))
        }
    };
}

impl<'a> BinReader<'a> {
    /// Create a reader with a [`DEFAULT_BUFFER_SIZE`] scratch buffer.
    pub fn new(source: &'a mut dyn ByteSource) -> Self {
        Self::with_buffer(source, vec![0; DEFAULT_BUFFER_SIZE])
    }

    /// Create a reader over a caller-supplied scratch buffer.
    ///
    /// The buffer's length (not capacity) is the window size. Buffers
    /// shorter than [`MIN_BUFFER_SIZE`] are grown to that size.
    pub fn with_buffer(source: &'a mut dyn ByteSource, mut buffer: Vec<u8>) -> Self {
        if buffer.len() < MIN_BUFFER_SIZE {
            buffer.resize(MIN_BUFFER_SIZE, 0);
        }
        Self {
            source,
            stop: &Unstoppable,
            buffer,
            offset: 0,
            filled: 0,
            discarded: 0,
        }
    }

    /// Set the cooperative cancellation token checked before every
    /// read from the source.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Logical byte offset from the start of the stream.
    pub fn position(&self) -> u64 {
        self.discarded + self.offset as u64
    }

    /// Whether [`rewind`](Self::rewind) can still return to the start.
    pub fn can_rewind(&self) -> bool {
        self.discarded == 0
    }

    /// Return to the start of the stream if it is still inside the
    /// captured window. Returns `false` when bytes have already been
    /// dropped from the window.
    pub fn rewind(&mut self) -> bool {
        if self.can_rewind() {
            self.offset = 0;
            true
        } else {
            false
        }
    }

    /// Give back the scratch buffer.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    #[inline]
    fn available(&self) -> usize {
        self.filled - self.offset
    }

    /// Compact unread bytes to the front, then read from the source
    /// until the buffer is full or the source reports end of data.
    fn fill(&mut self) -> Result<()> {
        if self.offset > 0 {
            self.buffer.copy_within(self.offset..self.filled, 0);
            self.discarded += self.offset as u64;
            self.filled -= self.offset;
            self.offset = 0;
        }
        while self.filled < self.buffer.len() {
            self.stop.check()?;
            let read = self.source.read(&mut self.buffer[self.filled..])?;
            if read == 0 {
                break;
            }
            self.filled += read;
        }
        Ok(())
    }

    #[inline]
    fn ensure(&mut self, count: usize) -> Result<()> {
        if self.available() < count {
            self.fill()?;
            if self.available() < count {
                return Err(DecodeError::EndOfStream);
            }
        }
        Ok(())
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer[self.offset..self.offset + N]);
        self.offset += N;
        Ok(out)
    }

    /// Read one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.buffer[self.offset];
        self.offset += 1;
        Ok(value)
    }

    read_primitive!(
        /// Read a little-endian `u16`.
        read_u16_le, u16, from_le_bytes
    );
    read_primitive!(
        /// Read a big-endian `u16`.
        read_u16_be, u16, from_be_bytes
    );
    read_primitive!(
        /// Read a little-endian `i16`.
        read_i16_le, i16, from_le_bytes
    );
    read_primitive!(
        /// Read a big-endian `i16`.
        read_i16_be, i16, from_be_bytes
    );
    read_primitive!(
        /// Read a little-endian `u32`.
        read_u32_le, u32, from_le_bytes
    );
    read_primitive!(
        /// Read a big-endian `u32`.
        read_u32_be, u32, from_be_bytes
    );
    read_primitive!(
        /// Read a little-endian `i32`.
        read_i32_le, i32, from_le_bytes
    );
    read_primitive!(
        /// Read a big-endian `i32`.
        read_i32_be, i32, from_be_bytes
    );

    /// Discard `count` bytes.
    ///
    /// Short skips are served by refilling the window. Skips larger than
    /// the window read through the scratch buffer and drop the data. Fails with
    /// [`EndOfStream`](DecodeError::EndOfStream) if the source ends first.
    pub fn skip(&mut self, mut count: u64) -> Result<()> {
        loop {
            let buffered = (self.available() as u64).min(count);
            self.offset += buffered as usize;
            count -= buffered;
            if count == 0 {
                return Ok(());
            }
            if count >= self.buffer.len() as u64 {
                break;
            }
            self.fill()?;
            if self.available() == 0 {
                return Err(DecodeError::EndOfStream);
            }
        }

        self.discarded += self.filled as u64;
        self.offset = 0;
        self.filled = 0;
        while count > 0 {
            self.stop.check()?;
            let chunk = (self.buffer.len() as u64).min(count) as usize;
            let read = self.source.read(&mut self.buffer[..chunk])?;
            if read == 0 {
                return Err(DecodeError::EndOfStream);
            }
            self.discarded += read as u64;
            count -= read as u64;
        }
        Ok(())
    }

    /// Copy exactly `dest.len()` bytes if the source has them.
    ///
    /// Returns `Ok(false)` instead of failing when the source runs out;
    /// `dest` is then partially written.
    pub fn try_read_bytes(&mut self, mut dest: &mut [u8]) -> Result<bool> {
        while !dest.is_empty() {
            if self.available() == 0 {
                if dest.len() >= self.buffer.len() {
                    return self.read_direct(dest);
                }
                self.fill()?;
                if self.available() == 0 {
                    return Ok(false);
                }
            }
            let n = self.available().min(dest.len());
            dest[..n].copy_from_slice(&self.buffer[self.offset..self.offset + n]);
            self.offset += n;
            dest = &mut dest[n..];
        }
        Ok(true)
    }

    /// Copy exactly `dest.len()` bytes or fail with
    /// [`EndOfStream`](DecodeError::EndOfStream).
    pub fn read_bytes(&mut self, dest: &mut [u8]) -> Result<()> {
        if self.try_read_bytes(dest)? {
            Ok(())
        } else {
            Err(DecodeError::EndOfStream)
        }
    }

    /// Large reads bypass the scratch buffer.
    fn read_direct(&mut self, mut dest: &mut [u8]) -> Result<bool> {
        self.discarded += self.filled as u64;
        self.offset = 0;
        self.filled = 0;
        while !dest.is_empty() {
            self.stop.check()?;
            let read = self.source.read(dest)?;
            if read == 0 {
                return Ok(false);
            }
            self.discarded += read as u64;
            dest = &mut dest[read..];
        }
        Ok(true)
    }
}

impl fmt::Debug for BinReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinReader")
            .field("position", &self.position())
            .field("buffered", &self.available())
            .field("capacity", &self.buffer.len())
            .field("can_rewind", &self.can_rewind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::tests::{Broken, Trickle};
    use crate::testutil::AlwaysStop;

    #[test]
    fn primitives_both_endians() {
        let data = [
            0x01, 0x02, 0x01, 0x02, 0xFF, 0xFE, 0xFF, 0xFE, 0x01, 0x02, 0x03, 0x04, 0x01, 0x02,
            0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFE, 0xAB,
        ];
        let mut src: &[u8] = &data;
        let mut r = BinReader::new(&mut src);
        assert_eq!(r.read_u16_le().unwrap(), 0x0201);
        assert_eq!(r.read_u16_be().unwrap(), 0x0102);
        assert_eq!(r.read_i16_le().unwrap(), -257);
        assert_eq!(r.read_i16_be().unwrap(), -2);
        assert_eq!(r.read_u32_le().unwrap(), 0x0403_0201);
        assert_eq!(r.read_u32_be().unwrap(), 0x0102_0304);
        assert_eq!(r.read_i32_be().unwrap(), -2);
        assert_eq!(r.read_u8().unwrap(), 0xAB);
        assert_eq!(r.position(), data.len() as u64);
        assert!(matches!(r.read_u8(), Err(DecodeError::EndOfStream)));
    }

    #[test]
    fn partial_primitive_is_end_of_stream() {
        let mut src: &[u8] = &[1, 2, 3];
        let mut r = BinReader::new(&mut src);
        assert!(matches!(r.read_u32_le(), Err(DecodeError::EndOfStream)));
    }

    #[test]
    fn refills_across_short_reads() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = Trickle::new(&data, 7);
        let mut r = BinReader::with_buffer(&mut src, vec![0; 16]);
        for expected in 0..100u8 {
            assert_eq!(r.read_u8().unwrap(), expected);
        }
        assert_eq!(r.position(), 100);
        assert!(r.read_u8().is_err());
    }

    #[test]
    fn primitive_straddles_refill() {
        let data: Vec<u8> = (0..32u8).collect();
        let mut src = Trickle::new(&data, 5);
        let mut r = BinReader::with_buffer(&mut src, vec![0; 16]);
        r.skip(14).unwrap();
        assert_eq!(r.read_u32_be().unwrap(), u32::from_be_bytes([14, 15, 16, 17]));
    }

    #[test]
    fn skip_within_and_past_buffer() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut src: &[u8] = &data;
        let mut r = BinReader::with_buffer(&mut src, vec![0; 16]);
        assert_eq!(r.read_u8().unwrap(), 0);
        r.skip(3).unwrap();
        assert_eq!(r.read_u8().unwrap(), 4);
        r.skip(100).unwrap();
        assert_eq!(r.position(), 105);
        assert_eq!(r.read_u8().unwrap(), 105);
        assert!(matches!(r.skip(1000), Err(DecodeError::EndOfStream)));
    }

    #[test]
    fn try_read_bytes_reports_shortfall() {
        let mut src: &[u8] = &[1, 2, 3, 4, 5];
        let mut r = BinReader::new(&mut src);
        let mut four = [0u8; 4];
        assert!(r.try_read_bytes(&mut four).unwrap());
        assert_eq!(four, [1, 2, 3, 4]);
        let mut two = [0u8; 2];
        assert!(!r.try_read_bytes(&mut two).unwrap());
        assert_eq!(two[0], 5);
    }

    #[test]
    fn large_read_bypasses_buffer() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut src = Trickle::new(&data, 33);
        let mut r = BinReader::with_buffer(&mut src, vec![0; 16]);
        assert_eq!(r.read_u8().unwrap(), 0);
        let mut dest = [0u8; 150];
        r.read_bytes(&mut dest).unwrap();
        assert_eq!(dest[0], 1);
        assert_eq!(dest[149], 150);
        assert_eq!(r.position(), 151);
        assert_eq!(r.read_u8().unwrap(), 151);
        let mut rest = [0u8; 100];
        assert!(matches!(r.read_bytes(&mut rest), Err(DecodeError::EndOfStream)));
    }

    #[test]
    fn rewind_inside_initial_window() {
        let data: Vec<u8> = (0..10u8).collect();
        let mut src: &[u8] = &data;
        let mut r = BinReader::new(&mut src);
        r.skip(6).unwrap();
        assert!(r.rewind());
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_u8().unwrap(), 0);
    }

    #[test]
    fn rewind_lost_once_window_moves() {
        let data: Vec<u8> = (0..64u8).collect();
        let mut src: &[u8] = &data;
        let mut r = BinReader::with_buffer(&mut src, vec![0; 16]);
        r.skip(20).unwrap();
        assert!(!r.can_rewind());
        assert!(!r.rewind());
        assert_eq!(r.read_u8().unwrap(), 20);
    }

    #[test]
    fn cancellation_checked_before_reading() {
        let data = [1u8; 8];
        let mut src = Trickle::new(&data, 8);
        let stop = AlwaysStop;
        let mut r = BinReader::new(&mut src).with_stop(&stop);
        let err = r.read_u8().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        drop(r);
        assert_eq!(src.calls, 0);
    }

    #[test]
    fn source_failure_surfaces_as_io() {
        let mut src = Broken;
        let mut r = BinReader::new(&mut src);
        assert_eq!(r.read_u8().unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn tiny_buffer_is_grown() {
        let mut src: &[u8] = &[0; 64];
        let r = BinReader::with_buffer(&mut src, Vec::new());
        assert_eq!(r.into_buffer().len(), MIN_BUFFER_SIZE);
    }
}
