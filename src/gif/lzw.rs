//! Variable-width LZW decoding of GIF raster data.

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};
use crate::reader::BinReader;

/// Largest dictionary a GIF stream may build.
pub(crate) const MAX_CODES: usize = 4096;

/// Largest minimum code size accepted in the raster header.
pub(crate) const MAX_MIN_CODE_SIZE: u8 = 12;

/// A dictionary entry: the string for `prefix` followed by `suffix`.
#[derive(Clone, Copy, Debug, Default)]
struct Entry {
    prefix: Option<u16>,
    /// First byte of the full string, cached so new entries need no walk.
    first: u8,
    suffix: u8,
}

/// LZW decoder state reused across frames.
///
/// The dictionary is a fixed arena of [`MAX_CODES`] entries linked by
/// prefix index, so decoding a code walks a chain bounded by the arena
/// size.
pub(crate) struct Lzw {
    codes: Vec<Entry>,
    chain: Vec<u8>,
    clear: u16,
    min_code_size: u8,
    code_size: u8,
    code_mask: u32,
    avail: u16,
}

impl Lzw {
    pub(crate) fn new() -> Result<Self> {
        let mut codes = Vec::new();
        codes.try_reserve_exact(MAX_CODES)?;
        codes.resize(MAX_CODES, Entry::default());
        let mut chain = Vec::new();
        chain.try_reserve_exact(MAX_CODES)?;
        Ok(Self {
            codes,
            chain,
            clear: 0,
            min_code_size: 0,
            code_size: 0,
            code_mask: 0,
            avail: 0,
        })
    }

    /// Next free dictionary slot.
    pub(crate) fn avail(&self) -> u16 {
        self.avail
    }

    /// Current code width in bits.
    pub(crate) fn code_size(&self) -> u8 {
        self.code_size
    }

    fn reset(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.code_mask = (1 << self.code_size) - 1;
        self.avail = self.clear + 2;
    }

    /// Decode one image's raster: the minimum-code-size byte followed by
    /// data sub-blocks. Every decoded index is handed to `emit` in
    /// stream order.
    ///
    /// Returns once the end code is seen (remaining sub-blocks are
    /// skipped) or a zero-length sub-block ends the data.
    pub(crate) fn decode(
        &mut self,
        reader: &mut BinReader<'_>,
        mut emit: impl FnMut(u8),
    ) -> Result<()> {
        let min_code_size = reader.read_u8()?;
        if min_code_size > MAX_MIN_CODE_SIZE {
            return Err(DecodeError::Corrupt("LZW minimum code size above 12"));
        }
        self.min_code_size = min_code_size;
        self.clear = 1 << min_code_size;
        for (i, entry) in self.codes.iter_mut().take(self.clear as usize).enumerate() {
            *entry = Entry {
                prefix: None,
                first: i as u8,
                suffix: i as u8,
            };
        }
        self.reset();
        let end = self.clear + 1;

        let mut bits: u32 = 0;
        let mut valid_bits: u8 = 0;
        let mut block_left: u8 = 0;
        let mut old_code: Option<u16> = None;

        loop {
            if valid_bits < self.code_size {
                if block_left == 0 {
                    block_left = reader.read_u8()?;
                    if block_left == 0 {
                        return Ok(());
                    }
                }
                block_left -= 1;
                bits |= (reader.read_u8()? as u32) << valid_bits;
                valid_bits += 8;
                continue;
            }

            let code = (bits & self.code_mask) as u16;
            bits >>= self.code_size;
            valid_bits -= self.code_size;

            if code == self.clear {
                self.reset();
                old_code = None;
            } else if code == end {
                reader.skip(block_left as u64)?;
                loop {
                    let len = reader.read_u8()?;
                    if len == 0 {
                        break;
                    }
                    reader.skip(len as u64)?;
                }
                return Ok(());
            } else if code <= self.avail {
                if let Some(old) = old_code {
                    let index = self.avail as usize;
                    if index >= MAX_CODES {
                        return Err(DecodeError::Corrupt("too many LZW codes"));
                    }
                    self.avail += 1;
                    let first = self.codes[old as usize].first;
                    self.codes[index] = Entry {
                        prefix: Some(old),
                        first,
                        suffix: 0,
                    };
                    // for code == index this reads the entry just created
                    self.codes[index].suffix = self.codes[code as usize].first;
                } else if code == self.avail {
                    return Err(DecodeError::Corrupt("illegal code in raster"));
                }

                self.output(code, &mut emit);

                if self.avail as u32 & self.code_mask == 0 && self.avail <= 0x0FFF {
                    self.code_size += 1;
                    self.code_mask = (1 << self.code_size) - 1;
                }
                old_code = Some(code);
            } else {
                return Err(DecodeError::Corrupt("illegal code in raster"));
            }
        }
    }

    /// Emit the string for `code`, root first.
    fn output(&mut self, code: u16, emit: &mut impl FnMut(u8)) {
        self.chain.clear();
        let mut at = Some(code);
        while let Some(c) = at {
            let entry = self.codes[c as usize];
            self.chain.push(entry.suffix);
            at = entry.prefix;
            if self.chain.len() > MAX_CODES {
                break;
            }
        }
        for &index in self.chain.iter().rev() {
            emit(index);
        }
    }
}
