//! Synthetic inputs for unit tests.

use alloc::vec;
use alloc::vec::Vec;

use enough::{Stop, StopReason};

/// A stop token that is always tripped.
pub(crate) struct AlwaysStop;

impl Stop for AlwaysStop {
    fn check(&self) -> Result<(), StopReason> {
        Err(StopReason::Cancelled)
    }
}

/// One code in a hand-built LZW stream.
#[derive(Clone, Copy, Debug)]
pub(crate) enum LzwToken {
    Clear,
    End,
    /// A root code (palette index).
    Lit(u8),
    /// Any code, written verbatim.
    Raw(u16),
}

/// Pack `tokens` LSB-first, growing the code width exactly as a decoder
/// tracking the dictionary would.
pub(crate) fn lzw_encode(min_code_size: u8, tokens: &[LzwToken]) -> Vec<u8> {
    let clear = 1u32 << min_code_size;
    let mut code_size = min_code_size as u32 + 1;
    let mut mask = (1u32 << code_size) - 1;
    let mut avail = clear + 2;
    let mut has_prev = false;

    let mut out = Vec::new();
    let mut bits = 0u64;
    let mut nbits = 0u32;
    let mut put = |code: u32, size: u32, out: &mut Vec<u8>| {
        bits |= (code as u64) << nbits;
        nbits += size;
        while nbits >= 8 {
            out.push(bits as u8);
            bits >>= 8;
            nbits -= 8;
        }
    };

    for &token in tokens {
        match token {
            LzwToken::Clear => {
                put(clear, code_size, &mut out);
                code_size = min_code_size as u32 + 1;
                mask = (1 << code_size) - 1;
                avail = clear + 2;
                has_prev = false;
            }
            LzwToken::End => put(clear + 1, code_size, &mut out),
            LzwToken::Lit(_) | LzwToken::Raw(_) => {
                let code = match token {
                    LzwToken::Lit(v) => v as u32,
                    LzwToken::Raw(c) => c as u32,
                    _ => unreachable!(),
                };
                put(code, code_size, &mut out);
                if has_prev {
                    avail += 1;
                }
                has_prev = true;
                if avail & mask == 0 && avail <= 0x0FFF {
                    code_size += 1;
                    mask = (1 << code_size) - 1;
                }
            }
        }
    }
    put(0, 7, &mut out);
    out
}

/// Split `data` into length-prefixed sub-blocks plus the terminator.
pub(crate) fn sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

/// Exponent field for a color table of `len` entries, and the padded
/// entry count it implies.
fn table_size(len: usize) -> (u8, usize) {
    let mut n = 0u8;
    while (2usize << n) < len {
        n += 1;
    }
    (n, 2 << n)
}

fn push_table(out: &mut Vec<u8>, table: &[[u8; 3]]) {
    let (_, padded) = table_size(table.len());
    for i in 0..padded {
        out.extend_from_slice(&table.get(i).copied().unwrap_or([0; 3]));
    }
}

/// One image descriptor plus its graphic control extension.
#[derive(Clone, Debug)]
pub(crate) struct GifFrame {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    indices: Vec<u8>,
    interlaced: bool,
    local: Option<Vec<[u8; 3]>>,
    transparent: Option<u8>,
    dispose: u8,
    delay: u16,
}

impl GifFrame {
    /// A frame at the origin. Indices are in stream order.
    pub(crate) fn full(width: u16, height: u16, indices: Vec<u8>) -> Self {
        Self::at(0, 0, width, height, indices)
    }

    pub(crate) fn at(x: u16, y: u16, width: u16, height: u16, indices: Vec<u8>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            indices,
            interlaced: false,
            local: None,
            transparent: None,
            dispose: 0,
            delay: 0,
        }
    }

    pub(crate) fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub(crate) fn local(mut self, table: Vec<[u8; 3]>) -> Self {
        self.local = Some(table);
        self
    }

    pub(crate) fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub(crate) fn dispose(mut self, method: u8) -> Self {
        self.dispose = method;
        self
    }

    pub(crate) fn delay(mut self, centiseconds: u16) -> Self {
        self.delay = centiseconds;
        self
    }
}

/// Builds a GIF89a stream block by block.
#[derive(Clone, Debug)]
pub(crate) struct GifBuilder {
    width: u16,
    height: u16,
    global: Option<Vec<[u8; 3]>>,
    background: u8,
    body: Vec<u8>,
}

impl GifBuilder {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            global: None,
            background: 0,
            body: Vec::new(),
        }
    }

    pub(crate) fn global(mut self, table: Vec<[u8; 3]>) -> Self {
        self.global = Some(table);
        self
    }

    pub(crate) fn background(mut self, index: u8) -> Self {
        self.background = index;
        self
    }

    pub(crate) fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub(crate) fn frame(mut self, frame: GifFrame) -> Self {
        let out = &mut self.body;
        let mut flags = frame.dispose << 2;
        if frame.transparent.is_some() {
            flags |= 1;
        }
        out.extend_from_slice(&[0x21, 0xF9, 4, flags]);
        out.extend_from_slice(&frame.delay.to_le_bytes());
        out.extend_from_slice(&[frame.transparent.unwrap_or(0), 0]);

        out.push(0x2C);
        for v in [frame.x, frame.y, frame.width, frame.height] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        let mut lflags = if frame.interlaced { 0x40 } else { 0 };
        if let Some(local) = &frame.local {
            lflags |= 0x80 | table_size(local.len()).0;
        }
        out.push(lflags);
        if let Some(local) = &frame.local {
            push_table(out, local);
        }

        let entries = frame
            .local
            .as_ref()
            .or(self.global.as_ref())
            .map_or(4, |t| table_size(t.len()).1);
        let mut min = 2u8;
        while (1usize << min) < entries {
            min += 1;
        }
        let mut tokens = vec![LzwToken::Clear];
        tokens.extend(frame.indices.iter().map(|&i| LzwToken::Lit(i)));
        tokens.push(LzwToken::End);
        out.push(min);
        out.extend(sub_blocks(&lzw_encode(min, &tokens)));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = b"GIF89a".to_vec();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let flags = match &self.global {
            Some(table) => 0x80 | table_size(table.len()).0,
            None => 0,
        };
        out.extend_from_slice(&[flags, self.background, 0]);
        if let Some(table) = &self.global {
            push_table(&mut out, table);
        }
        out.extend_from_slice(&self.body);
        out.push(0x3B);
        out
    }
}

/// Builds an RGB-mode PSD file.
#[derive(Clone, Debug)]
pub(crate) struct PsdBuilder {
    width: i32,
    height: i32,
    channels: Option<i16>,
    depth: u16,
    color_mode: u16,
    compression: u16,
    resources: Vec<u8>,
    planes: Vec<Vec<u8>>,
}

impl PsdBuilder {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            channels: None,
            depth: 8,
            color_mode: 3,
            compression: 0,
            resources: Vec::new(),
            planes: Vec::new(),
        }
    }

    /// Override the channel count (defaults to the number of planes).
    pub(crate) fn channels(mut self, channels: i16) -> Self {
        self.channels = Some(channels);
        self
    }

    pub(crate) fn depth(mut self, depth: u16) -> Self {
        self.depth = depth;
        self
    }

    pub(crate) fn color_mode(mut self, mode: u16) -> Self {
        self.color_mode = mode;
        self
    }

    /// 1 selects PackBits; planes must then be pre-packed.
    pub(crate) fn compression(mut self, compression: u16) -> Self {
        self.compression = compression;
        self
    }

    /// Payload for the image-resources section.
    pub(crate) fn resources(mut self, bytes: Vec<u8>) -> Self {
        self.resources = bytes;
        self
    }

    /// Append one channel plane exactly as stored.
    pub(crate) fn plane(mut self, bytes: Vec<u8>) -> Self {
        self.planes.push(bytes);
        self
    }

    /// Append a 16-bit plane, written big-endian.
    pub(crate) fn plane16(self, samples: &[u16]) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        self.plane(bytes)
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let channels = self.channels.unwrap_or(self.planes.len() as i16);
        let mut out = b"8BPS".to_vec();
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&[0; 6]);
        out.extend_from_slice(&channels.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.depth.to_be_bytes());
        out.extend_from_slice(&self.color_mode.to_be_bytes());
        // color mode data, image resources, layer and mask info
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&(self.resources.len() as i32).to_be_bytes());
        out.extend_from_slice(&self.resources);
        out.extend_from_slice(&0i32.to_be_bytes());
        out.extend_from_slice(&self.compression.to_be_bytes());
        if self.compression == 1 {
            let counts = self.height.max(0) as usize * channels.max(0) as usize;
            out.extend(core::iter::repeat_n(0u8, counts * 2));
        }
        for plane in &self.planes {
            out.extend_from_slice(plane);
        }
        out
    }
}

/// Builds a TGA file from raw header fields and payload.
#[derive(Clone, Debug)]
pub(crate) struct TgaBuilder {
    header: [u8; 18],
    id: Vec<u8>,
    colormap: Vec<u8>,
    data: Vec<u8>,
}

impl TgaBuilder {
    /// `image_type` as stored (1, 2, 3 or their RLE forms 9, 10, 11).
    /// The origin defaults to top-left.
    pub(crate) fn new(image_type: u8, width: u16, height: u16, bits: u8) -> Self {
        let mut header = [0u8; 18];
        header[2] = image_type;
        header[12..14].copy_from_slice(&width.to_le_bytes());
        header[14..16].copy_from_slice(&height.to_le_bytes());
        header[16] = bits;
        header[17] = 0x20;
        Self {
            header,
            id: Vec::new(),
            colormap: Vec::new(),
            data: Vec::new(),
        }
    }

    pub(crate) fn descriptor(mut self, descriptor: u8) -> Self {
        self.header[17] = descriptor;
        self
    }

    pub(crate) fn id(mut self, id: &[u8]) -> Self {
        self.id = id.to_vec();
        self
    }

    /// Attach a color map of `len` entries of `entry_bits` each, stored
    /// as `bytes`.
    pub(crate) fn colormap(mut self, len: u16, entry_bits: u8, bytes: Vec<u8>) -> Self {
        self.header[1] = 1;
        self.header[5..7].copy_from_slice(&len.to_le_bytes());
        self.header[7] = entry_bits;
        self.colormap = bytes;
        self
    }

    pub(crate) fn data(mut self, bytes: Vec<u8>) -> Self {
        self.data = bytes;
        self
    }

    pub(crate) fn header(&self) -> [u8; 18] {
        let mut header = self.header;
        header[0] = self.id.len() as u8;
        header
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut out = self.header().to_vec();
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.colormap);
        out.extend_from_slice(&self.data);
        out
    }
}
