//! GIF decoding: LZW rasters composited into an animation canvas.
//!
//! Every frame is returned as a full-canvas RGBA8 image (converted to the
//! requested shape) with earlier frames' disposal already applied.

mod canvas;
mod lzw;

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};
use crate::output::{Animation, Frame};
use crate::pixel::PixelBuffer;
use crate::reader::BinReader;
use crate::sink::Rect;
use crate::state::DecodeState;
use crate::traits::{ImageDecoder, ScanMode};
use crate::{CodecCapabilities, ImageFormat, Orientation};

use canvas::{Canvas, Disposal, Palette, Raster};
use lzw::Lzw;

const IMAGE_DESCRIPTOR: u8 = 0x2C;
const EXTENSION: u8 = 0x21;
const TRAILER: u8 = 0x3B;
const GRAPHIC_CONTROL: u8 = 0xF9;

static CAPABILITIES: CodecCapabilities = CodecCapabilities::new()
    .with_decode_cancel(true)
    .with_cheap_probe(true)
    .with_decode_animation(true)
    .with_enforces_max_pixels(true)
    .with_enforces_max_memory(true)
    .with_enforces_max_frames(true);

/// GIF87a / GIF89a decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct GifDecoder;

/// Logical screen descriptor fields needed after the header.
#[derive(Clone, Copy, Debug, Default)]
struct Screen {
    flags: u8,
    bg_index: u8,
}

impl Screen {
    fn has_global_table(&self) -> bool {
        self.flags & 0x80 != 0
    }

    fn global_table_len(&self) -> usize {
        2 << (self.flags & 7)
    }
}

/// Read `count` RGB triples into an opaque RGBA palette.
fn read_palette(reader: &mut BinReader<'_>, count: usize) -> Result<Palette> {
    let mut palette = [[0, 0, 0, 255]; 256];
    let mut rgb = [0u8; 3];
    for entry in palette.iter_mut().take(count) {
        reader.read_bytes(&mut rgb)?;
        *entry = [rgb[0], rgb[1], rgb[2], 255];
    }
    Ok(palette)
}

impl GifDecoder {
    /// Signature and logical screen descriptor. `None` means the
    /// signature did not match in a probe mode.
    fn parse_screen(
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<Option<Screen>> {
        state.reset_parsed();
        let matched = reader.read_u8()? == b'G'
            && reader.read_u8()? == b'I'
            && reader.read_u8()? == b'F'
            && reader.read_u8()? == b'8'
            && matches!(reader.read_u8()?, b'7' | b'9')
            && reader.read_u8()? == b'a';
        if !matched {
            return if mode.is_probe() {
                Ok(None)
            } else {
                Err(DecodeError::UnknownFormat("GIF"))
            };
        }
        if mode == ScanMode::Type {
            return Ok(Some(Screen::default()));
        }

        let width = reader.read_u16_le()?;
        let height = reader.read_u16_le()?;
        let screen = Screen {
            flags: reader.read_u8()?,
            bg_index: reader.read_u8()?,
        };
        let _aspect = reader.read_u8()?;
        if width == 0 || height == 0 {
            return Err(DecodeError::Corrupt("zero-size GIF canvas"));
        }

        state.width = width as u32;
        state.height = height as u32;
        state.native_depth = 8;
        state.native_components = 4;
        state.orientation = Orientation::Normal;
        state.format = Some(ImageFormat::Gif);
        log::debug!(
            "GIF screen {width}x{height} flags {:#04x} background {}",
            screen.flags,
            screen.bg_index
        );
        Ok(Some(screen))
    }

    /// Decode frames one at a time.
    ///
    /// The header is parsed and validated eagerly; each call to `next`
    /// then composites one more frame. The iterator ends at the trailer
    /// and yields at most one error.
    pub fn frames<'r, 'a, 'o>(
        &self,
        reader: &'r mut BinReader<'a>,
        state: &'r mut DecodeState<'o>,
    ) -> Result<Frames<'r, 'a, 'o>> {
        let session = Session::start(reader, state)?;
        Ok(Frames {
            reader,
            state,
            session,
            recent: [None, None],
            index: 0,
            done: false,
        })
    }

    /// Decode every frame, returning them with their delays.
    ///
    /// Fails with the first error; no partial animation is returned.
    pub fn load_animation(
        &self,
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
    ) -> Result<Animation> {
        let mut animation = Animation::default();
        for frame in self.frames(reader, state)? {
            animation.push(frame?);
        }
        if animation.is_empty() {
            return Err(DecodeError::Corrupt("GIF has no image data"));
        }
        Ok(animation)
    }
}

impl ImageDecoder for GifDecoder {
    fn format(&self) -> ImageFormat {
        ImageFormat::Gif
    }

    fn capabilities(&self) -> &'static CodecCapabilities {
        &CAPABILITIES
    }

    fn parse_header(
        &self,
        reader: &mut BinReader<'_>,
        state: &mut DecodeState<'_>,
        mode: ScanMode,
    ) -> Result<bool> {
        Ok(Self::parse_screen(reader, state, mode)?.is_some())
    }

    fn load(&self, reader: &mut BinReader<'_>, state: &mut DecodeState<'_>) -> Result<PixelBuffer> {
        let mut session = Session::start(reader, state)?;
        let Some(rect) = session.next_frame(reader, None)? else {
            return Err(DecodeError::Corrupt("GIF has no image data"));
        };
        let native = session.snapshot()?;
        state.progress(1.0, Some(rect));
        state.finish(native)
    }
}

/// Decoder state carried from one frame to the next.
struct Session {
    width: u32,
    height: u32,
    screen: Screen,
    global: Option<Palette>,
    canvas: Canvas,
    lzw: Lzw,
    /// Flags byte of the latest graphic control extension.
    control: u8,
    /// Delay of the latest graphic control extension, in centiseconds.
    delay: u16,
    transparent: Option<u8>,
    started: bool,
}

impl Session {
    fn start(reader: &mut BinReader<'_>, state: &mut DecodeState<'_>) -> Result<Self> {
        let Some(screen) = GifDecoder::parse_screen(reader, state, ScanMode::Load)? else {
            return Err(DecodeError::UnknownFormat("GIF"));
        };
        state.prepare()?;
        let global = if screen.has_global_table() {
            Some(read_palette(reader, screen.global_table_len())?)
        } else {
            None
        };
        Ok(Self {
            width: state.width,
            height: state.height,
            screen,
            global,
            canvas: Canvas::new(state.width, state.height)?,
            lzw: Lzw::new()?,
            control: 0,
            delay: 0,
            transparent: None,
            started: false,
        })
    }

    /// Dispose the previous frame, then read blocks until the next image
    /// is composited. Returns the frame's rectangle, or `None` at the
    /// trailer.
    fn next_frame(
        &mut self,
        reader: &mut BinReader<'_>,
        two_back: Option<&[u8]>,
    ) -> Result<Option<Rect>> {
        let first = !self.started;
        if !first {
            self.canvas.dispose(Disposal::from_flags(self.control), two_back);
        }
        self.canvas.start_frame();

        loop {
            match reader.read_u8()? {
                IMAGE_DESCRIPTOR => return self.read_image(reader, first).map(Some),
                EXTENSION => self.read_extension(reader)?,
                TRAILER => return Ok(None),
                tag => {
                    log::debug!("unknown GIF block tag {tag:#04x}");
                    return Err(DecodeError::Corrupt("unknown GIF block tag"));
                }
            }
        }
    }

    fn read_image(&mut self, reader: &mut BinReader<'_>, first: bool) -> Result<Rect> {
        let x = reader.read_u16_le()?;
        let y = reader.read_u16_le()?;
        let w = reader.read_u16_le()?;
        let h = reader.read_u16_le()?;
        if x as u32 + w as u32 > self.width || y as u32 + h as u32 > self.height {
            return Err(DecodeError::Corrupt("GIF frame outside the canvas"));
        }

        let flags = reader.read_u8()?;
        let mut palette = if flags & 0x80 != 0 {
            read_palette(reader, 2 << (flags & 7))?
        } else if let Some(global) = &self.global {
            *global
        } else {
            return Err(DecodeError::Corrupt("GIF frame has no color table"));
        };
        if let Some(t) = self.transparent {
            palette[t as usize][3] = 0;
        }
        log::trace!(
            "GIF frame at {x},{y} size {w}x{h} interlaced {} local table {}",
            flags & 0x40 != 0,
            flags & 0x80 != 0
        );

        let mut raster = Raster::new(x, y, w, h, flags & 0x40 != 0);
        let canvas = &mut self.canvas;
        self.lzw
            .decode(reader, |index| raster.paint(canvas, &palette, index))?;
        if raster.dropped() > 0 {
            log::warn!("ignored {} GIF pixels past the frame", raster.dropped());
        }

        if first
            && self.screen.bg_index > 0
            && let Some(global) = &self.global
        {
            let [r, g, b, _] = global[self.screen.bg_index as usize];
            self.canvas.fill_untouched([r, g, b, 255]);
        }
        self.started = true;
        Ok(Rect::new(x as u32, y as u32, w as u32, h as u32))
    }

    fn read_extension(&mut self, reader: &mut BinReader<'_>) -> Result<()> {
        let label = reader.read_u8()?;
        if label == GRAPHIC_CONTROL {
            let len = reader.read_u8()?;
            if len == 4 {
                self.control = reader.read_u8()?;
                self.delay = reader.read_u16_le()?;
                let index = reader.read_u8()?;
                self.transparent = (self.control & 0x01 != 0).then_some(index);
                log::trace!(
                    "GIF control: disposal {:?} delay {}cs transparent {:?}",
                    Disposal::from_flags(self.control),
                    self.delay,
                    self.transparent
                );
            } else {
                log::debug!("skipping GIF control extension of length {len}");
                reader.skip(len as u64)?;
            }
        } else {
            log::trace!("skipping GIF extension {label:#04x}");
        }
        loop {
            let len = reader.read_u8()?;
            if len == 0 {
                return Ok(());
            }
            reader.skip(len as u64)?;
        }
    }

    /// Copy the canvas into a fresh native-shape buffer.
    fn snapshot(&self) -> Result<PixelBuffer> {
        let mut out = PixelBuffer::new(self.width, self.height, 4, 8)?;
        out.as_bytes_mut().copy_from_slice(self.canvas.pixels());
        Ok(out)
    }
}

/// Iterator over composited GIF frames, created by [`GifDecoder::frames`].
pub struct Frames<'r, 'a, 'o> {
    reader: &'r mut BinReader<'a>,
    state: &'r mut DecodeState<'o>,
    session: Session,
    /// Native canvases of the previous two frames, newest first.
    recent: [Option<Vec<u8>>; 2],
    index: u32,
    done: bool,
}

impl Frames<'_, '_, '_> {
    fn step(&mut self) -> Result<Option<Frame>> {
        let two_back = self.recent[1].as_deref();
        let Some(rect) = self.session.next_frame(self.reader, two_back)? else {
            return Ok(None);
        };
        self.index += 1;
        self.state.limits.check_frames(self.index)?;

        let native = self.session.snapshot()?;
        let mut keep = self.recent[1].take().unwrap_or_default();
        keep.clear();
        keep.try_reserve_exact(native.len())?;
        keep.extend_from_slice(native.as_bytes());
        self.recent[1] = self.recent[0].take();
        self.recent[0] = Some(keep);

        let pixels = self.state.finish(native)?;
        self.state.progress(1.0, Some(rect));
        log::trace!("GIF frame {} done, delay {}cs", self.index - 1, self.session.delay);
        Ok(Some(Frame::new(pixels, self.session.delay, self.index - 1)))
    }
}

impl Iterator for Frames<'_, '_, '_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl core::fmt::Debug for Frames<'_, '_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Frames")
            .field("index", &self.index)
            .field("done", &self.done)
            .finish()
    }
}
