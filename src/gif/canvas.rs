//! Frame compositing and disposal.

use alloc::vec::Vec;

use crate::error::Result;
use crate::pixel::try_zeroed_vec;

/// 256 RGBA8 entries.
pub(crate) type Palette = [[u8; 4]; 256];

/// Disposal method as stored in the graphic control extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Disposal {
    /// 0 and 1, plus reserved values: leave the canvas alone.
    Keep,
    /// 2: restore touched pixels to the pre-frame background.
    Background,
    /// 3: restore touched pixels to the frame two steps back.
    Previous,
}

impl Disposal {
    pub(crate) fn from_flags(flags: u8) -> Self {
        match (flags & 0x1C) >> 2 {
            2 => Self::Background,
            3 => Self::Previous,
            _ => Self::Keep,
        }
    }
}

/// The RGBA8 animation canvas with its per-frame bookkeeping.
pub(crate) struct Canvas {
    width: usize,
    pixels: Vec<u8>,
    /// Canvas as it was before the current frame drew.
    background: Vec<u8>,
    /// Pixels the current frame painted.
    history: Vec<bool>,
}

impl Canvas {
    /// A zeroed (transparent black) canvas. The caller runs the size
    /// guard first.
    pub(crate) fn new(width: u32, height: u32) -> Result<Self> {
        let count = width as usize * height as usize;
        let mut history = Vec::new();
        history.try_reserve_exact(count)?;
        history.resize(count, false);
        Ok(Self {
            width: width as usize,
            pixels: try_zeroed_vec(count * 4)?,
            background: try_zeroed_vec(count * 4)?,
            history,
        })
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Undo the previous frame according to `method`, then snapshot the
    /// result as the background for the next frame.
    ///
    /// `two_back` is the composited frame two steps before the one about
    /// to be drawn; without it [`Disposal::Previous`] behaves like
    /// [`Disposal::Background`].
    pub(crate) fn dispose(&mut self, method: Disposal, two_back: Option<&[u8]>) {
        let source = match (method, two_back) {
            (Disposal::Keep, _) => None,
            (Disposal::Previous, Some(frame)) => Some(frame),
            (Disposal::Previous, None) | (Disposal::Background, _) => Some(&self.background[..]),
        };
        if let Some(source) = source {
            for (i, _) in self.history.iter().enumerate().filter(|(_, t)| **t) {
                self.pixels[i * 4..i * 4 + 4].copy_from_slice(&source[i * 4..i * 4 + 4]);
            }
        }
        self.background.copy_from_slice(&self.pixels);
    }

    /// Forget which pixels the previous frame touched.
    pub(crate) fn start_frame(&mut self) {
        self.history.fill(false);
    }

    /// Paint one pixel. Colors with alpha below 128 are transparent and
    /// leave both the canvas and the history untouched.
    #[inline]
    pub(crate) fn plot(&mut self, index: usize, color: [u8; 4]) {
        if color[3] >= 128 {
            self.pixels[index * 4..index * 4 + 4].copy_from_slice(&color);
            self.history[index] = true;
        }
    }

    /// Paint every pixel this frame left untouched.
    pub(crate) fn fill_untouched(&mut self, color: [u8; 4]) {
        for (px, _) in self
            .pixels
            .chunks_exact_mut(4)
            .zip(self.history.iter())
            .filter(|(_, t)| !**t)
        {
            px.copy_from_slice(&color);
        }
    }

    /// Number of pixels touched by the current frame.
    #[cfg(test)]
    pub(crate) fn touched(&self) -> usize {
        self.history.iter().filter(|t| **t).count()
    }
}

/// Write cursor for one image descriptor's raster, in canvas pixels.
///
/// Interlaced images are written in four passes: every 8th row from 0,
/// every 8th from 4, every 4th from 2, every 2nd from 1.
#[derive(Debug)]
pub(crate) struct Raster {
    start_x: usize,
    start_y: usize,
    max_x: usize,
    max_y: usize,
    cur_x: usize,
    cur_y: usize,
    step: usize,
    parse: u8,
    /// Indices that arrived after the last row.
    dropped: usize,
}

impl Raster {
    pub(crate) fn new(x: u16, y: u16, width: u16, height: u16, interlaced: bool) -> Self {
        let (start_x, start_y) = (x as usize, y as usize);
        let max_y = start_y + height as usize;
        Self {
            start_x,
            start_y,
            max_x: start_x + width as usize,
            max_y,
            cur_x: start_x,
            // nothing to paint for an empty row
            cur_y: if width == 0 { max_y } else { start_y },
            step: if interlaced { 8 } else { 1 },
            parse: if interlaced { 3 } else { 0 },
            dropped: 0,
        }
    }

    /// Paint palette entry `index` at the cursor and advance. Indices
    /// past the end of the frame are dropped.
    #[inline]
    pub(crate) fn paint(&mut self, canvas: &mut Canvas, palette: &Palette, index: u8) {
        if self.cur_y >= self.max_y {
            self.dropped += 1;
            return;
        }
        canvas.plot(self.cur_y * canvas.width() + self.cur_x, palette[index as usize]);

        self.cur_x += 1;
        if self.cur_x >= self.max_x {
            self.cur_x = self.start_x;
            self.cur_y += self.step;
            while self.cur_y >= self.max_y && self.parse > 0 {
                self.step = 1 << self.parse;
                self.cur_y = self.start_y + (self.step >> 1);
                self.parse -= 1;
            }
        }
    }

    /// Number of indices ignored because the frame was already full.
    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }

    /// Whether every row of the frame has been written.
    pub(crate) fn is_complete(&self) -> bool {
        self.cur_y >= self.max_y
    }
}
