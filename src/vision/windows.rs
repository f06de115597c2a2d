//! Fixed-width, fixed-stride windows over a spectrogram.

use crate::error::{Error, Result};
use image::{GrayImage, imageops};

/// Window geometry shared by segmentation and scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    /// Distance between consecutive window offsets in pixels.
    pub step: u32,
    /// Width of every window in pixels.
    pub window_width: u32,
    /// Offset of the first window in pixels.
    pub offset: u32,
}

impl WindowParams {
    /// Reject a zero step or zero window width.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            return Err(Error::geometry("window step must be at least 1"));
        }
        if self.window_width == 0 {
            return Err(Error::geometry("window width must be at least 1"));
        }
        Ok(())
    }

    /// Number of windows [`segment`] emits for an image of `width` pixels.
    ///
    /// A window whose right edge lands exactly on `width` is not emitted.
    pub fn window_count(&self, width: u32) -> usize {
        let reach = u64::from(self.offset) + u64::from(self.window_width);
        let width = u64::from(width);
        if self.step == 0 || width <= reach {
            return 0;
        }
        let count = (width - reach - 1) / u64::from(self.step) + 1;
        usize::try_from(count).unwrap_or(usize::MAX)
    }
}

/// Borrowed full-height slice of a spectrogram.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    source: &'a GrayImage,
    index: usize,
    offset: u32,
    width: u32,
}

impl<'a> Window<'a> {
    fn new(source: &'a GrayImage, index: usize, offset: u32, width: u32) -> Self {
        Self {
            source,
            index,
            offset,
            width,
        }
    }

    /// View an entire image as the window at `index`.
    pub(crate) fn whole(source: &'a GrayImage, index: usize) -> Self {
        Self::new(source, index, 0, source.width())
    }

    /// Position of the window in its sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// First source column covered by the window.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels (always the source height).
    pub fn height(&self) -> u32 {
        self.source.height()
    }

    /// Pixels of row `y` inside the window.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let stride = self.source.width() as usize;
        let start = y as usize * stride + self.offset as usize;
        &self.source.as_raw()[start..start + self.width as usize]
    }

    /// Rows of the window from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let window = *self;
        (0..window.height()).map(move |y| window.row(y))
    }

    /// Copy the window into an owned image.
    pub fn to_image(&self) -> GrayImage {
        imageops::crop_imm(self.source, self.offset, 0, self.width, self.height()).to_image()
    }
}

/// Cut `image` into windows.
///
/// With `emit_all` the windows start at `offset + i * step` for as long as
/// `offset + i * step + window_width < width`. Without it, a single window at
/// `offset` is returned.
pub fn segment<'a>(
    image: &'a GrayImage,
    params: &WindowParams,
    emit_all: bool,
) -> Result<Vec<Window<'a>>> {
    params.validate()?;
    let width = image.width();

    if !emit_all {
        let fits = params
            .offset
            .checked_add(params.window_width)
            .is_some_and(|end| end <= width);
        if !fits {
            return Err(Error::geometry(format!(
                "window [{}, {}) exceeds image width {width}",
                params.offset,
                u64::from(params.offset) + u64::from(params.window_width)
            )));
        }
        return Ok(vec![Window::new(image, 0, params.offset, params.window_width)]);
    }

    let mut windows = Vec::with_capacity(params.window_count(width));
    let mut offset = u64::from(params.offset);
    while offset + u64::from(params.window_width) < u64::from(width) {
        let start = u32::try_from(offset)
            .map_err(|_| Error::geometry(format!("window offset {offset} overflows")))?;
        windows.push(Window::new(image, windows.len(), start, params.window_width));
        offset += u64::from(params.step);
    }

    Ok(windows)
}
