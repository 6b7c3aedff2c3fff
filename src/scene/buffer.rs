use std::path::Path;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageBuffer, ImageError, ImageFormat, Rgb};

use super::color::ColorRGB;
use crate::error::{Error, Result};

/// Color and depth buffers of one frame, both row major with (0, 0) in the top left corner.
/// Pixels are packed 0x00RRGGBB, depth is camera space z with f32::MAX meaning "nothing drawn".
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    depth: Vec<f32>,
}

/// Mutable view of consecutive full rows of a frame buffer.
/// `pixels` and `depth` start at row `row_start`.
pub struct BandView<'a> {
    pub row_start: usize,
    pub width: usize,
    pub pixels: &'a mut [u32],
    pub depth: &'a mut [f32],
}

impl<'a> BandView<'a> {
    /// One past the last row covered by the view.
    pub fn row_end(&self) -> usize {
        return self.row_start + self.pixels.len() / self.width;
    }
}

/// Owned copy of consecutive rows, which can be sent to a worker thread and merged back.
pub struct Band {
    pub row_start: usize,
    pub width: usize,
    pub pixels: Vec<u32>,
    pub depth: Vec<f32>,
}

impl Band {
    pub fn as_view(&mut self) -> BandView<'_> {
        return BandView {
            row_start: self.row_start,
            width: self.width,
            pixels: &mut self.pixels,
            depth: &mut self.depth,
        };
    }
}

/// Allocates a buffer of `len` copies of `value`, reporting allocation failure instead of aborting.
fn try_filled_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, value);
    return Ok(buffer);
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyViewport(width, height));
        }
        if u32::try_from(width).is_err() || u32::try_from(height).is_err() {
            return Err(Error::ViewportTooLarge(width, height));
        }
        let n_pixels = width
            .checked_mul(height)
            .ok_or(Error::ViewportTooLarge(width, height))?;

        return Ok(Self {
            width,
            height,
            pixels: try_filled_vec(n_pixels, 0)?,
            depth: try_filled_vec(n_pixels, f32::MAX)?,
        });
    }

    pub fn width(&self) -> usize {
        return self.width;
    }

    pub fn height(&self) -> usize {
        return self.height;
    }

    /// Fills the color buffer with `background` and resets every depth value to f32::MAX.
    pub fn clear(&mut self, background: ColorRGB) {
        self.pixels.fill(background.to_packed());
        self.depth.fill(f32::MAX);
    }

    /// Packed color at (x, y). Panics outside of the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        return self.pixels[x + y * self.width];
    }

    /// Depth at (x, y). Panics outside of the buffer.
    pub fn depth(&self, x: usize, y: usize) -> f32 {
        return self.depth[x + y * self.width];
    }

    pub fn pixels(&self) -> &[u32] {
        return &self.pixels;
    }

    pub fn depths(&self) -> &[f32] {
        return &self.depth;
    }

    /// The whole frame as a single band.
    pub fn as_view(&mut self) -> BandView<'_> {
        return BandView {
            row_start: 0,
            width: self.width,
            pixels: &mut self.pixels,
            depth: &mut self.depth,
        };
    }

    /// Copies the frame into bands of `band_rows` rows, the last one possibly shorter.
    // @OPTI copying is the price for handing 'static buffers to the thread pool. Could be avoided
    // with scoped threads.
    pub fn split_bands(&self, band_rows: usize) -> Vec<Band> {
        let band_len = band_rows.max(1) * self.width;
        return self
            .pixels
            .chunks(band_len)
            .zip(self.depth.chunks(band_len))
            .enumerate()
            .map(|(i, (pixels, depth))| Band {
                row_start: i * band_rows.max(1),
                width: self.width,
                pixels: pixels.to_vec(),
                depth: depth.to_vec(),
            })
            .collect();
    }

    /// Writes a band produced by `split_bands` back into the frame.
    pub fn merge_band(&mut self, band: &Band) {
        let start = band.row_start * self.width;
        let end = start + band.pixels.len();
        self.pixels[start..end].copy_from_slice(&band.pixels);
        self.depth[start..end].copy_from_slice(&band.depth);
    }

    /// Color buffer as tightly packed rgb8 rows.
    pub fn to_rgb8(&self) -> Vec<u8> {
        return self
            .pixels
            .iter()
            .flat_map(|&pixel| ColorRGB::unpack_rgb8(pixel))
            .collect();
    }

    /// Depth buffer as a grayscale rgb8 image, nearest surface white, farthest dark.
    /// Pixels nothing was drawn to are black. Values are normalized only when this is called.
    pub fn depth_to_rgb8(&self) -> Vec<u8> {
        let drawn = self.depth.iter().copied().filter(|z| *z < f32::MAX);
        let (z_min, z_max) = drawn.fold((f32::MAX, f32::MIN), |(lo, hi), z| (lo.min(z), hi.max(z)));
        let scale = z_max - z_min;

        return self
            .depth
            .iter()
            .flat_map(|&z| {
                let value = if z == f32::MAX {
                    0
                } else if scale > 0.0 {
                    (64.0 + 191.0 * (z_max - z) / scale) as u8
                } else {
                    255
                };
                [value, value, value]
            })
            .collect();
    }

    /// Exports the color buffer as a bitmap.
    pub fn save_bmp<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(self.width as u32, self.height as u32, self.to_rgb8()).ok_or_else(|| {
                ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch))
            })?;
        image.save_with_format(path, ImageFormat::Bmp)?;

        return Ok(());
    }
}
