//! Vertical band detection.
//!
//! A speed transition shows up in a spectrogram as a faint vertical edge.
//! [`highlight`] turns that edge into a solid dark stripe and [`find_bands`]
//! extracts the column intervals of such stripes.

use crate::error::{Error, Result};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Half-open column interval `[start, end)` of dark pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band {
    /// First dark column.
    pub start: u32,
    /// One past the last dark column.
    pub end: u32,
}

impl Band {
    /// Number of columns covered by the band.
    pub fn width(&self) -> u32 {
        self.end - self.start
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Where each row of [`find_bands`] starts scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BandScanPolicy {
    /// After the first band, resume every row at the end of the last band found.
    ///
    /// Assumes transition stripes are close to vertical. A stripe that drifts
    /// left between rows is skipped.
    #[default]
    ResumeFromLastBand,
    /// Scan every row from column 0, recording each distinct interval once.
    FullRow,
}

/// Parameters for [`BandDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandParams {
    /// Pixels below this value become 0.
    pub low_threshold: u8,
    /// Value given to pixels at or above `low_threshold`.
    pub high_threshold: u8,
    /// Width of the dilation rectangle.
    pub h_size: u32,
    /// Height of the dilation rectangle.
    pub v_size: u32,
    /// Row scanning policy.
    pub policy: BandScanPolicy,
}

/// Highlight-then-extract band detector.
#[derive(Debug, Clone, Copy)]
pub struct BandDetector {
    params: BandParams,
}

impl BandDetector {
    /// Create a detector with the given parameters.
    pub fn new(params: BandParams) -> Self {
        Self { params }
    }

    /// Binarize and dilate `image`, then extract its dark bands.
    pub fn detect(&self, image: &GrayImage) -> Result<Vec<Band>> {
        let p = &self.params;
        let binary = highlight(image, p.low_threshold, p.high_threshold, p.h_size, p.v_size)?;
        Ok(find_bands(&binary, p.policy))
    }
}

/// Binarize `image` at `low_thresh` and dilate it with an `h_size` x `v_size` rectangle.
///
/// Pixels below `low_thresh` become 0, all others `high_thresh`. An output
/// pixel is the maximum over the rectangle anchored at `(h_size / 2, v_size / 2)`;
/// neighbors outside the image are ignored.
pub fn highlight(
    image: &GrayImage,
    low_thresh: u8,
    high_thresh: u8,
    h_size: u32,
    v_size: u32,
) -> Result<GrayImage> {
    if h_size == 0 || v_size == 0 {
        return Err(Error::geometry(format!(
            "dilation kernel must be non-empty, got {h_size}x{v_size}"
        )));
    }

    let (width, height) = image.dimensions();
    let binary: Vec<u8> = image
        .as_raw()
        .iter()
        .map(|&p| if p < low_thresh { 0 } else { high_thresh })
        .collect();

    let w = width as usize;
    let h = height as usize;
    let horizontal = dilate_horizontal(&binary, w, h, h_size as usize);
    let dilated = dilate_vertical(&horizontal, w, h, v_size as usize);

    GrayImage::from_raw(width, height, dilated)
        .ok_or_else(|| Error::geometry("dilated buffer does not match image dimensions"))
}

/// Running maximum along each row.
fn dilate_horizontal(src: &[u8], width: usize, height: usize, size: usize) -> Vec<u8> {
    let anchor = size / 2;
    let mut out = vec![0; src.len()];

    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let out_row = &mut out[y * width..(y + 1) * width];
        for (x, value) in out_row.iter_mut().enumerate() {
            let lo = x.saturating_sub(anchor);
            let hi = (x + size - anchor).min(width);
            *value = row[lo..hi].iter().copied().max().unwrap_or(0);
        }
    }

    out
}

/// Running maximum along each column.
fn dilate_vertical(src: &[u8], width: usize, height: usize, size: usize) -> Vec<u8> {
    let anchor = size / 2;
    let mut out = vec![0; src.len()];

    for y in 0..height {
        let lo = y.saturating_sub(anchor);
        let hi = (y + size - anchor).min(height);
        for x in 0..width {
            out[y * width + x] = (lo..hi).map(|yy| src[yy * width + x]).max().unwrap_or(0);
        }
    }

    out
}

/// Extract runs of dark (zero) columns from a binarized image.
///
/// Rows are scanned top to bottom and columns left to right. Every dark run
/// is recorded as `[start, end)` and scanning continues at `end`. Bands are
/// returned in discovery order; see [`BandScanPolicy`] for where each row
/// starts.
pub fn find_bands(binary: &GrayImage, policy: BandScanPolicy) -> Vec<Band> {
    let (width, height) = binary.dimensions();
    let raw = binary.as_raw();
    let w = width as usize;
    let mut bands: Vec<Band> = Vec::new();

    for y in 0..height as usize {
        let row = &raw[y * w..(y + 1) * w];

        let mut x = match (policy, bands.last()) {
            (BandScanPolicy::ResumeFromLastBand, Some(last)) => last.end,
            _ => 0,
        };

        while x < width {
            if row[x as usize] != 0 {
                x += 1;
                continue;
            }

            let start = x;
            while x < width && row[x as usize] == 0 {
                x += 1;
            }
            let band = Band { start, end: x };

            if policy == BandScanPolicy::FullRow && bands.contains(&band) {
                continue;
            }
            bands.push(band);
        }
    }

    bands
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Luma;

    fn image_from_rows(rows: &[&[u8]]) -> GrayImage {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        let data: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        GrayImage::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_band_width() {
        assert_eq!(Band { start: 2, end: 7 }.width(), 5);
        assert_eq!(Band { start: 2, end: 7 }.to_string(), "[2, 7)");
    }

    #[test]
    fn test_highlight_thresholds_at_low_cut() {
        let image = image_from_rows(&[&[0, 14, 15, 200]]);
        let out = highlight(&image, 15, 255, 1, 1).unwrap();
        assert_eq!(out.as_raw(), &vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_highlight_uses_high_threshold_value() {
        let image = image_from_rows(&[&[50, 3]]);
        let out = highlight(&image, 10, 128, 1, 1).unwrap();
        assert_eq!(out.as_raw(), &vec![128, 0]);
    }

    #[test]
    fn test_highlight_dilates_horizontally() {
        let image = image_from_rows(&[&[0, 0, 0, 200, 0, 0, 0]]);
        let out = highlight(&image, 15, 255, 3, 1).unwrap();
        assert_eq!(out.as_raw(), &vec![0, 0, 255, 255, 255, 0, 0]);
    }

    #[test]
    fn test_highlight_even_kernel_anchor() {
        // Width 2 anchors at 1: the neighborhood of x is [x - 1, x].
        let image = image_from_rows(&[&[0, 0, 200, 0, 0]]);
        let out = highlight(&image, 15, 255, 2, 1).unwrap();
        assert_eq!(out.as_raw(), &vec![0, 0, 255, 255, 0]);
    }

    #[test]
    fn test_highlight_bridges_vertical_gaps() {
        // Bright column with a two-pixel gap closes under a tall kernel.
        let image = image_from_rows(&[
            &[0, 200, 0],
            &[0, 0, 0],
            &[0, 0, 0],
            &[0, 200, 0],
        ]);
        let out = highlight(&image, 15, 255, 1, 5).unwrap();
        for y in 0..4 {
            assert_eq!(out.get_pixel(1, y), &Luma([255]));
            assert_eq!(out.get_pixel(0, y), &Luma([0]));
        }
    }

    #[test]
    fn test_highlight_rejects_empty_kernel() {
        let image = image_from_rows(&[&[1, 2]]);
        assert!(matches!(
            highlight(&image, 15, 255, 0, 3),
            Err(Error::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_find_bands_single_row() {
        let image = image_from_rows(&[&[255, 0, 0, 255, 0, 255]]);
        let bands = find_bands(&image, BandScanPolicy::ResumeFromLastBand);
        assert_eq!(bands, vec![Band { start: 1, end: 3 }, Band { start: 4, end: 5 }]);
    }

    #[test]
    fn test_find_bands_run_to_right_edge() {
        let image = image_from_rows(&[&[255, 255, 0, 0]]);
        let bands = find_bands(&image, BandScanPolicy::ResumeFromLastBand);
        assert_eq!(bands, vec![Band { start: 2, end: 4 }]);
    }

    #[test]
    fn test_find_bands_resume_skips_drifting_band() {
        let image = image_from_rows(&[
            &[255, 255, 255, 0, 255, 255],
            &[255, 0, 255, 255, 255, 255],
        ]);
        let resumed = find_bands(&image, BandScanPolicy::ResumeFromLastBand);
        assert_eq!(resumed, vec![Band { start: 3, end: 4 }]);

        let full = find_bands(&image, BandScanPolicy::FullRow);
        assert_eq!(full, vec![Band { start: 3, end: 4 }, Band { start: 1, end: 2 }]);
    }

    #[test]
    fn test_find_bands_full_row_deduplicates() {
        let image = image_from_rows(&[&[255, 0, 255], &[255, 0, 255], &[255, 0, 255]]);
        let bands = find_bands(&image, BandScanPolicy::FullRow);
        assert_eq!(bands, vec![Band { start: 1, end: 2 }]);
    }

    #[test]
    fn test_find_bands_empty_image() {
        let image = GrayImage::new(0, 0);
        assert!(find_bands(&image, BandScanPolicy::ResumeFromLastBand).is_empty());
    }

    #[test]
    fn test_detector_on_faint_edge() {
        // Bright image split by a two-pixel dark stripe.
        let mut image = GrayImage::from_pixel(12, 30, Luma([200]));
        for y in 0..30 {
            image.put_pixel(6, y, Luma([3]));
            image.put_pixel(7, y, Luma([3]));
        }
        let detector = BandDetector::new(BandParams {
            low_threshold: 15,
            high_threshold: 255,
            h_size: 1,
            v_size: 20,
            policy: BandScanPolicy::ResumeFromLastBand,
        });
        let bands = detector.detect(&image).unwrap();
        assert_eq!(bands, vec![Band { start: 6, end: 8 }]);
    }
}
