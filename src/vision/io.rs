//! Loading and saving grayscale spectrogram images.

use crate::error::{Error, Result};
use image::GrayImage;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert it to 8-bit grayscale.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|e| Error::ImageOpen {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(image.into_luma8())
}

/// Save a grayscale image, creating parent directories as needed.
///
/// The format follows the file extension.
pub fn save_grayscale(image: &GrayImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::OutputDirCreateFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    image.save(path).map_err(|e| Error::ImageSave {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_save_then_load_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("spec.png");
        let image = GrayImage::from_fn(16, 4, |x, y| Luma([(x * 4 + y) as u8]));

        save_grayscale(&image, &path).unwrap();
        let loaded = load_grayscale(&path).unwrap();

        assert_eq!(loaded.dimensions(), (16, 4));
        assert_eq!(loaded.as_raw(), image.as_raw());
    }

    #[test]
    fn test_load_converts_color_to_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        RgbImage::from_pixel(3, 2, Rgb([0, 0, 0])).save(&path).unwrap();

        let loaded = load_grayscale(&path).unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert!(loaded.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_grayscale(Path::new("/nonexistent/spec.png"));
        assert!(matches!(result, Err(Error::ImageOpen { .. })));
    }
}
