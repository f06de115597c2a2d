//! Input collection and output naming.

use crate::config::OutputFormat;
use crate::constants::{IMAGE_EXTENSIONS, naming};
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Result of checking whether a file should be processed.
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessCheck {
    /// File should be processed.
    Process,
    /// Skip - output already exists.
    SkipExists,
}

/// Determine the output directory for a file.
pub fn output_dir_for(input: &Path, explicit_output_dir: Option<&Path>) -> PathBuf {
    explicit_output_dir.map_or_else(
        || {
            input
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        },
        Path::to_path_buf,
    )
}

/// File stem of `input`, lossily decoded.
pub fn file_stem(input: &Path) -> Cow<'_, str> {
    input
        .file_stem()
        .map_or(Cow::Borrowed("output"), |s| s.to_string_lossy())
}

/// Get output file path for a given format.
pub fn output_path_for(input: &Path, output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{}{}", file_stem(input), format.extension()))
}

/// Directory receiving the window images of `input`.
pub fn windows_dir_for(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}{}", file_stem(input), naming::WINDOWS_DIR_SUFFIX))
}

/// Path of window `index` cut from `input`: `<dir>/<stem>_<index>.png`.
pub fn window_image_path(input: &Path, dir: &Path, index: usize) -> PathBuf {
    dir.join(format!(
        "{}_{index}.{}",
        file_stem(input),
        naming::IMAGE_EXTENSION
    ))
}

/// Paths of the halves of a divided spectrogram.
///
/// Returns `(<out>/c/c_<name>, <out>/w/w_<name>)`.
pub fn split_paths(input: &Path, output_dir: &Path) -> (PathBuf, PathBuf) {
    let name = input
        .file_name()
        .map_or(Cow::Borrowed("output.png"), |n| n.to_string_lossy());
    (
        output_dir
            .join(naming::BEFORE_DIR)
            .join(format!("{}{name}", naming::BEFORE_PREFIX)),
        output_dir
            .join(naming::AFTER_DIR)
            .join(format!("{}{name}", naming::AFTER_PREFIX)),
    )
}

/// Check if a file should be processed.
pub fn should_process(
    input: &Path,
    output_dir: &Path,
    formats: &[OutputFormat],
    force: bool,
) -> ProcessCheck {
    if !force {
        let all_exist = formats
            .iter()
            .all(|fmt| output_path_for(input, output_dir, *fmt).exists());
        if all_exist {
            return ProcessCheck::SkipExists;
        }
    }

    ProcessCheck::Process
}

/// Create `dir` and its parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::OutputDirCreateFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Fail when `output_dir` is the directory `input` lives in.
pub fn check_distinct_dirs(input: &Path, output_dir: &Path) -> Result<()> {
    let input_dir = output_dir_for(input, None);
    let (Ok(a), Ok(b)) = (input_dir.canonicalize(), output_dir.canonicalize()) else {
        // The output directory does not exist yet, so it cannot be the input's.
        return Ok(());
    };
    if a == b {
        return Err(Error::SameInputOutput { path: a });
    }
    Ok(())
}

/// Collect spectrogram images from paths (files and directories).
///
/// Directories are walked recursively; the result is sorted.
pub fn collect_input_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_image_file(path) {
                files.push(path.clone());
            } else {
                warn!("Skipping non-image file: {}", path.display());
            }
        } else if path.is_dir() {
            collect_image_files_recursive(path, &mut files)?;
        } else {
            warn!("Skipping non-existent path: {}", path.display());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn collect_image_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_image_files_recursive(&path, files)?;
        } else if is_image_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

/// Check if a file is a supported spectrogram image.
fn is_image_file(path: &Path) -> bool {
    use std::ffi::OsStr;

    path.extension().is_some_and(|ext| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(OsStr::new(known)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_for_with_explicit() {
        let input = Path::new("/data/tape.png");
        let output = output_dir_for(input, Some(Path::new("/results")));
        assert_eq!(output, PathBuf::from("/results"));
    }

    #[test]
    fn test_output_dir_for_without_explicit() {
        let output = output_dir_for(Path::new("/data/tape.png"), None);
        assert_eq!(output, PathBuf::from("/data"));
    }

    #[test]
    fn test_output_path_for_formats() {
        let input = Path::new("/data/spec_ch0.png");
        let out = Path::new("/out");
        assert_eq!(
            output_path_for(input, out, OutputFormat::Log),
            PathBuf::from("/out/spec_ch0.events.txt")
        );
        assert_eq!(
            output_path_for(input, out, OutputFormat::Json),
            PathBuf::from("/out/spec_ch0.events.json")
        );
    }

    #[test]
    fn test_window_paths() {
        let input = Path::new("/data/tape.png");
        let dir = windows_dir_for(input, Path::new("/out"));
        assert_eq!(dir, PathBuf::from("/out/tape_windows"));
        assert_eq!(
            window_image_path(input, &dir, 11),
            PathBuf::from("/out/tape_windows/tape_11.png")
        );
    }

    #[test]
    fn test_split_paths() {
        let (left, right) = split_paths(Path::new("/data/reel 3.png"), Path::new("/out"));
        assert_eq!(left, PathBuf::from("/out/c/c_reel 3.png"));
        assert_eq!(right, PathBuf::from("/out/w/w_reel 3.png"));
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("tape.png")));
        assert!(is_image_file(Path::new("TAPE.PNG")));
        assert!(!is_image_file(Path::new("tape.wav")));
        assert!(!is_image_file(Path::new("tape")));
    }

    #[test]
    fn test_collect_input_files_recurses_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.wav"), b"").unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"").unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png", "nested/c.png"]);
    }

    #[test]
    fn test_should_process_skips_existing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tape.png");
        let formats = [OutputFormat::Log];

        assert_eq!(
            should_process(&input, dir.path(), &formats, false),
            ProcessCheck::Process
        );
        std::fs::write(dir.path().join("tape.events.txt"), b"").unwrap();
        assert_eq!(
            should_process(&input, dir.path(), &formats, false),
            ProcessCheck::SkipExists
        );
        assert_eq!(
            should_process(&input, dir.path(), &formats, true),
            ProcessCheck::Process
        );
    }

    #[test]
    fn test_check_distinct_dirs() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tape.png");
        assert!(matches!(
            check_distinct_dirs(&input, dir.path()),
            Err(Error::SameInputOutput { .. })
        ));
        assert!(check_distinct_dirs(&input, &dir.path().join("out")).is_ok());
    }
}
