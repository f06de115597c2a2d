//! Single file processing for the scan, divide and segment workflows.

use crate::audio::resolve_duration;
use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::inference::WindowClassifier;
use crate::output::{
    AnomalyEvent, CsvWriter, EventLogWriter, JsonResultWriter, OutputWriter, progress,
};
use crate::pipeline::{
    ensure_dir, output_path_for, scan, split_paths, window_image_path, windows_dir_for,
};
use crate::vision::{
    Band, BandDetector, BandParams, BandSelection, WindowParams, divide, load_grayscale,
    save_grayscale, segment,
};
use indicatif::MultiProgress;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Options for scanning one spectrogram.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Output directory (None = same as input).
    pub output_dir: Option<PathBuf>,
    /// Output formats to generate.
    pub formats: Vec<OutputFormat>,
    /// Window geometry.
    pub window: WindowParams,
    /// Recording duration in seconds, overriding audio lookup.
    pub duration_secs: Option<f64>,
    /// Audio file to read the duration from.
    pub audio: Option<PathBuf>,
    /// Also write every window image.
    pub save_windows: bool,
    /// Show a per-file window progress bar.
    pub progress_enabled: bool,
}

/// Result of scanning a single file.
#[derive(Debug)]
pub struct ScanResult {
    /// Number of events found.
    pub events: usize,
    /// Number of windows classified.
    pub windows: usize,
    /// Processing duration in seconds.
    pub duration_secs: f64,
    /// Recording duration in seconds.
    pub audio_duration_secs: f64,
}

/// Scan a spectrogram and write its event outputs.
///
/// Outputs are written only after the whole scan succeeded. Every error is
/// wrapped in [`Error::ScanFailed`] with the input path.
pub fn process_scan_file<C>(
    input_path: &Path,
    options: &ScanOptions,
    classifier: &C,
    multi_progress: &MultiProgress,
) -> Result<ScanResult>
where
    C: WindowClassifier + ?Sized,
{
    scan_file(input_path, options, classifier, multi_progress).map_err(|e| Error::ScanFailed {
        path: input_path.to_path_buf(),
        source: Box::new(e),
    })
}

fn scan_file<C>(
    input_path: &Path,
    options: &ScanOptions,
    classifier: &C,
    multi_progress: &MultiProgress,
) -> Result<ScanResult>
where
    C: WindowClassifier + ?Sized,
{
    let start_time = Instant::now();
    info!("Scanning: {}", input_path.display());

    let audio_duration_secs =
        resolve_duration(input_path, options.duration_secs, options.audio.as_deref())?;
    let image = load_grayscale(input_path)?;
    debug!(
        "Loaded {}x{} spectrogram covering {audio_duration_secs}s",
        image.width(),
        image.height()
    );

    let file_name = input_path
        .file_name()
        .map_or_else(|| input_path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let window_count = options.window.window_count(image.width());
    let window_progress =
        progress::create_window_progress(window_count, &file_name, options.progress_enabled)
            .map(|pb| multi_progress.add(pb));

    let scanned = scan(
        &image,
        audio_duration_secs,
        &options.window,
        classifier,
        window_progress.as_ref(),
    );
    if let Some(pb) = &window_progress {
        multi_progress.remove(pb);
    }
    progress::finish_progress(window_progress, "Scan complete");
    let events = scanned?;

    for event in &events {
        info!("{event}");
    }

    let output_dir = super::output_dir_for(input_path, options.output_dir.as_deref());
    ensure_dir(&output_dir)?;

    if options.save_windows {
        save_windows(input_path, &image, &output_dir, &options.window)?;
    }

    let mut staged = Vec::with_capacity(options.formats.len());
    for format in &options.formats {
        let written = write_output(
            input_path,
            &output_dir,
            *format,
            &file_name,
            audio_duration_secs,
            &options.window,
            &events,
        );
        match written {
            Ok(paths) => staged.push(paths),
            Err(e) => {
                discard_staged(&staged);
                return Err(e);
            }
        }
    }
    for (staging, output) in &staged {
        std::fs::rename(staging, output)?;
    }

    let duration_secs = start_time.elapsed().as_secs_f64();
    #[allow(clippy::cast_precision_loss)]
    let windows_per_sec = if duration_secs > 0.0 {
        window_count as f64 / duration_secs
    } else {
        0.0
    };
    info!(
        "Found {} events in {} windows in {:.2}s ({:.1} windows/sec)",
        events.len(),
        window_count,
        duration_secs,
        windows_per_sec
    );

    Ok(ScanResult {
        events: events.len(),
        windows: window_count,
        duration_secs,
        audio_duration_secs,
    })
}

/// Write every scan window of `image` under `<out>/<stem>_windows/`.
fn save_windows(
    input_path: &Path,
    image: &image::GrayImage,
    output_dir: &Path,
    params: &WindowParams,
) -> Result<()> {
    let dir = windows_dir_for(input_path, output_dir);
    ensure_dir(&dir)?;
    for window in segment(image, params, true)? {
        save_grayscale(
            &window.to_image(),
            &window_image_path(input_path, &dir, window.index()),
        )?;
    }
    debug!("Saved windows to {}", dir.display());
    Ok(())
}

/// Temporary sibling an output is written to before it is moved into place.
fn staging_path_for(output_path: &Path) -> PathBuf {
    let mut name = output_path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    output_path.with_file_name(name)
}

fn discard_staged(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        if let Err(e) = std::fs::remove_file(staging) {
            warn!("Failed to remove {}: {e}", staging.display());
        }
    }
}

/// Write events to the staging file of an output.
///
/// Returns `(staging, output)`; the caller moves the staging file into place.
fn write_output(
    input_path: &Path,
    output_dir: &Path,
    format: OutputFormat,
    source: &str,
    audio_duration_secs: f64,
    params: &WindowParams,
    events: &[AnomalyEvent],
) -> Result<(PathBuf, PathBuf)> {
    let output_path = output_path_for(input_path, output_dir, format);
    let staging_path = staging_path_for(&output_path);
    debug!("Writing {} output: {}", format, output_path.display());

    let written = write_events(
        &staging_path,
        format,
        source,
        audio_duration_secs,
        params,
        events,
    );
    if let Err(e) = written {
        if staging_path.is_file() {
            discard_staged(&[(staging_path, output_path)]);
        }
        return Err(e);
    }
    Ok((staging_path, output_path))
}

fn write_events(
    output_path: &Path,
    format: OutputFormat,
    source: &str,
    audio_duration_secs: f64,
    params: &WindowParams,
    events: &[AnomalyEvent],
) -> Result<()> {

    let mut writer: Box<dyn OutputWriter> = match format {
        OutputFormat::Log => Box::new(EventLogWriter::new(
            output_path,
            source,
            audio_duration_secs,
        )?),
        OutputFormat::Csv => Box::new(CsvWriter::new(output_path)?),
        OutputFormat::Json => Box::new(JsonResultWriter::new(
            output_path,
            source,
            audio_duration_secs,
            *params,
        )),
    };

    writer.write_header()?;
    for event in events {
        writer.write_event(event)?;
    }
    writer.finalize()
}

/// Options for dividing one spectrogram.
#[derive(Debug, Clone)]
pub struct DivideOptions {
    /// Root of the `c/` and `w/` output directories.
    pub output_dir: PathBuf,
    /// Band detector parameters.
    pub bands: BandParams,
    /// Which band to split at.
    pub selection: BandSelection,
}

/// Result of dividing a single file.
#[derive(Debug)]
pub struct DivideResult {
    /// Number of bands detected.
    pub bands_found: usize,
    /// Band the image was split at.
    pub band: Band,
    /// Path of the half before the band, unless it was empty.
    pub left: Option<PathBuf>,
    /// Path of the half after the band, unless it was empty.
    pub right: Option<PathBuf>,
}

/// Detect the transition band of a spectrogram and save both halves.
pub fn process_divide_file(input_path: &Path, options: &DivideOptions) -> Result<DivideResult> {
    info!("Dividing: {}", input_path.display());

    let image = load_grayscale(input_path)?;
    let bands = BandDetector::new(options.bands).detect(&image)?;
    debug!("Detected {} bands: {:?}", bands.len(), bands);

    let band = options.selection.select(&bands)?;
    let (left, right) = divide(&image, band)?;

    let (left_path, right_path) = split_paths(input_path, &options.output_dir);
    let left_path = save_half(&left, left_path)?;
    let right_path = save_half(&right, right_path)?;

    info!(
        "Split at band {band} ({} of {}): {}px | {}px",
        options.selection,
        bands.len(),
        left.width(),
        right.width()
    );

    Ok(DivideResult {
        bands_found: bands.len(),
        band,
        left: left_path,
        right: right_path,
    })
}

/// Save one half of a divided image; an empty half is not written.
fn save_half(half: &image::GrayImage, path: PathBuf) -> Result<Option<PathBuf>> {
    if half.width() == 0 {
        warn!("Band touches the image edge, not writing empty {}", path.display());
        return Ok(None);
    }
    save_grayscale(half, &path)?;
    Ok(Some(path))
}

/// Options for segmenting one spectrogram.
#[derive(Debug, Clone)]
pub struct SegmentOptions {
    /// Directory receiving the window images.
    pub output_dir: PathBuf,
    /// Window geometry.
    pub window: WindowParams,
    /// Emit every window instead of only the one at the offset.
    pub all_windows: bool,
}

/// Cut a spectrogram into windows and save each as `<stem>_<index>.png`.
///
/// Returns the number of windows written.
pub fn process_segment_file(input_path: &Path, options: &SegmentOptions) -> Result<usize> {
    info!("Segmenting: {}", input_path.display());

    let image = load_grayscale(input_path)?;
    let windows = segment(&image, &options.window, options.all_windows)?;

    ensure_dir(&options.output_dir)?;
    for window in &windows {
        let path = window_image_path(input_path, &options.output_dir, window.index());
        save_grayscale(&window.to_image(), &path)?;
    }

    info!(
        "Wrote {} windows to {}",
        windows.len(),
        options.output_dir.display()
    );
    Ok(windows.len())
}
