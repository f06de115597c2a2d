//! Tapescan - find speed transitions in spectrograms of digitized tape.
//!
//! The crate detects vertical transition bands in spectrogram images, splits
//! images around them, cuts images into fixed-width windows, and scans
//! spectrograms window by window with a pluggable classifier.

#![warn(missing_docs)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod vision;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, DivideArgs, ScanArgs, SegmentArgs};
use config::{Config, config_file_path, load_config, save_config, validate_config};
use indicatif::MultiProgress;
use inference::{OnnxClassifier, TimeoutClassifier, WindowClassifier};
use output::progress;
use pipeline::{
    DivideOptions, ProcessCheck, ScanOptions, SegmentOptions, check_distinct_dirs,
    collect_input_files, output_dir_for, process_divide_file, process_scan_file,
    process_segment_file, should_process,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub use error::{Error, Result};

/// Main entry point for the tapescan CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);
    let cancel = install_cancel_handler();
    let progress_enabled = !cli.global.quiet && !cli.global.no_progress;
    let config_path = cli.global.config.as_deref();

    match cli.command {
        Command::Config { action } => handle_config_command(action, config_path),
        Command::Scan(args) => {
            let mut config = load_config(config_path)?;
            args.apply_to(&mut config);
            validate_config(&config)?;
            scan_files(&args, &config, progress_enabled, &cancel)
        }
        Command::Divide(args) => {
            let mut config = load_config(config_path)?;
            args.apply_to(&mut config);
            validate_config(&config)?;
            divide_files(&args, &config, progress_enabled, &cancel)
        }
        Command::Segment(args) => {
            let mut config = load_config(config_path)?;
            args.apply_to(&mut config);
            validate_config(&config)?;
            segment_files(&args, &config, progress_enabled, &cancel)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed unless asked for with -vv or more.
    let filter_str = if quiet {
        "warn,ort=off".to_string()
    } else {
        match verbose {
            0 => "info,ort=off".to_string(),
            1 => "debug,ort=warn".to_string(),
            2 => "trace,ort=info".to_string(),
            _ => "trace".to_string(),
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    fmt().with_env_filter(filter).init();
}

/// First Ctrl+C stops new files from starting; a second one exits.
fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130); // 128 + SIGINT(2)
        }
        warn!("Interrupted: finishing files in progress (Ctrl+C again to abort)");
    }) {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
    cancel
}

/// Outcome of one file in a batch.
#[derive(Debug)]
enum Outcome {
    Done,
    Skipped,
}

/// Counters for a finished batch.
#[derive(Debug, Default)]
struct BatchSummary {
    processed: usize,
    skipped: usize,
    failed: usize,
}

/// Run `process` over `files`, `jobs` at a time.
///
/// Data conditions (`TooShort`, `EmptyInput`) are logged and counted as
/// skipped. Other errors are counted; with `fail_fast` the first one stops
/// the batch and is returned.
fn run_batch<F>(
    files: &[PathBuf],
    jobs: usize,
    fail_fast: bool,
    cancel: &AtomicBool,
    multi_progress: &MultiProgress,
    progress_enabled: bool,
    process: F,
) -> Result<BatchSummary>
where
    F: Fn(&Path) -> Result<Outcome> + Sync,
{
    let file_progress = progress::create_file_progress(files.len(), progress_enabled)
        .map(|pb| multi_progress.add(pb));

    let processed = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let first_error: Mutex<Option<Error>> = Mutex::new(None);

    let handle = |file: &PathBuf| {
        if cancel.load(Ordering::SeqCst) || stop.load(Ordering::SeqCst) {
            skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        match process(file.as_path()) {
            Ok(Outcome::Done) => {
                processed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Outcome::Skipped) => {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_data_condition() => {
                warn!("Skipping {}: {}", file.display(), e.report());
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("Failed to process {}: {}", file.display(), e.report());
                failed.fetch_add(1, Ordering::Relaxed);
                if fail_fast {
                    stop.store(true, Ordering::SeqCst);
                    if let Ok(mut slot) = first_error.lock() {
                        slot.get_or_insert(e);
                    }
                }
            }
        }
        progress::inc_progress(file_progress.as_ref());
    };

    if jobs > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| files.par_iter().for_each(handle)),
            Err(e) => {
                warn!("Failed to start {jobs} workers ({e}), processing sequentially");
                files.iter().for_each(handle);
            }
        }
    } else {
        files.iter().for_each(handle);
    }

    let first_error = first_error.into_inner().ok().flatten();
    progress::finish_progress(
        file_progress,
        if first_error.is_some() { "Failed" } else { "Complete" },
    );
    if let Some(e) = first_error {
        return Err(e);
    }

    if cancel.load(Ordering::SeqCst) {
        warn!("Batch interrupted before all files were processed");
    }

    Ok(BatchSummary {
        processed: processed.into_inner(),
        skipped: skipped.into_inner(),
        failed: failed.into_inner(),
    })
}

fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        return Err(Error::NoValidInputFiles);
    }
    Ok(files)
}

/// Load both models and apply the configured per-call timeout.
fn build_classifier(config: &Config) -> Result<Box<dyn WindowClassifier + Send + Sync>> {
    let onnx = Arc::new(OnnxClassifier::from_config(&config.models)?);
    let secs = config.scan.classifier_timeout_secs;
    if secs == 0 {
        return Ok(Box::new(onnx));
    }
    Ok(Box::new(TimeoutClassifier::new(
        onnx,
        Duration::from_secs(secs),
    )))
}

/// One classifier per batch worker, so sessions never wait on each other.
fn build_classifiers(
    config: &Config,
    jobs: usize,
) -> Result<Vec<Box<dyn WindowClassifier + Send + Sync>>> {
    let secs = config.scan.classifier_timeout_secs;
    if secs > 0 {
        info!("Classifier timeout: {secs}s per call");
    }
    (0..jobs.max(1)).map(|_| build_classifier(config)).collect()
}

/// Classifier owned by the current batch worker.
fn worker_classifier<T>(classifiers: &[T]) -> &T {
    let slot = rayon::current_thread_index().unwrap_or(0);
    &classifiers[slot % classifiers.len()]
}

fn scan_files(
    args: &ScanArgs,
    config: &Config,
    progress_enabled: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let total_start = Instant::now();

    let files = collect_files(&args.inputs)?;
    info!("Found {} spectrogram(s) to scan", files.len());
    if args.audio.is_some() && files.len() > 1 {
        warn!("--audio applies the same duration to all {} inputs", files.len());
    }

    let jobs = config.scan.jobs;
    let classifiers = build_classifiers(config, jobs)?;
    let options = ScanOptions {
        output_dir: args.output_dir.clone(),
        formats: config.scan.formats.clone(),
        window: config.scan.window_params(),
        duration_secs: args.duration,
        audio: args.audio.clone(),
        save_windows: args.save_windows,
        // Per-file bars only make sense one file at a time.
        progress_enabled: progress_enabled && jobs == 1,
    };

    let multi_progress = MultiProgress::new();
    let total_events = AtomicUsize::new(0);
    let total_windows = AtomicUsize::new(0);

    let summary = run_batch(
        &files,
        jobs,
        args.fail_fast,
        cancel,
        &multi_progress,
        progress_enabled,
        |file| {
            let output_dir = output_dir_for(file, options.output_dir.as_deref());
            if should_process(file, &output_dir, &options.formats, args.force)
                == ProcessCheck::SkipExists
            {
                info!("Skipping (output exists): {}", file.display());
                return Ok(Outcome::Skipped);
            }

            let classifier = worker_classifier(&classifiers).as_ref();
            let result = process_scan_file(file, &options, classifier, &multi_progress)?;
            total_events.fetch_add(result.events, Ordering::Relaxed);
            total_windows.fetch_add(result.windows, Ordering::Relaxed);
            Ok(Outcome::Done)
        },
    )?;

    let total_duration = total_start.elapsed().as_secs_f64();
    info!(
        "Complete: {} scanned, {} skipped, {} errors, {} events in {:.2}s",
        summary.processed,
        summary.skipped,
        summary.failed,
        total_events.into_inner(),
        total_duration
    );

    if summary.processed > 0 {
        #[allow(clippy::cast_precision_loss)]
        let windows_per_sec = if total_duration > 0.0 {
            total_windows.into_inner() as f64 / total_duration
        } else {
            0.0
        };
        info!("Performance: {windows_per_sec:.1} windows/sec overall");
    }

    if summary.failed > 0 {
        warn!("{} file(s) had errors", summary.failed);
    }

    Ok(())
}

fn divide_files(
    args: &DivideArgs,
    config: &Config,
    progress_enabled: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let files = collect_files(&args.inputs)?;
    let options = DivideOptions {
        output_dir: args.output_dir.clone(),
        bands: config.bands.params(),
        selection: config.bands.selection,
    };
    info!(
        "Dividing {} spectrogram(s): threshold={}, kernel={}x{}, policy={:?}, selection={}",
        files.len(),
        options.bands.low_threshold,
        options.bands.h_size,
        options.bands.v_size,
        options.bands.policy,
        options.selection
    );

    let summary = run_batch(
        &files,
        1,
        args.fail_fast,
        cancel,
        &MultiProgress::new(),
        progress_enabled,
        |file| {
            process_divide_file(file, &options)?;
            Ok(Outcome::Done)
        },
    )?;

    info!(
        "Complete: {} divided, {} skipped, {} errors",
        summary.processed, summary.skipped, summary.failed
    );
    Ok(())
}

fn segment_files(
    args: &SegmentArgs,
    config: &Config,
    progress_enabled: bool,
    cancel: &AtomicBool,
) -> Result<()> {
    let files = collect_files(&args.inputs)?;
    let options = SegmentOptions {
        output_dir: args.output_dir.clone(),
        window: config.segment.window_params(),
        all_windows: config.segment.all_windows,
    };
    info!(
        "Segmenting {} spectrogram(s): step={}, width={}, offset={}",
        files.len(),
        options.window.step,
        options.window.window_width,
        options.window.offset
    );

    let total_windows = AtomicUsize::new(0);
    let summary = run_batch(
        &files,
        1,
        args.fail_fast,
        cancel,
        &MultiProgress::new(),
        progress_enabled,
        |file| {
            check_distinct_dirs(file, &options.output_dir)?;
            let written = process_segment_file(file, &options)?;
            total_windows.fetch_add(written, Ordering::Relaxed);
            Ok(Outcome::Done)
        },
    )?;

    info!(
        "Complete: {} segmented, {} skipped, {} errors, {} windows written",
        summary.processed,
        summary.skipped,
        summary.failed,
        total_windows.into_inner()
    );
    Ok(())
}

#[allow(clippy::print_stdout)]
fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), &path)?;
                println!("Created configuration file: {}", path.display());
                println!("\nNext steps: set [models] binary and speed to your ONNX files.");
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(&path))?;
            let contents =
                toml::to_string_pretty(&config).map_err(|e| Error::ConfigSerialize { source: e })?;
            println!("{contents}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    /// `short.png` is too narrow, `bad.png` fails outright, the rest succeed.
    fn process_by_name(path: &Path, calls: &AtomicUsize) -> Result<Outcome> {
        calls.fetch_add(1, Ordering::SeqCst);
        match path.to_str() {
            Some("short.png") => Err(Error::ScanFailed {
                path: path.to_path_buf(),
                source: Box::new(Error::TooShort {
                    width: 100,
                    window_width: 256,
                }),
            }),
            Some("bad.png") => Err(Error::geometry("band outside image")),
            _ => Ok(Outcome::Done),
        }
    }

    fn batch(
        files: &[PathBuf],
        jobs: usize,
        fail_fast: bool,
        cancel: &AtomicBool,
        calls: &AtomicUsize,
    ) -> Result<BatchSummary> {
        run_batch(
            files,
            jobs,
            fail_fast,
            cancel,
            &MultiProgress::new(),
            false,
            |file| process_by_name(file, calls),
        )
    }

    #[test]
    fn test_batch_continues_after_data_condition() {
        let files = paths(&["short.png", "a.png", "b.png"]);
        for jobs in [1, 2] {
            for fail_fast in [false, true] {
                let calls = AtomicUsize::new(0);
                let summary =
                    batch(&files, jobs, fail_fast, &AtomicBool::new(false), &calls).unwrap();
                assert_eq!(summary.processed, 2, "jobs={jobs} fail_fast={fail_fast}");
                assert_eq!(summary.skipped, 1);
                assert_eq!(summary.failed, 0);
                assert_eq!(calls.load(Ordering::SeqCst), 3);
            }
        }
    }

    #[test]
    fn test_batch_counts_failures_without_fail_fast() {
        let files = paths(&["bad.png", "short.png", "a.png"]);
        for jobs in [1, 2] {
            let calls = AtomicUsize::new(0);
            let summary = batch(&files, jobs, false, &AtomicBool::new(false), &calls).unwrap();
            assert_eq!(summary.processed, 1, "jobs={jobs}");
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.failed, 1);
        }
    }

    #[test]
    fn test_batch_fail_fast_stops_sequential_batch() {
        let files = paths(&["bad.png", "a.png", "b.png"]);
        let calls = AtomicUsize::new(0);
        let err = batch(&files, 1, true, &AtomicBool::new(false), &calls).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_batch_fail_fast_returns_error_in_parallel() {
        let files = paths(&["a.png", "bad.png", "b.png", "c.png"]);
        let calls = AtomicUsize::new(0);
        let err = batch(&files, 2, true, &AtomicBool::new(false), &calls).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry { .. }));
    }

    #[test]
    fn test_cancelled_batch_starts_nothing() {
        let files = paths(&["a.png", "b.png"]);
        for jobs in [1, 2] {
            let calls = AtomicUsize::new(0);
            let summary = batch(&files, jobs, false, &AtomicBool::new(true), &calls).unwrap();
            assert_eq!(summary.processed, 0);
            assert_eq!(summary.skipped, 2);
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    #[test]
    fn test_worker_classifier_per_thread() {
        let slots = vec![0usize, 1, 2];
        assert_eq!(*worker_classifier(&slots), 0);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let seen: Vec<usize> = pool.install(|| {
            (0..3)
                .into_par_iter()
                .map(|_| *worker_classifier(&slots))
                .collect()
        });
        assert!(seen.iter().all(|slot| *slot < 3));
    }
}
