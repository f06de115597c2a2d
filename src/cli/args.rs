//! CLI argument definitions.

use super::validators::{parse_duration_secs, parse_input_scale, parse_jobs};
use crate::config::{Config, InputLayout, OutputFormat, SpectrogramScale};
use crate::vision::{BandScanPolicy, BandSelection};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Find tape speed transitions in spectrogram images.
#[derive(Debug, Parser)]
#[command(name = "tapescan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config path).
    #[arg(long, global = true, env = "TAPESCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors; hide progress bars.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: trace+ORT debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan spectrograms window by window and log speed irregularities.
    Scan(ScanArgs),
    /// Split spectrograms at their speed-transition band.
    Divide(DivideArgs),
    /// Cut spectrograms into fixed-width window images.
    Segment(SegmentArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Window geometry overrides.
#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Distance between window offsets in pixels.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub step: Option<u32>,

    /// Window width in pixels.
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub window_width: Option<u32>,

    /// Offset of the first window in pixels.
    #[arg(long)]
    pub offset: Option<u32>,
}

/// Arguments for the scan command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ScanArgs {
    /// Spectrogram images or directories to scan.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory (default: same as input).
    #[arg(short, long, env = "TAPESCAN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output formats (comma-separated: log,csv,json).
    #[arg(short, long, value_delimiter = ',', env = "TAPESCAN_FORMAT")]
    pub format: Option<Vec<OutputFormat>>,

    /// Window geometry.
    #[command(flatten)]
    pub window: WindowArgs,

    /// Recording duration in seconds (overrides audio lookup).
    #[arg(short, long, value_parser = parse_duration_secs)]
    pub duration: Option<f64>,

    /// WAV file to read the recording duration from.
    #[arg(long, conflicts_with = "duration")]
    pub audio: Option<PathBuf>,

    /// Binary anomaly model (overrides config).
    #[arg(long, env = "TAPESCAN_BINARY_MODEL")]
    pub binary_model: Option<PathBuf>,

    /// Four-class speed model (overrides config).
    #[arg(long, env = "TAPESCAN_SPEED_MODEL")]
    pub speed_model: Option<PathBuf>,

    /// Model input tensor layout.
    #[arg(long, value_enum)]
    pub input_layout: Option<InputLayout>,

    /// Factor applied to pixel values before inference.
    #[arg(long, value_parser = parse_input_scale)]
    pub input_scale: Option<f32>,

    /// Per-call classifier timeout in seconds (0 disables).
    #[arg(long, env = "TAPESCAN_CLASSIFIER_TIMEOUT")]
    pub classifier_timeout: Option<u64>,

    /// Number of spectrograms scanned in parallel.
    #[arg(short, long, value_parser = parse_jobs, env = "TAPESCAN_JOBS")]
    pub jobs: Option<usize>,

    /// Also save every window image under `<out>/<stem>_windows/`.
    #[arg(long)]
    pub save_windows: bool,

    /// Rescan files even if output exists.
    #[arg(long)]
    pub force: bool,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the divide command.
#[derive(Debug, Args)]
pub struct DivideArgs {
    /// Spectrogram images or directories to divide.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Root directory for the `c/` and `w/` halves.
    #[arg(short, long, env = "TAPESCAN_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Pixels below this value are treated as dark.
    #[arg(long)]
    pub low_threshold: Option<u8>,

    /// Value given to pixels at or above the low threshold.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    pub high_threshold: Option<u8>,

    /// Width of the dilation rectangle.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub h_size: Option<u32>,

    /// Height of the dilation rectangle (default: from --scale).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub v_size: Option<u32>,

    /// Frequency scale the spectrograms were rendered with.
    #[arg(long, value_enum)]
    pub scale: Option<SpectrogramScale>,

    /// Row scanning policy for band extraction.
    #[arg(long, value_enum)]
    pub policy: Option<BandScanPolicy>,

    /// Which band to split at when several are found.
    #[arg(long, value_enum)]
    pub selection: Option<BandSelection>,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Arguments for the segment command.
#[derive(Debug, Args)]
pub struct SegmentArgs {
    /// Spectrogram images or directories to segment.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory receiving the window images.
    #[arg(short, long, env = "TAPESCAN_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Window geometry.
    #[command(flatten)]
    pub window: WindowArgs,

    /// Only write the window at the offset.
    #[arg(long)]
    pub single: bool,

    /// Stop on first error.
    #[arg(long)]
    pub fail_fast: bool,
}

impl ScanArgs {
    /// Override `config` with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        let scan = &mut config.scan;
        if let Some(step) = self.window.step {
            scan.step = step;
        }
        if let Some(width) = self.window.window_width {
            scan.window_width = width;
        }
        if let Some(offset) = self.window.offset {
            scan.offset = offset;
        }
        if let Some(formats) = &self.format {
            scan.formats.clone_from(formats);
        }
        if let Some(secs) = self.classifier_timeout {
            scan.classifier_timeout_secs = secs;
        }
        if let Some(jobs) = self.jobs {
            scan.jobs = jobs;
        }

        let models = &mut config.models;
        if let Some(path) = &self.binary_model {
            models.binary = Some(path.clone());
        }
        if let Some(path) = &self.speed_model {
            models.speed = Some(path.clone());
        }
        if let Some(layout) = self.input_layout {
            models.input_layout = layout;
        }
        if let Some(scale) = self.input_scale {
            models.input_scale = scale;
        }
    }
}

impl DivideArgs {
    /// Override `config` with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        let bands = &mut config.bands;
        if let Some(low) = self.low_threshold {
            bands.low_threshold = low;
        }
        if let Some(high) = self.high_threshold {
            bands.high_threshold = high;
        }
        if let Some(h_size) = self.h_size {
            bands.h_size = h_size;
        }
        if let Some(scale) = self.scale {
            bands.scale = scale;
            // An explicit scale picks its own kernel height unless --v-size is given.
            bands.v_size = None;
        }
        if let Some(v_size) = self.v_size {
            bands.v_size = Some(v_size);
        }
        if let Some(policy) = self.policy {
            bands.policy = policy;
        }
        if let Some(selection) = self.selection {
            bands.selection = selection;
        }
    }
}

impl SegmentArgs {
    /// Override `config` with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        let segment = &mut config.segment;
        if let Some(step) = self.window.step {
            segment.step = step;
        }
        if let Some(width) = self.window.window_width {
            segment.window_width = width;
        }
        if let Some(offset) = self.window.offset {
            segment.offset = offset;
        }
        if self.single {
            segment.all_windows = false;
        }
    }
}
