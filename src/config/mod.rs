//! Configuration loading and management.

mod file;
mod paths;
mod types;
mod validate;

pub use file::{load_config, load_config_file, save_config};
pub use paths::{config_dir, config_file_path};
pub use types::{
    BandsConfig, Config, InputLayout, ModelsConfig, OutputFormat, ScanConfig, SegmentConfig,
    SpectrogramScale,
};
pub use validate::validate_config;
