//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_bands(config)?;
    validate_windows(config)?;
    validate_models(config)?;
    Ok(())
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

/// Validate band detection settings.
fn validate_bands(config: &Config) -> Result<()> {
    let bands = &config.bands;

    if bands.h_size == 0 {
        return Err(invalid("bands.h_size must be at least 1"));
    }

    if bands.v_size == Some(0) {
        return Err(invalid("bands.v_size must be at least 1"));
    }

    if bands.high_threshold == 0 {
        return Err(invalid(
            "bands.high_threshold must be above 0 or every pixel reads as dark",
        ));
    }

    Ok(())
}

/// Validate scan and segment window geometry.
fn validate_windows(config: &Config) -> Result<()> {
    for (section, step, window_width) in [
        ("scan", config.scan.step, config.scan.window_width),
        ("segment", config.segment.step, config.segment.window_width),
    ] {
        if step == 0 {
            return Err(invalid(format!("{section}.step must be at least 1")));
        }
        if window_width == 0 {
            return Err(invalid(format!("{section}.window_width must be at least 1")));
        }
    }

    if config.scan.jobs == 0 {
        return Err(invalid("scan.jobs must be at least 1"));
    }

    if config.scan.formats.is_empty() {
        return Err(invalid("scan.formats must name at least one format"));
    }

    Ok(())
}

/// Validate model settings.
fn validate_models(config: &Config) -> Result<()> {
    let scale = config.models.input_scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(invalid(format!(
            "models.input_scale must be a positive number, got {scale}"
        )));
    }
    Ok(())
}
