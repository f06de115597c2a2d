//! Recording duration from WAV headers.

use crate::constants::AUDIO_SIDECAR_EXTENSION;
use crate::error::{Error, Result};
use crate::output::round_seconds;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Duration of a WAV file in seconds, rounded to two decimals.
///
/// Only the header is read: `frames / sample_rate`.
pub fn wav_duration_secs(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path).map_err(|e| Error::AudioDuration {
        path: path.to_path_buf(),
        source: e,
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(Error::AudioDuration {
            path: path.to_path_buf(),
            source: hound::Error::FormatError("sample rate is zero"),
        });
    }

    // `duration()` counts frames, not interleaved samples.
    let frames = f64::from(reader.duration());
    let secs = frames / f64::from(spec.sample_rate);
    Ok(round_seconds(secs))
}

/// Path of the WAV file expected next to a spectrogram.
pub fn sidecar_audio_path(image_path: &Path) -> PathBuf {
    image_path.with_extension(AUDIO_SIDECAR_EXTENSION)
}

/// Resolve the recording duration for a spectrogram.
///
/// Order: `explicit` seconds, then the `audio` file, then a sibling
/// `<stem>.wav` next to `image_path`.
pub fn resolve_duration(
    image_path: &Path,
    explicit: Option<f64>,
    audio: Option<&Path>,
) -> Result<f64> {
    if let Some(secs) = explicit {
        return Ok(secs);
    }

    if let Some(audio) = audio {
        return wav_duration_secs(audio);
    }

    let sidecar = sidecar_audio_path(image_path);
    if sidecar.is_file() {
        debug!("Using sidecar audio {}", sidecar.display());
        return wav_duration_secs(&sidecar);
    }

    Err(Error::DurationUnavailable {
        path: image_path.to_path_buf(),
    })
}
