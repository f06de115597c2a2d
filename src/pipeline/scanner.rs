//! Sliding-window scan of a spectrogram.

use crate::error::{Error, Result};
use crate::inference::WindowClassifier;
use crate::output::{AnomalyEvent, progress, round_seconds};
use crate::vision::{WindowParams, segment};
use image::GrayImage;
use indicatif::ProgressBar;
use tracing::{debug, trace};

/// Scan `image` window by window and collect the anomalous ones.
///
/// Windows are classified strictly in index order. The first classifier
/// failure aborts the scan; events gathered so far are dropped.
pub fn scan<C>(
    image: &GrayImage,
    duration_secs: f64,
    params: &WindowParams,
    classifier: &C,
    progress_bar: Option<&ProgressBar>,
) -> Result<Vec<AnomalyEvent>>
where
    C: WindowClassifier + ?Sized,
{
    params.validate()?;

    let width = image.width();
    if width < params.window_width {
        return Err(Error::TooShort {
            width,
            window_width: params.window_width,
        });
    }

    let windows = segment(image, params, true)?;
    debug!("Scanning {} windows of {}px", windows.len(), params.window_width);

    let mut events = Vec::new();
    for window in &windows {
        let index = window.index();

        let anomalous = classifier
            .is_anomalous(window)
            .map_err(|e| classification_error(index, e))?;
        trace!("Window {index} at {}px: anomalous={anomalous}", window.offset());

        if anomalous {
            let timestamp = timestamp_for(duration_secs, window.offset(), width);
            let label = classifier
                .speed_change(window)
                .map_err(|e| classification_error(index, e))?;
            events.push(AnomalyEvent::new(index, timestamp, label));
        }

        progress::inc_progress(progress_bar);
    }

    Ok(events)
}

/// Map a window offset to seconds into the recording.
///
/// `round(duration * offset / width, 2)` with ties to even; a zero-width
/// image maps to 0.
pub fn timestamp_for(duration_secs: f64, offset: u32, width: u32) -> f64 {
    if width == 0 {
        return 0.0;
    }
    round_seconds(duration_secs * f64::from(offset) / f64::from(width))
}

fn classification_error(window_index: usize, err: Error) -> Error {
    let reason = match err {
        Error::Inference { reason } | Error::Classification { reason, .. } => reason,
        other => other.to_string(),
    };
    Error::Classification {
        window_index,
        reason,
    }
}
