//! Output type definitions.

use crate::constants::scan::TIMESTAMP_DECIMALS;
use crate::inference::SpeedChange;
use serde::Serialize;

/// A speed irregularity found in one scan window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyEvent {
    window_index: usize,
    timestamp_secs: f64,
    label: SpeedChange,
}

impl AnomalyEvent {
    pub(crate) fn new(window_index: usize, timestamp_secs: f64, label: SpeedChange) -> Self {
        Self {
            window_index,
            timestamp_secs,
            label,
        }
    }

    /// Index of the window that produced the event.
    pub fn window_index(&self) -> usize {
        self.window_index
    }

    /// Position of the window start in the recording, in seconds.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_secs
    }

    /// Detected speed change.
    pub fn label(&self) -> SpeedChange {
        self.label
    }
}

impl std::fmt::Display for AnomalyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Segment {}, time: {}s, speedup: {}",
            self.window_index,
            format_seconds(self.timestamp_secs),
            self.label
        )
    }
}

/// Format seconds for event logs.
///
/// Whole values keep one decimal (`60.0`); others use the shortest exact form
/// (`12.34`).
pub fn format_seconds(secs: f64) -> String {
    if secs.is_finite() && secs.fract() == 0.0 {
        format!("{secs:.1}")
    } else {
        secs.to_string()
    }
}

/// Round seconds to two decimals, sending exact ties to the even neighbor.
pub fn round_seconds(secs: f64) -> f64 {
    let scale = 10f64.powi(TIMESTAMP_DECIMALS);
    (secs * scale).round_ties_even() / scale
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(60.0), "60.0");
        assert_eq!(format_seconds(0.0), "0.0");
        assert_eq!(format_seconds(12.34), "12.34");
        assert_eq!(format_seconds(7.5), "7.5");
    }

    #[test]
    fn test_round_seconds_ties_to_even() {
        assert_eq!(round_seconds(0.125), 0.12);
        assert_eq!(round_seconds(1.125), 1.12);
        assert_eq!(round_seconds(9.375), 9.38);
        assert_eq!(round_seconds(33.3333), 33.33);
    }

    #[test]
    fn test_event_display() {
        let event = AnomalyEvent::new(4, 60.0, SpeedChange::Half);
        assert_eq!(event.to_string(), "Segment 4, time: 60.0s, speedup: half");
    }
}
