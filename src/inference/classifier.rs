//! Classifier trait and speed-change labels.

use crate::error::Result;
use crate::vision::Window;
use serde::{Deserialize, Serialize};

/// Playback speed change detected across a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedChange {
    /// Played back at twice the recording speed.
    Double,
    /// Played back at half the recording speed.
    Half,
    /// Played back at four times the recording speed.
    Quadruple,
    /// Played back at a quarter of the recording speed.
    Quarter,
}

impl SpeedChange {
    /// All labels in model output order.
    pub const ALL: [Self; 4] = [Self::Double, Self::Half, Self::Quadruple, Self::Quarter];

    /// Map a four-class model output index to its label.
    pub fn from_class_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Label as written to event logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Half => "half",
            Self::Quadruple => "quadruple",
            Self::Quarter => "quarter",
        }
    }
}

impl std::fmt::Display for SpeedChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies spectrogram windows.
///
/// Every call receives a window of the scan's fixed shape
/// `(height, window_width)`. Implementations must not depend on call order.
pub trait WindowClassifier {
    /// Whether the window contains a speed irregularity.
    fn is_anomalous(&self, window: &Window<'_>) -> Result<bool>;

    /// Which speed change the window shows.
    ///
    /// Only called for windows that [`is_anomalous`](Self::is_anomalous) flagged.
    fn speed_change(&self, window: &Window<'_>) -> Result<SpeedChange>;
}

impl<C: WindowClassifier + ?Sized> WindowClassifier for &C {
    fn is_anomalous(&self, window: &Window<'_>) -> Result<bool> {
        (**self).is_anomalous(window)
    }

    fn speed_change(&self, window: &Window<'_>) -> Result<SpeedChange> {
        (**self).speed_change(window)
    }
}

impl<C: WindowClassifier + ?Sized> WindowClassifier for std::sync::Arc<C> {
    fn is_anomalous(&self, window: &Window<'_>) -> Result<bool> {
        (**self).is_anomalous(window)
    }

    fn speed_change(&self, window: &Window<'_>) -> Result<SpeedChange> {
        (**self).speed_change(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_class_index() {
        assert_eq!(SpeedChange::from_class_index(0), Some(SpeedChange::Double));
        assert_eq!(SpeedChange::from_class_index(1), Some(SpeedChange::Half));
        assert_eq!(SpeedChange::from_class_index(2), Some(SpeedChange::Quadruple));
        assert_eq!(SpeedChange::from_class_index(3), Some(SpeedChange::Quarter));
        assert_eq!(SpeedChange::from_class_index(4), None);
    }

    #[test]
    fn test_display_matches_log_labels() {
        let labels: Vec<String> = SpeedChange::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["double", "half", "quadruple", "quarter"]);
    }
}
