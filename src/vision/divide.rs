//! Splitting a spectrogram around a speed-transition band.

use super::Band;
use crate::error::{Error, Result};
use image::{GrayImage, imageops};
use serde::{Deserialize, Serialize};

/// Which band to split at when several were detected.
///
/// Multiple bands usually come from overlapping transitions or noise; none of
/// these policies is guaranteed to pick the true transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BandSelection {
    /// The first band discovered.
    First,
    /// The band at index `len / 2`.
    #[default]
    Middle,
    /// The widest band, earliest on ties.
    Largest,
}

impl BandSelection {
    /// Pick a band from `bands`.
    pub fn select(self, bands: &[Band]) -> Result<Band> {
        let selected = match self {
            Self::First => bands.first(),
            Self::Middle => bands.get(bands.len() / 2),
            Self::Largest => bands
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| a.width().cmp(&b.width()).then(ib.cmp(ia)))
                .map(|(_, band)| band),
        };
        selected.copied().ok_or(Error::EmptyInput { what: "bands" })
    }
}

impl std::fmt::Display for BandSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Middle => write!(f, "middle"),
            Self::Largest => write!(f, "largest"),
        }
    }
}

impl std::str::FromStr for BandSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "middle" => Ok(Self::Middle),
            "largest" => Ok(Self::Largest),
            other => Err(format!("unknown band selection: {other}")),
        }
    }
}

/// Split `image` into the parts left and right of `band`.
///
/// The band's own columns belong to neither half.
pub fn divide(image: &GrayImage, band: Band) -> Result<(GrayImage, GrayImage)> {
    let (width, height) = image.dimensions();
    if band.start >= band.end || band.end > width {
        return Err(Error::geometry(format!(
            "band {band} outside image of width {width}"
        )));
    }

    let left = imageops::crop_imm(image, 0, 0, band.start, height).to_image();
    let right = imageops::crop_imm(image, band.end, 0, width - band.end, height).to_image();

    Ok((left, right))
}
