//! Spectrogram geometry: band detection, splitting, and windowing.

mod bands;
mod divide;
mod io;
mod windows;

pub use bands::{Band, BandDetector, BandParams, BandScanPolicy, find_bands, highlight};
pub use divide::{BandSelection, divide};
pub use io::{load_grayscale, save_grayscale};
pub use windows::{Window, WindowParams, segment};
