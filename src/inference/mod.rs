//! Window classification capability.
//!
//! The scan engine only sees the [`WindowClassifier`] trait. [`OnnxClassifier`]
//! binds it to a pair of ONNX models and [`TimeoutClassifier`] bounds the time
//! a single call may take.

mod classifier;
mod onnx;
mod timeout;

pub use classifier::{SpeedChange, WindowClassifier};
pub use onnx::OnnxClassifier;
pub use timeout::TimeoutClassifier;
