//! ONNX-backed window classifier.

use super::{SpeedChange, WindowClassifier};
use crate::config::{InputLayout, ModelsConfig};
use crate::error::{Error, Result};
use crate::vision::Window;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Binary anomaly model plus four-class speed model.
///
/// Sessions need exclusive access to run, so each sits behind a mutex; the
/// classifier itself can be shared across scan threads.
pub struct OnnxClassifier {
    binary: Mutex<Session>,
    speed: Mutex<Session>,
    layout: InputLayout,
    input_scale: f32,
}

impl OnnxClassifier {
    /// Load both models from the models configuration.
    pub fn from_config(models: &ModelsConfig) -> Result<Self> {
        let (Some(binary_path), Some(speed_path)) = (&models.binary, &models.speed) else {
            return Err(Error::ModelsNotConfigured);
        };

        let binary = load_session(binary_path)?;
        let speed = load_session(speed_path)?;

        info!(
            "Loaded models: binary={}, speed={}, layout={}, input_scale={}",
            binary_path.display(),
            speed_path.display(),
            models.input_layout,
            models.input_scale
        );

        Ok(Self {
            binary: Mutex::new(binary),
            speed: Mutex::new(speed),
            layout: models.input_layout,
            input_scale: models.input_scale,
        })
    }

    /// Run `session` on `window` and return the index of the highest score.
    fn predict_class(&self, session: &Mutex<Session>, window: &Window<'_>) -> Result<usize> {
        let tensor = window_tensor(window, self.layout, self.input_scale)?;

        let mut session = session.lock().map_err(|_| Error::Inference {
            reason: "model session lock poisoned".to_string(),
        })?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;
        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        argmax(scores).ok_or_else(|| Error::Inference {
            reason: "model returned no scores".to_string(),
        })
    }
}

impl WindowClassifier for OnnxClassifier {
    fn is_anomalous(&self, window: &Window<'_>) -> Result<bool> {
        Ok(self.predict_class(&self.binary, window)? == 1)
    }

    fn speed_change(&self, window: &Window<'_>) -> Result<SpeedChange> {
        let class = self.predict_class(&self.speed, window)?;
        SpeedChange::from_class_index(class).ok_or_else(|| Error::Inference {
            reason: format!("speed model returned unknown class {class}"),
        })
    }
}

fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        return Err(Error::ModelFileNotFound {
            path: path.to_path_buf(),
        });
    }

    debug!("Loading ONNX model: {}", path.display());
    Session::builder()
        .and_then(|mut builder| builder.commit_from_file(path))
        .map_err(|e| Error::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Build a batch-of-one input tensor from the window's pixels.
fn window_tensor(window: &Window<'_>, layout: InputLayout, scale: f32) -> Result<Tensor<f32>> {
    let data = window_pixels(window, scale);
    let height = window.height() as usize;
    let width = window.width() as usize;

    let tensor = match layout {
        InputLayout::Nhw => Tensor::from_array(([1usize, height, width], data)),
        InputLayout::Nhwc => Tensor::from_array(([1usize, height, width, 1], data)),
    };
    tensor.map_err(|e| Error::Inference {
        reason: e.to_string(),
    })
}

/// Row-major window pixels multiplied by `scale`.
fn window_pixels(window: &Window<'_>, scale: f32) -> Vec<f32> {
    window
        .rows()
        .flat_map(|row| row.iter().map(move |&p| f32::from(p) * scale))
        .collect()
}

/// Index of the largest finite score; the first one wins ties.
fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::vision::{WindowParams, segment};
    use image::{GrayImage, Luma};

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_window_pixels_row_major_and_scaled() {
        let image = GrayImage::from_fn(6, 2, |x, y| Luma([(y * 100 + x) as u8]));
        let params = WindowParams {
            step: 1,
            window_width: 2,
            offset: 3,
        };
        let windows = segment(&image, &params, false).unwrap();
        let pixels = window_pixels(&windows[0], 0.5);
        assert_eq!(pixels, vec![1.5, 2.0, 51.5, 52.0]);
    }

    #[test]
    fn test_missing_models_not_configured() {
        let models = ModelsConfig::default();
        assert!(matches!(
            OnnxClassifier::from_config(&models),
            Err(Error::ModelsNotConfigured)
        ));
    }

    #[test]
    fn test_missing_model_file() {
        let models = ModelsConfig {
            binary: Some("/nonexistent/binary.onnx".into()),
            speed: Some("/nonexistent/speed.onnx".into()),
            ..ModelsConfig::default()
        };
        assert!(matches!(
            OnnxClassifier::from_config(&models),
            Err(Error::ModelFileNotFound { .. })
        ));
    }
}
