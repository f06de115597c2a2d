//! Per-call deadline for window classification.
//!
//! Model runtimes offer no cancellation, so each call runs on a worker thread
//! and the caller stops waiting once the deadline passes. A timed-out worker
//! is left to finish on its own; its result is discarded. While such a
//! worker is still running, further calls fail immediately instead of
//! queueing more threads behind it.

use super::{SpeedChange, WindowClassifier};
use crate::error::{Error, Result};
use crate::vision::Window;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Wraps a classifier so that every call fails after `timeout`.
pub struct TimeoutClassifier<C> {
    inner: Arc<C>,
    timeout: Duration,
    /// Completion flags of calls that timed out.
    abandoned: Mutex<Vec<Arc<AtomicBool>>>,
}

impl<C> TimeoutClassifier<C>
where
    C: WindowClassifier + Send + Sync + 'static,
{
    /// Bound every call to `inner` by `timeout`.
    pub fn new(inner: Arc<C>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            abandoned: Mutex::new(Vec::new()),
        }
    }

    /// Fail if a timed-out call is still holding the inner classifier.
    fn ensure_idle(&self, what: &str) -> Result<()> {
        let mut abandoned = self.abandoned.lock().map_err(|_| Error::Inference {
            reason: "timeout bookkeeping lock poisoned".to_string(),
        })?;
        abandoned.retain(|done| !done.load(Ordering::SeqCst));
        if abandoned.is_empty() {
            Ok(())
        } else {
            Err(Error::Inference {
                reason: format!("{what} skipped: an earlier call is still running after its timeout"),
            })
        }
    }

    fn abandon(&self, done: Arc<AtomicBool>) {
        if let Ok(mut abandoned) = self.abandoned.lock() {
            abandoned.push(done);
        }
    }

    fn call<T, F>(&self, window: &Window<'_>, what: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&C, &Window<'_>) -> Result<T> + Send + 'static,
    {
        self.ensure_idle(what)?;

        let index = window.index();
        let pixels = window.to_image();
        let inner = Arc::clone(&self.inner);
        let done = Arc::new(AtomicBool::new(false));
        let worker_done = Arc::clone(&done);
        let (tx, rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name(format!("classify-{index}"))
            .spawn(move || {
                let result = f(inner.as_ref(), &Window::whole(&pixels, index));
                worker_done.store(true, Ordering::SeqCst);
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.abandon(done);
                warn!(
                    "{what} call for window {index} exceeded {:.1}s",
                    self.timeout.as_secs_f64()
                );
                Err(Error::Inference {
                    reason: format!("{what} timed out after {:.1}s", self.timeout.as_secs_f64()),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(Error::Inference {
                reason: format!("{what} worker exited without a result"),
            }),
        }
    }
}

impl<C> WindowClassifier for TimeoutClassifier<C>
where
    C: WindowClassifier + Send + Sync + 'static,
{
    fn is_anomalous(&self, window: &Window<'_>) -> Result<bool> {
        self.call(window, "anomaly classification", |c, w| c.is_anomalous(w))
    }

    fn speed_change(&self, window: &Window<'_>) -> Result<SpeedChange> {
        self.call(window, "speed classification", |c, w| c.speed_change(w))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::vision::{WindowParams, segment};
    use image::GrayImage;

    struct SlowClassifier {
        delay: Duration,
    }

    impl WindowClassifier for SlowClassifier {
        fn is_anomalous(&self, window: &Window<'_>) -> Result<bool> {
            thread::sleep(self.delay);
            Ok(window.index() % 2 == 1)
        }

        fn speed_change(&self, _window: &Window<'_>) -> Result<SpeedChange> {
            thread::sleep(self.delay);
            Ok(SpeedChange::Half)
        }
    }

    fn windows(image: &GrayImage) -> Vec<Window<'_>> {
        let params = WindowParams {
            step: 4,
            window_width: 8,
            offset: 0,
        };
        segment(image, &params, true).unwrap()
    }

    #[test]
    fn test_fast_call_passes_through() {
        let image = GrayImage::new(32, 4);
        let classifier = TimeoutClassifier::new(
            Arc::new(SlowClassifier {
                delay: Duration::ZERO,
            }),
            Duration::from_secs(5),
        );
        let windows = windows(&image);
        assert!(!classifier.is_anomalous(&windows[0]).unwrap());
        assert!(classifier.is_anomalous(&windows[1]).unwrap());
        assert_eq!(classifier.speed_change(&windows[1]).unwrap(), SpeedChange::Half);
    }

    #[test]
    fn test_slow_call_times_out() {
        let image = GrayImage::new(32, 4);
        let classifier = TimeoutClassifier::new(
            Arc::new(SlowClassifier {
                delay: Duration::from_millis(500),
            }),
            Duration::from_millis(20),
        );
        let windows = windows(&image);
        let err = classifier.is_anomalous(&windows[0]).unwrap_err();
        assert!(matches!(err, Error::Inference { ref reason } if reason.contains("timed out")));
    }

    #[test]
    fn test_calls_fail_fast_while_timed_out_call_runs() {
        let image = GrayImage::new(32, 4);
        let classifier = TimeoutClassifier::new(
            Arc::new(SlowClassifier {
                delay: Duration::from_millis(300),
            }),
            Duration::from_millis(20),
        );
        let windows = windows(&image);
        assert!(classifier.is_anomalous(&windows[0]).is_err());

        let err = classifier.speed_change(&windows[1]).unwrap_err();
        assert!(matches!(err, Error::Inference { ref reason } if reason.contains("still running")));

        // Once the stuck call returns, the classifier is usable again.
        thread::sleep(Duration::from_millis(600));
        assert!(classifier.ensure_idle("check").is_ok());
    }
}
