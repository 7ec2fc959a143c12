// SPDX-License-Identifier: GPL-3.0-only

//! Result delivery
//!
//! The worker thread produces a [`DetectionResult`] per job and hands it to
//! the [`ResultDispatcher`], which posts exactly one callback to the
//! listener on the callback executor. A panicking listener is contained
//! there and logged; it never reaches the worker loop.

pub mod executor;
pub mod listeners;

pub use executor::{Callback, CallbackExecutor, CallbackThread, InlineExecutor, TokioExecutor};
pub use listeners::{
    ObjectListener, ObjectResult, ScanListener, ScanResult, UxModelListener, UxResult,
};

use crate::errors::{DispatchError, panic_message};
use crate::job::{JobId, JobListener};
use crate::predictors::DetectionResult;
use image::RgbImage;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Images that travel with a result to the listener
#[derive(Debug, Clone)]
pub struct DeliveryImages {
    /// Upright square the object detector saw (or the input image)
    pub square: RgbImage,
    /// OCR band, when OCR ran
    pub ocr_band: Option<RgbImage>,
    /// Rotated full frame, raw-frame jobs only
    pub full_screen: Option<RgbImage>,
}

impl DeliveryImages {
    pub fn new(square: RgbImage) -> Self {
        Self {
            square,
            ocr_band: None,
            full_screen: None,
        }
    }
}

/// Posts results to listeners through a [`CallbackExecutor`]
#[derive(Clone)]
pub struct ResultDispatcher {
    executor: Arc<dyn CallbackExecutor>,
}

impl ResultDispatcher {
    pub fn new(executor: Arc<dyn CallbackExecutor>) -> Self {
        Self { executor }
    }

    /// Deliver one result; returns whether a callback was posted
    ///
    /// Jobs without a listener (warm-up) drop the result here.
    pub fn deliver(
        &self,
        job_id: JobId,
        listener: JobListener,
        result: DetectionResult,
        images: DeliveryImages,
    ) -> Result<bool, DispatchError> {
        if matches!(listener, JobListener::None) {
            debug!(job = %job_id, "No listener attached, dropping result");
            return Ok(false);
        }

        self.executor.execute(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                invoke(job_id, listener, result, images);
            }));
            if let Err(payload) = outcome {
                let error = DispatchError::ListenerPanicked(panic_message(payload.as_ref()));
                warn!(job = %job_id, error = %error, "Listener callback failed");
            }
        }))?;
        Ok(true)
    }
}

impl std::fmt::Debug for ResultDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDispatcher").finish_non_exhaustive()
    }
}

/// Runs on the callback context. The result and its images drop on return.
fn invoke(job_id: JobId, listener: JobListener, result: DetectionResult, images: DeliveryImages) {
    match (listener, result) {
        (JobListener::Scan(listener), DetectionResult::Fatal) => listener.on_fatal_error(),
        (JobListener::Object(listener), DetectionResult::Fatal) => {
            listener.on_object_fatal_error()
        }
        (JobListener::UxModel(listener), DetectionResult::Fatal) => listener.on_fatal_error(),

        (JobListener::Scan(listener), DetectionResult::Ocr { text, digit_boxes }) => {
            let ocr_image = images
                .ocr_band
                .unwrap_or_else(|| images.square.clone());
            listener.on_prediction(&ScanResult {
                number: text,
                digit_boxes,
                ocr_image,
                object_detection_image: images.square,
                full_screen: images.full_screen,
            });
        }

        (JobListener::Object(listener), DetectionResult::Objects(boxes)) => {
            let (width, height) = images.square.dimensions();
            listener.on_prediction(&ObjectResult {
                image: images.square,
                boxes,
                width,
                height,
                full_screen: images.full_screen,
            });
        }

        (
            JobListener::UxModel(listener),
            DetectionResult::Combined {
                text,
                digit_boxes,
                objects,
            },
        ) => {
            let (width, height) = images.square.dimensions();
            listener.on_prediction(&UxResult {
                number: text,
                digit_boxes,
                objects,
                image: images.square,
                width,
                height,
                ocr_image: images.ocr_band,
                full_screen: images.full_screen,
            });
        }

        (listener, result) => {
            warn!(
                job = %job_id,
                listener = ?listener,
                result = ?result,
                "Result does not match listener type, dropping"
            );
        }
    }
}
