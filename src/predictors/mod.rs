// SPDX-License-Identifier: GPL-3.0-only

//! Predictor seams
//!
//! Model inference lives outside this crate. The worker only sees these
//! traits: an OCR model, and object detectors built per job from a model
//! file. A predictor reports an unrecoverable internal fault through the
//! `fatal` flag of its output, which is different from returning an error
//! (a per-frame failure) and from finding nothing (an empty result).

pub mod qr;
pub mod types;

pub use qr::QrTextPredictor;
pub use types::{DetectedBox, FrameRegion};

use crate::errors::PredictorError;
use crate::job::{ExecutionContext, ModelFile};
use image::RgbImage;

/// Output of one OCR inference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// Recognized text, `None` when nothing was read
    pub text: Option<String>,
    /// Per-character boxes, when the model provides them
    pub digit_boxes: Vec<DetectedBox>,
    /// The model hit an unrecoverable fault
    pub fatal: bool,
}

impl OcrOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn nothing() -> Self {
        Self::default()
    }

    pub fn fatal() -> Self {
        Self {
            fatal: true,
            ..Self::default()
        }
    }
}

/// Output of one object-detection inference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectOutput {
    /// Detections in model order
    pub boxes: Vec<DetectedBox>,
    /// The model hit an unrecoverable fault
    pub fatal: bool,
}

impl ObjectOutput {
    pub fn boxes(boxes: Vec<DetectedBox>) -> Self {
        Self {
            boxes,
            fatal: false,
        }
    }

    pub fn fatal() -> Self {
        Self {
            boxes: Vec::new(),
            fatal: true,
        }
    }
}

/// Result handed to the dispatcher, consumed exactly once
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionResult {
    Ocr {
        text: Option<String>,
        digit_boxes: Vec<DetectedBox>,
    },
    Objects(Vec<DetectedBox>),
    /// Both families ran (UX-model jobs); either side may be empty
    Combined {
        text: Option<String>,
        digit_boxes: Vec<DetectedBox>,
        objects: Vec<DetectedBox>,
    },
    Fatal,
}

impl DetectionResult {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DetectionResult::Fatal)
    }
}

impl From<OcrOutput> for DetectionResult {
    fn from(output: OcrOutput) -> Self {
        if output.fatal {
            DetectionResult::Fatal
        } else {
            DetectionResult::Ocr {
                text: output.text,
                digit_boxes: output.digit_boxes,
            }
        }
    }
}

impl From<ObjectOutput> for DetectionResult {
    fn from(output: ObjectOutput) -> Self {
        if output.fatal {
            DetectionResult::Fatal
        } else {
            DetectionResult::Objects(output.boxes)
        }
    }
}

/// OCR model
///
/// Owned by the worker thread and called for every OCR job, so it can keep
/// its interpreter loaded between frames.
pub trait OcrPredictor: Send {
    fn predict(
        &mut self,
        image: &RgbImage,
        context: &ExecutionContext,
    ) -> Result<OcrOutput, PredictorError>;
}

impl<F> OcrPredictor for F
where
    F: FnMut(&RgbImage, &ExecutionContext) -> Result<OcrOutput, PredictorError> + Send,
{
    fn predict(
        &mut self,
        image: &RgbImage,
        context: &ExecutionContext,
    ) -> Result<OcrOutput, PredictorError> {
        self(image, context)
    }
}

/// Object detector bound to one model file
pub trait ObjectPredictor {
    fn predict_on_cpu(
        &mut self,
        image: &RgbImage,
        context: &ExecutionContext,
    ) -> Result<ObjectOutput, PredictorError>;
}

/// Builds an object detector from a model file
///
/// Called once per object job that carries a model file. Caching loaded
/// models is up to the implementation.
pub trait ObjectPredictorFactory: Send {
    fn create(&self, model: &ModelFile) -> Result<Box<dyn ObjectPredictor>, PredictorError>;
}

impl<F> ObjectPredictorFactory for F
where
    F: Fn(&ModelFile) -> Result<Box<dyn ObjectPredictor>, PredictorError> + Send,
{
    fn create(&self, model: &ModelFile) -> Result<Box<dyn ObjectPredictor>, PredictorError> {
        self(model)
    }
}

/// Factory for deployments without an object model
///
/// Jobs without a model file never reach the factory; jobs with one fail
/// with [`PredictorError::ModelLoad`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObjectModel;

impl ObjectPredictorFactory for NoObjectModel {
    fn create(&self, model: &ModelFile) -> Result<Box<dyn ObjectPredictor>, PredictorError> {
        Err(PredictorError::ModelLoad(format!(
            "no object detector available for {}",
            model
        )))
    }
}
