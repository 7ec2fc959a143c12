// SPDX-License-Identifier: GPL-3.0-only

//! Listener capabilities implemented by callers
//!
//! Every callback runs on the callback executor, never on the worker
//! thread. Results are lent to the listener; the images inside are freed
//! as soon as the callback returns, so keep a clone if you need one later.

use crate::predictors::DetectedBox;
use image::RgbImage;

/// OCR prediction handed to a [`ScanListener`]
#[derive(Debug)]
pub struct ScanResult {
    /// Recognized card number, `None` when nothing was read
    pub number: Option<String>,
    pub digit_boxes: Vec<DetectedBox>,
    /// The OCR band the model ran on
    pub ocr_image: RgbImage,
    /// Upright square crop the OCR band was cut from
    pub object_detection_image: RgbImage,
    /// Whole rotated frame; only present for raw-frame jobs
    pub full_screen: Option<RgbImage>,
}

/// Object detection handed to an [`ObjectListener`]
#[derive(Debug)]
pub struct ObjectResult {
    pub image: RgbImage,
    pub boxes: Vec<DetectedBox>,
    pub width: u32,
    pub height: u32,
    pub full_screen: Option<RgbImage>,
}

/// Combined prediction handed to a [`UxModelListener`]
#[derive(Debug)]
pub struct UxResult {
    /// OCR text; always `None` when OCR was not requested
    pub number: Option<String>,
    pub digit_boxes: Vec<DetectedBox>,
    /// Object detections; empty when the detector was skipped
    pub objects: Vec<DetectedBox>,
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
    /// OCR band, present when OCR ran
    pub ocr_image: Option<RgbImage>,
    pub full_screen: Option<RgbImage>,
}

/// Receives OCR results
pub trait ScanListener: Send + Sync {
    fn on_prediction(&self, result: &ScanResult);
    fn on_fatal_error(&self);
}

/// Receives object-detection results
pub trait ObjectListener: Send + Sync {
    fn on_prediction(&self, result: &ObjectResult);
    fn on_object_fatal_error(&self);
}

/// Receives UX-model results
pub trait UxModelListener: Send + Sync {
    fn on_prediction(&self, result: &UxResult);
    fn on_fatal_error(&self);
}
