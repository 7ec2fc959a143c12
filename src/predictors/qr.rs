// SPDX-License-Identifier: GPL-3.0-only

//! QR-code text predictor
//!
//! Reads the text encoded in a QR code with the rqrr crate. It stands in
//! for the OCR model when no model is packaged (the `cardscan scan`
//! command, bench setups), and reports each decoded code as one box.

use super::{DetectedBox, FrameRegion, OcrOutput, OcrPredictor};
use crate::errors::PredictorError;
use crate::job::ExecutionContext;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use tracing::{debug, trace};

/// QR code reader implementing [`OcrPredictor`]
///
/// Frames are converted to grayscale and downscaled so the longer edge is
/// at most `max_dimension` before the grid search.
#[derive(Debug, Clone)]
pub struct QrTextPredictor {
    max_dimension: u32,
}

impl Default for QrTextPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl QrTextPredictor {
    pub fn new() -> Self {
        Self { max_dimension: 640 }
    }

    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    fn prepare(&self, image: &RgbImage) -> GrayImage {
        let gray = imageops::grayscale(image);
        let (width, height) = gray.dimensions();
        let longest = width.max(height);
        if longest <= self.max_dimension {
            return gray;
        }
        let scale = self.max_dimension as f32 / longest as f32;
        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);
        imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
    }
}

impl OcrPredictor for QrTextPredictor {
    fn predict(
        &mut self,
        image: &RgbImage,
        _context: &ExecutionContext,
    ) -> Result<OcrOutput, PredictorError> {
        let start = std::time::Instant::now();
        let gray = self.prepare(image);
        let (width, height) = gray.dimensions();
        trace!(width, height, "Prepared grayscale image for QR search");

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                gray.get_pixel(x as u32, y as u32)[0]
            });
        let grids = prepared.detect_grids();

        let mut output = OcrOutput::nothing();
        for grid in grids {
            let content = match grid.decode() {
                Ok((_meta, content)) => content,
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR grid");
                    continue;
                }
            };

            output.digit_boxes.push(DetectedBox::new(
                bounds_region(&grid.bounds, width, height),
                0,
                1.0,
            ));
            if output.text.is_none() {
                output.text = Some(content);
            }
        }

        debug!(
            found = output.digit_boxes.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "QR search complete"
        );
        Ok(output)
    }
}

/// Axis-aligned normalized box around the four grid corners
fn bounds_region(bounds: &[rqrr::Point; 4], width: u32, height: u32) -> FrameRegion {
    let clamp_x = |v: i32| v.clamp(0, width as i32) as u32;
    let clamp_y = |v: i32| v.clamp(0, height as i32) as u32;

    let min_x = bounds.iter().map(|p| clamp_x(p.x)).min().unwrap_or(0);
    let max_x = bounds.iter().map(|p| clamp_x(p.x)).max().unwrap_or(0);
    let min_y = bounds.iter().map(|p| clamp_y(p.y)).min().unwrap_or(0);
    let max_y = bounds.iter().map(|p| clamp_y(p.y)).max().unwrap_or(0);

    FrameRegion::from_pixels(min_x, min_y, max_x - min_x, max_y - min_y, width, height)
}
