// SPDX-License-Identifier: GPL-3.0-only

//! Region-of-interest geometry
//!
//! Pure functions that decide which part of a scaled camera frame is handed
//! to the predictors. Nothing in here touches pixels.

use crate::constants::ocr::{CARD_ASPECT_HEIGHT, CARD_ASPECT_WIDTH};

/// Sensor rotation in degrees (clockwise)
///
/// Camera sensors are usually mounted at 90° or 270° relative to the
/// display on phones, so frames arrive sideways and must be rotated
/// before they look upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360)
    ///
    /// Anything that is not 0, 90 or 180 after normalisation falls into the
    /// 270 branch, the same way [`compute_roi`] treats it.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            0 => SensorRotation::None,
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            _ => SensorRotation::Rotate270,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Square crop box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoiBox {
    pub x: u32,
    pub y: u32,
    pub side: u32,
}

/// Rectangular OCR band
///
/// `y` is signed: when the frame is shorter than the band the offset goes
/// negative and the caller has to reject the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrCrop {
    pub x: u32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Compute the square region of interest for a frame
///
/// The square follows the axis that ends up horizontal after the sensor
/// rotation is applied: width for 0°/180°, height for 90°/270°. The ratio
/// anchors the box center along the other axis; 180° and 270° mirror it
/// with `1 - ratio` because the frame is upside down relative to 0°/90°.
///
/// Clamping runs after the offset is computed. The side is capped at the
/// shorter image edge so the box always fits.
pub fn compute_roi(
    image_width: u32,
    image_height: u32,
    sensor_orientation: i32,
    roi_center_y_ratio: f32,
) -> RoiBox {
    let ratio = f64::from(roi_center_y_ratio);
    let width = i64::from(image_width);
    let height = i64::from(image_height);
    let shorter = width.min(height);

    let (mut x, mut y, side) = match sensor_orientation.rem_euclid(360) {
        0 => {
            let side = width.min(shorter);
            (0, centered_offset(height, ratio, side), side)
        }
        90 => {
            let side = height.min(shorter);
            (centered_offset(width, ratio, side), 0, side)
        }
        180 => {
            let side = width.min(shorter);
            (0, centered_offset(height, 1.0 - ratio, side), side)
        }
        _ => {
            let side = height.min(shorter);
            (centered_offset(width, 1.0 - ratio, side), 0, side)
        }
    };

    // keep the crop inside the image
    if x < 0 {
        x = 0;
    }
    if y < 0 {
        y = 0;
    }
    if x + side > width {
        x = width - side;
    }
    if y + side > height {
        y = height - side;
    }

    RoiBox {
        x: x as u32,
        y: y as u32,
        side: side as u32,
    }
}

fn centered_offset(extent: i64, ratio: f64, side: i64) -> i64 {
    (extent as f64 * ratio - side as f64 * 0.5).round() as i64
}

/// Compute the vertically centered OCR band of a card-shaped aspect ratio
///
/// Independent of orientation: the input is already upright.
pub fn compute_ocr_crop(width: u32, height: u32) -> OcrCrop {
    let crop_width = width as f32;
    let crop_height = crop_width * CARD_ASPECT_HEIGHT as f32 / CARD_ASPECT_WIDTH as f32;
    let y = (height as f32 - crop_height) / 2.0;

    OcrCrop {
        x: 0,
        y: y as i32,
        width,
        height: crop_height as u32,
    }
}
