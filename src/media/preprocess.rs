// SPDX-License-Identifier: MPL-2.0

//! Raw frame to upright image pair
//!
//! Decode, scale to the minimum edge, crop the square region of interest,
//! then rotate both the crop and the full frame by the sensor orientation.

use super::FrameDecoder;
use super::transform::{crop_square, rotate, scale_to_min_edge, scaled_dimensions};
use crate::constants::frame::MAX_SCALED_PIXELS;
use crate::errors::DecodeError;
use crate::geometry::{SensorRotation, compute_roi};
use crate::job::RawFrame;
use image::RgbImage;
use std::time::Instant;
use tracing::debug;

/// Images produced from one raw frame
#[derive(Debug, Clone)]
pub struct FramePair {
    /// Upright square region of interest
    pub cropped: RgbImage,
    /// Upright full frame at the scaled resolution
    pub full_screen: Option<RgbImage>,
}

/// Runs the raw-frame pipeline on the worker thread
pub struct FramePreprocessor {
    decoder: Box<dyn FrameDecoder>,
    min_image_edge: u32,
    print_timing: bool,
}

impl FramePreprocessor {
    pub fn new(decoder: Box<dyn FrameDecoder>, min_image_edge: u32, print_timing: bool) -> Self {
        Self {
            decoder,
            min_image_edge,
            print_timing,
        }
    }

    pub fn prepare(
        &self,
        frame: &RawFrame,
        roi_center_y_ratio: f32,
    ) -> Result<FramePair, DecodeError> {
        let (scaled_w, scaled_h) =
            scaled_dimensions(frame.width(), frame.height(), self.min_image_edge);
        if u64::from(scaled_w) * u64::from(scaled_h) > MAX_SCALED_PIXELS {
            return Err(DecodeError::FrameTooLarge {
                width: scaled_w,
                height: scaled_h,
            });
        }

        let start = Instant::now();
        let decoded = self.decoder.decode(
            frame.bytes(),
            frame.width(),
            frame.height(),
            frame.format(),
        )?;
        let scaled = scale_to_min_edge(decoded, self.min_image_edge);
        let decode_elapsed = start.elapsed();

        let crop_start = Instant::now();
        let (width, height) = scaled.dimensions();
        let roi = compute_roi(
            width,
            height,
            frame.sensor_orientation(),
            roi_center_y_ratio,
        );
        let square = crop_square(&scaled, roi)?;
        let crop_elapsed = crop_start.elapsed();

        let rotate_start = Instant::now();
        let rotation = SensorRotation::from_degrees_int(frame.sensor_orientation());
        let cropped = rotate(square, rotation);
        let full_screen = rotate(scaled, rotation);
        let rotate_elapsed = rotate_start.elapsed();

        if self.print_timing {
            debug!(
                format = %frame.format(),
                width = frame.width(),
                height = frame.height(),
                rotation = %rotation,
                decode_ms = decode_elapsed.as_millis(),
                crop_ms = crop_elapsed.as_millis(),
                rotate_ms = rotate_elapsed.as_millis(),
                "Frame preprocessed"
            );
        }

        Ok(FramePair {
            cropped,
            full_screen: Some(full_screen),
        })
    }
}

impl std::fmt::Debug for FramePreprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePreprocessor")
            .field("min_image_edge", &self.min_image_edge)
            .field("print_timing", &self.print_timing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{PixelFormat, YuvDecoder};

    fn gray_nv21(width: u32, height: u32) -> RawFrame {
        let len = PixelFormat::Nv21.expected_len(width, height);
        RawFrame::new(vec![128u8; len], width, height, PixelFormat::Nv21, 90).unwrap()
    }

    #[test]
    fn test_portrait_sensor_gives_square_and_rotated_full_frame() {
        let preprocessor = FramePreprocessor::new(Box::new(YuvDecoder::new()), 600, true);
        let pair = preprocessor.prepare(&gray_nv21(1280, 720), 0.5).unwrap();

        assert_eq!(pair.cropped.dimensions(), (600, 600));
        // 1280x720 scales to 1066x600, then turns on its side
        assert_eq!(pair.full_screen.unwrap().dimensions(), (600, 1066));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let preprocessor = FramePreprocessor::new(Box::new(YuvDecoder::new()), 600, false);
        let frame = RawFrame::new(vec![0u8; 16], 64, 64, PixelFormat::Nv21, 0).unwrap();
        assert!(matches!(
            preprocessor.prepare(&frame, 0.5),
            Err(DecodeError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_extreme_aspect_frame_is_rejected_before_scaling() {
        let preprocessor = FramePreprocessor::new(Box::new(YuvDecoder::new()), 600, false);
        let frame =
            RawFrame::new(vec![128u8; 20_000], 20_000, 1, PixelFormat::Gray8, 90).unwrap();
        assert_eq!(
            preprocessor.prepare(&frame, 0.5).unwrap_err(),
            DecodeError::FrameTooLarge {
                width: 12_000_000,
                height: 600,
            }
        );
    }

    #[test]
    fn test_wide_but_bounded_frame_is_accepted() {
        // 16:1 at the default edge sits exactly on the limit
        let preprocessor = FramePreprocessor::new(Box::new(YuvDecoder::new()), 600, false);
        let frame =
            RawFrame::new(vec![128u8; 1600 * 100], 1600, 100, PixelFormat::Gray8, 0).unwrap();
        let pair = preprocessor.prepare(&frame, 0.5).unwrap();
        assert_eq!(pair.full_screen.unwrap().dimensions(), (9600, 600));
    }
}
