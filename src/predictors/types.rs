// SPDX-License-Identifier: MPL-2.0

//! Core types for prediction results

/// A rectangular region within an image
///
/// Coordinates are normalized (0.0 to 1.0) relative to the image the
/// predictor ran on, so they survive any later scaling of that image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of image, 1.0 = right of image)
    pub x: f32,
    /// Top edge (0.0 = top of image, 1.0 = bottom of image)
    pub y: f32,
    /// Width as fraction of image width
    pub width: f32,
    /// Height as fraction of image height
    pub height: f32,
}

impl FrameRegion {
    /// Create a region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }
}

/// One detection: where, what, and how sure
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedBox {
    pub region: FrameRegion,
    /// Model-specific class index (digit value for OCR boxes)
    pub class_id: u32,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
}

impl DetectedBox {
    pub fn new(region: FrameRegion, class_id: u32, confidence: f32) -> Self {
        Self {
            region,
            class_id,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_region_from_pixels() {
        let region = FrameRegion::from_pixels(100, 50, 200, 100, 1000, 500);
        assert!((region.x - 0.1).abs() < 0.001);
        assert!((region.y - 0.1).abs() < 0.001);
        assert!((region.width - 0.2).abs() < 0.001);
        assert!((region.height - 0.2).abs() < 0.001);
    }
}
