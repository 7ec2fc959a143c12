// SPDX-License-Identifier: GPL-3.0-only

//! Pixel transforms applied between decode and inference

use crate::constants::frame::WARM_UP_FILL;
use crate::errors::DecodeError;
use crate::geometry::{RoiBox, SensorRotation, compute_ocr_crop};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Target size so that the shorter edge equals `min_edge`
///
/// Integer arithmetic; the longer edge keeps the aspect ratio rounded down
/// and saturates at `u32::MAX`.
pub fn scaled_dimensions(width: u32, height: u32, min_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let (w, h, edge) = (u64::from(width), u64::from(height), u64::from(min_edge));
    let (scaled_w, scaled_h) = if w > h {
        (w * edge / h, edge)
    } else {
        (edge, h * edge / w)
    };
    let max = u64::from(u32::MAX);
    (scaled_w.clamp(1, max) as u32, scaled_h.clamp(1, max) as u32)
}

/// Resize so the shorter edge equals `min_edge` (nearest neighbour, no filtering)
pub fn scale_to_min_edge(image: RgbImage, min_edge: u32) -> RgbImage {
    let (width, height) = scaled_dimensions(image.width(), image.height(), min_edge);
    if (width, height) == image.dimensions() {
        return image;
    }
    imageops::resize(&image, width, height, FilterType::Nearest)
}

/// Copy out a square region
pub fn crop_square(image: &RgbImage, roi: RoiBox) -> Result<RgbImage, DecodeError> {
    let (width, height) = image.dimensions();
    if roi.side == 0 || roi.x + roi.side > width || roi.y + roi.side > height {
        return Err(DecodeError::CropOutOfBounds(format!(
            "{}x{} square at ({}, {}) in {}x{} image",
            roi.side, roi.side, roi.x, roi.y, width, height
        )));
    }
    Ok(imageops::crop_imm(image, roi.x, roi.y, roi.side, roi.side).to_image())
}

/// Rotate clockwise by the sensor rotation
pub fn rotate(image: RgbImage, rotation: SensorRotation) -> RgbImage {
    match rotation {
        SensorRotation::None => image,
        SensorRotation::Rotate90 => imageops::rotate90(&image),
        SensorRotation::Rotate180 => imageops::rotate180(&image),
        SensorRotation::Rotate270 => imageops::rotate270(&image),
    }
}

/// Cut the card-shaped OCR band out of an upright image
pub fn crop_for_ocr(image: &RgbImage) -> Result<RgbImage, DecodeError> {
    let (width, height) = image.dimensions();
    let crop = compute_ocr_crop(width, height);
    if crop.y < 0 || crop.height == 0 || crop.y as u32 + crop.height > height {
        return Err(DecodeError::CropOutOfBounds(format!(
            "{}x{} OCR band at y={} in {}x{} image",
            crop.width, crop.height, crop.y, width, height
        )));
    }
    Ok(imageops::crop_imm(image, crop.x, crop.y as u32, crop.width, crop.height).to_image())
}

/// Uniform gray square used when a job carries no pixels
pub fn placeholder(size: u32) -> RgbImage {
    RgbImage::from_pixel(size, size, Rgb(WARM_UP_FILL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_dimensions_landscape() {
        assert_eq!(scaled_dimensions(1920, 1080, 600), (1066, 600));
    }

    #[test]
    fn test_scaled_dimensions_portrait_and_square() {
        assert_eq!(scaled_dimensions(1080, 1920, 600), (600, 1066));
        assert_eq!(scaled_dimensions(800, 800, 600), (600, 600));
    }

    #[test]
    fn test_scaled_dimensions_saturate() {
        assert_eq!(scaled_dimensions(u32::MAX, 1, 600), (u32::MAX, 600));
    }

    #[test]
    fn test_scale_to_min_edge() {
        let img = RgbImage::new(40, 20);
        let scaled = scale_to_min_edge(img, 10);
        assert_eq!(scaled.dimensions(), (20, 10));
    }

    #[test]
    fn test_crop_square_bounds() {
        let img = RgbImage::new(10, 6);
        let fits = RoiBox {
            x: 4,
            y: 0,
            side: 6,
        };
        let ok = crop_square(&img, fits).unwrap();
        assert_eq!(ok.dimensions(), (6, 6));
        let overhangs = RoiBox {
            x: 5,
            y: 0,
            side: 6,
        };
        assert!(crop_square(&img, overhangs).is_err());
    }

    #[test]
    fn test_rotate_90_is_clockwise() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let rotated = rotate(img, SensorRotation::Rotate90);
        assert_eq!(rotated.dimensions(), (1, 2));
        // left pixel of a row ends up on top after a clockwise turn
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0]);
    }

    #[test]
    fn test_crop_for_ocr() {
        let img = placeholder(480);
        let band = crop_for_ocr(&img).unwrap();
        assert_eq!(band.dimensions(), (480, 300));
    }

    #[test]
    fn test_crop_for_ocr_rejects_flat_image() {
        let img = RgbImage::new(600, 100);
        assert!(matches!(
            crop_for_ocr(&img),
            Err(DecodeError::CropOutOfBounds(_))
        ));
    }

    #[test]
    fn test_placeholder_is_gray() {
        let img = placeholder(4);
        assert!(img.pixels().all(|p| p.0 == WARM_UP_FILL));
    }
}
