// SPDX-License-Identifier: GPL-3.0-only

//! Raw frame decoding
//!
//! [`FrameDecoder`] is the seam between camera buffers and the worker.
//! [`YuvDecoder`] is the software implementation used by default; it
//! converts every supported [`PixelFormat`] to packed RGB with BT.601
//! coefficients.

use super::PixelFormat;
use crate::errors::DecodeError;
use image::RgbImage;

/// Decodes a raw camera buffer into an RGB image
pub trait FrameDecoder: Send {
    fn decode(
        &self,
        bytes: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<RgbImage, DecodeError>;
}

/// Software YUV/RGB decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct YuvDecoder;

impl YuvDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for YuvDecoder {
    fn decode(
        &self,
        bytes: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<RgbImage, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let expected = format.expected_len(width, height);
        if bytes.len() < expected {
            return Err(DecodeError::BufferTooSmall {
                expected,
                actual: bytes.len(),
            });
        }

        let rgb = match format {
            PixelFormat::Nv21 => semi_planar_to_rgb(bytes, width, height, true),
            PixelFormat::Nv12 => semi_planar_to_rgb(bytes, width, height, false),
            PixelFormat::I420 => i420_to_rgb(bytes, width, height),
            PixelFormat::Yuyv => packed_422_to_rgb(bytes, width, height, [0, 1, 2, 3]),
            PixelFormat::Uyvy => packed_422_to_rgb(bytes, width, height, [1, 0, 3, 2]),
            PixelFormat::Rgb24 => bytes[..expected].to_vec(),
            PixelFormat::Rgba => bytes[..expected]
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            PixelFormat::Gray8 => bytes[..expected].iter().flat_map(|&y| [y, y, y]).collect(),
        };

        into_image(width, height, rgb)
    }
}

/// Wrap converted RGB bytes, reporting the real length on a mismatch
fn into_image(width: u32, height: u32, rgb: Vec<u8>) -> Result<RgbImage, DecodeError> {
    let expected = (width as usize) * (height as usize) * 3;
    let actual = rgb.len();
    RgbImage::from_raw(width, height, rgb).ok_or(DecodeError::BufferTooSmall { expected, actual })
}

/// Convert one YUV sample to RGB (BT.601, full range)
#[inline]
fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    [r, g, b]
}

/// NV21 (`vu_order = true`) or NV12 to RGB
fn semi_planar_to_rgb(data: &[u8], width: u32, height: u32, vu_order: bool) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let chroma_stride = w.div_ceil(2) * 2;
    let (luma, chroma) = data.split_at(w * h);

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let chroma_row = (row / 2) * chroma_stride;
        for col in 0..w {
            let pair = chroma_row + (col / 2) * 2;
            let (u, v) = if vu_order {
                (chroma[pair + 1], chroma[pair])
            } else {
                (chroma[pair], chroma[pair + 1])
            };
            rgb.extend_from_slice(&yuv_to_rgb(luma[row * w + col], u, v));
        }
    }
    rgb
}

fn i420_to_rgb(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let chroma_w = w.div_ceil(2);
    let chroma_len = chroma_w * h.div_ceil(2);
    let (luma, rest) = data.split_at(w * h);
    let (u_plane, v_plane) = rest.split_at(chroma_len);

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for col in 0..w {
            let c = (row / 2) * chroma_w + col / 2;
            rgb.extend_from_slice(&yuv_to_rgb(luma[row * w + col], u_plane[c], v_plane[c]));
        }
    }
    rgb
}

/// Packed 4:2:2; `layout` gives the byte index of [Y0, U, Y1, V] in each group
fn packed_422_to_rgb(data: &[u8], width: u32, height: u32, layout: [usize; 4]) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let row_bytes = w.div_ceil(2) * 4;

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let line = &data[row * row_bytes..(row + 1) * row_bytes];
        for (i, group) in line.chunks_exact(4).enumerate() {
            let u = group[layout[1]];
            let v = group[layout[3]];
            rgb.extend_from_slice(&yuv_to_rgb(group[layout[0]], u, v));
            if i * 2 + 1 < w {
                rgb.extend_from_slice(&yuv_to_rgb(group[layout[2]], u, v));
            }
        }
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv21_frame(width: u32, height: u32, y: u8, u: u8, v: u8) -> Vec<u8> {
        let mut data = vec![y; (width * height) as usize];
        for _ in 0..(width.div_ceil(2) * height.div_ceil(2)) {
            data.push(v);
            data.push(u);
        }
        data
    }

    #[test]
    fn test_neutral_chroma_is_gray() {
        let data = nv21_frame(4, 2, 100, 128, 128);
        let img = YuvDecoder.decode(&data, 4, 2, PixelFormat::Nv21).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        for px in img.pixels() {
            assert_eq!(px.0, [100, 100, 100]);
        }
    }

    #[test]
    fn test_nv21_and_nv12_swap_chroma() {
        // strong V (red) in NV21 order becomes strong U (blue) when read as NV12
        let data = nv21_frame(2, 2, 128, 128, 255);
        let red = YuvDecoder.decode(&data, 2, 2, PixelFormat::Nv21).unwrap();
        let blue = YuvDecoder.decode(&data, 2, 2, PixelFormat::Nv12).unwrap();
        assert!(red.get_pixel(0, 0)[0] > red.get_pixel(0, 0)[2]);
        assert!(blue.get_pixel(0, 0)[2] > blue.get_pixel(0, 0)[0]);
    }

    #[test]
    fn test_odd_dimensions_decode() {
        let data = nv21_frame(3, 3, 50, 128, 128);
        let img = YuvDecoder.decode(&data, 3, 3, PixelFormat::Nv21).unwrap();
        assert_eq!(img.dimensions(), (3, 3));
    }

    #[test]
    fn test_yuyv_and_uyvy() {
        let yuyv = [10u8, 128, 20, 128];
        let img = YuvDecoder.decode(&yuyv, 2, 1, PixelFormat::Yuyv).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [10, 10, 10]);
        assert_eq!(img.get_pixel(1, 0).0, [20, 20, 20]);

        let uyvy = [128u8, 10, 128, 20];
        let img = YuvDecoder.decode(&uyvy, 2, 1, PixelFormat::Uyvy).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [20, 20, 20]);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let data = [1u8, 2, 3, 255, 4, 5, 6, 0];
        let img = YuvDecoder.decode(&data, 2, 1, PixelFormat::Rgba).unwrap();
        assert_eq!(img.into_raw(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_short_rgb_output_reports_its_length() {
        assert_eq!(
            into_image(4, 2, vec![0u8; 20]).unwrap_err(),
            DecodeError::BufferTooSmall {
                expected: 24,
                actual: 20,
            }
        );
        assert_eq!(into_image(4, 2, vec![0u8; 24]).unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = YuvDecoder
            .decode(&[0u8; 10], 4, 4, PixelFormat::Nv21)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::BufferTooSmall {
                expected: 24,
                actual: 10
            }
        );
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let err = YuvDecoder.decode(&[], 0, 4, PixelFormat::Gray8).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidDimensions { .. }));
    }
}
