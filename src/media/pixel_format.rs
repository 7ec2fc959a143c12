// SPDX-License-Identifier: GPL-3.0-only

//! Pixel formats accepted for raw camera frames

/// Pixel format of a raw camera frame
///
/// Numeric codes follow the Android `ImageFormat`/`PixelFormat` constants
/// where one exists, and the little-endian FourCC otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// NV21 - Semi-planar 4:2:0 (Y plane + interleaved VU plane)
    /// Default preview format of Android camera sensors
    Nv21,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    Yuyv,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    Uyvy,
    /// RGB24 - 3 bytes per pixel
    Rgb24,
    /// RGBA - 4 bytes per pixel, alpha is ignored
    Rgba,
    /// Gray8 - single luma channel
    Gray8,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 8] = [
        PixelFormat::Nv21,
        PixelFormat::Nv12,
        PixelFormat::I420,
        PixelFormat::Yuyv,
        PixelFormat::Uyvy,
        PixelFormat::Rgb24,
        PixelFormat::Rgba,
        PixelFormat::Gray8,
    ];

    /// Map a numeric format code to a pixel format
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            17 => Some(Self::Nv21),
            0x3231_564E => Some(Self::Nv12),
            35 => Some(Self::I420),
            20 => Some(Self::Yuyv),
            0x5956_5955 => Some(Self::Uyvy),
            3 => Some(Self::Rgb24),
            1 => Some(Self::Rgba),
            0x2020_3859 => Some(Self::Gray8),
            _ => None,
        }
    }

    /// Numeric code of this format (inverse of [`PixelFormat::from_code`])
    pub fn code(&self) -> u32 {
        match self {
            Self::Nv21 => 17,
            Self::Nv12 => 0x3231_564E,
            Self::I420 => 35,
            Self::Yuyv => 20,
            Self::Uyvy => 0x5956_5955,
            Self::Rgb24 => 3,
            Self::Rgba => 1,
            Self::Gray8 => 0x2020_3859,
        }
    }

    /// Minimum buffer length for a frame of the given size
    ///
    /// Chroma planes round odd dimensions up.
    pub fn expected_len(&self, width: u32, height: u32) -> usize {
        let w = width as usize;
        let h = height as usize;
        let chroma_w = w.div_ceil(2);
        let chroma_h = h.div_ceil(2);
        match self {
            Self::Nv21 | Self::Nv12 | Self::I420 => w * h + chroma_w * chroma_h * 2,
            Self::Yuyv | Self::Uyvy => chroma_w * 4 * h,
            Self::Rgb24 => w * h * 3,
            Self::Rgba => w * h * 4,
            Self::Gray8 => w * h,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Nv21 => "NV21",
            Self::Nv12 => "NV12",
            Self::I420 => "I420",
            Self::Yuyv => "YUYV",
            Self::Uyvy => "UYVY",
            Self::Rgb24 => "RGB24",
            Self::Rgba => "RGBA",
            Self::Gray8 => "GRAY8",
        };
        write!(f, "{}", name)
    }
}
