// SPDX-License-Identifier: MPL-2.0

//! Frame decoding and preprocessing
//!
//! Camera frames arrive as raw YUV buffers. Before a predictor sees them
//! they are decoded to RGB, scaled so the shorter edge has a fixed size,
//! cropped to a square region of interest and rotated upright.
//!
//! # Modules
//!
//! - [`pixel_format`]: Supported raw pixel formats and their buffer sizes
//! - [`decoder`]: The [`FrameDecoder`] seam and the software [`YuvDecoder`]
//! - [`transform`]: Scale, crop, rotate and OCR-band helpers
//! - [`preprocess`]: The full raw-frame to image-pair pipeline

pub mod decoder;
pub mod pixel_format;
pub mod preprocess;
pub mod transform;

// Re-export commonly used types
pub use decoder::{FrameDecoder, YuvDecoder};
pub use pixel_format::PixelFormat;
pub use preprocess::{FramePair, FramePreprocessor};
