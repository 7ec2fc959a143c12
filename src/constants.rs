// SPDX-License-Identifier: GPL-3.0-only

//! Worker-wide constants

/// Frame preprocessing constants
pub mod frame {
    /// Shorter edge (in pixels) that decoded frames are scaled to before cropping
    pub const MIN_IMAGE_EDGE: u32 = 600;

    /// Upper bound on the pixel count of a scaled frame
    ///
    /// Sixteen minimum-edge squares, so a 16:1 strip at the default edge
    /// still fits. Frames that would scale past this are rejected before
    /// any resize buffer is allocated.
    pub const MAX_SCALED_PIXELS: u64 = 16 * 600 * 600;

    /// Side length of the gray placeholder image used by warm-up jobs
    pub const WARM_UP_IMAGE_SIZE: u32 = 480;

    /// Fill value for the warm-up placeholder (RGB gray)
    pub const WARM_UP_FILL: [u8; 3] = [0x88, 0x88, 0x88];

    /// Sensor orientation carried by the warm-up sentinel
    pub const WARM_UP_SENSOR_ORIENTATION: u32 = 90;

    /// ROI center ratio carried by the warm-up sentinel
    pub const WARM_UP_ROI_CENTER_Y_RATIO: f32 = 0.5;
}

/// OCR band geometry
///
/// Payment cards are ISO/IEC 7810 ID-1, roughly 600:375 once the corners
/// are trimmed. The OCR band keeps that aspect ratio.
pub mod ocr {
    /// Width term of the card aspect ratio
    pub const CARD_ASPECT_WIDTH: u32 = 600;

    /// Height term of the card aspect ratio
    pub const CARD_ASPECT_HEIGHT: u32 = 375;
}

/// Queue constants
pub mod queue {
    /// Backlog length at which the worker starts warning about growth
    pub const BACKLOG_WARN_THRESHOLD: usize = 32;
}

/// Thread naming
pub mod threads {
    /// Name of the single consumer thread
    pub const WORKER_THREAD_NAME: &str = "ml-worker";

    /// Name of the callback message-loop thread
    pub const CALLBACK_THREAD_NAME: &str = "ml-callbacks";
}
