// SPDX-License-Identifier: MPL-2.0

//! Error types for the scan worker

use std::fmt;

/// Result type alias using WorkerError
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Main worker error type
///
/// One of these is produced for every job that fails somewhere between
/// dequeue and delivery. The worker loop logs it and moves on.
#[derive(Debug, Clone)]
pub enum WorkerError {
    /// Frame decoding failed
    Decode(DecodeError),
    /// Job construction was rejected
    Job(JobError),
    /// A predictor reported an error (not a fatal signal)
    Predictor(PredictorError),
    /// Delivery to the callback context failed
    Dispatch(DispatchError),
    /// Configuration errors
    Config(String),
    /// A panic was caught at the worker loop boundary
    Panicked(String),
    /// Generic error with message
    Other(String),
}

/// Frame decoding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Width or height is zero
    InvalidDimensions { width: u32, height: u32 },
    /// Buffer is shorter than the pixel format requires
    BufferTooSmall { expected: usize, actual: usize },
    /// Pixel format code is not recognised
    UnsupportedFormat(u32),
    /// Frame would scale to more pixels than the worker allows
    FrameTooLarge { width: u32, height: u32 },
    /// Crop box does not fit in the image
    CropOutOfBounds(String),
}

/// Job construction errors
#[derive(Debug, Clone, PartialEq)]
pub enum JobError {
    /// Raw frame had no bytes
    EmptyFrame,
    /// Raw frame had a zero dimension
    InvalidDimensions { width: u32, height: u32 },
    /// Decoded image had a zero dimension
    EmptyImage { width: u32, height: u32 },
    /// ROI center ratio outside [0, 1] or not finite
    InvalidRoiRatio(f32),
    /// UX-model job selected neither sub-model
    NothingToRun,
}

/// Predictor errors
#[derive(Debug, Clone)]
pub enum PredictorError {
    /// The object model could not be loaded from its file
    ModelLoad(String),
    /// Inference failed for this frame
    Inference(String),
}

/// Callback dispatch errors
#[derive(Debug, Clone)]
pub enum DispatchError {
    /// The callback context is gone (thread exited, runtime shut down)
    ExecutorClosed,
    /// The listener panicked while handling a result
    ListenerPanicked(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Decode(e) => write!(f, "Decode error: {}", e),
            WorkerError::Job(e) => write!(f, "Job error: {}", e),
            WorkerError::Predictor(e) => write!(f, "Predictor error: {}", e),
            WorkerError::Dispatch(e) => write!(f, "Dispatch error: {}", e),
            WorkerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            WorkerError::Panicked(msg) => write!(f, "Job panicked: {}", msg),
            WorkerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {}x{}", width, height)
            }
            DecodeError::BufferTooSmall { expected, actual } => write!(
                f,
                "Frame buffer too small: expected {} bytes, got {}",
                expected, actual
            ),
            DecodeError::UnsupportedFormat(code) => {
                write!(f, "Unsupported pixel format code {}", code)
            }
            DecodeError::FrameTooLarge { width, height } => {
                write!(f, "Frame would scale to {}x{}, above the pixel limit", width, height)
            }
            DecodeError::CropOutOfBounds(msg) => write!(f, "Crop out of bounds: {}", msg),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::EmptyFrame => write!(f, "Frame has no bytes"),
            JobError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions {}x{}", width, height)
            }
            JobError::EmptyImage { width, height } => {
                write!(f, "Image has no pixels ({}x{})", width, height)
            }
            JobError::InvalidRoiRatio(ratio) => {
                write!(f, "ROI center ratio {} is outside [0, 1]", ratio)
            }
            JobError::NothingToRun => write!(f, "UX-model job selects no model"),
        }
    }
}

impl fmt::Display for PredictorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictorError::ModelLoad(msg) => write!(f, "Failed to load model: {}", msg),
            PredictorError::Inference(msg) => write!(f, "Inference failed: {}", msg),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::ExecutorClosed => write!(f, "Callback executor is closed"),
            DispatchError::ListenerPanicked(msg) => write!(f, "Listener panicked: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for JobError {}
impl std::error::Error for PredictorError {}
impl std::error::Error for DispatchError {}

impl From<DecodeError> for WorkerError {
    fn from(err: DecodeError) -> Self {
        WorkerError::Decode(err)
    }
}

impl From<JobError> for WorkerError {
    fn from(err: JobError) -> Self {
        WorkerError::Job(err)
    }
}

impl From<PredictorError> for WorkerError {
    fn from(err: PredictorError) -> Self {
        WorkerError::Predictor(err)
    }
}

impl From<DispatchError> for WorkerError {
    fn from(err: DispatchError) -> Self {
        WorkerError::Dispatch(err)
    }
}

impl From<String> for WorkerError {
    fn from(msg: String) -> Self {
        WorkerError::Other(msg)
    }
}

impl From<&str> for WorkerError {
    fn from(msg: &str) -> Self {
        WorkerError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        WorkerError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Config(err.to_string())
    }
}

/// Render a caught panic payload as text
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
