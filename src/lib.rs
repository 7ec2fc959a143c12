// SPDX-License-Identifier: MPL-2.0

//! Card scanner ML worker
//!
//! Runs on-device card recognition off the capture thread. Camera frames
//! (or already-decoded images) are posted as jobs; a single worker thread
//! decodes, crops and rotates them, runs the OCR model or an object
//! detector, and delivers results to caller-supplied listeners on a
//! separate callback context.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`job`]: Immutable job descriptions and their payloads
//! - [`queue`]: The LIFO job queue and warm-up sentinel
//! - [`geometry`]: Region-of-interest and OCR band computation
//! - [`media`]: Raw frame decoding and pixel transforms
//! - [`predictors`]: Model seams and the QR-code text predictor
//! - [`dispatch`]: Listener traits, callback executors and result delivery
//! - [`worker`]: The worker thread and per-job pipeline
//! - [`config`]: Worker configuration
//!
//! # Example
//!
//! ```ignore
//! let worker = MlWorker::spawn(
//!     WorkerConfig::default(),
//!     WorkerComponents::new(Box::new(QrTextPredictor::new()), Box::new(NoObjectModel)),
//!     Arc::new(CallbackThread::spawn("ml-callbacks")?),
//! )?;
//! worker.warm_up(ExecutionContext::empty());
//! worker.post_ocr_frame(frame, listener, ExecutionContext::empty(), 0.5)?;
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod geometry;
pub mod job;
pub mod media;
pub mod predictors;
pub mod queue;
pub mod worker;

// Re-export commonly used types
pub use config::WorkerConfig;
pub use dispatch::{
    CallbackExecutor, CallbackThread, InlineExecutor, ObjectListener, ObjectResult, ScanListener,
    ScanResult, TokioExecutor, UxModelListener, UxResult,
};
pub use errors::{WorkerError, WorkerResult};
pub use geometry::{OcrCrop, RoiBox, SensorRotation, compute_ocr_crop, compute_roi};
pub use job::{ExecutionContext, Job, JobId, JobKind, ModelFile, RawFrame};
pub use media::PixelFormat;
pub use predictors::{
    DetectedBox, DetectionResult, NoObjectModel, ObjectOutput, ObjectPredictor,
    ObjectPredictorFactory, OcrOutput, OcrPredictor, QrTextPredictor,
};
pub use queue::JobQueue;
pub use worker::{JobReport, MlWorker, WorkerComponents, WorkerStats};
