// SPDX-License-Identifier: GPL-3.0-only

//! Units of work submitted to the worker
//!
//! A [`Job`] is built once by a producer and never changes afterwards. The
//! constructors are the only way to make one, so the payload always matches
//! the kind: raw-frame kinds carry a [`RawFrame`], image kinds carry an
//! already-decoded image, and the warm-up sentinel carries nothing.

use crate::constants::frame::{WARM_UP_ROI_CENTER_Y_RATIO, WARM_UP_SENSOR_ORIENTATION};
use crate::dispatch::{ObjectListener, ScanListener, UxModelListener};
use crate::errors::{DecodeError, JobError, WorkerResult};
use crate::media::PixelFormat;
use image::RgbImage;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Correlation id attached to every job and its log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the worker should do with a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Sentinel that forces the decode and OCR path to initialise
    WarmUp,
    /// OCR on a raw camera frame
    OcrFromBytes,
    /// OCR on an already-decoded image (bypasses decode and ROI crop)
    OcrFromImage,
    /// Object detection on a raw camera frame
    ObjectFromBytes,
    /// Object detection on an already-decoded image
    ObjectFromImage,
    /// Object detection and/or OCR on a raw frame, selected by flags
    UxModel,
}

impl JobKind {
    /// Kinds whose primary predictor is the OCR model
    pub fn is_ocr(&self) -> bool {
        matches!(
            self,
            JobKind::WarmUp | JobKind::OcrFromBytes | JobKind::OcrFromImage
        )
    }
}

/// Raw camera frame as delivered by the capture path
#[derive(Clone)]
pub struct RawFrame {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
    format: PixelFormat,
    sensor_orientation: i32,
}

impl RawFrame {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        width: u32,
        height: u32,
        format: PixelFormat,
        sensor_orientation: i32,
    ) -> Result<Self, JobError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(JobError::EmptyFrame);
        }
        if width == 0 || height == 0 {
            return Err(JobError::InvalidDimensions { width, height });
        }
        Ok(Self {
            bytes,
            width,
            height,
            format,
            sensor_orientation,
        })
    }

    /// Build a frame from a numeric pixel format code
    ///
    /// Codes are the ones listed on [`PixelFormat::from_code`]; anything else
    /// is rejected before the frame reaches the queue.
    pub fn from_format_code(
        bytes: impl Into<Arc<[u8]>>,
        width: u32,
        height: u32,
        format_code: u32,
        sensor_orientation: i32,
    ) -> WorkerResult<Self> {
        let format =
            PixelFormat::from_code(format_code).ok_or(DecodeError::UnsupportedFormat(format_code))?;
        Ok(Self::new(bytes, width, height, format, sensor_orientation)?)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Clockwise rotation in degrees needed to make the frame upright
    pub fn sensor_orientation(&self) -> i32 {
        self.sensor_orientation
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("sensor_orientation", &self.sensor_orientation)
            .finish()
    }
}

/// Pixel payload of a job; exactly one kind of source per job
#[derive(Debug)]
pub enum JobSource {
    Frame(RawFrame),
    Image(RgbImage),
    /// Warm-up sentinel, no pixels
    Empty,
}

/// Listener attached to a job
#[derive(Clone)]
pub enum JobListener {
    Scan(Arc<dyn ScanListener>),
    Object(Arc<dyn ObjectListener>),
    UxModel(Arc<dyn UxModelListener>),
    None,
}

impl fmt::Debug for JobListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobListener::Scan(_) => "Scan",
            JobListener::Object(_) => "Object",
            JobListener::UxModel(_) => "UxModel",
            JobListener::None => "None",
        };
        write!(f, "JobListener::{}", name)
    }
}

/// Handle to an object-detection model file, passed through unexamined
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelFile(PathBuf);

impl ModelFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ModelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Opaque context handed through to decoders and predictors
///
/// The worker never looks inside. Predictors that know what was stored can
/// get it back with [`ExecutionContext::downcast_ref`].
#[derive(Clone, Default)]
pub struct ExecutionContext(Option<Arc<dyn Any + Send + Sync>>);

impl ExecutionContext {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "ExecutionContext(..)"),
            None => write!(f, "ExecutionContext(empty)"),
        }
    }
}

/// One unit of work
#[derive(Debug)]
pub struct Job {
    pub(crate) id: JobId,
    pub(crate) kind: JobKind,
    pub(crate) source: JobSource,
    pub(crate) roi_center_y_ratio: f32,
    pub(crate) listener: JobListener,
    pub(crate) model_file: Option<ModelFile>,
    pub(crate) run_additional_ocr: bool,
    pub(crate) run_ux_model: bool,
    pub(crate) context: ExecutionContext,
}

impl Job {
    fn build(
        kind: JobKind,
        source: JobSource,
        roi_center_y_ratio: f32,
        listener: JobListener,
        context: ExecutionContext,
    ) -> Self {
        Self {
            id: JobId::new(),
            kind,
            source,
            roi_center_y_ratio,
            listener,
            model_file: None,
            run_additional_ocr: false,
            run_ux_model: false,
            context,
        }
    }

    /// Sentinel that wakes the worker and runs OCR on a placeholder image
    pub fn warm_up(context: ExecutionContext) -> Self {
        Self::build(
            JobKind::WarmUp,
            JobSource::Empty,
            WARM_UP_ROI_CENTER_Y_RATIO,
            JobListener::None,
            context,
        )
    }

    /// OCR on a raw camera frame
    pub fn ocr_frame(
        frame: RawFrame,
        listener: Arc<dyn ScanListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
    ) -> Result<Self, JobError> {
        check_ratio(roi_center_y_ratio)?;
        Ok(Self::build(
            JobKind::OcrFromBytes,
            JobSource::Frame(frame),
            roi_center_y_ratio,
            JobListener::Scan(listener),
            context,
        ))
    }

    /// OCR on a decoded image, skipping decode and ROI extraction
    pub fn ocr_image(
        image: RgbImage,
        listener: Arc<dyn ScanListener>,
        context: ExecutionContext,
    ) -> Result<Self, JobError> {
        check_image(&image)?;
        Ok(Self::build(
            JobKind::OcrFromImage,
            JobSource::Image(image),
            0.0,
            JobListener::Scan(listener),
            context,
        ))
    }

    /// Object detection on a raw camera frame
    ///
    /// Without a model file the detector is skipped and the listener gets
    /// an empty box list.
    pub fn object_frame(
        frame: RawFrame,
        listener: Arc<dyn ObjectListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
        model_file: Option<ModelFile>,
    ) -> Result<Self, JobError> {
        check_ratio(roi_center_y_ratio)?;
        let mut job = Self::build(
            JobKind::ObjectFromBytes,
            JobSource::Frame(frame),
            roi_center_y_ratio,
            JobListener::Object(listener),
            context,
        );
        job.model_file = model_file;
        Ok(job)
    }

    /// Object detection on a decoded image
    pub fn object_image(
        image: RgbImage,
        listener: Arc<dyn ObjectListener>,
        context: ExecutionContext,
        model_file: Option<ModelFile>,
    ) -> Result<Self, JobError> {
        check_image(&image)?;
        let mut job = Self::build(
            JobKind::ObjectFromImage,
            JobSource::Image(image),
            0.0,
            JobListener::Object(listener),
            context,
        );
        job.model_file = model_file;
        Ok(job)
    }

    /// Combined job: `run_ux_model` selects the object detector,
    /// `run_additional_ocr` the OCR model
    pub fn ux_model_frame(
        frame: RawFrame,
        listener: Arc<dyn UxModelListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
        model_file: Option<ModelFile>,
        run_additional_ocr: bool,
        run_ux_model: bool,
    ) -> Result<Self, JobError> {
        check_ratio(roi_center_y_ratio)?;
        if !run_additional_ocr && !run_ux_model {
            return Err(JobError::NothingToRun);
        }
        let mut job = Self::build(
            JobKind::UxModel,
            JobSource::Frame(frame),
            roi_center_y_ratio,
            JobListener::UxModel(listener),
            context,
        );
        job.model_file = model_file;
        job.run_additional_ocr = run_additional_ocr;
        job.run_ux_model = run_ux_model;
        Ok(job)
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn source(&self) -> &JobSource {
        &self.source
    }

    pub fn roi_center_y_ratio(&self) -> f32 {
        self.roi_center_y_ratio
    }

    pub fn listener(&self) -> &JobListener {
        &self.listener
    }

    pub fn model_file(&self) -> Option<&ModelFile> {
        self.model_file.as_ref()
    }

    pub fn run_additional_ocr(&self) -> bool {
        self.run_additional_ocr
    }

    pub fn run_ux_model(&self) -> bool {
        self.run_ux_model
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Sensor orientation of the payload (warm-up uses the fixed sentinel value)
    pub fn sensor_orientation(&self) -> i32 {
        match &self.source {
            JobSource::Frame(frame) => frame.sensor_orientation(),
            JobSource::Image(_) => 0,
            JobSource::Empty => WARM_UP_SENSOR_ORIENTATION as i32,
        }
    }
}

fn check_ratio(ratio: f32) -> Result<(), JobError> {
    if ratio.is_finite() && (0.0..=1.0).contains(&ratio) {
        Ok(())
    } else {
        Err(JobError::InvalidRoiRatio(ratio))
    }
}

fn check_image(image: &RgbImage) -> Result<(), JobError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(JobError::EmptyImage { width, height });
    }
    Ok(())
}
