// SPDX-License-Identifier: GPL-3.0-only

//! One job, start to finish
//!
//! [`JobProcessor`] materialises the job's image, routes it to the right
//! predictor and hands the result to the dispatcher. It runs on the worker
//! thread only and owns the predictors for the life of the worker.

use crate::config::WorkerConfig;
use crate::dispatch::{DeliveryImages, ResultDispatcher};
use crate::errors::{PredictorError, WorkerResult};
use crate::job::{ExecutionContext, Job, JobId, JobKind, JobSource, ModelFile};
use crate::media::transform::{crop_for_ocr, placeholder};
use crate::media::{FrameDecoder, FramePreprocessor, YuvDecoder};
use crate::predictors::{
    DetectionResult, ObjectOutput, ObjectPredictorFactory, OcrOutput, OcrPredictor,
};
use image::RgbImage;
use std::time::{Duration, Instant};
use tracing::debug;

/// Pluggable pieces the worker runs with
pub struct WorkerComponents {
    pub ocr: Box<dyn OcrPredictor>,
    pub objects: Box<dyn ObjectPredictorFactory>,
    pub decoder: Box<dyn FrameDecoder>,
}

impl WorkerComponents {
    /// Use the software YUV decoder
    pub fn new(ocr: Box<dyn OcrPredictor>, objects: Box<dyn ObjectPredictorFactory>) -> Self {
        Self {
            ocr,
            objects,
            decoder: Box::new(YuvDecoder::new()),
        }
    }

    pub fn with_decoder(mut self, decoder: Box<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }
}

/// Summary of one processed job
#[derive(Debug, Clone)]
pub struct JobReport {
    pub job_id: JobId,
    pub kind: JobKind,
    /// A predictor reported an unrecoverable fault
    pub fatal: bool,
    /// A callback was posted to a listener
    pub delivered: bool,
    pub elapsed: Duration,
}

/// Runs jobs on the worker thread
pub struct JobProcessor {
    preprocessor: FramePreprocessor,
    ocr: Box<dyn OcrPredictor>,
    objects: Box<dyn ObjectPredictorFactory>,
    dispatcher: ResultDispatcher,
    warm_up_image_size: u32,
    print_timing: bool,
}

impl JobProcessor {
    pub fn new(
        config: &WorkerConfig,
        components: WorkerComponents,
        dispatcher: ResultDispatcher,
    ) -> Self {
        let WorkerComponents {
            ocr,
            objects,
            decoder,
        } = components;
        Self {
            preprocessor: FramePreprocessor::new(
                decoder,
                config.min_image_edge,
                config.print_timing,
            ),
            ocr,
            objects,
            dispatcher,
            warm_up_image_size: config.warm_up_image_size,
            print_timing: config.print_timing,
        }
    }

    /// Materialise, predict and deliver one job
    ///
    /// An `Err` means nothing was delivered for this job.
    pub fn process(&mut self, job: Job) -> WorkerResult<JobReport> {
        let start = Instant::now();
        let Job {
            id,
            kind,
            source,
            roi_center_y_ratio,
            listener,
            model_file,
            run_additional_ocr,
            run_ux_model,
            context,
        } = job;

        let (square, full_screen) = match source {
            JobSource::Frame(frame) => {
                let pair = self.preprocessor.prepare(&frame, roi_center_y_ratio)?;
                (pair.cropped, pair.full_screen)
            }
            JobSource::Image(image) => (image, None),
            JobSource::Empty => (placeholder(self.warm_up_image_size), None),
        };

        let mut images = DeliveryImages {
            square,
            ocr_band: None,
            full_screen,
        };

        let result = match kind {
            JobKind::WarmUp | JobKind::OcrFromBytes | JobKind::OcrFromImage => {
                let band = crop_for_ocr(&images.square)?;
                let output = self.run_ocr(id, &band, &context)?;
                images.ocr_band = Some(band);
                DetectionResult::from(output)
            }
            JobKind::ObjectFromBytes | JobKind::ObjectFromImage => {
                let output =
                    self.run_objects(id, model_file.as_ref(), &images.square, &context)?;
                DetectionResult::from(output)
            }
            JobKind::UxModel => {
                let objects = if run_ux_model {
                    self.run_objects(id, model_file.as_ref(), &images.square, &context)?
                } else {
                    ObjectOutput::default()
                };
                let ocr = if run_additional_ocr {
                    let band = crop_for_ocr(&images.square)?;
                    let output = self.run_ocr(id, &band, &context)?;
                    images.ocr_band = Some(band);
                    output
                } else {
                    OcrOutput::nothing()
                };

                if objects.fatal || ocr.fatal {
                    DetectionResult::Fatal
                } else {
                    DetectionResult::Combined {
                        text: ocr.text,
                        digit_boxes: ocr.digit_boxes,
                        objects: objects.boxes,
                    }
                }
            }
        };

        let fatal = result.is_fatal();
        let delivered = self.dispatcher.deliver(id, listener, result, images)?;

        Ok(JobReport {
            job_id: id,
            kind,
            fatal,
            delivered,
            elapsed: start.elapsed(),
        })
    }

    fn run_ocr(
        &mut self,
        id: JobId,
        band: &RgbImage,
        context: &ExecutionContext,
    ) -> Result<OcrOutput, PredictorError> {
        let start = Instant::now();
        let output = self.ocr.predict(band, context)?;
        if self.print_timing {
            debug!(
                job_id = %id,
                predict_ms = start.elapsed().as_millis(),
                fatal = output.fatal,
                "OCR prediction"
            );
        }
        Ok(output)
    }

    fn run_objects(
        &mut self,
        id: JobId,
        model_file: Option<&ModelFile>,
        image: &RgbImage,
        context: &ExecutionContext,
    ) -> Result<ObjectOutput, PredictorError> {
        let Some(model_file) = model_file else {
            debug!(job_id = %id, "No object model file, skipping detector");
            return Ok(ObjectOutput::default());
        };

        let start = Instant::now();
        let mut predictor = self.objects.create(model_file)?;
        let output = predictor.predict_on_cpu(image, context)?;
        if self.print_timing {
            debug!(
                job_id = %id,
                model = %model_file,
                boxes = output.boxes.len(),
                predict_ms = start.elapsed().as_millis(),
                fatal = output.fatal,
                "Object prediction"
            );
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{InlineExecutor, ScanListener, ScanResult};
    use crate::errors::WorkerError;
    use crate::job::RawFrame;
    use crate::media::PixelFormat;
    use crate::predictors::NoObjectModel;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Seen {
        sizes: Mutex<Vec<(u32, u32)>>,
    }

    impl ScanListener for Seen {
        fn on_prediction(&self, result: &ScanResult) {
            self.sizes.lock().unwrap().push(result.ocr_image.dimensions());
        }

        fn on_fatal_error(&self) {}
    }

    fn processor(ocr: Box<dyn OcrPredictor>) -> JobProcessor {
        JobProcessor::new(
            &WorkerConfig::default(),
            WorkerComponents::new(ocr, Box::new(NoObjectModel)),
            ResultDispatcher::new(Arc::new(InlineExecutor)),
        )
    }

    fn echo_size() -> Box<dyn OcrPredictor> {
        Box::new(
            |image: &RgbImage, _: &ExecutionContext| -> Result<OcrOutput, PredictorError> {
                Ok(OcrOutput::text(format!("{}x{}", image.width(), image.height())))
            },
        )
    }

    #[test]
    fn test_warm_up_runs_ocr_on_placeholder_band() {
        let mut processor = processor(echo_size());
        let report = processor
            .process(Job::warm_up(ExecutionContext::empty()))
            .unwrap();
        assert_eq!(report.kind, JobKind::WarmUp);
        assert!(!report.delivered);
        assert!(!report.fatal);
    }

    #[test]
    fn test_ocr_frame_gets_square_band() {
        let seen = Arc::new(Seen::default());
        let mut processor = processor(echo_size());
        let frame = RawFrame::new(
            vec![128u8; PixelFormat::Nv21.expected_len(1280, 720)],
            1280,
            720,
            PixelFormat::Nv21,
            90,
        )
        .unwrap();
        let job = Job::ocr_frame(frame, seen.clone(), ExecutionContext::empty(), 0.5).unwrap();

        let report = processor.process(job).unwrap();
        assert!(report.delivered);
        // 600x600 square, 600:375 band
        assert_eq!(*seen.sizes.lock().unwrap(), vec![(600, 375)]);
    }

    #[test]
    fn test_predictor_error_is_reported() {
        let failing: Box<dyn OcrPredictor> = Box::new(
            |_: &RgbImage, _: &ExecutionContext| -> Result<OcrOutput, PredictorError> {
                Err(PredictorError::Inference("tensor shape".into()))
            },
        );
        let mut processor = processor(failing);
        let seen = Arc::new(Seen::default());
        let job = Job::ocr_image(RgbImage::new(600, 600), seen.clone(), ExecutionContext::empty())
            .unwrap();

        let err = processor.process(job).unwrap_err();
        assert!(matches!(err, WorkerError::Predictor(_)));
        assert!(seen.sizes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_wide_image_too_short_for_band_fails() {
        let mut processor = processor(echo_size());
        let job = Job::ocr_image(
            RgbImage::new(600, 100),
            Arc::new(Seen::default()),
            ExecutionContext::empty(),
        )
        .unwrap();
        assert!(matches!(processor.process(job), Err(WorkerError::Decode(_))));
    }
}
