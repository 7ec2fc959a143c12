// SPDX-License-Identifier: GPL-3.0-only

//! The single-consumer ML worker
//!
//! Producers post jobs from any thread; one named worker thread takes the
//! most recent job, runs it through [`JobProcessor`] and goes back for the
//! next. A failing or panicking job is logged and skipped, the loop keeps
//! going until [`MlWorker::shutdown`].
//!
//! # Modules
//!
//! - [`frame_loop`]: Thread lifecycle ([`LoopController`])
//! - [`pipeline`]: Per-job materialisation, routing and delivery

pub mod frame_loop;
pub mod pipeline;

pub use frame_loop::{LoopAction, LoopController};
pub use pipeline::{JobProcessor, JobReport, WorkerComponents};

use crate::config::WorkerConfig;
use crate::dispatch::{
    CallbackExecutor, ObjectListener, ResultDispatcher, ScanListener, UxModelListener,
};
use crate::errors::{WorkerError, WorkerResult, panic_message};
use crate::job::{ExecutionContext, Job, ModelFile, RawFrame};
use crate::queue::JobQueue;
use image::RgbImage;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Counters kept by the worker loop
#[derive(Debug, Default)]
pub struct WorkerStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl WorkerStats {
    /// Jobs that ran to delivery (including fatal results)
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Jobs that errored or panicked before delivery
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Handle to a running worker
///
/// Dropping it shuts the worker down. Jobs still queued at that point are
/// discarded without delivery.
pub struct MlWorker {
    queue: Arc<JobQueue>,
    stats: Arc<WorkerStats>,
    controller: Mutex<Option<LoopController>>,
    backlog_warn_threshold: usize,
}

impl MlWorker {
    /// Validate the config and start the worker thread
    pub fn spawn(
        config: WorkerConfig,
        components: WorkerComponents,
        executor: Arc<dyn CallbackExecutor>,
    ) -> WorkerResult<Self> {
        config.validate()?;

        let queue = Arc::new(JobQueue::new());
        let stats = Arc::new(WorkerStats::default());
        let mut processor =
            JobProcessor::new(&config, components, ResultDispatcher::new(executor));

        let loop_queue = Arc::clone(&queue);
        let loop_stats = Arc::clone(&stats);
        let controller = LoopController::start(&config.worker_thread_name, move || {
            let Some(job) = loop_queue.dequeue_blocking() else {
                return LoopAction::Stop;
            };
            run_one(&mut processor, job, &loop_stats);
            LoopAction::Continue
        })
        .map_err(|e| WorkerError::Other(format!("Failed to spawn worker thread: {}", e)))?;

        info!(
            thread = %config.worker_thread_name,
            min_image_edge = config.min_image_edge,
            "ML worker started"
        );

        Ok(Self {
            queue,
            stats,
            controller: Mutex::new(Some(controller)),
            backlog_warn_threshold: config.backlog_warn_threshold,
        })
    }

    /// Queue a job; the newest job is processed first
    ///
    /// Returns `false` if the worker has shut down.
    pub fn post(&self, job: Job) -> bool {
        let id = job.id();
        let kind = job.kind();
        let Some(pending) = self.queue.enqueue(job) else {
            debug!(job_id = %id, ?kind, "Worker is shut down, dropping job");
            return false;
        };

        if crosses_threshold(pending, self.backlog_warn_threshold) {
            warn!(
                pending,
                threshold = self.backlog_warn_threshold,
                "Job backlog is growing faster than the worker drains it"
            );
        }
        true
    }

    pub fn post_ocr_frame(
        &self,
        frame: RawFrame,
        listener: Arc<dyn ScanListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
    ) -> WorkerResult<bool> {
        let job = Job::ocr_frame(frame, listener, context, roi_center_y_ratio)?;
        Ok(self.post(job))
    }

    pub fn post_ocr_image(
        &self,
        image: RgbImage,
        listener: Arc<dyn ScanListener>,
        context: ExecutionContext,
    ) -> WorkerResult<bool> {
        let job = Job::ocr_image(image, listener, context)?;
        Ok(self.post(job))
    }

    pub fn post_object_frame(
        &self,
        frame: RawFrame,
        listener: Arc<dyn ObjectListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
        model_file: Option<ModelFile>,
    ) -> WorkerResult<bool> {
        let job = Job::object_frame(frame, listener, context, roi_center_y_ratio, model_file)?;
        Ok(self.post(job))
    }

    pub fn post_object_image(
        &self,
        image: RgbImage,
        listener: Arc<dyn ObjectListener>,
        context: ExecutionContext,
        model_file: Option<ModelFile>,
    ) -> WorkerResult<bool> {
        let job = Job::object_image(image, listener, context, model_file)?;
        Ok(self.post(job))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn post_ux_frame(
        &self,
        frame: RawFrame,
        listener: Arc<dyn UxModelListener>,
        context: ExecutionContext,
        roi_center_y_ratio: f32,
        model_file: Option<ModelFile>,
        run_additional_ocr: bool,
        run_ux_model: bool,
    ) -> WorkerResult<bool> {
        let job = Job::ux_model_frame(
            frame,
            listener,
            context,
            roi_center_y_ratio,
            model_file,
            run_additional_ocr,
            run_ux_model,
        )?;
        Ok(self.post(job))
    }

    /// Queue a warm-up sentinel, only if nothing else is waiting
    pub fn warm_up(&self, context: ExecutionContext) -> bool {
        self.queue.warm_up(context)
    }

    /// Jobs waiting to be picked up
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    pub fn is_running(&self) -> bool {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(LoopController::is_running)
    }

    /// Stop taking jobs, let the current one finish, and join the thread
    pub fn shutdown(&self) {
        let dropped = self.queue.close();
        if !dropped.is_empty() {
            info!(dropped = dropped.len(), "Discarding queued jobs at shutdown");
        }

        let controller = self
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut controller) = controller {
            controller.stop();
            info!(
                completed = self.stats.completed(),
                failed = self.stats.failed(),
                "ML worker stopped"
            );
        }
    }
}

impl Drop for MlWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One loop iteration: nothing escapes, not even a panic
fn run_one(processor: &mut JobProcessor, job: Job, stats: &WorkerStats) {
    let id = job.id();
    let kind = job.kind();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| processor.process(job)))
        .unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload.as_ref()))));

    match outcome {
        Ok(report) => {
            stats.completed.fetch_add(1, Ordering::Relaxed);
            debug!(
                job_id = %report.job_id,
                kind = ?report.kind,
                fatal = report.fatal,
                delivered = report.delivered,
                elapsed_ms = report.elapsed.as_millis(),
                "Job complete"
            );
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            error!(job_id = %id, ?kind, error = %e, "Job failed, continuing with next");
        }
    }
}

/// True for the push that takes the backlog from below `threshold` to it
///
/// `pending` must come from the same lock as the push, so exactly one
/// producer sees each length on the way up. A zero threshold disables
/// the warning.
fn crosses_threshold(pending: usize, threshold: usize) -> bool {
    threshold > 0 && pending >= threshold && pending - 1 < threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backlog_warning_fires_once_on_the_way_up() {
        let hits: Vec<usize> = (1..=100).filter(|&n| crosses_threshold(n, 32)).collect();
        assert_eq!(hits, vec![32]);
    }

    #[test]
    fn test_zero_threshold_never_warns() {
        assert!((0..=100).all(|n| !crosses_threshold(n, 0)));
    }
}
