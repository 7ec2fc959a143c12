// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle for the worker loop
//!
//! Owns the consumer thread: starts it with a name, signals it to stop and
//! joins it. The loop body decides when it is done by returning
//! [`LoopAction::Stop`]; a blocked body has to be woken by whoever calls
//! [`LoopController::stop`] (the worker closes its queue first).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Returned by the loop body after each iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Run another iteration
    Continue,
    /// Leave the loop
    Stop,
}

/// Controller for a loop running on its own named thread
pub struct LoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl LoopController {
    /// Spawn `loop_fn` on a thread called `name`
    ///
    /// `loop_fn` is called repeatedly until it returns `LoopAction::Stop` or
    /// `stop()` is called.
    pub fn start<F>(name: &str, mut loop_fn: F) -> std::io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting worker loop");

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Worker loop thread started");

                loop {
                    if stop_signal_clone.load(Ordering::SeqCst) {
                        debug!(name = %name_clone, "Stop signal received");
                        break;
                    }

                    match loop_fn() {
                        LoopAction::Continue => {}
                        LoopAction::Stop => {
                            debug!(name = %name_clone, "Loop requested stop");
                            break;
                        }
                    }
                }

                info!(name = %name_clone, "Worker loop thread exiting");
            })?;

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        })
    }

    /// Signal the loop to stop and wait for the thread
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            if handle.thread().id() == thread::current().id() {
                debug!(name = %self.name, "Stop requested from the loop thread itself");
                return;
            }
            debug!(name = %self.name, "Waiting for worker loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, error = ?e, "Worker loop thread panicked");
            } else {
                debug!(name = %self.name, "Worker loop thread joined");
            }
        }
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LoopController {
    fn drop(&mut self) {
        self.stop();
    }
}
