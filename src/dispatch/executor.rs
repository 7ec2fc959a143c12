// SPDX-License-Identifier: GPL-3.0-only

//! Execution contexts that run listener callbacks
//!
//! The worker never calls a listener directly. It hands a closure to a
//! [`CallbackExecutor`], which decides where the closure runs.

use crate::errors::{DispatchError, panic_message};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Work submitted to a callback context
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere to run callbacks
pub trait CallbackExecutor: Send + Sync {
    /// Submit a callback; it may run before or after this returns
    fn execute(&self, callback: Callback) -> Result<(), DispatchError>;
}

/// Runs callbacks immediately on the submitting thread
///
/// Useful in tests and in hosts without a dedicated callback thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl CallbackExecutor for InlineExecutor {
    fn execute(&self, callback: Callback) -> Result<(), DispatchError> {
        callback();
        Ok(())
    }
}

/// Dedicated message-loop thread
///
/// Callbacks run one at a time, in submission order, on a thread of their
/// own. Dropping the executor drains what is already queued and joins the
/// thread.
pub struct CallbackThread {
    sender: Mutex<Option<Sender<Callback>>>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    name: String,
}

impl CallbackThread {
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Callback>();
        let name_clone = name.to_string();

        let thread_handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                debug!(name = %name_clone, "Callback thread started");
                for callback in receiver {
                    // The dispatcher already isolates listener panics; this
                    // guards callbacks submitted by anything else.
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
                        warn!(
                            name = %name_clone,
                            error = %panic_message(payload.as_ref()),
                            "Callback panicked"
                        );
                    }
                }
                debug!(name = %name_clone, "Callback thread exiting");
            })?;

        info!(name = %name, "Started callback thread");

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            thread_handle: Mutex::new(Some(thread_handle)),
            name: name.to_string(),
        })
    }

    /// Stop accepting callbacks, run the ones already queued, and join
    pub fn shutdown(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .thread_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                // shutdown from inside a callback; the loop ends on its own
                return;
            }
            if handle.join().is_err() {
                warn!(name = %self.name, "Callback thread panicked");
            }
        }
    }
}

impl CallbackExecutor for CallbackThread {
    fn execute(&self, callback: Callback) -> Result<(), DispatchError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender
                .send(callback)
                .map_err(|_| DispatchError::ExecutorClosed),
            None => Err(DispatchError::ExecutorClosed),
        }
    }
}

impl Drop for CallbackThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Submits callbacks to a tokio runtime's blocking pool
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: tokio::runtime::Handle,
}

impl TokioExecutor {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }
}

impl CallbackExecutor for TokioExecutor {
    fn execute(&self, callback: Callback) -> Result<(), DispatchError> {
        drop(self.handle.spawn_blocking(callback));
        Ok(())
    }
}
