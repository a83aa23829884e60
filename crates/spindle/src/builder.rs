// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::c_void;

use crate::pal::PlatformFacade;
use crate::worker::{SendPtr, ThreadStart, WorkerExit};
use crate::{RawWorker, Result, ThreadHandle};

/// Collects the settings of a thread before creating it.
///
/// Use [`ThreadHandle::create`] when the operating system defaults are good enough.
///
/// # Examples
///
/// ```
/// use spindle::ThreadBuilder;
///
/// let handle = ThreadBuilder::new()
///     .stack_size(512 * 1024)
///     .create(|name: &str| Some(name.len()), "worker")?;
///
/// handle.join()?;
/// # Ok::<(), spindle::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct ThreadBuilder {
    stack_size: Option<usize>,
    platform: PlatformFacade,
}

impl ThreadBuilder {
    /// Creates a builder that uses the operating system defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack_size: None,
            platform: PlatformFacade::real(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_platform(mut self, platform: impl Into<PlatformFacade>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Sets the size of the new thread's stack, in bytes.
    ///
    /// The operating system may round this up, e.g. to a whole number of pages or to its
    /// minimum stack size.
    #[must_use]
    pub const fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Spawns a new thread that runs `worker(data)`.
    ///
    /// The worker signals success by returning `Some` and failure by returning `None`; the
    /// result itself is dropped on the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`][crate::Error::Spawn] if the operating system could not create
    /// the thread. In that case the worker never runs and `data` is dropped on the calling thread.
    pub fn create<D, R, F>(self, worker: F, data: D) -> Result<ThreadHandle>
    where
        F: FnOnce(D) -> Option<R> + Send + 'static,
        D: Send + 'static,
    {
        self.spawn(ThreadStart::new(move || {
            if worker(data).is_some() {
                WorkerExit::Success
            } else {
                WorkerExit::Failure
            }
        }))
    }

    /// Spawns a new thread that runs the C-compatible `worker` with the opaque `data` pointer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`][crate::Error::Spawn] if the operating system could not create
    /// the thread, in which case the worker never runs.
    ///
    /// # Safety
    ///
    /// It must be sound to call `worker(data)` on another thread at any time until the thread
    /// is joined. The pointee of `data` remains the caller's responsibility.
    pub unsafe fn create_raw(self, worker: RawWorker, data: *mut c_void) -> Result<ThreadHandle> {
        // SAFETY: Forwarding safety requirements.
        let data = unsafe { SendPtr::new(data) };

        self.spawn(ThreadStart::new(move || {
            let data = data.into_inner();

            // SAFETY: The caller of create_raw() guarantees this call is sound on this thread.
            WorkerExit::from_result_ptr(unsafe { worker(data) })
        }))
    }

    fn spawn(self, start: ThreadStart) -> Result<ThreadHandle> {
        ThreadHandle::spawn(self.platform, start, self.stack_size)
    }
}

impl Default for ThreadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
