// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::c_void;
use std::fmt::{self, Debug};
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{Level, event};

/// A worker with a C calling convention, as accepted by [`ThreadHandle::create_raw`][1].
///
/// It receives the opaque data pointer given at creation and returns an opaque result pointer.
/// A null result signals failure, anything else signals success.
///
/// [1]: crate::ThreadHandle::create_raw
pub type RawWorker = unsafe extern "C" fn(*mut c_void) -> *mut c_void;

/// How a worker finished, as seen by the thread that joins it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkerExit {
    Success,
    Failure,
}

impl WorkerExit {
    pub(crate) fn from_result_ptr(result: *mut c_void) -> Self {
        if result.is_null() { Self::Failure } else { Self::Success }
    }
}

/// The work a new thread executes, boxed so it can cross the native thread entry point.
///
/// Whoever holds the value owns the worker and its data. The spawned thread takes ownership on
/// entry, the spawning thread keeps it if the spawn fails.
pub struct ThreadStart {
    work: Box<dyn FnOnce() -> WorkerExit + Send>,
}

impl ThreadStart {
    pub(crate) fn new<F>(work: F) -> Self
    where
        F: FnOnce() -> WorkerExit + Send + 'static,
    {
        Self { work: Box::new(work) }
    }

    /// Runs the worker on the current thread.
    ///
    /// A panicking worker counts as a failed one, unwinding into the native entry point would
    /// abort the process.
    pub(crate) fn run(self) -> WorkerExit {
        catch_unwind(AssertUnwindSafe(self.work)).unwrap_or_else(|_| {
            event!(Level::DEBUG, "worker panicked");
            WorkerExit::Failure
        })
    }

    /// Hands the entry over as the single opaque argument of a native thread entry point.
    pub(crate) fn into_raw(self) -> *mut c_void {
        Box::into_raw(Box::new(self)).cast()
    }

    /// Takes back ownership of an entry handed over by `into_raw()`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw()` and ownership must be taken back exactly once.
    pub(crate) unsafe fn from_raw(ptr: *mut c_void) -> Self {
        // SAFETY: Forwarding safety requirements.
        *unsafe { Box::from_raw(ptr.cast::<Self>()) }
    }
}

impl Debug for ThreadStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadStart").finish_non_exhaustive()
    }
}

/// A raw data pointer that is allowed to move to the spawned thread.
///
/// Only constructed by `unsafe` entry points whose callers vouch for the pointee.
#[derive(Debug)]
pub(crate) struct SendPtr(*mut c_void);

// SAFETY: Whoever constructs this guarantees that the pointee may be used from another thread.
unsafe impl Send for SendPtr {}

impl SendPtr {
    /// # Safety
    ///
    /// The pointee must be safe to access from the thread the pointer is sent to.
    pub(crate) const unsafe fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    // Closures must call this rather than read the field, so that they capture the whole
    // wrapper and not just the non-Send pointer inside it.
    pub(crate) const fn into_inner(self) -> *mut c_void {
        self.0
    }
}
