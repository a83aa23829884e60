// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! C-compatible entry points for code that manages threads through raw pointers.
//!
//! A thread handle crosses the boundary as an opaque `*mut ThreadHandle`; null stands for a thread
//! that could not be created. Handles are joined in place with [`spindle_join`] and are freed only
//! by [`spindle_release`], in batches allocated by [`spindle_alloc_handles`].

use std::ffi::{c_int, c_void};
use std::ptr;

use crate::{RawWorker, ThreadHandle, release};

/// Spawns a new thread that runs `worker(data)`.
///
/// Returns null if `worker` is null or if the operating system could not create the thread, in
/// which case `worker` is never called.
///
/// # Safety
///
/// It must be sound to call `worker(data)` on another thread at any time until the thread is
/// joined. The pointee of `data` remains the caller's responsibility.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spindle_create(worker: Option<RawWorker>, data: *mut c_void) -> *mut ThreadHandle {
    let Some(worker) = worker else {
        return ptr::null_mut();
    };

    // SAFETY: Forwarding safety requirements.
    match unsafe { ThreadHandle::create_raw(worker, data) } {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(_) => ptr::null_mut(),
    }
}

/// Blocks until the thread terminates.
///
/// Returns 0 if the worker returned a non-null result and non-zero if it returned null, if
/// waiting failed, if the thread was already joined or if `handle` is null.
///
/// # Safety
///
/// `handle` must be null or come from [`spindle_create`] and not be released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spindle_join(handle: *mut ThreadHandle) -> c_int {
    // SAFETY: Forwarding safety requirements.
    let Some(handle) = (unsafe { handle.as_mut() }) else {
        return -1;
    };

    match handle.wait() {
        Ok(()) => 0,
        Err(e) => e.exit_code(),
    }
}

/// Allocates an array of `count` null handle slots, to be filled by the caller and eventually
/// freed by [`spindle_release`] with the same `count`.
///
/// Returns null if the array could not be allocated.
#[unsafe(no_mangle)]
pub extern "C" fn spindle_alloc_handles(count: usize) -> *mut *mut ThreadHandle {
    let mut slots: Vec<*mut ThreadHandle> = Vec::new();

    if slots.try_reserve_exact(count).is_err() {
        return ptr::null_mut();
    }

    slots.resize(count, ptr::null_mut());
    Box::into_raw(slots.into_boxed_slice()).cast()
}

/// Releases every non-null handle in the array, then frees the array itself.
///
/// Does nothing if `handles` is null.
///
/// # Safety
///
/// `handles` must be null or come from [`spindle_alloc_handles`] called with the same `count`.
/// Every non-null slot must hold a handle from [`spindle_create`] that appears in no other slot.
/// None of the handles may be used afterwards.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn spindle_release(handles: *mut *mut ThreadHandle, count: usize) {
    if handles.is_null() {
        return;
    }

    // SAFETY: Forwarding safety requirements, the array was allocated as a boxed slice of `count`.
    let slots = unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(handles, count)) };

    release(slots.iter().map(|&slot| {
        // SAFETY: Forwarding safety requirements, each non-null slot is a boxed handle owned by the array.
        (!slot.is_null()).then(|| *unsafe { Box::from_raw(slot) })
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_null_array_is_noop() {
        // SAFETY: Null is always accepted.
        unsafe { spindle_release(ptr::null_mut(), 0) };
    }

    #[test]
    fn join_null_handle_fails() {
        // SAFETY: Null is always accepted.
        assert_ne!(unsafe { spindle_join(ptr::null_mut()) }, 0);
    }

    #[test]
    fn allocated_slots_start_empty() {
        let handles = spindle_alloc_handles(3);

        for i in 0..3 {
            // SAFETY: The array holds 3 initialized slots.
            assert!(unsafe { handles.add(i).read() }.is_null());
        }

        // SAFETY: The array came from spindle_alloc_handles(3).
        unsafe { spindle_release(handles, 3) };
    }

    #[test]
    fn oversized_array_is_null() {
        assert!(spindle_alloc_handles(usize::MAX / 4).is_null());
        assert!(spindle_alloc_handles(usize::MAX).is_null());
    }

    #[test]
    fn null_worker_creates_no_thread() {
        // SAFETY: A null worker is always accepted.
        assert!(unsafe { spindle_create(None, ptr::null_mut()) }.is_null());
    }

    #[test]
    fn zero_length_array() {
        let handles = spindle_alloc_handles(0);

        // SAFETY: The array came from spindle_alloc_handles(0).
        unsafe { spindle_release(handles, 0) };
    }
}
