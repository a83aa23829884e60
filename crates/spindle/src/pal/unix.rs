// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};
use std::{io, mem};

use tracing::{Level, event};

use crate::RawThread;
use crate::pal::Platform;
use crate::worker::{ThreadStart, WorkerExit};

/// The platform that matches the crate's build target, backed by POSIX threads.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn spawn(&self, start: ThreadStart, stack_size: Option<usize>) -> io::Result<RawThread> {
        let attributes = stack_size.map(Attributes::with_stack_size).transpose()?;
        let attributes_ptr = attributes.as_ref().map_or(ptr::null(), Attributes::as_ptr);

        let arg = start.into_raw();
        let mut id = mem::MaybeUninit::<libc::pthread_t>::uninit();

        // SAFETY: The identifier and attributes pointers are valid for the duration of the call.
        // Ownership of `arg` passes to the new thread if and only if the call succeeds.
        let result = unsafe { libc::pthread_create(id.as_mut_ptr(), attributes_ptr, thread_main, arg) };

        if result != 0 {
            // SAFETY: No thread was created, so the entry never left this thread and nobody else
            // will reclaim it.
            drop(unsafe { ThreadStart::from_raw(arg) });
            return Err(io::Error::from_raw_os_error(result));
        }

        // SAFETY: pthread_create() succeeded, so it has written the thread identifier.
        let id = unsafe { id.assume_init() };

        // pthread_t is an integer on some targets and a pointer on others.
        Ok(RawThread::new(id as usize))
    }

    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn join(&self, thread: RawThread) -> io::Result<WorkerExit> {
        let mut result: *mut c_void = ptr::null_mut();

        // SAFETY: The identifier belongs to a thread that was neither joined nor detached yet,
        // which the handle lifecycle guarantees. The result pointer outlives the call.
        cvt(unsafe { libc::pthread_join(native(thread), &raw mut result) })?;

        Ok(WorkerExit::from_result_ptr(result))
    }

    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn release(&self, thread: RawThread, joined: bool) {
        // A joined thread has already given back everything it owned. An unjoined one is
        // detached so that its resources are reclaimed when it terminates.
        if joined {
            return;
        }

        // SAFETY: The identifier belongs to a thread that was neither joined nor detached yet.
        if let Err(e) = cvt(unsafe { libc::pthread_detach(native(thread)) }) {
            event!(Level::DEBUG, ?thread, error = %e, "failed to detach thread");
        }
    }
}

/// Entry point of every thread spawned by this platform.
extern "C" fn thread_main(arg: *mut c_void) -> *mut c_void {
    // SAFETY: `arg` is the entry that `spawn()` handed over to this thread.
    let start = unsafe { ThreadStart::from_raw(arg) };

    match start.run() {
        // Any non-null value will do, nobody dereferences it.
        WorkerExit::Success => NonNull::<c_void>::dangling().as_ptr(),
        WorkerExit::Failure => ptr::null_mut(),
    }
}

fn native(thread: RawThread) -> libc::pthread_t {
    thread.as_usize() as libc::pthread_t
}

fn cvt(result: c_int) -> io::Result<()> {
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(result))
    }
}

/// Thread creation attributes, destroyed on drop.
///
/// Boxed because POSIX does not promise that an initialized `pthread_attr_t` may be moved.
struct Attributes(Box<libc::pthread_attr_t>);

impl Attributes {
    fn with_stack_size(stack_size: usize) -> io::Result<Self> {
        // SAFETY: pthread_attr_t is plain data for which all-zero bytes are a valid value.
        let mut attr: Box<libc::pthread_attr_t> = Box::new(unsafe { mem::zeroed() });

        // SAFETY: The pointer refers to writable memory that outlives the call.
        cvt(unsafe { libc::pthread_attr_init(&raw mut *attr) })?;

        // From here on, drop takes care of pthread_attr_destroy().
        let mut attributes = Self(attr);

        // SAFETY: The attributes were initialized above.
        cvt(unsafe { libc::pthread_attr_setstacksize(&raw mut *attributes.0, round_stack_size(stack_size)) })?;

        Ok(attributes)
    }

    fn as_ptr(&self) -> *const libc::pthread_attr_t {
        &raw const *self.0
    }
}

impl Drop for Attributes {
    fn drop(&mut self) {
        // SAFETY: The attributes were initialized in the constructor and are destroyed only here.
        _ = unsafe { libc::pthread_attr_destroy(&raw mut *self.0) };
    }
}

/// Some platforms reject stack sizes that are below the minimum or not a multiple of the page size.
fn round_stack_size(stack_size: usize) -> usize {
    let stack_size = stack_size.max(libc::PTHREAD_STACK_MIN);

    // SAFETY: No safety requirements.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    match usize::try_from(page_size) {
        Ok(page_size) if page_size > 0 => stack_size.div_ceil(page_size).saturating_mul(page_size),
        _ => stack_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_size_is_rounded_to_whole_pages() {
        // SAFETY: No safety requirements.
        let page_size = usize::try_from(unsafe { libc::sysconf(libc::_SC_PAGESIZE) }).unwrap();

        let rounded = round_stack_size(libc::PTHREAD_STACK_MIN + 1);

        assert!(rounded > libc::PTHREAD_STACK_MIN);
        assert_eq!(rounded % page_size, 0);
    }

    #[test]
    fn stack_size_below_minimum_is_raised() {
        assert!(round_stack_size(1) >= libc::PTHREAD_STACK_MIN);
    }

    #[test]
    fn spawn_and_join_real_thread() {
        let platform = BuildTargetPlatform;

        let thread = platform
            .spawn(ThreadStart::new(|| WorkerExit::Success), Some(256 * 1024))
            .unwrap();

        assert_eq!(platform.join(thread).unwrap(), WorkerExit::Success);
        platform.release(thread, true);
    }

    #[test]
    fn failing_worker_returns_null() {
        let platform = BuildTargetPlatform;

        let thread = platform.spawn(ThreadStart::new(|| WorkerExit::Failure), None).unwrap();

        assert_eq!(platform.join(thread).unwrap(), WorkerExit::Failure);
        platform.release(thread, true);
    }
}
