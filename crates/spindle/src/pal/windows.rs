// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::c_void;
use std::{io, ptr};

use tracing::{Level, event};
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0};
use windows_sys::Win32::System::Threading::{
    CreateThread, GetExitCodeThread, INFINITE, STACK_SIZE_PARAM_IS_A_RESERVATION,
    WaitForSingleObject,
};

use crate::RawThread;
use crate::pal::Platform;
use crate::worker::{ThreadStart, WorkerExit};

const EXIT_CODE_SUCCESS: u32 = 0;
const EXIT_CODE_FAILURE: u32 = 1;

/// The platform that matches the crate's build target, backed by the Win32 threading API.
///
/// You would only use a different platform in unit tests that need to mock the platform.
/// Even then, whenever possible, unit tests should use the real platform for maximum realism.
#[derive(Debug)]
pub struct BuildTargetPlatform;

impl Platform for BuildTargetPlatform {
    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn spawn(&self, start: ThreadStart, stack_size: Option<usize>) -> io::Result<RawThread> {
        let (stack_size, flags) = stack_size.map_or((0, 0), |size| (size, STACK_SIZE_PARAM_IS_A_RESERVATION));

        let arg = start.into_raw();
        let mut thread_id = 0_u32;

        // SAFETY: The thread ID pointer is valid for the duration of the call. Ownership of `arg`
        // passes to the new thread if and only if the call succeeds.
        let handle = unsafe {
            CreateThread(
                ptr::null(),
                stack_size,
                Some(thread_main),
                arg.cast_const(),
                flags,
                &raw mut thread_id,
            )
        };

        if handle.is_null() {
            // Captured first, dropping the entry may overwrite the last error.
            let error = io::Error::last_os_error();

            // SAFETY: No thread was created, so the entry never left this thread and nobody else
            // will reclaim it.
            drop(unsafe { ThreadStart::from_raw(arg) });
            return Err(error);
        }

        Ok(RawThread::new(handle.expose_provenance()))
    }

    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn join(&self, thread: RawThread) -> io::Result<WorkerExit> {
        let handle = native(thread);

        // SAFETY: The handle belongs to a thread whose handle was not closed yet,
        // which the handle lifecycle guarantees.
        let wait_result = unsafe { WaitForSingleObject(handle, INFINITE) };

        if wait_result != WAIT_OBJECT_0 {
            return Err(io::Error::last_os_error());
        }

        let mut exit_code = EXIT_CODE_FAILURE;

        // SAFETY: As above; the exit code pointer outlives the call.
        if unsafe { GetExitCodeThread(handle, &raw mut exit_code) } == 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(if exit_code == EXIT_CODE_SUCCESS {
            WorkerExit::Success
        } else {
            WorkerExit::Failure
        })
    }

    #[cfg_attr(test, mutants::skip)] // Real PAL behavior is not meaningful to mutate, we try mutations manually via mock PAL.
    fn release(&self, thread: RawThread, _joined: bool) {
        // Closing the handle of a running thread does not stop it, so joined or not is irrelevant.
        // SAFETY: The handle was not closed yet and is not used again after this.
        if unsafe { CloseHandle(native(thread)) } == 0 {
            event!(
                Level::DEBUG,
                ?thread,
                error = %io::Error::last_os_error(),
                "failed to close thread handle"
            );
        }
    }
}

/// Entry point of every thread spawned by this platform.
unsafe extern "system" fn thread_main(arg: *mut c_void) -> u32 {
    // SAFETY: `arg` is the entry that `spawn()` handed over to this thread.
    let start = unsafe { ThreadStart::from_raw(arg) };

    match start.run() {
        WorkerExit::Success => EXIT_CODE_SUCCESS,
        WorkerExit::Failure => EXIT_CODE_FAILURE,
    }
}

fn native(thread: RawThread) -> HANDLE {
    ptr::with_exposed_provenance_mut(thread.as_usize())
}
