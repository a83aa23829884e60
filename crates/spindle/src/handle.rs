// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::c_void;

use tracing::{Level, event};

use crate::pal::{Platform, PlatformFacade};
use crate::worker::{ThreadStart, WorkerExit};
use crate::{Error, RawThread, RawWorker, Result, ThreadBuilder};

/// Owns one operating system thread from its creation until it is released.
///
/// Joining consumes the handle, so a thread cannot be joined twice. Dropping a handle releases
/// the operating system resources behind it. If the thread was never joined, it keeps running
/// detached and cleans up after itself when it terminates.
///
/// # Examples
///
/// ```
/// use spindle::{Error, ThreadHandle};
///
/// let ok = ThreadHandle::create(|n: u32| n.checked_mul(2), 21)?;
/// assert!(ok.join().is_ok());
///
/// let failed = ThreadHandle::create(|n: u32| n.checked_sub(1), 0)?;
/// assert!(matches!(failed.join(), Err(Error::Worker)));
/// # Ok::<(), spindle::Error>(())
/// ```
#[derive(Debug)]
pub struct ThreadHandle {
    thread: RawThread,
    platform: PlatformFacade,
    joined: bool,
}

impl ThreadHandle {
    /// Spawns a new thread that runs `worker(data)` with the operating system's default settings.
    ///
    /// See [`ThreadBuilder::create`] for details.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the operating system could not create the thread.
    pub fn create<D, R, F>(worker: F, data: D) -> Result<Self>
    where
        F: FnOnce(D) -> Option<R> + Send + 'static,
        D: Send + 'static,
    {
        ThreadBuilder::new().create(worker, data)
    }

    /// Spawns a new thread that runs the C-compatible `worker` with the opaque `data` pointer.
    ///
    /// See [`ThreadBuilder::create_raw`] for details.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the operating system could not create the thread.
    ///
    /// # Safety
    ///
    /// It must be sound to call `worker(data)` on another thread at any time until the thread
    /// is joined.
    pub unsafe fn create_raw(worker: RawWorker, data: *mut c_void) -> Result<Self> {
        // SAFETY: Forwarding safety requirements.
        unsafe { ThreadBuilder::new().create_raw(worker, data) }
    }

    /// Returns a builder for configuring the thread before creating it.
    #[must_use]
    pub fn builder() -> ThreadBuilder {
        ThreadBuilder::new()
    }

    pub(crate) fn spawn(platform: PlatformFacade, start: ThreadStart, stack_size: Option<usize>) -> Result<Self> {
        let thread = platform.spawn(start, stack_size).map_err(|e| {
            event!(Level::DEBUG, error = %e, "failed to spawn thread");
            Error::Spawn(e)
        })?;

        event!(Level::TRACE, ?thread, "spawned thread");

        Ok(Self {
            thread,
            platform,
            joined: false,
        })
    }

    /// Blocks until the thread terminates.
    ///
    /// Everything the thread did before terminating is visible to the caller once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] if the worker signaled failure or panicked, and [`Error::Wait`]
    /// if the operating system failed to wait for the thread.
    pub fn join(mut self) -> Result<()> {
        self.wait()
    }

    /// Joins without consuming the handle, for callers that release it separately.
    pub(crate) fn wait(&mut self) -> Result<()> {
        if self.joined {
            return Err(Error::AlreadyJoined);
        }

        let exit = self.platform.join(self.thread).map_err(|e| {
            event!(Level::DEBUG, thread = ?self.thread, error = %e, "failed to wait for thread");
            Error::Wait(e)
        })?;

        self.joined = true;
        event!(Level::TRACE, thread = ?self.thread, ?exit, "joined thread");

        match exit {
            WorkerExit::Success => Ok(()),
            WorkerExit::Failure => Err(Error::Worker),
        }
    }

    /// The operating system's identifier of the thread, for diagnostics.
    #[must_use]
    pub const fn os_id(&self) -> RawThread {
        self.thread
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        event!(Level::TRACE, thread = ?self.thread, joined = self.joined, "releasing thread");
        self.platform.release(self.thread, self.joined);
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use mockall::predicate::eq;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::pal::MockPlatform;

    const THREAD: RawThread = RawThread::new(0x1234);

    fn builder(platform: MockPlatform) -> ThreadBuilder {
        ThreadBuilder::new().with_platform(platform)
    }

    #[test]
    fn handle_is_send() {
        assert_impl_all!(ThreadHandle: Send);
    }

    #[test]
    fn spawn_failure_never_runs_worker() {
        let mut platform = MockPlatform::new();
        platform
            .expect_spawn()
            .times(1)
            .returning(|_, _| Err(io::Error::from(io::ErrorKind::WouldBlock)));
        platform.expect_release().never();

        let ran = Arc::new(AtomicBool::new(false));
        let data = Arc::new(());

        let result = builder(platform).create(
            {
                let ran = Arc::clone(&ran);
                move |data: Arc<()>| {
                    ran.store(true, Ordering::SeqCst);
                    Some(data)
                }
            },
            Arc::clone(&data),
        );

        match result {
            Err(Error::Spawn(e)) => assert_eq!(e.kind(), io::ErrorKind::WouldBlock),
            other => panic!("expected spawn failure, got {other:?}"),
        }

        assert!(!ran.load(Ordering::SeqCst));
        // The data went down with the entry on this thread.
        assert_eq!(Arc::strong_count(&data), 1);
    }

    #[test]
    fn stack_size_is_passed_to_platform() {
        let mut platform = MockPlatform::new();
        platform
            .expect_spawn()
            .withf(|_, stack_size| *stack_size == Some(64 * 1024))
            .times(1)
            .returning(|_, _| Ok(THREAD));
        platform.expect_release().times(1).return_const(());

        let handle = builder(platform).stack_size(64 * 1024).create(Some, ()).unwrap();

        assert_eq!(handle.os_id(), THREAD);
    }

    #[test]
    fn join_success_releases_joined_thread() {
        let mut platform = MockPlatform::new();
        platform.expect_spawn().returning(|_, _| Ok(THREAD));
        platform
            .expect_join()
            .with(eq(THREAD))
            .times(1)
            .returning(|_| Ok(WorkerExit::Success));
        platform
            .expect_release()
            .with(eq(THREAD), eq(true))
            .times(1)
            .return_const(());

        let handle = builder(platform).create(Some, 7_u8).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn join_reports_worker_failure() {
        let mut platform = MockPlatform::new();
        platform.expect_spawn().returning(|_, _| Ok(THREAD));
        platform.expect_join().returning(|_| Ok(WorkerExit::Failure));
        platform
            .expect_release()
            .with(eq(THREAD), eq(true))
            .times(1)
            .return_const(());

        let handle = builder(platform).create(Some, ()).unwrap();

        assert!(matches!(handle.join(), Err(Error::Worker)));
    }

    #[test]
    fn join_reports_wait_failure() {
        let mut platform = MockPlatform::new();
        platform.expect_spawn().returning(|_, _| Ok(THREAD));
        platform
            .expect_join()
            .returning(|_| Err(io::Error::from_raw_os_error(3)));
        platform
            .expect_release()
            .with(eq(THREAD), eq(false))
            .times(1)
            .return_const(());

        let handle = builder(platform).create(Some, ()).unwrap();

        match handle.join() {
            Err(Error::Wait(e)) => assert_eq!(e.raw_os_error(), Some(3)),
            other => panic!("expected wait failure, got {other:?}"),
        }
    }

    #[test]
    fn drop_without_join_releases_unjoined_thread() {
        let mut platform = MockPlatform::new();
        platform.expect_spawn().returning(|_, _| Ok(THREAD));
        platform.expect_join().never();
        platform
            .expect_release()
            .with(eq(THREAD), eq(false))
            .times(1)
            .return_const(());

        drop(builder(platform).create(Some, ()).unwrap());
    }

    #[test]
    fn second_wait_is_rejected() {
        let mut platform = MockPlatform::new();
        platform.expect_spawn().returning(|_, _| Ok(THREAD));
        platform
            .expect_join()
            .times(1)
            .returning(|_| Ok(WorkerExit::Success));
        platform.expect_release().times(1).return_const(());

        let mut handle = builder(platform).create(Some, ()).unwrap();

        handle.wait().unwrap();
        assert!(matches!(handle.wait(), Err(Error::AlreadyJoined)));
    }

    #[test]
    fn worker_result_decides_exit() {
        let mut platform = MockPlatform::new();
        // Runs the entry inline, standing in for the thread that would normally run it.
        platform
            .expect_spawn()
            .times(2)
            .returning(|start, _| match start.run() {
                WorkerExit::Success => Ok(RawThread::new(1)),
                WorkerExit::Failure => Ok(RawThread::new(0)),
            });
        platform.expect_release().times(2).return_const(());

        let builder = builder(platform);

        let succeeded = builder.clone().create(|n: i32| (n > 0).then_some(n), 5).unwrap();
        let failed = builder.create(|n: i32| (n > 0).then_some(n), -5).unwrap();

        assert_eq!(succeeded.os_id(), RawThread::new(1));
        assert_eq!(failed.os_id(), RawThread::new(0));
    }
}
