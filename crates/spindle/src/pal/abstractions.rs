// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::io;

use crate::RawThread;
use crate::worker::{ThreadStart, WorkerExit};

/// The native threading API of the operating system.
///
/// All calls into the OS threading API go through this trait, enabling them to be mocked.
#[cfg_attr(test, mockall::automock)]
pub trait Platform: Debug + Send + Sync + 'static {
    /// Starts a new thread that runs `start`.
    ///
    /// On failure, `start` is dropped on the calling thread without ever running.
    fn spawn(&self, start: ThreadStart, stack_size: Option<usize>) -> io::Result<RawThread>;

    /// Blocks until the thread terminates and reports how its worker finished.
    fn join(&self, thread: RawThread) -> io::Result<WorkerExit>;

    /// Gives up the identifier of a thread. `joined` is true if a `join()` call has already
    /// succeeded for it. The identifier must not be used afterwards.
    fn release(&self, thread: RawThread, joined: bool);
}
