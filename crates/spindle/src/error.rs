// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;

use thiserror::Error;

/// Any error that may arise while creating or joining a thread.
///
/// Spawn and wait failures carry the operating system error that caused them, expressed as a
/// standard I/O error so that platform-neutral code can inspect it via [`io::ErrorKind`].
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The operating system could not create a new thread, e.g. due to resource exhaustion or a
    /// process-wide thread limit. The worker was never invoked.
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),

    /// The worker ran to completion (or panicked) and signaled failure.
    #[error("worker signaled failure")]
    Worker,

    /// The operating system failed to wait for the thread to terminate.
    #[error("failed to wait for thread: {0}")]
    Wait(#[source] io::Error),

    /// The thread behind this handle has already been joined.
    ///
    /// Only reachable through the C ABI, as the Rust API consumes the handle when joining.
    #[error("thread already joined")]
    AlreadyJoined,
}

impl Error {
    /// The status code reported for this error by the C ABI. Never zero.
    ///
    /// Worker failure maps to 1. Spawn and wait failures map to the operating system error code
    /// when one is known, otherwise to -1.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Worker => 1,
            Self::Spawn(e) | Self::Wait(e) => e.raw_os_error().filter(|code| *code != 0).unwrap_or(-1),
            Self::AlreadyJoined => -1,
        }
    }
}

/// A specialized `Result` for thread lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
