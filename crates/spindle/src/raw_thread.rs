// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// The operating system's identifier of a thread: a `pthread_t` on unix, a thread `HANDLE`
/// on Windows.
///
/// Exposed for diagnostics only. The identifier stays owned by its [`ThreadHandle`][1] and is
/// meaningless once that handle has been released.
///
/// [1]: crate::ThreadHandle
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct RawThread(usize);

impl RawThread {
    pub(crate) const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The native identifier, widened or cast to `usize`.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Debug for RawThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawThread({:#x})", self.0)
    }
}
