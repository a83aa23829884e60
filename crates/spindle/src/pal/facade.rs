// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
#[cfg(test)]
use std::sync::Arc;

use crate::RawThread;
#[cfg(test)]
use crate::pal::MockPlatform;
use crate::pal::{BUILD_TARGET_PLATFORM, BuildTargetPlatform, Platform};
use crate::worker::{ThreadStart, WorkerExit};

// Hides the difference between mock and real platform behind a common facade.
#[derive(Clone, Debug)]
pub enum PlatformFacade {
    Real(&'static BuildTargetPlatform),

    #[cfg(test)]
    Mock(Arc<MockPlatform>),
}

impl PlatformFacade {
    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    pub(crate) const fn real() -> Self {
        Self::Real(&BUILD_TARGET_PLATFORM)
    }

    #[cfg(test)]
    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    pub(crate) fn from_mock(mock: MockPlatform) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

#[cfg(test)]
impl From<MockPlatform> for PlatformFacade {
    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    fn from(mock: MockPlatform) -> Self {
        Self::from_mock(mock)
    }
}

impl Platform for PlatformFacade {
    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    fn spawn(&self, start: ThreadStart, stack_size: Option<usize>) -> io::Result<RawThread> {
        match self {
            Self::Real(real) => real.spawn(start, stack_size),
            #[cfg(test)]
            Self::Mock(mock) => mock.spawn(start, stack_size),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    fn join(&self, thread: RawThread) -> io::Result<WorkerExit> {
        match self {
            Self::Real(real) => real.join(thread),
            #[cfg(test)]
            Self::Mock(mock) => mock.join(thread),
        }
    }

    #[cfg_attr(test, mutants::skip)] // Low-impact layer, waste of time to mutate.
    fn release(&self, thread: RawThread, joined: bool) {
        match self {
            Self::Real(real) => real.release(thread, joined),
            #[cfg(test)]
            Self::Mock(mock) => mock.release(thread, joined),
        }
    }
}
