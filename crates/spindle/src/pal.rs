// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod abstractions;
mod facade;
pub use abstractions::*;
pub use facade::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::*;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(not(any(unix, windows)))]
compile_error!("spindle supports unix targets (POSIX threads) and Windows only");

/// Singleton instance of `BuildTargetPlatform`, used by public API types
/// to hook up to the correct PAL implementation.
///
/// Internal types in this crate may also use a mock platform, with the
/// instance typically received via `ThreadBuilder`.
pub static BUILD_TARGET_PLATFORM: BuildTargetPlatform = BuildTargetPlatform;
