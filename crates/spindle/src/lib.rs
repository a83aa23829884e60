// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Spawn, join and release native operating system threads through one portable handle type.
//!
//! This crate is a thin compatibility layer over the threading API of the build target: POSIX
//! threads on unix and the Win32 thread API on Windows. The backend is chosen at compile time;
//! calling code never branches on the operating system.
//!
//! The whole surface is three operations:
//!
//! 1. [`ThreadHandle::create`] spawns a thread that runs a worker with its data. A worker reports
//!    success by returning `Some` and failure by returning `None`.
//! 1. [`ThreadHandle::join`] blocks until the thread terminates and tells whether the worker
//!    succeeded. Everything the thread did is visible to the caller once it returns.
//! 1. [`release`] gives back the operating system resources of a batch of handles, tolerating empty
//!    slots left by threads that failed to start. Dropping a [`ThreadHandle`] does the same for one.
//!
//! There is deliberately no pooling, cancellation or synchronization here. Workers that share
//! state bring their own locks.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use spindle::ThreadHandle;
//!
//! let counter = Arc::new(Mutex::new(0));
//!
//! let handles = (0..8)
//!     .map(|_| {
//!         ThreadHandle::create(
//!             |counter: Arc<Mutex<i32>>| {
//!                 *counter.lock().ok()? += 1;
//!                 Some(())
//!             },
//!             Arc::clone(&counter),
//!         )
//!     })
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! for handle in handles {
//!     handle.join()?;
//! }
//!
//! assert_eq!(*counter.lock().unwrap(), 8);
//! # Ok::<(), spindle::Error>(())
//! ```
//!
//! Code that passes raw function and data pointers around, e.g. across a C boundary, uses
//! [`ThreadHandle::create_raw`] or the entry points in [`ffi`].

pub(crate) mod pal;

pub mod ffi;

mod batch;
mod builder;
mod error;
mod handle;
mod raw_thread;
mod worker;

pub use batch::*;
pub use builder::*;
pub use error::*;
pub use handle::*;
pub use raw_thread::*;
pub use worker::RawWorker;
