// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use tracing::{Level, event};

use crate::ThreadHandle;

/// Releases a batch of thread handles, skipping empty slots left by threads that failed to start.
///
/// Joined threads simply give back their operating system resources. Threads that were never
/// joined keep running detached. Returns the number of handles released.
///
/// # Examples
///
/// ```
/// use spindle::ThreadHandle;
///
/// let mut handles: Vec<Option<ThreadHandle>> = (0..4_u32)
///     .map(|i| ThreadHandle::create(Some, i).ok())
///     .collect();
///
/// for handle in &mut handles {
///     if let Some(handle) = handle.take() {
///         handle.join()?;
///     }
/// }
///
/// handles.push(ThreadHandle::create(Some, 4_u32).ok());
/// assert_eq!(spindle::release(handles), 1);
/// # Ok::<(), spindle::Error>(())
/// ```
pub fn release<I>(handles: I) -> usize
where
    I: IntoIterator<Item = Option<ThreadHandle>>,
{
    let mut released = 0;

    for handle in handles.into_iter().flatten() {
        drop(handle);
        released += 1;
    }

    event!(Level::TRACE, released, "released thread handles");
    released
}
