//! Named worker-thread spawning.
//!
//! Every long-lived thread in the monitor gets an explicit name and stack
//! size so it is identifiable in logs and core dumps.

use std::thread::JoinHandle;

use crate::error::SetupError;

/// Spawn a named thread with an explicit stack size.
///
/// Spawn failure is a setup error: the monitor must not run without its
/// worker threads.
pub fn spawn_named(
    name: &'static str,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, SetupError> {
    log::info!("Spawning '{}' (stack={}KB)", name, stack_kb);

    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(|e| {
            log::error!("spawn '{}' failed: {}", name, e);
            SetupError::Thread
        })
}
