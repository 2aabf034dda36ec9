//! Spawning work from test bodies.

use std::io;
use std::thread::{self, JoinHandle};

use crate::context::{self, AmbientGuard};

/// Start a thread that inherits the caller's run and test.
///
/// Issues recorded on the new thread are attributed to the same test as the
/// spawning code.
pub fn spawn<F, T>(f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let ambient = context::inherited();
    thread::Builder::new()
        .name("ori-test-task".to_string())
        .spawn(move || {
            let _ambient = ambient.map(AmbientGuard::install);
            f()
        })
}

/// Start a thread with no inherited context.
///
/// Recording from it falls back to the most recently started run, and to
/// that run's test only while exactly one is running.
pub fn spawn_detached<F, T>(f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name("ori-test-detached".to_string())
        .spawn(f)
}
