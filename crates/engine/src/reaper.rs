//! Background reclamation of idle database handles.
//!
//! A single named thread wakes every `interval` and asks the registry to
//! close handles that are past their idle deadline. Shutdown wakes the
//! thread immediately instead of waiting out the interval.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

use crate::registry::HandleRegistry;

struct ReaperSignal {
    stop: Mutex<bool>,
    wake: Condvar,
}

/// Periodic idle-handle reclamation thread
pub struct Reaper {
    signal: Arc<ReaperSignal>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Reaper {
    /// Start the reaper thread (`tessera-reaper`)
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(registry: Arc<HandleRegistry>, interval: Duration) -> std::io::Result<Self> {
        let signal = Arc::new(ReaperSignal {
            stop: Mutex::new(false),
            wake: Condvar::new(),
        });

        let thread_signal = Arc::clone(&signal);
        let worker = std::thread::Builder::new()
            .name("tessera-reaper".to_string())
            .spawn(move || reaper_loop(&thread_signal, &registry, interval))?;

        Ok(Self {
            signal,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop the thread and wait for it to exit; idempotent
    pub fn shutdown(&self) {
        {
            let mut stop = self.signal.stop.lock();
            *stop = true;
            self.signal.wake.notify_all();
        }

        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reaper_loop(signal: &ReaperSignal, registry: &HandleRegistry, interval: Duration) {
    let mut stop = signal.stop.lock();
    loop {
        if *stop {
            break;
        }
        signal.wake.wait_for(&mut stop, interval);
        if *stop {
            break;
        }

        let evicted = MutexGuard::unlocked(&mut stop, || registry.reap_expired());
        if evicted > 0 {
            debug!(target: "tessera::reaper", evicted, "Reclaimed idle databases");
        }
    }
}
