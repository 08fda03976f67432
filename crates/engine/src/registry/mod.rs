//! Handle registry: one open storage instance per logical database
//!
//! The registry lazily opens a database on first use, hands the same
//! instance to every later caller, and closes instances that have been idle
//! past their deadline.
//!
//! ## Lock discipline
//!
//! A single `parking_lot::Mutex` serializes lookup, insert, deadline refresh
//! and eviction. Opening a new instance happens while that mutex is held:
//!
//! - Concurrent `get` calls for a name that is not open yet wait on the
//!   mutex and then find the instance installed by the first caller, so the
//!   engine's `open` runs exactly once per name (single-flight)
//! - An open blocks lookups of unrelated names for its duration
//!
//! Each handle counts its live [`HandleGuard`]s. The count is incremented
//! under the registry mutex and reaping checks it under the same mutex, so
//! an instance with a transaction in flight is never closed.
//!
//! ## Lifecycle
//!
//! ```text
//!  get(name) ──► [absent] ──open──► installed, deadline = now + idle
//!                   │
//!  get(name) ──► [present] ──► deadline refreshed, same instance
//!                   │
//!  reap_expired ──► deadline passed && no guards ──► closed, evicted
//!                   │
//!  close_all ─────► wait for guards ──► closed (any deadline)
//! ```

mod handle;

pub use handle::HandleGuard;

use handle::Handle;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_core::{LogicalName, TesseraError, TesseraResult};
use tessera_storage::StorageEngine;
use tracing::{debug, info, warn};

use crate::resolver::NameResolver;

struct RegistryState {
    handles: HashMap<LogicalName, Arc<Handle>>,
    closed: bool,
}

/// Cache of open database handles, keyed by logical name
pub struct HandleRegistry {
    engine: Arc<dyn StorageEngine>,
    resolver: NameResolver,
    idle_timeout: Duration,
    // TODO: stripe this lock by name hash so an open no longer blocks lookups of other names.
    state: Mutex<RegistryState>,
}

impl HandleRegistry {
    /// Create an empty registry
    ///
    /// # Arguments
    ///
    /// * `engine` - Storage engine used to open databases
    /// * `resolver` - Validates names and maps them to files
    /// * `idle_timeout` - How long an unused handle stays open
    pub fn new(
        engine: Arc<dyn StorageEngine>,
        resolver: NameResolver,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            resolver,
            idle_timeout,
            state: Mutex::new(RegistryState {
                handles: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Idle duration after which an unused handle may be reclaimed
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Name resolver used by this registry
    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    /// Get the handle for `name`, opening the database if needed
    ///
    /// # Errors
    ///
    /// - `InvalidDatabaseName` if `name` fails validation (nothing is opened)
    /// - `ShuttingDown` after [`close_all`](Self::close_all)
    /// - Any error of the storage engine's `open`
    pub fn get(&self, name: &str) -> TesseraResult<HandleGuard> {
        let resolved = self.resolver.resolve(name)?;

        let mut state = self.state.lock();
        if state.closed {
            return Err(TesseraError::ShuttingDown);
        }

        let now = Instant::now();
        if let Some(handle) = state.handles.get(&resolved.name) {
            return Ok(handle.acquire(now));
        }

        let instance = self.engine.open(&resolved.path)?;
        info!(
            target: "tessera::registry",
            database = %resolved.name,
            path = %resolved.path.display(),
            "Opened database"
        );

        let handle = Arc::new(Handle::new(
            resolved.name.clone(),
            resolved.path,
            instance,
            self.idle_timeout,
            now,
        ));
        let guard = handle.acquire(now);
        state.handles.insert(resolved.name, handle);
        Ok(guard)
    }

    /// Close and evict every handle that is idle past its deadline
    ///
    /// Returns the number of handles evicted.
    pub fn reap_expired(&self) -> usize {
        self.reap_expired_at(Instant::now())
    }

    /// [`reap_expired`](Self::reap_expired) with an explicit clock reading
    pub fn reap_expired_at(&self, now: Instant) -> usize {
        let mut state = self.state.lock();

        let expired: Vec<LogicalName> = state
            .handles
            .iter()
            .filter(|(_, handle)| handle.is_reclaimable(now))
            .map(|(name, _)| name.clone())
            .collect();

        // Closing under the lock keeps a re-open from reading the file
        // before the close has flushed it.
        for name in &expired {
            if let Some(handle) = state.handles.remove(name) {
                match handle.instance().close() {
                    Ok(()) => debug!(
                        target: "tessera::registry",
                        database = %name,
                        "Closed idle database"
                    ),
                    Err(e) => warn!(
                        target: "tessera::registry",
                        database = %name,
                        error = %e,
                        "Failed to close idle database; evicted anyway"
                    ),
                }
            }
        }

        expired.len()
    }

    /// Close every handle and refuse further `get` calls
    ///
    /// Waits for in-flight operations on each handle to finish before closing
    /// it. Every handle is attempted; the first close error is returned.
    pub fn close_all(&self) -> TesseraResult<()> {
        let handles: Vec<Arc<Handle>> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.handles.drain().map(|(_, handle)| handle).collect()
        };

        info!(
            target: "tessera::registry",
            count = handles.len(),
            "Closing all databases"
        );

        let mut first_error = None;
        for handle in handles {
            handle.wait_unreferenced();
            if let Err(e) = handle.instance().close() {
                warn!(
                    target: "tessera::registry",
                    database = %handle.name(),
                    error = %e,
                    "Failed to close database"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of open handles
    pub fn len(&self) -> usize {
        self.state.lock().handles.len()
    }

    /// Whether no handle is open
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `name` currently has an open handle
    pub fn contains(&self, name: &str) -> bool {
        match LogicalName::new(name) {
            Ok(name) => self.state.lock().handles.contains_key(&name),
            Err(_) => false,
        }
    }

    /// Idle deadline of the handle for `name`, if open
    pub fn idle_deadline(&self, name: &str) -> Option<Instant> {
        let name = LogicalName::new(name).ok()?;
        let state = self.state.lock();
        state.handles.get(&name).map(|handle| handle.deadline())
    }

    /// Last time a guard for `name` was acquired or released, if open
    pub fn last_access(&self, name: &str) -> Option<Instant> {
        let name = LogicalName::new(name).ok()?;
        let state = self.state.lock();
        state.handles.get(&name).map(|handle| handle.last_access())
    }

    /// Whether [`close_all`](Self::close_all) has been called
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
