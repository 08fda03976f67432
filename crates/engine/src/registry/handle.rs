//! Cached database handle and its in-flight guard

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_core::LogicalName;
use tessera_storage::EngineInstance;

struct AccessState {
    last_access: Instant,
    deadline: Instant,
    /// Guards currently alive for this handle
    active: usize,
}

/// One open database owned by the registry
pub(crate) struct Handle {
    name: LogicalName,
    path: PathBuf,
    instance: Arc<dyn EngineInstance>,
    idle_timeout: Duration,
    access: Mutex<AccessState>,
    released: Condvar,
}

impl Handle {
    pub(crate) fn new(
        name: LogicalName,
        path: PathBuf,
        instance: Arc<dyn EngineInstance>,
        idle_timeout: Duration,
        now: Instant,
    ) -> Self {
        Self {
            name,
            path,
            instance,
            idle_timeout,
            access: Mutex::new(AccessState {
                last_access: now,
                deadline: now + idle_timeout,
                active: 0,
            }),
            released: Condvar::new(),
        }
    }

    pub(crate) fn name(&self) -> &LogicalName {
        &self.name
    }

    pub(crate) fn instance(&self) -> &Arc<dyn EngineInstance> {
        &self.instance
    }

    /// Count a new user and push the deadline out.
    ///
    /// Must be called with the registry lock held so reaping cannot observe
    /// a stale count.
    pub(crate) fn acquire(self: &Arc<Self>, now: Instant) -> HandleGuard {
        {
            let mut access = self.access.lock();
            access.active += 1;
            access.last_access = now;
            access.deadline = now + self.idle_timeout;
        }
        HandleGuard {
            handle: Arc::clone(self),
        }
    }

    fn release(&self) {
        let mut access = self.access.lock();
        let now = Instant::now();
        access.active -= 1;
        access.last_access = now;
        access.deadline = now + self.idle_timeout;
        if access.active == 0 {
            self.released.notify_all();
        }
    }

    pub(crate) fn deadline(&self) -> Instant {
        self.access.lock().deadline
    }

    pub(crate) fn last_access(&self) -> Instant {
        self.access.lock().last_access
    }

    pub(crate) fn active(&self) -> usize {
        self.access.lock().active
    }

    /// Deadline passed and nobody holds the handle
    pub(crate) fn is_reclaimable(&self, now: Instant) -> bool {
        let access = self.access.lock();
        access.active == 0 && access.deadline <= now
    }

    /// Block until every guard has been dropped
    pub(crate) fn wait_unreferenced(&self) {
        let mut access = self.access.lock();
        while access.active > 0 {
            self.released.wait(&mut access);
        }
    }
}

/// Reference to an open database, valid for one operation
///
/// While a guard is alive the registry will not close the underlying
/// instance. Dropping the guard refreshes the idle deadline.
pub struct HandleGuard {
    handle: Arc<Handle>,
}

impl HandleGuard {
    /// Logical name of the database
    pub fn name(&self) -> &LogicalName {
        self.handle.name()
    }

    /// File backing the database
    pub fn path(&self) -> &Path {
        &self.handle.path
    }

    /// Current idle deadline
    pub fn idle_deadline(&self) -> Instant {
        self.handle.deadline()
    }

    /// When a guard for this database was last acquired or released
    pub fn last_access(&self) -> Instant {
        self.handle.last_access()
    }

    /// Number of guards currently alive for this database, this one included
    pub fn active_users(&self) -> usize {
        self.handle.active()
    }

    /// Whether two guards refer to the same open instance
    pub fn same_instance(&self, other: &HandleGuard) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }
}

impl Deref for HandleGuard {
    type Target = dyn EngineInstance;

    fn deref(&self) -> &Self::Target {
        self.handle.instance().as_ref()
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.handle.release();
    }
}

impl fmt::Debug for HandleGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleGuard")
            .field("name", self.handle.name())
            .field("path", &self.handle.path)
            .finish()
    }
}
