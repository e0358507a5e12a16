//! Configuration for a [crate::database::Database].

use crate::common::{atomic, Atomic, DEFAULT_THREAD_NAME};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::get_cpu_count;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Settings a database is opened with.
///
/// Values can be changed until the database is opened; afterwards setters
/// fail with [ErrorKind::InvalidOperation]. Clones share the same settings.
#[derive(Clone)]
pub struct DatabaseConfig {
    inner: Arc<DatabaseConfigInner>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConfig {
    /// Defaults: one worker per CPU, threads named `strata-worker-{n}`.
    pub fn new() -> Self {
        DatabaseConfig {
            inner: Arc::new(DatabaseConfigInner::new()),
        }
    }

    pub fn worker_threads(&self) -> usize {
        self.inner.worker_threads.load(Ordering::Relaxed)
    }

    pub fn set_worker_threads(&self, worker_threads: usize) -> StrataResult<()> {
        self.inner.ensure_not_configured("Worker thread count")?;
        if worker_threads == 0 {
            log::error!("Worker thread count must be positive");
            return Err(StrataError::new(
                "Worker thread count must be positive",
                ErrorKind::InvalidOperation,
            ));
        }
        self.inner.worker_threads.store(worker_threads, Ordering::Relaxed);
        Ok(())
    }

    pub fn thread_name(&self) -> String {
        self.inner.thread_name.read().clone()
    }

    pub fn set_thread_name(&self, thread_name: &str) -> StrataResult<()> {
        self.inner.ensure_not_configured("Thread name")?;
        if thread_name.trim().is_empty() {
            log::error!("Thread name cannot be empty");
            return Err(StrataError::new(
                "Thread name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        *self.inner.thread_name.write() = thread_name.to_string();
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the settings.
    pub(crate) fn auto_configure(&self) -> StrataResult<()> {
        if self.inner.configured.swap(true, Ordering::Relaxed) {
            log::error!("Database config is already in use");
            return Err(StrataError::new(
                "Database config is already in use",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

struct DatabaseConfigInner {
    configured: AtomicBool,
    worker_threads: AtomicUsize,
    thread_name: Atomic<String>,
}

impl DatabaseConfigInner {
    fn new() -> Self {
        DatabaseConfigInner {
            configured: AtomicBool::from(false),
            worker_threads: AtomicUsize::new(get_cpu_count()),
            thread_name: atomic(DEFAULT_THREAD_NAME.to_string()),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> StrataResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after the database is opened", setting);
            return Err(StrataError::new(
                &format!("{} cannot be changed after the database is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}
