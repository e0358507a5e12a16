use crate::database::{Database, DatabaseConfig};
use crate::errors::{StrataError, StrataResult};

/// Fluent setup for a [Database].
///
/// Setter errors are remembered and reported by [DatabaseBuilder::open].
///
/// ```rust
/// use strata::database::Database;
///
/// let db = Database::builder()
///     .worker_threads(2)
///     .thread_name("demo")
///     .open()
///     .unwrap();
/// assert_eq!(db.config().worker_threads(), 2);
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    error: Option<StrataError>,
    config: DatabaseConfig,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        DatabaseBuilder {
            error: None,
            config: DatabaseConfig::new(),
        }
    }

    pub fn worker_threads(mut self, worker_threads: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_worker_threads(worker_threads) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn thread_name(mut self, thread_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_thread_name(thread_name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> StrataResult<Database> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.auto_configure()?;
        Database::new(self.config)
    }
}
