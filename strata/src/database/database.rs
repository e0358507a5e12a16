use crate::collection::Collection;
use crate::database::{DatabaseBuilder, DatabaseConfig};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::future::WorkerPool;
use crate::schema::Schema;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An open store: the worker pool plus the registry of named collections.
///
/// The handle is passed around by cloning; all clones refer to the same
/// store. After [Database::close] every collection operation fails with
/// [ErrorKind::StoreClosed].
///
/// # Examples
///
/// ```rust
/// use strata::database::Database;
/// use strata::schema::{FieldSpec, Schema};
///
/// let db = Database::builder().worker_threads(1).open().unwrap();
/// let schema = Schema::new(vec![("key", FieldSpec::string())]).unwrap();
/// db.create_collection("example.keyValue", schema).unwrap();
///
/// assert!(db.has_collection("example.keyValue"));
/// assert!(db.collection("missing").is_err());
/// db.close();
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn new(config: DatabaseConfig) -> StrataResult<Database> {
        let pool = WorkerPool::new(config.worker_threads(), &config.thread_name())?;
        log::info!(
            "Opened database with {} worker(s) named {}",
            pool.size(),
            pool.name()
        );
        Ok(Database {
            inner: Arc::new(DatabaseInner {
                config,
                pool,
                collections: DashMap::new(),
                closed: Arc::new(AtomicBool::new(false)),
            }),
        })
    }

    /// Registers a collection bound to `schema`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::CollectionAlreadyExists] if the name is taken,
    /// [ErrorKind::InvalidOperation] for an empty name and
    /// [ErrorKind::StoreClosed] after close.
    pub fn create_collection(&self, name: &str, schema: Schema) -> StrataResult<Collection> {
        self.ensure_open()?;
        if name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(StrataError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }

        match self.inner.collections.entry(name.to_string()) {
            Entry::Occupied(_) => {
                log::error!("Collection {} already exists", name);
                Err(StrataError::new(
                    &format!("Collection {} already exists", name),
                    ErrorKind::CollectionAlreadyExists,
                ))
            }
            Entry::Vacant(entry) => {
                let collection = Collection::new(
                    name,
                    schema,
                    self.inner.pool.clone(),
                    self.inner.closed.clone(),
                );
                entry.insert(collection.clone());
                log::debug!("Created collection {}", name);
                Ok(collection)
            }
        }
    }

    pub fn collection(&self, name: &str) -> StrataResult<Collection> {
        self.ensure_open()?;
        match self.inner.collections.get(name) {
            Some(collection) => Ok(collection.value().clone()),
            None => {
                log::error!("Collection {} does not exist", name);
                Err(StrataError::new(
                    &format!("Collection {} does not exist", name),
                    ErrorKind::CollectionNotFound,
                ))
            }
        }
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }

    /// Registered collection names, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.inner.pool
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    /// Stops accepting work. Queued tasks still run; closing twice is a no-op.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.pool.shutdown();
            log::info!("Database closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> StrataResult<()> {
        if self.is_closed() {
            log::error!("Database is closed");
            return Err(StrataError::new("Database is closed", ErrorKind::StoreClosed));
        }
        Ok(())
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("collections", &self.collection_names())
            .field("closed", &self.is_closed())
            .finish()
    }
}

struct DatabaseInner {
    config: DatabaseConfig,
    pool: WorkerPool,
    collections: DashMap<String, Collection>,
    closed: Arc<AtomicBool>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}
