use crate::collection::store::CollectionStore;
use crate::collection::{Document, ObjectId, WriteResult};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::future::{Future, WorkerPool};
use crate::query::Query;
use crate::schema::Schema;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A named, schema-bound set of documents.
///
/// Every operation is queued on the database's worker pool and returns a
/// [Future] right away. Documents handed out are copies; to change one, build
/// the new state and [Collection::save] it.
///
/// `Collection` is a cheap handle. Clones share the same documents.
///
/// # Examples
///
/// ```rust
/// use strata::database::Database;
/// use strata::doc;
/// use strata::query::field;
/// use strata::schema::{FieldSpec, Schema};
///
/// let db = Database::builder().worker_threads(1).open().unwrap();
/// let schema = Schema::new(vec![("key", FieldSpec::string())]).unwrap();
/// let names = db.create_collection("names", schema).unwrap();
///
/// let count = names
///     .insert(doc! { key: "a" })
///     .flat_map({
///         let names = names.clone();
///         move |_| names.find(field("key").eq("a"))
///     })
///     .map(|found| found.len());
/// assert_eq!(count.wait().unwrap(), 1);
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    name: String,
    store: CollectionStore,
    pool: WorkerPool,
    closed: Arc<AtomicBool>,
}

impl Collection {
    pub(crate) fn new(name: &str, schema: Schema, pool: WorkerPool, closed: Arc<AtomicBool>) -> Self {
        Collection {
            inner: Arc::new(CollectionInner {
                name: name.to_string(),
                store: CollectionStore::new(name, schema),
                pool,
                closed,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The schema currently bound.
    pub fn schema(&self) -> Schema {
        self.inner.store.schema()
    }

    pub fn size(&self) -> usize {
        self.inner.store.size()
    }

    /// Validates `raw`, assigns it a fresh id and stores it. Completes with
    /// the stored document, `_id` included.
    pub fn insert(&self, raw: Document) -> Future<Document> {
        self.submit(move |store| store.insert(&raw))
    }

    /// All matching documents in insertion order.
    pub fn find(&self, query: Query) -> Future<Vec<Document>> {
        self.submit(move |store| store.find(&query))
    }

    /// The first matching document in insertion order; `None` if nothing
    /// matches.
    pub fn find_one(&self, query: Query) -> Future<Option<Document>> {
        self.submit(move |store| store.find_one(&query))
    }

    pub fn get_by_id(&self, id: ObjectId) -> Future<Option<Document>> {
        self.submit(move |store| Ok(store.get_by_id(&id)))
    }

    pub fn remove(&self, query: Query) -> Future<WriteResult> {
        self.submit(move |store| store.remove(&query, false))
    }

    pub fn remove_one(&self, query: Query) -> Future<WriteResult> {
        self.submit(move |store| store.remove(&query, true))
    }

    /// Replaces the stored document with the same `_id`. Fails with
    /// [ErrorKind::InvalidId] without an id and [ErrorKind::NotFound] for an
    /// unknown one.
    pub fn save(&self, document: Document) -> Future<Document> {
        self.submit(move |store| store.save(&document))
    }

    /// Rebinds the collection to a newer schema once every stored document
    /// validates against it.
    pub fn evolve_schema(&self, schema: Schema) -> Future<()> {
        self.submit(move |store| store.evolve_schema(schema))
    }

    fn submit<T, F>(&self, task: F) -> Future<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&CollectionStore) -> StrataResult<T> + Send + 'static,
    {
        if self.inner.closed.load(Ordering::Acquire) {
            return Future::failed(closed_error(&self.inner.name));
        }

        let inner = self.inner.clone();
        Future::spawn(&self.inner.pool, move || {
            if inner.closed.load(Ordering::Acquire) {
                return Err(closed_error(&inner.name));
            }
            task(&inner.store)
        })
    }
}

impl Debug for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name)
            .field("schema_version", &self.inner.store.schema().version())
            .field("size", &self.inner.store.size())
            .finish()
    }
}

fn closed_error(name: &str) -> StrataError {
    log::error!("Collection {} used after the database was closed", name);
    StrataError::new("Database is closed", ErrorKind::StoreClosed)
}
