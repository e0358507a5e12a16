use crate::reporter::Reporter;
use chrono::Utc;
use std::sync::Arc;
use strata::collection::{Collection, Document, ObjectId, WriteResult};
use strata::database::Database;
use strata::errors::{ErrorKind, StrataError, StrataResult};
use strata::future::Future;
use strata::query::{by_id, field, query, Query};
use strata::schema::{FieldSpec, Schema};

pub const KEY_VALUE_COLLECTION: &str = "example.keyValue";
pub const REFERENCE_COLLECTION: &str = "example.reference";
pub const EMBEDDING_COLLECTION: &str = "example.embedding";

/// `{key: string, value: double, time: date}`
pub fn key_value_schema() -> StrataResult<Schema> {
    Schema::new(vec![
        ("key", FieldSpec::string()),
        ("value", FieldSpec::double()),
        ("time", FieldSpec::date()),
    ])
}

/// The key-value fields plus `ref`, pointing into `example.keyValue`.
pub fn reference_schema() -> StrataResult<Schema> {
    Schema::new(vec![
        ("key", FieldSpec::string()),
        ("value", FieldSpec::double()),
        ("time", FieldSpec::date()),
        ("ref", FieldSpec::reference(KEY_VALUE_COLLECTION)),
    ])
}

/// `{embed: <key-value document>}`
pub fn embedding_schema() -> StrataResult<Schema> {
    Schema::new(vec![("embed", FieldSpec::embedding(key_value_schema()?))])
}

/// The three demo collections and the operations the plugin exposes on them.
///
/// Every operation reports its outcome through the [Reporter] before the
/// returned [Future] completes, so callers can keep composing.
#[derive(Clone)]
pub struct DemoStore {
    key_value: Collection,
    reference: Collection,
    embedding: Collection,
    reporter: Arc<dyn Reporter>,
}

impl DemoStore {
    /// Binds to the demo collections of `db`, creating the missing ones.
    pub fn open(db: &Database, reporter: Arc<dyn Reporter>) -> StrataResult<DemoStore> {
        Ok(DemoStore {
            key_value: ensure_collection(db, KEY_VALUE_COLLECTION, key_value_schema()?)?,
            reference: ensure_collection(db, REFERENCE_COLLECTION, reference_schema()?)?,
            embedding: ensure_collection(db, EMBEDDING_COLLECTION, embedding_schema()?)?,
            reporter,
        })
    }

    pub fn key_value(&self) -> &Collection {
        &self.key_value
    }

    pub fn reference(&self) -> &Collection {
        &self.reference
    }

    pub fn embedding(&self) -> &Collection {
        &self.embedding
    }

    /// Stores `{key, value, time: now}`; `value` must parse as a number.
    pub fn insert(&self, key: &str, value: &str) -> Future<Document> {
        let raw = match parse_value(value).and_then(|value| key_value_document(key, value)) {
            Ok(raw) => raw,
            Err(err) => return self.fail(err),
        };
        let inserted = self.key_value.insert(raw);
        self.reported(inserted, "Cannot insert data", |doc| {
            format!(
                "New document{{ _id: {}, key: {}, value: {}, time: {} }} is inserted.",
                doc.get("_id"),
                doc.get("key"),
                doc.get("value"),
                doc.get("time")
            )
        })
    }

    /// Documents whose key is any of `keys`, in insertion order.
    pub fn find<S: AsRef<str>>(&self, keys: &[S]) -> Future<Vec<Document>> {
        let query = match keys_query("key", keys) {
            Ok(query) => query,
            Err(err) => return self.fail(err),
        };
        let found = self.key_value.find(query);
        self.reported(found, "Cannot find data", describe_all)
    }

    pub fn find_one<S: AsRef<str>>(&self, keys: &[S]) -> Future<Option<Document>> {
        match keys_query("key", keys) {
            Ok(query) => self.find_one_by(query),
            Err(err) => self.fail(err),
        }
    }

    pub fn remove<S: AsRef<str>>(&self, keys: &[S]) -> Future<WriteResult> {
        let query = match keys_query("key", keys) {
            Ok(query) => query,
            Err(err) => return self.fail(err),
        };
        let removed = self.key_value.remove(query);
        self.reported(removed, "Cannot remove data", describe_removed)
    }

    pub fn remove_one<S: AsRef<str>>(&self, keys: &[S]) -> Future<WriteResult> {
        let query = match keys_query("key", keys) {
            Ok(query) => query,
            Err(err) => return self.fail(err),
        };
        let removed = self.key_value.remove_one(query);
        self.reported(removed, "Cannot remove data", describe_removed)
    }

    /// Sets `value` (and refreshes `time`) on the first document whose key is
    /// any of `keys`, then saves it.
    pub fn save<S: AsRef<str>>(&self, new_value: &str, keys: &[S]) -> Future<Document> {
        let (value, query) = match parse_value(new_value).and_then(|value| Ok((value, keys_query("key", keys)?))) {
            Ok(parsed) => parsed,
            Err(err) => return self.fail(err),
        };

        let this = self.clone();
        self.find_one_by(query).flat_map(move |found| {
            let current = match found {
                Some(current) => current,
                None => {
                    return Future::failed(StrataError::new(
                        "Cannot find data to save",
                        ErrorKind::NotFound,
                    ))
                }
            };
            match this.with_new_value(&current, value) {
                Ok(updated) => {
                    let saved = this.key_value.save(updated);
                    this.reported(saved, "Cannot save data", |doc| format!("Saved {}", doc))
                }
                Err(err) => Future::failed(err),
            }
        })
    }

    /// Looks a key-value document up by its printed id.
    pub fn find_one_with_key(&self, id: &str) -> Future<Option<Document>> {
        let id = match ObjectId::parse(id) {
            Ok(id) => id,
            Err(err) => return self.fail(err),
        };
        let found = self.key_value.find_one(by_id(id));
        self.reported(found, "Cannot find data", |found| match found {
            Some(doc) => doc.to_string(),
            None => "Cannot find data".to_string(),
        })
    }

    /// Copies the key-value document with `key` into `example.reference`,
    /// pointing `ref` back at it.
    pub fn reference_insert(&self, key: &str) -> Future<Document> {
        let key = key.to_string();
        let this = self.clone();
        let found = self.key_value.find_one(field("key").eq(key.as_str()));
        self.reported(found, "Cannot find data", describe_document1)
            .flat_map(move |found| match found {
                Some(target) => match reference_document(&target) {
                    Ok(raw) => {
                        let inserted = this.reference.insert(raw);
                        this.reported(inserted, "Cannot insert reference", |doc| {
                            format!("Inserted reference {}", doc)
                        })
                    }
                    Err(err) => Future::failed(err),
                },
                None => Future::failed(unresolved(&format!(
                    "No {} document with key {}",
                    KEY_VALUE_COLLECTION, key
                ))),
            })
    }

    /// Resolves the `ref` of the reference document with `key`.
    ///
    /// Fails with [ErrorKind::ReferenceResolution] if either the reference
    /// document or its target is missing.
    pub fn reference_find_one(&self, key: &str) -> Future<Document> {
        let key = key.to_string();
        let key_value = self.key_value.clone();
        let resolved = self
            .reference
            .find_one(field("key").eq(key.as_str()))
            .flat_map(move |found| match found {
                Some(document) => match document.get_reference("ref") {
                    Ok(id) => key_value.find_one(by_id(id)).try_map(move |target| {
                        target.ok_or_else(|| {
                            unresolved(&format!("Reference {} points to a missing document", id))
                        })
                    }),
                    Err(err) => Future::failed(StrataError::new_with_cause(
                        "Reference document has no usable ref",
                        ErrorKind::ReferenceResolution,
                        err,
                    )),
                },
                None => Future::failed(unresolved(&format!(
                    "No {} document with key {}",
                    REFERENCE_COLLECTION, key
                ))),
            });
        self.reported(resolved, "Cannot find data", |doc| format!("Found data: {}", doc))
    }

    /// Repoints the `ref` of the reference document with `key2` at the
    /// key-value document with `key1`.
    ///
    /// The lookups and the save are separate steps; a concurrent writer may
    /// interleave between them.
    pub fn reference_update(&self, key1: &str, key2: &str) -> Future<Document> {
        let (key1, key2) = (key1.to_string(), key2.to_string());
        let this = self.clone();
        let found = self.key_value.find_one(field("key").eq(key1.as_str()));

        self.reported(found, "Cannot find document1", describe_document1)
            .flat_map(move |found| {
                let document1 = match found {
                    Some(document1) => document1,
                    None => {
                        return Future::failed(unresolved(&format!(
                            "No {} document with key {}",
                            KEY_VALUE_COLLECTION, key1
                        )))
                    }
                };

                let inner = this.clone();
                let found = this.reference.find_one(field("key").eq(key2.as_str()));
                this.reported(found, "Cannot find document2", |found| match found {
                    Some(doc) => format!("document2: {}", doc),
                    None => "document2: null".to_string(),
                })
                .flat_map(move |found| {
                    let document2 = match found {
                        Some(document2) => document2,
                        None => {
                            return Future::failed(unresolved(&format!(
                                "No {} document with key {}",
                                REFERENCE_COLLECTION, key2
                            )))
                        }
                    };
                    let current_ref = match document2.get_reference("ref") {
                        Ok(id) => id,
                        Err(err) => return Future::failed(err),
                    };

                    let saver = inner.clone();
                    let current = inner.key_value.find_one(by_id(current_ref));
                    inner
                        .reported(current, "Cannot find document2.ref", |found| match found {
                            Some(doc) => format!("document2.ref: {}", doc),
                            None => "document2.ref: null".to_string(),
                        })
                        .flat_map(move |_| match saver.repoint(&document2, document1) {
                            Ok(updated) => saver.reference.save(updated),
                            Err(err) => Future::failed(err),
                        })
                })
            })
    }

    /// Stores `{embed: {key, value, time: now}}`.
    pub fn embedding_insert(&self, key: &str, value: &str) -> Future<Document> {
        let raw = match parse_value(value)
            .and_then(|value| key_value_document(key, value))
            .and_then(|embedded| {
                let mut raw = Document::new();
                raw.put("embed", embedded)?;
                Ok(raw)
            }) {
            Ok(raw) => raw,
            Err(err) => return self.fail(err),
        };
        let inserted = self.embedding.insert(raw);
        self.reported(inserted, "Cannot insert embedding", |doc| format!("doc: {}", doc))
    }

    /// Embedding documents whose `embed.key` is any of `keys`.
    pub fn embedding_find<S: AsRef<str>>(&self, keys: &[S]) -> Future<Vec<Document>> {
        let query = match keys_query("embed.key", keys) {
            Ok(query) => query,
            Err(err) => return self.fail(err),
        };
        let found = self.embedding.find(query);
        self.reported(found, "Cannot find data", |documents| {
            let mut lines = vec![format!("Find {} keyValue", documents.len())];
            lines.extend(documents.iter().map(|doc| format!(": {}", doc)));
            lines.join("\n")
        })
    }

    fn find_one_by(&self, query: Query) -> Future<Option<Document>> {
        let found = self.key_value.find_one(query);
        self.reported(found, "Cannot find data", |found| match found {
            Some(doc) => describe(doc),
            None => "Cannot find data".to_string(),
        })
    }

    fn with_new_value(&self, current: &Document, value: f64) -> StrataResult<Document> {
        let schema = self.key_value.schema();
        let updated = schema.accessor("value")?.set(current, value)?;
        schema.accessor("time")?.set(&updated, Utc::now())
    }

    fn repoint(&self, document: &Document, target: Document) -> StrataResult<Document> {
        self.reference.schema().accessor("ref")?.set(document, target)
    }

    // the returned future settles only after the report is written
    fn reported<T, F>(&self, future: Future<T>, context: &'static str, describe: F) -> Future<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(&T) -> String + Send + 'static,
    {
        let reporter = self.reporter.clone();
        future.and_then(move |outcome| match outcome {
            Ok(value) => reporter.info(&describe(value)),
            Err(err) => reporter.error(&format!("{}. ERROR: {}", context, err)),
        })
    }

    fn fail<T>(&self, err: StrataError) -> Future<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.reporter.error(&format!("Invalid request. ERROR: {}", err));
        Future::failed(err)
    }
}

fn ensure_collection(db: &Database, name: &str, schema: Schema) -> StrataResult<Collection> {
    match db.create_collection(name, schema) {
        Ok(collection) => Ok(collection),
        Err(err) if err.kind() == &ErrorKind::CollectionAlreadyExists => db.collection(name),
        Err(err) => Err(err),
    }
}

/// `eq(path, k1).or([eq(path, k2), ..])`; at least one key is required.
fn keys_query<S: AsRef<str>>(path: &str, keys: &[S]) -> StrataResult<Query> {
    let mut queries = keys.iter().map(|key| query().eq(path, key.as_ref()));
    match queries.next() {
        Some(base) => Ok(base.or(queries.collect())),
        None => {
            log::error!("No keys given for a query on {}", path);
            Err(StrataError::new(
                "At least one key is required",
                ErrorKind::InvalidOperation,
            ))
        }
    }
}

fn parse_value(text: &str) -> StrataResult<f64> {
    text.trim().parse::<f64>().map_err(|err| {
        log::error!("'{}' is not a number", text);
        StrataError::new_with_cause(
            &format!("'{}' is not a number", text),
            ErrorKind::InvalidDataType,
            err.into(),
        )
    })
}

fn key_value_document(key: &str, value: f64) -> StrataResult<Document> {
    let mut raw = Document::new();
    raw.put("key", key)?;
    raw.put("value", value)?;
    raw.put("time", Utc::now())?;
    Ok(raw)
}

fn reference_document(target: &Document) -> StrataResult<Document> {
    let mut raw = Document::new();
    for name in ["key", "value", "time"] {
        raw.put(name, target.get(name))?;
    }
    raw.put("ref", target.clone())?;
    Ok(raw)
}

fn unresolved(message: &str) -> StrataError {
    log::error!("{}", message);
    StrataError::new(message, ErrorKind::ReferenceResolution)
}

fn describe(doc: &Document) -> String {
    format!(
        "key: {} value: {} time: {}",
        doc.get("key"),
        doc.get("value"),
        doc.get("time")
    )
}

fn describe_all(documents: &Vec<Document>) -> String {
    let mut lines = vec![format!("Find {} keyValue", documents.len())];
    lines.extend(documents.iter().map(describe));
    lines.join("\n")
}

fn describe_removed(result: &WriteResult) -> String {
    format!("Removed {} document(s)", result.count())
}

fn describe_document1(found: &Option<Document>) -> String {
    match found {
        Some(doc) => format!("document1: {}", doc),
        None => "document1: null".to_string(),
    }
}
