use crate::collection::{Document, ObjectId, WriteResult};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::query::Query;
use crate::schema::Schema;
use indexmap::IndexMap;
use parking_lot::RwLock;

struct StoreState {
    schema: Schema,
    documents: IndexMap<ObjectId, Document>,
}

/// Synchronous, lock-guarded storage behind a [crate::collection::Collection].
///
/// The schema binding lives under the same lock as the documents, so a write
/// is always validated against the schema it is stored under.
pub(crate) struct CollectionStore {
    name: String,
    state: RwLock<StoreState>,
}

impl CollectionStore {
    pub(crate) fn new(name: &str, schema: Schema) -> Self {
        CollectionStore {
            name: name.to_string(),
            state: RwLock::new(StoreState {
                schema,
                documents: IndexMap::new(),
            }),
        }
    }

    pub(crate) fn schema(&self) -> Schema {
        self.state.read().schema.clone()
    }

    pub(crate) fn size(&self) -> usize {
        self.state.read().documents.len()
    }

    pub(crate) fn insert(&self, raw: &Document) -> StrataResult<Document> {
        if raw.has_id() {
            log::error!("Document inserted into {} already carries an _id", self.name);
            return Err(StrataError::new(
                "Inserted document must not carry an _id, use save to replace",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut state = self.state.write();
        let mut document = state.schema.validate(raw)?;
        let id = ObjectId::new();
        document.set_object_id(id);
        state.documents.insert(id, document.clone());
        log::debug!("Inserted {} into {}", id, self.name);
        Ok(document)
    }

    pub(crate) fn find(&self, query: &Query) -> StrataResult<Vec<Document>> {
        let state = self.state.read();
        let mut matches = Vec::new();
        for document in state.documents.values() {
            if query.apply(document)? {
                matches.push(document.clone());
            }
        }
        Ok(matches)
    }

    pub(crate) fn find_one(&self, query: &Query) -> StrataResult<Option<Document>> {
        let state = self.state.read();
        for document in state.documents.values() {
            if query.apply(document)? {
                return Ok(Some(document.clone()));
            }
        }
        Ok(None)
    }

    pub(crate) fn get_by_id(&self, id: &ObjectId) -> Option<Document> {
        self.state.read().documents.get(id).cloned()
    }

    pub(crate) fn remove(&self, query: &Query, just_once: bool) -> StrataResult<WriteResult> {
        let mut state = self.state.write();
        let mut removed = Vec::new();
        for (id, document) in state.documents.iter() {
            if query.apply(document)? {
                removed.push(*id);
                if just_once {
                    break;
                }
            }
        }

        for id in &removed {
            state.documents.shift_remove(id);
        }
        log::debug!("Removed {} document(s) from {} matching {}", removed.len(), self.name, query);
        Ok(WriteResult::new(removed))
    }

    /// Replaces the stored document with the same id, keeping its position.
    pub(crate) fn save(&self, document: &Document) -> StrataResult<Document> {
        let id = match document.object_id() {
            Some(id) => id,
            None => {
                log::error!("Document saved into {} has no _id", self.name);
                return Err(StrataError::new(
                    "Saved document must carry an _id",
                    ErrorKind::InvalidId,
                ));
            }
        };

        let mut state = self.state.write();
        let validated = state.schema.validate(document)?;
        match state.documents.get_mut(&id) {
            Some(stored) => {
                *stored = validated.clone();
                Ok(validated)
            }
            None => {
                log::error!("No document {} in {} to save over", id, self.name);
                Err(StrataError::new(
                    &format!("No document with id {} in {}", id, self.name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Rebinds to `schema` after revalidating every stored document.
    /// Nothing changes if any document fails.
    pub(crate) fn evolve_schema(&self, schema: Schema) -> StrataResult<()> {
        let mut state = self.state.write();
        let current = state.schema.version();
        if schema.version() <= current {
            log::error!(
                "Schema v{} for {} is not newer than v{}",
                schema.version(),
                self.name,
                current
            );
            return Err(StrataError::new(
                &format!("Schema version {} is not newer than {}", schema.version(), current),
                ErrorKind::SchemaVersionError,
            ));
        }

        let mut migrated = IndexMap::with_capacity(state.documents.len());
        for (id, document) in state.documents.iter() {
            let validated = schema.validate(document).map_err(|err| {
                log::error!("Document {} in {} does not fit schema v{}", id, self.name, schema.version());
                StrataError::new_with_cause(
                    &format!("Document {} does not fit schema v{}", id, schema.version()),
                    ErrorKind::SchemaVersionError,
                    err,
                )
            })?;
            migrated.insert(*id, validated);
        }

        log::info!("Collection {} moved from schema v{} to v{}", self.name, current, schema.version());
        state.documents = migrated;
        state.schema = schema;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::query::{by_id, field, or, query};
    use crate::schema::FieldSpec;

    fn store() -> CollectionStore {
        let schema = Schema::new(vec![("key", FieldSpec::string()), ("value", FieldSpec::double())]).unwrap();
        CollectionStore::new("test", schema)
    }

    #[test]
    fn insert_assigns_fresh_ids() {
        let store = store();
        let a = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        let b = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        assert!(a.has_id());
        assert_ne!(a.object_id(), b.object_id());
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn insert_rejects_invalid_and_identified_documents() {
        let store = store();
        let err = store.insert(&doc! { key: "a" }).unwrap_err();
        assert!(err.kind().is_validation());

        let stored = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        let err = store.insert(&stored).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn find_keeps_insertion_order() {
        let store = store();
        for key in ["a", "c", "b"] {
            store.insert(&doc! { key: key, value: 1.0 }).unwrap();
        }
        let found = store.find(&or(vec![field("key").eq("a"), field("key").eq("b")])).unwrap();
        let keys: Vec<String> = found.iter().map(|d| d.get_string("key").unwrap()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn find_one_returns_first_or_none() {
        let store = store();
        assert_eq!(store.find_one(&query()).unwrap(), None);
        let first = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        store.insert(&doc! { key: "a", value: 2.0 }).unwrap();
        assert_eq!(store.find_one(&field("key").eq("a")).unwrap(), Some(first));
    }

    #[test]
    fn remove_one_removes_first_match_only() {
        let store = store();
        let first = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        store.insert(&doc! { key: "a", value: 2.0 }).unwrap();
        let result = store.remove(&field("key").eq("a"), true).unwrap();
        assert_eq!(result.affected_ids(), &vec![first.object_id().unwrap()]);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn remove_all_matches() {
        let store = store();
        store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        store.insert(&doc! { key: "b", value: 1.0 }).unwrap();
        store.insert(&doc! { key: "a", value: 2.0 }).unwrap();
        assert_eq!(store.remove(&field("key").eq("a"), false).unwrap().count(), 2);
        assert_eq!(store.remove(&field("key").eq("a"), false).unwrap().count(), 0);
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn save_replaces_in_place() {
        let store = store();
        let first = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        store.insert(&doc! { key: "b", value: 1.0 }).unwrap();

        let updated = first.with("value", 5.0).unwrap();
        store.save(&updated).unwrap();

        let all = store.find(&query()).unwrap();
        assert_eq!(all[0], updated);
        assert_eq!(all[0].get_double("value").unwrap(), 5.0);
    }

    #[test]
    fn save_requires_known_id() {
        let store = store();
        let err = store.save(&doc! { key: "a", value: 1.0 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);

        let mut stranger = doc! { key: "a", value: 1.0 };
        stranger.set_object_id(ObjectId::new());
        assert_eq!(store.save(&stranger).unwrap_err().kind(), &ErrorKind::NotFound);
    }

    #[test]
    fn save_validates() {
        let store = store();
        let stored = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        let broken = stored.with("value", "high").unwrap();
        assert_eq!(store.save(&broken).unwrap_err().kind(), &ErrorKind::InvalidDataType);
        let id = stored.object_id().unwrap();
        assert_eq!(store.get_by_id(&id), Some(stored));
    }

    #[test]
    fn get_by_id_matches_by_id_query() {
        let store = store();
        let stored = store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        let id = stored.object_id().unwrap();
        assert_eq!(store.get_by_id(&id), store.find_one(&by_id(id)).unwrap());
    }

    #[test]
    fn evolve_requires_newer_version() {
        let store = store();
        let same = Schema::new(vec![("key", FieldSpec::string())]).unwrap();
        assert_eq!(store.evolve_schema(same).unwrap_err().kind(), &ErrorKind::SchemaVersionError);
    }

    #[test]
    fn evolve_revalidates_or_changes_nothing() {
        let store = store();
        store.insert(&doc! { key: "a", value: 1.0 }).unwrap();
        let v1 = store.schema();

        let stricter = v1
            .evolve(vec![
                ("key", FieldSpec::string()),
                ("value", FieldSpec::double()),
                ("note", FieldSpec::string()),
            ])
            .unwrap();
        assert_eq!(store.evolve_schema(stricter).unwrap_err().kind(), &ErrorKind::SchemaVersionError);
        assert_eq!(store.schema().version(), 1);

        let looser = v1
            .evolve(vec![
                ("key", FieldSpec::string()),
                ("value", FieldSpec::double()),
                ("note", FieldSpec::string().optional()),
            ])
            .unwrap();
        store.evolve_schema(looser).unwrap();
        assert_eq!(store.schema().version(), 2);
        assert!(store.insert(&doc! { key: "b", value: 1.0, note: "x" }).is_ok());
    }
}
