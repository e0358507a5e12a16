use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, INITIAL_SCHEMA_VERSION, RESERVED_FIELDS};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::schema::{FieldAccessor, FieldSpec};
use indexmap::IndexMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A versioned, typed description of the documents in a collection.
///
/// Fields keep their declaration order. A schema never changes after
/// construction; [Schema::evolve] derives a successor with the next version.
/// Typed [FieldAccessor]s for every field are resolved up front.
///
/// # Examples
///
/// ```rust
/// use strata::doc;
/// use strata::schema::{FieldSpec, Schema};
///
/// let schema = Schema::new(vec![
///     ("key", FieldSpec::string()),
///     ("value", FieldSpec::double()),
/// ]).unwrap();
///
/// assert!(schema.validate(&doc! { key: "a", value: 1.0 }).is_ok());
/// assert!(schema.validate(&doc! { key: "a", value: 1.0, extra: 2 }).is_err());
/// ```
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    version: u32,
    fields: IndexMap<String, FieldSpec>,
    accessors: IndexMap<String, FieldAccessor>,
}

impl Schema {
    /// Creates a schema at the initial version.
    pub fn new<N: Into<String>>(fields: Vec<(N, FieldSpec)>) -> StrataResult<Schema> {
        Schema::with_version(INITIAL_SCHEMA_VERSION, fields)
    }

    /// Creates a schema at an explicit version (at least 1).
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::SchemaVersionError] for version 0 and
    /// [ErrorKind::InvalidFieldName] for empty, dotted, reserved or duplicate
    /// field names.
    pub fn with_version<N: Into<String>>(version: u32, fields: Vec<(N, FieldSpec)>) -> StrataResult<Schema> {
        if version < INITIAL_SCHEMA_VERSION {
            log::error!("Schema version must be at least {}, got {}", INITIAL_SCHEMA_VERSION, version);
            return Err(StrataError::new(
                &format!("Schema version must be at least {}", INITIAL_SCHEMA_VERSION),
                ErrorKind::SchemaVersionError,
            ));
        }

        let mut declared = IndexMap::with_capacity(fields.len());
        for (name, spec) in fields {
            let name = name.into();
            validate_field_name(&name)?;
            if declared.contains_key(&name) {
                log::error!("Field '{}' is declared twice", name);
                return Err(StrataError::new(
                    &format!("Field '{}' is declared twice", name),
                    ErrorKind::InvalidFieldName,
                ));
            }
            declared.insert(name, spec);
        }

        let accessors = declared
            .iter()
            .map(|(name, spec)| (name.clone(), FieldAccessor::new(name, spec.clone())))
            .collect();

        Ok(Schema {
            inner: Arc::new(SchemaInner {
                version,
                fields: declared,
                accessors,
            }),
        })
    }

    /// Derives a schema with `fields` at the next version.
    pub fn evolve<N: Into<String>>(&self, fields: Vec<(N, FieldSpec)>) -> StrataResult<Schema> {
        let version = self.inner.version.checked_add(1).ok_or_else(|| {
            log::error!("Schema version {} cannot be evolved further", self.inner.version);
            StrataError::new(
                &format!("Schema version {} is the last one", self.inner.version),
                ErrorKind::SchemaVersionError,
            )
        })?;
        Schema::with_version(version, fields)
    }

    pub fn version(&self) -> u32 {
        self.inner.version
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.inner.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.inner.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field_names(&self) -> Vec<String> {
        self.inner.fields.keys().cloned().collect()
    }

    /// The accessor resolved for `name`.
    pub fn accessor(&self, name: &str) -> StrataResult<&FieldAccessor> {
        self.inner.accessors.get(name).ok_or_else(|| {
            log::error!("No field '{}' in schema v{}", name, self.inner.version);
            StrataError::new(
                &format!("Field '{}' is not declared by the schema", name),
                ErrorKind::UnknownField,
            )
        })
    }

    /// Checks `raw` against the schema and returns the document as it is
    /// stored: integers widened to doubles and references reduced to ids.
    ///
    /// An `_id` holding an [crate::collection::ObjectId] is carried over.
    pub fn validate(&self, raw: &Document) -> StrataResult<Document> {
        self.conform(raw, "", false)
    }

    pub(crate) fn validate_embedded(&self, raw: &Document, path: &str) -> StrataResult<Document> {
        self.conform(raw, path, true)
    }

    fn conform(&self, raw: &Document, path: &str, embedded: bool) -> StrataResult<Document> {
        let mut validated = Document::new();

        for (name, value) in raw.iter() {
            if name == DOC_ID {
                if embedded {
                    log::error!("Embedded document at '{}' carries an _id", path);
                    return Err(StrataError::new(
                        &format!("Embedded document at '{}' must not carry an _id", path),
                        ErrorKind::ValidationError,
                    ));
                }
                match value {
                    Value::ObjectId(_) => validated.put(DOC_ID, value.clone())?,
                    other => {
                        log::error!("_id must be an objectID, got {}", other.type_name());
                        return Err(StrataError::new(
                            &format!("_id must be an objectID, got {}", other.type_name()),
                            ErrorKind::InvalidId,
                        ));
                    }
                }
            } else if !self.inner.fields.contains_key(name) {
                let field_path = join_path(path, name);
                log::error!("Field '{}' is not declared by schema v{}", field_path, self.inner.version);
                return Err(StrataError::new(
                    &format!("Field '{}' is not declared by the schema", field_path),
                    ErrorKind::UnknownField,
                ));
            }
        }

        for (name, spec) in &self.inner.fields {
            let field_path = join_path(path, name);
            let value = raw.get(name);
            if value.is_null() {
                if spec.is_required() {
                    log::error!("Required field '{}' is missing", field_path);
                    return Err(StrataError::new(
                        &format!("Required field '{}' is missing", field_path),
                        ErrorKind::MissingRequiredField,
                    ));
                }
                if raw.contains_key(name) {
                    validated.put(name.as_str(), Value::Null)?;
                }
                continue;
            }
            validated.put(name.as_str(), spec.conform(&field_path, &value)?)?;
        }

        Ok(validated)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.inner.version == other.inner.version && self.inner.fields == other.inner.fields
    }
}

impl Debug for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("version", &self.inner.version)
            .field("fields", &self.inner.fields)
            .finish()
    }
}

fn validate_field_name(name: &str) -> StrataResult<()> {
    if name.is_empty() || name.contains(FIELD_SEPARATOR) || RESERVED_FIELDS.contains(&name) {
        log::error!("Invalid schema field name '{}'", name);
        return Err(StrataError::new(
            &format!("Invalid schema field name '{}'", name),
            ErrorKind::InvalidFieldName,
        ));
    }
    Ok(())
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", prefix, FIELD_SEPARATOR, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ObjectId;
    use crate::doc;
    use chrono::Utc;

    fn key_value() -> Schema {
        Schema::new(vec![
            ("key", FieldSpec::string()),
            ("value", FieldSpec::double()),
            ("time", FieldSpec::date()),
        ])
        .unwrap()
    }

    fn embedding() -> Schema {
        Schema::new(vec![("embed", FieldSpec::embedding(key_value()))]).unwrap()
    }

    #[test]
    fn valid_document_is_unchanged() {
        let raw = doc! { key: "a", value: 1.0, time: (Utc::now()) };
        assert_eq!(key_value().validate(&raw).unwrap(), raw);
    }

    #[test]
    fn integer_is_widened_and_still_equal() {
        let raw = doc! { key: "a", value: 2, time: (Utc::now()) };
        let validated = key_value().validate(&raw).unwrap();
        assert!(matches!(validated.get("value"), Value::F64(v) if v == 2.0));
        assert_eq!(validated, raw);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let raw = doc! { key: "a", value: 1.0, time: (Utc::now()), colour: "red" };
        let err = key_value().validate(&raw).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnknownField);
        assert!(err.kind().is_validation());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = key_value().validate(&doc! { key: "a", value: 1.0 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MissingRequiredField);
        assert!(err.message().contains("time"));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let raw = doc! { key: 1, value: 1.0, time: (Utc::now()) };
        assert_eq!(key_value().validate(&raw).unwrap_err().kind(), &ErrorKind::InvalidDataType);
    }

    #[test]
    fn optional_field_may_be_absent_or_null() {
        let schema = Schema::new(vec![("key", FieldSpec::string()), ("note", FieldSpec::string().optional())]).unwrap();
        assert!(schema.validate(&doc! { key: "a" }).is_ok());
        let with_null = doc! { key: "a", note: (Value::Null) };
        assert_eq!(schema.validate(&with_null).unwrap(), with_null);
    }

    #[test]
    fn object_id_passes_through() {
        let mut raw = doc! { key: "a", value: 1.0, time: (Utc::now()) };
        let id = ObjectId::new();
        raw.set_object_id(id);
        assert_eq!(key_value().validate(&raw).unwrap().object_id(), Some(id));
    }

    #[test]
    fn embedded_document_is_validated_recursively() {
        let good = doc! { embed: { key: "a", value: 1, time: (Utc::now()) } };
        let validated = embedding().validate(&good).unwrap();
        assert_eq!(validated.get_double("embed.value").unwrap(), 1.0);

        let bad = doc! { embed: { key: "a", value: "one", time: (Utc::now()) } };
        let err = embedding().validate(&bad).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidDataType);
        assert!(err.message().contains("embed.value"));

        let unknown = doc! { embed: { key: "a", value: 1.0, time: (Utc::now()), extra: 1 } };
        assert_eq!(embedding().validate(&unknown).unwrap_err().kind(), &ErrorKind::UnknownField);
    }

    #[test]
    fn embedded_id_is_rejected() {
        let mut inner = doc! { key: "a", value: 1.0, time: (Utc::now()) };
        inner.set_object_id(ObjectId::new());
        let raw = doc! { embed: inner };
        assert!(embedding().validate(&raw).unwrap_err().kind().is_validation());
    }

    #[test]
    fn invalid_field_names_are_rejected() {
        for name in ["", "a.b", "_id"] {
            let err = Schema::new(vec![(name, FieldSpec::string())]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
        }
        let err = Schema::new(vec![("a", FieldSpec::string()), ("a", FieldSpec::double())]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
    }

    #[test]
    fn evolve_bumps_version() {
        let v1 = key_value();
        assert_eq!(v1.version(), 1);
        let v2 = v1
            .evolve(vec![("key", FieldSpec::string()), ("value", FieldSpec::double())])
            .unwrap();
        assert_eq!(v2.version(), 2);
        assert_eq!(v1.field_names(), vec!["key", "value", "time"]);
        assert_eq!(v2.field_names(), vec!["key", "value"]);
    }

    #[test]
    fn evolving_the_last_version_fails() {
        let last = Schema::with_version(u32::MAX, vec![("key", FieldSpec::string())]).unwrap();
        let err = last.evolve(vec![("key", FieldSpec::string())]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::SchemaVersionError);
    }

    #[test]
    fn version_zero_is_rejected() {
        let err = Schema::with_version(0, vec![("key", FieldSpec::string())]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::SchemaVersionError);
    }

    #[test]
    fn accessor_lookup() {
        let schema = key_value();
        assert_eq!(schema.accessor("key").unwrap().name(), "key");
        assert_eq!(schema.accessor("missing").unwrap_err().kind(), &ErrorKind::UnknownField);
    }
}
