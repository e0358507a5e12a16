use im::OrdMap;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::collection::ObjectId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR, RESERVED_FIELDS};
use crate::errors::{ErrorKind, StrataError, StrataResult};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// A document: named [Value]s plus, once stored, an [ObjectId] under `_id`.
///
/// Documents are plain values. Cloning is O(1) because fields live in a
/// persistent map (`im::OrdMap`) whose structure is shared between clones, so
/// a collection can hand out copies of stored documents without exposing its
/// storage. Changing a stored document means producing a new state with
/// [`Document::with`] or [`Document::put`] and passing it to
/// [`crate::collection::Collection::save`].
///
/// Keys containing `.` address embedded documents: `doc.get("embed.key")`
/// reads `key` inside the document stored under `embed`.
///
/// ```rust
/// use strata::doc;
///
/// let doc = doc! { key: "a", value: 1.0, embed: { key: "b" } };
/// assert_eq!(doc.get_string("key").unwrap(), "a");
/// assert_eq!(doc.get_string("embed.key").unwrap(), "b");
/// ```
#[derive(Clone, PartialEq, Default, serde::Deserialize, serde::Serialize)]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Associates `value` with `key`, creating embedded documents along a
    /// dotted path as needed.
    ///
    /// # Errors
    ///
    /// Fails if the key (or a path segment) is empty, or if `_id` is given a
    /// value that is not an [ObjectId].
    pub fn put<'a, T: Into<Value>>(&mut self, key: impl Into<Cow<'a, str>>, value: T) -> StrataResult<()> {
        let key = key.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StrataError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        let value = value.into();
        if key == DOC_ID && !value.is_object_id() {
            log::error!("Document id must be an ObjectId, found {}", value.type_name());
            return Err(StrataError::new(
                "Document id is assigned by the store and must be an ObjectId",
                ErrorKind::InvalidOperation,
            ));
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data = self.data.update(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns a copy of this document with `key` set to `value`.
    pub fn with<'a, T: Into<Value>>(&self, key: impl Into<Cow<'a, str>>, value: T) -> StrataResult<Document> {
        let mut next = self.clone();
        next.put(key, value)?;
        Ok(next)
    }

    /// Returns the value at `key` (dotted paths allowed), or [Value::Null].
    pub fn get(&self, key: &str) -> Value {
        match self.data.get(key) {
            Some(value) => value.clone(),
            None if key.contains(FIELD_SEPARATOR) => self.deep_get(key),
            None => Value::Null,
        }
    }

    /// Reads a string field.
    pub fn get_string(&self, key: &str) -> StrataResult<String> {
        match self.get(key) {
            Value::String(value) => Ok(value),
            other => Err(type_mismatch(key, "string", &other)),
        }
    }

    /// Reads a numeric field as a double.
    pub fn get_double(&self, key: &str) -> StrataResult<f64> {
        let value = self.get(key);
        value.as_number().ok_or_else(|| type_mismatch(key, "double", &value))
    }

    pub fn get_date(&self, key: &str) -> StrataResult<DateTime<Utc>> {
        match self.get(key) {
            Value::Date(value) => Ok(value),
            other => Err(type_mismatch(key, "date", &other)),
        }
    }

    /// Reads a reference field: the id of the referenced document.
    pub fn get_reference(&self, key: &str) -> StrataResult<ObjectId> {
        match self.get(key) {
            Value::ObjectId(value) => Ok(value),
            other => Err(type_mismatch(key, "objectID", &other)),
        }
    }

    pub fn get_embedded(&self, key: &str) -> StrataResult<Document> {
        match self.get(key) {
            Value::Document(value) => Ok(value),
            other => Err(type_mismatch(key, "document", &other)),
        }
    }

    /// The identity assigned by the store, if this document was stored.
    pub fn object_id(&self) -> Option<ObjectId> {
        self.data.get(DOC_ID).and_then(|it| it.as_object_id()).copied()
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    pub(crate) fn set_object_id(&mut self, id: ObjectId) {
        self.data = self.data.update(DOC_ID.to_string(), Value::ObjectId(id));
    }

    /// Top-level field names, excluding reserved fields.
    pub fn fields(&self) -> FieldVec {
        self.data
            .keys()
            .filter(|key| !RESERVED_FIELDS.contains(&key.as_str()))
            .cloned()
            .collect()
    }

    /// Removes a field (dotted paths allowed). Removing a missing key is a no-op.
    pub fn remove(&mut self, key: &str) -> StrataResult<()> {
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_remove(&splits)
        } else {
            self.data = self.data.without(key);
            Ok(())
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of top-level entries, including `_id` when present.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub(crate) fn to_json(&self) -> String {
        format!(
            "{{{}}}",
            self.data
                .iter()
                .map(|(key, value)| format!("\"{}\":{}", key, value.to_json()))
                .join(",")
        )
    }

    fn deep_get(&self, key: &str) -> Value {
        let mut splits = key.split(FIELD_SEPARATOR);
        let mut current = match splits.next().and_then(|first| self.data.get(first)) {
            Some(value) => value,
            None => return Value::Null,
        };

        for segment in splits {
            current = match current {
                Value::Document(doc) => match doc.data.get(segment) {
                    Some(value) => value,
                    None => return Value::Null,
                },
                Value::Array(array) => match segment.parse::<usize>().ok().and_then(|i| array.get(i)) {
                    Some(value) => value,
                    None => return Value::Null,
                },
                _ => return Value::Null,
            };
        }
        current.clone()
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> StrataResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Document does not support empty key segment");
                return Err(StrataError::new(
                    "Document does not support empty key segment",
                    ErrorKind::InvalidFieldName,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.update(key.to_string(), value);
            return Ok(());
        }

        // reuse the embedded document at this level, or start a new one
        let mut nested = match self.data.get(key) {
            Some(Value::Document(doc)) => doc.clone(),
            _ => Document::new(),
        };
        nested.deep_put(&splits[1..], value)?;
        self.data = self.data.update(key.to_string(), Value::Document(nested));
        Ok(())
    }

    fn deep_remove(&mut self, splits: &[&str]) -> StrataResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Document does not support empty key segment");
                return Err(StrataError::new(
                    "Document does not support empty key segment",
                    ErrorKind::InvalidFieldName,
                ));
            }
        };

        if splits.len() == 1 {
            self.data = self.data.without(key);
            return Ok(());
        }

        if let Some(Value::Document(doc)) = self.data.get(key) {
            let mut nested = doc.clone();
            nested.deep_remove(&splits[1..])?;
            if nested.is_empty() {
                self.data = self.data.without(key);
            } else {
                self.data = self.data.update(key.to_string(), Value::Document(nested));
            }
        }
        Ok(())
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> StrataError {
    if found.is_null() {
        StrataError::new(&format!("Field '{}' is not set", key), ErrorKind::NotFound)
    } else {
        StrataError::new(
            &format!("Field '{}' is a {}, not a {}", key, found.type_name(), expected),
            ErrorKind::InvalidDataType,
        )
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Builds a [Document] from `key: value` pairs; `{ ... }` values nest.
///
/// Panics if a key is invalid, so it is meant for literals and tests.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_mut)]
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::doc_key!($key), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_key {
    ($key:literal) => {
        $key
    };
    ($key:ident) => {
        stringify!($key)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
