use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::schema::{FieldKind, FieldSpec, PrimitiveType};
use chrono::{DateTime, Utc};

/// Typed access to one schema field.
///
/// Accessors are resolved when the [crate::schema::Schema] is built, so a read
/// through the wrong kind fails with [ErrorKind::InvalidDataType] before the
/// document is even looked at.
///
/// ```rust
/// use strata::doc;
/// use strata::schema::{FieldSpec, Schema};
///
/// let schema = Schema::new(vec![("value", FieldSpec::double())]).unwrap();
/// let value = schema.accessor("value").unwrap();
///
/// let doc = value.set(&doc! {}, 2.5).unwrap();
/// assert_eq!(value.double(&doc).unwrap(), 2.5);
/// assert!(value.string(&doc).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct FieldAccessor {
    name: String,
    spec: FieldSpec,
}

impl FieldAccessor {
    pub(crate) fn new(name: &str, spec: FieldSpec) -> Self {
        FieldAccessor {
            name: name.to_string(),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// The raw value, or [Value::Null] when absent.
    pub fn get(&self, doc: &Document) -> Value {
        doc.get(&self.name)
    }

    pub fn string(&self, doc: &Document) -> StrataResult<String> {
        self.ensure(matches!(self.spec.kind(), FieldKind::Primitive(PrimitiveType::String)), "string")?;
        doc.get_string(&self.name)
    }

    pub fn double(&self, doc: &Document) -> StrataResult<f64> {
        self.ensure(matches!(self.spec.kind(), FieldKind::Primitive(PrimitiveType::Double)), "double")?;
        doc.get_double(&self.name)
    }

    pub fn date(&self, doc: &Document) -> StrataResult<DateTime<Utc>> {
        self.ensure(matches!(self.spec.kind(), FieldKind::Primitive(PrimitiveType::Date)), "date")?;
        doc.get_date(&self.name)
    }

    pub fn reference(&self, doc: &Document) -> StrataResult<ObjectId> {
        self.ensure(matches!(self.spec.kind(), FieldKind::Reference { .. }), "reference")?;
        doc.get_reference(&self.name)
    }

    pub fn embedded(&self, doc: &Document) -> StrataResult<Document> {
        self.ensure(matches!(self.spec.kind(), FieldKind::Embedding(_)), "embedding")?;
        doc.get_embedded(&self.name)
    }

    /// Returns a copy of `doc` with this field set to `value`, after checking
    /// `value` against the field's declaration.
    pub fn set<T: Into<Value>>(&self, doc: &Document, value: T) -> StrataResult<Document> {
        let value = value.into();
        if value.is_null() {
            if self.spec.is_required() {
                log::error!("Cannot clear required field '{}'", self.name);
                return Err(StrataError::new(
                    &format!("Required field '{}' cannot be null", self.name),
                    ErrorKind::MissingRequiredField,
                ));
            }
            return doc.with(self.name.as_str(), Value::Null);
        }
        let conformed = self.spec.conform(&self.name, &value)?;
        doc.with(self.name.as_str(), conformed)
    }

    fn ensure(&self, matches: bool, requested: &str) -> StrataResult<()> {
        if matches {
            Ok(())
        } else {
            log::error!("Field '{}' is {}, read as {}", self.name, self.spec.kind(), requested);
            Err(StrataError::new(
                &format!("Field '{}' is {}, not {}", self.name, self.spec.kind(), requested),
                ErrorKind::InvalidDataType,
            ))
        }
    }
}
