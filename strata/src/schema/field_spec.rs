use crate::collection::ObjectId;
use crate::common::Value;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::schema::Schema;
use std::fmt::{Display, Formatter};

/// Scalar field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Double,
    Date,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveType::String => write!(f, "string"),
            PrimitiveType::Double => write!(f, "double"),
            PrimitiveType::Date => write!(f, "date"),
        }
    }
}

/// What a schema field holds.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldKind {
    Primitive(PrimitiveType),
    /// The id of a document in the named collection.
    Reference { collection: String },
    /// A sub-document validated against a nested schema.
    Embedding(Schema),
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Primitive(primitive) => write!(f, "{}", primitive),
            FieldKind::Reference { collection } => write!(f, "reference({})", collection),
            FieldKind::Embedding(_) => write!(f, "embedding"),
        }
    }
}

/// The declaration of one schema field: its kind and whether it is required.
///
/// Fields are required by default.
///
/// ```rust
/// use strata::schema::FieldSpec;
///
/// let spec = FieldSpec::double().optional();
/// assert!(!spec.is_required());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    kind: FieldKind,
    required: bool,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        FieldSpec {
            kind,
            required: true,
        }
    }

    pub fn string() -> Self {
        FieldSpec::new(FieldKind::Primitive(PrimitiveType::String))
    }

    pub fn double() -> Self {
        FieldSpec::new(FieldKind::Primitive(PrimitiveType::Double))
    }

    pub fn date() -> Self {
        FieldSpec::new(FieldKind::Primitive(PrimitiveType::Date))
    }

    pub fn reference(collection: &str) -> Self {
        FieldSpec::new(FieldKind::Reference {
            collection: collection.to_string(),
        })
    }

    pub fn embedding(schema: Schema) -> Self {
        FieldSpec::new(FieldKind::Embedding(schema))
    }

    /// Marks the field optional: it may be absent or null.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Checks a non-null value against this field and returns the form it is
    /// stored in. Integers widen to doubles and references collapse to their
    /// [ObjectId].
    pub(crate) fn conform(&self, path: &str, value: &Value) -> StrataResult<Value> {
        match (&self.kind, value) {
            (FieldKind::Primitive(PrimitiveType::String), Value::String(_)) => Ok(value.clone()),
            (FieldKind::Primitive(PrimitiveType::Double), Value::F64(_)) => Ok(value.clone()),
            (FieldKind::Primitive(PrimitiveType::Double), Value::I64(v)) => Ok(Value::F64(*v as f64)),
            (FieldKind::Primitive(PrimitiveType::Date), Value::Date(_)) => Ok(value.clone()),
            (FieldKind::Reference { .. }, Value::ObjectId(_)) => Ok(value.clone()),
            (FieldKind::Reference { collection }, Value::String(text)) => {
                ObjectId::parse(text).map(Value::ObjectId).map_err(|err| {
                    log::error!("Field '{}' references {} with unparseable id '{}'", path, collection, text);
                    StrataError::new_with_cause(
                        &format!("Field '{}' expects a reference to {}, got '{}'", path, collection, text),
                        ErrorKind::InvalidDataType,
                        err,
                    )
                })
            }
            (FieldKind::Reference { collection }, Value::Document(target)) => match target.object_id() {
                Some(id) => Ok(Value::ObjectId(id)),
                None => {
                    log::error!("Field '{}' references {} with a document that has no id", path, collection);
                    Err(StrataError::new(
                        &format!("Field '{}' expects a stored document of {}, got one without _id", path, collection),
                        ErrorKind::InvalidDataType,
                    ))
                }
            },
            (FieldKind::Embedding(schema), Value::Document(embedded)) => {
                schema.validate_embedded(embedded, path).map(Value::Document)
            }
            (kind, other) => {
                log::error!("Field '{}' expects {}, got {}", path, kind, other.type_name());
                Err(StrataError::new(
                    &format!("Field '{}' expects {}, got {}", path, kind, other.type_name()),
                    ErrorKind::InvalidDataType,
                ))
            }
        }
    }
}
