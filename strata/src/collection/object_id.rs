use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::ID_GENERATOR;
use std::fmt::{Debug, Display};

/// The identity of a stored document.
///
/// Every document receives a fresh `ObjectId` when it is inserted into a
/// collection. Ids come from a Snowflake-style generator, so they are unique
/// across all collections of the process and roughly ordered by creation time.
///
/// The id is stored under the reserved `_id` field and is what reference
/// fields hold.
///
/// # Examples
///
/// ```rust
/// use strata::collection::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed = ObjectId::parse(&id.to_string()).unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct ObjectId {
    id_value: u64,
}

impl ObjectId {
    /// Generates a new unique `ObjectId`.
    pub fn new() -> Self {
        ObjectId {
            id_value: ID_GENERATOR.get_id(),
        }
    }

    /// Creates an `ObjectId` from a known value. Zero is not a valid id.
    pub fn create_id(id_value: u64) -> StrataResult<ObjectId> {
        if id_value == 0 {
            log::error!("ObjectId value must be non-zero");
            return Err(StrataError::new(
                "ObjectId validation error: id value must be non-zero",
                ErrorKind::InvalidId,
            ));
        }
        Ok(ObjectId { id_value })
    }

    /// Parses the printed form of an id.
    pub fn parse(text: &str) -> StrataResult<ObjectId> {
        let id_value = text.trim().parse::<u64>().map_err(|err| {
            log::error!("Cannot parse '{}' as an ObjectId: {}", text, err);
            StrataError::new(
                &format!("'{}' is not a valid ObjectId", text),
                ErrorKind::InvalidId,
            )
        })?;
        ObjectId::create_id(id_value)
    }

    pub fn id_value(&self) -> u64 {
        self.id_value
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.id_value)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id_value)
    }
}
