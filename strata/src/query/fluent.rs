use crate::common::Value;

use super::{EqualsQuery, NotEqualsQuery, Query};

/// Starts a query on `field_name`, which may be a dotted path.
///
/// ```rust
/// use strata::doc;
/// use strata::query::field;
///
/// assert!(field("embed.key").eq("a").apply(&doc! { embed: { key: "a" } }).unwrap());
/// ```
pub fn field(field_name: &str) -> FluentQuery {
    FluentQuery {
        field_name: field_name.to_string(),
    }
}

pub struct FluentQuery {
    field_name: String,
}

impl FluentQuery {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Query {
        Query::new(EqualsQuery::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Query {
        Query::new(NotEqualsQuery::new(self.field_name, value.into()))
    }
}
