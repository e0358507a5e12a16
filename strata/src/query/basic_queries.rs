use std::any::Any;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::StrataResult;

use super::QueryProvider;

pub(crate) struct AllQuery {}

impl Display for AllQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(all)")
    }
}

impl QueryProvider for AllQuery {
    #[inline]
    fn apply(&self, _entry: &Document) -> StrataResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Field equality on a possibly dotted path.
pub(crate) struct EqualsQuery {
    field_name: String,
    field_value: Value,
}

impl EqualsQuery {
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsQuery {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl QueryProvider for EqualsQuery {
    #[inline]
    fn apply(&self, entry: &Document) -> StrataResult<bool> {
        Ok(entry.get(&self.field_name) == self.field_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotEqualsQuery {
    field_name: String,
    field_value: Value,
}

impl NotEqualsQuery {
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsQuery {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl QueryProvider for NotEqualsQuery {
    #[inline]
    fn apply(&self, entry: &Document) -> StrataResult<bool> {
        Ok(entry.get(&self.field_name) != self.field_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
