use std::any::Any;
use std::fmt::Display;

use itertools::Itertools;

use crate::collection::Document;
use crate::errors::StrataResult;

use super::{Query, QueryProvider};

pub(crate) struct AndQuery {
    queries: Vec<Query>,
}

impl AndQuery {
    pub(crate) fn new(queries: Vec<Query>) -> Self {
        AndQuery { queries }
    }
}

impl Display for AndQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.queries.iter().join(" && "))
    }
}

impl QueryProvider for AndQuery {
    #[inline]
    fn apply(&self, entry: &Document) -> StrataResult<bool> {
        for query in &self.queries {
            if !query.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct OrQuery {
    queries: Vec<Query>,
}

impl OrQuery {
    pub(crate) fn new(queries: Vec<Query>) -> Self {
        OrQuery { queries }
    }
}

impl Display for OrQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.queries.iter().join(" || "))
    }
}

impl QueryProvider for OrQuery {
    #[inline]
    fn apply(&self, entry: &Document) -> StrataResult<bool> {
        for query in &self.queries {
            if query.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotQuery {
    query: Query,
}

impl NotQuery {
    pub(crate) fn new(query: Query) -> Self {
        NotQuery { query }
    }
}

impl Display for NotQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(not {})", self.query)
    }
}

impl QueryProvider for NotQuery {
    #[inline]
    fn apply(&self, entry: &Document) -> StrataResult<bool> {
        Ok(!self.query.apply(entry)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
