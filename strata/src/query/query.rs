use crate::collection::{Document, ObjectId};
use crate::common::{Value, DOC_ID};
use crate::errors::StrataResult;
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllQuery, AndQuery, EqualsQuery, NotQuery, OrQuery};

/// The evaluation side of a [Query].
pub trait QueryProvider: Any + Send + Sync + Display {
    /// Tests one document.
    fn apply(&self, entry: &Document) -> StrataResult<bool>;

    fn as_any(&self) -> &dyn Any;
}

/// An immutable predicate over document fields.
///
/// Every builder method returns a new `Query`; the receiver is never changed,
/// so a base query can be shared between several refinements. Cloning is a
/// reference-count bump.
///
/// # Examples
///
/// ```rust
/// use strata::doc;
/// use strata::query::{field, or, query};
///
/// let a_or_b = or(vec![field("key").eq("a"), field("key").eq("b")]);
/// assert!(a_or_b.apply(&doc! { key: "b" }).unwrap());
///
/// let base = query().eq("key", "a");
/// let narrowed = base.eq("value", 1.0);
/// assert!(base.apply(&doc! { key: "a", value: 2.0 }).unwrap());
/// assert!(!narrowed.apply(&doc! { key: "a", value: 2.0 }).unwrap());
/// ```
#[derive(Clone)]
pub struct Query {
    inner: Arc<dyn QueryProvider>,
}

impl Query {
    pub fn new<T: QueryProvider + 'static>(inner: T) -> Self {
        Query { inner: Arc::new(inner) }
    }

    /// Additionally requires the field at `path` to equal `value`.
    pub fn eq<T: Into<Value>>(&self, path: &str, value: T) -> Self {
        let equals = Query::new(EqualsQuery::new(path.to_string(), value.into()));
        if is_all_query(self) {
            equals
        } else {
            Query::new(AndQuery::new(vec![self.clone(), equals]))
        }
    }

    /// Matches what this query matches plus what any of `others` matches.
    pub fn or(&self, others: Vec<Query>) -> Self {
        let mut queries = Vec::with_capacity(others.len() + 1);
        queries.push(self.clone());
        queries.extend(others);
        or(queries)
    }

    pub fn and(&self, others: Vec<Query>) -> Self {
        let mut queries = Vec::with_capacity(others.len() + 1);
        queries.push(self.clone());
        queries.extend(others);
        and(queries)
    }

    pub fn not(&self) -> Self {
        Query::new(NotQuery::new(self.clone()))
    }
}

impl Display for Query {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Query{}", self.inner)
    }
}

impl Deref for Query {
    type Target = Arc<dyn QueryProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A query without constraints; matches every document.
pub fn query() -> Query {
    Query::new(AllQuery {})
}

pub fn by_id(id: ObjectId) -> Query {
    Query::new(EqualsQuery::new(DOC_ID.to_string(), Value::ObjectId(id)))
}

/// Conjunction. A single query is returned as is; no queries match everything.
pub fn and(mut queries: Vec<Query>) -> Query {
    match queries.len() {
        0 => query(),
        1 => queries.remove(0),
        _ => Query::new(AndQuery::new(queries)),
    }
}

/// Disjunction, evaluated in order. A single query is returned as is; no
/// queries match nothing.
pub fn or(mut queries: Vec<Query>) -> Query {
    match queries.len() {
        1 => queries.remove(0),
        _ => Query::new(OrQuery::new(queries)),
    }
}

pub fn not(query: Query) -> Query {
    query.not()
}

pub(crate) fn is_all_query(query: &Query) -> bool {
    query.as_any().is::<AllQuery>()
}
