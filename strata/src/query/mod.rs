mod query;
mod fluent;

mod basic_queries;
mod logical_queries;

pub(crate) use basic_queries::*;
pub use fluent::*;
pub(crate) use logical_queries::*;
pub use query::*;
