use itertools::Itertools;
use std::fmt::{Display, Formatter};
use strata::collection::{Document, WriteResult};

/// The plain-data result of a handled request. Rendering it for a transport
/// is up to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Number(f64),
    Document(Document),
    Documents(Vec<Document>),
    Removed(WriteResult),
    /// A lookup that matched nothing.
    Empty,
}

impl From<Option<Document>> for Reply {
    fn from(value: Option<Document>) -> Self {
        match value {
            Some(document) => Reply::Document(document),
            None => Reply::Empty,
        }
    }
}

impl Display for Reply {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Reply::Text(text) => write!(f, "{}", text),
            Reply::Number(number) => write!(f, "{}", number),
            Reply::Document(document) => write!(f, "{}", document),
            Reply::Documents(documents) => write!(f, "[{}]", documents.iter().join(",")),
            Reply::Removed(result) => write!(f, "removed {}", result.count()),
            Reply::Empty => write!(f, ""),
        }
    }
}
