//! Documents, identities and schema-bound collections.
//!
//! A [Document] maps field names to [crate::common::Value]s. Once stored, it
//! carries its [ObjectId] under the reserved `_id` field. Dotted keys address
//! fields of embedded documents.
//!
//! A [Collection] validates every write against its
//! [crate::schema::Schema] and answers [crate::query::Query]s asynchronously.
//!
//! ```rust
//! use strata::doc;
//!
//! let mut doc = doc! { key: "a" };
//! doc.put("embed.key", "b").unwrap();
//! assert_eq!(doc.get_string("embed.key").unwrap(), "b");
//! ```

mod collection;
mod document;
mod object_id;
pub(crate) mod snowflake;
mod store;
mod write_result;

pub use collection::*;
pub use document::*;
pub use object_id::ObjectId;
pub use write_result::*;
