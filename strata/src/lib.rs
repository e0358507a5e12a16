//! # Strata - Futures and a Schema-Typed Document Store
//!
//! Strata is an in-memory document store whose collections are bound to typed,
//! versioned schemas. Every collection operation runs on a shared worker pool
//! and hands back a composable [`future::Future`].
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::database::Database;
//! use strata::doc;
//! use strata::query::{field, query};
//! use strata::schema::{FieldSpec, Schema};
//!
//! # fn main() -> strata::errors::StrataResult<()> {
//! let db = Database::builder().worker_threads(2).open()?;
//! let schema = Schema::new(vec![
//!     ("key", FieldSpec::string()),
//!     ("value", FieldSpec::double()),
//! ])?;
//! let collection = db.create_collection("example.keyValue", schema)?;
//!
//! let stored = collection.insert(doc! { key: "a", value: 1.0 }).wait()?;
//! let found = collection.find_one(field("key").eq("a")).wait()?;
//! assert_eq!(found, Some(stored));
//!
//! let everything = collection.find(query()).wait()?;
//! assert_eq!(everything.len(), 1);
//! db.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Public handles ([`database::Database`], [`collection::Collection`],
//! [`query::Query`], [`future::Future`]) are thin wrappers around shared
//! inner state, so clones are cheap and observe the same data.
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, object ids and schema-bound collections
//! - [`common`] - Values, constants and small shared utilities
//! - [`database`] - The database handle, its builder and configuration
//! - [`errors`] - Error types and result definitions
//! - [`future`] - Futures, promises and the worker pool
//! - [`query`] - Immutable query predicates
//! - [`schema`] - Typed field definitions, validation and accessors

use crate::collection::snowflake::SnowflakeIdGenerator;
use std::sync::LazyLock;
use std::thread::available_parallelism;

pub mod collection;
pub mod common;
pub mod database;
pub mod errors;
pub mod future;
pub mod query;
pub mod schema;

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);

/// Returns the number of available CPU cores, or 1 if detection fails.
///
/// ```rust
/// use strata::get_cpu_count;
///
/// assert!(get_cpu_count() > 0);
/// ```
pub fn get_cpu_count() -> usize {
    available_parallelism()
        .map(|p| p.get())
        .unwrap_or_else(|err| {
            log::warn!("Failed to detect available parallelism: {}. Defaulting to single thread.", err);
            1
        })
}
